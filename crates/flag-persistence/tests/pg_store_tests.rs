//! Pruebas contra Postgres real (requiere DATABASE_URL; si no, se omiten).


use std::sync::Arc;
use std::thread;

use chrono::Utc;
use flag_core::{ApprovalFilter, ApprovalWorkflow, EventStore, FlagEventKind, FlagStore, RiskRecord, RiskScorer, StoreError,
                WorkflowError};
use flag_domain::{Approval, ApprovalStatus, ApproverTier, AssessmentSource, DecisionOutcome, Flag, FlagStatus,
                  FlagSubmission, RiskAssessment, RiskLevel, RolloutPercentage, Scope};
use flag_persistence::{PgEventStore, PgFlagStore};
use test_support::{provider, unique_name};

fn new_flag(prefix: &str, scope: Scope) -> Flag {
    Flag::from_submission(&FlagSubmission::new(unique_name(prefix), "desc", scope, ""), Utc::now())
}

#[test]
fn flag_round_trip_and_unique_name() {
    let Some(p) = provider() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let store = PgFlagStore::new(p);
    let flag = new_flag("roundtrip", Scope::Database);
    store.insert_flag(&flag).unwrap();

    let loaded = store.get_flag(flag.id).unwrap().unwrap();
    assert_eq!(loaded.name, flag.name);
    assert_eq!(loaded.scope, Scope::Database);
    assert_eq!(loaded.status, FlagStatus::Pending);
    assert_eq!(store.find_flag_by_name(&flag.name).unwrap().map(|f| f.id), Some(flag.id));

    let mut dup = new_flag("roundtrip", Scope::Frontend);
    dup.name = flag.name.clone();
    assert!(matches!(store.insert_flag(&dup), Err(StoreError::Conflict(_))));
}

#[test]
fn assessment_updates_flag_risk_level() {
    let Some(p) = provider() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let store = PgFlagStore::new(p);
    let flag = new_flag("risk", Scope::Backend);
    store.insert_flag(&flag).unwrap();

    let assessment = RiskAssessment::derived(62, vec!["high_migration".into()], "r", "rec");
    let record = RiskRecord::new(flag.id, assessment, AssessmentSource::Fallback, Utc::now());
    store.record_assessment(&record).unwrap();

    let latest = store.latest_assessment(flag.id).unwrap().unwrap();
    assert_eq!(latest.id, record.id);
    assert_eq!(latest.assessment.risk_level(), RiskLevel::High);
    assert_eq!(store.get_flag(flag.id).unwrap().unwrap().risk_level, Some(RiskLevel::High));

    let orphan = RiskRecord::new(uuid::Uuid::new_v4(), record.assessment.clone(), AssessmentSource::Fallback, Utc::now());
    assert!(matches!(store.record_assessment(&orphan), Err(StoreError::NotFound(_))));
}

#[test]
fn one_pending_approval_per_approver() {
    let Some(p) = provider() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let store = PgFlagStore::new(p);
    let flag = new_flag("pending", Scope::Frontend);
    store.insert_flag(&flag).unwrap();

    store.insert_approval(&Approval::pending(flag.id, ApproverTier::TeamLead, Utc::now())).unwrap();
    let dup = Approval::pending(flag.id, ApproverTier::TeamLead, Utc::now());
    assert!(matches!(store.insert_approval(&dup), Err(StoreError::Conflict(_))));
    store.insert_approval(&Approval::pending(flag.id, ApproverTier::TopExecutive, Utc::now())).unwrap();

    let orphan = Approval::pending(uuid::Uuid::new_v4(), ApproverTier::TeamLead, Utc::now());
    assert!(matches!(store.insert_approval(&orphan), Err(StoreError::NotFound(_))));

    let listed = store.list_approvals(&ApprovalFilter::for_flag(flag.id)).unwrap();
    assert_eq!(listed.len(), 2);
}

#[test]
fn commit_decision_requires_pending_approval_and_flag() {
    let Some(p) = provider() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let store = PgFlagStore::new(p);
    let flag = new_flag("decide", Scope::Frontend);
    store.insert_flag(&flag).unwrap();
    let a1 = Approval::pending(flag.id, ApproverTier::TeamLead, Utc::now());
    let a2 = Approval::pending(flag.id, ApproverTier::SeniorEngineer, Utc::now());
    store.insert_approval(&a1).unwrap();
    store.insert_approval(&a2).unwrap();

    let now = Utc::now();
    store.commit_decision(&a1.decided(DecisionOutcome::Approved, "ok", now), FlagStatus::Approved, now)
         .unwrap();
    assert_eq!(store.get_flag(flag.id).unwrap().unwrap().status, FlagStatus::Approved);

    // misma approval otra vez
    let again = a1.decided(DecisionOutcome::Rejected, "", now);
    assert!(matches!(store.commit_decision(&again, FlagStatus::Rejected, now), Err(StoreError::Conflict(_))));
    // otra approval sobre un flag ya decidido: rollback completo
    let other = a2.decided(DecisionOutcome::Rejected, "", now);
    assert!(matches!(store.commit_decision(&other, FlagStatus::Rejected, now), Err(StoreError::Conflict(_))));
    assert_eq!(store.get_approval(a2.id).unwrap().unwrap().status, ApprovalStatus::Pending);
    assert_eq!(store.get_flag(flag.id).unwrap().unwrap().status, FlagStatus::Approved);
}

#[test]
fn status_transition_and_rollout_are_narrow_writes() {
    let Some(p) = provider() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let store = PgFlagStore::new(p);
    let flag = new_flag("narrow", Scope::Backend);
    store.insert_flag(&flag).unwrap();
    let approval = Approval::pending(flag.id, ApproverTier::TeamLead, Utc::now());
    store.insert_approval(&approval).unwrap();

    // todavía pending: approved -> active no aplica y no muta
    let now = Utc::now();
    assert!(matches!(store.transition_status(flag.id, FlagStatus::Approved, FlagStatus::Active, now),
                     Err(StoreError::Conflict(_))));
    assert!(matches!(store.transition_status(uuid::Uuid::new_v4(), FlagStatus::Approved, FlagStatus::Active, now),
                     Err(StoreError::NotFound(_))));

    // el rollout no toca status, aunque una decisión haya confirmado antes
    store.commit_decision(&approval.decided(DecisionOutcome::Approved, "", now), FlagStatus::Approved, now)
         .unwrap();
    let pct = RolloutPercentage::try_from(25_i64).unwrap();
    let (updated, previous) = store.set_rollout(flag.id, pct, Utc::now()).unwrap();
    assert_eq!(previous, RolloutPercentage::FULL);
    assert_eq!(updated.status, FlagStatus::Approved);
    let stored = store.get_flag(flag.id).unwrap().unwrap();
    assert_eq!(stored.status, FlagStatus::Approved);
    assert_eq!(stored.rollout(), pct);

    let active = store.transition_status(flag.id, FlagStatus::Approved, FlagStatus::Active, Utc::now())
                      .unwrap();
    assert_eq!(active.status, FlagStatus::Active);
    assert_eq!(active.rollout(), pct);
    assert!(matches!(store.transition_status(flag.id, FlagStatus::Approved, FlagStatus::Active, Utc::now()),
                     Err(StoreError::Conflict(_))));
}

#[test]
fn event_log_preserves_order_and_payload() {
    let Some(p) = provider() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let flags = PgFlagStore::new(p.clone());
    let events = PgEventStore::new(p);
    let flag = new_flag("events", Scope::All);
    flags.insert_flag(&flag).unwrap();

    events.append_kind(flag.id, FlagEventKind::RolloutChanged { from: 100, to: 50 }).unwrap();
    events.append_kind(flag.id,
                       FlagEventKind::FlagToggled { from: FlagStatus::Approved,
                                                    to: FlagStatus::Active })
          .unwrap();
    let listed = events.list(flag.id).unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed[0].seq < listed[1].seq);
    assert_eq!(listed[0].kind, FlagEventKind::RolloutChanged { from: 100, to: 50 });
}

#[test]
fn workflow_over_postgres_with_concurrent_deciders() {
    let Some(p) = provider() else {
        eprintln!("skip (no DATABASE_URL)");
        return;
    };
    let wf = Arc::new(ApprovalWorkflow::new_with_stores(PgFlagStore::new(p.clone()),
                                                        PgEventStore::new(p),
                                                        RiskScorer::keyword_fallback()));
    let name = unique_name("payment-flow");
    let out = wf.submit(FlagSubmission::new(name.clone(), "new payment provider", Scope::Backend, ""))
                .unwrap();
    assert_eq!(out.approval.approver, ApproverTier::for_risk(out.flag.risk_level.unwrap()));

    let approval_id = out.approval.id;
    let handles: Vec<_> = (0..4).map(|i| {
                                    let wf = Arc::clone(&wf);
                                    let outcome = if i % 2 == 0 { "approved" } else { "rejected" };
                                    thread::spawn(move || wf.decide(approval_id, outcome, ""))
                                })
                                .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter()
                   .filter(|r| r.is_err())
                   .all(|r| matches!(r, Err(WorkflowError::Conflict(_)))));

    let details = wf.flag_details(out.flag.id).unwrap();
    assert!(matches!(details.flag.status, FlagStatus::Approved | FlagStatus::Rejected));
    assert!(details.assessment.is_some());
    assert!(wf.check(&name, Some("u1")).map(|e| !e.enabled).unwrap());
}
