use flag_adapters::ReasonerConfig;
use flag_core::{ApprovalFilter, EvaluationReason, FlagEventKind};
use flag_domain::{ApprovalStatus, ApproverTier, FlagStatus, FlagSubmission, RiskLevel, Scope};
use flaggate::{memory_workflow, pg_workflow, AppConfig, AppError};

fn offline() -> AppConfig {
    AppConfig { reasoner: ReasonerConfig::default(),
                database: None }
}

#[test]
fn test_full_lifecycle_in_memory() {
    let wf = memory_workflow(&offline());
    let out = wf.submit(FlagSubmission::new("new-search", "search ranking tweak", Scope::Backend, "add ranking weights"))
                .expect("submit");
    assert_eq!(out.flag.status, FlagStatus::Pending);
    assert!(out.assessment.is_some());

    // Antes de aprobar no se sirve a nadie.
    assert_eq!(wf.check("new-search", Some("u1")).unwrap().reason,
               EvaluationReason::NotActive { status: FlagStatus::Pending });

    let decision = wf.decide(out.approval.id, "approved", "ok").expect("decide");
    assert_eq!(decision.flag.status, FlagStatus::Approved);
    let active = wf.toggle(out.flag.id).expect("toggle");
    assert_eq!(active.status, FlagStatus::Active);
    assert!(wf.check("new-search", Some("u1")).unwrap().enabled);

    wf.set_rollout(out.flag.id, 0).expect("rollout");
    assert!(!wf.check("new-search", Some("u1")).unwrap().enabled);

    let kinds: Vec<&'static str> = wf.events_for(out.flag.id)
                                     .unwrap()
                                     .iter()
                                     .map(|e| e.kind.event_type())
                                     .collect();
    assert_eq!(kinds.first(), Some(&"flagsubmitted"));
    assert!(wf.events_for(out.flag.id)
              .unwrap()
              .iter()
              .any(|e| matches!(e.kind, FlagEventKind::RolloutChanged { .. })));
}

#[test]
fn test_destructive_change_routes_to_top_executive() {
    let wf = memory_workflow(&offline());
    let out = wf.submit(FlagSubmission::new("purge-sessions", "drop table of sessions", Scope::Database, "DROP TABLE sessions;"))
                .unwrap();
    assert_eq!(out.flag.risk_level, Some(RiskLevel::Critical));
    assert_eq!(out.approval.approver, ApproverTier::TopExecutive);

    let pending = wf.pending_for(ApproverTier::TopExecutive).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].approval.flag_id, out.flag.id);

    wf.decide(out.approval.id, "rejected", "too risky").unwrap();
    let filter = ApprovalFilter { status: Some(ApprovalStatus::Rejected),
                                  ..ApprovalFilter::default() };
    assert_eq!(wf.list_approvals(&filter).unwrap().len(), 1);
    let err = AppError::from(wf.toggle(out.flag.id).unwrap_err());
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_invalid_input_maps_to_validation_exit_code() {
    let wf = memory_workflow(&offline());
    let err = AppError::from(wf.submit(FlagSubmission::new("  ", "", Scope::Frontend, "")).unwrap_err());
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_pg_workflow_without_database_is_config_error() {
    match pg_workflow(&offline()) {
        Err(AppError::Config(msg)) => assert!(msg.contains("DATABASE_URL")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected config error"),
    }
}
