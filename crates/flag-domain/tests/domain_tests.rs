use chrono::Utc;
use flag_domain::{Approval, ApprovalStatus, ApproverTier, DecisionOutcome, Flag, FlagConfig, FlagStatus, FlagSubmission,
                  RiskLevel, RolloutPercentage, Scope};
use serde_json::json;

#[test]
fn test_scope_parsing_accepts_all_systems_alias() {
    assert_eq!("All Systems".parse::<Scope>().unwrap(), Scope::All);
    assert_eq!(" DATABASE ".parse::<Scope>().unwrap(), Scope::Database);
    assert!("mobile".parse::<Scope>().is_err());
}

#[test]
fn test_rollout_percentage_range() {
    assert_eq!(RolloutPercentage::try_from(0_i64).unwrap().value(), 0);
    assert_eq!(RolloutPercentage::try_from(100_i64).unwrap(), RolloutPercentage::FULL);
    assert!(RolloutPercentage::try_from(101_i64).is_err());
    assert!(RolloutPercentage::try_from(-1_i64).is_err());
}

#[test]
fn test_config_keeps_extension_keys_and_defaults_to_full_rollout() {
    let raw = json!({"target_users": ["u1", "u2"], "theme": "dark"});
    let cfg: FlagConfig = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(cfg.rollout_percentage, None);
    assert_eq!(cfg.effective_rollout(), RolloutPercentage::FULL);
    assert_eq!(cfg.extra.get("theme"), Some(&json!("dark")));
    // round trip conserva las claves desconocidas
    assert_eq!(serde_json::to_value(&cfg).unwrap(), raw);
}

#[test]
fn test_config_rejects_out_of_range_rollout() {
    let raw = json!({"rollout_percentage": 150});
    assert!(serde_json::from_value::<FlagConfig>(raw).is_err());
    let ok: FlagConfig = serde_json::from_value(json!({"rollout_percentage": 25})).unwrap();
    assert_eq!(ok.effective_rollout().value(), 25);
}

#[test]
fn test_submission_requires_non_empty_name() {
    let sub = FlagSubmission::new("   ", "desc", Scope::Frontend, "");
    assert!(sub.validate().is_err());
    let sub = FlagSubmission::new("dark-mode", "desc", Scope::Frontend, "");
    assert!(sub.validate().is_ok());
}

#[test]
fn test_flag_from_submission_starts_pending_without_risk() {
    let sub = FlagSubmission::new(" dark-mode ", "desc", Scope::Frontend, "css").with_created_by("ana");
    let flag = Flag::from_submission(&sub, Utc::now());
    assert_eq!(flag.status, FlagStatus::Pending);
    assert_eq!(flag.risk_level, None);
    assert_eq!(flag.name, "dark-mode");
    assert_eq!(flag.created_by, "ana");
    assert_eq!(flag.rollout(), RolloutPercentage::FULL);
}

#[test]
fn test_toggle_table() {
    assert_eq!(FlagStatus::Approved.toggled(), Some(FlagStatus::Active));
    assert_eq!(FlagStatus::Inactive.toggled(), Some(FlagStatus::Active));
    assert_eq!(FlagStatus::Active.toggled(), Some(FlagStatus::Inactive));
    assert_eq!(FlagStatus::Pending.toggled(), None);
    assert_eq!(FlagStatus::Rejected.toggled(), None);
}

#[test]
fn test_approver_mapping_is_one_to_one() {
    assert_eq!(ApproverTier::for_risk(RiskLevel::Low), ApproverTier::TeamLead);
    assert_eq!(ApproverTier::for_risk(RiskLevel::Medium), ApproverTier::SeniorEngineer);
    assert_eq!(ApproverTier::for_risk(RiskLevel::High), ApproverTier::EngineeringManager);
    assert_eq!(ApproverTier::for_risk(RiskLevel::Critical), ApproverTier::TopExecutive);
    assert_eq!(ApproverTier::DEFAULT.as_str(), "senior-engineer");
    assert_eq!(serde_json::to_value(ApproverTier::TopExecutive).unwrap(), json!("top-executive"));
}

#[test]
fn test_decision_outcome_is_case_insensitive() {
    assert_eq!("APPROVED".parse::<DecisionOutcome>().unwrap(), DecisionOutcome::Approved);
    assert_eq!("Rejected".parse::<DecisionOutcome>().unwrap(), DecisionOutcome::Rejected);
    assert!("maybe".parse::<DecisionOutcome>().is_err());
    assert!("pending".parse::<DecisionOutcome>().is_err());
}

#[test]
fn test_decided_approval_stamps_timestamp_and_comment() {
    let flag = Flag::from_submission(&FlagSubmission::new("f", "", Scope::Backend, ""), Utc::now());
    let approval = Approval::pending(flag.id, ApproverTier::TeamLead, Utc::now());
    assert!(approval.is_pending());
    let decided = approval.decided(DecisionOutcome::Rejected, "", Utc::now());
    assert_eq!(decided.status, ApprovalStatus::Rejected);
    assert_eq!(decided.comment.as_deref(), Some(""));
    assert!(decided.decided_at.is_some());
    assert_eq!(decided.id, approval.id);
}
