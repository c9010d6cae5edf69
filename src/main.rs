//! Demo en memoria del ciclo completo: envío, evaluación de riesgo,
//! aprobación, activación y rollout por usuario.
//!
//! `RUST_LOG=debug cargo run --bin flaggate-demo` muestra el detalle del
//! scorer y del workflow.

use env_logger::Env;
use flag_domain::{FlagConfig, FlagSubmission, RolloutPercentage, Scope};
use flaggate::{memory_workflow, AppError, CONFIG};

fn run() -> Result<(), AppError> {
    let wf = memory_workflow(&CONFIG);

    let submissions = vec![
        FlagSubmission::new("dark-mode", "dark mode toggle", Scope::Frontend, "css variables").with_created_by("design@example.com"),
        FlagSubmission::new("checkout-v2", "new payment page with stripe", Scope::Backend, "add billing client")
            .with_config(FlagConfig::default().with_rollout(RolloutPercentage::try_from(30_i64).map_err(flag_core::WorkflowError::from)?)),
        FlagSubmission::new("purge-legacy", "drop table of legacy sessions", Scope::Database, "DROP TABLE sessions_v1;"),
    ];

    let mut approvals = Vec::new();
    for sub in submissions {
        let out = wf.submit(sub)?;
        let (score, source) = out.assessment
                                 .as_ref()
                                 .map(|r| (r.assessment.risk_score(), r.source.as_str()))
                                 .unwrap_or((0, "none"));
        println!("{:<14} risk={:<8} score={:<3} source={:<8} approver={}",
                 out.flag.name,
                 out.flag.risk_level.map_or("-", |l| l.as_str()),
                 score,
                 source,
                 out.approval.approver);
        approvals.push(out);
    }

    // Aprobamos las dos primeras y rechazamos la destructiva.
    for (i, out) in approvals.iter().enumerate() {
        let outcome = if i < 2 { "approved" } else { "rejected" };
        let decision = wf.decide(out.approval.id, outcome, "demo")?;
        println!("decided {:<14} -> {}", decision.flag.name, decision.flag.status);
    }
    for out in approvals.iter().take(2) {
        wf.toggle(out.flag.id)?;
    }

    let users: Vec<String> = (1..=8).map(|i| format!("user_{i}")).collect();
    for user in &users {
        let flags = wf.check_all(Some(user))?;
        println!("{user}: {}", serde_json::to_string(&flags).unwrap_or_default());
    }
    let eval = wf.check("purge-legacy", Some("user_1"))?;
    println!("purge-legacy for user_1: enabled={} ({})", eval.enabled, eval.reason);

    let cohort: Vec<String> = (0..10_000).map(|i| format!("cohort-{i}")).collect();
    let preview = wf.preview_rollout("checkout-v2", &cohort)?;
    println!("checkout-v2 preview: {}/{} users enabled", preview.enabled, preview.total);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
