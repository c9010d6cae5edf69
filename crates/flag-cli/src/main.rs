//! flag-cli: operación del gate de feature flags contra Postgres.
//!
//! Códigos de salida: 0 ok, 2 uso, 3 valor inválido, 4 no encontrado o
//! conflicto, 5 backend/configuración.

mod args;

use flag_adapters::build_scorer;
use flag_core::{ApprovalFilter, WorkflowError};
use flag_domain::{ApprovalStatus, ApproverTier, FlagConfig, FlagStatus, FlagSubmission, Scope};
use flaggate::{pg_workflow, AppError, PgWorkflow, CONFIG};
use serde::Serialize;

use args::{ArgError, Args};

const USAGE: &str = "Uso: flag-cli <comando> [--opcion valor ...]
  score     --name N --scope S [--description D] [--code C]
  submit    --name N --scope S [--description D] [--code C] [--config JSON] [--by EMAIL]
  request   --flag UUID --approver TIER
  decide    --approval UUID --outcome approved|rejected [--comment TXT]
  toggle    --flag UUID
  rollout   --flag UUID --percentage 0-100
  show      --flag UUID
  list      [--status S]
  approvals [--flag UUID] [--approver TIER] [--status S]
  pending   --approver TIER
  events    --flag UUID
  check     --name N [--user U]
  check-all [--user U]";

enum CliError {
    Args(ArgError),
    App(AppError),
}

impl From<ArgError> for CliError {
    fn from(e: ArgError) -> Self {
        CliError::Args(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<WorkflowError> for CliError {
    fn from(e: WorkflowError) -> Self {
        CliError::App(e.into())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| CliError::App(AppError::Config(format!("serialize output: {e}"))))?;
    println!("{out}");
    Ok(())
}

fn submission_from(a: &Args) -> Result<FlagSubmission, CliError> {
    let scope: Scope = a.require_parsed("scope")?;
    let mut sub = FlagSubmission::new(a.require("name")?,
                                      a.get("description").unwrap_or_default(),
                                      scope,
                                      a.get("code").unwrap_or_default());
    if let Some(raw) = a.get("config") {
        let config: FlagConfig = serde_json::from_str(raw).map_err(|e| ArgError::Invalid { key: "config".into(),
                                                                                         reason: e.to_string() })?;
        sub = sub.with_config(config);
    }
    if let Some(by) = a.get("by") {
        sub = sub.with_created_by(by);
    }
    Ok(sub)
}

fn workflow() -> Result<PgWorkflow, CliError> {
    Ok(pg_workflow(&CONFIG)?)
}

fn run(a: &Args) -> Result<(), CliError> {
    match a.command.as_str() {
        // Puramente local: no requiere base de datos.
        "score" => {
            let scorer = build_scorer(&CONFIG.reasoner);
            let (assessment, source) = scorer.score_with_source(&submission_from(a)?);
            print_json(&serde_json::json!({ "assessment": assessment, "source": source }))
        }
        "submit" => {
            let sub = submission_from(a)?;
            print_json(&workflow()?.submit(sub)?)
        }
        "request" => {
            let flag = a.uuid("flag")?;
            let approver: ApproverTier = a.require_parsed("approver")?;
            print_json(&workflow()?.request_approval(flag, approver)?)
        }
        "decide" => {
            let approval = a.uuid("approval")?;
            let outcome = a.require("outcome")?;
            print_json(&workflow()?.decide(approval, outcome, a.get("comment").unwrap_or_default())?)
        }
        "toggle" => {
            let flag = a.uuid("flag")?;
            print_json(&workflow()?.toggle(flag)?)
        }
        "rollout" => {
            let flag = a.uuid("flag")?;
            let pct: i64 = a.require_parsed("percentage")?;
            print_json(&workflow()?.set_rollout(flag, pct)?)
        }
        "show" => {
            let flag = a.uuid("flag")?;
            print_json(&workflow()?.flag_details(flag)?)
        }
        "list" => {
            let status: Option<FlagStatus> = a.parsed("status")?;
            print_json(&workflow()?.list_flags(status)?)
        }
        "approvals" => {
            let filter = ApprovalFilter { status: a.parsed::<ApprovalStatus>("status")?,
                                          approver: a.parsed::<ApproverTier>("approver")?,
                                          flag_id: a.parsed("flag")? };
            print_json(&workflow()?.list_approvals(&filter)?)
        }
        "pending" => {
            let approver: ApproverTier = a.require_parsed("approver")?;
            print_json(&workflow()?.pending_for(approver)?)
        }
        "events" => {
            let flag = a.uuid("flag")?;
            print_json(&workflow()?.events_for(flag)?)
        }
        "check" => {
            let name = a.require("name")?;
            print_json(&workflow()?.check(name, a.get("user"))?)
        }
        "check-all" => print_json(&workflow()?.check_all(a.get("user"))?),
        other => Err(ArgError::Usage(format!("unknown command: {other}")).into()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("[flag-cli] {e}\n{USAGE}");
            std::process::exit(e.exit_code());
        }
    };
    match run(&args) {
        Ok(()) => std::process::exit(0),
        Err(CliError::Args(e)) => {
            eprintln!("[flag-cli {}] {e}", args.command);
            if e.exit_code() == 2 {
                eprintln!("{USAGE}");
            }
            std::process::exit(e.exit_code());
        }
        Err(CliError::App(e)) => {
            eprintln!("[flag-cli {}] {e}", args.command);
            std::process::exit(e.exit_code());
        }
    }
}
