use crate::bootstrap::{self, App};
use anyhow::{bail, Context, Result};
use courtops_runtime::presets::{find_preset, preset_names};
use courtops_runtime::RunRequest;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub goal: Option<String>,
    pub preset: Option<String>,
    pub execute: bool,
    pub require: Vec<String>,
    pub user_id: Option<i64>,
}

/// Turn CLI arguments into a run request. A preset supplies the goal and its
/// required tools; extra `--require` names are appended.
pub fn build_request(args: &RunArgs) -> Result<RunRequest> {
    let mut request = match &args.preset {
        Some(name) => {
            let Some(preset) = find_preset(name) else {
                bail!(
                    "Unknown preset: {} (available: {})",
                    name,
                    preset_names().join(", ")
                );
            };
            RunRequest::from_preset(preset)
        }
        None => {
            let goal = args.goal.as_deref().map(str::trim).unwrap_or_default();
            if goal.is_empty() {
                bail!("goal or preset required");
            }
            RunRequest::new(goal)
        }
    };

    request = request.dry_run(!args.execute).require(args.require.iter().cloned());
    if let Some(user_id) = args.user_id {
        request = request.user(user_id);
    }
    Ok(request)
}

pub async fn run(app: &App, args: &RunArgs) -> Result<()> {
    let request = build_request(args)?;
    let model = bootstrap::model_client(&app.config)?;
    let orchestrator = app.orchestrator(model);

    if request.dry_run {
        info!("Dry run: tools are audited but not executed");
    }
    let result = orchestrator.run(request).await.context("Agent run failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_overrides_goal_and_merges_requirements() {
        let args = RunArgs {
            goal: Some("ignored".into()),
            preset: Some("change_request_docs".into()),
            require: vec!["sla_sweep".into(), "create_change_request".into()],
            ..Default::default()
        };
        let request = build_request(&args).unwrap();
        assert!(request.dry_run);
        assert!(request.goal.contains("change request"));
        assert_eq!(
            request.required_tools,
            vec!["create_change_request", "generate_change_request_docs", "sla_sweep"]
        );
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let args = RunArgs {
            preset: Some("weekly".into()),
            ..Default::default()
        };
        let err = build_request(&args).unwrap_err().to_string();
        assert!(err.contains("Unknown preset: weekly"));
        assert!(err.contains("daily_ops_demo"));
    }

    #[test]
    fn test_goal_required_without_preset() {
        let args = RunArgs {
            goal: Some("   ".into()),
            ..Default::default()
        };
        assert!(build_request(&args).is_err());
    }

    #[test]
    fn test_execute_and_user() {
        let args = RunArgs {
            goal: Some("Run SLA sweep".into()),
            execute: true,
            user_id: Some(3),
            ..Default::default()
        };
        let request = build_request(&args).unwrap();
        assert!(!request.dry_run);
        assert_eq!(request.user_id, Some(3));
        assert!(request.required_tools.is_empty());
    }
}
