// ABOUTME: Run command implementation.
// ABOUTME: Wires config, vault, engine, and notifier into one pipeline run.

use slipway::config::{PipelineConfig, TargetPlan, commit_tag};
use slipway::error::{Error, Result};
use slipway::notify::{Notifier, RunReport, WebhookNotifier};
use slipway::output::Output;
use slipway::pipeline::{self, PipelineRun, RunStatus, TriggerEvent};
use slipway::platform::DockerEngine;
use slipway::secrets::VaultClient;
use std::env;

/// Execute one pipeline run for the given trigger.
///
/// Returns the terminal run status; the caller maps it to an exit code.
pub async fn run(
    environment: String,
    trigger: TriggerEvent,
    socket: Option<String>,
    mut output: Output,
) -> Result<RunStatus> {
    output.start_timer();

    let cwd = env::current_dir()?;
    let config = PipelineConfig::discover(&cwd)?;
    let plan = config.for_target(&environment)?;

    let service = plan.service.clone();

    output.progress(&format!(
        "Deploying {} to {} (commit {})",
        service,
        plan.target,
        commit_tag(&trigger.commit)
    ));

    // The notifier comes up before the engine and vault so failures in
    // either still produce a report.
    let webhook = match &plan.notify {
        Some(notify) => {
            let url = notify.webhook.resolve()?;
            Some(WebhookNotifier::new(url).map_err(|e| Error::Notify(e.to_string()))?)
        }
        None => None,
    };
    let notifier = webhook.as_ref().map(|n| n as &dyn Notifier);

    output.progress("  → Connecting to container engine...");
    let engine = match connect_engine(socket.as_deref()).await {
        Ok(engine) => engine,
        Err(error) => return abort_setup(plan, trigger, notifier, error).await,
    };

    let store = match VaultClient::new(&plan.vault) {
        Ok(store) => store,
        Err(error) => return abort_setup(plan, trigger, notifier, error).await,
    };

    output.progress("  → Running pipeline...");
    let run = pipeline::execute(plan, trigger, &store, &engine, notifier).await;

    output.record(&run);

    match run.status() {
        RunStatus::Succeeded => {
            output.success(&format!("Deployed {service} to {environment}"));
        }
        RunStatus::Skipped => {
            let reason = run.skip_reason().unwrap_or("filter did not match");
            output.success(&format!("Run skipped: {reason}"));
        }
        _ => {
            match run.failing_step() {
                Some(step) => {
                    let detail = step.detail.as_deref().unwrap_or("no detail");
                    output.error(&format!("{} step {}: {}", step.name, step.status, detail));
                }
                None => output.error("Run failed before any step"),
            }
            if run.timed_out() {
                output.warning(
                    "Rollout unconfirmed at the deadline; the platform may still converge",
                );
            }
        }
    }

    Ok(run.status())
}

async fn connect_engine(socket: Option<&str>) -> Result<DockerEngine> {
    let engine = DockerEngine::connect(socket).map_err(|e| Error::Engine(e.to_string()))?;
    engine.ping().await.map_err(|e| Error::Engine(e.to_string()))?;
    Ok(engine)
}

/// Setup failures terminate the run, but a notification is still
/// attempted before the error propagates.
async fn abort_setup(
    plan: TargetPlan,
    trigger: TriggerEvent,
    notifier: Option<&dyn Notifier>,
    error: Error,
) -> Result<RunStatus> {
    tracing::warn!("Run setup failed: {}", error);
    if let Some(notifier) = notifier {
        let channel = plan.notify.as_ref().and_then(|n| n.channel.clone());
        let mut run = PipelineRun::new(plan.service, plan.target, trigger);
        run.start();
        run.finalize(RunStatus::Failed);
        let report = RunReport::for_setup_failure(&run, &error, channel);
        if let Err(e) = notifier.notify(&report).await {
            tracing::warn!("Notification delivery failed: {}", e);
        }
    }
    Err(error)
}
