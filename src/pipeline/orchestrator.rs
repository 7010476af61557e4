// ABOUTME: Drives one pipeline run end to end: filter, steps, finalize, notify.
// ABOUTME: Notification is attempted exactly once for every non-skipped run.

use crate::config::TargetPlan;
use crate::notify::{Notifier, RunReport};
use crate::pipeline::error::{ErrorClass, StepError};
use crate::pipeline::run::{PipelineRun, RunStatus};
use crate::pipeline::state::Filtered;
use crate::pipeline::transitions::Exec;
use crate::pipeline::trigger::TriggerEvent;
use crate::platform::{ImageBuild, RegistryPush, RolloutOps};
use crate::secrets::SecretStore;

/// Execute one run against the given collaborators.
///
/// The returned run is always terminal: `Skipped` when the trigger does not
/// match the target's filter (no steps, no notification), `Succeeded` or
/// `Failed` otherwise. Notifier errors are logged and swallowed; they never
/// change the run.
pub async fn execute<V, P>(
    plan: TargetPlan,
    trigger: TriggerEvent,
    store: &V,
    platform: &P,
    notifier: Option<&dyn Notifier>,
) -> PipelineRun
where
    V: SecretStore + ?Sized,
    P: ImageBuild + RegistryPush + RolloutOps + ?Sized,
{
    let mut run = PipelineRun::new(plan.service.clone(), plan.target.clone(), trigger);

    // Filters are evaluated once, before any step
    if let Some(watch) = &plan.watch {
        if let Some(reason) = run.trigger().filtered_reason(watch) {
            tracing::debug!("Run {} skipped: {}", run.id(), reason);
            run.skip(reason);
            return run;
        }
    }

    let channel = plan.notify.as_ref().and_then(|n| n.channel.clone());
    let notify_on_success = plan.notify.as_ref().map(|n| n.on_success).unwrap_or(true);

    run.start();
    let (run, error) = match drive(Exec::new(run, plan), store, platform).await {
        Ok(run) => (run, None),
        Err((mut run, error)) => {
            run.finalize(RunStatus::Failed);
            (run, Some(error))
        }
    };

    if let Some(error) = &error {
        tracing::warn!("Run {} failed: {}", run.id(), error);
        if error.class() == ErrorClass::RolloutTimeout {
            tracing::warn!(
                "Rollout of {} unconfirmed at the deadline; the platform may still converge",
                run.service()
            );
        }
    }

    let wants_notification = match run.status() {
        RunStatus::Succeeded => notify_on_success,
        RunStatus::Failed => true,
        _ => false,
    };

    if wants_notification {
        if let Some(notifier) = notifier {
            let report = RunReport::for_run(&run, channel);
            if let Err(e) = notifier.notify(&report).await {
                tracing::warn!("Notification delivery failed: {}", e);
            }
        }
    }

    run
}

async fn drive<V, P>(
    exec: Exec<Filtered>,
    store: &V,
    platform: &P,
) -> Result<PipelineRun, (PipelineRun, StepError)>
where
    V: SecretStore + ?Sized,
    P: ImageBuild + RegistryPush + RolloutOps + ?Sized,
{
    let exec = exec.resolve_credentials(store).await?;
    let exec = exec.build_image(platform).await?;
    let exec = exec.publish(platform).await?;
    let exec = exec.run_rollout(platform).await?;
    Ok(exec.finish())
}
