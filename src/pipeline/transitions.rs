// ABOUTME: State transition methods for pipeline execution.
// ABOUTME: Each step consumes the execution and returns the next state on success.

use std::collections::HashMap;

use crate::config::{RetryConfig, TargetPlan, resolve_env_map};
use crate::pipeline::controller::{RolloutOutcome, watch_rollout};
use crate::pipeline::error::StepError;
use crate::pipeline::run::{PipelineRun, RunStatus, StepName, StepStatus};
use crate::pipeline::state::{Built, Filtered, Published, Resolved, RolledOut};
use crate::platform::{
    BuildError, BuildRequest, ImageBuild, PushError, RegistryAuth, RegistryPush, RolloutOps,
    RolloutSpec,
};
use crate::retry::with_retries;
use crate::secrets::{SecretBundle, SecretStore, VaultError, resolve_secrets};
use crate::types::{ArtifactRef, ImageRef};

/// Result type for transitions: failure hands the run back for finalization.
pub type TransitionResult<T> = Result<Exec<T>, (PipelineRun, StepError)>;

/// One pipeline execution moving through its steps.
///
/// The state parameter makes step order a compile-time property: secrets
/// exist only after resolve, an artifact only after build, and the rollout
/// can only see a published artifact.
pub struct Exec<S> {
    run: PipelineRun,
    plan: TargetPlan,
    state: S,
}

// =============================================================================
// Internal Helpers
// =============================================================================

/// Record the step failure on the run and hand both back to the caller.
fn fail(mut run: PipelineRun, name: StepName, error: StepError) -> (PipelineRun, StepError) {
    let status = match &error {
        StepError::RolloutTimedOut { .. } => StepStatus::TimedOut,
        _ => StepStatus::Failed,
    };
    run.finish_step(name, status, Some(error.to_string()));
    (run, error)
}

fn build_request(plan: &TargetPlan, commit: &str) -> Result<BuildRequest, StepError> {
    let mut args = resolve_env_map(&plan.build_args)?;
    args.insert("VCS_REF".to_string(), commit.to_string());

    let labels = HashMap::from([(
        "org.opencontainers.image.revision".to_string(),
        commit.to_string(),
    )]);

    Ok(BuildRequest {
        context: plan.context.clone(),
        dockerfile: plan.dockerfile.clone(),
        tag: plan.publish_refs(commit).head,
        args,
        labels,
    })
}

fn registry_auth(plan: &TargetPlan, secrets: &SecretBundle) -> Option<RegistryAuth> {
    let username_name = plan.registry.username_secret.as_ref()?;
    let password_name = plan.registry.password_secret.as_ref()?;
    let username = secrets.get(username_name)?.expose().to_string();
    let password = secrets.get(password_name)?.clone();
    Some(RegistryAuth {
        username,
        password,
        server: plan.registry.repository.registry().map(String::from),
    })
}

/// Environment for the rolled-out containers: resolved config env plus the
/// secret bundle, minus registry credentials (those never reach containers).
fn rollout_env(
    plan: &TargetPlan,
    secrets: &SecretBundle,
) -> Result<HashMap<String, String>, StepError> {
    let mut env = resolve_env_map(&plan.env)?;
    for name in secrets.names() {
        if plan.registry.is_credential(name) {
            continue;
        }
        if let Some(value) = secrets.get(name) {
            env.insert(name.as_str().to_string(), value.expose().to_string());
        }
    }
    Ok(env)
}

async fn push_destination<P>(
    registry: &P,
    artifact: &ArtifactRef,
    destination: &ImageRef,
    auth: Option<&RegistryAuth>,
    retry: &RetryConfig,
) -> Result<(), PushError>
where
    P: RegistryPush + ?Sized,
{
    registry.tag_image(artifact, destination).await?;
    with_retries("Registry push", retry, PushError::is_transient, || {
        registry.push_image(destination, auth)
    })
    .await
}

// =============================================================================
// Filtered -> Resolved
// =============================================================================

impl Exec<Filtered> {
    /// Start an execution whose trigger already passed the target filter.
    pub fn new(run: PipelineRun, plan: TargetPlan) -> Self {
        Exec {
            run,
            plan,
            state: Filtered,
        }
    }

    /// Resolve every required secret from the store.
    ///
    /// Transport failures are retried inside the resolver; a missing or
    /// denied secret fails the step immediately.
    #[must_use = "execution state must be used"]
    pub async fn resolve_credentials<V>(self, store: &V) -> TransitionResult<Resolved>
    where
        V: SecretStore + ?Sized,
    {
        let Exec { mut run, plan, .. } = self;
        run.start_step(StepName::Resolve);

        match resolve_secrets(store, &plan.secrets, &plan.retry).await {
            Ok(secrets) => {
                // A store may answer without actually holding every name
                if let Some(name) = plan.secrets.iter().find(|n| secrets.get(n).is_none()) {
                    let error = StepError::from(VaultError::SecretMissing(name.clone()));
                    return Err(fail(run, StepName::Resolve, error));
                }
                run.finish_step(StepName::Resolve, StepStatus::Succeeded, None);
                Ok(Exec {
                    run,
                    plan,
                    state: Resolved { secrets },
                })
            }
            Err(e) => Err(fail(run, StepName::Resolve, e.into())),
        }
    }
}

// =============================================================================
// Resolved -> Built
// =============================================================================

impl Exec<Resolved> {
    /// Build the image from the target's context, tagged for the commit.
    ///
    /// `VCS_REF` is injected into the build args; engine-level transport
    /// failures are retried under the target's policy.
    #[must_use = "execution state must be used"]
    pub async fn build_image<B>(self, builder: &B) -> TransitionResult<Built>
    where
        B: ImageBuild + ?Sized,
    {
        let Exec {
            mut run,
            plan,
            state,
        } = self;
        run.start_step(StepName::Build);

        let commit = run.trigger().commit.clone();
        let request = match build_request(&plan, &commit) {
            Ok(request) => request,
            Err(e) => return Err(fail(run, StepName::Build, e)),
        };

        let result = with_retries("Image build", &plan.retry, BuildError::is_transient, || {
            builder.build_image(&request)
        })
        .await;

        match result {
            Ok(artifact) => {
                run.finish_step(
                    StepName::Build,
                    StepStatus::Succeeded,
                    Some(artifact.digest().to_string()),
                );
                Ok(Exec {
                    run,
                    plan,
                    state: Built {
                        secrets: state.secrets,
                        artifact,
                    },
                })
            }
            Err(e) => Err(fail(run, StepName::Build, e.into())),
        }
    }
}

// =============================================================================
// Built -> Published
// =============================================================================

impl Exec<Built> {
    /// Tag and push the artifact to every destination, in order.
    ///
    /// Every destination is attempted even after a failure so the step
    /// detail records the full picture; any failure fails the step.
    #[must_use = "execution state must be used"]
    pub async fn publish<P>(self, registry: &P) -> TransitionResult<Published>
    where
        P: RegistryPush + ?Sized,
    {
        let Exec {
            mut run,
            plan,
            state,
        } = self;
        run.start_step(StepName::Publish);
        let Built { secrets, artifact } = state;

        let auth = registry_auth(&plan, &secrets);
        let commit = run.trigger().commit.clone();
        let destinations = plan.publish_refs(&commit);

        let mut outcomes = Vec::new();
        let mut first_error: Option<PushError> = None;
        for destination in destinations.iter() {
            match push_destination(registry, &artifact, destination, auth.as_ref(), &plan.retry)
                .await
            {
                Ok(()) => outcomes.push(format!("{destination}: pushed")),
                Err(e) => {
                    outcomes.push(format!("{destination}: failed ({e})"));
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        let detail = outcomes.join("; ");
        match first_error {
            None => {
                run.finish_step(StepName::Publish, StepStatus::Succeeded, Some(detail));
                Ok(Exec {
                    run,
                    plan,
                    state: Published { secrets, artifact },
                })
            }
            Some(e) => {
                run.finish_step(StepName::Publish, StepStatus::Failed, Some(detail));
                Err((run, StepError::from(e)))
            }
        }
    }
}

// =============================================================================
// Published -> RolledOut
// =============================================================================

impl Exec<Published> {
    /// Apply the artifact to the deployment and watch until confirmed.
    #[must_use = "execution state must be used"]
    pub async fn run_rollout<R>(self, platform: &R) -> TransitionResult<RolledOut>
    where
        R: RolloutOps + ?Sized,
    {
        let Exec {
            mut run,
            plan,
            state,
        } = self;
        run.start_step(StepName::Rollout);
        let Published { secrets, artifact } = state;

        let env = match rollout_env(&plan, &secrets) {
            Ok(env) => env,
            Err(e) => return Err(fail(run, StepName::Rollout, e)),
        };

        let spec = RolloutSpec {
            deployment: plan.deployment.clone(),
            service: plan.service.clone(),
            artifact: artifact.clone(),
            env,
            labels: HashMap::new(),
        };

        let outcome = watch_rollout(
            platform,
            &spec,
            plan.rollout.timeout,
            plan.rollout.poll_interval,
        )
        .await;

        match outcome {
            RolloutOutcome::Succeeded => {
                run.finish_step(
                    StepName::Rollout,
                    StepStatus::Succeeded,
                    Some(format!("serving {}", artifact.digest())),
                );
                Ok(Exec {
                    run,
                    plan,
                    state: RolledOut,
                })
            }
            RolloutOutcome::Failed(reason) => Err(fail(
                run,
                StepName::Rollout,
                StepError::RolloutFailed { reason },
            )),
            RolloutOutcome::TimedOut => Err(fail(
                run,
                StepName::Rollout,
                StepError::RolloutTimedOut {
                    elapsed: plan.rollout.timeout,
                },
            )),
        }
    }
}

// =============================================================================
// RolledOut - Terminal State
// =============================================================================

impl Exec<RolledOut> {
    /// Consume the execution and return the finalized run.
    pub fn finish(self) -> PipelineRun {
        let Exec { mut run, .. } = self;
        run.finalize(RunStatus::Succeeded);
        run
    }
}
