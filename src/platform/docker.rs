// ABOUTME: Docker Engine implementation of the platform traits via bollard.
// ABOUTME: Builds from a tar context, tags and pushes, and recreates containers for rollouts.

use crate::platform::traits::{
    BuildError, BuildRequest, ImageBuild, PushError, RegistryAuth, RegistryPush, RolloutError,
    RolloutOps, RolloutSpec, RolloutStatus,
};
use crate::types::{ArtifactRef, DeploymentId, Digest, ImageRef};
use async_trait::async_trait;
use bollard::Docker;
use bollard::models::{
    ContainerCreateBody, ContainerStateStatusEnum, HealthStatusEnum, HostConfig, RestartPolicy,
    RestartPolicyNameEnum,
};
use bollard::query_parameters::{
    BuildImageOptions, CreateContainerOptions, InspectContainerOptions, PushImageOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions, TagImageOptions,
};
use bytes::Bytes;
use futures::StreamExt;
use std::path::Path;

pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn map_build_stream_error(e: bollard::errors::Error) -> BuildError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code >= 500 => BuildError::Engine(message.clone()),
        bollard::errors::Error::DockerResponseServerError { message, .. } => {
            BuildError::Failed(message.clone())
        }
        _ => BuildError::Engine(e.to_string()),
    }
}

fn map_tag_error(e: bollard::errors::Error, reference: &str) -> PushError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => {
            PushError::Failed(format!("{reference}: source image missing: {message}"))
        }
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code >= 500 => PushError::Unavailable(format!("{reference}: {message}")),
        bollard::errors::Error::DockerResponseServerError { message, .. } => {
            PushError::Failed(format!("{reference}: {message}"))
        }
        _ => PushError::Unavailable(format!("{reference}: {e}")),
    }
}

fn map_push_error(e: bollard::errors::Error, reference: &str) -> PushError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 401 || *status_code == 403 => {
            PushError::AuthenticationFailed(format!("{reference}: {message}"))
        }
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code >= 500 => PushError::Unavailable(format!("{reference}: {message}")),
        bollard::errors::Error::DockerResponseServerError { message, .. } => {
            PushError::Failed(format!("{reference}: {message}"))
        }
        _ => PushError::Unavailable(format!("{reference}: {e}")),
    }
}

/// Push failures often arrive inside the progress stream rather than as
/// HTTP errors; classify them by the daemon's message text.
fn push_item_error(message: &str, reference: &str) -> PushError {
    let lower = message.to_lowercase();
    if lower.contains("unauthorized")
        || lower.contains("authentication")
        || lower.contains("denied")
    {
        PushError::AuthenticationFailed(format!("{reference}: {message}"))
    } else {
        PushError::Failed(format!("{reference}: {message}"))
    }
}

fn map_rollout_error(e: bollard::errors::Error, deployment: &str) -> RolloutError {
    match &e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code == 404 => RolloutError::NotFound(format!("{deployment}: {message}")),
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } if *status_code >= 500 => RolloutError::Engine(format!("{deployment}: {message}")),
        bollard::errors::Error::DockerResponseServerError { message, .. } => {
            RolloutError::Failed(format!("{deployment}: {message}"))
        }
        _ => RolloutError::Engine(format!("{deployment}: {e}")),
    }
}

// =============================================================================
// DockerEngine
// =============================================================================

/// Container platform implementation backed by the Docker Engine API.
///
/// A rollout here means recreating the deployment's container under its
/// stable name with the new artifact and watching its state and health.
pub struct DockerEngine {
    client: Docker,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine connection failed: {0}")]
    ConnectionFailed(String),
}

impl DockerEngine {
    /// Connect to the engine socket (defaults to the local Docker socket).
    pub fn connect(socket: Option<&str>) -> Result<Self, EngineError> {
        let socket = socket.unwrap_or(DEFAULT_SOCKET);
        let client = Docker::connect_with_unix(socket, 120, bollard::API_DEFAULT_VERSION)
            .map_err(|e| EngineError::ConnectionFailed(e.to_string()))?;
        Ok(Self { client })
    }

    /// Verify the engine is reachable before a run starts.
    pub async fn ping(&self) -> Result<(), EngineError> {
        self.client
            .ping()
            .await
            .map_err(|e| EngineError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

/// Create a tar archive of the build context.
fn archive_context(dir: &Path) -> Result<Vec<u8>, BuildError> {
    let mut ar = tar::Builder::new(Vec::new());
    ar.append_dir_all(".", dir)
        .map_err(|e| BuildError::Context(format!("{}: {}", dir.display(), e)))?;
    ar.into_inner()
        .map_err(|e| BuildError::Context(e.to_string()))
}

#[async_trait]
impl ImageBuild for DockerEngine {
    async fn build_image(&self, request: &BuildRequest) -> Result<ArtifactRef, BuildError> {
        if !request.context.is_dir() {
            return Err(BuildError::Context(format!(
                "{} is not a directory",
                request.context.display()
            )));
        }

        let context = request.context.clone();
        let tar_data = tokio::task::spawn_blocking(move || archive_context(&context))
            .await
            .map_err(|e| BuildError::Context(e.to_string()))??;

        let tag = request.tag.to_string();

        let options = BuildImageOptions {
            dockerfile: request.dockerfile.clone(),
            t: Some(tag.clone()),
            buildargs: Some(request.args.clone()),
            labels: Some(request.labels.clone()),
            ..Default::default()
        };

        let body = bollard::body_full(Bytes::from(tar_data));

        // Build returns a stream of progress updates - consume it
        let mut stream = self.client.build_image(options, None, Some(body));
        while let Some(result) = stream.next().await {
            let output = result.map_err(map_build_stream_error)?;
            if let Some(detail) = output.error_detail {
                return Err(BuildError::Failed(
                    detail
                        .message
                        .unwrap_or_else(|| "unknown build error".to_string()),
                ));
            }
        }

        // The digest is the engine's content-addressable image id
        let inspect = self
            .client
            .inspect_image(&tag)
            .await
            .map_err(|e| BuildError::DigestUnavailable(format!("{tag}: {e}")))?;

        let id = inspect
            .id
            .ok_or_else(|| BuildError::DigestUnavailable(format!("{tag}: no image id")))?;

        let digest =
            Digest::parse(&id).map_err(|e| BuildError::DigestUnavailable(format!("{tag}: {e}")))?;

        Ok(ArtifactRef::new(digest, request.tag.clone()))
    }
}

#[async_trait]
impl RegistryPush for DockerEngine {
    async fn tag_image(
        &self,
        artifact: &ArtifactRef,
        reference: &ImageRef,
    ) -> Result<(), PushError> {
        let options = TagImageOptions {
            repo: Some(reference.repository()),
            tag: reference.tag().map(str::to_string),
            ..Default::default()
        };

        self.client
            .tag_image(artifact.digest().as_str(), Some(options))
            .await
            .map_err(|e| map_tag_error(e, &reference.to_string()))
    }

    async fn push_image(
        &self,
        reference: &ImageRef,
        auth: Option<&RegistryAuth>,
    ) -> Result<(), PushError> {
        let options = PushImageOptions {
            tag: reference.tag().map(str::to_string),
            ..Default::default()
        };

        let credentials = auth.map(|a| bollard::auth::DockerCredentials {
            username: Some(a.username.clone()),
            password: Some(a.password.expose().to_string()),
            serveraddress: a.server.clone(),
            ..Default::default()
        });

        let name = reference.repository();
        let display = reference.to_string();

        let mut stream = self.client.push_image(&name, Some(options), credentials);
        while let Some(result) = stream.next().await {
            let info = result.map_err(|e| map_push_error(e, &display))?;
            if let Some(detail) = info.error_detail {
                return Err(push_item_error(
                    &detail.message.unwrap_or_else(|| "unknown push error".to_string()),
                    &display,
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RolloutOps for DockerEngine {
    async fn apply_artifact(&self, spec: &RolloutSpec) -> Result<(), RolloutError> {
        let name = spec.deployment.as_str();

        // Replace any previous container holding the deployment name
        match self
            .client
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(_) => {
                let stop_options = StopContainerOptions {
                    t: Some(10),
                    signal: None,
                };
                if let Err(e) = self.client.stop_container(name, Some(stop_options)).await {
                    tracing::warn!("Failed to stop container {}: {}", name, e);
                }
                self.client
                    .remove_container(
                        name,
                        Some(RemoveContainerOptions {
                            force: true,
                            ..Default::default()
                        }),
                    )
                    .await
                    .map_err(|e| map_rollout_error(e, name))?;
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => {}
            Err(e) => return Err(map_rollout_error(e, name)),
        }

        let env: Vec<String> = spec.env.iter().map(|(k, v)| format!("{k}={v}")).collect();

        let mut labels = spec.labels.clone();
        labels.insert("slipway.service".to_string(), spec.service.to_string());
        labels.insert("slipway.managed".to_string(), "true".to_string());
        labels.insert(
            "slipway.digest".to_string(),
            spec.artifact.digest().to_string(),
        );

        let body = ContainerCreateBody {
            // Pin by image id so the container runs exactly the built artifact
            image: Some(spec.artifact.digest().to_string()),
            env: if env.is_empty() { None } else { Some(env) },
            labels: Some(labels),
            host_config: Some(HostConfig {
                restart_policy: Some(RestartPolicy {
                    name: Some(RestartPolicyNameEnum::UNLESS_STOPPED),
                    maximum_retry_count: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: Some(name.to_string()),
            ..Default::default()
        };

        let created = self
            .client
            .create_container(Some(options), body)
            .await
            .map_err(|e| map_rollout_error(e, name))?;

        if let Err(e) = self
            .client
            .start_container(&created.id, None::<StartContainerOptions>)
            .await
        {
            // Don't leave a created-but-never-started container behind
            let _ = self
                .client
                .remove_container(
                    &created.id,
                    Some(RemoveContainerOptions {
                        force: true,
                        ..Default::default()
                    }),
                )
                .await;
            return Err(map_rollout_error(e, name));
        }

        Ok(())
    }

    async fn rollout_status(
        &self,
        deployment: &DeploymentId,
    ) -> Result<RolloutStatus, RolloutError> {
        let details = match self
            .client
            .inspect_container(deployment.as_str(), None::<InspectContainerOptions>)
            .await
        {
            Ok(details) => details,
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => return Err(RolloutError::NotFound(deployment.to_string())),
            Err(e) => return Err(map_rollout_error(e, deployment.as_str())),
        };

        let state = details.state.as_ref();
        let status = state.and_then(|s| s.status);
        let health = state.and_then(|s| s.health.as_ref()).and_then(|h| h.status);

        let observed = match status {
            Some(ContainerStateStatusEnum::RUNNING) => match health {
                Some(HealthStatusEnum::STARTING) => RolloutStatus::Progressing,
                Some(HealthStatusEnum::UNHEALTHY) => {
                    RolloutStatus::Failed("container is unhealthy".to_string())
                }
                // Healthy, or no health check configured
                _ => RolloutStatus::Available,
            },
            Some(ContainerStateStatusEnum::CREATED)
            | Some(ContainerStateStatusEnum::RESTARTING) => RolloutStatus::Progressing,
            Some(ContainerStateStatusEnum::EXITED) | Some(ContainerStateStatusEnum::DEAD) => {
                let exit_code = state.and_then(|s| s.exit_code).unwrap_or_default();
                RolloutStatus::Failed(format!("container exited with code {exit_code}"))
            }
            Some(ContainerStateStatusEnum::PAUSED) => {
                RolloutStatus::Failed("container is paused".to_string())
            }
            _ => RolloutStatus::Progressing,
        };

        Ok(observed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_item_error_classifies_auth_failures() {
        let err = push_item_error(
            "unauthorized: incorrect username or password",
            "registry.example.com/acme/api:abc",
        );
        assert!(matches!(err, PushError::AuthenticationFailed(_)));

        let err = push_item_error("denied: requested access to the resource is denied", "r/x:y");
        assert!(matches!(err, PushError::AuthenticationFailed(_)));
    }

    #[test]
    fn push_item_error_treats_other_messages_as_failures() {
        let err = push_item_error("blob upload invalid", "registry.example.com/acme/api:abc");
        assert!(matches!(err, PushError::Failed(_)));
    }

    #[test]
    fn build_server_errors_map_by_status_code() {
        let engine_err = map_build_stream_error(bollard::errors::Error::DockerResponseServerError {
            status_code: 500,
            message: "daemon on fire".to_string(),
        });
        assert!(engine_err.is_transient());

        let build_err = map_build_stream_error(bollard::errors::Error::DockerResponseServerError {
            status_code: 400,
            message: "dockerfile parse error".to_string(),
        });
        assert!(!build_err.is_transient());
    }

    #[test]
    fn push_http_errors_map_by_status_code() {
        let auth = map_push_error(
            bollard::errors::Error::DockerResponseServerError {
                status_code: 401,
                message: "authentication required".to_string(),
            },
            "r/x:y",
        );
        assert!(matches!(auth, PushError::AuthenticationFailed(_)));

        let unavailable = map_push_error(
            bollard::errors::Error::DockerResponseServerError {
                status_code: 503,
                message: "registry warming up".to_string(),
            },
            "r/x:y",
        );
        assert!(unavailable.is_transient());
    }
}
