// ABOUTME: In-memory fakes for the secret store, container platform, and notifier.
// ABOUTME: Each fake records its calls so tests can assert ordering and counts.

use async_trait::async_trait;
use parking_lot::Mutex;
use slipway::notify::{Notifier, NotifyError, RunReport};
use slipway::platform::{
    BuildError, BuildRequest, ImageBuild, PushError, RegistryAuth, RegistryPush, RolloutError,
    RolloutOps, RolloutSpec, RolloutStatus,
};
use slipway::secrets::{SecretStore, SecretValue, VaultError};
use slipway::types::{ArtifactRef, DeploymentId, Digest, ImageRef, SecretName};
use std::collections::{HashMap, VecDeque};

pub const FAKE_DIGEST: &str =
    "sha256:4f5e6d7c8b9a0f1e2d3c4b5a69788796a5b4c3d2e1f00f1e2d3c4b5a69788796";

/// Secret store backed by a map, with an optional budget of transient
/// failures served before the real answers.
pub struct FakeStore {
    values: HashMap<String, String>,
    transient_failures: Mutex<u32>,
    fetch_count: Mutex<u32>,
}

impl FakeStore {
    pub fn new(values: &[(&str, &str)]) -> Self {
        Self {
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            transient_failures: Mutex::new(0),
            fetch_count: Mutex::new(0),
        }
    }

    /// The first `failures` fetches answer with a transient error.
    pub fn failing_first(self, failures: u32) -> Self {
        *self.transient_failures.lock() = failures;
        self
    }

    pub fn fetches(&self) -> u32 {
        *self.fetch_count.lock()
    }
}

#[async_trait]
impl SecretStore for FakeStore {
    async fn fetch(&self, name: &SecretName) -> Result<SecretValue, VaultError> {
        *self.fetch_count.lock() += 1;
        {
            let mut remaining = self.transient_failures.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(VaultError::Unavailable("connection reset".to_string()));
            }
        }
        match self.values.get(name.as_str()) {
            Some(value) => Ok(SecretValue::new(value.clone())),
            None => Err(VaultError::SecretMissing(name.clone())),
        }
    }
}

/// Container platform fake covering build, push, and rollout.
///
/// Calls across all three traits land in one log so cross-step ordering
/// is assertable.
pub struct FakePlatform {
    calls: Mutex<Vec<String>>,
    build_transient_failures: Mutex<u32>,
    push_transient_failures: Mutex<u32>,
    failing_destinations: Vec<String>,
    apply_failure: Option<String>,
    rollout_script: Mutex<VecDeque<RolloutStatus>>,
    settled_status: RolloutStatus,
}

impl FakePlatform {
    /// A platform where everything succeeds on the first try.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            build_transient_failures: Mutex::new(0),
            push_transient_failures: Mutex::new(0),
            failing_destinations: Vec::new(),
            apply_failure: None,
            rollout_script: Mutex::new(VecDeque::new()),
            settled_status: RolloutStatus::Available,
        }
    }

    /// The first `failures` build calls answer with an engine error.
    pub fn build_flaking(self, failures: u32) -> Self {
        *self.build_transient_failures.lock() = failures;
        self
    }

    /// The first `failures` push calls answer with a transport error.
    pub fn push_flaking(self, failures: u32) -> Self {
        *self.push_transient_failures.lock() = failures;
        self
    }

    /// Pushes to destinations containing `fragment` are rejected outright.
    pub fn rejecting_pushes_to(mut self, fragment: &str) -> Self {
        self.failing_destinations.push(fragment.to_string());
        self
    }

    pub fn failing_apply(mut self, reason: &str) -> Self {
        self.apply_failure = Some(reason.to_string());
        self
    }

    /// Status probes drain `script` in order, then repeat `settled`.
    pub fn with_rollout(self, script: &[RolloutStatus], settled: RolloutStatus) -> Self {
        *self.rollout_script.lock() = script.iter().cloned().collect();
        Self {
            settled_status: settled,
            ..self
        }
    }

    /// The deployment keeps progressing and never reaches a terminal state.
    pub fn never_settling(self) -> Self {
        Self {
            settled_status: RolloutStatus::Progressing,
            ..self
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ImageBuild for FakePlatform {
    async fn build_image(&self, request: &BuildRequest) -> Result<ArtifactRef, BuildError> {
        self.record(format!("build {}", request.tag));
        {
            let mut remaining = self.build_transient_failures.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BuildError::Engine("socket hangup".to_string()));
            }
        }
        let digest = Digest::parse(FAKE_DIGEST).map_err(|e| BuildError::Failed(e.to_string()))?;
        Ok(ArtifactRef::new(digest, request.tag.clone()))
    }
}

#[async_trait]
impl RegistryPush for FakePlatform {
    async fn tag_image(
        &self,
        _artifact: &ArtifactRef,
        reference: &ImageRef,
    ) -> Result<(), PushError> {
        self.record(format!("tag {reference}"));
        Ok(())
    }

    async fn push_image(
        &self,
        reference: &ImageRef,
        _auth: Option<&RegistryAuth>,
    ) -> Result<(), PushError> {
        self.record(format!("push {reference}"));
        {
            let mut remaining = self.push_transient_failures.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PushError::Unavailable("connection reset".to_string()));
            }
        }
        let destination = reference.to_string();
        if self
            .failing_destinations
            .iter()
            .any(|fragment| destination.contains(fragment.as_str()))
        {
            return Err(PushError::Failed("registry rejected manifest".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RolloutOps for FakePlatform {
    async fn apply_artifact(&self, spec: &RolloutSpec) -> Result<(), RolloutError> {
        self.record(format!("apply {} {}", spec.deployment, spec.artifact.digest()));
        match &self.apply_failure {
            Some(reason) => Err(RolloutError::Failed(reason.clone())),
            None => Ok(()),
        }
    }

    async fn rollout_status(
        &self,
        deployment: &DeploymentId,
    ) -> Result<RolloutStatus, RolloutError> {
        self.record(format!("status {deployment}"));
        let scripted = self.rollout_script.lock().pop_front();
        Ok(scripted.unwrap_or_else(|| self.settled_status.clone()))
    }
}

/// Notifier that keeps every report it is handed.
pub struct RecordingNotifier {
    reports: Mutex<Vec<RunReport>>,
    fail_delivery: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            fail_delivery: false,
        }
    }

    /// A notifier whose deliveries always error after recording.
    pub fn failing() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            fail_delivery: true,
        }
    }

    pub fn reports(&self) -> Vec<RunReport> {
        self.reports.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, report: &RunReport) -> Result<(), NotifyError> {
        self.reports.lock().push(report.clone());
        if self.fail_delivery {
            return Err(NotifyError::Delivery("connection refused".to_string()));
        }
        Ok(())
    }
}
