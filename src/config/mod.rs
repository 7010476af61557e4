// ABOUTME: Configuration types and parsing for slipway.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, and target merging.

mod env_value;
mod notify;
mod retry;
mod rollout;
mod target;
mod watch;

pub use env_value::{EnvValue, resolve_env_map};
pub use notify::NotifyConfig;
pub use retry::RetryConfig;
pub use rollout::RolloutConfig;
pub use target::Target;
pub use watch::WatchConfig;

use crate::error::{Error, Result};
use crate::types::{DeploymentId, ImageRef, SecretName, ServiceName};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "slipway.yml";
pub const CONFIG_FILENAME_ALT: &str = "slipway.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".slipway/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub service: ServiceName,

    #[serde(default = "default_context")]
    pub context: PathBuf,

    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,

    pub registry: RegistryConfig,

    pub vault: VaultConfig,

    #[serde(default)]
    pub watch: Option<WatchConfig>,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub secrets: Vec<SecretName>,

    #[serde(default)]
    pub rollout: RolloutConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub notify: Option<NotifyConfig>,

    #[serde(deserialize_with = "deserialize_targets")]
    pub targets: HashMap<String, Target>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub repository: ImageRef,

    #[serde(default)]
    pub username_secret: Option<SecretName>,

    #[serde(default)]
    pub password_secret: Option<SecretName>,
}

impl RegistryConfig {
    pub fn credential_names(&self) -> impl Iterator<Item = &SecretName> {
        self.username_secret
            .iter()
            .chain(self.password_secret.iter())
    }

    /// Credentials come in pairs; one name without the other would push
    /// anonymously, so it is rejected at load.
    fn validate(&self) -> Result<()> {
        match (&self.username_secret, &self.password_secret) {
            (Some(_), None) => Err(Error::InvalidConfig(
                "registry.password_secret is required when registry.username_secret is set"
                    .to_string(),
            )),
            (None, Some(_)) => Err(Error::InvalidConfig(
                "registry.username_secret is required when registry.password_secret is set"
                    .to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Whether a secret exists only to authenticate registry pushes.
    /// Such secrets never reach the rolled-out containers.
    pub fn is_credential(&self, name: &SecretName) -> bool {
        self.credential_names().any(|n| n == name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    pub url: String,
    pub token: EnvValue,

    /// KV v2 mount the service secrets live under.
    #[serde(default = "default_vault_mount")]
    pub mount: String,
}

fn default_vault_mount() -> String {
    "secret".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct BuildConfig {
    #[serde(default)]
    pub args: HashMap<String, EnvValue>,
}

fn default_context() -> PathBuf {
    PathBuf::from(".")
}

fn default_dockerfile() -> String {
    "Dockerfile".to_string()
}

/// Fully merged view of the pipeline for one target.
///
/// Produced by [`PipelineConfig::for_target`]; everything downstream of
/// config loading works off this.
#[derive(Debug, Clone)]
pub struct TargetPlan {
    pub service: ServiceName,
    pub target: String,
    pub deployment: DeploymentId,
    pub context: PathBuf,
    pub dockerfile: String,
    pub build_args: HashMap<String, EnvValue>,
    pub extra_tags: Vec<String>,
    pub env: HashMap<String, EnvValue>,
    pub secrets: Vec<SecretName>,
    pub registry: RegistryConfig,
    pub vault: VaultConfig,
    pub watch: Option<WatchConfig>,
    pub rollout: RolloutConfig,
    pub retry: RetryConfig,
    pub notify: Option<NotifyConfig>,
}

impl TargetPlan {
    /// Image references to push: the commit tag always comes first,
    /// followed by any extra tags configured on the target.
    pub fn publish_refs(&self, commit: &str) -> NonEmpty<ImageRef> {
        let repository = &self.registry.repository;
        let mut refs = NonEmpty::new(repository.with_tag(&commit_tag(commit)));
        for tag in &self.extra_tags {
            refs.push(repository.with_tag(tag));
        }
        refs
    }
}

/// Tag derived from a commit SHA, truncated the way registries
/// conventionally display short digests.
pub fn commit_tag(commit: &str) -> String {
    commit.chars().take(12).collect()
}

impl PipelineConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.registry.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn target_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn for_target(&self, name: &str) -> Result<TargetPlan> {
        let target = self
            .targets
            .get(name)
            .ok_or_else(|| Error::UnknownTarget(name.to_string()))?;

        // Deep merge env
        let mut env = self.env.clone();
        for (k, v) in &target.env {
            env.insert(k.clone(), v.clone());
        }

        // Shared secrets first, then target extras, then registry
        // credentials so the resolver always fetches them.
        let mut secrets = self.secrets.clone();
        for extra in target.secrets.iter().chain(self.registry.credential_names()) {
            if !secrets.contains(extra) {
                secrets.push(extra.clone());
            }
        }

        // Target filters replace the base filter entirely
        let watch = target.watch.clone().or_else(|| self.watch.clone());

        let rollout = target.rollout.clone().unwrap_or_else(|| self.rollout.clone());
        let retry = target.retry.clone().unwrap_or_else(|| self.retry.clone());

        Ok(TargetPlan {
            service: self.service.clone(),
            target: name.to_string(),
            deployment: target.deployment.clone(),
            context: self.context.clone(),
            dockerfile: self.dockerfile.clone(),
            build_args: self.build.args.clone(),
            extra_tags: target.tags.clone(),
            env,
            secrets,
            registry: self.registry.clone(),
            vault: self.vault.clone(),
            watch,
            rollout,
            retry,
            notify: self.notify.clone(),
        })
    }

    pub fn template() -> Self {
        PipelineConfig {
            service: ServiceName::new("my-app").unwrap(),
            context: default_context(),
            dockerfile: default_dockerfile(),
            registry: RegistryConfig {
                repository: ImageRef::parse("registry.example.com/my-app").unwrap(),
                username_secret: None,
                password_secret: None,
            },
            vault: VaultConfig {
                url: "https://vault.example.com:8200".to_string(),
                token: EnvValue::FromEnv {
                    var: "VAULT_TOKEN".to_string(),
                    default: None,
                },
                mount: default_vault_mount(),
            },
            watch: None,
            build: BuildConfig::default(),
            env: HashMap::new(),
            secrets: Vec::new(),
            rollout: RolloutConfig::default(),
            retry: RetryConfig::default(),
            notify: None,
            targets: HashMap::from([(
                "dev".to_string(),
                Target {
                    deployment: DeploymentId::new("my-app-dev"),
                    secrets: Vec::new(),
                    env: HashMap::new(),
                    tags: Vec::new(),
                    watch: None,
                    rollout: None,
                    retry: None,
                },
            )]),
        }
    }
}

pub fn init_config(
    dir: &Path,
    service: Option<&str>,
    repository: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let mut config = PipelineConfig::template();

    if let Some(s) = service {
        config.service = ServiceName::new(s).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    if let Some(r) = repository {
        config.registry.repository =
            ImageRef::parse(r).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    }

    let yaml = generate_template_yaml(&config);
    std::fs::write(&config_path, yaml)?;

    Ok(())
}

fn generate_template_yaml(config: &PipelineConfig) -> String {
    format!(
        r#"service: {service}

registry:
  repository: {repository}

vault:
  url: {vault_url}
  token:
    env: VAULT_TOKEN

targets:
  dev:
    deployment: {service}-dev
"#,
        service = config.service,
        repository = config.registry.repository.repository(),
        vault_url = config.vault.url,
    )
}

// Custom deserializers

fn deserialize_targets<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<String, Target>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let targets = HashMap::<String, Target>::deserialize(deserializer)?;
    if targets.is_empty() {
        return Err(serde::de::Error::custom("at least one target is required"));
    }
    Ok(targets)
}
