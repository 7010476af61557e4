// ABOUTME: Composable capability traits for the container platform.
// ABOUTME: Defines ImageBuild, RegistryPush, and RolloutOps.

mod build;
mod publish;
mod rollout;
mod shared_types;

pub use build::{BuildError, BuildRequest, ImageBuild};
pub use publish::{PushError, RegistryPush};
pub use rollout::{RolloutError, RolloutOps, RolloutSpec, RolloutStatus};
pub use shared_types::RegistryAuth;
