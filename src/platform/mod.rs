// ABOUTME: Container platform layer: engine-neutral traits and the Docker implementation.
// ABOUTME: The pipeline depends on the traits; the CLI wires in a concrete engine.

mod docker;
pub mod traits;

pub use docker::{DEFAULT_SOCKET, DockerEngine, EngineError};
pub use traits::{
    BuildError, BuildRequest, ImageBuild, PushError, RegistryAuth, RegistryPush, RolloutError,
    RolloutOps, RolloutSpec, RolloutStatus,
};
