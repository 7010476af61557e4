// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod artifact;
mod id;
mod image_ref;
mod secret_name;
mod service_name;

pub use artifact::{ArtifactRef, Digest, DigestError};
pub use id::{ContainerId, DeploymentId, RunId};
pub use image_ref::{ImageRef, ImageRefError};
pub use secret_name::{SecretName, SecretNameError};
pub use service_name::{ServiceName, ServiceNameError};
