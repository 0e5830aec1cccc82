//! Bundled [`FrameSource`](crate::FrameSource) implementations.

pub mod manual;
#[cfg(feature = "tokio")]
pub mod ticker;
#[cfg(feature = "web")]
pub mod web;

pub use manual::ManualFrameSource;
#[cfg(feature = "tokio")]
pub use ticker::TokioFrameSource;
#[cfg(feature = "web")]
pub use web::AnimationFrameSource;
