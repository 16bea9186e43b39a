//! # Teleview Core
//!
//! Shared foundations for the Teleview crates: the error type, spatial pose
//! primitives and the session negotiation types exchanged between the
//! signaling and media layers.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod pose;
pub mod session;

// Re-export main types
pub use error::TeleviewError;
pub use pose::{Pose, Quat, Vec3};
pub use session::IceCandidate;
