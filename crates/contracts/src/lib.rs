//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate, never the other way around.
//!
//! ## Endpoint model
//! - A source is any [`Readable`], a sink any [`Writable`]
//! - Each exposes a channel handle plus a close-on-end-of-stream flag
//! - [`PolicyExt`] overrides those flags without touching the original value

mod blueprint;
mod endpoint;
mod error;
mod policy;

pub use blueprint::*;
pub use endpoint::*;
pub use error::*;
pub use policy::*;
