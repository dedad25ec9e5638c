//! The render host capability and the graphs built against it.
//!
//! Builders never reach for a global audio context: they receive a
//! [`RenderHost`] and ask it for nodes, connections and automation. Two
//! hosts ship with the crate:
//!
//! - [`RenderContext`] renders blocks of audio (offline or from a device
//!   callback) and owns the nodes of every scheduled effect.
//! - [`RecordingHost`] renders nothing and records every call, for dry runs
//!   and tests.

/// Block renderer implementing the host capability.
pub mod context;
/// Node handles, parameters and the `RenderHost` trait.
pub mod node;
/// Call-recording host.
pub mod recording;

pub use context::RenderContext;
pub use node::{NodeId, NodeKind, Param, RenderHost};
pub use recording::{HostCall, RecordingHost, ScheduledSource};
