//! EdgeFlow core types.
//!
//! Shared building blocks used by the device pipeline and the binaries:
//!
//! - [`event`]: readings, events and the value type tag
//! - [`publisher`]: the seam to the downstream event store
//! - [`eventbus`]: in-process broadcast publisher
//! - [`config`]: device service settings and environment overrides
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod event;
pub mod eventbus;
pub mod logging;
pub mod publisher;

pub use config::DeviceServiceConfig;
pub use event::{Event, Reading, ValueType};
pub use eventbus::{EventBus, EventBusReceiver};
pub use publisher::{PublishError, Publisher, SharedPublisher};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
