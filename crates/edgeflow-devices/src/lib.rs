//! Device value pipeline.
//!
//! This crate turns raw driver values into events for the data store.
//!
//! ## Architecture
//!
//! - **value**: `TypedValue` / `Scalar`, the closed set of device value types
//! - **profile**: devices, profiles, resources and their `TransformSpec`
//! - **registry**: `MetadataResolver` and the in-memory `DeviceRegistry`
//! - **transform**: offset/scale/base arithmetic in read and write direction
//! - **assertion** / **mapping** / **reading**: the remaining per-value steps
//! - **ingestion**: the single-consumer loop that drives a batch through the
//!   steps and publishes one event per batch
//! - **command**: write-path conversion of command parameters
//!
//! ```text
//! driver ──▶ queue ──▶ IngestionLoop ──▶ transform ─▶ assert ─▶ map ─▶ reading
//!                                                                        │
//!                                         Publisher ◀── Event ◀──────────┘
//! ```

pub mod assertion;
pub mod command;
pub mod ingestion;
pub mod mapping;
mod numeric;
pub mod profile;
pub mod reading;
pub mod registry;
pub mod transform;
pub mod value;

pub use assertion::{check_assertion, AssertionError};
pub use command::{prepare_resource_write, prepare_write, CommandError};
pub use ingestion::{
    ingestion_channel, stop_channel, AsyncResult, IngestionError, IngestionLoop,
    IngestionReceiver, IngestionSender, IngestionStats, LoopState, StatsSnapshot, StopHandle,
    StopSignal, ValueOutcome,
};
pub use mapping::map_value;
pub use profile::{Device, Profile, ReadWrite, Resource, TransformSpec, ValueMapping};
pub use reading::to_reading;
pub use registry::{DeviceRegistry, MetadataResolver, RegistryError, SharedResolver};
pub use transform::{transform, transform_read, transform_write, Direction, Step, TransformError};
pub use value::{Scalar, TypedValue, ValueError};
