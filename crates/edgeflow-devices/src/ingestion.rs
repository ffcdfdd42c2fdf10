//! Asynchronous ingestion loop.
//!
//! Drivers push [`AsyncResult`] batches into a bounded queue. A single
//! [`IngestionLoop`] drains it in arrival order, runs every value through
//! transform → assertion → mapping → reading, and publishes one event per
//! batch.
//!
//! ## Failure handling
//!
//! Nothing that happens to a batch stops the loop:
//!
//! | Condition            | Scope  | Effect                                   |
//! |----------------------|--------|------------------------------------------|
//! | unknown device       | batch  | batch skipped, no event                  |
//! | unknown resource     | value  | value skipped                            |
//! | transform error      | value  | reading carries a failure description    |
//! | assertion mismatch   | value  | reading carries a failure description    |
//! | mapping miss         | value  | unmapped value kept, warning logged      |
//! | publish error        | batch  | event dropped, error logged              |
//!
//! The loop ends only on the stop signal or when every queue sender is gone.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use edgeflow_core::{DeviceServiceConfig, Event, Reading, SharedPublisher};

use crate::assertion::check_assertion;
use crate::mapping::map_value;
use crate::profile::{Device, Resource};
use crate::reading::to_reading;
use crate::registry::SharedResolver;
use crate::transform::transform_read;
use crate::value::TypedValue;

/// Values produced by one driver invocation for one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncResult {
    pub device_name: String,
    #[serde(default)]
    pub values: Vec<TypedValue>,
}

impl AsyncResult {
    pub fn new(device_name: impl Into<String>, values: Vec<TypedValue>) -> Self {
        Self {
            device_name: device_name.into(),
            values,
        }
    }
}

/// Errors pushing batches onto the ingestion queue.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    /// The ingestion loop is gone
    #[error("Ingestion queue closed")]
    Closed,
}

/// Driver-side handle of the ingestion queue.
#[derive(Clone)]
pub struct IngestionSender {
    tx: mpsc::Sender<AsyncResult>,
}

impl IngestionSender {
    /// Queue a batch, waiting for capacity.
    pub async fn send(&self, batch: AsyncResult) -> Result<(), IngestionError> {
        self.tx.send(batch).await.map_err(|_| IngestionError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Loop-side end of the ingestion queue.
pub type IngestionReceiver = mpsc::Receiver<AsyncResult>;

/// Create the bounded ingestion queue.
pub fn ingestion_channel(capacity: usize) -> (IngestionSender, IngestionReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (IngestionSender { tx }, rx)
}

/// Handle used to request shutdown of the ingestion loop.
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    /// Ask the loop to stop once the batch in flight has completed.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Stop signal observed by the ingestion loop.
#[derive(Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// Resolve once a stop has been requested.
    ///
    /// If every [`StopHandle`] is dropped without stopping, this never
    /// resolves.
    pub async fn stopped(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked stop handle and signal.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx: Arc::new(tx) }, StopSignal { rx })
}

/// Lifecycle state of the ingestion loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Result of running one value through the pipeline.
///
/// `Failed` values are still delivered: the reading carries the failure
/// description as a string so the error is visible in the data stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueOutcome {
    Ok(TypedValue),
    Failed(TypedValue),
}

impl ValueOutcome {
    pub fn value(&self) -> &TypedValue {
        match self {
            Self::Ok(v) | Self::Failed(v) => v,
        }
    }
}

/// Ingestion counters.
#[derive(Debug, Default)]
pub struct IngestionStats {
    batches_received: AtomicU64,
    batches_skipped: AtomicU64,
    values_skipped: AtomicU64,
    readings: AtomicU64,
    transform_failures: AtomicU64,
    assertion_failures: AtomicU64,
    mapping_misses: AtomicU64,
    events_published: AtomicU64,
    publish_failures: AtomicU64,
}

/// Point-in-time copy of [`IngestionStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub batches_received: u64,
    pub batches_skipped: u64,
    pub values_skipped: u64,
    pub readings: u64,
    pub transform_failures: u64,
    pub assertion_failures: u64,
    pub mapping_misses: u64,
    pub events_published: u64,
    pub publish_failures: u64,
}

impl IngestionStats {
    fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            batches_skipped: self.batches_skipped.load(Ordering::Relaxed),
            values_skipped: self.values_skipped.load(Ordering::Relaxed),
            readings: self.readings.load(Ordering::Relaxed),
            transform_failures: self.transform_failures.load(Ordering::Relaxed),
            assertion_failures: self.assertion_failures.load(Ordering::Relaxed),
            mapping_misses: self.mapping_misses.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
        }
    }
}

const STATE_RUNNING: u8 = 0;
const STATE_STOPPED: u8 = 1;

/// Single consumer of the ingestion queue.
pub struct IngestionLoop {
    resolver: SharedResolver,
    publisher: SharedPublisher,
    data_transform: AtomicBool,
    state: AtomicU8,
    stats: Arc<IngestionStats>,
}

impl IngestionLoop {
    pub fn new(
        resolver: SharedResolver,
        publisher: SharedPublisher,
        config: &DeviceServiceConfig,
    ) -> Self {
        Self {
            resolver,
            publisher,
            data_transform: AtomicBool::new(config.data_transform),
            state: AtomicU8::new(STATE_RUNNING),
            stats: Arc::new(IngestionStats::default()),
        }
    }

    pub fn state(&self) -> LoopState {
        match self.state.load(Ordering::Acquire) {
            STATE_STOPPED => LoopState::Stopped,
            _ => LoopState::Running,
        }
    }

    pub fn stats(&self) -> Arc<IngestionStats> {
        self.stats.clone()
    }

    pub fn data_transform_enabled(&self) -> bool {
        self.data_transform.load(Ordering::Relaxed)
    }

    /// Toggle the transform step; takes effect from the next value.
    pub fn set_data_transform(&self, enabled: bool) {
        self.data_transform.store(enabled, Ordering::Relaxed);
    }

    /// Drain `rx` until stopped.
    ///
    /// A batch that has been dequeued always runs to completion before the
    /// stop signal is looked at again. Once stopped the loop cannot be
    /// restarted.
    pub async fn run(&self, mut rx: IngestionReceiver, mut stop: StopSignal) -> StatsSnapshot {
        if self.state() == LoopState::Stopped {
            tracing::warn!("Ingestion loop already stopped");
            return self.stats.snapshot();
        }
        tracing::info!("Ingestion loop started");

        loop {
            let batch = tokio::select! {
                biased;
                _ = stop.stopped() => {
                    tracing::info!("Ingestion loop received stop signal");
                    break;
                }
                batch = rx.recv() => match batch {
                    Some(batch) => batch,
                    None => {
                        tracing::info!("Ingestion queue closed");
                        break;
                    }
                },
            };

            if let Some(event) = self.process_batch(batch) {
                self.publish(event).await;
            }
        }

        self.state.store(STATE_STOPPED, Ordering::Release);
        let stats = self.stats.snapshot();
        tracing::info!(
            batches = stats.batches_received,
            events = stats.events_published,
            "Ingestion loop stopped"
        );
        stats
    }

    /// Run the loop on its own task.
    pub fn spawn(
        self: Arc<Self>,
        rx: IngestionReceiver,
        stop: StopSignal,
    ) -> JoinHandle<StatsSnapshot> {
        tokio::spawn(async move { self.run(rx, stop).await })
    }

    /// Turn one batch into an event.
    ///
    /// Returns `None` when the device is unknown.
    pub fn process_batch(&self, batch: AsyncResult) -> Option<Event> {
        IngestionStats::incr(&self.stats.batches_received);

        let device = match self.resolver.resolve_device(&batch.device_name) {
            Some(device) => device,
            None => {
                tracing::error!(
                    device = %batch.device_name,
                    values = batch.values.len(),
                    "Received batch for device not found in metadata, skipping"
                );
                IngestionStats::incr(&self.stats.batches_skipped);
                return None;
            }
        };

        let mut readings: Vec<Reading> = Vec::with_capacity(batch.values.len());
        for value in batch.values {
            if let Some(reading) = self.process_value(&device, value) {
                readings.push(reading);
            }
        }

        Some(Event::new(batch.device_name, readings))
    }

    /// Turn one value into a reading.
    ///
    /// Returns `None` when the value's resource is not in the device profile.
    pub fn process_value(&self, device: &Device, value: TypedValue) -> Option<Reading> {
        let resource = match self.resolver.resolve_resource(&device.profile, &value.resource) {
            Some(resource) => resource,
            None => {
                tracing::error!(
                    device = %device.name,
                    resource = %value.resource,
                    profile = %device.profile,
                    "Device resource not found in profile, skipping value"
                );
                IngestionStats::incr(&self.stats.values_skipped);
                return None;
            }
        };

        let outcome = self.apply_pipeline(device, &resource, value);
        let reading = to_reading(outcome.value(), &device.name);
        IngestionStats::incr(&self.stats.readings);
        Some(reading)
    }

    /// Transform, assert and map a value of a resolved resource.
    ///
    /// A failing step replaces the value with a failure description and the
    /// remaining steps still run on that description. The outcome is
    /// `Failed` when any step failed.
    pub fn apply_pipeline(
        &self,
        device: &Device,
        resource: &Resource,
        value: TypedValue,
    ) -> ValueOutcome {
        let spec = &resource.transform;
        let mut value = value;
        let mut failed = false;

        if self.data_transform_enabled() {
            match transform_read(&value, spec) {
                Ok(transformed) => value = transformed,
                Err(e) => {
                    tracing::error!(
                        device = %device.name,
                        resource = %value.resource,
                        value = %value,
                        step = %e.step(),
                        "Value transform failed: {}",
                        e
                    );
                    IngestionStats::incr(&self.stats.transform_failures);
                    let description = format!(
                        "Transformation failed for device resource {}, with value: {}, property value: {}, and error: {}",
                        value.resource, value, spec, e
                    );
                    value = TypedValue::string(value.resource, value.origin, description);
                    failed = true;
                }
            }
        }

        if let Err(e) = check_assertion(&value, &spec.assertion, device) {
            tracing::error!(
                device = %device.name,
                resource = %value.resource,
                value = %value,
                assertion = %spec.assertion,
                "Assertion failed: {}",
                e
            );
            IngestionStats::incr(&self.stats.assertion_failures);
            let description = format!(
                "Assertion failed for device resource {}, with value: {} and assertion: {}",
                value.resource, value, spec.assertion
            );
            value = TypedValue::string(value.resource, value.origin, description);
            failed = true;
        }

        if !spec.mappings.is_empty() {
            let (mapped, found) = map_value(&value, &spec.mappings);
            if found {
                value = mapped;
            } else {
                tracing::warn!(
                    device = %device.name,
                    resource = %value.resource,
                    value = %value,
                    "No mapping configured for value, keeping it unmapped"
                );
                IngestionStats::incr(&self.stats.mapping_misses);
            }
        }

        if failed {
            ValueOutcome::Failed(value)
        } else {
            ValueOutcome::Ok(value)
        }
    }

    async fn publish(&self, event: Event) {
        let device = event.device.clone();
        let readings = event.readings.len();
        match self.publisher.publish(event).await {
            Ok(()) => {
                tracing::debug!(%device, readings, "Event published");
                IngestionStats::incr(&self.stats.events_published);
            }
            Err(e) => {
                tracing::error!(%device, readings, "Failed to publish event: {}", e);
                IngestionStats::incr(&self.stats.publish_failures);
            }
        }
    }
}
