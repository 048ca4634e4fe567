use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use tracing::{error, trace, warn};

use crate::errors::ListenerFault;
use crate::state::SessionState;

/// Data pushed by the drone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// Battery charge in percent.
    BatteryLevel(u8),
    /// Feedback on the piloting command currently being executed.
    MovementFeedback(String),
    /// One encoded video frame (jpeg on the Jumping Sumo).
    VideoFrame(Vec<u8>),
}

impl TelemetryEvent {
    pub fn category(&self) -> ListenerCategory {
        match self {
            TelemetryEvent::BatteryLevel(_) => ListenerCategory::Battery,
            TelemetryEvent::MovementFeedback(_) => ListenerCategory::MovementFeedback,
            TelemetryEvent::VideoFrame(_) => ListenerCategory::Video,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerCategory {
    Battery,
    MovementFeedback,
    Video,
}

impl ListenerCategory {
    pub const ALL: [ListenerCategory; 3] =
        [ListenerCategory::Battery, ListenerCategory::MovementFeedback, ListenerCategory::Video];
}

/// Handler for telemetry events of one category.
pub trait Listener: Send + Sync {
    fn on_event(&self, event: &TelemetryEvent) -> Result<(), ListenerFault>;
}

impl<F> Listener for F
where
    F: Fn(&TelemetryEvent) -> Result<(), ListenerFault> + Send + Sync,
{
    fn on_event(&self, event: &TelemetryEvent) -> Result<(), ListenerFault> {
        self(event)
    }
}

/// Listener receiving battery levels.
pub fn battery_listener<F>(callback: F) -> Arc<dyn Listener>
where
    F: Fn(u8) + Send + Sync + 'static,
{
    Arc::new(move |event: &TelemetryEvent| -> Result<(), ListenerFault> {
        if let TelemetryEvent::BatteryLevel(level) = event {
            callback(*level);
        }
        Ok(())
    })
}

/// Listener receiving movement (PCMD) feedback.
pub fn pcmd_listener<F>(callback: F) -> Arc<dyn Listener>
where
    F: Fn(&str) + Send + Sync + 'static,
{
    Arc::new(move |event: &TelemetryEvent| -> Result<(), ListenerFault> {
        if let TelemetryEvent::MovementFeedback(feedback) = event {
            callback(feedback);
        }
        Ok(())
    })
}

/// Listener receiving raw video frames.
pub fn video_listener<F>(callback: F) -> Arc<dyn Listener>
where
    F: Fn(&[u8]) + Send + Sync + 'static,
{
    Arc::new(move |event: &TelemetryEvent| -> Result<(), ListenerFault> {
        if let TelemetryEvent::VideoFrame(frame) = event {
            callback(frame);
        }
        Ok(())
    })
}

/// Fans telemetry out to the session state and to registered listeners.
///
/// Listeners of a category run one after the other in registration order.
/// Publishing is serialized, so two events never interleave their listener
/// calls. A listener returning an error or panicking is logged and counted,
/// the remaining listeners still run.
///
/// Only the connection feeds events in; applications can subscribe but not
/// publish:
///
/// ```compile_fail
/// # fn inject(drone: &sumo_controller::DroneController) {
/// drone.telemetry().publish(&sumo_controller::TelemetryEvent::BatteryLevel(1));
/// # }
/// ```
pub struct TelemetryBus {
    state: Arc<SessionState>,
    listeners: RwLock<HashMap<ListenerCategory, Vec<Arc<dyn Listener>>>>,
    publishing: ReentrantMutex<()>,
    faults: AtomicU64,
}

impl TelemetryBus {
    pub fn new(state: Arc<SessionState>) -> Self {
        Self {
            state,
            listeners: RwLock::new(HashMap::new()),
            publishing: ReentrantMutex::new(()),
            faults: AtomicU64::new(0),
        }
    }

    /// Appends `listener` for `category`. Subscribing the same listener twice
    /// gets it called twice.
    pub fn subscribe(&self, category: ListenerCategory, listener: Arc<dyn Listener>) {
        self.listeners.write().entry(category).or_default().push(listener);
    }

    pub fn listener_count(&self, category: ListenerCategory) -> usize {
        self.listeners.read().get(&category).map_or(0, Vec::len)
    }

    /// Number of listener faults isolated so far.
    pub fn fault_count(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    /// Called from the connection's delivery context through the relay
    /// registered on open.
    pub(crate) fn publish(&self, event: &TelemetryEvent) {
        let _serialized = self.publishing.lock();
        let category = event.category();
        trace!(?category, "publish");

        match event {
            TelemetryEvent::BatteryLevel(level) => self.state.set_battery(*level),
            TelemetryEvent::VideoFrame(frame) => {
                self.state.record_video_frame(frame);
            }
            TelemetryEvent::MovementFeedback(_) => {}
        }

        // listeners may subscribe from inside a callback, so don't hold the lock
        let listeners = self.listeners.read().get(&category).cloned().unwrap_or_default();

        for (index, listener) in listeners.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
                Ok(Ok(())) => {}
                Ok(Err(fault)) => {
                    self.faults.fetch_add(1, Ordering::Relaxed);
                    warn!(?category, index, %fault, "listener failed");
                }
                Err(_) => {
                    self.faults.fetch_add(1, Ordering::Relaxed);
                    error!(?category, index, "listener panicked");
                }
            }
        }
    }
}

/// Forwards events from a connection into a [`TelemetryBus`].
pub(crate) struct BusRelay {
    bus: Arc<TelemetryBus>,
}

impl BusRelay {
    pub(crate) fn new(bus: Arc<TelemetryBus>) -> Arc<dyn Listener> {
        Arc::new(Self { bus })
    }
}

impl Listener for BusRelay {
    fn on_event(&self, event: &TelemetryEvent) -> Result<(), ListenerFault> {
        self.bus.publish(event);
        Ok(())
    }
}
