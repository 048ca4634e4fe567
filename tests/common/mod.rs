#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use sumo_controller::{
    Command, ConnectError, Connection, Listener, ListenerCategory, TelemetryEvent, TransportError,
};

#[derive(Default)]
struct Recorded {
    sent: Vec<Command>,
    listeners: Vec<(ListenerCategory, Arc<dyn Listener>)>,
    connects: usize,
    disconnects: usize,
}

/// Connection double that records what the controller does with it and lets
/// a test play the drone's side.
#[derive(Clone)]
pub struct MockDrone {
    recorded: Arc<Mutex<Recorded>>,
    refuse_with: Option<String>,
    broken_uplink: bool,
}

impl MockDrone {
    pub fn new() -> Self {
        Self { recorded: Arc::new(Mutex::new(Recorded::default())), refuse_with: None, broken_uplink: false }
    }

    pub fn unreachable(reason: &str) -> Self {
        Self { refuse_with: Some(reason.to_string()), ..Self::new() }
    }

    /// Connects fine, but every send fails.
    pub fn with_broken_uplink() -> Self {
        Self { broken_uplink: true, ..Self::new() }
    }

    pub fn sent(&self) -> Vec<Command> {
        self.recorded.lock().sent.clone()
    }

    pub fn connects(&self) -> usize {
        self.recorded.lock().connects
    }

    pub fn disconnects(&self) -> usize {
        self.recorded.lock().disconnects
    }

    /// Delivers `event` the way a transport would, on the calling thread.
    pub fn emit(&self, event: TelemetryEvent) {
        let category = event.category();
        let listeners: Vec<_> = self
            .recorded
            .lock()
            .listeners
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener.on_event(&event).unwrap();
        }
    }
}

impl Connection for MockDrone {
    fn connect(&mut self) -> Result<(), ConnectError> {
        self.recorded.lock().connects += 1;
        match &self.refuse_with {
            Some(reason) => Err(ConnectError::new(reason.clone())),
            None => Ok(()),
        }
    }

    fn disconnect(&mut self) {
        self.recorded.lock().disconnects += 1;
    }

    fn send(&mut self, command: Command) -> Result<(), TransportError> {
        if self.broken_uplink {
            return Err(TransportError::new("radio link lost"));
        }
        self.recorded.lock().sent.push(command);
        Ok(())
    }

    fn register_listener(&mut self, category: ListenerCategory, listener: Arc<dyn Listener>) {
        self.recorded.lock().listeners.push((category, listener));
    }
}
