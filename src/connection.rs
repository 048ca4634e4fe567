use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::errors::{ConnectError, DroneError, Result, TransportError};
use crate::telemetry::{BusRelay, Listener, ListenerCategory, TelemetryBus};

/// Live channel to the drone.
///
/// Implementations own the transport: socket handling, framing and
/// encoding of [`Command`] values. Listener registrations are expected to
/// survive a disconnect/connect cycle.
///
/// Events must be delivered from the connection's own context, never from
/// inside `send`: the caller holds the connection lock during `send`, and a
/// listener that dispatches a command would wait on it forever.
pub trait Connection: Send {
    fn connect(&mut self) -> std::result::Result<(), ConnectError>;

    fn disconnect(&mut self);

    fn send(&mut self, command: Command) -> std::result::Result<(), TransportError>;

    /// Registers a listener that the connection calls, from its own delivery
    /// context, for every incoming event of `category`.
    fn register_listener(&mut self, category: ListenerCategory, listener: Arc<dyn Listener>);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
    Failed(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => f.write_str("disconnected"),
            ConnectionStatus::Connected => f.write_str("connected"),
            ConnectionStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

struct Link {
    connection: Box<dyn Connection>,
    status: ConnectionStatus,
    relays_registered: bool,
}

/// Sole owner of the [`Connection`].
///
/// Every send goes through here and is checked against the status under the
/// same lock, so nothing can reach a connection that has been closed.
pub struct ConnectionLifecycle {
    link: Mutex<Link>,
}

impl ConnectionLifecycle {
    pub fn new(connection: Box<dyn Connection>) -> Self {
        Self {
            link: Mutex::new(Link {
                connection,
                status: ConnectionStatus::Disconnected,
                relays_registered: false,
            }),
        }
    }

    /// Connects and hooks `bus` up to the connection's events. Never fails:
    /// a connect error ends up in the returned [`ConnectionStatus::Failed`].
    pub fn open(&self, bus: &Arc<TelemetryBus>) -> ConnectionStatus {
        let mut link = self.link.lock();
        if link.status.is_connected() {
            debug!("open on a live connection ignored");
            return link.status.clone();
        }

        info!("[Drone] connecting...");
        match link.connection.connect() {
            Ok(()) => {
                if !link.relays_registered {
                    for category in ListenerCategory::ALL {
                        link.connection.register_listener(category, BusRelay::new(Arc::clone(bus)));
                    }
                    link.relays_registered = true;
                }
                link.status = ConnectionStatus::Connected;
                info!("[Drone] CONNECTED");
            }
            Err(err) => {
                error!(%err, "[Drone] could not establish connection to drone");
                link.status = ConnectionStatus::Failed(err.reason);
            }
        }
        link.status.clone()
    }

    /// Disconnects if connected, otherwise does nothing.
    pub fn close(&self) {
        let mut link = self.link.lock();
        if !link.status.is_connected() {
            return;
        }
        link.connection.disconnect();
        link.status = ConnectionStatus::Disconnected;
        info!("[Drone] DISCONNECTED");
    }

    pub fn status(&self) -> ConnectionStatus {
        self.link.lock().status.clone()
    }

    pub(crate) fn send(&self, command: Command) -> Result<()> {
        let mut link = self.link.lock();
        if !link.status.is_connected() {
            warn!(?command, status = %link.status, "[Drone] command dropped");
            return Err(DroneError::ConnectionUnavailable { status: link.status.clone() });
        }
        debug!(?command, "[Drone] SEND");
        link.connection.send(command)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionState;
    use crate::telemetry::TelemetryEvent;

    #[derive(Default)]
    struct Stub {
        refuse: bool,
        sent: Vec<Command>,
        listeners: Vec<(ListenerCategory, Arc<dyn Listener>)>,
        disconnects: usize,
    }

    struct Shared(Arc<Mutex<Stub>>);

    impl Connection for Shared {
        fn connect(&mut self) -> std::result::Result<(), ConnectError> {
            if self.0.lock().refuse {
                Err(ConnectError::new("no drone in range"))
            } else {
                Ok(())
            }
        }

        fn disconnect(&mut self) {
            self.0.lock().disconnects += 1;
        }

        fn send(&mut self, command: Command) -> std::result::Result<(), TransportError> {
            self.0.lock().sent.push(command);
            Ok(())
        }

        fn register_listener(&mut self, category: ListenerCategory, listener: Arc<dyn Listener>) {
            self.0.lock().listeners.push((category, listener));
        }
    }

    fn lifecycle(refuse: bool) -> (Arc<Mutex<Stub>>, ConnectionLifecycle, Arc<TelemetryBus>) {
        let stub = Arc::new(Mutex::new(Stub { refuse, ..Stub::default() }));
        let lifecycle = ConnectionLifecycle::new(Box::new(Shared(Arc::clone(&stub))));
        let bus = Arc::new(TelemetryBus::new(Arc::new(SessionState::default())));
        (stub, lifecycle, bus)
    }

    #[test]
    fn open_connects_and_registers_relays() {
        let (stub, lifecycle, bus) = lifecycle(false);
        assert_eq!(lifecycle.status(), ConnectionStatus::Disconnected);

        assert_eq!(lifecycle.open(&bus), ConnectionStatus::Connected);

        let categories: Vec<_> = stub.lock().listeners.iter().map(|(c, _)| *c).collect();
        assert_eq!(categories, ListenerCategory::ALL.to_vec());
    }

    #[test]
    fn relayed_battery_event_reaches_session_state() {
        let state = Arc::new(SessionState::default());
        let bus = Arc::new(TelemetryBus::new(Arc::clone(&state)));
        let stub = Arc::new(Mutex::new(Stub::default()));
        let lifecycle = ConnectionLifecycle::new(Box::new(Shared(Arc::clone(&stub))));
        lifecycle.open(&bus);

        let relay = stub.lock().listeners[0].1.clone();
        relay.on_event(&TelemetryEvent::BatteryLevel(55)).unwrap();

        assert_eq!(state.battery(), 55);
    }

    #[test]
    fn failed_connect_is_reported_as_status() {
        let (stub, lifecycle, bus) = lifecycle(true);

        let status = lifecycle.open(&bus);

        assert_eq!(status, ConnectionStatus::Failed("no drone in range".into()));
        assert!(stub.lock().listeners.is_empty());
        let err = lifecycle.send(Command::StopAnimation).unwrap_err();
        assert_eq!(err, DroneError::ConnectionUnavailable { status });
        assert!(stub.lock().sent.is_empty());
    }

    #[test]
    fn close_is_idempotent() {
        let (stub, lifecycle, bus) = lifecycle(false);
        lifecycle.open(&bus);

        lifecycle.close();
        lifecycle.close();

        assert_eq!(stub.lock().disconnects, 1);
        assert_eq!(lifecycle.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn close_on_failed_connection_does_nothing() {
        let (stub, lifecycle, bus) = lifecycle(true);
        lifecycle.open(&bus);

        lifecycle.close();

        assert_eq!(stub.lock().disconnects, 0);
        assert!(matches!(lifecycle.status(), ConnectionStatus::Failed(_)));
    }

    #[test]
    fn reopening_does_not_register_relays_twice() {
        let (stub, lifecycle, bus) = lifecycle(false);
        lifecycle.open(&bus);
        lifecycle.close();
        lifecycle.open(&bus);

        assert_eq!(stub.lock().listeners.len(), ListenerCategory::ALL.len());
    }

    #[test]
    fn no_send_after_close() {
        let (stub, lifecycle, bus) = lifecycle(false);
        lifecycle.open(&bus);
        lifecycle.send(Command::StopAnimation).unwrap();
        lifecycle.close();

        assert!(lifecycle.send(Command::StopAnimation).is_err());
        assert_eq!(stub.lock().sent, vec![Command::StopAnimation]);
    }
}
