use std::sync::Arc;

use parking_lot::Mutex;

use crate::command::Command;
use crate::connection::ConnectionLifecycle;
use crate::errors::{DroneError, Result};

/// Forwards commands to the connection while it is usable and remembers the
/// most recent failure.
pub struct CommandDispatcher {
    link: Arc<ConnectionLifecycle>,
    last_failure: Mutex<Option<DroneError>>,
}

impl CommandDispatcher {
    pub fn new(link: Arc<ConnectionLifecycle>) -> Self {
        Self { link, last_failure: Mutex::new(None) }
    }

    /// Sends `command` once, or reports why it could not be sent.
    pub fn dispatch(&self, command: Command) -> Result<()> {
        self.link.send(command).map_err(|err| self.record(err))
    }

    /// Dispatches a command built by a validating factory; a rejected
    /// value is recorded and never reaches the connection.
    pub fn dispatch_checked(&self, command: Result<Command>) -> Result<()> {
        let command = command.map_err(|err| self.record(err))?;
        self.dispatch(command)
    }

    /// Stores `err` as the last failure and hands it back.
    pub(crate) fn record(&self, err: DroneError) -> DroneError {
        *self.last_failure.lock() = Some(err.clone());
        err
    }

    /// The most recent failure. Sticky, later successes don't clear it.
    pub fn last_failure(&self) -> Option<DroneError> {
        self.last_failure.lock().clone()
    }

    pub fn take_last_failure(&self) -> Option<DroneError> {
        self.last_failure.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Connection, ConnectionStatus};
    use crate::errors::{ConnectError, TransportError};
    use crate::state::SessionState;
    use crate::telemetry::{Listener, ListenerCategory, TelemetryBus};

    struct Counting(Arc<Mutex<Vec<Command>>>, bool);

    impl Connection for Counting {
        fn connect(&mut self) -> std::result::Result<(), ConnectError> {
            Ok(())
        }
        fn disconnect(&mut self) {}
        fn send(&mut self, command: Command) -> std::result::Result<(), TransportError> {
            if self.1 {
                return Err(TransportError::new("link lost"));
            }
            self.0.lock().push(command);
            Ok(())
        }
        fn register_listener(&mut self, _: ListenerCategory, _: Arc<dyn Listener>) {}
    }

    fn dispatcher(broken: bool, open: bool) -> (Arc<Mutex<Vec<Command>>>, CommandDispatcher) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let link = Arc::new(ConnectionLifecycle::new(Box::new(Counting(Arc::clone(&sent), broken))));
        if open {
            link.open(&Arc::new(TelemetryBus::new(Arc::new(SessionState::default()))));
        }
        (sent, CommandDispatcher::new(link))
    }

    #[test]
    fn connected_dispatch_sends_exactly_once() {
        let (sent, dispatcher) = dispatcher(false, true);

        dispatcher.dispatch(Command::jump(crate::JumpType::High)).unwrap();

        assert_eq!(*sent.lock(), vec![Command::Jump(crate::JumpType::High)]);
        assert_eq!(dispatcher.last_failure(), None);
    }

    #[test]
    fn disconnected_dispatch_is_reported() {
        let (sent, dispatcher) = dispatcher(false, false);

        let err = dispatcher.dispatch(Command::StopAnimation).unwrap_err();

        assert_eq!(err, DroneError::ConnectionUnavailable { status: ConnectionStatus::Disconnected });
        assert!(sent.lock().is_empty());
        assert_eq!(dispatcher.last_failure(), Some(err));
    }

    #[test]
    fn transport_errors_are_recorded() {
        let (_, dispatcher) = dispatcher(true, true);

        let err = dispatcher.dispatch(Command::StopAnimation).unwrap_err();

        assert!(matches!(err, DroneError::Transport(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn validation_failure_never_reaches_connection() {
        let (sent, dispatcher) = dispatcher(false, true);

        let err = dispatcher.dispatch_checked(Command::volume(150)).unwrap_err();

        assert!(err.is_validation());
        assert!(sent.lock().is_empty());
        assert!(dispatcher.last_failure().unwrap().is_validation());
    }

    #[test]
    fn last_failure_is_sticky_until_taken() {
        let (_, dispatcher) = dispatcher(false, true);
        dispatcher.dispatch_checked(Command::pcmd(500, 0)).unwrap_err();
        dispatcher.dispatch(Command::StopAnimation).unwrap();

        assert!(dispatcher.take_last_failure().is_some());
        assert_eq!(dispatcher.last_failure(), None);
    }
}
