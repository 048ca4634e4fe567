//! Control and telemetry for a Jumping Sumo style drone.
//!
//! A [`DroneController`] owns a [`Connection`] to the drone, turns intents
//! such as "forward" or "spin" into [`Command`] values and tracks what the
//! drone reports back (battery, movement feedback, video frames) in a
//! [`SessionState`] that can be read at any time without blocking.
//!
//! The transport is not part of this crate. Implement [`Connection`] for it,
//! or use [`channel_connection`] to drive a simulated device in-process.

mod audio;
mod channel;
mod command;
mod connection;
mod controller;
mod dispatcher;
mod errors;
mod options;
mod state;
mod telemetry;
mod video;

pub use audio::AudioSession;
pub use channel::{channel_connection, ChannelConnection, CommandReceiver, CommandSender, DeviceLink, MAX_CHUNK_SIZE};
pub use command::{Animation, AudioTheme, Command, JumpType};
pub use connection::{Connection, ConnectionLifecycle, ConnectionStatus};
pub use controller::DroneController;
pub use dispatcher::CommandDispatcher;
pub use errors::{ConnectError, DroneError, ListenerFault, Result, TransportError};
pub use options::ControllerOptions;
pub use state::{SessionSnapshot, SessionState};
pub use telemetry::{battery_listener, pcmd_listener, video_listener, Listener, ListenerCategory, TelemetryBus, TelemetryEvent};
pub use video::VideoSession;
