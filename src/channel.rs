use std::sync::Arc;

use bytebuffer::ByteBuffer;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tokio::task;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::connection::Connection;
use crate::errors::{ConnectError, TransportError};
use crate::telemetry::{Listener, ListenerCategory, TelemetryEvent};

/// Largest video chunk the device sends; a shorter chunk ends a frame.
pub const MAX_CHUNK_SIZE: usize = 1460;

pub type CommandSender = mpsc::UnboundedSender<Command>;
pub type CommandReceiver = mpsc::UnboundedReceiver<Command>;

#[derive(Debug)]
enum Downlink {
    Telemetry(TelemetryEvent),
    VideoChunk(Vec<u8>),
}

type Registrations = Arc<RwLock<Vec<(ListenerCategory, Arc<dyn Listener>)>>>;

/// In-process [`Connection`] backed by tokio channels.
///
/// Commands are forwarded to the paired [`DeviceLink`]; events pushed into
/// the link are delivered to registered listeners by a task spawned on
/// `connect()`.
pub struct ChannelConnection {
    runtime: Handle,
    commands: CommandSender,
    downlink: Arc<Mutex<mpsc::UnboundedReceiver<Downlink>>>,
    listeners: Registrations,
    delivery: Option<task::JoinHandle<()>>,
}

/// The device end of a [`ChannelConnection`].
pub struct DeviceLink {
    commands: CommandReceiver,
    uplink: mpsc::UnboundedSender<Downlink>,
}

/// Makes a connected pair. Delivery tasks run on `runtime`.
pub fn channel_connection(runtime: Handle) -> (ChannelConnection, DeviceLink) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let connection = ChannelConnection {
        runtime,
        commands: command_tx,
        downlink: Arc::new(Mutex::new(event_rx)),
        listeners: Arc::new(RwLock::new(Vec::new())),
        delivery: None,
    };
    let device = DeviceLink { commands: command_rx, uplink: event_tx };
    (connection, device)
}

impl ChannelConnection {
    fn start_delivery(&mut self) {
        let downlink = Arc::clone(&self.downlink);
        let listeners = Arc::clone(&self.listeners);
        info!("[Link] START DELIVERY");

        let task = self.runtime.spawn(async move {
            let mut downlink = downlink.lock().await;
            let mut frame = ByteBuffer::new();

            while let Some(message) = downlink.recv().await {
                match message {
                    Downlink::Telemetry(event) => deliver(&listeners, &event),
                    Downlink::VideoChunk(chunk) => {
                        // an empty chunk only matters as the end of a pending frame
                        if chunk.is_empty() && frame.len() == 0 {
                            continue;
                        }
                        frame.write_bytes(&chunk);

                        if chunk.len() < MAX_CHUNK_SIZE {
                            let event = TelemetryEvent::VideoFrame(frame.into_vec());
                            frame = ByteBuffer::new();
                            deliver(&listeners, &event);
                        }
                    }
                }
            }
            debug!("[Link] device went away");
        });

        self.delivery = Some(task);
    }

    fn stop_delivery(&mut self) {
        if let Some(task) = self.delivery.take() {
            info!("[Link] STOP DELIVERY");
            task.abort();
        }
    }
}

fn deliver(listeners: &Registrations, event: &TelemetryEvent) {
    let category = event.category();
    let matching: Vec<_> = listeners
        .read()
        .iter()
        .filter(|(c, _)| *c == category)
        .map(|(_, l)| Arc::clone(l))
        .collect();

    for listener in matching {
        if let Err(fault) = listener.on_event(event) {
            warn!(?category, %fault, "[Link] listener rejected event");
        }
    }
}

impl Connection for ChannelConnection {
    fn connect(&mut self) -> Result<(), ConnectError> {
        if self.commands.is_closed() {
            return Err(ConnectError::new("device link dropped"));
        }
        if self.delivery.is_none() {
            self.start_delivery();
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.stop_delivery();
    }

    fn send(&mut self, command: Command) -> Result<(), TransportError> {
        self.commands.send(command).map_err(|_| TransportError::new("device link dropped"))
    }

    fn register_listener(&mut self, category: ListenerCategory, listener: Arc<dyn Listener>) {
        self.listeners.write().push((category, listener));
    }
}

impl Drop for ChannelConnection {
    fn drop(&mut self) {
        self.stop_delivery();
    }
}

impl DeviceLink {
    /// Waits for the next command. `None` once the connection is gone.
    pub async fn next_command(&mut self) -> Option<Command> {
        self.commands.recv().await
    }

    pub fn try_next_command(&mut self) -> Option<Command> {
        self.commands.try_recv().ok()
    }

    /// Pushes one event towards the controller. Returns `false` once the
    /// connection is gone.
    pub fn push(&self, event: TelemetryEvent) -> bool {
        self.uplink.send(Downlink::Telemetry(event)).is_ok()
    }

    /// Pushes a piece of a video frame. A chunk shorter than
    /// [`MAX_CHUNK_SIZE`] ends the frame, so a frame whose length is an exact
    /// multiple of it must be followed by an empty chunk.
    pub fn push_video_chunk(&self, chunk: &[u8]) -> bool {
        self.uplink.send(Downlink::VideoChunk(chunk.to_vec())).is_ok()
    }

    /// Pushes a complete frame in one piece.
    pub fn push_video_frame(&self, frame: &[u8]) -> bool {
        self.push(TelemetryEvent::VideoFrame(frame.to_vec()))
    }
}
