use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::command::Command;
use crate::dispatcher::CommandDispatcher;
use crate::errors::Result;
use crate::state::SessionState;
use crate::telemetry::{video_listener, ListenerCategory, TelemetryBus};

/// Video streaming control, `Disabled` until [`enable`](Self::enable) succeeds.
///
/// *nb* [`is_enabled`](Self::is_enabled) reports what was requested from the
/// drone, not what the drone acknowledged.
pub struct VideoSession {
    dispatcher: Arc<CommandDispatcher>,
    bus: Arc<TelemetryBus>,
    state: Arc<SessionState>,
    transition: Mutex<()>,
}

impl VideoSession {
    pub(crate) fn new(dispatcher: Arc<CommandDispatcher>, bus: Arc<TelemetryBus>, state: Arc<SessionState>) -> Self {
        Self { dispatcher, bus, state, transition: Mutex::new(()) }
    }

    /// Asks the drone to stream and starts keeping incoming frames. The frame
    /// from an earlier session is dropped. Calling it while enabled sends
    /// nothing.
    pub fn enable(&self) -> Result<&Self> {
        let _transition = self.transition.lock();
        if self.state.is_video_enabled() {
            debug!("[Video] already enabled");
            return Ok(self);
        }

        self.state.reset_video_frame();
        self.dispatcher.dispatch(Command::video_streaming(true))?;
        if self.state.attach_frame_capture() {
            debug!("[Video] frame capture attached");
        }
        self.state.set_video_enabled(true);
        info!("[Video] ENABLED");
        Ok(self)
    }

    /// Asks the drone to stop streaming. The last frame is kept. If the stop
    /// command cannot be sent the session stays enabled.
    pub fn disable(&self) -> Result<&Self> {
        let _transition = self.transition.lock();
        if !self.state.is_video_enabled() {
            return Ok(self);
        }

        self.dispatcher.dispatch(Command::video_streaming(false))?;
        self.state.set_video_enabled(false);
        info!("[Video] DISABLED");
        Ok(self)
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_video_enabled()
    }

    /// Whether frames are being captured, which starts with the first enable.
    pub fn has_listener(&self) -> bool {
        self.state.is_capturing_frames()
    }

    /// The last frame received, empty if there is none.
    pub fn last_frame(&self) -> Vec<u8> {
        self.state.last_video_frame().to_vec()
    }

    pub fn frame_available(&self) -> bool {
        !self.state.last_video_frame().is_empty()
    }

    /// Calls `callback` with every frame the drone sends.
    pub fn on_frame<F>(&self, callback: F) -> &Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.bus.subscribe(ListenerCategory::Video, video_listener(callback));
        self
    }
}

impl std::fmt::Debug for VideoSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoSession").field("state", &self.state).finish_non_exhaustive()
    }
}
