use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::command::{AudioTheme, Command};
use crate::dispatcher::CommandDispatcher;
use crate::errors::Result;
use crate::state::SessionState;

/// Volume and sound theme control.
///
/// Mute and unmute are plain volume changes, there is no separate muted flag:
/// `mute()` followed by `set_volume(30)` leaves the drone at 30.
pub struct AudioSession {
    dispatcher: Arc<CommandDispatcher>,
    state: Arc<SessionState>,
    volume_change: Mutex<()>,
}

impl AudioSession {
    pub(crate) fn new(dispatcher: Arc<CommandDispatcher>, state: Arc<SessionState>) -> Self {
        Self { dispatcher, state, volume_change: Mutex::new(()) }
    }

    /// Sets the volume, 0..=100. Anything else is rejected without sending.
    /// The stored volume only changes once the command went out.
    pub fn set_volume(&self, volume: i32) -> Result<&Self> {
        let command = Command::volume(volume).map_err(|err| self.dispatcher.record(err))?;
        let _change = self.volume_change.lock();
        self.dispatcher.dispatch(command)?;
        self.state.set_volume(volume as u8);
        info!(volume, "[Audio] volume set");
        Ok(self)
    }

    pub fn mute(&self) -> Result<&Self> {
        self.set_volume(0)
    }

    pub fn unmute(&self) -> Result<&Self> {
        self.set_volume(100)
    }

    /// Selects a sound theme. Not tracked locally.
    pub fn theme(&self, theme: AudioTheme) -> Result<&Self> {
        self.dispatcher.dispatch(Command::audio_theme(theme))?;
        Ok(self)
    }

    pub fn theme_named(&self, name: &str) -> Result<&Self> {
        let theme = AudioTheme::from_str(name).map_err(|err| self.dispatcher.record(err))?;
        self.theme(theme)
    }

    pub fn volume(&self) -> u8 {
        self.state.volume()
    }

    pub fn is_muted(&self) -> bool {
        self.volume() == 0
    }
}

impl std::fmt::Debug for AudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioSession").field("state", &self.state).finish_non_exhaustive()
    }
}
