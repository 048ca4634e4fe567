use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

pub const DEFAULT_VOLUME: u8 = 100;

/// The live state of one drone session.
///
/// Shared between the caller and the telemetry delivery context. Scalar
/// fields are atomics, the video frame sits behind a lock and is swapped as
/// a whole so readers never see a half-written frame.
#[derive(Debug)]
pub struct SessionState {
    battery: AtomicU8,
    video_enabled: AtomicBool,
    frame_capture: AtomicBool,
    volume: AtomicU8,
    last_video_frame: RwLock<Arc<[u8]>>,
}

/// Point in time copy of [`SessionState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub battery: u8,
    pub video_enabled: bool,
    pub volume: u8,
    pub frame_len: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME)
    }
}

impl SessionState {
    pub fn new(initial_volume: u8) -> Self {
        Self {
            battery: AtomicU8::new(0),
            video_enabled: AtomicBool::new(false),
            frame_capture: AtomicBool::new(false),
            volume: AtomicU8::new(initial_volume),
            last_video_frame: RwLock::new(Arc::from(Vec::new())),
        }
    }

    pub fn battery(&self) -> u8 {
        self.battery.load(Ordering::Acquire)
    }

    pub(crate) fn set_battery(&self, level: u8) {
        self.battery.store(level, Ordering::Release);
    }

    pub fn is_video_enabled(&self) -> bool {
        self.video_enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_video_enabled(&self, enabled: bool) {
        self.video_enabled.store(enabled, Ordering::Release);
    }

    pub fn volume(&self) -> u8 {
        self.volume.load(Ordering::Acquire)
    }

    pub(crate) fn set_volume(&self, volume: u8) {
        self.volume.store(volume, Ordering::Release);
    }

    /// Whether incoming video frames are being kept. Turned on the first time
    /// video is enabled and never turned off again.
    pub fn is_capturing_frames(&self) -> bool {
        self.frame_capture.load(Ordering::Acquire)
    }

    /// Returns `true` if capture was off before this call.
    pub(crate) fn attach_frame_capture(&self) -> bool {
        !self.frame_capture.swap(true, Ordering::AcqRel)
    }

    /// Keeps `frame` as the latest one, unless no one asked for video yet.
    pub(crate) fn record_video_frame(&self, frame: &[u8]) -> bool {
        if !self.is_capturing_frames() {
            return false;
        }
        *self.last_video_frame.write() = Arc::from(frame);
        true
    }

    pub(crate) fn reset_video_frame(&self) {
        *self.last_video_frame.write() = Arc::from(Vec::new());
    }

    /// Latest frame, empty when none has arrived.
    pub fn last_video_frame(&self) -> Arc<[u8]> {
        Arc::clone(&self.last_video_frame.read())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            battery: self.battery(),
            video_enabled: self.is_video_enabled(),
            volume: self.volume(),
            frame_len: self.last_video_frame.read().len(),
        }
    }
}
