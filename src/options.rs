use tracing::warn;

use crate::command::{MAX_SPEED, MAX_TURN_DEGREES, MAX_VOLUME};
use crate::state::DEFAULT_VOLUME;

/// Controller usage options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    pub(crate) initial_volume: u8,
    pub(crate) cruise_speed: i8,
    pub(crate) turn_degrees: i16,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self { initial_volume: DEFAULT_VOLUME, cruise_speed: 40, turn_degrees: 90 }
    }
}

impl ControllerOptions {
    /// Volume assumed before any volume command is sent.
    pub fn with_initial_volume(mut self, volume: u8) -> Self {
        self.initial_volume = clamp("initial volume", volume as i32, 0, MAX_VOLUME) as u8;
        self
    }

    /// Speed used by `forward()` and `backward()`.
    pub fn with_cruise_speed(mut self, speed: i8) -> Self {
        self.cruise_speed = clamp("cruise speed", speed as i32, 0, MAX_SPEED) as i8;
        self
    }

    /// Angle used by `left()` and `right()`.
    pub fn with_turn_degrees(mut self, degrees: i16) -> Self {
        self.turn_degrees = clamp("turn degrees", degrees as i32, 0, MAX_TURN_DEGREES) as i16;
        self
    }

    pub fn initial_volume(&self) -> u8 {
        self.initial_volume
    }

    pub fn cruise_speed(&self) -> i8 {
        self.cruise_speed
    }

    pub fn turn_degrees(&self) -> i16 {
        self.turn_degrees
    }
}

fn clamp(name: &str, value: i32, min: i32, max: i32) -> i32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(option = name, value, clamped, "option out of range");
    }
    clamped
}
