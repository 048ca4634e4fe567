use std::fmt;
use std::str::FromStr;

use crate::errors::{DroneError, Result};

pub const MIN_SPEED: i32 = -100;
pub const MAX_SPEED: i32 = 100;
pub const MAX_TURN_DEGREES: i32 = 360;
pub const MAX_VOLUME: i32 = 100;

/// One instruction for the drone.
///
/// The controller never looks inside a command, it only forwards it to the
/// connection. Encoding into wire frames is up to the [`Connection`](crate::Connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Movement { speed: i8, degree: i16 },
    Jump(JumpType),
    Animation(Animation),
    StopAnimation,
    AudioVolume(u8),
    AudioTheme(AudioTheme),
    VideoStreamEnable,
    VideoStreamDisable,
}

impl Command {
    /// Piloting command: drive at `speed` (-100..=100) while turning by
    /// `degree` (-360..=360).
    pub fn pcmd(speed: i32, degree: i32) -> Result<Command> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(DroneError::validation("speed", speed, "a value in -100..=100"));
        }
        if !(-MAX_TURN_DEGREES..=MAX_TURN_DEGREES).contains(&degree) {
            return Err(DroneError::validation("turn angle", degree, "a value in -360..=360"));
        }
        Ok(Command::Movement { speed: speed as i8, degree: degree as i16 })
    }

    /// Out of range volumes are rejected, never clamped.
    pub fn volume(volume: i32) -> Result<Command> {
        if !(0..=MAX_VOLUME).contains(&volume) {
            return Err(DroneError::validation("volume", volume, "a value in 0..=100"));
        }
        Ok(Command::AudioVolume(volume as u8))
    }

    pub fn jump(jump_type: JumpType) -> Command {
        Command::Jump(jump_type)
    }

    pub fn animation(animation: Animation) -> Command {
        Command::Animation(animation)
    }

    pub fn audio_theme(theme: AudioTheme) -> Command {
        Command::AudioTheme(theme)
    }

    pub fn video_streaming(enable: bool) -> Command {
        if enable {
            Command::VideoStreamEnable
        } else {
            Command::VideoStreamDisable
        }
    }
}

// "slow_shake", "Slow-Shake" and "slowShake" all name the same thing
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpType {
    Long,
    High,
}

impl fmt::Display for JumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JumpType::Long => "long",
            JumpType::High => "high",
        })
    }
}

impl FromStr for JumpType {
    type Err = DroneError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "long" => Ok(JumpType::Long),
            "high" => Ok(JumpType::High),
            _ => Err(DroneError::validation("jump type", s, "one of long, high")),
        }
    }
}

/// Preset animations built into the drone firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Animation {
    Spin,
    Tap,
    SlowShake,
    Metronome,
    Ondulation,
    SpinJump,
    SpinToPosture,
    Spiral,
    Slalom,
}

impl Animation {
    pub const ALL: [Animation; 9] = [
        Animation::Spin,
        Animation::Tap,
        Animation::SlowShake,
        Animation::Metronome,
        Animation::Ondulation,
        Animation::SpinJump,
        Animation::SpinToPosture,
        Animation::Spiral,
        Animation::Slalom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Animation::Spin => "spin",
            Animation::Tap => "tap",
            Animation::SlowShake => "slowShake",
            Animation::Metronome => "metronome",
            Animation::Ondulation => "ondulation",
            Animation::SpinJump => "spinJump",
            Animation::SpinToPosture => "spinToPosture",
            Animation::Spiral => "spiral",
            Animation::Slalom => "slalom",
        }
    }
}

impl fmt::Display for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Animation {
    type Err = DroneError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = normalize(s);
        Animation::ALL
            .into_iter()
            .find(|a| normalize(a.name()) == wanted)
            .ok_or_else(|| DroneError::validation("animation", s, "a known animation preset"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioTheme {
    Default,
    Robot,
    Insect,
    Monster,
}

impl fmt::Display for AudioTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AudioTheme::Default => "default",
            AudioTheme::Robot => "robot",
            AudioTheme::Insect => "insect",
            AudioTheme::Monster => "monster",
        })
    }
}

impl FromStr for AudioTheme {
    type Err = DroneError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "default" => Ok(AudioTheme::Default),
            "robot" => Ok(AudioTheme::Robot),
            "insect" => Ok(AudioTheme::Insect),
            "monster" => Ok(AudioTheme::Monster),
            _ => Err(DroneError::validation("audio theme", s, "one of default, robot, insect, monster")),
        }
    }
}
