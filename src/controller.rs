use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::audio::AudioSession;
use crate::command::{Animation, Command, JumpType};
use crate::connection::{Connection, ConnectionLifecycle, ConnectionStatus};
use crate::dispatcher::CommandDispatcher;
use crate::errors::{DroneError, Result};
use crate::options::ControllerOptions;
use crate::state::{SessionSnapshot, SessionState};
use crate::telemetry::{battery_listener, pcmd_listener, ListenerCategory, TelemetryBus};
use crate::video::VideoSession;

/// Controls a drone over a [`Connection`].
///
/// The connection is opened on construction. A failed connect does not make
/// construction fail; it shows up in [`status`](Self::status) and every
/// command sent afterwards is rejected.
///
/// Movement and animation methods return `&Self` so they can be chained:
///
/// ```no_run
/// # fn fly(drone: &sumo_controller::DroneController) {
/// drone.forward().left_by(45).jump_high().spin();
/// if let Some(err) = drone.take_last_failure() {
///     eprintln!("something went wrong: {err}");
/// }
/// # }
/// ```
///
/// Chaining hides individual results, so the most recent failure is kept
/// and can be read with [`last_failure`](Self::last_failure).
pub struct DroneController {
    link: Arc<ConnectionLifecycle>,
    dispatcher: Arc<CommandDispatcher>,
    bus: Arc<TelemetryBus>,
    state: Arc<SessionState>,
    video: VideoSession,
    audio: AudioSession,
    options: ControllerOptions,
}

impl DroneController {
    pub fn new<C: Connection + 'static>(connection: C) -> Self {
        Self::with_options(connection, ControllerOptions::default())
    }

    pub fn with_options<C: Connection + 'static>(connection: C, options: ControllerOptions) -> Self {
        info!(?options, "[Drone] creating controller");

        let state = Arc::new(SessionState::new(options.initial_volume));
        let bus = Arc::new(TelemetryBus::new(Arc::clone(&state)));
        let link = Arc::new(ConnectionLifecycle::new(Box::new(connection)));
        let dispatcher = Arc::new(CommandDispatcher::new(Arc::clone(&link)));

        let video = VideoSession::new(Arc::clone(&dispatcher), Arc::clone(&bus), Arc::clone(&state));
        let audio = AudioSession::new(Arc::clone(&dispatcher), Arc::clone(&state));

        link.open(&bus);

        Self { link, dispatcher, bus, state, video, audio, options }
    }

    /// Disconnects. Safe to call more than once.
    pub fn close(&self) {
        self.link.close();
    }

    pub fn status(&self) -> ConnectionStatus {
        self.link.status()
    }

    /// Sends an arbitrary command and reports the outcome.
    pub fn dispatch(&self, command: Command) -> Result<()> {
        self.dispatcher.dispatch(command)
    }

    pub fn send(&self, command: Command) -> &Self {
        let _ = self.dispatcher.dispatch(command);
        self
    }

    fn submit(&self, command: Result<Command>) -> &Self {
        let _ = self.dispatcher.dispatch_checked(command);
        self
    }

    pub fn last_failure(&self) -> Option<DroneError> {
        self.dispatcher.last_failure()
    }

    pub fn take_last_failure(&self) -> Option<DroneError> {
        self.dispatcher.take_last_failure()
    }

    // movement

    pub fn pcmd(&self, speed: i32, degree: i32) -> &Self {
        self.submit(Command::pcmd(speed, degree))
    }

    pub fn forward(&self) -> &Self {
        self.pcmd(self.options.cruise_speed as i32, 0)
    }

    pub fn backward(&self) -> &Self {
        self.pcmd(-(self.options.cruise_speed as i32), 0)
    }

    pub fn left(&self) -> &Self {
        self.left_by(self.options.turn_degrees as i32)
    }

    pub fn left_by(&self, degrees: i32) -> &Self {
        self.pcmd(0, -degrees)
    }

    pub fn right(&self) -> &Self {
        self.right_by(self.options.turn_degrees as i32)
    }

    pub fn right_by(&self, degrees: i32) -> &Self {
        self.pcmd(0, degrees)
    }

    pub fn jump(&self, jump_type: JumpType) -> &Self {
        self.send(Command::jump(jump_type))
    }

    pub fn jump_named(&self, name: &str) -> &Self {
        self.submit(JumpType::from_str(name).map(Command::jump))
    }

    pub fn jump_high(&self) -> &Self {
        self.jump(JumpType::High)
    }

    pub fn jump_long(&self) -> &Self {
        self.jump(JumpType::Long)
    }

    // animations

    pub fn animate(&self, animation: Animation) -> &Self {
        self.send(Command::animation(animation))
    }

    pub fn animate_named(&self, name: &str) -> &Self {
        self.submit(Animation::from_str(name).map(Command::animation))
    }

    pub fn stop_animation(&self) -> &Self {
        self.send(Command::StopAnimation)
    }

    pub fn spin(&self) -> &Self {
        self.animate(Animation::Spin)
    }

    pub fn tap(&self) -> &Self {
        self.animate(Animation::Tap)
    }

    pub fn slow_shake(&self) -> &Self {
        self.animate(Animation::SlowShake)
    }

    pub fn metronome(&self) -> &Self {
        self.animate(Animation::Metronome)
    }

    pub fn ondulation(&self) -> &Self {
        self.animate(Animation::Ondulation)
    }

    pub fn spin_jump(&self) -> &Self {
        self.animate(Animation::SpinJump)
    }

    pub fn spin_to_posture(&self) -> &Self {
        self.animate(Animation::SpinToPosture)
    }

    pub fn spiral(&self) -> &Self {
        self.animate(Animation::Spiral)
    }

    pub fn slalom(&self) -> &Self {
        self.animate(Animation::Slalom)
    }

    // telemetry

    pub fn add_battery_listener<F>(&self, callback: F) -> &Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.bus.subscribe(ListenerCategory::Battery, battery_listener(callback));
        self
    }

    pub fn add_pcmd_listener<F>(&self, callback: F) -> &Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.bus.subscribe(ListenerCategory::MovementFeedback, pcmd_listener(callback));
        self
    }

    /// Last battery level reported by the drone, 0 until the first report.
    pub fn battery_level(&self) -> u8 {
        self.state.battery()
    }

    pub fn session(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn telemetry(&self) -> &TelemetryBus {
        &self.bus
    }

    pub fn audio(&self) -> &AudioSession {
        &self.audio
    }

    pub fn video(&self) -> &VideoSession {
        &self.video
    }
}

impl Drop for DroneController {
    fn drop(&mut self) {
        self.close();
    }
}
