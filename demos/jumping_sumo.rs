//////////////////////////////////////////////////////////////////////////////
//
// Drives a simulated Jumping Sumo over an in-process channel link.
//
// The fake drone answers every command with movement feedback, drains the
// battery a little each time and streams a few "frames" once video is on.
//
// Run with RUST_LOG=debug to see every command go out.
//
//////////////////////////////////////////////////////////////////////////////

extern crate sumo_controller;

use std::time::Duration;

use sumo_controller::{channel_connection, Command, DeviceLink, DroneController, TelemetryEvent};
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let (connection, device) = channel_connection(Handle::current());
    tokio::spawn(simulate(device));

    let drone = DroneController::new(connection);

    drone
        .add_battery_listener(|level| println!("battery: {level}%"))
        .add_pcmd_listener(|feedback| println!("drone says: {feedback}"));

    drone.forward().right().jump_long().spin();
    drone.audio().theme_named("robot")?.set_volume(50)?;
    drone.video().enable()?;

    tokio::time::sleep(Duration::from_millis(200)).await;

    let frame = drone.video().last_frame();
    println!("last frame: {} bytes, battery now {}%", frame.len(), drone.battery_level());
    println!("session: {:?}", drone.session());

    if let Some(err) = drone.take_last_failure() {
        println!("last failure: {err}");
    }

    drone.close();
    Ok(())
}

async fn simulate(mut device: DeviceLink) {
    let mut battery: u8 = 100;

    while let Some(command) = device.next_command().await {
        battery = battery.saturating_sub(1);
        device.push(TelemetryEvent::MovementFeedback(format!("{command:?}")));
        device.push(TelemetryEvent::BatteryLevel(battery));

        if command == Command::VideoStreamEnable {
            for n in 0..3u8 {
                device.push_video_frame(&[0xff, 0xd8, n, 0xff, 0xd9]);
            }
        }
    }
}
