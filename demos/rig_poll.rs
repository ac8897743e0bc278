use std::time::{Duration, Instant};
use tracing::info;
use wheelup::{CameraPan, ControlSource, RigConfig, RigManager, VehicleSink};

/// Pretend vehicle that just remembers what it was told.
#[derive(Default)]
struct ConsoleCar {
    steering: f32,
    throttle: f32,
    brake: f32,
    reverse: bool,
}

impl VehicleSink for ConsoleCar {
    fn set_steering(&mut self, value: f32) {
        self.steering = value;
    }
    fn set_throttle(&mut self, value: f32) {
        self.throttle = value;
    }
    fn set_brake(&mut self, value: f32) {
        self.brake = value;
    }
    fn press_reverse(&mut self) {
        if !self.reverse {
            info!("reverse engaged");
        }
        self.reverse = true;
    }
    fn release_reverse(&mut self) {
        self.reverse = false;
    }
    fn press_turn_signal_left(&mut self) {}
    fn release_turn_signal_left(&mut self) {}
    fn press_turn_signal_right(&mut self) {}
    fn release_turn_signal_right(&mut self) {}
    fn press_handbrake(&mut self) {}
    fn release_handbrake(&mut self) {}
    fn camera_nudge(&mut self, direction: CameraPan) {
        info!(?direction, "camera nudge");
    }
    fn next_camera_view(&mut self) {}
    fn prev_camera_view(&mut self) {}
    fn autopilot_active(&self) -> bool {
        false
    }
    fn vehicle_speed(&self) -> f32 {
        0.0
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Optional config path: `cargo run --example rig_poll -- rig.toml`
    let config = match std::env::args().nth(1) {
        Some(path) => RigConfig::load(&path).expect("load config"),
        None => RigConfig::default(),
    };

    let mut rig = RigManager::from_config(config);
    let mut car = ConsoleCar::default();
    let mut last_print = Instant::now();

    loop {
        let snap = rig.tick(Some(&mut car));
        if last_print.elapsed() >= Duration::from_millis(250) && snap.source != ControlSource::None {
            println!(
                "{:?} {:?}: steer={:+.3} throttle={:.3} brake={:.3} force={:?}",
                snap.source, snap.phase, car.steering, car.throttle, car.brake, snap.force
            );
            last_print = Instant::now();
        }
        // ~60 Hz, like a render loop
        std::thread::sleep(Duration::from_millis(16));
    }
}
