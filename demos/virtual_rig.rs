use wheelup::backends::serial_port::SerialAdapter;
use wheelup::backends::virtual_input::{VirtualSerial, VirtualWheel};
use wheelup::{CameraPan, DeviceRegistry, KeyAxis, RigConfig, RigManager, VehicleSink};

#[derive(Default)]
struct PrintCar {
    autopilot: bool,
}

impl VehicleSink for PrintCar {
    fn set_steering(&mut self, value: f32) {
        println!("  steering {value:+.3}");
    }
    fn set_throttle(&mut self, value: f32) {
        println!("  throttle {value:.3}");
    }
    fn set_brake(&mut self, value: f32) {
        println!("  brake    {value:.3}");
    }
    fn press_reverse(&mut self) {}
    fn release_reverse(&mut self) {}
    fn press_turn_signal_left(&mut self) {}
    fn release_turn_signal_left(&mut self) {}
    fn press_turn_signal_right(&mut self) {}
    fn release_turn_signal_right(&mut self) {}
    fn press_handbrake(&mut self) {}
    fn release_handbrake(&mut self) {}
    fn camera_nudge(&mut self, direction: CameraPan) {
        println!("  camera   {direction:?}");
    }
    fn next_camera_view(&mut self) {}
    fn prev_camera_view(&mut self) {}
    fn autopilot_active(&self) -> bool {
        self.autopilot
    }
    fn vehicle_speed(&self) -> f32 {
        0.0
    }
}

fn step(rig: &mut RigManager, car: &mut PrintCar, label: &str) {
    println!("{label}");
    let snap = rig.tick(Some(car));
    println!("  -> {:?} ({:?}), force {:?}", snap.source, snap.phase, snap.force);
}

fn main() {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    let wheel = VirtualWheel::new(true);
    let link = VirtualSerial::new();
    let registry = DeviceRegistry::new()
        .with_wheel(wheel.clone())
        .with_serial(SerialAdapter::with_link("virtual0", 9600, Box::new(link.clone())));

    let mut config = RigConfig::default();
    config.wheel.log_updates = true;
    let mut rig = RigManager::new(config, registry);
    let mut car = PrintCar::default();

    step(&mut rig, &mut car, "wheel plugged in, untouched");

    wheel.set_axes(12000, 32767, 32767);
    step(&mut rig, &mut car, "driver turns the wheel");
    step(&mut rig, &mut car, "wheel held");

    rig.keyboard_mut().set_axis(KeyAxis::Brake, 1.0);
    step(&mut rig, &mut car, "brake key pressed");

    car.autopilot = true;
    step(&mut rig, &mut car, "autopilot engaged, wheel still");

    link.push_line("0.8;1.0;0.1");
    step(&mut rig, &mut car, "pedal board sends a line");

    wheel.set_pov(27000);
    step(&mut rig, &mut car, "hat pushed left");

    wheel.unplug();
    step(&mut rig, &mut car, "wheel unplugged");

    rig.shutdown(true);
    println!("forces issued: {:?}", wheel.forces());
}
