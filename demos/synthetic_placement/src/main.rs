use argh::FromArgs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anchorage::ar::{
    interfaces::Renderer,
    session::ArSession,
    touch::{TouchAction, TouchEvent},
    AnchorPose,
};
use anchorage::k3d::camera::CameraId;
use parking_lot::Mutex;
use rand::Rng;

mod fitter;
mod tracker;

use fitter::RayMarchFitter;
use tracker::{Scene, SyntheticTracker};

#[derive(FromArgs)]
/// Place objects on the floor of a synthetic scene by tapping the screen
struct Args {
    /// path to a JSON session configuration
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// the number of taps to simulate
    #[argh(option, short = 't', default = "5")]
    taps: usize,

    /// the pause between two taps, in milliseconds
    #[argh(option, default = "500")]
    tap_interval_ms: u64,

    /// the depth snapshot rate, in hertz
    #[argh(option, default = "5.0")]
    depth_rate: f64,

    /// the radius of the circle the device moves on, in meters
    #[argh(option, default = "2.0")]
    radius: f64,
}

/// Keeps the object pose the next frame would be drawn with.
#[derive(Default)]
struct ConsoleRenderer {
    anchor: Mutex<Option<AnchorPose>>,
    frames: AtomicUsize,
}

impl Renderer for ConsoleRenderer {
    fn set_anchor(&self, anchor: AnchorPose) {
        log::info!(
            "object moved to {:?} at t={:.3}",
            anchor.position(),
            anchor.timestamp
        );
        *self.anchor.lock() = Some(anchor);
    }

    fn on_frame_available(&self, _camera: CameraId) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let tracker = Arc::new(SyntheticTracker::new(
        Scene::new(args.radius, 1.2)?,
        args.depth_rate,
    ));
    let renderer = Arc::new(ConsoleRenderer::default());

    let fitter = Arc::new(RayMarchFitter::default());

    let mut session = match &args.config {
        Some(path) => ArSession::from_config_file(tracker, fitter, renderer.clone(), path)?,
        None => ArSession::new(tracker, fitter, renderer.clone(), Default::default()),
    };
    session.connect()?;

    let extrinsics = session.extrinsics().ok_or("extrinsics missing after connect")?;
    println!("device_T_depth: {:?}", extrinsics.device_t_depth()?.transform);

    let (width, height) = (1280.0, 720.0);
    let mut rng = rand::rng();

    for i in 0..args.taps {
        std::thread::sleep(Duration::from_millis(args.tap_interval_ms));

        let x = rng.random_range(0.0..width);
        let y = rng.random_range(height * 0.3..height);
        for action in [TouchAction::Down, TouchAction::Up] {
            let event = TouchEvent { action, x, y };
            match session.on_touch(event, width, height) {
                Some(Ok(anchor)) => println!(
                    "tap #{i} at ({x:.0}, {y:.0}): anchor at {:?}, normal {:?}",
                    anchor.position(),
                    anchor.normal
                ),
                Some(Err(err)) => println!("tap #{i} at ({x:.0}, {y:.0}): {err}"),
                None => {}
            }
        }
    }

    session.disconnect();

    println!(
        "frames: {}, depth snapshots: {}",
        renderer.frames.load(Ordering::Relaxed),
        session.store().update_count()
    );
    if let Some(anchor) = *renderer.anchor.lock() {
        println!("final object pose: {:?}", anchor.world_t_anchor);
    }

    Ok(())
}
