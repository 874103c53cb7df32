mod flat_world;
mod logging_host;
mod simulated_runtime;
mod timeline;

use std::{collections::HashSet, path::PathBuf, thread, time::Duration};

use clap::Parser;
use cgmath::vec3;
use l4d2vr::{
    error::SessionError, host::HostInput, runtime::Eye, time::Time, EngineOptions, VrEngine,
};
use tracing::{error, info, trace};
use tracing_subscriber::EnvFilter;

use crate::{
    flat_world::FlatWorld, logging_host::LoggingHost, simulated_runtime::SimulatedRuntime,
    timeline::Timeline,
};

const WINDOW_SIZE: (u32, u32) = (1920, 1080);

type DesktopEngine = VrEngine<SimulatedRuntime, LoggingHost, FlatWorld>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Game install directory; `VR/config.txt` and the action manifest are read from here
    #[arg(long = "install-dir", default_value = ".")]
    install_dir: PathBuf,

    #[arg(long, default_value_t = 240)]
    frames: u64,

    #[arg(long = "frame-ms", default_value_t = 11)]
    frame_ms: u64,

    /// Skip live reloading of the config file
    #[arg(long = "no-watch")]
    no_watch: bool,

    #[arg(short, long, default_value = None)]
    experimental: Option<Vec<String>>,
}

pub fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let experimental_features: HashSet<String> =
        args.experimental.unwrap_or_default().into_iter().collect();

    let options = EngineOptions {
        install_dir: args.install_dir,
        watch_config: !args.no_watch,
        experimental_features,
        ..EngineOptions::default()
    };

    let mut engine = match start_session(Timeline::demo(), options) {
        Ok(engine) => engine,
        Err(err) => {
            error!("unable to start VR session: {err}");
            std::process::exit(1);
        }
    };

    let frame_duration = Duration::from_millis(args.frame_ms);
    let mut time = Time::default();

    for frame in 0..args.frames {
        step(&mut engine, &mut time, frame, frame_duration);
        thread::sleep(frame_duration);
    }

    engine.shutdown();
    info!(
        "sent {} commands, cursor last at {:?}",
        engine.host().commands_sent(),
        engine.host().cursor()
    );
}

fn start_session(timeline: Timeline, options: EngineOptions) -> Result<DesktopEngine, SessionError> {
    let mut engine = VrEngine::init(
        SimulatedRuntime::new(timeline),
        LoggingHost::new(WINDOW_SIZE),
        FlatWorld::default(),
        options,
    )?;

    // Player standing just short of the portal, eyes at the host's usual height
    engine.set_setup_origin(vec3(0.0, 0.0, 64.0));
    Ok(engine)
}

fn step(engine: &mut DesktopEngine, time: &mut Time, frame: u64, frame_duration: Duration) {
    engine.runtime_mut().set_frame(frame);
    time.advance(frame_duration);

    // The host stops rendering stereo frames while its menu is up
    let rendered_new_frame = !engine.host().is_cursor_visible();
    engine.update(time, rendered_new_frame);

    let view_origin = engine.view_origin();
    let (eye, eye_angles) =
        engine.trace_eye(engine.setup_origin(), view_origin, engine.view_angle());
    trace!(
        "left eye {:?}, right eye {:?}",
        engine.eye_origin(Eye::Left),
        engine.eye_origin(Eye::Right)
    );

    if frame % 30 == 0 {
        info!(
            "frame {frame}: eye {:?} angles {:?}, viewmodel {:?}, aim {:?}",
            eye,
            eye_angles,
            engine.viewmodel_abs_pos(),
            engine.aim_point()
        );
    }
}
