//! Hands-free pointer control from facial gestures.
//!
//! Starts the gesture engine on a webcam and reads simple commands from stdin:
//! `p` toggles pause, `r` recalibrates, `set NAME VALUE` tunes a parameter,
//! `status` prints the engine state and `q` quits.

use anyhow::{bail, Context, Result};
use clap::Parser;
use face_gesture_mouse::{
    capture::OpenCvCamera,
    config::{Config, EXAMPLE_CONFIG},
    controller::{Controller, DeviceOpener},
    cursor_control::X11InputSink,
    events::EngineEvent,
    face_mesh::FaceMeshDetector,
    input_sink::{InputSink, LoggingSink},
};
use log::{info, warn};
use std::{io::BufRead, path::PathBuf, thread};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera index to use (overrides the config file)
    #[arg(long)]
    cam: Option<i32>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Path to the face-mesh ONNX model (overrides the config file)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Do not mirror camera frames
    #[arg(long)]
    no_mirror: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Log pointer actions instead of moving the real pointer
    #[arg(long)]
    dry_run: bool,

    /// Override a gesture parameter, e.g. --set SCROLL_STEP=80 (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    overrides: Vec<(String, f64)>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,
}

fn parse_assignment(raw: &str) -> std::result::Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid value for {name}: {e}"))?;
    Ok((name.trim().to_string(), value))
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = if let Some(path) = &args.config {
        info!("Loading configuration from: {}", path.display());
        match Config::from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(cam) = args.cam {
        config.camera.index = cam;
    }
    if let Some(model) = &args.model {
        config.model.face_mesh.clone_from(model);
    }
    if args.no_mirror {
        config.camera.mirror = false;
    }
    for (name, value) in &args.overrides {
        config
            .parameters
            .update(name, *value)
            .with_context(|| format!("--set {name}={value}"))?;
    }

    config.validate()?;
    Ok(config)
}

fn print_event(event: &EngineEvent) {
    match event {
        EngineEvent::StateChanged(state) => println!("[state] {state}"),
        EngineEvent::Status(message) => println!("[status] {message}"),
        EngineEvent::Calibrated(profile) => println!(
            "[calibrated] EAR {:.3}, blink below {:.3}, mouth open above {:.4}",
            profile.baseline_ear, profile.blink_threshold, profile.mouth_open_threshold
        ),
        EngineEvent::Gesture(gesture) => println!("[gesture] {gesture:?}"),
        EngineEvent::Error(message) => eprintln!("[error] {message}"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Face Gesture Mouse");

    let config = load_config(&args)?;

    let detector = FaceMeshDetector::from_config(&config.model)
        .with_context(|| format!("loading {}", config.model.face_mesh.display()))?;

    let sink: Box<dyn InputSink> = if args.dry_run {
        info!("Dry run: pointer actions are only logged");
        Box::new(LoggingSink::new(1920, 1080))
    } else {
        Box::new(X11InputSink::new()?)
    };

    let camera_config = config.camera.clone();
    let opener: DeviceOpener<OpenCvCamera> = Box::new(move || OpenCvCamera::open(&camera_config));
    let mut controller = Controller::new(opener, detector, sink, &config);

    let events = controller.subscribe();
    let printer = thread::Builder::new()
        .name("event-printer".into())
        .spawn(move || {
            for event in events {
                print_event(&event);
            }
        })?;

    controller.start()?;
    println!("Commands: p = pause/resume, r = recalibrate, set NAME VALUE, status, q = quit");

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        let result = match words.next() {
            None => continue,
            Some("q" | "quit") => break,
            Some("p") => {
                if controller.is_paused() {
                    controller.resume()
                } else {
                    controller.pause()
                }
            }
            Some("r") => controller.recalibrate(),
            Some("set") => match (words.next(), words.next().map(str::parse::<f64>)) {
                (Some(name), Some(Ok(value))) => controller
                    .update_parameter(name, value)
                    .map(|name| println!("{name} = {value}")),
                _ => {
                    println!("usage: set NAME VALUE");
                    Ok(())
                }
            },
            Some("status") => {
                let status = controller.status();
                println!("state: {}, paused: {}", status.state, status.paused);
                for (name, value) in controller.parameters().iter() {
                    println!("  {name} = {value}");
                }
                Ok(())
            }
            Some(other) => {
                println!("unknown command '{other}'");
                Ok(())
            }
        };
        if let Err(e) = result {
            println!("error: {e}");
        }
    }

    controller.stop()?;
    drop(controller);
    if printer.join().is_err() {
        bail!("event printer thread panicked");
    }
    Ok(())
}
