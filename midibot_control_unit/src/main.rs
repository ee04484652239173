//! # Midibot Binary
//!
//! Plays notes on a three-axis machine by streaming G-code moves.
//!
//! # Usage
//!
//! ```bash
//! # Text events from stdin, G-code to stdout
//! midibot --stdin-events < song.txt
//!
//! # Stream to a serial device node
//! midibot --config config/midibot.toml --sink-path /dev/ttyACM0
//!
//! # Hardware MIDI input (build with --features midi)
//! midibot --midi-port "Keystation" -v
//! ```

#![deny(warnings)]

use std::io::BufReader;
use std::path::PathBuf;
use std::thread;

use clap::Parser;
use midibot_common::config::{ConfigError, LogLevel};
use midibot_common::consts::DEFAULT_CONFIG_PATH;
use midibot_control_unit::config::{MidibotConfig, SinkKind, load_config};
use midibot_control_unit::cycle::{ControlLoop, CycleError};
use midibot_control_unit::midi::spawn_text_source;
use midibot_control_unit::sink::create_sink;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Midibot - play notes on a 3-axis machine
#[derive(Parser, Debug)]
#[command(name = "midibot")]
#[command(version)]
#[command(about = "Turns note events into G-code motion for a 3-axis machine")]
#[command(long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply if it does not exist).
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Write G-code to this file or device node instead of the configured sink.
    #[arg(long, value_name = "PATH")]
    sink_path: Option<PathBuf>,

    /// MIDI input port (index or name fragment).
    #[cfg(feature = "midi")]
    #[arg(long, value_name = "PORT")]
    midi_port: Option<String>,

    /// Read text events ("on 60", "off 60") from stdin.
    #[arg(long)]
    stdin_events: bool,

    /// List MIDI input ports and exit.
    #[cfg(feature = "midi")]
    #[arg(long)]
    list_ports: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("midibot failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = load_config(&args.config);
    let log_level = match &loaded {
        Ok(config) => config.shared.log_level,
        Err(_) => LogLevel::default(),
    };
    setup_tracing(&args, log_level);
    info!("Midibot v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = &mut match loaded {
        Ok(config) => {
            info!("Configuration loaded from {}", args.config.display());
            config
        }
        Err(ConfigError::FileNotFound) => {
            warn!(
                "Config file {} not found, using defaults",
                args.config.display()
            );
            MidibotConfig::default()
        }
        Err(e) => return Err(e.into()),
    };

    #[cfg(feature = "midi")]
    if args.list_ports {
        for port in midibot_control_unit::midi::input::list_ports()? {
            println!("{}: {}", port.index, port.name);
        }
        return Ok(());
    }

    if let Some(path) = &args.sink_path {
        config.sink.kind = SinkKind::File;
        config.sink.path = Some(path.clone());
    }
    #[cfg(feature = "midi")]
    if args.midi_port.is_some() {
        config.midi.port = args.midi_port.clone();
    }
    config.validate()?;

    let sink = create_sink(&config.sink)?;
    let mut control = ControlLoop::new(config, sink);
    let handle = control.handle();

    ctrlc::set_handler({
        let handle = handle.clone();
        move || {
            info!("Received interrupt signal");
            handle.interrupt();
        }
    })?;

    // Keep the MIDI connection alive for the lifetime of the loop.
    #[cfg(feature = "midi")]
    let _midi_input = if args.stdin_events {
        None
    } else {
        Some(midibot_control_unit::midi::input::MidiInputSource::connect(
            config.midi.port.as_deref(),
            control.registry(),
        )?)
    };

    #[cfg(not(feature = "midi"))]
    if !args.stdin_events {
        info!("Built without MIDI support, reading text events from stdin");
    }

    if args.stdin_events || cfg!(not(feature = "midi")) {
        let source = spawn_text_source(BufReader::new(std::io::stdin()), control.registry());
        // Let held notes run out on the watchdog, then stop.
        let drain = config.control.tick_period() * (config.control.auto_stop_ticks + 1);
        let handle = handle.clone();
        thread::spawn(move || {
            let _ = source.join();
            thread::sleep(drain);
            info!("Event input finished, shutting down");
            handle.request_shutdown();
        });
    }

    control.reset()?;
    match control.run() {
        Ok(()) | Err(CycleError::Interrupted) => {}
        Err(e) => return Err(e.into()),
    }

    info!("Midibot shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and config.
///
/// Logs go to stderr; stdout may carry G-code.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_str()
    } else {
        log_level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
