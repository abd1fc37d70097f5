//! Command-line MIDI file player
//!
//! Usage:
//!   smfsynth info <file.mid>
//!   smfsynth render <plugin> <file.mid> <out.wav> [--seek <ms>] [--config <file>]
//!   smfsynth play <plugin> <file.mid> [--seek <ms>] [--config <file>]
//!   smfsynth editor <plugin> [--config <file>]
//!   smfsynth devices
//!
//! Without `--config`, `<plugin>.json` next to the plugin is used if present.
//! `play` and `editor` stop when Enter is pressed.

use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use smfsynth_lib::audio::device::list_output_devices;
use smfsynth_lib::audio::output::LiveOutput;
use smfsynth_lib::audio::pcm::BitDepth;
use smfsynth_lib::audio::plugin::{ClapInstrument, Instrument};
use smfsynth_lib::audio::wav::WavWriter;
use smfsynth_lib::logging::init_logging;
use smfsynth_lib::{parse, plugin_description, MidiPlugin, PlaybackSettings, PlayerConfig};

/// Ring buffer length for live playback
const OUTPUT_BUFFER_MS: u32 = 500;

const USAGE: &str = "Usage:
  smfsynth info <file.mid>
  smfsynth render <plugin> <file.mid> <out.wav> [--seek <ms>] [--config <file>]
  smfsynth play <plugin> <file.mid> [--seek <ms>] [--config <file>]
  smfsynth editor <plugin> [--config <file>]
  smfsynth devices";

struct Args {
    command: String,
    positional: Vec<String>,
    seek_ms: Option<u32>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = env::args().skip(1);
    let command = args.next().ok_or_else(|| "Missing command".to_string())?;
    let mut positional = Vec::new();
    let mut seek_ms = None;
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seek" => {
                let value = args.next().ok_or("--seek needs a value")?;
                seek_ms = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_| format!("Invalid seek time: {}", value))?,
                );
            }
            "--config" => {
                let value = args.next().ok_or("--config needs a value")?;
                config = Some(PathBuf::from(value));
            }
            _ => positional.push(arg),
        }
    }

    Ok(Args {
        command,
        positional,
        seek_ms,
        config,
    })
}

fn main() {
    init_logging();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let result = match (args.command.as_str(), args.positional.as_slice()) {
        ("info", [midi]) => run_info(Path::new(midi)),
        ("render", [plugin, midi, out]) => {
            run_render(&args, Path::new(plugin), Path::new(midi), Path::new(out))
        }
        ("play", [plugin, midi]) => run_play(&args, Path::new(plugin), Path::new(midi)),
        ("editor", [plugin]) => run_editor(&args, Path::new(plugin)),
        ("devices", []) => run_devices(),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args, plugin: &Path) -> Result<PlayerConfig, String> {
    let config = match &args.config {
        Some(path) => PlayerConfig::load(path),
        None => PlayerConfig::beside_plugin(plugin),
    };
    config.map_err(|e| e.to_string())
}

fn load_plugin(
    path: &Path,
    config: &PlayerConfig,
    settings: PlaybackSettings,
) -> Result<MidiPlugin<ClapInstrument>, String> {
    let instrument =
        ClapInstrument::load(path, config.reset_on_start).map_err(|e| e.to_string())?;
    let module_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let plugin = MidiPlugin::new(instrument, plugin_description(&module_name), settings);
    log::info!("{}", plugin.description());
    Ok(plugin)
}

/// Set once the user presses Enter or stdin closes
fn stop_on_enter() -> Arc<AtomicBool> {
    let should_stop = Arc::new(AtomicBool::new(false));
    let should_stop_clone = should_stop.clone();
    thread::spawn(move || {
        let mut line = String::new();
        let _ = BufReader::new(std::io::stdin()).read_line(&mut line);
        should_stop_clone.store(true, Ordering::SeqCst);
    });
    should_stop
}

fn run_info(midi: &Path) -> Result<(), String> {
    let metadata = parse(midi).map_err(|e| e.to_string())?;
    println!("File:      {}", midi.display());
    println!("Title:     {}", metadata.title);
    println!("Copyright: {}", metadata.copyright);
    println!(
        "Duration:  {}:{:02}.{:03}",
        metadata.duration_ms / 60_000,
        metadata.duration_ms / 1000 % 60,
        metadata.duration_ms % 1000
    );
    println!("Info:      {}", metadata.extra_info);
    Ok(())
}

fn run_render(args: &Args, plugin_path: &Path, midi: &Path, out: &Path) -> Result<(), String> {
    let config = load_config(args, plugin_path)?;
    let settings = config.playback_settings();
    let depth = BitDepth::from_bits(settings.sample_bits)
        .ok_or_else(|| format!("Unsupported bit depth: {}", settings.sample_bits))?;

    let plugin = load_plugin(plugin_path, &config, settings)?;
    let mut session = plugin.open(midi).map_err(|e| e.to_string())?;
    if let Some(ms) = args.seek_ms {
        session.seek(ms).map_err(|e| e.to_string())?;
    }

    let format = session.format();
    let file = File::create(out).map_err(|e| format!("Failed to create {}: {}", out.display(), e))?;
    let mut wav = WavWriter::new(BufWriter::new(file), format.sample_rate, format.channels, depth)
        .map_err(|e| e.to_string())?;

    let mut buffer = vec![0u8; format.unit_length];
    loop {
        let written = session.render(&mut buffer).map_err(|e| e.to_string())?;
        wav.write_pcm(&buffer[..written]).map_err(|e| e.to_string())?;
        if written < buffer.len() {
            break;
        }
    }
    session.close();

    let data_size = wav.data_size();
    wav.finish().map_err(|e| e.to_string())?;
    log::info!(
        "Wrote {} ({} ms of audio)",
        out.display(),
        data_size as u64 * 1000 / (format.sample_rate as u64 * format.frame_bytes() as u64)
    );
    Ok(())
}

fn run_play(args: &Args, plugin_path: &Path, midi: &Path) -> Result<(), String> {
    let config = load_config(args, plugin_path)?;
    let mut settings = config.playback_settings();
    let depth = BitDepth::from_bits(settings.sample_bits)
        .ok_or_else(|| format!("Unsupported bit depth: {}", settings.sample_bits))?;

    // The device may not run at the configured rate
    let mut output = LiveOutput::open(
        config.output_device.as_deref(),
        settings.sample_rate,
        OUTPUT_BUFFER_MS,
    )
    .map_err(|e| e.to_string())?;
    settings.sample_rate = output.sample_rate();

    let plugin = load_plugin(plugin_path, &config, settings)?;
    let mut session = plugin.open(midi).map_err(|e| e.to_string())?;
    if let Some(ms) = args.seek_ms {
        session.seek(ms).map_err(|e| e.to_string())?;
    }

    let metadata = session.metadata();
    log::info!(
        "Playing {} on {} ({} ms), press Enter to stop",
        if metadata.title.is_empty() { midi.display().to_string() } else { metadata.title },
        output.device_name(),
        metadata.duration_ms
    );

    let should_stop = stop_on_enter();
    let format = session.format();
    let unit_frames = format.unit_length / format.frame_bytes();
    let mut buffer = vec![0u8; format.unit_length];

    while !should_stop.load(Ordering::SeqCst) {
        if output.vacant_frames() < unit_frames {
            thread::sleep(Duration::from_millis(5));
            continue;
        }
        let written = session.render(&mut buffer).map_err(|e| e.to_string())?;
        output.push_pcm(&buffer[..written], depth);
        if written < buffer.len() {
            break;
        }
    }

    // Let the tail play out
    while !should_stop.load(Ordering::SeqCst) && output.queued_frames() > 0 {
        thread::sleep(Duration::from_millis(10));
    }
    session.close();
    Ok(())
}

fn run_editor(args: &Args, plugin_path: &Path) -> Result<(), String> {
    let config = load_config(args, plugin_path)?;
    let plugin = load_plugin(plugin_path, &config, config.playback_settings())?;
    plugin.show_editor().map_err(|e| e.to_string())?;
    log::info!("Editor open, press Enter to close");

    let should_stop = stop_on_enter();
    while !should_stop.load(Ordering::SeqCst) {
        {
            let mut instrument = plugin.instrument();
            if !instrument.is_editor_open() {
                break;
            }
            instrument.service_main_thread();
        }
        thread::sleep(Duration::from_millis(16));
    }

    plugin.instrument().close_editor();
    log::info!("{} editor closed", plugin.instrument().name());
    Ok(())
}

fn run_devices() -> Result<(), String> {
    let devices = list_output_devices().map_err(|e| e.to_string())?;
    for device in devices {
        let marker = if device.is_default { "*" } else { " " };
        println!("{} {}", marker, device.name);
    }
    Ok(())
}
