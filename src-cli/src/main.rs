//! Reel - headless player
//!
//! Plays a list of files through the EQ/gain pipeline on a CPAL output,
//! advancing to the next file when the current one finishes.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use reel_core::{
    AudioDevice, Event, Player, PlayerConfig, SpectrumAnalyzer, FFT_SIZE, NUM_EQ_BANDS,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// UI refresh interval
const TICK: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "reel", about = "Play audio files through a 10-band EQ")]
struct Cli {
    /// Audio files to play in order (MP3, WAV)
    files: Vec<PathBuf>,

    /// Output device name (defaults to the system output)
    #[arg(short, long)]
    device: Option<String>,

    /// List output devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Master volume in dB (-30 to +6)
    #[arg(short, long, allow_hyphen_values = true)]
    volume: Option<f32>,

    /// Ten comma-separated band gains in dB (-12 to +12)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    eq: Vec<f32>,

    /// Built-in EQ preset (Flat, Bass Boost, Vocal, ...)
    #[arg(short, long)]
    preset: Option<String>,

    /// JSON player configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log spectrum band levels every tick (at debug level)
    #[arg(long)]
    spectrum: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    if cli.list_devices {
        return list_devices();
    }
    if cli.files.is_empty() {
        bail!("no input files (try --help)");
    }

    let config = match &cli.config {
        Some(path) => PlayerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PlayerConfig::default(),
    };

    let player = Player::open(config, cli.device.as_deref()).context("opening output device")?;
    apply_settings(&player, &cli)?;

    let mut analyzer = cli
        .spectrum
        .then(|| SpectrumAnalyzer::new(player.output_sample_rate() as f32));

    for path in &cli.files {
        if let Err(e) = player.play_file(path) {
            error!("Skipping {}: {}", path.display(), e);
            continue;
        }
        // A device failure ends the whole run
        play_to_end(&player, path, analyzer.as_mut())?;
    }

    player.close();
    info!("Done");
    Ok(())
}

fn list_devices() -> Result<()> {
    for device in AudioDevice::enumerate_outputs()? {
        let marker = if device.is_default { "*" } else { " " };
        println!(
            "{} {} ({} ch, {:?} Hz)",
            marker, device.name, device.max_channels, device.sample_rates
        );
    }
    Ok(())
}

fn apply_settings(player: &Player, cli: &Cli) -> Result<()> {
    if let Some(name) = &cli.preset {
        player.apply_preset(name)?;
    }
    if !cli.eq.is_empty() {
        if cli.eq.len() != NUM_EQ_BANDS {
            bail!("--eq takes {} gains, got {}", NUM_EQ_BANDS, cli.eq.len());
        }
        for (band, &db) in cli.eq.iter().enumerate() {
            player.set_eq_band(band, db);
        }
    }
    if let Some(db) = cli.volume {
        player.set_volume(db);
    }
    Ok(())
}

/// Wait for the loaded file to finish.
///
/// Fails if the output stream reports an error, since nothing will pull
/// the track to its end after that.
fn play_to_end(
    player: &Player,
    path: &Path,
    mut analyzer: Option<&mut SpectrumAnalyzer>,
) -> Result<()> {
    let events = player.events();
    info!(
        "Playing {} ({:.1}s)",
        path.display(),
        player.duration().as_secs_f64()
    );

    while !player.track_finished() {
        thread::sleep(TICK);

        for event in events.try_iter() {
            handle_event(event, player.track_finished())?;
        }

        if let Some(analyzer) = analyzer.as_deref_mut() {
            let levels = analyzer.analyze(&player.sample_snapshot(FFT_SIZE));
            debug!(
                "{:>6.1}s {}",
                player.position().as_secs_f64(),
                format_levels(&levels)
            );
        }
    }

    Ok(())
}

/// Log one player event. An error that arrives while the track is still
/// running came from the output stream and is fatal.
fn handle_event(event: Event, track_finished: bool) -> Result<()> {
    match event {
        Event::Error { message } if track_finished => warn!("Track failed: {}", message),
        Event::Error { message } => bail!("output stream failed: {}", message),
        other => debug!("{:?}", other),
    }
    Ok(())
}

/// One bar character per band
fn format_levels(levels: &[f32]) -> String {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    levels
        .iter()
        .map(|&l| BARS[((l.clamp(0.0, 1.0) * 7.0).round()) as usize])
        .collect()
}
