use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use metronome::audio::{AudioOutput, CpalOutput, NullOutput};
use metronome::config::AppConfig;
use metronome::error::{log_audio_error, ErrorCode};
use metronome::metronome::{
    run_session, BeatDisplay, Command, Session, Settings, TokioTimer, COMMAND_CHANNEL_CAPACITY,
};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(
    name = "metronome",
    about = "Terminal metronome with an accented downbeat",
    after_help = "While running, type `tempo <bpm>`, `beats <n>`, `volume <0-1>`, \
                  `toggle` (or just Enter) and `quit`."
)]
struct Cli {
    /// Initial tempo in BPM (40-208)
    #[arg(long)]
    tempo: Option<u32>,
    /// Initial beats per measure (2, 3, 4, 6 or 8)
    #[arg(long)]
    beats: Option<u32>,
    /// Initial click volume (0.0-1.0)
    #[arg(long)]
    volume: Option<f32>,
    /// JSON config file (defaults to assets/metronome_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Run without opening an audio device
    #[arg(long)]
    silent: bool,
    /// Wait for `toggle` instead of starting right away
    #[arg(long)]
    paused: bool,
    /// Quit automatically after this many seconds
    #[arg(long)]
    duration_secs: Option<u64>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Prints beat numbers, one per line.
struct TerminalDisplay;

impl BeatDisplay for TerminalDisplay {
    fn show_beat(&mut self, beat: u32) {
        if beat == 1 {
            println!("{beat} *");
        } else {
            println!("{beat}");
        }
    }

    fn clear(&mut self) {
        println!();
    }

    fn show_settings(&mut self, settings: &Settings) {
        println!(
            "tempo {} BPM | {} beats per measure | volume {:.2}",
            settings.tempo_bpm, settings.beats_per_measure, settings.volume
        );
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);
    if let Some(tempo) = cli.tempo {
        config.metronome.tempo_bpm = tempo;
    }
    if let Some(beats) = cli.beats {
        config.metronome.beats_per_measure = beats;
    }
    if let Some(volume) = cli.volume {
        config.metronome.volume = volume;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    // The session stays on this thread: audio streams are not Send everywhere
    runtime.block_on(run_metronome(cli, config))
}

async fn run_metronome(cli: Cli, config: AppConfig) -> Result<()> {
    let output = open_output(&config, cli.silent);
    let (timer, timer_rx) = TokioTimer::new();
    let mut session = Session::new(&config, output, TerminalDisplay, timer);

    let settings = session.settings();
    TerminalDisplay.show_settings(&settings);
    if !cli.paused {
        session.start();
    }

    let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    spawn_stdin_reader(tx.clone()).context("spawning stdin reader")?;

    let signal_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = signal_tx.send(Command::Shutdown).await;
        }
    });

    if let Some(secs) = cli.duration_secs {
        let deadline_tx = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            let _ = deadline_tx.send(Command::Shutdown).await;
        });
    }
    drop(tx);

    let session = run_session(session, rx, timer_rx).await;
    let stats = session.stats();
    tracing::info!(
        "[Main] {} tick(s), {} click(s) played, {} failed",
        stats.ticks,
        stats.clicks_played,
        stats.clicks_failed
    );
    Ok(())
}

/// Open the system output, degrading to silence if it is unavailable.
fn open_output(config: &AppConfig, silent: bool) -> Box<dyn AudioOutput> {
    if silent {
        return Box::new(NullOutput::new());
    }

    match CpalOutput::new(&config.audio) {
        Ok(output) => Box::new(output),
        Err(err) => {
            log_audio_error(&err, "open_output");
            tracing::warn!("[Main] Continuing without sound");
            Box::new(NullOutput::new())
        }
    }
}

/// Forward parsed stdin lines to the session. Blocking reads live on their
/// own thread so they never stall the event loop.
fn spawn_stdin_reader(tx: mpsc::Sender<Command>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match line.parse::<Command>() {
                    Ok(command) => {
                        if tx.blocking_send(command).is_err() {
                            break;
                        }
                    }
                    Err(err) => eprintln!("{}", err.message()),
                }
            }
        })?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}
