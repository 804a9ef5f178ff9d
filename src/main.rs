// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use beatpad::config::Session;
use beatpad::library::DEFAULT_BASE_FREQUENCY;
use beatpad::playback::mock;
use beatpad::sequencer::{SequencerEvent, StepOutcome};
use beatpad::studio::Studio;
use beatpad::synth::{builtin_presets, synthesize};
use beatpad::util::{duration_seconds_millis, filename_display};
use clap::{crate_version, Parser, Subcommand};
use duration_string::DurationString;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A keyboard, drum pad and step sequencer toolkit."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the built-in keyboard presets.
    Presets {},
    /// Synthesizes a preset to a WAV file.
    Render {
        /// The name of the preset to render.
        preset: String,
        /// The path of the WAV file to write.
        output: String,
        /// The frequency of the note, in Hz.
        #[arg[short, long, default_value_t = DEFAULT_BASE_FREQUENCY]]
        frequency: f64,
    },
    /// Plays a session's step pattern against a logging mock output.
    Play {
        /// The path to the session file.
        session_path: String,
        /// How long to play for, e.g. 4s or 1m.
        #[arg[short, long, default_value = "4s"]]
        duration: String,
    },
    /// Lists the samples a session can currently play.
    Samples {
        /// The path to the session file.
        session_path: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Presets {} => {
            println!("Presets:");
            for preset in builtin_presets() {
                println!(
                    "- {} (duration: {}, gain: {:.2}, partials: {})",
                    preset.name(),
                    duration_seconds_millis(Duration::from_secs_f64(preset.duration_seconds())),
                    preset.overall_gain(),
                    preset.partials().len()
                );
            }
        }
        Commands::Render {
            preset,
            output,
            frequency,
        } => {
            let preset = builtin_presets()
                .into_iter()
                .find(|candidate| candidate.name() == preset)
                .ok_or_else(|| format!("unknown preset '{}'", preset))?;
            let buffer = synthesize(frequency, &preset)?;
            let output = Path::new(&output);
            buffer.write_to(output)?;
            println!(
                "Wrote {} ({} samples, {}).",
                filename_display(output),
                buffer.sample_count(),
                duration_seconds_millis(buffer.duration())
            );
        }
        Commands::Play {
            session_path,
            duration,
        } => {
            let duration: Duration = DurationString::from_string(duration)?.into();
            let studio = Studio::from_session(Session::deserialize(Path::new(&session_path))?)?;
            let dispatcher = Arc::new(mock::Dispatcher::new("cli").with_auto_complete());
            let transport = studio.transport(dispatcher)?;
            let mut events = transport.subscribe();

            transport.start().await?;
            let finished = tokio::time::sleep(duration);
            tokio::pin!(finished);
            loop {
                tokio::select! {
                    _ = &mut finished => break,
                    event = events.recv() => match event {
                        Ok(SequencerEvent::Step(tick)) => match tick.outcome {
                            StepOutcome::Played { handle, rate } => {
                                println!("{:2}: {} at {:.3}x", tick.index, handle, rate)
                            }
                            StepOutcome::Unavailable { sample_id } => {
                                println!("{:2}: {} unavailable", tick.index, sample_id)
                            }
                            StepOutcome::Empty => {}
                        },
                        Ok(_) => {}
                        Err(RecvError::Lagged(missed)) => warn!(missed, "Missed sequencer events."),
                        Err(RecvError::Closed) => break,
                    },
                }
            }

            transport.stop().await?;
            transport.shutdown().await?;
        }
        Commands::Samples { session_path } => {
            let studio = Studio::from_session(Session::deserialize(Path::new(&session_path))?)?;
            let registry = studio.registry();
            let samples = registry.available_samples();

            if samples.is_empty() {
                println!("No samples available.");
                return Ok(());
            }

            println!("Samples:");
            for id in samples {
                let source = registry.resolve(id)?;
                match source.path() {
                    Some(path) => println!("- {} ({}: {})", id, source.kind(), path.display()),
                    None => println!("- {} ({})", id, source.kind()),
                }
            }
        }
    }

    Ok(())
}
