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

use std::sync::Arc;
use std::time::Duration;

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info, span, Instrument, Level};

use super::engine::{PlayState, StepSequencer, Tick};
use super::grid::{SequenceStep, StepGrid};
use crate::playback::{PlaybackDispatcher, VoiceHandle};
use crate::samples::{SampleId, SampleRegistry};
use crate::{Error, Result};

/// Events buffered per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

type Command = Box<dyn FnOnce(&mut StepSequencer) + Send>;

/// Published by the transport as playback progresses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SequencerEvent {
    Started { tempo: u32 },
    Stopped,
    Step(Tick),
}

/// A point-in-time view of the sequencer.
#[derive(Clone, Debug, PartialEq)]
pub struct SequencerSnapshot {
    pub state: PlayState,
    pub tempo: u32,
    pub current_step: usize,
    pub grid: StepGrid,
    pub active_voices: usize,
}

impl From<&StepSequencer> for SequencerSnapshot {
    fn from(sequencer: &StepSequencer) -> Self {
        SequencerSnapshot {
            state: sequencer.state(),
            tempo: sequencer.tempo(),
            current_step: sequencer.current_step(),
            grid: sequencer.grid().clone(),
            active_voices: sequencer.active_voice_count(),
        }
    }
}

/// Runs a sequencer on its own task and clocks it.
///
/// Ticks, voice completions and edits are all handled on that one task, so they never
/// interleave. The clock sleeps until absolute deadlines: the first tick fires one step
/// after `start`, and each following deadline is the previous one plus the step
/// duration at the time the tick fired. A tempo change therefore only affects the wait
/// after the pending tick. If the task falls behind by a whole step, the missed steps
/// are skipped and the clock re-anchors one step after the late tick, rather than
/// firing the backlog at once. Dropping the transport (or calling `shutdown`) ends the task
/// and stops every voice the sequencer owns.
pub struct Transport {
    commands: mpsc::UnboundedSender<Command>,
    events: broadcast::Sender<SequencerEvent>,
    join: JoinHandle<()>,
}

impl Transport {
    /// Creates a sequencer and starts its transport. Must be called within a tokio
    /// runtime.
    pub fn new(
        registry: Arc<SampleRegistry>,
        dispatcher: Arc<dyn PlaybackDispatcher>,
    ) -> Transport {
        let (sequencer, completions) = StepSequencer::new(registry, dispatcher);
        Transport::spawn(sequencer, completions)
    }

    /// Starts a transport for an existing sequencer and its completion receiver.
    pub fn spawn(
        sequencer: StepSequencer,
        completions: mpsc::UnboundedReceiver<VoiceHandle>,
    ) -> Transport {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let span = span!(Level::INFO, "transport");
        let join = tokio::spawn(
            run(sequencer, completions, command_rx, events.clone()).instrument(span),
        );

        Transport {
            commands,
            events,
            join,
        }
    }

    /// Subscribes to playback events.
    pub fn subscribe(&self) -> broadcast::Receiver<SequencerEvent> {
        self.events.subscribe()
    }

    /// Runs a closure against the sequencer on the transport task.
    async fn call<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut StepSequencer) -> R + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Box::new(move |sequencer| {
                let _ = reply_tx.send(f(sequencer));
            }))
            .map_err(|_| Error::Shutdown)?;
        reply_rx.await.map_err(|_| Error::Shutdown)
    }

    pub async fn start(&self) -> Result<()> {
        self.call(StepSequencer::start).await?
    }

    /// Stops playback. Returns false if it was not playing.
    pub async fn stop(&self) -> Result<bool> {
        self.call(StepSequencer::stop).await
    }

    pub async fn toggle_step(&self, index: usize) -> Result<Option<SequenceStep>> {
        self.call(move |sequencer| sequencer.toggle_step(index))
            .await?
    }

    pub async fn edit_step(
        &self,
        index: usize,
        sample_id: SampleId,
        transpose: i32,
    ) -> Result<SequenceStep> {
        self.call(move |sequencer| sequencer.edit_step(index, sample_id, transpose))
            .await?
    }

    pub async fn clear_step(&self, index: usize) -> Result<()> {
        self.call(move |sequencer| sequencer.clear_step(index))
            .await?
    }

    pub async fn clear_sequence(&self) -> Result<()> {
        self.call(StepSequencer::clear_sequence).await
    }

    /// Sets the tempo and returns the clamped value applied.
    pub async fn set_tempo(&self, bpm: u32) -> Result<u32> {
        self.call(move |sequencer| sequencer.set_tempo(bpm)).await
    }

    pub async fn snapshot(&self) -> Result<SequencerSnapshot> {
        self.call(|sequencer| SequencerSnapshot::from(&*sequencer))
            .await
    }

    /// Ends the transport task and waits for the sequencer to release its voices.
    pub async fn shutdown(self) -> Result<()> {
        let Transport { commands, join, .. } = self;
        drop(commands);
        join.await.map_err(|_| Error::Shutdown)
    }
}

/// The deadline after `previous`, or one period from `now` if that has already passed.
fn next_deadline(previous: Instant, period: Duration, now: Instant) -> Instant {
    let next = previous + period;
    if next > now {
        next
    } else {
        now + period
    }
}

async fn run(
    mut sequencer: StepSequencer,
    mut completions: mpsc::UnboundedReceiver<VoiceHandle>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<SequencerEvent>,
) {
    let mut deadline: Option<Instant> = None;
    let mut run_id = sequencer.run_id();
    debug!("Transport running.");

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(tick) = sequencer.tick() {
                    let _ = events.send(SequencerEvent::Step(tick));
                }
                let period = sequencer.step_duration();
                deadline = deadline.map(|deadline| next_deadline(deadline, period, Instant::now()));
            }
            Some(handle) = completions.recv() => {
                if sequencer.voice_finished(handle) {
                    debug!(%handle, "Voice finished.");
                }
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };

                let was_playing = sequencer.is_playing();
                command(&mut sequencer);

                if sequencer.run_id() != run_id {
                    run_id = sequencer.run_id();
                    deadline = Some(Instant::now() + sequencer.step_duration());
                    let _ = events.send(SequencerEvent::Started { tempo: sequencer.tempo() });
                } else if was_playing && !sequencer.is_playing() {
                    deadline = None;
                    let _ = events.send(SequencerEvent::Stopped);
                }
            }
        }
    }

    info!("Transport shut down.");
}
