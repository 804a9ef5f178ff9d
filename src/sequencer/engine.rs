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

use std::{fmt, sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::clock::{self, DEFAULT_TEMPO, MAX_TEMPO, MIN_TEMPO};
use super::grid::{check_index, SequenceStep, StepGrid, STEP_COUNT};
use crate::playback::{CompletionSender, PlayRequest, PlaybackDispatcher, VoiceHandle};
use crate::samples::{SampleId, SampleRegistry};
use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayState::Stopped => write!(f, "stopped"),
            PlayState::Playing => write!(f, "playing"),
        }
    }
}

/// What happened at one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// The step holds nothing.
    Empty,
    /// A voice was dispatched.
    Played { handle: VoiceHandle, rate: f32 },
    /// The step's sample could not be played. Playback carries on.
    Unavailable { sample_id: SampleId },
}

/// The result of one clock tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    pub index: usize,
    pub outcome: StepOutcome,
}

/// The step grid and the playback cursor.
///
/// The sequencer does no timing of its own: something calls `tick` once per step
/// duration while it is playing, and feeds finished voices back through
/// `voice_finished`. Each step slot owns at most one voice; a retrigger stops the
/// slot's previous voice before the new one starts. Dropping the sequencer stops
/// every voice it still owns.
pub struct StepSequencer {
    grid: StepGrid,
    tempo: u32,
    state: PlayState,
    cursor: usize,
    slots: [Option<VoiceHandle>; STEP_COUNT],
    /// Bumped on every start so the clock can tell a restart from a running loop.
    run_id: u64,
    registry: Arc<SampleRegistry>,
    dispatcher: Arc<dyn PlaybackDispatcher>,
    completions: CompletionSender,
}

impl StepSequencer {
    /// Creates a stopped sequencer with an empty grid. Completed voices arrive on the
    /// returned receiver and must be passed back to `voice_finished`.
    pub fn new(
        registry: Arc<SampleRegistry>,
        dispatcher: Arc<dyn PlaybackDispatcher>,
    ) -> (StepSequencer, mpsc::UnboundedReceiver<VoiceHandle>) {
        let (completions, rx) = CompletionSender::channel();
        (
            StepSequencer {
                grid: StepGrid::new(),
                tempo: DEFAULT_TEMPO,
                state: PlayState::Stopped,
                cursor: 0,
                slots: [None; STEP_COUNT],
                run_id: 0,
                registry,
                dispatcher,
                completions,
            },
            rx,
        )
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    /// The step the next tick will play.
    pub fn current_step(&self) -> usize {
        self.cursor
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn step_duration(&self) -> Duration {
        clock::step_duration(self.tempo)
    }

    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn grid(&self) -> &StepGrid {
        &self.grid
    }

    pub fn step(&self, index: usize) -> Result<Option<SequenceStep>> {
        self.grid.get(index)
    }

    pub fn active_voice_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Starts playback from step 0. Restarts from step 0 if already playing.
    pub fn start(&mut self) -> Result<()> {
        if self.grid.is_empty() {
            return Err(Error::EmptySequence);
        }
        self.cursor = 0;
        self.state = PlayState::Playing;
        self.run_id += 1;
        info!(
            tempo = self.tempo,
            steps = self.grid.occupied_count(),
            "Sequencer started."
        );
        Ok(())
    }

    /// Stops advancing. Voices already dispatched keep playing. Returns false if the
    /// sequencer was not playing.
    pub fn stop(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.state = PlayState::Stopped;
        info!(step = self.cursor, "Sequencer stopped.");
        true
    }

    /// Plays the step under the cursor and advances it. Returns None while stopped.
    pub fn tick(&mut self) -> Option<Tick> {
        if !self.is_playing() {
            return None;
        }

        let index = self.cursor;
        let outcome = match self.grid.get(index).ok().flatten() {
            Some(step) => self.trigger(index, step),
            None => StepOutcome::Empty,
        };
        self.cursor = (self.cursor + 1) % STEP_COUNT;
        Some(Tick { index, outcome })
    }

    fn trigger(&mut self, index: usize, step: SequenceStep) -> StepOutcome {
        let sample_id = step.sample_id();
        let rate = clock::transpose_rate(step.transpose());

        let source = match self.registry.resolve(sample_id) {
            Ok(source) => source,
            Err(e) => {
                warn!(step = index, %sample_id, err = %e, "Skipping step.");
                return StepOutcome::Unavailable { sample_id };
            }
        };

        if let Some(previous) = self.slots[index].take() {
            debug!(step = index, handle = %previous, "Stopping previous voice.");
            self.dispatcher.stop(previous);
        }

        match self
            .dispatcher
            .play(PlayRequest { source, rate }, &self.completions)
        {
            Ok(handle) => {
                debug!(step = index, %sample_id, %handle, rate, "Step played.");
                self.slots[index] = Some(handle);
                StepOutcome::Played { handle, rate }
            }
            Err(e) => {
                warn!(step = index, %sample_id, err = %e, "Unable to play step.");
                StepOutcome::Unavailable { sample_id }
            }
        }
    }

    /// Releases the slot holding a finished voice. Returns false for voices that were
    /// already pre-empted or never belonged to this sequencer.
    pub fn voice_finished(&mut self, handle: VoiceHandle) -> bool {
        match self.slots.iter_mut().find(|slot| **slot == Some(handle)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    /// Clears an occupied step, or arms an empty one with the first available sample
    /// at its original pitch. Returns the step's new content.
    pub fn toggle_step(&mut self, index: usize) -> Result<Option<SequenceStep>> {
        if self.grid.get(index)?.is_some() {
            self.grid.set(index, None)?;
            return Ok(None);
        }

        let sample_id = self
            .registry
            .available_samples()
            .into_iter()
            .next()
            .ok_or_else(|| Error::Unavailable("no sample is available for the step".into()))?;
        let step = SequenceStep::new(sample_id, 0)?;
        self.grid.set(index, Some(step))?;
        Ok(Some(step))
    }

    /// Overwrites a step. The transpose is clamped to an octave either way.
    pub fn edit_step(
        &mut self,
        index: usize,
        sample_id: SampleId,
        transpose: i32,
    ) -> Result<SequenceStep> {
        let step = SequenceStep::new(sample_id, transpose)?;
        self.grid.set(index, Some(step))?;
        Ok(step)
    }

    pub fn clear_step(&mut self, index: usize) -> Result<()> {
        check_index(index)?;
        self.grid.set(index, None)?;
        Ok(())
    }

    /// Stops playback and empties every step.
    pub fn clear_sequence(&mut self) {
        self.stop();
        self.grid.clear();
    }

    /// Sets the tempo, clamped to the supported range, and returns the value applied.
    pub fn set_tempo(&mut self, bpm: u32) -> u32 {
        self.tempo = bpm.clamp(MIN_TEMPO, MAX_TEMPO);
        self.tempo
    }

    /// Stops every voice the sequencer still owns.
    pub fn release_all(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(handle) = slot.take() {
                self.dispatcher.stop(handle);
            }
        }
    }
}

impl Drop for StepSequencer {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl fmt::Debug for StepSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepSequencer")
            .field("state", &self.state)
            .field("tempo", &self.tempo)
            .field("cursor", &self.cursor)
            .field("steps", &self.grid.occupied_count())
            .field("voices", &self.active_voice_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::playback::mock;
    use crate::testutil::{manual_dispatcher, recording_file, registry};
    use crate::voices::KeyboardVoice;

    fn sequencer() -> (
        StepSequencer,
        mpsc::UnboundedReceiver<VoiceHandle>,
        Arc<mock::Dispatcher>,
    ) {
        let dispatcher = manual_dispatcher();
        let (sequencer, rx) = StepSequencer::new(registry(), dispatcher.clone());
        (sequencer, rx, dispatcher)
    }

    #[test]
    fn test_initial_state() {
        let (sequencer, _rx, _) = sequencer();
        assert_eq!(sequencer.state(), PlayState::Stopped);
        assert_eq!(sequencer.current_step(), 0);
        assert_eq!(sequencer.tempo(), 120);
        assert_eq!(sequencer.step_duration(), Duration::from_millis(125));
        assert!(sequencer.grid().is_empty());
    }

    #[test]
    fn test_start_empty_sequence() {
        let (mut sequencer, _rx, _) = sequencer();
        assert!(matches!(sequencer.start(), Err(Error::EmptySequence)));
        assert_eq!(sequencer.state(), PlayState::Stopped);
        assert_eq!(sequencer.run_id(), 0);
        assert!(sequencer.tick().is_none());
    }

    #[test]
    fn test_toggle_step() {
        let (mut sequencer, _rx, _) = sequencer();

        let armed = sequencer.toggle_step(3).unwrap();
        assert_eq!(armed, Some(SequenceStep::new(SampleId::Keyboard, 0).unwrap()));
        assert_eq!(sequencer.step(3).unwrap(), armed);

        assert_eq!(sequencer.toggle_step(3).unwrap(), None);
        assert!(sequencer.grid().is_empty());

        sequencer.edit_step(5, SampleId::Keyboard, 4).unwrap();
        assert_eq!(sequencer.toggle_step(5).unwrap(), None);
        assert_eq!(sequencer.step(5).unwrap(), None);
    }

    #[test]
    fn test_toggle_step_picks_first_available() {
        let dir = tempdir().unwrap();
        let registry = registry();
        registry.voices().set_voice(KeyboardVoice::Custom);
        registry
            .voices()
            .set_pad_recording(6, Some(recording_file(&dir, "pad6.m4a")))
            .unwrap();
        let (mut sequencer, _rx) = StepSequencer::new(registry, manual_dispatcher());

        assert_eq!(
            sequencer.toggle_step(0).unwrap(),
            Some(SequenceStep::new(SampleId::Pad(6), 0).unwrap())
        );
    }

    #[test]
    fn test_toggle_step_nothing_available() {
        let registry = registry();
        registry.voices().set_voice(KeyboardVoice::Custom);
        let (mut sequencer, _rx) = StepSequencer::new(registry, manual_dispatcher());

        assert!(matches!(
            sequencer.toggle_step(0),
            Err(Error::Unavailable(_))
        ));
        assert!(sequencer.grid().is_empty());
    }

    #[test]
    fn test_step_index_out_of_range() {
        let (mut sequencer, _rx, _) = sequencer();
        assert!(matches!(
            sequencer.toggle_step(16),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            sequencer.edit_step(16, SampleId::Keyboard, 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            sequencer.clear_step(99),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_edit_step_rejects_pad_outside_bank() {
        let (mut sequencer, _rx, _) = sequencer();
        sequencer.edit_step(0, SampleId::Keyboard, 0).unwrap();

        assert!(matches!(
            sequencer.edit_step(0, SampleId::Pad(42), 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            sequencer.edit_step(1, SampleId::Pad(9), 0),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(
            sequencer.step(0).unwrap(),
            Some(SequenceStep::new(SampleId::Keyboard, 0).unwrap())
        );
        assert_eq!(sequencer.step(1).unwrap(), None);
    }

    #[test]
    fn test_ticks_visit_every_step_in_order() {
        let (mut sequencer, _rx, _) = sequencer();
        sequencer.edit_step(7, SampleId::Keyboard, 0).unwrap();
        sequencer.start().unwrap();

        let visited: Vec<usize> = (0..STEP_COUNT)
            .map(|_| sequencer.tick().unwrap().index)
            .collect();
        assert_eq!(visited, (0..STEP_COUNT).collect::<Vec<_>>());
        assert_eq!(sequencer.current_step(), 0);
    }

    #[test]
    fn test_tick_plays_transposed() {
        let (mut sequencer, _rx, dispatcher) = sequencer();
        sequencer.edit_step(0, SampleId::Keyboard, 12).unwrap();
        sequencer.edit_step(1, SampleId::Keyboard, -12).unwrap();
        sequencer.start().unwrap();

        let first = sequencer.tick().unwrap();
        let StepOutcome::Played { handle, rate } = first.outcome else {
            panic!("expected a voice, got {:?}", first.outcome);
        };
        assert_eq!(rate, 2.0);
        assert!(dispatcher.is_active(handle));

        let second = sequencer.tick().unwrap();
        assert!(matches!(second.outcome, StepOutcome::Played { rate, .. } if rate == 0.5));
        assert_eq!(
            sequencer.tick().unwrap(),
            Tick {
                index: 2,
                outcome: StepOutcome::Empty
            }
        );

        let played = dispatcher.played();
        assert_eq!(played.len(), 2);
        assert_eq!(played[0].request.source.kind(), "generated");
        assert_eq!(sequencer.active_voice_count(), 2);
    }

    #[test]
    fn test_unavailable_step_does_not_halt() {
        let (mut sequencer, _rx, dispatcher) = sequencer();
        sequencer.edit_step(0, SampleId::Pad(3), 0).unwrap();
        sequencer.start().unwrap();

        let tick = sequencer.tick().unwrap();
        assert_eq!(
            tick.outcome,
            StepOutcome::Unavailable {
                sample_id: SampleId::Pad(3)
            }
        );
        assert!(sequencer.is_playing());
        assert_eq!(sequencer.current_step(), 1);
        assert!(dispatcher.played().is_empty());
    }

    #[test]
    fn test_dispatch_failure_does_not_halt() {
        let (mut sequencer, _rx, dispatcher) = sequencer();
        sequencer.edit_step(0, SampleId::Keyboard, 0).unwrap();
        sequencer.start().unwrap();
        dispatcher.set_failing(true);

        assert!(matches!(
            sequencer.tick().unwrap().outcome,
            StepOutcome::Unavailable { .. }
        ));
        assert!(sequencer.is_playing());
        assert_eq!(sequencer.active_voice_count(), 0);
    }

    #[test]
    fn test_retrigger_preempts_previous_voice() {
        let (mut sequencer, mut rx, dispatcher) = sequencer();
        sequencer.edit_step(0, SampleId::Keyboard, 0).unwrap();
        sequencer.start().unwrap();

        let Some(Tick {
            outcome: StepOutcome::Played { handle: first, .. },
            ..
        }) = sequencer.tick()
        else {
            panic!("first pass did not play");
        };
        for _ in 1..STEP_COUNT {
            sequencer.tick();
        }
        let Some(Tick {
            outcome: StepOutcome::Played { handle: second, .. },
            ..
        }) = sequencer.tick()
        else {
            panic!("second pass did not play");
        };

        assert_ne!(first, second);
        assert_eq!(dispatcher.stopped(), vec![first]);
        assert!(!dispatcher.is_active(first));
        assert!(dispatcher.is_active(second));

        // The pre-empted voice still reports completion, which is ignored.
        assert_eq!(rx.try_recv().unwrap(), first);
        assert!(!sequencer.voice_finished(first));
        assert_eq!(sequencer.active_voice_count(), 1);
    }

    #[test]
    fn test_voice_finished_releases_slot() {
        let (mut sequencer, mut rx, dispatcher) = sequencer();
        sequencer.edit_step(0, SampleId::Keyboard, 0).unwrap();
        sequencer.start().unwrap();
        sequencer.tick();

        let handle = dispatcher.played()[0].handle;
        assert!(dispatcher.finish(handle));
        assert_eq!(rx.try_recv().unwrap(), handle);
        assert!(sequencer.voice_finished(handle));
        assert_eq!(sequencer.active_voice_count(), 0);
        assert!(!sequencer.voice_finished(VoiceHandle::next()));
    }

    #[test]
    fn test_stop_leaves_voices_playing() {
        let (mut sequencer, _rx, dispatcher) = sequencer();
        sequencer.edit_step(0, SampleId::Keyboard, 0).unwrap();
        sequencer.start().unwrap();
        sequencer.tick();

        assert!(sequencer.stop());
        assert!(!sequencer.stop());
        assert!(sequencer.tick().is_none());
        assert_eq!(dispatcher.active_count(), 1);
        assert!(dispatcher.stopped().is_empty());
    }

    #[test]
    fn test_start_resets_cursor() {
        let (mut sequencer, _rx, _) = sequencer();
        sequencer.edit_step(0, SampleId::Keyboard, 0).unwrap();
        sequencer.start().unwrap();
        sequencer.tick();
        sequencer.tick();
        sequencer.stop();
        assert_eq!(sequencer.current_step(), 2);

        sequencer.start().unwrap();
        assert_eq!(sequencer.current_step(), 0);
        assert_eq!(sequencer.run_id(), 2);
    }

    #[test]
    fn test_clear_sequence_stops() {
        let (mut sequencer, _rx, _) = sequencer();
        sequencer.edit_step(0, SampleId::Keyboard, 0).unwrap();
        sequencer.edit_step(9, SampleId::Keyboard, 2).unwrap();
        sequencer.start().unwrap();

        sequencer.clear_sequence();
        assert_eq!(sequencer.state(), PlayState::Stopped);
        assert!(sequencer.grid().is_empty());
    }

    #[test]
    fn test_set_tempo_clamps() {
        let (mut sequencer, _rx, _) = sequencer();
        assert_eq!(sequencer.set_tempo(30), 60);
        assert_eq!(sequencer.set_tempo(200), 160);
        assert_eq!(sequencer.set_tempo(90), 90);
        assert_eq!(sequencer.step_duration(), Duration::from_millis(167));
    }

    #[test]
    fn test_drop_releases_voices() {
        let (mut sequencer, mut rx, dispatcher) = sequencer();
        sequencer.edit_step(0, SampleId::Keyboard, 0).unwrap();
        sequencer.edit_step(1, SampleId::Keyboard, 3).unwrap();
        sequencer.start().unwrap();
        sequencer.tick();
        sequencer.tick();
        assert_eq!(dispatcher.active_count(), 2);

        drop(sequencer);
        assert_eq!(dispatcher.active_count(), 0);
        assert_eq!(dispatcher.stopped().len(), 2);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }
}
