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

//! Live triggering of the keyboard and the drum pads.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::playback::{CompletionSender, PlayRequest, PlaybackDispatcher, VoiceHandle};
use crate::samples::{SampleId, SampleRegistry};
use crate::sequencer::transpose_rate;
use crate::Result;

/// Keyboard range either side of the root, in semitones.
pub const KEY_RANGE: i32 = 24;

/// Plays keyboard notes and pad hits as they happen, outside the sequencer.
///
/// Voices overlap freely. They are tracked until their completion arrives, and
/// whatever is still sounding is stopped by `release_all` or on drop.
pub struct Performer {
    registry: Arc<SampleRegistry>,
    dispatcher: Arc<dyn PlaybackDispatcher>,
    completions: CompletionSender,
    finished: mpsc::UnboundedReceiver<VoiceHandle>,
    active: HashSet<VoiceHandle>,
}

impl Performer {
    pub fn new(registry: Arc<SampleRegistry>, dispatcher: Arc<dyn PlaybackDispatcher>) -> Performer {
        let (completions, finished) = CompletionSender::channel();
        Performer {
            registry,
            dispatcher,
            completions,
            finished,
            active: HashSet::new(),
        }
    }

    /// Plays the keyboard voice shifted by the given number of semitones.
    pub fn press_key(&mut self, semitones: i32) -> Result<VoiceHandle> {
        let semitones = semitones.clamp(-KEY_RANGE, KEY_RANGE);
        self.trigger(SampleId::Keyboard, transpose_rate(semitones))
    }

    /// Plays a pad at its recorded pitch.
    pub fn hit_pad(&mut self, index: usize) -> Result<VoiceHandle> {
        self.trigger(SampleId::pad(index)?, 1.0)
    }

    fn trigger(&mut self, sample_id: SampleId, rate: f32) -> Result<VoiceHandle> {
        self.reap();
        let source = self.registry.resolve(sample_id)?;
        let handle = self
            .dispatcher
            .play(PlayRequest { source, rate }, &self.completions)?;
        debug!(%sample_id, %handle, rate, "Triggered.");
        self.active.insert(handle);
        Ok(handle)
    }

    /// Forgets voices that have finished. Returns how many were reaped.
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        while let Ok(handle) = self.finished.try_recv() {
            if self.active.remove(&handle) {
                reaped += 1;
            }
        }
        reaped
    }

    pub fn active_voice_count(&mut self) -> usize {
        self.reap();
        self.active.len()
    }

    /// Stops every voice still sounding.
    pub fn release_all(&mut self) {
        if self.active.is_empty() {
            return;
        }
        info!(voices = self.active.len(), "Releasing performer voices.");
        for handle in self.active.drain() {
            self.dispatcher.stop(handle);
        }
    }
}

impl Drop for Performer {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl fmt::Debug for Performer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Performer")
            .field("active", &self.active.len())
            .finish()
    }
}
