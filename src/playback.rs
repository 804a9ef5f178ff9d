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

//! The boundary to the audio output.
//!
//! The core never talks to an audio device directly. It hands a `PlayRequest` to a
//! `PlaybackDispatcher` together with a `CompletionSender`; the dispatcher wraps that
//! sender in a `Completion` token for the new voice, which reports the end of the voice
//! exactly once, whether it finished on its own or was stopped.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::samples::SampleSource;
use crate::Result;

pub mod mock;

/// Global voice ID counter.
static NEXT_VOICE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one live voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceHandle(u64);

impl VoiceHandle {
    /// Allocates a new, unique handle.
    pub fn next() -> VoiceHandle {
        VoiceHandle(NEXT_VOICE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// A one-shot playback request.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayRequest {
    pub source: SampleSource,
    /// Playback speed multiplier; 2.0 plays an octave up.
    pub rate: f32,
}

/// Where completed voices are reported.
#[derive(Clone, Debug)]
pub struct CompletionSender {
    tx: mpsc::UnboundedSender<VoiceHandle>,
}

impl CompletionSender {
    /// Creates a sender and the receiver that completed handles arrive on.
    pub fn channel() -> (CompletionSender, mpsc::UnboundedReceiver<VoiceHandle>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CompletionSender { tx }, rx)
    }

    /// Creates the completion token for a voice.
    pub fn token(&self, handle: VoiceHandle) -> Completion {
        Completion {
            handle,
            tx: Some(self.tx.clone()),
        }
    }
}

/// Reports the end of one voice. Fires on `complete` or, failing that, on drop, and
/// never more than once.
#[derive(Debug)]
pub struct Completion {
    handle: VoiceHandle,
    tx: Option<mpsc::UnboundedSender<VoiceHandle>>,
}

impl Completion {
    pub fn handle(&self) -> VoiceHandle {
        self.handle
    }

    /// Reports the voice as finished.
    pub fn complete(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(tx) = self.tx.take() {
            // The receiver may already be gone during teardown.
            let _ = tx.send(self.handle);
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.fire();
    }
}

/// Plays audio on behalf of the core.
pub trait PlaybackDispatcher: Send + Sync {
    /// Starts a voice. The dispatcher must report its end through `completions`
    /// exactly once.
    fn play(&self, request: PlayRequest, completions: &CompletionSender) -> Result<VoiceHandle>;

    /// Stops a voice. Stopping an unknown or finished voice is a no-op.
    fn stop(&self, handle: VoiceHandle);
}
