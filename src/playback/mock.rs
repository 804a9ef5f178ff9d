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

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{Completion, CompletionSender, PlayRequest, PlaybackDispatcher, VoiceHandle};
use crate::{Error, Result};

/// Most recent plays and stops remembered for inspection.
const HISTORY_LIMIT: usize = 256;

/// Assumed length of file-backed voices, which the mock never decodes.
const FILE_VOICE_LENGTH: Duration = Duration::from_millis(500);

/// A voice the mock was asked to play.
#[derive(Clone, Debug, PartialEq)]
pub struct Played {
    pub handle: VoiceHandle,
    pub request: PlayRequest,
}

/// A mock dispatcher. Doesn't actually play anything.
///
/// By default voices stay active until they are stopped or finished by hand. With
/// auto-completion enabled, each voice completes after its length at the requested
/// rate, measured on the tokio clock.
pub struct Dispatcher {
    name: String,
    auto_complete: bool,
    failing: AtomicBool,
    voices: Arc<Mutex<HashMap<VoiceHandle, Completion>>>,
    played: Mutex<VecDeque<Played>>,
    stopped: Mutex<VecDeque<VoiceHandle>>,
}

impl Dispatcher {
    /// Creates the given mock dispatcher.
    pub fn new(name: &str) -> Dispatcher {
        Dispatcher {
            name: name.to_string(),
            auto_complete: false,
            failing: AtomicBool::new(false),
            voices: Arc::new(Mutex::new(HashMap::new())),
            played: Mutex::new(VecDeque::new()),
            stopped: Mutex::new(VecDeque::new()),
        }
    }

    /// Completes voices on their own once they have played out.
    pub fn with_auto_complete(mut self) -> Dispatcher {
        self.auto_complete = true;
        self
    }

    /// Makes every subsequent `play` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// The most recent voices started, oldest first.
    pub fn played(&self) -> Vec<Played> {
        self.played.lock().iter().cloned().collect()
    }

    /// The most recent voices stopped explicitly, oldest first.
    pub fn stopped(&self) -> Vec<VoiceHandle> {
        self.stopped.lock().iter().copied().collect()
    }

    pub fn active_count(&self) -> usize {
        self.voices.lock().len()
    }

    pub fn is_active(&self, handle: VoiceHandle) -> bool {
        self.voices.lock().contains_key(&handle)
    }

    /// Ends a voice as if it had played to completion. Returns false if it was not
    /// active.
    pub fn finish(&self, handle: VoiceHandle) -> bool {
        let completion = self.voices.lock().remove(&handle);
        match completion {
            Some(completion) => {
                completion.complete();
                true
            }
            None => false,
        }
    }

    fn schedule_completion(&self, handle: VoiceHandle, length: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(%handle, "No runtime available, voice must be finished by hand");
            return;
        };
        let voices = self.voices.clone();
        runtime.spawn(async move {
            tokio::time::sleep(length).await;
            let completion = voices.lock().remove(&handle);
            if let Some(completion) = completion {
                debug!(%handle, "Voice played out");
                completion.complete();
            }
        });
    }
}

impl PlaybackDispatcher for Dispatcher {
    fn play(&self, request: PlayRequest, completions: &CompletionSender) -> Result<VoiceHandle> {
        if !(request.rate.is_finite() && request.rate > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "playback rate must be positive, got {}",
                request.rate
            )));
        }
        if self.failing.load(Ordering::Relaxed) {
            return Err(Error::Dispatch(format!("{} refused to play", self)));
        }

        let handle = VoiceHandle::next();
        let length = request
            .source
            .duration()
            .unwrap_or(FILE_VOICE_LENGTH)
            .div_f32(request.rate);
        info!(
            dispatcher = self.name,
            %handle,
            kind = request.source.kind(),
            rate = request.rate,
            length_ms = length.as_millis(),
            "Playing voice."
        );

        self.voices.lock().insert(handle, completions.token(handle));
        remember(&self.played, Played { handle, request });
        if self.auto_complete {
            self.schedule_completion(handle, length);
        }
        Ok(handle)
    }

    fn stop(&self, handle: VoiceHandle) {
        let completion = self.voices.lock().remove(&handle);
        if let Some(completion) = completion {
            debug!(dispatcher = self.name, %handle, "Stopping voice.");
            remember(&self.stopped, handle);
            completion.complete();
        }
    }
}

fn remember<T>(history: &Mutex<VecDeque<T>>, entry: T) {
    let mut history = history.lock();
    if history.len() == HISTORY_LIMIT {
        history.pop_front();
    }
    history.push_back(entry);
}

impl fmt::Display for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
