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

//! Keyboard voice selection and the drum pad recording bank.
//!
//! The `VoiceManager` is shared by `Arc` between whatever records audio, the sample
//! registry, and any UI. Each successful mutation notifies subscribers exactly once,
//! synchronously, after the new state is in place.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use tracing::debug;

use crate::samples::{Recording, PAD_COUNT};
use crate::synth::{ELECTRIC, PIANO};
use crate::{Error, Result};

/// The sound played by the keyboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardVoice {
    #[default]
    Piano,
    Electric,
    /// The user's own recording.
    Custom,
}

impl KeyboardVoice {
    /// The library preset backing this voice. Custom voices have none.
    pub fn preset_name(self) -> Option<&'static str> {
        match self {
            KeyboardVoice::Piano => Some(PIANO),
            KeyboardVoice::Electric => Some(ELECTRIC),
            KeyboardVoice::Custom => None,
        }
    }
}

impl fmt::Display for KeyboardVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyboardVoice::Piano => "piano",
            KeyboardVoice::Electric => "electric",
            KeyboardVoice::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for KeyboardVoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<KeyboardVoice> {
        match s {
            "piano" => Ok(KeyboardVoice::Piano),
            "electric" => Ok(KeyboardVoice::Electric),
            "custom" => Ok(KeyboardVoice::Custom),
            _ => Err(Error::InvalidArgument(format!("unknown voice '{}'", s))),
        }
    }
}

/// Which voice the keyboard plays and the custom recording, if any.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoiceSelection {
    pub voice: KeyboardVoice,
    pub custom_recording: Option<Recording>,
}

/// Fixed bank of pad recordings, every slot initially empty.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PadBank {
    slots: [Option<Recording>; PAD_COUNT],
}

impl PadBank {
    /// Returns the recording for the pad.
    pub fn get(&self, index: usize) -> Result<Option<&Recording>> {
        self.slots
            .get(index)
            .map(Option::as_ref)
            .ok_or_else(|| out_of_range(index))
    }

    /// Overwrites the recording for the pad.
    pub fn set(&mut self, index: usize, recording: Option<Recording>) -> Result<()> {
        let slot = self.slots.get_mut(index).ok_or_else(|| out_of_range(index))?;
        *slot = recording;
        Ok(())
    }

    /// Iterates pads in order with their recordings.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&Recording>)> {
        self.slots.iter().enumerate().map(|(i, r)| (i, r.as_ref()))
    }

    /// Number of pads holding a recording.
    pub fn recorded_count(&self) -> usize {
        self.slots.iter().filter(|r| r.is_some()).count()
    }
}

fn out_of_range(index: usize) -> Error {
    Error::InvalidArgument(format!(
        "pad index {} is out of range 0..{}",
        index, PAD_COUNT
    ))
}

/// A consistent view of all voice state, handed to subscribers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VoiceSnapshot {
    pub selection: VoiceSelection,
    pub pads: PadBank,
}

/// Identifies a subscription so it can be removed again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&VoiceSnapshot) + Send + Sync>;

/// Owns voice selection and pad recordings, and broadcasts every change.
pub struct VoiceManager {
    state: RwLock<VoiceSnapshot>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
}

impl VoiceManager {
    /// Creates a manager with the piano selected and no recordings.
    pub fn new() -> VoiceManager {
        VoiceManager {
            state: RwLock::new(VoiceSnapshot::default()),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    pub fn snapshot(&self) -> VoiceSnapshot {
        self.state.read().clone()
    }

    pub fn selection(&self) -> VoiceSelection {
        self.state.read().selection.clone()
    }

    pub fn selected_voice(&self) -> KeyboardVoice {
        self.state.read().selection.voice
    }

    pub fn custom_recording(&self) -> Option<Recording> {
        self.state.read().selection.custom_recording.clone()
    }

    /// Returns the recording for the pad.
    pub fn pad_recording(&self, index: usize) -> Result<Option<Recording>> {
        Ok(self.state.read().pads.get(index)?.cloned())
    }

    /// Selects the keyboard voice. Returns false, without notifying, if it was already
    /// selected.
    ///
    /// Selecting `Custom` without a recording is allowed here; the keyboard then
    /// resolves as unavailable until a recording is set.
    pub fn set_voice(&self, voice: KeyboardVoice) -> bool {
        let snapshot = {
            let mut state = self.state.write();
            if state.selection.voice == voice {
                return false;
            }
            state.selection.voice = voice;
            state.clone()
        };
        debug!(%voice, "Keyboard voice selected");
        self.notify(&snapshot);
        true
    }

    /// Replaces the custom keyboard recording. Setting a recording also selects the
    /// custom voice.
    pub fn set_keyboard_recording(&self, recording: Option<Recording>) {
        let snapshot = {
            let mut state = self.state.write();
            if recording.is_some() {
                state.selection.voice = KeyboardVoice::Custom;
            }
            state.selection.custom_recording = recording;
            state.clone()
        };
        debug!(
            recorded = snapshot.selection.custom_recording.is_some(),
            "Keyboard recording replaced"
        );
        self.notify(&snapshot);
    }

    /// Replaces the recording for a pad.
    pub fn set_pad_recording(&self, index: usize, recording: Option<Recording>) -> Result<()> {
        let snapshot = {
            let mut state = self.state.write();
            state.pads.set(index, recording)?;
            state.clone()
        };
        debug!(pad = index, "Pad recording replaced");
        self.notify(&snapshot);
        Ok(())
    }

    /// Registers a callback invoked after every change.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&VoiceSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, Arc::new(callback)));
        id
    }

    /// Removes a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub, _)| *sub != id);
        subscribers.len() != before
    }

    fn notify(&self, snapshot: &VoiceSnapshot) {
        // Callbacks run outside the lock so they may call back into the manager.
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in subscribers {
            callback(snapshot);
        }
    }
}

impl Default for VoiceManager {
    fn default() -> Self {
        VoiceManager::new()
    }
}

impl fmt::Debug for VoiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("VoiceManager")
            .field("voice", &state.selection.voice)
            .field("custom_recording", &state.selection.custom_recording.is_some())
            .field("recorded_pads", &state.pads.recorded_count())
            .field("subscribers", &self.subscribers.lock().len())
            .finish()
    }
}
