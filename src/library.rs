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

//! The shared sound library: presets and their synthesized buffers.
//!
//! Buffers are synthesized once when the library is built and never change afterwards,
//! so they can be handed out by `Arc` to any number of voices.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::synth::{self, builtin_presets, AudioBuffer, VoicePreset};
use crate::Result;

/// Fundamental used for the keyboard voice buffers (middle C).
pub const DEFAULT_BASE_FREQUENCY: f64 = 261.63;

/// Presets and their cached buffers.
pub struct SoundLibrary {
    /// Presets in declaration order.
    presets: Vec<VoicePreset>,
    /// Synthesized buffers by preset name.
    buffers: HashMap<String, Arc<AudioBuffer>>,
    /// The fundamental every preset was rendered at.
    base_frequency: f64,
}

impl SoundLibrary {
    /// Synthesizes every preset at `base_frequency`.
    ///
    /// Presets are rendered in parallel; the cache is only assembled once all of them
    /// have finished.
    pub fn new(presets: Vec<VoicePreset>, base_frequency: f64) -> Result<SoundLibrary> {
        let started = Instant::now();
        let buffers = presets
            .par_iter()
            .map(|preset| {
                synth::synthesize(base_frequency, preset)
                    .map(|buffer| (preset.name().to_string(), Arc::new(buffer)))
            })
            .collect::<Result<HashMap<String, Arc<AudioBuffer>>>>()?;

        let library = SoundLibrary {
            presets,
            buffers,
            base_frequency,
        };
        info!(
            presets = library.presets.len(),
            base_frequency,
            memory_kb = library.memory_usage() / 1024,
            elapsed_ms = started.elapsed().as_millis(),
            "Sound library synthesized"
        );
        Ok(library)
    }

    /// Builds the library from the built-in presets.
    pub fn with_builtin_presets(base_frequency: f64) -> Result<SoundLibrary> {
        SoundLibrary::new(builtin_presets(), base_frequency)
    }

    /// Returns the cached buffer for the named preset.
    pub fn buffer(&self, name: &str) -> Option<Arc<AudioBuffer>> {
        self.buffers.get(name).cloned()
    }

    pub fn preset(&self, name: &str) -> Option<&VoicePreset> {
        self.presets.iter().find(|p| p.name() == name)
    }

    pub fn presets(&self) -> &[VoicePreset] {
        &self.presets
    }

    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }

    /// Returns the total bytes held by cached buffers.
    pub fn memory_usage(&self) -> usize {
        self.buffers.values().map(|b| b.byte_len()).sum()
    }
}

impl std::fmt::Debug for SoundLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundLibrary")
            .field("presets", &self.presets.len())
            .field("base_frequency", &self.base_frequency)
            .field("memory_kb", &(self.memory_usage() / 1024))
            .finish()
    }
}
