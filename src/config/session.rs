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

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use serde::Deserialize;

use super::error::ConfigError;
use crate::capture::CaptureSettings;
use crate::library::DEFAULT_BASE_FREQUENCY;
use crate::samples::{SampleId, PAD_COUNT};
use crate::sequencer::{DEFAULT_TEMPO, STEP_COUNT};
use crate::voices::KeyboardVoice;

/// A file assigned to a pad.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PadFile {
    pub pad: usize,
    pub file: PathBuf,
}

/// One armed step of the pattern.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StepConfig {
    pub index: usize,
    /// A sample id such as `keyboard` or `pad_3`.
    pub sample: String,
    #[serde(default)]
    pub transpose: i32,
}

impl StepConfig {
    pub fn sample_id(&self) -> Result<SampleId, ConfigError> {
        self.sample.parse().map_err(|e| {
            ConfigError::Invalid(format!("step {}: {}", self.index, e))
        })
    }
}

/// The configuration for a session.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Session {
    /// Beats per minute; clamped to the supported range when applied.
    #[serde(default = "default_tempo")]
    tempo: u32,
    /// Keyboard voice. Left unset, a keyboard recording selects the custom voice and
    /// piano is used otherwise.
    voice: Option<KeyboardVoice>,
    /// Root frequency of the generated keyboard voices, in Hz.
    #[serde(default = "default_base_frequency")]
    base_frequency: f64,
    keyboard_recording: Option<PathBuf>,
    #[serde(default)]
    pad_recordings: Vec<PadFile>,
    /// Bundled files played by pads that have no recording.
    #[serde(default)]
    pad_assets: Vec<PadFile>,
    #[serde(default = "default_recordings_dir")]
    recordings_dir: PathBuf,
    #[serde(default)]
    capture: CaptureSettings,
    #[serde(default)]
    steps: Vec<StepConfig>,
}

fn default_tempo() -> u32 {
    DEFAULT_TEMPO
}

fn default_base_frequency() -> f64 {
    DEFAULT_BASE_FREQUENCY
}

fn default_recordings_dir() -> PathBuf {
    PathBuf::from("recordings")
}

impl Session {
    /// Parse a session from a YAML file. Relative paths in the session are taken
    /// relative to the file's directory.
    pub fn deserialize(path: &Path) -> Result<Session, ConfigError> {
        let session = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Session>()?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        session.validated()?.relative_to(base)
    }

    /// Parse a session from YAML text. Relative paths are left as they are.
    pub fn from_yaml(yaml: &str) -> Result<Session, ConfigError> {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Session>()?
            .validated()
    }

    fn validated(self) -> Result<Session, ConfigError> {
        if !(self.base_frequency.is_finite() && self.base_frequency > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "base_frequency must be positive, got {}",
                self.base_frequency
            )));
        }

        for pad in self.pad_recordings.iter().chain(self.pad_assets.iter()) {
            if pad.pad >= PAD_COUNT {
                return Err(ConfigError::Invalid(format!(
                    "pad {} is out of range 0..{}",
                    pad.pad, PAD_COUNT
                )));
            }
        }

        let mut seen = HashSet::new();
        for step in self.steps.iter() {
            if step.index >= STEP_COUNT {
                return Err(ConfigError::Invalid(format!(
                    "step {} is out of range 0..{}",
                    step.index, STEP_COUNT
                )));
            }
            if !seen.insert(step.index) {
                return Err(ConfigError::Invalid(format!(
                    "step {} is defined more than once",
                    step.index
                )));
            }
            step.sample_id()?;
        }

        Ok(self)
    }

    fn relative_to(mut self, base: &Path) -> Result<Session, ConfigError> {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        if let Some(path) = self.keyboard_recording.as_mut() {
            resolve(path);
        }
        self.pad_recordings
            .iter_mut()
            .chain(self.pad_assets.iter_mut())
            .for_each(|pad| resolve(&mut pad.file));
        resolve(&mut self.recordings_dir);
        Ok(self)
    }

    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    pub fn voice(&self) -> Option<KeyboardVoice> {
        self.voice
    }

    pub fn base_frequency(&self) -> f64 {
        self.base_frequency
    }

    pub fn keyboard_recording(&self) -> Option<&Path> {
        self.keyboard_recording.as_deref()
    }

    pub fn pad_recordings(&self) -> &[PadFile] {
        &self.pad_recordings
    }

    pub fn pad_assets(&self) -> &[PadFile] {
        &self.pad_assets
    }

    pub fn recordings_dir(&self) -> &Path {
        &self.recordings_dir
    }

    pub fn capture(&self) -> &CaptureSettings {
        &self.capture
    }

    pub fn steps(&self) -> &[StepConfig] {
        &self.steps
    }
}
