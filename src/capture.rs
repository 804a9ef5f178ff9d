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

//! Microphone capture and filing of the results.
//!
//! The platform recorder sits behind `CaptureService`. A `Recorder` drives it for one
//! target at a time and hands finished recordings to the `VoiceManager`, which makes
//! them resolvable for the keyboard or the pad they were recorded for.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tracing::{info, span, warn, Level, Span};

use crate::samples::{Recording, SampleId};
use crate::voices::VoiceManager;
use crate::{Error, Result, SAMPLE_RATE};

pub mod mock;

/// Encoding of captured audio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Aac,
    Wav,
}

impl Codec {
    /// File extension for captures in this codec.
    pub fn extension(self) -> &'static str {
        match self {
            Codec::Aac => "m4a",
            Codec::Wav => "wav",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub codec: Codec,
    pub sample_rate: u32,
    /// Bits per second. Ignored for uncompressed codecs.
    pub bit_rate: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings {
            codec: Codec::Aac,
            sample_rate: SAMPLE_RATE,
            bit_rate: 128_000,
        }
    }
}

/// Records from the microphone to a file.
pub trait CaptureService: Send + Sync {
    fn has_permission(&self) -> bool;

    /// Begins capturing to the given path.
    fn start(&self, path: &Path, settings: &CaptureSettings) -> Result<()>;

    /// Ends the capture, returning the file written, if any.
    fn stop(&self) -> Option<PathBuf>;
}

/// Captures recordings for the keyboard or a pad, one at a time.
pub struct Recorder {
    capture: Arc<dyn CaptureService>,
    voices: Arc<VoiceManager>,
    directory: PathBuf,
    settings: CaptureSettings,
    active: Option<SampleId>,
    span: Span,
}

impl Recorder {
    /// Creates a recorder writing into the given directory with the default settings.
    pub fn new(
        capture: Arc<dyn CaptureService>,
        voices: Arc<VoiceManager>,
        directory: impl Into<PathBuf>,
    ) -> Recorder {
        Recorder {
            capture,
            voices,
            directory: directory.into(),
            settings: CaptureSettings::default(),
            active: None,
            span: span!(Level::INFO, "recorder"),
        }
    }

    pub fn with_settings(mut self, settings: CaptureSettings) -> Recorder {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// The sample currently being recorded.
    pub fn target(&self) -> Option<SampleId> {
        self.active
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Starts recording for the target and returns the file being written.
    pub fn begin(&mut self, target: SampleId) -> Result<PathBuf> {
        let _enter = self.span.enter();

        if !self.capture.has_permission() {
            warn!(%target, "No microphone permission.");
            return Err(Error::PermissionDenied);
        }
        if let Some(active) = self.active {
            return Err(Error::Capture(format!(
                "already recording {}, cannot record {}",
                active, target
            )));
        }
        target.validate()?;

        let path = self.directory.join(capture_file_name(
            target,
            SystemTime::now(),
            self.settings.codec,
        ));
        self.capture.start(&path, &self.settings)?;
        self.active = Some(target);
        info!(%target, path = %path.display(), "Recording started.");
        Ok(path)
    }

    /// Stops recording and files the result with the voice manager. Returns None if
    /// nothing was being recorded or nothing was captured.
    pub fn finish(&mut self) -> Result<Option<Recording>> {
        let _enter = self.span.enter();

        let Some(target) = self.active.take() else {
            return Ok(None);
        };
        let Some(path) = self.capture.stop() else {
            warn!(%target, "Capture produced no file.");
            return Ok(None);
        };

        let recording = Recording::new(path);
        match target {
            SampleId::Keyboard => self.voices.set_keyboard_recording(Some(recording.clone())),
            SampleId::Pad(index) => self
                .voices
                .set_pad_recording(usize::from(index), Some(recording.clone()))?,
        }
        info!(%target, path = %recording.path().display(), "Recording filed.");
        Ok(Some(recording))
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(target) = self.active.take() {
            warn!(%target, "Recorder dropped mid-capture, discarding.");
            self.capture.stop();
        }
    }
}

impl fmt::Debug for Recorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorder")
            .field("directory", &self.directory)
            .field("settings", &self.settings)
            .field("active", &self.active)
            .finish()
    }
}

/// `<target>-<unix millis>.<ext>`
fn capture_file_name(target: SampleId, at: SystemTime, codec: Codec) -> String {
    let millis = at
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{}-{}.{}", target, millis, codec.extension())
}
