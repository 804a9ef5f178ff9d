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

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::synth::AudioBuffer;

/// A microphone recording stored on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recording {
    path: PathBuf,
    recorded_at: SystemTime,
}

impl Recording {
    /// Creates a recording stamped with the current time.
    pub fn new(path: impl Into<PathBuf>) -> Recording {
        Recording::recorded_at(path, SystemTime::now())
    }

    pub fn recorded_at(path: impl Into<PathBuf>, recorded_at: SystemTime) -> Recording {
        Recording {
            path: path.into(),
            recorded_at,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timestamp(&self) -> SystemTime {
        self.recorded_at
    }

    /// Returns true if the file is still present on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Where the audio for a sample comes from. Exactly one kind is ever populated.
#[derive(Clone, Debug, PartialEq)]
pub enum SampleSource {
    /// A bundled audio file.
    Asset(PathBuf),
    /// A file captured from the microphone.
    Recording(Recording),
    /// A buffer synthesized by the sound library.
    Generated(Arc<AudioBuffer>),
}

impl SampleSource {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SampleSource::Asset(_) => "asset",
            SampleSource::Recording(_) => "recording",
            SampleSource::Generated(_) => "generated",
        }
    }

    /// Returns the file backing this source, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            SampleSource::Asset(path) => Some(path),
            SampleSource::Recording(recording) => Some(recording.path()),
            SampleSource::Generated(_) => None,
        }
    }

    /// Length at the native rate, when it is known without decoding a file.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            SampleSource::Generated(buffer) => Some(buffer.duration()),
            _ => None,
        }
    }
}
