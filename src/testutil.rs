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

//! Shared fixtures for unit tests.

use std::sync::{Arc, OnceLock};

use tempfile::TempDir;

use crate::library::{SoundLibrary, DEFAULT_BASE_FREQUENCY};
use crate::playback::mock;
use crate::samples::{Recording, SampleRegistry};
use crate::voices::VoiceManager;

/// Returns a library of the built-in presets, synthesized once per test binary.
pub fn shared_library() -> Arc<SoundLibrary> {
    static LIBRARY: OnceLock<Arc<SoundLibrary>> = OnceLock::new();
    LIBRARY
        .get_or_init(|| {
            Arc::new(
                SoundLibrary::with_builtin_presets(DEFAULT_BASE_FREQUENCY)
                    .expect("built-in presets must synthesize"),
            )
        })
        .clone()
}

/// Creates an empty file in the directory and returns it as a recording.
pub fn recording_file(dir: &TempDir, name: &str) -> Recording {
    let path = dir.path().join(name);
    std::fs::write(&path, b"").expect("unable to write recording file");
    Recording::new(path)
}

/// A registry over fresh voice state and the shared library.
pub fn registry() -> Arc<SampleRegistry> {
    Arc::new(SampleRegistry::new(
        shared_library(),
        Arc::new(VoiceManager::new()),
    ))
}

/// A mock dispatcher whose voices only end when stopped or finished by the test.
pub fn manual_dispatcher() -> Arc<mock::Dispatcher> {
    Arc::new(mock::Dispatcher::new("test"))
}
