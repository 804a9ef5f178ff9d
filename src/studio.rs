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

//! Assembles the core components from a session.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::capture::{CaptureService, Recorder};
use crate::config::{ConfigError, Session};
use crate::library::SoundLibrary;
use crate::performer::Performer;
use crate::playback::{PlaybackDispatcher, VoiceHandle};
use crate::samples::{Recording, SampleRegistry};
use crate::sequencer::{StepSequencer, Transport};
use crate::voices::VoiceManager;

/// The shared state behind a session: the synthesized library, the voice state and
/// the registry over both.
pub struct Studio {
    session: Session,
    library: Arc<SoundLibrary>,
    voices: Arc<VoiceManager>,
    registry: Arc<SampleRegistry>,
}

impl Studio {
    /// Synthesizes the library and loads the session's recordings and assets.
    pub fn from_session(session: Session) -> Result<Studio, ConfigError> {
        let library = Arc::new(SoundLibrary::with_builtin_presets(
            session.base_frequency(),
        )?);

        let voices = Arc::new(VoiceManager::new());
        if let Some(path) = session.keyboard_recording() {
            voices.set_keyboard_recording(Some(load_recording(path)));
        }
        if let Some(voice) = session.voice() {
            voices.set_voice(voice);
        }
        for pad in session.pad_recordings() {
            voices.set_pad_recording(pad.pad, Some(load_recording(&pad.file)))?;
        }

        let mut registry = SampleRegistry::new(library.clone(), voices.clone());
        for asset in session.pad_assets() {
            registry.set_pad_asset(asset.pad, Some(asset.file.clone()))?;
        }

        let studio = Studio {
            session,
            library,
            voices,
            registry: Arc::new(registry),
        };
        info!(
            voice = %studio.voices.selected_voice(),
            pads = studio.voices.snapshot().pads.recorded_count(),
            available = studio.registry.available_samples().len(),
            "Studio ready."
        );
        Ok(studio)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn library(&self) -> &Arc<SoundLibrary> {
        &self.library
    }

    pub fn voices(&self) -> &Arc<VoiceManager> {
        &self.voices
    }

    pub fn registry(&self) -> &Arc<SampleRegistry> {
        &self.registry
    }

    /// Creates a sequencer loaded with the session's tempo and steps.
    pub fn sequencer(
        &self,
        dispatcher: Arc<dyn PlaybackDispatcher>,
    ) -> Result<(StepSequencer, mpsc::UnboundedReceiver<VoiceHandle>), ConfigError> {
        let (mut sequencer, completions) = StepSequencer::new(self.registry.clone(), dispatcher);
        sequencer.set_tempo(self.session.tempo());
        for step in self.session.steps() {
            sequencer.edit_step(step.index, step.sample_id()?, step.transpose)?;
        }
        Ok((sequencer, completions))
    }

    /// Starts a transport over a sequencer loaded from the session. Must be called
    /// within a tokio runtime.
    pub fn transport(&self, dispatcher: Arc<dyn PlaybackDispatcher>) -> Result<Transport, ConfigError> {
        let (sequencer, completions) = self.sequencer(dispatcher)?;
        Ok(Transport::spawn(sequencer, completions))
    }

    pub fn performer(&self, dispatcher: Arc<dyn PlaybackDispatcher>) -> Performer {
        Performer::new(self.registry.clone(), dispatcher)
    }

    /// Creates a recorder writing into the session's recordings directory.
    pub fn recorder(&self, capture: Arc<dyn CaptureService>) -> Recorder {
        Recorder::new(
            capture,
            self.voices.clone(),
            self.session.recordings_dir(),
        )
        .with_settings(*self.session.capture())
    }
}

/// A recording for an existing file, stamped with its modification time.
fn load_recording(path: &Path) -> Recording {
    let modified = fs::metadata(path).and_then(|metadata| metadata.modified());
    match modified {
        Ok(time) => Recording::recorded_at(path, time),
        Err(e) => {
            warn!(path = %path.display(), err = %e, "Recording is not readable.");
            Recording::recorded_at(path, SystemTime::now())
        }
    }
}
