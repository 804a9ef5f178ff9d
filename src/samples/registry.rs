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

//! Resolves sample ids to playable sources.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use super::id::{SampleId, PAD_COUNT};
use super::source::SampleSource;
use crate::library::SoundLibrary;
use crate::voices::{KeyboardVoice, VoiceManager};
use crate::{Error, Result};

/// Looks up keyboard and pad sources from the library and the current voice state.
pub struct SampleRegistry {
    library: Arc<SoundLibrary>,
    voices: Arc<VoiceManager>,
    /// Bundled files used by pads that have no usable recording.
    pad_assets: [Option<PathBuf>; PAD_COUNT],
}

impl SampleRegistry {
    /// Creates a registry with no bundled pad assets.
    pub fn new(library: Arc<SoundLibrary>, voices: Arc<VoiceManager>) -> SampleRegistry {
        SampleRegistry {
            library,
            voices,
            pad_assets: Default::default(),
        }
    }

    /// Assigns a bundled file to a pad. Recordings take precedence over assets.
    pub fn set_pad_asset(&mut self, index: usize, path: Option<PathBuf>) -> Result<()> {
        let slot = self.pad_assets.get_mut(index).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "pad index {} is out of range 0..{}",
                index, PAD_COUNT
            ))
        })?;
        *slot = path;
        Ok(())
    }

    pub fn voices(&self) -> &Arc<VoiceManager> {
        &self.voices
    }

    pub fn library(&self) -> &Arc<SoundLibrary> {
        &self.library
    }

    /// Resolves the id to a source, or `Unavailable`.
    pub fn resolve(&self, id: SampleId) -> Result<SampleSource> {
        match id {
            SampleId::Keyboard => self.resolve_keyboard(),
            SampleId::Pad(index) => self.resolve_pad(usize::from(index)),
        }
    }

    /// Resolves a textual id. Malformed ids are `Unavailable`.
    pub fn resolve_str(&self, id: &str) -> Result<SampleSource> {
        let parsed = id.parse::<SampleId>().map_err(|e| {
            debug!(id, error = %e, "Unresolvable sample id");
            unavailable(id)
        })?;
        self.resolve(parsed)
    }

    /// Ids that currently resolve, keyboard first, then pads in ascending order.
    pub fn available_samples(&self) -> Vec<SampleId> {
        SampleId::all()
            .filter(|id| self.resolve(*id).is_ok())
            .collect()
    }

    fn resolve_keyboard(&self) -> Result<SampleSource> {
        let selection = self.voices.selection();
        match selection.voice {
            KeyboardVoice::Custom => selection
                .custom_recording
                .map(SampleSource::Recording)
                .ok_or_else(|| unavailable(SampleId::Keyboard)),
            voice => voice
                .preset_name()
                .and_then(|name| self.library.buffer(name))
                .map(SampleSource::Generated)
                .ok_or_else(|| {
                    warn!(%voice, "Keyboard preset missing from library");
                    unavailable(SampleId::Keyboard)
                }),
        }
    }

    fn resolve_pad(&self, index: usize) -> Result<SampleSource> {
        let id = SampleId::Pad(index as u8);
        if index >= PAD_COUNT {
            return Err(unavailable(id));
        }

        if let Some(recording) = self.voices.pad_recording(index)? {
            if recording.exists() {
                return Ok(SampleSource::Recording(recording));
            }
            warn!(
                pad = index,
                path = ?recording.path(),
                "Pad recording no longer exists on disk"
            );
        }

        match &self.pad_assets[index] {
            Some(asset) if asset.is_file() => Ok(SampleSource::Asset(asset.clone())),
            _ => Err(unavailable(id)),
        }
    }
}

fn unavailable(id: impl std::fmt::Display) -> Error {
    Error::Unavailable(id.to_string())
}

impl std::fmt::Debug for SampleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleRegistry")
            .field("library", &self.library)
            .field("voices", &self.voices)
            .field(
                "pad_assets",
                &self.pad_assets.iter().filter(|a| a.is_some()).count(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::Recording;
    use crate::synth::{ELECTRIC, PIANO};
    use crate::testutil::{recording_file, shared_library};

    fn registry() -> SampleRegistry {
        SampleRegistry::new(shared_library(), Arc::new(VoiceManager::new()))
    }

    #[test]
    fn test_keyboard_presets() {
        let registry = registry();
        let library = registry.library().clone();

        match registry.resolve(SampleId::Keyboard).unwrap() {
            SampleSource::Generated(buffer) => {
                assert!(Arc::ptr_eq(&buffer, &library.buffer(PIANO).unwrap()))
            }
            other => panic!("unexpected source {:?}", other),
        }

        registry.voices().set_voice(KeyboardVoice::Electric);
        match registry.resolve(SampleId::Keyboard).unwrap() {
            SampleSource::Generated(buffer) => {
                assert!(Arc::ptr_eq(&buffer, &library.buffer(ELECTRIC).unwrap()))
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_custom_voice_requires_recording() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();

        registry.voices().set_voice(KeyboardVoice::Custom);
        assert!(matches!(
            registry.resolve(SampleId::Keyboard),
            Err(Error::Unavailable(_))
        ));

        let recording = recording_file(&dir, "keys.m4a");
        registry.voices().set_keyboard_recording(Some(recording.clone()));
        assert_eq!(
            registry.resolve(SampleId::Keyboard).unwrap(),
            SampleSource::Recording(recording)
        );
        assert_eq!(registry.voices().selected_voice(), KeyboardVoice::Custom);
    }

    #[test]
    fn test_pad_recording_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();

        assert!(matches!(
            registry.resolve_str("pad_3"),
            Err(Error::Unavailable(_))
        ));

        let recording = recording_file(&dir, "pad3.m4a");
        registry
            .voices()
            .set_pad_recording(3, Some(recording.clone()))
            .unwrap();
        assert_eq!(
            registry.resolve_str("pad_3").unwrap(),
            SampleSource::Recording(recording.clone())
        );

        // A recording deleted from disk is stale.
        std::fs::remove_file(recording.path()).unwrap();
        assert!(matches!(
            registry.resolve(SampleId::Pad(3)),
            Err(Error::Unavailable(_))
        ));
    }

    #[test]
    fn test_bad_ids_are_unavailable() {
        let registry = registry();
        for id in ["pad_9", "pad_x", "drums", ""] {
            assert!(matches!(
                registry.resolve_str(id),
                Err(Error::Unavailable(_))
            ));
        }
        assert!(matches!(
            registry.resolve(SampleId::Pad(42)),
            Err(Error::Unavailable(_))
        ));
    }

    #[test]
    fn test_pad_assets() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = registry();
        let asset = recording_file(&dir, "kick.wav").path().to_path_buf();

        registry.set_pad_asset(0, Some(asset.clone())).unwrap();
        assert!(registry.set_pad_asset(PAD_COUNT, Some(asset.clone())).is_err());
        assert_eq!(
            registry.resolve(SampleId::Pad(0)).unwrap(),
            SampleSource::Asset(asset)
        );

        // Recordings win over assets.
        let recording = recording_file(&dir, "pad0.m4a");
        registry
            .voices()
            .set_pad_recording(0, Some(recording.clone()))
            .unwrap();
        assert_eq!(
            registry.resolve(SampleId::Pad(0)).unwrap(),
            SampleSource::Recording(recording)
        );
    }

    #[test]
    fn test_available_samples() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();
        assert_eq!(registry.available_samples(), vec![SampleId::Keyboard]);

        registry.voices().set_voice(KeyboardVoice::Custom);
        assert!(registry.available_samples().is_empty());

        registry
            .voices()
            .set_pad_recording(5, Some(recording_file(&dir, "p5.m4a")))
            .unwrap();
        registry
            .voices()
            .set_pad_recording(1, Some(recording_file(&dir, "p1.m4a")))
            .unwrap();
        registry
            .voices()
            .set_pad_recording(7, Some(Recording::new(dir.path().join("missing.m4a"))))
            .unwrap();
        assert_eq!(
            registry.available_samples(),
            vec![SampleId::Pad(1), SampleId::Pad(5)]
        );
    }
}
