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

use parking_lot::Mutex;
use tracing::{info, warn};

use super::{CaptureService, CaptureSettings};
use crate::{Error, Result};

/// A mock capture service. Writes an empty file for each capture instead of recording.
pub struct Capture {
    permission: bool,
    silent: bool,
    current: Mutex<Option<PathBuf>>,
    started: Mutex<Vec<(PathBuf, CaptureSettings)>>,
}

impl Capture {
    /// A capture service with microphone permission.
    pub fn new() -> Capture {
        Capture {
            permission: true,
            silent: false,
            current: Mutex::new(None),
            started: Mutex::new(Vec::new()),
        }
    }

    /// A capture service whose permission was refused.
    pub fn denied() -> Capture {
        Capture {
            permission: false,
            ..Capture::new()
        }
    }

    /// A capture service that never produces a file.
    pub fn silent() -> Capture {
        Capture {
            silent: true,
            ..Capture::new()
        }
    }

    /// Every capture started so far, with its settings.
    pub fn started(&self) -> Vec<(PathBuf, CaptureSettings)> {
        self.started.lock().clone()
    }

    pub fn is_capturing(&self) -> bool {
        self.current.lock().is_some()
    }
}

impl Default for Capture {
    fn default() -> Self {
        Capture::new()
    }
}

impl CaptureService for Capture {
    fn has_permission(&self) -> bool {
        self.permission
    }

    fn start(&self, path: &Path, settings: &CaptureSettings) -> Result<()> {
        let mut current = self.current.lock();
        if let Some(current) = current.as_ref() {
            return Err(Error::Capture(format!(
                "already capturing to {}",
                current.display()
            )));
        }
        info!(path = %path.display(), codec = ?settings.codec, "Capturing (mock).");
        *current = Some(path.to_path_buf());
        self.started.lock().push((path.to_path_buf(), *settings));
        Ok(())
    }

    fn stop(&self) -> Option<PathBuf> {
        let path = self.current.lock().take()?;
        if self.silent {
            return None;
        }
        match std::fs::write(&path, b"") {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(path = %path.display(), err = %e, "Unable to write mock capture.");
                None
            }
        }
    }
}
