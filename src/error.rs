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

/// Errors surfaced by the synthesis and sequencing core. None of them are fatal; callers
/// report them and skip the requested action.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A sample id could not be resolved to a playable source.
    #[error("sample unavailable: {0}")]
    Unavailable(String),

    /// The request was rejected at the boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The capture service has no microphone permission.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// Playback was requested while every step is empty.
    #[error("nothing to play: every step is empty")]
    EmptySequence,

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("playback failed: {0}")]
    Dispatch(String),

    /// The sequencer transport task is no longer running.
    #[error("sequencer transport has shut down")]
    Shutdown,

    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
