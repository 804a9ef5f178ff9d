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

//! Instrument synthesis and step sequencing for a keyboard and drum-pad toolkit.
//!
//! This crate provides:
//! - Additive synthesis of keyboard voices into WAV buffers
//! - A sample registry resolving keyboard and pad ids to playable sources
//! - Voice selection and pad recording state with change notification
//! - A 16-step sequencer driven by an async transport

pub mod capture;
pub mod config;
pub mod error;
pub mod library;
pub mod performer;
pub mod playback;
pub mod samples;
pub mod sequencer;
pub mod studio;
pub mod synth;
pub mod util;
pub mod voices;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};

/// Sample rate of every generated buffer, in Hz.
pub const SAMPLE_RATE: u32 = 44100;
