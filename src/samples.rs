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

//! Sample identifiers and their resolution to playable sources.
//!
//! This module provides:
//! - The `keyboard` / `pad_<n>` identifier grammar
//! - The tagged sample source (asset, recording, or generated buffer)
//! - The registry that resolves ids against the library and voice state

mod id;
mod registry;
mod source;

pub use id::{SampleId, PAD_COUNT};
pub use registry::SampleRegistry;
pub use source::{Recording, SampleSource};
