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

//! The 16-step sequencer.
//!
//! `StepSequencer` holds the grid, the cursor and the voice slots, and is driven one
//! tick at a time. `Transport` owns a sequencer on a tokio task and supplies the clock,
//! the completion plumbing and a command channel for edits.

mod clock;
mod engine;
mod grid;
mod transport;

pub use clock::{step_duration, transpose_rate, DEFAULT_TEMPO, MAX_TEMPO, MIN_TEMPO};
pub use engine::{PlayState, StepOutcome, StepSequencer, Tick};
pub use grid::{SequenceStep, StepGrid, MAX_TRANSPOSE, MIN_TRANSPOSE, STEP_COUNT};
pub use transport::{SequencerEvent, SequencerSnapshot, Transport};
