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

use std::fmt;

use crate::samples::SampleId;
use crate::{Error, Result};

/// Steps in one loop.
pub const STEP_COUNT: usize = 16;

pub const MIN_TRANSPOSE: i32 = -12;
pub const MAX_TRANSPOSE: i32 = 12;

/// One armed step: the sample to trigger and its pitch offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceStep {
    sample_id: SampleId,
    transpose: i8,
}

impl SequenceStep {
    /// Creates a step. The transpose is clamped to an octave either way; pads outside
    /// the bank are rejected.
    pub fn new(sample_id: SampleId, transpose: i32) -> Result<SequenceStep> {
        Ok(SequenceStep {
            sample_id: sample_id.validate()?,
            transpose: transpose.clamp(MIN_TRANSPOSE, MAX_TRANSPOSE) as i8,
        })
    }

    pub fn sample_id(&self) -> SampleId {
        self.sample_id
    }

    /// Pitch offset in semitones.
    pub fn transpose(&self) -> i32 {
        i32::from(self.transpose)
    }
}

impl fmt::Display for SequenceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+}", self.sample_id, self.transpose)
    }
}

/// Validates a step index.
pub(super) fn check_index(index: usize) -> Result<()> {
    if index < STEP_COUNT {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "step index {} is outside 0..{}",
            index, STEP_COUNT
        )))
    }
}

/// The fixed loop of optional steps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepGrid {
    steps: [Option<SequenceStep>; STEP_COUNT],
}

impl StepGrid {
    pub fn new() -> StepGrid {
        StepGrid::default()
    }

    pub fn get(&self, index: usize) -> Result<Option<SequenceStep>> {
        check_index(index)?;
        Ok(self.steps[index])
    }

    /// Overwrites a step, returning what was there before.
    pub fn set(&mut self, index: usize, step: Option<SequenceStep>) -> Result<Option<SequenceStep>> {
        check_index(index)?;
        Ok(std::mem::replace(&mut self.steps[index], step))
    }

    pub fn clear(&mut self) {
        self.steps = [None; STEP_COUNT];
    }

    pub fn is_empty(&self) -> bool {
        self.steps.iter().all(Option::is_none)
    }

    pub fn occupied_count(&self) -> usize {
        self.steps.iter().filter(|step| step.is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<SequenceStep>)> + '_ {
        self.steps.iter().copied().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose_clamped() {
        assert_eq!(SequenceStep::new(SampleId::Keyboard, 30).unwrap().transpose(), 12);
        assert_eq!(SequenceStep::new(SampleId::Keyboard, -13).unwrap().transpose(), -12);
        assert_eq!(SequenceStep::new(SampleId::Keyboard, 5).unwrap().transpose(), 5);
    }

    #[test]
    fn test_pad_outside_bank_rejected() {
        assert!(matches!(
            SequenceStep::new(SampleId::Pad(9), 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            SequenceStep::new(SampleId::Pad(42), 3),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(
            SequenceStep::new(SampleId::Pad(8), 0).unwrap().sample_id(),
            SampleId::Pad(8)
        );
    }

    #[test]
    fn test_display() {
        let step = SequenceStep::new(SampleId::Pad(2), -3).unwrap();
        assert_eq!(step.to_string(), "pad_2 -3");
        assert_eq!(SequenceStep::new(SampleId::Keyboard, 0).unwrap().to_string(), "keyboard +0");
    }

    #[test]
    fn test_set_and_clear() {
        let mut grid = StepGrid::new();
        assert!(grid.is_empty());

        let step = SequenceStep::new(SampleId::Pad(0), 0).unwrap();
        assert_eq!(grid.set(4, Some(step)).unwrap(), None);
        assert_eq!(grid.get(4).unwrap(), Some(step));
        assert_eq!(grid.occupied_count(), 1);
        assert!(!grid.is_empty());

        assert_eq!(grid.set(4, None).unwrap(), Some(step));
        assert!(grid.is_empty());

        grid.set(0, Some(step)).unwrap();
        grid.set(15, Some(step)).unwrap();
        grid.clear();
        assert!(grid.is_empty());
    }

    #[test]
    fn test_index_out_of_range() {
        let mut grid = StepGrid::new();
        assert!(matches!(grid.get(16), Err(Error::InvalidArgument(_))));
        assert!(matches!(
            grid.set(16, Some(SequenceStep::new(SampleId::Keyboard, 0).unwrap())),
            Err(Error::InvalidArgument(_))
        ));
    }
}
