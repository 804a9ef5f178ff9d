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
use std::str::FromStr;

use crate::{Error, Result};

/// Number of drum pads.
pub const PAD_COUNT: usize = 9;

const KEYBOARD: &str = "keyboard";
const PAD_PREFIX: &str = "pad_";

/// A logical sample: the keyboard voice or one of the drum pads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SampleId {
    Keyboard,
    Pad(u8),
}

impl SampleId {
    /// Returns the id of the given pad, rejecting indices outside the pad bank.
    pub fn pad(index: usize) -> Result<SampleId> {
        if index < PAD_COUNT {
            Ok(SampleId::Pad(index as u8))
        } else {
            Err(Error::InvalidArgument(format!(
                "pad index {} is out of range 0..{}",
                index, PAD_COUNT
            )))
        }
    }

    /// Returns the id unchanged if it names a sample that exists, `InvalidArgument`
    /// for pads outside the bank.
    pub fn validate(self) -> Result<SampleId> {
        match self {
            SampleId::Keyboard => Ok(self),
            SampleId::Pad(index) => SampleId::pad(usize::from(index)),
        }
    }

    /// Every valid id, keyboard first and then pads in ascending order.
    pub fn all() -> impl Iterator<Item = SampleId> {
        std::iter::once(SampleId::Keyboard).chain((0..PAD_COUNT as u8).map(SampleId::Pad))
    }
}

impl FromStr for SampleId {
    type Err = Error;

    fn from_str(s: &str) -> Result<SampleId> {
        if s == KEYBOARD {
            return Ok(SampleId::Keyboard);
        }

        let malformed = || Error::InvalidArgument(format!("malformed sample id '{}'", s));
        let digits = s.strip_prefix(PAD_PREFIX).ok_or_else(malformed)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let index: usize = digits.parse().map_err(|_| malformed())?;
        SampleId::pad(index)
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleId::Keyboard => write!(f, "{}", KEYBOARD),
            SampleId::Pad(index) => write!(f, "{}{}", PAD_PREFIX, index),
        }
    }
}
