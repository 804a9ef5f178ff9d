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

//! Voice presets for additive synthesis.

use crate::{Error, Result};

/// Name of the built-in acoustic piano preset.
pub const PIANO: &str = "piano";

/// Name of the built-in electric piano preset.
pub const ELECTRIC: &str = "electric";

/// One sine component of a voice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PartialSpec {
    /// Ratio to the fundamental frequency.
    frequency_multiplier: f64,
    /// Peak amplitude, 0.0 to 1.0.
    amplitude: f64,
    /// Time constant of the exponential decay, in seconds.
    decay_seconds: f64,
}

impl PartialSpec {
    /// Creates a new partial, validating its ranges.
    pub fn new(frequency_multiplier: f64, amplitude: f64, decay_seconds: f64) -> Result<Self> {
        if !(frequency_multiplier.is_finite() && frequency_multiplier >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "frequency multiplier must be non-negative, got {}",
                frequency_multiplier
            )));
        }
        if !(0.0..=1.0).contains(&amplitude) {
            return Err(Error::InvalidArgument(format!(
                "partial amplitude must be within [0, 1], got {}",
                amplitude
            )));
        }
        if !(decay_seconds.is_finite() && decay_seconds > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "partial decay must be positive, got {}",
                decay_seconds
            )));
        }
        Ok(Self {
            frequency_multiplier,
            amplitude,
            decay_seconds,
        })
    }

    pub fn frequency_multiplier(&self) -> f64 {
        self.frequency_multiplier
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn decay_seconds(&self) -> f64 {
        self.decay_seconds
    }
}

/// A named instrument voice: its length, output gain, and ordered partials.
#[derive(Clone, Debug, PartialEq)]
pub struct VoicePreset {
    name: String,
    duration_seconds: f64,
    overall_gain: f64,
    partials: Vec<PartialSpec>,
}

impl VoicePreset {
    /// Creates a new preset, validating its ranges.
    pub fn new(
        name: &str,
        duration_seconds: f64,
        overall_gain: f64,
        partials: Vec<PartialSpec>,
    ) -> Result<Self> {
        if !(duration_seconds.is_finite() && duration_seconds > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "preset {} must have a positive duration, got {}",
                name, duration_seconds
            )));
        }
        if !(0.0..=1.0).contains(&overall_gain) {
            return Err(Error::InvalidArgument(format!(
                "preset {} gain must be within [0, 1], got {}",
                name, overall_gain
            )));
        }
        Ok(Self {
            name: name.to_string(),
            duration_seconds,
            overall_gain,
            partials,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn overall_gain(&self) -> f64 {
        self.overall_gain
    }

    pub fn partials(&self) -> &[PartialSpec] {
        &self.partials
    }
}

/// Shorthand for the built-in tables, which are known to be in range.
const fn partial(frequency_multiplier: f64, amplitude: f64, decay_seconds: f64) -> PartialSpec {
    PartialSpec {
        frequency_multiplier,
        amplitude,
        decay_seconds,
    }
}

/// Harmonic series with faster decay on the upper partials.
const PIANO_PARTIALS: [PartialSpec; 6] = [
    partial(1.0, 1.0, 0.9),
    partial(2.0, 0.5, 0.55),
    partial(3.0, 0.25, 0.35),
    partial(4.0, 0.12, 0.25),
    partial(5.0, 0.06, 0.18),
    partial(6.0, 0.03, 0.12),
];

/// Bell-like tine: a strong fundamental, a bright inharmonic strike, and a sub octave.
const ELECTRIC_PARTIALS: [PartialSpec; 5] = [
    partial(1.0, 1.0, 1.2),
    partial(0.5, 0.2, 1.5),
    partial(2.0, 0.35, 0.6),
    partial(3.0, 0.15, 0.3),
    partial(7.02, 0.08, 0.05),
];

/// Returns the built-in presets, piano first.
pub fn builtin_presets() -> Vec<VoicePreset> {
    vec![
        VoicePreset {
            name: PIANO.to_string(),
            duration_seconds: 1.5,
            overall_gain: 0.6,
            partials: PIANO_PARTIALS.to_vec(),
        },
        VoicePreset {
            name: ELECTRIC.to_string(),
            duration_seconds: 1.2,
            overall_gain: 0.55,
            partials: ELECTRIC_PARTIALS.to_vec(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_are_valid() {
        let presets = builtin_presets();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets[0].name(), PIANO);
        assert_eq!(presets[1].name(), ELECTRIC);

        for preset in presets {
            // Rebuilding through the validating constructors must succeed.
            let partials = preset
                .partials()
                .iter()
                .map(|p| PartialSpec::new(p.frequency_multiplier(), p.amplitude(), p.decay_seconds()))
                .collect::<Result<Vec<_>>>()
                .unwrap();
            let rebuilt = VoicePreset::new(
                preset.name(),
                preset.duration_seconds(),
                preset.overall_gain(),
                partials,
            )
            .unwrap();
            assert_eq!(rebuilt, preset);
        }
    }

    #[test]
    fn test_partial_validation() {
        assert!(PartialSpec::new(0.0, 0.0, 0.1).is_ok());
        assert!(PartialSpec::new(-1.0, 0.5, 0.1).is_err());
        assert!(PartialSpec::new(1.0, 1.5, 0.1).is_err());
        assert!(PartialSpec::new(1.0, -0.1, 0.1).is_err());
        assert!(PartialSpec::new(1.0, 0.5, 0.0).is_err());
        assert!(PartialSpec::new(f64::INFINITY, 0.5, 0.1).is_err());
    }

    #[test]
    fn test_preset_validation() {
        assert!(VoicePreset::new("ok", 0.5, 0.0, Vec::new()).is_ok());
        assert!(VoicePreset::new("zero", 0.0, 0.5, Vec::new()).is_err());
        assert!(VoicePreset::new("negative", -1.0, 0.5, Vec::new()).is_err());
        assert!(VoicePreset::new("hot", 0.5, 1.1, Vec::new()).is_err());
    }
}
