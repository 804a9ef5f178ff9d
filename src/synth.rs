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

//! Additive synthesis of keyboard voices.
//!
//! Each voice is a sum of sine partials, every partial shaped by its own exponential
//! decay. The last 15% of the buffer is faded linearly to silence so that voices never
//! end on a click.

mod preset;
mod wav;

pub use preset::{builtin_presets, PartialSpec, VoicePreset, ELECTRIC, PIANO};
pub use wav::{AudioBuffer, HEADER_LEN};

use std::f64::consts::TAU;

use crate::{Error, Result, SAMPLE_RATE};

/// Fraction of the voice duration at which the fade-out begins.
const FADE_OUT_START: f64 = 0.85;

/// Synthesizes the given preset at `frequency_hz` into a mono 16-bit WAV buffer.
///
/// The output is fully determined by the inputs. A preset too short to hold a single
/// sample produces a header-only buffer.
pub fn synthesize(frequency_hz: f64, preset: &VoicePreset) -> Result<AudioBuffer> {
    if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
        return Err(Error::InvalidArgument(format!(
            "frequency must be positive, got {}",
            frequency_hz
        )));
    }

    let sample_rate = f64::from(SAMPLE_RATE);
    let duration = preset.duration_seconds();
    let sample_count = (duration * sample_rate).round() as usize;
    let fade_start = duration * FADE_OUT_START;

    let samples: Vec<i16> = (0..sample_count)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let sum: f64 = preset
                .partials()
                .iter()
                .map(|partial| partial_value(partial, frequency_hz, t))
                .sum();
            quantize(sum * fade_factor(t, duration, fade_start) * preset.overall_gain())
        })
        .collect();

    AudioBuffer::from_samples(&samples)
}

/// The decaying sine contribution of one partial at time `t`.
fn partial_value(partial: &PartialSpec, frequency_hz: f64, t: f64) -> f64 {
    let envelope = (-t / partial.decay_seconds()).exp();
    (TAU * frequency_hz * partial.frequency_multiplier() * t).sin()
        * partial.amplitude()
        * envelope
}

/// Linear fade applied after `fade_start`. The fade start itself is not attenuated.
fn fade_factor(t: f64, duration: f64, fade_start: f64) -> f64 {
    if t > fade_start {
        ((duration - t) / (duration - fade_start)).max(0.0)
    } else {
        1.0
    }
}

/// Converts a normalized value to a signed 16-bit sample.
fn quantize(value: f64) -> i16 {
    let scaled = (value.clamp(-1.0, 1.0) * 32767.0).round();
    scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}
