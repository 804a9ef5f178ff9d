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

use std::time::Duration;

pub const MIN_TEMPO: u32 = 60;
pub const MAX_TEMPO: u32 = 160;
pub const DEFAULT_TEMPO: u32 = 120;

/// Sixteenth notes per beat.
const STEPS_PER_BEAT: f64 = 4.0;

/// Length of one step at the given tempo: a sixteenth note, rounded to the millisecond.
pub fn step_duration(bpm: u32) -> Duration {
    let bpm = bpm.clamp(MIN_TEMPO, MAX_TEMPO);
    let millis = (60_000.0 / f64::from(bpm) / STEPS_PER_BEAT).round();
    Duration::from_millis(millis as u64)
}

/// Playback rate for a pitch offset in semitones.
pub fn transpose_rate(semitones: i32) -> f32 {
    (f64::from(semitones) / 12.0).exp2() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_duration() {
        assert_eq!(step_duration(120), Duration::from_millis(125));
        assert_eq!(step_duration(60), Duration::from_millis(250));
        assert_eq!(step_duration(160), Duration::from_millis(94));
        assert_eq!(step_duration(90), Duration::from_millis(167));
    }

    #[test]
    fn test_step_duration_clamps_tempo() {
        assert_eq!(step_duration(10), step_duration(MIN_TEMPO));
        assert_eq!(step_duration(400), step_duration(MAX_TEMPO));
    }

    #[test]
    fn test_transpose_rate() {
        assert_eq!(transpose_rate(12), 2.0);
        assert_eq!(transpose_rate(-12), 0.5);
        assert_eq!(transpose_rate(0), 1.0);
        assert!((transpose_rate(7) - 1.4983).abs() < 1e-4);
    }
}
