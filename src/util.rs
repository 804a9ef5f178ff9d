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

use std::path::Path;
use std::time::Duration;

/// Extracts a displayable file name from a path, returning a fallback if the name is unreadable.
pub fn filename_display(path: &Path) -> &str {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unreadable file name")
}

/// Outputs the given duration as seconds with millisecond precision.
pub fn duration_seconds_millis(duration: Duration) -> String {
    format!("{}.{:03}s", duration.as_secs(), duration.subsec_millis())
}

#[cfg(test)]
mod test {
    use std::path::Path;
    use std::time::Duration;

    use crate::util::{duration_seconds_millis, filename_display};

    #[test]
    fn test_duration_seconds_millis() {
        assert_eq!("0.000s", duration_seconds_millis(Duration::ZERO));
        assert_eq!("0.125s", duration_seconds_millis(Duration::from_millis(125)));
        assert_eq!("1.500s", duration_seconds_millis(Duration::from_millis(1500)));
        assert_eq!("62.005s", duration_seconds_millis(Duration::from_millis(62_005)));
    }

    #[test]
    fn test_filename_display() {
        assert_eq!("pad_3.m4a", filename_display(Path::new("/tmp/takes/pad_3.m4a")));
        assert_eq!("unreadable file name", filename_display(Path::new("/")));
    }
}
