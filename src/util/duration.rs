// Copyright 2023 Greptime Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Duration helpers for time-unit suggestions. A suggestion only ever
//! extends the number under the cursor with a single unit, so all that is
//! needed here is sizing one `<count><unit>` pair and rendering the result
//! the way Prometheus prints durations.

use std::fmt::Write;
use std::time::Duration;

// largest first; rendering peels units off in this order. A year is always
// 365d, a week 7d, a day 24h.
const UNITS: [(&str, u64); 7] = [
    ("y", 1000 * 60 * 60 * 24 * 365),
    ("w", 1000 * 60 * 60 * 24 * 7),
    ("d", 1000 * 60 * 60 * 24),
    ("h", 1000 * 60 * 60),
    ("m", 1000 * 60),
    ("s", 1000),
    ("ms", 1),
];

fn unit_millis(unit: &str) -> Option<u64> {
    UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, millis)| *millis)
}

/// The span of a single `<count><unit>` duration such as `90m`. `None` for
/// an unknown unit or an overflowing count.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use promql_completer::util;
///
/// let d = util::unit_duration(90, "m").unwrap();
/// assert_eq!(d, Duration::from_secs(90 * 60));
/// assert_eq!(util::display_duration(&d), "1h30m");
/// ```
pub fn unit_duration(count: u64, unit: &str) -> Option<Duration> {
    unit_millis(unit)
        .and_then(|millis| millis.checked_mul(count))
        .map(Duration::from_millis)
}

/// Render a duration the way Prometheus does: largest units first, years
/// and weeks only when they divide evenly, as 90d reads better than 12w6d.
pub fn display_duration(duration: &Duration) -> String {
    let mut ms = duration.as_millis();
    if ms == 0 {
        return "0s".into();
    }
    let mut out = String::new();
    for (unit, size) in UNITS {
        let size = size as u128;
        if matches!(unit, "y" | "w") && ms % size != 0 {
            continue;
        }
        let count = ms / size;
        if count > 0 {
            let _ = write!(out, "{}{}", count, unit);
            ms -= count * size;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_duration() {
        let cases = vec![
            (5, "s", Duration::from_secs(5)),
            (90, "m", Duration::from_secs(90 * 60)),
            (36, "h", Duration::from_secs(36 * 60 * 60)),
            (2, "w", Duration::from_secs(2 * 7 * 24 * 60 * 60)),
            (250, "ms", Duration::from_millis(250)),
        ];
        for (count, unit, expect) in cases {
            assert_eq!(
                unit_duration(count, unit),
                Some(expect),
                "{}{} failed",
                count,
                unit
            );
        }

        assert_eq!(unit_duration(0, "h"), Some(Duration::ZERO));
        assert_eq!(unit_duration(3, "q"), None);
        assert_eq!(unit_duration(u64::MAX, "y"), None);
    }

    #[test]
    fn test_display_duration() {
        let cases = vec![
            (Duration::ZERO, "0s"),
            (Duration::from_millis(324), "324ms"),
            (Duration::from_secs(5400), "1h30m"),
            (unit_duration(90, "m").unwrap(), "1h30m"),
            (unit_duration(14, "d").unwrap(), "2w"),
            // three weeks plus 49 hours does not fold into weeks
            (unit_duration(23, "d").unwrap() + unit_duration(1, "h").unwrap(), "23d1h"),
            (unit_duration(90, "d").unwrap(), "90d"),
            (unit_duration(10, "y").unwrap(), "10y"),
            (unit_duration(3, "s").unwrap() + Duration::from_millis(7), "3s7ms"),
        ];
        for (duration, expect) in cases {
            assert_eq!(display_duration(&duration), expect);
        }
    }
}
