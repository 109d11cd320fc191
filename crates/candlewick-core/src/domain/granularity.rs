use std::fmt::{Display, Formatter};

pub const DEFAULT_GRANULARITY_SECONDS: i64 = 900;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_DAY: u64 = 86_400;

/// Time unit understood by the aggregates endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GranularityUnit {
    Second,
    Minute,
    Hour,
    Day,
}

impl GranularityUnit {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    pub const fn seconds(self) -> u64 {
        match self {
            Self::Second => 1,
            Self::Minute => SECONDS_PER_MINUTE,
            Self::Hour => SECONDS_PER_HOUR,
            Self::Day => SECONDS_PER_DAY,
        }
    }
}

impl Display for GranularityUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket width expressed as `multiplier * unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Granularity {
    pub multiplier: u64,
    pub unit: GranularityUnit,
}

impl Granularity {
    /// Map a bucket width in seconds onto the largest unit that divides it
    /// exactly. Widths below one second are clamped to one.
    pub fn from_seconds(seconds: i64) -> Self {
        let seconds = seconds.max(1) as u64;

        let unit = if seconds % SECONDS_PER_DAY == 0 {
            GranularityUnit::Day
        } else if seconds % SECONDS_PER_HOUR == 0 {
            GranularityUnit::Hour
        } else if seconds % SECONDS_PER_MINUTE == 0 {
            GranularityUnit::Minute
        } else {
            GranularityUnit::Second
        };

        Self {
            multiplier: seconds / unit.seconds(),
            unit,
        }
    }

    pub const fn total_seconds(self) -> u64 {
        self.multiplier * self.unit.seconds()
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Self::from_seconds(DEFAULT_GRANULARITY_SECONDS)
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.multiplier, self.unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapped(seconds: i64) -> (u64, GranularityUnit) {
        let granularity = Granularity::from_seconds(seconds);
        (granularity.multiplier, granularity.unit)
    }

    #[test]
    fn prefers_the_largest_exact_unit() {
        assert_eq!(mapped(86_400), (1, GranularityUnit::Day));
        assert_eq!(mapped(172_800), (2, GranularityUnit::Day));
        assert_eq!(mapped(7_200), (2, GranularityUnit::Hour));
        assert_eq!(mapped(900), (15, GranularityUnit::Minute));
        assert_eq!(mapped(60), (1, GranularityUnit::Minute));
    }

    #[test]
    fn inexact_widths_fall_back_to_seconds() {
        assert_eq!(mapped(90), (90, GranularityUnit::Second));
        assert_eq!(mapped(5_400), (90, GranularityUnit::Minute));
        assert_eq!(mapped(1), (1, GranularityUnit::Second));
    }

    #[test]
    fn non_positive_widths_clamp_to_one_second() {
        assert_eq!(mapped(0), (1, GranularityUnit::Second));
        assert_eq!(mapped(-60), (1, GranularityUnit::Second));
    }

    #[test]
    fn mapping_preserves_total_width() {
        for seconds in [1_i64, 45, 60, 90, 600, 3_600, 5_400, 86_400, 90_000, 604_800] {
            assert_eq!(Granularity::from_seconds(seconds).total_seconds(), seconds as u64);
        }
    }

    #[test]
    fn default_is_fifteen_minutes() {
        assert_eq!(Granularity::default().to_string(), "15/minute");
    }
}
