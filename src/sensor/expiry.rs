use humantime_serde::re::humantime;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const UNITS: [&str; 5] = ["ms", "s", "m", "h", "d"];

/// How long a reading stays fresh after its timestamp.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Expiry(Duration);

impl Expiry {
    #[cfg(test)]
    pub fn new(duration: Duration) -> Self {
        Expiry(duration)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Parses a single-unit duration like `100ms`, `30s`, `10m`, `12h` or `1d`.
    pub fn parse(value: &str) -> Option<Expiry> {
        let digits = value.chars().take_while(|c| c.is_ascii_digit()).count();
        let (amount, unit) = value.split_at(digits);
        if amount.is_empty() || !UNITS.contains(&unit) {
            return None;
        }

        humantime::parse_duration(value).ok().map(Expiry)
    }
}

impl Display for Expiry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", humantime::format_duration(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("100ms", Duration::from_millis(100))]
    #[case("30s", Duration::from_secs(30))]
    #[case("10m", Duration::from_secs(600))]
    #[case("12h", Duration::from_secs(12 * 3600))]
    #[case("1d", Duration::from_secs(86_400))]
    #[case("0s", Duration::ZERO)]
    fn parses_single_unit_durations(#[case] value: &str, #[case] expected: Duration) {
        assert_eq!(Expiry::parse(value), Some(Expiry::new(expected)));
    }

    #[rstest]
    #[case::empty("")]
    #[case::missing_unit("10")]
    #[case::missing_amount("ms")]
    #[case::compound("1h30m")]
    #[case::unknown_unit("10w")]
    #[case::negative("-5s")]
    #[case::whitespace("10 m")]
    #[case::fraction("1.5h")]
    #[case::long_unit("10min")]
    fn rejects_invalid_durations(#[case] value: &str) {
        assert_eq!(Expiry::parse(value), None);
    }

    #[test]
    fn displays_in_human_readable_form() {
        assert_eq!(Expiry::new(Duration::from_secs(600)).to_string(), "10m");
    }
}
