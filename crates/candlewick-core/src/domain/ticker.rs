use std::fmt::{Display, Formatter};

use crate::ValidationError;

/// Upstream ticker, passed through verbatim apart from trimming.
///
/// Provider tickers carry prefixes and punctuation (`X:BTCUSD`, `BRK.B`), so
/// case and character set are left alone; URL escaping happens when the
/// upstream path is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTicker);
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Percent-encoded form safe for a single URL path segment.
    pub fn url_escaped(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl Display for Ticker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_but_keeps_case() {
        let parsed = Ticker::parse("  brk.b ").expect("ticker should parse");
        assert_eq!(parsed.as_str(), "brk.b");
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(Ticker::parse("   "), Err(ValidationError::EmptyTicker));
    }

    #[test]
    fn escapes_reserved_characters_for_path_use() {
        let ticker = Ticker::parse("X:BTC/USD").expect("ticker should parse");
        assert_eq!(ticker.url_escaped(), "X%3ABTC%2FUSD");
    }
}
