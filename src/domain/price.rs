use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Serialize, Serializer};

pub const NOT_SPECIFIED: &str = "Not specified";

// The range alternative is folded into the single-amount pattern so that
// "$50-$100" is taken whole rather than stopping at "$50".
static PRICE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\d[\d,]*(?:\.\d{2})?(?:-\$\d[\d,]*(?:\.\d{2})?)?").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Budget {
    Specified(String),
    NotSpecified,
}

impl Budget {
    pub fn as_str(&self) -> &str {
        match self {
            Budget::Specified(price) => price,
            Budget::NotSpecified => NOT_SPECIFIED,
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Budget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Returns the first price in the line verbatim.
pub fn extract_price(line: &str) -> Budget {
    match PRICE_REGEX.find(line) {
        Some(m) => Budget::Specified(m.as_str().to_string()),
        None => Budget::NotSpecified,
    }
}
