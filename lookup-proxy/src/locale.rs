//! Wikipedia editions a batch can be looked up against.

use std::fmt;

/// Language edition of Wikipedia that existence and image lookups target.
///
/// Only a fixed set of editions is served. Any other requested code, or no
/// code at all, falls back to English.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Locale {
    #[default]
    English,
    Spanish,
    German,
}

impl Locale {
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("es") => Locale::Spanish,
            Some("de") => Locale::German,
            _ => Locale::English,
        }
    }

    /// Subdomain of the edition, e.g. `es` for `es.wikipedia.org`.
    pub const fn subdomain(&self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::Spanish => "es",
            Locale::German => "de",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subdomain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(Locale::from_code(Some("es")), Locale::Spanish);
        assert_eq!(Locale::from_code(Some("de")), Locale::German);
    }

    #[test]
    fn test_fallback_to_english() {
        assert_eq!(Locale::from_code(None), Locale::English);
        assert_eq!(Locale::from_code(Some("en")), Locale::English);
        assert_eq!(Locale::from_code(Some("fr")), Locale::English);
        assert_eq!(Locale::from_code(Some("ES")), Locale::English);
        assert_eq!(Locale::from_code(Some("")), Locale::English);
    }

    #[test]
    fn test_subdomain() {
        assert_eq!(Locale::English.to_string(), "en");
        assert_eq!(Locale::Spanish.subdomain(), "es");
        assert_eq!(Locale::German.subdomain(), "de");
    }
}
