use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LocaleError {
    #[error("unsupported language tag: {0}")]
    Unsupported(String),
}

/// Interface languages the catalog is localized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
    Uz,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Ru, Locale::Uz];

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
            Locale::Uz => "uz",
        }
    }

    /// Resolves a language tag, falling back to English for anything unknown.
    #[must_use]
    pub fn from_tag_or_default(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    /// Accepts bare and region-qualified tags (`ru`, `ru-RU`, `uz_UZ`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primary = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Ok(Locale::En),
            "ru" => Ok(Locale::Ru),
            "uz" => Ok(Locale::Uz),
            _ => Err(LocaleError::Unsupported(s.to_string())),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_region_qualified_tags() {
        assert_eq!("ru-RU".parse::<Locale>().unwrap(), Locale::Ru);
        assert_eq!("uz_UZ".parse::<Locale>().unwrap(), Locale::Uz);
        assert_eq!(" EN ".parse::<Locale>().unwrap(), Locale::En);
    }

    #[test]
    fn unknown_tags_fall_back_to_english() {
        assert!("de".parse::<Locale>().is_err());
        assert_eq!(Locale::from_tag_or_default("de"), Locale::En);
    }
}
