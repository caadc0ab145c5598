use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Ru,
    El,
}

pub const LOCALES: [Locale; 3] = [Locale::En, Locale::Ru, Locale::El];

pub const DEFAULT_LOCALE: Locale = Locale::En;

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
            Locale::El => "el",
        }
    }

    pub fn is_locale(value: &str) -> bool {
        value.parse::<Locale>().is_ok()
    }
}

impl Default for Locale {
    fn default() -> Self {
        DEFAULT_LOCALE
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Locale::En),
            "ru" => Ok(Locale::Ru),
            "el" => Ok(Locale::El),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

fn locale_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/(en|ru|el)(/|$)").expect("static locale regex"))
}

/// Reads the locale from a path like `/ru/admin`; anything else is the default locale.
pub fn locale_from_pathname(pathname: &str) -> Locale {
    locale_prefix()
        .captures(pathname)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(DEFAULT_LOCALE)
}

/// Replaces the leading locale segment, or prefixes one when the path has none.
pub fn swap_locale_in_pathname(pathname: &str, next: Locale) -> String {
    match locale_prefix().captures(pathname) {
        Some(caps) => {
            let rest = &pathname[caps[1].len() + 1..];
            format!("/{}{}", next, rest)
        }
        None if pathname.starts_with('/') => format!("/{}{}", next, pathname),
        None => format!("/{}/{}", next, pathname),
    }
}
