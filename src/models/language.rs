// src/models/language.rs
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::errors::PortalError;

static PLAIN_ENGLISH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[a-zA-Z0-9 .,!?;:'"()-]*$"#).expect("plain English pattern is valid"));

/// Languages the portal publishes content in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(alias = "english")]
    En,
    #[serde(alias = "tamil")]
    Ta,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ta => "ta",
        }
    }

    /// Classifies text as English when it only uses plain Latin letters,
    /// digits and basic punctuation; anything else is treated as Tamil.
    pub fn detect(text: &str) -> Language {
        if PLAIN_ENGLISH.is_match(text) {
            Language::En
        } else {
            Language::Ta
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ta" | "tamil" => Ok(Language::Ta),
            other => Err(PortalError::invalid_input(format!("Unsupported language: {}", other))),
        }
    }
}
