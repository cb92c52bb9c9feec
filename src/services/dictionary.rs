// src/services/dictionary.rs
use regex::{NoExpand, Regex, RegexBuilder};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::{
    errors::{PortalError, PortalResult},
    models::language::Language,
};

/// Portal vocabulary, English first. The Tamil to English table is the
/// inverse of this list.
const BUILTIN_PHRASES: &[(&str, &str)] = &[
    ("News", "செய்திகள்"),
    ("Latest News", "சமீபத்திய செய்திகள்"),
    ("Breaking News", "முக்கிய செய்திகள்"),
    ("Events", "நிகழ்வுகள்"),
    ("Upcoming Events", "வரவிருக்கும் நிகழ்வுகள்"),
    ("Videos", "காணொளிகள்"),
    ("Radio", "வானொலி"),
    ("Radio Shows", "வானொலி நிகழ்ச்சிகள்"),
    ("Listen Live", "நேரலையில் கேளுங்கள்"),
    ("Magazines", "இதழ்கள்"),
    ("Business Directory", "வணிக அடைவு"),
    ("Jobs", "வேலைவாய்ப்புகள்"),
    ("Emergency", "அவசரம்"),
    ("Home", "முகப்பு"),
    ("About Us", "எங்களைப் பற்றி"),
    ("Contact Us", "தொடர்பு கொள்ள"),
    ("Read More", "மேலும் படிக்க"),
    ("Watch Now", "இப்போது பார்க்க"),
    ("Search", "தேடல்"),
    ("Community", "சமூகம்"),
    ("Notifications", "அறிவிப்புகள்"),
    ("Announcements", "பொது அறிவிப்புகள்"),
    ("Subscribe", "குழுசேர்"),
    ("Share", "பகிர்"),
    ("Welcome", "வரவேற்கிறோம்"),
    ("Location", "இடம்"),
    ("Date", "தேதி"),
    ("Time", "நேரம்"),
];

/// One entry of an extra phrase file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseEntry {
    pub source_phrase: String,
    pub target_language: Language,
    pub translated_phrase: String,
}

#[derive(Debug, Default)]
struct PhraseTable {
    exact: HashMap<String, String>,
    // Longest phrase first so that "Latest News" wins over "News".
    patterns: Vec<(Regex, String)>,
}

impl PhraseTable {
    fn insert(&mut self, source: &str, translation: &str) -> bool {
        if source.is_empty() || self.exact.contains_key(source) {
            return false;
        }
        self.exact.insert(source.to_string(), translation.to_string());
        true
    }

    fn compile(&mut self) {
        let mut phrases: Vec<(&String, &String)> = self.exact.iter().collect();
        phrases.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()).then_with(|| a.0.cmp(b.0)));

        self.patterns = phrases
            .into_iter()
            .filter_map(|(phrase, translation)| {
                match RegexBuilder::new(&regex::escape(phrase)).case_insensitive(true).build() {
                    Ok(pattern) => Some((pattern, translation.clone())),
                    Err(e) => {
                        tracing::warn!("Skipping phrase {:?}: {}", phrase, e);
                        None
                    }
                }
            })
            .collect();
    }
}

/// Immutable bilingual phrase dictionary, built once at start-up.
#[derive(Debug, Default)]
pub struct PhraseDictionary {
    tables: HashMap<Language, PhraseTable>,
}

impl PhraseDictionary {
    /// Dictionary with the built-in portal vocabulary.
    pub fn builtin() -> Self {
        Self::from_pairs(BUILTIN_PHRASES)
    }

    /// Builds both directions from English/Tamil pairs. Duplicate keys keep
    /// their first translation.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut dictionary = Self::default();
        for (english, tamil) in pairs {
            dictionary.table_mut(Language::Ta).insert(english, tamil);
            dictionary.table_mut(Language::En).insert(tamil, english);
        }
        dictionary.compile_tables();
        dictionary
    }

    /// Adds entries on top of the existing ones. Existing keys are not overwritten.
    pub fn extend(mut self, entries: impl IntoIterator<Item = PhraseEntry>) -> Self {
        let mut added = 0usize;
        for entry in entries {
            let source = entry.source_phrase.trim();
            let translation = entry.translated_phrase.trim();
            if translation.is_empty() {
                continue;
            }
            if self.table_mut(entry.target_language).insert(source, translation) {
                added += 1;
            }
        }
        self.compile_tables();
        tracing::debug!("Added {} phrases to dictionary", added);
        self
    }

    /// Reads a JSON array of phrase entries.
    pub fn load_entries(path: &Path) -> PortalResult<Vec<PhraseEntry>> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PortalError::ConfigurationError(format!("Cannot read phrase file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            PortalError::ConfigurationError(format!("Invalid phrase file {}: {}", path.display(), e))
        })
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(|t| t.exact.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact (case-sensitive) translation of a whole phrase.
    pub fn exact(&self, text: &str, target: Language) -> Option<&str> {
        self.tables.get(&target)?.exact.get(text.trim()).map(String::as_str)
    }

    /// Exact match first, then every known phrase found inside `text`
    /// (ignoring case) is replaced by its translation. `None` when nothing
    /// in the text is known.
    pub fn lookup(&self, text: &str, target: Language) -> Option<String> {
        if let Some(hit) = self.exact(text, target) {
            return Some(hit.to_string());
        }

        let table = self.tables.get(&target)?;
        let mut result = text.to_string();
        let mut substituted = false;
        for (pattern, translation) in &table.patterns {
            if pattern.is_match(&result) {
                result = pattern.replace_all(&result, NoExpand(translation)).into_owned();
                substituted = true;
            }
        }

        substituted.then_some(result)
    }

    fn table_mut(&mut self, language: Language) -> &mut PhraseTable {
        self.tables.entry(language).or_default()
    }

    fn compile_tables(&mut self) {
        for table in self.tables.values_mut() {
            table.compile();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_hit() {
        let dict = PhraseDictionary::builtin();
        assert_eq!(dict.lookup("News", Language::Ta).as_deref(), Some("செய்திகள்"));
        assert_eq!(dict.lookup("செய்திகள்", Language::En).as_deref(), Some("News"));
    }

    #[test]
    fn test_exact_is_case_sensitive_but_substring_is_not() {
        let dict = PhraseDictionary::builtin();
        assert!(dict.exact("news", Language::Ta).is_none());
        // Falls through to the substring scan, which ignores case
        assert_eq!(dict.lookup("news", Language::Ta).as_deref(), Some("செய்திகள்"));
    }

    #[test]
    fn test_substring_replacement() {
        let dict = PhraseDictionary::builtin();
        let result = dict.lookup("Community Events this week", Language::Ta).unwrap();
        assert_eq!(result, "சமூகம் நிகழ்வுகள் this week");
    }

    #[test]
    fn test_longest_phrase_wins() {
        let dict = PhraseDictionary::builtin();
        let result = dict.lookup("See the latest news", Language::Ta).unwrap();
        assert_eq!(result, "See the சமீபத்திய செய்திகள்");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let dict = PhraseDictionary::from_pairs(&[("Radio", "வானொலி")]);
        let result = dict.lookup("RADIO and radio", Language::Ta).unwrap();
        assert_eq!(result, "வானொலி and வானொலி");
    }

    #[test]
    fn test_no_match() {
        let dict = PhraseDictionary::builtin();
        assert!(dict.lookup("Hello World", Language::Ta).is_none());
        assert!(dict.lookup("வணக்கம் உலகம்", Language::En).is_none());
    }

    #[test]
    fn test_every_builtin_phrase_resolves_exactly() {
        let dict = PhraseDictionary::builtin();
        for (english, tamil) in BUILTIN_PHRASES {
            assert_eq!(dict.lookup(english, Language::Ta).as_deref(), Some(*tamil));
            assert_eq!(dict.lookup(tamil, Language::En).as_deref(), Some(*english));
        }
    }

    #[test]
    fn test_extend_keeps_existing_keys() {
        let dict = PhraseDictionary::from_pairs(&[("News", "செய்திகள்")]).extend(vec![
            PhraseEntry {
                source_phrase: "News".into(),
                target_language: Language::Ta,
                translated_phrase: "புதினம்".into(),
            },
            PhraseEntry {
                source_phrase: "Temple".into(),
                target_language: Language::Ta,
                translated_phrase: "கோவில்".into(),
            },
        ]);
        assert_eq!(dict.exact("News", Language::Ta), Some("செய்திகள்"));
        assert_eq!(dict.exact("Temple", Language::Ta), Some("கோவில்"));
        assert_eq!(dict.len(), 3);
    }

    #[test]
    fn test_substitution_ignores_case_beyond_ascii() {
        let dict = PhraseDictionary::from_pairs(&[("äbc", "x")]);
        assert_eq!(dict.lookup("ÄBC äbc", Language::Ta).as_deref(), Some("x x"));
        assert!(dict.lookup("ab", Language::Ta).is_none());
    }

    #[test]
    fn test_phrases_are_matched_literally() {
        let dict = PhraseDictionary::from_pairs(&[("Q&A (live)", "கேள்வி பதில்"), ("Offer", "$1 deal")]);
        assert_eq!(dict.lookup("Join the q&a (LIVE) now", Language::Ta).as_deref(), Some("Join the கேள்வி பதில் now"));
        assert!(dict.lookup("Q&A live", Language::Ta).is_none());
        // Replacement text is inserted verbatim
        assert_eq!(dict.lookup("Special offer", Language::Ta).as_deref(), Some("Special $1 deal"));
    }
}
