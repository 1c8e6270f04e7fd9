//! Suppression of known-noise messages.
//!
//! A [`MessageFilter`] maps record fields (see [`FIELD_NAMES`]) to regular
//! expressions. Patterns are anchored at the start of the field value.
//!
//! Filter configuration files are JSON:
//!
//! ```json
//! {
//!   "warnings": { "package": ["rerunfilecheck"], "component": ["Font"] },
//!   "errors": { "message": ["Dimension too large"] }
//! }
//! ```

use crate::error::{Error, Result};
use crate::record::{FIELD_NAMES, MessageRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

static BUILTIN: Lazy<FilterConfig> = Lazy::new(|| {
    FilterConfig::from_spec(&FilterSpec::builtin()).expect("built-in filter patterns are valid")
});

#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    patterns: BTreeMap<String, Vec<Regex>>,
}

impl MessageFilter {
    /// Creates a filter that ignores nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pattern for `field`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if `pattern` is not a valid regex.
    pub fn add_pattern(&mut self, field: &str, pattern: &str) -> Result<()> {
        if !FIELD_NAMES.contains(&field) {
            log::warn!("filter field `{}` is not a known message field", field);
        }
        let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|source| Error::Pattern {
            field: field.to_string(),
            pattern: pattern.to_string(),
            source,
        })?;
        self.patterns.entry(field.to_string()).or_default().push(regex);
        Ok(())
    }

    /// Builder form of [`add_pattern`](Self::add_pattern).
    pub fn with_pattern(mut self, field: &str, pattern: &str) -> Result<Self> {
        self.add_pattern(field, pattern)?;
        Ok(self)
    }

    /// `true` when no pattern is registered.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// `true` if any pattern matches the field it is registered for.
    pub fn is_ignored(&self, record: &MessageRecord) -> bool {
        self.patterns.iter().any(|(field, regexes)| {
            record
                .field(field)
                .is_some_and(|value| regexes.iter().any(|re| re.is_match(&value)))
        })
    }

    /// Splits `records` into those kept, in order, and the number ignored.
    pub fn apply<'a>(&self, records: &'a [MessageRecord]) -> (Vec<&'a MessageRecord>, usize) {
        let kept: Vec<&MessageRecord> = records.iter().filter(|r| !self.is_ignored(r)).collect();
        let ignored = records.len() - kept.len();
        (kept, ignored)
    }
}

/// Serialized form of a [`FilterConfig`]: field name to pattern list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub warnings: BTreeMap<String, Vec<String>>,
}

impl FilterSpec {
    /// Noise every LaTeX run produces.
    pub fn builtin() -> Self {
        let mut spec = Self::default();
        spec.warnings.insert(
            "message".into(),
            vec![
                "(.*) float specifier changed to (.*)".into(),
                "(.*)may have changed. Rerun to get cross(.*)".into(),
                "(.*)run BibTeX on the file(.*)".into(),
            ],
        );
        spec.warnings.insert("component".into(), vec!["Font".into()]);
        spec.warnings.insert("package".into(), vec!["rerunfilecheck".into()]);
        spec.errors
            .insert("message".into(), vec!["Dimension too large".into()]);
        spec
    }
}

/// Filters for the error and warning sections of a report.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub errors: MessageFilter,
    pub warnings: MessageFilter,
}

impl FilterConfig {
    /// A configuration that ignores nothing.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// The built-in noise filters.
    pub fn builtin() -> Self {
        (*BUILTIN).clone()
    }

    /// Compiles every pattern of `spec`.
    pub fn from_spec(spec: &FilterSpec) -> Result<Self> {
        let mut config = Self::default();
        for (field, patterns) in &spec.errors {
            for pattern in patterns {
                config.errors.add_pattern(field, pattern)?;
            }
        }
        for (field, patterns) in &spec.warnings {
            for pattern in patterns {
                config.warnings.add_pattern(field, pattern)?;
            }
        }
        Ok(config)
    }

    /// Parses a JSON [`FilterSpec`] and compiles it.
    pub fn from_json(text: &str) -> Result<Self> {
        let spec: FilterSpec = serde_json::from_str(text)?;
        Self::from_spec(&spec)
    }

    /// Loads a JSON filter file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        log::debug!("Loaded filter configuration from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogScanner;

    #[test]
    fn test_builtin_filters_noise() {
        let report = LogScanner::new().parse(
            "LaTeX Warning: `h' float specifier changed to `ht'.\n\
             \n\
             LaTeX Font Warning: Font shape `OT1/cmr/bx/sc' undefined\n\
             \n\
             Package rerunfilecheck Warning: File `main.out' has changed.\n\
             \n\
             LaTeX Warning: There were undefined references.\n\
             \n\
             ! Dimension too large.\n\
             \n\
             ! Undefined control sequence.\n",
        );
        let config = FilterConfig::builtin();

        let (kept, ignored) = config.warnings.apply(report.warnings());
        assert_eq!(ignored, 3);
        assert_eq!(kept.len(), 1);
        assert_eq!(
            kept[0].field("message").as_deref(),
            Some("There were undefined references.")
        );

        let (kept, ignored) = config.errors.apply(report.errors());
        assert_eq!(ignored, 1);
        assert_eq!(kept[0].field("message").as_deref(), Some("Undefined control sequence."));
    }

    #[test]
    fn test_patterns_are_anchored() {
        let filter = MessageFilter::new()
            .with_pattern("message", "too large")
            .unwrap();
        let report = LogScanner::new().parse("! Dimension too large.\n");
        assert!(!filter.is_ignored(&report.errors()[0]));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = FilterConfig::from_json(r#"{"errors": {"message": ["("]}}"#).unwrap_err();
        assert!(matches!(err, Error::Pattern { ref field, .. } if field == "message"));
    }

    #[test]
    fn test_malformed_json() {
        let err = FilterConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filters.json");
        std::fs::write(&path, r#"{"warnings": {"package": ["hyperref"]}}"#).unwrap();

        let config = FilterConfig::load_from_path(&path).unwrap();
        assert!(config.errors.is_empty());
        assert!(!config.warnings.is_empty());

        let report = LogScanner::new().parse("Package hyperref Warning: Draft mode on.\n");
        assert!(config.warnings.is_ignored(&report.warnings()[0]));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FilterConfig::load_from_path(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
