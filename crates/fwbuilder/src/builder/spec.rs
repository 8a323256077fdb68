//! Variant specifications.
//!
//! A variant names one combination of greeting text and firmware version,
//! written as `NAME:TEXT` or `NAME:TEXT:VERSION` on the command line.

use std::str::FromStr;
use thiserror::Error;

/// One named combination of greeting text and firmware version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    /// Filename stem of the produced binary.
    pub name: String,
    /// Greeting text compiled into the firmware.
    pub text: String,
    /// Firmware version number (defaults to 1).
    pub version: i64,
}

/// Errors produced when parsing a variant specification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("variant must be NAME:TEXT or NAME:TEXT:VERSION")]
    MissingSeparator,
    #[error("variant name cannot be empty")]
    EmptyName,
    #[error("variant text cannot be empty")]
    EmptyText,
    #[error("version must be an integer, got '{0}'")]
    MalformedVersion(String),
}

impl FromStr for VariantSpec {
    type Err = SpecError;

    /// Split on the first two separators only; TEXT cannot safely contain
    /// `:` in the two-part form.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = value.splitn(3, ':');
        let name = parts.next().unwrap_or("").trim();
        let Some(text) = parts.next() else {
            return Err(SpecError::MissingSeparator);
        };
        let text = text.trim();

        let version = match parts.next() {
            Some(raw) => {
                let raw = raw.trim();
                raw.parse::<i64>()
                    .map_err(|_| SpecError::MalformedVersion(raw.to_string()))?
            }
            None => 1,
        };

        if name.is_empty() {
            return Err(SpecError::EmptyName);
        }
        if text.is_empty() {
            return Err(SpecError::EmptyText);
        }

        Ok(Self {
            name: name.to_string(),
            text: text.to_string(),
            version,
        })
    }
}

/// Built-in variants used when the operator supplies none.
pub fn default_set() -> Vec<VariantSpec> {
    vec![
        VariantSpec {
            name: "hello".to_string(),
            text: "Hello from slave".to_string(),
            version: 1,
        },
        VariantSpec {
            name: "bye".to_string(),
            text: "Bye from slave".to_string(),
            version: 1,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_part_spec_defaults_version() {
        let spec: VariantSpec = "hello:Hello there".parse().unwrap();
        assert_eq!(spec.name, "hello");
        assert_eq!(spec.text, "Hello there");
        assert_eq!(spec.version, 1);
    }

    #[test]
    fn test_three_part_spec_parses_version() {
        let spec: VariantSpec = "v2:Second firmware:2".parse().unwrap();
        assert_eq!(spec.name, "v2");
        assert_eq!(spec.text, "Second firmware");
        assert_eq!(spec.version, 2);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let spec: VariantSpec = "a: b :3".parse().unwrap();
        assert_eq!(spec.name, "a");
        assert_eq!(spec.text, "b");
        assert_eq!(spec.version, 3);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(
            "".parse::<VariantSpec>(),
            Err(SpecError::MissingSeparator)
        );
    }

    #[test]
    fn test_missing_separator_rejected() {
        assert_eq!(
            "novalue".parse::<VariantSpec>(),
            Err(SpecError::MissingSeparator)
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            "  :text".parse::<VariantSpec>(),
            Err(SpecError::EmptyName)
        );
    }

    #[test]
    fn test_empty_text_rejected() {
        assert_eq!(
            "name:   ".parse::<VariantSpec>(),
            Err(SpecError::EmptyText)
        );
    }

    #[test]
    fn test_malformed_version_names_token() {
        assert_eq!(
            "n:t:notanumber".parse::<VariantSpec>(),
            Err(SpecError::MalformedVersion("notanumber".to_string()))
        );
    }

    #[test]
    fn test_version_field_is_everything_after_second_separator() {
        assert_eq!(
            "n:t:1:2".parse::<VariantSpec>(),
            Err(SpecError::MalformedVersion("1:2".to_string()))
        );
    }

    #[test]
    fn test_default_set_has_two_variants() {
        let defaults = default_set();
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults[0].name, "hello");
        assert_eq!(defaults[1].name, "bye");
        assert!(defaults.iter().all(|v| v.version == 1));
    }
}
