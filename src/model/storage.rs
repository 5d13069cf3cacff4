use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Error, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

// Persisted record model, stored as a JSON array under `accountData`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Label { text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Local,
    #[serde(rename = "LDAP")]
    Ldap,
}

impl RecordType {
    pub const ALL: [RecordType; 2] = [RecordType::Local, RecordType::Ldap];
}

impl Default for RecordType {
    fn default() -> Self {
        RecordType::Local
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Local => f.write_str("Local"),
            RecordType::Ldap => f.write_str("LDAP"),
        }
    }
}

impl FromStr for RecordType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RecordType::ALL
            .iter()
            .copied()
            .find(|t| t.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::msg(format!(
                    "Unknown record type '{}', expected one of: {}",
                    s,
                    RecordType::ALL.iter().join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorField {
    Label,
    Login,
    Password,
    Type,
}

impl fmt::Display for ErrorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorField::Label => "label",
            ErrorField::Login => "login",
            ErrorField::Password => "password",
            ErrorField::Type => "type",
        })
    }
}

/// Per-field validation flags of a record. A missing field means no error
/// has been recorded for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountErrors(BTreeMap<ErrorField, bool>);

impl AccountErrors {
    pub fn set(&mut self, field: ErrorField, has_error: bool) {
        self.0.insert(field, has_error);
    }

    pub fn clear(&mut self, field: ErrorField) {
        self.0.remove(&field);
    }

    pub fn has(&self, field: ErrorField) -> bool {
        self.0.get(&field).copied().unwrap_or(false)
    }

    /// True when at least one field is flagged.
    pub fn has_errors(&self) -> bool {
        self.0.values().any(|e| *e)
    }

    pub fn reset(&mut self) {
        self.0.clear();
    }

    pub fn fields(&self) -> impl Iterator<Item = ErrorField> + '_ {
        self.0.iter().filter(|(_, e)| **e).map(|(f, _)| *f)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountRecord {
    pub label_raw: String,
    pub label: Vec<Label>,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub login: String,
    pub password: Option<String>,
    pub errors: AccountErrors,
}

impl AccountRecord {
    pub fn labels_in_sync(&self) -> bool {
        parse_label(&self.label_raw) == self.label
    }

    /// Re-derives `label` from `label_raw`. Records that only carry parsed
    /// labels get their raw text rebuilt from them first.
    pub fn sync_labels(&mut self) {
        if self.label_raw.trim().is_empty() && !self.label.is_empty() {
            self.label_raw = self.label.iter().map(|l| l.text.as_str()).join("; ");
        }
        self.label = parse_label(&self.label_raw);
    }
}

/// Splits a `;` delimited label string into trimmed, non-empty labels.
pub fn parse_label(raw: &str) -> Vec<Label> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Label::new)
        .collect_vec()
}
