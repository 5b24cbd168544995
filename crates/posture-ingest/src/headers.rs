//! Best-effort header matching
//!
//! Raw exports rename columns freely ("Serial Number", "SN", "S/N"). Headers
//! are normalized with [`normalize_header`] and then looked up in a
//! [`SynonymTable`] mapping each [`CanonicalField`] to its known aliases.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_\-]+").expect("separator pattern is valid"));

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N} /@]").expect("punctuation pattern is valid"));

static BUILTIN: Lazy<SynonymTable> = Lazy::new(SynonymTable::builtin);

/// Normalize a raw column header for lookup
///
/// Lower-cases, turns runs of whitespace, `_` and `-` into one space, drops
/// punctuation other than `/` and `@`, and trims.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let spaced = SEPARATORS.replace_all(&lowered, " ");
    let stripped = PUNCTUATION.replace_all(&spaced, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical columns the normalizers understand
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Email,
    FirstName,
    LastName,
    DisplayName,
    SignInAllowed,
    Serial,
    DeviceName,
    Owner,
    Severity,
    Status,
    Clicks,
    Timestamp,
}

impl CanonicalField {
    /// Every field, in declaration order
    pub const ALL: [CanonicalField; 12] = [
        CanonicalField::Email,
        CanonicalField::FirstName,
        CanonicalField::LastName,
        CanonicalField::DisplayName,
        CanonicalField::SignInAllowed,
        CanonicalField::Serial,
        CanonicalField::DeviceName,
        CanonicalField::Owner,
        CanonicalField::Severity,
        CanonicalField::Status,
        CanonicalField::Clicks,
        CanonicalField::Timestamp,
    ];

    /// Name used in diagnostics and configuration
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Email => "email",
            CanonicalField::FirstName => "first_name",
            CanonicalField::LastName => "last_name",
            CanonicalField::DisplayName => "display_name",
            CanonicalField::SignInAllowed => "sign_in_allowed",
            CanonicalField::Serial => "serial",
            CanonicalField::DeviceName => "device_name",
            CanonicalField::Owner => "owner",
            CanonicalField::Severity => "severity",
            CanonicalField::Status => "status",
            CanonicalField::Clicks => "clicks",
            CanonicalField::Timestamp => "timestamp",
        }
    }

    fn builtin_aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalField::Email => &[
                "email",
                "email address",
                "e mail",
                "mail",
                "user principal name",
                "upn",
                "user",
                "login",
                "username",
            ],
            CanonicalField::FirstName => &["first name", "given name", "firstname"],
            CanonicalField::LastName => &["last name", "surname", "family name", "lastname"],
            CanonicalField::DisplayName => &["display name", "full name", "name"],
            CanonicalField::SignInAllowed => &[
                "sign in allowed",
                "sign in status",
                "account enabled",
                "enabled",
            ],
            CanonicalField::Serial => &[
                "serial number",
                "serial",
                "serial no",
                "serialnumber",
                "sn",
                "s/n",
                "device serial",
            ],
            CanonicalField::DeviceName => &[
                "device name",
                "device",
                "computer name",
                "computer",
                "asset name",
                "hostname",
                "host name",
                "endpoint",
            ],
            CanonicalField::Owner => &[
                "last user",
                "assigned user",
                "primary user",
                "owner",
                "user",
                "logged in user",
            ],
            CanonicalField::Severity => &[
                "severity",
                "priority",
                "risk level",
                "risk",
                "incident severity",
            ],
            CanonicalField::Status => &["status", "backup status", "result", "state", "job status"],
            CanonicalField::Clicks => &[
                "clicked",
                "clicks",
                "link clicked",
                "clicked link",
                "click count",
            ],
            CanonicalField::Timestamp => &[
                "timestamp",
                "date",
                "detected at",
                "detected",
                "created",
                "event time",
                "last successful backup",
                "last backup",
            ],
        }
    }
}

impl Display for CanonicalField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alias lists per canonical field, in lookup priority order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymTable {
    aliases: BTreeMap<CanonicalField, Vec<String>>,
}

impl SynonymTable {
    fn builtin() -> Self {
        let aliases = CanonicalField::ALL
            .into_iter()
            .map(|field| {
                let list = field
                    .builtin_aliases()
                    .iter()
                    .map(|alias| normalize_header(alias))
                    .collect();
                (field, list)
            })
            .collect();
        Self { aliases }
    }

    /// Add aliases for a field ahead of the existing ones
    ///
    /// Aliases are normalized before insertion; duplicates are dropped.
    #[must_use]
    pub fn with_aliases<I, S>(mut self, field: CanonicalField, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merged: Vec<String> = extra
            .into_iter()
            .map(|alias| normalize_header(alias.as_ref()))
            .filter(|alias| !alias.is_empty())
            .collect();
        let existing = self.aliases.remove(&field).unwrap_or_default();
        merged.extend(existing);

        let mut seen = std::collections::BTreeSet::new();
        merged.retain(|alias| seen.insert(alias.clone()));
        self.aliases.insert(field, merged);
        self
    }

    /// Merge configured aliases, keyed by field
    #[must_use]
    pub fn with_overrides(self, overrides: &BTreeMap<CanonicalField, Vec<String>>) -> Self {
        overrides
            .iter()
            .fold(self, |table, (field, extra)| table.with_aliases(*field, extra))
    }

    /// Aliases for a field, highest priority first
    #[must_use]
    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.aliases.get(&field).map_or(&[], Vec::as_slice)
    }

    /// Canonical fields a normalized header could stand for
    #[must_use]
    pub fn resolve(&self, header: &str) -> Vec<CanonicalField> {
        let normalized = normalize_header(header);
        self.aliases
            .iter()
            .filter(|(_, list)| list.iter().any(|alias| *alias == normalized))
            .map(|(field, _)| *field)
            .collect()
    }
}

impl Default for SynonymTable {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header("  Serial_Number "), "serial number");
        assert_eq!(normalize_header("Serial-No."), "serial no");
        assert_eq!(normalize_header("S/N"), "s/n");
        assert_eq!(normalize_header("E-Mail   Address"), "e mail address");
        assert_eq!(normalize_header("Sign-in allowed?"), "sign in allowed");
    }

    #[test]
    fn builtin_resolves_common_aliases() {
        let table = SynonymTable::default();
        assert_eq!(table.resolve("SN"), vec![CanonicalField::Serial]);
        assert_eq!(table.resolve("Computer Name"), vec![CanonicalField::DeviceName]);
        assert_eq!(
            table.resolve("User"),
            vec![CanonicalField::Email, CanonicalField::Owner]
        );
        assert!(table.resolve("Favourite colour").is_empty());
    }

    #[test]
    fn configured_aliases_take_priority() {
        let table =
            SynonymTable::default().with_aliases(CanonicalField::Serial, ["Asset Tag", "SN"]);
        let aliases = table.aliases(CanonicalField::Serial);
        assert_eq!(aliases[0], "asset tag");
        assert_eq!(aliases[1], "sn");
        assert_eq!(aliases.iter().filter(|a| *a == "sn").count(), 1);
    }

    #[test]
    fn canonical_field_names_match_serde() {
        for field in CanonicalField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.as_str()));
        }
    }
}
