//! Identity directory rows

use super::{parse_flag, RowContext, RowOutput, SourceNormalizer};
use crate::error::MalformedReason;
use crate::headers::CanonicalField;
use posture_model::{Entity, SourceKind};

/// Users export (one row per account)
///
/// Email is required. The display name falls back to first + last name.
/// Sign-in state comes from a sign-in/enabled column, else from a status
/// column; left unset when neither reads as a flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserNormalizer;

impl SourceNormalizer for UserNormalizer {
    fn source_kind(&self) -> SourceKind {
        SourceKind::Users
    }

    fn normalize_row(&self, row: &RowContext<'_>) -> Result<RowOutput, MalformedReason> {
        let id = row
            .email()
            .ok_or(MalformedReason::MissingIdentifier { field: "email" })?;

        let mut user = Entity::user(id, row.period);

        let display_name = row.text(CanonicalField::DisplayName).or_else(|| {
            let parts: Vec<String> = [CanonicalField::FirstName, CanonicalField::LastName]
                .into_iter()
                .filter_map(|field| row.text(field))
                .collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        });
        if let Some(name) = display_name {
            user = user.with_display_name(name);
        }

        let active = row
            .text(CanonicalField::SignInAllowed)
            .and_then(|raw| parse_flag(&raw))
            .or_else(|| row.text(CanonicalField::Status).and_then(|raw| parse_flag(&raw)));
        if let Some(active) = active {
            user = user.with_active(active);
        }

        Ok(RowOutput::entity(user))
    }
}
