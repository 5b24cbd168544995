//! Data-quality warnings raised during reconciliation

use crate::error::IdentifierConflictError;
use posture_model::Identifier;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Something suspicious in the inputs that did not stop the comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataQualityWarning {
    /// Identifier changed entity kind between periods
    IdentifierConflict(IdentifierConflictError),

    /// A joiner and a leaver whose identifiers are suspiciously close
    ///
    /// Usually a typo'd email domain. Both stay distinct entities.
    NearDuplicateIdentifier {
        joined: Identifier,
        departed: Identifier,
        distance: usize,
    },
}

impl Display for DataQualityWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentifierConflict(err) => err.fmt(f),
            Self::NearDuplicateIdentifier {
                joined,
                departed,
                distance,
            } => write!(
                f,
                "joiner {joined} resembles leaver {departed} (edit distance {distance})"
            ),
        }
    }
}
