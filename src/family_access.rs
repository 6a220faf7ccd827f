//! Server-side resolution of the family a request acts on.
//!
//! API requests may name a family with the `X-Havi-Family-Id` header.
//! Without it the caller's primary family is used, or their only family.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMembership {
    pub family_id: String,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FamilyAccessError {
    /// The requested family is not one the user belongs to.
    Denied { family_id: String },
    /// No family was requested and none could be picked.
    FamilyRequired { count: usize },
}

impl FamilyAccessError {
    /// HTTP status the API answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            FamilyAccessError::Denied { .. } => 403,
            FamilyAccessError::FamilyRequired { .. } => 409,
        }
    }
}

impl std::fmt::Display for FamilyAccessError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FamilyAccessError::Denied { family_id } => {
                write!(f, "Family access denied: {}", family_id)
            }
            FamilyAccessError::FamilyRequired { count } => {
                write!(f, "Family required ({} memberships)", count)
            }
        }
    }
}

impl std::error::Error for FamilyAccessError {}

#[instrument(skip(memberships), fields(memberships = memberships.len()))]
pub fn resolve_active_family(
    requested: Option<&str>,
    memberships: &[FamilyMembership],
) -> Result<String, FamilyAccessError> {
    let family_ids: BTreeSet<&str> =
        memberships.iter().map(|m| m.family_id.as_str()).collect();

    if let Some(requested) = requested.map(str::trim).filter(|r| !r.is_empty())
    {
        if family_ids.contains(requested) {
            return Ok(requested.to_string());
        }
        info!("Rejected request for family {}", requested);
        return Err(FamilyAccessError::Denied {
            family_id: requested.to_string(),
        });
    }

    if let Some(primary) = memberships.iter().find(|m| m.is_primary) {
        return Ok(primary.family_id.clone());
    }

    let mut ids = family_ids.iter();
    match (ids.next(), ids.next()) {
        (Some(only), None) => Ok(only.to_string()),
        _ => Err(FamilyAccessError::FamilyRequired {
            count: family_ids.len(),
        }),
    }
}
