//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `FundId` where a
//! `DepartmentId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a portal user.");
typed_id!(BudgetLineId, "Unique identifier for a budget line.");
typed_id!(DocumentId, "Unique identifier for a financial document.");
typed_id!(FundId, "Unique identifier for a fund or sub-fund.");
typed_id!(FiscalYearId, "Unique identifier for a fiscal year.");
typed_id!(DepartmentId, "Unique identifier for a department.");
typed_id!(SubDepartmentId, "Unique identifier for a sub-department.");
typed_id!(
    ChartOfAccountId,
    "Unique identifier for a chart of accounts entry."
);
typed_id!(ProjectId, "Unique identifier for a project.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_ids_are_distinct_types() {
        // This is a compile-time guarantee; just exercise the constructors.
        let line = BudgetLineId::new();
        let doc = DocumentId::new();
        assert_ne!(line.into_inner(), doc.into_inner());
    }

    #[test]
    fn test_display_and_parse_roundtrip() {
        let id = FundId::new();
        let parsed = FundId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_serde_transparent() {
        let id = DocumentId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.into_inner()));
        let back: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_v7_ids_are_time_ordered() {
        let a = DocumentId::new();
        let b = DocumentId::new();
        assert!(a.into_inner() <= b.into_inner());
    }
}
