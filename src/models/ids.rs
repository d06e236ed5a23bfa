//! Strongly-typed ID wrappers for all entity types
//!
//! Ids are opaque strings: callers may supply their own, and the services
//! mint a UUID v4 when one is absent. Newtypes keep a `BudgetId` from being
//! passed where a `ReportId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Macro to generate ID newtype wrappers
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Wrap an existing identifier
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True when no identifier was supplied
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(AccountId);
define_id!(TransactionId);
define_id!(BudgetId);
define_id!(ReportId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_uuids() {
        let id1 = TransactionId::generate();
        let id2 = TransactionId::generate();
        assert_ne!(id1, id2);
        assert!(Uuid::parse_str(id1.as_str()).is_ok());
    }

    #[test]
    fn test_empty_id() {
        assert!(AccountId::default().is_empty());
        assert!(AccountId::new("   ").is_empty());
        assert!(!AccountId::new("account-1").is_empty());
    }

    #[test]
    fn test_id_display_is_raw_value() {
        let id = BudgetId::from("budget-42");
        assert_eq!(id.to_string(), "budget-42");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = ReportId::from("rep-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"rep-1\"");
        let back: ReportId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
