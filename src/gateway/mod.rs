//! Remote data gateway: a thin, uniform CRUD seam over the hosted backend.
//!
//! Everything above this trait is backend-agnostic; implementations
//! normalize whatever their transport produces into [`RemoteError`] and
//! never panic. No retries live in the trait contract itself — the REST
//! implementation layers a bounded retry per [`crate::ScaffoldSettings`].

mod memory;
mod rest;

pub use memory::MemoryGateway;
pub use rest::RestGateway;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::record::Record;

/// Logical collection names served by the backend.
pub mod collections {
    pub const INSTITUTIONS: &str = "institutions";
    pub const PSYCHOLOGISTS: &str = "psychologists";
    pub const PATIENTS: &str = "patients";
    pub const ROUTE_PERMISSIONS: &str = "route_permissions";
    pub const ROLE_PERMISSIONS: &str = "role_permissions";
    pub const USAGE_STATISTICS: &str = "usage_statistics";
    pub const ACTIVITY_LOGS: &str = "activity_logs";
    pub const SESSION_LOGS: &str = "session_logs";
    pub const PATIENT_ASSIGNMENTS: &str = "patient_assignments";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Requested server-side ordering for a list call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Uniform CRUD contract over one remote backend.
///
/// All operations are asynchronous and return structured errors rather
/// than panicking. `create` and `update` return the record as the backend
/// now holds it (ids and server-side defaults filled in).
#[async_trait]
pub trait RemoteDataGateway: Send + Sync {
    async fn list(
        &self,
        collection: &str,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<Record>, RemoteError>;

    async fn create(&self, collection: &str, record: Record) -> Result<Record, RemoteError>;

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Record,
    ) -> Result<Record, RemoteError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError>;
}

/// Compare two records on one field for client-side ordering.
///
/// Numbers compare numerically, strings case-insensitively; records missing
/// the field sort last regardless of direction.
pub(crate) fn compare_records(
    a: &Record,
    b: &Record,
    sort: &SortSpec,
) -> std::cmp::Ordering {
    use serde_json::Value;
    use std::cmp::Ordering;

    let ord = match (a.get(&sort.field), b.get(&sort.field)) {
        (None | Some(Value::Null), None | Some(Value::Null)) => return Ordering::Equal,
        (None | Some(Value::Null), Some(_)) => return Ordering::Greater,
        (Some(_), None | Some(Value::Null)) => return Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => {
            let xs = x.as_str().map(str::to_lowercase).unwrap_or_else(|| x.to_string());
            let ys = y.as_str().map(str::to_lowercase).unwrap_or_else(|| y.to_string());
            xs.cmp(&ys)
        }
    };

    match sort.direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_direction_toggle() {
        assert_eq!(SortDirection::Asc.toggled(), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.toggled(), SortDirection::Asc);
    }

    #[test]
    fn test_compare_records_missing_field_sorts_last() {
        let a = Record::new().with_field("nombre", json!("alfa"));
        let b = Record::new();
        let sort = SortSpec::asc("nombre");
        assert_eq!(compare_records(&a, &b, &sort), std::cmp::Ordering::Less);

        // Missing values stay last even when descending.
        let sort = SortSpec::desc("nombre");
        assert_eq!(compare_records(&a, &b, &sort), std::cmp::Ordering::Less);
    }

    #[test]
    fn test_compare_records_numeric() {
        let a = Record::new().with_field("edad", json!(9));
        let b = Record::new().with_field("edad", json!(30));
        let sort = SortSpec::asc("edad");
        assert_eq!(compare_records(&a, &b, &sort), std::cmp::Ordering::Less);
    }
}
