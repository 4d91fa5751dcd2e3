//! In-memory gateway for tests and demos.
//!
//! Seedable, counts calls per operation, and can be primed with errors so
//! callers can exercise their failure paths without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use crate::error::RemoteError;
use crate::record::Record;

use super::{compare_records, RemoteDataGateway, SortSpec};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Record>>,
    queued_errors: VecDeque<RemoteError>,
    list_calls: usize,
    create_calls: usize,
    update_calls: usize,
    delete_calls: usize,
}

/// HashMap-backed [`RemoteDataGateway`].
#[derive(Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rows of a collection.
    pub fn seed(&self, collection: &str, rows: Vec<Record>) {
        let mut inner = self.inner.lock().unwrap();
        inner.collections.insert(collection.to_string(), rows);
    }

    /// Queue an error; the next operation (any kind) fails with it.
    pub fn push_error(&self, error: RemoteError) {
        self.inner.lock().unwrap().queued_errors.push_back(error);
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }

    pub fn create_calls(&self) -> usize {
        self.inner.lock().unwrap().create_calls
    }

    pub fn update_calls(&self) -> usize {
        self.inner.lock().unwrap().update_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.inner.lock().unwrap().delete_calls
    }

    /// Current rows of a collection (test inspection).
    pub fn rows(&self, collection: &str) -> Vec<Record> {
        self.inner
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn take_queued_error(inner: &mut Inner) -> Option<RemoteError> {
        inner.queued_errors.pop_front()
    }
}

#[async_trait]
impl RemoteDataGateway for MemoryGateway {
    async fn list(
        &self,
        collection: &str,
        sort: Option<&SortSpec>,
    ) -> Result<Vec<Record>, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.list_calls += 1;
        if let Some(err) = Self::take_queued_error(&mut inner) {
            return Err(err);
        }

        let mut rows = inner
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default();
        if let Some(sort) = sort {
            rows.sort_by(|a, b| compare_records(a, b, sort));
        }
        Ok(rows)
    }

    async fn create(&self, collection: &str, record: Record) -> Result<Record, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.create_calls += 1;
        if let Some(err) = Self::take_queued_error(&mut inner) {
            return Err(err);
        }

        let mut record = record;
        if record.id().is_none() {
            record.set("id", json!(Uuid::new_v4().to_string()));
        }
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Record,
    ) -> Result<Record, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.update_calls += 1;
        if let Some(err) = Self::take_queued_error(&mut inner) {
            return Err(err);
        }

        let rows = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| RemoteError::not_found(collection, id))?;
        let row = rows
            .iter_mut()
            .find(|r| r.id().as_deref() == Some(id))
            .ok_or_else(|| RemoteError::not_found(collection, id))?;
        for (key, value) in patch.iter() {
            row.set(key.clone(), value.clone());
        }
        Ok(row.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        inner.delete_calls += 1;
        if let Some(err) = Self::take_queued_error(&mut inner) {
            return Err(err);
        }

        let rows = inner
            .collections
            .get_mut(collection)
            .ok_or_else(|| RemoteError::not_found(collection, id))?;
        let before = rows.len();
        rows.retain(|r| r.id().as_deref() != Some(id));
        if rows.len() == before {
            return Err(RemoteError::not_found(collection, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;

    fn row(id: i64, nombre: &str) -> Record {
        Record::new()
            .with_field("id", json!(id))
            .with_field("nombre", json!(nombre))
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let gw = MemoryGateway::new();
        gw.seed("institutions", vec![row(1, "Uni A")]);

        let created = gw
            .create("institutions", Record::new().with_field("nombre", json!("Uni B")))
            .await
            .unwrap();
        assert!(created.id().is_some());

        let listed = gw.list("institutions", None).await.unwrap();
        assert_eq!(listed.len(), 2);

        gw.update(
            "institutions",
            "1",
            Record::new().with_field("nombre", json!("Uni A2")),
        )
        .await
        .unwrap();
        assert_eq!(gw.rows("institutions")[0].get_str("nombre"), Some("Uni A2"));

        gw.delete("institutions", "1").await.unwrap();
        assert_eq!(gw.rows("institutions").len(), 1);
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let gw = MemoryGateway::new();
        gw.seed("institutions", vec![row(1, "beta"), row(2, "alfa")]);

        let sorted = gw
            .list("institutions", Some(&SortSpec::asc("nombre")))
            .await
            .unwrap();
        assert_eq!(sorted[0].get_str("nombre"), Some("alfa"));
    }

    #[tokio::test]
    async fn test_queued_error_consumed_once() {
        let gw = MemoryGateway::new();
        gw.seed("institutions", vec![row(1, "Uni A")]);
        gw.push_error(RemoteError::new("offline", codes::NETWORK));

        assert!(gw.list("institutions", None).await.is_err());
        assert!(gw.list("institutions", None).await.is_ok());
        assert_eq!(gw.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let gw = MemoryGateway::new();
        gw.seed("institutions", vec![row(1, "Uni A")]);

        let err = gw.delete("institutions", "99").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
