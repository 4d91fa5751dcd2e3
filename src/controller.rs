//! Generic entity controller.
//!
//! One instance per entity type, driven entirely by its [`EntityConfig`]:
//! list-fetch through the TTL cache, sort/search/filter, and the editor
//! lifecycle (create/edit, validate, submit, delete). Every successful
//! mutation triggers a full forced reload rather than a local row patch:
//! displayed rows are always re-derived from the authoritative fetch, at
//! the cost of one extra round trip per mutation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::cache::TtlCache;
use crate::config::EntityConfig;
use crate::error::RemoteError;
use crate::filters::{apply_filters, FilterValue};
use crate::form::{FormState, ValidationFailure};
use crate::gateway::{compare_records, SortDirection, SortSpec};
use crate::offline::{OfflineQueue, PendingOperation};
use crate::record::Record;

/// Load lifecycle of a controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Creation vs. edit, determined by whether a row was passed when the
/// editor opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(String),
}

/// An open editor: mode plus live form state.
pub struct Editor {
    pub mode: EditorMode,
    pub form: FormState,
}

/// Result of a submit attempt.
pub enum SubmitOutcome {
    /// Written remotely; the editor closed and a forced reload ran.
    Saved,
    /// Blocked locally; no remote call was made and the editor stays open.
    Invalid(ValidationFailure),
    /// The remote write failed; the editor stays open with values intact.
    RemoteFailed(RemoteError),
}

/// Declarative-config-driven CRUD orchestrator for one entity type.
pub struct EntityController {
    config: EntityConfig,
    cache: Arc<Mutex<TtlCache>>,
    offline: Option<Arc<Mutex<OfflineQueue>>>,
    state: LoadState,
    rows: Vec<Record>,
    last_error: Option<RemoteError>,
    sort: Option<SortSpec>,
    search: String,
    filter_values: HashMap<String, FilterValue>,
    editor: Option<Editor>,
    /// Sequence number of the most recently issued load; completions
    /// carrying an older number are discarded so a late-arriving stale
    /// response never overwrites newer state.
    issued: u64,
}

impl EntityController {
    /// The cache instance is passed in explicitly and may be shared with
    /// other controllers of the same entity type within one page session.
    pub fn new(config: EntityConfig, cache: Arc<Mutex<TtlCache>>) -> Self {
        Self {
            config,
            cache,
            offline: None,
            state: LoadState::Idle,
            rows: Vec::new(),
            last_error: None,
            sort: None,
            search: String::new(),
            filter_values: HashMap::new(),
            editor: None,
            issued: 0,
        }
    }

    /// Attach a pending-operation queue: failed writes are then queued for
    /// later replay in addition to being surfaced.
    pub fn with_offline_queue(mut self, queue: Arc<Mutex<OfflineQueue>>) -> Self {
        self.offline = Some(queue);
        self
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// True while a load is in flight; hosts disable refresh triggers on it.
    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    /// All currently displayed rows (unfiltered).
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Error from the most recent load, if it failed.
    pub fn last_error(&self) -> Option<&RemoteError> {
        self.last_error.as_ref()
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn set_filter(&mut self, id: impl Into<String>, value: FilterValue) {
        self.filter_values.insert(id.into(), value);
    }

    pub fn clear_filters(&mut self) {
        self.filter_values.clear();
        self.search.clear();
    }

    /// Rows after search and filters, in display order.
    ///
    /// Uses the entity's custom predicate when one is configured, else the
    /// default conjunction from [`crate::filters::apply_filters`].
    pub fn visible_rows(&self) -> Vec<Record> {
        match self.config.search_predicate() {
            Some(predicate) => self
                .rows
                .iter()
                .filter(|row| predicate(row, &self.search, &self.filter_values))
                .cloned()
                .collect(),
            None => apply_filters(&self.rows, &self.search, &self.filter_values),
        }
    }

    /// Load rows, serving from cache when valid and not forced.
    ///
    /// On a fetch failure the previously displayed rows are kept
    /// (stale-but-visible: the table is never blanked by a failed refresh)
    /// and the error is surfaced via [`Self::last_error`].
    pub async fn load(&mut self, force_refresh: bool) {
        let collection = self.config.collection().to_string();

        if !force_refresh {
            let cached = self.cache.lock().unwrap().get(&collection);
            if let Some(mut rows) = cached {
                // Cached data sorts client-side; fresh fetches sort remotely.
                if let Some(sort) = &self.sort {
                    rows.sort_by(|a, b| compare_records(a, b, sort));
                }
                self.rows = rows;
                self.state = LoadState::Ready;
                self.last_error = None;
                return;
            }
        }

        let seq = self.begin_load();
        let result = self
            .config
            .gateway()
            .list(&collection, self.sort.as_ref())
            .await;
        self.apply_list_outcome(seq, result);
    }

    /// Force a fresh fetch, bypassing the cache.
    pub async fn refresh(&mut self) {
        self.load(true).await;
    }

    fn begin_load(&mut self) -> u64 {
        self.state = LoadState::Loading;
        self.issued += 1;
        tracing::debug!(collection = self.config.collection(), seq = self.issued, "load issued");
        self.issued
    }

    fn apply_list_outcome(&mut self, seq: u64, result: Result<Vec<Record>, RemoteError>) {
        if seq != self.issued {
            // A newer load was issued while this one was in flight.
            tracing::debug!(seq, latest = self.issued, "discarding stale load result");
            return;
        }
        match result {
            Ok(rows) => {
                self.cache
                    .lock()
                    .unwrap()
                    .set(self.config.collection(), rows.clone());
                self.rows = rows;
                self.state = LoadState::Ready;
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(collection = self.config.collection(), error = %e, "load failed");
                self.state = LoadState::Failed;
                self.last_error = Some(e);
                // self.rows intentionally untouched.
            }
        }
    }

    /// Header click: toggle direction on the active field, ascending on a
    /// new one. Unknown or unsortable fields are a no-op.
    pub async fn request_sort(&mut self, field: &str) {
        let sortable = self
            .config
            .schema
            .column(field)
            .map(|c| c.sortable)
            .unwrap_or(false);
        if !sortable {
            return;
        }

        self.sort = Some(match &self.sort {
            Some(current) if current.field == field => SortSpec {
                field: field.to_string(),
                direction: current.direction.toggled(),
            },
            _ => SortSpec {
                field: field.to_string(),
                direction: SortDirection::Asc,
            },
        });
        self.load(false).await;
    }

    // ===== Editor lifecycle =====

    /// Open the editor: `None` for creation mode (form defaults from the
    /// config's initial values), `Some(row)` for edit mode.
    pub fn open_editor(&mut self, row: Option<&Record>) {
        let (mode, values) = match row {
            None => (EditorMode::Create, self.config.initial_form_values()),
            Some(row) => (
                EditorMode::Edit(row.id().unwrap_or_default()),
                self.config.form_values(row),
            ),
        };
        self.editor = Some(Editor {
            mode,
            form: FormState::new(self.config.schema.fields.clone(), values),
        });
    }

    pub fn editor(&self) -> Option<&Editor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut Editor> {
        self.editor.as_mut()
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    /// Validate and submit the open editor.
    ///
    /// Routes to create or update by editor mode. Success closes the
    /// editor and forces a reload; a remote failure keeps the editor open
    /// with entered values intact (and queues the write when an offline
    /// queue is attached). Validation failures never reach the gateway.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let Some(editor) = self.editor.as_mut() else {
            return SubmitOutcome::Invalid(ValidationFailure {
                errors: indexmap::IndexMap::new(),
            });
        };

        let values = match editor.form.submit() {
            Ok(values) => values,
            Err(failure) => return SubmitOutcome::Invalid(failure),
        };
        let record = record_from_values(&values);
        let mode = editor.mode.clone();
        let collection = self.config.collection().to_string();

        let result = match &mode {
            EditorMode::Create => self
                .config
                .gateway()
                .create(&collection, record.clone())
                .await
                .map(|_| ()),
            EditorMode::Edit(id) => self
                .config
                .gateway()
                .update(&collection, id, record.clone())
                .await
                .map(|_| ()),
        };

        match result {
            Ok(()) => {
                self.close_editor();
                self.load(true).await;
                SubmitOutcome::Saved
            }
            Err(e) => {
                tracing::warn!(collection = %collection, error = %e, "write failed");
                if let Some(queue) = &self.offline {
                    let operation = match &mode {
                        EditorMode::Create => PendingOperation::create(&collection, record),
                        EditorMode::Edit(id) => {
                            PendingOperation::update(&collection, id.clone(), record)
                        }
                    };
                    queue.lock().unwrap().push(operation);
                }
                SubmitOutcome::RemoteFailed(e)
            }
        }
    }

    /// Delete a row, then reload unconditionally.
    ///
    /// A delete failure is returned to the caller (and queued when an
    /// offline queue is attached) but never suppresses the reload.
    pub async fn remove(&mut self, id: &str) -> Result<(), RemoteError> {
        let collection = self.config.collection().to_string();
        let result = self.config.gateway().delete(&collection, id).await;

        if let Err(e) = &result {
            tracing::warn!(collection = %collection, id, error = %e, "delete failed");
            if let Some(queue) = &self.offline {
                queue
                    .lock()
                    .unwrap()
                    .push(PendingOperation::delete(&collection, id));
            }
        }

        self.load(true).await;
        result
    }
}

fn record_from_values(values: &HashMap<String, Value>) -> Record {
    let mut record = Record::new();
    for (key, value) in values {
        record.set(key.clone(), value.clone());
    }
    record
}
