//! # Tablero: Headless Entity-Administration Scaffold
//!
//! Tablero provides the generic machinery behind admin CRUD screens:
//! declarative per-entity configuration drives a controller that fetches
//! through a TTL cache, filters and sorts rows, validates editor forms,
//! and routes writes to a remote data API.
//!
//! ## Features
//!
//! - **Declarative entity configs**: columns, form fields, and filters per
//!   entity type, loadable from YAML
//! - **Generic CRUD controller**: one state machine per entity, cache-aware
//!   loads, stale-but-visible failure policy, full reload after mutations
//! - **TTL cache**: per-collection read-through cache with logical expiry
//!   and explicit invalidation
//! - **Form engine**: per-field validation rules with fixed evaluation
//!   order and first-failure short-circuit
//! - **Offline queue**: failed writes replay FIFO with reconciliation of
//!   server-side-deleted targets
//! - **Exports**: CSV and JSON report documents for usage/activity data
//!
//! ## Example: entity schema
//!
//! ```yaml
//! name: Institución
//! plural: Instituciones
//! collection: institutions
//! columns:
//!   - field: nombre
//!     header: Nombre
//!   - field: tipo
//!     header: Tipo
//! fields:
//!   - id: nombre
//!     type: text
//!     label: Nombre
//!     validation:
//!       required: true
//! ```
//!
//! ## Example: wiring a controller
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use tablero::{
//!     EntityController, MemoryGateway, ScaffoldSettings, TtlCache,
//!     presets::institution_config,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let settings = ScaffoldSettings::default();
//! let gateway = Arc::new(MemoryGateway::new());
//! let cache = Arc::new(Mutex::new(TtlCache::new(settings.cache_ttl)));
//!
//! let mut controller = EntityController::new(institution_config(gateway), cache);
//! controller.load(false).await;
//! assert!(controller.rows().is_empty());
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod filters;
pub mod form;
pub mod gateway;
pub mod offline;
pub mod presets;
pub mod record;
pub mod settings;
pub mod table;

pub use cache::TtlCache;
pub use config::{
    ChoiceOption, ColumnSpec, EntityConfig, EntitySchema, FieldSpec, FieldType, FilterSpec,
    FilterType, ValidationRules,
};
pub use controller::{EditorMode, EntityController, LoadState, SubmitOutcome};
pub use error::RemoteError;
pub use export::{CsvExporter, ExportError, Report};
pub use filters::{apply_filters, FilterValue};
pub use form::{FormState, ValidationFailure};
pub use gateway::{
    collections, MemoryGateway, RemoteDataGateway, RestGateway, SortDirection, SortSpec,
};
pub use offline::{OfflineQueue, PendingKind, PendingOperation, ReplayReport};
pub use record::Record;
pub use settings::ScaffoldSettings;
pub use table::{RenderedTable, TableView};
