//! Platform-independent indexing and query engine for the virtual-tour
//! search widget.
//!
//! This crate implements the engine described in `spec.md`/`SPEC_FULL.md`:
//! a type classifier, label resolver, filter pipeline, external data
//! loader, reconciler, indexer, query engine, and navigation dispatcher,
//! all wired together behind a single [`engine::Engine`] facade. Every
//! interaction with a live tour, the DOM, persistent storage, or
//! cross-window messaging goes through a trait defined here
//! ([`adapter::TourAdapter`], [`storage::PersistentStore`],
//! [`broadcast::BroadcastChannel`]); the `tour-search-wasm` crate supplies
//! the concrete browser-backed implementations.

#![forbid(unsafe_code)]

pub mod adapter;
pub mod broadcast;
pub mod canonical;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod external;
pub mod filter;
pub mod fuzzy;
pub mod indexer;
pub mod label;
pub mod navigate;
pub mod query;
pub mod reconcile;
pub mod record;
pub mod scheduler;
pub mod storage;
pub mod taxonomy;

pub use adapter::{MediaView, NodeHandle, OverlayView, PlaylistItemView, TourAdapter, TriggerOutcome};
pub use broadcast::{BroadcastChannel, BroadcastMessage, ListenerHandle, CHANNEL_NAME};
pub use config::{
    ActiveExternalSource, BusinessDataConfig, ElementTriggeringConfig, FieldWeights, FilterConfig, FilterMode,
    GoogleSheetsConfig, IncludeContentConfig, SearchSettingsConfig, TourSearchConfig, UseAsLabelConfig,
    ValueFilterConfig, ValueFilterScope, ValueMatchMode,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
pub use engine::{ActivationOutcome, Engine};
pub use error::{EngineError, Result};
pub use external::{BusinessRecord, SheetsLoadResult, SheetsProjection, SheetsRecord};
pub use filter::{FilterCandidate, FilterOutcome};
pub use fuzzy::{fuzzy_match, FuzzyMatch, FuzzyOptions};
pub use indexer::{build_index, build_index_with_diagnostics, IndexBuildInput};
pub use label::{resolve_label, LabelContext};
pub use navigate::{plan_activation, ActivationPlan, TriggerAttemptOutcome};
pub use query::{query_index, QueryOutcome, ResultGroup, ScoredHit, SearchableFields};
pub use reconcile::{ReconciliationScope, TourCandidate};
pub use record::{BoostTier, Camera, IndexRecord, ItemRef, RecordSource};
pub use scheduler::{Scheduler, TimerHandle};
pub use storage::{keys, InMemoryStore, PersistentStore};
pub use taxonomy::{classify, ClassifierInput, Classification, ElementType};
