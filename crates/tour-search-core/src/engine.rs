//! The `Engine` facade (§9 design note): one value with an explicit
//! lifecycle, replacing the source's global mutable singletons
//! (`window.tourInstance`, `_config`, `_businessData`, `_googleSheetsData`,
//! `_initialized`).

use crate::adapter::TourAdapter;
use crate::broadcast::{BroadcastChannel, BroadcastMessage, ListenerHandle, CHANNEL_NAME};
use crate::config::TourSearchConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::EngineError;
use crate::external::{BusinessRecord, SheetsRecord};
use crate::indexer::{build_index_with_diagnostics, IndexBuildInput};
use crate::navigate::{self, ActivationPlan, TriggerAttemptOutcome};
use crate::query::{query_index, QueryOutcome, SearchableFields};
use crate::record::IndexRecord;
use crate::storage::{keys, PersistentStore};

/// What the host must do after [`Engine::activate`] (§4.H): selection is
/// always applied synchronously; anything needing a delay is handed back to
/// the caller, since timers are a host concern (§5 ordering guarantees).
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    SetUrlFragment(String),
    Selected,
    ScheduleTrigger { trigger_id: String, delay_ms: u64, attempt: u32 },
    Triggered,
    Failed,
    Toggled,
}

/// The live, owned engine state: config, index, and the external data it was
/// built from (§3.4 ownership: the Indexer exclusively owns the index).
pub struct Engine<A: TourAdapter, S: PersistentStore, C: BroadcastChannel> {
    config: TourSearchConfig,
    adapter: Option<A>,
    store: S,
    channel: Option<C>,
    business_records: Vec<BusinessRecord>,
    sheets_records: Vec<SheetsRecord>,
    index: Vec<IndexRecord>,
    fields: Vec<SearchableFields>,
    last_applied_config_hash: String,
    preview_listener: Option<ListenerHandle>,
    diagnostics: DiagnosticSink,
}

impl<A: TourAdapter, S: PersistentStore, C: BroadcastChannel> Engine<A, S, C> {
    /// `engine.create(config)` (§9). Loads the last saved config from
    /// persistent storage over the given defaults, if present.
    #[must_use]
    pub fn create(config: TourSearchConfig, store: S) -> Self {
        let config = store
            .get(keys::SAVED_CONFIG)
            .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok())
            .and_then(|patch| config.merge_patch(&patch).ok())
            .unwrap_or(config);

        Self {
            config,
            adapter: None,
            store,
            channel: None,
            business_records: Vec::new(),
            sheets_records: Vec::new(),
            index: Vec::new(),
            fields: Vec::new(),
            last_applied_config_hash: String::new(),
            preview_listener: None,
            diagnostics: DiagnosticSink::new(),
        }
    }

    /// Drains every [`Diagnostic`] collected since the last call (§2
    /// Diagnostics sink): classification fallbacks and filter rejections
    /// from the last [`Engine::load`]/[`Engine::update`] rebuild, plus any
    /// activation failures from [`Engine::activate`] since then.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }

    #[must_use]
    pub fn config(&self) -> &TourSearchConfig {
        &self.config
    }

    #[must_use]
    pub fn index(&self) -> &[IndexRecord] {
        &self.index
    }

    /// `engine.load(tour)` (§9): binds the tour adapter and external data,
    /// then runs the full D→E→F pipeline once (§5 ordering guarantees).
    pub fn load(&mut self, adapter: A, business_records: Vec<BusinessRecord>, sheets_records: Vec<SheetsRecord>) {
        self.adapter = Some(adapter);
        self.business_records = business_records;
        self.sheets_records = sheets_records;
        self.rebuild_index();
        self.last_applied_config_hash = self.config.config_hash();
    }

    /// Establishes the cross-window config-preview channel (§4.I, §6). The
    /// returned handle (already stored) is released on [`Engine::destroy`].
    pub fn bind_broadcast_channel(&mut self, channel: C)
    where
        C: Clone + 'static,
    {
        debug_assert_eq!(CHANNEL_NAME, "tourSearchChannel");
        self.channel = Some(channel);
    }

    fn rebuild_index(&mut self) {
        let Some(adapter) = &self.adapter else {
            tracing::warn!("engine: rebuild_index called before a tour was loaded");
            return;
        };
        let input = IndexBuildInput {
            config: &self.config,
            business_records: &self.business_records,
            sheets_records: &self.sheets_records,
        };
        self.index = build_index_with_diagnostics(adapter, &input, &mut self.diagnostics);
        self.fields = self.index.iter().map(SearchableFields::from_record).collect();
    }

    /// `engine.update(config)` (§9, §4.I): deep-merges the patch, gates on
    /// the config-hash idempotence law, and rebuilds the index only when the
    /// merged config actually changed.
    pub fn update(&mut self, patch: &serde_json::Value) -> Result<(), EngineError> {
        let merged = match self.config.merge_patch(patch) {
            Ok(m) => m,
            Err(err) => {
                tracing::warn!(error = %err, "engine: configuration update rejected, retaining previous config");
                return Err(err);
            }
        };

        let new_hash = merged.config_hash();
        if new_hash == self.last_applied_config_hash {
            return Ok(());
        }

        self.config = merged;
        self.store.set(keys::SAVED_CONFIG, &serde_json::to_string(&self.config).unwrap_or_default());
        self.rebuild_index();
        self.last_applied_config_hash = new_hash;
        self.store.set(keys::LAST_APPLIED_CONFIG_HASH, &self.last_applied_config_hash);
        Ok(())
    }

    /// Polls the live-preview config key (§4.I, §9 "live-config polling
    /// loop"). Returns `true` if a new config was applied. The 2 s interval
    /// itself is a host-scheduled timer, not modeled here.
    pub fn poll_live_config(&mut self) -> bool {
        let Some(raw) = self.store.get(keys::LIVE_CONFIG) else { return false };
        let Ok(patch) = serde_json::from_str::<serde_json::Value>(&raw) else { return false };
        let Ok(candidate) = self.config.merge_patch(&patch) else { return false };
        if candidate.config_hash() == self.last_applied_config_hash {
            return false;
        }
        self.update(&patch).is_ok()
    }

    /// Broadcasts a "config preview" message to other same-origin windows
    /// (§4.I, §6).
    pub fn broadcast_preview(&self, data: serde_json::Value, now_epoch_ms: u64) {
        if let Some(channel) = &self.channel {
            channel.post(&BroadcastMessage { r#type: "config preview".to_string(), data, timestamp: now_epoch_ms });
        }
    }

    /// `engine.query(term)` (§4.G).
    #[must_use]
    pub fn query(&self, term: &str) -> QueryOutcome {
        query_index(term, self.config.min_search_chars, &self.index, &self.fields, &self.config.search_settings, &|_| None)
    }

    /// `engine.activate(record)` (§4.H). Playlist selection happens
    /// synchronously here; anything with a delay is returned for the host to
    /// schedule (§5: "playlist selection is issued synchronously before any
    /// scheduled trigger-retry").
    pub fn activate(&mut self, record: &IndexRecord) -> ActivationOutcome {
        let Some(adapter) = &self.adapter else {
            tracing::warn!("engine: activate called before a tour was loaded");
            self.diagnostics.push(Diagnostic::activation_failure("activate called before a tour was loaded"));
            return ActivationOutcome::Failed;
        };

        match navigate::plan_activation(record, &self.config.element_triggering) {
            ActivationPlan::CameraShortcut { fragment } => ActivationOutcome::SetUrlFragment(fragment),
            ActivationPlan::SelectOnly { root, index } => {
                adapter.select_index(root, index);
                ActivationOutcome::Selected
            }
            ActivationPlan::SelectThenTrigger { root, select_index, trigger_id, delay_ms } => {
                adapter.select_index(root, select_index);
                ActivationOutcome::ScheduleTrigger { trigger_id, delay_ms, attempt: 0 }
            }
            ActivationPlan::StandaloneLookup => match navigate::resolve_standalone_target(adapter, record) {
                Some(handle) => {
                    adapter.trigger(handle);
                    ActivationOutcome::Triggered
                }
                None => {
                    tracing::warn!(id = ?record.id, "engine: standalone navigation target not found");
                    self.diagnostics.push(Diagnostic::activation_failure(format!("standalone navigation target not found for id {:?}", record.id)));
                    ActivationOutcome::Failed
                }
            },
            ActivationPlan::ToggleContainer { name } => {
                adapter.toggle_container(&name);
                ActivationOutcome::Toggled
            }
        }
    }

    /// Drives one step of trigger-with-retry (§4.H step 4) after the host's
    /// scheduled delay elapses. Returns the next outcome; `RetryLater` means
    /// the host should call this again after `delay_ms`.
    #[must_use]
    pub fn continue_trigger(&self, trigger_id: &str, attempt: u32) -> TriggerAttemptOutcome {
        let Some(adapter) = &self.adapter else {
            return TriggerAttemptOutcome::Failed { attempts: attempt };
        };
        navigate::attempt_trigger(adapter, trigger_id, attempt, &self.config.element_triggering)
    }

    /// `engine.destroy()` (§9): releases every held listener handle. Timers
    /// and the tour binding are dropped along with the adapter.
    pub fn destroy(&mut self) {
        self.preview_listener.take();
        self.channel = None;
        self.adapter = None;
        self.index.clear();
        self.fields.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::stub::StubAdapter;
    use crate::adapter::{MediaView, PlaylistItemView};
    use crate::broadcast::BroadcastChannel;
    use crate::storage::InMemoryStore;
    use std::cell::RefCell;

    #[derive(Default, Clone)]
    struct NullChannel;
    impl BroadcastChannel for NullChannel {
        fn post(&self, _message: &BroadcastMessage) {}
        fn subscribe(&self, _callback: Box<dyn FnMut(BroadcastMessage)>) -> ListenerHandle {
            ListenerHandle::new(Box::new(|| {}))
        }
    }

    fn stub_with_panoramas(labels: &[&str]) -> StubAdapter {
        let mut stub = StubAdapter::default();
        for (i, label) in labels.iter().enumerate() {
            stub.main_items.push(PlaylistItemView { handle: i as u64, class_name: "Panorama".into(), id: Some(format!("p{i}")) });
            stub.media.insert(i as u64, MediaView { id: Some(format!("p{i}")), label: Some((*label).to_string()), subtitle: None, tags: vec![] });
        }
        stub
    }

    #[test]
    fn create_then_load_builds_index() {
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), InMemoryStore::default());
        engine.load(stub_with_panoramas(&["Lobby", "Conference Room", "Rooftop"]), vec![], vec![]);
        assert_eq!(engine.index().len(), 3);
    }

    #[test]
    fn query_after_load_finds_expected_scenario_1_result() {
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), InMemoryStore::default());
        engine.load(stub_with_panoramas(&["Lobby", "Conference Room", "Rooftop"]), vec![], vec![]);
        match engine.query("room") {
            QueryOutcome::Results(groups) => {
                let total: usize = groups.iter().map(|g| g.hits.len()).sum();
                assert_eq!(total, 1);
                let hit = &groups[0].hits[0];
                assert_eq!(engine.index()[hit.record_index].label, "Conference Room");
                assert_eq!(engine.index()[hit.record_index].playlist_order, 1);
            }
            other => panic!("expected Results, got {other:?}"),
        }
    }

    #[test]
    fn update_is_noop_when_hash_unchanged() {
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), InMemoryStore::default());
        engine.load(stub_with_panoramas(&["Lobby"]), vec![], vec![]);
        let hash_before = engine.last_applied_config_hash.clone();
        engine.update(&serde_json::json!({})).unwrap();
        assert_eq!(engine.last_applied_config_hash, hash_before);
    }

    #[test]
    fn update_rebuilds_index_when_filter_changes() {
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), InMemoryStore::default());
        let mut stub = stub_with_panoramas(&["Lobby"]);
        stub.overlays.insert(0, vec![crate::adapter::OverlayView { handle: 50, class_name: Some("HotspotPanoramaOverlay".into()), label: Some("Button".into()), ..Default::default() }]);
        engine.load(stub, vec![], vec![]);
        assert_eq!(engine.index().len(), 2);

        engine
            .update(&serde_json::json!({ "filter": { "elementTypes": { "mode": "whitelist", "values": ["Panorama"] } } }))
            .unwrap();
        assert_eq!(engine.index().len(), 1);
    }

    #[test]
    fn invalid_update_is_rejected_and_index_unchanged() {
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), InMemoryStore::default());
        engine.load(stub_with_panoramas(&["Lobby"]), vec![], vec![]);
        let before = engine.index().len();
        let err = engine.update(&serde_json::json!({ "searchSettings": { "threshold": 9.0 } })).unwrap_err();
        assert_eq!(err.error_type(), "CONFIGURATION_ERROR");
        assert_eq!(engine.index().len(), before);
    }

    #[test]
    fn activate_panorama_selects_index_synchronously() {
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), InMemoryStore::default());
        engine.load(stub_with_panoramas(&["Lobby", "Gallery"]), vec![], vec![]);
        let record = engine.index()[1].clone();
        let outcome = engine.activate(&record);
        assert_eq!(outcome, ActivationOutcome::Selected);
        assert_eq!(engine.adapter.as_ref().unwrap().selected.borrow().as_slice(), &[(false, 1)]);
    }

    #[test]
    fn activate_camera_record_sets_url_fragment() {
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), InMemoryStore::default());
        engine.load(stub_with_panoramas(&["Lobby"]), vec![], vec![]);
        let mut record = engine.index()[0].clone();
        record.camera = Some(crate::record::Camera { yaw: 1.2, pitch: -0.3, fov: 70.0 });
        record.media_index = Some(4);
        match engine.activate(&record) {
            ActivationOutcome::SetUrlFragment(fragment) => {
                assert!(fragment.starts_with("media-index=4"));
                assert!(fragment.contains("yaw=1.2"));
            }
            other => panic!("expected SetUrlFragment, got {other:?}"),
        }
    }

    #[test]
    fn destroy_clears_index_and_adapter() {
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), InMemoryStore::default());
        engine.load(stub_with_panoramas(&["Lobby"]), vec![], vec![]);
        engine.destroy();
        assert!(engine.index().is_empty());
        assert!(matches!(engine.query("*"), QueryOutcome::Results(groups) if groups.is_empty()));
    }

    #[test]
    fn saved_config_is_loaded_from_persistent_store_on_create() {
        let store = InMemoryStore::default();
        store.set(keys::SAVED_CONFIG, &serde_json::to_string(&serde_json::json!({ "minSearchChars": 4 })).unwrap());
        let engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), store);
        assert_eq!(engine.config().min_search_chars, 4);
    }

    #[test]
    fn poll_live_config_applies_only_when_changed() {
        let store = InMemoryStore::default();
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), store);
        engine.load(stub_with_panoramas(&["Lobby"]), vec![], vec![]);
        assert!(!engine.poll_live_config());

        engine.store.set(keys::LIVE_CONFIG, &serde_json::to_string(&serde_json::json!({ "minSearchChars": 3 })).unwrap());
        assert!(engine.poll_live_config());
        assert_eq!(engine.config().min_search_chars, 3);
        assert!(!engine.poll_live_config());
    }

    #[test]
    fn take_diagnostics_reports_standalone_activation_failure() {
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), InMemoryStore::default());
        engine.load(stub_with_panoramas(&["Lobby"]), vec![], vec![]);
        assert!(engine.take_diagnostics().is_empty());

        let mut record = engine.index()[0].clone();
        record.is_standalone = true;
        record.id = Some("missing".to_string());
        record.label = "Nonexistent Kiosk".to_string();
        record.item = None;
        record.index = None;
        assert_eq!(engine.activate(&record), ActivationOutcome::Failed);

        let diagnostics = engine.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, crate::diagnostics::DiagnosticKind::ActivationFailure);
        assert!(engine.take_diagnostics().is_empty());
    }

    #[test]
    fn broadcast_preview_posts_on_bound_channel() {
        let counter = RefCell::new(0);
        let _ = &counter;
        let mut engine: Engine<StubAdapter, InMemoryStore, NullChannel> = Engine::create(TourSearchConfig::default(), InMemoryStore::default());
        engine.bind_broadcast_channel(NullChannel);
        engine.broadcast_preview(serde_json::json!({"a":1}), 123);
    }
}
