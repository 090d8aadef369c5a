//! The `wasm-bindgen` class the host page actually imports, wiring
//! [`crate::adapter::JsTourAdapter`], [`crate::storage::LocalStoragePersistentStore`],
//! [`crate::broadcast::WebBroadcastChannel`], and [`crate::scheduler::WindowScheduler`]
//! into one `tour_search_core::Engine`.

use std::cell::RefCell;
use std::rc::Rc;

use tour_search_core::external::{self, SheetsLoadResult, SheetsProjection};
use tour_search_core::{
    ActivationOutcome, BusinessRecord, Engine, ListenerHandle, QueryOutcome, Scheduler, SheetsRecord, TimerHandle, TourSearchConfig,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::console;

use crate::adapter::JsTourAdapter;
use crate::broadcast::WebBroadcastChannel;
use crate::scheduler::WindowScheduler;
use crate::storage::LocalStoragePersistentStore;

type CoreEngine = Engine<JsTourAdapter, LocalStoragePersistentStore, WebBroadcastChannel>;

/// Delay between the initial lightweight sheets projection and the full
/// record set replacing it (§4.D, §5: "progressive-loading background 2 s").
const PROGRESSIVE_LOADING_DELAY_MS: u64 = 2_000;

/// Call once before constructing any [`TourSearchEngine`].
#[wasm_bindgen(start)]
pub fn wasm_init() {
    #[cfg(feature = "console-panic")]
    console_error_panic_hook::set_once();
    console::log_1(&"tour-search-wasm initialized".into());
}

/// Everything the `TourSearchEngine` wrapper mutates, held behind one
/// `Rc<RefCell<_>>` so async loader methods can borrow it fresh on each side
/// of an `.await` instead of holding a `&mut self` borrow across a
/// suspension point (unsound for a wasm-bindgen-exported class, since a
/// re-entrant call could observe the same object mid-await).
struct Inner {
    engine: CoreEngine,
    business_records: Vec<BusinessRecord>,
    sheets_records: Vec<SheetsRecord>,
    preview_listener: Option<ListenerHandle>,
    live_config_timer: Option<TimerHandle>,
    progressive_timer: Option<TimerHandle>,
}

impl Inner {
    fn rebuild(&mut self, tour: &JsValue) {
        let adapter = JsTourAdapter::new(tour.clone());
        self.engine.load(adapter, self.business_records.clone(), self.sheets_records.clone());
    }
}

/// Browser-facing handle around the search engine. One instance per tour
/// page load.
///
/// # Example
///
/// ```javascript
/// const engine = new TourSearchEngine(tour);
/// engine.load([], []);
/// const results = engine.query("lobby");
/// ```
#[wasm_bindgen]
pub struct TourSearchEngine {
    tour: JsValue,
    inner: Rc<RefCell<Inner>>,
    scheduler: WindowScheduler,
}

#[wasm_bindgen]
impl TourSearchEngine {
    /// Binds the engine to a live tour object and builds the initial index.
    /// `business_json`/`sheets_json` are JSON arrays matching the business
    /// directory and spreadsheet record shapes; pass `undefined`/`null` for
    /// either when that source isn't configured.
    #[wasm_bindgen(constructor)]
    pub fn new(tour: JsValue, business_json: JsValue, sheets_json: JsValue) -> Result<TourSearchEngine, JsValue> {
        let business_records = parse_optional::<BusinessRecord>(business_json, "business records")?;
        let sheets_records = parse_optional::<SheetsRecord>(sheets_json, "sheets records")?;

        let store = LocalStoragePersistentStore::new();
        let mut engine = CoreEngine::create(TourSearchConfig::default(), store);

        if let Some(channel) = WebBroadcastChannel::open() {
            engine.bind_broadcast_channel(channel);
        } else {
            tracing::warn!("tour-search-wasm: BroadcastChannel unavailable, config preview disabled");
        }

        let adapter = JsTourAdapter::new(tour.clone());
        engine.load(adapter, business_records.clone(), sheets_records.clone());

        Ok(Self {
            tour,
            inner: Rc::new(RefCell::new(Inner {
                engine,
                business_records,
                sheets_records,
                preview_listener: None,
                live_config_timer: None,
                progressive_timer: None,
            })),
            scheduler: WindowScheduler::new(),
        })
    }

    /// Rebuilds the index against the same tour with fresh external data
    /// (e.g. after the business directory or spreadsheet cache refreshes).
    #[wasm_bindgen(js_name = reload)]
    pub fn reload(&self, business_json: JsValue, sheets_json: JsValue) -> Result<(), JsValue> {
        let business_records = parse_optional::<BusinessRecord>(business_json, "business records")?;
        let sheets_records = parse_optional::<SheetsRecord>(sheets_json, "sheets records")?;
        let mut inner = self.inner.borrow_mut();
        inner.business_records = business_records;
        inner.sheets_records = sheets_records;
        inner.rebuild(&self.tour);
        Ok(())
    }

    /// Fetches the business JSON catalog from `url` and rebuilds the index
    /// (§4.D). A fetch or parse failure is reported and treated as an empty
    /// source rather than aborting the build (§7 `DataSourceLoadFailure`).
    #[wasm_bindgen(js_name = loadBusinessData)]
    pub async fn load_business_data(&self, url: String) -> Result<(), JsValue> {
        let records = match fetch_text(&url).await.and_then(|text| serde_json::from_str::<Vec<BusinessRecord>>(&text).map_err(|e| e.to_string())) {
            Ok(records) => records,
            Err(message) => {
                tracing::warn!(url = %url, error = %message, "tour-search-wasm: business data load failed, indexing tour data alone");
                Vec::new()
            }
        };

        let mut inner = self.inner.borrow_mut();
        inner.business_records = records;
        inner.rebuild(&self.tour);
        Ok(())
    }

    /// Fetches the spreadsheet CSV from `url` (a published Google Sheets
    /// link, auto-converted to its CSV export form, or any other CSV URL)
    /// and rebuilds the index (§4.D). Serves a fresh cache entry immediately
    /// when present, then refreshes from the network; datasets above the
    /// progressive-loading threshold show a lightweight id/tag/name
    /// projection immediately and are replaced by the full record set after
    /// a short delay.
    #[wasm_bindgen(js_name = loadSheetsData)]
    pub async fn load_sheets_data(&self, url: String) -> Result<(), JsValue> {
        let cfg = self.inner.borrow().engine.config().google_sheets.clone();
        if !cfg.use_google_sheet_data {
            return Ok(());
        }

        let export_url = external::to_csv_export_url(&url, cfg.api_key.as_deref());
        let store = LocalStoragePersistentStore::new();
        let now = js_sys::Date::now() as u64;

        if let Some(cached) = external::read_cache(&store, &cfg, now) {
            let mut inner = self.inner.borrow_mut();
            inner.sheets_records = cached;
            inner.rebuild(&self.tour);
        }

        let text = match fetch_text(&export_url).await {
            Ok(text) => text,
            Err(message) => {
                tracing::warn!(url = %export_url, error = %message, "tour-search-wasm: sheets CSV fetch failed, keeping cached sheets data");
                return Ok(());
            }
        };

        let records = match external::parse_csv(&text) {
            Ok(records) => records,
            Err(err) => {
                tracing::warn!(url = %export_url, error = %err, "tour-search-wasm: sheets CSV parse failed, keeping cached sheets data");
                return Ok(());
            }
        };

        external::write_cache(&store, &records, now);

        match external::build_sheets_load_result(records, &cfg) {
            SheetsLoadResult::Full(full) => {
                let mut inner = self.inner.borrow_mut();
                inner.sheets_records = full;
                inner.rebuild(&self.tour);
            }
            SheetsLoadResult::Progressive { projection, full } => {
                {
                    let mut inner = self.inner.borrow_mut();
                    inner.sheets_records = projection.iter().map(projection_to_stub_record).collect();
                    inner.rebuild(&self.tour);
                }

                let inner = Rc::clone(&self.inner);
                let tour = self.tour.clone();
                let timer = self.scheduler.after(
                    PROGRESSIVE_LOADING_DELAY_MS,
                    Box::new(move || {
                        let mut inner = inner.borrow_mut();
                        inner.sheets_records = full;
                        inner.rebuild(&tour);
                    }),
                );
                self.inner.borrow_mut().progressive_timer = Some(timer);
            }
        }
        Ok(())
    }

    /// Runs a query and returns `{ kind, minChars?, groups? }` as a plain JS
    /// object (§4.G result kinds).
    #[wasm_bindgen]
    pub fn query(&self, term: &str) -> Result<JsValue, JsValue> {
        let inner = self.inner.borrow();
        let engine = &inner.engine;
        let payload = match engine.query(term) {
            QueryOutcome::Empty => serde_json::json!({ "kind": "empty" }),
            QueryOutcome::TooShort { min_chars } => serde_json::json!({ "kind": "tooShort", "minChars": min_chars }),
            QueryOutcome::Results(groups) => {
                let index = engine.index();
                let groups: Vec<_> = groups
                    .iter()
                    .map(|group| {
                        let hits: Vec<_> = group
                            .hits
                            .iter()
                            .map(|hit| serde_json::json!({ "record": index[hit.record_index], "score": hit.score }))
                            .collect();
                        serde_json::json!({ "groupKey": group.group_key, "hits": hits })
                    })
                    .collect();
                serde_json::json!({ "kind": "results", "groups": groups })
            }
        };
        serde_wasm_bindgen::to_value(&payload).map_err(|e| JsValue::from_str(&format!("serialize error: {e}")))
    }

    /// The full current index, for a host page that wants to render its own
    /// result list or run its own query.
    #[wasm_bindgen(getter)]
    pub fn index(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.borrow().engine.index()).map_err(|e| JsValue::from_str(&format!("serialize error: {e}")))
    }

    /// Applies a configuration patch (§4.I). Rejects and leaves the previous
    /// config in place if the merged result fails validation.
    #[wasm_bindgen]
    pub fn update(&self, patch_json: JsValue) -> Result<(), JsValue> {
        let patch: serde_json::Value =
            serde_wasm_bindgen::from_value(patch_json).map_err(|e| JsValue::from_str(&format!("invalid config patch: {e}")))?;
        self.inner.borrow_mut().engine.update(&patch).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Activates a record returned by [`TourSearchEngine::query`]. Returns a
    /// `{ kind, ... }` object describing what the host must do next (§4.H) —
    /// a `scheduleTrigger` kind means the host must call
    /// [`TourSearchEngine::continue_trigger`] after `delayMs`.
    #[wasm_bindgen]
    pub fn activate(&self, record_json: JsValue) -> Result<JsValue, JsValue> {
        let record: tour_search_core::IndexRecord =
            serde_wasm_bindgen::from_value(record_json).map_err(|e| JsValue::from_str(&format!("invalid record: {e}")))?;
        let outcome = self.inner.borrow_mut().engine.activate(&record);
        let payload = match outcome {
            ActivationOutcome::SetUrlFragment(fragment) => {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().set_hash(&fragment);
                }
                serde_json::json!({ "kind": "setUrlFragment", "fragment": fragment })
            }
            ActivationOutcome::Selected => serde_json::json!({ "kind": "selected" }),
            ActivationOutcome::ScheduleTrigger { trigger_id, delay_ms, attempt } => {
                serde_json::json!({ "kind": "scheduleTrigger", "triggerId": trigger_id, "delayMs": delay_ms, "attempt": attempt })
            }
            ActivationOutcome::Triggered => serde_json::json!({ "kind": "triggered" }),
            ActivationOutcome::Failed => serde_json::json!({ "kind": "failed" }),
            ActivationOutcome::Toggled => serde_json::json!({ "kind": "toggled" }),
        };
        serde_wasm_bindgen::to_value(&payload).map_err(|e| JsValue::from_str(&format!("serialize error: {e}")))
    }

    /// Continues a trigger-with-retry sequence (§4.H step 4) after the host's
    /// scheduled delay elapses.
    #[wasm_bindgen]
    pub fn continue_trigger(&self, trigger_id: &str, attempt: u32) -> Result<JsValue, JsValue> {
        let outcome = self.inner.borrow().engine.continue_trigger(trigger_id, attempt);
        serde_wasm_bindgen::to_value(&outcome).map_err(|e| JsValue::from_str(&format!("serialize error: {e}")))
    }

    /// Starts the 2 s live-config poll (§4.I). Safe to call once per
    /// instance; a second call cancels and replaces the previous timer.
    #[wasm_bindgen(js_name = startLiveConfigPolling)]
    pub fn start_live_config_polling(&self) {
        let inner = Rc::clone(&self.inner);
        let timer = self.scheduler.every(
            2_000,
            Box::new(move || {
                inner.borrow_mut().engine.poll_live_config();
            }),
        );
        self.inner.borrow_mut().live_config_timer = Some(timer);
    }

    /// Drains diagnostics accumulated since the last call (classification
    /// fallbacks, filter rejections, activation failures).
    #[wasm_bindgen(js_name = takeDiagnostics)]
    pub fn take_diagnostics(&self) -> Result<JsValue, JsValue> {
        let diagnostics = self.inner.borrow_mut().engine.take_diagnostics();
        serde_wasm_bindgen::to_value(&DiagnosticsPayload::from(diagnostics))
            .map_err(|e| JsValue::from_str(&format!("serialize error: {e}")))
    }

    /// Releases every held listener and timer. The host must call this
    /// before dropping the JS reference to avoid a dangling interval.
    #[wasm_bindgen]
    pub fn destroy(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.preview_listener.take();
        inner.live_config_timer.take();
        inner.progressive_timer.take();
        inner.engine.destroy();
    }
}

/// A JSON-shaped mirror of `Diagnostic`, since the core type intentionally
/// carries no `Serialize` impl (it is an in-process sink, not a wire type).
#[derive(serde::Serialize)]
struct DiagnosticsPayload {
    diagnostics: Vec<DiagnosticJson>,
}

#[derive(serde::Serialize)]
struct DiagnosticJson {
    kind: &'static str,
    stage: &'static str,
    message: String,
}

impl From<Vec<tour_search_core::Diagnostic>> for DiagnosticsPayload {
    fn from(diagnostics: Vec<tour_search_core::Diagnostic>) -> Self {
        Self {
            diagnostics: diagnostics
                .into_iter()
                .map(|d| DiagnosticJson {
                    kind: match d.kind {
                        tour_search_core::DiagnosticKind::UnknownElementType => "unknownElementType",
                        tour_search_core::DiagnosticKind::FilterRejection => "filterRejection",
                        tour_search_core::DiagnosticKind::ReconciliationAmbiguity => "reconciliationAmbiguity",
                        tour_search_core::DiagnosticKind::ActivationFailure => "activationFailure",
                    },
                    stage: d.stage,
                    message: d.message,
                })
                .collect(),
        }
    }
}

#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Deserializes a JSON array that may legitimately be absent (`undefined`/
/// `null`), treating absence as an empty list rather than an error.
fn parse_optional<T: serde::de::DeserializeOwned>(value: JsValue, what: &str) -> Result<Vec<T>, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(Vec::new());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&format!("invalid {what}: {e}")))
}

/// `window.fetch(url)` followed by `response.text()`, both awaited through
/// `wasm-bindgen-futures` (§4.D business JSON / CSV fetch; §6). Any failure
/// collapses to a single string the caller logs and treats as
/// `DataSourceLoadFailure` (§7): the index still builds from tour data
/// alone.
async fn fetch_text(url: &str) -> Result<String, String> {
    let window = web_sys::window().ok_or_else(|| "no window global available".to_string())?;
    let response_value =
        wasm_bindgen_futures::JsFuture::from(window.fetch_with_str(url)).await.map_err(|e| js_to_string(&e))?;
    let response: web_sys::Response = response_value.dyn_into().map_err(|_| "fetch did not resolve to a Response".to_string())?;
    if !response.ok() {
        return Err(format!("http status {}", response.status()));
    }
    let text_promise = response.text().map_err(|e| js_to_string(&e))?;
    let text_value = wasm_bindgen_futures::JsFuture::from(text_promise).await.map_err(|e| js_to_string(&e))?;
    Ok(text_value.as_string().unwrap_or_default())
}

fn js_to_string(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

/// Converts a progressive-loading projection row into the minimal
/// `SheetsRecord` the index can build from immediately; the full record
/// replaces it after `PROGRESSIVE_LOADING_DELAY_MS` (§4.D).
fn projection_to_stub_record(projection: &SheetsProjection) -> SheetsRecord {
    SheetsRecord { id: projection.id.clone(), tag: projection.tag.clone(), name: projection.name.clone(), ..SheetsRecord::default() }
}
