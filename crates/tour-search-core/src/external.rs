//! External Data Loader (§4.D): business JSON and spreadsheet CSV, with
//! progressive loading and same-origin caching left as capability traits so
//! the wasm crate can back them with `fetch`/`localStorage` while tests use
//! in-memory fakes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::GoogleSheetsConfig;
use crate::error::EngineError;
use crate::storage::PersistentStore;

/// A business JSON record (§6). Unknown fields are preserved via `extra`,
/// matching "unknown fields are preserved on the record".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub match_tags: Vec<String>,
    #[serde(default)]
    pub element_type: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub local_image: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A spreadsheet row (§6 CSV columns).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SheetsRecord {
    pub id: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub element_type: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// A lightweight projection of a [`SheetsRecord`] used for progressive
/// loading of datasets larger than
/// [`GoogleSheetsConfig::progressive_loading_row_threshold`] rows (§4.D).
#[derive(Debug, Clone)]
pub struct SheetsProjection {
    pub id: String,
    pub tag: String,
    pub name: String,
}

impl From<&SheetsRecord> for SheetsProjection {
    fn from(r: &SheetsRecord) -> Self {
        Self { id: r.id.clone(), tag: r.tag.clone(), name: r.name.clone() }
    }
}

/// Result of a CSV load: either the full set directly (small datasets), or a
/// lightweight projection now plus the promise of a full set to follow
/// (large datasets, §4.D).
#[derive(Debug, Clone)]
pub enum SheetsLoadResult {
    Full(Vec<SheetsRecord>),
    Progressive { projection: Vec<SheetsProjection>, full: Vec<SheetsRecord> },
}

impl SheetsLoadResult {
    #[must_use]
    pub fn full_records(&self) -> &[SheetsRecord] {
        match self {
            Self::Full(v) => v,
            Self::Progressive { full, .. } => full,
        }
    }
}

/// Converts a published Google Sheets URL into its CSV export form, per §4.D
/// ("auto-converted to `.../export?format=csv`"). Non-Sheets URLs pass
/// through unchanged so local/CDN CSV URLs keep working.
#[must_use]
pub fn to_csv_export_url(url: &str, api_key: Option<&str>) -> String {
    let base = if let Some(id_start) = url.find("/d/") {
        let after = &url[id_start + 3..];
        let id_end = after.find('/').unwrap_or(after.len());
        let sheet_id = &after[..id_end];
        format!("https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv")
    } else {
        url.to_string()
    };
    match api_key {
        Some(key) if !key.is_empty() => {
            let sep = if base.contains('?') { '&' } else { '?' };
            format!("{base}{sep}key={}", urlencoding::encode(key))
        }
        _ => base,
    }
}

/// Parses CSV text into sheets records, applying §4.D's recognized-column
/// mapping and skipping empty lines. A load failure here is reported by the
/// caller as [`EngineError::DataSourceLoadFailure`] and treated as an empty
/// source (§4.D, §7): the index still builds from tour data alone.
pub fn parse_csv(text: &str) -> Result<Vec<SheetsRecord>, EngineError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(text.as_bytes());
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_ascii_lowercase()).collect();
    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        if row.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let mut map: HashMap<&str, &str> = HashMap::new();
        for (header, value) in headers.iter().zip(row.iter()) {
            map.insert(header.as_str(), value);
        }
        let get = |keys: &[&str]| -> Option<String> {
            keys.iter().find_map(|k| map.get(k)).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };
        records.push(SheetsRecord {
            id: get(&["id"]).unwrap_or_default(),
            tag: get(&["tag"]).unwrap_or_default(),
            name: get(&["name"]).unwrap_or_default(),
            description: get(&["description"]).unwrap_or_default(),
            image_url: get(&["imageurl", "image"]),
            element_type: get(&["elementtype", "type"]),
            parent_id: get(&["parentid"]),
        });
    }
    Ok(records)
}

/// Builds a [`SheetsLoadResult`], applying the progressive-loading threshold
/// from config (§4.D).
#[must_use]
pub fn build_sheets_load_result(records: Vec<SheetsRecord>, cfg: &GoogleSheetsConfig) -> SheetsLoadResult {
    if records.len() > cfg.progressive_loading_row_threshold {
        let projection = records.iter().map(SheetsProjection::from).collect();
        SheetsLoadResult::Progressive { projection, full: records }
    } else {
        SheetsLoadResult::Full(records)
    }
}

const CACHE_KEY: &str = "tourGoogleSheetsData";
const CACHE_TIMESTAMP_KEY: &str = "tourGoogleSheetsData_timestamp";

/// Reads a cached sheets payload from persistent storage if present and not
/// expired (§4.D, §6 persistent-storage keys).
pub fn read_cache(store: &dyn PersistentStore, cfg: &GoogleSheetsConfig, now_epoch_ms: u64) -> Option<Vec<SheetsRecord>> {
    if !cfg.enable_cache {
        return None;
    }
    let cached = store.get(CACHE_KEY)?;
    let timestamp: u64 = store.get(CACHE_TIMESTAMP_KEY)?.parse().ok()?;
    let expiry_ms = cfg.cache_minutes.saturating_mul(60_000);
    if now_epoch_ms.saturating_sub(timestamp) > expiry_ms {
        return None;
    }
    serde_json::from_str(&cached).ok()
}

/// Writes a sheets payload to persistent storage with the current timestamp.
pub fn write_cache(store: &dyn PersistentStore, records: &[SheetsRecord], now_epoch_ms: u64) {
    if let Ok(json) = serde_json::to_string(records) {
        store.set(CACHE_KEY, &json);
        store.set(CACHE_TIMESTAMP_KEY, &now_epoch_ms.to_string());
    }
}
