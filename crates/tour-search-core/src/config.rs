//! Configuration Core (§4.I): a tagged, validated configuration record
//! replacing the source's deeply-nested dynamically-typed object (§9 design
//! note). Updates are deep-merged over [`TourSearchConfig::default()`];
//! arrays are replaced wholesale, then normalized (trim, drop empty, dedupe)
//! per §4.I.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::EngineError;
use crate::taxonomy::ElementType;

/// `filter.mode` / `filter.elementTypes.mode` / etc: whether a filter stage
/// is inert, an allow-list, or a block-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    None,
    Whitelist,
    Blacklist,
}

/// String match mode for the top-level value filter (§4.C stage 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueMatchMode {
    Exact,
    Contains,
    StartsWith,
    Regex,
}

/// Resolved scope for the §4.C stage 2 value filter (second Open Question in
/// §9, made explicit here rather than left to subtitle-vs-label guesswork).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ValueFilterScope {
    #[default]
    LabelOnly,
    LabelAndSubtitle,
}

/// The top-level value filter (§4.C stage 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueFilterConfig {
    #[serde(default)]
    pub mode: FilterMode,
    #[serde(default)]
    pub match_mode: Option<ValueMatchMode>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub scope: ValueFilterScope,
}

impl ValueFilterConfig {
    /// Whitelist default mode is `exact`; blacklist default is `contains`
    /// (§4.C stage 2).
    #[must_use]
    pub fn effective_match_mode(&self) -> ValueMatchMode {
        self.match_mode.unwrap_or(match self.mode {
            FilterMode::Whitelist => ValueMatchMode::Exact,
            _ => ValueMatchMode::Contains,
        })
    }
}

impl Default for ValueFilterConfig {
    fn default() -> Self {
        Self { mode: FilterMode::None, match_mode: None, values: Vec::new(), scope: ValueFilterScope::default() }
    }
}

/// A plain allow/block-list filter keyed by a simple `mode` (element types,
/// labels, tags, media indexes).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SetFilterConfig {
    #[serde(default)]
    pub mode: FilterMode,
    #[serde(default)]
    pub values: Vec<String>,
}

/// `filter.*` group (§4.C).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    #[serde(default)]
    pub mode: FilterMode,
    #[serde(default)]
    pub value: ValueFilterConfig,
    #[serde(default)]
    pub element_types: SetFilterConfig,
    #[serde(default)]
    pub element_labels: SetFilterConfig,
    #[serde(default)]
    pub tag_filtering: SetFilterConfig,
    #[serde(default)]
    pub media_indexes: SetFilterConfig,
    #[serde(default)]
    pub skip_empty_labels: bool,
    #[serde(default)]
    pub min_label_length: usize,
    #[serde(default)]
    pub completely_blank: bool,
    #[serde(default)]
    pub unlabeled_with_subtitles: bool,
    #[serde(default)]
    pub unlabeled_with_tags: bool,
    /// Supplemented per SPEC_FULL.md §2 (third Open Question): whether a
    /// filtered-out parent panorama suppresses its own children too.
    #[serde(default)]
    pub cascade_parent_rejection: bool,
}

/// `includeContent.elements.include<Type>` toggles (§4.C stage 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludeContentConfig {
    pub include_panorama: bool,
    pub include_hotspot: bool,
    pub include_polygon: bool,
    pub include_video: bool,
    pub include_webframe: bool,
    pub include_image: bool,
    pub include_text: bool,
    pub include_projected_image: bool,
    pub include_element: bool,
    pub include_business: bool,
    pub include_3d_hotspot: bool,
    pub include_3d_model: bool,
    pub include_3d_model_object: bool,
    pub include_container: bool,
    /// Configuration escape hatch named in §4.A: downgrades an unknown class
    /// to exclusion instead of `Element`.
    pub include_unknown_types: bool,
}

impl Default for IncludeContentConfig {
    fn default() -> Self {
        Self {
            include_panorama: true,
            include_hotspot: true,
            include_polygon: true,
            include_video: true,
            include_webframe: true,
            include_image: true,
            include_text: true,
            include_projected_image: true,
            include_element: true,
            include_business: true,
            include_3d_hotspot: true,
            include_3d_model: true,
            include_3d_model_object: true,
            include_container: true,
            include_unknown_types: true,
        }
    }
}

impl IncludeContentConfig {
    #[must_use]
    pub const fn allows(&self, t: ElementType) -> bool {
        match t {
            ElementType::Panorama => self.include_panorama,
            ElementType::Hotspot => self.include_hotspot,
            ElementType::Polygon => self.include_polygon,
            ElementType::Video => self.include_video,
            ElementType::Webframe => self.include_webframe,
            ElementType::Image => self.include_image,
            ElementType::Text => self.include_text,
            ElementType::ProjectedImage => self.include_projected_image,
            ElementType::Element => self.include_element,
            ElementType::Business => self.include_business,
            ElementType::ThreeDHotspot => self.include_3d_hotspot,
            ElementType::ThreeDModel => self.include_3d_model,
            ElementType::ThreeDModelObject => self.include_3d_model_object,
            ElementType::Container => self.include_container,
        }
    }
}

/// `useAsLabel.*` (§4.B rules 3-5).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UseAsLabelConfig {
    pub subtitles: bool,
    pub tags: bool,
    pub element_type: bool,
}

/// `displayLabels.*`: the label resolver's top-level switch plus its
/// fallback text (§4.B rules 1 and 6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayLabelsConfig {
    #[serde(default)]
    pub only_subtitles: bool,
    #[serde(default = "default_custom_text")]
    pub custom_text: String,
}

fn default_custom_text() -> String {
    "[Unnamed Item]".to_string()
}

impl Default for DisplayLabelsConfig {
    fn default() -> Self {
        Self { only_subtitles: false, custom_text: default_custom_text() }
    }
}

/// `searchSettings.*`: Fuse.js-style matcher parameters and field weights
/// (§4.G).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettingsConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_distance")]
    pub distance: usize,
    #[serde(default = "default_min_match_char_length")]
    pub min_match_char_length: usize,
    #[serde(default)]
    pub ignore_location: bool,
    #[serde(default)]
    pub location: usize,
    #[serde(default)]
    pub use_extended_search: bool,
    #[serde(default = "default_true")]
    pub include_score: bool,
    #[serde(default)]
    pub field_weights: FieldWeights,
}

fn default_threshold() -> f64 {
    0.4
}
fn default_distance() -> usize {
    100
}
fn default_min_match_char_length() -> usize {
    1
}
const fn default_true() -> bool {
    true
}

impl Default for SearchSettingsConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            distance: default_distance(),
            min_match_char_length: default_min_match_char_length(),
            ignore_location: false,
            location: 0,
            use_extended_search: false,
            include_score: true,
            field_weights: FieldWeights::default(),
        }
    }
}

/// Field boost weights for the fuzzy matcher (§4.G defaults).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldWeights {
    pub label: f64,
    pub business_name: f64,
    pub subtitle: f64,
    pub business_tag: f64,
    pub tags: f64,
    pub parent_label: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self { label: 1.0, business_name: 0.9, subtitle: 0.8, business_tag: 1.0, tags: 0.6, parent_label: 0.3 }
    }
}

/// `businessData.*` (§4.D).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDataConfig {
    #[serde(default)]
    pub use_business_data: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub replace_tour_data: bool,
    #[serde(default)]
    pub element_type: Option<ElementType>,
}

/// `googleSheets.*` (§4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSheetsConfig {
    #[serde(default)]
    pub use_google_sheet_data: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub local_file: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub include_standalone_entries: bool,
    #[serde(default = "default_cache_minutes")]
    pub cache_minutes: u64,
    #[serde(default = "default_true")]
    pub enable_cache: bool,
    #[serde(default = "default_progressive_threshold")]
    pub progressive_loading_row_threshold: usize,
}

fn default_cache_minutes() -> u64 {
    60
}
const fn default_progressive_threshold() -> usize {
    20
}

impl Default for GoogleSheetsConfig {
    fn default() -> Self {
        Self {
            use_google_sheet_data: false,
            url: None,
            local_file: None,
            api_key: None,
            include_standalone_entries: false,
            cache_minutes: default_cache_minutes(),
            enable_cache: true,
            progressive_loading_row_threshold: default_progressive_threshold(),
        }
    }
}

/// Resolution of the first §9 Open Question: which external source, if any,
/// is active for a given build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveExternalSource {
    None,
    Business,
    Sheets,
}

/// `elementTriggering.*`: timing for the trigger-with-retry state machine
/// (§4.H step 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementTriggeringConfig {
    #[serde(default = "default_base_retry_ms")]
    pub base_retry_interval_ms: u64,
    #[serde(default = "default_retry_factor")]
    pub retry_backoff_factor: f64,
    #[serde(default = "default_max_retry_interval_ms")]
    pub max_retry_interval_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_child_trigger_delay_ms")]
    pub child_trigger_delay_ms: u64,
    #[serde(default = "default_shallow_trigger_delay_ms")]
    pub shallow_trigger_delay_ms: u64,
}

fn default_base_retry_ms() -> u64 {
    300
}
fn default_retry_factor() -> f64 {
    1.5
}
fn default_max_retry_interval_ms() -> u64 {
    5_000
}
const fn default_max_retries() -> u32 {
    6
}
fn default_child_trigger_delay_ms() -> u64 {
    500
}
fn default_shallow_trigger_delay_ms() -> u64 {
    300
}

impl Default for ElementTriggeringConfig {
    fn default() -> Self {
        Self {
            base_retry_interval_ms: default_base_retry_ms(),
            retry_backoff_factor: default_retry_factor(),
            max_retry_interval_ms: default_max_retry_interval_ms(),
            max_retries: default_max_retries(),
            child_trigger_delay_ms: default_child_trigger_delay_ms(),
            shallow_trigger_delay_ms: default_shallow_trigger_delay_ms(),
        }
    }
}

/// `appearance.*`, `display.*`, `thumbnailSettings.*`, `animations.*`,
/// `searchBar.*`: out-of-scope presentation knobs (§1 Non-goals exclude the
/// widget itself), kept as opaque passthrough JSON so a host page can still
/// read/write them through the same config object without this crate
/// interpreting their contents.
pub type PassthroughSection = serde_json::Map<String, serde_json::Value>;

/// Full merged configuration (§4.I).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourSearchConfig {
    #[serde(default = "default_true")]
    pub auto_hide: bool,
    #[serde(default = "default_mobile_breakpoint")]
    pub mobile_breakpoint: u32,
    #[serde(default = "default_min_search_chars")]
    pub min_search_chars: usize,
    #[serde(default)]
    pub element_triggering: ElementTriggeringConfig,
    #[serde(default)]
    pub search_bar: PassthroughSection,
    #[serde(default)]
    pub appearance: PassthroughSection,
    #[serde(default)]
    pub display: PassthroughSection,
    #[serde(default)]
    pub display_labels: DisplayLabelsConfig,
    #[serde(default)]
    pub use_as_label: UseAsLabelConfig,
    #[serde(default)]
    pub include_content: IncludeContentConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub thumbnail_settings: PassthroughSection,
    #[serde(default)]
    pub animations: PassthroughSection,
    #[serde(default)]
    pub search_settings: SearchSettingsConfig,
    #[serde(default)]
    pub business_data: BusinessDataConfig,
    #[serde(default)]
    pub google_sheets: GoogleSheetsConfig,
    /// Named containers to synthesize `Container` records for (§4.F, "after
    /// all tour items, append ... optional Container records").
    #[serde(default)]
    pub container_names: Vec<String>,
}

fn default_mobile_breakpoint() -> u32 {
    768
}
const fn default_min_search_chars() -> usize {
    2
}

impl Default for TourSearchConfig {
    fn default() -> Self {
        Self {
            auto_hide: true,
            mobile_breakpoint: default_mobile_breakpoint(),
            min_search_chars: default_min_search_chars(),
            element_triggering: ElementTriggeringConfig::default(),
            search_bar: PassthroughSection::default(),
            appearance: PassthroughSection::default(),
            display: PassthroughSection::default(),
            display_labels: DisplayLabelsConfig::default(),
            use_as_label: UseAsLabelConfig::default(),
            include_content: IncludeContentConfig::default(),
            filter: FilterConfig::default(),
            thumbnail_settings: PassthroughSection::default(),
            animations: PassthroughSection::default(),
            search_settings: SearchSettingsConfig::default(),
            business_data: BusinessDataConfig::default(),
            google_sheets: GoogleSheetsConfig::default(),
            container_names: Vec::new(),
        }
    }
}

impl TourSearchConfig {
    /// Deep-merges `patch` over `self`: arrays are replaced wholesale (never
    /// merged element-wise), objects are merged key by key, scalars are
    /// overwritten. Then validates and normalizes filter arrays (§4.I).
    pub fn merge_patch(&self, patch: &serde_json::Value) -> Result<Self, EngineError> {
        let base = serde_json::to_value(self).map_err(EngineError::from)?;
        let merged_json = deep_merge(base, patch.clone());
        let mut merged: Self = serde_json::from_value(merged_json).map_err(|e| EngineError::Configuration {
            path: "<root>".to_string(),
            reason: e.to_string(),
        })?;
        merged.normalize_filter_arrays();
        merged.validate()?;
        Ok(merged)
    }

    fn normalize_filter_arrays(&mut self) {
        normalize_list(&mut self.filter.value.values);
        normalize_list(&mut self.filter.element_types.values);
        normalize_list(&mut self.filter.element_labels.values);
        normalize_list(&mut self.filter.tag_filtering.values);
        normalize_list(&mut self.filter.media_indexes.values);
        normalize_list(&mut self.container_names);
    }

    /// Validates invariants this crate can check statically: thresholds in
    /// range, `minSearchChars` sane, exactly-one-active-source is consistent
    /// (§8 invariant 5, §2 "Supplemented features").
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(0.0..=1.0).contains(&self.search_settings.threshold) {
            return Err(EngineError::Configuration {
                path: "searchSettings.threshold".to_string(),
                reason: "must be within 0.0..=1.0".to_string(),
            });
        }
        if self.min_search_chars == 0 {
            return Err(EngineError::Configuration {
                path: "minSearchChars".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        self.active_external_source()?;
        Ok(())
    }

    /// Resolution of the first §9 Open Question: Business Data wins over
    /// Sheets when both are enabled (§4.D preamble); this method makes that
    /// precedence an explicit, queryable fact rather than an emergent effect
    /// of two independent booleans.
    pub fn active_external_source(&self) -> Result<ActiveExternalSource, EngineError> {
        let business = self.business_data.use_business_data;
        let sheets = self.google_sheets.use_google_sheet_data;
        Ok(match (business, sheets) {
            (true, _) => ActiveExternalSource::Business,
            (false, true) => ActiveExternalSource::Sheets,
            (false, false) => ActiveExternalSource::None,
        })
    }

    /// SHA-256 hash of the canonical JSON encoding, used by the live-config
    /// poller's idempotence gate (§4.I, §8 round-trip law).
    #[must_use]
    pub fn config_hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        hex::encode(hasher.finalize())
    }
}

fn normalize_list(values: &mut Vec<String>) {
    let mut seen = HashSet::new();
    values.retain_mut(|v| {
        let trimmed = v.trim().to_string();
        *v = trimmed;
        !v.is_empty() && seen.insert(v.clone())
    });
}

fn deep_merge(base: serde_json::Value, patch: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match (base, patch) {
        (Value::Object(mut base_map), Value::Object(patch_map)) => {
            for (k, v) in patch_map {
                let merged = match base_map.remove(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => v,
                };
                base_map.insert(k, merged);
            }
            Value::Object(base_map)
        }
        (_, patch_value) => patch_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(TourSearchConfig::default().validate().is_ok());
    }

    #[test]
    fn merge_patch_replaces_arrays_wholesale() {
        let base = TourSearchConfig::default();
        let patch = serde_json::json!({
            "filter": { "elementTypes": { "mode": "whitelist", "values": ["Panorama", "Panorama", " ", "Hotspot"] } }
        });
        let merged = base.merge_patch(&patch).unwrap();
        assert_eq!(merged.filter.element_types.mode, FilterMode::Whitelist);
        assert_eq!(merged.filter.element_types.values, vec!["Panorama".to_string(), "Hotspot".to_string()]);
    }

    #[test]
    fn merge_patch_is_deep_not_shallow() {
        let base = TourSearchConfig::default();
        let patch = serde_json::json!({ "filter": { "skipEmptyLabels": true } });
        let merged = base.merge_patch(&patch).unwrap();
        assert!(merged.filter.skip_empty_labels);
        assert_eq!(merged.min_search_chars, base.min_search_chars);
    }

    #[test]
    fn invalid_threshold_is_rejected_and_previous_config_unaffected() {
        let base = TourSearchConfig::default();
        let patch = serde_json::json!({ "searchSettings": { "threshold": 5.0 } });
        let err = base.merge_patch(&patch).unwrap_err();
        assert_eq!(err.error_type(), "CONFIGURATION_ERROR");
        assert_eq!(base.search_settings.threshold, 0.4);
    }

    #[test]
    fn business_data_wins_invariant_5() {
        let mut config = TourSearchConfig::default();
        config.business_data.use_business_data = true;
        config.google_sheets.use_google_sheet_data = true;
        assert_eq!(config.active_external_source().unwrap(), ActiveExternalSource::Business);
    }

    #[test]
    fn config_hash_stable_for_identical_config_idempotence_law() {
        let a = TourSearchConfig::default();
        let b = TourSearchConfig::default();
        assert_eq!(a.config_hash(), b.config_hash());
    }

    #[test]
    fn config_hash_changes_with_content() {
        let a = TourSearchConfig::default();
        let mut b = TourSearchConfig::default();
        b.min_search_chars = 3;
        assert_ne!(a.config_hash(), b.config_hash());
    }

    proptest::proptest! {
        #[test]
        fn config_hash_is_stable_for_any_generated_config(
            min_search_chars in 1usize..64,
            mobile_breakpoint in 0u32..4000,
            auto_hide in proptest::bool::ANY,
            threshold in 0.0f64..=1.0,
        ) {
            let mut a = TourSearchConfig::default();
            a.min_search_chars = min_search_chars;
            a.mobile_breakpoint = mobile_breakpoint;
            a.auto_hide = auto_hide;
            a.search_settings.threshold = threshold;
            let b = a.clone();
            proptest::prop_assert_eq!(a.config_hash(), b.config_hash());
        }
    }

    #[test]
    fn normalized_filter_arrays_never_contain_empty_or_duplicates() {
        let mut values = vec!["a".to_string(), " ".to_string(), "a".to_string(), "".to_string(), "b".to_string()];
        normalize_list(&mut values);
        assert_eq!(values, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn include_content_allows_matches_field_per_type() {
        let mut cfg = IncludeContentConfig::default();
        cfg.include_hotspot = false;
        assert!(!cfg.allows(ElementType::Hotspot));
        assert!(cfg.allows(ElementType::Panorama));
    }

    #[test]
    fn value_filter_default_match_mode_depends_on_filter_mode() {
        let whitelist = ValueFilterConfig { mode: FilterMode::Whitelist, ..Default::default() };
        assert_eq!(whitelist.effective_match_mode(), ValueMatchMode::Exact);
        let blacklist = ValueFilterConfig { mode: FilterMode::Blacklist, ..Default::default() };
        assert_eq!(blacklist.effective_match_mode(), ValueMatchMode::Contains);
    }
}
