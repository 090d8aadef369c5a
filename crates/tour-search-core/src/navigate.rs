//! The Navigation Dispatcher (§4.H): turns a selected [`IndexRecord`] into a
//! concrete activation against the live tour.
//!
//! Everything here is synchronous and pure where it can be: the actual delays
//! between "select playlist index" and "trigger the element" are a host
//! concern (a `setTimeout` in the wasm crate, a test double with no delay at
//! all), so this module only *decides* what to do next; the caller is
//! responsible for driving [`ActivationPlan`] and [`TriggerAttemptOutcome`]
//! forward against a [`TourAdapter`].

use crate::adapter::{NodeHandle, TourAdapter, TriggerOutcome};
use crate::canonical::{norm_contains, norm_eq};
use crate::config::ElementTriggeringConfig;
use crate::record::{Camera, IndexRecord, RecordSource};
use crate::taxonomy::ElementType;

/// What the dispatcher should do for a given record (§4.H steps 1-3).
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationPlan {
    /// Step 1: a navigable camera shortcut short-circuits everything else.
    CameraShortcut { fragment: String },
    /// Select a playlist index and stop (panoramas, 3D models).
    SelectOnly { root: bool, index: i64 },
    /// Select a parent index, then trigger a child element after a delay.
    SelectThenTrigger { root: bool, select_index: i64, trigger_id: String, delay_ms: u64 },
    /// A standalone sheets entry with no `item` handle: resolve by the
    /// id/tag/media fallback chain instead of a playlist index.
    StandaloneLookup,
    /// Toggle a named UI container.
    ToggleContainer { name: String },
}

/// Step 1: builds `media-index=M&focus-overlay-name=L&yaw=Y&pitch=P&fov=F`
/// (§4.H, §6).
#[must_use]
pub fn camera_url_fragment(record: &IndexRecord, camera: &Camera) -> String {
    let media_index = record.media_index.or(record.index).unwrap_or(0);
    let label = urlencoding::encode(&record.label);
    format!(
        "media-index={media_index}&focus-overlay-name={label}&yaw={yaw}&pitch={pitch}&fov={fov}",
        yaw = camera.yaw,
        pitch = camera.pitch,
        fov = camera.fov,
    )
}

/// Step 2: resolves which playlist a record belongs to. Any source other
/// than `main`/`root` falls back to main with a warning (§4.H step 2).
#[must_use]
pub fn resolve_target_is_root(source: RecordSource) -> bool {
    match source {
        RecordSource::Root => true,
        RecordSource::Main => false,
        other => {
            tracing::warn!(?other, "dispatcher: unexpected record source, falling back to main playlist");
            false
        }
    }
}

/// Computes the full activation plan for a record (§4.H steps 1-3).
#[must_use]
pub fn plan_activation(record: &IndexRecord, cfg: &ElementTriggeringConfig) -> ActivationPlan {
    if let Some(camera) = &record.camera {
        if camera.is_navigable() {
            return ActivationPlan::CameraShortcut { fragment: camera_url_fragment(record, camera) };
        }
    }

    if record.is_container {
        return ActivationPlan::ToggleContainer { name: record.container_name.clone().unwrap_or_default() };
    }

    if record.is_standalone {
        return ActivationPlan::StandaloneLookup;
    }

    let root = resolve_target_is_root(record.source);

    match record.r#type {
        ElementType::Panorama | ElementType::ThreeDModel => {
            ActivationPlan::SelectOnly { root, index: record.original_index.or(record.index).unwrap_or(0) }
        }
        ElementType::ThreeDModelObject | ElementType::ThreeDHotspot => ActivationPlan::SelectThenTrigger {
            root,
            select_index: record.parent_index.unwrap_or(0),
            trigger_id: record.id.clone().unwrap_or_default(),
            delay_ms: cfg.child_trigger_delay_ms,
        },
        _ if record.parent_index.is_some() => ActivationPlan::SelectThenTrigger {
            root,
            select_index: record.parent_index.unwrap_or(0),
            trigger_id: record.id.clone().unwrap_or_default(),
            delay_ms: cfg.shallow_trigger_delay_ms,
        },
        _ => ActivationPlan::SelectOnly { root, index: record.original_index.or(record.index).unwrap_or(0) },
    }
}

/// Standalone sheets entry fallback chain (§4.H step 3): id lookup, then
/// tag-as-id, then scanning playlist items for a media-id/tag/label match.
#[must_use]
pub fn resolve_standalone_target(adapter: &dyn TourAdapter, record: &IndexRecord) -> Option<NodeHandle> {
    if let Some(id) = record.id.as_deref() {
        if let Some(handle) = adapter.find_by_id(id) {
            return Some(handle);
        }
    }

    for tag in &record.tags {
        if let Some(handle) = adapter.find_by_id(tag) {
            return Some(handle);
        }
    }

    for item in adapter.list_main_items() {
        let Some(media) = adapter.item_media(item.handle) else { continue };

        if let (Some(media_id), Some(record_id)) = (media.id.as_deref(), record.id.as_deref()) {
            if norm_eq(media_id, record_id) {
                return Some(item.handle);
            }
        }
        if media.tags.iter().any(|t| record.tags.iter().any(|rt| norm_eq(t, rt))) {
            return Some(item.handle);
        }
        if let Some(label) = &media.label {
            if !record.label.is_empty() && norm_contains(label, &record.label) {
                return Some(item.handle);
            }
        }
    }

    None
}

/// The next action after one trigger attempt (§4.H step 4, §9 design note:
/// explicit result kinds rather than exceptions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAttemptOutcome {
    Triggered,
    RetryLater { next_attempt: u32, delay_ms: u64 },
    Failed { attempts: u32 },
}

/// Computes the backoff delay for a given (zero-based) attempt number:
/// `base * factor^attempt`, capped at `max_retry_interval_ms` (§4.H step 4).
#[must_use]
pub fn retry_delay_ms(attempt: u32, cfg: &ElementTriggeringConfig) -> u64 {
    let raw = cfg.base_retry_interval_ms as f64 * cfg.retry_backoff_factor.powi(attempt as i32);
    if raw.is_finite() && raw < cfg.max_retry_interval_ms as f64 {
        raw as u64
    } else {
        cfg.max_retry_interval_ms
    }
}

/// One attempt of trigger-with-retry (§4.H step 4). `TourAdapter::trigger`
/// already falls back across `.trigger("click")` / `.click()` / `.onClick()`
/// internally, and `find_by_id` stands in for the `getById`/`tour.get`/
/// `getAllIDs+getById` resolution chain; this function only decides whether
/// to retry and for how long.
#[must_use]
pub fn attempt_trigger(adapter: &dyn TourAdapter, id: &str, attempt: u32, cfg: &ElementTriggeringConfig) -> TriggerAttemptOutcome {
    let resolved = adapter.find_by_id(id).map(|handle| adapter.trigger(handle));

    if resolved == Some(TriggerOutcome::Triggered) {
        return TriggerAttemptOutcome::Triggered;
    }

    if attempt >= cfg.max_retries {
        tracing::warn!(id, attempt, "dispatcher: trigger-with-retry exhausted, giving up");
        return TriggerAttemptOutcome::Failed { attempts: attempt + 1 };
    }

    TriggerAttemptOutcome::RetryLater { next_attempt: attempt + 1, delay_ms: retry_delay_ms(attempt, cfg) }
}
