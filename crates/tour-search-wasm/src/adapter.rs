//! [`JsTourAdapter`]: the one implementation of `TourAdapter` that talks to
//! a real tour object. The tour runtime's nodes are duck-typed — some
//! expose a `.get(key)` accessor, others a bare `.key` property, and which
//! one a given node supports is not documented anywhere — so every read
//! goes through [`duck_get`], which tries `.get(key)` first and falls back
//! to direct property access (§9 design note: "polymorphism via duck typing
//! on tour nodes").
//!
//! `TourAdapter`'s `NodeHandle` is a plain `u64`, but a tour node is an
//! opaque `JsValue`. [`JsTourAdapter`] bridges the two with a slab: handing
//! out a node registers it in an internal `Vec<JsValue>` and returns its
//! index. Handles are therefore only valid for the adapter instance that
//! issued them, which matches how the indexer and dispatcher already use
//! them (never persisted, never compared across builds).

use std::cell::RefCell;

use js_sys::{Array, Function, Reflect};
use tour_search_core::{MediaView, NodeHandle, OverlayView, PlaylistItemView, TourAdapter, TriggerOutcome};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Tries `obj.get(key)` (the tour runtime's usual accessor); if that's not a
/// callable property, or it returns `undefined`, falls back to `obj[key]`
/// directly. Matches the source's `.get(x) || .x` idiom exactly.
fn duck_get(obj: &JsValue, key: &str) -> JsValue {
    if let Ok(getter) = Reflect::get(obj, &JsValue::from_str("get")) {
        if let Some(func) = getter.dyn_ref::<Function>() {
            if let Ok(result) = func.call1(obj, &JsValue::from_str(key)) {
                if !result.is_undefined() && !result.is_null() {
                    return result;
                }
            }
        }
    }
    Reflect::get(obj, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn duck_str(obj: &JsValue, key: &str) -> Option<String> {
    duck_get(obj, key).as_string()
}

fn duck_f64(obj: &JsValue, key: &str) -> Option<f64> {
    let v = duck_get(obj, key);
    v.as_f64()
}

fn duck_bool(obj: &JsValue, key: &str, default: bool) -> bool {
    duck_get(obj, key).as_bool().unwrap_or(default)
}

/// Reads a tag/string array property, tolerating `undefined`/non-array
/// values (treated as empty).
fn duck_string_array(obj: &JsValue, key: &str) -> Vec<String> {
    let value = duck_get(obj, key);
    if !Array::is_array(&value) {
        return Vec::new();
    }
    Array::from(&value).iter().filter_map(|item| item.as_string()).collect()
}

/// Reads `obj.get("items")` (a tour playlist's item sequence), tolerating a
/// bare array fallback.
fn duck_items(obj: &JsValue, key: &str) -> Vec<JsValue> {
    let value = duck_get(obj, key);
    if Array::is_array(&value) {
        Array::from(&value).iter().collect()
    } else {
        Vec::new()
    }
}

pub struct JsTourAdapter {
    tour: JsValue,
    nodes: RefCell<Vec<JsValue>>,
}

impl JsTourAdapter {
    #[must_use]
    pub fn new(tour: JsValue) -> Self {
        Self { tour, nodes: RefCell::new(Vec::new()) }
    }

    fn register(&self, value: JsValue) -> NodeHandle {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(value);
        (nodes.len() - 1) as NodeHandle
    }

    fn resolve(&self, handle: NodeHandle) -> Option<JsValue> {
        self.nodes.borrow().get(handle as usize).cloned()
    }

    fn playlist_items(&self, playlist: &JsValue) -> Vec<PlaylistItemView> {
        duck_items(playlist, "items")
            .into_iter()
            .map(|item| {
                let class_name = duck_str(&item, "class").unwrap_or_default();
                let id = duck_str(&item, "id");
                let handle = self.register(item);
                PlaylistItemView { handle, class_name, id }
            })
            .collect()
    }

    fn media_view_from(&self, media: &JsValue) -> MediaView {
        let data = duck_get(media, "data");
        let data = if data.is_undefined() || data.is_null() { media.clone() } else { data };
        MediaView {
            id: duck_str(media, "id"),
            label: duck_str(&data, "label"),
            subtitle: duck_str(&data, "subtitle"),
            tags: duck_string_array(&data, "tags"),
        }
    }

    fn overlay_view_from(&self, overlay: &JsValue) -> OverlayView {
        let data = duck_get(overlay, "data");
        let data = if data.is_undefined() || data.is_null() { overlay.clone() } else { data };
        let items = duck_items(overlay, "items");
        let first_item = items.first();
        let (yaw, pitch) = first_item
            .map(|item| (duck_f64(item, "yaw"), duck_f64(item, "pitch")))
            .unwrap_or_else(|| (duck_f64(overlay, "yaw"), duck_f64(overlay, "pitch")));

        let handle = self.register(overlay.clone());
        OverlayView {
            handle,
            class_name: duck_str(overlay, "class"),
            id: duck_str(overlay, "id"),
            label: duck_str(&data, "label"),
            subtitle: duck_str(&data, "subtitle"),
            tags: duck_string_array(&data, "tags"),
            projected: duck_bool(&data, "projected", false),
            polygon_vertex_count: polygon_vertex_count(&duck_get(&data, "polygon")),
            has_video_payload: !duck_get(overlay, "video").is_undefined(),
            has_image_payload: !duck_get(overlay, "image").is_undefined(),
            yaw,
            pitch,
            fov: first_item.and_then(|item| duck_f64(item, "hfov")).or_else(|| duck_f64(overlay, "hfov")),
            parent_media_id: duck_str(overlay, "parent"),
        }
    }
}

fn polygon_vertex_count(polygon: &JsValue) -> usize {
    if Array::is_array(polygon) {
        Array::from(polygon).length() as usize
    } else {
        0
    }
}

impl TourAdapter for JsTourAdapter {
    fn list_main_items(&self) -> Vec<PlaylistItemView> {
        let main_playlist = duck_get(&self.tour, "mainPlayList");
        if main_playlist.is_undefined() {
            return Vec::new();
        }
        self.playlist_items(&main_playlist)
    }

    fn list_root_items(&self) -> Option<Vec<PlaylistItemView>> {
        let loc_manager = duck_get(&self.tour, "locManager");
        if loc_manager.is_undefined() {
            return None;
        }
        let root_player = duck_get(&loc_manager, "rootPlayer");
        if root_player.is_undefined() {
            return None;
        }
        let playlist = duck_get(&root_player, "mainPlayList");
        if playlist.is_undefined() {
            return None;
        }
        Some(self.playlist_items(&playlist))
    }

    fn item_class(&self, item: NodeHandle) -> Option<String> {
        let node = self.resolve(item)?;
        duck_str(&node, "class")
    }

    fn item_media(&self, item: NodeHandle) -> Option<MediaView> {
        let node = self.resolve(item)?;
        let media = duck_get(&node, "media");
        if media.is_undefined() {
            return None;
        }
        Some(self.media_view_from(&media))
    }

    /// Eight-strategy overlay-detection cascade (§4.F): media `overlays`
    /// getter, media `overlays` property, item `overlays`, `overlaysByTags`,
    /// `getByClassName("SpriteModel3DObject")` filtered by parent, unowned
    /// sprites (index 0 only), other 3D classes, generic `PanoramaOverlay`
    /// filtered by parent media id. Each strategy short-circuits on the
    /// first non-empty result.
    fn media_overlays(&self, media_item: NodeHandle) -> Vec<OverlayView> {
        let Some(node) = self.resolve(media_item) else { return Vec::new() };
        let media = {
            let candidate = duck_get(&node, "media");
            if candidate.is_undefined() { node.clone() } else { candidate }
        };
        let media_id = duck_str(&media, "id");

        let strategies: [fn(&JsTourAdapter, &JsValue, &JsValue, Option<&str>) -> Vec<JsValue>; 4] = [
            |_, media, _node, _| duck_items(media, "overlays"),
            |_, _media, node, _| duck_items(node, "overlays"),
            |_, _media, node, _| duck_items(node, "overlaysByTags"),
            |this, _media, _node, media_id| {
                let candidates = this.duck_get_by_class_name("SpriteModel3DObject");
                media_id.map_or_else(Vec::new, |id| {
                    candidates.into_iter().filter(|c| duck_str(c, "parent").as_deref() == Some(id)).collect()
                })
            },
        ];

        for strategy in strategies {
            let raw = strategy(self, &media, &node, media_id.as_deref());
            if !raw.is_empty() {
                return raw.iter().map(|overlay| self.overlay_view_from(overlay)).collect();
            }
        }

        let fallback = self.duck_get_by_class_name("PanoramaOverlay");
        fallback
            .into_iter()
            .filter(|overlay| media_id.is_none() || duck_str(overlay, "parent").as_deref() == media_id.as_deref())
            .map(|overlay| self.overlay_view_from(&overlay))
            .collect()
    }

    fn media_objects(&self, media_item: NodeHandle) -> Vec<OverlayView> {
        let Some(node) = self.resolve(media_item) else { return Vec::new() };
        let media = {
            let candidate = duck_get(&node, "media");
            if candidate.is_undefined() { node } else { candidate }
        };
        duck_items(&media, "objects").iter().map(|object| self.overlay_view_from(object)).collect()
    }

    /// `player.getById`, `tour.get`, `player.get`, `getAllIDs+getById` (§6):
    /// tries `tour.get(id)` first since it is the cheapest single call, then
    /// falls back to scanning `getAllIDs()` and re-resolving by identity.
    fn find_by_id(&self, id: &str) -> Option<NodeHandle> {
        let direct = duck_get(&self.tour, "get");
        if let Some(func) = direct.dyn_ref::<Function>() {
            if let Ok(result) = func.call1(&self.tour, &JsValue::from_str(id)) {
                if !result.is_undefined() && !result.is_null() {
                    return Some(self.register(result));
                }
            }
        }
        let player = duck_get(&self.tour, "player");
        let getter = duck_get(&player, "getById");
        if let Some(func) = getter.dyn_ref::<Function>() {
            if let Ok(result) = func.call1(&player, &JsValue::from_str(id)) {
                if !result.is_undefined() && !result.is_null() {
                    return Some(self.register(result));
                }
            }
        }
        None
    }

    fn find_by_class_name(&self, class_name: &str) -> Vec<NodeHandle> {
        self.duck_get_by_class_name(class_name).into_iter().map(|node| self.register(node)).collect()
    }

    fn all_ids(&self) -> Vec<String> {
        let player = duck_get(&self.tour, "player");
        let getter = duck_get(&player, "getAllIDs");
        let Some(func) = getter.dyn_ref::<Function>() else { return Vec::new() };
        let Ok(result) = func.call0(&player) else { return Vec::new() };
        if !Array::is_array(&result) {
            return Vec::new();
        }
        Array::from(&result).iter().filter_map(|id| id.as_string()).collect()
    }

    fn select_index(&self, root: bool, index: i64) {
        let playlist = if root {
            let loc_manager = duck_get(&self.tour, "locManager");
            let root_player = duck_get(&loc_manager, "rootPlayer");
            duck_get(&root_player, "mainPlayList")
        } else {
            duck_get(&self.tour, "mainPlayList")
        };
        if playlist.is_undefined() {
            return;
        }
        let setter = duck_get(&playlist, "set");
        if let Some(func) = setter.dyn_ref::<Function>() {
            let _ = func.call2(&playlist, &JsValue::from_str("selectedIndex"), &JsValue::from_f64(index as f64));
        }
    }

    /// `.trigger("click")`, then `.click()`, then `.onClick()` (§4.H step 4).
    fn trigger(&self, handle: NodeHandle) -> TriggerOutcome {
        let Some(node) = self.resolve(handle) else { return TriggerOutcome::NotFound };

        let trigger = duck_get(&node, "trigger");
        if let Some(func) = trigger.dyn_ref::<Function>() {
            if func.call1(&node, &JsValue::from_str("click")).is_ok() {
                return TriggerOutcome::Triggered;
            }
        }
        let click = duck_get(&node, "click");
        if let Some(func) = click.dyn_ref::<Function>() {
            if func.call0(&node).is_ok() {
                return TriggerOutcome::Triggered;
            }
        }
        let on_click = duck_get(&node, "onClick");
        if let Some(func) = on_click.dyn_ref::<Function>() {
            if func.call0(&node).is_ok() {
                return TriggerOutcome::Triggered;
            }
        }
        TriggerOutcome::NotFound
    }

    /// Tour menu `toggleContainer(name)`, falling back to flipping `visible`
    /// on every `getByClassName("Container")` match (§4.H step 3).
    fn toggle_container(&self, name: &str) -> TriggerOutcome {
        let menu = duck_get(&self.tour, "menu");
        if !menu.is_undefined() {
            let toggle = duck_get(&menu, "toggleContainer");
            if let Some(func) = toggle.dyn_ref::<Function>() {
                if func.call1(&menu, &JsValue::from_str(name)).is_ok() {
                    return TriggerOutcome::Triggered;
                }
            }
        }

        let mut flipped = false;
        for container in self.duck_get_by_class_name("Container") {
            if duck_str(&container, "name").as_deref() != Some(name) {
                continue;
            }
            let current = duck_bool(&container, "visible", false);
            let setter = duck_get(&container, "set");
            if let Some(func) = setter.dyn_ref::<Function>() {
                let _ = func.call2(&container, &JsValue::from_str("visible"), &JsValue::from_bool(!current));
                flipped = true;
            }
        }
        if flipped {
            TriggerOutcome::Triggered
        } else {
            TriggerOutcome::NotFound
        }
    }
}

impl JsTourAdapter {
    fn duck_get_by_class_name(&self, class_name: &str) -> Vec<JsValue> {
        let player = duck_get(&self.tour, "player");
        let getter = duck_get(&player, "getByClassName");
        let Some(func) = getter.dyn_ref::<Function>() else { return Vec::new() };
        let Ok(result) = func.call1(&player, &JsValue::from_str(class_name)) else { return Vec::new() };
        if Array::is_array(&result) {
            Array::from(&result).iter().collect()
        } else if !result.is_undefined() && !result.is_null() {
            vec![result]
        } else {
            Vec::new()
        }
    }
}

