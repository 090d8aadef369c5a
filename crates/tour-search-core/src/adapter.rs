//! `TourAdapter`: the small capability interface abstracting over the tour
//! runtime's duck-typed nodes (§9 design note). Implemented once against the
//! real tour in the wasm crate; tests implement it against a stub.

/// Opaque handle to a node the adapter knows how to resolve later (a
/// playlist item, a media, an overlay, a 3D object). Carries no data itself;
/// all data access goes back through the adapter by handle, matching the
/// tour runtime's actual ownership (the Navigation Dispatcher holds weak
/// references, §3.4).
pub type NodeHandle = u64;

/// A single playlist item as seen by the indexer, before classification.
#[derive(Debug, Clone)]
pub struct PlaylistItemView {
    pub handle: NodeHandle,
    pub class_name: String,
    pub id: Option<String>,
}

/// A media's raw data needed to build a panorama record and enumerate
/// overlays.
#[derive(Debug, Clone, Default)]
pub struct MediaView {
    pub id: Option<String>,
    pub label: Option<String>,
    pub subtitle: Option<String>,
    pub tags: Vec<String>,
}

/// A raw overlay/3D-object node, pre-classification.
#[derive(Debug, Clone, Default)]
pub struct OverlayView {
    pub handle: NodeHandle,
    pub class_name: Option<String>,
    pub id: Option<String>,
    pub label: Option<String>,
    pub subtitle: Option<String>,
    pub tags: Vec<String>,
    pub projected: bool,
    pub polygon_vertex_count: usize,
    pub has_video_payload: bool,
    pub has_image_payload: bool,
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
    pub fov: Option<f64>,
    pub parent_media_id: Option<String>,
}

/// Outcome of [`TourAdapter::trigger`] (§9 design note: explicit result
/// kinds instead of exceptions for control flow).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Triggered,
    NotFound,
}

/// Capability methods the indexer and dispatcher need from a live tour.
/// Grounded directly on the tour adapter surface named in §6 and §9.
pub trait TourAdapter {
    /// `tour.mainPlayList.get("items")`.
    fn list_main_items(&self) -> Vec<PlaylistItemView>;
    /// `tour.locManager.rootPlayer.mainPlayList`, when present.
    fn list_root_items(&self) -> Option<Vec<PlaylistItemView>>;

    fn item_class(&self, item: NodeHandle) -> Option<String>;
    fn item_media(&self, item: NodeHandle) -> Option<MediaView>;

    /// Primary overlay-detection strategy plus the seven fallbacks (§4.F);
    /// implementations run their own cascade and return the first
    /// non-empty result, matching the "ordered strategies" re-architecture
    /// in §9.
    fn media_overlays(&self, media_item: NodeHandle) -> Vec<OverlayView>;
    /// `media.get("objects")` for `Model3DPlayListItem` media (§4.F).
    fn media_objects(&self, media_item: NodeHandle) -> Vec<OverlayView>;

    fn find_by_id(&self, id: &str) -> Option<NodeHandle>;
    fn find_by_class_name(&self, class_name: &str) -> Vec<NodeHandle>;
    fn all_ids(&self) -> Vec<String>;

    /// `playlist.set("selectedIndex", n)` on the main or root playlist.
    fn select_index(&self, root: bool, index: i64);
    /// `element.trigger("click")`, falling back to `.click()`/`.onClick()`
    /// internally; returns [`TriggerOutcome::NotFound`] rather than
    /// throwing when the handle cannot be resolved (§4.H step 4).
    fn trigger(&self, handle: NodeHandle) -> TriggerOutcome;

    /// Toggles a named UI container (§4.H step 3, `Container` case).
    fn toggle_container(&self, name: &str) -> TriggerOutcome;
}

/// A small in-memory tour stub: enough surface for the indexer, reconciler,
/// and dispatcher tests without a real tour runtime. Lives in its own
/// `pub(crate)` module (rather than inside `mod tests`) so every other
/// module's own test code can build against it too.
#[cfg(test)]
pub(crate) mod stub {
    use super::{MediaView, NodeHandle, OverlayView, PlaylistItemView, TourAdapter, TriggerOutcome};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct StubAdapter {
        pub main_items: Vec<PlaylistItemView>,
        pub root_items: Option<Vec<PlaylistItemView>>,
        pub media: HashMap<NodeHandle, MediaView>,
        pub overlays: HashMap<NodeHandle, Vec<OverlayView>>,
        pub objects: HashMap<NodeHandle, Vec<OverlayView>>,
        pub by_id: HashMap<String, NodeHandle>,
        pub triggered: RefCell<Vec<NodeHandle>>,
        pub selected: RefCell<Vec<(bool, i64)>>,
        pub toggled_containers: RefCell<Vec<String>>,
    }

    impl TourAdapter for StubAdapter {
        fn list_main_items(&self) -> Vec<PlaylistItemView> {
            self.main_items.clone()
        }

        fn list_root_items(&self) -> Option<Vec<PlaylistItemView>> {
            self.root_items.clone()
        }

        fn item_class(&self, item: NodeHandle) -> Option<String> {
            self.main_items
                .iter()
                .chain(self.root_items.iter().flatten())
                .find(|i| i.handle == item)
                .map(|i| i.class_name.clone())
        }

        fn item_media(&self, item: NodeHandle) -> Option<MediaView> {
            self.media.get(&item).cloned()
        }

        fn media_overlays(&self, media_item: NodeHandle) -> Vec<OverlayView> {
            self.overlays.get(&media_item).cloned().unwrap_or_default()
        }

        fn media_objects(&self, media_item: NodeHandle) -> Vec<OverlayView> {
            self.objects.get(&media_item).cloned().unwrap_or_default()
        }

        fn find_by_id(&self, id: &str) -> Option<NodeHandle> {
            self.by_id.get(id).copied()
        }

        fn find_by_class_name(&self, class_name: &str) -> Vec<NodeHandle> {
            self.main_items
                .iter()
                .filter(|i| i.class_name == class_name)
                .map(|i| i.handle)
                .collect()
        }

        fn all_ids(&self) -> Vec<String> {
            self.by_id.keys().cloned().collect()
        }

        fn select_index(&self, root: bool, index: i64) {
            self.selected.borrow_mut().push((root, index));
        }

        fn trigger(&self, handle: NodeHandle) -> TriggerOutcome {
            if self.by_id.values().any(|h| *h == handle) || self.main_items.iter().any(|i| i.handle == handle) {
                self.triggered.borrow_mut().push(handle);
                TriggerOutcome::Triggered
            } else {
                TriggerOutcome::NotFound
            }
        }

        fn toggle_container(&self, name: &str) -> TriggerOutcome {
            self.toggled_containers.borrow_mut().push(name.to_string());
            TriggerOutcome::Triggered
        }
    }
}


/// `ClassifierInput` builder for an overlay view, reused by the indexer
/// (§4.A, §4.F).
impl OverlayView {
    #[must_use]
    pub fn classifier_input(&self) -> crate::taxonomy::ClassifierInput<'_> {
        crate::taxonomy::ClassifierInput {
            class_name: self.class_name.as_deref(),
            label: self.label.as_deref(),
            id: self.id.as_deref(),
            projected: self.projected,
            polygon_vertex_count: self.polygon_vertex_count,
            has_video_payload: self.has_video_payload,
            has_image_payload: self.has_image_payload,
        }
    }
}

/// Convenience accessor kept off [`TourAdapter`] itself: whether a given
/// class name is the 3D-model playlist-item class (§4.F branch condition).
#[must_use]
pub fn is_3d_model_class(class_name: &str) -> bool {
    class_name.eq_ignore_ascii_case("Model3DPlayListItem")
}
