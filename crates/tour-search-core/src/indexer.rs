//! The Indexer (§4.F): walks playlists, extracts overlays, and produces the
//! flat set of [`IndexRecord`]s the query engine serves.

use crate::adapter::{is_3d_model_class, MediaView, OverlayView, PlaylistItemView, TourAdapter};
use crate::config::TourSearchConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::external::{BusinessRecord, SheetsRecord};
use crate::filter::{self, FilterCandidate};
use crate::label::{resolve_label, LabelContext};
use crate::reconcile::{ReconciliationScope, TourCandidate};
use crate::record::{BoostTier, Camera, IndexRecord, RecordSource};
use crate::taxonomy::{classify, Classification, ElementType};

/// Everything the indexer needs beyond the live tour: the merged config and
/// the two optional external sources, already loaded by the caller (§2
/// System Overview: `D -> F <- {A,B,C,E}`).
pub struct IndexBuildInput<'a> {
    pub config: &'a TourSearchConfig,
    pub business_records: &'a [BusinessRecord],
    pub sheets_records: &'a [SheetsRecord],
}

/// Builds the full index from a tour adapter and the loaded external data.
/// Per §3.3, this always does a full rebuild; there is no incremental path.
/// Classification fallbacks and filter-stage rejections encountered along
/// the way are discarded; use [`build_index_with_diagnostics`] to observe
/// them.
#[must_use]
pub fn build_index(adapter: &dyn TourAdapter, input: &IndexBuildInput<'_>) -> Vec<IndexRecord> {
    let mut diagnostics = DiagnosticSink::new();
    build_index_with_diagnostics(adapter, input, &mut diagnostics)
}

/// Same as [`build_index`], but records every classification fallback and
/// filter rejection seen during the walk into `diagnostics` (§2 Diagnostics
/// sink), in addition to the `tracing` events already emitted at those
/// sites.
#[must_use]
pub fn build_index_with_diagnostics(adapter: &dyn TourAdapter, input: &IndexBuildInput<'_>, diagnostics: &mut DiagnosticSink) -> Vec<IndexRecord> {
    let mut records = Vec::new();
    let mut scope = ReconciliationScope::new();

    let main_items = adapter.list_main_items();
    index_playlist(adapter, &main_items, RecordSource::Main, input, &mut records, &mut scope, diagnostics);

    if let Some(root_items) = adapter.list_root_items() {
        index_playlist(adapter, &root_items, RecordSource::Root, input, &mut records, &mut scope, diagnostics);
    }

    append_sheets_records(input, &mut records, &mut scope);
    append_container_records(input, &mut records);

    records
}

#[allow(clippy::too_many_arguments)]
fn index_playlist(
    adapter: &dyn TourAdapter,
    items: &[PlaylistItemView],
    source: RecordSource,
    input: &IndexBuildInput<'_>,
    records: &mut Vec<IndexRecord>,
    scope: &mut ReconciliationScope,
    diagnostics: &mut DiagnosticSink,
) {
    for (index, item) in items.iter().enumerate() {
        let class_name = adapter.item_class(item.handle).unwrap_or_default();
        if is_3d_model_class(&class_name) {
            process_3d_model(adapter, item, index, source, input, records, scope, diagnostics);
        } else {
            process_panorama(adapter, item, index, source, input, records, scope, diagnostics);
        }
    }
}

fn label_context(t: ElementType, index: Option<i64>) -> LabelContext {
    LabelContext { element_type: t, index }
}

fn resolve(label: Option<&str>, subtitle: Option<&str>, tags: &[String], ctx: LabelContext, cfg: &TourSearchConfig) -> String {
    resolve_label(label, subtitle, tags, ctx, &cfg.use_as_label, cfg.display_labels.only_subtitles, &cfg.display_labels.custom_text)
}

fn apply_business_match(
    label: String,
    subtitle: &str,
    name: &str,
    tags: &[String],
    input: &IndexBuildInput<'_>,
    scope: &mut ReconciliationScope,
) -> (String, Option<ElementType>, Option<serde_json::Value>, Option<String>, bool) {
    if input.config.business_data.use_business_data {
        let candidate = TourCandidate { subtitle, name, tags, id: None, media_id: None };
        if let Some(matched) = scope.match_business(&candidate, input.business_records) {
            // config.business_data.element_type, when set, overrides every
            // matched record's own elementType field (§8 scenario 4).
            let override_type = input
                .config
                .business_data
                .element_type
                .or_else(|| matched.element_type.as_deref().and_then(ElementType::from_str_ci));
            let new_label = if input.config.business_data.replace_tour_data && !matched.name.is_empty() {
                matched.name.clone()
            } else {
                label
            };
            let business_value = serde_json::json!({
                "id": matched.id,
                "name": matched.name,
                "description": matched.description,
                "matchTags": matched.match_tags,
            });
            return (new_label, override_type, Some(business_value), Some(matched.name.clone()), true);
        }
    }
    (label, None, None, None, false)
}

#[allow(clippy::too_many_arguments)]
fn process_panorama(
    adapter: &dyn TourAdapter,
    item: &PlaylistItemView,
    index: usize,
    source: RecordSource,
    input: &IndexBuildInput<'_>,
    records: &mut Vec<IndexRecord>,
    scope: &mut ReconciliationScope,
    diagnostics: &mut DiagnosticSink,
) {
    let media = adapter.item_media(item.handle).unwrap_or_default();
    let media_index = index as i64;

    let candidate_label = resolve(
        media.label.as_deref(),
        media.subtitle.as_deref(),
        &media.tags,
        label_context(ElementType::Panorama, Some(media_index)),
        input.config,
    );

    let filter_candidate = FilterCandidate {
        element_type: ElementType::Panorama,
        label: &candidate_label,
        subtitle: media.subtitle.as_deref().unwrap_or(""),
        tags: &media.tags,
        media_index: Some(media_index),
        is_panorama: true,
    };

    if !filter::media_index_stage(&filter_candidate, &input.config.filter).is_accepted() {
        tracing::debug!(media_index, "panorama and its overlays suppressed by media-index filter");
        diagnostics.push(Diagnostic::filter_rejection("media_index", &candidate_label));
        return;
    }

    match filter::run_pipeline(&filter_candidate, &input.config.filter, &input.config.include_content) {
        filter::FilterOutcome::Accepted => {
            push_panorama_record(item, &media, media_index, source, input, records, scope, &candidate_label);
        }
        filter::FilterOutcome::Rejected { stage } => {
            diagnostics.push(Diagnostic::filter_rejection(stage, &candidate_label));
            if input.config.filter.cascade_parent_rejection {
                return;
            }
        }
    }

    index_overlays(adapter, item, &media, media_index, input, records, diagnostics);
}

#[allow(clippy::too_many_arguments)]
fn push_panorama_record(
    item: &PlaylistItemView,
    media: &MediaView,
    media_index: i64,
    source: RecordSource,
    input: &IndexBuildInput<'_>,
    records: &mut Vec<IndexRecord>,
    scope: &mut ReconciliationScope,
    candidate_label: &str,
) {
    let (label, override_type, business_data, business_name, matched) = apply_business_match(
        candidate_label.to_string(),
        media.subtitle.as_deref().unwrap_or(""),
        media.label.as_deref().unwrap_or(""),
        &media.tags,
        input,
        scope,
    );

    records.push(IndexRecord {
        r#type: override_type.unwrap_or(ElementType::Panorama),
        source,
        original_label: candidate_label.to_string(),
        label,
        subtitle: media.subtitle.clone().unwrap_or_default(),
        tags: media.tags.clone(),
        playlist_order: media_index,
        boost: if matched { BoostTier::BusinessMatch.value() } else { BoostTier::LabeledItem.value() },
        index: Some(media_index),
        original_index: Some(media_index),
        parent_index: None,
        id: media.id.clone().or_else(|| item.id.clone()),
        business_data,
        business_name,
        sheets_data: None,
        image_url: None,
        thumbnail_url: None,
        local_image: None,
        media_index: Some(media_index),
        camera: None,
        is_standalone: false,
        is_enhanced: matched,
        is_container: false,
        container_name: None,
        parent_model: None,
        parent_label: None,
        item: Some(item.handle),
    });
}

/// Overlay-detection fallback cascade (§4.F, §9 design note: ordered
/// strategies, short-circuit on first non-empty). The cascade itself is
/// delegated entirely to the adapter (`media_overlays` implements the
/// eight-method fallback against the live tour); the indexer's only job is
/// to hand back the playlist item's own handle, which a real adapter
/// resolves to its underlying node and derives the media from (falling back
/// to treating the node itself as the media when there is no separate
/// `.media` property — see `JsTourAdapter::media_overlays`).
#[allow(clippy::too_many_arguments)]
fn index_overlays(
    adapter: &dyn TourAdapter,
    item: &PlaylistItemView,
    media: &MediaView,
    parent_index: i64,
    input: &IndexBuildInput<'_>,
    records: &mut Vec<IndexRecord>,
    diagnostics: &mut DiagnosticSink,
) {
    let overlays = adapter.media_overlays(item.handle);
    let parent_label = media.label.clone().unwrap_or_default();

    for (overlay_index, overlay) in overlays.iter().enumerate() {
        push_overlay_record(overlay, overlay_index as i64, parent_index, &parent_label, input, records, diagnostics);
    }
}

#[allow(clippy::too_many_arguments)]
fn push_overlay_record(
    overlay: &OverlayView,
    overlay_index: i64,
    parent_index: i64,
    parent_label: &str,
    input: &IndexBuildInput<'_>,
    records: &mut Vec<IndexRecord>,
    diagnostics: &mut DiagnosticSink,
) {
    let classification = classify(&overlay.classifier_input());
    if matches!(classification, Classification::Unknown) {
        diagnostics.push(Diagnostic::unknown_element_type(overlay.label.as_deref().unwrap_or("")));
        if !input.config.include_content.include_unknown_types {
            tracing::warn!(parent_index, overlay_index, "dropping unknown-class overlay per includeUnknownTypes=false");
            return;
        }
    }
    let element_type = classification.element_type();

    let label = resolve(
        overlay.label.as_deref(),
        overlay.subtitle.as_deref(),
        &overlay.tags,
        label_context(element_type, Some(overlay_index)),
        input.config,
    );

    let candidate = FilterCandidate {
        element_type,
        label: &label,
        subtitle: overlay.subtitle.as_deref().unwrap_or(""),
        tags: &overlay.tags,
        media_index: None,
        is_panorama: false,
    };
    if let filter::FilterOutcome::Rejected { stage } = filter::run_pipeline(&candidate, &input.config.filter, &input.config.include_content) {
        diagnostics.push(Diagnostic::filter_rejection(stage, &label));
        return;
    }

    let camera = match (overlay.yaw, overlay.pitch) {
        (Some(yaw), Some(pitch)) => Some(Camera { yaw, pitch, fov: overlay.fov.unwrap_or(70.0) }),
        _ => None,
    };

    records.push(IndexRecord {
        r#type: element_type,
        source: RecordSource::Main,
        original_label: label.clone(),
        label,
        subtitle: overlay.subtitle.clone().unwrap_or_default(),
        tags: overlay.tags.clone(),
        playlist_order: IndexRecord::child_playlist_order(parent_index, overlay_index),
        boost: BoostTier::LabeledItem.value(),
        index: None,
        original_index: None,
        parent_index: Some(parent_index),
        id: overlay.id.clone(),
        business_data: None,
        business_name: None,
        sheets_data: None,
        image_url: None,
        thumbnail_url: None,
        local_image: None,
        media_index: Some(parent_index),
        camera,
        is_standalone: false,
        is_enhanced: false,
        is_container: false,
        container_name: None,
        parent_model: None,
        parent_label: Some(parent_label.to_string()),
        item: Some(overlay.handle),
    });
}

#[allow(clippy::too_many_arguments)]
fn process_3d_model(
    adapter: &dyn TourAdapter,
    item: &PlaylistItemView,
    index: usize,
    source: RecordSource,
    input: &IndexBuildInput<'_>,
    records: &mut Vec<IndexRecord>,
    _scope: &mut ReconciliationScope,
    diagnostics: &mut DiagnosticSink,
) {
    let media = adapter.item_media(item.handle).unwrap_or_default();
    let model_index = index as i64;
    let label = resolve(
        media.label.as_deref(),
        media.subtitle.as_deref(),
        &media.tags,
        label_context(ElementType::ThreeDModel, Some(model_index)),
        input.config,
    );

    let candidate = FilterCandidate {
        element_type: ElementType::ThreeDModel,
        label: &label,
        subtitle: media.subtitle.as_deref().unwrap_or(""),
        tags: &media.tags,
        media_index: Some(model_index),
        is_panorama: false,
    };
    match filter::run_pipeline(&candidate, &input.config.filter, &input.config.include_content) {
        filter::FilterOutcome::Rejected { stage } => diagnostics.push(Diagnostic::filter_rejection(stage, &label)),
        filter::FilterOutcome::Accepted => records.push(IndexRecord {
            r#type: ElementType::ThreeDModel,
            source,
            original_label: label.clone(),
            label,
            subtitle: media.subtitle.clone().unwrap_or_default(),
            tags: media.tags.clone(),
            playlist_order: model_index,
            boost: BoostTier::LabeledItem.value(),
            index: Some(model_index),
            original_index: Some(model_index),
            parent_index: None,
            id: media.id.clone().or_else(|| item.id.clone()),
            business_data: None,
            business_name: None,
            sheets_data: None,
            image_url: None,
            thumbnail_url: None,
            local_image: None,
            media_index: Some(model_index),
            camera: None,
            is_standalone: false,
            is_enhanced: false,
            is_container: false,
            container_name: None,
            parent_model: None,
            parent_label: None,
            item: Some(item.handle),
        }),
    }

    let objects = adapter.media_objects(item.handle);
    let parent_label = media.label.clone().unwrap_or_default();
    for (object_index, object) in objects.iter().enumerate() {
        push_overlay_record(object, object_index as i64, model_index, &parent_label, input, records, diagnostics);
    }
}

fn append_sheets_records(input: &IndexBuildInput<'_>, records: &mut Vec<IndexRecord>, scope: &mut ReconciliationScope) {
    if input.sheets_records.is_empty() {
        return;
    }

    let tour_candidates: Vec<(usize, TourCandidate<'_>)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            (
                i,
                TourCandidate {
                    subtitle: &r.subtitle,
                    name: &r.label,
                    tags: &r.tags,
                    id: r.id.as_deref(),
                    media_id: r.media_index.map(|_| r.id.as_deref().unwrap_or_default()),
                },
            )
        })
        .collect();

    for sheet in input.sheets_records {
        if scope.is_sheet_consumed(&sheet.id) || scope.is_sheet_tag_consumed(&sheet.tag) {
            continue;
        }
        let scored = scope.match_sheets_candidates(sheet, &tour_candidates);
        match scope.resolve_best_sheets_match(sheet, &scored) {
            Some(matched_index) => {
                let target = &mut records[matched_index];
                target.sheets_data = Some(serde_json::json!({
                    "id": sheet.id, "tag": sheet.tag, "name": sheet.name, "description": sheet.description,
                }));
                target.is_enhanced = true;
                if let Some(t) = sheet.element_type.as_deref().and_then(ElementType::from_str_ci) {
                    target.r#type = t;
                }
                target.image_url = sheet.image_url.clone().or_else(|| target.image_url.clone());
            }
            None if input.config.google_sheets.include_standalone_entries => {
                records.push(IndexRecord {
                    r#type: sheet.element_type.as_deref().and_then(ElementType::from_str_ci).unwrap_or(ElementType::Element),
                    source: RecordSource::Sheets,
                    original_label: sheet.name.clone(),
                    label: if sheet.name.is_empty() { "[Unnamed Item]".to_string() } else { sheet.name.clone() },
                    subtitle: String::new(),
                    tags: if sheet.tag.is_empty() { vec![] } else { vec![sheet.tag.clone()] },
                    playlist_order: records.len() as i64,
                    boost: BoostTier::SheetsMatch.value(),
                    index: None,
                    original_index: None,
                    parent_index: None,
                    id: Some(sheet.id.clone()),
                    business_data: None,
                    business_name: None,
                    sheets_data: Some(serde_json::json!({ "id": sheet.id, "tag": sheet.tag, "name": sheet.name })),
                    image_url: sheet.image_url.clone(),
                    thumbnail_url: None,
                    local_image: None,
                    media_index: None,
                    camera: None,
                    is_standalone: true,
                    is_enhanced: true,
                    is_container: false,
                    container_name: None,
                    parent_model: None,
                    parent_label: None,
                    item: None,
                });
            }
            None => {}
        }
    }
}

fn append_container_records(input: &IndexBuildInput<'_>, records: &mut Vec<IndexRecord>) {
    for name in &input.config.container_names {
        records.push(IndexRecord {
            r#type: ElementType::Container,
            source: RecordSource::Container,
            original_label: name.clone(),
            label: name.clone(),
            subtitle: String::new(),
            tags: vec![],
            playlist_order: records.len() as i64,
            boost: BoostTier::LabeledItem.value(),
            index: None,
            original_index: None,
            parent_index: None,
            id: None,
            business_data: None,
            business_name: None,
            sheets_data: None,
            image_url: None,
            thumbnail_url: None,
            local_image: None,
            media_index: None,
            camera: None,
            is_standalone: false,
            is_enhanced: false,
            is_container: true,
            container_name: Some(name.clone()),
            parent_model: None,
            parent_label: None,
            item: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::stub::StubAdapter;
    use crate::adapter::PlaylistItemView;

    fn base_config() -> TourSearchConfig {
        TourSearchConfig::default()
    }

    #[test]
    fn simple_panorama_search_scenario_layout() {
        // Scenario 1 (§8): three panoramas, one matches "room" downstream in query.rs.
        let mut stub = StubAdapter::default();
        for (i, label) in ["Lobby", "Conference Room", "Rooftop"].iter().enumerate() {
            stub.main_items.push(PlaylistItemView { handle: i as u64, class_name: "Panorama".into(), id: Some(format!("p{i}")) });
            stub.media.insert(i as u64, MediaView { id: Some(format!("p{i}")), label: Some((*label).to_string()), subtitle: None, tags: vec![] });
        }
        let input = IndexBuildInput { config: &base_config(), business_records: &[], sheets_records: &[] };
        let records = build_index(&stub, &input);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].label, "Conference Room");
        assert_eq!(records[1].playlist_order, 1);
    }

    #[test]
    fn child_hotspot_gets_parent_index_and_playlist_order() {
        // Scenario 2 (§8): panorama index 2 "Gallery" with a hotspot overlay "Painting A".
        let mut stub = StubAdapter::default();
        stub.main_items.push(PlaylistItemView { handle: 2, class_name: "Panorama".into(), id: Some("p2".into()) });
        stub.media.insert(2, MediaView { id: Some("p2".into()), label: Some("Gallery".into()), subtitle: None, tags: vec![] });
        stub.overlays.insert(
            2,
            vec![OverlayView {
                handle: 100,
                class_name: Some("HotspotPanoramaOverlay".into()),
                id: Some("h1".into()),
                label: Some("Painting A".into()),
                ..Default::default()
            }],
        );
        let config = base_config();
        let input = IndexBuildInput { config: &config, business_records: &[], sheets_records: &[] };
        let records = build_index(&stub, &input);

        let hotspot = records.iter().find(|r| r.r#type == ElementType::Hotspot).unwrap();
        assert_eq!(hotspot.parent_index, Some(0));
        assert_eq!(hotspot.parent_label.as_deref(), Some("Gallery"));
        assert_eq!(hotspot.playlist_order, 0);
    }

    #[test]
    fn whitelist_by_type_keeps_only_panoramas() {
        // Scenario 3 (§8).
        let mut stub = StubAdapter::default();
        stub.main_items.push(PlaylistItemView { handle: 0, class_name: "Panorama".into(), id: Some("p0".into()) });
        stub.media.insert(0, MediaView { id: Some("p0".into()), label: Some("Lobby".into()), subtitle: None, tags: vec![] });
        stub.overlays.insert(0, vec![OverlayView { handle: 5, class_name: Some("HotspotPanoramaOverlay".into()), label: Some("Button".into()), ..Default::default() }]);

        let mut config = base_config();
        config.filter.element_types = crate::config::SetFilterConfig {
            mode: crate::config::FilterMode::Whitelist,
            values: vec!["Panorama".to_string()],
        };
        let input = IndexBuildInput { config: &config, business_records: &[], sheets_records: &[] };
        let records = build_index(&stub, &input);
        assert!(records.iter().all(|r| r.r#type == ElementType::Panorama));
    }

    #[test]
    fn business_data_replacement_scenario() {
        // Scenario 4 (§8).
        let mut stub = StubAdapter::default();
        stub.main_items.push(PlaylistItemView { handle: 0, class_name: "Panorama".into(), id: Some("p0".into()) });
        stub.media.insert(0, MediaView { id: Some("p0".into()), label: Some("Suite".into()), subtitle: Some("rm001".into()), tags: vec![] });

        let mut config = base_config();
        config.business_data.use_business_data = true;
        config.business_data.replace_tour_data = true;
        let business = vec![BusinessRecord {
            id: "rm001".into(),
            name: "Executive Suite".into(),
            description: String::new(),
            match_tags: vec!["exec-room".into()],
            element_type: None,
            image_url: None,
            local_image: None,
            extra: serde_json::Map::new(),
        }];
        let input = IndexBuildInput { config: &config, business_records: &business, sheets_records: &[] };
        let records = build_index(&stub, &input);
        assert_eq!(records[0].label, "Executive Suite");
        assert_eq!(records[0].r#type, ElementType::Panorama);
    }

    #[test]
    fn standalone_sheets_entry_when_no_tour_match() {
        // Scenario 5 (§8).
        let stub = StubAdapter::default();
        let mut config = base_config();
        config.google_sheets.use_google_sheet_data = true;
        config.google_sheets.include_standalone_entries = true;
        let sheets = vec![SheetsRecord { id: "kiosk-1".into(), name: "Info Kiosk".into(), tag: "kiosk".into(), ..Default::default() }];
        let input = IndexBuildInput { config: &config, business_records: &[], sheets_records: &sheets };
        let records = build_index(&stub, &input);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, RecordSource::Sheets);
        assert!(records[0].is_standalone);
        assert!(records[0].item.is_none());
    }

    #[test]
    fn container_records_appended_after_tour_items() {
        let stub = StubAdapter::default();
        let mut config = base_config();
        config.container_names = vec!["Sidebar".to_string()];
        let input = IndexBuildInput { config: &config, business_records: &[], sheets_records: &[] };
        let records = build_index(&stub, &input);
        assert_eq!(records.len(), 1);
        assert!(records[0].is_container);
        assert_eq!(records[0].container_name.as_deref(), Some("Sidebar"));
    }

    #[test]
    fn unknown_class_overlay_is_recorded_as_a_diagnostic() {
        let mut stub = StubAdapter::default();
        stub.main_items.push(PlaylistItemView { handle: 0, class_name: "Panorama".into(), id: Some("p0".into()) });
        stub.media.insert(0, MediaView { id: Some("p0".into()), label: Some("Lobby".into()), subtitle: None, tags: vec![] });
        stub.overlays.insert(0, vec![OverlayView { handle: 9, class_name: Some("SomeWeirdOverlay".into()), label: Some("Mystery".into()), ..Default::default() }]);
        let config = base_config();
        let input = IndexBuildInput { config: &config, business_records: &[], sheets_records: &[] };
        let mut diagnostics = crate::diagnostics::DiagnosticSink::new();
        let records = build_index_with_diagnostics(&stub, &input, &mut diagnostics);
        assert!(records.iter().any(|r| r.label == "Mystery"));
        let drained = diagnostics.drain();
        assert!(drained.iter().any(|d| d.kind == crate::diagnostics::DiagnosticKind::UnknownElementType));
    }

    #[test]
    fn unknown_class_overlay_defaults_to_element() {
        let mut stub = StubAdapter::default();
        stub.main_items.push(PlaylistItemView { handle: 0, class_name: "Panorama".into(), id: Some("p0".into()) });
        stub.media.insert(0, MediaView { id: Some("p0".into()), label: Some("Lobby".into()), subtitle: None, tags: vec![] });
        stub.overlays.insert(0, vec![OverlayView { handle: 9, class_name: Some("SomeWeirdOverlay".into()), label: Some("Mystery".into()), ..Default::default() }]);
        let config = base_config();
        let input = IndexBuildInput { config: &config, business_records: &[], sheets_records: &[] };
        let records = build_index(&stub, &input);
        let mystery = records.iter().find(|r| r.label == "Mystery").unwrap();
        assert_eq!(mystery.r#type, ElementType::Element);
    }

    #[test]
    fn every_record_has_a_valid_taxonomy_type_invariant_1() {
        let mut stub = StubAdapter::default();
        stub.main_items.push(PlaylistItemView { handle: 0, class_name: "Model3DPlayListItem".into(), id: Some("m0".into()) });
        stub.media.insert(0, MediaView { id: Some("m0".into()), label: Some("Engine".into()), subtitle: None, tags: vec![] });
        stub.objects.insert(0, vec![OverlayView { handle: 11, id: Some("sprite_1".into()), label: Some("Sprite 1".into()), ..Default::default() }]);
        let config = base_config();
        let input = IndexBuildInput { config: &config, business_records: &[], sheets_records: &[] };
        let records = build_index(&stub, &input);
        assert!(records.iter().all(IndexRecord::type_is_valid));
    }

    #[test]
    fn rebuilding_with_identical_inputs_is_deterministic_invariant_6() {
        let mut stub = StubAdapter::default();
        stub.main_items.push(PlaylistItemView { handle: 0, class_name: "Panorama".into(), id: Some("p0".into()) });
        stub.media.insert(0, MediaView { id: Some("p0".into()), label: Some("Lobby".into()), subtitle: None, tags: vec![] });
        let config = base_config();
        let input = IndexBuildInput { config: &config, business_records: &[], sheets_records: &[] };
        let first = build_index(&stub, &input);
        let second = build_index(&stub, &input);
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].label, second[0].label);
        assert_eq!(first[0].playlist_order, second[0].playlist_order);
    }
}
