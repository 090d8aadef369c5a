//! The closed element-type taxonomy (§3.1) and the Type Classifier (§4.A).

use serde::{Deserialize, Serialize};

/// The fixed set of element types a raw tour node can classify into.
///
/// Unknown classes always fall back to [`ElementType::Element`]; there is no
/// open-ended variant, by design — a closed taxonomy is what lets the query
/// engine's group ordering (§4.G) be a total, deterministic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ElementType {
    Panorama,
    Hotspot,
    Polygon,
    Video,
    Webframe,
    Image,
    Text,
    ProjectedImage,
    Element,
    Business,
    #[serde(rename = "3DHotspot")]
    ThreeDHotspot,
    #[serde(rename = "3DModel")]
    ThreeDModel,
    #[serde(rename = "3DModelObject")]
    ThreeDModelObject,
    Container,
}

impl ElementType {
    /// The fixed set, in declaration order. Used by tests and by any caller
    /// that needs to enumerate the taxonomy rather than hardcode it twice.
    pub const ALL: [ElementType; 14] = [
        Self::Panorama,
        Self::Hotspot,
        Self::Polygon,
        Self::Video,
        Self::Webframe,
        Self::Image,
        Self::Text,
        Self::ProjectedImage,
        Self::Element,
        Self::Business,
        Self::ThreeDHotspot,
        Self::ThreeDModel,
        Self::ThreeDModelObject,
        Self::Container,
    ];

    /// Canonical wire name, matching the `serde` renames above. Kept as an
    /// explicit method (rather than relying solely on `Display`) because the
    /// reconciler and filter pipeline compare against this string directly.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Panorama => "Panorama",
            Self::Hotspot => "Hotspot",
            Self::Polygon => "Polygon",
            Self::Video => "Video",
            Self::Webframe => "Webframe",
            Self::Image => "Image",
            Self::Text => "Text",
            Self::ProjectedImage => "ProjectedImage",
            Self::Element => "Element",
            Self::Business => "Business",
            Self::ThreeDHotspot => "3DHotspot",
            Self::ThreeDModel => "3DModel",
            Self::ThreeDModelObject => "3DModelObject",
            Self::Container => "Container",
        }
    }

    /// Case-insensitive lookup by class/type name, used by the class-name
    /// table step of classification precedence and by config-driven type
    /// filters (§4.C stage 3).
    #[must_use]
    pub fn from_str_ci(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str().eq_ignore_ascii_case(s))
    }

    /// Priority used when sorting query-result groups (§4.G rule 3). Lower
    /// sorts first. Types outside the taxonomy's declared priority order
    /// (there are none, the taxonomy is closed) would sort after all of these.
    #[must_use]
    pub const fn group_priority(self) -> u8 {
        match self {
            Self::Panorama => 0,
            Self::Hotspot => 1,
            Self::Polygon => 2,
            Self::Video => 3,
            Self::Webframe => 4,
            Self::Image => 5,
            Self::Text => 6,
            Self::ProjectedImage => 7,
            Self::ThreeDModel => 8,
            Self::ThreeDHotspot => 9,
            Self::Element => 10,
            Self::Business => 11,
            Self::ThreeDModelObject => 12,
            Self::Container => 13,
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal view of a raw tour node the classifier needs. Real adapters build
/// this from whatever duck-typed shape the tour runtime exposes; it carries
/// no reference back to the node itself (see [`crate::adapter::TourAdapter`]
/// for that).
#[derive(Debug, Clone, Default)]
pub struct ClassifierInput<'a> {
    pub class_name: Option<&'a str>,
    pub label: Option<&'a str>,
    pub id: Option<&'a str>,
    pub projected: bool,
    pub polygon_vertex_count: usize,
    pub has_video_payload: bool,
    pub has_image_payload: bool,
}

/// Class-name lookup table used by classification precedence step 4. Mirrors
/// the tour runtime's own overlay/media class names.
const CLASS_NAME_TABLE: &[(&str, ElementType)] = &[
    ("HotspotPanoramaOverlay", ElementType::Hotspot),
    ("PolygonPanoramaOverlay", ElementType::Polygon),
    ("VideoPanoramaOverlay", ElementType::Video),
    ("WebFramePanoramaOverlay", ElementType::Webframe),
    ("ImagePanoramaOverlay", ElementType::Image),
    ("TextPanoramaOverlay", ElementType::Text),
    ("ProjectedImagePanoramaOverlay", ElementType::ProjectedImage),
    ("Model3DPlayListItem", ElementType::ThreeDModel),
    ("SpriteModel3DObject", ElementType::ThreeDHotspot),
    ("Model3DObject", ElementType::ThreeDModelObject),
    ("Container", ElementType::Container),
];

/// Label-pattern fallback table (classification precedence step 6):
/// substrings checked case-insensitively against the label when no class
/// name matched and no property heuristic fired.
const LABEL_PATTERN_TABLE: &[(&str, ElementType)] = &[
    ("panorama", ElementType::Panorama),
    ("hotspot", ElementType::Hotspot),
    ("video", ElementType::Video),
    ("webframe", ElementType::Webframe),
];

/// Outcome of classification, distinguishing a confident match from the
/// unknown-class fallback so callers can log a diagnostic (§4.A) without
/// resorting to exceptions for control flow (§9 design note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Classified(ElementType),
    Unknown,
}

impl Classification {
    #[must_use]
    pub const fn element_type(self) -> ElementType {
        match self {
            Self::Classified(t) => t,
            Self::Unknown => ElementType::Element,
        }
    }
}

/// Classifies a raw node, applying the precedence order from §3.1:
/// 1. explicit `projected == true` → `ProjectedImage`
/// 2. polygon vertices (>2), further disambiguated by video/image payload
/// 3. id/label containing "sprite" → `3DHotspot`
/// 4. class-name table lookup
/// 5. property-based heuristics (folded into steps above; there are no
///    further properties this crate's `ClassifierInput` exposes)
/// 6. label-pattern table
/// 7. default `Element`
#[must_use]
pub fn classify(input: &ClassifierInput<'_>) -> Classification {
    if input.projected {
        return Classification::Classified(ElementType::ProjectedImage);
    }

    if input.polygon_vertex_count > 2 {
        if input.has_video_payload {
            return Classification::Classified(ElementType::Video);
        }
        if input.has_image_payload {
            return Classification::Classified(ElementType::Image);
        }
        return Classification::Classified(ElementType::Polygon);
    }

    let sprite_marker = input
        .id
        .map(|s| s.to_ascii_lowercase().contains("sprite"))
        .unwrap_or(false)
        || input
            .label
            .map(|s| s.to_ascii_lowercase().contains("sprite"))
            .unwrap_or(false);
    if sprite_marker {
        return Classification::Classified(ElementType::ThreeDHotspot);
    }

    if let Some(class_name) = input.class_name {
        if let Some((_, t)) = CLASS_NAME_TABLE
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(class_name))
        {
            return Classification::Classified(*t);
        }
    }

    if let Some(label) = input.label {
        let lower = label.to_ascii_lowercase();
        if let Some((_, t)) = LABEL_PATTERN_TABLE.iter().find(|(pat, _)| lower.contains(pat)) {
            return Classification::Classified(*t);
        }
    }

    Classification::Unknown
}
