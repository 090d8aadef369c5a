//! The `IndexRecord` data model (§3.2) and the closed boost table.

use serde::{Deserialize, Serialize};

use crate::taxonomy::ElementType;

/// Where a record originated, driving reconciliation precedence (§4.E) and
/// the navigation dispatcher's playlist lookup (§4.H step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Main,
    Root,
    Sheets,
    Container,
    Business,
}

/// Camera shortcut angles, present when the dispatcher can skip playlist
/// selection entirely (§4.H step 1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub yaw: f64,
    pub pitch: f64,
    /// Defaults to 70 when the source overlay did not carry a field-of-view.
    #[serde(default = "default_fov")]
    pub fov: f64,
}

const fn default_fov() -> f64 {
    70.0
}

impl Camera {
    /// A shortcut only fires when both yaw and pitch are finite (§4.H step 1).
    #[must_use]
    pub fn is_navigable(&self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite()
    }
}

/// Boost tier, assigned from the closed table in §3.2:
/// `businessMatch > sheetsMatch > labeledItem > unlabeledItem > childElement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BoostTier {
    ChildElement,
    UnlabeledItem,
    LabeledItem,
    SheetsMatch,
    BusinessMatch,
}

impl BoostTier {
    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Self::ChildElement => 0.5,
            Self::UnlabeledItem => 0.8,
            Self::LabeledItem => 1.0,
            Self::SheetsMatch => 1.2,
            Self::BusinessMatch => 1.5,
        }
    }
}

/// Opaque handle the navigation dispatcher uses to get back to the live tour
/// node this record was produced from. Standalone records (`is_standalone ==
/// true`) never carry one; navigation falls back to id/tag lookup (§3.2,
/// §4.H step 3).
pub type ItemRef = u64;

/// The unit of the search index (§3.2). Field names mirror the spec's wire
/// vocabulary so that `serde` round-trips preserve the external contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    pub r#type: ElementType,
    pub source: RecordSource,
    pub label: String,
    pub original_label: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub playlist_order: i64,
    pub boost: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheets_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<Camera>,
    #[serde(default)]
    pub is_standalone: bool,
    #[serde(default)]
    pub is_enhanced: bool,
    #[serde(default)]
    pub is_container: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemRef>,
}

impl IndexRecord {
    /// Playlist-order encoding for a child overlay/3D object (§4.F):
    /// `parent_index * 1000 + child_index`.
    #[must_use]
    pub const fn child_playlist_order(parent_index: i64, child_index: i64) -> i64 {
        parent_index * 1000 + child_index
    }

    /// Group key for the query engine (§4.G rule 1): the record's own type,
    /// unless `override_type` (business/sheets `elementType` under a
    /// replace-flag, or the business-only-standalone case) says otherwise.
    #[must_use]
    pub fn group_key(&self, override_type: Option<ElementType>) -> ElementType {
        override_type.unwrap_or(self.r#type)
    }

    /// Invariant 1 (§8): `type` is always a taxonomy member — trivially true
    /// given the enum, kept as a callable check so builders that assemble a
    /// record field-by-field can assert it explicitly.
    #[must_use]
    pub fn type_is_valid(&self) -> bool {
        ElementType::ALL.contains(&self.r#type)
    }
}
