//! The Reconciler (§4.E): matches tour records against business/sheets
//! records, resolves ambiguity, and tracks duplicate consumption for the
//! lifetime of a single build (§3.3, §9 design note — plain sets scoped to
//! one build, never leaked across builds).

use std::collections::HashSet;

use crate::canonical::norm_eq;
use crate::external::{BusinessRecord, SheetsRecord};

/// A minimal view of a tour-derived candidate the reconciler needs, prior to
/// being turned into a full `IndexRecord`.
#[derive(Debug, Clone)]
pub struct TourCandidate<'a> {
    pub subtitle: &'a str,
    pub name: &'a str,
    pub tags: &'a [String],
    pub id: Option<&'a str>,
    pub media_id: Option<&'a str>,
}

/// Scoped duplicate-prevention state for one build. Dropped at the end of
/// the build; never shared between builds (§3.3).
#[derive(Debug, Default)]
pub struct ReconciliationScope {
    consumed_business_ids: HashSet<String>,
    consumed_sheet_ids: HashSet<String>,
    consumed_sheet_tags: HashSet<String>,
    consumed_tour_indices: HashSet<usize>,
}

impl ReconciliationScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the best business record for a tour candidate, in priority
    /// order (§4.E): (1) subtitle == business id; (2) subtitle in
    /// matchTags; (3) tour name == business id; (4) any tour tag in
    /// matchTags. First match wins; already-consumed business ids are
    /// skipped so one business record is not attached twice in a build.
    pub fn match_business<'b>(&mut self, candidate: &TourCandidate<'_>, catalog: &'b [BusinessRecord]) -> Option<&'b BusinessRecord> {
        let available = catalog.iter().filter(|b| !self.consumed_business_ids.contains(&b.id));

        let found = available
            .clone()
            .find(|b| norm_eq(candidate.subtitle, &b.id))
            .or_else(|| available.clone().find(|b| b.match_tags.iter().any(|t| norm_eq(candidate.subtitle, t))))
            .or_else(|| available.clone().find(|b| norm_eq(candidate.name, &b.id)))
            .or_else(|| available.clone().find(|b| candidate.tags.iter().any(|tag| b.match_tags.iter().any(|t| norm_eq(tag, t)))));

        if let Some(b) = found {
            self.consumed_business_ids.insert(b.id.clone());
        }
        found
    }

    /// Finds candidate tour records for a sheets record by confidence
    /// (§4.E): exact id match (3) → tag-in-tags (2) → media-id equality (2)
    /// → exact name match (1). Ties are resolved by keeping the first and
    /// logging a warning, matching the spec's documented tie-break.
    /// Tour-record indices already claimed by an earlier sheets match in
    /// this build are excluded so two sheet rows can never win the same
    /// record (§4.E duplicate prevention).
    pub fn match_sheets_candidates<'t>(
        &self,
        sheet: &SheetsRecord,
        tour_candidates: &[(usize, TourCandidate<'t>)],
    ) -> Vec<(usize, u8)> {
        let mut scored: Vec<(usize, u8)> = tour_candidates
            .iter()
            .filter(|(i, _)| !self.consumed_tour_indices.contains(i))
            .filter_map(|(i, c)| {
                let mut confidence = 0u8;
                if let Some(id) = c.id {
                    if norm_eq(id, &sheet.id) {
                        confidence = confidence.max(3);
                    }
                }
                if !sheet.tag.is_empty() && c.tags.iter().any(|t| norm_eq(t, &sheet.tag)) {
                    confidence = confidence.max(2);
                }
                if let Some(media_id) = c.media_id {
                    if norm_eq(media_id, &sheet.id) {
                        confidence = confidence.max(2);
                    }
                }
                if norm_eq(c.name, &sheet.name) {
                    confidence = confidence.max(1);
                }
                (confidence > 0).then_some((*i, confidence))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        scored
    }

    /// Picks the single best sheets match, applying the tie rule and
    /// recording duplicate-prevention state. Returns `None` when nothing
    /// matched.
    pub fn resolve_best_sheets_match(&mut self, sheet: &SheetsRecord, scored: &[(usize, u8)]) -> Option<usize> {
        let best_confidence = scored.first()?.1;
        let tied: Vec<usize> = scored.iter().filter(|(_, c)| *c == best_confidence).map(|(i, _)| *i).collect();
        if tied.len() > 1 {
            tracing::warn!(sheet_id = %sheet.id, candidates = ?tied, "reconciler: tied sheets match, keeping first");
        }
        let chosen = tied.first().copied();
        if let Some(index) = chosen {
            self.consumed_sheet_ids.insert(sheet.id.clone());
            if !sheet.tag.is_empty() {
                self.consumed_sheet_tags.insert(sheet.tag.clone());
            }
            self.consumed_tour_indices.insert(index);
        }
        chosen
    }

    #[must_use]
    pub fn is_business_consumed(&self, id: &str) -> bool {
        self.consumed_business_ids.contains(id)
    }

    #[must_use]
    pub fn is_sheet_consumed(&self, id: &str) -> bool {
        self.consumed_sheet_ids.contains(id)
    }

    #[must_use]
    pub fn is_sheet_tag_consumed(&self, tag: &str) -> bool {
        !tag.is_empty() && self.consumed_sheet_tags.contains(tag)
    }
}
