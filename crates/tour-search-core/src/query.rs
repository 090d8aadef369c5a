//! The Query Engine (§4.G): weighted multi-field fuzzy matching, grouping,
//! and deterministic ordering.

use crate::canonical::norm_eq;
use crate::config::{FieldWeights, SearchSettingsConfig};
use crate::fuzzy::{fuzzy_match, FuzzyOptions};
use crate::record::IndexRecord;
use crate::taxonomy::ElementType;

/// The queryable fields of an assembled record, keyed the way §4.F's "keyed
/// on `{label, subtitle, tags, parentLabel, businessTag, businessName}`"
/// describes.
#[derive(Debug, Clone, Default)]
pub struct SearchableFields {
    pub label: String,
    pub subtitle: String,
    pub tags: Vec<String>,
    pub parent_label: String,
    pub business_tag: String,
    pub business_name: String,
}

impl SearchableFields {
    #[must_use]
    pub fn from_record(record: &IndexRecord) -> Self {
        let business_tag = record
            .business_data
            .as_ref()
            .and_then(|v| v.get("matchTags"))
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|x| x.as_str()).collect::<Vec<_>>().join(" "))
            .unwrap_or_default();
        Self {
            label: record.label.clone(),
            subtitle: record.subtitle.clone(),
            tags: record.tags.clone(),
            parent_label: record.parent_label.clone().unwrap_or_default(),
            business_tag,
            business_name: record.business_name.clone().unwrap_or_default(),
        }
    }
}

/// Outcome of a query, distinguishing the UI states named in §4.G and §8
/// (boundary behaviors) from a true result set, matching the "explicit
/// result kinds instead of exceptions for control flow" design note (§9).
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The query string was empty: hide results, clear state.
    Empty,
    /// Shorter than `minSearchChars` and not `"*"`.
    TooShort { min_chars: usize },
    /// A result set, grouped and ordered.
    Results(Vec<ResultGroup>),
}

/// One group of results sharing a group key (§4.G rule 1).
#[derive(Debug, Clone, PartialEq)]
pub struct ResultGroup {
    pub group_key: ElementType,
    pub hits: Vec<ScoredHit>,
}

/// A single scored hit against the index.
#[derive(Debug, Clone)]
pub struct ScoredHit {
    pub record_index: usize,
    pub score: f64,
}

impl PartialEq for ScoredHit {
    fn eq(&self, other: &Self) -> bool {
        self.record_index == other.record_index
    }
}

/// Computes a record's best (lowest) weighted score across all configured
/// fields, or `None` if no field matched within the threshold.
fn best_field_score(fields: &SearchableFields, term: &str, weights: &FieldWeights, opts: &FuzzyOptions) -> Option<f64> {
    let mut best: Option<f64> = None;
    let mut consider = |value: &str, weight: f64| {
        if value.is_empty() || weight <= 0.0 {
            return;
        }
        if let Some(m) = fuzzy_match(value, term, opts) {
            let weighted = m.score / weight;
            best = Some(best.map_or(weighted, |b: f64| b.min(weighted)));
        }
    };

    consider(&fields.label, weights.label);
    consider(&fields.subtitle, weights.subtitle);
    consider(&fields.parent_label, weights.parent_label);
    consider(&fields.business_tag, weights.business_tag);
    consider(&fields.business_name, weights.business_name);
    for tag in &fields.tags {
        consider(tag, weights.tags);
    }
    best
}

/// Runs a query against the supplied fields (already built from the live
/// index; the caller owns how to map `record_index` back to an
/// [`IndexRecord`]). `override_type` lets the caller supply the
/// business/sheets-`elementType` group override for a given record index
/// (§4.G rule 1).
#[must_use]
pub fn query_index(
    term: &str,
    min_search_chars: usize,
    records: &[IndexRecord],
    fields: &[SearchableFields],
    settings: &SearchSettingsConfig,
    override_types: &dyn Fn(usize) -> Option<ElementType>,
) -> QueryOutcome {
    if term.is_empty() {
        return QueryOutcome::Empty;
    }
    if term != "*" && term.chars().count() < min_search_chars {
        return QueryOutcome::TooShort { min_chars: min_search_chars };
    }

    let mut hits: Vec<(usize, f64)> = Vec::new();

    if term == "*" {
        hits.extend(records.iter().enumerate().map(|(i, _)| (i, 0.0)));
    } else if let Some(exact_label) = term.strip_prefix('=') {
        hits.extend(
            records
                .iter()
                .enumerate()
                .filter(|(_, r)| norm_eq(&r.label, exact_label))
                .map(|(i, _)| (i, 0.0)),
        );
    } else {
        let opts = FuzzyOptions {
            threshold: settings.threshold,
            distance: settings.distance,
            min_match_char_length: settings.min_match_char_length,
            ignore_location: settings.ignore_location,
            location: settings.location,
        };
        for (i, field_set) in fields.iter().enumerate() {
            if let Some(score) = best_field_score(field_set, term, &settings.field_weights, &opts) {
                hits.push((i, score));
            }
        }
    }

    QueryOutcome::Results(group_and_sort(records, hits, override_types))
}

/// Applies §4.G rules 2-3: sort within each group by `playlistOrder` then
/// `label` then `parentLabel`; emit groups in the fixed priority order, with
/// unknown groups following.
fn group_and_sort(
    records: &[IndexRecord],
    hits: Vec<(usize, f64)>,
    override_types: &dyn Fn(usize) -> Option<ElementType>,
) -> Vec<ResultGroup> {
    use std::collections::BTreeMap;

    let mut groups: BTreeMap<u8, (ElementType, Vec<ScoredHit>)> = BTreeMap::new();
    for (record_index, score) in hits {
        let record = &records[record_index];
        let key = record.group_key(override_types(record_index));
        groups
            .entry(key.group_priority())
            .or_insert_with(|| (key, Vec::new()))
            .1
            .push(ScoredHit { record_index, score });
    }

    let mut result: Vec<ResultGroup> = groups
        .into_values()
        .map(|(group_key, mut hits)| {
            hits.sort_by(|a, b| {
                let ra = &records[a.record_index];
                let rb = &records[b.record_index];
                ra.playlist_order
                    .cmp(&rb.playlist_order)
                    .then_with(|| ra.label.cmp(&rb.label))
                    .then_with(|| ra.parent_label.cmp(&rb.parent_label))
            });
            ResultGroup { group_key, hits }
        })
        .collect();

    result.sort_by_key(|g| g.group_key.group_priority());
    result
}
