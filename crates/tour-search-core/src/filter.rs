//! The Filter Pipeline (§4.C): eight ordered stages, each short-circuiting
//! rejection. Every stage logs its decision at debug level with the
//! normalized values compared, per spec.

use crate::canonical::{norm, norm_contains, norm_eq, norm_starts_with};
use crate::config::{FilterConfig, FilterMode, IncludeContentConfig, ValueMatchMode};
use crate::taxonomy::ElementType;

/// A filter candidate: the subset of an in-progress record the pipeline
/// needs, independent of whether it has been fully assembled into an
/// [`crate::record::IndexRecord`] yet (the media-index stage runs before a
/// panorama's overlays even exist as candidates).
#[derive(Debug, Clone)]
pub struct FilterCandidate<'a> {
    pub element_type: ElementType,
    pub label: &'a str,
    pub subtitle: &'a str,
    pub tags: &'a [String],
    pub media_index: Option<i64>,
    pub is_panorama: bool,
}

/// Outcome of running the pipeline: either the candidate survives, or it was
/// rejected at a named stage (useful for diagnostics/tests without parsing
/// log lines).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    Accepted,
    Rejected { stage: &'static str },
}

impl FilterOutcome {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

fn value_matches(haystack: &str, needle: &str, mode: ValueMatchMode) -> bool {
    match mode {
        ValueMatchMode::Exact => norm_eq(haystack, needle),
        ValueMatchMode::Contains => norm_contains(haystack, needle),
        ValueMatchMode::StartsWith => norm_starts_with(haystack, needle),
        ValueMatchMode::Regex => regex::Regex::new(needle).is_ok_and(|re| re.is_match(&norm(haystack))),
    }
}

fn set_filter_rejects(mode: FilterMode, values: &[String], present: impl Fn(&str) -> bool) -> bool {
    if values.is_empty() {
        return false;
    }
    match mode {
        FilterMode::None => false,
        FilterMode::Whitelist => !values.iter().any(|v| present(v)),
        FilterMode::Blacklist => values.iter().any(|v| present(v)),
    }
}

/// Runs the full eight-stage pipeline against one candidate. Stage 8 (media
/// index) must be run separately and earlier by the indexer for panoramas,
/// since a rejection there also suppresses overlay enumeration (§4.F); it is
/// still exposed here as [`media_index_stage`] so the indexer and this
/// module share one implementation.
#[must_use]
pub fn run_pipeline(candidate: &FilterCandidate<'_>, cfg: &FilterConfig, include: &IncludeContentConfig) -> FilterOutcome {
    // Stage 1: empty-label policy.
    if cfg.skip_empty_labels && candidate.label.trim().is_empty() {
        tracing::debug!(stage = "empty_label", label = candidate.label, "rejected: empty label");
        return FilterOutcome::Rejected { stage: "empty_label" };
    }
    if candidate.label.trim().len() < cfg.min_label_length {
        tracing::debug!(stage = "min_label_length", label = candidate.label, "rejected: label too short");
        return FilterOutcome::Rejected { stage: "min_label_length" };
    }

    // Stage 2: top-level value filter.
    if cfg.value.mode != FilterMode::None && !cfg.value.values.is_empty() {
        let mode = cfg.value.effective_match_mode();
        let haystacks: Vec<&str> = match cfg.value.scope {
            crate::config::ValueFilterScope::LabelOnly => vec![candidate.label],
            crate::config::ValueFilterScope::LabelAndSubtitle => vec![candidate.label, candidate.subtitle],
        };
        let any_match = cfg.value.values.iter().any(|v| haystacks.iter().any(|h| value_matches(h, v, mode)));
        let rejected = match cfg.value.mode {
            FilterMode::Whitelist => !any_match,
            FilterMode::Blacklist => any_match,
            FilterMode::None => false,
        };
        if rejected {
            tracing::debug!(stage = "value_filter", label = norm(candidate.label), "rejected by value filter");
            return FilterOutcome::Rejected { stage: "value_filter" };
        }
    }

    // Stage 3: element-type filter.
    if set_filter_rejects(cfg.element_types.mode, &cfg.element_types.values, |v| {
        v.eq_ignore_ascii_case(candidate.element_type.as_str())
    }) {
        tracing::debug!(stage = "element_types", r#type = %candidate.element_type, "rejected by type filter");
        return FilterOutcome::Rejected { stage: "element_types" };
    }

    // Stage 4: label filter (always contains-style, per spec wording).
    if set_filter_rejects(cfg.element_labels.mode, &cfg.element_labels.values, |v| {
        norm_contains(candidate.label, v)
    }) {
        tracing::debug!(stage = "element_labels", label = norm(candidate.label), "rejected by label filter");
        return FilterOutcome::Rejected { stage: "element_labels" };
    }

    // Stage 5: tag filter.
    if !cfg.tag_filtering.values.is_empty() {
        let normalized_values: Vec<String> = cfg.tag_filtering.values.iter().map(|v| norm(v)).collect();
        let tag_in_set = |tag: &str| normalized_values.iter().any(|v| v == &norm(tag));
        let rejected = match cfg.tag_filtering.mode {
            FilterMode::None => false,
            FilterMode::Whitelist => candidate.tags.is_empty() || !candidate.tags.iter().any(|t| tag_in_set(t)),
            FilterMode::Blacklist => candidate.tags.iter().any(|t| tag_in_set(t)),
        };
        if rejected {
            tracing::debug!(stage = "tag_filtering", tags = ?candidate.tags, "rejected by tag filter");
            return FilterOutcome::Rejected { stage: "tag_filtering" };
        }
    }

    // Stage 6: per-type inclusion toggle.
    if !include.allows(candidate.element_type) {
        tracing::debug!(stage = "include_content", r#type = %candidate.element_type, "rejected: type disabled");
        return FilterOutcome::Rejected { stage: "include_content" };
    }

    // Stage 7: completely-blank policy.
    let label_blank = candidate.label.trim().is_empty();
    let subtitle_blank = candidate.subtitle.trim().is_empty();
    let tags_blank = candidate.tags.is_empty();
    if label_blank {
        if subtitle_blank && tags_blank {
            if !cfg.completely_blank {
                tracing::debug!(stage = "completely_blank", "rejected: fully blank record");
                return FilterOutcome::Rejected { stage: "completely_blank" };
            }
        } else if !subtitle_blank && tags_blank {
            if !cfg.unlabeled_with_subtitles {
                tracing::debug!(stage = "unlabeled_with_subtitles", "rejected: unlabeled with subtitle only");
                return FilterOutcome::Rejected { stage: "unlabeled_with_subtitles" };
            }
        } else if subtitle_blank && !tags_blank && !cfg.unlabeled_with_tags {
            tracing::debug!(stage = "unlabeled_with_tags", "rejected: unlabeled with tags only");
            return FilterOutcome::Rejected { stage: "unlabeled_with_tags" };
        }
    }

    FilterOutcome::Accepted
}

/// Stage 8: the media-index filter (panoramas only). A rejection here gates
/// whole-panorama processing: the indexer must skip overlay enumeration
/// entirely when this returns `false` (§4.F).
#[must_use]
pub fn media_index_stage(candidate: &FilterCandidate<'_>, cfg: &FilterConfig) -> FilterOutcome {
    if !candidate.is_panorama || cfg.media_indexes.values.is_empty() {
        return FilterOutcome::Accepted;
    }
    let Some(idx) = candidate.media_index else {
        return FilterOutcome::Accepted;
    };
    let idx_str = idx.to_string();
    let in_set = cfg.media_indexes.values.iter().any(|v| v == &idx_str);
    let rejected = match cfg.media_indexes.mode {
        FilterMode::None => false,
        FilterMode::Whitelist => !in_set,
        FilterMode::Blacklist => in_set,
    };
    if rejected {
        tracing::debug!(stage = "media_indexes", media_index = idx, "rejected by media-index filter");
        FilterOutcome::Rejected { stage: "media_indexes" }
    } else {
        FilterOutcome::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SetFilterConfig, ValueFilterConfig};

    fn candidate<'a>(label: &'a str, element_type: ElementType) -> FilterCandidate<'a> {
        FilterCandidate {
            element_type,
            label,
            subtitle: "",
            tags: &[],
            media_index: None,
            is_panorama: false,
        }
    }

    #[test]
    fn empty_label_rejected_when_policy_set() {
        let mut cfg = FilterConfig::default();
        cfg.skip_empty_labels = true;
        let include = IncludeContentConfig::default();
        let outcome = run_pipeline(&candidate("", ElementType::Hotspot), &cfg, &include);
        assert_eq!(outcome, FilterOutcome::Rejected { stage: "empty_label" });
    }

    #[test]
    fn whitelist_value_filter_with_empty_list_is_noop_boundary_behavior() {
        let mut cfg = FilterConfig::default();
        cfg.value = ValueFilterConfig { mode: FilterMode::Whitelist, values: vec![], ..Default::default() };
        let include = IncludeContentConfig::default();
        let outcome = run_pipeline(&candidate("Anything", ElementType::Panorama), &cfg, &include);
        assert!(outcome.is_accepted());
    }

    #[test]
    fn blacklist_value_filter_matching_everything_empties_results() {
        let mut cfg = FilterConfig::default();
        cfg.value = ValueFilterConfig {
            mode: FilterMode::Blacklist,
            values: vec!["room".to_string()],
            match_mode: Some(ValueMatchMode::Contains),
            ..Default::default()
        };
        let include = IncludeContentConfig::default();
        let outcome = run_pipeline(&candidate("Conference Room", ElementType::Panorama), &cfg, &include);
        assert_eq!(outcome, FilterOutcome::Rejected { stage: "value_filter" });
    }

    #[test]
    fn element_type_whitelist_keeps_only_allowed_types() {
        let mut cfg = FilterConfig::default();
        cfg.element_types = SetFilterConfig { mode: FilterMode::Whitelist, values: vec!["Panorama".to_string()] };
        let include = IncludeContentConfig::default();
        assert!(run_pipeline(&candidate("Lobby", ElementType::Panorama), &cfg, &include).is_accepted());
        assert!(!run_pipeline(&candidate("Painting A", ElementType::Hotspot), &cfg, &include).is_accepted());
    }

    #[test]
    fn tag_filter_whitelist_requires_at_least_one_allowed_tag() {
        let mut cfg = FilterConfig::default();
        cfg.tag_filtering = SetFilterConfig { mode: FilterMode::Whitelist, values: vec!["kiosk".to_string()] };
        let include = IncludeContentConfig::default();
        let tags = vec!["kiosk".to_string()];
        let mut c = candidate("X", ElementType::Element);
        c.tags = &tags;
        assert!(run_pipeline(&c, &cfg, &include).is_accepted());

        let empty_tags: Vec<String> = vec![];
        let mut c2 = candidate("X", ElementType::Element);
        c2.tags = &empty_tags;
        assert!(!run_pipeline(&c2, &cfg, &include).is_accepted());
    }

    #[test]
    fn include_content_toggle_rejects_disabled_type() {
        let cfg = FilterConfig::default();
        let mut include = IncludeContentConfig::default();
        include.include_hotspot = false;
        let outcome = run_pipeline(&candidate("Painting A", ElementType::Hotspot), &cfg, &include);
        assert_eq!(outcome, FilterOutcome::Rejected { stage: "include_content" });
    }

    #[test]
    fn completely_blank_record_rejected_unless_allowed() {
        let cfg = FilterConfig::default();
        let include = IncludeContentConfig::default();
        let outcome = run_pipeline(&candidate("", ElementType::Element), &cfg, &include);
        assert_eq!(outcome, FilterOutcome::Rejected { stage: "completely_blank" });

        let mut cfg2 = FilterConfig::default();
        cfg2.completely_blank = true;
        assert!(run_pipeline(&candidate("", ElementType::Element), &cfg2, &include).is_accepted());
    }

    #[test]
    fn media_index_stage_gates_whole_panorama() {
        let mut cfg = FilterConfig::default();
        cfg.media_indexes = SetFilterConfig { mode: FilterMode::Whitelist, values: vec!["2".to_string()] };
        let mut c = candidate("Lobby", ElementType::Panorama);
        c.is_panorama = true;
        c.media_index = Some(0);
        assert_eq!(media_index_stage(&c, &cfg), FilterOutcome::Rejected { stage: "media_indexes" });

        c.media_index = Some(2);
        assert!(media_index_stage(&c, &cfg).is_accepted());
    }

    #[test]
    fn min_label_length_rejects_short_labels() {
        let mut cfg = FilterConfig::default();
        cfg.min_label_length = 3;
        let include = IncludeContentConfig::default();
        let outcome = run_pipeline(&candidate("ab", ElementType::Element), &cfg, &include);
        assert_eq!(outcome, FilterOutcome::Rejected { stage: "min_label_length" });
    }
}
