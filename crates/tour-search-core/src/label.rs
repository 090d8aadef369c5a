//! The Label Resolver (§4.B): computes a non-empty display label from
//! `(label, subtitle, tags, context)`.

use crate::config::UseAsLabelConfig;
use crate::taxonomy::ElementType;

/// Context carried alongside the raw candidate strings: the record's type
/// and its position (when it has one), needed by the `elementType` fallback.
#[derive(Debug, Clone, Copy)]
pub struct LabelContext {
    pub element_type: ElementType,
    pub index: Option<i64>,
}

/// Resolves a display label, applying the six-rule preference order from
/// §4.B. Invariant 3 (§8): this function never returns an empty string.
#[must_use]
pub fn resolve_label(
    label: Option<&str>,
    subtitle: Option<&str>,
    tags: &[String],
    context: LabelContext,
    use_as_label: &UseAsLabelConfig,
    only_subtitles: bool,
    custom_text: &str,
) -> String {
    let label = label.map(str::trim).filter(|s| !s.is_empty());
    let subtitle = subtitle.map(str::trim).filter(|s| !s.is_empty());

    if only_subtitles {
        if let Some(s) = subtitle {
            return s.to_string();
        }
    }

    if let Some(l) = label {
        return l.to_string();
    }

    if use_as_label.subtitles {
        if let Some(s) = subtitle {
            return s.to_string();
        }
    }

    if use_as_label.tags && !tags.is_empty() {
        return tags.join(", ");
    }

    if use_as_label.element_type {
        return match context.index {
            Some(i) => format!("{} {}", context.element_type, i + 1),
            None => context.element_type.to_string(),
        };
    }

    let fallback = custom_text.trim();
    if fallback.is_empty() {
        "[Unnamed Item]".to_string()
    } else {
        fallback.to_string()
    }
}
