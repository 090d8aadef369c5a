//! Diagnostics sink (supplemented feature): classification fallbacks,
//! filter-stage rejections, reconciliation ambiguity, and activation
//! failures are all observable through one `Vec<Diagnostic>` drained per
//! build/activation, in addition to the `tracing` events already emitted at
//! each of those sites. A host page that never installs a `tracing`
//! subscriber (the common case for a widget embedded in someone else's
//! tour) can still show a "3 overlays were hidden by your filter" banner by
//! draining the sink instead.

/// What kind of thing produced a [`Diagnostic`]. Kept as a closed enum
/// rather than a free-form string so callers can filter/count by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// An overlay's class name matched none of the taxonomy's patterns and
    /// fell back to [`crate::taxonomy::ElementType::Element`] (§4.A).
    UnknownElementType,
    /// A candidate was rejected at a named filter-pipeline stage (§4.C).
    FilterRejection,
    /// A business or sheets record matched more than one tour candidate
    /// equally well and the reconciler had to pick one (§4.E).
    ReconciliationAmbiguity,
    /// [`crate::navigate::plan_activation`] or a trigger attempt could not
    /// resolve or activate its target (§4.H).
    ActivationFailure,
}

/// One recorded event. `stage` carries the filter-pipeline stage name for
/// [`DiagnosticKind::FilterRejection`] and is empty for every other kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub stage: &'static str,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn unknown_element_type(label: &str) -> Self {
        Self { kind: DiagnosticKind::UnknownElementType, stage: "", message: format!("unrecognized class for \"{label}\", classified as Element") }
    }

    #[must_use]
    pub fn filter_rejection(stage: &'static str, label: &str) -> Self {
        Self { kind: DiagnosticKind::FilterRejection, stage, message: format!("\"{label}\" rejected at {stage} stage") }
    }

    #[must_use]
    pub fn reconciliation_ambiguity(message: impl Into<String>) -> Self {
        Self { kind: DiagnosticKind::ReconciliationAmbiguity, stage: "", message: message.into() }
    }

    #[must_use]
    pub fn activation_failure(message: impl Into<String>) -> Self {
        Self { kind: DiagnosticKind::ActivationFailure, stage: "", message: message.into() }
    }
}

/// Accumulates [`Diagnostic`]s over the course of one build or activation.
/// Drained (not cleared-and-ignored) by the caller, so nothing is lost
/// between drains: `drain` hands back everything collected since the last
/// call and leaves the sink empty for the next one.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Vec<Diagnostic>,
}

impl DiagnosticSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    #[must_use]
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
