//! Run report.

use serde::Serialize;
use tspub_core::PublishError;

use crate::pipeline::PipelineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    File,
    Preview,
    Certification,
}

/// What happened to one file, preview or certification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Attached,
    /// Attached by an earlier run, recorded in the checkpoint.
    Resumed,
    Failed { code: String, error: String },
    /// Not attempted because the run halted first.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    pub kind: ItemKind,
    pub name: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Structured outcome of a publishing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub draft_id: Option<String>,
    pub state: PipelineState,
    pub product_id: Option<String>,
    pub items: Vec<ItemReport>,
    /// Failure that stopped the run outside of a single item (e.g. a refused publish).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublishReport {
    pub fn new(state: PipelineState) -> Self {
        Self {
            draft_id: None,
            state,
            product_id: None,
            items: Vec::new(),
            error: None,
        }
    }

    pub fn record(&mut self, kind: ItemKind, name: impl Into<String>, outcome: ItemOutcome) {
        self.items.push(ItemReport {
            kind,
            name: name.into(),
            outcome,
        });
    }

    pub fn record_failure(&mut self, kind: ItemKind, name: impl Into<String>, err: &PublishError) {
        self.record(
            kind,
            name,
            ItemOutcome::Failed {
                code: err.error_code().to_string(),
                error: err.to_string(),
            },
        );
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemReport> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, ItemOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// No item failed and no run-level error was recorded.
    pub fn is_success(&self) -> bool {
        !self.has_failures() && self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_flat_outcomes() {
        let mut report = PublishReport::new(PipelineState::FilesAttached);
        report.draft_id = Some("555".into());
        report.record(ItemKind::File, "chair.max", ItemOutcome::Attached);
        report.record_failure(
            ItemKind::Preview,
            "turntable",
            &PublishError::Validation("empty directory".into()),
        );

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["state"], "files_attached");
        assert_eq!(value["items"][0]["outcome"], "attached");
        assert_eq!(value["items"][1]["outcome"], "failed");
        assert_eq!(value["items"][1]["code"], "VALIDATION_ERROR");
        assert!(value.get("error").is_none());

        assert!(report.has_failures());
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
    }
}
