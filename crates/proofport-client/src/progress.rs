//! Stage progress events for whatever renders the session.

use std::collections::BTreeSet;

use proofport_primitives::stages::{LogKind, LogLine, PipelineStage};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "message")]
pub enum StageStatus {
    Active,
    Completed,
    Failed(String),
}

/// One event on the progress channel. `stage` is `None` for free-form lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub stage: Option<PipelineStage>,
    pub status: Option<StageStatus>,
    pub line: LogLine,
}

/// Emits progress events and remembers which stages completed.
///
/// Sending never fails the session: once the receiver is gone events are
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<UnboundedSender<ProgressEvent>>,
    completed: BTreeSet<PipelineStage>,
    active: Option<PipelineStage>,
}

impl ProgressReporter {
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
            ..Default::default()
        }
    }

    /// A reporter that only keeps track of stage state.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn start(&mut self, stage: PipelineStage) {
        self.active = Some(stage);
        self.emit(ProgressEvent {
            stage: Some(stage),
            status: Some(StageStatus::Active),
            line: LogLine::info(format!("{}...", stage.action())),
        });
    }

    pub fn complete(&mut self, stage: PipelineStage) {
        if self.active == Some(stage) {
            self.active = None;
        }
        self.completed.insert(stage);
        self.emit(ProgressEvent {
            stage: Some(stage),
            status: Some(StageStatus::Completed),
            line: LogLine::new(stage.done(), LogKind::Success),
        });
    }

    pub fn fail(&mut self, stage: PipelineStage, message: impl Into<String>) {
        let message = message.into();
        self.active = None;
        self.emit(ProgressEvent {
            stage: Some(stage),
            status: Some(StageStatus::Failed(message.clone())),
            line: LogLine::new(message, LogKind::Error),
        });
    }

    pub fn log(&self, line: LogLine) {
        self.emit(ProgressEvent {
            stage: None,
            status: None,
            line,
        });
    }

    pub fn is_completed(&self, stage: PipelineStage) -> bool {
        self.completed.contains(&stage)
    }

    pub fn active(&self) -> Option<PipelineStage> {
        self.active
    }

    /// Completed stages in pipeline order.
    pub fn completed(&self) -> Vec<PipelineStage> {
        self.completed.iter().copied().collect()
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.sender {
            if sender.send(event).is_err() {
                tracing::debug!("progress receiver dropped, event discarded");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn tracks_stage_state() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut reporter = ProgressReporter::new(tx);

        reporter.start(PipelineStage::ConnectWallet);
        assert_eq!(reporter.active(), Some(PipelineStage::ConnectWallet));
        reporter.complete(PipelineStage::ConnectWallet);
        reporter.start(PipelineStage::FetchAttestation);
        reporter.fail(PipelineStage::FetchAttestation, "No valid KYC attestation found");

        assert!(reporter.is_completed(PipelineStage::ConnectWallet));
        assert!(!reporter.is_completed(PipelineStage::FetchAttestation));
        assert_eq!(reporter.active(), None);

        let statuses: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| e.status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                StageStatus::Active,
                StageStatus::Completed,
                StageStatus::Active,
                StageStatus::Failed("No valid KYC attestation found".into()),
            ]
        );
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut reporter = ProgressReporter::new(tx);
        reporter.start(PipelineStage::ConnectWallet);
        reporter.complete(PipelineStage::ConnectWallet);
        assert_eq!(reporter.completed(), vec![PipelineStage::ConnectWallet]);
    }
}
