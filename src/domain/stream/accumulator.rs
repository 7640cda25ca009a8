//! Per-stream response accumulator.

use super::event::{StreamEvent, TokenUsage};

/// How a run finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed {
        model: String,
        usage: Option<TokenUsage>,
    },
    Failed {
        code: String,
        message: String,
    },
}

/// Collects text deltas for one stream and records its terminal state.
///
/// Owned by a single stream pump; never shared.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    text: String,
    outcome: Option<RunOutcome>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observes one event. Events after a terminal one are ignored.
    pub fn observe(&mut self, event: &StreamEvent) {
        if self.outcome.is_some() {
            return;
        }
        match event {
            StreamEvent::TextDelta { value } => self.text.push_str(value),
            StreamEvent::End { model, usage } => {
                self.outcome = Some(RunOutcome::Completed {
                    model: model.clone(),
                    usage: *usage,
                });
            }
            StreamEvent::Error { code, message } => {
                self.outcome = Some(RunOutcome::Failed {
                    code: code.clone(),
                    message: message.clone(),
                });
            }
            _ => {}
        }
    }

    pub fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_deltas_in_order() {
        let mut acc = ResponseAccumulator::new();
        acc.observe(&StreamEvent::TextCreated);
        acc.observe(&StreamEvent::TextDelta { value: "Pack failure ".into() });
        acc.observe(&StreamEvent::TextDelta { value: "means loss".into() });
        assert!(!acc.is_finished());
        assert_eq!(acc.into_text(), "Pack failure means loss");
    }

    #[test]
    fn end_records_completion() {
        let mut acc = ResponseAccumulator::new();
        acc.observe(&StreamEvent::End { model: "gpt-4o".into(), usage: None });
        assert_eq!(
            acc.outcome(),
            Some(&RunOutcome::Completed { model: "gpt-4o".into(), usage: None })
        );
    }

    #[test]
    fn events_after_terminal_are_ignored() {
        let mut acc = ResponseAccumulator::new();
        acc.observe(&StreamEvent::error("server_error", "boom"));
        acc.observe(&StreamEvent::TextDelta { value: "late".into() });
        acc.observe(&StreamEvent::End { model: "gpt-4o".into(), usage: None });
        assert!(matches!(acc.outcome(), Some(RunOutcome::Failed { .. })));
        assert_eq!(acc.into_text(), "");
    }
}
