use serde::{Deserialize, Serialize};

/// Discrete progress events emitted while a generation run advances.
/// Steps 3 and 4 share `GeneratingEmails`; there is no dedicated event for
/// the hiring-manager email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStep {
    Idle,
    AnalyzingImage,
    GeneratingResume,
    GeneratingCl,
    GeneratingEmails,
    GeneratingDm,
    CalculatingMetrics,
    Complete,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(ProcessingStep::AnalyzingImage).unwrap(),
            serde_json::json!("analyzing_image")
        );
        assert_eq!(
            serde_json::to_value(ProcessingStep::CalculatingMetrics).unwrap(),
            serde_json::json!("calculating_metrics")
        );
    }

    #[test]
    fn test_error_and_complete_are_distinct_terminal_states() {
        assert_ne!(ProcessingStep::Error, ProcessingStep::Complete);
    }
}
