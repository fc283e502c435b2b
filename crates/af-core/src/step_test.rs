use super::*;

#[test]
fn test_step_lifecycle_stamps_times() {
    let mut step = AnalysisStep::new(StepKind::StaticAnalysis);
    assert_eq!(step.status, StepStatus::Pending);

    assert!(step.transition(StepStatus::Running));
    assert!(step.started_at.is_some());
    assert!(step.ended_at.is_none());

    assert!(step.finish(StepStatus::Succeeded, "3 findings"));
    assert!(step.ended_at.is_some());
    assert_eq!(step.message.as_deref(), Some("3 findings"));
}

#[test]
fn test_transitions_are_monotonic() {
    let mut step = AnalysisStep::new(StepKind::Index);
    assert!(!step.transition(StepStatus::Succeeded));
    assert!(step.transition(StepStatus::Running));
    assert!(!step.transition(StepStatus::Pending));
    assert!(step.transition(StepStatus::Failed));
    assert!(!step.transition(StepStatus::Running));
    assert!(!step.finish(StepStatus::Succeeded, "late"));
    assert_eq!(step.status, StepStatus::Failed);
    assert!(step.message.is_none());
}

#[test]
fn test_pending_step_can_be_skipped_directly() {
    let mut step = AnalysisStep::new(StepKind::DynamicAnalysis);
    assert!(step.finish(StepStatus::Skipped, "pipeline timeout"));
    assert!(step.started_at.is_none());
    assert_eq!(step.duration_ms, 0);
}

#[test]
fn test_severity_from_label() {
    assert_eq!(Severity::from_label("High"), Severity::High);
    assert_eq!(Severity::from_label("Optimization"), Severity::Optimization);
    assert_eq!(Severity::from_label("weird"), Severity::Informational);
    assert!(Severity::Critical.is_high_or_critical());
    assert!(!Severity::Medium.is_high_or_critical());
    assert!(Severity::Critical < Severity::Low);
}

#[test]
fn test_step_kind_names_round_trip() {
    for kind in [
        StepKind::Fetch,
        StepKind::Index,
        StepKind::StaticAnalysis,
        StepKind::DependencyGraph,
        StepKind::DynamicAnalysis,
        StepKind::Aggregate,
    ] {
        assert_eq!(StepKind::parse(kind.as_str()), Some(kind));
        assert_eq!(
            serde_json::to_value(kind).unwrap(),
            serde_json::Value::String(kind.to_string())
        );
    }
}

#[test]
fn test_status_serializes_snake_case() {
    assert_eq!(
        serde_json::to_value(StepStatus::TimedOut).unwrap(),
        serde_json::json!("timed_out")
    );
}
