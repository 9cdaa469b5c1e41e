// ABOUTME: Tests for terminal rendering helpers
// ABOUTME: Checks score labels, tables, and progress lines with colors disabled

use crate::render::{
    design_specs_table, progress_line, providers_table, requirements_table, score_label,
};
use rstest::rstest;
use uieasy_analyzer::{
    structure_design, structure_response, AnalysisRequest, DesignAnalysisType, ModelStage,
    NormalizationStrategy, Platform, ProgressEvent,
};
use uieasy_config::{Config, ModelConfig};

#[test]
fn test_requirements_table_lists_titles() {
    colored::control::set_override(false);
    let analysis = structure_response(
        r#"[{"title": "Login", "description": "Users sign in with email", "priority": "high"},
            {"title": "Task list", "description": "Shows all open tasks", "type": "layout"}]"#,
        &AnalysisRequest::new("login and tasks", Platform::Web),
    );

    let rendered = requirements_table(&analysis).to_string();
    assert!(rendered.contains("Login"));
    assert!(rendered.contains("Task list"));
    assert!(rendered.contains("layout"));
    assert!(rendered.contains("high"));
}

#[test]
fn test_design_specs_table_lists_values() {
    colored::control::set_override(false);
    let analysis = structure_design(
        "## Colors\nPrimary #1A73E8\n## Typography\nBody 16px, font-weight: 400",
        DesignAnalysisType::Full,
    );

    let rendered = design_specs_table(&analysis).to_string();
    assert!(rendered.contains("#1a73e8"));
    assert!(rendered.contains("16px"));
    assert!(rendered.contains("400"));
    assert!(rendered.contains("Border radius"));
}

#[rstest]
#[case(0.9, "90%")]
#[case(0.5, "50%")]
#[case(0.0, "0%")]
fn test_score_label_text(#[case] score: f64, #[case] expected: &str) {
    colored::control::set_override(false);
    assert_eq!(score_label(score).to_string(), expected);
}

#[test]
fn test_providers_table_shows_key_state() {
    colored::control::set_override(false);
    let mut config = Config::default();
    let mut openai = ModelConfig::new("default", "openai");
    openai.api_key = "sk-test".to_string();
    openai.model_id = "gpt-4o".to_string();
    config.set_model_config(openai);

    let providers = vec!["deepseek".to_string(), "openai".to_string()];
    let rendered = providers_table(&providers, &config).to_string();

    assert!(rendered.contains("gpt-4o"));
    assert!(rendered.contains("set"));
    assert!(rendered.contains("deepseek"));
}

#[rstest]
#[case(ProgressEvent::Started, Some("Starting analysis"))]
#[case(
    ProgressEvent::ModelCallStarted { stage: ModelStage::Overview },
    Some("Requesting overview from model")
)]
#[case(
    ProgressEvent::NormalizationCompleted { strategy: NormalizationStrategy::StrictJson },
    Some("Parsed response (strict_json)")
)]
#[case(
    ProgressEvent::ModelCallCompleted { stage: ModelStage::Design },
    Some("Received design response")
)]
#[case(ProgressEvent::RequirementsBuilt { count: 3 }, Some("Built 3 requirements"))]
#[case(ProgressEvent::StreamChunk { text: "{".to_string() }, None)]
fn test_progress_lines(#[case] event: ProgressEvent, #[case] expected: Option<&str>) {
    assert_eq!(progress_line(&event).as_deref(), expected);
}
