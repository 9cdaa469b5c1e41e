// ABOUTME: Export of analysis results, validation reports, and design analyses
// ABOUTME: Renders pretty JSON, plain-text, and Markdown reports

use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::design::DesignAnalysis;
use crate::error::{AnalyzerError, Result};
use crate::types::{AnalysisResult, Requirement};
use crate::validator::ValidationReport;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Text,
    Markdown,
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Text => write!(f, "text"),
            ExportFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "text" | "txt" => Ok(ExportFormat::Text),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => Err(AnalyzerError::InvalidInput(format!(
                "unknown export format: {}",
                other
            ))),
        }
    }
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Text => "text/plain",
            ExportFormat::Markdown => "text/markdown",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Text => "txt",
            ExportFormat::Markdown => "md",
        }
    }
}

/// Export result with content and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    pub format: ExportFormat,
    pub content: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

impl ExportResult {
    fn new(format: ExportFormat, content: String, stem: &str) -> Self {
        Self {
            format,
            file_name: format!("{}.{}", stem, format.extension()),
            mime_type: format.mime_type().to_string(),
            size_bytes: content.len(),
            content,
        }
    }
}

/// Export an analysis result
pub fn export_analysis(analysis: &AnalysisResult, format: ExportFormat) -> Result<ExportResult> {
    info!("Exporting analysis in {} format", format);
    let content = match format {
        ExportFormat::Json => serde_json::to_string_pretty(analysis)?,
        ExportFormat::Text => analysis_text(analysis),
        ExportFormat::Markdown => analysis_markdown(analysis),
    };
    Ok(ExportResult::new(format, content, "requirements-analysis"))
}

/// Export a validation report
pub fn export_validation(report: &ValidationReport, format: ExportFormat) -> Result<ExportResult> {
    info!("Exporting validation report in {} format", format);
    let content = match format {
        ExportFormat::Json => serde_json::to_string_pretty(report)?,
        ExportFormat::Text => validation_text(report),
        ExportFormat::Markdown => validation_markdown(report),
    };
    Ok(ExportResult::new(format, content, "validation-report"))
}

/// Export a design image analysis
pub fn export_design(analysis: &DesignAnalysis, format: ExportFormat) -> Result<ExportResult> {
    info!("Exporting design analysis in {} format", format);
    let content = match format {
        ExportFormat::Json => serde_json::to_string_pretty(analysis)?,
        ExportFormat::Text => design_text(analysis),
        ExportFormat::Markdown => design_markdown(analysis),
    };
    Ok(ExportResult::new(format, content, "design-analysis"))
}

fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

fn requirement_line(r: &Requirement) -> String {
    let effort = r
        .estimated_effort
        .map(|e| format!(", effort {}", e.as_str()))
        .unwrap_or_default();
    format!(
        "{} [{} / {} / {}{}]",
        r.title,
        r.requirement_type,
        r.priority.as_str(),
        r.status,
        effort
    )
}

/// Plain-text analysis report
pub fn analysis_text(analysis: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "REQUIREMENTS ANALYSIS");
    let _ = writeln!(out, "=====================");
    let _ = writeln!(out);
    if !analysis.project_overview.is_empty() {
        let _ = writeln!(out, "Overview: {}", analysis.project_overview);
    }
    if !analysis.target_audience.is_empty() {
        let _ = writeln!(out, "Audience: {}", analysis.target_audience);
    }
    let _ = writeln!(out, "Platform: {}", analysis.platform);
    let _ = writeln!(
        out,
        "Scores: completeness {}, clarity {}, feasibility {}",
        percent(analysis.completeness_score),
        percent(analysis.clarity_score),
        percent(analysis.feasibility_score)
    );
    if let Some(effort) = &analysis.total_estimated_effort {
        let _ = writeln!(out, "Estimated effort: {}", effort);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Requirements ({}):", analysis.requirements.len());
    for (i, r) in analysis.requirements.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, requirement_line(r));
        if !r.description.is_empty() {
            let _ = writeln!(out, "     {}", r.description);
        }
        for criterion in &r.acceptance_criteria {
            let _ = writeln!(out, "     - {}", criterion);
        }
    }

    text_section(&mut out, "Gaps", &analysis.gaps);
    text_section(&mut out, "Ambiguities", &analysis.ambiguities);
    text_section(&mut out, "Recommendations", &analysis.recommendations);
    text_section(&mut out, "Frameworks", &analysis.framework_recommendations);

    if !analysis.development_phases.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Development phases:");
        for phase in &analysis.development_phases {
            let _ = writeln!(
                out,
                "  {} ({} requirements, {}): {}",
                phase.name,
                phase.requirements.len(),
                phase.estimated_duration,
                phase.description
            );
        }
    }
    out
}

fn text_section(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}:", heading);
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

/// Markdown analysis report
pub fn analysis_markdown(analysis: &AnalysisResult) -> String {
    let mut md = String::from("# Requirements Analysis\n\n");
    if !analysis.project_overview.is_empty() {
        let _ = writeln!(md, "{}\n", analysis.project_overview);
    }
    let _ = writeln!(md, "| Metric | Value |\n|---|---|");
    let _ = writeln!(md, "| Platform | {} |", analysis.platform);
    let _ = writeln!(md, "| Completeness | {} |", percent(analysis.completeness_score));
    let _ = writeln!(md, "| Clarity | {} |", percent(analysis.clarity_score));
    let _ = writeln!(md, "| Feasibility | {} |", percent(analysis.feasibility_score));
    if let Some(effort) = &analysis.total_estimated_effort {
        let _ = writeln!(md, "| Estimated effort | {} |", effort);
    }

    md.push_str("\n## Requirements\n\n");
    for r in &analysis.requirements {
        let _ = writeln!(md, "### {}\n", r.title);
        let _ = writeln!(
            md,
            "*{}* · priority **{}** · {}\n",
            r.requirement_type,
            r.priority.as_str(),
            r.status
        );
        if !r.description.is_empty() {
            let _ = writeln!(md, "{}\n", r.description);
        }
        for criterion in &r.acceptance_criteria {
            let _ = writeln!(md, "- [ ] {}", criterion);
        }
        if !r.acceptance_criteria.is_empty() {
            md.push('\n');
        }
    }

    markdown_section(&mut md, "Gaps", &analysis.gaps);
    markdown_section(&mut md, "Ambiguities", &analysis.ambiguities);
    markdown_section(&mut md, "Recommendations", &analysis.recommendations);
    md
}

fn markdown_section(md: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(md, "## {}\n", heading);
    for item in items {
        let _ = writeln!(md, "- {}", item);
    }
    md.push('\n');
}

/// Plain-text validation report
pub fn validation_text(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "VALIDATION REPORT");
    let _ = writeln!(out, "=================");
    let _ = writeln!(out);
    let _ = writeln!(out, "Overall score: {}", percent(report.overall_score));
    let _ = writeln!(
        out,
        "  requirements quality {}, project structure {}, completeness {}",
        percent(report.category_scores.requirements_quality),
        percent(report.category_scores.project_structure),
        percent(report.category_scores.completeness)
    );
    let _ = writeln!(out, "Result: {}", if report.passed() { "PASSED" } else { "FAILED" });

    let issues: Vec<String> = report.issues.iter().map(ToString::to_string).collect();
    let warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();
    text_section(&mut out, "Issues", &issues);
    text_section(&mut out, "Warnings", &warnings);
    text_section(&mut out, "Recommendations", &report.recommendations);
    out
}

/// Markdown validation report
pub fn validation_markdown(report: &ValidationReport) -> String {
    let mut md = String::from("# Validation Report\n\n");
    let _ = writeln!(md, "**Overall score:** {}\n", percent(report.overall_score));
    let _ = writeln!(md, "| Category | Score |\n|---|---|");
    let _ = writeln!(
        md,
        "| Requirements quality | {} |",
        percent(report.category_scores.requirements_quality)
    );
    let _ = writeln!(
        md,
        "| Project structure | {} |",
        percent(report.category_scores.project_structure)
    );
    let _ = writeln!(md, "| Completeness | {} |\n", percent(report.category_scores.completeness));

    let issues: Vec<String> = report.issues.iter().map(ToString::to_string).collect();
    let warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();
    markdown_section(&mut md, "Issues", &issues);
    markdown_section(&mut md, "Warnings", &warnings);
    markdown_section(&mut md, "Recommendations", &report.recommendations);
    md
}

fn px(values: &[u32]) -> String {
    values
        .iter()
        .map(|v| format!("{}px", v))
        .collect::<Vec<_>>()
        .join(", ")
}

fn design_values(analysis: &DesignAnalysis) -> Vec<String> {
    let specs = &analysis.frontend_specs;
    let mut lines = Vec::new();
    let colors: Vec<&str> = specs
        .colors
        .hex
        .iter()
        .chain(&specs.colors.rgb)
        .map(String::as_str)
        .collect();
    if !colors.is_empty() {
        lines.push(format!("Colors: {}", colors.join(", ")));
    }
    if !specs.typography.font_sizes_px.is_empty() {
        lines.push(format!("Font sizes: {}", px(&specs.typography.font_sizes_px)));
    }
    if !specs.layout.dimensions_px.is_empty() {
        lines.push(format!("Layout dimensions: {}", px(&specs.layout.dimensions_px)));
    }
    if !specs.components.border_radius_px.is_empty() {
        lines.push(format!("Border radius: {}", px(&specs.components.border_radius_px)));
    }
    let spacing: Vec<u32> = specs
        .spacing
        .margins_px
        .iter()
        .chain(&specs.spacing.paddings_px)
        .chain(&specs.spacing.gaps_px)
        .copied()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    if !spacing.is_empty() {
        lines.push(format!("Spacing: {}", px(&spacing)));
    }
    lines
}

/// Plain-text design analysis report
pub fn design_text(analysis: &DesignAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "DESIGN ANALYSIS ({})", analysis.analysis_type);
    let _ = writeln!(out, "===============");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Confidence {}, specs completeness {}",
        percent(analysis.metadata.confidence_score),
        percent(analysis.metadata.specs_completeness)
    );
    for section in &analysis.sections {
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}]", section.key);
        let _ = writeln!(out, "{}", section.content);
    }

    text_section(&mut out, "Frontend specs", &design_values(analysis));
    let variables: Vec<String> = analysis
        .implementation_guide
        .css_variables
        .iter()
        .map(|v| format!("{}: {};", v.name, v.value))
        .collect();
    text_section(&mut out, "CSS variables", &variables);
    let breakpoints: Vec<String> = analysis
        .implementation_guide
        .breakpoints
        .iter()
        .map(|(name, query)| format!("{}: @media ({})", name, query))
        .collect();
    text_section(&mut out, "Breakpoints", &breakpoints);
    text_section(&mut out, "Component classes", &analysis.implementation_guide.component_classes);
    text_section(&mut out, "Checklist", &analysis.implementation_guide.development_checklist);
    out
}

/// Markdown design analysis report
pub fn design_markdown(analysis: &DesignAnalysis) -> String {
    let mut md = String::from("# Design Analysis\n\n");
    let _ = writeln!(md, "| Metric | Value |\n|---|---|");
    let _ = writeln!(md, "| Analysis type | {} |", analysis.analysis_type);
    if !analysis.metadata.model.is_empty() {
        let _ = writeln!(md, "| Model | {} |", analysis.metadata.model);
    }
    let _ = writeln!(md, "| Confidence | {} |", percent(analysis.metadata.confidence_score));
    let _ = writeln!(
        md,
        "| Specs completeness | {} |\n",
        percent(analysis.metadata.specs_completeness)
    );

    for section in &analysis.sections {
        let _ = writeln!(md, "## {}\n", section.key);
        let _ = writeln!(md, "{}\n", section.content);
    }

    markdown_section(&mut md, "Frontend Specs", &design_values(analysis));
    let guide = &analysis.implementation_guide;
    if !guide.css_variables.is_empty() {
        md.push_str("## CSS Variables\n\n```css\n:root {\n");
        for variable in &guide.css_variables {
            let _ = writeln!(md, "  {}: {};", variable.name, variable.value);
        }
        md.push_str("}\n```\n\n");
    }
    let breakpoints: Vec<String> = guide
        .breakpoints
        .iter()
        .map(|(name, query)| format!("{}: `@media ({})`", name, query))
        .collect();
    markdown_section(&mut md, "Breakpoints", &breakpoints);
    let classes: Vec<String> = guide.component_classes.iter().map(|c| format!("`{}`", c)).collect();
    markdown_section(&mut md, "Component Classes", &classes);
    if !guide.development_checklist.is_empty() {
        md.push_str("## Checklist\n\n");
        for item in &guide.development_checklist {
            let _ = writeln!(md, "- [ ] {}", item);
        }
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design::{structure_design, DesignAnalysisType};
    use crate::validator::AnalysisValidator;
    use pretty_assertions::assert_eq;

    fn sample() -> AnalysisResult {
        let mut login = Requirement::new("req-1", "Login");
        login.description = "Users sign in with email and password".into();
        login.acceptance_criteria = vec!["Wrong password shows an error".into()];
        AnalysisResult {
            requirements: vec![login],
            project_overview: "Task manager".into(),
            gaps: vec!["No styling requirements".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_json_export_round_trips() {
        let analysis = sample();
        let export = export_analysis(&analysis, ExportFormat::Json).unwrap();
        assert_eq!(export.file_name, "requirements-analysis.json");
        assert_eq!(export.mime_type, "application/json");
        assert_eq!(export.size_bytes, export.content.len());

        let parsed: AnalysisResult = serde_json::from_str(&export.content).unwrap();
        assert_eq!(parsed, analysis);
    }

    #[test]
    fn test_text_export_lists_requirements_and_gaps() {
        let text = analysis_text(&sample());
        assert!(text.contains("Overview: Task manager"));
        assert!(text.contains("1. Login [functional / medium"));
        assert!(text.contains("     - Wrong password shows an error"));
        assert!(text.contains("Gaps:\n  - No styling requirements"));
    }

    #[test]
    fn test_validation_text_reports_result() {
        let report = AnalysisValidator::new().validate(&AnalysisResult::default());
        let text = validation_text(&report);
        assert!(text.contains("Result: FAILED"));
        assert!(text.contains("No requirements found"));
    }

    #[test]
    fn test_design_export_formats() {
        let mut design = structure_design(
            "## Colors\nPrimary #1A73E8\n## Components\nButtons use border-radius: 8px on desktop",
            DesignAnalysisType::Full,
        );
        design.metadata.model = "gpt-4o".into();

        let markdown = export_design(&design, ExportFormat::Markdown).unwrap();
        assert_eq!(markdown.file_name, "design-analysis.md");
        assert!(markdown.content.contains("| Model | gpt-4o |"));
        assert!(markdown.content.contains("  --color-1: #1a73e8;"));
        assert!(markdown.content.contains("- desktop: `@media (min-width: 1024px)`"));
        assert!(markdown.content.contains("- [ ] Apply the typography scale"));

        let text = design_text(&design);
        assert!(text.contains("DESIGN ANALYSIS (full)"));
        assert!(text.contains("[colors]\nPrimary #1A73E8"));
        assert!(text.contains("  - Colors: #1a73e8"));
        assert!(text.contains("  - Border radius: 8px"));

        let json = export_design(&design, ExportFormat::Json).unwrap();
        let parsed: DesignAnalysis = serde_json::from_str(&json.content).unwrap();
        assert_eq!(parsed, design);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Markdown);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
