// ABOUTME: Terminal rendering of analyses, design analyses, validation reports, providers, and progress
// ABOUTME: Colored summaries and comfy-table tables for interactive output

use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use uieasy_analyzer::{
    AnalysisResult, DesignAnalysis, ProgressEvent, RequirementPriority, RequirementStatus,
    ValidationReport,
};
use uieasy_config::Config;

const MAX_DESCRIPTION_CHARS: usize = 60;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

/// Score as a percentage, green/yellow/red by band
pub fn score_label(score: f64) -> ColoredString {
    let label = format!("{:.0}%", score * 100.0);
    if score >= 0.8 {
        label.green()
    } else if score >= 0.5 {
        label.yellow()
    } else {
        label.red()
    }
}

fn priority_label(priority: RequirementPriority) -> ColoredString {
    match priority {
        RequirementPriority::Critical => priority.as_str().red().bold(),
        RequirementPriority::High => priority.as_str().yellow(),
        RequirementPriority::Medium => priority.as_str().normal(),
        RequirementPriority::Low => priority.as_str().dimmed(),
    }
}

fn status_label(status: RequirementStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        RequirementStatus::Analyzed | RequirementStatus::Validated | RequirementStatus::Ready => {
            text.green()
        }
        RequirementStatus::Incomplete | RequirementStatus::Ambiguous => text.yellow(),
        RequirementStatus::Identified => text.normal(),
    }
}

/// One row per requirement
pub fn requirements_table(analysis: &AnalysisResult) -> Table {
    let mut table = new_table();
    table.set_header(vec!["#", "Title", "Type", "Priority", "Status", "Effort", "Description"]);

    for (index, requirement) in analysis.requirements.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            requirement.title.clone(),
            requirement.requirement_type.to_string(),
            priority_label(requirement.priority).to_string(),
            status_label(requirement.status).to_string(),
            requirement
                .estimated_effort
                .map(|e| e.to_string())
                .unwrap_or_else(|| "-".to_string()),
            truncate(&requirement.description, MAX_DESCRIPTION_CHARS),
        ]);
    }
    table
}

fn print_list(heading: &str, items: &[String], marker: ColoredString) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}", heading.bold());
    for item in items {
        println!("  {} {}", marker, item);
    }
}

/// Colored summary of an analysis
pub fn print_analysis(analysis: &AnalysisResult) {
    println!("{}", "📋 Requirements Analysis".blue().bold());
    println!();
    if !analysis.project_overview.is_empty() {
        println!("{:<15} {}", "Overview:".cyan(), analysis.project_overview);
    }
    if !analysis.target_audience.is_empty() {
        println!("{:<15} {}", "Audience:".cyan(), analysis.target_audience);
    }
    println!("{:<15} {}", "Platform:".cyan(), analysis.platform);
    println!(
        "{:<15} completeness {}  clarity {}  feasibility {}",
        "Scores:".cyan(),
        score_label(analysis.completeness_score),
        score_label(analysis.clarity_score),
        score_label(analysis.feasibility_score)
    );
    if let Some(effort) = &analysis.total_estimated_effort {
        println!("{:<15} {}", "Effort:".cyan(), effort);
    }
    println!();

    if analysis.requirements.is_empty() {
        println!("{}", "No requirements identified".yellow());
    } else {
        println!("{}", requirements_table(analysis));
    }

    print_list("Gaps", &analysis.gaps, "•".yellow());
    print_list("Ambiguities", &analysis.ambiguities, "?".yellow());
    print_list("Recommendations", &analysis.recommendations, "→".cyan());
    print_list("Frameworks", &analysis.framework_recommendations, "•".green());

    if !analysis.development_phases.is_empty() {
        println!();
        println!("{}", "Development phases".bold());
        for phase in &analysis.development_phases {
            println!(
                "  {} {} ({} requirements, {})",
                "▸".cyan(),
                phase.name.bold(),
                phase.requirements.len(),
                phase.estimated_duration.dimmed()
            );
        }
    }
}

fn px_list(values: &[u32]) -> String {
    if values.is_empty() {
        return "-".to_string();
    }
    values
        .iter()
        .map(|v| format!("{}px", v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extracted CSS values, one row per design area
pub fn design_specs_table(analysis: &DesignAnalysis) -> Table {
    let specs = &analysis.frontend_specs;
    let mut table = new_table();
    table.set_header(vec!["Area", "Values"]);

    let colors: Vec<&str> = specs
        .colors
        .hex
        .iter()
        .chain(&specs.colors.rgb)
        .map(String::as_str)
        .collect();
    let weights: Vec<String> = specs.typography.font_weights.iter().map(u32::to_string).collect();
    let percentages: Vec<String> = specs.layout.percentages.iter().map(|p| format!("{}%", p)).collect();
    let rows = [
        ("Colors", if colors.is_empty() { "-".to_string() } else { colors.join(", ") }),
        ("Font sizes", px_list(&specs.typography.font_sizes_px)),
        ("Font weights", if weights.is_empty() { "-".to_string() } else { weights.join(", ") }),
        ("Layout", px_list(&specs.layout.dimensions_px)),
        ("Layout %", if percentages.is_empty() { "-".to_string() } else { percentages.join(", ") }),
        ("Border radius", px_list(&specs.components.border_radius_px)),
        ("Component padding", px_list(&specs.components.padding_px)),
        ("Margins", px_list(&specs.spacing.margins_px)),
        ("Gaps", px_list(&specs.spacing.gaps_px)),
    ];
    for (area, values) in rows {
        table.add_row(vec![area.to_string(), values]);
    }
    table
}

/// Colored summary of a design image analysis
pub fn print_design(analysis: &DesignAnalysis) {
    println!("{}", "🎨 Design Analysis".blue().bold());
    println!();
    println!("{:<15} {}", "Type:".cyan(), analysis.analysis_type);
    if !analysis.metadata.model.is_empty() {
        println!("{:<15} {}", "Model:".cyan(), analysis.metadata.model);
    }
    println!(
        "{:<15} confidence {}  specs completeness {}",
        "Scores:".cyan(),
        score_label(analysis.metadata.confidence_score),
        score_label(analysis.metadata.specs_completeness)
    );

    for section in &analysis.sections {
        println!();
        println!("{}", section.key.bold());
        for line in section.content.lines() {
            println!("  {}", line);
        }
    }

    println!();
    println!("{}", design_specs_table(analysis));

    let guide = &analysis.implementation_guide;
    let variables: Vec<String> = guide
        .css_variables
        .iter()
        .map(|v| format!("{}: {};", v.name, v.value))
        .collect();
    let breakpoints: Vec<String> = guide
        .breakpoints
        .iter()
        .map(|(name, query)| format!("{} → @media ({})", name, query))
        .collect();
    print_list("CSS variables", &variables, "•".green());
    print_list("Breakpoints", &breakpoints, "•".cyan());
    print_list("Component classes", &guide.component_classes, "•".cyan());
    print_list("Checklist", &guide.development_checklist, "☐".normal());
}

/// Colored summary of a validation report
pub fn print_validation(report: &ValidationReport) {
    println!("{}", "🔍 Validation Report".blue().bold());
    println!();
    println!("{:<22} {}", "Overall:".cyan(), score_label(report.overall_score));
    println!(
        "{:<22} {}",
        "Requirements quality:".cyan(),
        score_label(report.category_scores.requirements_quality)
    );
    println!(
        "{:<22} {}",
        "Project structure:".cyan(),
        score_label(report.category_scores.project_structure)
    );
    println!(
        "{:<22} {}",
        "Completeness:".cyan(),
        score_label(report.category_scores.completeness)
    );

    let issues: Vec<String> = report.issues.iter().map(ToString::to_string).collect();
    let warnings: Vec<String> = report.warnings.iter().map(ToString::to_string).collect();
    print_list("Issues", &issues, "✗".red());
    print_list("Warnings", &warnings, "!".yellow());
    print_list("Recommendations", &report.recommendations, "→".cyan());

    println!();
    if report.passed() {
        println!("{}", "✓ Validation passed".green().bold());
    } else {
        println!(
            "{}",
            format!("✗ Validation failed with {} issues", report.issues.len())
                .red()
                .bold()
        );
    }
}

/// Registered providers and the model configurations using them
pub fn providers_table(providers: &[String], config: &Config) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Provider", "Model configs", "Models", "API key"]);

    for provider in providers {
        let models: Vec<_> = config
            .models
            .values()
            .filter(|m| m.provider.eq_ignore_ascii_case(provider))
            .collect();
        let names: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
        let ids: Vec<&str> = models
            .iter()
            .map(|m| if m.model_id.is_empty() { "(default)" } else { m.model_id.as_str() })
            .collect();
        let key = if models.is_empty() {
            "-".to_string()
        } else if models.iter().all(|m| m.has_api_key()) {
            "set".green().to_string()
        } else {
            "missing".red().to_string()
        };

        table.add_row(vec![
            provider.clone(),
            if names.is_empty() { "-".to_string() } else { names.join(", ") },
            if ids.is_empty() { "-".to_string() } else { ids.join(", ") },
            key,
        ]);
    }
    table
}

/// Human-readable line for a progress event; stream chunks have none
pub fn progress_line(event: &ProgressEvent) -> Option<String> {
    let line = match event {
        ProgressEvent::Started => "Starting analysis".to_string(),
        ProgressEvent::ModelCallStarted { stage } => format!("Requesting {} from model", stage),
        ProgressEvent::ModelCallCompleted { stage } => format!("Received {} response", stage),
        ProgressEvent::NormalizationCompleted { strategy } => {
            format!("Parsed response ({})", strategy)
        }
        ProgressEvent::NormalizationFailed { reason } => {
            format!("Could not structure response: {}", reason)
        }
        ProgressEvent::RequirementsBuilt { count } => format!("Built {} requirements", count),
        ProgressEvent::DetailPassCompleted { count } => {
            format!("Added detail specs to {} requirements", count)
        }
        ProgressEvent::AssessmentCompleted => "Assessment complete".to_string(),
        ProgressEvent::Finished => "Done".to_string(),
        ProgressEvent::StreamChunk { .. } => return None,
    };
    Some(line)
}
