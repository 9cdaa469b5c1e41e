// ABOUTME: Assessment of an analysis result: gaps, ambiguities, scores, effort, and phases
// ABOUTME: Deterministic heuristics applied after requirements are built

use std::collections::HashSet;

use tracing::debug;

use crate::types::{
    AnalysisResult, DevelopmentPhase, Platform, Requirement, RequirementPriority,
    RequirementStatus, RequirementType,
};

/// Phrases that make a requirement vague
pub const VAGUE_TERMS: &[&str] = &[
    "somehow",
    "maybe",
    "probably",
    "might",
    "could",
    "should probably",
    "perhaps",
    "也许",
    "可能",
    "大概",
    "或许",
];

/// Vague terms present in the requirement's title or description
pub fn vague_terms_in(requirement: &Requirement) -> Vec<&'static str> {
    let text = requirement.text_lowercase();
    VAGUE_TERMS
        .iter()
        .copied()
        .filter(|term| text.contains(term))
        .collect()
}

/// Fill scores, findings, effort, phases, and framework recommendations
///
/// Gaps and ambiguities already present (from building) are kept and extended.
pub fn assess(result: &mut AnalysisResult) {
    let mut gaps = std::mem::take(&mut result.gaps);
    let mut ambiguities = std::mem::take(&mut result.ambiguities);

    if result.requirements.is_empty() {
        gaps.push("No requirements could be identified from the input".to_string());
    }
    gaps.extend(category_gaps(&result.requirements));
    for requirement in &mut result.requirements {
        gaps.extend(requirement_gaps(requirement));
        ambiguities.extend(mark_ambiguities(requirement));
    }

    result.completeness_score = completeness_score(&result.requirements);
    result.clarity_score = clarity_score(&result.requirements);
    result.feasibility_score = feasibility_score(&result.requirements);
    result.recommendations = recommendations(&result.requirements, &gaps, &ambiguities);
    result.total_estimated_effort = total_effort(&result.requirements);
    result.development_phases = development_phases(&result.requirements);
    result.framework_recommendations = recommend_frameworks(&result.requirements, result.platform);
    result.gaps = unique(gaps);
    result.ambiguities = unique(ambiguities);

    debug!(
        "Assessment: completeness={:.2}, clarity={:.2}, feasibility={:.2}, {} gaps, {} ambiguities",
        result.completeness_score,
        result.clarity_score,
        result.feasibility_score,
        result.gaps.len(),
        result.ambiguities.len()
    );
}

/// Drop repeated findings, keeping first occurrences in order
fn unique(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn category_gaps(requirements: &[Requirement]) -> Vec<String> {
    let has = |t: RequirementType| requirements.iter().any(|r| r.requirement_type == t);
    [
        (RequirementType::UiComponent, "No specific UI components identified"),
        (RequirementType::Layout, "Layout structure not defined"),
        (RequirementType::Styling, "Visual styling requirements missing"),
        (RequirementType::Interaction, "User interaction patterns not specified"),
    ]
    .into_iter()
    .filter(|(t, _)| !has(*t))
    .map(|(_, gap)| gap.to_string())
    .collect()
}

fn requirement_gaps(requirement: &mut Requirement) -> Vec<String> {
    let mut gaps = Vec::new();
    if requirement.description.trim().is_empty() {
        gaps.push(format!("Requirement '{}' lacks description", requirement.title));
        if requirement.status == RequirementStatus::Identified {
            requirement.status = RequirementStatus::Incomplete;
        }
    } else if requirement.status == RequirementStatus::Incomplete {
        requirement.status = RequirementStatus::Identified;
    }
    if requirement.acceptance_criteria.is_empty() {
        gaps.push(format!("Acceptance criteria missing for '{}'", requirement.title));
    }
    gaps
}

fn mark_ambiguities(requirement: &mut Requirement) -> Vec<String> {
    let mut ambiguities = Vec::new();

    if let Some(term) = vague_terms_in(requirement).first() {
        ambiguities.push(format!(
            "Vague language in '{}': contains '{}'",
            requirement.title, term
        ));
        requirement.status = RequirementStatus::Ambiguous;
    }

    let text = requirement.text_lowercase();
    if (text.contains("simple") && text.contains("complex"))
        || (text.contains("简单") && text.contains("复杂"))
    {
        ambiguities.push(format!(
            "Contradictory complexity requirements in '{}'",
            requirement.title
        ));
        requirement.status = RequirementStatus::Ambiguous;
    }

    ambiguities
}

/// Completeness of one requirement in [0, 1]
pub fn requirement_completeness(requirement: &Requirement) -> f64 {
    let mut score = 0.0;
    if !requirement.title.trim().is_empty() && !requirement.description.trim().is_empty() {
        score += 0.4;
    }
    if !requirement.acceptance_criteria.is_empty() {
        score += 0.3;
    }
    let has_detail = match requirement.requirement_type {
        RequirementType::Functional => true,
        RequirementType::UiComponent => requirement.component_spec.is_some(),
        RequirementType::Interaction => !requirement.interaction_specs.is_empty(),
        RequirementType::Layout => requirement.layout_spec.is_some(),
        RequirementType::Styling => requirement.style_spec.is_some(),
        _ => false,
    };
    score += if has_detail { 0.3 } else { 0.1 };
    f64::min(1.0, score)
}

pub fn completeness_score(requirements: &[Requirement]) -> f64 {
    mean(requirements.iter().map(requirement_completeness))
}

/// 1 - 0.5 x (ambiguous requirements / total)
pub fn clarity_score(requirements: &[Requirement]) -> f64 {
    if requirements.is_empty() {
        return 0.0;
    }
    let ambiguous = requirements
        .iter()
        .filter(|r| r.status == RequirementStatus::Ambiguous)
        .count();
    (1.0 - 0.5 * ambiguous as f64 / requirements.len() as f64).max(0.0)
}

pub fn feasibility_score(requirements: &[Requirement]) -> f64 {
    let score = mean(requirements.iter().map(|r| {
        let base = match r.requirement_type {
            RequirementType::Functional => 0.9,
            RequirementType::UiComponent => 0.95,
            RequirementType::Performance => 0.7,
            RequirementType::Accessibility => 0.8,
            _ => 1.0,
        };
        base * match r.priority {
            RequirementPriority::Critical => 0.9,
            RequirementPriority::Low => 1.1,
            _ => 1.0,
        }
    }));
    score.min(1.0)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn recommendations(
    requirements: &[Requirement],
    gaps: &[String],
    ambiguities: &[String],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if !gaps.is_empty() {
        recommendations
            .push("Address missing requirements to ensure complete specification".to_string());
    }
    if !ambiguities.is_empty() {
        recommendations.push(
            "Clarify ambiguous requirements to avoid implementation confusion".to_string(),
        );
    }

    if !requirements.is_empty() {
        let critical = requirements
            .iter()
            .filter(|r| r.priority == RequirementPriority::Critical)
            .count();
        if critical * 2 > requirements.len() {
            recommendations.push(
                "Consider reducing critical requirements - too many critical items may impact delivery"
                    .to_string(),
            );
        }
        if critical == 0 {
            recommendations
                .push("Identify critical requirements to prioritize development effort".to_string());
        }
    }

    recommendations
}

/// Overall effort label from summed points
pub fn total_effort(requirements: &[Requirement]) -> Option<String> {
    if requirements.is_empty() {
        return None;
    }
    let points: f64 = requirements.iter().map(Requirement::effort_points).sum();
    let label = if points <= 10.0 {
        "S (Small - 1-2 weeks)"
    } else if points <= 25.0 {
        "M (Medium - 3-4 weeks)"
    } else if points <= 50.0 {
        "L (Large - 1-2 months)"
    } else {
        "XL (Extra Large - 2+ months)"
    };
    Some(label.to_string())
}

/// Foundation (critical), Core Features (high), Enhancement (medium and low)
pub fn development_phases(requirements: &[Requirement]) -> Vec<DevelopmentPhase> {
    if requirements.is_empty() {
        return Vec::new();
    }
    let ids = |wanted: &[RequirementPriority]| -> Vec<String> {
        requirements
            .iter()
            .filter(|r| wanted.contains(&r.priority))
            .map(|r| r.id.clone())
            .collect()
    };

    vec![
        DevelopmentPhase {
            name: "Foundation".to_string(),
            description: "Core setup and critical components".to_string(),
            requirements: ids(&[RequirementPriority::Critical]),
            estimated_duration: "20-30% of total effort".to_string(),
        },
        DevelopmentPhase {
            name: "Core Features".to_string(),
            description: "Main functionality implementation".to_string(),
            requirements: ids(&[RequirementPriority::High]),
            estimated_duration: "40-50% of total effort".to_string(),
        },
        DevelopmentPhase {
            name: "Enhancement".to_string(),
            description: "Additional features and polish".to_string(),
            requirements: ids(&[RequirementPriority::Medium, RequirementPriority::Low]),
            estimated_duration: "20-30% of total effort".to_string(),
        },
    ]
}

/// Framework suggestions for the platform
pub fn recommend_frameworks(requirements: &[Requirement], platform: Platform) -> Vec<String> {
    if requirements.is_empty() {
        return Vec::new();
    }
    let frameworks: &[&str] = match platform {
        Platform::Web => {
            let complex_interactions = requirements.iter().any(|r| {
                r.requirement_type == RequirementType::Interaction && r.interaction_specs.len() > 2
            });
            let many_components = requirements
                .iter()
                .filter(|r| r.requirement_type == RequirementType::UiComponent)
                .count()
                > 10;
            if complex_interactions || many_components {
                &["React", "Vue.js", "Angular"]
            } else {
                &["HTML/CSS/JavaScript", "Alpine.js", "Svelte"]
            }
        }
        Platform::Mobile => &["React Native", "Flutter", "Swift/SwiftUI", "Kotlin/Jetpack Compose"],
        Platform::Desktop => &["Electron", "Tauri", "Qt", "JavaFX"],
    };
    frameworks.iter().map(|f| f.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn requirement(title: &str, description: &str) -> Requirement {
        let mut r = Requirement::new(title.to_lowercase(), title);
        r.description = description.to_string();
        r
    }

    #[test]
    fn test_empty_result_scores_zero() {
        let mut result = AnalysisResult::default();
        assess(&mut result);

        assert_eq!(result.completeness_score, 0.0);
        assert_eq!(result.clarity_score, 0.0);
        assert_eq!(result.feasibility_score, 0.0);
        assert!(result.gaps[0].contains("No requirements"));
        assert!(result.total_estimated_effort.is_none());
        assert!(result.development_phases.is_empty());
    }

    #[test]
    fn test_vague_language_marks_ambiguous() {
        let mut result = AnalysisResult {
            requirements: vec![
                requirement("Search", "Maybe search somehow across tasks"),
                requirement("Export", "Export tasks to CSV"),
            ],
            ..Default::default()
        };
        assess(&mut result);

        assert_eq!(result.requirements[0].status, RequirementStatus::Ambiguous);
        assert_eq!(result.ambiguities.len(), 1);
        assert!((result.clarity_score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_completeness_per_requirement() {
        let mut full = requirement("Login", "Users sign in with email");
        full.acceptance_criteria = vec!["Wrong password shows an error".into()];
        assert!((requirement_completeness(&full) - 1.0).abs() < 1e-9);

        let mut bare = requirement("Button", "");
        bare.requirement_type = RequirementType::UiComponent;
        assert!((requirement_completeness(&bare) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_effort_and_phases() {
        let mut critical = requirement("Auth", "Login");
        critical.priority = RequirementPriority::Critical;
        let mut layout = requirement("Grid", "Grid layout");
        layout.requirement_type = RequirementType::Layout;
        layout.priority = RequirementPriority::High;

        let requirements = vec![critical, layout, requirement("Tags", "Tag tasks")];
        assert_eq!(total_effort(&requirements).as_deref(), Some("S (Small - 1-2 weeks)"));

        let phases = development_phases(&requirements);
        assert_eq!(phases[0].requirements, vec!["auth".to_string()]);
        assert_eq!(phases[1].requirements, vec!["grid".to_string()]);
        assert_eq!(phases[2].requirements, vec!["tags".to_string()]);
    }

    #[test]
    fn test_frameworks_by_platform() {
        let requirements = vec![requirement("A", "b")];
        assert_eq!(recommend_frameworks(&requirements, Platform::Web)[0], "HTML/CSS/JavaScript");
        assert_eq!(recommend_frameworks(&requirements, Platform::Mobile)[1], "Flutter");
        assert!(recommend_frameworks(&[], Platform::Desktop).is_empty());
    }

    #[test]
    fn test_missing_description_marks_incomplete() {
        let mut result = AnalysisResult {
            requirements: vec![requirement("Login", "")],
            ..Default::default()
        };
        assess(&mut result);
        assert_eq!(result.requirements[0].status, RequirementStatus::Incomplete);
        assert!(result.gaps.iter().any(|g| g.contains("lacks description")));
    }
}
