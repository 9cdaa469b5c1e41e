// ABOUTME: Analysis quality validation with rubric scoring and issue detection
// ABOUTME: Scores requirement quality, project structure, and completeness without mutating the result

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assessment::vague_terms_in;
use crate::types::{AnalysisResult, Platform, Requirement, RequirementPriority, RequirementType};

/// Category weights for the overall score
pub const REQUIREMENTS_QUALITY_WEIGHT: f64 = 0.5;
pub const PROJECT_STRUCTURE_WEIGHT: f64 = 0.3;
pub const COMPLETENESS_WEIGHT: f64 = 0.2;

const MIN_TITLE_CHARS: usize = 2;
const MAX_TITLE_CHARS: usize = 100;
const MIN_DESCRIPTION_CHARS: usize = 20;
const MIN_CRITICAL_DESCRIPTION_CHARS: usize = 30;

const SPECIFIC_INDICATORS: &[&str] = &[
    "must", "shall", "will", "exactly", "precisely", "specific", "number", "amount",
    "percentage", "time", "size", "count", "measure", "必须", "至少", "最多", "秒",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Issue,
    Warning,
}

/// One finding of the validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Rule name, or a project-level check name
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement_title: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.requirement_title {
            Some(title) => write!(f, "Requirement '{}': {}", title, self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub requirements_quality: f64,
    pub project_structure: f64,
    pub completeness: f64,
}

/// Rubric outcome for one requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementValidation {
    /// passed / applicable rules
    pub score: f64,
    pub passed_rules: Vec<String>,
    pub failed_rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub overall_score: f64,
    pub category_scores: CategoryScores,
    pub issues: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub recommendations: Vec<String>,
    /// Requirement id -> rubric outcome; a repeated id is keyed `id#2`, `id#3`, ...
    pub requirement_details: BTreeMap<String, RequirementValidation>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.issues.is_empty()
    }
}

enum RuleOutcome {
    Pass,
    NotApplicable,
    Fail(String),
}

struct RuleContext<'a> {
    ids: HashSet<&'a str>,
}

struct Rule {
    name: &'static str,
    check: fn(&Requirement, &RuleContext) -> RuleOutcome,
}

const RULES: &[Rule] = &[
    Rule { name: "has_title", check: rule_has_title },
    Rule { name: "has_description", check: rule_has_description },
    Rule { name: "description_length", check: rule_description_length },
    Rule { name: "title_length", check: rule_title_length },
    Rule { name: "has_acceptance_criteria", check: rule_has_acceptance_criteria },
    Rule { name: "no_vague_language", check: rule_no_vague_language },
    Rule { name: "specific_and_measurable", check: rule_specific_and_measurable },
    Rule { name: "realistic_priority", check: rule_realistic_priority },
    Rule { name: "component_has_spec", check: rule_component_has_spec },
    Rule { name: "interaction_has_spec", check: rule_interaction_has_spec },
    Rule { name: "dependencies_resolved", check: rule_dependencies_resolved },
];

fn outcome(passed: bool, message: &str) -> RuleOutcome {
    if passed {
        RuleOutcome::Pass
    } else {
        RuleOutcome::Fail(message.to_string())
    }
}

fn rule_has_title(r: &Requirement, _: &RuleContext) -> RuleOutcome {
    outcome(!r.title.trim().is_empty(), "Requirement must have a title")
}

fn rule_has_description(r: &Requirement, _: &RuleContext) -> RuleOutcome {
    outcome(!r.description.trim().is_empty(), "Requirement must have a description")
}

fn rule_description_length(r: &Requirement, _: &RuleContext) -> RuleOutcome {
    let length = r.description.trim().chars().count();
    if length == 0 {
        return RuleOutcome::NotApplicable;
    }
    outcome(
        length >= MIN_DESCRIPTION_CHARS,
        "Description should be at least 20 characters",
    )
}

fn rule_title_length(r: &Requirement, _: &RuleContext) -> RuleOutcome {
    let length = r.title.trim().chars().count();
    if length == 0 {
        return RuleOutcome::NotApplicable;
    }
    if length < MIN_TITLE_CHARS {
        RuleOutcome::Fail("Title is too short (should be 2-100 characters)".to_string())
    } else if length > MAX_TITLE_CHARS {
        RuleOutcome::Fail("Title is too long (should be 2-100 characters)".to_string())
    } else {
        RuleOutcome::Pass
    }
}

fn rule_has_acceptance_criteria(r: &Requirement, _: &RuleContext) -> RuleOutcome {
    outcome(
        !r.acceptance_criteria.is_empty(),
        "Requirement should have acceptance criteria",
    )
}

fn rule_no_vague_language(r: &Requirement, _: &RuleContext) -> RuleOutcome {
    let found = vague_terms_in(r);
    if found.is_empty() {
        RuleOutcome::Pass
    } else {
        RuleOutcome::Fail(format!("Contains vague language: {}", found.join(", ")))
    }
}

fn rule_specific_and_measurable(r: &Requirement, _: &RuleContext) -> RuleOutcome {
    let text = r.text_lowercase();
    let passed = !r.acceptance_criteria.is_empty()
        || text.chars().any(|c| c.is_ascii_digit())
        || SPECIFIC_INDICATORS.iter().any(|i| text.contains(i));
    outcome(passed, "Requirement should be more specific and measurable")
}

fn rule_realistic_priority(r: &Requirement, _: &RuleContext) -> RuleOutcome {
    if r.priority != RequirementPriority::Critical {
        return RuleOutcome::NotApplicable;
    }
    outcome(
        r.description.trim().chars().count() >= MIN_CRITICAL_DESCRIPTION_CHARS
            || !r.acceptance_criteria.is_empty(),
        "Critical requirements should have detailed description or acceptance criteria",
    )
}

fn rule_component_has_spec(r: &Requirement, _: &RuleContext) -> RuleOutcome {
    if r.requirement_type != RequirementType::UiComponent {
        return RuleOutcome::NotApplicable;
    }
    outcome(
        r.component_spec.is_some(),
        "UI component requirement should have component specification",
    )
}

fn rule_interaction_has_spec(r: &Requirement, _: &RuleContext) -> RuleOutcome {
    if r.requirement_type != RequirementType::Interaction {
        return RuleOutcome::NotApplicable;
    }
    outcome(
        !r.interaction_specs.is_empty(),
        "Interaction requirement should have interaction specifications",
    )
}

fn rule_dependencies_resolved(r: &Requirement, ctx: &RuleContext) -> RuleOutcome {
    if r.dependencies.is_empty() && r.conflicts.is_empty() {
        return RuleOutcome::NotApplicable;
    }
    let unresolved: Vec<&str> = r
        .dependencies
        .iter()
        .chain(&r.conflicts)
        .map(String::as_str)
        .filter(|id| !ctx.ids.contains(id))
        .collect();
    if unresolved.is_empty() {
        RuleOutcome::Pass
    } else {
        RuleOutcome::Fail(format!("References unknown requirements: {}", unresolved.join(", ")))
    }
}

/// Requirement types a complete analysis covers on each platform
pub fn expected_types(platform: Platform) -> &'static [RequirementType] {
    match platform {
        Platform::Web => &[
            RequirementType::Functional,
            RequirementType::UiComponent,
            RequirementType::Layout,
            RequirementType::Interaction,
            RequirementType::Styling,
        ],
        Platform::Mobile => &[
            RequirementType::Functional,
            RequirementType::UiComponent,
            RequirementType::Layout,
            RequirementType::Interaction,
            RequirementType::Performance,
        ],
        Platform::Desktop => &[
            RequirementType::Functional,
            RequirementType::UiComponent,
            RequirementType::Layout,
            RequirementType::Interaction,
            RequirementType::Data,
        ],
    }
}

/// Validates analysis results; pure and deterministic
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalysisValidator;

impl AnalysisValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate an analysis result and return its quality report
    pub fn validate(&self, analysis: &AnalysisResult) -> ValidationReport {
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        let (requirements_quality, requirement_details, gap_free) =
            self.validate_requirements(analysis, &mut issues, &mut warnings);
        let project_structure = self.validate_structure(analysis, &mut warnings);
        let completeness = self.validate_completeness(analysis, gap_free, &mut warnings);

        let category_scores = CategoryScores {
            requirements_quality,
            project_structure,
            completeness,
        };
        let overall_score = REQUIREMENTS_QUALITY_WEIGHT * requirements_quality
            + PROJECT_STRUCTURE_WEIGHT * project_structure
            + COMPLETENESS_WEIGHT * completeness;

        let recommendations = self.generate_recommendations(analysis);

        debug!(
            "Validation: overall={:.2}, {} issues, {} warnings",
            overall_score,
            issues.len(),
            warnings.len()
        );

        ValidationReport {
            overall_score,
            category_scores,
            issues,
            warnings,
            recommendations,
            requirement_details,
        }
    }

    /// Returns (quality score, per-requirement details, requirements without gaps)
    fn validate_requirements(
        &self,
        analysis: &AnalysisResult,
        issues: &mut Vec<ValidationIssue>,
        warnings: &mut Vec<ValidationIssue>,
    ) -> (f64, BTreeMap<String, RequirementValidation>, usize) {
        let mut details = BTreeMap::new();

        if analysis.requirements.is_empty() {
            issues.push(project_finding(Severity::Issue, "has_requirements", "No requirements found"));
            return (0.0, details, 0);
        }

        let ctx = RuleContext {
            ids: analysis.requirements.iter().map(|r| r.id.as_str()).collect(),
        };
        let mut total_score = 0.0;
        let mut gap_free = 0;
        let mut seen_ids: BTreeMap<&str, usize> = BTreeMap::new();

        for requirement in &analysis.requirements {
            let occurrence = seen_ids.entry(requirement.id.as_str()).or_insert(0);
            *occurrence += 1;
            if *occurrence > 1 {
                issues.push(requirement_finding(
                    Severity::Issue,
                    "duplicate_id",
                    requirement,
                    &format!("Requirement id '{}' is used more than once", requirement.id),
                ));
            }
            let key = detail_key(&requirement.id, *occurrence);

            let mut passed_rules = Vec::new();
            let mut failed = Vec::new();

            for rule in RULES {
                match (rule.check)(requirement, &ctx) {
                    RuleOutcome::Pass => passed_rules.push(rule.name.to_string()),
                    RuleOutcome::Fail(message) => failed.push((rule.name, message)),
                    RuleOutcome::NotApplicable => {}
                }
            }

            let failed_names: Vec<&str> = failed.iter().map(|(name, _)| *name).collect();
            let missing_text = failed_names.contains(&"has_description")
                && failed_names.contains(&"has_acceptance_criteria");

            if missing_text {
                issues.push(requirement_finding(
                    Severity::Issue,
                    "missing_description_and_criteria",
                    requirement,
                    "Requirement has neither a description nor acceptance criteria",
                ));
            }
            for (name, message) in &failed {
                if *name == "has_title" {
                    issues.push(requirement_finding(Severity::Issue, name, requirement, message));
                } else if missing_text && (*name == "has_description" || *name == "has_acceptance_criteria") {
                    continue;
                } else {
                    warnings.push(requirement_finding(Severity::Warning, name, requirement, message));
                }
            }

            if !failed_names
                .iter()
                .any(|n| matches!(*n, "has_description" | "has_acceptance_criteria" | "dependencies_resolved"))
            {
                gap_free += 1;
            }

            let applicable = passed_rules.len() + failed.len();
            let score = if applicable == 0 {
                1.0
            } else {
                passed_rules.len() as f64 / applicable as f64
            };
            total_score += score;

            details.insert(
                key,
                RequirementValidation {
                    score,
                    passed_rules,
                    failed_rules: failed_names.iter().map(|n| n.to_string()).collect(),
                },
            );
        }

        (
            total_score / analysis.requirements.len() as f64,
            details,
            gap_free,
        )
    }

    /// Fraction of {overview, audience, framework recommendations} present
    fn validate_structure(&self, analysis: &AnalysisResult, warnings: &mut Vec<ValidationIssue>) -> f64 {
        let checks = [
            (
                !analysis.project_overview.trim().is_empty(),
                "project_overview",
                "Project overview is missing",
            ),
            (
                !analysis.target_audience.trim().is_empty(),
                "target_audience",
                "Target audience is not defined",
            ),
            (
                !analysis.framework_recommendations.is_empty(),
                "framework_recommendations",
                "No framework recommendations",
            ),
        ];

        let mut present = 0;
        for (ok, rule, message) in checks {
            if ok {
                present += 1;
            } else {
                warnings.push(project_finding(Severity::Warning, rule, message));
            }
        }
        present as f64 / checks.len() as f64
    }

    /// 0.5 x type coverage + 0.5 x share of requirements without gaps
    fn validate_completeness(
        &self,
        analysis: &AnalysisResult,
        gap_free: usize,
        warnings: &mut Vec<ValidationIssue>,
    ) -> f64 {
        let expected = expected_types(analysis.platform);
        let present: HashSet<RequirementType> = analysis
            .requirements
            .iter()
            .map(|r| r.requirement_type)
            .collect();
        let missing: Vec<&str> = expected
            .iter()
            .filter(|t| !present.contains(t))
            .map(|t| t.as_str())
            .collect();

        if !missing.is_empty() && !analysis.requirements.is_empty() {
            warnings.push(project_finding(
                Severity::Warning,
                "type_coverage",
                &format!("Missing requirement types: {}", missing.join(", ")),
            ));
        }

        let coverage = (expected.len() - missing.len()) as f64 / expected.len() as f64;
        let gap_free_share = if analysis.requirements.is_empty() {
            0.0
        } else {
            gap_free as f64 / analysis.requirements.len() as f64
        };
        0.5 * coverage + 0.5 * gap_free_share
    }

    fn generate_recommendations(&self, analysis: &AnalysisResult) -> Vec<String> {
        let requirements = &analysis.requirements;
        let mut recommendations = Vec::new();

        if requirements.is_empty() {
            recommendations.push(
                "Describe the product's features in more detail so requirements can be extracted"
                    .to_string(),
            );
            return recommendations;
        }

        let count_type = |t: RequirementType| {
            requirements
                .iter()
                .filter(|r| r.requirement_type == t)
                .count()
        };

        if count_type(RequirementType::Accessibility) == 0 {
            recommendations.push(
                "Add accessibility requirements (keyboard navigation, screen reader support, color contrast)"
                    .to_string(),
            );
        }

        let critical = requirements
            .iter()
            .filter(|r| r.priority == RequirementPriority::Critical)
            .count();
        if critical == 0 {
            recommendations.push("Consider identifying critical requirements for prioritization".to_string());
        } else if critical * 2 > requirements.len() {
            recommendations.push("Too many critical requirements - consider reprioritizing".to_string());
        }

        let missing_criteria = requirements
            .iter()
            .filter(|r| r.acceptance_criteria.is_empty())
            .count();
        if missing_criteria as f64 > requirements.len() as f64 * 0.3 {
            recommendations.push(
                "Add acceptance criteria to requirements for clearer implementation guidance"
                    .to_string(),
            );
        }

        if requirements
            .iter()
            .any(|r| r.requirement_type == RequirementType::UiComponent && r.component_spec.is_none())
        {
            recommendations.push(
                "Add component specifications (props, events, states) to UI component requirements"
                    .to_string(),
            );
        }

        if matches!(analysis.platform, Platform::Web | Platform::Mobile)
            && count_type(RequirementType::Performance) == 0
        {
            recommendations.push(format!(
                "Define performance requirements (load time, responsiveness) for the {} platform",
                analysis.platform
            ));
        }

        recommendations
    }
}

/// Detail key for the nth requirement carrying an id; repeats get a `#n` suffix
fn detail_key(id: &str, occurrence: usize) -> String {
    if occurrence > 1 {
        format!("{}#{}", id, occurrence)
    } else {
        id.to_string()
    }
}

fn requirement_finding(
    severity: Severity,
    rule: &str,
    requirement: &Requirement,
    message: &str,
) -> ValidationIssue {
    ValidationIssue {
        severity,
        rule: rule.to_string(),
        requirement_id: Some(requirement.id.clone()),
        requirement_title: Some(requirement.title.clone()),
        message: message.to_string(),
    }
}

fn project_finding(severity: Severity, rule: &str, message: &str) -> ValidationIssue {
    ValidationIssue {
        severity,
        rule: rule.to_string(),
        requirement_id: None,
        requirement_title: None,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ComponentSpec;
    use pretty_assertions::assert_eq;

    fn requirement(id: &str, title: &str, description: &str) -> Requirement {
        let mut r = Requirement::new(id, title);
        r.description = description.to_string();
        r
    }

    #[test]
    fn test_well_formed_requirement_passes_all_rules() {
        let mut r = requirement("a", "Login", "Users must sign in with email and password");
        r.acceptance_criteria = vec!["Invalid password shows an error".into()];
        let analysis = AnalysisResult {
            requirements: vec![r],
            ..Default::default()
        };

        let report = AnalysisValidator::new().validate(&analysis);
        let details = &report.requirement_details["a"];
        assert_eq!(details.score, 1.0);
        assert!(details.failed_rules.is_empty());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_issues_and_keep_separate_details() {
        let mut first = requirement("r1", "Login", "Users must sign in with email and password");
        first.acceptance_criteria = vec!["Invalid password shows an error".into()];
        let mut second = requirement("r1", "Logout", "Users must be able to sign out at any time");
        second.acceptance_criteria = vec!["Session is cleared".into()];
        let analysis = AnalysisResult {
            requirements: vec![first, second],
            ..Default::default()
        };

        let report = AnalysisValidator::new().validate(&analysis);
        let duplicates: Vec<_> = report.issues.iter().filter(|i| i.rule == "duplicate_id").collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].requirement_title.as_deref(), Some("Logout"));
        assert_eq!(report.requirement_details.len(), 2);
        assert!(report.requirement_details.contains_key("r1#2"));
        assert!(!report.passed());
    }

    #[test]
    fn test_missing_title_is_issue() {
        let analysis = AnalysisResult {
            requirements: vec![requirement("a", "", "Something the system does for users")],
            ..Default::default()
        };
        let report = AnalysisValidator::new().validate(&analysis);
        assert!(report.issues.iter().any(|i| i.rule == "has_title"));
    }

    #[test]
    fn test_component_spec_rule_only_applies_to_ui_components() {
        let mut button = requirement("b", "Submit button", "A primary button that submits the form");
        button.requirement_type = RequirementType::UiComponent;
        button.acceptance_criteria = vec!["Disabled while submitting".into()];

        let analysis = AnalysisResult {
            requirements: vec![button.clone()],
            ..Default::default()
        };
        let report = AnalysisValidator::new().validate(&analysis);
        assert!(report.requirement_details["b"]
            .failed_rules
            .contains(&"component_has_spec".to_string()));

        button.component_spec = Some(ComponentSpec {
            name: "SubmitButton".into(),
            component_type: "button".into(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            events: vec!["click".into()],
            validation: BTreeMap::new(),
            accessibility: BTreeMap::new(),
        });
        let analysis = AnalysisResult {
            requirements: vec![button],
            ..Default::default()
        };
        let report = AnalysisValidator::new().validate(&analysis);
        assert_eq!(report.requirement_details["b"].score, 1.0);
    }

    #[test]
    fn test_unresolved_dependency_is_warning() {
        let mut r = requirement("a", "Reports", "Monthly reports with 12 charts");
        r.dependencies = vec!["missing".into()];
        let analysis = AnalysisResult {
            requirements: vec![r],
            ..Default::default()
        };
        let report = AnalysisValidator::new().validate(&analysis);
        assert!(report.warnings.iter().any(|w| w.rule == "dependencies_resolved"));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total = REQUIREMENTS_QUALITY_WEIGHT + PROJECT_STRUCTURE_WEIGHT + COMPLETENESS_WEIGHT;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_issue_display_includes_title() {
        let issue = requirement_finding(
            Severity::Warning,
            "has_acceptance_criteria",
            &requirement("a", "Login", ""),
            "Requirement should have acceptance criteria",
        );
        assert_eq!(
            issue.to_string(),
            "Requirement 'Login': Requirement should have acceptance criteria"
        );
    }
}
