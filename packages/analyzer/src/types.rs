// ABOUTME: Type definitions for structured requirement analysis
// ABOUTME: Requirements, component/layout/style/interaction specs, and the analysis result

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Requirement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    /// What the system should do
    Functional,
    /// A concrete UI widget
    UiComponent,
    Layout,
    Styling,
    Interaction,
    Data,
    Performance,
    Accessibility,
    Business,
}

impl RequirementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementType::Functional => "functional",
            RequirementType::UiComponent => "ui_component",
            RequirementType::Layout => "layout",
            RequirementType::Styling => "styling",
            RequirementType::Interaction => "interaction",
            RequirementType::Data => "data",
            RequirementType::Performance => "performance",
            RequirementType::Accessibility => "accessibility",
            RequirementType::Business => "business",
        }
    }
}

impl fmt::Display for RequirementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MoSCoW-style priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementPriority {
    /// Must have
    Critical,
    /// Should have
    High,
    /// Could have
    Medium,
    /// Won't have this time
    Low,
}

impl RequirementPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementPriority::Critical => "critical",
            RequirementPriority::High => "high",
            RequirementPriority::Medium => "medium",
            RequirementPriority::Low => "low",
        }
    }
}

impl fmt::Display for RequirementPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementStatus {
    Identified,
    Analyzed,
    Validated,
    Ready,
    /// Missing information
    Incomplete,
    /// Needs clarification
    Ambiguous,
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequirementStatus::Identified => "identified",
            RequirementStatus::Analyzed => "analyzed",
            RequirementStatus::Validated => "validated",
            RequirementStatus::Ready => "ready",
            RequirementStatus::Incomplete => "incomplete",
            RequirementStatus::Ambiguous => "ambiguous",
        };
        f.write_str(s)
    }
}

/// T-shirt effort estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffortSize {
    XS,
    S,
    M,
    L,
    XL,
}

impl EffortSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffortSize::XS => "XS",
            EffortSize::S => "S",
            EffortSize::M => "M",
            EffortSize::L => "L",
            EffortSize::XL => "XL",
        }
    }
}

impl FromStr for EffortSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        // Accept "M (Medium)" style labels as well as bare sizes
        let head = normalized
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or_default();
        match head {
            "XS" => Ok(EffortSize::XS),
            "S" | "SMALL" => Ok(EffortSize::S),
            "M" | "MEDIUM" => Ok(EffortSize::M),
            "L" | "LARGE" => Ok(EffortSize::L),
            "XL" => Ok(EffortSize::XL),
            _ => Err(format!("Unknown effort size: {}", s)),
        }
    }
}

impl fmt::Display for EffortSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target platform of the analyzed product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Web,
    Mobile,
    Desktop,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Mobile => "mobile",
            Platform::Desktop => "desktop",
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "web" => Ok(Platform::Web),
            "mobile" => Ok(Platform::Mobile),
            "desktop" => Ok(Platform::Desktop),
            other => Err(format!("Unknown platform: {} (expected web, mobile, or desktop)", other)),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UI component tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub name: String,
    /// button, input, form, card, modal, ...
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    #[serde(default)]
    pub children: Vec<ComponentSpec>,
    /// click, hover, submit, ...
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub validation: BTreeMap<String, Value>,
    #[serde(default)]
    pub accessibility: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutSection {
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub components: Vec<String>,
    /// Breakpoint name -> behavior at that breakpoint
    #[serde(default)]
    pub responsive: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    /// grid, flex, absolute, flow, ...
    #[serde(rename = "type")]
    pub layout_type: String,
    #[serde(default)]
    pub sections: Vec<LayoutSection>,
    #[serde(default = "default_true")]
    pub responsive: bool,
    /// Breakpoint name -> width in px
    #[serde(default)]
    pub breakpoints: BTreeMap<String, u32>,
    #[serde(default)]
    pub spacing: BTreeMap<String, Value>,
    #[serde(default)]
    pub alignment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    #[serde(default)]
    pub typography: BTreeMap<String, Value>,
    #[serde(default)]
    pub spacing: BTreeMap<String, Value>,
    #[serde(default)]
    pub borders: BTreeMap<String, Value>,
    #[serde(default)]
    pub shadows: BTreeMap<String, String>,
    #[serde(default)]
    pub animations: Vec<BTreeMap<String, Value>>,
}

impl StyleSpec {
    pub fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.colors.is_empty()
            && self.typography.is_empty()
            && self.spacing.is_empty()
            && self.borders.is_empty()
            && self.shadows.is_empty()
            && self.animations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSpec {
    /// click, hover, scroll, keyboard, ...
    pub trigger: String,
    /// navigate, submit, validate, show, hide, ...
    pub action: String,
    #[serde(default)]
    pub target: String,
    /// Preconditions
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default)]
    pub validation: BTreeMap<String, Value>,
}

/// A single structured requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub requirement_type: RequirementType,
    pub priority: RequirementPriority,
    pub status: RequirementStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_spec: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_spec: Option<LayoutSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_spec: Option<StyleSpec>,
    #[serde(default)]
    pub interaction_specs: Vec<InteractionSpec>,

    /// Ids of requirements this one depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Ids of requirements this one conflicts with
    #[serde(default)]
    pub conflicts: Vec<String>,

    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_effort: Option<EffortSize>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Excerpt of the text the requirement was derived from
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub rationale: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Requirement {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            requirement_type: RequirementType::Functional,
            priority: RequirementPriority::Medium,
            status: RequirementStatus::Identified,
            component_spec: None,
            layout_spec: None,
            style_spec: None,
            interaction_specs: Vec::new(),
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            acceptance_criteria: Vec::new(),
            estimated_effort: None,
            tags: Vec::new(),
            source: String::new(),
            rationale: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Title followed by description, lowercased
    pub fn text_lowercase(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }

    /// Base effort points from type, scaled by priority
    pub fn effort_points(&self) -> f64 {
        let base = match self.requirement_type {
            RequirementType::UiComponent | RequirementType::Interaction => 2.0,
            RequirementType::Layout => 3.0,
            RequirementType::Performance => 4.0,
            _ => 1.0,
        };
        base * match self.priority {
            RequirementPriority::Critical => 1.5,
            RequirementPriority::High => 1.2,
            _ => 1.0,
        }
    }
}

/// A named group of requirements scheduled together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentPhase {
    pub name: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub estimated_duration: String,
}

/// Structured analysis of one request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub project_overview: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub framework_recommendations: Vec<String>,

    #[serde(default)]
    pub completeness_score: f64,
    #[serde(default)]
    pub clarity_score: f64,
    #[serde(default)]
    pub feasibility_score: f64,

    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default)]
    pub ambiguities: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_estimated_effort: Option<String>,
    #[serde(default)]
    pub development_phases: Vec<DevelopmentPhase>,
}

impl AnalysisResult {
    pub fn requirements_by_type(&self, requirement_type: RequirementType) -> Vec<&Requirement> {
        self.requirements
            .iter()
            .filter(|r| r.requirement_type == requirement_type)
            .collect()
    }

    pub fn requirements_by_priority(&self, priority: RequirementPriority) -> Vec<&Requirement> {
        self.requirements
            .iter()
            .filter(|r| r.priority == priority)
            .collect()
    }

    pub fn critical_requirements(&self) -> Vec<&Requirement> {
        self.requirements_by_priority(RequirementPriority::Critical)
    }

    /// Requirements that are incomplete or need clarification
    pub fn incomplete_requirements(&self) -> Vec<&Requirement> {
        self.requirements
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    RequirementStatus::Incomplete | RequirementStatus::Ambiguous
                )
            })
            .collect()
    }

    pub fn find_requirement(&self, id: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.id == id)
    }
}

/// Input to the analysis pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub existing_analysis: Option<AnalysisResult>,
    /// Design image forwarded to the model as-is
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>, platform: Platform) -> Self {
        Self {
            text: text.into(),
            platform,
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_existing(mut self, existing: AnalysisResult) -> Self {
        self.existing_analysis = Some(existing);
        self
    }

    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn context_str(&self) -> &str {
        self.context.as_deref().unwrap_or("")
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RequirementType::UiComponent).unwrap(),
            "\"ui_component\""
        );
        assert_eq!(RequirementType::UiComponent.to_string(), "ui_component");
    }

    #[test]
    fn test_effort_size_parses_labels() {
        assert_eq!("m".parse::<EffortSize>().unwrap(), EffortSize::M);
        assert_eq!("XL (Extra Large)".parse::<EffortSize>().unwrap(), EffortSize::XL);
        assert_eq!("Small".parse::<EffortSize>().unwrap(), EffortSize::S);
        assert!("huge".parse::<EffortSize>().is_err());
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("Mobile".parse::<Platform>().unwrap(), Platform::Mobile);
        assert!("tv".parse::<Platform>().is_err());
    }

    #[test]
    fn test_query_helpers() {
        let mut login = Requirement::new("a", "Login");
        login.priority = RequirementPriority::Critical;
        let mut button = Requirement::new("b", "Submit button");
        button.requirement_type = RequirementType::UiComponent;
        button.status = RequirementStatus::Ambiguous;

        let result = AnalysisResult {
            requirements: vec![login, button],
            ..Default::default()
        };

        assert_eq!(result.critical_requirements().len(), 1);
        assert_eq!(result.requirements_by_type(RequirementType::UiComponent)[0].id, "b");
        assert_eq!(result.incomplete_requirements()[0].id, "b");
        assert_eq!(result.find_requirement("a").map(|r| r.title.as_str()), Some("Login"));
        assert!(result.find_requirement("zzz").is_none());
    }
}
