// ABOUTME: Builds typed requirements from normalized response records
// ABOUTME: Coerces enums, assigns ids, attaches nested specs, resolves references, and merges refinements

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{
    ComponentSpec, EffortSize, InteractionSpec, LayoutSection, LayoutSpec, Requirement,
    RequirementPriority, RequirementStatus, RequirementType, StyleSpec,
};

/// Title similarity above which two requirements are considered the same
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.8;

const MAX_SOURCE_EXCERPT_CHARS: usize = 200;

/// Requirements plus the findings raised while building them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOutcome {
    pub requirements: Vec<Requirement>,
    pub gaps: Vec<String>,
    pub ambiguities: Vec<String>,
    /// Incoming records merged into existing requirements
    pub merged: usize,
    /// Incoming records appended as new requirements
    pub added: usize,
}

/// Coerce a free-form type label to a requirement type
pub fn parse_type(raw: &str) -> Option<RequirementType> {
    let requirement_type = match normalize_label(raw).as_str() {
        "functional" | "function" | "functionality" | "feature" | "func" | "功能" | "功能需求" => {
            RequirementType::Functional
        }
        "ui_component" | "uicomponent" | "ui" | "component" | "ui_element" | "widget"
        | "control" | "组件" | "控件" | "界面组件" | "ui组件" => RequirementType::UiComponent,
        "layout" | "page_layout" | "structure" | "布局" | "页面布局" => RequirementType::Layout,
        "styling" | "style" | "styles" | "visual" | "theme" | "design" | "样式" | "风格" | "视觉" => {
            RequirementType::Styling
        }
        "interaction" | "interactions" | "behavior" | "behaviour" | "ux" | "交互" => {
            RequirementType::Interaction
        }
        "data" | "data_model" | "storage" | "数据" => RequirementType::Data,
        "performance" | "perf" | "speed" | "性能" => RequirementType::Performance,
        "accessibility" | "a11y" | "无障碍" | "可访问性" => RequirementType::Accessibility,
        "business" | "business_logic" | "business_rule" | "业务" | "业务逻辑" => {
            RequirementType::Business
        }
        _ => return None,
    };
    Some(requirement_type)
}

/// Coerce a free-form priority label to a priority
pub fn parse_priority(raw: &str) -> Option<RequirementPriority> {
    let priority = match normalize_label(raw).as_str() {
        "critical" | "p0" | "must" | "must_have" | "blocker" | "urgent" | "highest" | "紧急"
        | "关键" | "最高" | "必须" => RequirementPriority::Critical,
        "high" | "p1" | "should" | "should_have" | "important" | "高" => RequirementPriority::High,
        "medium" | "p2" | "could" | "could_have" | "normal" | "moderate" | "中" | "中等"
        | "一般" => RequirementPriority::Medium,
        "low" | "p3" | "p4" | "wont" | "won't" | "wont_have" | "nice_to_have" | "optional"
        | "minor" | "低" => RequirementPriority::Low,
        _ => return None,
    };
    Some(priority)
}

fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect::<String>()
        .trim_end_matches("_priority")
        .to_string()
}

/// Effort estimate from type, priority, and complexity signals
pub fn estimate_effort(requirement: &Requirement) -> EffortSize {
    let mut points = requirement.effort_points();

    let text = requirement.text_lowercase();
    if ["complex", "integration", "real-time", "realtime", "sync", "复杂", "实时"]
        .iter()
        .any(|signal| text.contains(signal))
    {
        points += 1.0;
    }
    if requirement.acceptance_criteria.len() > 3 {
        points += 1.0;
    }
    if !requirement.dependencies.is_empty() {
        points += 0.5;
    }

    match points {
        p if p <= 1.0 => EffortSize::XS,
        p if p <= 2.0 => EffortSize::S,
        p if p <= 3.0 => EffortSize::M,
        p if p <= 4.5 => EffortSize::L,
        _ => EffortSize::XL,
    }
}

/// Lowercased alphanumeric characters only
fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn bigrams(text: &str) -> HashSet<(char, char)> {
    let chars: Vec<char> = text.chars().collect();
    chars.windows(2).map(|w| (w[0], w[1])).collect()
}

/// Normalized equality, or Jaccard similarity of character bigrams
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_title(a);
    let b = normalize_title(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let (left, right) = (bigrams(&a), bigrams(&b));
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

/// Requirement fields as read from one record, before ids are settled
#[derive(Debug, Clone, Default)]
struct Draft {
    id: Option<String>,
    title: String,
    description: String,
    requirement_type: Option<RequirementType>,
    priority: Option<RequirementPriority>,
    unrecognized: bool,
    component_spec: Option<ComponentSpec>,
    layout_spec: Option<LayoutSpec>,
    style_spec: Option<StyleSpec>,
    interaction_specs: Vec<InteractionSpec>,
    dependency_refs: Vec<String>,
    conflict_refs: Vec<String>,
    acceptance_criteria: Vec<String>,
    estimated_effort: Option<EffortSize>,
    tags: Vec<String>,
    source: Option<String>,
    rationale: String,
}

/// Turns normalized records into requirements
pub struct RequirementBuilder<'a> {
    source_text: &'a str,
    now: DateTime<Utc>,
}

impl<'a> RequirementBuilder<'a> {
    /// `source_text` is the user input requirements are excerpted from
    pub fn new(source_text: &'a str) -> Self {
        Self {
            source_text,
            now: Utc::now(),
        }
    }

    /// Fix the timestamp used for created_at/updated_at
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Build a fresh batch of requirements
    pub fn build(&self, records: &[Map<String, Value>]) -> BuildOutcome {
        self.merge(&[], records)
    }

    /// Merge records into existing requirements, matching by id then title similarity
    pub fn merge(&self, existing: &[Requirement], records: &[Map<String, Value>]) -> BuildOutcome {
        let mut outcome = BuildOutcome {
            requirements: existing.to_vec(),
            ..Default::default()
        };
        let mut ids: HashSet<String> = existing.iter().map(|r| r.id.clone()).collect();
        let mut matched: HashSet<usize> = HashSet::new();
        // (index into requirements, dependency refs, conflict refs)
        let mut pending_refs: Vec<(usize, Vec<String>, Vec<String>)> = Vec::new();

        for record in records {
            let Some(draft) = self.draft_from_record(record, &mut outcome.ambiguities) else {
                debug!("Skipping record without title or description");
                continue;
            };

            let target = self.find_match(&outcome.requirements[..existing.len()], &draft, &matched);
            let index = match target {
                Some(index) => {
                    matched.insert(index);
                    self.apply_draft(&mut outcome.requirements[index], &draft);
                    outcome.merged += 1;
                    index
                }
                None => {
                    let id = match &draft.id {
                        Some(id) if !ids.contains(id) => id.clone(),
                        _ => Uuid::new_v4().to_string(),
                    };
                    ids.insert(id.clone());
                    outcome.requirements.push(self.new_requirement(id, &draft));
                    outcome.added += 1;
                    outcome.requirements.len() - 1
                }
            };

            if !draft.dependency_refs.is_empty() || !draft.conflict_refs.is_empty() {
                pending_refs.push((index, draft.dependency_refs, draft.conflict_refs));
            }
        }

        for (index, dependency_refs, conflict_refs) in pending_refs {
            let requirement = &outcome.requirements[index];
            let (dependencies, mut gaps) =
                resolve_references(&outcome.requirements, requirement, &dependency_refs, "dependency");
            let (conflicts, conflict_gaps) =
                resolve_references(&outcome.requirements, requirement, &conflict_refs, "conflict");
            gaps.extend(conflict_gaps);

            let requirement = &mut outcome.requirements[index];
            if !dependency_refs.is_empty() {
                requirement.dependencies = dependencies;
            }
            if !conflict_refs.is_empty() {
                requirement.conflicts = conflicts;
            }
            outcome.gaps.extend(gaps);
        }

        for requirement in &mut outcome.requirements {
            if requirement.estimated_effort.is_none() {
                requirement.estimated_effort = Some(estimate_effort(requirement));
            }
        }

        info!(
            "Built {} requirements ({} new, {} merged)",
            outcome.requirements.len(),
            outcome.added,
            outcome.merged
        );
        outcome
    }

    fn find_match(
        &self,
        existing: &[Requirement],
        draft: &Draft,
        matched: &HashSet<usize>,
    ) -> Option<usize> {
        if let Some(id) = &draft.id {
            if let Some(index) = existing.iter().position(|r| &r.id == id) {
                return Some(index);
            }
        }
        if draft.title.is_empty() {
            return None;
        }

        existing
            .iter()
            .enumerate()
            .filter(|(index, _)| !matched.contains(index))
            .map(|(index, r)| (index, title_similarity(&r.title, &draft.title)))
            .filter(|(_, score)| *score >= TITLE_SIMILARITY_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
            .map(|(index, _)| index)
    }

    fn draft_from_record(
        &self,
        record: &Map<String, Value>,
        ambiguities: &mut Vec<String>,
    ) -> Option<Draft> {
        let title = first_string(record, &["title", "name", "requirement"]).unwrap_or_default();
        let description =
            first_string(record, &["description", "desc", "details"]).unwrap_or_default();
        if title.is_empty() && description.is_empty() {
            return None;
        }
        let label = if title.is_empty() { description.clone() } else { title.clone() };

        let mut draft = Draft {
            id: first_string(record, &["id"]),
            title,
            description,
            ..Default::default()
        };

        if let Some(raw) = first_string(record, &["type", "requirement_type", "category"]) {
            draft.requirement_type = parse_type(&raw);
            if draft.requirement_type.is_none() {
                draft.unrecognized = true;
                ambiguities.push(format!(
                    "Unrecognized type '{}' for '{}', treated as functional",
                    raw, label
                ));
            }
        }
        if let Some(raw) = first_string(record, &["priority"]) {
            draft.priority = parse_priority(&raw);
            if draft.priority.is_none() {
                draft.unrecognized = true;
                ambiguities.push(format!(
                    "Unrecognized priority '{}' for '{}', treated as medium",
                    raw, label
                ));
            }
        }

        draft.component_spec = first_object(record, &["component_spec", "component"])
            .and_then(component_from_json);
        draft.layout_spec =
            first_object(record, &["layout_spec", "layout"]).and_then(layout_from_json);
        draft.style_spec =
            first_object(record, &["style_spec", "style", "styling"]).and_then(style_from_json);
        draft.interaction_specs = ["interaction_specs", "interactions"]
            .iter()
            .find_map(|key| record.get(*key).and_then(Value::as_array))
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .filter_map(interaction_from_json)
                    .collect()
            })
            .unwrap_or_default();

        draft.dependency_refs = string_list(record.get("dependencies"));
        draft.conflict_refs = string_list(record.get("conflicts"));
        draft.acceptance_criteria = string_list(
            record
                .get("acceptance_criteria")
                .or_else(|| record.get("acceptanceCriteria")),
        );
        draft.tags = string_list(record.get("tags"));
        draft.estimated_effort = first_string(record, &["estimated_effort", "effort"])
            .and_then(|raw| raw.parse().ok());
        draft.source = first_string(record, &["source"]);
        draft.rationale = first_string(record, &["rationale", "reason"]).unwrap_or_default();

        Some(draft)
    }

    fn new_requirement(&self, id: String, draft: &Draft) -> Requirement {
        let mut requirement = Requirement::new(id, draft.title.clone());
        requirement.description = draft.description.clone();
        requirement.requirement_type = draft.requirement_type.unwrap_or(RequirementType::Functional);
        requirement.priority = draft.priority.unwrap_or(RequirementPriority::Medium);
        if draft.unrecognized {
            requirement.status = RequirementStatus::Ambiguous;
        }
        requirement.component_spec = draft.component_spec.clone();
        requirement.layout_spec = draft.layout_spec.clone();
        requirement.style_spec = draft.style_spec.clone();
        requirement.interaction_specs = draft.interaction_specs.clone();
        requirement.acceptance_criteria = draft.acceptance_criteria.clone();
        requirement.estimated_effort = draft.estimated_effort;
        requirement.tags = draft.tags.clone();
        requirement.rationale = draft.rationale.clone();
        requirement.source = draft
            .source
            .clone()
            .unwrap_or_else(|| self.source_excerpt(&draft.title));
        requirement.created_at = self.now;
        requirement.updated_at = self.now;
        requirement
    }

    /// Field-by-field merge; non-empty incoming values win
    fn apply_draft(&self, requirement: &mut Requirement, draft: &Draft) {
        if !draft.title.is_empty() {
            requirement.title = draft.title.clone();
        }
        if !draft.description.is_empty() {
            requirement.description = draft.description.clone();
        }
        let mut sizing_changed = false;
        if let Some(requirement_type) = draft.requirement_type {
            sizing_changed |= requirement.requirement_type != requirement_type;
            requirement.requirement_type = requirement_type;
        }
        if let Some(priority) = draft.priority {
            sizing_changed |= requirement.priority != priority;
            requirement.priority = priority;
        }
        if draft.component_spec.is_some() {
            requirement.component_spec = draft.component_spec.clone();
        }
        if draft.layout_spec.is_some() {
            requirement.layout_spec = draft.layout_spec.clone();
        }
        if draft.style_spec.is_some() {
            requirement.style_spec = draft.style_spec.clone();
        }
        if !draft.interaction_specs.is_empty() {
            requirement.interaction_specs = draft.interaction_specs.clone();
        }
        if !draft.acceptance_criteria.is_empty() {
            requirement.acceptance_criteria = draft.acceptance_criteria.clone();
        }
        if draft.estimated_effort.is_some() {
            requirement.estimated_effort = draft.estimated_effort;
        } else if sizing_changed {
            // re-estimated after all references resolve
            requirement.estimated_effort = None;
        }
        if !draft.tags.is_empty() {
            requirement.tags = draft.tags.clone();
        }
        if let Some(source) = draft.source.as_ref().filter(|s| !s.is_empty()) {
            requirement.source = source.clone();
        }
        if !draft.rationale.is_empty() {
            requirement.rationale = draft.rationale.clone();
        }
        if draft.unrecognized {
            requirement.status = RequirementStatus::Ambiguous;
        } else if matches!(
            requirement.status,
            RequirementStatus::Incomplete | RequirementStatus::Ambiguous
        ) {
            // assessment re-derives incomplete/ambiguous from the merged text
            requirement.status = RequirementStatus::Identified;
        }
        requirement.updated_at = self.now;
    }

    /// The source line mentioning the title, if any
    fn source_excerpt(&self, title: &str) -> String {
        let needle = title.trim().to_lowercase();
        if needle.is_empty() {
            return String::new();
        }
        self.source_text
            .lines()
            .find(|line| line.to_lowercase().contains(&needle))
            .map(|line| line.trim().chars().take(MAX_SOURCE_EXCERPT_CHARS).collect())
            .unwrap_or_default()
    }
}

/// Resolve references given by id or title; unresolved ones become gaps
fn resolve_references(
    requirements: &[Requirement],
    owner: &Requirement,
    refs: &[String],
    kind: &str,
) -> (Vec<String>, Vec<String>) {
    let mut resolved: Vec<String> = Vec::new();
    let mut gaps = Vec::new();

    for reference in refs {
        let target = requirements
            .iter()
            .find(|r| &r.id == reference)
            .or_else(|| {
                let wanted = normalize_title(reference);
                requirements
                    .iter()
                    .find(|r| !wanted.is_empty() && normalize_title(&r.title) == wanted)
            });

        match target {
            Some(target) if target.id == owner.id => {
                debug!("Ignoring self-reference in '{}'", owner.title);
            }
            Some(target) => {
                if !resolved.contains(&target.id) {
                    resolved.push(target.id.clone());
                }
            }
            None => gaps.push(format!(
                "Requirement '{}' references unknown {} '{}'",
                owner.title, kind, reference
            )),
        }
    }

    (resolved, gaps)
}

// ----------------------------------------------------------------------------
// Record field helpers
// ----------------------------------------------------------------------------

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn first_string(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(value_to_string))
}

fn first_object<'r>(record: &'r Map<String, Value>, keys: &[&str]) -> Option<&'r Map<String, Value>> {
    keys.iter()
        .find_map(|key| record.get(*key).and_then(Value::as_object))
}

/// A list of strings from an array, or a single newline/comma separated string
pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(value_to_string).collect(),
        Some(Value::String(text)) => text
            .split(['\n', ','])
            .map(|item| item.trim().trim_start_matches(['-', '*', '•']).trim())
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn value_map(value: Option<&Value>) -> BTreeMap<String, Value> {
    value
        .and_then(Value::as_object)
        .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| value_to_string(v).map(|s| (k.clone(), s)))
                .collect()
        })
        .unwrap_or_default()
}

/// Px value from a number or a string like "768px"
fn pixels(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s
            .trim()
            .trim_end_matches("px")
            .trim()
            .parse::<u32>()
            .ok(),
        _ => None,
    }
}

// ----------------------------------------------------------------------------
// Nested specs
// ----------------------------------------------------------------------------

/// Component spec; requires `name` and `type`
pub fn component_from_json(map: &Map<String, Value>) -> Option<ComponentSpec> {
    let name = first_string(map, &["name"])?;
    let component_type = first_string(map, &["type", "component_type"])?;
    let children = map
        .get("children")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(component_from_json)
                .collect()
        })
        .unwrap_or_default();

    let validation = match map.get("validation") {
        Some(Value::Array(rules)) => {
            let mut validation = BTreeMap::new();
            validation.insert("rules".to_string(), Value::Array(rules.clone()));
            validation
        }
        other => value_map(other),
    };

    Some(ComponentSpec {
        name,
        component_type,
        properties: value_map(map.get("properties")),
        children,
        events: string_list(map.get("events")),
        validation,
        accessibility: string_map(map.get("accessibility")),
    })
}

/// Layout spec; requires `type`
pub fn layout_from_json(map: &Map<String, Value>) -> Option<LayoutSpec> {
    let layout_type = first_string(map, &["type", "layout_type"])?;
    let sections = map
        .get("sections")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|section| {
                    Some(LayoutSection {
                        name: first_string(section, &["name"])?,
                        position: first_string(section, &["position"]).unwrap_or_default(),
                        size: first_string(section, &["size"]).unwrap_or_default(),
                        components: string_list(section.get("components")),
                        responsive: string_map(section.get("responsive")),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let breakpoints = map
        .get("breakpoints")
        .and_then(Value::as_object)
        .map(|bps| {
            bps.iter()
                .filter_map(|(name, value)| pixels(value).map(|px| (name.clone(), px)))
                .collect()
        })
        .unwrap_or_default();

    let alignment = match map.get("alignment") {
        Some(Value::String(value)) => {
            let mut alignment = BTreeMap::new();
            alignment.insert("horizontal".to_string(), value.clone());
            alignment
        }
        other => string_map(other),
    };

    Some(LayoutSpec {
        layout_type,
        sections,
        responsive: map.get("responsive").and_then(Value::as_bool).unwrap_or(true),
        breakpoints,
        spacing: value_map(map.get("spacing")),
        alignment,
    })
}

/// Style spec; requires at least one style field
pub fn style_from_json(map: &Map<String, Value>) -> Option<StyleSpec> {
    let spec = StyleSpec {
        theme: first_string(map, &["theme"]),
        colors: string_map(map.get("colors")),
        typography: value_map(map.get("typography")),
        spacing: value_map(map.get("spacing")),
        borders: value_map(map.get("borders")),
        shadows: string_map(map.get("shadows")),
        animations: map
            .get("animations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| value_map(Some(item)))
                    .filter(|animation| !animation.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    };
    (!spec.is_empty()).then_some(spec)
}

/// Interaction spec; requires `trigger` and `action`
pub fn interaction_from_json(map: &Map<String, Value>) -> Option<InteractionSpec> {
    Some(InteractionSpec {
        trigger: first_string(map, &["trigger", "event"])?,
        action: first_string(map, &["action"])?,
        target: first_string(map, &["target"]).unwrap_or_default(),
        conditions: string_list(map.get("conditions")),
        feedback: first_string(map, &["feedback"]),
        validation: value_map(map.get("validation")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn records(value: Value) -> Vec<Map<String, Value>> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[rstest]
    #[case("UI", Some(RequirementType::UiComponent))]
    #[case("ui-component", Some(RequirementType::UiComponent))]
    #[case("Component", Some(RequirementType::UiComponent))]
    #[case(" Performance ", Some(RequirementType::Performance))]
    #[case("a11y", Some(RequirementType::Accessibility))]
    #[case("交互", Some(RequirementType::Interaction))]
    #[case("spaceship", None)]
    fn test_parse_type(#[case] raw: &str, #[case] expected: Option<RequirementType>) {
        assert_eq!(parse_type(raw), expected);
    }

    #[rstest]
    #[case("P0", Some(RequirementPriority::Critical))]
    #[case("must have", Some(RequirementPriority::Critical))]
    #[case("紧急", Some(RequirementPriority::Critical))]
    #[case("高", Some(RequirementPriority::High))]
    #[case("High priority", Some(RequirementPriority::High))]
    #[case("中", Some(RequirementPriority::Medium))]
    #[case("nice-to-have", Some(RequirementPriority::Low))]
    #[case("whenever", None)]
    fn test_parse_priority(#[case] raw: &str, #[case] expected: Option<RequirementPriority>) {
        assert_eq!(parse_priority(raw), expected);
    }

    #[test]
    fn test_unrecognized_values_default_and_are_reported() {
        let outcome = RequirementBuilder::new("").build(&records(json!([
            {"title": "Export", "type": "spaceship", "priority": "whenever"},
            {"title": "Import"}
        ])));

        let export = &outcome.requirements[0];
        assert_eq!(export.requirement_type, RequirementType::Functional);
        assert_eq!(export.priority, RequirementPriority::Medium);
        assert_eq!(export.status, RequirementStatus::Ambiguous);
        assert_eq!(outcome.ambiguities.len(), 2);

        let import = &outcome.requirements[1];
        assert_eq!(import.status, RequirementStatus::Identified);
    }

    #[test]
    fn test_colliding_ids_are_replaced() {
        let outcome = RequirementBuilder::new("").build(&records(json!([
            {"id": "r1", "title": "A"},
            {"id": "r1", "title": "B"},
            {"title": "C"}
        ])));

        let ids: HashSet<&str> = outcome.requirements.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(outcome.requirements[0].id, "r1");
        assert!(Uuid::parse_str(&outcome.requirements[1].id).is_ok());
    }

    #[test]
    fn test_nested_specs_require_fields() {
        let outcome = RequirementBuilder::new("").build(&records(json!([
            {
                "title": "Login form",
                "type": "ui_component",
                "component_spec": {"name": "LoginForm", "type": "form",
                    "children": [{"name": "Email", "type": "input"}, {"name": "Broken"}]},
                "layout_spec": {"sections": []},
                "style_spec": {"colors": {"primary": "#007bff"}},
                "interaction_specs": [{"trigger": "click", "action": "submit"}, {"trigger": "hover"}]
            }
        ])));

        let requirement = &outcome.requirements[0];
        let component = requirement.component_spec.as_ref().unwrap();
        assert_eq!(component.children.len(), 1);
        assert_eq!(component.children[0].name, "Email");
        assert!(requirement.layout_spec.is_none());
        assert_eq!(
            requirement.style_spec.as_ref().unwrap().colors["primary"],
            "#007bff"
        );
        assert_eq!(requirement.interaction_specs.len(), 1);
    }

    #[test]
    fn test_references_resolved_by_title_and_unknown_dropped() {
        let outcome = RequirementBuilder::new("").build(&records(json!([
            {"id": "login", "title": "User login"},
            {"title": "Dashboard", "dependencies": ["user login", "Billing", "login"]}
        ])));

        assert_eq!(outcome.requirements[1].dependencies, vec!["login".to_string()]);
        assert_eq!(outcome.gaps.len(), 1);
        assert!(outcome.gaps[0].contains("Billing"));
    }

    #[test]
    fn test_effort_parsed_or_estimated() {
        let outcome = RequirementBuilder::new("").build(&records(json!([
            {"title": "Explicit", "estimated_effort": "L"},
            {"title": "Perf budget", "type": "performance", "priority": "critical"}
        ])));

        assert_eq!(outcome.requirements[0].estimated_effort, Some(EffortSize::L));
        assert_eq!(outcome.requirements[1].estimated_effort, Some(EffortSize::XL));
    }

    #[test]
    fn test_merge_reestimates_effort_when_priority_changes() {
        let initial = RequirementBuilder::new("").build(&records(json!([
            {"id": "perf", "title": "Perf budget", "type": "performance", "priority": "critical"},
            {"id": "exp", "title": "Explicit", "estimated_effort": "L"}
        ])));
        assert_eq!(initial.requirements[0].estimated_effort, Some(EffortSize::XL));

        let merged = RequirementBuilder::new("").merge(
            &initial.requirements,
            &records(json!([
                {"id": "perf", "priority": "low", "description": "Pages load in under two seconds"},
                {"id": "exp", "description": "Export keeps its stated size"}
            ])),
        );

        assert_eq!(merged.requirements[0].estimated_effort, Some(EffortSize::L));
        assert_eq!(merged.requirements[1].estimated_effort, Some(EffortSize::L));
    }

    #[test]
    fn test_source_excerpt_from_input_line() {
        let source = "A todo app.\nUsers need task search across projects.";
        let outcome =
            RequirementBuilder::new(source).build(&records(json!([{"title": "Task search"}])));
        assert_eq!(
            outcome.requirements[0].source,
            "Users need task search across projects."
        );
    }

    #[test]
    fn test_title_similarity() {
        assert_eq!(title_similarity("User Login", "user-login"), 1.0);
        assert!(title_similarity("Shopping cart page", "Shopping cart pages") >= 0.8);
        assert!(title_similarity("Login", "Logout") < 0.8);
        assert_eq!(title_similarity("", "x"), 0.0);
    }

    #[test]
    fn test_merge_matches_by_id_then_title() {
        let builder = RequirementBuilder::new("");
        let existing = builder
            .build(&records(json!([
                {"id": "a", "title": "Login", "description": "old", "acceptance_criteria": ["works"]},
                {"id": "b", "title": "Shopping cart page"}
            ])))
            .requirements;

        let merged = RequirementBuilder::new("").merge(
            &existing,
            &records(json!([
                {"id": "a", "description": "new"},
                {"title": "Shopping cart pages", "priority": "high"},
                {"title": "Checkout"}
            ])),
        );

        assert_eq!(merged.requirements.len(), 3);
        assert_eq!((merged.merged, merged.added), (2, 1));

        let login = &merged.requirements[0];
        assert_eq!(login.id, "a");
        assert_eq!(login.title, "Login");
        assert_eq!(login.description, "new");
        assert_eq!(login.acceptance_criteria, vec!["works".to_string()]);
        assert_eq!(login.created_at, existing[0].created_at);

        assert_eq!(merged.requirements[1].id, "b");
        assert_eq!(merged.requirements[1].priority, RequirementPriority::High);
        assert_eq!(merged.requirements[2].title, "Checkout");
    }

    #[test]
    fn test_records_without_text_are_skipped() {
        let outcome = RequirementBuilder::new("").build(&records(json!([{"type": "ui"}, {}])));
        assert!(outcome.requirements.is_empty());
    }
}
