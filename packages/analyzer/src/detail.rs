// ABOUTME: Per-requirement detail passes that attach component, layout, style, and interaction specs
// ABOUTME: Strategy table keyed by requirement type, each entry owning its prompt and post-processing

use tracing::{debug, error, info, warn};
use uieasy_ai::ModelClient;
use uieasy_prompts::{ids, PromptManager};

use crate::builder::{component_from_json, interaction_from_json, layout_from_json, style_from_json};
use crate::error::Result;
use crate::normalizer::{normalize, NormalizedResponse};
use crate::types::{Requirement, RequirementStatus, RequirementType};

/// One detail pass: which requirements it applies to, which prompt it sends,
/// and how the normalized response is attached
pub struct DetailPass {
    pub requirement_type: RequirementType,
    pub prompt_id: &'static str,
    attach: fn(&mut Requirement, &NormalizedResponse) -> bool,
}

impl DetailPass {
    /// Attach the parsed detail; returns false when nothing usable was found
    pub fn apply(&self, requirement: &mut Requirement, response: &NormalizedResponse) -> bool {
        (self.attach)(requirement, response)
    }
}

pub const DETAIL_PASSES: &[DetailPass] = &[
    DetailPass {
        requirement_type: RequirementType::UiComponent,
        prompt_id: ids::COMPONENT_EXTRACTION,
        attach: attach_component,
    },
    DetailPass {
        requirement_type: RequirementType::Layout,
        prompt_id: ids::LAYOUT_ANALYSIS,
        attach: attach_layout,
    },
    DetailPass {
        requirement_type: RequirementType::Styling,
        prompt_id: ids::STYLING_ANALYSIS,
        attach: attach_style,
    },
    DetailPass {
        requirement_type: RequirementType::Interaction,
        prompt_id: ids::INTERACTION_ANALYSIS,
        attach: attach_interactions,
    },
];

/// Detail pass registered for a requirement type, if any
pub fn detail_pass_for(requirement_type: RequirementType) -> Option<&'static DetailPass> {
    DETAIL_PASSES
        .iter()
        .find(|pass| pass.requirement_type == requirement_type)
}

fn attach_component(requirement: &mut Requirement, response: &NormalizedResponse) -> bool {
    match response.root().and_then(component_from_json) {
        Some(spec) => {
            requirement.component_spec = Some(spec);
            true
        }
        None => false,
    }
}

fn attach_layout(requirement: &mut Requirement, response: &NormalizedResponse) -> bool {
    match response.root().and_then(layout_from_json) {
        Some(spec) => {
            requirement.layout_spec = Some(spec);
            true
        }
        None => false,
    }
}

fn attach_style(requirement: &mut Requirement, response: &NormalizedResponse) -> bool {
    match response.root().and_then(style_from_json) {
        Some(spec) => {
            requirement.style_spec = Some(spec);
            true
        }
        None => false,
    }
}

fn attach_interactions(requirement: &mut Requirement, response: &NormalizedResponse) -> bool {
    let specs: Vec<_> = response
        .objects()
        .iter()
        .filter_map(interaction_from_json)
        .collect();
    if specs.is_empty() {
        return false;
    }
    requirement.interaction_specs = specs;
    true
}

/// Run the matching detail pass for every requirement that has one
///
/// Malformed responses leave the requirement unchanged. Provider errors abort.
/// Returns the number of requirements that gained a spec.
pub async fn run_detail_passes(
    client: &dyn ModelClient,
    prompts: &PromptManager,
    system_prompt: &str,
    requirements: &mut [Requirement],
    original_text: &str,
) -> Result<usize> {
    let mut attached = 0;

    for requirement in requirements.iter_mut() {
        let Some(pass) = detail_pass_for(requirement.requirement_type) else {
            continue;
        };

        let prompt = prompts.get_prompt(
            pass.prompt_id,
            &[
                ("requirement_title", requirement.title.as_str()),
                ("requirement_description", requirement.description.as_str()),
                ("original_text", original_text),
            ],
        )?;
        let full_prompt = format!("{}\n\n{}", system_prompt, prompt);

        debug!("Running {} for requirement {}", pass.prompt_id, requirement.id);
        let raw = client.send(&full_prompt, None).await.map_err(|e| {
            error!("{} failed for requirement {}: {}", pass.prompt_id, requirement.id, e);
            e
        })?;

        let response = match normalize(&raw) {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "Skipping {} for requirement '{}': {}",
                    pass.prompt_id, requirement.title, e
                );
                continue;
            }
        };

        if pass.apply(requirement, &response) {
            requirement.status = RequirementStatus::Analyzed;
            requirement.updated_at = chrono::Utc::now();
            attached += 1;
        } else {
            warn!(
                "{} returned no usable detail for requirement '{}'",
                pass.prompt_id, requirement.title
            );
        }
    }

    info!("Detail passes attached specs to {} requirements", attached);
    Ok(attached)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_detail_pass_has_distinct_type() {
        for pass in DETAIL_PASSES {
            assert_eq!(
                detail_pass_for(pass.requirement_type).map(|p| p.prompt_id),
                Some(pass.prompt_id)
            );
        }
        assert!(detail_pass_for(RequirementType::Functional).is_none());
        assert!(detail_pass_for(RequirementType::Performance).is_none());
    }

    #[test]
    fn test_component_pass_attaches_spec() {
        let response = normalize(r#"{"name": "LoginForm", "type": "form", "events": ["submit"]}"#)
            .unwrap();
        let mut requirement = Requirement::new("a", "Login form");
        requirement.requirement_type = RequirementType::UiComponent;

        let pass = detail_pass_for(RequirementType::UiComponent).unwrap();
        assert!(pass.apply(&mut requirement, &response));
        let spec = requirement.component_spec.unwrap();
        assert_eq!(spec.name, "LoginForm");
        assert_eq!(spec.events, vec!["submit".to_string()]);
    }

    #[test]
    fn test_interaction_pass_reads_wrapped_list() {
        let response = normalize(
            r#"{"interactions": [
                {"trigger": "click", "action": "open", "target": "menu"},
                {"trigger": "hover", "action": "highlight", "target": "row"}
            ]}"#,
        )
        .unwrap();
        let mut requirement = Requirement::new("a", "Menu interactions");
        requirement.requirement_type = RequirementType::Interaction;

        let pass = detail_pass_for(RequirementType::Interaction).unwrap();
        assert!(pass.apply(&mut requirement, &response));
        assert_eq!(requirement.interaction_specs.len(), 2);
        assert_eq!(requirement.interaction_specs[1].trigger, "hover");
    }
}
