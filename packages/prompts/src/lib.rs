// ABOUTME: Centralized prompt management for requirement analysis
// ABOUTME: Provides type-safe prompt loading and parameter substitution from JSON templates

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prompt ids shipped with the crate
pub mod ids {
    pub const PROJECT_OVERVIEW: &str = "project_overview";
    pub const INITIAL_ANALYSIS: &str = "initial_analysis";
    pub const REFINE_ANALYSIS: &str = "refine_analysis";
    pub const COMPONENT_EXTRACTION: &str = "component_extraction";
    pub const LAYOUT_ANALYSIS: &str = "layout_analysis";
    pub const STYLING_ANALYSIS: &str = "styling_analysis";
    pub const INTERACTION_ANALYSIS: &str = "interaction_analysis";
    pub const DESIGN_FULL: &str = "design_full";
    pub const DESIGN_LAYOUT: &str = "design_layout";
    pub const DESIGN_COLORS: &str = "design_colors";
    pub const DESIGN_COMPONENTS: &str = "design_components";
    pub const REQUIREMENTS_SYSTEM: &str = "requirements";
}

const BUILTIN_PROMPTS: &[&str] = &[
    include_str!("../system/requirements.json"),
    include_str!("../analysis/project_overview.json"),
    include_str!("../analysis/initial_analysis.json"),
    include_str!("../analysis/refine_analysis.json"),
    include_str!("../analysis/component_extraction.json"),
    include_str!("../analysis/layout_analysis.json"),
    include_str!("../analysis/styling_analysis.json"),
    include_str!("../analysis/interaction_analysis.json"),
    include_str!("../analysis/design_full.json"),
    include_str!("../analysis/design_layout.json"),
    include_str!("../analysis/design_colors.json"),
    include_str!("../analysis/design_components.json"),
];

const CATEGORIES: &[&str] = &["analysis", "system"];

#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Prompt not found: {0}")]
    NotFound(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Failed to read prompt file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse prompt JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid prompt format: {0}")]
    InvalidFormat(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMetadata {
    pub version: String,
    #[serde(rename = "lastModified")]
    pub last_modified: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub name: String,
    pub category: String,
    pub template: String,
    pub parameters: Vec<String>,
    #[serde(rename = "outputSchema", skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PromptMetadata>,
}

/// Prompt registry: built-in templates, optional on-disk replacements, and
/// per-module template overrides, in increasing order of precedence.
#[derive(Debug, Clone)]
pub struct PromptManager {
    prompts_dir: Option<PathBuf>,
    prompts: HashMap<String, Prompt>,
    overrides: BTreeMap<String, String>,
}

impl PromptManager {
    /// Create a PromptManager from the built-in templates
    ///
    /// If prompts_dir is given, `<dir>/analysis/*.json` and `<dir>/system/*.json`
    /// replace built-ins with the same id.
    pub fn new(prompts_dir: Option<PathBuf>) -> Result<Self, PromptError> {
        let mut manager = Self {
            prompts_dir,
            prompts: HashMap::new(),
            overrides: BTreeMap::new(),
        };
        manager.reload()?;
        Ok(manager)
    }

    /// Built-in templates only
    pub fn builtin() -> Result<Self, PromptError> {
        Self::new(None)
    }

    /// Replace templates by prompt id (typically a module's custom_prompts)
    pub fn with_overrides(mut self, overrides: BTreeMap<String, String>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Re-read built-ins and the prompts directory
    pub fn reload(&mut self) -> Result<(), PromptError> {
        self.prompts.clear();

        for raw in BUILTIN_PROMPTS {
            let prompt = parse_prompt(raw, "built-in")?;
            self.prompts.insert(prompt.id.clone(), prompt);
        }

        if let Some(dir) = self.prompts_dir.clone() {
            for category in CATEGORIES {
                let category_dir = dir.join(category);
                if !category_dir.exists() {
                    continue;
                }
                for entry in fs::read_dir(&category_dir)? {
                    let path = entry?.path();
                    if path.extension().and_then(|s| s.to_str()) == Some("json") {
                        let prompt = load_prompt_from_path(&path)?;
                        self.prompts.insert(prompt.id.clone(), prompt);
                    }
                }
            }
        }

        Ok(())
    }

    /// Get a prompt by ID with parameter substitution
    pub fn get_prompt(&self, prompt_id: &str, parameters: &[(&str, &str)]) -> Result<String, PromptError> {
        let prompt = self.load_prompt(prompt_id)?;
        let template = self
            .overrides
            .get(prompt_id)
            .map(String::as_str)
            .unwrap_or(prompt.template.as_str());

        // Always validate required parameters, even if empty list provided
        self.substitute_parameters(template, parameters, &prompt.parameters)
    }

    /// Get a system prompt by id
    pub fn get_system_prompt(&self, prompt_id: &str) -> Result<String, PromptError> {
        let prompt = self.load_prompt(prompt_id)?;
        if prompt.category != "system" {
            return Err(PromptError::InvalidFormat(format!(
                "{} is not a system prompt",
                prompt_id
            )));
        }
        Ok(self
            .overrides
            .get(prompt_id)
            .cloned()
            .unwrap_or_else(|| prompt.template.clone()))
    }

    /// Get prompt metadata without substitution
    pub fn get_prompt_metadata(&self, prompt_id: &str) -> Result<Prompt, PromptError> {
        self.load_prompt(prompt_id).cloned()
    }

    /// List all prompt ids in a category, sorted
    pub fn list_prompts(&self, category: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .prompts
            .values()
            .filter(|p| p.category == category)
            .map(|p| p.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Substitute parameters in a template
    fn substitute_parameters(
        &self,
        template: &str,
        parameters: &[(&str, &str)],
        required_params: &[String],
    ) -> Result<String, PromptError> {
        // Check all required parameters are provided
        let param_map: HashMap<&str, &str> = parameters.iter().copied().collect();

        for required in required_params {
            if !param_map.contains_key(required.as_str()) {
                return Err(PromptError::MissingParameter(required.clone()));
            }
        }

        // Replace {{parameter}} with values
        let mut result = template.to_string();
        for (key, value) in parameters {
            let placeholder = format!("{{{{{}}}}}", key);
            result = result.replace(&placeholder, value);
        }

        Ok(result)
    }

    fn load_prompt(&self, prompt_id: &str) -> Result<&Prompt, PromptError> {
        self.prompts
            .get(prompt_id)
            .ok_or_else(|| PromptError::NotFound(prompt_id.to_string()))
    }
}

/// Load a prompt from a specific file path
fn load_prompt_from_path(path: &Path) -> Result<Prompt, PromptError> {
    let content = fs::read_to_string(path)?;
    parse_prompt(&content, &path.display().to_string())
}

fn parse_prompt(content: &str, origin: &str) -> Result<Prompt, PromptError> {
    let prompt: Prompt = serde_json::from_str(content)?;

    // Basic validation
    if prompt.id.is_empty() || prompt.template.is_empty() || prompt.category.is_empty() {
        return Err(PromptError::InvalidFormat(format!(
            "Invalid prompt format in {}",
            origin
        )));
    }

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_system_prompt() {
        let manager = PromptManager::builtin().unwrap();
        let prompt = manager.get_system_prompt(ids::REQUIREMENTS_SYSTEM).unwrap();
        assert!(prompt.contains("requirements analyst"));
        assert!(prompt.contains("ui_component"));
    }

    #[test]
    fn test_load_prompt_with_parameters() {
        let manager = PromptManager::builtin().unwrap();
        let prompt = manager
            .get_prompt(
                ids::INITIAL_ANALYSIS,
                &[
                    ("requirements_text", "A todo app"),
                    ("context", "small teams"),
                    ("platform", "web"),
                ],
            )
            .unwrap();
        assert!(prompt.contains("A todo app"));
        assert!(prompt.contains("Target platform: web"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_design_prompt_metadata() {
        let manager = PromptManager::builtin().unwrap();
        let prompt = manager.get_prompt_metadata(ids::DESIGN_FULL).unwrap();
        assert_eq!(prompt.category, "analysis");
        assert_eq!(prompt.parameters, vec!["context".to_string()]);
        assert_eq!(prompt.metadata.map(|m| m.version).as_deref(), Some("1.0.0"));

        let rendered = manager
            .get_prompt(ids::DESIGN_FULL, &[("context", "checkout page")])
            .unwrap();
        assert!(rendered.contains("checkout page"));
        assert!(rendered.contains("## Colors"));
    }

    #[test]
    fn test_missing_parameter_error() {
        let manager = PromptManager::builtin().unwrap();
        let result = manager.get_prompt(ids::PROJECT_OVERVIEW, &[]);
        assert!(matches!(result, Err(PromptError::MissingParameter(_))));
    }

    #[test]
    fn test_prompt_not_found() {
        let manager = PromptManager::builtin().unwrap();
        let result = manager.get_prompt("nonexistent", &[]);
        assert!(matches!(result, Err(PromptError::NotFound(_))));
    }

    #[test]
    fn test_list_prompts() {
        let manager = PromptManager::builtin().unwrap();
        let prompts = manager.list_prompts("analysis");
        assert!(prompts.contains(&ids::COMPONENT_EXTRACTION.to_string()));
        assert!(prompts.contains(&ids::LAYOUT_ANALYSIS.to_string()));
        assert!(prompts.contains(&ids::DESIGN_COLORS.to_string()));
        assert_eq!(manager.list_prompts("system"), vec!["requirements".to_string()]);
    }

    #[test]
    fn test_override_replaces_template_but_keeps_parameter_check() {
        let mut overrides = BTreeMap::new();
        overrides.insert(
            ids::PROJECT_OVERVIEW.to_string(),
            "Summarize {{requirements_text}}".to_string(),
        );
        let manager = PromptManager::builtin().unwrap().with_overrides(overrides);

        let prompt = manager
            .get_prompt(
                ids::PROJECT_OVERVIEW,
                &[("requirements_text", "a shop"), ("context", "")],
            )
            .unwrap();
        assert_eq!(prompt, "Summarize a shop");

        let missing = manager.get_prompt(ids::PROJECT_OVERVIEW, &[("requirements_text", "x")]);
        assert!(matches!(missing, Err(PromptError::MissingParameter(p)) if p == "context"));
    }

    #[test]
    fn test_prompts_dir_replaces_builtin() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("analysis")).unwrap();
        fs::write(
            dir.path().join("analysis").join("project_overview.json"),
            r#"{"id":"project_overview","name":"Overview","category":"analysis",
                "template":"Custom {{requirements_text}}","parameters":["requirements_text"]}"#,
        )
        .unwrap();

        let manager = PromptManager::new(Some(dir.path().to_path_buf())).unwrap();
        let prompt = manager
            .get_prompt(ids::PROJECT_OVERVIEW, &[("requirements_text", "shop")])
            .unwrap();
        assert_eq!(prompt, "Custom shop");
    }

    #[test]
    fn test_invalid_prompt_file_rejected() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("system")).unwrap();
        fs::write(
            dir.path().join("system").join("broken.json"),
            r#"{"id":"","name":"x","category":"system","template":"t","parameters":[]}"#,
        )
        .unwrap();

        let result = PromptManager::new(Some(dir.path().to_path_buf()));
        assert!(matches!(result, Err(PromptError::InvalidFormat(_))));
    }
}
