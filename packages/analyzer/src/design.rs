// ABOUTME: Design image analysis turning a model's description of a UI image into frontend specs
// ABOUTME: Splits the response into sections, extracts CSS values, and derives an implementation guide

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};
use uieasy_ai::{ModelClient, ProviderError, ProviderRegistry};
use uieasy_config::constants::IMAGE_ANALYZER_MODULE;
use uieasy_config::{Config, ModuleConfig};
use uieasy_prompts::{ids, PromptManager};

use crate::error::{AnalyzerError, Result};
use crate::pipeline::{check_cancelled, collect_response, emit, ModelStage, ProgressEvent};

const OVERVIEW_SECTION: &str = "overview";
const MAX_SPACING_VARIABLES: usize = 10;

const COLOR_KEYS: &[&str] = &["color", "colour", "palette", "色彩", "颜色", "配色"];
const TYPOGRAPHY_KEYS: &[&str] = &["typography", "font", "字体", "文字"];
const LAYOUT_KEYS: &[&str] = &["layout", "structure", "grid", "布局", "结构"];
const COMPONENT_KEYS: &[&str] = &["component", "button", "input", "组件", "按钮"];

/// Words that make a short colon-terminated line a section heading
const HEADING_KEYWORDS: &[&str] = &[
    "layout", "color", "colour", "typography", "font", "component", "spacing", "ux",
    "recommendation", "布局", "颜色", "色彩", "字体", "组件", "间距", "建议",
];

const DESIGN_ELEMENTS: &[&str] = &[
    "color", "font", "layout", "component", "spacing", "颜色", "字体", "布局", "组件", "间距",
];
const CSS_DETAILS: &[&str] = &["px", "rem", "rgb", "margin", "padding", "border-radius"];

const DEVELOPMENT_CHECKLIST: &[&str] = &[
    "Define CSS variables for the color palette and spacing scale",
    "Build the page grid and major layout regions",
    "Implement reusable base components",
    "Apply the typography scale",
    "Add hover, focus, active, and disabled states",
    "Verify the layout at every responsive breakpoint",
    "Check color contrast and keyboard navigation",
    "Compare the result side by side with the design image",
];

lazy_static! {
    static ref MARKDOWN_HEADING: Regex = Regex::new(r"^#{1,6}\s+(.+)$").unwrap();
    static ref BOLD_HEADING: Regex = Regex::new(r"^\*\*([^*]+)\*\*\s*[:：]?$").unwrap();
    static ref ENUMERATOR: Regex = Regex::new(r"^\d+[.)、]\s*").unwrap();
    static ref HEX_COLOR: Regex = Regex::new(r"#[0-9A-Fa-f]{6}\b").unwrap();
    static ref RGB_COLOR: Regex =
        Regex::new(r"rgba?\(\s*\d{1,3}\s*,\s*\d{1,3}\s*,\s*\d{1,3}\s*(?:,\s*[\d.]+\s*)?\)").unwrap();
    static ref PIXELS: Regex = Regex::new(r"(\d+)px").unwrap();
    static ref PERCENT: Regex = Regex::new(r"(\d+)%").unwrap();
    static ref FONT_WEIGHT: Regex = Regex::new(r"font-weight:\s*(\d+)").unwrap();
    static ref BORDER_RADIUS: Regex = Regex::new(r"border-radius:\s*(\d+)px").unwrap();
    static ref PADDING: Regex = Regex::new(r"padding:\s*(\d+)px").unwrap();
    static ref ANY_MARGIN: Regex = Regex::new(r"margin[^:\n]*:\s*(\d+)px").unwrap();
    static ref ANY_PADDING: Regex = Regex::new(r"padding[^:\n]*:\s*(\d+)px").unwrap();
    static ref GAP: Regex = Regex::new(r"gap:\s*(\d+)px").unwrap();
}

/// What a design analysis focuses on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignAnalysisType {
    #[default]
    Full,
    Layout,
    Colors,
    Components,
}

impl DesignAnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DesignAnalysisType::Full => "full",
            DesignAnalysisType::Layout => "layout",
            DesignAnalysisType::Colors => "colors",
            DesignAnalysisType::Components => "components",
        }
    }

    pub fn prompt_id(&self) -> &'static str {
        match self {
            DesignAnalysisType::Full => ids::DESIGN_FULL,
            DesignAnalysisType::Layout => ids::DESIGN_LAYOUT,
            DesignAnalysisType::Colors => ids::DESIGN_COLORS,
            DesignAnalysisType::Components => ids::DESIGN_COMPONENTS,
        }
    }
}

impl fmt::Display for DesignAnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesignAnalysisType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(DesignAnalysisType::Full),
            "layout" => Ok(DesignAnalysisType::Layout),
            "colors" | "color" => Ok(DesignAnalysisType::Colors),
            "components" | "component" => Ok(DesignAnalysisType::Components),
            other => Err(format!(
                "Unknown analysis type: {} (expected full, layout, colors, or components)",
                other
            )),
        }
    }
}

/// Input to a design analysis
#[derive(Debug, Clone, Default)]
pub struct DesignRequest {
    pub image: Vec<u8>,
    pub analysis_type: DesignAnalysisType,
    pub context: Option<String>,
    /// Sent verbatim instead of the analysis type's prompt
    pub custom_prompt: Option<String>,
}

impl DesignRequest {
    pub fn new(image: Vec<u8>, analysis_type: DesignAnalysisType) -> Self {
        Self {
            image,
            analysis_type,
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_custom_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(prompt.into());
        self
    }

    fn custom_prompt(&self) -> Option<&str> {
        self.custom_prompt.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// One headed block of the model's description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSection {
    /// Lowercased heading; text before the first heading is `overview`
    pub key: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorSpecs {
    /// Lowercased `#rrggbb` values
    pub hex: Vec<String>,
    pub rgb: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypographySpecs {
    pub font_sizes_px: Vec<u32>,
    pub font_weights: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutMeasurements {
    pub dimensions_px: Vec<u32>,
    pub percentages: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentMeasurements {
    pub border_radius_px: Vec<u32>,
    pub padding_px: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpacingSpecs {
    pub margins_px: Vec<u32>,
    pub paddings_px: Vec<u32>,
    pub gaps_px: Vec<u32>,
}

/// Concrete CSS values found in the description; every list is sorted and distinct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontendSpecs {
    pub colors: ColorSpecs,
    pub typography: TypographySpecs,
    pub layout: LayoutMeasurements,
    pub components: ComponentMeasurements,
    pub spacing: SpacingSpecs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CssVariable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImplementationGuide {
    pub css_variables: Vec<CssVariable>,
    /// Breakpoint name -> media query condition
    pub breakpoints: BTreeMap<String, String>,
    pub component_classes: Vec<String>,
    pub development_checklist: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignMetadata {
    pub model: String,
    /// Version of the built-in prompt used; None for a custom prompt
    pub prompt_version: Option<String>,
    /// Rough confidence from the length of the description
    pub confidence_score: f64,
    /// Share of design areas and CSS details the description mentions
    pub specs_completeness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignAnalysis {
    pub analysis_type: DesignAnalysisType,
    pub raw_analysis: String,
    pub created_at: DateTime<Utc>,
    pub sections: Vec<DesignSection>,
    pub frontend_specs: FrontendSpecs,
    pub implementation_guide: ImplementationGuide,
    pub metadata: DesignMetadata,
}

impl DesignAnalysis {
    pub fn section(&self, key: &str) -> Option<&DesignSection> {
        self.sections.iter().find(|s| s.key == key)
    }
}

/// Structure a model's description of a design image without calling a model
pub fn structure_design(raw: &str, analysis_type: DesignAnalysisType) -> DesignAnalysis {
    let sections = parse_sections(raw);
    let frontend_specs = extract_frontend_specs(raw, &sections, analysis_type);
    let implementation_guide = implementation_guide(raw, &frontend_specs);
    debug!(
        "Structured design analysis: {} sections, {} colors",
        sections.len(),
        frontend_specs.colors.hex.len() + frontend_specs.colors.rgb.len()
    );

    DesignAnalysis {
        analysis_type,
        raw_analysis: raw.to_string(),
        created_at: Utc::now(),
        sections,
        frontend_specs,
        implementation_guide,
        metadata: DesignMetadata {
            confidence_score: confidence_score(raw),
            specs_completeness: specs_completeness(raw),
            ..Default::default()
        },
    }
}

/// Split on markdown headings, bold-only lines, and short colon-terminated design headings
pub fn parse_sections(raw: &str) -> Vec<DesignSection> {
    let mut sections: Vec<DesignSection> = Vec::new();
    let mut current = OVERVIEW_SECTION.to_string();
    let mut buffer: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if let Some(key) = heading_key(line) {
            push_section(&mut sections, &current, &buffer);
            current = key;
            buffer.clear();
        } else if !line.trim().is_empty() {
            buffer.push(line.trim());
        }
    }
    push_section(&mut sections, &current, &buffer);
    sections
}

fn push_section(sections: &mut Vec<DesignSection>, key: &str, lines: &[&str]) {
    if lines.is_empty() {
        return;
    }
    let content = lines.join("\n");
    match sections.iter_mut().find(|s| s.key == key) {
        Some(existing) => {
            existing.content.push('\n');
            existing.content.push_str(&content);
        }
        None => sections.push(DesignSection {
            key: key.to_string(),
            content,
        }),
    }
}

fn heading_key(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let heading = if let Some(caps) = MARKDOWN_HEADING.captures(trimmed) {
        caps.get(1)?.as_str()
    } else if let Some(caps) = BOLD_HEADING.captures(trimmed) {
        caps.get(1)?.as_str()
    } else if is_colon_heading(trimmed) {
        trimmed
    } else {
        return None;
    };

    let key = heading
        .trim_matches(|c: char| c == '#' || c == '*' || c == ':' || c == '：' || c.is_whitespace());
    let key = ENUMERATOR.replace(key, "").trim().to_lowercase();
    (!key.is_empty()).then_some(key)
}

fn is_colon_heading(line: &str) -> bool {
    if !(line.ends_with(':') || line.ends_with('：')) || line.chars().count() > 40 {
        return false;
    }
    if line.starts_with('-') || line.starts_with("* ") {
        return false;
    }
    let lower = line.to_lowercase();
    HEADING_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Text of the sections whose key names one of `keys`
///
/// When none match and the analysis focuses on this area, the whole response is used.
fn area_text(raw: &str, sections: &[DesignSection], keys: &[&str], focused: bool) -> String {
    let text = sections
        .iter()
        .filter(|s| keys.iter().any(|k| s.key.contains(k)))
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() && focused {
        raw.to_string()
    } else {
        text
    }
}

fn extract_frontend_specs(
    raw: &str,
    sections: &[DesignSection],
    analysis_type: DesignAnalysisType,
) -> FrontendSpecs {
    let colors = area_text(raw, sections, COLOR_KEYS, analysis_type == DesignAnalysisType::Colors);
    let typography = area_text(raw, sections, TYPOGRAPHY_KEYS, false);
    let layout = area_text(raw, sections, LAYOUT_KEYS, analysis_type == DesignAnalysisType::Layout);
    let components = area_text(
        raw,
        sections,
        COMPONENT_KEYS,
        analysis_type == DesignAnalysisType::Components,
    );

    FrontendSpecs {
        colors: ColorSpecs {
            hex: distinct_matches(&HEX_COLOR, &colors),
            rgb: distinct_matches(&RGB_COLOR, &colors),
        },
        typography: TypographySpecs {
            font_sizes_px: numbers(&PIXELS, &typography),
            font_weights: numbers(&FONT_WEIGHT, &typography),
        },
        layout: LayoutMeasurements {
            dimensions_px: numbers(&PIXELS, &layout),
            percentages: numbers(&PERCENT, &layout),
        },
        components: ComponentMeasurements {
            border_radius_px: numbers(&BORDER_RADIUS, &components),
            padding_px: numbers(&PADDING, &components),
        },
        spacing: SpacingSpecs {
            margins_px: numbers(&ANY_MARGIN, raw),
            paddings_px: numbers(&ANY_PADDING, raw),
            gaps_px: numbers(&GAP, raw),
        },
    }
}

fn distinct_matches(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase().split_whitespace().collect::<String>())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn numbers(pattern: &Regex, text: &str) -> Vec<u32> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect()
}

fn implementation_guide(raw: &str, specs: &FrontendSpecs) -> ImplementationGuide {
    let mut css_variables: Vec<CssVariable> = specs
        .colors
        .hex
        .iter()
        .enumerate()
        .map(|(i, hex)| CssVariable {
            name: format!("--color-{}", i + 1),
            value: hex.clone(),
        })
        .collect();
    css_variables.extend(
        numbers(&PIXELS, raw)
            .into_iter()
            .filter(|px| *px > 0 && px % 4 == 0)
            .take(MAX_SPACING_VARIABLES)
            .enumerate()
            .map(|(i, px)| CssVariable {
                name: format!("--spacing-{}", i + 1),
                value: format!("{}px", px),
            }),
    );

    let lower = raw.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    let mut breakpoints = BTreeMap::new();
    if mentions(&["mobile", "768px", "移动"]) {
        breakpoints.insert("mobile".to_string(), "max-width: 767px".to_string());
    }
    if mentions(&["tablet", "1024px", "平板"]) {
        breakpoints.insert(
            "tablet".to_string(),
            "min-width: 768px and max-width: 1023px".to_string(),
        );
    }
    if mentions(&["desktop", "桌面"]) {
        breakpoints.insert("desktop".to_string(), "min-width: 1024px".to_string());
    }

    let mut component_classes = Vec::new();
    let class_groups: [(&[&str], &[&str]); 4] = [
        (&["button", "按钮"], &[".btn", ".btn-primary", ".btn-secondary"]),
        (&["input", "form", "输入", "表单"], &[".form-group", ".form-label", ".form-control"]),
        (&["card", "卡片"], &[".card", ".card-header", ".card-body"]),
        (&["navigation", "navbar", "nav bar", "导航"], &[".nav", ".nav-item", ".nav-link"]),
    ];
    for (words, classes) in class_groups {
        if mentions(words) {
            component_classes.extend(classes.iter().map(|c| c.to_string()));
        }
    }

    ImplementationGuide {
        css_variables,
        breakpoints,
        component_classes,
        development_checklist: DEVELOPMENT_CHECKLIST.iter().map(|s| s.to_string()).collect(),
    }
}

/// Longer descriptions are taken as more thorough
pub fn confidence_score(raw: &str) -> f64 {
    match raw.trim().chars().count() {
        0 => 0.0,
        n if n < 100 => 0.3,
        n if n < 500 => 0.6,
        n if n > 1000 => 0.9,
        _ => 0.7,
    }
}

/// Mean of design-area coverage and CSS-detail coverage, in [0, 1]
pub fn specs_completeness(raw: &str) -> f64 {
    let lower = raw.to_lowercase();
    let elements = DESIGN_ELEMENTS.iter().filter(|e| lower.contains(*e)).count() as f64
        / DESIGN_ELEMENTS.len() as f64;

    let mut details = CSS_DETAILS.iter().filter(|d| lower.contains(*d)).count();
    if HEX_COLOR.is_match(raw) {
        details += 1;
    }
    let details = (details as f64 / (CSS_DETAILS.len() + 1) as f64).min(1.0);

    (elements + details) / 2.0
}

/// Sends a design image to a vision-capable model and structures the answer
pub struct DesignAnalyzer {
    client: Arc<dyn ModelClient>,
    prompts: PromptManager,
    module: ModuleConfig,
    streaming: bool,
}

impl DesignAnalyzer {
    pub fn new(client: Arc<dyn ModelClient>, prompts: PromptManager, module: ModuleConfig) -> Self {
        Self {
            client,
            prompts,
            module,
            streaming: false,
        }
    }

    /// Resolve the image analyzer module's model client and prompt overrides from configuration
    pub fn from_config(
        config: &Config,
        registry: &ProviderRegistry,
        prompts_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let module = config.module_config(IMAGE_ANALYZER_MODULE);
        if !module.enabled {
            return Err(AnalyzerError::ModuleDisabled(IMAGE_ANALYZER_MODULE.to_string()));
        }
        let client = registry.get(config, &module.model_config)?;
        let prompts = PromptManager::new(prompts_dir)?.with_overrides(module.custom_prompts.clone());
        Ok(Self::new(client, prompts, module))
    }

    /// Stream the model call, forwarding chunks as progress events
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn client(&self) -> &Arc<dyn ModelClient> {
        &self.client
    }

    /// Analyze a design image into sections, frontend specs, and an implementation guide
    pub async fn analyze(
        &self,
        request: &DesignRequest,
        progress: Option<&UnboundedSender<ProgressEvent>>,
        cancel: Option<&AtomicBool>,
    ) -> Result<DesignAnalysis> {
        if request.image.is_empty() {
            return Err(AnalyzerError::InvalidInput("design image is empty".to_string()));
        }
        if !self.module.enabled {
            return Err(AnalyzerError::ModuleDisabled(IMAGE_ANALYZER_MODULE.to_string()));
        }
        if !self.client.supports_images() {
            return Err(ProviderError::ImageNotSupported(self.client.provider().to_string()).into());
        }

        info!(
            "Analyzing {} byte design image ({} analysis, provider={}, model={})",
            request.image.len(),
            request.analysis_type,
            self.client.provider(),
            self.client.model()
        );
        emit(progress, ProgressEvent::Started);

        let (prompt, prompt_version) = self.prompt_for(request)?;

        check_cancelled(cancel)?;
        emit(progress, ProgressEvent::ModelCallStarted { stage: ModelStage::Design });
        let raw = collect_response(
            self.client.as_ref(),
            &prompt,
            Some(request.image.as_slice()),
            ModelStage::Design,
            self.streaming,
            progress,
        )
        .await?;
        emit(progress, ProgressEvent::ModelCallCompleted { stage: ModelStage::Design });

        check_cancelled(cancel)?;
        if raw.trim().is_empty() {
            warn!("Model returned an empty design description");
        }
        let mut analysis = structure_design(&raw, request.analysis_type);
        analysis.metadata.model = self.client.model().to_string();
        analysis.metadata.prompt_version = prompt_version;

        info!(
            "Design analysis complete: {} sections, confidence={:.2}, completeness={:.2}",
            analysis.sections.len(),
            analysis.metadata.confidence_score,
            analysis.metadata.specs_completeness
        );
        emit(progress, ProgressEvent::Finished);
        Ok(analysis)
    }

    fn prompt_for(&self, request: &DesignRequest) -> Result<(String, Option<String>)> {
        if let Some(custom) = request.custom_prompt() {
            return Ok((custom.to_string(), None));
        }
        let prompt_id = request.analysis_type.prompt_id();
        let context = request.context.as_deref().unwrap_or("");
        let prompt = self.prompts.get_prompt(prompt_id, &[("context", context)])?;
        let version = self
            .prompts
            .get_prompt_metadata(prompt_id)?
            .metadata
            .map(|m| m.version);
        Ok((prompt, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const DESCRIPTION: &str = "A clean checkout page with a single column.

## 1. Layout
The content column is 960px wide, centered, and takes 80% of the viewport.
A sidebar of 240px appears on desktop.

## Colors
Primary #1A73E8, background #FFFFFF, text rgb(33, 33, 33).

**Typography**
Headings use 24px with font-weight: 600; body text is 16px.

Components:
Buttons have border-radius: 8px and padding: 12px.
Cards group the order summary.

## Spacing
Sections use margin-bottom: 32px and gap: 16px.
";

    #[test]
    fn test_sections_split_on_headings() {
        let sections = parse_sections(DESCRIPTION);
        let keys: Vec<&str> = sections.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["overview", "layout", "colors", "typography", "components", "spacing"]
        );
        assert_eq!(sections[0].content, "A clean checkout page with a single column.");
        assert!(sections[1].content.contains("960px"));
    }

    #[test]
    fn test_hex_color_line_is_not_a_heading() {
        let sections = parse_sections("#1A73E8 is the primary color\n## Colors\nblue");
        assert_eq!(sections[0].key, "overview");
        assert_eq!(sections[0].content, "#1A73E8 is the primary color");
        assert_eq!(sections[1].key, "colors");
    }

    #[test]
    fn test_repeated_heading_appends_content() {
        let sections = parse_sections("## Colors\nred\n## Layout\ngrid\n## Colors\nblue");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].content, "red\nblue");
    }

    #[test]
    fn test_frontend_specs_extracted_per_area() {
        let analysis = structure_design(DESCRIPTION, DesignAnalysisType::Full);
        let specs = &analysis.frontend_specs;

        assert_eq!(specs.colors.hex, vec!["#1a73e8", "#ffffff"]);
        assert_eq!(specs.colors.rgb, vec!["rgb(33,33,33)"]);
        assert_eq!(specs.typography.font_sizes_px, vec![16, 24]);
        assert_eq!(specs.typography.font_weights, vec![600]);
        assert_eq!(specs.layout.dimensions_px, vec![240, 960]);
        assert_eq!(specs.layout.percentages, vec![80]);
        assert_eq!(specs.components.border_radius_px, vec![8]);
        assert_eq!(specs.components.padding_px, vec![12]);
        assert_eq!(specs.spacing.margins_px, vec![32]);
        assert_eq!(specs.spacing.gaps_px, vec![16]);
    }

    #[test]
    fn test_implementation_guide_from_description() {
        let guide = structure_design(DESCRIPTION, DesignAnalysisType::Full).implementation_guide;

        let names: Vec<&str> = guide.css_variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(&names[..2], &["--color-1", "--color-2"]);
        let spacing: Vec<&str> = guide
            .css_variables
            .iter()
            .filter(|v| v.name.starts_with("--spacing-"))
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(spacing, vec!["8px", "12px", "16px", "24px", "32px", "240px", "960px"]);

        assert_eq!(guide.breakpoints.get("desktop").map(String::as_str), Some("min-width: 1024px"));
        assert!(!guide.breakpoints.contains_key("tablet"));
        assert!(guide.component_classes.contains(&".btn".to_string()));
        assert!(guide.component_classes.contains(&".card".to_string()));
        assert_eq!(guide.development_checklist.len(), 8);
    }

    #[test]
    fn test_focused_type_reads_whole_response_without_matching_section() {
        let raw = "The palette is #112233 and #445566.";
        let full = structure_design(raw, DesignAnalysisType::Full);
        assert!(full.frontend_specs.colors.hex.is_empty());

        let colors = structure_design(raw, DesignAnalysisType::Colors);
        assert_eq!(colors.frontend_specs.colors.hex, vec!["#112233", "#445566"]);
    }

    #[test]
    fn test_spacing_variables_capped() {
        let raw: String = (1..=20).map(|n| format!("{}px ", n * 4)).collect();
        let guide = structure_design(&raw, DesignAnalysisType::Full).implementation_guide;
        assert_eq!(guide.css_variables.len(), 10);
        assert_eq!(guide.css_variables[9].value, "40px");
    }

    #[rstest]
    #[case("", 0.0)]
    #[case("short", 0.3)]
    #[case(&"a".repeat(300), 0.6)]
    #[case(&"a".repeat(700), 0.7)]
    #[case(&"a".repeat(1500), 0.9)]
    fn test_confidence_by_length(#[case] raw: &str, #[case] expected: f64) {
        assert_eq!(confidence_score(raw), expected);
    }

    #[test]
    fn test_specs_completeness_bounds() {
        assert_eq!(specs_completeness(""), 0.0);
        let score = specs_completeness(DESCRIPTION);
        assert!(score > 0.5 && score <= 1.0, "score was {}", score);
    }

    #[rstest]
    #[case("full", DesignAnalysisType::Full)]
    #[case("Colors", DesignAnalysisType::Colors)]
    #[case("component", DesignAnalysisType::Components)]
    fn test_analysis_type_parsing(#[case] input: &str, #[case] expected: DesignAnalysisType) {
        assert_eq!(input.parse::<DesignAnalysisType>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_analysis_type_rejected() {
        assert!("wireframe".parse::<DesignAnalysisType>().is_err());
    }
}
