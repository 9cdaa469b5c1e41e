// ABOUTME: Requirement analysis pipeline orchestrating model calls, structuring, and assessment
// ABOUTME: Emits ordered progress events and honors cooperative cancellation at stage boundaries

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};
use uieasy_ai::{ModelClient, ProviderError, ProviderRegistry};
use uieasy_config::constants::REQUIREMENT_ANALYZER_MODULE;
use uieasy_config::{Config, ModuleConfig};
use uieasy_prompts::{ids, PromptManager};

use crate::assessment::assess;
use crate::builder::RequirementBuilder;
use crate::detail::run_detail_passes;
use crate::error::{AnalyzerError, Result};
use crate::normalizer::{normalize, MalformedResponse, NormalizationStrategy, NormalizedResponse};
use crate::types::{AnalysisRequest, AnalysisResult};

const OVERVIEW_KEYS: &[&str] = &["project_overview", "overview", "summary"];
const AUDIENCE_KEYS: &[&str] = &["target_audience", "audience", "users"];

/// Model calls made by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStage {
    Overview,
    Requirements,
    Design,
}

impl fmt::Display for ModelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStage::Overview => f.write_str("overview"),
            ModelStage::Requirements => f.write_str("requirements"),
            ModelStage::Design => f.write_str("design"),
        }
    }
}

/// Progress notifications, sent in pipeline order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Started,
    ModelCallStarted { stage: ModelStage },
    /// Text received while streaming a model call
    StreamChunk { text: String },
    ModelCallCompleted { stage: ModelStage },
    NormalizationCompleted { strategy: NormalizationStrategy },
    NormalizationFailed { reason: String },
    RequirementsBuilt { count: usize },
    DetailPassCompleted { count: usize },
    AssessmentCompleted,
    Finished,
}

/// Structure a raw requirements response without calling a model
///
/// Builds (or merges into the request's existing analysis) and assesses. A
/// response with no recoverable structure yields a minimal result with a gap.
pub fn structure_response(raw: &str, request: &AnalysisRequest) -> AnalysisResult {
    match normalize(raw) {
        Ok(normalized) => {
            let mut result = build_result(&normalized, request);
            assess(&mut result);
            result
        }
        Err(e) => malformed_result(&e, request),
    }
}

fn build_result(normalized: &NormalizedResponse, request: &AnalysisRequest) -> AnalysisResult {
    let records = normalized.candidate_records();
    let builder = RequirementBuilder::new(&request.text);
    let existing = request.existing_analysis.as_ref();

    let outcome = match existing {
        Some(existing) => builder.merge(&existing.requirements, &records),
        None => builder.build(&records),
    };

    let project_overview = normalized
        .root_str(OVERVIEW_KEYS)
        .map(str::to_string)
        .or_else(|| existing.map(|e| e.project_overview.clone()))
        .unwrap_or_default();
    let target_audience = normalized
        .root_str(AUDIENCE_KEYS)
        .map(str::to_string)
        .or_else(|| existing.map(|e| e.target_audience.clone()))
        .unwrap_or_default();

    AnalysisResult {
        requirements: outcome.requirements,
        project_overview,
        target_audience,
        platform: request.platform,
        gaps: outcome.gaps,
        ambiguities: outcome.ambiguities,
        ..Default::default()
    }
}

/// Minimal result for an unstructurable response; an existing analysis is kept as-is
fn malformed_result(error: &MalformedResponse, request: &AnalysisRequest) -> AnalysisResult {
    let mut result = match &request.existing_analysis {
        Some(existing) => AnalysisResult {
            platform: request.platform,
            ..existing.clone()
        },
        None => AnalysisResult {
            platform: request.platform,
            ..Default::default()
        },
    };
    result
        .gaps
        .push(format!("Model response could not be structured: {}", error.reason));
    assess(&mut result);
    result
}

/// Runs the full analysis against a model client
pub struct RequirementAnalyzer {
    client: Arc<dyn ModelClient>,
    prompts: PromptManager,
    module: ModuleConfig,
    streaming: bool,
}

impl RequirementAnalyzer {
    pub fn new(client: Arc<dyn ModelClient>, prompts: PromptManager, module: ModuleConfig) -> Self {
        Self {
            client,
            prompts,
            module,
            streaming: false,
        }
    }

    /// Resolve the analyzer module's model client and prompt overrides from configuration
    pub fn from_config(
        config: &Config,
        registry: &ProviderRegistry,
        prompts_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let module = config.module_config(REQUIREMENT_ANALYZER_MODULE);
        if !module.enabled {
            return Err(AnalyzerError::ModuleDisabled(
                REQUIREMENT_ANALYZER_MODULE.to_string(),
            ));
        }
        let client = registry.get(config, &module.model_config)?;
        let prompts = PromptManager::new(prompts_dir)?.with_overrides(module.custom_prompts.clone());
        Ok(Self::new(client, prompts, module))
    }

    /// Stream the requirements call, forwarding chunks as progress events
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn client(&self) -> &Arc<dyn ModelClient> {
        &self.client
    }

    /// Analyze requirement text into a structured, assessed result
    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        progress: Option<&UnboundedSender<ProgressEvent>>,
        cancel: Option<&AtomicBool>,
    ) -> Result<AnalysisResult> {
        if request.text.trim().is_empty() {
            return Err(AnalyzerError::InvalidInput(
                "requirement text is empty".to_string(),
            ));
        }
        if !self.module.enabled {
            return Err(AnalyzerError::ModuleDisabled(
                REQUIREMENT_ANALYZER_MODULE.to_string(),
            ));
        }

        info!(
            "Analyzing {} chars of requirements for {} (provider={}, model={})",
            request.text.chars().count(),
            request.platform,
            self.client.provider(),
            self.client.model()
        );
        emit(progress, ProgressEvent::Started);

        let system_prompt = self.prompts.get_system_prompt(ids::REQUIREMENTS_SYSTEM)?;
        let image = self.usable_image(request);

        check_cancelled(cancel)?;
        let overview_prompt = self.prompts.get_prompt(
            ids::PROJECT_OVERVIEW,
            &[
                ("requirements_text", request.text.as_str()),
                ("context", request.context_str()),
            ],
        )?;
        emit(progress, ProgressEvent::ModelCallStarted { stage: ModelStage::Overview });
        let overview_raw = self
            .client
            .send(&with_system(&system_prompt, &overview_prompt), image)
            .await
            .map_err(|e| provider_failure(ModelStage::Overview, e))?;
        emit(progress, ProgressEvent::ModelCallCompleted { stage: ModelStage::Overview });
        let (overview, audience) = parse_overview(&overview_raw);

        check_cancelled(cancel)?;
        let requirements_prompt = self.requirements_prompt(request)?;
        emit(progress, ProgressEvent::ModelCallStarted { stage: ModelStage::Requirements });
        let raw = collect_response(
            self.client.as_ref(),
            &with_system(&system_prompt, &requirements_prompt),
            image,
            ModelStage::Requirements,
            self.streaming,
            progress,
        )
        .await?;
        emit(progress, ProgressEvent::ModelCallCompleted { stage: ModelStage::Requirements });

        let normalized = match normalize(&raw) {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!("Requirements response could not be structured: {}", e);
                emit(progress, ProgressEvent::NormalizationFailed { reason: e.reason.clone() });
                let mut result = malformed_result(&e, request);
                apply_overview(&mut result, overview, audience);
                emit(progress, ProgressEvent::AssessmentCompleted);
                emit(progress, ProgressEvent::Finished);
                return Ok(result);
            }
        };
        emit(
            progress,
            ProgressEvent::NormalizationCompleted { strategy: normalized.strategy },
        );

        let mut result = build_result(&normalized, request);
        apply_overview(&mut result, overview, audience);
        emit(
            progress,
            ProgressEvent::RequirementsBuilt { count: result.requirements.len() },
        );

        if self.module.detail_passes {
            check_cancelled(cancel)?;
            let attached = run_detail_passes(
                self.client.as_ref(),
                &self.prompts,
                &system_prompt,
                &mut result.requirements,
                &request.text,
            )
            .await?;
            emit(progress, ProgressEvent::DetailPassCompleted { count: attached });
        }

        check_cancelled(cancel)?;
        assess(&mut result);
        emit(progress, ProgressEvent::AssessmentCompleted);

        info!(
            "Analysis complete: {} requirements, completeness={:.2}, clarity={:.2}",
            result.requirements.len(),
            result.completeness_score,
            result.clarity_score
        );
        emit(progress, ProgressEvent::Finished);
        Ok(result)
    }

    fn requirements_prompt(&self, request: &AnalysisRequest) -> Result<String> {
        let platform = request.platform.to_string();
        match &request.existing_analysis {
            Some(existing) => {
                let existing_requirements = serde_json::to_string_pretty(&existing.requirements)?;
                Ok(self.prompts.get_prompt(
                    ids::REFINE_ANALYSIS,
                    &[
                        ("existing_requirements", existing_requirements.as_str()),
                        ("requirements_text", request.text.as_str()),
                        ("context", request.context_str()),
                        ("platform", platform.as_str()),
                    ],
                )?)
            }
            None => Ok(self.prompts.get_prompt(
                ids::INITIAL_ANALYSIS,
                &[
                    ("requirements_text", request.text.as_str()),
                    ("context", request.context_str()),
                    ("platform", platform.as_str()),
                ],
            )?),
        }
    }

    fn usable_image<'r>(&self, request: &'r AnalysisRequest) -> Option<&'r [u8]> {
        let image = request.image.as_deref()?;
        if self.client.supports_images() {
            Some(image)
        } else {
            warn!(
                "Provider {} does not accept images, analyzing text only",
                self.client.provider()
            );
            None
        }
    }
}

/// Send a prompt, or stream it and forward each chunk as a progress event
pub(crate) async fn collect_response(
    client: &dyn ModelClient,
    prompt: &str,
    image: Option<&[u8]>,
    stage: ModelStage,
    streaming: bool,
    progress: Option<&UnboundedSender<ProgressEvent>>,
) -> Result<String> {
    if !streaming {
        return Ok(client
            .send(prompt, image)
            .await
            .map_err(|e| provider_failure(stage, e))?);
    }

    let mut stream = client
        .send_stream(prompt, image)
        .await
        .map_err(|e| provider_failure(stage, e))?;
    let mut response = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| provider_failure(stage, e))?;
        emit(progress, ProgressEvent::StreamChunk { text: chunk.clone() });
        response.push_str(&chunk);
    }
    debug!("Streamed {} chars during {} stage", response.chars().count(), stage);
    Ok(response)
}

fn provider_failure(stage: ModelStage, e: ProviderError) -> ProviderError {
    error!("Model call failed during {} stage: {}", stage, e);
    e
}

fn with_system(system_prompt: &str, prompt: &str) -> String {
    format!("{}\n\n{}", system_prompt, prompt)
}

/// Overview and audience from the overview call; unstructured text is taken as the overview
fn parse_overview(raw: &str) -> (Option<String>, Option<String>) {
    match normalize(raw) {
        Ok(normalized) if normalized.strategy != NormalizationStrategy::LineHeuristics
            || normalized.root_str(OVERVIEW_KEYS).is_some() =>
        {
            (
                normalized.root_str(OVERVIEW_KEYS).map(str::to_string),
                normalized.root_str(AUDIENCE_KEYS).map(str::to_string),
            )
        }
        _ => {
            let text = raw.trim();
            ((!text.is_empty()).then(|| text.to_string()), None)
        }
    }
}

fn apply_overview(result: &mut AnalysisResult, overview: Option<String>, audience: Option<String>) {
    if let Some(overview) = overview.filter(|o| !o.trim().is_empty()) {
        result.project_overview = overview;
    }
    if let Some(audience) = audience.filter(|a| !a.trim().is_empty()) {
        result.target_audience = audience;
    }
}

pub(crate) fn emit(progress: Option<&UnboundedSender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = progress {
        // Receiver may have been dropped; analysis continues regardless
        let _ = tx.send(event);
    }
}

pub(crate) fn check_cancelled(cancel: Option<&AtomicBool>) -> Result<()> {
    match cancel {
        Some(flag) if flag.load(Ordering::SeqCst) => {
            info!("Analysis cancelled");
            Err(AnalyzerError::Cancelled)
        }
        _ => Ok(()),
    }
}
