// ABOUTME: uieasy command-line entry point
// ABOUTME: Analyze, structure, and validate UI requirements; analyze design images; list providers

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uieasy_ai::ProviderRegistry;
use uieasy_analyzer::{
    export_analysis, export_design, export_validation, structure_response, AnalysisRequest,
    AnalysisResult, AnalysisValidator, DesignAnalysis, DesignAnalysisType, DesignAnalyzer,
    DesignRequest, ExportFormat, Platform, ProgressEvent, RequirementAnalyzer,
};
use uieasy_cli::{input, render, settings};
use uieasy_config::constants::REQUIREMENT_ANALYZER_MODULE;
use uieasy_config::Config;

#[derive(Parser)]
#[command(name = "uieasy")]
#[command(about = "UI Easy - turn free-form UI requirements into structured, validated requirements")]
#[command(version)]
struct Cli {
    /// Path to config.json (defaults to UIEASY_CONFIG, then ./config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze requirement text with the configured model
    Analyze {
        /// Requirement text ("-" reads stdin)
        text: Option<String>,
        /// Read requirement text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Target platform: web, mobile, or desktop
        #[arg(short, long, default_value = "web")]
        platform: Platform,
        /// Additional context passed to the model
        #[arg(long)]
        context: Option<String>,
        /// Screenshot or mockup to attach
        #[arg(long)]
        image: Option<PathBuf>,
        /// Refine a saved analysis (JSON) instead of starting fresh
        #[arg(long)]
        refine: Option<PathBuf>,
        /// Model configuration name to use
        #[arg(short, long)]
        model: Option<String>,
        /// Directory with prompt overrides (analysis/*.json, system/*.json)
        #[arg(long)]
        prompts_dir: Option<PathBuf>,
        /// Skip per-requirement component/layout/style/interaction passes
        #[arg(long)]
        no_details: bool,
        /// Stream the model response to the terminal
        #[arg(long)]
        stream: bool,
        /// Output format: json, text, or markdown (default: terminal summary)
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Write output to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Structure a saved model response without calling a model
    Structure {
        /// File holding the raw model response ("-" reads stdin)
        response: String,
        /// Original requirement text, used as the source excerpt
        #[arg(long)]
        source: Option<String>,
        /// Target platform: web, mobile, or desktop
        #[arg(short, long, default_value = "web")]
        platform: Platform,
        /// Merge into a saved analysis (JSON)
        #[arg(long)]
        refine: Option<PathBuf>,
        /// Output format: json, text, or markdown (default: terminal summary)
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Write output to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a saved analysis and score its quality
    Validate {
        /// Analysis JSON written by `analyze --format json`
        analysis: PathBuf,
        /// Output format: json, text, or markdown (default: terminal summary)
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Write output to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Exit with status 1 when validation reports issues
        #[arg(long)]
        strict: bool,
    },
    /// Analyze a design image into frontend specs with a vision-capable model
    Design {
        /// Screenshot or mockup of the design
        image: PathBuf,
        /// Analysis focus: full, layout, colors, or components
        #[arg(short = 't', long = "type", default_value = "full")]
        analysis_type: DesignAnalysisType,
        /// Additional context passed to the model
        #[arg(long)]
        context: Option<String>,
        /// Send this prompt instead of the built-in one for the analysis type
        #[arg(long)]
        prompt: Option<String>,
        /// Model configuration name to use
        #[arg(short, long)]
        model: Option<String>,
        /// Directory with prompt overrides (analysis/*.json, system/*.json)
        #[arg(long)]
        prompts_dir: Option<PathBuf>,
        /// Stream the model response to the terminal
        #[arg(long)]
        stream: bool,
        /// Output format: json, text, or markdown (default: terminal summary)
        #[arg(long)]
        format: Option<ExportFormat>,
        /// Write output to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List registered providers and configured models
    Providers,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = handle_command(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze {
            text,
            file,
            platform,
            context,
            image,
            refine,
            model,
            prompts_dir,
            no_details,
            stream,
            format,
            output,
        } => {
            let text = input::read_text(text.as_deref(), file.as_deref())?;
            let mut request = AnalysisRequest::new(text, platform);
            if let Some(context) = context {
                request = request.with_context(context);
            }
            if let Some(path) = image {
                request = request.with_image(input::read_image(&path)?);
            }
            if let Some(path) = refine {
                request = request.with_existing(input::load_analysis(&path)?);
            }

            let mut config = settings::load_config(cli.config.as_deref(), model.as_deref())
                .context("Failed to load configuration")?;
            if no_details {
                disable_detail_passes(&mut config);
            }

            let registry = ProviderRegistry::with_defaults();
            let analyzer = RequirementAnalyzer::from_config(&config, &registry, prompts_dir)?
                .with_streaming(stream);

            let analysis = run_analysis(&analyzer, &request, stream).await?;
            emit_analysis(&analysis, format, output)
        }
        Commands::Structure {
            response,
            source,
            platform,
            refine,
            format,
            output,
        } => {
            let raw = if response == "-" {
                input::read_text(Some("-"), None)?
            } else {
                input::read_file(Path::new(&response))?
            };
            let mut request = AnalysisRequest::new(source.unwrap_or_default(), platform);
            if let Some(path) = refine {
                request = request.with_existing(input::load_analysis(&path)?);
            }

            let analysis = structure_response(&raw, &request);
            emit_analysis(&analysis, format, output)
        }
        Commands::Validate {
            analysis,
            format,
            output,
            strict,
        } => {
            let analysis = input::load_analysis(&analysis)?;
            let report = AnalysisValidator::new().validate(&analysis);

            match (format, output.as_deref()) {
                (None, None) => render::print_validation(&report),
                (format, output) => {
                    let export = export_validation(&report, format.unwrap_or(ExportFormat::Json))?;
                    input::write_output(&export.content, output)?;
                }
            }

            if strict && !report.passed() {
                process::exit(1);
            }
            Ok(())
        }
        Commands::Design {
            image,
            analysis_type,
            context,
            prompt,
            model,
            prompts_dir,
            stream,
            format,
            output,
        } => {
            let mut request = DesignRequest::new(input::read_image(&image)?, analysis_type);
            if let Some(context) = context {
                request = request.with_context(context);
            }
            if let Some(prompt) = prompt {
                request = request.with_custom_prompt(prompt);
            }

            let config = settings::load_config(cli.config.as_deref(), model.as_deref())
                .context("Failed to load configuration")?;
            let registry = ProviderRegistry::with_defaults();
            let analyzer =
                DesignAnalyzer::from_config(&config, &registry, prompts_dir)?.with_streaming(stream);

            let analysis = run_design(&analyzer, &request, stream).await?;
            emit_design(&analysis, format, output)
        }
        Commands::Providers => {
            let config = settings::load_config(cli.config.as_deref(), None)
                .context("Failed to load configuration")?;
            let registry = ProviderRegistry::with_defaults();
            println!("{}", "🔌 Model Providers".blue().bold());
            println!();
            println!("{}", render::providers_table(&registry.providers(), &config));
            Ok(())
        }
    }
}

fn disable_detail_passes(config: &mut Config) {
    let mut module = config.module_config(REQUIREMENT_ANALYZER_MODULE);
    module.detail_passes = false;
    config.set_module_config(REQUIREMENT_ANALYZER_MODULE, module);
}

/// Progress printer on stderr and a flag raised by Ctrl-C
fn spawn_progress(
    stream: bool,
) -> (
    mpsc::UnboundedSender<ProgressEvent>,
    tokio::task::JoinHandle<()>,
    Arc<AtomicBool>,
) {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Cancelling after the current step...".yellow());
            flag.store(true, Ordering::SeqCst);
        }
    });

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match &event {
                ProgressEvent::StreamChunk { text } if stream => eprint!("{}", text.dimmed()),
                _ => {
                    if let Some(line) = render::progress_line(&event) {
                        eprintln!("{} {}", "›".cyan(), line);
                    }
                }
            }
        }
    });
    (tx, printer, cancel)
}

/// Run the analyzer with progress on stderr and Ctrl-C cancellation
async fn run_analysis(
    analyzer: &RequirementAnalyzer,
    request: &AnalysisRequest,
    stream: bool,
) -> Result<AnalysisResult> {
    let (tx, printer, cancel) = spawn_progress(stream);
    let result = analyzer.analyze(request, Some(&tx), Some(cancel.as_ref())).await;
    drop(tx);
    let _ = printer.await;

    let analysis = result?;
    info!(
        "Analysis finished with {} requirements",
        analysis.requirements.len()
    );
    Ok(analysis)
}

async fn run_design(
    analyzer: &DesignAnalyzer,
    request: &DesignRequest,
    stream: bool,
) -> Result<DesignAnalysis> {
    let (tx, printer, cancel) = spawn_progress(stream);
    let result = analyzer.analyze(request, Some(&tx), Some(cancel.as_ref())).await;
    drop(tx);
    let _ = printer.await;

    let analysis = result?;
    info!("Design analysis finished with {} sections", analysis.sections.len());
    Ok(analysis)
}

fn emit_analysis(
    analysis: &AnalysisResult,
    format: Option<ExportFormat>,
    output: Option<PathBuf>,
) -> Result<()> {
    match (format, output.as_deref()) {
        (None, None) => render::print_analysis(analysis),
        (format, output) => {
            let export = export_analysis(analysis, format.unwrap_or(ExportFormat::Json))?;
            input::write_output(&export.content, output)?;
            if let Some(path) = output {
                eprintln!("{} Wrote {}", "✓".green(), path.display());
            }
        }
    }
    Ok(())
}

fn emit_design(
    analysis: &DesignAnalysis,
    format: Option<ExportFormat>,
    output: Option<PathBuf>,
) -> Result<()> {
    match (format, output.as_deref()) {
        (None, None) => render::print_design(analysis),
        (format, output) => {
            let export = export_design(analysis, format.unwrap_or(ExportFormat::Json))?;
            input::write_output(&export.content, output)?;
            if let Some(path) = output {
                eprintln!("{} Wrote {}", "✓".green(), path.display());
            }
        }
    }
    Ok(())
}
