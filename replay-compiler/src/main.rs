//! Replay Compiler - browser recording to automation script compiler
//!
//! Turns recorded browser sessions into Playwright, Puppeteer, Selenium and
//! Cypress scripts with their documentation and API contract.

use replay_compiler::api::OpenApiBuilder;
use replay_compiler::app::cli::{Cli, Commands, ConfigAction};
use replay_compiler::app::config::Config;
use replay_compiler::capture::{EventLog, ReplayOptions};
use replay_compiler::codegen::Framework;
use replay_compiler::enhance::{EnhancementPolicy, EnhancerChain};
use replay_compiler::workflow::{ArtifactGenerator, GeneratorConfig};
use replay_compiler::{classify_security, estimate_runtime, InteractionTrace};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    // Execute command
    match cli.command {
        Commands::Record { input, output, name } => {
            run_record(&input, output, name, &config)?;
        }
        Commands::Generate {
            input,
            output,
            targets,
            enhance,
            strict,
        } => {
            run_generate(&input, output, targets, enhance, strict, &config)?;
        }
        Commands::Params { input } => {
            let trace = load_trace(&input)?;
            let parameters = config.parameter_extractor().extract(&trace);
            println!("{}", serde_json::to_string_pretty(&parameters)?);
        }
        Commands::Security { input } => {
            let trace = load_trace(&input)?;
            println!("{}", serde_json::to_string_pretty(&classify_security(&trace))?);
        }
        Commands::Estimate { input } => {
            let trace = load_trace(&input)?;
            let estimate = estimate_runtime(&trace);
            println!("{} ({} ms over {} steps)", estimate, estimate.total_ms, trace.len());
        }
        Commands::Openapi { input, output, server } => {
            run_openapi(&input, output, server, &config)?;
        }
        Commands::Validate { input } => {
            run_validate(&input, &config)?;
        }
        Commands::Init { force } => {
            run_init(force, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, cli.config.as_deref(), &config)?;
        }
    }

    Ok(())
}

fn load_trace(path: &Path) -> anyhow::Result<InteractionTrace> {
    if !path.exists() {
        anyhow::bail!("Trace file not found: {:?}", path);
    }
    let trace = InteractionTrace::load(path)?;
    info!("Loaded trace '{}' with {} interactions", trace.name(), trace.len());
    Ok(trace)
}

fn run_record(
    input: &Path,
    output: Option<PathBuf>,
    name: Option<String>,
    config: &Config,
) -> anyhow::Result<()> {
    if !input.exists() {
        anyhow::bail!("Event log not found: {:?}", input);
    }
    let log = EventLog::load(input)?;

    let name = name.unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| chrono::Local::now().format("trace_%Y%m%d_%H%M%S").to_string())
    });
    let options = ReplayOptions {
        name: name.clone(),
        text_snippet_max_chars: config.capture.text_snippet_max_chars,
    };
    let trace = log.replay(&options)?;

    let output_path = match output {
        Some(path) => path,
        None => {
            let dir = Cli::traces_dir();
            std::fs::create_dir_all(&dir)?;
            dir.join(format!("{}.json", name))
        }
    };
    trace.save(&output_path)?;

    info!("Captured {} interactions", trace.len());
    println!("Saved trace to {}", output_path.display());
    Ok(())
}

fn run_generate(
    input: &Path,
    output: Option<PathBuf>,
    targets: Vec<Framework>,
    enhance: bool,
    strict: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let trace = Arc::new(load_trace(input)?);

    let frameworks = if targets.is_empty() {
        config.synthesis.targets.clone()
    } else {
        targets
    };
    let generator = ArtifactGenerator::with_config(GeneratorConfig {
        frameworks,
        synthesis: config.synthesis_options(),
        server_url: None,
    });

    let bundle = if enhance || config.enhance.enabled {
        let mut enhance_config = config.enhance.clone();
        if strict {
            enhance_config.policy = EnhancementPolicy::Strict;
        }
        let chain = EnhancerChain::from_config(&enhance_config);
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(generator.generate_enhanced(Arc::clone(&trace), &chain))?
    } else {
        generator.generate(&trace)?
    };

    for (framework, result) in &bundle.validation {
        for error in &result.errors {
            warn!("{}: {}", framework, error.message);
        }
        for warning in &result.warnings {
            warn!("{}", warning);
        }
    }

    let output_dir = output.unwrap_or_else(|| Cli::bundles_dir().join(&bundle.name));
    let written = bundle.save_to_dir(&output_dir)?;

    println!("Generated {} files in {}", written.len(), output_dir.display());
    for path in &written {
        println!("  {}", path.display());
    }
    println!("Estimated runtime: {}", bundle.estimate);
    if !bundle.passed() {
        anyhow::bail!("Generated scripts failed validation");
    }
    Ok(())
}

fn run_openapi(
    input: &Path,
    output: Option<PathBuf>,
    server: Option<String>,
    config: &Config,
) -> anyhow::Result<()> {
    let trace = load_trace(input)?;
    let parameters = config.parameter_extractor().extract(&trace);

    let mut builder = OpenApiBuilder::new(trace.name())
        .frameworks(&config.synthesis.targets)
        .estimate(estimate_runtime(&trace));
    if let Some(url) = server {
        builder = builder.server(url);
    }
    let doc = serde_json::to_string_pretty(&builder.build(&parameters, classify_security(&trace)))?;

    match output {
        Some(path) => {
            std::fs::write(&path, doc)?;
            println!("Wrote OpenAPI document to {}", path.display());
        }
        None => println!("{}", doc),
    }
    Ok(())
}

fn run_validate(input: &Path, config: &Config) -> anyhow::Result<()> {
    let trace = load_trace(input)?;
    trace.validate()?;
    println!("Trace: OK ({} interactions)", trace.len());

    let unknown = trace.unknown_interactions();
    if !unknown.is_empty() {
        println!("  {} interaction(s) of unknown kind will render as markers", unknown.len());
    }

    let generator = ArtifactGenerator::with_config(GeneratorConfig {
        frameworks: config.synthesis.targets.clone(),
        synthesis: config.synthesis_options(),
        server_url: None,
    });
    let bundle = generator.generate(&trace)?;

    for (framework, result) in &bundle.validation {
        if result.passed {
            println!("{}: OK", framework);
        } else {
            println!("{}: FAILED", framework);
            for error in &result.errors {
                println!("  ERROR: {}", error.message);
            }
        }
        for warning in &result.warnings {
            println!("  WARNING: {}", warning);
        }
    }

    if !bundle.passed() {
        anyhow::bail!("Validation failed");
    }
    Ok(())
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save_default()?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    std::fs::create_dir_all(Cli::traces_dir())?;
    std::fs::create_dir_all(Cli::bundles_dir())?;

    println!("\nCreated directories:");
    println!("  Traces: {:?}", Cli::traces_dir());
    println!("  Bundles: {:?}", Cli::bundles_dir());

    Ok(())
}

fn run_config(action: ConfigAction, explicit_path: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let config_path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            println!("Configuration ({:?}):\n", config_path);
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Get { key } => {
            let value = config.get(&key)?;
            println!("{} = {}", key, value);
        }
        ConfigAction::Set { key, value } => {
            if !config_path.exists() {
                anyhow::bail!("No config file found. Run 'replay-gen init' first.");
            }
            let mut updated = Config::load(&config_path)?;
            updated.set(&key, &value)?;
            updated.save(&config_path)?;
            println!("Set {} = {}", key, updated.get(&key)?);
        }
        ConfigAction::Reset { force } => {
            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            Config::default().save(&config_path)?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}
