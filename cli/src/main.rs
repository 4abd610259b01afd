//! CLI entrypoint for inkframe
//!
//! This is the main binary that wires together all layers using
//! dependency injection and runs a command script through the session.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use inkframe_application::{
    EditorParams, EventBus, InMemoryPluginHost, OcrEditorIntegration, SharedToolManager,
    SpellChecker, Tool, ToolContext, ToolIntegration, ToolManager, ToolRegistry,
    TranslationEditorIntegration, attach_event_logger,
};
use inkframe_domain::ToolError;
use inkframe_infrastructure::{
    ConfigLoader, DictionarySpellChecker, FileConfig, FileOutputFormat, FixtureOcrProcessor,
    JsonlEventLogger, PassthroughTranslator, RasterSurfaceFactory, builtin_tools,
};
use inkframe_presentation::{
    Cli, ConsoleFormatter, EditorView, NullView, OutputFormat, ProgressView, ScriptRunner,
    UnifiedEditorInterface, parse_script,
};
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Everything a script runs against.
struct Session {
    bus: EventBus,
    registry: Arc<ToolRegistry>,
    manager: SharedToolManager,
    integration: Arc<ToolIntegration>,
    ocr: Arc<OcrEditorIntegration>,
    translation: Arc<TranslationEditorIntegration>,
    editor: Arc<UnifiedEditorInterface>,
}

impl Session {
    async fn dispose(self) {
        self.editor.dispose();
        self.ocr.dispose();
        self.translation.dispose();
        self.integration.dispose().await;
        self.manager.lock().await.dispose().await;
        self.registry.dispose();
        self.bus.clear();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines reach the file
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config: {}", issue);
        }
        bail!("Invalid configuration ({} issues)", issues.len());
    }
    if !config.output.color {
        colored::control::set_override(false);
    }
    let params = config.to_editor_params();

    info!("Starting inkframe");

    let spell_checker: Option<Arc<dyn SpellChecker>> = match &cli.dictionary {
        Some(path) => Some(Arc::new(DictionarySpellChecker::from_file(path).with_context(
            || format!("Failed to read dictionary {}", path.display()),
        )?)),
        None => None,
    };

    let view: Arc<dyn EditorView> = if cli.quiet || !config.output.show_progress {
        Arc::new(NullView)
    } else {
        Arc::new(ProgressView::new())
    };

    let session = build_session(&cli, &config, &params, spell_checker, view).await?;

    if cli.list_tools {
        let manager = session.manager.lock().await;
        print!(
            "{}",
            ConsoleFormatter::format_tools(&manager.all_metadata(), manager.active_tool_id())
        );
        drop(manager);
        session.dispose().await;
        return Ok(());
    }

    if let Some(tool_id) = &cli.tool {
        let activated = session.manager.lock().await.activate_tool(tool_id).await;
        if !activated {
            session.dispose().await;
            bail!("Cannot activate tool `{}`", tool_id);
        }
    }

    let Some(script_path) = &cli.script else {
        session.dispose().await;
        bail!("A script is required. Pass a JSON file, or `-` to read stdin.");
    };
    let source = read_script(script_path).await?;
    let commands = parse_script(&source)?;
    info!(steps = commands.len(), "Running script");

    let report = ScriptRunner::new(session.editor.clone(), session.manager.clone())
        .stop_on_error(cli.fail_fast)
        .run(&commands)
        .await;

    let format = cli.output.unwrap_or(match config.output.format {
        FileOutputFormat::Pretty => OutputFormat::Pretty,
        FileOutputFormat::Json => OutputFormat::Json,
    });
    let output = match format {
        OutputFormat::Pretty => ConsoleFormatter::format(&report),
        OutputFormat::Json => ConsoleFormatter::format_json(&report),
    };
    println!("{}", output);

    session.dispose().await;

    if !report.is_success() {
        bail!("{} of {} steps failed", report.failures(), report.steps.len());
    }
    Ok(())
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Initialize logging based on verbosity level
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("Invalid log file path: {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            builder.with_writer(writer).with_ansi(false).init();
            Ok(Some(guard))
        }
        None => {
            builder.with_writer(std::io::stderr).init();
            Ok(None)
        }
    }
}

async fn read_script(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        tokio::io::stdin()
            .read_to_string(&mut source)
            .await
            .context("Failed to read script from stdin")?;
        return Ok(source);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read script {}", path.display()))
}

async fn build_session(
    cli: &Cli,
    config: &FileConfig,
    params: &EditorParams,
    spell_checker: Option<Arc<dyn SpellChecker>>,
    view: Arc<dyn EditorView>,
) -> Result<Session> {
    // === Dependency Injection ===
    let bus = EventBus::new();

    if let Some(path) = &cli.event_log {
        let logger = JsonlEventLogger::new(path)
            .ok_or_else(|| anyhow!("Cannot open event log {}", path.display()))?;
        attach_event_logger(&bus, Arc::new(logger));
        info!(path = %path.display(), "Recording bus events");
    }

    let registry = Arc::new(ToolRegistry::new().with_event_bus(bus.clone()));
    registry.initialize();
    let plugin_host = Arc::new(InMemoryPluginHost::new(bus.clone()));

    let mut manager = ToolManager::new(bus.clone());
    manager.initialize();
    let manager = manager.into_shared();
    let context = Arc::new(
        ToolContext::new(bus.clone())
            .with_tool_manager(&manager)
            .with_plugin_host(plugin_host.clone()),
    );

    {
        let mut manager = manager.lock().await;
        manager.set_context(context);
        for tool in builtin_tools(params, Arc::new(RasterSurfaceFactory), spell_checker) {
            let metadata = tool.metadata();
            if !manager.register_tool(tool) {
                return Err(ToolError::InvalidState(format!(
                    "built-in tool `{}` could not be registered",
                    metadata.id
                ))
                .into());
            }
            registry.register_tool(metadata);
        }
    }

    let integration = Arc::new(ToolIntegration::new(
        manager.clone(),
        registry.clone(),
        plugin_host,
        bus.clone(),
    ));
    integration.initialize();

    let mut ocr_engine = FixtureOcrProcessor::new();
    if let Some(dir) = &config.ocr.fixture_dir {
        ocr_engine = ocr_engine.with_fixture_dir(dir);
    }
    let ocr = Arc::new(OcrEditorIntegration::new(Arc::new(ocr_engine), bus.clone()));
    ocr.initialize();

    let translation = Arc::new(
        TranslationEditorIntegration::new(Arc::new(PassthroughTranslator::new()), bus.clone())
            .with_terms(params.comic_terms.clone()),
    );
    translation.initialize();

    let editor = Arc::new(
        UnifiedEditorInterface::new(bus.clone(), manager.clone(), ocr.clone(), translation.clone())
            .with_view(view)
            .with_languages(&params.source_language, &params.target_language),
    );
    editor.initialize();

    Ok(Session {
        bus,
        registry,
        manager,
        integration,
        ocr,
        translation,
        editor,
    })
}
