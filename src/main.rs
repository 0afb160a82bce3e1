// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cleansound_translate::app_config::{CacheBackend, Config, LogLevel};
use cleansound_translate::cache::{CacheService, MemoryCache};
use cleansound_translate::database::{DatabaseConnection, Repository, SqliteCache};
use cleansound_translate::documents::{Document, DocumentStatus};
use cleansound_translate::language_utils::Language;
use cleansound_translate::markup::EmbedShielder;
use cleansound_translate::providers::{HttpProvider, MockProvider, Provider};
use cleansound_translate::translation::segments::ProgressCallback;
use cleansound_translate::translation::{
    ClientOptions, DocumentReport, HtmlTranslator, ProviderClient, SegmentTranslator,
    QueueOptions, TranslationOrchestrator, TranslationQueue,
};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for DocumentStatus to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliStatus {
    Draft,
    Published,
    Archived,
}

impl From<CliStatus> for DocumentStatus {
    fn from(status: CliStatus) -> Self {
        match status {
            CliStatus::Draft => DocumentStatus::Draft,
            CliStatus::Published => DocumentStatus::Published,
            CliStatus::Archived => DocumentStatus::Archived,
        }
    }
}

#[derive(Parser, Debug)]
struct LanguageArgs {
    /// Target language code (id, en, ja)
    #[arg(short, long)]
    target: String,

    /// Source language code; the configured native language when omitted
    #[arg(short, long)]
    source: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a plain-text string
    TranslateText {
        /// Text to translate; read from stdin when omitted
        text: Option<String>,

        #[command(flatten)]
        languages: LanguageArgs,
    },

    /// Translate a markup file, keeping tags and embeds intact
    TranslateHtml {
        /// Markup file; read from stdin when omitted
        #[arg(value_name = "INPUT_PATH")]
        input_path: Option<PathBuf>,

        #[command(flatten)]
        languages: LanguageArgs,
    },

    /// Store a document and translate it into every target language
    Publish {
        /// Document id
        #[arg(long)]
        id: String,

        /// Document title
        #[arg(long)]
        title: String,

        /// File holding the markup body
        #[arg(long, value_name = "BODY_PATH")]
        body: PathBuf,

        /// Publication status
        #[arg(long, value_enum, default_value = "published")]
        status: CliStatus,

        /// Language the document is written in; the configured native language when omitted
        #[arg(long)]
        native_language: Option<String>,
    },

    /// Re-run translation for a stored document
    Retranslate {
        /// Document id
        id: String,
    },

    /// Print a stored document as JSON in the requested language
    Show {
        /// Document id
        id: String,

        /// Language code; unknown codes fall back to the native language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// cleansound-translate - markup-preserving document translation
///
/// Translates rich-text documents into the configured languages through a
/// LibreTranslate-compatible HTTP provider, keeping tags, embeds, video
/// links, URLs, email addresses and phone numbers untouched.
#[derive(Parser, Debug)]
#[command(name = "cleansound-translate")]
#[command(version)]
#[command(about = "Markup-preserving document translation")]
#[command(long_about = "Translates rich-text documents through a LibreTranslate-compatible provider.

EXAMPLES:
    cleansound-translate translate-text -t en \"Halo dunia\"
    cleansound-translate translate-html -t ja article.html
    cleansound-translate publish --id news-1 --title \"Berita\" --body article.html
    cleansound-translate show news-1 -l ja
    cleansound-translate completions bash > cleansound-translate.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. TRANSLATE_API_URL, TRANSLATE_API_KEY and
    TRANSLATION_CACHE_TTL override the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Use the offline mock provider instead of the configured endpoint
    #[arg(long, global = true)]
    mock: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize with trace so the configured level can be applied later
    // through log::set_max_level alone
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "cleansound-translate", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());

    let provider = build_provider(&config, cli.mock)?;

    match cli.command {
        Commands::TranslateText { text, languages } => {
            let text = match text {
                Some(text) => text,
                None => read_stdin()?,
            };
            let (source, target) = resolve_languages(&config, &languages)?;
            let cache: Arc<dyn CacheService> = Arc::new(MemoryCache::new());
            let translator = build_translator(&config, provider, cache, None);

            let output = translator
                .translate_plain(&text, Some(source), target)
                .await
                .context("Translation failed")?;
            report_failures(output.failures.len(), output.translatable);
            println!("{}", output.text);
        }
        Commands::TranslateHtml { input_path, languages } => {
            let markup = match input_path {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read input file: {:?}", path))?,
                None => read_stdin()?,
            };
            let (source, target) = resolve_languages(&config, &languages)?;
            let cache: Arc<dyn CacheService> = Arc::new(MemoryCache::new());

            let progress_bar = ProgressBar::new(0);
            progress_bar.set_style(
                ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} segments")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            let callback: ProgressCallback = {
                let progress_bar = progress_bar.clone();
                Arc::new(move |done, total| {
                    progress_bar.set_length(total as u64);
                    progress_bar.set_position(done as u64);
                })
            };

            let translator = build_translator(&config, provider, cache, Some(callback));
            let output = translator
                .translate_html(&markup, Some(source), target)
                .await
                .context("Translation failed")?;
            progress_bar.finish_and_clear();

            report_failures(output.failures.len(), output.translatable);
            println!("{}", output.text);
        }
        Commands::Publish {
            id,
            title,
            body,
            status,
            native_language,
        } => {
            let body = std::fs::read_to_string(&body)
                .with_context(|| format!("Failed to read body file: {:?}", body))?;
            let native_language = match native_language {
                Some(code) => Language::parse(&code)?,
                None => config.native_language,
            };

            let repository = open_repository(&config)?;
            let orchestrator = Arc::new(build_orchestrator(&config, provider, &repository));
            let queue = Arc::new(TranslationQueue::start_with(orchestrator, QueueOptions::from_config(&config)));
            repository.hooks().register(queue.clone());

            let document = Document::new(id, title, body)
                .with_status(status.into())
                .with_native_language(native_language);
            repository.save_document(&document).await?;

            let spinner = spinner(format!("Translating {}", document.id));
            queue.shutdown().await;
            spinner.finish_and_clear();

            for result in queue.take_results() {
                print_report(&result?);
            }
        }
        Commands::Retranslate { id } => {
            let repository = open_repository(&config)?;
            let orchestrator = build_orchestrator(&config, provider, &repository);

            let spinner = spinner(format!("Translating {}", id));
            let report = orchestrator.translate_document(&id).await;
            spinner.finish_and_clear();

            print_report(&report?);
        }
        Commands::Show { id, language } => {
            let repository = open_repository(&config)?;
            let orchestrator = build_orchestrator(&config, provider, &repository);

            let document = orchestrator.resolve_for_display(&id, language.as_deref()).await?;
            if document.is_fallback {
                warn!("No {} translation of {} yet, showing {}", language.unwrap_or_default(), id, document.language);
            }
            let json = serde_json::json!({
                "id": document.document_id,
                "language": document.language,
                "title": document.title,
                "body": document.body,
                "short_description": document.short_description,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn build_provider(config: &Config, mock: bool) -> Result<Arc<dyn Provider>> {
    if mock {
        info!("Using the offline mock provider");
        return Ok(Arc::new(MockProvider::working()));
    }

    let provider = HttpProvider::from_config(&config.provider)
        .map_err(|e| anyhow!("Failed to create provider client: {}", e))?;
    info!("Using provider at {}", provider.endpoint());
    Ok(Arc::new(provider))
}

fn build_translator(
    config: &Config,
    provider: Arc<dyn Provider>,
    cache: Arc<dyn CacheService>,
    progress: Option<ProgressCallback>,
) -> HtmlTranslator {
    let client = ProviderClient::new(provider, cache.clone(), ClientOptions::from_config(config));
    let mut segments = SegmentTranslator::new(Arc::new(client), config.pipeline.max_concurrent_requests);
    if let Some(progress) = progress {
        segments = segments.with_progress(progress);
    }
    HtmlTranslator::new(EmbedShielder::new(cache, config.cache.shield_ttl()), segments)
}

fn open_repository(config: &Config) -> Result<Repository> {
    let db = match &config.database_path {
        Some(path) => DatabaseConnection::new(path)?,
        None => DatabaseConnection::new_default()?,
    };
    info!("Using database at {:?}", db.path());
    Ok(Repository::new(db))
}

fn build_orchestrator(config: &Config, provider: Arc<dyn Provider>, repository: &Repository) -> TranslationOrchestrator {
    let cache: Arc<dyn CacheService> = match config.cache.backend {
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
        CacheBackend::Sqlite => Arc::new(SqliteCache::new(repository.connection().clone())),
    };
    let store = Arc::new(repository.clone());

    TranslationOrchestrator::from_config(config, provider, cache, store.clone(), store)
}

fn resolve_languages(config: &Config, languages: &LanguageArgs) -> Result<(Language, Language)> {
    let source = match &languages.source {
        Some(code) => Language::parse(code)?,
        None => config.native_language,
    };
    let target = Language::parse(&languages.target)?;
    Ok((source, target))
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read from stdin")?;
    Ok(input)
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn report_failures(failed: usize, total: usize) {
    if failed > 0 {
        warn!("{} of {} segments could not be translated and were kept as is", failed, total);
    }
}

fn print_report(report: &DocumentReport) {
    println!("{} ({})", report.document_id, &report.content_hash[..12.min(report.content_hash.len())]);
    for (language, outcome) in &report.outcomes {
        println!("  {:<10} {}", language.display_name(), outcome);
    }
}
