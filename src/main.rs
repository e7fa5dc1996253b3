// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, error};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use page_translator::{AppError, Controller};
use page_translator::app_config::{Config, LogLevel, TranslationProvider};
use page_translator::providers::catalog::{ModelCategory, ModelFilter, UseCase};
use page_translator::storefront::ProductContent;
use page_translator::translation::{EntryKind, Priority};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Google,
    OpenRouter,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Google => TranslationProvider::Google,
            CliTranslationProvider::OpenRouter => TranslationProvider::OpenRouter,
        }
    }
}

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

/// CLI Wrapper for Priority to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliPriority {
    High,
    Normal,
    Low,
}

impl From<CliPriority> for Priority {
    fn from(cli_priority: CliPriority) -> Self {
        match cli_priority {
            CliPriority::High => Priority::High,
            CliPriority::Normal => Priority::Normal,
            CliPriority::Low => Priority::Low,
        }
    }
}

/// CLI Wrapper for EntryKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEntryKind {
    Exact,
    Partial,
    ExcludeWord,
    ExcludePhrase,
    ExcludePattern,
    Correction,
    RegexCorrection,
}

impl From<CliEntryKind> for EntryKind {
    fn from(cli_kind: CliEntryKind) -> Self {
        match cli_kind {
            CliEntryKind::Exact => EntryKind::Exact,
            CliEntryKind::Partial => EntryKind::Partial,
            CliEntryKind::ExcludeWord => EntryKind::ExcludeWord,
            CliEntryKind::ExcludePhrase => EntryKind::ExcludePhrase,
            CliEntryKind::ExcludePattern => EntryKind::ExcludePattern,
            CliEntryKind::Correction => EntryKind::Correction,
            CliEntryKind::RegexCorrection => EntryKind::RegexCorrection,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a single text
    Translate {
        /// Text to translate
        text: String,

        /// Source language code (defaults to the site default language)
        #[arg(short, long)]
        source: Option<String>,

        /// Target language code
        #[arg(short, long)]
        target: String,

        /// Request priority
        #[arg(long, value_enum, default_value = "normal")]
        priority: CliPriority,

        /// Answer like the live request handler, errors included in the output
        #[arg(long)]
        live: bool,
    },

    /// Translate several texts, one per argument or one per line of a file
    Batch {
        /// Texts to translate
        texts: Vec<String>,

        /// File with one text per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Source language code (defaults to the site default language)
        #[arg(short, long)]
        source: Option<String>,

        /// Target language code
        #[arg(short, long)]
        target: String,
    },

    /// Warm the cache with common interface phrases
    Preload {
        /// Single target language (defaults to every enabled language)
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Translate a product JSON file into every enabled language
    Product {
        /// JSON file with `title`, `short_description` and `description`
        path: PathBuf,
    },

    /// Browse, refresh and test OpenRouter models
    Models {
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// Check the provider's API key and reachability
    Check,

    /// Show performance, model and database statistics
    Stats,

    /// Remove expired cache entries, or everything with --all
    Purge {
        #[arg(long)]
        all: bool,
    },

    /// Manage the custom dictionary
    Dictionary {
        #[command(subcommand)]
        action: DictionaryAction,
    },

    /// Generate shell completions for page-translator
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ModelsAction {
    /// List catalog models, best first
    List {
        /// Match on id, name or description
        #[arg(long)]
        search: Option<String>,

        /// free, low-cost, premium or specialized
        #[arg(long)]
        category: Option<String>,

        /// Vendor name, e.g. Anthropic
        #[arg(long)]
        vendor: Option<String>,

        #[arg(long)]
        min_quality: Option<f32>,

        /// Maximum cost per million tokens
        #[arg(long)]
        max_cost: Option<f64>,

        #[arg(long)]
        free: bool,
    },

    /// Models recommended for speed, quality, cost or general use
    Recommended {
        #[arg(default_value = "general")]
        use_case: String,
    },

    /// Merge the live OpenRouter listing into the catalog
    Refresh,

    /// Translate a short text with the given model
    Test { model: String },
}

#[derive(Subcommand, Debug)]
enum DictionaryAction {
    /// Add or update a rule
    Add {
        lang: String,
        #[arg(value_enum)]
        kind: CliEntryKind,
        key: String,
        value: Option<String>,
    },

    /// Remove a rule
    Remove {
        lang: String,
        #[arg(value_enum)]
        kind: CliEntryKind,
        key: String,
    },

    /// Import rules from a JSON file
    Import {
        path: PathBuf,

        /// Replace the dictionary instead of merging into it
        #[arg(long)]
        replace: bool,
    },

    /// Print the dictionary, or a single language, as JSON
    Export {
        #[arg(short, long)]
        lang: Option<String>,
    },
}

/// Page Translator - cached, dictionary-aware page content translation
#[derive(Parser, Debug)]
#[command(name = "page-translator")]
#[command(version)]
#[command(about = "Cached, dictionary-aware page content translation")]
#[command(long_about = "Translates page content through Google Translate or OpenRouter models,
answering from the cache and the custom dictionary whenever possible.

EXAMPLES:
    page-translator translate -t it \"Read more\"           # Translate one text
    page-translator translate -t de --live \"Add to cart\"  # Live request response
    page-translator batch -t fr -f strings.txt              # One text per line
    page-translator dictionary add it exact Submit Invia    # Exact override
    page-translator models list --free                      # Free OpenRouter models
    page-translator completions bash > page-translator.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: PathBuf,

    /// Translation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation (OpenRouter)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
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
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
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
            let (emoji, colour) = Self::style_for_level(record.level());

            // Output goes to stderr so stdout stays parseable JSON
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

impl Commands {
    /// Whether the command may call the translation provider
    fn needs_provider(&self) -> bool {
        match self {
            Self::Translate { .. }
            | Self::Batch { .. }
            | Self::Preload { .. }
            | Self::Product { .. }
            | Self::Check => true,
            Self::Models { action } => matches!(action, ModelsAction::Test { .. }),
            _ => false,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config)?;

    // Override config with CLI options if provided
    if let Some(provider) = &cli.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &cli.model {
        let active = config.translation.provider;
        config.translation.get_provider_config_mut(&active).model = model.clone();
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "page-translator", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: CommandLineOptions) -> Result<(), AppError> {
    let config = load_config(&cli).map_err(|e| AppError::Config(format!("{:#}", e)))?;
    log::set_max_level(config.log_level.to_level_filter());

    if cli.command.needs_provider() {
        config
            .validate()
            .map_err(|e| AppError::Config(format!("{:#}", e)))?;
    }

    let default_language = config.default_language.clone();
    let controller = Controller::with_config(config).await?;
    debug!("Controller ready, provider: {}", controller.pipeline().provider_kind());

    match cli.command {
        Commands::Translate {
            text,
            source,
            target,
            priority,
            live,
        } => {
            let source = source.unwrap_or(default_language);
            if live {
                print_json(&controller.translate_live(&text, &source, &target, priority.into()).await)?;
            } else {
                let resolution = controller
                    .translate(&text, &source, &target, priority.into())
                    .await?;
                print_json(&resolution)?;
            }
        }
        Commands::Batch {
            mut texts,
            file,
            source,
            target,
        } => {
            if let Some(path) = file {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read batch file: {:?}", path))?;
                texts.extend(content.lines().map(str::to_string));
            }
            if texts.is_empty() {
                return Err(anyhow!("Nothing to translate: pass texts or --file").into());
            }

            let source = source.unwrap_or(default_language);
            print_json(&controller.translate_batch(&texts, &source, &target).await)?;
        }
        Commands::Preload { target } => print_json(&controller.preload(target.as_deref()).await)?,
        Commands::Product { path } => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read product file: {:?}", path))?;
            let product: ProductContent =
                serde_json::from_str(&content).with_context(|| format!("Failed to parse product file: {:?}", path))?;
            print_json(&controller.storefront().translate_product(&product).await)?;
        }
        Commands::Models { action } => run_models(&controller, action).await?,
        Commands::Check => {
            let report = controller.check_connection().await;
            print_json(&report)?;
            if let (false, Some(message)) = (report.connected, report.error) {
                return Err(if report.config_error {
                    AppError::Config(message)
                } else {
                    AppError::Unknown(message)
                });
            }
        }
        Commands::Stats => print_json(&controller.stats()?)?,
        Commands::Purge { all } => {
            if all {
                let removed = controller.clear_cache().await?;
                print_json(&serde_json::json!({ "database": removed }))?;
            } else {
                print_json(&controller.purge_expired().await?)?;
            }
        }
        Commands::Dictionary { action } => run_dictionary(&controller, action)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn run_models(controller: &Controller, action: ModelsAction) -> Result<()> {
    match action {
        ModelsAction::List {
            search,
            category,
            vendor,
            min_quality,
            max_cost,
            free,
        } => {
            let category = category
                .map(|c| c.parse::<ModelCategory>())
                .transpose()?;
            let filter = ModelFilter {
                search,
                category,
                provider: vendor,
                min_quality,
                max_cost,
                free_only: free,
            };
            print_json(&controller.list_models(&filter))
        }
        ModelsAction::Recommended { use_case } => {
            let use_case: UseCase = use_case.parse()?;
            print_json(&controller.recommended_models(use_case))
        }
        ModelsAction::Refresh => {
            let added = controller.refresh_models().await?;
            print_json(&serde_json::json!({ "added": added }))
        }
        ModelsAction::Test { model } => print_json(&controller.test_model(&model).await?),
    }
}

fn run_dictionary(controller: &Controller, action: DictionaryAction) -> Result<()> {
    match action {
        DictionaryAction::Add { lang, kind, key, value } => {
            controller.add_dictionary_entry(&lang, kind.into(), &key, value.as_deref())?;
            print_json(&serde_json::json!({ "added": key }))
        }
        DictionaryAction::Remove { lang, kind, key } => {
            let removed = controller.remove_dictionary_entry(&lang, kind.into(), &key)?;
            print_json(&serde_json::json!({ "removed": removed }))
        }
        DictionaryAction::Import { path, replace } => {
            controller.import_dictionary(&path, !replace)?;
            print_json(&serde_json::json!({ "imported": path }))
        }
        DictionaryAction::Export { lang } => {
            println!("{}", controller.export_dictionary(lang.as_deref())?);
            Ok(())
        }
    }
}
