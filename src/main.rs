#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chapterflow::app_config::{self, Config, EngineKind};
use chapterflow::app_controller::Controller;
use chapterflow::database::{DatabaseConnection, Repository};
use chapterflow::scheduler::{JobQueueBackend, JobOptions, SqliteJobBackend, SubmitRequest};
use chapterflow::translation::engine::EngineAdapter;
use chapterflow::translation::splitter::ChunkSplitter;

/// CLI wrapper for EngineKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEngine {
    Google,
    #[value(name = "deepl")]
    DeepL,
}

impl From<CliEngine> for EngineKind {
    fn from(cli_engine: CliEngine) -> Self {
        match cli_engine {
            CliEngine::Google => EngineKind::Google,
            CliEngine::DeepL => EngineKind::DeepL,
        }
    }
}

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate text files, one chapter per file
    Translate(TranslateArgs),

    /// Show how a file would be chunked
    Split {
        /// Text file to split
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,
    },

    /// List jobs persisted in the database
    Jobs {
        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,

        /// Only show jobs of this submitter
        #[arg(long)]
        submitter: Option<String>,
    },

    /// Generate shell completions for chapterflow
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Chapter files, translated in the given order
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// Write the translation here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Engine to request
    #[arg(short, long, value_enum)]
    engine: Option<CliEngine>,

    /// Source language code (e.g., 'en', 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Job priority, 1 (low) to 4 (urgent)
    #[arg(short, long, default_value_t = 2)]
    priority: u8,

    /// Replace quotes in the translation with '―'
    #[arg(long)]
    replace_quotes: bool,

    /// Submitter identity used for rate limiting
    #[arg(long, default_value = "cli")]
    submitter: String,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// chapterflow - chunked translation of long texts
#[derive(Parser, Debug)]
#[command(name = "chapterflow")]
#[command(version)]
#[command(about = "Chunked, cached, rate-limited translation of long texts")]
#[command(long_about = "chapterflow splits long texts into engine-safe chunks and translates them
through Google or DeepL with caching, fallback and a priority job queue.

EXAMPLES:
    chapterflow translate ch1.txt ch2.txt -t es      # Translate two chapters to Spanish
    chapterflow translate book.txt -e deepl -o out.txt
    chapterflow split book.txt                        # Show the chunk layout
    chapterflow jobs                                  # List persisted jobs
    chapterflow completions bash > chapterflow.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
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
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is read
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "chapterflow", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
        Commands::Split { file, config_path } => run_split(&file, &config_path),
        Commands::Jobs { config_path, submitter } => run_jobs(&config_path, submitter.as_deref()).await,
    }
}

/// Load the config file, creating a default one if it does not exist
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {}", config_path))
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        Ok(config)
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let mut config = load_config(&options.config_path)?;

    if let Some(engine) = &options.engine {
        config.engines.default_engine = engine.clone().into();
    }
    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &options.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    let chapters = options
        .files
        .iter()
        .map(|path| {
            let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok((name, text))
        })
        .collect::<Result<Vec<_>>>()?;

    let progress_bar = ProgressBar::new(100);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    progress_bar.set_message(format!("{} chapter(s)", chapters.len()));

    let bar = progress_bar.clone();
    let engine = EngineAdapter::from_config(&config);
    let controller = Controller::build(
        config.clone(),
        engine,
        Some(Arc::new(move |_job_id: &str, percent: u8| bar.set_position(u64::from(percent)))),
    )?;
    let restored = controller.start().await?;
    if restored > 0 {
        info!("{} queued job(s) restored from a previous run", restored);
    }

    let request = SubmitRequest::new(
        options.submitter.clone(),
        chapters,
        config.source_language.clone(),
        config.target_language.clone(),
    )
    .with_priority(options.priority)
    .with_engine(config.engines.default_engine)
    .with_options(JobOptions {
        replace_quotes: options.replace_quotes,
    });

    let scheduler = controller.scheduler();
    let job_id = scheduler.submit(request).await?;
    let report = scheduler.wait_for_completion(&job_id).await?;
    progress_bar.finish_and_clear();

    let result = scheduler.get_result(&job_id).map_err(|e| {
        anyhow!(
            "{} ({})",
            e,
            report.error_message.clone().unwrap_or_else(|| report.status.to_string())
        )
    })?;

    if let Some(job) = scheduler.get_job(&job_id) {
        let degraded = job.degraded_chunks();
        if degraded > 0 {
            warn!("{} chunk(s) could not be translated and kept their original text", degraded);
        }
    }

    let text = result
        .iter()
        .map(|(_, text)| text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    match &options.output {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("Failed to write {:?}", path))?;
            info!("Translation written to {:?}", path);
        }
        None => println!("{}", text),
    }

    let stats = scheduler.cache().stats();
    info!(
        "Cache: {} hit(s), {} miss(es), {:.0}% hit rate",
        stats.hits,
        stats.misses,
        stats.hit_rate * 100.0
    );

    controller.shutdown().await;
    Ok(())
}

fn run_split(file: &Path, config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let splitter = ChunkSplitter::new(&config.splitter);
    let text = std::fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;

    let chunks = splitter.split(&text);
    println!(
        "{} chars -> {} chunk(s) (soft {}, hard {})",
        text.chars().count(),
        chunks.len(),
        splitter.soft_limit(),
        splitter.hard_limit()
    );
    for (index, chunk) in chunks.iter().enumerate() {
        let preview: String = chunk.chars().take(40).collect();
        println!("{:>4}  {:>5}  {:?}", index, chunk.chars().count(), preview);
    }
    Ok(())
}

async fn run_jobs(config_path: &str, submitter: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let path = config.database_path()?;
    if !path.exists() {
        println!("No job database at {:?}", path);
        return Ok(());
    }

    let backend = SqliteJobBackend::new(Repository::new(DatabaseConnection::new(&path)?));
    let jobs = backend.load_jobs().await?;

    for job in jobs
        .iter()
        .filter(|job| submitter.is_none_or(|id| id == job.submitter_id))
    {
        println!(
            "{}  {:<10}  p{}  {:>3}%  {}  {}",
            job.id,
            job.status,
            u8::from(job.priority),
            job.progress_percent,
            job.submitter_id,
            job.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
