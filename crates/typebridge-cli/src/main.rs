//! typebridge CLI.
//!
//! Reads `typebridge.toml` (when present), applies flag overrides and runs
//! the generator.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, WrapErr};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use tracing_subscriber::EnvFilter;

use typebridge_compiler::config::{Layout, SourceKind, ValidatorDialect, CONFIG_FILE};
use typebridge_compiler::{Generator, GeneratorConfig, GeneratorError};

mod ui;

#[derive(Parser)]
#[command(name = "typebridge")]
#[command(about = "Generate TypeScript types and runtime validators from Rust declarations")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Configuration file (defaults to ./typebridge.toml when it exists)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Source file or directory
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Output directory for the generated modules
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Source extractor
    #[arg(long, global = true, value_enum)]
    source: Option<SourceArg>,

    /// Validator dialect
    #[arg(long, global = true, value_enum)]
    validators: Option<DialectArg>,

    /// Output layout
    #[arg(long, global = true, value_enum)]
    layout: Option<LayoutArg>,

    /// Reuse emitted text for unchanged types
    #[arg(long, global = true)]
    cache: bool,

    /// Log pipeline details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a commented default typebridge.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate types and validators and write the bundle
    Generate,

    /// Run every step except writing
    Check,

    /// Regenerate whenever a source file changes
    Watch,

    /// Print the resolved emission order
    Order,

    /// Check a JSON payload against a type's validator
    Validate {
        /// Declaration name
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// JSON file holding the payload
        #[arg(short, long)]
        sample: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Rust,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Builtin,
    Zod,
}

#[derive(Clone, Copy, ValueEnum)]
enum LayoutArg {
    PerType,
    SingleFile,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Rust => SourceKind::Rust,
            SourceArg::Json => SourceKind::Json,
        }
    }
}

impl From<DialectArg> for ValidatorDialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Builtin => ValidatorDialect::Builtin,
            DialectArg::Zod => ValidatorDialect::Zod,
        }
    }
}

impl From<LayoutArg> for Layout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::PerType => Layout::PerType,
            LayoutArg::SingleFile => Layout::SingleFile,
        }
    }
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match cli.command {
        Commands::Init { force } => init_config(&cli.global, force),
        Commands::Generate => generate(load_config(&cli.global)?),
        Commands::Check => check(load_config(&cli.global)?),
        Commands::Watch => run_watch_mode(load_config(&cli.global)?).await,
        Commands::Order => print_order(load_config(&cli.global)?),
        Commands::Validate { type_name, sample } => validate_sample(load_config(&cli.global)?, &type_name, &sample),
    }
}

/// `RUST_LOG` wins unless `-v` asks for debug output.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file values, then flag overrides.
fn load_config(args: &GlobalArgs) -> miette::Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None if Path::new(CONFIG_FILE).exists() => GeneratorConfig::load(Path::new(CONFIG_FILE))?,
        None => GeneratorConfig::default(),
    };

    if let Some(input) = &args.input {
        config.input = input.clone();
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if let Some(source) = args.source {
        config.source = source.into();
    }
    if let Some(validators) = args.validators {
        config.validators = validators.into();
    }
    if let Some(layout) = args.layout {
        config.layout = layout.into();
    }
    config.cache |= args.cache;

    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

fn init_config(args: &GlobalArgs, force: bool) -> miette::Result<()> {
    let path = args.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    if path.exists() && !force {
        return Err(miette::miette!(
            help = "Pass --force to overwrite it",
            "{} already exists",
            path.display()
        ));
    }

    std::fs::write(&path, GeneratorConfig::template())
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;

    ui::header(env!("CARGO_PKG_VERSION"));
    ui::success(&format!("Wrote {}", path.display()));
    println!();
    println!("  Now do this:");
    println!();
    println!("    1. Mark types with #[bridge] (or #[bridge(branded)] for ids)");
    println!("    2. Point `input` at the crate that declares them");
    println!("    3. typebridge generate");
    println!();
    Ok(())
}

fn generate(config: GeneratorConfig) -> miette::Result<()> {
    let start = Instant::now();
    let spinner = ui::spinner("Generating bindings...");
    let output = config.output.clone();

    let result = Generator::new(config).generate();
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            ui::success(&format!(
                "Generated {} into {}",
                ui::count(result.types, "type"),
                output.display()
            ));
            if result.cached > 0 {
                ui::dim(&format!("{} reused from the shape cache", result.cached));
            }
            ui::timing(&format!("Wrote {}", ui::count(result.files, "file")), start.elapsed().as_millis());
            Ok(())
        }
        Err(e) => {
            ui::nope_header();
            Err(e.into())
        }
    }
}

fn check(config: GeneratorConfig) -> miette::Result<()> {
    let spinner = ui::spinner("Checking declarations...");
    let result = Generator::new(config).check();
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            ui::looking_good();
            println!();
            println!(
                "    {} {} {} would be written",
                ui::count(result.types, "type"),
                ui::symbols::DOT,
                ui::count(result.files, "file")
            );
            Ok(())
        }
        Err(e) => {
            ui::nope_header();
            Err(e.into())
        }
    }
}

/// Names only when piped, a numbered list on a terminal.
fn print_order(config: GeneratorConfig) -> miette::Result<()> {
    let order = Generator::new(config).order()?;

    if !console::Term::stdout().is_term() {
        for name in &order {
            println!("{name}");
        }
        return Ok(());
    }

    ui::info(&format!("Emission order ({})", ui::count(order.len(), "type")));
    println!();
    for (i, name) in order.iter().enumerate() {
        ui::order_item(i + 1, name);
    }
    Ok(())
}

fn validate_sample(config: GeneratorConfig, type_name: &str, sample: &Path) -> miette::Result<()> {
    let text = std::fs::read_to_string(sample)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", sample.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .into_diagnostic()
        .wrap_err_with(|| format!("{} is not valid JSON", sample.display()))?;

    let table = Generator::new(config).shape_table()?;
    if !table.validators.contains_key(type_name) {
        let known: Vec<&str> = table.validators.keys().map(String::as_str).collect();
        return Err(miette::miette!(
            help = format!("Known types: {}", known.join(", ")),
            "No type named '{type_name}'"
        ));
    }

    let issues = table.validate(type_name, &value);
    if issues.is_empty() {
        ui::success(&format!("{} is a valid {type_name}", sample.display()));
        return Ok(());
    }

    ui::nope_header();
    for issue in &issues {
        ui::issue(&issue.path, &issue.message);
    }
    println!();
    Err(miette::miette!(
        "{} rejected by {type_name}",
        ui::count(issues.len(), "issue")
    ))
}

/// Run watch mode: regenerate once, then after every debounced change.
async fn run_watch_mode(config: GeneratorConfig) -> miette::Result<()> {
    ui::info(&format!("Watching for changes in {}", config.input.display()));
    println!();
    regenerate(&config);

    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);
    // Built after the first run so the output directory exists and resolves.
    let filter = WatchFilter::new(&config);

    let mut debouncer = new_debouncer(Duration::from_millis(500), move |result: DebounceEventResult| {
        if let Ok(events) = result {
            if events.iter().any(|event| filter.is_source_change(&event.path)) {
                let _ = tx.try_send(());
            }
        }
    })
    .into_diagnostic()
    .wrap_err("Failed to create file watcher")?;

    debouncer
        .watcher()
        .watch(&config.input, RecursiveMode::Recursive)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to watch {}", config.input.display()))?;

    ui::info("Ready! Waiting for changes...");

    loop {
        tokio::select! {
            changed = rx.recv() => {
                if changed.is_none() {
                    break;
                }
                println!();
                regenerate(&config);
                println!();
                ui::info("Ready! Waiting for changes...");
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                ui::dim("Stopping watch mode.");
                break;
            }
        }
    }

    Ok(())
}

/// One watch iteration. Failures are printed and the loop keeps going.
fn regenerate(config: &GeneratorConfig) {
    let spinner = ui::spinner("Regenerating...");
    let start = Instant::now();
    let result = Generator::new(config.clone()).generate();
    spinner.finish_and_clear();

    match result {
        Ok(result) => ui::success(&format!(
            "Generated {} ({} cached) in {}ms",
            ui::count(result.types, "type"),
            result.cached,
            start.elapsed().as_millis()
        )),
        Err(e) => report(&e),
    }
}

fn report(err: &GeneratorError) {
    for e in err.iter() {
        ui::error(&e.to_string());
    }
}

/// Decides which watcher events trigger a run. The watcher reports
/// absolute paths, so the output directory is compared in absolute form.
struct WatchFilter {
    output: PathBuf,
    extension: &'static str,
}

impl WatchFilter {
    fn new(config: &GeneratorConfig) -> Self {
        Self {
            output: absolute(&config.output),
            extension: match config.source {
                SourceKind::Rust => "rs",
                SourceKind::Json => "json",
            },
        }
    }

    /// Source files only; the bundle and cache are skipped so writing them
    /// does not trigger another run.
    fn is_source_change(&self, path: &Path) -> bool {
        if absolute(path).starts_with(&self.output) {
            return false;
        }
        path.extension().is_some_and(|ext| ext == self.extension)
    }
}

/// Canonical form when the path exists, otherwise joined onto the
/// working directory.
fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
