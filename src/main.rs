use clap::Parser;
use colored::Colorize;
use deadsharp::analysis::Finding;
use deadsharp::config::{load_config, load_from_default_locations};
use deadsharp::{analyze, Config, ReportFormat, Reporter};
use miette::Result;
use std::path::PathBuf;
use tracing::info;

/// deadsharp - Fast unused-symbol detection for C# projects
#[derive(Parser, Debug)]
#[command(name = "deadsharp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project directory to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target directories to analyze (can be specified multiple times)
    #[arg(short, long)]
    target: Vec<PathBuf>,

    /// Patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Symbol patterns to retain - never report as dead
    #[arg(short, long)]
    retain: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file (for json/sarif formats)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Comma-separated rule ids to run (e.g. "DS001,DS003")
    #[arg(long)]
    rules: Option<String>,

    /// Enable parallel parsing for faster analysis
    #[arg(long)]
    parallel: bool,

    /// Exit with code 1 when findings are reported
    #[arg(long)]
    fail_on_findings: bool,

    /// Hide code snippets in terminal output
    #[arg(long)]
    no_code: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
    Sarif,
}

impl From<&OutputFormat> for ReportFormat {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Sarif => ReportFormat::Sarif,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("{} {e:?}", "error:".red().bold());
            std::process::exit(2);
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<i32> {
    let (mut config, config_diagnostics) = match &cli.config {
        Some(path) => load_config(path),
        None => load_from_default_locations(&cli.path),
    };

    apply_cli_overrides(cli, &mut config);

    // Configuration problems are findings, not aborts
    let mut findings: Vec<Finding> = config_diagnostics.iter().map(Finding::from_config).collect();

    info!("Analyzing {}", cli.path.display());
    let outcome = analyze(&cli.path, &config, cli.parallel)?;

    if !cli.quiet {
        info!(
            "{} files, {} declarations, {} candidates",
            outcome.files_analyzed, outcome.declarations, outcome.candidates
        );
    }

    findings.extend(outcome.findings);
    deadsharp::analysis::sort_findings(&mut findings);

    let format = ReportFormat::from(&cli.format);
    let reporter = Reporter::new(format, cli.output.clone())
        .with_show_code(config.report.show_code && !cli.no_code);
    reporter.report(&findings)?;

    if cli.fail_on_findings && !findings.is_empty() {
        return Ok(1);
    }
    Ok(0)
}

fn apply_cli_overrides(cli: &Cli, config: &mut Config) {
    if !cli.target.is_empty() {
        config.targets = cli.target.clone();
    }
    config.exclude.extend(cli.exclude.iter().cloned());
    config.retain_patterns.extend(cli.retain.iter().cloned());

    if let Some(rules) = &cli.rules {
        let requested: Vec<&str> = rules.split(',').map(str::trim).collect();
        for &id in deadsharp::config::KNOWN_RULES {
            let mut options = config.rule(id);
            options.enabled = requested.contains(&id);
            config.rules.insert(id.to_string(), options);
        }
    }
}
