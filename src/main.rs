use anyhow::{anyhow, Context, Result};
use archgraph::svg::{GraphColors, SvgScene, Theme};
use archgraph::{parse_report, Graph, GraphSettings};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter, Log, Metadata, Record};
use std::fs;
use std::path::{Path, PathBuf};

/// Lay out an architecture report as nested circles and write it as SVG.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Class tree of the report (JSON)
    #[arg(long)]
    nodes: PathBuf,

    /// Elementary dependencies of the report (JSON array)
    #[arg(long)]
    dependencies: PathBuf,

    /// Violation groups; all of them are shown
    #[arg(long)]
    violations: Option<PathBuf>,

    /// Graph settings (JSON); missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fold a node after loading (repeatable)
    #[arg(long = "fold", value_name = "NAME")]
    folds: Vec<String>,

    /// Fold every inner node
    #[arg(long)]
    fold_all: bool,

    /// Show only classes matching the pattern, e.g. `com.*.core|~*Test`
    #[arg(long, value_name = "PATTERN")]
    filter: Option<String>,

    /// Show only violations and the classes they connect
    #[arg(long)]
    only_violations: bool,

    /// Print the links between visible nodes as JSON instead of the SVG
    #[arg(long)]
    links: bool,

    #[arg(long, value_enum, default_value = "light")]
    theme: CliTheme,

    /// Write to a file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTheme {
    Light,
    Dark,
}

impl From<CliTheme> for Theme {
    fn from(theme: CliTheme) -> Self {
        match theme {
            CliTheme::Light => Theme::Light,
            CliTheme::Dark => Theme::Dark,
        }
    }
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    log::set_logger(&LOGGER).map_err(|e| anyhow!("cannot install logger: {}", e))?;
    log::set_max_level(level);
    Ok(())
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run(cli: Cli) -> Result<()> {
    let nodes = read_file(&cli.nodes)?;
    let dependencies = read_file(&cli.dependencies)?;
    let violations = cli.violations.as_deref().map(read_file).transpose()?;
    let report = parse_report(&nodes, &dependencies, violations.as_deref())
        .map_err(|e| anyhow!(e))
        .context("invalid report")?;

    let mut settings = match &cli.config {
        Some(path) => GraphSettings::from_json(&read_file(path)?)
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("invalid config {}", path.display()))?,
        None => GraphSettings::default(),
    };
    settings.initially_folded.extend(cli.folds.iter().cloned());
    settings.fold_all_initially |= cli.fold_all;

    let mut graph = Graph::new(report, settings, SvgScene::new()).map_err(|e| anyhow!(e))?;
    graph.show_all_violations().map_err(|e| anyhow!(e))?;
    if let Some(pattern) = &cli.filter {
        graph
            .set_name_filter(pattern)
            .map_err(|e| anyhow!(e))
            .with_context(|| format!("invalid filter '{}'", pattern))?;
    }
    if cli.only_violations {
        graph.set_only_violations(true).map_err(|e| anyhow!(e))?;
    }
    graph.run_until_settled();
    info!(
        "{} dependencies visible, root radius {:.1}",
        graph.visible_dependencies().len(),
        graph.tree().root().radius()
    );

    let output = if cli.links {
        serde_json::to_string_pretty(&graph.get_all_links()).context("failed to serialize links")?
    } else {
        graph.to_svg(&GraphColors::from_theme(cli.theme.into()), "Inter")
    };

    match &cli.output {
        Some(path) => fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", output),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    run(cli)
}
