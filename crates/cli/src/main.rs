mod analyzer;
mod render;
mod store;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use peglint_core::{
    AnalysisGateway, CycleOutcome, Instant, KeyValueStore, MemoryStore, PipelineConfig,
    PipelineController, load_config_from_str,
};
use peglint_diagnostics::Stage;
use tracing::{debug, info, warn};

use crate::analyzer::CommandAnalyzer;
use crate::render::{CycleReport, Format, SourceFile, has_errors, render_cycle_json};
use crate::store::JsonFileStore;

/// Reported diagnostics.
const EXIT_DIAGNOSTICS: u8 = 1;
/// The analyzer could not be run or its response could not be decoded.
const EXIT_ANALYZER: u8 = 2;

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "peglint",
    version,
    about = "Lint a PEG grammar and a sample input with an external analyzer"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Log pipeline activity at debug level (overridden by `PEGLINT_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run one analysis of a grammar file against a code file.
    Lint {
        grammar: PathBuf,
        code: PathBuf,
        #[command(flatten)]
        analyzer: AnalyzerArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Re-analyze whenever either file changes, after the debounce window.
    Watch {
        grammar: PathBuf,
        code: PathBuf,
        #[command(flatten)]
        analyzer: AnalyzerArgs,
        #[command(flatten)]
        config: ConfigArgs,
        /// JSON file the buffer texts are persisted to and restored from.
        #[arg(long)]
        state: Option<PathBuf>,
        /// How often to check the files for changes, in milliseconds.
        #[arg(long, default_value_t = 100)]
        poll_ms: u64,
        /// Stop after this many analysis cycles (the startup cycle counts).
        #[arg(long, conflicts_with = "once")]
        cycles: Option<u64>,
        /// Run the startup cycle only.
        #[arg(long)]
        once: bool,
    },
}

#[derive(Args, Debug)]
struct AnalyzerArgs {
    /// Program that reads `{"grammar","code"}` on stdin and prints the
    /// analysis response.
    #[arg(long)]
    analyzer: String,
    /// Extra argument for the analyzer program (repeatable).
    #[arg(long = "analyzer-arg", allow_hyphen_values = true)]
    analyzer_args: Vec<String>,
}

impl AnalyzerArgs {
    fn build(self) -> CommandAnalyzer {
        CommandAnalyzer::new(self.analyzer, self.analyzer_args)
    }
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Pipeline config JSON: `{"debounceMs", "grammarKey", "codeKey"}`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the debounce window, in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    debounce_ms: Option<u64>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config '{}'", path.display()))?;
                load_config_from_str(&text)
                    .with_context(|| format!("invalid config '{}'", path.display()))?
            }
            None => PipelineConfig::default(),
        };
        if let Some(ms) = self.debounce_ms {
            config = config.with_debounce(Duration::from_millis(ms));
        }
        Ok(config)
    }
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Lint {
            grammar,
            code,
            analyzer,
            config,
        } => cmd_lint(&grammar, &code, analyzer, &config, format),
        Cmd::Watch {
            grammar,
            code,
            analyzer,
            config,
            state,
            poll_ms,
            cycles,
            once,
        } => {
            let opts = WatchOptions {
                poll: Duration::from_millis(poll_ms.max(1)),
                max_cycles: if once { Some(1) } else { cycles },
            };
            cmd_watch(&grammar, &code, analyzer, &config, state.as_deref(), &opts, format)
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("PEGLINT_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("peglint=debug")
        } else {
            EnvFilter::new("peglint=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_lint(
    grammar_path: &Path,
    code_path: &Path,
    analyzer: AnalyzerArgs,
    config: &ConfigArgs,
    format: Format,
) -> Result<ExitCode> {
    let config = config.resolve()?;
    let grammar = read_source(grammar_path)?;
    let code = read_source(code_path)?;

    let store = MemoryStore::with_entries([
        (config.keys.grammar.clone(), grammar),
        (config.keys.code.clone(), code),
    ]);
    let mut controller =
        PipelineController::new(AnalysisGateway::new(analyzer.build()), store, config);
    let outcome = controller.start();

    let names = SourceNames::new(grammar_path, code_path);
    emit_cycle(&controller, &outcome, &names, format);

    Ok(match outcome {
        CycleOutcome::Failed(_) => ExitCode::from(EXIT_ANALYZER),
        _ if has_errors(controller.rendered()) => ExitCode::from(EXIT_DIAGNOSTICS),
        _ => ExitCode::SUCCESS,
    })
}

struct WatchOptions {
    poll: Duration,
    max_cycles: Option<u64>,
}

fn cmd_watch(
    grammar_path: &Path,
    code_path: &Path,
    analyzer: AnalyzerArgs,
    config: &ConfigArgs,
    state: Option<&Path>,
    opts: &WatchOptions,
    format: Format,
) -> Result<ExitCode> {
    let config = config.resolve()?;
    let files = WatchedFiles {
        grammar: grammar_path,
        code: code_path,
    };
    match state {
        Some(path) => {
            let store = JsonFileStore::open(path)?;
            run_watch(store, &files, analyzer, config, opts, format)
        }
        None => run_watch(MemoryStore::new(), &files, analyzer, config, opts, format),
    }
}

struct WatchedFiles<'a> {
    grammar: &'a Path,
    code: &'a Path,
}

impl WatchedFiles<'_> {
    fn path(&self, stage: Stage) -> &Path {
        match stage {
            Stage::Grammar => self.grammar,
            Stage::Code => self.code,
        }
    }
}

fn run_watch<S: KeyValueStore>(
    mut store: S,
    files: &WatchedFiles<'_>,
    analyzer: AnalyzerArgs,
    config: PipelineConfig,
    opts: &WatchOptions,
    format: Format,
) -> Result<ExitCode> {
    // Files on disk win over persisted text; a missing file is recreated from it.
    for stage in Stage::ALL {
        let key = match stage {
            Stage::Grammar => &config.keys.grammar,
            Stage::Code => &config.keys.code,
        };
        let path = files.path(stage);
        if path.exists() {
            let text = read_source(path)?;
            if let Err(err) = store.set(key, &text) {
                warn!(%stage, error = %err, "failed to persist buffer");
            }
        } else {
            let text = store.get(key).unwrap_or_default();
            fs::write(path, &text)
                .with_context(|| format!("failed to restore '{}'", path.display()))?;
            info!(%stage, path = %path.display(), "restored from saved state");
        }
    }

    let names = SourceNames::new(files.grammar, files.code);
    let mut controller =
        PipelineController::new(AnalysisGateway::new(analyzer.build()), store, config);
    let outcome = controller.start();
    emit_cycle(&controller, &outcome, &names, format);

    while opts.max_cycles.is_none_or(|max| controller.cycles() < max) {
        for stage in Stage::ALL {
            let path = files.path(stage);
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(err) => {
                    debug!(%stage, error = %err, "skipping unreadable file");
                    continue;
                }
            };
            if text != controller.buffer(stage).text() {
                controller.edit(stage, text, Instant::now());
            }
        }

        if let Some(outcome) = controller.poll(Instant::now()) {
            emit_cycle(&controller, &outcome, &names, format);
            continue;
        }

        let wait = controller
            .time_until_due(Instant::now())
            .map_or(opts.poll, |due| due.min(opts.poll));
        thread::sleep(wait);
    }

    Ok(ExitCode::SUCCESS)
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}

struct SourceNames {
    grammar: String,
    code: String,
}

impl SourceNames {
    fn new(grammar: &Path, code: &Path) -> Self {
        Self {
            grammar: grammar.display().to_string(),
            code: code.display().to_string(),
        }
    }
}

/// Print the controller's current render in the requested format.
fn emit_cycle<A, S>(
    controller: &PipelineController<A, S>,
    outcome: &CycleOutcome,
    names: &SourceNames,
    format: Format,
) {
    let state = controller.rendered();
    match format {
        Format::Json => {
            let (label, error) = match outcome {
                CycleOutcome::Empty => ("empty", None),
                CycleOutcome::Rendered => ("rendered", None),
                CycleOutcome::Failed(err) => ("failed", Some(err.to_string())),
            };
            render_cycle_json(&CycleReport {
                cycle: controller.cycles(),
                outcome: label,
                error,
                state,
            });
        }
        Format::Pretty => {
            if let CycleOutcome::Failed(err) = outcome {
                eprintln!("error: {err}");
                return;
            }
            render::render_state_pretty(
                state,
                SourceFile {
                    name: &names.grammar,
                    text: controller.buffer(Stage::Grammar).text(),
                },
                SourceFile {
                    name: &names.code,
                    text: controller.buffer(Stage::Code).text(),
                },
            );
        }
    }
}
