//! Terminal rendering of pipeline state using ariadne.
//!
//! Converts each stage's diagnostics into ariadne [`Report`]s anchored in the
//! grammar or code source. Falls back to structured JSON when the output is
//! piped or when the user explicitly requests it.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use peglint_core::{RenderState, StageState};
use peglint_diagnostics::{LineIndex, Stage};
use serde::Serialize;

// ── Output format ───────────────────────────────────────────────────────

/// Output format for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Resolve an explicit choice, or pick based on whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            // Default: pretty for interactive terminals, JSON for pipes
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

/// A named source the diagnostics of one stage point into.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SourceFile<'a> {
    pub(crate) name: &'a str,
    pub(crate) text: &'a str,
}

// ── Pretty rendering ────────────────────────────────────────────────────

fn badge_color(state: &StageState) -> Color {
    match state {
        StageState::Valid => Color::Green,
        StageState::Invalid(_) => Color::Red,
        StageState::Empty => Color::White,
    }
}

/// Render one stage's diagnostics with source context to stderr.
pub(crate) fn render_stage_pretty(stage: Stage, state: &StageState, source: SourceFile<'_>) {
    use ariadne::Fmt;

    if let Some(badge) = state.badge() {
        eprintln!("{stage}: {}", badge.fg(badge_color(state)));
    }

    let diagnostics = state.diagnostics();
    if diagnostics.is_empty() {
        return;
    }

    let config = Config::default().with_compact(false);
    let index = LineIndex::new(source.text);
    // Build the Source once and reuse across all reports.
    let mut cache = (source.name, Source::from(source.text));

    for diag in diagnostics {
        let span = diag.span_in(source.text, &index);
        let report = Report::build(ReportKind::Error, (source.name, span.clone()))
            .with_message(&diag.message)
            .with_config(config)
            .with_label(
                Label::new((source.name, span))
                    .with_message(format!("{stage} {}:{}", diag.line, diag.column))
                    .with_color(Color::Red),
            )
            .finish();
        if report.eprint(&mut cache).is_err() {
            // Terminal rendering failed; the plain list form still works.
            eprintln!("  {diag}");
        }
    }
}

/// Render the whole state: badges and diagnostics to stderr, AST panes to
/// stdout.
pub(crate) fn render_state_pretty(
    state: &RenderState,
    grammar: SourceFile<'_>,
    code: SourceFile<'_>,
) {
    if state.is_cleared() {
        eprintln!("grammar is empty; nothing to analyze");
        return;
    }

    render_stage_pretty(Stage::Grammar, &state.grammar, grammar);
    render_stage_pretty(Stage::Code, &state.code, code);

    if state.code == StageState::Valid {
        println!("── AST ──");
        print!("{}", with_trailing_newline(&state.ast));
        println!("── AST (optimized) ──");
        print!("{}", with_trailing_newline(&state.ast_optimized));
    }

    print_summary(state);
}

fn with_trailing_newline(s: &str) -> std::borrow::Cow<'_, str> {
    if s.is_empty() || s.ends_with('\n') {
        s.into()
    } else {
        format!("{s}\n").into()
    }
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured summary line with per-stage counts.
///
/// Example: `1 grammar error`
pub(crate) fn print_summary(state: &RenderState) {
    use ariadne::Fmt;

    let mut parts = Vec::new();
    for stage in Stage::ALL {
        let n = state.stage(stage).diagnostics().len();
        if n > 0 {
            let s = if n == 1 { "" } else { "s" };
            parts.push(format!("{}", format!("{n} {stage} error{s}").fg(Color::Red)));
        }
    }
    if !parts.is_empty() {
        eprintln!("{}", parts.join(", "));
    }
}

// ── JSON rendering ──────────────────────────────────────────────────────

/// One rendered cycle, as printed in JSON mode.
#[derive(Debug, Serialize)]
pub(crate) struct CycleReport<'a> {
    pub(crate) cycle: u64,
    pub(crate) outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
    pub(crate) state: &'a RenderState,
}

/// Print one cycle report as a single JSON line to stdout.
pub(crate) fn render_cycle_json(report: &CycleReport<'_>) {
    let json = serde_json::to_string(report).expect("CycleReport serialization cannot fail");
    println!("{json}");
}

/// Whether any stage shows diagnostics.
pub(crate) fn has_errors(state: &RenderState) -> bool {
    Stage::ALL
        .iter()
        .any(|s| !state.stage(*s).diagnostics().is_empty())
}

