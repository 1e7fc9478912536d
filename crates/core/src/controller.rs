//! The lint pipeline state machine.
//!
//! ```text
//! Idle/Rendered --edit--> Pending --deadline--> Analyzing --> Rendered
//! ```
//!
//! Analysis runs synchronously inside [`PipelineController::run_cycle`], so a
//! new cycle can never start while another is in progress and results are
//! applied in the order analyses were invoked.

use peglint_diagnostics::{Diagnostic, Position, Stage, resolve_target};
use serde::Serialize;
use tracing::{debug, info, warn};
use web_time::Instant;

use crate::buffer::{Snapshot, SourceBuffer};
use crate::config::{PipelineConfig, StorageKeys};
use crate::debounce::Debouncer;
use crate::gateway::{AnalysisError, AnalysisGateway, Analyzer};
use crate::render::{RenderState, render};
use crate::store::KeyValueStore;

/// Where the controller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// Nothing has run yet.
    Idle,
    /// An edit armed the debouncer.
    Pending,
    /// The analyzer is being called.
    Analyzing,
    /// The last cycle finished (successfully or not).
    Rendered,
}

/// How an analysis cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Grammar text was empty; everything was cleared without analysis.
    Empty,
    /// A new result was rendered.
    Rendered,
    /// Analysis failed; the previous render was kept.
    Failed(AnalysisError),
}

impl CycleOutcome {
    /// Whether the displayed state was replaced.
    pub fn replaced_render(&self) -> bool {
        !matches!(self, CycleOutcome::Failed(_))
    }
}

/// Cursor move produced by activating a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    /// Buffer to move the cursor in.
    pub stage: Stage,
    /// 0-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
}

impl NavigationTarget {
    /// The target as a buffer position.
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// What the debouncer carries: the edit that armed it.
#[derive(Debug, Clone, Copy)]
struct Trigger {
    stage: Stage,
    version: u64,
}

/// Mediates between live edits and the synchronous analyzer.
#[derive(Debug)]
pub struct PipelineController<A, S> {
    gateway: AnalysisGateway<A>,
    store: S,
    keys: StorageKeys,
    grammar: SourceBuffer,
    code: SourceBuffer,
    debouncer: Debouncer<Trigger>,
    state: PipelineState,
    rendered: RenderState,
    cycles: u64,
}

impl<A: Analyzer, S: KeyValueStore> PipelineController<A, S> {
    /// Create a controller and restore both buffers from `store`.
    ///
    /// Missing keys restore as empty text. Nothing is analyzed until
    /// [`PipelineController::start`].
    pub fn new(gateway: AnalysisGateway<A>, store: S, config: PipelineConfig) -> Self {
        let mut grammar = SourceBuffer::new(Stage::Grammar);
        let mut code = SourceBuffer::new(Stage::Code);
        grammar.load(store.get(&config.keys.grammar).unwrap_or_default());
        code.load(store.get(&config.keys.code).unwrap_or_default());

        Self {
            gateway,
            store,
            keys: config.keys,
            grammar,
            code,
            debouncer: Debouncer::new(config.debounce),
            state: PipelineState::Idle,
            rendered: RenderState::default(),
            cycles: 0,
        }
    }

    /// Run the startup cycle with whatever text was restored.
    pub fn start(&mut self) -> CycleOutcome {
        info!(
            grammar_bytes = self.grammar.text().len(),
            code_bytes = self.code.text().len(),
            "starting lint pipeline"
        );
        self.run_cycle()
    }

    /// Record an edit to one buffer and re-arm the debouncer.
    ///
    /// Returns the buffer's new version.
    pub fn edit(&mut self, stage: Stage, text: impl Into<String>, now: Instant) -> u64 {
        let version = self.buffer_mut(stage).edit(text);
        let replaced = self.debouncer.schedule(Trigger { stage, version }, now);
        debug!(%stage, version, replaced, "analysis scheduled");
        self.state = PipelineState::Pending;
        version
    }

    /// Run a cycle if the debounced trigger is due.
    pub fn poll(&mut self, now: Instant) -> Option<CycleOutcome> {
        let trigger = self.debouncer.take_due(now)?;
        debug!(stage = %trigger.stage, version = trigger.version, "debounce elapsed");
        Some(self.run_cycle())
    }

    /// Time until the armed trigger is due, if one is armed.
    pub fn time_until_due(&self, now: Instant) -> Option<std::time::Duration> {
        self.debouncer.time_until_due(now)
    }

    /// Snapshot, persist, analyze and render, right now.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        self.state = PipelineState::Analyzing;
        self.cycles += 1;
        let snapshot = Snapshot::capture(&self.grammar, &self.code);
        self.persist(&snapshot);

        let outcome = if snapshot.grammar.is_empty() {
            self.rendered = render(None);
            CycleOutcome::Empty
        } else {
            match self.gateway.analyze(&snapshot.grammar, &snapshot.code) {
                Ok(result) => {
                    self.rendered = render(Some(&result));
                    CycleOutcome::Rendered
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        grammar_version = snapshot.grammar_version,
                        code_version = snapshot.code_version,
                        "analysis failed; keeping previous result"
                    );
                    CycleOutcome::Failed(err)
                }
            }
        };

        self.state = if self.debouncer.is_pending() {
            PipelineState::Pending
        } else {
            PipelineState::Rendered
        };
        debug!(
            cycle = self.cycles,
            grammar = ?self.rendered.grammar.badge(),
            code = ?self.rendered.code.badge(),
            "cycle finished"
        );
        outcome
    }

    fn persist(&mut self, snapshot: &Snapshot) {
        for (key, text) in [
            (&self.keys.grammar, &snapshot.grammar),
            (&self.keys.code, &snapshot.code),
        ] {
            if let Err(err) = self.store.set(key, text) {
                warn!(%key, error = %err, "failed to persist buffer");
            }
        }
    }

    /// Move the cursor of the buffer `diagnostic` belongs to and focus it.
    pub fn on_diagnostic_activated(
        &mut self,
        stage: Stage,
        diagnostic: &Diagnostic,
    ) -> NavigationTarget {
        let position = resolve_target(diagnostic);
        let other = match stage {
            Stage::Grammar => Stage::Code,
            Stage::Code => Stage::Grammar,
        };
        self.buffer_mut(other).blur();
        let buffer = self.buffer_mut(stage);
        buffer.navigate_to(position);
        buffer.focus();
        NavigationTarget {
            stage,
            line: position.line,
            column: position.column,
        }
    }

    /// Activate the `index`-th rendered diagnostic of `stage`.
    ///
    /// Returns `None` if no such diagnostic is currently displayed.
    pub fn activate(&mut self, stage: Stage, index: usize) -> Option<NavigationTarget> {
        let diagnostic = self.rendered.stage(stage).diagnostics().get(index)?.clone();
        Some(self.on_diagnostic_activated(stage, &diagnostic))
    }
}

impl<A, S> PipelineController<A, S> {
    /// Current display state.
    pub fn rendered(&self) -> &RenderState {
        &self.rendered
    }

    /// Current state-machine state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Number of cycles run, including empty and failed ones.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// One of the two buffers.
    pub fn buffer(&self, stage: Stage) -> &SourceBuffer {
        match stage {
            Stage::Grammar => &self.grammar,
            Stage::Code => &self.code,
        }
    }

    fn buffer_mut(&mut self, stage: Stage) -> &mut SourceBuffer {
        match stage {
            Stage::Grammar => &mut self.grammar,
            Stage::Code => &mut self.code,
        }
    }

    /// The analysis gateway.
    pub fn gateway(&self) -> &AnalysisGateway<A> {
        &self.gateway
    }

    /// The persistence store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
