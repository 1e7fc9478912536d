//! WASM bindings for peglint.
//!
//! Exposes the lint pipeline to a browser playground via `wasm-bindgen`. The
//! page supplies the analyzer (usually the grammar engine compiled to JS) and
//! a `Storage` such as `window.localStorage`; the pipeline owns debouncing,
//! rendering and diagnostic navigation. Results are returned as native JS
//! objects using `serde-wasm-bindgen`.

use std::time::Duration;

use peglint_core::{
    AnalysisGateway, Analyzer, AnalyzerError, CycleOutcome, Instant, KeyValueStore,
    PipelineConfig, PipelineController, Stage, StoreError, decode_response, render,
};
use wasm_bindgen::prelude::*;

// ── Host imports ────────────────────────────────────────────────────────

#[wasm_bindgen]
extern "C" {
    /// `{ lint(grammar: string, code: string): string }`
    #[wasm_bindgen(typescript_type = "{ lint(grammar: string, code: string): string }")]
    pub type JsAnalyzer;

    #[wasm_bindgen(method, catch)]
    fn lint(this: &JsAnalyzer, grammar: &str, code: &str) -> Result<String, JsValue>;

    /// The subset of the Web Storage API the playground uses.
    #[wasm_bindgen(typescript_type = "Pick<Storage, 'getItem' | 'setItem'>")]
    pub type JsStorage;

    #[wasm_bindgen(method, js_name = getItem)]
    fn get_item(this: &JsStorage, key: &str) -> Option<String>;

    #[wasm_bindgen(method, catch, js_name = setItem)]
    fn set_item(this: &JsStorage, key: &str, value: &str) -> Result<(), JsValue>;
}

struct HostAnalyzer(JsAnalyzer);

impl Analyzer for HostAnalyzer {
    fn lint(&mut self, grammar: &str, code: &str) -> Result<String, AnalyzerError> {
        self.0
            .lint(grammar, code)
            .map_err(|e| AnalyzerError::new(describe(&e)))
    }
}

struct HostStorage(JsStorage);

impl KeyValueStore for HostStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get_item(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        // Quota errors land here.
        self.0
            .set_item(key, value)
            .map_err(|e| StoreError::Rejected {
                key: key.to_owned(),
                reason: describe(&e),
            })
    }
}

// ── Public API ──────────────────────────────────────────────────────────

/// The grammar/code lint pipeline behind a playground page.
///
/// The page forwards editor changes to `editGrammar`/`editCode`, calls
/// `tick()` from a timer scheduled with `msUntilDue()`, and redraws from
/// `state()` whenever `tick()` returns `true`.
#[wasm_bindgen]
pub struct Playground {
    inner: PipelineController<HostAnalyzer, HostStorage>,
}

#[wasm_bindgen]
impl Playground {
    /// Restore both buffers from `storage`. `debounceMs` defaults to 750.
    #[wasm_bindgen(constructor)]
    pub fn new(
        analyzer: JsAnalyzer,
        storage: JsStorage,
        debounce_ms: Option<u32>,
    ) -> Result<Playground, JsError> {
        let mut config = PipelineConfig::default();
        if let Some(ms) = debounce_ms {
            if ms == 0 {
                return Err(JsError::new("debounceMs must be greater than zero"));
            }
            config = config.with_debounce(Duration::from_millis(u64::from(ms)));
        }
        let inner = PipelineController::new(
            AnalysisGateway::new(HostAnalyzer(analyzer)),
            HostStorage(storage),
            config,
        );
        Ok(Playground { inner })
    }

    /// Run the startup analysis. Throws if the analyzer fails; the cleared
    /// state stays in place.
    pub fn start(&mut self) -> Result<(), JsError> {
        let outcome = self.inner.start();
        check(&outcome)
    }

    /// Restored or last edited grammar text, for seeding the editor.
    #[wasm_bindgen(js_name = "grammarText")]
    pub fn grammar_text(&self) -> String {
        self.inner.buffer(Stage::Grammar).text().to_owned()
    }

    /// Restored or last edited code text, for seeding the editor.
    #[wasm_bindgen(js_name = "codeText")]
    pub fn code_text(&self) -> String {
        self.inner.buffer(Stage::Code).text().to_owned()
    }

    /// Record a grammar edit and restart the debounce window.
    #[wasm_bindgen(js_name = "editGrammar")]
    pub fn edit_grammar(&mut self, text: String) {
        self.inner.edit(Stage::Grammar, text, Instant::now());
    }

    /// Record a code edit and restart the debounce window.
    #[wasm_bindgen(js_name = "editCode")]
    pub fn edit_code(&mut self, text: String) {
        self.inner.edit(Stage::Code, text, Instant::now());
    }

    /// Run the pending analysis if its window has elapsed.
    ///
    /// Returns `true` when a cycle ran and `state()` changed. Throws if the
    /// analyzer fails; the previous state stays displayed.
    pub fn tick(&mut self) -> Result<bool, JsError> {
        match self.inner.poll(Instant::now()) {
            Some(outcome) => check(&outcome).map(|()| true),
            None => Ok(false),
        }
    }

    /// Milliseconds until `tick()` has work, or `undefined` if nothing is
    /// pending.
    #[wasm_bindgen(js_name = "msUntilDue")]
    pub fn ms_until_due(&self) -> Option<f64> {
        self.inner
            .time_until_due(Instant::now())
            .map(|d| d.as_secs_f64() * 1000.0)
    }

    /// `{ grammar, code, ast, astOptimized }` as currently displayed.
    pub fn state(&self) -> Result<JsValue, JsError> {
        to_js(self.inner.rendered())
    }

    /// Activate the `index`-th diagnostic of `stage` (`"grammar"` or
    /// `"code"`).
    ///
    /// Returns `{ stage, line, column }` (0-based) for the editor's
    /// `navigateTo`, or `undefined` if no such diagnostic is displayed.
    pub fn activate(&mut self, stage: &str, index: usize) -> Result<JsValue, JsError> {
        let stage: Stage = stage.parse().map_err(|e: String| JsError::new(&e))?;
        to_js(&self.inner.activate(stage, index))
    }

    /// Number of analysis cycles run so far.
    pub fn cycles(&self) -> f64 {
        self.inner.cycles() as f64
    }
}

/// Render a raw analyzer response without a pipeline.
///
/// Returns `{ grammar, code, ast, astOptimized }`.
#[wasm_bindgen(js_name = "renderResponse")]
pub fn render_response(raw: &str) -> Result<JsValue, JsError> {
    let result = decode_response(raw).map_err(|e| JsError::new(&e.to_string()))?;
    to_js(&render(Some(&result)))
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn check(outcome: &CycleOutcome) -> Result<(), JsError> {
    match outcome {
        CycleOutcome::Failed(err) => Err(JsError::new(&err.to_string())),
        _ => Ok(()),
    }
}

fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsError::new(&e.to_string()))
}
