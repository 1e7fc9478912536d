//! Shared test helpers for `peglint_core` integration tests.

#![allow(unreachable_pub)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use peglint_core::{
    AnalysisGateway, Analyzer, AnalyzerError, Instant, MemoryStore, PipelineConfig,
    PipelineController,
};

/// A valid/valid analyzer response.
pub const VALID: &str = r#"{
  "grammar": [],
  "code": [],
  "ast": "+ Additive\n  + Multitive\n    - Number (1)\n",
  "astOptimized": "- Additive/Multitive/Number (1)\n"
}"#;

/// A response with a grammar error and (ignored) code errors.
pub const GRAMMAR_INVALID: &str = r#"{
  "grammar": [{ "ln": 1, "col": 10, "msg": "'Multitive' is not defined." }],
  "code": [{ "ln": 1, "col": 1, "msg": "syntax error" }],
  "ast": "",
  "astOptimized": ""
}"#;

/// A response with a code error.
pub const CODE_INVALID: &str = r#"{
  "grammar": [],
  "code": [{ "ln": 2, "col": 3, "msg": "syntax error, unexpected '+'." }],
  "ast": "",
  "astOptimized": ""
}"#;

/// Analyzer that records its inputs and answers with a swappable response.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnalyzer {
    calls: Rc<RefCell<Vec<(String, String)>>>,
    response: Rc<RefCell<String>>,
}

#[allow(dead_code)]
impl ScriptedAnalyzer {
    pub fn answering(response: &str) -> Self {
        let a = Self::default();
        a.respond_with(response);
        a
    }

    pub fn respond_with(&self, response: &str) {
        *self.response.borrow_mut() = response.to_owned();
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.borrow().clone()
    }
}

impl Analyzer for ScriptedAnalyzer {
    fn lint(&mut self, grammar: &str, code: &str) -> Result<String, AnalyzerError> {
        self.calls
            .borrow_mut()
            .push((grammar.to_owned(), code.to_owned()));
        Ok(self.response.borrow().clone())
    }
}

#[allow(dead_code)]
pub type Controller = PipelineController<ScriptedAnalyzer, MemoryStore>;

/// Controller over a [`ScriptedAnalyzer`] handle the test keeps a clone of.
#[allow(dead_code)]
pub fn controller_with(analyzer: &ScriptedAnalyzer, store: MemoryStore) -> Controller {
    PipelineController::new(
        AnalysisGateway::new(analyzer.clone()),
        store,
        PipelineConfig::default(),
    )
}

/// `ms` milliseconds after `t0`.
#[allow(dead_code)]
pub fn at(t0: Instant, ms: u64) -> Instant {
    t0 + Duration::from_millis(ms)
}
