//! Synchronous boundary to the external analyzer.
//!
//! The analyzer validates a grammar, parses code with it, and returns one
//! serialized result. [`AnalysisGateway`] owns the call and the decoding of
//! that result into an [`AnalysisResult`].

use peglint_diagnostics::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Analyzer capability ─────────────────────────────────────────────────

/// The external lint capability: grammar text and code text in, serialized
/// result out.
///
/// Calls block the caller until the analyzer returns.
pub trait Analyzer {
    /// Analyze `grammar` and `code`, returning the raw serialized response.
    fn lint(&mut self, grammar: &str, code: &str) -> Result<String, AnalyzerError>;
}

impl<F> Analyzer for F
where
    F: FnMut(&str, &str) -> String,
{
    fn lint(&mut self, grammar: &str, code: &str) -> Result<String, AnalyzerError> {
        Ok(self(grammar, code))
    }
}

/// The analyzer could not produce a response at all.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AnalyzerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AnalyzerError {
    /// An error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// An error caused by `source`.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// ── Result model ────────────────────────────────────────────────────────

/// Decoded analyzer output.
///
/// `code_diagnostics`, `ast` and `ast_optimized` only mean something when
/// `grammar_diagnostics` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Grammar-level findings, in analyzer order.
    #[serde(rename = "grammar")]
    pub grammar_diagnostics: Vec<Diagnostic>,
    /// Code-level findings, in analyzer order.
    #[serde(rename = "code")]
    pub code_diagnostics: Vec<Diagnostic>,
    /// Rendered AST of the code.
    #[serde(default)]
    pub ast: String,
    /// Rendered AST after optimization.
    #[serde(default, rename = "astOptimized")]
    pub ast_optimized: String,
}

/// Why an analysis cycle produced no result.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The analyzer answered, but not with a decodable result.
    #[error("malformed analyzer response: {0}")]
    Protocol(#[source] serde_json::Error),

    /// The analyzer failed before answering.
    #[error("analyzer failed: {0}")]
    Analyzer(#[from] AnalyzerError),
}

impl AnalysisError {
    /// Returns `true` for [`AnalysisError::Protocol`].
    pub fn is_protocol(&self) -> bool {
        matches!(self, AnalysisError::Protocol(_))
    }
}

/// Decode a raw analyzer response.
pub fn decode_response(raw: &str) -> Result<AnalysisResult, AnalysisError> {
    serde_json::from_str(raw).map_err(AnalysisError::Protocol)
}

// ── Gateway ─────────────────────────────────────────────────────────────

/// Wraps a ready [`Analyzer`] and decodes its responses.
///
/// Construct it once the analyzer is available; the gateway never has to
/// wait for initialization.
#[derive(Debug)]
pub struct AnalysisGateway<A> {
    analyzer: A,
    invocations: u64,
}

impl<A: Analyzer> AnalysisGateway<A> {
    /// Wrap a ready analyzer.
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            invocations: 0,
        }
    }

    /// Run the analyzer and decode its response.
    pub fn analyze(&mut self, grammar: &str, code: &str) -> Result<AnalysisResult, AnalysisError> {
        self.invocations += 1;
        let raw = self.analyzer.lint(grammar, code)?;
        decode_response(&raw)
    }

    /// Number of times the analyzer has been called.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }
}

impl<A> AnalysisGateway<A> {
    /// Get a shared reference to the analyzer.
    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    /// Get a mutable reference to the analyzer.
    pub fn analyzer_mut(&mut self) -> &mut A {
        &mut self.analyzer
    }

    /// Unwrap the gateway, returning the analyzer.
    pub fn into_inner(self) -> A {
        self.analyzer
    }
}
