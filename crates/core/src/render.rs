//! Two-stage rendering of analysis results.
//!
//! Grammar errors preempt everything downstream: the code stage and the AST
//! panes are only shown once the grammar is valid.

use peglint_diagnostics::{Diagnostic, Stage};
use serde::Serialize;

use crate::gateway::AnalysisResult;

/// Display state of one validation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "diagnostics", rename_all = "lowercase")]
pub enum StageState {
    /// Nothing to show: no badge, no list.
    #[default]
    Empty,
    /// Analysis passed.
    Valid,
    /// Analysis failed with these diagnostics, in analyzer order.
    Invalid(Vec<Diagnostic>),
}

impl StageState {
    /// Badge text for the stage header, if one is shown.
    pub fn badge(&self) -> Option<&'static str> {
        match self {
            StageState::Empty => None,
            StageState::Valid => Some("Valid"),
            StageState::Invalid(_) => Some("Invalid"),
        }
    }

    /// Diagnostics listed under the stage; empty unless `Invalid`.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            StageState::Invalid(diags) => diags,
            _ => &[],
        }
    }

    fn from_diagnostics(diags: &[Diagnostic]) -> Self {
        if diags.is_empty() {
            StageState::Valid
        } else {
            StageState::Invalid(diags.to_vec())
        }
    }
}

/// Everything the playground shows for one analysis cycle.
///
/// `RenderState::default()` is the cleared state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    /// Grammar stage.
    pub grammar: StageState,
    /// Code stage.
    pub code: StageState,
    /// AST pane contents.
    pub ast: String,
    /// Optimized AST pane contents.
    pub ast_optimized: String,
}

impl RenderState {
    /// State of the given stage.
    pub fn stage(&self, stage: Stage) -> &StageState {
        match stage {
            Stage::Grammar => &self.grammar,
            Stage::Code => &self.code,
        }
    }

    /// Whether both stages are `Empty` and the panes are clear.
    pub fn is_cleared(&self) -> bool {
        *self == RenderState::default()
    }
}

/// Turn an analysis outcome into display state.
///
/// `None` means the grammar was empty and no analysis ran.
pub fn render(result: Option<&AnalysisResult>) -> RenderState {
    let Some(result) = result else {
        return RenderState::default();
    };

    if !result.grammar_diagnostics.is_empty() {
        return RenderState {
            grammar: StageState::Invalid(result.grammar_diagnostics.clone()),
            ..RenderState::default()
        };
    }

    let code = StageState::from_diagnostics(&result.code_diagnostics);
    let (ast, ast_optimized) = if code == StageState::Valid {
        (result.ast.clone(), result.ast_optimized.clone())
    } else {
        (String::new(), String::new())
    };

    RenderState {
        grammar: StageState::Valid,
        code,
        ast,
        ast_optimized,
    }
}
