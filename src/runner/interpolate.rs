//! Rendering of recipe body lines
//!
//! Literal text is copied through; every `{{ ... }}` interpolation is replaced
//! by the value of its expression in the recipe's scope.

use crate::config::{Fragment, Line};
use crate::error::ResolveResult;
use crate::runner::{Evaluator, Scope};

/// Render a body line to the command text handed to the shell
pub fn render_line(
    line: &Line,
    evaluator: &mut Evaluator<'_>,
    scope: &Scope<'_>,
) -> ResolveResult<String> {
    let mut text = String::new();
    for fragment in &line.fragments {
        match fragment {
            Fragment::Text(literal) => text.push_str(literal),
            Fragment::Interpolation(expression) => {
                text.push_str(&evaluator.evaluate(expression, Some(scope))?);
            }
        }
    }
    Ok(text)
}
