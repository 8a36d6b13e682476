//! Variable resolution
//!
//! Variables are evaluated lazily and memoized. A stack of the variables
//! currently being evaluated detects cycles before they can recurse.

use crate::config::{Assignment, Expression, Settings};
use crate::error::{ResolveError, ResolveResult};
use crate::runner::function::{self, FunctionContext};
use crate::runner::{Context, Environment};
use indexmap::IndexMap;
use tracing::debug;

/// Recipe-local names visible while rendering a recipe
pub struct Scope<'s> {
    /// Name of the recipe, positional argument `0`
    pub recipe: &'s str,

    /// Bound parameter values
    pub parameters: &'s IndexMap<String, String>,

    /// Positional arguments, starting at `1`
    pub positional: &'s [String],
}

/// Result of resolving every variable of a recipe file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Variable values in definition order
    pub variables: IndexMap<String, String>,

    /// Values passed to subprocesses on top of the inherited environment
    pub exports: Environment,
}

/// Memoizing resolver for variable assignments
pub struct Evaluator<'a> {
    assignments: &'a IndexMap<String, Assignment>,
    context: &'a Context,
    export_all: bool,
    environment: Environment,
    exports: Environment,
    values: IndexMap<String, String>,
    stack: Vec<String>,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator. `dotenv` pairs are exported and visible to `env()`
    /// but never override the ambient environment.
    pub fn new(
        assignments: &'a IndexMap<String, Assignment>,
        settings: &Settings,
        context: &'a Context,
        dotenv: Environment,
    ) -> Self {
        let mut environment = context.environment.clone();
        let mut exports = Environment::new();
        for (key, value) in dotenv {
            if !environment.contains_key(&key) {
                environment.insert(key.clone(), value.clone());
                exports.insert(key, value);
            }
        }

        Evaluator {
            assignments,
            context,
            export_all: settings.export,
            environment,
            exports,
            values: IndexMap::new(),
            stack: Vec::new(),
        }
    }

    /// Resolve every variable in definition order, exporting as configured
    pub fn resolve_all(&mut self) -> ResolveResult<()> {
        for (name, assignment) in self.assignments {
            let value = self.resolve(name)?;
            if self.export_all || assignment.export {
                self.environment.insert(name.clone(), value.clone());
                self.exports.insert(name.clone(), value);
            }
        }
        debug!(
            variables = self.values.len(),
            exports = self.exports.len(),
            "resolved variables"
        );
        Ok(())
    }

    /// Resolve a single variable
    pub fn resolve(&mut self, name: &str) -> ResolveResult<String> {
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }

        if let Some(position) = self.stack.iter().position(|entry| entry == name) {
            let mut cycle = self.stack[position..].to_vec();
            cycle.push(name.to_string());
            return Err(ResolveError::CyclicReference(cycle.join(" -> ")));
        }

        let assignments = self.assignments;
        let assignment = assignments
            .get(name)
            .ok_or_else(|| ResolveError::UnresolvedReference(name.to_string()))?;

        self.stack.push(name.to_string());
        let result = self.evaluate(&assignment.expression, None);
        self.stack.pop();

        let value = result?;
        self.values.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Evaluate an expression, optionally inside a recipe scope
    pub fn evaluate(
        &mut self,
        expression: &Expression,
        scope: Option<&Scope<'_>>,
    ) -> ResolveResult<String> {
        match expression {
            Expression::StringLiteral(value) => Ok(value.clone()),
            Expression::Variable(name) => {
                if let Some(value) = scope.and_then(|s| s.parameters.get(name)) {
                    return Ok(value.clone());
                }
                self.resolve(name)
            }
            Expression::Positional(index) => {
                let scope = scope.ok_or(ResolveError::PositionalOutsideRecipe(*index))?;
                match *index {
                    0 => Ok(scope.recipe.to_string()),
                    i => scope.positional.get(i - 1).cloned().ok_or(
                        ResolveError::PositionalOutOfRange {
                            index: i,
                            count: scope.positional.len(),
                        },
                    ),
                }
            }
            Expression::Call { name, arguments } => {
                let function = function::lookup(name)
                    .ok_or_else(|| ResolveError::UnknownFunction(name.clone()))?;
                let values = arguments
                    .iter()
                    .map(|argument| self.evaluate(argument, scope))
                    .collect::<ResolveResult<Vec<String>>>()?;
                let ctx = FunctionContext {
                    context: self.context,
                    environment: &self.environment,
                };
                function.call(&ctx, &values)
            }
            Expression::Concatenation(lhs, rhs) => {
                let mut value = self.evaluate(lhs, scope)?;
                value.push_str(&self.evaluate(rhs, scope)?);
                Ok(value)
            }
        }
    }

    /// Values exported to subprocesses so far
    pub fn exports(&self) -> &Environment {
        &self.exports
    }

    /// Finish resolution, ordering values by definition
    pub fn into_resolved(self) -> Resolved {
        let variables = self
            .assignments
            .keys()
            .filter_map(|name| {
                self.values
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect();
        Resolved {
            variables,
            exports: self.exports,
        }
    }
}
