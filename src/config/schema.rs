//! Recipe file validation
//!
//! Static checks run after parsing and before anything is resolved or
//! executed: the dependency graph, parameter lists, and every name and
//! function referenced by an expression.

use crate::config::types::{Expression, Fragment, Justfile, ParameterKind, Recipe};
use crate::error::{RecipeError, RecipeResult, ResolveError, ResolveResult, RjustError};
use crate::runner::function;
use std::collections::HashSet;

/// Validate a complete recipe file
pub fn validate_justfile(justfile: &Justfile) -> Result<(), RjustError> {
    for recipe in justfile.recipes.values() {
        validate_recipe(justfile, recipe)?;
    }

    detect_circular_dependencies(justfile)?;

    for assignment in justfile.assignments.values() {
        let is_variable = |name: &str| justfile.assignments.contains_key(name);
        validate_expression(&assignment.expression, &is_variable, false)?;
    }

    for recipe in justfile.recipes.values() {
        validate_recipe_expressions(justfile, recipe)?;
    }

    Ok(())
}

/// Validate a single recipe's shape and dependencies
pub fn validate_recipe(justfile: &Justfile, recipe: &Recipe) -> RecipeResult<()> {
    if recipe.body.is_empty() {
        return Err(RecipeError::Empty(recipe.name.clone()));
    }

    validate_parameters(recipe)?;

    for dependency in &recipe.dependencies {
        let target = justfile
            .recipe(dependency)
            .ok_or_else(|| RecipeError::UnknownDependency {
                recipe: recipe.name.clone(),
                dependency: dependency.clone(),
            })?;

        if target.min_arguments() > 0 {
            return Err(RecipeError::DependencyArguments {
                recipe: recipe.name.clone(),
                dependency: dependency.clone(),
            });
        }
    }

    Ok(())
}

/// Check parameter names and ordering
fn validate_parameters(recipe: &Recipe) -> RecipeResult<()> {
    let mut seen = HashSet::new();
    let mut defaulted = false;

    for (index, parameter) in recipe.parameters.iter().enumerate() {
        if !seen.insert(parameter.name.as_str()) {
            return Err(RecipeError::DuplicateParameter {
                recipe: recipe.name.clone(),
                parameter: parameter.name.clone(),
            });
        }

        let order_error = |message: &str| RecipeError::ParameterOrder {
            recipe: recipe.name.clone(),
            parameter: parameter.name.clone(),
            message: message.to_string(),
        };

        if parameter.kind.is_variadic() && index + 1 != recipe.parameters.len() {
            return Err(order_error("is variadic and must be the last parameter"));
        }

        if parameter.default.is_some() {
            defaulted = true;
        } else if defaulted && parameter.kind == ParameterKind::Singular {
            return Err(order_error("has no default but follows a parameter with one"));
        }
    }

    Ok(())
}

/// Detect cycles in the dependency graph
fn detect_circular_dependencies(justfile: &Justfile) -> RecipeResult<()> {
    let mut visited = HashSet::new();
    for name in justfile.recipes.keys() {
        let mut stack = Vec::new();
        check_recipe_cycle(justfile, name, &mut visited, &mut stack)?;
    }
    Ok(())
}

/// Recursively check for cycles below one recipe
fn check_recipe_cycle<'j>(
    justfile: &'j Justfile,
    name: &'j str,
    visited: &mut HashSet<&'j str>,
    stack: &mut Vec<&'j str>,
) -> RecipeResult<()> {
    if stack.contains(&name) {
        stack.push(name);
        return Err(RecipeError::CircularDependency(stack.join(" -> ")));
    }

    if visited.contains(name) {
        return Ok(());
    }

    let recipe = justfile
        .recipe(name)
        .ok_or_else(|| RecipeError::NotFound(name.to_string()))?;

    stack.push(name);
    for dependency in &recipe.dependencies {
        check_recipe_cycle(justfile, dependency, visited, stack)?;
    }
    stack.pop();
    visited.insert(name);

    Ok(())
}

/// Check names referenced by parameter defaults and body lines
fn validate_recipe_expressions(justfile: &Justfile, recipe: &Recipe) -> ResolveResult<()> {
    let is_variable = |name: &str| justfile.assignments.contains_key(name);

    for (index, parameter) in recipe.parameters.iter().enumerate() {
        if let Some(default) = &parameter.default {
            let earlier = &recipe.parameters[..index];
            validate_expression(
                default,
                &|name: &str| is_variable(name) || earlier.iter().any(|p| p.name == name),
                true,
            )?;
        }
    }

    for line in &recipe.body {
        for fragment in &line.fragments {
            if let Fragment::Interpolation(expression) = fragment {
                validate_expression(
                    expression,
                    &|name: &str| {
                        is_variable(name) || recipe.parameters.iter().any(|p| p.name == name)
                    },
                    true,
                )?;
            }
        }
    }

    Ok(())
}

/// Check variable references, function names and arities of one expression
fn validate_expression(
    expression: &Expression,
    is_defined: &dyn Fn(&str) -> bool,
    in_recipe: bool,
) -> ResolveResult<()> {
    let mut result = Ok(());
    expression.walk(&mut |expr| {
        if result.is_err() {
            return;
        }
        result = match expr {
            Expression::Variable(name) if !is_defined(name.as_str()) => {
                Err(ResolveError::UnresolvedReference(name.clone()))
            }
            Expression::Positional(index) if !in_recipe => {
                Err(ResolveError::PositionalOutsideRecipe(*index))
            }
            Expression::Call { name, arguments } => match function::lookup(name) {
                Some(function) => function.check_arity(arguments.len()),
                None => Err(ResolveError::UnknownFunction(name.clone())),
            },
            _ => Ok(()),
        };
    });
    result
}
