//! Recipe execution
//!
//! An invocation runs in two phases. [`Executor::prepare`] validates the
//! target, orders its dependencies, resolves every variable and renders every
//! command line. [`Executor::execute`] then runs the rendered commands in
//! order and stops at the first failure. Nothing is spawned until the whole
//! plan has been built.

use crate::config::{load_dotenv, Justfile, ParameterKind, Recipe};
use crate::error::{ExecutionError, RecipeError, RecipeResult, Result};
use crate::runner::{
    render_line, signals, CommandSpec, Context, Environment, Evaluator, ProcessRunner, Resolved,
    Scope,
};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, info};

/// One command line of the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Recipe the line belongs to
    pub recipe: String,

    /// Rendered command text
    pub text: String,

    /// Echo the line before running it
    pub echo: bool,

    pub command: CommandSpec,
}

/// Everything resolved for one invocation, ready to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Recipes in execution order
    pub recipes: Vec<String>,

    /// Resolved variables and exports
    pub resolved: Resolved,

    /// Command lines in execution order
    pub steps: Vec<Step>,
}

/// Runs recipes of a parsed recipe file
pub struct Executor<'a, R: ProcessRunner> {
    justfile: &'a Justfile,
    context: &'a Context,
    runner: R,
}

impl<'a, R: ProcessRunner> Executor<'a, R> {
    pub fn new(justfile: &'a Justfile, context: &'a Context, runner: R) -> Self {
        Executor {
            justfile,
            context,
            runner,
        }
    }

    /// Access the process runner
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Prepare and execute `target` with caller-supplied arguments
    pub fn run(&mut self, target: &str, arguments: &[String]) -> Result<()> {
        let invocation = self.prepare(target, arguments)?;
        self.execute(&invocation)
    }

    /// Order `target` after its dependencies, each recipe at most once
    pub fn plan(&self, target: &str) -> RecipeResult<Vec<&'a Recipe>> {
        let recipe = self
            .justfile
            .recipe(target)
            .ok_or_else(|| RecipeError::NotFound(target.to_string()))?;

        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut stack = Vec::new();
        self.visit(recipe, &mut order, &mut done, &mut stack)?;
        Ok(order)
    }

    fn visit(
        &self,
        recipe: &'a Recipe,
        order: &mut Vec<&'a Recipe>,
        done: &mut HashSet<&'a str>,
        stack: &mut Vec<&'a str>,
    ) -> RecipeResult<()> {
        if done.contains(recipe.name.as_str()) {
            return Ok(());
        }
        if stack.contains(&recipe.name.as_str()) {
            let mut cycle: Vec<&str> = stack.clone();
            cycle.push(&recipe.name);
            return Err(RecipeError::CircularDependency(cycle.join(" -> ")));
        }

        stack.push(&recipe.name);
        for dependency in &recipe.dependencies {
            let next = self.justfile.recipe(dependency).ok_or_else(|| {
                RecipeError::UnknownDependency {
                    recipe: recipe.name.clone(),
                    dependency: dependency.clone(),
                }
            })?;
            self.visit(next, order, done, stack)?;
        }
        stack.pop();

        done.insert(&recipe.name);
        order.push(recipe);
        Ok(())
    }

    /// Resolve every variable of the recipe file
    pub fn resolve(&self) -> Result<Resolved> {
        let mut evaluator = self.evaluator()?;
        evaluator.resolve_all()?;
        Ok(evaluator.into_resolved())
    }

    fn evaluator(&self) -> Result<Evaluator<'a>> {
        let dotenv = if self.justfile.settings.dotenv_load {
            load_dotenv(self.context.justfile_dir())?
        } else {
            Environment::new()
        };
        Ok(Evaluator::new(
            &self.justfile.assignments,
            &self.justfile.settings,
            self.context,
            dotenv,
        ))
    }

    /// Build the complete invocation without running anything
    pub fn prepare(&self, target: &str, arguments: &[String]) -> Result<Invocation> {
        let recipes = self.plan(target)?;
        for recipe in &recipes {
            if recipe.body.is_empty() {
                return Err(RecipeError::Empty(recipe.name.clone()).into());
            }
            if recipe.name == target {
                check_argument_count(recipe, arguments.len())?;
            } else if recipe.min_arguments() > 0 {
                let dependent = recipes
                    .iter()
                    .find(|r| r.dependencies.contains(&recipe.name))
                    .map_or_else(|| target.to_string(), |r| r.name.clone());
                return Err(RecipeError::DependencyArguments {
                    recipe: dependent,
                    dependency: recipe.name.clone(),
                }
                .into());
            }
        }

        let mut evaluator = self.evaluator()?;
        evaluator.resolve_all()?;

        let settings = &self.justfile.settings;
        let mut steps = Vec::new();
        for recipe in &recipes {
            let supplied: &[String] = if recipe.name == target { arguments } else { &[] };
            let (parameters, positional) = bind_parameters(recipe, supplied, &mut evaluator)?;

            let mut env = evaluator.exports().clone();
            for parameter in recipe.parameters.iter().filter(|p| p.export) {
                if let Some(value) = parameters.get(&parameter.name) {
                    env.insert(parameter.name.clone(), value.clone());
                }
            }

            let scope = Scope {
                recipe: &recipe.name,
                parameters: &parameters,
                positional: &positional,
            };

            for line in &recipe.body {
                let text = render_line(line, &mut evaluator, &scope)?;
                let quiet_by_default = settings.quiet || recipe.quiet;
                let command = CommandSpec::from_shell(
                    &settings.shell,
                    &text,
                    settings
                        .positional_arguments
                        .then_some((recipe.name.as_str(), positional.as_slice())),
                    env.clone(),
                    self.context.working_dir.clone(),
                );
                steps.push(Step {
                    recipe: recipe.name.clone(),
                    text,
                    echo: quiet_by_default == line.quiet,
                    command,
                });
            }
        }

        Ok(Invocation {
            recipes: recipes.iter().map(|r| r.name.clone()).collect(),
            resolved: evaluator.into_resolved(),
            steps,
        })
    }

    /// Run the prepared steps in order, stopping at the first failure
    pub fn execute(&mut self, invocation: &Invocation) -> Result<()> {
        let mut current = None;
        for step in &invocation.steps {
            if current != Some(step.recipe.as_str()) {
                info!(recipe = %step.recipe, "running recipe");
                current = Some(step.recipe.as_str());
            }

            if self.context.dry_run {
                self.context.print_dry_run(&step.text);
                continue;
            }

            if step.echo {
                self.context.print_command(&step.text);
            }

            if let Some(signal) = signals::received() {
                return Err(ExecutionError::Interrupted { signal }.into());
            }

            debug!(
                program = %step.command.program,
                args = ?step.command.args,
                "spawning"
            );
            let code = self.runner.run(&step.command)?;
            if code != 0 {
                return Err(ExecutionError::CommandFailed {
                    recipe: step.recipe.clone(),
                    command: step.text.clone(),
                    code,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Check the number of arguments a recipe receives
fn check_argument_count(recipe: &Recipe, found: usize) -> RecipeResult<()> {
    if recipe.parameters.is_empty() {
        return Ok(());
    }

    let min = recipe.min_arguments();
    let max = recipe.max_arguments();
    if found >= min && max.map_or(true, |max| found <= max) {
        return Ok(());
    }

    let expected = match max {
        Some(max) if max == min => min.to_string(),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    };
    Err(RecipeError::ArgumentCount {
        recipe: recipe.name.clone(),
        expected,
        found,
    })
}

/// Bind arguments to parameters, evaluating defaults for missing ones.
///
/// Returns the parameter values and the positional argument list the recipe's
/// commands see. Variadic parameters contribute every argument they take.
fn bind_parameters(
    recipe: &Recipe,
    arguments: &[String],
    evaluator: &mut Evaluator<'_>,
) -> Result<(IndexMap<String, String>, Vec<String>)> {
    if recipe.parameters.is_empty() {
        return Ok((IndexMap::new(), arguments.to_vec()));
    }

    let mut parameters = IndexMap::new();
    let mut positional = Vec::new();
    let mut rest = arguments;

    for parameter in &recipe.parameters {
        let taken: Vec<String> = match parameter.kind {
            ParameterKind::Singular => match rest.split_first() {
                Some((first, tail)) => {
                    rest = tail;
                    vec![first.clone()]
                }
                None => Vec::new(),
            },
            ParameterKind::Plus | ParameterKind::Star => std::mem::take(&mut rest).to_vec(),
        };

        let value = if !taken.is_empty() {
            taken.join(" ")
        } else if let Some(default) = &parameter.default {
            let scope = Scope {
                recipe: &recipe.name,
                parameters: &parameters,
                positional: &positional,
            };
            let value = evaluator.evaluate(default, Some(&scope))?;
            positional.push(value.clone());
            value
        } else {
            String::new()
        };

        positional.extend(taken);
        parameters.insert(parameter.name.clone(), value);
    }

    Ok((parameters, positional))
}
