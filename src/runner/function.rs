//! Built-in functions callable from expressions

use crate::error::{ResolveError, ResolveResult};
use crate::runner::{Context, Environment};

/// What a built-in can see while it runs
pub struct FunctionContext<'a> {
    pub context: &'a Context,

    /// Ambient environment plus everything exported so far
    pub environment: &'a Environment,
}

/// A built-in function
pub struct Function {
    pub name: &'static str,
    pub min_arguments: usize,
    pub max_arguments: usize,
    call: fn(&FunctionContext<'_>, &[String]) -> ResolveResult<String>,
}

impl Function {
    /// Check the argument count of a call
    pub fn check_arity(&self, found: usize) -> ResolveResult<()> {
        if found < self.min_arguments || found > self.max_arguments {
            let expected = if self.min_arguments == self.max_arguments {
                self.min_arguments.to_string()
            } else {
                format!("{} to {}", self.min_arguments, self.max_arguments)
            };
            return Err(ResolveError::FunctionArity {
                name: self.name.to_string(),
                expected,
                found,
            });
        }
        Ok(())
    }

    pub fn call(&self, ctx: &FunctionContext<'_>, arguments: &[String]) -> ResolveResult<String> {
        self.check_arity(arguments.len())?;
        (self.call)(ctx, arguments)
    }
}

static FUNCTIONS: &[Function] = &[
    Function {
        name: "arch",
        min_arguments: 0,
        max_arguments: 0,
        call: arch,
    },
    Function {
        name: "env",
        min_arguments: 1,
        max_arguments: 2,
        call: env,
    },
    Function {
        name: "env_var",
        min_arguments: 1,
        max_arguments: 1,
        call: env,
    },
    Function {
        name: "env_var_or_default",
        min_arguments: 2,
        max_arguments: 2,
        call: env,
    },
    Function {
        name: "invocation_directory",
        min_arguments: 0,
        max_arguments: 0,
        call: invocation_directory,
    },
    Function {
        name: "just_executable",
        min_arguments: 0,
        max_arguments: 0,
        call: just_executable,
    },
    Function {
        name: "justfile",
        min_arguments: 0,
        max_arguments: 0,
        call: justfile,
    },
    Function {
        name: "justfile_directory",
        min_arguments: 0,
        max_arguments: 0,
        call: justfile_directory,
    },
    Function {
        name: "lowercase",
        min_arguments: 1,
        max_arguments: 1,
        call: lowercase,
    },
    Function {
        name: "os",
        min_arguments: 0,
        max_arguments: 0,
        call: os,
    },
    Function {
        name: "quote",
        min_arguments: 1,
        max_arguments: 1,
        call: quote,
    },
    Function {
        name: "replace",
        min_arguments: 3,
        max_arguments: 3,
        call: replace,
    },
    Function {
        name: "trim",
        min_arguments: 1,
        max_arguments: 1,
        call: trim,
    },
    Function {
        name: "uppercase",
        min_arguments: 1,
        max_arguments: 1,
        call: uppercase,
    },
];

/// Look up a built-in by name
pub fn lookup(name: &str) -> Option<&'static Function> {
    FUNCTIONS.iter().find(|function| function.name == name)
}

/// Wrap `value` in single quotes so a POSIX shell reads it verbatim
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn arch(_: &FunctionContext<'_>, _: &[String]) -> ResolveResult<String> {
    Ok(std::env::consts::ARCH.to_string())
}

fn os(_: &FunctionContext<'_>, _: &[String]) -> ResolveResult<String> {
    Ok(std::env::consts::OS.to_string())
}

fn env(ctx: &FunctionContext<'_>, arguments: &[String]) -> ResolveResult<String> {
    let name = &arguments[0];
    match (ctx.environment.get(name), arguments.get(1)) {
        (Some(value), _) => Ok(value.clone()),
        (None, Some(default)) => Ok(default.clone()),
        (None, None) => Err(ResolveError::EnvironmentVariable(name.clone())),
    }
}

fn invocation_directory(ctx: &FunctionContext<'_>, _: &[String]) -> ResolveResult<String> {
    Ok(ctx.context.invocation_dir.display().to_string())
}

fn just_executable(ctx: &FunctionContext<'_>, _: &[String]) -> ResolveResult<String> {
    Ok(ctx.context.executable.display().to_string())
}

fn justfile(ctx: &FunctionContext<'_>, _: &[String]) -> ResolveResult<String> {
    Ok(ctx.context.justfile_path.display().to_string())
}

fn justfile_directory(ctx: &FunctionContext<'_>, _: &[String]) -> ResolveResult<String> {
    Ok(ctx.context.justfile_dir().display().to_string())
}

fn lowercase(_: &FunctionContext<'_>, arguments: &[String]) -> ResolveResult<String> {
    Ok(arguments[0].to_lowercase())
}

fn uppercase(_: &FunctionContext<'_>, arguments: &[String]) -> ResolveResult<String> {
    Ok(arguments[0].to_uppercase())
}

fn quote(_: &FunctionContext<'_>, arguments: &[String]) -> ResolveResult<String> {
    Ok(shell_quote(&arguments[0]))
}

fn replace(_: &FunctionContext<'_>, arguments: &[String]) -> ResolveResult<String> {
    Ok(arguments[0].replace(arguments[1].as_str(), &arguments[2]))
}

fn trim(_: &FunctionContext<'_>, arguments: &[String]) -> ResolveResult<String> {
    Ok(arguments[0].trim().to_string())
}
