//! Main CLI application

use crate::config::{find_justfile_from, load_justfile, validate_justfile, Justfile};
use crate::error::RjustError;
use crate::logging;
use crate::runner::{signals, Context, Executor, SystemRunner, Verbosity};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// CLI application
pub struct App {
    /// Parsed recipe file
    justfile: Justfile,
    /// Invocation context
    context: Context,
}

impl App {
    /// Load and validate the recipe file at `path`
    pub fn with_justfile(path: PathBuf, context: Context) -> Result<Self, RjustError> {
        let justfile = load_justfile(&path)?;
        validate_justfile(&justfile)?;

        Ok(App {
            justfile,
            context: context.with_justfile_path(path),
        })
    }

    /// Dispatch on parsed command line arguments
    pub fn run(self, matches: &ArgMatches) -> Result<(), RjustError> {
        if matches.get_flag("dump") {
            print!("{}", serde_yaml::to_string(&self.justfile)?);
            return Ok(());
        }

        if matches.get_flag("evaluate") {
            let executor = Executor::new(&self.justfile, &self.context, SystemRunner);
            let resolved = executor.resolve()?;
            let width = resolved.variables.keys().map(String::len).max().unwrap_or(0);
            for (name, value) in &resolved.variables {
                println!("{:width$} := {:?}", name, value, width = width);
            }
            return Ok(());
        }

        if let Some(name) = matches.get_one::<String>("show") {
            let recipe = self
                .justfile
                .recipe(name)
                .ok_or_else(|| crate::error::RecipeError::NotFound(name.clone()))?;
            println!("{}", recipe);
            return Ok(());
        }

        let recipe = matches.get_one::<String>("recipe");
        if matches.get_flag("list") || recipe.is_none() {
            print!("{}", format_listing(&self.justfile));
            return Ok(());
        }

        let arguments: Vec<String> = matches
            .get_many::<String>("arguments")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        if let Some(name) = recipe {
            let mut executor = Executor::new(&self.justfile, &self.context, SystemRunner);
            executor.run(name, &arguments)?;
        }
        Ok(())
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(crate::VERSION)
        .about("Run recipes from a justfile")
        .arg(
            Arg::new("justfile")
                .short('f')
                .long("justfile")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Use FILE instead of searching for a justfile"),
        )
        .arg(
            Arg::new("working-directory")
                .short('d')
                .long("working-directory")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Run commands in DIR instead of the justfile's directory"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List available recipes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("show")
                .short('s')
                .long("show")
                .value_name("RECIPE")
                .help("Print a recipe's source"),
        )
        .arg(
            Arg::new("evaluate")
                .long("evaluate")
                .help("Print resolved variables")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .help("Print the parsed justfile as YAML")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .value_parser(value_parser!(Shell))
                .help("Print a shell completion script"),
        )
        .arg(
            Arg::new("dry-run")
                .short('n')
                .long("dry-run")
                .help("Print commands without running them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Do not echo commands; repeat to silence dry-run output")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print diagnostic output")
                .action(ArgAction::SetTrue),
        )
        .arg(Arg::new("recipe").value_name("RECIPE").help("Recipe to run"))
        .arg(
            Arg::new("arguments")
                .value_name("ARGS")
                .num_args(0..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .help("Arguments passed to the recipe"),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    match matches.get_count("quiet") {
        0 if matches.get_flag("verbose") => Verbosity::Verbose,
        0 => Verbosity::Normal,
        1 => Verbosity::Quiet,
        _ => Verbosity::Silent,
    }
}

/// Listing of non-hidden recipes in declaration order
pub fn format_listing(justfile: &Justfile) -> String {
    let recipes: Vec<_> = justfile.public_recipes().collect();
    let width = recipes
        .iter()
        .map(|recipe| recipe.signature().len())
        .max()
        .unwrap_or(0);

    let mut listing = String::from("Available recipes:\n");
    for recipe in recipes {
        let signature = recipe.signature();
        match &recipe.doc {
            Some(doc) => listing.push_str(&format!(
                "    {:width$} # {}\n",
                signature,
                doc,
                width = width
            )),
            None => listing.push_str(&format!("    {}\n", signature)),
        }
    }
    listing
}

/// Directory a recipe file lives in
fn parent_dir(path: &Path, fallback: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => fallback.to_path_buf(),
    }
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<(), RjustError> {
    run_from(env::args_os())
}

/// Run the CLI application with provided arguments
pub fn run_from<I, T>(args: I) -> Result<(), RjustError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = build_command();
    let matches = command.clone().get_matches_from(args);

    let verbosity = get_verbosity(&matches);
    logging::init(verbosity);

    if let Some(shell) = matches.get_one::<Shell>("completions") {
        let name = env!("CARGO_PKG_NAME");
        clap_complete::generate(*shell, &mut command, name, &mut io::stdout());
        return Ok(());
    }

    let invocation_dir = env::current_dir()?;
    // Relative paths are resolved against the invocation directory
    let path = match matches.get_one::<PathBuf>("justfile") {
        Some(path) => invocation_dir.join(path),
        None => find_justfile_from(invocation_dir.clone())?,
    };

    let working_dir = match matches.get_one::<PathBuf>("working-directory") {
        Some(dir) => invocation_dir.join(dir),
        None => parent_dir(&path, &invocation_dir),
    };

    signals::install()?;

    let context = Context::new()
        .with_working_dir(working_dir)
        .with_invocation_dir(invocation_dir)
        .with_executable(env::current_exe()?)
        .with_process_environment()
        .with_verbosity(verbosity)
        .with_dry_run(matches.get_flag("dry-run"));

    App::with_justfile(path, context)?.run(&matches)
}
