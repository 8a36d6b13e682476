//! Core recipe file types
//!
//! This module defines the data structures that represent a parsed justfile:
//! settings, variable assignments, recipes and the expression AST used by both.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A parsed recipe file
#[derive(Debug, Clone, Default, Serialize)]
pub struct Justfile {
    /// Global interpreter settings
    pub settings: Settings,

    /// Variable assignments in definition order
    pub assignments: IndexMap<String, Assignment>,

    /// Recipes in declaration order
    pub recipes: IndexMap<String, Recipe>,
}

impl Justfile {
    /// Look up a recipe by name
    pub fn recipe(&self, name: &str) -> Option<&Recipe> {
        self.recipes.get(name)
    }

    /// Recipes shown by listing, in declaration order
    pub fn public_recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values().filter(|recipe| !recipe.is_hidden())
    }
}

/// Settings controlling parsing and execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Export every variable to invoked commands
    pub export: bool,

    /// Strip comment lines from recipe bodies
    pub ignore_comments: bool,

    /// Pass recipe arguments as positional shell parameters
    pub positional_arguments: bool,

    /// Interpreter and flags each command line is appended to
    pub shell: Vec<String>,

    /// Load `.env` next to the recipe file
    pub dotenv_load: bool,

    /// Do not echo command lines
    pub quiet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            export: false,
            ignore_comments: false,
            positional_arguments: false,
            shell: vec!["sh".to_string(), "-cu".to_string()],
            dotenv_load: false,
            quiet: false,
        }
    }
}

impl Settings {
    /// Apply a single parsed setting
    pub fn apply(&mut self, setting: Setting) {
        match setting {
            Setting::Export(value) => self.export = value,
            Setting::IgnoreComments(value) => self.ignore_comments = value,
            Setting::PositionalArguments(value) => self.positional_arguments = value,
            Setting::Shell(shell) => self.shell = shell,
            Setting::DotenvLoad(value) => self.dotenv_load = value,
            Setting::Quiet(value) => self.quiet = value,
        }
    }
}

/// One `set <key> := <value>` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    Export(bool),
    IgnoreComments(bool),
    PositionalArguments(bool),
    Shell(Vec<String>),
    DotenvLoad(bool),
    Quiet(bool),
}

impl Setting {
    /// Names of every recognized setting
    pub const NAMES: &'static [&'static str] = &[
        "export",
        "ignore-comments",
        "positional-arguments",
        "shell",
        "dotenv-load",
        "quiet",
    ];

    /// Build a boolean setting from its key
    pub fn boolean(name: &str, value: bool) -> Option<Self> {
        match name {
            "export" => Some(Setting::Export(value)),
            "ignore-comments" => Some(Setting::IgnoreComments(value)),
            "positional-arguments" => Some(Setting::PositionalArguments(value)),
            "dotenv-load" => Some(Setting::DotenvLoad(value)),
            "quiet" => Some(Setting::Quiet(value)),
            _ => None,
        }
    }
}

/// A variable bound to an expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub name: String,
    pub expression: Expression,

    /// Declared with the `export` keyword
    pub export: bool,

    /// Line the assignment appears on
    pub line: usize,
}

/// A named unit of execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    pub name: String,

    /// Comment directly above the header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,

    /// Recipes that must run first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    pub body: Vec<Line>,

    /// Marked with a `[private]` attribute
    pub private: bool,

    /// Header prefixed with `@`
    pub quiet: bool,

    /// Line the header appears on
    pub line: usize,
}

impl Recipe {
    /// Whether this recipe is hidden from listing
    pub fn is_hidden(&self) -> bool {
        self.private || self.name.starts_with('_')
    }

    /// Minimum number of arguments the recipe accepts
    pub fn min_arguments(&self) -> usize {
        self.parameters
            .iter()
            .filter(|p| p.default.is_none() && p.kind != ParameterKind::Star)
            .count()
    }

    /// Maximum number of arguments, `None` when a variadic parameter is present
    pub fn max_arguments(&self) -> Option<usize> {
        if self.parameters.iter().any(|p| p.kind.is_variadic()) {
            None
        } else {
            Some(self.parameters.len())
        }
    }

    /// Header without dependencies, as shown by listing
    pub fn signature(&self) -> String {
        let mut signature = self.name.clone();
        for parameter in &self.parameters {
            signature.push(' ');
            signature.push_str(&parameter.to_string());
        }
        signature
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(doc) = &self.doc {
            writeln!(f, "# {}", doc)?;
        }
        if self.private {
            writeln!(f, "[private]")?;
        }
        if self.quiet {
            write!(f, "@")?;
        }
        write!(f, "{}:", self.signature())?;
        for dependency in &self.dependencies {
            write!(f, " {}", dependency)?;
        }
        for line in &self.body {
            write!(f, "\n    {}", line)?;
        }
        Ok(())
    }
}

/// How many arguments a parameter takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// Exactly one
    Singular,
    /// One or more (`+name`)
    Plus,
    /// Zero or more (`*name`)
    Star,
}

impl ParameterKind {
    pub fn is_variadic(self) -> bool {
        self != ParameterKind::Singular
    }
}

/// A recipe parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Expression>,

    /// Declared with `$`, exported to the recipe's commands
    pub export: bool,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParameterKind::Singular => {}
            ParameterKind::Plus => write!(f, "+")?,
            ParameterKind::Star => write!(f, "*")?,
        }
        if self.export {
            write!(f, "$")?;
        }
        write!(f, "{}", self.name)?;
        match &self.default {
            Some(expr @ (Expression::StringLiteral(_) | Expression::Variable(_))) => {
                write!(f, "={}", expr)
            }
            Some(expr) => write!(f, "=({})", expr),
            None => Ok(()),
        }
    }
}

/// One command line of a recipe body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    /// Line number of the first physical line
    pub number: usize,

    /// Prefixed with `@`, which inverts echoing for this line
    pub quiet: bool,

    pub fragments: Vec<Fragment>,
}

impl Line {
    /// Whether the line is a shell comment
    pub fn is_comment(&self) -> bool {
        match self.fragments.first() {
            Some(Fragment::Text(text)) => text.trim_start().starts_with('#'),
            _ => false,
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quiet {
            write!(f, "@")?;
        }
        for fragment in &self.fragments {
            write!(f, "{}", fragment)?;
        }
        Ok(())
    }
}

/// Literal text or an interpolated expression inside a body line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fragment {
    Text(String),
    Interpolation(Expression),
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Text(text) => write!(f, "{}", text.replace("{{", "{{{{")),
            Fragment::Interpolation(expr) => write!(f, "{{{{ {} }}}}", expr),
        }
    }
}

/// Expression AST
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expression {
    /// Quoted string
    StringLiteral(String),

    /// Reference to a variable or recipe parameter
    Variable(String),

    /// Reference to a positional argument, `0` being the recipe name
    Positional(usize),

    /// Built-in function call
    Call {
        name: String,
        arguments: Vec<Expression>,
    },

    /// `lhs + rhs`
    Concatenation(Box<Expression>, Box<Expression>),
}

impl Expression {
    /// Visit this expression and every sub-expression, depth first
    pub fn walk<'e>(&'e self, visit: &mut impl FnMut(&'e Expression)) {
        visit(self);
        match self {
            Expression::Call { arguments, .. } => {
                for argument in arguments {
                    argument.walk(visit);
                }
            }
            Expression::Concatenation(lhs, rhs) => {
                lhs.walk(visit);
                rhs.walk(visit);
            }
            Expression::StringLiteral(_) | Expression::Variable(_) | Expression::Positional(_) => {}
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::StringLiteral(value) if !value.contains('\'') => write!(f, "'{}'", value),
            Expression::StringLiteral(value) => write!(f, "{:?}", value),
            Expression::Variable(name) => write!(f, "{}", name),
            Expression::Positional(index) => write!(f, "{}", index),
            Expression::Call { name, arguments } => {
                write!(f, "{}(", name)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ")")
            }
            Expression::Concatenation(lhs, rhs) => write!(f, "{} + {}", lhs, rhs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(name: &str) -> Recipe {
        Recipe {
            name: name.to_string(),
            doc: None,
            parameters: vec![],
            dependencies: vec![],
            body: vec![],
            private: false,
            quiet: false,
            line: 1,
        }
    }

    fn parameter(name: &str, kind: ParameterKind, default: Option<&str>) -> Parameter {
        Parameter {
            name: name.to_string(),
            kind,
            default: default.map(|d| Expression::StringLiteral(d.to_string())),
            export: false,
        }
    }

    #[test]
    fn test_hidden_recipes() {
        let mut private = recipe("build");
        private.private = true;

        assert!(recipe("_helper").is_hidden());
        assert!(private.is_hidden());
        assert!(!recipe("build").is_hidden());
    }

    #[test]
    fn test_argument_bounds() {
        let mut r = recipe("deploy");
        r.parameters = vec![
            parameter("target", ParameterKind::Singular, None),
            parameter("mode", ParameterKind::Singular, Some("fast")),
        ];
        assert_eq!(r.min_arguments(), 1);
        assert_eq!(r.max_arguments(), Some(2));

        r.parameters.push(parameter("rest", ParameterKind::Star, None));
        assert_eq!(r.min_arguments(), 1);
        assert_eq!(r.max_arguments(), None);
    }

    #[test]
    fn test_default_settings_use_sh() {
        let settings = Settings::default();
        assert_eq!(settings.shell, vec!["sh", "-cu"]);
        assert!(!settings.export);
    }

    #[test]
    fn test_expression_walk() {
        let expr = Expression::Concatenation(
            Box::new(Expression::Variable("a".to_string())),
            Box::new(Expression::Call {
                name: "quote".to_string(),
                arguments: vec![Expression::Variable("b".to_string())],
            }),
        );
        let mut names = Vec::new();
        expr.walk(&mut |e| {
            if let Expression::Variable(name) = e {
                names.push(name.as_str());
            }
        });
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(expr.to_string(), "a + quote(b)");
    }

    #[test]
    fn test_recipe_display() {
        let mut r = recipe("check");
        r.doc = Some("Run lints".to_string());
        r.dependencies = vec!["fmt".to_string()];
        r.parameters = vec![parameter("flags", ParameterKind::Star, None)];
        r.body = vec![Line {
            number: 3,
            quiet: true,
            fragments: vec![
                Fragment::Text("cargo clippy ".to_string()),
                Fragment::Interpolation(Expression::Variable("flags".to_string())),
            ],
        }];
        assert_eq!(
            r.to_string(),
            "# Run lints\ncheck *flags: fmt\n    @cargo clippy {{ flags }}"
        );
    }
}
