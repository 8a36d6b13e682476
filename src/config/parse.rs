//! Recipe file parsing and discovery

use crate::config::expression::{parse_expression, Cursor};
use crate::config::lexer::Token;
use crate::config::types::{
    Assignment, Fragment, Justfile, Line, Parameter, ParameterKind, Recipe, Setting,
};
use crate::error::{ConfigError, ConfigResult, RjustError, SyntaxError, SyntaxResult};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Recipe file names to search for, in priority order
const JUSTFILE_NAMES: &[&str] = &["justfile", "Justfile", ".justfile"];

static SETTING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^set\s+(.*)$").expect("valid setting regex"));

static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(export\s+)?([A-Za-z_][A-Za-z0-9_-]*)\s*:=(.*)$")
        .expect("valid assignment regex")
});

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\s*([A-Za-z_][A-Za-z0-9_-]*)\s*\]\s*(#.*)?$")
        .expect("valid attribute regex")
});

/// Find the recipe file by searching a directory and its ancestors
pub fn find_justfile_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in JUSTFILE_NAMES {
            let candidate = current_dir.join(file_name);
            searched_paths.push(candidate.display().to_string());

            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Read and parse a recipe file
pub fn load_justfile(path: &Path) -> Result<Justfile, RjustError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let justfile = parse_justfile(&contents)?;
    debug!(
        path = %path.display(),
        recipes = justfile.recipes.len(),
        assignments = justfile.assignments.len(),
        "parsed justfile"
    );
    Ok(justfile)
}

/// Parse recipe file text
pub fn parse_justfile(text: &str) -> SyntaxResult<Justfile> {
    let mut parser = Parser::default();
    for (index, raw) in text.lines().enumerate() {
        parser.line(index + 1, raw)?;
    }
    parser.finish()
}

/// Recipe whose header has been read and whose body is still being collected
struct OpenRecipe {
    recipe: Recipe,
    body: Vec<(usize, String)>,
}

#[derive(Default)]
struct Parser {
    justfile: Justfile,
    settings_seen: HashSet<String>,
    doc: Option<String>,
    private: bool,
    open: Option<OpenRecipe>,
}

impl Parser {
    fn line(&mut self, number: usize, raw: &str) -> SyntaxResult<()> {
        let indented = raw.starts_with(' ') || raw.starts_with('\t');
        let trimmed = raw.trim();

        if let Some(open) = &mut self.open {
            if trimmed.is_empty() {
                return Ok(());
            }
            if indented {
                match open.body.last_mut() {
                    Some((_, text)) if text.ends_with('\\') => {
                        text.push('\n');
                        text.push_str(raw.trim_start());
                    }
                    _ => open.body.push((number, raw.trim_start().to_string())),
                }
                return Ok(());
            }
            self.close_recipe()?;
        }

        if trimmed.is_empty() {
            self.doc = None;
            return Ok(());
        }

        if indented {
            return Err(SyntaxError::UnexpectedIndent {
                line: number,
                text: trimmed.to_string(),
            });
        }

        if let Some(comment) = trimmed.strip_prefix('#') {
            if !comment.starts_with('!') {
                self.doc = Some(comment.trim().to_string());
            }
            return Ok(());
        }

        if let Some(caps) = ATTRIBUTE_RE.captures(trimmed) {
            return match &caps[1] {
                "private" => {
                    self.private = true;
                    Ok(())
                }
                other => Err(SyntaxError::UnknownAttribute {
                    line: number,
                    name: other.to_string(),
                }),
            };
        }

        if let Some(caps) = ASSIGNMENT_RE.captures(trimmed) {
            self.doc = None;
            let export = caps.get(1).is_some();
            let name = caps[2].to_string();
            let rest = caps.get(3).map_or("", |m| m.as_str());
            return self.assignment(number, name, rest, export);
        }

        if let Some(caps) = SETTING_RE.captures(trimmed) {
            self.doc = None;
            let rest = caps.get(1).map_or("", |m| m.as_str());
            return self.setting(number, rest);
        }

        self.header(number, trimmed)
    }

    fn setting(&mut self, number: usize, text: &str) -> SyntaxResult<()> {
        let expression_error = |message: String| SyntaxError::Expression {
            line: number,
            message,
        };
        let mut cursor = Cursor::from_text(text).map_err(expression_error)?;
        let name = cursor.expect_name().map_err(expression_error)?;

        if !Setting::NAMES.contains(&name.as_str()) {
            return Err(SyntaxError::UnknownSetting { line: number, name });
        }

        let invalid = |message: &str| SyntaxError::InvalidSettingValue {
            line: number,
            name: name.clone(),
            message: message.to_string(),
        };

        let setting = if name == "shell" {
            if !cursor.eat(&Token::ColonEquals) {
                return Err(invalid("expected ':=' followed by a list of strings"));
            }
            Setting::Shell(shell_list(&mut cursor).map_err(|m| invalid(&m))?)
        } else {
            let value = if cursor.eat(&Token::ColonEquals) {
                match cursor.next_token() {
                    Some(Token::Name(value)) if value == "true" => true,
                    Some(Token::Name(value)) if value == "false" => false,
                    _ => return Err(invalid("expected 'true' or 'false'")),
                }
            } else {
                true
            };
            Setting::boolean(&name, value).ok_or_else(|| invalid("expected a boolean"))?
        };

        cursor.expect_end().map_err(|m| invalid(&m))?;

        if !self.settings_seen.insert(name.clone()) {
            return Err(SyntaxError::DuplicateSetting { line: number, name });
        }
        self.justfile.settings.apply(setting);
        Ok(())
    }

    fn assignment(
        &mut self,
        number: usize,
        name: String,
        text: &str,
        export: bool,
    ) -> SyntaxResult<()> {
        let expression = parse_expression(text).map_err(|message| SyntaxError::Expression {
            line: number,
            message,
        })?;

        if self.justfile.assignments.contains_key(&name) {
            return Err(SyntaxError::DuplicateVariable { line: number, name });
        }

        self.justfile.assignments.insert(
            name.clone(),
            Assignment {
                name,
                expression,
                export,
                line: number,
            },
        );
        Ok(())
    }

    fn header(&mut self, number: usize, text: &str) -> SyntaxResult<()> {
        let unrecognized = || SyntaxError::UnrecognizedLine {
            line: number,
            text: text.to_string(),
        };

        let tokens = crate::config::lexer::tokenize(text).map_err(|_| unrecognized())?;
        if !tokens.contains(&Token::Colon) {
            return Err(unrecognized());
        }

        let mut cursor = Cursor::new(tokens);
        let quiet = cursor.eat(&Token::At);
        let name = cursor.expect_name().map_err(|_| unrecognized())?;

        let expression_error = |message: String| SyntaxError::Expression {
            line: number,
            message,
        };

        let mut parameters = Vec::new();
        while !cursor.eat(&Token::Colon) {
            parameters.push(parameter(&mut cursor).map_err(expression_error)?);
        }

        let mut dependencies = Vec::new();
        while !cursor.is_done() {
            dependencies.push(cursor.expect_name().map_err(expression_error)?);
        }

        if self.justfile.recipes.contains_key(&name) {
            return Err(SyntaxError::DuplicateRecipe { line: number, name });
        }

        self.open = Some(OpenRecipe {
            recipe: Recipe {
                name,
                doc: self.doc.take(),
                parameters,
                dependencies,
                body: Vec::new(),
                private: std::mem::take(&mut self.private),
                quiet,
                line: number,
            },
            body: Vec::new(),
        });
        Ok(())
    }

    fn close_recipe(&mut self) -> SyntaxResult<()> {
        if let Some(OpenRecipe { mut recipe, body }) = self.open.take() {
            for (number, text) in body {
                recipe.body.push(body_line(number, &text)?);
            }
            self.justfile.recipes.insert(recipe.name.clone(), recipe);
        }
        Ok(())
    }

    fn finish(mut self) -> SyntaxResult<Justfile> {
        self.close_recipe()?;

        if self.justfile.settings.ignore_comments {
            for recipe in self.justfile.recipes.values_mut() {
                recipe.body.retain(|line| !line.is_comment());
            }
        }

        Ok(self.justfile)
    }
}

/// Parse `[ 'a', 'b', ... ]`
fn shell_list(cursor: &mut Cursor) -> Result<Vec<String>, String> {
    cursor.expect(Token::BracketL)?;
    let mut items = Vec::new();
    while !cursor.eat(&Token::BracketR) {
        match cursor.next_token() {
            Some(Token::Str(item)) => items.push(item),
            Some(token) => return Err(format!("expected string, found {}", token)),
            None => return Err("unterminated list".to_string()),
        }
        if !cursor.eat(&Token::Comma) {
            cursor.expect(Token::BracketR)?;
            break;
        }
    }
    if items.is_empty() {
        return Err("shell must name at least the interpreter".to_string());
    }
    Ok(items)
}

/// Parse one recipe parameter: `[$][+|*][$]name[=value]`
fn parameter(cursor: &mut Cursor) -> Result<Parameter, String> {
    let mut export = cursor.eat(&Token::Dollar);
    let kind = if cursor.eat(&Token::Plus) {
        ParameterKind::Plus
    } else if cursor.eat(&Token::Star) {
        ParameterKind::Star
    } else {
        ParameterKind::Singular
    };
    export |= cursor.eat(&Token::Dollar);
    let name = cursor.expect_name()?;
    let default = if cursor.eat(&Token::Equals) {
        Some(cursor.value()?)
    } else {
        None
    };
    Ok(Parameter {
        name,
        kind,
        default,
        export,
    })
}

/// Parse a body line into literal text and `{{ ... }}` interpolations
fn body_line(number: usize, text: &str) -> SyntaxResult<Line> {
    let (quiet, text) = match text.strip_prefix('@') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let mut fragments = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        literal.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        if let Some(escaped) = after.strip_prefix("{{") {
            literal.push_str("{{");
            rest = escaped;
            continue;
        }

        let end = after
            .find("}}")
            .ok_or_else(|| SyntaxError::UnterminatedInterpolation {
                line: number,
                text: text.to_string(),
            })?;
        let expression = parse_expression(&after[..end]).map_err(|message| {
            SyntaxError::Expression {
                line: number,
                message,
            }
        })?;

        if !literal.is_empty() {
            fragments.push(Fragment::Text(std::mem::take(&mut literal)));
        }
        fragments.push(Fragment::Interpolation(expression));
        rest = &after[end + 2..];
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        fragments.push(Fragment::Text(literal));
    }

    Ok(Line {
        number,
        quiet,
        fragments,
    })
}
