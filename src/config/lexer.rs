//! Tokenizer for settings, assignments, recipe headers and expressions

use std::fmt;

/// A lexical token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Name(String),
    Number(usize),
    Str(String),
    ColonEquals,
    Colon,
    Equals,
    Plus,
    Star,
    Dollar,
    At,
    Comma,
    ParenL,
    ParenR,
    BracketL,
    BracketR,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => write!(f, "name '{}'", name),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Str(s) => write!(f, "string {:?}", s),
            Token::ColonEquals => write!(f, "':='"),
            Token::Colon => write!(f, "':'"),
            Token::Equals => write!(f, "'='"),
            Token::Plus => write!(f, "'+'"),
            Token::Star => write!(f, "'*'"),
            Token::Dollar => write!(f, "'$'"),
            Token::At => write!(f, "'@'"),
            Token::Comma => write!(f, "','"),
            Token::ParenL => write!(f, "'('"),
            Token::ParenR => write!(f, "')'"),
            Token::BracketL => write!(f, "'['"),
            Token::BracketR => write!(f, "']'"),
        }
    }
}

/// Split a line into tokens. A `#` outside of a string starts a comment.
pub fn tokenize(text: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '#' => break,
            ':' => {
                if chars.next_if(|&(_, next)| next == '=').is_some() {
                    Token::ColonEquals
                } else {
                    Token::Colon
                }
            }
            '=' => Token::Equals,
            '+' => Token::Plus,
            '*' => Token::Star,
            '$' => Token::Dollar,
            '@' => Token::At,
            ',' => Token::Comma,
            '(' => Token::ParenL,
            ')' => Token::ParenR,
            '[' => Token::BracketL,
            ']' => Token::BracketR,
            '\'' => {
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\'')) => break,
                        Some((_, c)) => value.push(c),
                        None => return Err("unterminated string".to_string()),
                    }
                }
                Token::Str(value)
            }
            '"' => {
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, 'n')) => value.push('\n'),
                            Some((_, 't')) => value.push('\t'),
                            Some((_, 'r')) => value.push('\r'),
                            Some((_, '"')) => value.push('"'),
                            Some((_, '\\')) => value.push('\\'),
                            Some((_, other)) => {
                                return Err(format!("invalid escape sequence '\\{}'", other))
                            }
                            None => return Err("unterminated string".to_string()),
                        },
                        Some((_, c)) => value.push(c),
                        None => return Err("unterminated string".to_string()),
                    }
                }
                Token::Str(value)
            }
            c if c.is_ascii_digit() => {
                let mut end = start + c.len_utf8();
                while let Some((i, d)) = chars.next_if(|&(_, d)| d.is_ascii_digit()) {
                    end = i + d.len_utf8();
                }
                let digits = &text[start..end];
                let value = digits
                    .parse()
                    .map_err(|_| format!("number out of range: {}", digits))?;
                Token::Number(value)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some((i, d)) =
                    chars.next_if(|&(_, d)| d.is_ascii_alphanumeric() || d == '_' || d == '-')
                {
                    end = i + d.len_utf8();
                }
                Token::Name(text[start..end].to_string())
            }
            other => return Err(format!("unexpected character '{}'", other)),
        };
        tokens.push(token);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_assignment() {
        let tokens = tokenize(r#"CARGO := env("CARGO", 'cargo')"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("CARGO".to_string()),
                Token::ColonEquals,
                Token::Name("env".to_string()),
                Token::ParenL,
                Token::Str("CARGO".to_string()),
                Token::Comma,
                Token::Str("cargo".to_string()),
                Token::ParenR,
            ]
        );
    }

    #[test]
    fn test_tokenize_header_with_dashes() {
        let tokens = tokenize("fmt-check +files: _setup-env").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Name("fmt-check".to_string()),
                Token::Plus,
                Token::Name("files".to_string()),
                Token::Colon,
                Token::Name("_setup-env".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_stops_at_comment() {
        let tokens = tokenize("set export # everything").unwrap();
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_hash_inside_string_is_not_a_comment() {
        let tokens = tokenize("x := '#not'").unwrap();
        assert_eq!(tokens.last(), Some(&Token::Str("#not".to_string())));
    }

    #[test]
    fn test_escapes_in_double_quotes() {
        let tokens = tokenize(r#""a\tb\n\"c\"""#).unwrap();
        assert_eq!(tokens, vec![Token::Str("a\tb\n\"c\"".to_string())]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokenize("12").unwrap(), vec![Token::Number(12)]);
    }

    #[test]
    fn test_unterminated_string() {
        assert!(tokenize("x := 'oops").is_err());
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("x := ;").unwrap_err();
        assert!(err.contains("';'"));
    }
}
