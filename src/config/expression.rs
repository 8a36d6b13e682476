//! Expression parsing
//!
//! Grammar:
//!
//! ```text
//! expression := value ('+' expression)?
//! value      := STRING | NUMBER | NAME | NAME '(' arguments? ')' | '(' expression ')'
//! arguments  := expression (',' expression)* ','?
//! ```

use crate::config::lexer::{tokenize, Token};
use crate::config::types::Expression;

/// A cursor over a token list
pub struct Cursor {
    tokens: Vec<Token>,
    position: usize,
}

impl Cursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        Cursor {
            tokens,
            position: 0,
        }
    }

    /// Tokenize `text` and wrap the tokens in a cursor
    pub fn from_text(text: &str) -> Result<Self, String> {
        tokenize(text).map(Cursor::new)
    }

    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Consume the next token if it equals `expected`
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, expected: Token) -> Result<(), String> {
        match self.next_token() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected {}, found {}", expected, token)),
            None => Err(format!("expected {}, found end of line", expected)),
        }
    }

    pub fn expect_name(&mut self) -> Result<String, String> {
        match self.next_token() {
            Some(Token::Name(name)) => Ok(name),
            Some(token) => Err(format!("expected name, found {}", token)),
            None => Err("expected name, found end of line".to_string()),
        }
    }

    pub fn is_done(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// Fail unless every token has been consumed
    pub fn expect_end(&self) -> Result<(), String> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(format!("unexpected {}", token)),
        }
    }

    pub fn expression(&mut self) -> Result<Expression, String> {
        let lhs = self.value()?;
        if self.eat(&Token::Plus) {
            let rhs = self.expression()?;
            Ok(Expression::Concatenation(Box::new(lhs), Box::new(rhs)))
        } else {
            Ok(lhs)
        }
    }

    pub fn value(&mut self) -> Result<Expression, String> {
        match self.next_token() {
            Some(Token::Str(value)) => Ok(Expression::StringLiteral(value)),
            Some(Token::Number(index)) => Ok(Expression::Positional(index)),
            Some(Token::Name(name)) => {
                if self.eat(&Token::ParenL) {
                    let arguments = self.arguments()?;
                    Ok(Expression::Call { name, arguments })
                } else {
                    Ok(Expression::Variable(name))
                }
            }
            Some(Token::ParenL) => {
                let inner = self.expression()?;
                self.expect(Token::ParenR)?;
                Ok(inner)
            }
            Some(token) => Err(format!("expected expression, found {}", token)),
            None => Err("expected expression, found end of line".to_string()),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Expression>, String> {
        let mut arguments = Vec::new();
        while !self.eat(&Token::ParenR) {
            arguments.push(self.expression()?);
            if !self.eat(&Token::Comma) {
                self.expect(Token::ParenR)?;
                break;
            }
        }
        Ok(arguments)
    }
}

/// Parse a complete expression from text
pub fn parse_expression(text: &str) -> Result<Expression, String> {
    let mut cursor = Cursor::from_text(text)?;
    let expression = cursor.expression()?;
    cursor.expect_end()?;
    Ok(expression)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Expression {
        Expression::Variable(name.to_string())
    }

    fn string(value: &str) -> Expression {
        Expression::StringLiteral(value.to_string())
    }

    #[test]
    fn test_parse_call_with_default() {
        let expr = parse_expression(r#"env("CARGO", "cargo")"#).unwrap();
        assert_eq!(
            expr,
            Expression::Call {
                name: "env".to_string(),
                arguments: vec![string("CARGO"), string("cargo")],
            }
        );
    }

    #[test]
    fn test_parse_nested_call() {
        let expr = parse_expression("quote(just_executable())").unwrap();
        assert_eq!(
            expr,
            Expression::Call {
                name: "quote".to_string(),
                arguments: vec![Expression::Call {
                    name: "just_executable".to_string(),
                    arguments: vec![],
                }],
            }
        );
    }

    #[test]
    fn test_concatenation_is_right_associative() {
        let expr = parse_expression("a + 'b' + c").unwrap();
        assert_eq!(
            expr,
            Expression::Concatenation(
                Box::new(var("a")),
                Box::new(Expression::Concatenation(
                    Box::new(string("b")),
                    Box::new(var("c"))
                )),
            )
        );
    }

    #[test]
    fn test_parenthesised_expression() {
        let expr = parse_expression("('x' + y)").unwrap();
        assert!(matches!(expr, Expression::Concatenation(_, _)));
    }

    #[test]
    fn test_positional_reference() {
        assert_eq!(parse_expression("1").unwrap(), Expression::Positional(1));
    }

    #[test]
    fn test_trailing_comma_in_arguments() {
        let expr = parse_expression("replace(a, 'x', 'y',)").unwrap();
        match expr {
            Expression::Call { arguments, .. } => assert_eq!(arguments.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_expression("a b").unwrap_err();
        assert!(err.contains("unexpected"));
    }

    #[test]
    fn test_missing_paren() {
        assert!(parse_expression("quote(a").is_err());
        assert!(parse_expression("").is_err());
    }
}
