//! Recursive-descent parser producing [`Expr`] trees.
//!
//! Precedence, loosest first: `OR`, `AND`, `NOT`, comparison. Parentheses
//! group. A comparison has at most one operator, so `1 < x < 3` is rejected.

use super::ast::Expr;
use super::lexer::{tokenize, Token, TokenKind};
use super::EvaluationError;
use crate::core::metrics::MetricValue;

/// Conditions longer than this are rejected before tokenizing
pub const MAX_CONDITION_LEN: usize = 1024;

/// Maximum nesting of parentheses and NOT
pub const MAX_DEPTH: usize = 32;

pub(crate) fn parse(input: &str) -> Result<Expr, EvaluationError> {
    if input.len() > MAX_CONDITION_LEN {
        return Err(EvaluationError::parse(
            MAX_CONDITION_LEN,
            format!("condition exceeds {} bytes", MAX_CONDITION_LEN),
        ));
    }

    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvaluationError::parse(0, "empty condition"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: input.len(),
    };
    let expr = parser.parse_or()?;

    if let Some(token) = parser.peek() {
        return Err(EvaluationError::parse(
            token.position,
            format!("unexpected {}", describe(&token.kind)),
        ));
    }

    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| &t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn enter(&mut self, position: usize) -> Result<(), EvaluationError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvaluationError::parse(
                position,
                format!("nesting deeper than {} levels", MAX_DEPTH),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_or(&mut self) -> Result<Expr, EvaluationError> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, EvaluationError> {
        let mut left = self.parse_not()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, EvaluationError> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Not {
                let position = token.position;
                self.pos += 1;
                self.enter(position)?;
                let inner = self.parse_not()?;
                self.leave();
                return Ok(Expr::Not(Box::new(inner)));
            }
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, EvaluationError> {
        let left = self.parse_operand()?;

        let op = match self.peek() {
            Some(Token { kind: TokenKind::Cmp(op), .. }) => *op,
            _ => return Ok(left),
        };
        self.pos += 1;

        let right = self.parse_operand()?;

        if let Some(Token { kind: TokenKind::Cmp(_), position }) = self.peek() {
            return Err(EvaluationError::parse(
                *position,
                "chained comparisons are not supported; combine them with AND",
            ));
        }

        Ok(Expr::Comparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_operand(&mut self) -> Result<Expr, EvaluationError> {
        let end = self.end;
        let token = self
            .advance()
            .ok_or_else(|| EvaluationError::parse(end, "unexpected end of condition"))?;

        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Literal(MetricValue::Number(n))),
            TokenKind::Str(s) => Ok(Expr::Literal(MetricValue::Text(s))),
            TokenKind::True => Ok(Expr::Literal(MetricValue::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(MetricValue::Bool(false))),
            TokenKind::Ident(name) => Ok(Expr::VariableRef(name.to_ascii_lowercase())),
            TokenKind::Minus => match self.advance() {
                Some(Token { kind: TokenKind::Number(n), .. }) => Ok(Expr::Literal(MetricValue::Number(-n))),
                _ => Err(EvaluationError::parse(
                    token.position,
                    "'-' must be followed by a number literal",
                )),
            },
            TokenKind::LParen => {
                self.enter(token.position)?;
                let inner = self.parse_or()?;
                self.leave();
                if !self.eat(&TokenKind::RParen) {
                    let at = self.peek().map(|t| t.position).unwrap_or(end);
                    return Err(EvaluationError::parse(at, "expected ')'"));
                }
                Ok(inner)
            }
            other => Err(EvaluationError::parse(
                token.position,
                format!("expected a value, found {}", describe(&other)),
            )),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number {}", n),
        TokenKind::Str(s) => format!("string '{}'", s),
        TokenKind::Ident(name) => format!("identifier '{}'", name),
        TokenKind::And => "AND".to_string(),
        TokenKind::Or => "OR".to_string(),
        TokenKind::Not => "NOT".to_string(),
        TokenKind::True => "TRUE".to_string(),
        TokenKind::False => "FALSE".to_string(),
        TokenKind::Cmp(op) => format!("operator '{}'", op),
        TokenKind::Minus => "'-'".to_string(),
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
    }
}
