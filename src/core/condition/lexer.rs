//! Tokenizer for trigger conditions.

use super::ast::CompareOp;
use super::EvaluationError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    And,
    Or,
    Not,
    True,
    False,
    Cmp(CompareOp),
    Minus,
    LParen,
    RParen,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset into the condition string
    pub position: usize,
}

/// Split a condition into tokens.
///
/// Anything that looks like an operator but is not one of the six comparisons
/// (`=`, `!`, `&&`, `+`, `[`, `.` ...) is rejected as an unsupported operator,
/// so function calls, indexing and attribute access never reach the parser.
pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, EvaluationError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && next_is_digit(bytes, i)) {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            if i < bytes.len() && is_ident_char(bytes[i]) {
                return Err(EvaluationError::parse(i, "identifier cannot start with a digit"));
            }
            let text = &input[start..i];
            let value = text
                .parse::<f64>()
                .map_err(|_| EvaluationError::parse(start, format!("invalid number '{}'", text)))?;
            tokens.push(Token { kind: TokenKind::Number(value), position: start });
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            while i < bytes.len() && is_ident_char(bytes[i]) {
                i += 1;
            }
            let word = &input[start..i];
            let kind = match word.to_ascii_uppercase().as_str() {
                "AND" => TokenKind::And,
                "OR" => TokenKind::Or,
                "NOT" => TokenKind::Not,
                "TRUE" => TokenKind::True,
                "FALSE" => TokenKind::False,
                _ => TokenKind::Ident(word.to_string()),
            };
            tokens.push(Token { kind, position: start });
            continue;
        }

        match c {
            '"' | '\'' => {
                let quote = bytes[i];
                i += 1;
                let body_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(EvaluationError::parse(start, "unterminated string literal"));
                }
                let body = input[body_start..i].to_string();
                i += 1;
                tokens.push(Token { kind: TokenKind::Str(body), position: start });
            }
            '(' => {
                i += 1;
                tokens.push(Token { kind: TokenKind::LParen, position: start });
            }
            ')' => {
                i += 1;
                tokens.push(Token { kind: TokenKind::RParen, position: start });
            }
            '-' => {
                i += 1;
                tokens.push(Token { kind: TokenKind::Minus, position: start });
            }
            '>' | '<' | '=' | '!' => {
                let followed_by_eq = bytes.get(i + 1) == Some(&b'=');
                let op = match (c, followed_by_eq) {
                    ('>', true) => CompareOp::Ge,
                    ('>', false) => CompareOp::Gt,
                    ('<', true) => CompareOp::Le,
                    ('<', false) => CompareOp::Lt,
                    ('=', true) => CompareOp::Eq,
                    ('!', true) => CompareOp::Ne,
                    _ => return Err(EvaluationError::unsupported(start, c.to_string())),
                };
                i += if followed_by_eq { 2 } else { 1 };
                tokens.push(Token { kind: TokenKind::Cmp(op), position: start });
            }
            _ if c.is_ascii_punctuation() => {
                // Swallow runs like `&&` or `**` so the message names the whole operator
                while i < bytes.len() && bytes[i] == bytes[start] {
                    i += 1;
                }
                return Err(EvaluationError::unsupported(start, input[start..i].to_string()));
            }
            _ => {
                let ch = input[start..].chars().next().unwrap_or(c);
                return Err(EvaluationError::parse(start, format!("unexpected character '{}'", ch)));
            }
        }
    }

    Ok(tokens)
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn next_is_digit(bytes: &[u8], i: usize) -> bool {
    bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_comparison_chain() {
        assert_eq!(
            kinds("precipitationNow > 0 OR forecastPrecip2h >= 0.2"),
            vec![
                TokenKind::Ident("precipitationNow".into()),
                TokenKind::Cmp(CompareOp::Gt),
                TokenKind::Number(0.0),
                TokenKind::Or,
                TokenKind::Ident("forecastPrecip2h".into()),
                TokenKind::Cmp(CompareOp::Ge),
                TokenKind::Number(0.2),
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            kinds("not a and b Or TRUE"),
            vec![
                TokenKind::Not,
                TokenKind::Ident("a".into()),
                TokenKind::And,
                TokenKind::Ident("b".into()),
                TokenKind::Or,
                TokenKind::True,
            ]
        );
    }

    #[test]
    fn test_strings_and_negatives() {
        assert_eq!(
            kinds("trend == 'rising' AND temperature < -5"),
            vec![
                TokenKind::Ident("trend".into()),
                TokenKind::Cmp(CompareOp::Eq),
                TokenKind::Str("rising".into()),
                TokenKind::And,
                TokenKind::Ident("temperature".into()),
                TokenKind::Cmp(CompareOp::Lt),
                TokenKind::Minus,
                TokenKind::Number(5.0),
            ]
        );
    }

    #[test]
    fn test_rejects_unsupported_operators() {
        for (input, op) in [
            ("a = 1", "="),
            ("!a", "!"),
            ("a > 1 && b > 2", "&&"),
            ("a + 1 > 2", "+"),
            ("items[0] > 1", "["),
            ("obj.attr > 1", "."),
        ] {
            match tokenize(input) {
                Err(EvaluationError::UnsupportedOperator { operator, .. }) => {
                    assert_eq!(operator, op, "input: {}", input)
                }
                other => panic!("expected unsupported operator for {}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokenize("trend == \"rising"),
            Err(EvaluationError::Parse { position: 9, .. })
        ));
    }

    #[test]
    fn test_malformed_number() {
        assert!(tokenize("a > 1.2.3").is_err());
        assert!(tokenize("a > 2h").is_err());
    }
}
