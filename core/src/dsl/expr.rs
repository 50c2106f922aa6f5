//! Condition expression parser and evaluator.
//!
//! One expression form per check, evaluated against a nested JSON
//! `context`:
//!
//! ```text
//! true
//! len(context.parties) >= 2
//! context.text contains 'NDA'
//! context.meta.doc_type == 'nda'
//! context.meta.doc_type != 'lease'
//! context.flags.signed
//! ```
//!
//! There are no boolean connectives inside an expression; disjunction and
//! conjunction happen at the check level (`any_of` / `all_of`). Anything
//! outside this grammar is a hard [`CoreError::UnsupportedExpr`], never a
//! silent `false`.

use crate::error::{CoreError, CoreResult};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
}

/// A parsed condition. Paths are relative to the `context` root.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(bool),
    Len {
        path: Vec<String>,
        op: CmpOp,
        rhs: i64,
    },
    Contains {
        path: Vec<String>,
        needle: String,
    },
    Equals {
        path: Vec<String>,
        rhs: String,
        negated: bool,
    },
    Truthy {
        path: Vec<String>,
    },
}

impl Expr {
    /// Evaluate against a context mapping. Total: missing paths resolve to
    /// absent values, which compare false / have length zero.
    pub fn evaluate(&self, context: &Value) -> bool {
        match self {
            Expr::Literal(b) => *b,
            Expr::Len { path, op, rhs } => {
                let n = resolve(context, path).map(value_len).unwrap_or(0) as i64;
                match op {
                    CmpOp::Gt => n > *rhs,
                    CmpOp::Ge => n >= *rhs,
                    CmpOp::Lt => n < *rhs,
                    CmpOp::Le => n <= *rhs,
                    CmpOp::Eq => n == *rhs,
                }
            }
            Expr::Contains { path, needle } => match resolve(context, path) {
                Some(Value::String(s)) => s.contains(needle.as_str()),
                Some(Value::Array(items)) => items
                    .iter()
                    .any(|v| matches!(v, Value::String(s) if s == needle)),
                _ => false,
            },
            Expr::Equals { path, rhs, negated } => {
                let eq = match resolve(context, path) {
                    Some(Value::String(s)) => s == rhs,
                    Some(Value::Number(n)) => n.to_string() == *rhs,
                    Some(Value::Bool(b)) => b.to_string() == *rhs,
                    _ => false,
                };
                eq != *negated
            }
            Expr::Truthy { path } => resolve(context, path).map(is_truthy).unwrap_or(false),
        }
    }
}

fn resolve<'a>(context: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = context;
    for part in path {
        current = current.get(part)?;
    }
    Some(current)
}

fn value_len(v: &Value) -> usize {
    match v {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

// Parser

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(i64),
    Cmp(CmpOp),
    NotEq,
    LParen,
    RParen,
}

pub fn parse_expr(input: &str) -> CoreResult<Expr> {
    let tokens = tokenize(input)?;
    let (expr, rest) = parse_one(&tokens, input)?;
    if !rest.is_empty() {
        return Err(unsupported(input, "trailing tokens after expression"));
    }
    Ok(expr)
}

fn unsupported(input: &str, detail: &str) -> CoreError {
    CoreError::UnsupportedExpr(format!("{detail} in '{input}'"))
}

fn tokenize(input: &str) -> CoreResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => {
                            if let Some(escaped) = chars.next() {
                                s.push(escaped);
                            }
                        }
                        Some(ch) if ch == quote => break,
                        Some(ch) => s.push(ch),
                        None => return Err(unsupported(input, "unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(s));
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Cmp(CmpOp::Ge));
                } else {
                    tokens.push(Token::Cmp(CmpOp::Gt));
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Cmp(CmpOp::Le));
                } else {
                    tokens.push(Token::Cmp(CmpOp::Lt));
                }
            }
            '=' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Cmp(CmpOp::Eq));
                } else {
                    return Err(unsupported(input, "single '=' is not an operator"));
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::NotEq);
                } else {
                    return Err(unsupported(input, "bare '!' is not an operator"));
                }
            }
            _ if c.is_ascii_digit() => {
                let mut num = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        num.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = num
                    .parse::<i64>()
                    .map_err(|_| unsupported(input, "invalid integer"))?;
                tokens.push(Token::Num(n));
            }
            _ if c.is_alphanumeric() || c == '_' => {
                let mut word = String::new();
                while let Some(&wc) = chars.peek() {
                    if wc.is_alphanumeric() || wc == '_' || wc == '.' {
                        word.push(wc);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(word));
            }
            other => {
                return Err(unsupported(input, &format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

fn parse_one<'a>(tokens: &'a [Token], input: &str) -> CoreResult<(Expr, &'a [Token])> {
    match tokens {
        [Token::Ident(w), rest @ ..] if w == "true" => Ok((Expr::Literal(true), rest)),
        [Token::Ident(w), rest @ ..] if w == "false" => Ok((Expr::Literal(false), rest)),
        [Token::Ident(w), Token::LParen, Token::Ident(p), Token::RParen, Token::Cmp(op), Token::Num(n), rest @ ..]
            if w == "len" =>
        {
            Ok((
                Expr::Len {
                    path: context_path(p, input)?,
                    op: *op,
                    rhs: *n,
                },
                rest,
            ))
        }
        [Token::Ident(p), Token::Ident(kw), Token::Str(lit), rest @ ..] if kw == "contains" => {
            Ok((
                Expr::Contains {
                    path: context_path(p, input)?,
                    needle: lit.clone(),
                },
                rest,
            ))
        }
        [Token::Ident(p), Token::Cmp(CmpOp::Eq), Token::Str(lit), rest @ ..] => Ok((
            Expr::Equals {
                path: context_path(p, input)?,
                rhs: lit.clone(),
                negated: false,
            },
            rest,
        )),
        [Token::Ident(p), Token::NotEq, Token::Str(lit), rest @ ..] => Ok((
            Expr::Equals {
                path: context_path(p, input)?,
                rhs: lit.clone(),
                negated: true,
            },
            rest,
        )),
        [Token::Ident(p), rest @ ..] => Ok((
            Expr::Truthy {
                path: context_path(p, input)?,
            },
            rest,
        )),
        _ => Err(unsupported(input, "unrecognized expression form")),
    }
}

fn context_path(dotted: &str, input: &str) -> CoreResult<Vec<String>> {
    let mut parts = dotted.split('.');
    match parts.next() {
        Some("context") => {}
        _ => return Err(unsupported(input, "path must start with 'context'")),
    }
    let path: Vec<String> = parts.map(|p| p.to_string()).collect();
    if path.iter().any(|p| p.is_empty()) {
        return Err(unsupported(input, "empty path component"));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contains_on_string() {
        let expr = parse_expr("context.text contains 'NDA'").unwrap();
        assert!(expr.evaluate(&json!({"text": "NDA draft"})));
        assert!(!expr.evaluate(&json!({"text": "draft"})));
        assert!(!expr.evaluate(&json!({})));
    }

    #[test]
    fn len_comparisons() {
        let ctx = json!({"parties": ["A", "B"], "title": "NDA"});
        assert!(parse_expr("len(context.parties) >= 2").unwrap().evaluate(&ctx));
        assert!(!parse_expr("len(context.parties) > 2").unwrap().evaluate(&ctx));
        assert!(parse_expr("len(context.title) == 3").unwrap().evaluate(&ctx));
        assert!(parse_expr("len(context.missing) == 0").unwrap().evaluate(&ctx));
    }

    #[test]
    fn equality_and_negation() {
        let ctx = json!({"meta": {"doc_type": "nda"}});
        assert!(parse_expr("context.meta.doc_type == 'nda'").unwrap().evaluate(&ctx));
        assert!(!parse_expr("context.meta.doc_type != 'nda'").unwrap().evaluate(&ctx));
        assert!(parse_expr("context.meta.doc_type != 'lease'").unwrap().evaluate(&ctx));
        // Missing path: == is false, != is true.
        assert!(!parse_expr("context.meta.absent == 'x'").unwrap().evaluate(&ctx));
        assert!(parse_expr("context.meta.absent != 'x'").unwrap().evaluate(&ctx));
    }

    #[test]
    fn bare_path_truthiness() {
        let expr = parse_expr("context.flags.signed").unwrap();
        assert!(expr.evaluate(&json!({"flags": {"signed": true}})));
        assert!(!expr.evaluate(&json!({"flags": {"signed": false}})));
        assert!(!expr.evaluate(&json!({"flags": {}})));
        assert!(expr.evaluate(&json!({"flags": {"signed": "yes"}})));
        assert!(!expr.evaluate(&json!({"flags": {"signed": ""}})));
        assert!(!expr.evaluate(&json!({"flags": {"signed": 0}})));
        assert!(expr.evaluate(&json!({"flags": {"signed": [1]}})));
    }

    #[test]
    fn boolean_literals() {
        assert!(parse_expr("true").unwrap().evaluate(&json!({})));
        assert!(!parse_expr("false").unwrap().evaluate(&json!({})));
    }

    #[test]
    fn contains_on_string_array() {
        let expr = parse_expr("context.flags_list contains 'urgent'").unwrap();
        assert!(expr.evaluate(&json!({"flags_list": ["minor", "urgent"]})));
        assert!(!expr.evaluate(&json!({"flags_list": ["minor"]})));
    }

    #[test]
    fn unsupported_syntax_is_a_hard_error() {
        assert!(matches!(
            parse_expr("context.a and context.b"),
            Err(CoreError::UnsupportedExpr(_))
        ));
        assert!(matches!(
            parse_expr("context.amount > 50"),
            Err(CoreError::UnsupportedExpr(_))
        ));
        assert!(matches!(
            parse_expr("text contains 'NDA'"),
            Err(CoreError::UnsupportedExpr(_))
        ));
        assert!(matches!(
            parse_expr("len(context.x) != 2"),
            Err(CoreError::UnsupportedExpr(_))
        ));
        assert!(matches!(
            parse_expr("context.text contains 'NDA' extra"),
            Err(CoreError::UnsupportedExpr(_))
        ));
        assert!(matches!(parse_expr(""), Err(CoreError::UnsupportedExpr(_))));
    }
}
