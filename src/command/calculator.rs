//! Calculator command / 计算器命令
//!
//! Sandboxed arithmetic only: the input is stripped down to digits,
//! decimals, parentheses and the four operators before anything is
//! evaluated, and a malformed residual expression fails safely with
//! an "invalid expression" result instead of panicking.

use async_trait::async_trait;
use serde_json::json;

use super::CommandHandler;
use crate::models::{CommandOutcome, OutcomeKind};

pub struct CalculatorCommand;

impl CalculatorCommand {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CalculatorCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandHandler for CalculatorCommand {
    fn kind(&self) -> OutcomeKind {
        OutcomeKind::Calculator
    }

    async fn execute(&self, args: &str) -> CommandOutcome {
        let sanitized = sanitize(args);
        if sanitized.is_empty() {
            return CommandOutcome::fail(self.kind(), "Empty expression");
        }

        match evaluate(&sanitized) {
            Ok(value) => CommandOutcome::ok(
                self.kind(),
                json!({
                    "expression": sanitized,
                    "value": value,
                    "display": format_value(value),
                }),
            ),
            Err(reason) => {
                tracing::debug!("Invalid expression {:?}: {}", sanitized, reason);
                CommandOutcome::fail(self.kind(), "Invalid expression")
            }
        }
    }
}

/// Delete every character outside the arithmetic alphabet / 删除算术字符集之外的字符
fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.'))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    /// Unary minus / 一元负号
    Neg,
    LParen,
    RParen,
}

fn precedence(token: &Token) -> u8 {
    match token {
        Token::Neg => 3,
        Token::Star | Token::Slash => 2,
        Token::Plus | Token::Minus => 1,
        _ => 0,
    }
}

fn is_operator(token: &Token) -> bool {
    matches!(
        token,
        Token::Plus | Token::Minus | Token::Star | Token::Slash | Token::Neg
    )
}

/// Tokenize the sanitized expression / 词法切分
///
/// A `+`/`-` in operand position (expression start, after an operator
/// or after `(`) is unary: unary plus is dropped, unary minus becomes
/// its own token.
fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut number = String::new();

    let flush_number = |number: &mut String, tokens: &mut Vec<Token>| -> Result<(), String> {
        if number.is_empty() {
            return Ok(());
        }
        let value: f64 = number
            .parse()
            .map_err(|_| format!("bad number {:?}", number))?;
        tokens.push(Token::Number(value));
        number.clear();
        Ok(())
    };

    for c in expr.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }

        flush_number(&mut number, &mut tokens)?;

        let unary_position = match tokens.last() {
            None => true,
            Some(last) => is_operator(last) || *last == Token::LParen,
        };

        let token = match c {
            '+' if unary_position => continue,
            '-' if unary_position => Token::Neg,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => return Err(format!("unexpected character {:?}", c)),
        };
        tokens.push(token);
    }

    flush_number(&mut number, &mut tokens)?;
    Ok(tokens)
}

/// Shunting-yard to reverse polish notation / 调度场算法转逆波兰式
fn to_rpn(tokens: Vec<Token>) -> Result<Vec<Token>, String> {
    let mut output: Vec<Token> = Vec::new();
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(_) => output.push(token),
            Token::LParen => stack.push(token),
            Token::RParen => loop {
                match stack.pop() {
                    Some(Token::LParen) => break,
                    Some(op) => output.push(op),
                    None => return Err("mismatched parenthesis".to_string()),
                }
            },
            op => {
                while let Some(&top) = stack.last() {
                    if !is_operator(&top) {
                        break;
                    }
                    // Neg is right-associative, binaries are left-associative
                    let pops = if op == Token::Neg {
                        precedence(&top) > precedence(&op)
                    } else {
                        precedence(&top) >= precedence(&op)
                    };
                    if !pops {
                        break;
                    }
                    stack.pop();
                    output.push(top);
                }
                stack.push(op);
            }
        }
    }

    while let Some(op) = stack.pop() {
        if op == Token::LParen {
            return Err("mismatched parenthesis".to_string());
        }
        output.push(op);
    }

    Ok(output)
}

/// Evaluate the RPN stream / 求值逆波兰式
fn eval_rpn(rpn: Vec<Token>) -> Result<f64, String> {
    let mut stack: Vec<f64> = Vec::new();

    for token in rpn {
        match token {
            Token::Number(value) => stack.push(value),
            Token::Neg => {
                let value = stack.pop().ok_or("missing operand")?;
                stack.push(-value);
            }
            op => {
                let rhs = stack.pop().ok_or("missing operand")?;
                let lhs = stack.pop().ok_or("missing operand")?;
                let value = match op {
                    Token::Plus => lhs + rhs,
                    Token::Minus => lhs - rhs,
                    Token::Star => lhs * rhs,
                    Token::Slash => lhs / rhs,
                    _ => return Err("unexpected token".to_string()),
                };
                stack.push(value);
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(value), true) if value.is_finite() => Ok(value),
        (Some(value), true) => Err(format!("non-finite result {}", value)),
        _ => Err("malformed expression".to_string()),
    }
}

fn evaluate(expr: &str) -> Result<f64, String> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err("empty expression".to_string());
    }
    eval_rpn(to_rpn(tokens)?)
}

/// Render without a trailing `.0` for whole numbers / 整数结果不带小数点
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_precedence() {
        assert_eq!(evaluate("2+2*3").unwrap(), 8.0);
        assert_eq!(evaluate("2*3+2").unwrap(), 8.0);
        assert_eq!(evaluate("10-4/2").unwrap(), 8.0);
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(evaluate("(2+2)*3").unwrap(), 12.0);
        assert_eq!(evaluate("((2+3)*4)/2").unwrap(), 10.0);
    }

    #[test]
    fn test_decimals() {
        assert_eq!(evaluate("1.5*2").unwrap(), 3.0);
        assert!((evaluate("0.1+0.2").unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_unary_minus() {
        assert_eq!(evaluate("-5+3").unwrap(), -2.0);
        assert_eq!(evaluate("-(2+3)").unwrap(), -5.0);
        assert_eq!(evaluate("2*-3").unwrap(), -6.0);
        assert_eq!(evaluate("--5").unwrap(), 5.0);
    }

    #[test]
    fn test_malformed_expressions_fail() {
        assert!(evaluate("2+*3").is_err());
        assert!(evaluate("(2+3").is_err());
        assert!(evaluate(")(").is_err());
        assert!(evaluate("1.2.3").is_err());
        assert!(evaluate("+").is_err());
    }

    #[test]
    fn test_division_by_zero_fails() {
        assert!(evaluate("5/0").is_err());
        assert!(evaluate("0/0").is_err());
    }

    #[test]
    fn test_sanitize_strips_foreign_characters() {
        assert_eq!(sanitize("2+2abc*3"), "2+2*3");
        assert_eq!(sanitize("2 + 2"), "2+2");
        assert_eq!(sanitize("alert(1)"), "(1)");
        assert_eq!(sanitize("你好"), "");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(8.0), "8");
        assert_eq!(format_value(3.5), "3.5");
        assert_eq!(format_value(-2.0), "-2");
    }

    #[tokio::test]
    async fn test_execute_success() {
        let command = CalculatorCommand::new();
        let outcome = command.execute("2+2*3").await;
        assert!(outcome.success);
        assert_eq!(outcome.data.unwrap()["display"], "8");
    }

    #[tokio::test]
    async fn test_execute_invalid_expression() {
        let command = CalculatorCommand::new();
        let outcome = command.execute("what is love").await;
        assert!(!outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("Invalid expression"));
    }
}
