//! A minimal Lisp invoked when a candidate surface begins with `(`, letting
//! a dictionary entry compute its surface dynamically (e.g. today's date)
//! instead of storing a fixed string.
//!
//! No variables, no user-defined functions — just enough reader/evaluator
//! to drive a small closed set of builtins.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local};

#[derive(Debug, Clone)]
pub enum Value {
    List(Vec<Value>),
    Symbol(String),
    Str(String),
    /// A builtin bound to a symbol; produced only by evaluating that
    /// symbol, never written by the reader.
    Function(Builtin),
    /// Opaque runtime value threaded between builtins (currently only
    /// `current-datetime`'s result, consumed by `strftime`).
    DateTime(DateTime<Local>),
}

#[derive(Debug, Clone, Copy)]
pub enum Builtin {
    CurrentDatetime,
    Strftime,
    Concat,
}

/// Parses and evaluates one s-expression, returning the resulting string.
/// This is the only entry point `Node::surface` needs.
pub fn run(src: &str) -> Result<String> {
    let value = eval(&read(src)?)?;
    match value {
        Value::Str(s) => Ok(s),
        other => bail!("lisp expression did not evaluate to a string: {:?}", other),
    }
}

pub fn read(src: &str) -> Result<Value> {
    let tokens = tokenize(src);
    let mut tokens = tokens.into_iter().peekable();
    let value = read_from(&mut tokens)?;
    Ok(value)
}

fn tokenize(src: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            '(' | ')' => {
                tokens.push(chars.next().unwrap().to_string());
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '"' => {
                let mut token = String::new();
                token.push(chars.next().unwrap());
                for c in chars.by_ref() {
                    token.push(c);
                    if c == '"' {
                        break;
                    }
                }
                tokens.push(token);
            }
            _ => {
                let mut token = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '(' || c == ')' || c.is_whitespace() {
                        break;
                    }
                    token.push(c);
                    chars.next();
                }
                tokens.push(token);
            }
        }
    }
    tokens
}

fn read_from(tokens: &mut std::iter::Peekable<std::vec::IntoIter<String>>) -> Result<Value> {
    let token = tokens.next().ok_or_else(|| anyhow!("unexpected EOF while reading lisp"))?;
    match token.as_str() {
        "(" => {
            let mut values = Vec::new();
            loop {
                match tokens.peek() {
                    None => bail!("unexpected EOF while reading lisp list"),
                    Some(t) if t == ")" => {
                        tokens.next();
                        break;
                    }
                    _ => values.push(read_from(tokens)?),
                }
            }
            Ok(Value::List(values))
        }
        ")" => bail!("unexpected ')'"),
        _ => Ok(atom(&token)),
    }
}

fn atom(token: &str) -> Value {
    if token.starts_with('"') && token.ends_with('"') && token.len() >= 2 {
        Value::Str(token[1..token.len() - 1].to_string())
    } else {
        Value::Symbol(token.to_string())
    }
}

pub fn eval(x: &Value) -> Result<Value> {
    match x {
        Value::Symbol(symbol) => match symbol.as_str() {
            "current-datetime" => Ok(Value::Function(Builtin::CurrentDatetime)),
            "strftime" => Ok(Value::Function(Builtin::Strftime)),
            "." => Ok(Value::Function(Builtin::Concat)),
            other => bail!("Unknown function: {other}"),
        },
        Value::List(children) => {
            let mut evaluated = Vec::with_capacity(children.len());
            for child in children {
                evaluated.push(eval(child)?);
            }
            let (proc, args) = evaluated
                .split_first()
                .ok_or_else(|| anyhow!("cannot evaluate an empty list"))?;
            let Value::Function(builtin) = proc else {
                bail!("first element of a list must evaluate to a function");
            };
            apply(*builtin, args)
        }
        other => Ok(other.clone()),
    }
}

fn apply(builtin: Builtin, args: &[Value]) -> Result<Value> {
    match builtin {
        Builtin::CurrentDatetime => Ok(Value::DateTime(Local::now())),
        Builtin::Strftime => {
            let [dt, fmt] = args else {
                bail!("strftime takes exactly 2 arguments");
            };
            let Value::DateTime(dt) = dt else {
                bail!("strftime's first argument must be a datetime");
            };
            let Value::Str(fmt) = fmt else {
                bail!("strftime's second argument must be a string");
            };
            Ok(Value::Str(dt.format(fmt).to_string()))
        }
        Builtin::Concat => {
            let [a, b] = args else {
                bail!(". takes exactly 2 arguments");
            };
            let (Value::Str(a), Value::Str(b)) = (a, b) else {
                bail!(". requires two strings");
            };
            Ok(Value::Str(format!("{a}{b}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_strings() {
        assert_eq!(run(r#"(. "a" "b")"#).unwrap(), "ab");
    }

    #[test]
    fn strftime_formats_current_datetime() {
        let out = run(r#"(strftime (current-datetime) "%Y")"#).unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        assert!(run("(unknown-fn)").is_err());
    }

    #[test]
    fn nested_calls_are_supported() {
        let out = run(r#"(. (. "a" "b") "c")"#).unwrap();
        assert_eq!(out, "abc");
    }

    #[test]
    fn tokenizer_treats_spaces_inside_quotes_as_literal() {
        assert_eq!(run(r#"(. "a b" "c")"#).unwrap(), "a bc");
    }
}
