//! Annotation model and the argument grammar shared by both syntaxes.
//!
//! ```text
//! @OA\Get(path="/pets", tags={"pets"}, @OA\Response(response=200, description="ok"))
//! #[oa::get(path = "/pets", tags = ["pets"], oa::response(response = 200, description = "ok"))]
//! ```

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

/// Marker that opens a nested annotation in a given syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// `@OA\Name(...)`
    DocBlock,
    /// `oa::name(...)`
    Attribute,
}

impl Syntax {
    fn marker(self) -> &'static str {
        match self {
            Syntax::DocBlock => "@OA\\",
            Syntax::Attribute => "oa::",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Bare identifier, resolved against bootstrap constants.
    Const(String),
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) | Value::Const(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Canonical name, e.g. `Get` or `Response`.
    pub name: String,
    pub args: IndexMap<String, Value>,
    pub children: Vec<Annotation>,
    /// 1-based line of the annotation in its source file.
    pub line: usize,
}

impl Annotation {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} on line {line}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
}

/// Normalizes `get`, `GET` or `Get` to `Get`, and `requestBody`-style names
/// keep their inner casing.
pub fn canonical_name(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => {
            let rest: String = chars.collect();
            let rest = if rest.chars().all(|c| c.is_ascii_uppercase()) {
                rest.to_ascii_lowercase()
            } else {
                rest
            };
            format!("{}{}", first.to_ascii_uppercase(), rest)
        }
        None => String::new(),
    }
}

/// Parses one annotation starting right after its marker, e.g. at `Get(`
/// in `@OA\Get(...)`. `line` is the line the text starts on; newlines in
/// `text` advance it.
///
/// Returns the annotation and the number of bytes consumed.
///
/// # Errors
/// Returns [`SyntaxError`] when the text is not a well-formed annotation.
pub fn parse(text: &str, line: usize, syntax: Syntax) -> Result<(Annotation, usize), SyntaxError> {
    let mut p = Parser {
        src: text,
        pos: 0,
        line,
        syntax,
    };
    let ann = p.annotation()?;
    Ok((ann, p.pos))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    syntax: Syntax,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn err<T>(&self, message: impl Into<String>) -> Result<T, SyntaxError> {
        Err(SyntaxError {
            message: message.into(),
            line: self.line,
        })
    }

    fn expect(&mut self, want: char) -> Result<(), SyntaxError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => self.err(format!("Expected '{want}', found '{c}'")),
            None => self.err(format!("Expected '{want}', found end of input")),
        }
    }

    fn ident(&mut self) -> Result<String, SyntaxError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
        }
        if start == self.pos {
            return self.err("Expected an identifier");
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn annotation(&mut self) -> Result<Annotation, SyntaxError> {
        let line = self.line;
        let name = canonical_name(&self.ident()?);
        let mut ann = Annotation {
            name,
            args: IndexMap::new(),
            children: Vec::new(),
            line,
        };
        if self.peek() != Some('(') {
            return Ok(ann);
        }
        self.bump();
        loop {
            self.skip_ws();
            if self.peek() == Some(')') {
                self.bump();
                return Ok(ann);
            }
            if self.rest().starts_with(self.syntax.marker()) {
                self.pos += self.syntax.marker().len();
                let child = self.annotation()?;
                ann.children.push(child);
            } else {
                let key = self.ident()?;
                self.skip_ws();
                match self.peek() {
                    Some('=' | ':') => {
                        self.bump();
                    }
                    _ => return self.err(format!("Expected '=' after \"{key}\"")),
                }
                let value = self.value()?;
                ann.args.insert(key, value);
            }
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(')') => {}
                Some(c) => return self.err(format!("Unexpected '{c}' in @{}()", ann.name)),
                None => return self.err(format!("Unterminated @{}()", ann.name)),
            }
        }
    }

    fn value(&mut self) -> Result<Value, SyntaxError> {
        self.skip_ws();
        match self.peek() {
            Some('"') => self.string().map(Value::Str),
            Some(open @ ('{' | '[')) => {
                let close = if open == '{' { '}' } else { ']' };
                self.bump();
                let mut items = Vec::new();
                loop {
                    self.skip_ws();
                    if self.peek() == Some(close) {
                        self.bump();
                        return Ok(Value::List(items));
                    }
                    items.push(self.value()?);
                    self.skip_ws();
                    if self.peek() == Some(',') {
                        self.bump();
                    } else {
                        self.expect(close)?;
                        return Ok(Value::List(items));
                    }
                }
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let start = self.pos;
                self.bump();
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
                let digits = &self.src[start..self.pos];
                match digits.parse() {
                    Ok(n) => Ok(Value::Int(n)),
                    Err(_) => self.err(format!("Invalid number \"{digits}\"")),
                }
            }
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                let word = self.ident()?;
                Ok(match word.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    _ => Value::Const(word),
                })
            }
            Some(c) => self.err(format!("Unexpected '{c}'")),
            None => self.err("Unexpected end of input"),
        }
    }

    fn string(&mut self) -> Result<String, SyntaxError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some(c @ ('"' | '\\')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => break,
                },
                Some(c) => out.push(c),
                None => break,
            }
        }
        self.err("Unterminated string")
    }
}
