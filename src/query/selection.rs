//! Query document parser
//!
//! Accepts the selection subset of GraphQL:
//!
//! ```text
//! query Named($id: Int! = 1) {
//!   ensemble(id: $id) { name updateSource }
//!   all: allEnsembles { id }   # alias
//! }
//! ```
//!
//! Fragments, directives, list and object argument values are rejected.

use crate::{Error, Result};

/// Literal or variable argument value
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Int(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Null,
    Variable(String),
}

/// One selected field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Vec<(String, InputValue)>,
    pub selection: Vec<Field>,
}

impl Field {
    /// Key under which this field appears in the response
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn argument(&self, name: &str) -> Option<&InputValue> {
        self.arguments
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, value)| value)
    }
}

/// A parsed query document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub operation_name: Option<String>,
    /// Default values declared on variable definitions
    pub variable_defaults: Vec<(String, InputValue)>,
    pub selection: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    Punct(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Name(name) => write!(f, "{}", name),
            Token::Int(value) => write!(f, "{}", value),
            Token::Float(value) => write!(f, "{}", value),
            Token::Str(value) => write!(f, "\"{}\"", value),
            Token::Punct(c) => write!(f, "{}", c),
        }
    }
}

fn syntax_error(message: impl Into<String>) -> Error {
    Error::Query(format!("Syntax error: {}", message.into()))
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' | ',' | '\u{feff}' => i += 1,
            '#' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '.' => return Err(syntax_error("fragments are not supported")),
            '@' => return Err(syntax_error("directives are not supported")),
            '{' | '}' | '(' | ')' | ':' | '$' | '!' | '[' | ']' | '=' => {
                tokens.push(Token::Punct(c));
                i += 1;
            }
            '"' => {
                let (value, next) = read_string(&chars, i + 1)?;
                tokens.push(Token::Str(value));
                i = next;
            }
            c if c == '-' || c.is_ascii_digit() => {
                let start = i;
                i += 1;
                let mut is_float = false;
                while i < chars.len() {
                    match chars[i] {
                        d if d.is_ascii_digit() => i += 1,
                        '.' | 'e' | 'E' => {
                            is_float = true;
                            i += 1;
                        }
                        '+' | '-' if matches!(chars[i - 1], 'e' | 'E') => i += 1,
                        _ => break,
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let token = if is_float {
                    text.parse().map(Token::Float).ok()
                } else {
                    text.parse().map(Token::Int).ok()
                };
                tokens.push(token.ok_or_else(|| syntax_error(format!("invalid number {}", text)))?);
            }
            c if c == '_' || c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i] == '_' || chars[i].is_ascii_alphanumeric()) {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            other => return Err(syntax_error(format!("unexpected character '{}'", other))),
        }
    }

    Ok(tokens)
}

/// Read a string body starting after the opening quote.
/// Returns the unescaped value and the index after the closing quote.
fn read_string(chars: &[char], mut i: usize) -> Result<(String, usize)> {
    let mut value = String::new();
    while i < chars.len() {
        match chars[i] {
            '"' => return Ok((value, i + 1)),
            '\\' => {
                let escaped = chars.get(i + 1).ok_or_else(|| syntax_error("unterminated string"))?;
                match escaped {
                    '"' => value.push('"'),
                    '\\' => value.push('\\'),
                    '/' => value.push('/'),
                    'b' => value.push('\u{8}'),
                    'f' => value.push('\u{c}'),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'u' => {
                        let hex: String = chars.get(i + 2..i + 6).unwrap_or_default().iter().collect();
                        let c = u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| syntax_error(format!("invalid unicode escape \\u{}", hex)))?;
                        value.push(c);
                        i += 4;
                    }
                    other => return Err(syntax_error(format!("invalid escape \\{}", other))),
                }
                i += 2;
            }
            '\n' => return Err(syntax_error("unterminated string")),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }
    Err(syntax_error("unterminated string"))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn at_punct(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.at_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<()> {
        match self.advance() {
            Some(Token::Punct(found)) if found == c => Ok(()),
            Some(found) => Err(syntax_error(format!("expected '{}', found '{}'", c, found))),
            None => Err(syntax_error(format!("expected '{}', found end of document", c))),
        }
    }

    fn expect_name(&mut self) -> Result<String> {
        match self.advance() {
            Some(Token::Name(name)) => Ok(name),
            Some(found) => Err(syntax_error(format!("expected a name, found '{}'", found))),
            None => Err(syntax_error("expected a name, found end of document")),
        }
    }

    fn document(&mut self) -> Result<Document> {
        let mut operation_name = None;
        let mut variable_defaults = Vec::new();

        match self.peek() {
            Some(Token::Name(keyword)) if keyword == "query" => {
                self.pos += 1;
                if let Some(Token::Name(_)) = self.peek() {
                    operation_name = Some(self.expect_name()?);
                }
                if self.at_punct('(') {
                    variable_defaults = self.variable_definitions()?;
                }
            }
            Some(Token::Name(keyword)) => {
                return Err(syntax_error(format!("unsupported operation '{}'", keyword)));
            }
            _ => {}
        }

        let selection = self.selection_set()?;
        if let Some(extra) = self.peek() {
            return Err(syntax_error(format!("unexpected '{}' after document", extra)));
        }

        Ok(Document {
            operation_name,
            variable_defaults,
            selection: merge_fields(selection)?,
        })
    }

    fn variable_definitions(&mut self) -> Result<Vec<(String, InputValue)>> {
        self.expect_punct('(')?;
        let mut defaults = Vec::new();
        while !self.eat_punct(')') {
            self.expect_punct('$')?;
            let name = self.expect_name()?;
            self.expect_punct(':')?;
            self.type_reference()?;
            if self.eat_punct('=') {
                let value = self.value()?;
                defaults.push((name, value));
            }
        }
        Ok(defaults)
    }

    /// Types are accepted for compatibility and otherwise ignored
    fn type_reference(&mut self) -> Result<()> {
        if self.eat_punct('[') {
            self.type_reference()?;
            self.expect_punct(']')?;
        } else {
            self.expect_name()?;
        }
        self.eat_punct('!');
        Ok(())
    }

    fn selection_set(&mut self) -> Result<Vec<Field>> {
        self.expect_punct('{')?;
        let mut fields = Vec::new();
        while !self.eat_punct('}') {
            if self.peek().is_none() {
                return Err(syntax_error("unterminated selection set"));
            }
            fields.push(self.field()?);
        }
        if fields.is_empty() {
            return Err(syntax_error("empty selection set"));
        }
        Ok(fields)
    }

    fn field(&mut self) -> Result<Field> {
        let first = self.expect_name()?;
        let (alias, name) = if self.eat_punct(':') {
            (Some(first), self.expect_name()?)
        } else {
            (None, first)
        };

        let mut arguments = Vec::new();
        if self.eat_punct('(') {
            while !self.eat_punct(')') {
                let arg = self.expect_name()?;
                self.expect_punct(':')?;
                arguments.push((arg, self.value()?));
            }
        }

        let selection = if self.at_punct('{') {
            self.selection_set()?
        } else {
            Vec::new()
        };

        Ok(Field {
            alias,
            name,
            arguments,
            selection,
        })
    }

    fn value(&mut self) -> Result<InputValue> {
        match self.advance() {
            Some(Token::Punct('$')) => Ok(InputValue::Variable(self.expect_name()?)),
            Some(Token::Int(value)) => Ok(InputValue::Int(value)),
            Some(Token::Float(value)) => Ok(InputValue::Float(value)),
            Some(Token::Str(value)) => Ok(InputValue::String(value)),
            Some(Token::Name(name)) => match name.as_str() {
                "true" => Ok(InputValue::Boolean(true)),
                "false" => Ok(InputValue::Boolean(false)),
                "null" => Ok(InputValue::Null),
                other => Err(syntax_error(format!("enum value '{}' is not supported", other))),
            },
            Some(found) => Err(syntax_error(format!("unexpected '{}' in value", found))),
            None => Err(syntax_error("expected a value, found end of document")),
        }
    }
}

/// Collapse fields sharing a response key into one field.
///
/// Repeated selections of the same field with the same arguments have their
/// sub-selections concatenated, recursively. The same key bound to a
/// different field or to different arguments is rejected.
fn merge_fields(fields: Vec<Field>) -> Result<Vec<Field>> {
    let mut merged: Vec<Field> = Vec::with_capacity(fields.len());
    for field in fields {
        match merged
            .iter_mut()
            .find(|existing| existing.response_key() == field.response_key())
        {
            Some(existing) => {
                if existing.name != field.name {
                    return Err(Error::Query(format!(
                        "Fields \"{}\" conflict because \"{}\" and \"{}\" are different fields",
                        field.response_key(),
                        existing.name,
                        field.name
                    )));
                }
                if !same_arguments(&existing.arguments, &field.arguments) {
                    return Err(Error::Query(format!(
                        "Fields \"{}\" conflict because they have differing arguments",
                        field.response_key()
                    )));
                }
                existing.selection.extend(field.selection);
            }
            None => merged.push(field),
        }
    }

    for field in &mut merged {
        let selection = std::mem::take(&mut field.selection);
        field.selection = merge_fields(selection)?;
    }
    Ok(merged)
}

fn same_arguments(a: &[(String, InputValue)], b: &[(String, InputValue)]) -> bool {
    a.len() == b.len() && a.iter().all(|arg| b.contains(arg))
}

/// Parse a query document
pub fn parse(source: &str) -> Result<Document> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.document()
}
