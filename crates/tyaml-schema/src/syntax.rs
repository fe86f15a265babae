//! # Type Syntax
//!
//! Parses the canonical string form of a [`Type`]. The reader works on a
//! character buffer with a cursor, one `read_*` method per production:
//!
//! ```text
//! type    := primary ('|' primary)*
//! primary := '(' type ')'
//!          | '[' ']' primary bounds?
//!          | '{' (entry | type | '...') (',' ...)* '}'
//!          | 'map' '[' type ']' primary
//!          | 'string' bounds? | 'any' | 'int' | 'float' | 'bool'
//!          | 'binary' | 'timestamp' | 'type' | 'null' | 'true' | 'false'
//!          | number | number '..' number? | '..' number | string-literal
//! entry   := (identifier | string-literal) '?'? ':' type
//! bounds  := '[' integer (',' integer)? ']'
//! ```
//!
//! Braces holding only entries are a [`StructMap`], braces holding only
//! types are a tuple, and mixing the two is an error.

use tyaml_core::{TypeDescriptor, TypeParser, Value};

use crate::error::SchemaError;
use crate::structmap::{StructEntry, StructMap};
use crate::types::Type;

type ReadResult<T> = Result<T, SchemaError>;

/// Parse `text` as a type.
pub fn parse(text: &str) -> ReadResult<Type> {
    let mut reader = TypeReader::new(text);
    reader.skip_ws();
    let ty = reader.read_type()?;
    reader.skip_ws();
    match reader.peek() {
        None => Ok(ty),
        Some(c) => Err(reader.unexpected(c)),
    }
}

/// [`TypeParser`] for type descriptor scalars, producing [`Type`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeSyntax;

impl TypeParser for TypeSyntax {
    fn parse_type(&self, text: &str) -> tyaml_core::Result<TypeDescriptor> {
        Ok(TypeDescriptor::new(parse(text)?))
    }
}

enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

struct TypeReader {
    data: Vec<char>,
    x: usize,
}

impl TypeReader {
    fn new(text: &str) -> Self {
        Self {
            data: text.chars().collect(),
            x: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Cursor
    // -----------------------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.data.get(self.x).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.data.get(self.x + n).copied()
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.x += 1;
        }
    }

    fn unexpected(&self, c: char) -> SchemaError {
        SchemaError::syntax(format!("unexpected character '{c}' at offset {}", self.x), self.x)
    }

    fn eof(&self) -> SchemaError {
        SchemaError::syntax("unexpected end of input", self.x)
    }

    fn expect(&mut self, expected: char) -> ReadResult<()> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == expected => {
                self.x += 1;
                Ok(())
            }
            Some(c) => Err(self.unexpected(c)),
            None => Err(self.eof()),
        }
    }

    // -----------------------------------------------------------------------
    // Productions
    // -----------------------------------------------------------------------

    fn read_type(&mut self) -> ReadResult<Type> {
        let mut members = Vec::new();
        loop {
            match self.read_primary()? {
                Type::Union(nested) => members.extend(nested),
                other => members.push(other),
            }
            self.skip_ws();
            if self.peek() != Some('|') {
                break;
            }
            self.x += 1;
        }
        if members.len() == 1 {
            Ok(members.remove(0))
        } else {
            Ok(Type::Union(members))
        }
    }

    fn read_primary(&mut self) -> ReadResult<Type> {
        self.skip_ws();
        let Some(c) = self.peek() else {
            return Err(self.eof());
        };
        match c {
            '(' => {
                self.x += 1;
                let ty = self.read_type()?;
                self.expect(')')?;
                Ok(ty)
            }
            '[' => {
                self.x += 1;
                self.expect(']')?;
                let element = self.read_primary()?;
                let (min, max) = self.read_bounds()?.unwrap_or((0, None));
                Ok(Type::Sequence {
                    element: Box::new(element),
                    min,
                    max,
                })
            }
            '{' => self.read_braces(),
            '"' => Ok(Type::Exact(Value::String(self.read_string()?))),
            '.' if self.starts_with("..") => {
                self.x += 2;
                let max = self.read_number()?;
                range(None, Some(max), self.x)
            }
            '-' | '0'..='9' => self.read_number_or_range(),
            c if is_ident_start(c) => self.read_named(),
            c => Err(self.unexpected(c)),
        }
    }

    fn read_named(&mut self) -> ReadResult<Type> {
        let start = self.x;
        let word = self.read_identifier();
        match word.as_str() {
            "any" => Ok(Type::Any),
            "int" => Ok(Type::Int),
            "float" => Ok(Type::Float),
            "bool" => Ok(Type::Bool),
            "binary" => Ok(Type::Binary),
            "timestamp" => Ok(Type::Timestamp),
            "type" => Ok(Type::Type),
            "null" => Ok(Type::Null),
            "true" => Ok(Type::Exact(Value::Bool(true))),
            "false" => Ok(Type::Exact(Value::Bool(false))),
            "string" => {
                let (min, max) = self.read_bounds()?.unwrap_or((0, None));
                Ok(Type::String { min, max })
            }
            "map" => {
                self.expect('[')?;
                let key = self.read_type()?;
                self.expect(']')?;
                let value = self.read_primary()?;
                Ok(Type::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            _ => Err(SchemaError::syntax(format!("unknown type name '{word}'"), start)),
        }
    }

    /// Optional `[min]` or `[min,max]` directly after a type.
    fn read_bounds(&mut self) -> ReadResult<Option<(usize, Option<usize>)>> {
        if self.peek() != Some('[') {
            return Ok(None);
        }
        let start = self.x;
        self.x += 1;
        self.skip_ws();
        let min = self.read_size()?;
        self.skip_ws();
        let max = if self.peek() == Some(',') {
            self.x += 1;
            self.skip_ws();
            Some(self.read_size()?)
        } else {
            None
        };
        self.expect(']')?;
        if max.is_some_and(|max| max < min) {
            return Err(SchemaError::syntax(
                format!("size bounds [{min},{}] are inverted", max.unwrap_or(min)),
                start,
            ));
        }
        Ok(Some((min, max)))
    }

    fn read_size(&mut self) -> ReadResult<usize> {
        let start = self.x;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.x += 1;
        }
        if start == self.x {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c),
                None => self.eof(),
            });
        }
        let digits: String = self.data[start..self.x].iter().collect();
        digits
            .parse()
            .map_err(|_| SchemaError::syntax(format!("size {digits} is out of range"), start))
    }

    fn read_number_or_range(&mut self) -> ReadResult<Type> {
        let min = self.read_number()?;
        if !self.starts_with("..") {
            return Ok(Type::Exact(match min {
                Number::Int(i) => Value::Int(i),
                Number::Float(f) => Value::Float(f),
            }));
        }
        self.x += 2;
        let max = match self.peek() {
            Some('-' | '0'..='9') => Some(self.read_number()?),
            _ => None,
        };
        range(Some(min), max, self.x)
    }

    fn read_number(&mut self) -> ReadResult<Number> {
        let start = self.x;
        if self.peek() == Some('-') {
            self.x += 1;
        }
        let digits_start = self.x;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.x += 1;
        }
        if digits_start == self.x {
            return Err(match self.peek() {
                Some(c) => self.unexpected(c),
                None => self.eof(),
            });
        }
        let mut float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            float = true;
            self.x += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.x += 1;
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some('-' | '+')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                float = true;
                self.x += 1 + sign;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.x += 1;
                }
            }
        }
        let text: String = self.data[start..self.x].iter().collect();
        let number = if float {
            text.parse().map(Number::Float).ok()
        } else {
            text.parse().map(Number::Int).ok()
        };
        number.ok_or_else(|| SchemaError::syntax(format!("invalid number '{text}'"), start))
    }

    fn read_braces(&mut self) -> ReadResult<Type> {
        let start = self.x;
        self.x += 1;
        let mut entries: Vec<StructEntry> = Vec::new();
        let mut elements = Vec::new();
        let mut additional = false;
        loop {
            self.skip_ws();
            match self.peek() {
                Some('}') => {
                    self.x += 1;
                    break;
                }
                None => return Err(self.eof()),
                _ => {}
            }
            if self.starts_with("...") {
                self.x += 3;
                additional = true;
            } else if let Some((key, required)) = self.read_entry_key()? {
                if entries.iter().any(|e| e.key == key) {
                    return Err(SchemaError::syntax(format!("duplicate key '{key}'"), self.x));
                }
                let ty = self.read_type()?;
                entries.push(StructEntry::new(key, ty, required));
            } else {
                elements.push(self.read_type()?);
            }
            self.skip_ws();
            match self.peek() {
                Some(',') => self.x += 1,
                Some('}') => {
                    self.x += 1;
                    break;
                }
                Some(c) => return Err(self.unexpected(c)),
                None => return Err(self.eof()),
            }
        }

        if !entries.is_empty() && !elements.is_empty() {
            return Err(SchemaError::syntax("mix of elements and map entries", start));
        }
        if elements.is_empty() {
            Ok(Type::Struct(StructMap::new(entries, additional)))
        } else if additional {
            Err(SchemaError::syntax("'...' is only allowed in a struct", start))
        } else {
            Ok(Type::Tuple(elements))
        }
    }

    /// Reads `key:` or `key?:` and returns the key and whether it is
    /// required. Restores the cursor and returns `None` when the input is
    /// not an entry.
    fn read_entry_key(&mut self) -> ReadResult<Option<(String, bool)>> {
        let save = self.x;
        let key = match self.peek() {
            Some('"') => self.read_string()?,
            Some(c) if is_ident_start(c) => self.read_identifier(),
            _ => return Ok(None),
        };
        self.skip_ws();
        let optional = self.peek() == Some('?');
        if optional {
            self.x += 1;
            self.skip_ws();
        }
        if self.peek() == Some(':') {
            self.x += 1;
            Ok(Some((key, !optional)))
        } else {
            self.x = save;
            Ok(None)
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.x;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.x += 1;
        }
        self.data[start..self.x].iter().collect()
    }

    fn read_string(&mut self) -> ReadResult<String> {
        self.x += 1;
        let mut out = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(self.eof());
            };
            self.x += 1;
            match c {
                '"' => return Ok(out),
                '\\' => out.push(self.read_escape()?),
                c => out.push(c),
            }
        }
    }

    fn read_escape(&mut self) -> ReadResult<char> {
        let Some(c) = self.peek() else {
            return Err(self.eof());
        };
        self.x += 1;
        let simple = match c {
            '0' => '\0',
            'a' => '\u{07}',
            'b' => '\u{08}',
            't' | '\t' => '\t',
            'n' => '\n',
            'v' => '\u{0b}',
            'f' => '\u{0c}',
            'r' => '\r',
            'e' => '\u{1b}',
            ' ' => ' ',
            '"' => '"',
            '/' => '/',
            '\\' => '\\',
            'N' => '\u{85}',
            '_' => '\u{a0}',
            'L' => '\u{2028}',
            'P' => '\u{2029}',
            'x' => return self.read_hex(2),
            'u' => return self.read_hex(4),
            'U' => return self.read_hex(8),
            other => {
                return Err(SchemaError::syntax(
                    format!("invalid escape '\\{other}'"),
                    self.x - 2,
                ))
            }
        };
        Ok(simple)
    }

    fn read_hex(&mut self, len: usize) -> ReadResult<char> {
        let start = self.x;
        if self.x + len > self.data.len() {
            return Err(self.eof());
        }
        let digits: String = self.data[start..start + len].iter().collect();
        self.x += len;
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| SchemaError::syntax(format!("invalid escape digits '{digits}'"), start))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn range(min: Option<Number>, max: Option<Number>, offset: usize) -> ReadResult<Type> {
    let is_float = |n: &Option<Number>| matches!(n, Some(Number::Float(_)));
    if is_float(&min) || is_float(&max) {
        let min = min.map(|n| n.as_f64());
        let max = max.map(|n| n.as_f64());
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(SchemaError::syntax("range is inverted", offset));
            }
        }
        return Ok(Type::FloatRange { min, max });
    }
    let as_int = |n: Option<Number>| match n {
        Some(Number::Int(i)) => Some(i),
        _ => None,
    };
    let (min, max) = (as_int(min), as_int(max));
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(SchemaError::syntax("range is inverted", offset));
        }
    }
    Ok(Type::IntRange { min, max })
}
