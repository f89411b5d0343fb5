//! Reader from rule source text to values.

use crate::error::MatchError;
use crate::value::{Kind, Value};
use std::iter::Peekable;
use std::str::CharIndices;

fn error<S, T>(offset: usize, message: S) -> Result<T, MatchError>
where
    S: ToString,
{
    Err(MatchError::Syntax {
        offset,
        message: message.to_string(),
    })
}

/// \return whether `c` ends a word.
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | '"' | ';' | ',')
}

/// Represents the state used to read source text.
struct Reader<'a> {
    /// The remaining input.
    input: Peekable<CharIndices<'a>>,

    /// Length of the whole source, the offset of the end.
    len: usize,
}

impl<'a> Reader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            input: source.char_indices().peekable(),
            len: source.len(),
        }
    }

    /// \return the offset of the next char.
    fn offset(&mut self) -> usize {
        self.input.peek().map_or(self.len, |&(idx, _)| idx)
    }

    fn peek(&mut self) -> Option<char> {
        self.input.peek().map(|&(_, c)| c)
    }

    fn next(&mut self) -> Option<char> {
        self.input.next().map(|(_, c)| c)
    }

    /// Consume the next char if it is `c`.
    fn try_consume(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), MatchError> {
        let offset = self.offset();
        if self.try_consume(c) {
            Ok(())
        } else {
            error(offset, format!("expected `{}`", c))
        }
    }

    /// Skip whitespace, commas and comments.
    fn skip_blanks(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' {
                self.next();
            } else if c == ';' {
                while !matches!(self.next(), None | Some('\n')) {}
            } else {
                break;
            }
        }
    }

    /// Read values until `close`, or until the end of input if None.
    fn read_items(&mut self, close: Option<char>) -> Result<Vec<Value>, MatchError> {
        let start = self.offset();
        let mut items = Vec::new();
        loop {
            self.skip_blanks();
            match (self.peek(), close) {
                (None, None) => return Ok(items),
                (None, Some(c)) => {
                    return error(start, format!("missing `{}`", c));
                }
                (Some(c), Some(want)) if c == want => {
                    self.next();
                    return Ok(items);
                }
                (Some(c @ (']' | ')')), _) => {
                    return error(self.offset(), format!("unexpected `{}`", c));
                }
                _ => items.push(self.read_value()?),
            }
        }
    }

    fn read_value(&mut self) -> Result<Value, MatchError> {
        let offset = self.offset();
        let Some(c) = self.next() else {
            return error(offset, "unexpected end of input");
        };
        match c {
            '[' => Ok(Value::Block(self.read_items(Some(']'))?)),
            '(' => Ok(Value::Group(self.read_items(Some(')'))?)),
            ':' if self.try_consume('(') => Ok(Value::GetGroup(self.read_items(Some(')'))?)),
            '"' => Ok(Value::Text(self.read_string(offset)?)),
            '\'' => {
                let bare = |c: char| c.is_whitespace() || matches!(c, ']' | ')' | ',' | ';');
                if self.peek().map_or(true, bare) {
                    return error(offset, "nothing to quote");
                }
                Ok(Value::quoted(self.read_value()?))
            }
            '#' if self.try_consume('"') => {
                let s = self.read_string(offset)?;
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => error(offset, "a char literal holds exactly one char"),
                }
            }
            '#' if self.try_consume('{') => self.read_binary(offset),
            '<' => self.read_tag(offset),
            '~' if self.try_consume('(') => {
                let items = self.read_items(Some(')'))?;
                self.expect('~')?;
                Ok(Value::Splice(items))
            }
            '|' if self.peek().map_or(true, is_delimiter) => Ok(Value::Bar),
            c => {
                let word = self.read_word(c);
                classify(offset, word)
            }
        }
    }

    /// Read the rest of a string whose opening quote is consumed.
    fn read_string(&mut self, start: usize) -> Result<String, MatchError> {
        let mut s = String::new();
        loop {
            let offset = self.offset();
            match self.next() {
                None => return error(start, "unterminated string"),
                Some('"') => return Ok(s),
                Some('\\') => match self.next() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('0') => s.push('\0'),
                    Some(c @ ('"' | '\\')) => s.push(c),
                    Some(c) => return error(offset, format!("unknown escape `\\{}`", c)),
                    None => return error(start, "unterminated string"),
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn read_binary(&mut self, start: usize) -> Result<Value, MatchError> {
        let mut digits = Vec::new();
        loop {
            let offset = self.offset();
            match self.next() {
                None => return error(start, "unterminated binary"),
                Some('}') => break,
                Some(c) if c.is_whitespace() => {}
                Some(c) => match c.to_digit(16) {
                    // A hex digit always fits in a byte.
                    Some(d) => digits.push(d as u8),
                    None => return error(offset, format!("`{}` is not a hex digit", c)),
                },
            }
        }
        if digits.len() % 2 != 0 {
            return error(start, "a binary needs an even number of hex digits");
        }
        Ok(Value::Binary(
            digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]).collect(),
        ))
    }

    fn read_tag(&mut self, start: usize) -> Result<Value, MatchError> {
        let mut name = String::new();
        loop {
            match self.next() {
                Some('>') if !name.is_empty() => return Ok(Value::Tag(name)),
                Some(c) if !c.is_whitespace() && c != '<' && c != '>' => name.push(c),
                _ => return error(start, "malformed tag"),
            }
        }
    }

    /// Read a word-like token whose first char is `first`.
    fn read_word(&mut self, first: char) -> String {
        let mut word = String::new();
        word.push(first);
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            word.push(c);
            self.next();
        }
        word
    }
}

/// Classify a word-like token.
fn classify(offset: usize, word: String) -> Result<Value, MatchError> {
    if word == "_" {
        return Ok(Value::Blank);
    }
    let digits = word.strip_prefix(['-', '+']).unwrap_or(&word);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return match word.parse::<i64>() {
            Ok(i) => Ok(Value::Integer(i)),
            Err(_) => error(offset, format!("integer `{}` is out of range", word)),
        };
    }
    if let Some(inner) = word.strip_prefix('~').and_then(|w| w.strip_suffix('~')) {
        return match inner {
            "null" => Ok(Value::Null),
            "void" => Ok(Value::Void),
            "true" => Ok(Value::Logic(true)),
            "false" => Ok(Value::Logic(false)),
            _ => error(offset, format!("unknown signal `{}`", word)),
        };
    }
    if word.ends_with('!') {
        if let Some(kind) = Kind::from_name(&word) {
            return Ok(Value::Datatype(kind));
        }
    }
    if let Some(name) = word.strip_suffix(':') {
        if name.is_empty() || name.contains(':') {
            return error(offset, format!("malformed set-word `{}`", word));
        }
        return Ok(Value::SetWord(name.to_string()));
    }
    if word.contains(':') {
        return error(offset, format!("malformed word `{}`", word));
    }
    Ok(Value::Word(word))
}

/// Read source text into a sequence of values.
pub fn read(source: &str) -> Result<Vec<Value>, MatchError> {
    Reader::new(source).read_items(None)
}
