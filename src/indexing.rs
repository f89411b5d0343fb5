//! Uniform element access across list, string, and byte subjects.

use crate::value::{chars_equal, Kind, Value};
use core::ops::Range;

/// A subject: the sequence a rule is matched against.
/// Text is held as chars so that every index is an element boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Sequence {
    List(Vec<Value>),
    Text(Vec<char>),
    Bytes(Vec<u8>),
}

/// One element of a subject.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Element<'a> {
    Value(&'a Value),
    Char(char),
    Byte(u8),
}

impl Element<'_> {
    /// The kind used when typechecking this element against a datatype.
    /// Bytes are integers.
    pub fn kind(&self) -> Kind {
        match self {
            Element::Value(v) => v.kind(),
            Element::Char(_) => Kind::Char,
            Element::Byte(_) => Kind::Integer,
        }
    }

    /// Materialize an owned value.
    pub fn to_value(&self) -> Value {
        match *self {
            Element::Value(v) => v.clone(),
            Element::Char(c) => Value::Char(c),
            Element::Byte(b) => Value::Integer(i64::from(b)),
        }
    }
}

impl Sequence {
    /// \return the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Sequence::List(v) => v.len(),
            Sequence::Text(v) => v.len(),
            Sequence::Bytes(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// \return the element to the right of `index`, or None at the end.
    #[inline]
    pub fn at(&self, index: usize) -> Option<Element<'_>> {
        match self {
            Sequence::List(v) => v.get(index).map(Element::Value),
            Sequence::Text(v) => v.get(index).copied().map(Element::Char),
            Sequence::Bytes(v) => v.get(index).copied().map(Element::Byte),
        }
    }

    /// \return an owned copy of the elements in `range`, as a block, text or
    /// binary value.
    pub fn span(&self, range: Range<usize>) -> Value {
        match self {
            Sequence::List(v) => Value::Block(v[range].to_vec()),
            Sequence::Text(v) => Value::Text(v[range].iter().collect()),
            Sequence::Bytes(v) => Value::Binary(v[range].to_vec()),
        }
    }

    /// Try to match the literal `lit` at `index`, without reading at or past
    /// `limit`.
    /// \return the index just past the match, or None.
    pub fn match_literal(
        &self,
        index: usize,
        limit: usize,
        lit: &Value,
        case_sensitive: bool,
    ) -> Option<usize> {
        let lit = lit.unquote();
        match self {
            Sequence::List(items) => {
                if index >= limit {
                    return None;
                }
                let item = items.get(index)?;
                item.equals(lit, case_sensitive).then_some(index + 1)
            }
            Sequence::Text(chars) => {
                let window = chars.get(index..limit)?;
                match lit {
                    Value::Text(s) => {
                        let mut len = 0;
                        for want in s.chars() {
                            let have = *window.get(len)?;
                            if !chars_equal(have, want, case_sensitive) {
                                return None;
                            }
                            len += 1;
                        }
                        Some(index + len)
                    }
                    Value::Char(want) => {
                        let have = *window.first()?;
                        chars_equal(have, *want, case_sensitive).then_some(index + 1)
                    }
                    _ => None,
                }
            }
            Sequence::Bytes(bytes) => {
                let window = bytes.get(index..limit)?;
                let needle = literal_bytes(lit)?;
                let have = window.get(..needle.len())?;
                let folds = !case_sensitive && matches!(lit, Value::Text(_) | Value::Char(_));
                let equal = if folds {
                    have.eq_ignore_ascii_case(&needle)
                } else {
                    have == needle.as_slice()
                };
                equal.then_some(index + needle.len())
            }
        }
    }

    /// Encode `value` as elements of the same representation as `self`, for
    /// insertion.
    pub fn encode(&self, value: &Value) -> Result<Sequence, String> {
        let refuse = || {
            Err(format!(
                "cannot insert {} into {}",
                value.kind(),
                self.kind_name()
            ))
        };
        match self {
            Sequence::List(_) => match value {
                Value::Null => refuse(),
                Value::Void => Ok(Sequence::List(Vec::new())),
                Value::Splice(items) => Ok(Sequence::List(items.clone())),
                other => Ok(Sequence::List(vec![other.clone()])),
            },
            Sequence::Text(_) => match value {
                Value::Void => Ok(Sequence::Text(Vec::new())),
                Value::Text(s) | Value::Word(s) => Ok(Sequence::Text(s.chars().collect())),
                Value::Char(c) => Ok(Sequence::Text(vec![*c])),
                Value::Integer(i) => Ok(Sequence::Text(i.to_string().chars().collect())),
                Value::Splice(items) => {
                    let mut chars = Vec::new();
                    for item in items {
                        if let Sequence::Text(more) = self.encode(item)? {
                            chars.extend(more);
                        }
                    }
                    Ok(Sequence::Text(chars))
                }
                _ => refuse(),
            },
            Sequence::Bytes(_) => match value {
                Value::Void => Ok(Sequence::Bytes(Vec::new())),
                Value::Splice(items) => {
                    let mut bytes = Vec::new();
                    for item in items {
                        if let Sequence::Bytes(more) = self.encode(item)? {
                            bytes.extend(more);
                        }
                    }
                    Ok(Sequence::Bytes(bytes))
                }
                other => match literal_bytes(other) {
                    Some(bytes) => Ok(Sequence::Bytes(bytes)),
                    None => refuse(),
                },
            },
        }
    }

    /// Replace the elements in `range` with `content`, which must have the
    /// same representation.
    /// \return the number of elements inserted.
    pub fn splice(&mut self, range: Range<usize>, content: Sequence) -> Result<usize, String> {
        let inserted = content.len();
        match (self, content) {
            (Sequence::List(v), Sequence::List(c)) => {
                v.splice(range, c);
            }
            (Sequence::Text(v), Sequence::Text(c)) => {
                v.splice(range, c);
            }
            (Sequence::Bytes(v), Sequence::Bytes(c)) => {
                v.splice(range, c);
            }
            (this, other) => {
                return Err(format!(
                    "cannot splice {} into {}",
                    other.kind_name(),
                    this.kind_name()
                ))
            }
        }
        Ok(inserted)
    }

    /// The datatype name a span of this sequence materializes as.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Sequence::List(_) => Kind::Block.name(),
            Sequence::Text(_) => Kind::Text.name(),
            Sequence::Bytes(_) => Kind::Binary.name(),
        }
    }

    /// Convert a nested series value to a sequence.
    pub fn from_value(value: Value) -> Result<Sequence, Value> {
        match value {
            Value::Block(items) => Ok(Sequence::List(items)),
            Value::Text(s) => Ok(Sequence::Text(s.chars().collect())),
            Value::Binary(b) => Ok(Sequence::Bytes(b)),
            other => Err(other),
        }
    }

    /// Convert back into a value.
    pub fn into_value(self) -> Value {
        match self {
            Sequence::List(items) => Value::Block(items),
            Sequence::Text(chars) => Value::Text(chars.into_iter().collect()),
            Sequence::Bytes(b) => Value::Binary(b),
        }
    }
}

/// \return the bytes a literal denotes when matched against binary input.
pub(crate) fn literal_bytes(lit: &Value) -> Option<Vec<u8>> {
    match lit.unquote() {
        Value::Binary(b) => Some(b.clone()),
        Value::Text(s) => Some(s.as_bytes().to_vec()),
        Value::Char(c) => Some(c.encode_utf8(&mut [0; 4]).as_bytes().to_vec()),
        Value::Integer(i) => u8::try_from(*i).ok().map(|b| vec![b]),
        _ => None,
    }
}

impl From<&str> for Sequence {
    fn from(s: &str) -> Self {
        Sequence::Text(s.chars().collect())
    }
}

impl From<String> for Sequence {
    fn from(s: String) -> Self {
        Sequence::Text(s.chars().collect())
    }
}

impl From<Vec<Value>> for Sequence {
    fn from(items: Vec<Value>) -> Self {
        Sequence::List(items)
    }
}

impl From<Vec<u8>> for Sequence {
    fn from(bytes: Vec<u8>) -> Self {
        Sequence::Bytes(bytes)
    }
}

impl From<&[u8]> for Sequence {
    fn from(bytes: &[u8]) -> Self {
        Sequence::Bytes(bytes.to_vec())
    }
}
