//! The values that make up rules, subjects, and synthesized results.

use crate::cursor::Cursor;
use crate::error::MatchError;
use core::fmt;
use std::collections::HashMap;
use std::rc::Rc;

/// The kind of a value. Datatype markers like `integer!` name a kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Void,
    Blank,
    Logic,
    Integer,
    Char,
    Text,
    Binary,
    Word,
    SetWord,
    Quoted,
    Block,
    Group,
    GetGroup,
    Tag,
    Datatype,
    Bar,
    Position,
    Splice,
    Action,
}

const KIND_NAMES: &[(Kind, &str)] = &[
    (Kind::Null, "null!"),
    (Kind::Void, "void!"),
    (Kind::Blank, "blank!"),
    (Kind::Logic, "logic!"),
    (Kind::Integer, "integer!"),
    (Kind::Char, "char!"),
    (Kind::Text, "text!"),
    (Kind::Binary, "binary!"),
    (Kind::Word, "word!"),
    (Kind::SetWord, "set-word!"),
    (Kind::Quoted, "quoted!"),
    (Kind::Block, "block!"),
    (Kind::Group, "group!"),
    (Kind::GetGroup, "get-group!"),
    (Kind::Tag, "tag!"),
    (Kind::Datatype, "datatype!"),
    (Kind::Bar, "bar!"),
    (Kind::Position, "position!"),
    (Kind::Splice, "splice!"),
    (Kind::Action, "action!"),
];

impl Kind {
    /// \return the datatype name, like `integer!`.
    pub fn name(self) -> &'static str {
        KIND_NAMES
            .iter()
            .find(|(k, _)| *k == self)
            .map_or("unknown!", |(_, name)| name)
    }

    /// Look up a kind by its datatype name.
    pub fn from_name(name: &str) -> Option<Kind> {
        KIND_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(k, _)| *k)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The signature of host code callable from rules.
pub type ActionFn = dyn Fn(&mut Variables) -> Result<Value, MatchError>;

/// A named host callback. Actions compare equal only to themselves.
#[derive(Clone)]
pub struct Action {
    name: Rc<str>,
    func: Rc<ActionFn>,
}

impl Action {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&mut Variables) -> Result<Value, MatchError> + 'static,
    {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the action against the variables.
    pub fn call(&self, vars: &mut Variables) -> Result<Value, MatchError> {
        (self.func)(vars)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Action({})", self.name)
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

/// A value. Rules are blocks of values, and so are list subjects.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The no-match signal. Legal as data, never as a rule.
    Null,

    /// The void signal: an inert rule that succeeds without consuming.
    Void,

    Blank,
    Logic(bool),
    Integer(i64),
    Char(char),
    Text(String),
    Binary(Vec<u8>),

    /// A keyword or a variable reference.
    Word(String),

    /// A prefix binding marker, `name:`.
    SetWord(String),

    /// A value matched literally. Also the meta-wrapping used when binding
    /// signals to variables.
    Quoted(Box<Value>),

    Block(Vec<Value>),

    /// An embedded expression evaluated in place.
    Group(Vec<Value>),

    /// An embedded expression whose result is used as a rule.
    GetGroup(Vec<Value>),

    Tag(String),
    Datatype(Kind),

    /// The alternative separator, `|`.
    Bar,

    /// A cursor captured from a subject.
    Position(Cursor),

    /// Items to be spliced individually rather than kept or inserted whole.
    Splice(Vec<Value>),

    Action(Action),
}

impl Value {
    pub fn word(name: &str) -> Self {
        Value::Word(name.to_string())
    }

    pub fn text(s: &str) -> Self {
        Value::Text(s.to_string())
    }

    pub fn tag(name: &str) -> Self {
        Value::Tag(name.to_string())
    }

    pub fn quoted(v: Value) -> Self {
        Value::Quoted(Box::new(v))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Void => Kind::Void,
            Value::Blank => Kind::Blank,
            Value::Logic(_) => Kind::Logic,
            Value::Integer(_) => Kind::Integer,
            Value::Char(_) => Kind::Char,
            Value::Text(_) => Kind::Text,
            Value::Binary(_) => Kind::Binary,
            Value::Word(_) => Kind::Word,
            Value::SetWord(_) => Kind::SetWord,
            Value::Quoted(_) => Kind::Quoted,
            Value::Block(_) => Kind::Block,
            Value::Group(_) => Kind::Group,
            Value::GetGroup(_) => Kind::GetGroup,
            Value::Tag(_) => Kind::Tag,
            Value::Datatype(_) => Kind::Datatype,
            Value::Bar => Kind::Bar,
            Value::Position(_) => Kind::Position,
            Value::Splice(_) => Kind::Splice,
            Value::Action(_) => Kind::Action,
        }
    }

    /// \return whether this is one of the engine's control signals.
    #[inline]
    pub fn is_signal(&self) -> bool {
        matches!(self, Value::Null | Value::Void)
    }

    /// \return the value as it should be stored in a variable: signals are
    /// quoted so they read back as data.
    pub fn meta(self) -> Value {
        if self.is_signal() {
            Value::quoted(self)
        } else {
            self
        }
    }

    /// Remove one level of quoting, if any.
    pub fn unquote(&self) -> &Value {
        match self {
            Value::Quoted(inner) => inner,
            other => other,
        }
    }

    /// Compare two values. Text, chars and words compare case-insensitively
    /// unless `case_sensitive`; blocks compare structurally.
    pub fn equals(&self, other: &Value, case_sensitive: bool) -> bool {
        if case_sensitive {
            return self == other;
        }
        match (self, other) {
            (Value::Char(a), Value::Char(b)) => chars_equal(*a, *b, false),
            (Value::Text(a), Value::Text(b))
            | (Value::Word(a), Value::Word(b))
            | (Value::SetWord(a), Value::SetWord(b))
            | (Value::Tag(a), Value::Tag(b)) => text_equal(a, b),
            (Value::Quoted(a), Value::Quoted(b)) => a.equals(b, false),
            (Value::Block(a), Value::Block(b))
            | (Value::Group(a), Value::Group(b))
            | (Value::GetGroup(a), Value::GetGroup(b))
            | (Value::Splice(a), Value::Splice(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y, false))
            }
            _ => self == other,
        }
    }
}

/// Compare two chars, folding case unless `case_sensitive`.
#[inline]
pub fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    a == b || (!case_sensitive && a.to_lowercase().eq(b.to_lowercase()))
}

fn text_equal(a: &str, b: &str) -> bool {
    a.chars().count() == b.chars().count()
        && a.chars().zip(b.chars()).all(|(x, y)| chars_equal(x, y, false))
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Logic(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Block(items)
    }
}

fn write_items(f: &mut fmt::Formatter, open: &str, items: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

fn write_escaped(f: &mut fmt::Formatter, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{}", c)?,
        }
    }
    Ok(())
}

/// Values display in the same notation the reader accepts.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => f.write_str("~null~"),
            Value::Void => f.write_str("~void~"),
            Value::Blank => f.write_str("_"),
            Value::Logic(b) => write!(f, "~{}~", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Char(c) => {
                f.write_str("#\"")?;
                write_escaped(f, c.encode_utf8(&mut [0; 4]))?;
                f.write_str("\"")
            }
            Value::Text(s) => {
                f.write_str("\"")?;
                write_escaped(f, s)?;
                f.write_str("\"")
            }
            Value::Binary(bytes) => {
                f.write_str("#{")?;
                for b in bytes {
                    write!(f, "{:02X}", b)?;
                }
                f.write_str("}")
            }
            Value::Word(w) => f.write_str(w),
            Value::SetWord(w) => write!(f, "{}:", w),
            Value::Quoted(v) => write!(f, "'{}", v),
            Value::Block(items) => write_items(f, "[", items, "]"),
            Value::Group(items) => write_items(f, "(", items, ")"),
            Value::GetGroup(items) => write_items(f, ":(", items, ")"),
            Value::Tag(t) => write!(f, "<{}>", t),
            Value::Datatype(k) => write!(f, "{}", k),
            Value::Bar => f.write_str("|"),
            Value::Position(c) => write!(f, "{}", c),
            Value::Splice(items) => write_items(f, "~(", items, ")~"),
            Value::Action(a) => write!(f, "#[action {}]", a.name()),
        }
    }
}

/// Variable bindings visible to rules and to the code they run.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    map: HashMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.map.get(name)
    }

    /// Set a variable, returning its previous value.
    pub fn set<V: Into<Value>>(&mut self, name: &str, value: V) -> Option<Value> {
        self.map.insert(name.to_string(), value.into())
    }

    /// Bind `name` to a host action.
    pub fn set_action<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&mut Variables) -> Result<Value, MatchError> + 'static,
    {
        self.map
            .insert(name.to_string(), Value::Action(Action::new(name, func)));
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.map.remove(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Evaluate a value as an expression.
    ///
    /// Groups evaluate their items in turn and yield the last result (void
    /// when empty); `name: expr` inside a group assigns. Words fetch their
    /// variable, calling it if it holds an action. Quoted values unquote;
    /// everything else evaluates to itself.
    pub fn evaluate(&mut self, value: &Value) -> Result<Value, MatchError> {
        match value {
            Value::Group(items) | Value::GetGroup(items) => self.evaluate_items(items),
            Value::Word(name) => {
                let fetched = self
                    .get(name)
                    .cloned()
                    .ok_or_else(|| MatchError::raise(format!("`{}` has no value", name)))?;
                match fetched {
                    Value::Action(action) => action.call(self),
                    other => Ok(other),
                }
            }
            Value::Quoted(inner) => Ok((**inner).clone()),
            other => Ok(other.clone()),
        }
    }

    fn evaluate_items(&mut self, items: &[Value]) -> Result<Value, MatchError> {
        let mut result = Value::Void;
        let mut iter = items.iter();
        while let Some(item) = iter.next() {
            result = match item {
                Value::SetWord(name) => {
                    let rhs = iter.next().ok_or_else(|| {
                        MatchError::raise(format!("`{}:` is missing a value", name))
                    })?;
                    let v = self.evaluate(rhs)?;
                    self.set(name, v.clone());
                    v
                }
                other => self.evaluate(other)?,
            };
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_equality() {
        assert!(Value::text("Hello").equals(&Value::text("hELLO"), false));
        assert!(!Value::text("Hello").equals(&Value::text("hELLO"), true));
        assert!(Value::Char('\u{00C9}').equals(&Value::Char('\u{00E9}'), false));
        assert!(!Value::text("ab").equals(&Value::text("abc"), false));
        let a = Value::Block(vec![Value::word("A"), Value::text("x")]);
        let b = Value::Block(vec![Value::word("a"), Value::text("X")]);
        assert!(a.equals(&b, false));
        assert_ne!(a, b);
    }

    #[test]
    fn meta_wraps_only_signals() {
        assert_eq!(Value::Null.meta(), Value::quoted(Value::Null));
        assert_eq!(Value::Void.meta(), Value::quoted(Value::Void));
        assert_eq!(Value::Integer(3).meta(), Value::Integer(3));
    }

    #[test]
    fn evaluate_groups() {
        let mut vars = Variables::new();
        vars.set("n", 4i64);
        vars.set_action("bump", |vars| {
            let n = match vars.get("n") {
                Some(Value::Integer(n)) => *n,
                _ => return Err(MatchError::raise("n is not an integer")),
            };
            vars.set("n", n + 1);
            Ok(Value::Integer(n + 1))
        });
        let group = Value::Group(vec![Value::word("bump"), Value::word("bump")]);
        assert_eq!(vars.evaluate(&group), Ok(Value::Integer(6)));

        let assign = Value::Group(vec![Value::SetWord("m".into()), Value::text("x")]);
        assert_eq!(vars.evaluate(&assign), Ok(Value::text("x")));
        assert_eq!(vars.get("m"), Some(&Value::text("x")));

        assert_eq!(vars.evaluate(&Value::Group(vec![])), Ok(Value::Void));
        assert!(vars.evaluate(&Value::word("missing")).is_err());
    }

    #[test]
    fn kind_names_round_trip() {
        for (kind, name) in KIND_NAMES {
            assert_eq!(Kind::from_name(name), Some(*kind));
            assert_eq!(kind.name(), *name);
        }
        assert_eq!(Kind::from_name("nothing!"), None);
    }
}
