use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by the typed [`Params`] getters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// No parameter with this name was bound.
    #[error("no param named {0}")]
    Missing(String),
    /// The value could not be parsed into the requested type.
    #[error("param {key} has an invalid value: {value:?}")]
    Invalid { key: String, value: String },
}

/// The path parameters bound by a successful match, in path order.
///
/// The buffer is sized once, from the deepest route in the tree, and is
/// truncated rather than freed between requests. Value strings stay allocated
/// in their slots and are overwritten by the next binding, so a recycled
/// buffer binds without allocating once it has seen values as long as the
/// current ones.
///
/// ```txt
/// Route path:  /users/{user}/books/{book}
/// Request URL: /users/alice/books/HarryPotter
/// Params:      [("user", "alice"), ("book", "HarryPotter")]
/// ```
#[derive(Clone, Default)]
pub struct Params {
    slots: Vec<(Arc<str>, String)>,
    len: usize,
}

impl Params {
    pub fn new() -> Params {
        Params::default()
    }

    pub fn with_capacity(capacity: usize) -> Params {
        Params {
            slots: Vec::with_capacity(capacity),
            len: 0,
        }
    }

    pub(crate) fn push(&mut self, key: Arc<str>, value: &str) {
        match self.slots.get_mut(self.len) {
            Some(slot) => {
                slot.0 = key;
                slot.1.clear();
                slot.1.push_str(value);
            }
            None => self.slots.push((key, value.to_owned())),
        }
        self.len += 1;
    }

    /// Empties the bindings, keeping the slots and their string buffers.
    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }

    fn pairs(&self) -> &[(Arc<str>, String)] {
        &self.slots[..self.len]
    }

    /// The value of the first parameter named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs()
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs().iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    pub fn get_string(&self, key: &str) -> Result<&str, ParamError> {
        self.get(key).ok_or_else(|| ParamError::Missing(key.to_owned()))
    }

    /// Like [`get_string`](Params::get_string), falling back to `def`.
    pub fn get_string_must<'a>(&'a self, key: &str, def: &'a str) -> &'a str {
        self.get(key).unwrap_or(def)
    }

    pub fn get_int(&self, key: &str) -> Result<i64, ParamError> {
        self.parse(key)
    }

    pub fn get_int_must(&self, key: &str, def: i64) -> i64 {
        self.get_int(key).unwrap_or(def)
    }

    pub fn get_uint(&self, key: &str) -> Result<u64, ParamError> {
        self.parse(key)
    }

    pub fn get_uint_must(&self, key: &str, def: u64) -> u64 {
        self.get_uint(key).unwrap_or(def)
    }

    pub fn get_float64(&self, key: &str) -> Result<f64, ParamError> {
        self.parse(key)
    }

    pub fn get_float64_must(&self, key: &str, def: f64) -> f64 {
        self.get_float64(key).unwrap_or(def)
    }

    /// Accepts `1/0`, `t/f`, `true/false` in any case.
    pub fn get_bool(&self, key: &str) -> Result<bool, ParamError> {
        let value = self.get_string(key)?;
        match value.to_ascii_lowercase().as_str() {
            "1" | "t" | "true" => Ok(true),
            "0" | "f" | "false" => Ok(false),
            _ => Err(ParamError::Invalid {
                key: key.to_owned(),
                value: value.to_owned(),
            }),
        }
    }

    pub fn get_bool_must(&self, key: &str, def: bool) -> bool {
        self.get_bool(key).unwrap_or(def)
    }

    /// Parses the parameter named `key` into any [`FromStr`] type.
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<T, ParamError> {
        let value = self.get_string(key)?;
        value.parse().map_err(|_| ParamError::Invalid {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }
}

impl PartialEq for Params {
    fn eq(&self, other: &Params) -> bool {
        self.pairs() == other.pairs()
    }
}

impl Eq for Params {}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
