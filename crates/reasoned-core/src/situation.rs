//! Situation parameters: ordered name/value context attached to an error.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Object-safe view of a situation value.
///
/// Implemented for every `Display + Send + Sync + 'static` type, so callers
/// never implement it themselves.
pub trait SituationAny: Any + fmt::Display + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T> SituationAny for T
where
    T: Any + fmt::Display + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type-erased situation value, possibly absent.
///
/// Absent values render as `None`.
#[derive(Clone)]
pub struct SituationValue {
    inner: Option<Arc<dyn SituationAny>>,
}

impl SituationValue {
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Display + Send + Sync,
    {
        Self {
            inner: Some(Arc::new(value)),
        }
    }

    /// A value that was recorded as absent.
    pub fn absent() -> Self {
        Self { inner: None }
    }

    pub fn is_absent(&self) -> bool {
        self.inner.is_none()
    }

    /// Typed extraction; `None` when absent or when the type does not match.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_deref()?.as_any().downcast_ref::<T>()
    }

    /// Rendered text, or `None` when absent.
    pub fn render(&self) -> Option<String> {
        self.inner.as_ref().map(|v| v.to_string())
    }
}

impl<T> From<Option<T>> for SituationValue
where
    T: Any + fmt::Display + Send + Sync,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => SituationValue::new(v),
            None => SituationValue::absent(),
        }
    }
}

impl fmt::Display for SituationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(v) => fmt::Display::fmt(v, f),
            None => f.write_str("None"),
        }
    }
}

impl fmt::Debug for SituationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(v) => write!(f, "{:?}", v.to_string()),
            None => f.write_str("None"),
        }
    }
}

/// Insertion-ordered map from parameter name to value.
///
/// Names are unique. Inserting an existing name replaces the value but keeps
/// the position of the first insertion. The map is small and built once, so a
/// linear scan is used instead of hashing.
#[derive(Clone, Default)]
pub struct SituationMap {
    entries: Vec<(String, SituationValue)>,
}

impl SituationMap {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record `name = value`.
    ///
    /// # Panics
    /// Panics if `name` is empty.
    pub fn insert(&mut self, name: impl Into<String>, value: SituationValue) {
        let name = name.into();
        assert!(!name.is_empty(), "situation parameter name must not be empty");

        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SituationValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Typed lookup; `None` when missing, absent or of another type.
    pub fn get_as<T: Any>(&self, name: &str) -> Option<&T> {
        self.get(name)?.downcast_ref::<T>()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SituationValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for SituationMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a SituationMap {
    type Item = (&'a str, &'a SituationValue);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
