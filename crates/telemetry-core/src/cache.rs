//! Last-value cache and field snapshots.

use crate::field::{FieldPath, FieldValue};
use indexmap::IndexMap;

/// Read-only view of a set of fields, iterated in first-insertion order.
///
/// For the structured protocol this is every field of the most recent
/// document (changed or not) in document order; for the binary protocol it
/// is the full register cache.
#[derive(Debug, Clone, Default)]
pub struct FieldSnapshot {
    fields: IndexMap<FieldPath, FieldValue>,
}

impl FieldSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.fields.get(path)
    }

    pub fn get_named(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(&FieldPath::named(name))
    }

    pub fn contains(&self, path: &FieldPath) -> bool {
        self.fields.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &FieldValue)> {
        self.fields.iter()
    }

    /// Named fields in `section` (`"payload"` matches `"payload.*"`).
    pub fn section<'a>(
        &'a self,
        section: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a FieldValue)> + 'a {
        self.fields.iter().filter_map(move |(path, value)| {
            let name = path.as_name()?;
            let (head, leaf) = name.split_once('.')?;
            (head == section).then_some((leaf, value))
        })
    }

    pub fn insert(&mut self, path: FieldPath, value: FieldValue) {
        self.fields.insert(path, value);
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

impl FromIterator<(FieldPath, FieldValue)> for FieldSnapshot {
    fn from_iter<I: IntoIterator<Item = (FieldPath, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Last seen value per field path with change suppression.
#[derive(Debug, Clone, Default)]
pub struct FieldCache {
    values: FieldSnapshot,
}

impl FieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for `path`. Returns `true` if the path was unseen or the
    /// value differs from the cached one; an unchanged value leaves the cache
    /// untouched.
    pub fn update(&mut self, path: &FieldPath, value: &FieldValue) -> bool {
        match self.values.fields.get_mut(path) {
            Some(cached) if cached.same_as(value) => false,
            Some(cached) => {
                *cached = value.clone();
                true
            }
            None => {
                self.values.fields.insert(path.clone(), value.clone());
                true
            }
        }
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.values.get(path)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn as_snapshot(&self) -> &FieldSnapshot {
        &self.values
    }
}
