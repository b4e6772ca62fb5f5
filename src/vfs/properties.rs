/*!
 * Properties
 * Per-item metadata as a name -> ordered string list container
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::core::codec;

use super::types::VfsResult;

/// Metadata attached to one item
///
/// Persisted as a count-prefixed sequence of `(name, value count, values...)`
/// records. An empty map is equivalent to having no metadata file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    entries: BTreeMap<String, Vec<String>>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value of `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of `name`
    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    /// Replace `name` with `values`; an empty list removes it
    pub fn set<I, S>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.entries.remove(&name);
        } else {
            self.entries.insert(name, values);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.entries.remove(name)
    }

    /// Apply every update in `updates`; empty lists remove
    pub fn merge(&mut self, updates: &Properties) {
        for (name, values) in &updates.entries {
            self.set(name.clone(), values.iter().cloned());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn write_to<W: Write>(&self, writer: W) -> VfsResult<()> {
        codec::write_to(writer, self)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> VfsResult<Self> {
        Ok(codec::read_from(reader)?)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<String>)> for Properties {
    fn from_iter<T: IntoIterator<Item = (S, Vec<String>)>>(iter: T) -> Self {
        let mut props = Properties::new();
        for (name, values) in iter {
            props.entries.insert(name.into(), values);
        }
        props
    }
}
