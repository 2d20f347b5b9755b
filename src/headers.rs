use std::collections::HashMap;

use anyhow::Context;

/// Header fields keyed by lowercased name. A field may repeat.
#[derive(Debug, Default, Clone)]
pub struct Headers(HashMap<String, Vec<String>>);

impl Headers {
    pub fn new_empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0
            .entry(key.to_lowercase())
            .or_default()
            .push(value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First value of the field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(&key.to_lowercase())
            .and_then(|values| values.first())
            .map(|v| v.as_str())
    }

    /// Every element of a comma separated list field, across repetitions.
    pub fn get_iter(&self, key: &str) -> Option<impl Iterator<Item = &str> + '_> {
        self.0.get(&key.to_lowercase()).map(|values| {
            values
                .iter()
                .flat_map(|v| v.split(','))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
    }

    pub fn get_host(&self) -> Option<&str> {
        self.get("host")
    }

    pub fn get_connection(&self) -> Option<impl Iterator<Item = &str> + '_> {
        self.get_iter("connection")
    }

    pub fn get_accept_encoding(&self) -> Option<impl Iterator<Item = &str> + '_> {
        self.get_iter("accept-encoding")
    }

    pub fn get_content_length(&self) -> anyhow::Result<Option<usize>> {
        self.get("content-length")
            .map(|length| length.parse::<usize>())
            .transpose()
            .context("invalid content-length")
    }
}
