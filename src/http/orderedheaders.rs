use crate::base::error::Error;
use http::header::{HeaderName, HeaderValue};
use std::str::FromStr;

/// Request headers in insertion order with their original casing.
///
/// Names and values are validated against `http`'s header grammar on the
/// way in, so every line handed to the engine is well formed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedHeaders {
    headers: Vec<(String, String)>,
}

impl OrderedHeaders {
    /// Creates an empty header list.
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    fn check(name: &str, value: &str) -> Result<(), Error> {
        HeaderName::from_str(name)
            .map_err(|_| Error::InvalidArgument(format!("invalid header name: {name:?}")))?;
        HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidArgument(format!("invalid value for header {name}")))?;
        Ok(())
    }

    /// Sets a header, replacing an existing one in place (case-insensitive
    /// name match) or appending it.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), Error> {
        let name = name.into();
        let value = value.into();
        Self::check(&name, &value)?;

        if let Some((_, v)) = self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            *v = value;
        } else {
            self.headers.push((name, value));
        }
        Ok(())
    }

    /// Adds a header even if one with the same name exists.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<(), Error> {
        let name = name.into();
        let value = value.into();
        Self::check(&name, &value)?;
        self.headers.push((name, value));
        Ok(())
    }

    /// Removes every header named `name`.
    pub fn remove(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Value of the first header named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Headers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Renders the headers as engine header lines. A header with an empty
    /// value is written as `Name;`, which the engine sends as `Name:` with
    /// no value instead of dropping it.
    pub fn to_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|(n, v)| {
                if v.is_empty() {
                    format!("{n};")
                } else {
                    format!("{n}: {v}")
                }
            })
            .collect()
    }
}

impl TryFrom<&[(&str, &str)]> for OrderedHeaders {
    type Error = Error;

    fn try_from(pairs: &[(&str, &str)]) -> Result<Self, Self::Error> {
        let mut headers = OrderedHeaders::new();
        for (name, value) in pairs {
            headers.append(*name, *value)?;
        }
        Ok(headers)
    }
}
