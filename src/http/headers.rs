//! Ordered, case-insensitive HTTP header collection.

use crate::base::Host;
use std::fmt;

/// Header fields in insertion order.
///
/// Lookups and updates are case-insensitive on the field name; an
/// update replaces the value in place without disturbing the order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a field. Names are stored as given; matching
    /// ignores case.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self
            .fields
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            slot.1 = value;
        } else {
            self.fields.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let pos = self
            .fields
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.fields.remove(pos).1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `Host` field, parsed. Round-trips through [`Host`]'s
    /// canonical text form.
    pub fn host(&self) -> Option<Host> {
        self.get("Host").and_then(|v| v.parse().ok())
    }

    pub fn set_host(&mut self, host: &Host) {
        self.insert("Host", host.to_string());
    }

    pub fn content_length(&self) -> Option<usize> {
        self.get("Content-Length")?.trim().parse().ok()
    }

    pub fn set_content_length(&mut self, length: usize) {
        self.insert("Content-Length", length.to_string());
    }

    pub fn transfer_encoding(&self) -> Option<&str> {
        self.get("Transfer-Encoding")
    }

    /// Whether the message body is chunk-coded (last coding listed is
    /// `chunked`).
    pub fn is_chunked(&self) -> bool {
        self.transfer_encoding()
            .and_then(|v| v.rsplit(',').next())
            .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
    }

    pub fn set_chunked(&mut self) {
        self.insert("Transfer-Encoding", "chunked");
        self.remove("Content-Length");
    }

    pub fn connection(&self) -> Option<&str> {
        self.get("Connection")
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}
