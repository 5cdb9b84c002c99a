use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Header fields of an SSDP message, keyed by lower-cased name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Parses every CRLF-separated line whose first colon sits past index 1.
    ///
    /// This skips the request or status line. Values and names are trimmed, names
    /// are lower-cased, and a repeated header keeps its last value.
    pub fn parse(text: &str) -> Self {
        text.split("\r\n").filter_map(parse_line).collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.trim().to_lowercase(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let delimiter = line.find(':')?;
    if delimiter <= 1 {
        return None;
    }
    let name = line[..delimiter].trim().to_lowercase();
    let value = line[delimiter + 1..].trim().to_owned();
    Some((name, value))
}
