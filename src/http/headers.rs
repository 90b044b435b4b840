/// Ordered collection of HTTP header fields.
///
/// Names are matched case-insensitively. Inserting a name that is already
/// present replaces its value in place, so the last occurrence wins while
/// the serialization order stays that of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Looks up a header value by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "text/html");

        assert_eq!(headers.get("content-type"), Some("text/html"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html"));
    }

    #[test]
    fn last_occurrence_wins_in_first_position() {
        let mut headers = Headers::new();
        headers.insert("Accept", "a");
        headers.insert("Host", "h");
        headers.insert("accept", "b");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Accept"), Some("b"));

        let order: Vec<_> = headers.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["Accept", "Host"]);
    }
}
