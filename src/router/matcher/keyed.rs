use std::collections::{hash_map, HashMap};

use tracing::warn;

use crate::router::{Entry, Facet};

/// Entries of one facet, looked up by normalized key.
pub struct Keyed {
    facet: Facet,
    entries: HashMap<String, Entry>,
}

impl Keyed {
    pub fn new(facet: Facet) -> Self {
        Self {
            facet,
            entries: HashMap::new(),
        }
    }

    /// Registers a fresh entry under `key`. A key registered twice keeps only
    /// the latest entry.
    pub fn add_route(&mut self, key: &str) -> &mut Entry {
        let key = self.facet.normalize(key);
        match self.entries.entry(key) {
            hash_map::Entry::Occupied(mut occupied) => {
                warn!(facet = %self.facet, key = occupied.key().as_str(), "replacing registered entry");
                occupied.insert(Entry::default());
                occupied.into_mut()
            }
            hash_map::Entry::Vacant(vacant) => vacant.insert(Entry::default()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `key` must already be normalized the way `add_route` normalizes.
    pub fn lookup(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        request::Request,
        response_writer::ResponseWriter,
        router::{Facet, RouteContext},
        test_utils::label,
    };

    use super::Keyed;

    fn body_of(keyed: &Keyed, key: &str) -> Option<Vec<u8>> {
        let entry = keyed.lookup(key)?;
        let mut w = ResponseWriter::new_empty();
        entry.invoke(&mut w, &Request::new("GET", "/"), &mut RouteContext::new("/"));
        Some(w.get_body().to_vec())
    }

    #[test]
    fn test_keyed_normalizes_on_registration() {
        let mut keyed = Keyed::new(Facet::Method);
        keyed.add_route("get").handle(label("get"));

        assert_eq!(body_of(&keyed, "GET").unwrap(), b"get");
        assert!(keyed.lookup("get").is_none());
    }

    #[test]
    fn test_keyed_last_write_wins() {
        let mut keyed = Keyed::new(Facet::Host);
        keyed.add_route("www").handle(label("first"));
        keyed.add_route("WWW").handle(label("second"));

        assert_eq!(keyed.len(), 1);
        assert_eq!(body_of(&keyed, "www").unwrap(), b"second");
    }

    #[test]
    fn test_keyed_no_match() {
        let mut keyed = Keyed::new(Facet::PathSegment);
        assert!(keyed.is_empty());
        keyed.add_route("users");
        assert!(keyed.lookup("posts").is_none());
        assert!(keyed.lookup("Users").is_none());
    }
}
