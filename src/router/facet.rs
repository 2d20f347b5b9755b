use strum_macros::{Display, EnumIter};

/// One classification dimension of a router. Variants are listed in the order
/// a router evaluates them.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Facet {
    Protocol,
    Method,
    Port,
    Domain,
    Host,
    ExactPath,
    PathSegment,
    Pattern,
    Predicate,
    Fallback,
}

impl Facet {
    /// Canonical form of a registration key, so lookups with request values
    /// normalized the same way find it.
    pub fn normalize(&self, key: &str) -> String {
        match self {
            Facet::Domain | Facet::Host => key.to_lowercase(),
            Facet::Method => key.to_uppercase(),
            _ => key.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::Facet;

    #[test]
    fn test_normalize() {
        let tests = [
            (Facet::Method, "get", "GET"),
            (Facet::Domain, "Example.COM", "example.com"),
            (Facet::Host, "WWW", "www"),
            (Facet::Protocol, "HTTPS", "HTTPS"),
            (Facet::ExactPath, "/About", "/About"),
            (Facet::PathSegment, "Users", "Users"),
            (Facet::Port, "8080", "8080"),
        ];

        for (facet, key, want) in tests {
            assert_eq!(facet.normalize(key), want, "{facet}");
        }
    }

    #[test]
    fn test_precedence_order() {
        let order: Vec<_> = Facet::iter().map(|f| f.to_string()).collect();
        assert_eq!(
            order,
            [
                "protocol",
                "method",
                "port",
                "domain",
                "host",
                "exact_path",
                "path_segment",
                "pattern",
                "predicate",
                "fallback"
            ]
        );
    }
}
