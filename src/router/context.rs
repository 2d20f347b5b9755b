/// Per-request record of how far routing has walked down the path.
///
/// Built fresh from the request path for every request and threaded through
/// nested routers by `&mut`. Nothing in here is shared between requests.
///
/// A segment leaves `remaining` in one of two ways: a path segment entry
/// *consumes* it into the prefix, a pattern or predicate entry *captures* it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteContext {
    segments: Vec<String>,
    cursor: usize,
    prefix: Vec<String>,
    captures: Vec<String>,
}

impl RouteContext {
    /// `/users/42` becomes `["users", "42"]`, `/` becomes `[""]` and
    /// `/users/` keeps its trailing empty segment.
    pub fn new(path: &str) -> Self {
        Self {
            segments: path.split('/').skip(1).map(str::to_owned).collect(),
            ..Self::default()
        }
    }

    /// The next unconsumed segment, empty once the path is exhausted.
    pub fn current(&self) -> &str {
        self.segments
            .get(self.cursor)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> &[String] {
        &self.segments[self.cursor..]
    }

    pub fn remaining_path(&self) -> String {
        self.remaining().join("/")
    }

    /// Segments consumed by path segment entries so far.
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// Segments taken by pattern and predicate entries, in match order.
    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    fn advance(&mut self) -> Option<String> {
        let segment = self.segments.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(segment)
    }

    pub fn consume(&mut self) -> Option<&str> {
        let segment = self.advance()?;
        self.prefix.push(segment);
        self.prefix.last().map(String::as_str)
    }

    pub fn capture(&mut self) -> Option<&str> {
        let segment = self.advance()?;
        self.captures.push(segment);
        self.captures.last().map(String::as_str)
    }
}
