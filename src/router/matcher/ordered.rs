use regex::Regex;
use tracing::warn;

use crate::{request::Request, router::Entry};

pub type Predicate = dyn Fn(&Request, &str) -> bool + Send + Sync;

enum Condition {
    /// `None` when the expression failed to compile; such an entry never matches.
    Pattern(Option<Regex>),
    Predicate(Box<Predicate>),
}

impl Condition {
    fn holds(&self, r: &Request, segment: &str) -> bool {
        match self {
            Condition::Pattern(re) => re.as_ref().is_some_and(|re| re.is_match(segment)),
            Condition::Predicate(predicate) => predicate(r, segment),
        }
    }
}

struct Guarded {
    condition: Condition,
    entry: Entry,
}

/// Entries tried one after another in registration order; the first whose
/// condition holds for the current segment wins.
#[derive(Default)]
pub struct Ordered(Vec<Guarded>);

impl Ordered {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, condition: Condition) -> &mut Entry {
        self.0.push(Guarded {
            condition,
            entry: Entry::default(),
        });
        let last = self.0.len() - 1;
        &mut self.0[last].entry
    }

    /// Unanchored like `Regex::is_match`; anchor with `^…$` to match a whole segment.
    pub fn add_pattern(&mut self, pattern: &str) -> &mut Entry {
        let re = match Regex::new(pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                warn!(pattern, %err, "invalid pattern, entry will never match");
                None
            }
        };
        self.push(Condition::Pattern(re))
    }

    pub fn add_predicate<F>(&mut self, predicate: F) -> &mut Entry
    where
        F: Fn(&Request, &str) -> bool + Send + Sync + 'static,
    {
        self.push(Condition::Predicate(Box::new(predicate)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first_match(&self, r: &Request, segment: &str) -> Option<&Entry> {
        self.0
            .iter()
            .find(|guarded| guarded.condition.holds(r, segment))
            .map(|guarded| &guarded.entry)
    }
}
