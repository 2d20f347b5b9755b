//! Multi-facet request routing.
//!
//! A [`RouterBuilder`] collects entries keyed by protocol, method, port,
//! domain, host, exact path and path segment, plus ordered pattern and
//! predicate entries and one fallback. [`RouterBuilder::build`] freezes it
//! into a [`Router`], which only reads from then on and can be shared by
//! every connection thread.
//!
//! Dispatch tries the facets in the order of [`Facet`] and invokes the first
//! entry that matches. An entry whose action is a child router repeats the
//! procedure one path segment further down.

pub use action::{Action, Choose, Decide, Entry, Select, Split};
pub use context::RouteContext;
pub use facet::Facet;
pub use matcher::Predicate;

use matcher::{Keyed, Ordered};
use tracing::{debug, warn};

use crate::{request::Request, response_writer::ResponseWriter, server::Handler};

mod action;
mod context;
mod facet;
mod matcher;

pub struct Router {
    protocols: Keyed,
    methods: Keyed,
    ports: Keyed,
    domains: Keyed,
    hosts: Keyed,
    exact_paths: Keyed,
    segments: Keyed,
    patterns: Ordered,
    predicates: Ordered,
    fallback: Option<Entry>,
}

/// Build phase of a [`Router`]. Every registration returns the new entry so
/// an action can be attached to it. Registering a key that already exists
/// replaces the earlier entry.
pub struct RouterBuilder {
    router: Router,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router {
                protocols: Keyed::new(Facet::Protocol),
                methods: Keyed::new(Facet::Method),
                ports: Keyed::new(Facet::Port),
                domains: Keyed::new(Facet::Domain),
                hosts: Keyed::new(Facet::Host),
                exact_paths: Keyed::new(Facet::ExactPath),
                segments: Keyed::new(Facet::PathSegment),
                patterns: Ordered::new(),
                predicates: Ordered::new(),
                fallback: None,
            },
        }
    }

    /// `"http"` or `"https"`.
    pub fn protocol(&mut self, protocol: &str) -> &mut Entry {
        self.router.protocols.add_route(protocol)
    }

    pub fn method(&mut self, method: &str) -> &mut Entry {
        self.router.methods.add_route(method)
    }

    pub fn port(&mut self, port: &str) -> &mut Entry {
        self.router.ports.add_route(port)
    }

    /// Everything after the first dot of the hostname, e.g. `example.com`.
    pub fn domain(&mut self, domain: &str) -> &mut Entry {
        self.router.domains.add_route(domain)
    }

    /// Everything before the first dot of the hostname, e.g. `www`.
    pub fn host(&mut self, host: &str) -> &mut Entry {
        self.router.hosts.add_route(host)
    }

    pub fn exact_path(&mut self, path: &str) -> &mut Entry {
        self.router.exact_paths.add_route(path)
    }

    /// Matches the next path segment and consumes it.
    pub fn path(&mut self, segment: &str) -> &mut Entry {
        self.router.segments.add_route(segment)
    }

    /// Matches when `pattern` is found in the next path segment, which is
    /// then captured. An invalid expression is logged and never matches.
    pub fn pattern(&mut self, pattern: &str) -> &mut Entry {
        self.router.patterns.add_pattern(pattern)
    }

    /// Matches when `predicate(request, next segment)` holds; the segment is
    /// then captured.
    pub fn predicate<F>(&mut self, predicate: F) -> &mut Entry
    where
        F: Fn(&Request, &str) -> bool + Send + Sync + 'static,
    {
        self.router.predicates.add_predicate(predicate)
    }

    /// Used when nothing else in this router matches.
    pub fn fallback(&mut self) -> &mut Entry {
        if self.router.fallback.is_some() {
            warn!(facet = %Facet::Fallback, "replacing registered entry");
        }
        self.router.fallback.insert(Entry::default())
    }

    pub fn build(self) -> Router {
        debug!(entries = self.router.len(), "router built");
        self.router
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Number of entries registered directly on this router.
    pub fn len(&self) -> usize {
        [
            &self.protocols,
            &self.methods,
            &self.ports,
            &self.domains,
            &self.hosts,
            &self.exact_paths,
            &self.segments,
        ]
        .iter()
        .map(|keyed| keyed.len())
        .sum::<usize>()
            + self.patterns.len()
            + self.predicates.len()
            + usize::from(self.fallback.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Routes `r` with a context of its own, as a transport would for a
    /// request it just read.
    pub fn serve(&self, w: &mut ResponseWriter, r: &Request) {
        let mut cx = RouteContext::new(r.get_path());
        self.dispatch(w, r, &mut cx);
    }

    pub fn dispatch(&self, w: &mut ResponseWriter, r: &Request, cx: &mut RouteContext) {
        match self.resolve(r, cx) {
            Some((facet, entry)) => {
                debug!(%facet, prefix = ?cx.prefix(), "match");
                entry.invoke(w, r, cx);
            }
            None => {
                debug!(path = r.get_path(), remaining = ?cx.remaining(), "no match");
                w.not_found();
            }
        }
    }

    /// First matching entry in facet order. Groups without entries are
    /// skipped before their key is computed. Path segment, pattern and
    /// predicate matches move the current segment out of `cx`.
    fn resolve(&self, r: &Request, cx: &mut RouteContext) -> Option<(Facet, &Entry)> {
        if !self.protocols.is_empty() {
            if let Some(entry) = self.protocols.lookup(r.get_protocol()) {
                return Some((Facet::Protocol, entry));
            }
        }

        if !self.methods.is_empty() {
            let method = Facet::Method.normalize(r.get_http_method());
            if let Some(entry) = self.methods.lookup(&method) {
                return Some((Facet::Method, entry));
            }
        }

        if !(self.ports.is_empty() && self.domains.is_empty() && self.hosts.is_empty()) {
            let parts = r.host_parts();
            for (facet, keyed, key) in [
                (Facet::Port, &self.ports, &parts.port),
                (Facet::Domain, &self.domains, &parts.domain),
                (Facet::Host, &self.hosts, &parts.host),
            ] {
                if let Some(entry) = keyed.lookup(key) {
                    return Some((facet, entry));
                }
            }
        }

        if !self.exact_paths.is_empty() {
            if let Some(entry) = self.exact_paths.lookup(r.get_path()) {
                return Some((Facet::ExactPath, entry));
            }
        }

        let segment = cx.current().to_owned();

        if !self.segments.is_empty() {
            if let Some(entry) = self.segments.lookup(&segment) {
                cx.consume();
                return Some((Facet::PathSegment, entry));
            }
        }

        for (facet, ordered) in [
            (Facet::Pattern, &self.patterns),
            (Facet::Predicate, &self.predicates),
        ] {
            if ordered.is_empty() {
                continue;
            }
            if let Some(entry) = ordered.first_match(r, &segment) {
                cx.capture();
                return Some((facet, entry));
            }
        }

        self.fallback.as_ref().map(|entry| (Facet::Fallback, entry))
    }
}

impl Handler for Router {
    fn handle(&self, w: &mut ResponseWriter, r: &Request, cx: &mut RouteContext) {
        self.dispatch(w, r, cx);
    }
}
