use std::{path::PathBuf, sync::Arc};

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    file_server, request::Request, response_writer::ResponseWriter, server::Handler,
    templates::{self, Templates},
};

use super::{RouteContext, Router};

pub type Decide = dyn Fn(&Request) -> bool + Send + Sync;
pub type Choose = dyn Fn(&Request) -> isize + Send + Sync;

/// What a matched entry does with the request.
#[derive(Default)]
pub enum Action {
    /// Nothing attached yet.
    #[default]
    NotFound,
    Handler(Box<dyn Handler + Send + Sync>),
    Split(Box<Split>),
    Select(Box<Select>),
    Router(Box<Router>),
}

/// Two-way decision: `then` when `decide` holds, `otherwise` when not.
pub struct Split {
    decide: Box<Decide>,
    then: Action,
    otherwise: Action,
}

/// N-way decision: the candidate at the index `choose` returns. Any index
/// outside the candidates answers NotFound.
pub struct Select {
    choose: Box<Choose>,
    candidates: Vec<Action>,
}

impl Action {
    pub fn handler(handler: impl Handler + Send + Sync + 'static) -> Self {
        Self::Handler(Box::new(handler))
    }

    pub fn router(router: Router) -> Self {
        Self::Router(Box::new(router))
    }

    pub fn split<F>(decide: F, then: Action, otherwise: Action) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Self::Split(Box::new(Split {
            decide: Box::new(decide),
            then,
            otherwise,
        }))
    }

    pub fn select<F>(choose: F, candidates: Vec<Action>) -> Self
    where
        F: Fn(&Request) -> isize + Send + Sync + 'static,
    {
        Self::Select(Box::new(Select {
            choose: Box::new(choose),
            candidates,
        }))
    }

    pub fn serve_files<I, S>(base_path: impl Into<PathBuf>, index_exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::handler(file_server::serve_files(base_path, index_exts))
    }

    pub fn serve_template<F>(select: F, templates: Arc<Templates>) -> Self
    where
        F: Fn(&Request) -> (String, Value) + Send + Sync + 'static,
    {
        Self::handler(templates::template_handler(select, templates))
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Action::NotFound)
    }

    pub fn invoke(&self, w: &mut ResponseWriter, r: &Request, cx: &mut RouteContext) {
        match self {
            Action::NotFound => w.not_found(),
            Action::Handler(handler) => handler.handle(w, r, cx),
            Action::Split(split) => split.invoke(w, r, cx),
            Action::Select(select) => select.invoke(w, r, cx),
            Action::Router(router) => router.dispatch(w, r, cx),
        }
    }
}

impl Split {
    fn invoke(&self, w: &mut ResponseWriter, r: &Request, cx: &mut RouteContext) {
        let taken = (self.decide)(r);
        debug!(taken, "split");
        if taken {
            self.then.invoke(w, r, cx);
        } else {
            self.otherwise.invoke(w, r, cx);
        }
    }
}

impl Select {
    fn invoke(&self, w: &mut ResponseWriter, r: &Request, cx: &mut RouteContext) {
        let idx = (self.choose)(r);
        match usize::try_from(idx)
            .ok()
            .and_then(|idx| self.candidates.get(idx))
        {
            Some(action) => {
                debug!(idx, "select");
                action.invoke(w, r, cx);
            }
            None => {
                warn!(idx, candidates = self.candidates.len(), "select index out of range");
                w.not_found();
            }
        }
    }
}

impl Handler for Action {
    fn handle(&self, w: &mut ResponseWriter, r: &Request, cx: &mut RouteContext) {
        self.invoke(w, r, cx);
    }
}

/// A registered routing entry. Registration hands it out so the caller can
/// attach exactly one action; attaching again replaces the previous one.
#[derive(Default)]
pub struct Entry {
    action: Action,
}

impl Entry {
    pub fn action(&mut self, action: Action) {
        if self.action.is_set() {
            warn!("replacing the action already attached to this entry");
        }
        self.action = action;
    }

    pub fn handle(&mut self, handler: impl Handler + Send + Sync + 'static) {
        self.action(Action::handler(handler));
    }

    pub fn subrouter(&mut self, router: Router) {
        self.action(Action::router(router));
    }

    pub fn split<F>(&mut self, decide: F, then: Action, otherwise: Action)
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.action(Action::split(decide, then, otherwise));
    }

    pub fn select<F>(&mut self, choose: F, candidates: Vec<Action>)
    where
        F: Fn(&Request) -> isize + Send + Sync + 'static,
    {
        self.action(Action::select(choose, candidates));
    }

    pub fn serve_files<I, S>(&mut self, base_path: impl Into<PathBuf>, index_exts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action(Action::serve_files(base_path, index_exts));
    }

    pub fn serve_template<F>(&mut self, select: F, templates: Arc<Templates>)
    where
        F: Fn(&Request) -> (String, Value) + Send + Sync + 'static,
    {
        self.action(Action::serve_template(select, templates));
    }

    pub(crate) fn invoke(&self, w: &mut ResponseWriter, r: &Request, cx: &mut RouteContext) {
        self.action.invoke(w, r, cx);
    }
}
