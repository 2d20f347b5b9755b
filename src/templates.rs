use std::{fs, io, path::Path, sync::Arc};

use minijinja::Environment;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::{
    request::Request, response_writer::ResponseWriter, router::RouteContext, server::Handler,
    status_code_registry::ReasonPhrase,
};

const CONTENT_TYPE: &str = "text/html; charset=utf-8";

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Template(#[from] minijinja::Error),
}

/// A collection of named templates, loaded once before serving starts.
#[derive(Debug, Default)]
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<(), TemplateError> {
        self.env.add_template_owned(name.into(), source.into())?;
        Ok(())
    }

    /// Registers every file below `dir` whose name ends in `ext`, under its
    /// file name. Files that fail to parse are logged and left out.
    pub fn load_dir(dir: impl AsRef<Path>, ext: &str) -> Result<Self, TemplateError> {
        let ext = if ext.starts_with('.') {
            ext.to_owned()
        } else {
            format!(".{}", ext)
        };

        let mut templates = Self::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !name.ends_with(&ext) {
                continue;
            }

            let source = fs::read_to_string(entry.path())?;
            match templates.add(name, source) {
                Ok(()) => debug!(name, "template loaded"),
                Err(err) => error!(name, %err, "template skipped"),
            }
        }
        info!(count = templates.len(), "templates loaded");
        Ok(templates)
    }

    pub fn len(&self) -> usize {
        self.env.templates().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    pub fn render(&self, name: &str, data: &Value) -> Result<String, TemplateError> {
        Ok(self.env.get_template(name)?.render(data)?)
    }
}

/// Handler rendering the template `select` names with the data it returns.
/// A missing template or a failed render answers NotFound.
pub fn template_handler<F>(select: F, templates: Arc<Templates>) -> impl Handler + Send + Sync
where
    F: Fn(&Request) -> (String, Value) + Send + Sync + 'static,
{
    move |w: &mut ResponseWriter, r: &Request, _: &mut RouteContext| {
        let (name, data) = select(r);
        match templates.render(&name, &data) {
            Ok(body) => {
                w.set_reason_phrase(ReasonPhrase::OK);
                w.set_body(body.into_bytes(), CONTENT_TYPE);
            }
            Err(err) => {
                error!(name = name.as_str(), %err, "template render");
                w.not_found();
            }
        }
    }
}
