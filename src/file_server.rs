use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use lazy_static::lazy_static;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::{
    request::Request, response_writer::ResponseWriter, router::RouteContext, server::Handler,
    status_code_registry::ReasonPhrase,
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

lazy_static! {
    static ref CONTENT_TYPES: HashMap<&'static str, &'static str> = HashMap::from([
        ("html", "text/html; charset=utf-8"),
        ("htm", "text/html; charset=utf-8"),
        ("css", "text/css; charset=utf-8"),
        ("js", "text/javascript; charset=utf-8"),
        ("json", "application/json"),
        ("txt", "text/plain; charset=utf-8"),
        ("xml", "text/xml; charset=utf-8"),
        ("svg", "image/svg+xml"),
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("ico", "image/x-icon"),
        ("wasm", "application/wasm"),
        ("pdf", "application/pdf"),
    ]);
}

/// Serves the not yet consumed part of the request path from under
/// `base_path`.
///
/// A directory is answered with its `index.html`, or else with the first
/// `index.<ext>` found for `index_exts` in order. Directory listings are
/// never produced: every resolution failure is NotFound.
#[derive(Debug, Clone)]
pub struct FileServer {
    base_path: PathBuf,
    index_exts: Vec<String>,
}

impl FileServer {
    pub fn new<I, S>(base_path: impl Into<PathBuf>, index_exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base_path: base_path.into(),
            index_exts: index_exts.into_iter().map(Into::into).collect(),
        }
    }
}

impl Handler for FileServer {
    fn handle(&self, w: &mut ResponseWriter, _: &Request, cx: &mut RouteContext) {
        let path = match resolve(&self.base_path, &self.index_exts, &cx.remaining_path()) {
            Ok(path) => path,
            Err(err) => {
                debug!(%err, "file not resolved");
                w.not_found();
                return;
            }
        };
        info!("file path: {:?}", path);

        match fs::read(&path) {
            Ok(contents) => {
                w.set_reason_phrase(ReasonPhrase::OK);
                w.set_body(contents, content_type(&path));
            }
            Err(err) => {
                error!(?err, "file read");
                w.not_found();
            }
        }
    }
}

pub fn serve_files<I, S>(base_path: impl Into<PathBuf>, index_exts: I) -> FileServer
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    FileServer::new(base_path, index_exts)
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid path: {0:?}")]
    InvalidPath(PathBuf),
    #[error("no index file in {0:?}")]
    NoIndex(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Maps `suffix` under `base_path` to the file that should be served.
pub fn resolve(
    base_path: impl AsRef<Path>,
    index_exts: &[String],
    suffix: &str,
) -> Result<PathBuf, ResolveError> {
    let path = build_path(base_path, suffix)?;
    if !fs::metadata(&path)?.is_dir() {
        return Ok(path);
    }

    std::iter::once("html")
        .chain(index_exts.iter().map(String::as_str))
        .map(|ext| path.join(format!("index.{}", ext.trim_start_matches('.'))))
        .find(|candidate| candidate.is_file())
        .ok_or(ResolveError::NoIndex(path))
}

fn build_path(base_path: impl AsRef<Path>, suffix: impl AsRef<Path>) -> Result<PathBuf, ResolveError> {
    let path = path_clean::clean(base_path.as_ref().join(&suffix));

    let base = path_clean::clean(base_path.as_ref());
    if !path.starts_with(&base) {
        warn!("file path: {:?}", path);
        return Err(ResolveError::InvalidPath(path));
    }
    Ok(path)
}

fn content_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| CONTENT_TYPES.get(ext.to_lowercase().as_str()).copied())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}
