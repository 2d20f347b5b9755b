use std::sync::Arc;

use anyhow::anyhow;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::Config;
pub use request::{HostParts, Request};
pub use response_writer::ResponseWriter;
pub use router::{Action, Entry, RouteContext, Router, RouterBuilder};
pub use server::{Handler, Server};
pub use status_code_registry::ReasonPhrase;
pub use templates::Templates;

pub mod config;
pub mod file_server;
pub mod headers;
pub mod middleware;
pub mod request;
pub mod response_writer;
pub mod router;
pub mod server;
pub mod status_code_registry;
pub mod templates;

#[cfg(test)]
mod test_utils;

const PAGE_PATTERN: &str = "^[a-z0-9_-]*$";

fn health(w: &mut ResponseWriter, _: &Request, _: &mut RouteContext) {
    w.set_reason_phrase(ReasonPhrase::OK);
    w.set_body_str("ok\n");
}

/// Routes of the demo site: `/health`, files under `/static/` and rendered
/// templates under `/pages/`, each present only when configured.
pub fn site(config: &Config) -> anyhow::Result<Router> {
    let mut builder = Router::builder();
    builder.exact_path("/health").handle(health);

    if let Some(static_dir) = &config.static_dir {
        info!(dir = ?static_dir, "serving files under /static/");
        builder
            .path("static")
            .serve_files(static_dir.clone(), config.index_ext.iter().cloned());
    }

    if let Some(dir) = &config.templates {
        let ext = config.template_ext.trim_start_matches('.').to_owned();
        let templates = Arc::new(Templates::load_dir(dir, &ext)?);

        let mut pages = Router::builder();
        pages.pattern(PAGE_PATTERN).serve_template(
            move |r: &Request| {
                let page = match r.get_path().trim_end_matches('/').rsplit('/').next() {
                    Some("") | Some("pages") | None => "index",
                    Some(page) => page,
                };
                let data = json!({
                    "page": page,
                    "host": r.host(),
                    "domain": r.domain(),
                    "query": r.get_query(),
                });
                (format!("{}.{}", page, ext), data)
            },
            templates,
        );
        builder.path("pages").subrouter(pages.build());
    }

    Ok(builder.build())
}

pub fn run(config: Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    let router = site(&config)?;
    info!(routes = router.len(), "router built");

    let server = Server::new(&config.addr)?;
    info!(addr = %config.addr, "listening");

    if config.gzip {
        server.run(middleware::gzip_compressor::new(router));
    } else {
        server.run(router);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        fs::{self, File},
        io::Write,
    };

    use clap::Parser;
    use tempdir::TempDir;

    use crate::{request::Request, test_utils::run};

    use super::{site, Config};

    #[test]
    fn test_site_health_only() {
        let router = site(&Config::try_parse_from(["waypost"]).unwrap()).unwrap();

        let w = run(&router, Request::new("GET", "/health"));
        assert_eq!(w.get_body(), b"ok\n");

        let w = run(&router, Request::new("GET", "/static/app.js"));
        assert_eq!(w.get_status_code(), Some(404));
    }

    #[test]
    fn test_site() {
        let tmp_dir = TempDir::new("site").unwrap();
        let public = tmp_dir.path().join("public");
        let views = tmp_dir.path().join("views");
        fs::create_dir_all(public.join("blog")).unwrap();
        fs::create_dir_all(&views).unwrap();

        let files = [
            (public.join("blog/index.php"), "blog index"),
            (views.join("index.tmpl"), "home on {{ host }}"),
            (views.join("about.tmpl"), "about {{ domain }}"),
        ];
        for (path, contents) in files {
            let mut file = File::create(path).unwrap();
            write!(file, "{}", contents).unwrap();
        }

        let config = Config::try_parse_from([
            "waypost",
            "--static-dir",
            public.to_str().unwrap(),
            "--index-ext",
            "php",
            "--templates",
            views.to_str().unwrap(),
            "--template-ext",
            ".tmpl",
        ])
        .unwrap();
        let router = site(&config).unwrap();

        let w = run(&router, Request::new("GET", "/static/blog"));
        assert_eq!(w.get_body(), b"blog index");

        let host = "www.example.com:8080";
        let w = run(&router, Request::new("GET", "/pages/").with_header("Host", host));
        assert_eq!(w.get_body(), b"home on www");

        let w = run(&router, Request::new("GET", "/pages/about").with_header("Host", host));
        assert_eq!(w.get_body(), b"about example.com");

        let w = run(&router, Request::new("GET", "/pages/missing"));
        assert_eq!(w.get_status_code(), Some(404));

        let w = run(&router, Request::new("GET", "/pages/Not.Allowed"));
        assert_eq!(w.get_status_code(), Some(404));
    }
}
