use std::io::Read;

use flate2::{bufread::GzEncoder, Compression};
use tracing::{debug, error};

use crate::{
    request::Request, response_writer::ResponseWriter, router::RouteContext, server::Handler,
};

/// Wraps `handler` so that non-empty bodies are gzip encoded for clients
/// that accept it.
pub fn new(handler: impl Handler + Send + Sync) -> impl Handler + Send + Sync {
    move |w: &mut ResponseWriter, r: &Request, cx: &mut RouteContext| {
        handler.handle(w, r, cx);

        let body = w.get_body();
        if body.is_empty() {
            return;
        }

        let accepts_gzip = r
            .get_headers()
            .get_accept_encoding()
            .is_some_and(|mut encodings| encodings.any(|encoding| encoding == "gzip"));
        if !accepts_gzip {
            return;
        }

        let Some(content_type) = w.get_content_type_header() else {
            error!("Content-Type is supposed to be present");
            return;
        };
        let content_type = String::from(content_type);

        let mut buffer = vec![];
        if let Err(err) = GzEncoder::new(body, Compression::fast()).read_to_end(&mut buffer) {
            error!(?err, "gzip");
            return;
        }

        debug!(plain = w.get_body().len(), encoded = buffer.len(), "gzip");
        w.set_body(buffer, &content_type);
        w.add_content_encoding_header("gzip");
    }
}
