use std::{
    io::{self, ErrorKind, Read},
    iter::{self, Chain, Repeat},
};

use tracing_subscriber::EnvFilter;

use crate::{
    request::Request, response_writer::ResponseWriter, router::RouteContext, server::Handler,
    status_code_registry::ReasonPhrase,
};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
// handlers
// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -

/// Answers 200 with `name` as the body.
pub fn label(name: &'static str) -> impl Handler + Send + Sync + 'static {
    move |w: &mut ResponseWriter, _: &Request, _: &mut RouteContext| {
        w.set_reason_phrase(ReasonPhrase::OK);
        w.set_body_str(name);
    }
}

/// Answers 200 with the routing context it was reached with.
pub fn trail() -> impl Handler + Send + Sync + 'static {
    |w: &mut ResponseWriter, _: &Request, cx: &mut RouteContext| {
        w.set_reason_phrase(ReasonPhrase::OK);
        w.set_body_str(&format!(
            "prefix={} captures={} remaining={}",
            cx.prefix().join(","),
            cx.captures().join(","),
            cx.remaining().join(",")
        ));
    }
}

/// Handles `r` with a fresh context, the way the server does.
pub fn run(handler: &impl Handler, r: Request) -> ResponseWriter {
    let mut w = ResponseWriter::new_empty();
    let mut cx = RouteContext::new(r.get_path());
    handler.handle(&mut w, &r, &mut cx);
    w
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
// ErrReader
// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -

/// Yields `prefix` one byte at a time, then fails.
pub struct ErrReader<I> {
    it: I,
}

impl<I> ErrReader<I> {
    pub fn new(prefix: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            it: prefix.into_iter(),
        }
    }
}

impl<'a, I: Iterator<Item = &'a u8>> Read for ErrReader<I> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(byte) = self.it.next() {
            buf[0] = *byte;
            return Ok(1);
        }
        Err(io::Error::new(ErrorKind::Other, "error"))
    }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -
// InfReader
// - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - - -

/// Yields `prefix`, then `repeat` forever.
pub struct InfReader {
    it: Chain<std::vec::IntoIter<u8>, Repeat<u8>>,
}

impl InfReader {
    pub fn new<'a>(prefix: impl IntoIterator<Item = &'a u8>, repeat: u8) -> Self {
        let prefix: Vec<u8> = prefix.into_iter().copied().collect();
        Self {
            it: prefix.into_iter().chain(iter::repeat(repeat)),
        }
    }
}

impl Read for InfReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        for (slot, byte) in buf.iter_mut().zip(self.it.by_ref()) {
            *slot = byte;
            n += 1;
        }
        Ok(n)
    }
}
