#[cfg(test)]
use std::net::SocketAddr;
use std::{
    io::Write,
    net::{TcpListener, TcpStream, ToSocketAddrs},
    thread,
    time::Duration,
};

use tracing::{error, info, span, Level, Span};

use crate::{
    request::{EndOfFile, Request, RequestReader},
    response_writer::ResponseWriter,
    router::RouteContext,
    status_code_registry::ReasonPhrase,
};

const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can answer a request: a terminal handler, an action or a
/// whole router. `cx` is the routing context of this request only.
pub trait Handler {
    fn handle(&self, w: &mut ResponseWriter, r: &Request, cx: &mut RouteContext);
}

impl<T> Handler for T
where
    T: Fn(&mut ResponseWriter, &Request, &mut RouteContext),
{
    fn handle(&self, w: &mut ResponseWriter, r: &Request, cx: &mut RouteContext) {
        self(w, r, cx)
    }
}

#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
}

impl Server {
    pub fn new(addr: impl ToSocketAddrs) -> anyhow::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr)?,
        })
    }

    #[cfg(test)]
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr().unwrap()
    }

    /// Serves connections until the listener fails, one thread per
    /// connection. `handler` is shared read-only by every thread.
    pub fn run(&self, handler: impl Handler + Sync) {
        thread::scope(|s| {
            for stream in self.listener.incoming() {
                let stream = match stream {
                    Ok(stream) => stream,
                    Err(err) => {
                        error!(?err);
                        continue;
                    }
                };

                let handler = &handler;
                s.spawn(move || {
                    let span = create_conn_span(&stream);
                    let _guard = span.enter();
                    info!("new conn");

                    if let Err(err) = handle_connection(stream, Some(READ_TIMEOUT), handler) {
                        error!(?err);
                    }

                    info!("conn end");
                });
            }
        });
    }
}

#[derive(Debug)]
enum ConnCtrl {
    KeepAlive,
    Close,
}

fn handle_connection(
    stream: TcpStream,
    read_timeout: Option<Duration>,
    handler: &impl Handler,
) -> anyhow::Result<()> {
    let (reader, writer) = (&stream, &stream);
    reader.set_read_timeout(read_timeout)?;
    let mut request_reader = RequestReader::new(reader);

    loop {
        match handle_request(&mut request_reader, writer, handler)? {
            ConnCtrl::KeepAlive => continue,
            ConnCtrl::Close => return Ok(()),
        }
    }
}

fn handle_request(
    request_reader: &mut RequestReader<&TcpStream>,
    mut writer: &TcpStream,
    handler: &impl Handler,
) -> anyhow::Result<ConnCtrl> {
    let r = match request_reader.read() {
        Ok(r) => r,
        Err(err) => {
            if err.downcast_ref::<EndOfFile>().is_some() {
                return Ok(ConnCtrl::Close);
            }

            error!(?err);
            let mut w = ResponseWriter::new_empty();
            w.set_reason_phrase(ReasonPhrase::BadRequest);
            w.add_header("Connection", "close");
            writer.write_all(&w.write())?;
            return Ok(ConnCtrl::Close);
        }
    };

    let span = create_req_span(&r);
    let _guard = span.enter();

    let conn_ctrl = match r
        .get_headers()
        .get_connection()
        .map(|mut it| it.any(|val| val.eq_ignore_ascii_case("close")))
    {
        Some(true) => ConnCtrl::Close,
        _ => ConnCtrl::KeepAlive,
    };

    // every request starts from a context of its own
    let mut cx = RouteContext::new(r.get_path());
    let mut w = ResponseWriter::new_empty();
    handler.handle(&mut w, &r, &mut cx);
    info!(status = w.get_status_code().unwrap_or(200), "done");

    if let ConnCtrl::Close = conn_ctrl {
        w.add_header("Connection", "close");
    }
    writer.write_all(&w.write())?;
    Ok(conn_ctrl)
}

fn create_conn_span(stream: &TcpStream) -> Span {
    let peer_addr = match stream.peer_addr() {
        Ok(addr) => addr.to_string(),
        Err(err) => {
            error!(?err);
            "unknown".to_owned()
        }
    };

    span!(Level::INFO, "conn", peer_addr = %peer_addr)
}

fn create_req_span(r: &Request) -> Span {
    span!(
        Level::INFO,
        "req",
        method = r.get_http_method(),
        target = r.get_request_target()
    )
}

#[cfg(test)]
pub fn noop_handler() -> impl Handler + Sync {
    |_: &mut ResponseWriter, _: &Request, _: &mut RouteContext| {}
}

#[cfg(test)]
pub mod tests {
    use std::{
        io::{BufReader, Read, Write},
        net::{TcpListener, TcpStream},
        thread,
        time::Duration,
    };

    use crate::{
        request::Request, response_writer::ResponseWriter, router::RouteContext,
        status_code_registry::ReasonPhrase,
    };

    use super::{handle_connection, noop_handler, Server};

    #[test]
    fn test_request_reader_timeout() {
        let timeout = Some(Duration::from_millis(100));

        let listener = TcpListener::bind("localhost:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server_handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handle_connection(stream, timeout, &noop_handler())
        });

        let _client_handle = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            stream.write_all(b"GET / HTTP/1.1\r\n").unwrap();
            thread::sleep(Duration::from_secs(5));
        });

        // the stalled request is answered with 400 and the connection closed
        server_handle.join().unwrap().unwrap();
    }

    #[test]
    fn test_persistent_connection() {
        let timeout = Some(Duration::from_millis(100));

        let server = Server::new("localhost:0").unwrap();
        let addr = server.local_addr();

        thread::spawn(move || {
            server.run(|w: &mut ResponseWriter, _: &Request, _: &mut RouteContext| {
                w.set_reason_phrase(ReasonPhrase::OK);
            });
        });

        let stream = TcpStream::connect(addr).unwrap();
        let (r, mut writer) = (&stream, &stream);
        r.set_read_timeout(timeout).unwrap();
        let mut reader = BufReader::new(r);

        writer.write_all(b"GET / HTTP/1.1\r\n\r\n").unwrap();

        // The connection stays open, so reading to EOF runs into the timeout.
        let mut buf = vec![];
        let res = reader.read_to_end(&mut buf);
        res.unwrap_err();
        assert!(String::from_utf8_lossy(&buf).starts_with("HTTP/1.1 200 OK\r\n"));
    }

    #[test]
    fn test_undecodable_path_is_bad_request() {
        let server = Server::new("localhost:0").unwrap();
        let addr = server.local_addr();

        thread::spawn(move || {
            server.run(noop_handler());
        });

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(b"GET /%FF%FE HTTP/1.1\r\n\r\n").unwrap();

        // answered, then closed
        let mut buf = vec![];
        stream.read_to_end(&mut buf).unwrap();
        assert!(String::from_utf8_lossy(&buf).starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[test]
    fn test_fresh_context_per_request() {
        let server = Server::new("localhost:0").unwrap();
        let addr = server.local_addr();

        thread::spawn(move || {
            server.run(|w: &mut ResponseWriter, _: &Request, cx: &mut RouteContext| {
                cx.consume();
                w.set_body_str(&cx.remaining_path());
            });
        });

        for _ in 0..3 {
            let url = format!("http://{}/a/b/c", addr);
            let body = reqwest::blocking::get(url).unwrap().text().unwrap();
            assert_eq!(body, "b/c");
        }
    }
}
