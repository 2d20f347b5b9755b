use std::io::{BufRead, BufReader, ErrorKind, Read, Take};

use thiserror::Error;
use tracing::{info, warn};

use crate::headers::Headers;

const REQUEST_LINE_LIMIT: u64 = 1024;
const HEADERS_LIMIT: u64 = 8 * 1024;
const BODY_LIMIT: usize = 8 * 1024 * 1024;

/// The request facts the router classifies on, plus whatever the terminal
/// handlers want to read.
#[derive(Debug, Clone)]
pub struct Request {
    method: String,
    target: String,
    path: String,
    version: String,
    headers: Headers,
    body: Option<Vec<u8>>,
    secure: bool,
}

impl Request {
    /// A target whose path does not decode to UTF-8 keeps its raw path;
    /// `RequestReader` rejects such targets before they get here.
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        let target = target.into();
        let path = decode_path(&target).unwrap_or_else(|| {
            warn!(request_target = target.as_str(), "path is not valid UTF-8 once decoded");
            raw_path(&target).to_owned()
        });
        Self {
            method: method.into(),
            target,
            path,
            version: "HTTP/1.1".to_owned(),
            headers: Headers::new_empty(),
            body: None,
            secure: false,
        }
    }

    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Marks the request as received over TLS.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn get_http_method(&self) -> &str {
        &self.method
    }

    pub fn get_request_target(&self) -> &str {
        &self.target
    }

    pub fn get_http_version(&self) -> &str {
        &self.version
    }

    /// Percent-decoded request target without the query string.
    pub fn get_path(&self) -> &str {
        &self.path
    }

    pub fn get_query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    pub fn get_headers(&self) -> &Headers {
        &self.headers
    }

    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    pub fn get_body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// "https" for TLS sessions, "http" otherwise.
    pub fn get_protocol(&self) -> &'static str {
        if self.secure {
            "https"
        } else {
            "http"
        }
    }

    pub fn host_parts(&self) -> HostParts {
        HostParts::parse(self.headers.get_host().unwrap_or_default())
    }

    pub fn host(&self) -> String {
        self.host_parts().host
    }

    pub fn domain(&self) -> String {
        self.host_parts().domain
    }

    pub fn port(&self) -> String {
        self.host_parts().port
    }
}

fn raw_path(target: &str) -> &str {
    match target.split_once('?') {
        Some((path, _)) => path,
        None => target,
    }
}

fn decode_path(target: &str) -> Option<String> {
    urlencoding::decode(raw_path(target))
        .ok()
        .map(|path| path.into_owned())
}

/// The `Host` header taken apart: `www.example.com:8080` is host `www`,
/// domain `example.com`, port `8080`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostParts {
    pub host: String,
    pub domain: String,
    pub port: String,
}

impl HostParts {
    pub const DEFAULT_PORT: &'static str = "80";

    pub fn parse(authority: &str) -> Self {
        let (name, port) = match authority.rfind(':') {
            // a colon inside "[::1]" is not a port separator
            Some(pos) if pos > 0 && !authority[pos..].contains(']') => {
                (&authority[..pos], &authority[pos + 1..])
            }
            _ => (authority, Self::DEFAULT_PORT),
        };

        let name = name.to_lowercase();
        let (host, domain) = match name.find('.') {
            Some(pos) if pos > 0 => (name[..pos].to_owned(), name[pos + 1..].to_owned()),
            _ => (name, String::new()),
        };

        Self {
            host,
            domain,
            port: port.to_owned(),
        }
    }
}

#[derive(Error, Debug)]
#[error("end of file")]
pub struct EndOfFile;

#[derive(Error, Debug)]
#[error("invalid request")]
pub struct InvalidRequest;

pub struct RequestReader<R> {
    buf_reader: Take<BufReader<R>>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(r: R) -> Self {
        Self {
            buf_reader: BufReader::new(r).take(u64::MAX),
        }
    }

    fn read_line(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        if self.buf_reader.read_line(&mut line)? == 0 {
            Err(EndOfFile)?
        }
        Ok(line.strip_suffix("\r\n").ok_or(InvalidRequest)?.to_owned())
    }

    pub fn read(&mut self) -> anyhow::Result<Request> {
        self.buf_reader.set_limit(REQUEST_LINE_LIMIT);
        let request_line = self.read_line()?;

        let mut parts = request_line.split(' ');
        let (Some(method), Some(target), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(InvalidRequest.into());
        };
        if !target.starts_with('/') || decode_path(target).is_none() {
            Err(InvalidRequest)?
        }

        info!(?request_line);

        let mut request = Request::new(method, target);
        request.version = version.to_owned();

        self.buf_reader.set_limit(HEADERS_LIMIT);
        loop {
            let line = match self.read_line() {
                Ok(line) => line,
                // the connection closed or the limit ran out inside the header block
                Err(err) if err.is::<EndOfFile>() => return Err(InvalidRequest.into()),
                Err(err) => return Err(err),
            };
            if line.is_empty() {
                break;
            }
            let (k, v) = line.split_once(':').ok_or(InvalidRequest)?;
            request.headers.insert(k.trim(), v.trim());
        }

        let content_length = request
            .headers
            .get_content_length()
            .map_err(|_| InvalidRequest)?;
        if let Some(content_length) = content_length {
            if content_length > BODY_LIMIT {
                Err(InvalidRequest)?
            }
            self.buf_reader.set_limit(content_length as u64);
            let mut buf = vec![0; content_length];
            if let Err(err) = self.buf_reader.read_exact(&mut buf) {
                if err.kind() == ErrorKind::UnexpectedEof {
                    Err(InvalidRequest)?
                } else {
                    Err(err)?
                }
            }
            request.body = Some(buf);
        }

        Ok(request)
    }
}
