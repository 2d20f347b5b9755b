use crate::status_code_registry::{self, ReasonPhrase};

const NOT_FOUND_BODY: &str = "404 page not found\n";

#[derive(Debug)]
pub struct ResponseWriter {
    status_code: Option<u16>,
    reason_phrase: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseWriter {
    fn new(status_code: Option<u16>, reason_phrase: Option<String>) -> Self {
        Self {
            status_code,
            reason_phrase,
            headers: vec![],
            body: vec![],
        }
    }

    pub fn new_empty() -> Self {
        Self::new(None, None)
    }

    pub fn get_status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn set_status_code(&mut self, status_code: u16) {
        self.status_code = Some(status_code);
        self.reason_phrase =
            status_code_registry::get_reason_phrase(status_code).map(|r| r.to_string());
    }

    pub fn set_reason_phrase(&mut self, reason_phrase: ReasonPhrase) {
        self.status_code = Some(status_code_registry::get_status_code(reason_phrase));
        self.reason_phrase = Some(reason_phrase.to_string());
    }

    /// The one failure outcome routing knows about.
    pub fn not_found(&mut self) {
        self.set_reason_phrase(ReasonPhrase::NotFound);
        self.set_body_str(NOT_FOUND_BODY);
    }

    pub fn add_header(&mut self, k: &str, v: impl Into<String>) {
        let v = v.into();
        if let Some(entry) = self
            .headers
            .iter_mut()
            .find(|entry| entry.0.eq_ignore_ascii_case(k))
        {
            entry.1 = v;
        } else {
            self.headers.push((k.to_owned(), v));
        }
    }

    pub fn get_header(&self, k: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|entry| entry.0.eq_ignore_ascii_case(k))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_content_type_header(&self) -> Option<&str> {
        self.get_header("Content-Type")
    }

    pub fn add_content_encoding_header(&mut self, content_encoding: &str) {
        self.add_header("Content-Encoding", content_encoding);
    }

    pub fn get_body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: Vec<u8>, content_type: &str) {
        self.body = body;
        self.add_header("Content-Type", content_type);
        self.add_header("Content-Length", self.body.len().to_string());
    }

    pub fn set_body_str(&mut self, body: &str) {
        self.set_body(body.as_bytes().to_vec(), "text/plain; charset=utf-8");
    }

    pub fn write(mut self) -> Vec<u8> {
        // a handler that never set a status answered successfully
        let status_code = self.status_code.unwrap_or(200);
        let reason_phrase = match self.reason_phrase.take() {
            Some(reason_phrase) => Some(reason_phrase),
            None => status_code_registry::get_reason_phrase(status_code).map(|r| r.to_string()),
        };

        let mut status_line = format!("HTTP/1.1 {}", status_code);
        if let Some(reason_phrase) = &reason_phrase {
            status_line = format!("{} {}", status_line, reason_phrase);
        }
        status_line.push_str("\r\n");

        if self.get_header("Content-Length").is_none() {
            self.add_header("Content-Length", self.body.len().to_string());
        }

        let mut headers = self
            .headers
            .iter()
            .map(|(k, v)| format!("{}: {}\r\n", k, v))
            .collect::<Vec<_>>()
            .join("");
        headers.push_str("\r\n");

        let mut resp = vec![];
        resp.extend(status_line.bytes());
        resp.extend(headers.bytes());
        resp.extend(self.body);
        resp
    }
}
