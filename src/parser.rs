//! Hand-written HTTP/1.1 request parser.
//!
//! Scans a single complete request buffer the transport has already framed:
//! request line, header block, then the remaining bytes verbatim as the
//! body. There is no `Content-Length` validation here — framing is the
//! transport's job — and no recovery: malformed input surfaces as a
//! [`ParseError`] which the transport maps to an empty 500.

use crate::error::ParseError;
use crate::http::{HttpRequest, QueryValue};
use http::Method;
use std::collections::HashMap;
use tracing::debug;

/// Methods the parser accepts; anything else is a parse error.
const SUPPORTED_METHODS: [Method; 8] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
    Method::TRACE,
];

/// Cursor-based scanner over one raw request.
pub struct RequestParser<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> RequestParser<'a> {
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    /// Parse the buffer into an [`HttpRequest`].
    pub fn parse(mut self) -> Result<HttpRequest, ParseError> {
        let method = self.parse_method()?;
        let (path, query_params) = self.parse_url()?;
        let version = self.take_until_crlf()?;
        let headers = self.parse_headers()?;
        let body = self.buf[self.cursor..].to_vec();

        debug!(
            method = %method,
            path = %path,
            version = %version,
            header_count = headers.len(),
            body_bytes = body.len(),
            "request parsed"
        );

        Ok(HttpRequest {
            method,
            path,
            version,
            headers,
            query_params,
            body,
            path_variables: HashMap::new(),
        })
    }

    fn current(&self) -> Option<u8> {
        self.buf.get(self.cursor).copied()
    }

    fn bump(&mut self) {
        self.cursor += 1;
    }

    fn eof(&self) -> ParseError {
        ParseError::UnexpectedEof(self.cursor)
    }

    fn parse_method(&mut self) -> Result<Method, ParseError> {
        let token = self.take_until(b' ')?;
        Method::from_bytes(token)
            .ok()
            .filter(|m| SUPPORTED_METHODS.contains(m))
            .ok_or_else(|| ParseError::UnknownMethod(String::from_utf8_lossy(token).into_owned()))
    }

    /// URL up to `?` or space, plus the decoded query string if present.
    fn parse_url(&mut self) -> Result<(String, HashMap<String, QueryValue>), ParseError> {
        let start = self.cursor;
        loop {
            match self.current() {
                Some(b'?') | Some(b' ') => break,
                Some(_) => self.bump(),
                None => return Err(self.eof()),
            }
        }
        let path = String::from_utf8_lossy(&self.buf[start..self.cursor]).into_owned();

        let mut query_params = HashMap::new();
        if self.current() == Some(b'?') {
            self.bump();
            self.parse_query(&mut query_params)?;
        }
        // the space terminating the URL token
        self.bump();
        Ok((path, query_params))
    }

    /// Query string: `&`-separated pairs, `=`-split; a bare name is present
    /// with no value, a comma-joined value is a multi-value list.
    fn parse_query(&mut self, out: &mut HashMap<String, QueryValue>) -> Result<(), ParseError> {
        let mut name_start = self.cursor;
        loop {
            match self.current() {
                Some(b'&') | Some(b' ') | None => {
                    let name = &self.buf[name_start..self.cursor];
                    if !name.is_empty() {
                        out.insert(
                            String::from_utf8_lossy(name).into_owned(),
                            QueryValue::Bare,
                        );
                    }
                    match self.current() {
                        Some(b'&') => {
                            self.bump();
                            name_start = self.cursor;
                        }
                        Some(_) => return Ok(()),
                        None => return Err(self.eof()),
                    }
                }
                Some(b'=') => {
                    let name = String::from_utf8_lossy(&self.buf[name_start..self.cursor]).into_owned();
                    self.bump();
                    let value_start = self.cursor;
                    loop {
                        match self.current() {
                            Some(b'&') | Some(b' ') => break,
                            Some(_) => self.bump(),
                            None => return Err(self.eof()),
                        }
                    }
                    let raw = String::from_utf8_lossy(&self.buf[value_start..self.cursor]).into_owned();
                    let values = raw.split(',').map(str::to_string).collect();
                    out.insert(name, QueryValue::Values(values));
                    if self.current() == Some(b'&') {
                        self.bump();
                        name_start = self.cursor;
                    } else {
                        return Ok(());
                    }
                }
                Some(_) => self.bump(),
            }
        }
    }

    /// Bytes up to (not including) the next CRLF; cursor left on the `\r`.
    fn take_until_crlf(&mut self) -> Result<String, ParseError> {
        let start = self.cursor;
        while self.cursor + 1 < self.buf.len() {
            if self.buf[self.cursor] == b'\r' && self.buf[self.cursor + 1] == b'\n' {
                return Ok(String::from_utf8_lossy(&self.buf[start..self.cursor]).into_owned());
            }
            self.bump();
        }
        Err(self.eof())
    }

    fn take_until(&mut self, stop: u8) -> Result<&'a [u8], ParseError> {
        let start = self.cursor;
        loop {
            match self.current() {
                Some(c) if c == stop => {
                    let token = &self.buf[start..self.cursor];
                    self.bump();
                    return Ok(token);
                }
                Some(_) => self.bump(),
                None => return Err(self.eof()),
            }
        }
    }

    fn eat_crlf(&mut self) -> bool {
        if self.buf[self.cursor..].starts_with(b"\r\n") {
            self.cursor += 2;
            true
        } else {
            false
        }
    }

    /// Header lines until the empty line. Each line splits on the first `:`;
    /// leading spaces of the value are trimmed; names keep their wire case.
    fn parse_headers(&mut self) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();
        loop {
            if !self.eat_crlf() {
                return Err(self.eof());
            }
            if self.eat_crlf() {
                // CRLF CRLF: end of the header block
                return Ok(headers);
            }
            if self.cursor >= self.buf.len() {
                return Err(self.eof());
            }
            let line = self.take_until_crlf()?;
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ParseError::MalformedHeader(line.clone()))?;
            headers.insert(name.to_string(), value.trim_start_matches(' ').to_string());
        }
    }
}
