//! Minimal HTTP/1.1 framing over a persistent stream.
//!
//! Only what the data API needs: `GET`/`POST` requests with an optional JSON
//! body, and responses framed by `Content-Length`, chunked encoding, or EOF.

use crate::ConnectionConfig;
use servercom_core::ProtocolError;
use std::fmt;
use std::io::{self, Read};

/// Largest response head accepted before giving up on finding its end.
const MAX_HEAD_LEN: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
        })
    }
}

/// Build the bytes of one request.
pub fn encode_request(
    method: Method,
    path: &str,
    config: &ConnectionConfig,
    body: Option<&[u8]>,
) -> Vec<u8> {
    let mut head = format!(
        "{method} {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Authorization: {auth}\r\n\
         User-Agent: {agent}\r\n\
         Accept: application/json\r\n",
        host = config.host,
        auth = config.credentials.basic_auth(),
        agent = config.user_agent,
    );
    if let Some(body) = body {
        head.push_str("Content-Type: application/json\r\n");
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("\r\n");

    let mut request = head.into_bytes();
    if let Some(body) = body {
        request.extend_from_slice(body);
    }
    request
}

/// A parsed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Parse one complete response as returned by a transport. Interim `1xx`
    /// responses in front of it are skipped.
    pub fn parse(raw: &[u8]) -> Result<Self, ProtocolError> {
        let malformed = ProtocolError::MalformedResponse;
        let mut raw = trim_nul_start(raw);
        if raw.is_empty() {
            return Err(malformed("empty response".into()));
        }
        let head = loop {
            let head = Head::parse(raw)
                .map_err(malformed)?
                .ok_or_else(|| malformed("response head is not terminated".into()))?;
            if !head.is_interim() {
                break head;
            }
            raw = trim_nul_start(&raw[head.len..]);
        };
        let rest = &raw[head.len..];

        let body = match head.body_framing().map_err(malformed)? {
            BodyFraming::None => Vec::new(),
            BodyFraming::Length(len) => rest
                .get(..len)
                .ok_or_else(|| {
                    malformed(format!(
                        "body is {} bytes, Content-Length says {len}",
                        rest.len()
                    ))
                })?
                .to_vec(),
            BodyFraming::Chunked => scan_chunked(rest)
                .map_err(malformed)?
                .map(|(body, _)| body)
                .ok_or_else(|| malformed("chunked body is truncated".into()))?,
            BodyFraming::UntilEof => rest.to_vec(),
        };

        Ok(Self {
            code: head.code,
            headers: head.headers,
            body: trim_nul_end(&body).to_vec(),
        })
    }

    /// First header value with the given (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        header(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

/// Read exactly one final response from `reader`, interim responses
/// included in front of it.
///
/// Fails with `UnexpectedEof` if the peer closes before the response is
/// complete, including before the first byte, and with `InvalidData` when the
/// response cannot be framed. Either way the stream is no longer usable.
pub fn read_message<R: Read + ?Sized>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 512];
    // Offset of the first byte after any interim responses.
    let mut offset = 0;
    loop {
        let framing = message_len(&buf[offset..]).map_err(invalid_data)?;
        match framing {
            Framing::Complete(len) => {
                buf.truncate(offset + len);
                return Ok(buf);
            }
            Framing::Interim(len) => {
                offset += len;
                continue;
            }
            Framing::Incomplete | Framing::UntilEof => {}
        }
        if buf.len() - offset > MAX_HEAD_LEN + MAX_BODY_LEN {
            return Err(invalid_data(format!(
                "response exceeds {} bytes",
                MAX_HEAD_LEN + MAX_BODY_LEN
            )));
        }

        let n = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if n == 0 {
            return match framing {
                Framing::UntilEof => Ok(buf),
                _ if buf.is_empty() => Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "server closed the connection",
                )),
                _ => Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "server closed the connection mid-response",
                )),
            };
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Whether a raw response tells the client the server will close the stream.
pub fn announces_close(raw: &[u8]) -> bool {
    let mut raw = trim_nul_start(raw);
    while let Ok(Some(head)) = Head::parse(raw) {
        if !head.is_interim() {
            return head.closes();
        }
        raw = trim_nul_start(&raw[head.len..]);
    }
    false
}

/// Largest body accepted, in bytes.
pub const MAX_BODY_LEN: usize = 8 * 1024 * 1024;

/// Most headers accepted on one response.
const MAX_HEADERS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Incomplete,
    /// An interim response of this many bytes; the final one follows.
    Interim(usize),
    Complete(usize),
    UntilEof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFraming {
    None,
    Length(usize),
    Chunked,
    UntilEof,
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn message_len(buf: &[u8]) -> Result<Framing, String> {
    let start = buf.len() - trim_nul_start(buf).len();
    let Some(head) = Head::parse(&buf[start..])? else {
        if buf.len() - start > MAX_HEAD_LEN {
            return Err(format!("response head exceeds {MAX_HEAD_LEN} bytes"));
        }
        return Ok(Framing::Incomplete);
    };
    let body_start = start + head.len;
    if head.is_interim() {
        return Ok(Framing::Interim(body_start));
    }

    Ok(match head.body_framing()? {
        BodyFraming::None => Framing::Complete(body_start),
        BodyFraming::Length(len) => {
            let end = body_start
                .checked_add(len)
                .ok_or_else(|| format!("Content-Length {len} overflows"))?;
            if buf.len() >= end {
                Framing::Complete(end)
            } else {
                Framing::Incomplete
            }
        }
        BodyFraming::Chunked => match scan_chunked(&buf[body_start..])? {
            Some((_, used)) => Framing::Complete(body_start + used),
            None => Framing::Incomplete,
        },
        BodyFraming::UntilEof => Framing::UntilEof,
    })
}

struct Head {
    code: u16,
    headers: Vec<(String, String)>,
    /// Bytes spanned by the head, including the blank line ending it.
    len: usize,
}

impl Head {
    /// Parse a response head from the start of `buf`. `Ok(None)` means the
    /// head is not complete yet.
    fn parse(buf: &[u8]) -> Result<Option<Self>, String> {
        let mut slots = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut response = httparse::Response::new(&mut slots);
        let len = match response.parse(buf) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => return Ok(None),
            Err(e) => return Err(format!("bad response head: {e}")),
        };
        let code = response
            .code
            .filter(|c| (100..600).contains(c))
            .ok_or_else(|| format!("bad status code {:?}", response.code))?;
        let headers = response
            .headers
            .iter()
            .map(|h| {
                (
                    h.name.to_string(),
                    String::from_utf8_lossy(h.value).trim().to_string(),
                )
            })
            .collect();
        Ok(Some(Self { code, headers, len }))
    }

    fn is_interim(&self) -> bool {
        (100..200).contains(&self.code)
    }

    fn body_framing(&self) -> Result<BodyFraming, String> {
        if matches!(self.code, 100..=199 | 204 | 304) {
            return Ok(BodyFraming::None);
        }
        let chunked = header(&self.headers, "transfer-encoding")
            .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"));
        if chunked {
            return Ok(BodyFraming::Chunked);
        }
        let Some(value) = header(&self.headers, "content-length") else {
            return Ok(BodyFraming::UntilEof);
        };
        let len = value
            .parse::<usize>()
            .map_err(|_| format!("bad Content-Length: {value:?}"))?;
        if len > MAX_BODY_LEN {
            return Err(format!("Content-Length {len} exceeds {MAX_BODY_LEN}"));
        }
        Ok(BodyFraming::Length(len))
    }

    fn closes(&self) -> bool {
        header(&self.headers, "connection").is_some_and(|v| v.eq_ignore_ascii_case("close"))
    }
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Decode a chunked body. `Ok(None)` means more bytes are needed; on success
/// returns the body and the number of input bytes it spanned.
fn scan_chunked(data: &[u8]) -> Result<Option<(Vec<u8>, usize)>, String> {
    let mut body = Vec::new();
    let mut pos = 0;
    loop {
        let Some(line_len) = find(&data[pos..], b"\r\n") else {
            return Ok(None);
        };
        let line = std::str::from_utf8(&data[pos..pos + line_len])
            .map_err(|_| "chunk size is not UTF-8".to_string())?;
        let size_field = line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_field, 16)
            .map_err(|_| format!("bad chunk size: {size_field:?}"))?;
        if size > MAX_BODY_LEN - body.len() {
            return Err(format!("chunked body exceeds {MAX_BODY_LEN} bytes"));
        }
        pos += line_len + 2;

        if size == 0 {
            // Skip trailers up to the terminating blank line.
            loop {
                let Some(len) = find(&data[pos..], b"\r\n") else {
                    return Ok(None);
                };
                pos += len + 2;
                if len == 0 {
                    return Ok(Some((body, pos)));
                }
            }
        }

        let end = pos
            .checked_add(size)
            .and_then(|e| e.checked_add(2))
            .ok_or_else(|| format!("chunk size {size} overflows"))?;
        if data.len() < end {
            return Ok(None);
        }
        body.extend_from_slice(&data[pos..pos + size]);
        if &data[pos + size..end] != b"\r\n" {
            return Err("chunk is not terminated by CRLF".into());
        }
        pos = end;
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn trim_nul_start(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

fn trim_nul_end(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}
