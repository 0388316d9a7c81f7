use burrowio::ByteCursor;
use tokio::io::AsyncRead;

/// One parsed request line. Lives for a single dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub version: String,
}

impl Request {
    /// Split a request line on whitespace into method, path, version.
    ///
    /// Missing fields are left empty rather than rejected; an unparseable
    /// line therefore degrades to an empty path and routes to the fallback
    /// handler downstream.
    pub fn parse(line: &[u8]) -> Self {
        let text = String::from_utf8_lossy(line);
        let mut it = text.split_whitespace();
        Self {
            method: it.next().unwrap_or("").to_string(),
            path: it.next().unwrap_or("").to_string(),
            version: it.next().unwrap_or("").to_string(),
        }
    }
}

/// Read one request off the cursor: the request line, then header lines
/// drained until the blank separator. Header contents are discarded.
///
/// Returns `Ok(None)` when the client is done with the connection: it closed
/// the stream at the request-line position, or sent an empty request line.
pub async fn read_request<R: AsyncRead + Unpin>(
    cursor: &mut ByteCursor<R>,
) -> std::io::Result<Option<Request>> {
    let line = match cursor.read_line().await {
        Ok(l) => l,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    };
    if line.is_empty() {
        return Ok(None);
    }
    let req = Request::parse(&line);

    loop {
        let header = cursor.read_line().await?;
        if header.is_empty() {
            break;
        }
    }

    Ok(Some(req))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_three_tokens() {
        let r = Request::parse(b"GET /dwarves HTTP/1.1");
        assert_eq!(r.method, "GET");
        assert_eq!(r.path, "/dwarves");
        assert_eq!(r.version, "HTTP/1.1");
    }

    #[test]
    fn short_lines_leave_fields_empty() {
        let r = Request::parse(b"GET");
        assert_eq!(r.method, "GET");
        assert_eq!(r.path, "");
        assert_eq!(r.version, "");

        let r = Request::parse(b"");
        assert_eq!(r, Request::default());
    }

    #[test]
    fn tolerates_extra_whitespace() {
        let r = Request::parse(b"GET   /feed    HTTP/1.1");
        assert_eq!(r.path, "/feed");
    }

    #[tokio::test]
    async fn reads_request_and_drains_headers() {
        let raw = b"GET /entities/1 HTTP/1.1\r\nHost: x\r\nUser-Agent: t\r\n\r\nGET";
        let mut c = ByteCursor::new(&raw[..]);
        let req = read_request(&mut c).await.unwrap().unwrap();
        assert_eq!(req.path, "/entities/1");
        // Headers are gone; the next request line is up next.
        assert_eq!(c.peek(3).await.unwrap(), b"GET");
    }

    #[tokio::test]
    async fn empty_request_line_signals_done() {
        let mut c = ByteCursor::new(&b"\r\n"[..]);
        assert!(read_request(&mut c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn closed_stream_signals_done() {
        let mut c = ByteCursor::new(&b""[..]);
        assert!(read_request(&mut c).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_header_terminator_is_an_error() {
        let mut c = ByteCursor::new(&b"GET / HTTP/1.1\r\nHost: x\r\n"[..]);
        assert!(read_request(&mut c).await.is_err());
    }
}
