use bytes::Bytes;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;

pub const TEXT_HTML: &str = "text/html";
pub const IMAGE_SVG: &str = "image/svg+xml";
pub const IMAGE_ICON: &str = "image/x-icon";

const STATUS_REASONS: &[(u16, &str)] = &[(200, "OK"), (404, "Not found")];

/// Textual reason for a status code; unrecognized codes read as "Unknown".
pub fn reason_phrase(code: u16) -> &'static str {
    for (c, reason) in STATUS_REASONS {
        if *c == code {
            return reason;
        }
    }
    "Unknown"
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Bytes,
}

impl Response {
    pub fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: TEXT_HTML,
            body: Bytes::from(body),
        }
    }

    pub fn svg(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: IMAGE_SVG,
            body: Bytes::from(body),
        }
    }

    pub fn icon(bytes: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: IMAGE_ICON,
            body: Bytes::from(bytes),
        }
    }
}

/// Frame and send one response: status line, `Content-Length` computed from
/// the exact byte length of the body, `Content-Type`, blank line, body.
pub async fn write_response<W: AsyncWrite + Unpin>(
    w: &mut W,
    resp: &Response,
) -> std::io::Result<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: {}\r\n\r\n",
        resp.status,
        reason_phrase(resp.status),
        resp.body.len(),
        resp.content_type,
    );
    w.write_all(head.as_bytes()).await?;
    w.write_all(&resp.body).await?;
    w.flush().await
}
