use bytes::Bytes;
use bytes::BytesMut;
use memchr::memchr;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;

const DEFAULT_CAPACITY: usize = 1024;

/// A read cursor over one connected stream.
///
/// Holds a fixed-size buffer, a fill length, and a read position into it.
/// Invariant: `0 <= pos <= filled <= capacity`. The buffer is refilled only
/// once everything previously received has been consumed, so a single logical
/// line may arrive across any number of fills.
#[derive(Debug)]
pub struct ByteCursor<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    max_line_len: usize,
}

impl<R> ByteCursor<R> {
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: R, cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            inner,
            buf: vec![0u8; cap],
            pos: 0,
            filled: 0,
            max_line_len: DEFAULT_CAPACITY,
        }
    }

    pub fn max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max.max(1);
        self
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Bytes received but not yet consumed.
    pub fn unread(&self) -> usize {
        self.filled - self.pos
    }

    /// Advance the read position by up to `n` unread bytes.
    fn consume(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.filled);
    }
}

impl<R: AsyncRead + Unpin> ByteCursor<R> {
    /// One receive into the whole buffer. Returns the number of bytes read;
    /// zero means the peer closed the stream.
    async fn fill(&mut self) -> std::io::Result<usize> {
        let n = self.inner.read(&mut self.buf).await?;
        self.pos = 0;
        self.filled = n;
        Ok(n)
    }

    /// A view of up to `max` unread bytes, without advancing. Refills when
    /// drained; errors with `UnexpectedEof` if the stream is closed.
    pub async fn peek(&mut self, max: usize) -> std::io::Result<&[u8]> {
        if self.pos == self.filled && self.fill().await? == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream closed",
            ));
        }
        let len = max.min(self.filled - self.pos);
        Ok(&self.buf[self.pos..self.pos + len])
    }

    /// Like [`peek`](Self::peek), but advances past the returned bytes.
    pub async fn read_chunk(&mut self, max: usize) -> std::io::Result<&[u8]> {
        if self.pos == self.filled && self.fill().await? == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream closed",
            ));
        }
        let len = max.min(self.filled - self.pos);
        let start = self.pos;
        self.pos += len;
        Ok(&self.buf[start..start + len])
    }

    /// Consume exactly `literal.len()` bytes, comparing them byte-for-byte
    /// against `literal`.
    ///
    /// On mismatch or stream exhaustion the cursor is left partially advanced;
    /// callers must treat any failure as fatal for the connection.
    pub async fn expect(&mut self, literal: &[u8]) -> std::io::Result<()> {
        let mut matched = 0;
        while matched < literal.len() {
            let chunk = self.read_chunk(literal.len() - matched).await?;
            if chunk != &literal[matched..matched + chunk.len()] {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "byte mismatch against expected sequence",
                ));
            }
            matched += chunk.len();
        }
        Ok(())
    }

    /// Read one CRLF-terminated line, excluding the terminator.
    ///
    /// Scans successive peeked chunks for CR, so correctness does not depend
    /// on the line being delivered in one fill. Errors:
    /// - `InvalidData` "line too long" past the configured max line length,
    /// - `InvalidData` "malformed line terminator" when CR is not followed by LF,
    /// - `UnexpectedEof` "stream closed" when the peer hangs up mid-line.
    pub async fn read_line(&mut self) -> std::io::Result<Bytes> {
        let max = self.max_line_len;
        let mut line = BytesMut::new();
        loop {
            let chunk = self.peek(max).await?;
            match memchr(b'\r', chunk) {
                Some(i) => {
                    if line.len() + i > max {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            "line too long",
                        ));
                    }
                    line.extend_from_slice(&chunk[..i]);
                    self.consume(i);
                    return match self.expect(b"\r\n").await {
                        Ok(()) => Ok(line.freeze()),
                        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                            Err(std::io::Error::new(
                                std::io::ErrorKind::InvalidData,
                                "malformed line terminator",
                            ))
                        }
                        Err(e) => Err(e),
                    };
                }
                None => {
                    let n = chunk.len();
                    if line.len() + n > max {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            "line too long",
                        ));
                    }
                    line.extend_from_slice(chunk);
                    self.consume(n);
                }
            }
        }
    }
}
