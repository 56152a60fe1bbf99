use anyhow::Result;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};

/// Splits a chunked body into `\n`-terminated lines, the way a blocking
/// `readline()` would: the newline is kept, and a trailing fragment without
/// one is still returned as the last line.
pub struct LineReader<S> {
    stream: S,
    buf: Vec<u8>,
    // bytes of `buf` already known to hold no newline
    scanned: usize,
    done: bool,
}

impl<S, E> LineReader<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Into<anyhow::Error>,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: Vec::new(),
            scanned: 0,
            done: false,
        }
    }

    /// `Ok(None)` once the stream is exhausted and nothing is buffered.
    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(pos) = self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
                let rest = self.buf.split_off(self.scanned + pos + 1);
                self.scanned = 0;
                return Ok(Some(std::mem::replace(&mut self.buf, rest)));
            }
            self.scanned = self.buf.len();

            if self.done {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                self.scanned = 0;
                return Ok(Some(std::mem::take(&mut self.buf)));
            }

            match self.stream.next().await {
                Some(chunk) => {
                    let chunk = chunk.map_err(Into::into)?;
                    self.buf.extend_from_slice(&chunk);
                }
                None => self.done = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn reader(chunks: Vec<&'static str>) -> LineReader<impl Stream<Item = Result<Bytes>> + Unpin> {
        LineReader::new(stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c.as_bytes()))),
        ))
    }

    async fn collect<S, E>(mut r: LineReader<S>) -> Vec<String>
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
        E: Into<anyhow::Error>,
    {
        let mut out = Vec::new();
        while let Some(line) = r.next_line().await.unwrap() {
            out.push(String::from_utf8(line).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn lines_keep_their_newline() {
        let lines = collect(reader(vec![": keep-alive\n\ndata: {}\n\n"])).await;
        assert_eq!(lines, vec![": keep-alive\n", "\n", "data: {}\n", "\n"]);
    }

    #[tokio::test]
    async fn chunk_boundaries_do_not_split_lines() {
        let lines = collect(reader(vec!["da", "ta: 1", "\nda", "ta: 2\n", "", "\n"])).await;
        assert_eq!(lines, vec!["data: 1\n", "data: 2\n", "\n"]);
    }

    #[tokio::test]
    async fn trailing_fragment_is_the_last_line() {
        let mut r = reader(vec!["one\ntw", "o"]);
        assert_eq!(r.next_line().await.unwrap().unwrap(), b"one\n");
        assert_eq!(r.next_line().await.unwrap().unwrap(), b"two");
        assert!(r.next_line().await.unwrap().is_none());
        assert!(r.next_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn long_line_over_many_chunks() {
        let mut chunks = vec!["first\n"];
        chunks.extend(std::iter::repeat("x").take(5000));
        chunks.extend(["\nlast\n", "tail"]);
        let lines = collect(reader(chunks)).await;
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "first\n");
        assert_eq!(lines[1].len(), 5001);
        assert!(lines[1].ends_with("x\n"));
        assert_eq!(lines[2], "last\n");
        assert_eq!(lines[3], "tail");
    }

    #[tokio::test]
    async fn empty_stream_yields_nothing() {
        assert!(collect(reader(vec![])).await.is_empty());
    }

    #[tokio::test]
    async fn stream_errors_surface() {
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"ok\n")),
            Err(anyhow::anyhow!("connection reset")),
        ];
        let mut r = LineReader::new(stream::iter(chunks));
        assert_eq!(r.next_line().await.unwrap().unwrap(), b"ok\n");
        let err = r.next_line().await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));
    }
}
