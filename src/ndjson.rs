//! Newline-delimited JSON (NDJSON) stream processing.
//!
//! The chat endpoint streams one JSON object per line:
//! ```text
//! {"message":{"content":"He"},"done":false}
//! {"message":{"content":"llo"},"done":false}
//! {"message":{"content":""},"done":true}
//! ```
//!
//! Network chunks do not respect line boundaries, or even UTF-8 character
//! boundaries. [`LineDecoder`] buffers both kinds of partial data so that
//! only complete, decodable lines ever reach the JSON parser.

use std::collections::VecDeque;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::session::ChatError;

/// Incremental byte-chunk to line decoder.
///
/// Holds two buffers between chunks: undecoded trailing bytes (a
/// multi-byte character may be split across chunks) and decoded text after
/// the last newline (a line may be split across chunks). Feeding the same
/// bytes in different chunkings always yields the same lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Trailing bytes that do not yet form a complete UTF-8 sequence.
    bytes: Vec<u8>,
    /// Decoded text with no terminating newline yet.
    text: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of raw bytes; returns the complete non-blank lines
    /// it unlocked, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.bytes.extend_from_slice(chunk);
        self.decode_buffered();
        self.drain_complete_lines()
    }

    /// Flush at end of stream: the final line needs no terminating newline.
    pub fn finish(&mut self) -> Option<String> {
        if !self.bytes.is_empty() {
            // A sequence still truncated at stream end can never complete.
            let tail = std::mem::take(&mut self.bytes);
            self.text.push_str(&String::from_utf8_lossy(&tail));
        }
        let tail = std::mem::take(&mut self.text);
        let tail = tail.trim();
        (!tail.is_empty()).then(|| tail.to_string())
    }

    /// Move every fully decodable prefix of `bytes` into `text`, keeping
    /// only a truncated trailing sequence (if any) as bytes.
    fn decode_buffered(&mut self) {
        loop {
            match std::str::from_utf8(&self.bytes) {
                Ok(s) => {
                    self.text.push_str(s);
                    self.bytes.clear();
                    return;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.bytes[..valid_up_to]));
                    match e.error_len() {
                        // Genuinely malformed bytes, not a split character.
                        Some(invalid_len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.bytes.drain(..valid_up_to + invalid_len);
                        }
                        // Truncated sequence at the end of the buffer; the
                        // rest of the character arrives with the next chunk.
                        None => {
                            self.bytes.drain(..valid_up_to);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(pos) = self.text.find('\n') {
            let line = self.text[..pos].trim().to_string();
            self.text.drain(..=pos);
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }
}

/// Extension trait for `reqwest::Response` to enable NDJSON streaming.
///
/// # Example
/// ```ignore
/// use futures::StreamExt;
/// use streamchat::ndjson::NdjsonResponseExt;
///
/// let response = client.post(url).json(&body).send().await?;
/// let mut lines = std::pin::pin!(response.ndjson_lines());
/// while let Some(line) = lines.next().await {
///     println!("record: {}", line?);
/// }
/// ```
pub trait NdjsonResponseExt {
    /// Convert the response body into a stream of complete non-blank lines.
    ///
    /// The stream ends when the connection closes. A body-read failure is
    /// surfaced as a single `Err` item.
    fn ndjson_lines(self) -> impl Stream<Item = Result<String, ChatError>> + Send;
}

impl NdjsonResponseExt for reqwest::Response {
    fn ndjson_lines(self) -> impl Stream<Item = Result<String, ChatError>> + Send {
        lines_from_chunks(self.bytes_stream())
    }
}

/// Turn a raw byte-chunk stream into a stream of complete non-blank
/// lines, buffering partial data across chunk boundaries.
pub fn lines_from_chunks(
    byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send,
) -> impl Stream<Item = Result<String, ChatError>> + Send {
    stream::unfold(
        (
            Box::pin(byte_stream),
            LineDecoder::new(),
            VecDeque::new(),
            false,
        ),
        |(mut byte_stream, mut decoder, mut ready, mut ended)| async move {
            loop {
                if let Some(line) = ready.pop_front() {
                    return Some((Ok(line), (byte_stream, decoder, ready, ended)));
                }

                if ended {
                    return None;
                }

                match byte_stream.next().await {
                    Some(Ok(chunk)) => ready.extend(decoder.push(&chunk)),
                    Some(Err(e)) => {
                        ended = true;
                        return Some((
                            Err(ChatError::StreamRead(e)),
                            (byte_stream, decoder, ready, ended),
                        ));
                    }
                    None => {
                        ended = true;
                        ready.extend(decoder.finish());
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_lines_come_out_in_order() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"{\"a\":1}\n{\"b\":2}\n");
        assert_eq!(lines, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn partial_line_is_held_until_newline() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"{\"message\":{\"cont").is_empty());
        let lines = decoder.push(b"ent\":\"Hi\"}}\n");
        assert_eq!(lines, vec!["{\"message\":{\"content\":\"Hi\"}}"]);
    }

    #[test]
    fn chunking_does_not_change_output() {
        let payload = "{\"message\":{\"content\":\"héllo wörld\"}}\n".as_bytes();

        let mut whole = LineDecoder::new();
        let mut expected = whole.push(payload);
        if let Some(tail) = whole.finish() {
            expected.push(tail);
        }

        for split in 1..payload.len() {
            let mut decoder = LineDecoder::new();
            let mut lines = decoder.push(&payload[..split]);
            lines.extend(decoder.push(&payload[split..]));
            if let Some(tail) = decoder.finish() {
                lines.push(tail);
            }
            assert_eq!(lines, expected, "split at byte {split}");
        }
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        // "日" is e6 97 a5; split it mid-sequence.
        let bytes = "日本\n".as_bytes();
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(&bytes[..2]).is_empty());
        let lines = decoder.push(&bytes[2..]);
        assert_eq!(lines, vec!["日本"]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"{\"a\":1}\n\n   \n{\"b\":2}\n");
        assert_eq!(lines, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn carriage_returns_are_trimmed() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"{\"a\":1}\r\n");
        assert_eq!(lines, vec!["{\"a\":1}"]);
    }

    #[test]
    fn finish_flushes_unterminated_final_line() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"{\"done\":true}").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("{\"done\":true}"));
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn invalid_bytes_decode_to_replacement_character() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"ab\xffcd\n");
        assert_eq!(lines, vec!["ab\u{fffd}cd"]);
    }

    #[test]
    fn truncated_sequence_at_stream_end_is_lossy_flushed() {
        let mut decoder = LineDecoder::new();
        let bytes = "abc日".as_bytes();
        assert!(decoder.push(&bytes[..bytes.len() - 1]).is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("abc\u{fffd}"));
    }
}
