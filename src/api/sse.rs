//! Incremental decoder for the `/chat_stream` event stream.
//!
//! Records are separated by a blank line (`\n\n`). Inside a record, every
//! line starting with `data:` carries one JSON payload:
//!
//! ```text
//! data: {"delta":"Hel"}
//!
//! data: {"delta":"lo"}
//!
//! data: {"done":true}
//! ```
//!
//! `StreamDecoder` is push/pull: bytes go in with [`StreamDecoder::push`],
//! events come out of [`StreamDecoder::next_event`] one at a time. Nothing
//! is parsed until it is asked for, so a `done` record stops decoding exactly
//! where it sits. [`decode_stream`] wraps the decoder around any byte-chunk
//! stream and yields a lazy `Stream` of events.

use std::collections::VecDeque;

use futures::{Stream, StreamExt, stream};
use log::{debug, warn};
use serde_json::Value;

use super::backend::ApiError;
use super::types::StreamEvent;

const RECORD_SEPARATOR: &str = "\n\n";
const DATA_PREFIX: &str = "data:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    Open,
    Done,
    Failed,
}

#[derive(Debug)]
pub struct StreamDecoder {
    /// Bytes of a multi-byte character cut off at the end of the last chunk.
    utf8_tail: Vec<u8>,
    /// Decoded text not yet split into records.
    buffer: String,
    /// Lines of the record currently being consumed.
    lines: VecDeque<String>,
    /// Set when a payload carried both `delta` and `done`; `Done` is owed next.
    done_pending: bool,
    state: DecoderState,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self {
            utf8_tail: Vec::new(),
            buffer: String::new(),
            lines: VecDeque::new(),
            done_pending: false,
            state: DecoderState::Open,
        }
    }

    /// True once `Done` has been emitted or decoding failed.
    pub fn is_finished(&self) -> bool {
        self.state != DecoderState::Open
    }

    /// Marks the decode as aborted (transport failure). No further events.
    pub fn abort(&mut self) {
        self.state = DecoderState::Failed;
    }

    /// Appends a raw chunk. Incomplete UTF-8 at the end is held back until
    /// the next chunk; invalid sequences decode to U+FFFD.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.is_finished() {
            return;
        }
        let mut bytes = std::mem::take(&mut self.utf8_tail);
        bytes.extend_from_slice(chunk);

        let mut rest: &[u8] = &bytes;
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    self.buffer
                        .push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        None => {
                            self.utf8_tail = after.to_vec();
                            break;
                        }
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                    }
                }
            }
        }
    }

    /// Pulls the next event out of the buffered text.
    ///
    /// Returns `None` when more bytes are needed or decoding has finished.
    /// A malformed JSON payload yields one `Err(ApiError::Parse)` and ends
    /// the decode.
    pub fn next_event(&mut self) -> Option<Result<StreamEvent, ApiError>> {
        if self.state != DecoderState::Open {
            return None;
        }
        if self.done_pending {
            return Some(Ok(self.finish()));
        }

        loop {
            while let Some(line) = self.lines.pop_front() {
                let Some(payload) = line.strip_prefix(DATA_PREFIX).map(str::trim) else {
                    continue;
                };
                if payload.is_empty() {
                    continue;
                }

                let value: Value = match serde_json::from_str(payload) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!("Malformed stream payload ({e}): {payload}");
                        self.state = DecoderState::Failed;
                        return Some(Err(ApiError::Parse(e.to_string())));
                    }
                };

                let done = value.get("done").is_some_and(is_truthy);
                match value.get("delta").and_then(Value::as_str) {
                    Some(delta) if !delta.is_empty() => {
                        self.done_pending = done;
                        return Some(Ok(StreamEvent::Delta(delta.to_string())));
                    }
                    _ if done => return Some(Ok(self.finish())),
                    _ => debug!("Stream payload without delta or done: {payload}"),
                }
            }

            let end = self.buffer.find(RECORD_SEPARATOR)?;
            let record: String = self.buffer.drain(..end + RECORD_SEPARATOR.len()).collect();
            self.lines
                .extend(record[..end].split('\n').map(str::to_owned));
        }
    }

    fn finish(&mut self) -> StreamEvent {
        debug!(
            "Stream done, discarding {} buffered bytes",
            self.buffer.len()
        );
        self.state = DecoderState::Done;
        self.done_pending = false;
        self.lines.clear();
        self.buffer.clear();
        StreamEvent::Done
    }
}

/// JavaScript-style truthiness, which is what the server's `done` flag is
/// checked against.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Adapts a stream of byte chunks into a lazy stream of decoded events.
///
/// Chunks are only pulled from `chunks` when the decoder has no complete
/// record left, and never after `Done`. A chunk error ends the stream with
/// `ApiError::Network`. If the body ends without `done`, the stream simply
/// ends and any unterminated trailing record is dropped.
pub fn decode_stream<S, B, E>(chunks: S) -> impl Stream<Item = Result<StreamEvent, ApiError>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    stream::unfold(
        (chunks, StreamDecoder::new()),
        |(mut chunks, mut decoder)| async move {
            loop {
                if let Some(event) = decoder.next_event() {
                    return Some((event, (chunks, decoder)));
                }
                if decoder.is_finished() {
                    return None;
                }
                match chunks.next().await {
                    Some(Ok(chunk)) => {
                        debug!("Raw chunk received: {} bytes", chunk.as_ref().len());
                        decoder.push(chunk.as_ref());
                    }
                    Some(Err(e)) => {
                        warn!("Stream read failed: {e}");
                        decoder.abort();
                        return Some((Err(ApiError::Network(e.to_string())), (chunks, decoder)));
                    }
                    None => {
                        debug!("Stream ended without a done record");
                        return None;
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::convert::Infallible;

    /// Feeds `chunks` through a fresh decoder, draining after each push.
    fn decode_chunks(chunks: &[&[u8]]) -> Vec<Result<StreamEvent, ApiError>> {
        let mut decoder = StreamDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            decoder.push(chunk);
            while let Some(event) = decoder.next_event() {
                events.push(event);
            }
        }
        events
    }

    fn decode_text(chunks: &[&str]) -> Vec<Result<StreamEvent, ApiError>> {
        let bytes: Vec<&[u8]> = chunks.iter().map(|c| c.as_bytes()).collect();
        decode_chunks(&bytes)
    }

    fn deltas(events: &[Result<StreamEvent, ApiError>]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                Ok(StreamEvent::Delta(t)) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    fn collect_stream(chunks: Vec<&'static str>) -> Vec<Result<StreamEvent, ApiError>> {
        let source = stream::iter(chunks.into_iter().map(|c| Ok::<_, Infallible>(c.as_bytes())));
        block_on(decode_stream(source).collect::<Vec<_>>())
    }

    #[test]
    fn test_two_chunk_scenario() {
        let events = decode_text(&[
            "data: {\"delta\":\"Hi\"}\n\n",
            "data: {\"delta\":\" there\"}\n\ndata: {\"done\":true}\n\n",
        ]);
        assert_eq!(
            events,
            vec![
                Ok(StreamEvent::Delta("Hi".into())),
                Ok(StreamEvent::Delta(" there".into())),
                Ok(StreamEvent::Done),
            ]
        );
    }

    #[test]
    fn test_chunking_invariance() {
        let body = "data: {\"delta\":\"Héllo\"}\n\ndata: {\"delta\":\", 世界\"}\n\n\
                    data: {\"delta\":\" 🐨\"}\n\ndata: {\"done\":true}\n\n";
        let bytes = body.as_bytes();
        let expected = vec!["Héllo", ", 世界", " 🐨"];

        for size in 1..=bytes.len() {
            let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
            let events = decode_chunks(&chunks);
            assert_eq!(deltas(&events), expected, "chunk size {size}");
            assert_eq!(events.last(), Some(&Ok(StreamEvent::Done)), "chunk size {size}");
        }
    }

    #[test]
    fn test_split_multibyte_character() {
        let bytes = "data: {\"delta\":\"é\"}\n\n".as_bytes();
        let pos = bytes.iter().position(|b| *b == 0xC3).unwrap();
        let events = decode_chunks(&[&bytes[..pos + 1], &bytes[pos + 1..]]);
        assert_eq!(deltas(&events), vec!["é"]);
    }

    #[test]
    fn test_invalid_utf8_becomes_replacement() {
        let mut decoder = StreamDecoder::new();
        decoder.push(b"data: {\"delta\":\"a\xFFb\"}\n\n");
        assert_eq!(
            decoder.next_event(),
            Some(Ok(StreamEvent::Delta("a\u{FFFD}b".into())))
        );
    }

    #[test]
    fn test_done_truncates_same_chunk() {
        let events = decode_text(&[
            "data: {\"delta\":\"a\"}\n\ndata: {\"done\":true}\n\ndata: {\"delta\":\"b\"}\n\ndata: not json\n\n",
        ]);
        assert_eq!(
            events,
            vec![Ok(StreamEvent::Delta("a".into())), Ok(StreamEvent::Done)]
        );
    }

    #[test]
    fn test_push_after_done_is_ignored() {
        let mut decoder = StreamDecoder::new();
        decoder.push(b"data: {\"done\":1}\n\n");
        assert_eq!(decoder.next_event(), Some(Ok(StreamEvent::Done)));
        decoder.push(b"data: {\"delta\":\"late\"}\n\n");
        assert_eq!(decoder.next_event(), None);
        assert!(decoder.is_finished());
    }

    #[test]
    fn test_delta_and_done_in_one_payload() {
        let events = decode_text(&["data: {\"delta\":\"last\",\"done\":true}\n\n"]);
        assert_eq!(
            events,
            vec![Ok(StreamEvent::Delta("last".into())), Ok(StreamEvent::Done)]
        );
    }

    #[test]
    fn test_falsy_done_and_empty_delta_are_skipped() {
        let events = decode_text(&[
            "data: {\"delta\":\"\",\"done\":false}\n\ndata: {\"done\":0}\n\ndata: 42\n\ndata: {\"delta\":\"x\"}\n\n",
        ]);
        assert_eq!(events, vec![Ok(StreamEvent::Delta("x".into()))]);
    }

    #[test]
    fn test_non_data_lines_and_blank_payloads_ignored() {
        let events = decode_text(&[
            "event: message\nid: 7\ndata:\ndata:   \n: comment\ndata:{\"delta\":\"ok\"}\n\n",
        ]);
        assert_eq!(events, vec![Ok(StreamEvent::Delta("ok".into()))]);
    }

    #[test]
    fn test_multiple_data_lines_in_one_record() {
        let events = decode_text(&["data: {\"delta\":\"a\"}\ndata: {\"delta\":\"b\"}\n\n"]);
        assert_eq!(deltas(&events), vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_json_aborts_after_earlier_deltas() {
        let events = decode_text(&[
            "data: {\"delta\":\"ok\"}\n\ndata: {broken\n\n",
            "data: {\"delta\":\"never\"}\n\n",
        ]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Ok(StreamEvent::Delta("ok".into())));
        assert!(matches!(events[1], Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_partial_record_waits_for_separator() {
        let mut decoder = StreamDecoder::new();
        decoder.push(b"data: {\"delta\":\"wait\"}\n");
        assert_eq!(decoder.next_event(), None);
        decoder.push(b"\n");
        assert_eq!(decoder.next_event(), Some(Ok(StreamEvent::Delta("wait".into()))));
    }

    #[test]
    fn test_decode_stream_ends_without_done() {
        let events = collect_stream(vec![
            "data: {\"delta\":\"a\"}\n\n",
            "data: {\"delta\":\"unterminated\"}",
        ]);
        assert_eq!(events, vec![Ok(StreamEvent::Delta("a".into()))]);
    }

    #[test]
    fn test_decode_stream_stops_pulling_after_done() {
        let source = stream::iter(vec![
            Ok::<&[u8], String>(b"data: {\"done\":true}\n\n"),
            Err("should never be read".to_string()),
        ]);
        let events = block_on(decode_stream(source).collect::<Vec<_>>());
        assert_eq!(events, vec![Ok(StreamEvent::Done)]);
    }

    #[test]
    fn test_decode_stream_transport_error() {
        let source = stream::iter(vec![
            Ok::<&[u8], String>(b"data: {\"delta\":\"a\"}\n\n"),
            Err("connection reset".to_string()),
            Ok(&b"data: {\"delta\":\"b\"}\n\n"[..]),
        ]);
        let events = block_on(decode_stream(source).collect::<Vec<_>>());
        assert_eq!(
            events,
            vec![
                Ok(StreamEvent::Delta("a".into())),
                Err(ApiError::Network("connection reset".into())),
            ]
        );
    }

    #[test]
    fn test_decode_stream_is_lazy() {
        let source = stream::iter(vec![
            Ok::<&[u8], Infallible>(b"data: {\"delta\":\"one\"}\n\ndata: {\"delta\":\"two\"}\n\n"),
        ]);
        let mut events = Box::pin(decode_stream(source));
        tokio_test::block_on(async {
            assert_eq!(events.next().await, Some(Ok(StreamEvent::Delta("one".into()))));
            assert_eq!(events.next().await, Some(Ok(StreamEvent::Delta("two".into()))));
            assert_eq!(events.next().await, None);
        });
    }
}
