use bytes::Bytes;

const DATA_PREFIX: &str = "data:";

/// Longest line kept in the buffer; longer lines are discarded whole.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Splits an event-stream byte stream into `data:` payloads, one per line.
///
/// Upstream sends every chunk as its own `data:` line, so payloads are not
/// joined across lines the way multi-line SSE events would be. Bytes are
/// buffered until a newline arrives, which keeps lines (and multi-byte
/// characters) that straddle chunk boundaries intact. Each byte is scanned
/// once.
#[derive(Debug)]
pub struct DataLineDecoder {
    buffer: Vec<u8>,
    max_line_bytes: usize,
    /// Inside an overlong line; bytes are skipped up to the next newline.
    discarding: bool,
    overflowed: usize,
}

impl Default for DataLineDecoder {
    fn default() -> Self {
        Self::with_max_line_bytes(DEFAULT_MAX_LINE_BYTES)
    }
}

impl DataLineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line_bytes,
            discarding: false,
            overflowed: 0,
        }
    }

    /// Lines dropped for exceeding the line cap.
    pub fn overflowed(&self) -> usize {
        self.overflowed
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut payloads = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|b| *b == b'\n') {
            let head = &rest[..pos];
            rest = &rest[pos + 1..];
            if self.discarding {
                self.discarding = false;
                continue;
            }
            if self.append(head) {
                if let Some(payload) = data_payload(&self.buffer) {
                    payloads.push(payload);
                }
                self.buffer.clear();
            }
        }

        if !self.discarding && !self.append(rest) {
            self.discarding = true;
        }
        payloads
    }

    pub fn push_str(&mut self, chunk: &str) -> Vec<String> {
        self.push_bytes(chunk.as_bytes())
    }

    /// Flushes a final line that was never newline-terminated.
    pub fn finish(&mut self) -> Vec<String> {
        self.discarding = false;
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line).into_iter().collect()
    }

    /// False when the line would outgrow the cap; the partial line is then
    /// dropped and counted.
    fn append(&mut self, bytes: &[u8]) -> bool {
        if self.buffer.len() + bytes.len() > self.max_line_bytes {
            self.buffer.clear();
            self.overflowed += 1;
            return false;
        }
        self.buffer.extend_from_slice(bytes);
        true
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = std::str::from_utf8(line).ok()?;
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return None;
    }
    let value = line.strip_prefix(DATA_PREFIX)?;
    Some(value.trim_start().to_string())
}

/// One downstream frame: `data: <payload>\n\n`.
pub fn encode_data_frame(payload: &str) -> Bytes {
    Bytes::from(format!("{DATA_PREFIX} {payload}\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_data_lines_and_skips_others() {
        let mut decoder = DataLineDecoder::new();
        let out = decoder.push_str("data: {\"a\":1}\r\n\r\n: comment\nevent: x\ndata:{\"b\":2}\n\n");
        assert_eq!(out, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn line_split_across_chunks_is_reassembled() {
        let mut decoder = DataLineDecoder::new();
        assert!(decoder.push_str("data: {\"te").is_empty());
        assert_eq!(decoder.push_str("xt\":\"hi\"}\n"), vec!["{\"text\":\"hi\"}".to_string()]);
    }

    #[test]
    fn multibyte_character_split_across_chunks() {
        let line = "data: héllo\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xc3).unwrap() + 1;
        let mut decoder = DataLineDecoder::new();
        assert!(decoder.push_bytes(&line[..split]).is_empty());
        assert_eq!(decoder.push_bytes(&line[split..]), vec!["héllo".to_string()]);
    }

    #[test]
    fn finish_flushes_unterminated_line() {
        let mut decoder = DataLineDecoder::new();
        assert!(decoder.push_str("data: tail").is_empty());
        assert_eq!(decoder.finish(), vec!["tail".to_string()]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn overlong_line_is_skipped_up_to_next_newline() {
        let mut decoder = DataLineDecoder::with_max_line_bytes(16);
        assert!(decoder.push_str("data: 0123456789").is_empty());
        assert!(decoder.push_str("abcdefghij").is_empty());
        assert!(decoder.push_str("more of the same line").is_empty());
        assert_eq!(decoder.overflowed(), 1);
        assert_eq!(decoder.push_str("\ndata: ok\n"), vec!["ok".to_string()]);
        assert_eq!(decoder.push_str("data: 0123456789abcdef\ndata: b\n"), vec!["b".to_string()]);
        assert_eq!(decoder.overflowed(), 2);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn line_fed_byte_by_byte_is_decoded_once() {
        let mut decoder = DataLineDecoder::new();
        let mut out = Vec::new();
        for byte in b"data: {\"text\":\"slow\"}\n" {
            out.extend(decoder.push_bytes(std::slice::from_ref(byte)));
        }
        assert_eq!(out, vec!["{\"text\":\"slow\"}".to_string()]);
    }

    #[test]
    fn frame_encoding() {
        assert_eq!(
            encode_data_frame("{\"content\":\"Hi\"}"),
            Bytes::from_static(b"data: {\"content\":\"Hi\"}\n\n")
        );
    }
}
