use crate::api::logging::emit_frame_decode_error;
use crate::types::StreamEvent;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental decoder for the line-delimited chat stream.
///
/// Chunks may split anywhere, including inside a multi-byte UTF-8 sequence,
/// so the carry buffer holds raw bytes and lines are split on the `\n` byte
/// (UTF-8 continuation bytes can never equal 0x0A). Only `data: ` lines carry
/// payload; everything else is keep-alive noise.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
    done: bool,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the `[DONE]` sentinel has been seen. Later chunks are
    /// ignored; no further events will be produced.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn process(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }
        self.buffer.extend_from_slice(chunk);

        let mut consumed = 0;
        while let Some(offset) = self.buffer[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            let line = String::from_utf8_lossy(&self.buffer[consumed..end]);
            consumed = end + 1;

            let line = line.trim_end_matches('\r');
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            if payload == DONE_SENTINEL {
                self.done = true;
                break;
            }
            match serde_json::from_str::<StreamEvent>(payload) {
                Ok(event) => events.push(event),
                // Tolerated: a corrupt frame must not abort the whole stream.
                Err(error) => emit_frame_decode_error(payload, &error),
            }
        }

        if consumed > 0 {
            self.buffer.drain(..consumed);
        }
        events
    }
}
