use crate::api::client::{ByteStream, MockStreamProducer};
use crate::types::InterruptResponse;
use anyhow::Result;
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::sync::{Arc, Mutex};

/// Scripted backend: each configured response is a list of raw chunk strings
/// replayed as the body of one stream call, in order. A missing trailing
/// newline is added so a chunk string reads as one complete frame line.
#[derive(Clone)]
pub struct MockBackend {
    responses: Arc<Mutex<Vec<Vec<String>>>>,
    stream_calls: Arc<Mutex<Vec<String>>>,
    interrupt_calls: Arc<Mutex<Vec<String>>>,
    hold_open: bool,
}

impl MockBackend {
    pub fn new(responses: Vec<Vec<String>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            stream_calls: Arc::new(Mutex::new(Vec::new())),
            interrupt_calls: Arc::new(Mutex::new(Vec::new())),
            hold_open: false,
        }
    }

    /// Keep the stream open after the scripted chunks instead of closing it,
    /// so cancellation paths can be exercised deterministically.
    pub fn new_held_open(responses: Vec<Vec<String>>) -> Self {
        Self {
            hold_open: true,
            ..Self::new(responses)
        }
    }

    /// Endpoints hit by stream calls, in order.
    pub fn stream_calls(&self) -> Vec<String> {
        self.stream_calls.lock().unwrap().clone()
    }

    /// Session ids passed to the interrupt endpoint, in order.
    pub fn interrupt_calls(&self) -> Vec<String> {
        self.interrupt_calls.lock().unwrap().clone()
    }
}

impl MockStreamProducer for MockBackend {
    fn create_mock_stream(&self, endpoint: &str) -> Result<ByteStream> {
        self.stream_calls.lock().unwrap().push(endpoint.to_string());

        let mut responses_guard = self.responses.lock().unwrap();
        if responses_guard.is_empty() {
            return Err(anyhow::anyhow!("MockBackend: no more responses configured"));
        }
        let chunks = responses_guard.remove(0);

        let byte_chunks: Vec<Result<Bytes>> = chunks
            .into_iter()
            .map(|s| {
                let framed = if s.ends_with('\n') { s } else { format!("{s}\n") };
                Ok(Bytes::from(framed))
            })
            .collect();

        if self.hold_open {
            Ok(Box::pin(
                stream::iter(byte_chunks).chain(stream::pending()),
            ))
        } else {
            Ok(Box::pin(stream::iter(byte_chunks)))
        }
    }

    fn interrupt(&self, session_id: &str) -> Result<InterruptResponse> {
        self.interrupt_calls
            .lock()
            .unwrap()
            .push(session_id.to_string());
        Ok(InterruptResponse {
            success: true,
            message: "Session interrupted successfully".to_string(),
        })
    }
}
