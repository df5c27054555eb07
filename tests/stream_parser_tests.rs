use agentchat::api::stream::StreamParser;
use agentchat::types::{ContentBlock, StreamEvent};

fn scripted_body() -> Vec<u8> {
    let mut body = String::new();
    body.push_str("data: {\"type\":\"session_start\",\"sessionId\":\"s1\"}\n");
    body.push_str(": keep-alive\n");
    body.push_str("\n");
    // Multi-byte characters so some split points land inside a codepoint.
    body.push_str(
        "data: {\"type\":\"assistant\",\"content\":[{\"type\":\"text\",\"text\":\"héllo ⚡ wörld\"}]}\n",
    );
    body.push_str("data: {\"type\":\"result\",\"session_id\":\"s1\",\"num_turns\":1}\n");
    body.push_str("data: [DONE]\n");
    body.into_bytes()
}

fn decode_whole(body: &[u8]) -> Vec<StreamEvent> {
    let mut parser = StreamParser::new();
    parser.process(body)
}

#[test]
fn test_every_two_way_split_yields_identical_events() {
    let body = scripted_body();
    let expected = decode_whole(&body);
    assert_eq!(expected.len(), 3);

    for split in 1..body.len() {
        let mut parser = StreamParser::new();
        let mut events = parser.process(&body[..split]);
        events.extend(parser.process(&body[split..]));
        assert_eq!(events, expected, "split at byte {split} changed the frames");
    }
}

#[test]
fn test_tiny_fixed_size_chunks_yield_identical_events() {
    let body = scripted_body();
    let expected = decode_whole(&body);

    for chunk_size in [1usize, 2, 3, 7] {
        let mut parser = StreamParser::new();
        let mut events = Vec::new();
        for chunk in body.chunks(chunk_size) {
            events.extend(parser.process(chunk));
        }
        assert_eq!(
            events, expected,
            "chunk size {chunk_size} changed the frames"
        );
    }
}

#[test]
fn test_multibyte_text_survives_mid_codepoint_splits() {
    let body = scripted_body();

    // Split exactly inside the '⚡' (3 bytes in UTF-8).
    let lightning_start = body
        .windows("⚡".len())
        .position(|window| window == "⚡".as_bytes())
        .expect("body contains the lightning bolt");
    let split = lightning_start + 1;

    let mut parser = StreamParser::new();
    let mut events = parser.process(&body[..split]);
    events.extend(parser.process(&body[split..]));

    let text = events
        .iter()
        .find_map(|event| match event {
            StreamEvent::Assistant { content, .. } => content.iter().find_map(|block| {
                if let ContentBlock::Text { text } = block {
                    Some(text.clone())
                } else {
                    None
                }
            }),
            _ => None,
        })
        .expect("assistant text frame decoded");
    assert_eq!(text, "héllo ⚡ wörld");
}

#[test]
fn test_malformed_frame_does_not_abort_the_stream() {
    let mut parser = StreamParser::new();
    let events = parser.process(
        b"data: {\"type\":\"assistant\",truncated\ndata: {\"type\":\"session_start\",\"sessionId\":\"s1\"}\n",
    );
    assert_eq!(
        events,
        vec![StreamEvent::SessionStart {
            session_id: Some("s1".to_string())
        }]
    );
}

#[test]
fn test_done_sentinel_is_terminal_even_mid_chunk() {
    let mut parser = StreamParser::new();
    let events = parser.process(
        b"data: {\"type\":\"session_start\",\"sessionId\":\"s1\"}\ndata: [DONE]\ndata: {\"type\":\"session_start\",\"sessionId\":\"s2\"}\n",
    );
    assert_eq!(events.len(), 1);
    assert!(parser.is_done());
}

#[test]
fn test_crlf_line_endings_are_accepted() {
    let mut parser = StreamParser::new();
    let events = parser.process(b"data: {\"type\":\"session_start\",\"sessionId\":\"s1\"}\r\n");
    assert_eq!(events.len(), 1);
}

#[test]
fn test_unknown_event_type_decodes_as_unknown() {
    let mut parser = StreamParser::new();
    let events = parser.process(b"data: {\"type\":\"usage_report\",\"tokens\":42}\n");
    assert_eq!(events, vec![StreamEvent::Unknown]);
}
