use atelier_llm::{decode_byte_stream, StreamEvent};
use futures::StreamExt;

fn chunk(text: &str) -> StreamEvent {
    StreamEvent::Chunk {
        text: text.to_string(),
    }
}

/// Decode a transcript delivered as the given byte fragments.
async fn decode_fragments(fragments: Vec<Vec<u8>>) -> Vec<StreamEvent> {
    let source = futures::stream::iter(fragments.into_iter().map(Ok::<_, std::io::Error>));
    decode_byte_stream(source).collect().await
}

async fn decode_whole(transcript: &str) -> Vec<StreamEvent> {
    decode_fragments(vec![transcript.as_bytes().to_vec()]).await
}

const TRANSCRIPT: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"ab\"}}]}\n\
                          data: {\"choices\":[{\"delta\":{\"content\":\"cd\"}}]}\n\
                          data: [DONE]\n";

#[tokio::test]
async fn chunks_arrive_in_line_order_then_done() {
    let events = decode_whole(TRANSCRIPT).await;
    assert_eq!(events, vec![chunk("ab"), chunk("cd"), StreamEvent::Done]);
}

#[tokio::test]
async fn done_sentinel_is_never_parsed_and_terminates() {
    // anything after the sentinel must not surface
    let transcript = format!(
        "{}data: {{\"choices\":[{{\"delta\":{{\"content\":\"late\"}}}}]}}\n",
        TRANSCRIPT
    );
    let events = decode_whole(&transcript).await;
    assert_eq!(events, vec![chunk("ab"), chunk("cd"), StreamEvent::Done]);
}

#[tokio::test]
async fn partial_line_is_never_emitted() {
    // a frame cut before its newline must not produce a chunk
    let events = decode_fragments(vec![b"data: {\"choices\":[{\"delta\":{\"con".to_vec()]).await;
    assert_eq!(events, vec![StreamEvent::Done]);
}

#[tokio::test]
async fn frame_split_mid_json_is_reassembled() {
    let events = decode_fragments(vec![
        b"data: {\"choices\":[{\"del".to_vec(),
        b"ta\":{\"content\":\"ab\"}}]}\ndata: [DONE]\n".to_vec(),
    ])
    .await;
    assert_eq!(events, vec![chunk("ab"), StreamEvent::Done]);
}

#[tokio::test]
async fn malformed_frame_is_dropped_silently() {
    let transcript = "data: {not json}\n\
                      data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\
                      data: [DONE]\n";
    let events = decode_whole(transcript).await;
    assert_eq!(events, vec![chunk("ok"), StreamEvent::Done]);
}

#[tokio::test]
async fn empty_and_missing_deltas_are_skipped() {
    let transcript = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\
                      data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\
                      data: {\"choices\":[]}\n\
                      data: [DONE]\n";
    let events = decode_whole(transcript).await;
    assert_eq!(events, vec![StreamEvent::Done]);
}

#[tokio::test]
async fn non_data_lines_are_ignored() {
    let transcript = ": keep-alive\n\
                      event: ping\n\
                      \n\
                      data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\
                      data: [DONE]\n";
    let events = decode_whole(transcript).await;
    assert_eq!(events, vec![chunk("x"), StreamEvent::Done]);
}

#[tokio::test]
async fn crlf_frames_decode_like_lf_frames() {
    let transcript = "data: {\"choices\":[{\"delta\":{\"content\":\"ab\"}}]}\r\n\r\ndata: [DONE]\r\n";
    let events = decode_whole(transcript).await;
    assert_eq!(events, vec![chunk("ab"), StreamEvent::Done]);
}

#[tokio::test]
async fn source_exhaustion_without_sentinel_yields_done() {
    let transcript = "data: {\"choices\":[{\"delta\":{\"content\":\"ab\"}}]}\n";
    let events = decode_whole(transcript).await;
    assert_eq!(events, vec![chunk("ab"), StreamEvent::Done]);
}

#[tokio::test]
async fn read_failure_yields_terminal_error() {
    let source = futures::stream::iter(vec![
        Ok(b"data: {\"choices\":[{\"delta\":{\"content\":\"ab\"}}]}\n".to_vec()),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ]);
    let events: Vec<StreamEvent> = decode_byte_stream(source).collect().await;

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], chunk("ab"));
    match &events[1] {
        StreamEvent::Error { message } => assert!(message.contains("reset")),
        other => panic!("expected terminal error, got {:?}", other),
    }
}

#[tokio::test]
async fn multibyte_delta_split_across_fragments() {
    let transcript = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\ndata: [DONE]\n";
    let bytes = transcript.as_bytes();
    // cut inside the two-byte é
    let cut = transcript.find('é').unwrap() + 1;
    let events = decode_fragments(vec![bytes[..cut].to_vec(), bytes[cut..].to_vec()]).await;
    assert_eq!(events, vec![chunk("héllo"), StreamEvent::Done]);
}

mod fragmentation_invariance {
    use super::*;
    use proptest::prelude::*;

    fn split_at_points(bytes: &[u8], points: &[usize]) -> Vec<Vec<u8>> {
        let mut cuts: Vec<usize> = points.iter().map(|p| p % (bytes.len() + 1)).collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut fragments = Vec::with_capacity(cuts.len() + 1);
        let mut start = 0;
        for cut in cuts {
            fragments.push(bytes[start..cut].to_vec());
            start = cut;
        }
        fragments.push(bytes[start..].to_vec());
        fragments
    }

    proptest! {
        /// The decoded event sequence must not depend on how the byte
        /// stream was fragmented in transit.
        #[test]
        fn decoding_is_fragmentation_invariant(points in proptest::collection::vec(0usize..4096, 0..16)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();

            let reference = runtime.block_on(decode_whole(TRANSCRIPT));
            let fragments = split_at_points(TRANSCRIPT.as_bytes(), &points);
            let events = runtime.block_on(decode_fragments(fragments));

            prop_assert_eq!(events, reference);
        }
    }
}
