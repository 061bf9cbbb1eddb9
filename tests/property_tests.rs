//! Property-based tests for the frame codec
//!
//! These tests verify invariants that must hold for all inputs:
//! - Decoding is independent of chunk boundaries
//! - The decoder never panics on arbitrary bytes
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;
use serde_json::{json, Value};

use pedef_mcp::mcp::{encode_message, FrameDecoder};

/// Split `bytes` into chunks at the given cut points and feed them to a
/// fresh decoder, collecting every decoded message.
fn decode_chunked(bytes: &[u8], cuts: &[usize]) -> Vec<Value> {
    let mut decoder = FrameDecoder::new();
    let mut messages = Vec::new();
    let mut start = 0;

    let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    cuts.sort_unstable();
    for cut in cuts {
        messages.extend(decoder.push(&bytes[start..cut.max(start)]));
        start = cut.max(start);
    }
    messages.extend(decoder.push(&bytes[start..]));
    messages
}

fn arbitrary_message() -> impl Strategy<Value = Value> {
    // Envelope-shaped values with varied id types and payload sizes.
    (any::<u32>(), "[a-zA-Z0-9 /._-]{0,64}", any::<bool>()).prop_map(|(id, text, as_string)| {
        if as_string {
            json!({"jsonrpc": "2.0", "id": id.to_string(), "method": text})
        } else {
            json!({"jsonrpc": "2.0", "id": id, "params": {"text": text}})
        }
    })
}

proptest! {
    /// Invariant: for any message sequence and any chunking of the
    /// encoded bytes, decoding yields exactly the original sequence.
    #[test]
    fn chunk_boundary_independence(
        messages in prop::collection::vec(arbitrary_message(), 0..6),
        cuts in prop::collection::vec(any::<usize>(), 0..24),
    ) {
        let mut bytes = Vec::new();
        for message in &messages {
            bytes.extend(encode_message(message));
        }
        let decoded = decode_chunked(&bytes, &cuts);
        prop_assert_eq!(decoded, messages);
    }

    /// Invariant: the decoder never panics, whatever bytes arrive.
    #[test]
    fn never_panics_on_arbitrary_bytes(chunks in prop::collection::vec(
        prop::collection::vec(any::<u8>(), 0..256), 0..8)
    ) {
        let mut decoder = FrameDecoder::new();
        for chunk in &chunks {
            let _ = decoder.push(chunk);
        }
    }

    /// Invariant: garbage between valid frames never corrupts the frames
    /// that follow, as long as the garbage is a complete header block
    /// without a length field.
    #[test]
    fn recovers_after_malformed_header(message in arbitrary_message()) {
        let mut bytes = b"X-Junk: header\r\n\r\n".to_vec();
        bytes.extend(encode_message(&message));
        let mut decoder = FrameDecoder::new();
        let decoded = decoder.push(&bytes);
        prop_assert_eq!(decoded, vec![message]);
    }
}
