use tracing::debug;

use crate::conversions::change::ChangeSet;
use crate::error::ListenerResult;

/// Accumulates payload chunks until they form a complete wal2json document.
///
/// The buffer is cleared only when its whole content decodes. A buffer that can never become
/// valid JSON is indistinguishable from a truncated one, so it keeps growing until more data
/// completes it or the process is restarted.
#[derive(Debug, Default)]
pub struct PayloadReassembler {
    buffer: Vec<u8>,
}

impl PayloadReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and tries to decode everything buffered so far.
    ///
    /// Returns `Ok(None)` while the buffered bytes are not a complete JSON document. Once they
    /// are, the buffer is cleared and the decoded [`ChangeSet`] is returned. A complete document
    /// that does not convert into a [`ChangeSet`] is an error and leaves the buffer untouched.
    pub fn accept(&mut self, chunk: &[u8]) -> ListenerResult<Option<ChangeSet>> {
        self.buffer.extend_from_slice(chunk);

        let document = match serde_json::from_slice::<serde_json::Value>(&self.buffer) {
            Ok(document) => document,
            Err(err) => {
                debug!(
                    buffered_bytes = self.buffer.len(),
                    reason = %err,
                    "payload is not complete yet, waiting for more chunks"
                );
                return Ok(None);
            }
        };

        let change_set = ChangeSet::from_json(document)?;
        self.buffer.clear();

        Ok(Some(change_set))
    }

    /// Number of bytes currently buffered.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const PAYLOAD: &str = r#"{"change":[{"kind":"insert","schema":"public","table":"outbox","columnnames":["id","topic","payload"],"columnvalues":[3,"demo_topic","{\"id\":\"file\"}"]}]}"#;

    #[test]
    fn single_chunk_payload_is_decoded() {
        let mut reassembler = PayloadReassembler::new();

        let change_set = reassembler.accept(PAYLOAD.as_bytes()).unwrap().unwrap();

        assert_eq!(change_set.len(), 1);
        assert!(reassembler.is_empty());
    }

    #[test]
    fn two_chunks_are_reassembled() {
        let first = r#"{"change":["#;
        let second = r#"{"kind":"insert","columnnames":["topic","payload"],"columnvalues":["t","v"]}]}"#;
        let mut reassembler = PayloadReassembler::new();

        assert!(reassembler.accept(first.as_bytes()).unwrap().is_none());
        assert_eq!(reassembler.buffered_len(), first.len());

        let change_set = reassembler.accept(second.as_bytes()).unwrap().unwrap();
        assert_eq!(change_set.len(), 1);
        assert_eq!(change_set.records[0].columns[1].value, "v");
        assert_eq!(reassembler.buffered_len(), 0);
    }

    #[test]
    fn every_split_point_yields_the_same_change_set() {
        let expected = PayloadReassembler::new()
            .accept(PAYLOAD.as_bytes())
            .unwrap()
            .unwrap();
        let bytes = PAYLOAD.as_bytes();

        for split in 1..bytes.len() {
            let mut reassembler = PayloadReassembler::new();

            assert!(
                reassembler.accept(&bytes[..split]).unwrap().is_none(),
                "prefix of {split} bytes decoded early"
            );
            let change_set = reassembler.accept(&bytes[split..]).unwrap().unwrap();

            assert_eq!(change_set, expected);
            assert!(reassembler.is_empty());
        }
    }

    #[test]
    fn chunks_of_wal2json_chunked_output_are_reassembled() {
        let chunks = [
            r#"{"xid":1042,"change":["#,
            r#"{"kind":"insert","columnnames":["topic","payload"],"columnvalues":["a","1"]}"#,
            r#",{"kind":"delete","oldkeys":{"keynames":["id"],"keyvalues":[1]}}"#,
            r#",{"kind":"insert","columnnames":["topic","payload"],"columnvalues":["b","2"]}"#,
            "]}",
        ];
        let mut reassembler = PayloadReassembler::new();

        for chunk in &chunks[..chunks.len() - 1] {
            assert!(reassembler.accept(chunk.as_bytes()).unwrap().is_none());
        }
        let change_set = reassembler
            .accept(chunks[chunks.len() - 1].as_bytes())
            .unwrap()
            .unwrap();

        assert_eq!(change_set.len(), 3);
        assert!(reassembler.is_empty());
    }

    #[test]
    fn buffer_is_reused_after_a_complete_payload() {
        let mut reassembler = PayloadReassembler::new();

        assert!(reassembler.accept(PAYLOAD.as_bytes()).unwrap().is_some());
        assert!(reassembler.accept(br#"{"change":"#).unwrap().is_none());
        let change_set = reassembler.accept(b"[]}").unwrap().unwrap();

        assert!(change_set.is_empty());
        assert!(reassembler.is_empty());
    }

    #[test]
    fn malformed_payload_is_kept_waiting() {
        let mut reassembler = PayloadReassembler::new();

        assert!(reassembler.accept(b"{\"change\":]").unwrap().is_none());
        assert!(reassembler.accept(b"}").unwrap().is_none());
        assert_eq!(reassembler.buffered_len(), 12);
    }

    #[test]
    fn boolean_columns_are_decoded() {
        let payload = br#"{"change":[{"kind":"update","columnnames":["id","active"],"columnvalues":[1,true]}]}"#;
        let mut reassembler = PayloadReassembler::new();

        let change_set = reassembler.accept(payload).unwrap().unwrap();

        assert_eq!(change_set.records[0].columns[1].value, true);
        assert!(reassembler.is_empty());
    }

    #[test]
    fn mismatched_columns_are_fatal_and_keep_the_buffer() {
        let payload = br#"{"change":[{"kind":"insert","columnnames":["topic","payload"],"columnvalues":["t"]}]}"#;
        let mut reassembler = PayloadReassembler::new();

        let err = reassembler.accept(payload).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert_eq!(reassembler.buffered_len(), payload.len());
    }
}
