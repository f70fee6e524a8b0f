/// Accumulated raw audio for one session.
///
/// Logically one growing byte sequence. Only the owning session mutates it;
/// there is no cross-session sharing.
///
/// The generation counter increments whenever the buffered audio stops
/// being a prefix-extension of what was there before (`clear`/`replace`).
/// Partial transcriptions are tagged with the generation they were computed
/// from so results that arrive after a flush can be recognized as stale.
/// `trim` does NOT bump the generation: a partial computed just before a
/// trim still describes current speech.
#[derive(Debug, Default)]
pub struct AudioBuffer {
    bytes: Vec<u8>,
    generation: u64,
}

impl AudioBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk. O(1) amortized, never fails.
    pub fn append(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Full concatenation of everything buffered, without consuming it.
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Drops all buffered bytes. Used after a final transcription.
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.generation += 1;
    }

    /// Replaces the buffer contents wholesale (audio-end replacement
    /// payloads supersede everything streamed so far).
    pub fn replace(&mut self, payload: &[u8]) {
        self.bytes.clear();
        self.bytes.extend_from_slice(payload);
        self.generation += 1;
    }

    /// Keeps only the trailing `keep_last` bytes.
    ///
    /// Known limitation of the sliding-window policy: the cut discards
    /// acoustic context at the boundary, so words spanning it can be
    /// duplicated or dropped in adjacent transcriptions.
    pub fn trim(&mut self, keep_last: usize) {
        if self.bytes.len() > keep_last {
            let cut = self.bytes.len() - keep_last;
            self.bytes.drain(..cut);
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_accumulates_in_order() {
        let mut buffer = AudioBuffer::new();
        buffer.append(b"abc");
        buffer.append(b"def");
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.snapshot(), b"abcdef");
    }

    #[test]
    fn snapshot_is_non_destructive() {
        let mut buffer = AudioBuffer::new();
        buffer.append(&[1, 2, 3]);
        let before = buffer.snapshot();
        let after = buffer.snapshot();
        assert_eq!(before, after);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn clear_empties_and_bumps_generation() {
        let mut buffer = AudioBuffer::new();
        buffer.append(&[0u8; 100]);
        let generation = buffer.generation();
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.generation(), generation + 1);
    }

    #[test]
    fn replace_supersedes_buffered_audio() {
        let mut buffer = AudioBuffer::new();
        buffer.append(b"streamed");
        let generation = buffer.generation();
        buffer.replace(b"full");
        assert_eq!(buffer.snapshot(), b"full");
        assert_eq!(buffer.generation(), generation + 1);
    }

    #[test]
    fn trim_keeps_trailing_bytes_only() {
        let mut buffer = AudioBuffer::new();
        let data: Vec<u8> = (0..=9).collect();
        buffer.append(&data);
        buffer.trim(4);
        assert_eq!(buffer.snapshot(), vec![6, 7, 8, 9]);
    }

    #[test]
    fn trim_is_a_no_op_when_already_within_bound() {
        let mut buffer = AudioBuffer::new();
        buffer.append(&[1, 2, 3]);
        buffer.trim(10);
        assert_eq!(buffer.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn trim_never_leaves_more_than_the_window() {
        let mut buffer = AudioBuffer::new();
        for _ in 0..50 {
            buffer.append(&[0u8; 1000]);
            if buffer.len() >= 18000 {
                buffer.trim(6000);
            }
            assert!(buffer.len() < 18000 || buffer.len() <= 6000);
        }
        buffer.trim(6000);
        assert!(buffer.len() <= 6000);
    }

    #[test]
    fn trim_does_not_bump_generation() {
        let mut buffer = AudioBuffer::new();
        buffer.append(&[0u8; 100]);
        let generation = buffer.generation();
        buffer.trim(10);
        assert_eq!(buffer.generation(), generation);
    }
}
