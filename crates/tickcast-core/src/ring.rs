//! Bounded sequence-indexed history backing retransmission.
//!
//! [`SeqRing`] maps sequence numbers to items with fixed capacity `C`. A
//! sequence lands in slot `seq % C`; once `C` strictly greater sequences have
//! been pushed, the slot is overwritten and the old sequence is permanently
//! evicted. Sequence numbers are 1-based; 0 is an invalid sentinel.
//!
//! The ring assumes `push` is never concurrent with `lookup` — the publisher's
//! single-threaded event loop enforces this.

/// Outcome of a [`SeqRing::lookup`].
///
/// `Evicted` and `Absent` both answer "not available" on the wire, but are
/// kept distinct for diagnostics: an evicted sequence was once held and has
/// been overwritten, an absent one was never stored in its slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Evicted,
    Absent,
}

/// Fixed-capacity history keyed by sequence number.
pub struct SeqRing<T: Copy + Default> {
    items: Vec<T>,
    seqs: Vec<u64>,
    max_seq: u64,
}

impl<T: Copy + Default> SeqRing<T> {
    /// Create a ring holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");
        Self {
            items: vec![T::default(); capacity],
            seqs: vec![0; capacity],
            max_seq: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Highest sequence number ever pushed. Never decreases.
    pub fn max_seq(&self) -> u64 {
        self.max_seq
    }

    /// Record `item` under `seq`, overwriting whatever occupied its slot.
    ///
    /// O(1). A push with a lower sequence than `max_seq` does not lower it.
    pub fn push(&mut self, seq: u64, item: T) {
        let idx = (seq % self.items.len() as u64) as usize;
        self.items[idx] = item;
        self.seqs[idx] = seq;
        if seq > self.max_seq {
            self.max_seq = seq;
        }
    }

    /// Look up `seq`, reporting why it is unavailable when it is. O(1).
    pub fn lookup(&self, seq: u64) -> Lookup<T> {
        if seq == 0 {
            return Lookup::Absent;
        }
        let cap = self.items.len() as u64;
        if self.max_seq >= cap && seq <= self.max_seq - cap {
            return Lookup::Evicted;
        }
        let idx = (seq % cap) as usize;
        if self.seqs[idx] == seq {
            Lookup::Found(self.items[idx])
        } else {
            Lookup::Absent
        }
    }

    /// The stored item for `seq`, if it is still available.
    pub fn get(&self, seq: u64) -> Option<T> {
        match self.lookup(seq) {
            Lookup::Found(item) => Some(item),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_get() {
        let mut ring = SeqRing::new(10);
        assert_eq!(ring.capacity(), 10);
        ring.push(1, 100u32);
        ring.push(2, 200);
        assert_eq!(ring.get(1), Some(100));
        assert_eq!(ring.get(2), Some(200));
        assert_eq!(ring.get(3), None);
        assert_eq!(ring.max_seq(), 2);
    }

    #[test]
    fn item_survives_until_capacity_further_pushes() {
        let mut ring = SeqRing::new(10);
        ring.push(1, 11u32);
        // Nine strictly greater pushes leave seq 1 reachable.
        for seq in 2..=10 {
            ring.push(seq, seq as u32);
        }
        assert_eq!(ring.get(1), Some(11));
        // The tenth evicts it.
        ring.push(11, 111);
        assert_eq!(ring.get(1), None);
        assert_eq!(ring.lookup(1), Lookup::Evicted);
    }

    #[test]
    fn boundary_at_full_capacity() {
        let mut ring = SeqRing::new(10);
        for seq in 1..=10u64 {
            ring.push(seq, seq);
        }
        // max_seq == capacity: sequence 0 is out of range, 1 is the oldest live.
        assert_eq!(ring.lookup(0), Lookup::Absent);
        assert_eq!(ring.get(1), Some(1));
        assert_eq!(ring.get(10), Some(10));
    }

    #[test]
    fn fresh_ring_reports_absent_everywhere() {
        let ring: SeqRing<u64> = SeqRing::new(4);
        assert_eq!(ring.lookup(0), Lookup::Absent);
        assert_eq!(ring.lookup(1), Lookup::Absent);
        assert_eq!(ring.lookup(999), Lookup::Absent);
    }

    #[test]
    fn future_sequence_is_absent_not_evicted() {
        let mut ring = SeqRing::new(4);
        for seq in 1..=20u64 {
            ring.push(seq, seq);
        }
        assert_eq!(ring.lookup(25), Lookup::Absent);
        assert_eq!(ring.lookup(3), Lookup::Evicted);
    }

    #[test]
    fn lower_sequence_push_keeps_max_seq() {
        let mut ring = SeqRing::new(8);
        ring.push(5, 5u64);
        ring.push(3, 3);
        assert_eq!(ring.max_seq(), 5);
        assert_eq!(ring.get(3), Some(3));
    }

    #[test]
    fn gap_of_capacity_minus_one_stays_recoverable() {
        let cap = 10;
        let mut ring = SeqRing::new(cap);
        // Sequences 1..=cap pushed; all of 1..=cap-1 (a gap of C-1 behind the
        // head) remain retrievable.
        for seq in 1..=cap as u64 {
            ring.push(seq, seq);
        }
        for seq in 1..cap as u64 {
            assert_eq!(ring.get(seq), Some(seq));
        }
        // One more push puts sequence 1 a full C+1 behind and evicts it.
        ring.push(cap as u64 + 1, 0);
        assert_eq!(ring.lookup(1), Lookup::Evicted);
    }
}
