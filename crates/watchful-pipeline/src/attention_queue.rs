//! Bounded queue of attention credit.

/// Counter that grows by one per attentive sample up to a fixed limit.
///
/// The playback gate spends one unit per inattentive sample, so a full
/// queue tolerates `limit` consecutive look-away ticks before pausing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttentionQueue {
    queued: u32,
    limit: u32,
}

impl AttentionQueue {
    /// Default limit.
    pub const DEFAULT_LIMIT: u32 = 30;

    pub fn new(limit: u32) -> Self {
        Self { queued: 0, limit }
    }

    /// Add one unit unless the limit is reached. Returns whether it was added.
    pub fn enqueue(&mut self) -> bool {
        if self.queued < self.limit {
            self.queued += 1;
            true
        } else {
            false
        }
    }

    /// Spend one unit. Returns false when the queue was already empty.
    pub fn consume(&mut self) -> bool {
        if self.queued > 0 {
            self.queued -= 1;
            true
        } else {
            false
        }
    }

    pub fn drain(&mut self) {
        self.queued = 0;
    }

    pub fn len(&self) -> u32 {
        self.queued
    }

    pub fn is_empty(&self) -> bool {
        self.queued == 0
    }
}

impl Default for AttentionQueue {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_stops_at_limit() {
        let mut queue = AttentionQueue::new(3);
        assert!(queue.enqueue());
        assert!(queue.enqueue());
        assert!(queue.enqueue());
        assert!(!queue.enqueue());
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_consume_never_underflows() {
        let mut queue = AttentionQueue::default();
        assert!(!queue.consume());
        queue.enqueue();
        assert!(queue.consume());
        assert!(queue.is_empty());
        assert!(!queue.consume());
    }

    #[test]
    fn test_zero_limit_never_fills() {
        let mut queue = AttentionQueue::new(0);
        assert!(!queue.enqueue());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drain() {
        let mut queue = AttentionQueue::default();
        for _ in 0..50 {
            queue.enqueue();
        }
        assert_eq!(queue.len(), AttentionQueue::DEFAULT_LIMIT);
        queue.drain();
        assert!(queue.is_empty());
    }
}
