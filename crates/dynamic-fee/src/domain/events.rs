use {
    super::{
        eth::{self, TxHash, U256},
        fee,
    },
    chrono::{DateTime, Utc},
    std::{
        collections::VecDeque,
        fmt::{self, Display, Formatter},
    },
};

/// Number of fee events kept for display.
pub const FEED_CAPACITY: usize = 5;

/// A fee the hook charged on a swap in the watched pool.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeeEvent {
    /// Swap size in units of [`fee::SIZE_DECIMALS`].
    pub swap_size: U256,
    pub fee_applied: u32,
    /// Block timestamp reported by the hook, in seconds.
    pub timestamp: u64,
    pub tx: TxHash,
    /// Position of the log within its block. Logs without one count as
    /// index zero.
    pub log_index: u64,
}

impl FeeEvent {
    /// Identity used for deduplication. Delivering the same log twice yields
    /// the same key.
    pub fn key(&self) -> (TxHash, u64) {
        (self.tx, self.log_index)
    }
}

impl Display for FeeEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let time = i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
        match time {
            Some(time) => write!(f, "{} ", time.format("%H:%M:%S"))?,
            None => write!(f, "{} ", self.timestamp)?,
        }
        write!(
            f,
            "size {} fee {} tx {}",
            eth::format_amount(self.swap_size, fee::SIZE_DECIMALS),
            eth::format_fee(self.fee_applied),
            self.tx,
        )
    }
}

/// The most recent fee events, newest first, without duplicates among the
/// retained entries.
#[derive(Debug)]
pub struct Feed {
    entries: VecDeque<FeeEvent>,
    capacity: usize,
}

impl Default for Feed {
    fn default() -> Self {
        Self::with_capacity(FEED_CAPACITY)
    }
}

impl Feed {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepends `event` unless an entry with the same key is retained,
    /// evicting the oldest entry when over capacity. Returns whether the
    /// event was inserted.
    ///
    /// Only retained entries are checked, so an event evicted earlier is
    /// accepted again if it is redelivered.
    pub fn insert(&mut self, event: FeeEvent) -> bool {
        if self.capacity == 0 || self.entries.iter().any(|entry| entry.key() == event.key()) {
            return false;
        }
        self.entries.push_front(event);
        self.entries.truncate(self.capacity);
        true
    }

    /// Inserts a batch in delivery order and returns how many events were
    /// new.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = FeeEvent>) -> usize {
        batch
            .into_iter()
            .map(|event| self.insert(event))
            .filter(|inserted| *inserted)
            .count()
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &FeeEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn event(tx: u8, log_index: u64) -> FeeEvent {
        FeeEvent {
            swap_size: U256::from(u64::from(tx) * 1_000),
            fee_applied: 3000,
            timestamp: 1_700_000_000,
            tx: TxHash::repeat_byte(tx),
            log_index,
        }
    }

    fn keys(feed: &Feed) -> Vec<(TxHash, u64)> {
        feed.iter().map(FeeEvent::key).collect()
    }

    #[test]
    fn newest_first() {
        let mut feed = Feed::default();
        assert!(feed.insert(event(1, 0)));
        assert!(feed.insert(event(2, 0)));
        assert_eq!(keys(&feed), vec![event(2, 0).key(), event(1, 0).key()]);
    }

    #[test]
    fn duplicates_are_dropped() {
        let mut feed = Feed::default();
        assert!(feed.insert(event(1, 0)));
        assert!(!feed.insert(event(1, 0)));
        assert_eq!(feed.len(), 1);

        // Same transaction, different log.
        assert!(feed.insert(event(1, 1)));
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut feed = Feed::default();
        for tx in 1..=7 {
            feed.insert(event(tx, 0));
        }
        assert_eq!(feed.len(), FEED_CAPACITY);
        assert_eq!(
            keys(&feed),
            (3..=7).rev().map(|tx| event(tx, 0).key()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn redelivered_batch_is_deduplicated() {
        let mut feed = Feed::default();
        let batch = vec![event(1, 0), event(1, 1), event(2, 0)];
        assert_eq!(feed.extend(batch.clone()), 3);
        assert_eq!(feed.extend(batch), 0);
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.iter().next(), Some(&event(2, 0)));
    }

    #[test]
    fn evicted_events_are_accepted_again() {
        let mut feed = Feed::with_capacity(2);
        feed.extend([event(1, 0), event(2, 0), event(3, 0)]);
        assert!(feed.insert(event(1, 0)));
        assert_eq!(keys(&feed), vec![event(1, 0).key(), event(3, 0).key()]);
    }

    #[test]
    fn displays_event() {
        let line = event(1, 0).to_string();
        assert!(line.starts_with("22:13:20 size 0.000000000000001000 fee 0.30% tx 0x0101"));
    }

    #[test]
    fn sizes_are_shown_in_threshold_units() {
        let event = FeeEvent {
            swap_size: alloy::primitives::utils::parse_ether("0.25").unwrap(),
            ..event(1, 0)
        };
        assert!(
            event
                .to_string()
                .contains(" size 0.250000000000000000 fee ")
        );
    }
}
