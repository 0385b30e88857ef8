//! Polls the hook's `DynamicFeeApplied` logs for the configured pool.

use {
    crate::{
        domain::{
            eth::Address,
            events::{FeeEvent, Feed},
            pool::PoolId,
        },
        infra::observe,
    },
    alloy::{
        providers::Provider,
        rpc::types::{Filter, Log},
        sol_types::SolEvent,
    },
    anyhow::{Context, Result},
    contracts::alloy::DynamicFeeHook::DynamicFeeHook::DynamicFeeApplied,
    ethrpc::AlloyProvider,
    futures::{Stream, StreamExt},
    std::time::Duration,
};

/// Installs a log filter for fee events of `pool` emitted by `hook` and
/// returns the batches of new events the node reports on every poll.
pub async fn subscribe(
    provider: &AlloyProvider,
    hook: Address,
    pool: PoolId,
    poll_interval: Duration,
) -> Result<impl Stream<Item = Vec<FeeEvent>> + Unpin> {
    let filter = Filter::new()
        .address(hook)
        .event_signature(DynamicFeeApplied::SIGNATURE_HASH)
        .topic1(pool);
    let poller = provider
        .watch_logs(&filter)
        .await
        .context("failed to install fee event filter")?;
    Ok(poller
        .with_poll_interval(poll_interval)
        .into_stream()
        .map(|logs| logs.iter().filter_map(decode).collect()))
}

/// Converts a raw log. Logs without a transaction hash are pending and get
/// skipped.
fn decode(log: &Log) -> Option<FeeEvent> {
    let Some(tx) = log.transaction_hash else {
        tracing::debug!(?log, "skipping fee event without transaction hash");
        return None;
    };
    let event = match log.log_decode::<DynamicFeeApplied>() {
        Ok(decoded) => decoded.inner.data,
        Err(err) => {
            tracing::warn!(?err, %tx, "undecodable fee event");
            return None;
        }
    };
    Some(FeeEvent {
        swap_size: event.swapSize,
        fee_applied: event.feeApplied.to::<u32>(),
        timestamp: u64::try_from(event.timestamp).unwrap_or(u64::MAX),
        tx,
        log_index: log.log_index.unwrap_or_default(),
    })
}

/// Feeds every batch from `events` into `feed`, calling `on_change` whenever
/// a batch added something. Returns once the stream ends.
pub async fn follow<S>(events: S, feed: &mut Feed, mut on_change: impl FnMut(&Feed))
where
    S: Stream<Item = Vec<FeeEvent>>,
{
    let mut events = std::pin::pin!(events);
    while let Some(batch) = events.next().await {
        let mut added = 0;
        for event in batch {
            let observed = event.clone();
            let inserted = feed.insert(event);
            observe::fee_event(&observed, inserted);
            added += usize::from(inserted);
        }
        if added > 0 {
            on_change(feed);
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::domain::events::tests::event,
        alloy::primitives::{B256, LogData, TxHash, U256, aliases::U24},
    };

    fn log(tx: Option<TxHash>, log_index: Option<u64>) -> Log {
        let data: LogData = DynamicFeeApplied {
            poolId: B256::repeat_byte(0x99),
            swapSize: U256::from(10_000),
            feeApplied: U24::from(3000),
            timestamp: U256::from(1_700_000_000),
        }
        .encode_log_data();
        Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0x33),
                data,
            },
            transaction_hash: tx,
            log_index,
            ..Default::default()
        }
    }

    #[test]
    fn decodes_fee_events() {
        let tx = TxHash::repeat_byte(0x01);
        assert_eq!(
            decode(&log(Some(tx), Some(4))),
            Some(FeeEvent {
                swap_size: U256::from(10_000),
                fee_applied: 3000,
                timestamp: 1_700_000_000,
                tx,
                log_index: 4,
            })
        );
    }

    #[test]
    fn missing_log_index_is_zero() {
        let event = decode(&log(Some(TxHash::repeat_byte(0x01)), None)).unwrap();
        assert_eq!(event.log_index, 0);
    }

    #[test]
    fn pending_logs_are_skipped() {
        assert_eq!(decode(&log(None, Some(1))), None);
    }

    #[tokio::test]
    async fn follows_batches_without_duplicates() {
        let batches = vec![
            vec![event(1, 0), event(1, 1)],
            vec![event(1, 1), event(2, 0)],
            // Redelivered after a reconnect.
            vec![event(1, 0), event(2, 0)],
        ];
        let mut feed = Feed::default();
        let mut changes = 0;
        follow(futures::stream::iter(batches), &mut feed, |_| changes += 1).await;

        assert_eq!(changes, 2);
        assert_eq!(
            feed.iter().map(FeeEvent::key).collect::<Vec<_>>(),
            vec![event(2, 0).key(), event(1, 1).key(), event(1, 0).key()]
        );
    }
}
