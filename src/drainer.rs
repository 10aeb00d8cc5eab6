use std::collections::HashSet;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    clients::{DeadLetterStore, DurableQueue, Notifier, ReceivedMessage, TokenSource},
    error::AppError,
    models::{
        envelope::{DlqMessage, QueueEnvelope},
        outcome::{DeliveryOutcome, SendOutcome},
    },
};

/// Per-cycle counters returned to the trigger for observability. Not a
/// correctness contract.
#[derive(Debug, Default, Clone, Serialize)]
pub struct DrainStats {
    pub received: u32,
    pub sent: u32,
    pub requeued: u32,
    pub dead_lettered: u32,
    pub dropped: u32,
    pub deferred: u32,
    pub failed: u32,
}

enum Disposition {
    Sent,
    Requeued,
    DeadLettered,
    Dropped,
    Deferred,
}

/// One drain cycle: receive bounded batches until the queue reports empty and
/// re-attempt delivery of each envelope. A message leaves the source queue
/// only on a terminal outcome (sent, re-enqueued with a bumped counter,
/// dead-lettered, or dropped as malformed); anything interrupted mid-attempt
/// stays un-acked and is redelivered by the broker.
///
/// An envelope is attempted at most once per cycle: a copy re-enqueued after
/// a failure waits for the next trigger, so the retry budget spans multiple
/// cycles instead of burning down back-to-back while the notifier is down.
pub async fn drain_queue<Q, D, T, N>(
    queue: &Q,
    dead_letters: &D,
    tokens: &T,
    notifier: &N,
    max_retries: u32,
    batch_size: usize,
) -> Result<DrainStats, AppError>
where
    Q: DurableQueue,
    D: DeadLetterStore,
    T: TokenSource,
    N: Notifier,
{
    // One authentication per cycle. If the exchange fails nothing has been
    // received yet, so every message stays queued for the next trigger.
    let token = tokens.bearer_token().await?;

    let mut stats = DrainStats::default();
    let mut requeued_ids: HashSet<String> = HashSet::new();

    info!("Starting drain cycle");

    loop {
        let batch = queue.receive_batch(batch_size).await?;

        if batch.is_empty() {
            break;
        }

        for message in batch {
            stats.received += 1;
            let receipt = message.receipt;

            // One message's failure must not abort the rest of the batch.
            match process_message(
                queue,
                dead_letters,
                notifier,
                token.as_deref(),
                max_retries,
                message,
                &mut requeued_ids,
            )
            .await
            {
                Ok(Disposition::Sent) => stats.sent += 1,
                Ok(Disposition::Requeued) => stats.requeued += 1,
                Ok(Disposition::DeadLettered) => stats.dead_lettered += 1,
                Ok(Disposition::Dropped) => stats.dropped += 1,
                Ok(Disposition::Deferred) => stats.deferred += 1,
                Err(e) => {
                    stats.failed += 1;
                    error!(
                        receipt,
                        error = %e,
                        "Failed to process queued message, leaving it for redelivery"
                    );
                }
            }
        }

        // Deferred copies have reached the head of the queue; everything
        // behind them was also published by this cycle.
        if stats.deferred > 0 {
            break;
        }
    }

    info!(
        received = stats.received,
        sent = stats.sent,
        requeued = stats.requeued,
        dead_lettered = stats.dead_lettered,
        dropped = stats.dropped,
        deferred = stats.deferred,
        failed = stats.failed,
        "Drain cycle finished"
    );

    Ok(stats)
}

async fn process_message<Q, D, N>(
    queue: &Q,
    dead_letters: &D,
    notifier: &N,
    token: Option<&str>,
    max_retries: u32,
    message: ReceivedMessage,
    requeued_ids: &mut HashSet<String>,
) -> Result<Disposition, AppError>
where
    Q: DurableQueue,
    D: DeadLetterStore,
    N: Notifier,
{
    let envelope: QueueEnvelope = match serde_json::from_slice(&message.body) {
        Ok(envelope) => envelope,
        Err(e) => {
            // A malformed envelope can never succeed; retrying it is pointless.
            warn!(receipt = message.receipt, error = %e, "Malformed envelope dropped");
            queue.ack(message.receipt).await?;
            return Ok(Disposition::Dropped);
        }
    };

    let message_id = envelope.payload.header.id.clone();

    // This copy was published by the current cycle; its next attempt belongs
    // to a later trigger. Put it back unchanged.
    if requeued_ids.contains(&message_id) {
        queue.enqueue(&envelope).await?;
        queue.ack(message.receipt).await?;
        return Ok(Disposition::Deferred);
    }

    if envelope.intentos >= max_retries {
        warn!(
            message_id = %message_id,
            intentos = envelope.intentos,
            max_retries,
            "Retry budget exhausted, moving payload to dead-letter queue"
        );

        dead_letters
            .deposit(&DlqMessage::exhausted(&envelope, max_retries))
            .await?;
        queue.ack(message.receipt).await?;

        info!(
            message_id = %message_id,
            outcome = %DeliveryOutcome::DeadLettered,
            "Payload handed off for manual inspection"
        );

        return Ok(Disposition::DeadLettered);
    }

    match notifier.send(&envelope.payload, token).await {
        SendOutcome::Sent => {
            info!(
                message_id = %message_id,
                intentos = envelope.intentos,
                "Queued notification delivered"
            );

            queue.ack(message.receipt).await?;
            Ok(Disposition::Sent)
        }
        outcome => {
            let incremented = envelope.incremented();

            warn!(
                message_id = %message_id,
                intentos = incremented.intentos,
                outcome = %outcome,
                "Re-delivery failed, envelope re-enqueued"
            );

            // Re-enqueue first, ack second: a crash between the two leaves a
            // duplicate rather than a lost message.
            queue.enqueue(&incremented).await?;
            queue.ack(message.receipt).await?;

            requeued_ids.insert(message_id);

            Ok(Disposition::Requeued)
        }
    }
}
