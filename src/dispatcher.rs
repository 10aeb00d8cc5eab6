use tracing::{info, warn};

use crate::{
    clients::{DurableQueue, MaintenanceGate, Notifier, TokenSource},
    error::AppError,
    models::{
        envelope::QueueEnvelope,
        outcome::{DeliveryOutcome, SendOutcome},
        payload::NotificationPayload,
    },
};

/// Delivery state machine for one built payload: maintenance check, then
/// either a synchronous notifier call or a deferral to the durable queue.
///
/// Once a payload exists, every path out of here is `Sent` or a confirmed
/// enqueue; only a failure of the enqueue itself (no fallback tier below the
/// queue) propagates as an error.
pub async fn dispatch_notification<G, T, N, Q>(
    payload: NotificationPayload,
    gate: &G,
    tokens: &T,
    notifier: &N,
    queue: &Q,
) -> Result<DeliveryOutcome, AppError>
where
    G: MaintenanceGate,
    T: TokenSource,
    N: Notifier,
    Q: DurableQueue,
{
    let message_id = payload.header.id.clone();

    if gate.is_maintenance_mode().await? {
        queue.enqueue(&QueueEnvelope::new(payload)).await?;

        // Best-effort wake-up; the enqueue above already guarantees eventual
        // delivery via the scheduled drain.
        if let Err(e) = queue.signal_drain().await {
            warn!(message_id = %message_id, error = %e, "Drain signal failed");
        }

        info!(message_id = %message_id, "Maintenance mode active, notification queued");

        return Ok(DeliveryOutcome::Queued);
    }

    let token = match tokens.bearer_token().await {
        Ok(token) => token,
        Err(e) => {
            // The notifier must not be called without a required token; the
            // payload goes to the durable path instead of being dropped.
            warn!(message_id = %message_id, error = %e, "Token acquisition failed, deferring delivery");
            queue.enqueue(&QueueEnvelope::new(payload)).await?;
            return Ok(DeliveryOutcome::QueuedAfterFailure);
        }
    };

    match notifier.send(&payload, token.as_deref()).await {
        SendOutcome::Sent => {
            info!(message_id = %message_id, "Notification delivered synchronously");
            Ok(DeliveryOutcome::Sent)
        }
        outcome => {
            let notifier_down = outcome.indicates_notifier_down();

            queue.enqueue(&QueueEnvelope::new(payload)).await?;

            warn!(
                message_id = %message_id,
                outcome = %outcome,
                "Synchronous delivery failed, notification queued for retry"
            );

            // Load shedding, not correctness: trip the gate so the next
            // requests skip the doomed synchronous attempt.
            if notifier_down {
                if let Err(e) = gate.activate().await {
                    warn!(message_id = %message_id, error = %e, "Failed to activate maintenance flag");
                }
            }

            Ok(DeliveryOutcome::QueuedAfterFailure)
        }
    }
}
