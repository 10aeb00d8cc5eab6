use std::time::Duration;

use anyhow::Result;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use card_notify::{
    clients::notifier::NotifierClient,
    dispatcher::dispatch_notification,
    error::AppError,
    models::outcome::{DeliveryOutcome, SendOutcome},
};

use crate::common::{FakeGate, FakeNotifier, FakeQueue, FakeTokens, sample_payload, test_config};

/// Test: maintenance mode short-circuits to the queue without touching the
/// notifier, and signals an out-of-band drain
#[tokio::test]
async fn test_maintenance_mode_queues_without_calling_notifier() -> Result<()> {
    let gate = FakeGate::new(true);
    let tokens = FakeTokens::none();
    let notifier = FakeNotifier::always(SendOutcome::Sent);
    let queue = FakeQueue::new();

    let outcome =
        dispatch_notification(sample_payload("msg-1"), &gate, &tokens, &notifier, &queue).await?;

    assert_eq!(outcome, DeliveryOutcome::Queued);
    assert_eq!(notifier.call_count(), 0, "Notifier must not be called");

    let enqueued = queue.enqueued_envelopes();
    assert_eq!(enqueued.len(), 1);
    assert_eq!(enqueued[0].intentos, 0);
    assert_eq!(enqueued[0].payload.header.id, "msg-1");

    assert_eq!(queue.drain_signal_count(), 1);

    Ok(())
}

/// Test: a 2xx from the notifier is a synchronous delivery, nothing enqueued
#[tokio::test]
async fn test_successful_send_leaves_queue_unchanged() -> Result<()> {
    let gate = FakeGate::new(false);
    let tokens = FakeTokens::none();
    let notifier = FakeNotifier::always(SendOutcome::Sent);
    let queue = FakeQueue::new();

    let outcome =
        dispatch_notification(sample_payload("msg-2"), &gate, &tokens, &notifier, &queue).await?;

    assert_eq!(outcome, DeliveryOutcome::Sent);
    assert_eq!(notifier.call_count(), 1);
    assert!(queue.enqueued_envelopes().is_empty());
    assert_eq!(queue.pending_len(), 0);

    Ok(())
}

/// Test: a timeout defers to the durable path with a fresh attempt counter
/// and does not trip the maintenance gate
#[tokio::test]
async fn test_timeout_queues_with_zero_attempts() -> Result<()> {
    let gate = FakeGate::new(false);
    let tokens = FakeTokens::none();
    let notifier = FakeNotifier::always(SendOutcome::Timeout);
    let queue = FakeQueue::new();

    let outcome =
        dispatch_notification(sample_payload("msg-3"), &gate, &tokens, &notifier, &queue).await?;

    assert_eq!(outcome, DeliveryOutcome::QueuedAfterFailure);

    let enqueued = queue.enqueued_envelopes();
    assert_eq!(enqueued.len(), 1);
    assert_eq!(enqueued[0].intentos, 0);

    assert!(!gate.is_active(), "A timeout must not trip the gate");

    Ok(())
}

/// Test: same timeout scenario against a real HTTP session and a gateway
/// that sleeps past the configured timeout
#[tokio::test]
async fn test_slow_gateway_defers_through_the_full_dispatch_path() -> Result<()> {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = test_config(&format!("{}/notify", mock_server.uri()), 1);
    let notifier = NotifierClient::new(&config)?;

    let gate = FakeGate::new(false);
    let tokens = FakeTokens::none();
    let queue = FakeQueue::new();

    let outcome =
        dispatch_notification(sample_payload("msg-slow"), &gate, &tokens, &notifier, &queue)
            .await?;

    assert_eq!(outcome, DeliveryOutcome::QueuedAfterFailure);

    let enqueued = queue.enqueued_envelopes();
    assert_eq!(enqueued.len(), 1);
    assert_eq!(enqueued[0].intentos, 0);
    assert!(!gate.is_active());

    Ok(())
}

/// Test: a connection failure queues the payload and trips the gate so the
/// next requests skip the synchronous attempt
#[tokio::test]
async fn test_connection_failure_queues_and_activates_gate() -> Result<()> {
    let gate = FakeGate::new(false);
    let tokens = FakeTokens::none();
    let notifier = FakeNotifier::always(SendOutcome::ConnectionFailed);
    let queue = FakeQueue::new();

    let outcome =
        dispatch_notification(sample_payload("msg-4"), &gate, &tokens, &notifier, &queue).await?;

    assert_eq!(outcome, DeliveryOutcome::QueuedAfterFailure);
    assert_eq!(queue.enqueued_envelopes().len(), 1);
    assert!(gate.is_active(), "Connection failure must trip the gate");

    Ok(())
}

/// Test: a non-2xx response is handled like a connection failure
#[tokio::test]
async fn test_http_error_queues_and_activates_gate() -> Result<()> {
    let gate = FakeGate::new(false);
    let tokens = FakeTokens::none();
    let notifier = FakeNotifier::always(SendOutcome::HttpError(503));
    let queue = FakeQueue::new();

    let outcome =
        dispatch_notification(sample_payload("msg-5"), &gate, &tokens, &notifier, &queue).await?;

    assert_eq!(outcome, DeliveryOutcome::QueuedAfterFailure);
    assert_eq!(queue.enqueued_envelopes().len(), 1);
    assert!(gate.is_active());

    Ok(())
}

/// Test: when token acquisition fails the notifier is never called and the
/// payload still reaches the durable path
#[tokio::test]
async fn test_token_failure_defers_without_calling_notifier() -> Result<()> {
    let gate = FakeGate::new(false);
    let tokens = FakeTokens::failing();
    let notifier = FakeNotifier::always(SendOutcome::Sent);
    let queue = FakeQueue::new();

    let outcome =
        dispatch_notification(sample_payload("msg-6"), &gate, &tokens, &notifier, &queue).await?;

    assert_eq!(outcome, DeliveryOutcome::QueuedAfterFailure);
    assert_eq!(notifier.call_count(), 0);
    assert_eq!(queue.enqueued_envelopes().len(), 1);

    Ok(())
}

/// Test: an unreadable maintenance flag aborts the invocation before anything
/// is enqueued, instead of silently defaulting
#[tokio::test]
async fn test_unreadable_gate_is_fatal_and_enqueues_nothing() -> Result<()> {
    let gate = FakeGate::unreadable();
    let tokens = FakeTokens::none();
    let notifier = FakeNotifier::always(SendOutcome::Sent);
    let queue = FakeQueue::new();

    let result =
        dispatch_notification(sample_payload("msg-7"), &gate, &tokens, &notifier, &queue).await;

    assert!(matches!(result, Err(AppError::Configuration(_))));
    assert_eq!(notifier.call_count(), 0);
    assert!(queue.enqueued_envelopes().is_empty());

    Ok(())
}

/// Test: the bearer token obtained for the invocation reaches the notifier
#[tokio::test]
async fn test_dispatch_passes_token_through() -> Result<()> {
    let gate = FakeGate::new(false);
    let tokens = FakeTokens::with_token("bearer-abc");
    let notifier = FakeNotifier::always(SendOutcome::Sent);
    let queue = FakeQueue::new();

    let outcome =
        dispatch_notification(sample_payload("msg-8"), &gate, &tokens, &notifier, &queue).await?;

    assert_eq!(outcome, DeliveryOutcome::Sent);
    assert_eq!(notifier.call_count(), 1);

    Ok(())
}
