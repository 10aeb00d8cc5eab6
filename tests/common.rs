use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicU32, AtomicU64, Ordering},
    },
};

use card_notify::{
    clients::{
        DeadLetterStore, DurableQueue, MaintenanceGate, Notifier, ReceivedMessage, TokenSource,
    },
    config::Config,
    error::AppError,
    models::{
        envelope::{DlqMessage, QueueEnvelope},
        outcome::SendOutcome,
        payload::{Address, NotificationPayload, PayloadHeader, PayloadInfo},
    },
};

pub fn sample_payload(id: &str) -> NotificationPayload {
    NotificationPayload {
        header: PayloadHeader {
            id: id.to_string(),
            ref_company: "BOLIVARIANO".to_string(),
            ref_service: "DIFCO".to_string(),
            key_value: "0987654321".to_string(),
            channels: "APP".to_string(),
            ref_msg_label: "Compra".to_string(),
        },
        info: PayloadInfo {
            login_enterprise: "enterprise".to_string(),
            ref_contract: "contract-001".to_string(),
        },
        data: HashMap::from([(
            "valor".to_string(),
            serde_json::Value::String("123.45".to_string()),
        )]),
        addresses: vec![Address {
            class_name: "EmailAddress".to_string(),
            address_type: "email".to_string(),
            destination: "cliente@example.com".to_string(),
        }],
        contents: Vec::new(),
    }
}

/// Config pointing at a test notifier endpoint; queue/store URLs are never
/// dialed by the unit suites.
pub fn test_config(notifier_url: &str, timeout_seconds: u64) -> Config {
    Config {
        rabbitmq_url: "amqp://localhost:5672".to_string(),
        retry_queue_name: "noti_retry".to_string(),
        dead_letter_queue_name: "noti_dlq".to_string(),
        drain_signal_queue_name: "noti_drain".to_string(),
        prefetch_count: 10,
        redis_url: "redis://localhost:6379".to_string(),
        maintenance_flag_key: "noti:maintenance".to_string(),
        reference_params_key: "noti:params".to_string(),
        notifier_url: notifier_url.to_string(),
        notifier_timeout_seconds: timeout_seconds,
        auth_url: None,
        auth_credentials_key: None,
        auth_scope: None,
        max_retries: 10,
        session_retry_attempts: 1,
        session_initial_delay_ms: 10,
        session_max_delay_ms: 50,
        session_backoff_multiplier: 2,
        receive_batch_size: 10,
        environment: "test".to_string(),
        server_port: 0,
    }
}

pub struct FakeGate {
    active: Mutex<bool>,
    fail_reads: bool,
    pub activations: AtomicU32,
}

impl FakeGate {
    pub fn new(active: bool) -> Self {
        Self {
            active: Mutex::new(active),
            fail_reads: false,
            activations: AtomicU32::new(0),
        }
    }

    pub fn unreadable() -> Self {
        Self {
            active: Mutex::new(false),
            fail_reads: true,
            activations: AtomicU32::new(0),
        }
    }

    pub fn is_active(&self) -> bool {
        *self.active.lock().unwrap()
    }
}

impl MaintenanceGate for FakeGate {
    async fn is_maintenance_mode(&self) -> Result<bool, AppError> {
        if self.fail_reads {
            return Err(AppError::Configuration(
                "maintenance flag is not set".to_string(),
            ));
        }

        Ok(*self.active.lock().unwrap())
    }

    async fn activate(&self) -> Result<(), AppError> {
        *self.active.lock().unwrap() = true;
        self.activations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory durable queue. Receiving removes a message from the pending
/// store; acks are recorded so tests can assert delete-on-terminal-outcome.
#[derive(Default)]
pub struct FakeQueue {
    pending: Mutex<VecDeque<(u64, Vec<u8>)>>,
    next_receipt: AtomicU64,
    pub acked: Mutex<Vec<u64>>,
    pub enqueued: Mutex<Vec<QueueEnvelope>>,
    pub drain_signals: AtomicU32,
}

impl FakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_raw(&self, body: Vec<u8>) -> u64 {
        let receipt = self.next_receipt.fetch_add(1, Ordering::SeqCst) + 1;
        self.pending.lock().unwrap().push_back((receipt, body));
        receipt
    }

    pub fn push_envelope(&self, envelope: &QueueEnvelope) -> u64 {
        self.push_raw(serde_json::to_vec(envelope).unwrap())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn enqueued_envelopes(&self) -> Vec<QueueEnvelope> {
        self.enqueued.lock().unwrap().clone()
    }

    pub fn acked_receipts(&self) -> Vec<u64> {
        self.acked.lock().unwrap().clone()
    }

    pub fn drain_signal_count(&self) -> u32 {
        self.drain_signals.load(Ordering::SeqCst)
    }
}

impl DurableQueue for FakeQueue {
    async fn enqueue(&self, envelope: &QueueEnvelope) -> Result<(), AppError> {
        self.enqueued.lock().unwrap().push(envelope.clone());
        self.push_envelope(envelope);
        Ok(())
    }

    async fn receive_batch(&self, max_messages: usize) -> Result<Vec<ReceivedMessage>, AppError> {
        let mut pending = self.pending.lock().unwrap();
        let mut batch = Vec::new();

        while batch.len() < max_messages {
            match pending.pop_front() {
                Some((receipt, body)) => batch.push(ReceivedMessage { receipt, body }),
                None => break,
            }
        }

        Ok(batch)
    }

    async fn ack(&self, receipt: u64) -> Result<(), AppError> {
        self.acked.lock().unwrap().push(receipt);
        Ok(())
    }

    async fn signal_drain(&self) -> Result<(), AppError> {
        self.drain_signals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDeadLetters {
    pub deposited: Mutex<Vec<DlqMessage>>,
    pub fail_deposits: bool,
}

impl FakeDeadLetters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            deposited: Mutex::new(Vec::new()),
            fail_deposits: true,
        }
    }

    pub fn deposited_ids(&self) -> Vec<String> {
        self.deposited
            .lock()
            .unwrap()
            .iter()
            .map(|record| record.payload.header.id.clone())
            .collect()
    }
}

impl DeadLetterStore for FakeDeadLetters {
    async fn deposit(&self, record: &DlqMessage) -> Result<(), AppError> {
        if self.fail_deposits {
            return Err(AppError::Infrastructure(
                "dead-letter queue unavailable".to_string(),
            ));
        }

        self.deposited.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Scripted notifier: returns the next outcome from the script, repeating the
/// last one once exhausted. Counts calls so the maintenance short-circuit can
/// assert the endpoint was never touched.
pub struct FakeNotifier {
    script: Mutex<VecDeque<SendOutcome>>,
    last: SendOutcome,
    pub calls: AtomicU32,
}

impl FakeNotifier {
    pub fn always(outcome: SendOutcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last: outcome,
            calls: AtomicU32::new(0),
        }
    }

    pub fn scripted(outcomes: Vec<SendOutcome>) -> Self {
        let last = *outcomes.last().expect("script must not be empty");
        Self {
            script: Mutex::new(outcomes.into()),
            last,
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Notifier for FakeNotifier {
    async fn send(&self, _payload: &NotificationPayload, _token: Option<&str>) -> SendOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script.lock().unwrap().pop_front().unwrap_or(self.last)
    }
}

pub struct FakeTokens {
    token: Option<String>,
    fail: bool,
}

impl FakeTokens {
    pub fn none() -> Self {
        Self {
            token: None,
            fail: false,
        }
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            token: None,
            fail: true,
        }
    }
}

impl TokenSource for FakeTokens {
    async fn bearer_token(&self) -> Result<Option<String>, AppError> {
        if self.fail {
            return Err(AppError::DataProcessing(
                "token exchange response has no access_token".to_string(),
            ));
        }

        Ok(self.token.clone())
    }
}
