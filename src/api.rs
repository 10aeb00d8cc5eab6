use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    builder::build_payload,
    clients::{
        auth::TokenProvider, health::HealthChecker, notifier::NotifierClient,
        params::ParameterStore, queue::RabbitMqClient,
    },
    config::Config,
    dispatcher::dispatch_notification,
    drainer::drain_queue,
    error::AppError,
    models::{
        event::{InboundEvent, validate_event},
        health::HealthStatus,
        outcome::DeliveryOutcome,
        response::{DispatchResponse, ValidationResponse},
    },
};

pub struct AppState {
    config: Config,
    queue: RabbitMqClient,
    params: ParameterStore,
    notifier: NotifierClient,
    tokens: TokenProvider,
    health_checker: HealthChecker,
}

pub async fn run_api_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let params = ParameterStore::connect(&config).await?;
    let queue = RabbitMqClient::connect(&config).await?;
    let notifier = NotifierClient::new(&config)?;
    let tokens = TokenProvider::new(&config, params.clone())?;

    let server_port = config.server_port;

    let state = Arc::new(AppState {
        health_checker: HealthChecker::new(config.clone()),
        queue,
        params,
        notifier,
        tokens,
        config,
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/notifications", post(dispatch))
        .route("/drain", post(drain))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{server_port}");
    let listener = TcpListener::bind(&addr).await?;

    info!(address = %addr, "Notification API server started");

    axum::serve(listener, app).await?;

    Ok(())
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    Json(event): Json<InboundEvent>,
) -> Response {
    if let Err(error) = validate_event(&event) {
        return match error {
            AppError::Validation(errors) => {
                info!(
                    outcome = %DeliveryOutcome::RejectedInvalid,
                    fields = errors.len(),
                    "Event rejected before dispatch"
                );
                (StatusCode::BAD_REQUEST, Json(ValidationResponse::new(errors))).into_response()
            }
            other => error_response(&other),
        };
    }

    let reference_params = match state.params.reference_params().await {
        Ok(params) => params,
        Err(e) => return error_response(&e),
    };

    let payload = match build_payload(&event, &reference_params) {
        Ok(payload) => payload,
        Err(e) => return error_response(&e),
    };

    let message_id = payload.header.id.clone();

    match dispatch_notification(
        payload,
        &state.params,
        &state.tokens,
        &state.notifier,
        &state.queue,
    )
    .await
    {
        Ok(outcome) => {
            let status = match outcome {
                DeliveryOutcome::QueuedAfterFailure => StatusCode::BAD_GATEWAY,
                _ => StatusCode::OK,
            };

            (status, Json(DispatchResponse::for_outcome(outcome, &message_id))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn drain(State(state): State<Arc<AppState>>) -> Response {
    match drain_queue(
        &state.queue,
        &state.queue,
        &state.tokens,
        &state.notifier,
        state.config.max_retries,
        state.config.receive_batch_size,
    )
    .await
    {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_checker.check_all().await;

    let status_code = match health.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

fn error_response(error: &AppError) -> Response {
    let status = match error {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, Json(DispatchResponse::for_error(error))).into_response()
}
