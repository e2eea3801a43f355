//! # Request Handlers
//!
//! Axum request handlers for the relay.
//! Each handler forwards one call to the processor on behalf of the
//! merchant account named in the `tilled_account` header.

use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use relay_core::{
    AttachOutcome, AttachRequest, Customer, CustomerCreateParams, ListPaymentMethodsParams,
    PaymentError, PaymentIntent, PaymentIntentConfirmParams, PaymentIntentCreateParams,
    PaymentMethod, PaymentMethodAttachParams, PaymentMethodCreateParams, PaymentMethodList,
    PaymentMethodType, Subscription, SubscriptionCreateParams,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

/// Header the browser sends the merchant account in
pub const ACCOUNT_HEADER: &str = "tilled_account";

// =============================================================================
// Request/Response Types
// =============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Response of `GET /secret/{account_id}`
#[derive(Debug, Serialize)]
pub struct SecretResponse {
    pub client_secret: String,
    pub amount: i64,
}

/// Error body of `GET /secret/{account_id}`
#[derive(Debug, Serialize)]
pub struct SecretErrorResponse {
    pub message: String,
}

/// Query of `GET /listPaymentMethods`
#[derive(Debug, Deserialize)]
pub struct ListPaymentMethodsQuery {
    pub tilled_account: String,
    pub customer_id: String,
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn payment_error_to_response(err: PaymentError) -> ApiError {
    let code = err.status_code();
    let mut response = ErrorResponse::new(err.to_string(), code);
    if let PaymentError::ProviderError { status, .. } = &err {
        response = response.with_details(format!("processor status {}", status));
    }
    (status(code), Json(response))
}

fn bad_input(message: &str, details: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message, 400).with_details(details)),
    )
}

/// Request body, or a 400 in the relay's error envelope
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| bad_input("Invalid request body", rejection.body_text()))
}

/// Query string, or a 400 in the relay's error envelope
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| bad_input("Invalid query string", rejection.body_text()))
}

/// Merchant account from the request headers
fn account_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(ACCOUNT_HEADER)
        .or_else(|| headers.get(relay_tilled::ACCOUNT_HEADER))
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    format!("Missing {} header", ACCOUNT_HEADER),
                    400,
                )),
            )
        })
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "checkout-relay",
        "provider": state.processor.provider_name(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a payment intent with the configured defaults and return only
/// its client secret, for forms that confirm entirely in the browser.
#[instrument(skip(state))]
pub async fn get_secret(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<SecretResponse>, (StatusCode, Json<SecretErrorResponse>)> {
    let defaults = &state.settings.secret_intent;
    let params = PaymentIntentCreateParams::new(
        defaults.amount,
        defaults.currency.clone(),
        defaults.payment_method_types.clone(),
    );

    let bad_request = |message: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(SecretErrorResponse { message }),
        )
    };

    let intent = state
        .processor
        .create_payment_intent(&account_id, &params)
        .await
        .map_err(|e| {
            error!("Unable to create payment intent: {}", e);
            match e {
                PaymentError::ProviderError { message, .. } => bad_request(message),
                _ => bad_request("Unable to create and return paymentIntent".to_string()),
            }
        })?;

    let client_secret = intent.client_secret.ok_or_else(|| {
        error!("Payment intent {} has no client secret", intent.id);
        bad_request("Unable to create and return paymentIntent".to_string())
    })?;

    Ok(Json(SecretResponse {
        client_secret,
        amount: intent.amount,
    }))
}

/// Create a payment intent
#[instrument(skip(state, headers, payload))]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PaymentIntentCreateParams>, JsonRejection>,
) -> Result<Json<PaymentIntent>, ApiError> {
    let account_id = account_id(&headers)?;
    let params = json_body(payload)?;

    let intent = state
        .processor
        .create_payment_intent(&account_id, &params)
        .await
        .map_err(|e| {
            error!("Failed to create payment intent: {}", e);
            payment_error_to_response(e)
        })?;

    info!("Created payment intent: {}", intent.id);
    Ok(Json(intent))
}

/// Confirm a payment intent
#[instrument(skip(state, headers, payload))]
pub async fn confirm_payment_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<PaymentIntentConfirmParams>, JsonRejection>,
) -> Result<Json<PaymentIntent>, ApiError> {
    let account_id = account_id(&headers)?;
    let params = json_body(payload)?;

    let intent = state
        .processor
        .confirm_payment_intent(&account_id, &id, &params)
        .await
        .map_err(|e| {
            error!("Failed to confirm payment intent: {}", e);
            payment_error_to_response(e)
        })?;

    info!("Confirmed payment intent: {} ({})", intent.id, intent.status);
    Ok(Json(intent))
}

/// Create a payment method from tokenized form fields
#[instrument(skip(state, headers, payload))]
pub async fn create_payment_method(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PaymentMethodCreateParams>, JsonRejection>,
) -> Result<Json<PaymentMethod>, ApiError> {
    let account_id = account_id(&headers)?;
    let params = json_body(payload)?;

    let pm = state
        .processor
        .create_payment_method(&account_id, &params)
        .await
        .map_err(|e| {
            error!("Failed to create payment method: {}", e);
            payment_error_to_response(e)
        })?;

    Ok(Json(pm))
}

/// Attach a payment method to a customer.
///
/// Answers 200 with the attached method, or 201 with the customer's
/// existing method when the card was already on file.
#[instrument(skip(state, headers, payload))]
pub async fn attach_payment_method(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<PaymentMethodAttachParams>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentMethod>), ApiError> {
    let account_id = account_id(&headers)?;
    let params = json_body(payload)?;
    let request = AttachRequest::new(account_id, id, params.customer_id);

    match state.attach.attach(&request).await {
        Ok(AttachOutcome::Attached(pm)) => Ok((StatusCode::OK, Json(pm))),
        Ok(AttachOutcome::Reused(pm)) => Ok((StatusCode::CREATED, Json(pm))),
        Err(e) => {
            let code = e.status_code();
            error!("Attach failed: {}", e);
            Err((status(code), Json(ErrorResponse::new(e.to_string(), code))))
        }
    }
}

/// List a customer's payment methods of one type
#[instrument(skip(state, query))]
pub async fn list_payment_methods(
    State(state): State<AppState>,
    query: Result<Query<ListPaymentMethodsQuery>, QueryRejection>,
) -> Result<Json<PaymentMethodList>, ApiError> {
    let query = query_params(query)?;
    let params = ListPaymentMethodsParams {
        customer_id: query.customer_id,
        method_type: query.method_type,
        offset: query.offset,
        limit: query.limit,
    };

    let list = state
        .processor
        .list_payment_methods(&query.tilled_account, &params)
        .await
        .map_err(|e| {
            error!("Failed to list payment methods: {}", e);
            payment_error_to_response(e)
        })?;

    Ok(Json(list))
}

/// Create a customer
#[instrument(skip(state, headers, payload))]
pub async fn create_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CustomerCreateParams>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let account_id = account_id(&headers)?;
    let params = json_body(payload)?;

    let customer = state
        .processor
        .create_customer(&account_id, &params)
        .await
        .map_err(|e| {
            error!("Failed to create customer: {}", e);
            payment_error_to_response(e)
        })?;

    info!("Created customer: {}", customer.id);
    Ok(Json(customer))
}

/// Create a subscription
#[instrument(skip(state, headers, payload))]
pub async fn create_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SubscriptionCreateParams>, JsonRejection>,
) -> Result<Json<Subscription>, ApiError> {
    let account_id = account_id(&headers)?;
    let params = json_body(payload)?;

    let subscription = state
        .processor
        .create_subscription(&account_id, &params)
        .await
        .map_err(|e| {
            error!("Failed to create subscription: {}", e);
            payment_error_to_response(e)
        })?;

    info!("Created subscription: {}", subscription.id);
    Ok(Json(subscription))
}
