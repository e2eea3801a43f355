//! # Processor HTTP Client
//!
//! `PaymentProcessor` implementation over the processor's REST API.
//!
//! Every request carries the secret key as a bearer token and the merchant
//! account in the `tilled-account` header. Error responses are classified
//! here, once, into `PaymentError` kinds.

use crate::config::TilledConfig;
use async_trait::async_trait;
use relay_core::{
    Customer, CustomerCreateParams, ListPaymentMethodsParams, PaymentError, PaymentIntent,
    PaymentIntentConfirmParams, PaymentIntentCreateParams, PaymentMethod,
    PaymentMethodAttachParams, PaymentMethodCreateParams, PaymentMethodList, PaymentProcessor,
    PaymentResult, Subscription, SubscriptionCreateParams,
};
use reqwest::{header::AUTHORIZATION, Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

/// Header naming the merchant account a call is made on behalf of
pub const ACCOUNT_HEADER: &str = "tilled-account";

/// Message the processor answers an attach with when the customer already
/// has the card under another payment method
pub const DUPLICATE_CARD_MESSAGE: &str = "The card associated with this PaymentMethod is already associated with this customer on another PaymentMethod.";

const PROVIDER: &str = "tilled";

/// HTTP client for the processor API
#[derive(Clone)]
pub struct TilledClient {
    config: TilledConfig,
    client: Client,
}

impl TilledClient {
    /// Create a new client
    pub fn new(config: TilledConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = TilledConfig::from_env()?;
        Self::new(config)
    }

    pub fn config(&self) -> &TilledConfig {
        &self.config
    }

    /// Build an API URL from path segments; segments are percent-encoded
    fn url(&self, segments: &[&str]) -> PaymentResult<Url> {
        let mut url = Url::parse(&self.config.api_base_url).map_err(|e| {
            PaymentError::Configuration(format!(
                "Invalid API base URL {}: {}",
                self.config.api_base_url, e
            ))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                PaymentError::Configuration(format!(
                    "API base URL cannot carry a path: {}",
                    self.config.api_base_url
                ))
            })?
            .pop_if_empty()
            .push("v1")
            .extend(segments);

        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        account_id: &str,
        segments: &[&str],
    ) -> PaymentResult<RequestBuilder> {
        if account_id.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "Missing merchant account".to_string(),
            ));
        }

        Ok(self
            .client
            .request(method, self.url(segments)?)
            .header(AUTHORIZATION, self.config.auth_header())
            .header(ACCOUNT_HEADER, account_id))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PaymentResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Processor API error: status={}, body={}", status, body);
            return Err(classify_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse processor response: {}", e))
        })
    }
}

#[async_trait]
impl PaymentProcessor for TilledClient {
    #[instrument(skip(self, params), fields(account = %account_id, amount = params.amount))]
    async fn create_payment_intent(
        &self,
        account_id: &str,
        params: &PaymentIntentCreateParams,
    ) -> PaymentResult<PaymentIntent> {
        let request = self
            .request(Method::POST, account_id, &["payment-intents"])?
            .json(params);
        let intent: PaymentIntent = self.send(request).await?;

        info!("Created payment intent: id={}, status={}", intent.id, intent.status);
        Ok(intent)
    }

    #[instrument(skip(self, params), fields(account = %account_id))]
    async fn confirm_payment_intent(
        &self,
        account_id: &str,
        id: &str,
        params: &PaymentIntentConfirmParams,
    ) -> PaymentResult<PaymentIntent> {
        let request = self
            .request(Method::POST, account_id, &["payment-intents", id, "confirm"])?
            .json(params);
        let intent: PaymentIntent = self.send(request).await?;

        info!("Confirmed payment intent: id={}, status={}", intent.id, intent.status);
        Ok(intent)
    }

    #[instrument(skip(self, params), fields(account = %account_id, kind = %params.method_type))]
    async fn create_payment_method(
        &self,
        account_id: &str,
        params: &PaymentMethodCreateParams,
    ) -> PaymentResult<PaymentMethod> {
        let request = self
            .request(Method::POST, account_id, &["payment-methods"])?
            .json(params);
        let pm: PaymentMethod = self.send(request).await?;

        info!("Created payment method: id={}", pm.id);
        Ok(pm)
    }

    #[instrument(skip(self), fields(account = %account_id))]
    async fn get_payment_method(&self, account_id: &str, id: &str) -> PaymentResult<PaymentMethod> {
        let request = self.request(Method::GET, account_id, &["payment-methods", id])?;
        self.send(request).await
    }

    #[instrument(skip(self, params), fields(account = %account_id, customer = %params.customer_id))]
    async fn list_payment_methods(
        &self,
        account_id: &str,
        params: &ListPaymentMethodsParams,
    ) -> PaymentResult<PaymentMethodList> {
        let request = self
            .request(Method::GET, account_id, &["payment-methods"])?
            .query(params);
        let list: PaymentMethodList = self.send(request).await?;

        debug!("Listed {} {} payment methods", list.items.len(), params.method_type);
        Ok(list)
    }

    #[instrument(skip(self, params), fields(account = %account_id, customer = %params.customer_id))]
    async fn attach_payment_method(
        &self,
        account_id: &str,
        id: &str,
        params: &PaymentMethodAttachParams,
    ) -> PaymentResult<PaymentMethod> {
        let request = self
            .request(Method::PUT, account_id, &["payment-methods", id, "attach"])?
            .json(params);
        self.send(request).await
    }

    #[instrument(skip(self, params), fields(account = %account_id))]
    async fn create_customer(
        &self,
        account_id: &str,
        params: &CustomerCreateParams,
    ) -> PaymentResult<Customer> {
        let request = self
            .request(Method::POST, account_id, &["customers"])?
            .json(params);
        let customer: Customer = self.send(request).await?;

        info!("Created customer: id={}", customer.id);
        Ok(customer)
    }

    #[instrument(skip(self, params), fields(account = %account_id, customer = %params.customer_id))]
    async fn create_subscription(
        &self,
        account_id: &str,
        params: &SubscriptionCreateParams,
    ) -> PaymentResult<Subscription> {
        let request = self
            .request(Method::POST, account_id, &["subscriptions"])?
            .json(params);
        let subscription: Subscription = self.send(request).await?;

        info!("Created subscription: id={}", subscription.id);
        Ok(subscription)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// Error classification
// =============================================================================

/// `{"statusCode": 400, "message": "...", "error": "Bad Request"}`;
/// validation failures carry a list of messages instead of a string.
#[derive(Debug, Deserialize)]
struct TilledErrorResponse {
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

fn message_text(message: Value) -> String {
    match message {
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

fn classify_error(status: u16, body: &str) -> PaymentError {
    let message = serde_json::from_str::<TilledErrorResponse>(body)
        .ok()
        .and_then(|e| e.message.map(message_text).or(e.error))
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body));

    if message == DUPLICATE_CARD_MESSAGE {
        return PaymentError::DuplicatePaymentMethod { message };
    }

    PaymentError::ProviderError {
        provider: PROVIDER.to_string(),
        status,
        message,
    }
}
