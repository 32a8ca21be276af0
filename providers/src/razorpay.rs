//! Razorpay orders API.

use farmlink_core::environment::{BoxFuture, GatewayOrder, OrderRequest, PaymentGateway};
use farmlink_core::{GatewayError, MinorUnits};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default API base.
pub const DEFAULT_API_URL: &str = "https://api.razorpay.com/v1";

/// Key id and secret for HTTP basic auth.
#[derive(Clone)]
pub struct RazorpayCredentials {
    /// Public key id (`rzp_live_...` / `rzp_test_...`)
    pub key_id: String,
    /// Key secret
    pub key_secret: String,
}

impl fmt::Debug for RazorpayCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RazorpayCredentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    payment_capture: u8,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    description: String,
}

/// [`PaymentGateway`] backed by the Razorpay orders endpoint.
///
/// ```no_run
/// use farmlink_providers::{build_client, RazorpayCredentials, RazorpayGateway};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = RazorpayGateway::new(
///     build_client(Duration::from_secs(10))?,
///     "https://api.razorpay.com/v1",
///     Some(RazorpayCredentials {
///         key_id: "rzp_test_123".to_string(),
///         key_secret: "secret".to_string(),
///     }),
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RazorpayGateway {
    client: Client,
    api_url: String,
    credentials: Option<RazorpayCredentials>,
}

impl RazorpayGateway {
    /// Create a gateway client. Without credentials every order fails with
    /// [`GatewayError::NotConfigured`].
    #[must_use]
    pub fn new(client: Client, api_url: &str, credentials: Option<RazorpayCredentials>) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    async fn post_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let credentials = self.credentials.as_ref().ok_or(GatewayError::NotConfigured)?;

        let response = self
            .client
            .post(format!("{}/orders", self.api_url))
            .basic_auth(&credentials.key_id, Some(&credentials.key_secret))
            .json(&CreateOrderBody {
                amount: request.amount.get(),
                currency: &request.currency,
                receipt: &request.receipt,
                payment_capture: 1,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Request(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|parsed| parsed.error.description)
                .unwrap_or(body);
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.without_url().to_string()))?;
        if order.id.is_empty() {
            return Err(GatewayError::InvalidResponse("order id missing".to_string()));
        }

        Ok(GatewayOrder {
            id: order.id,
            amount: MinorUnits::new(order.amount),
            currency: order.currency,
        })
    }
}

impl PaymentGateway for RazorpayGateway {
    fn create_order(&self, request: OrderRequest) -> BoxFuture<'_, Result<GatewayOrder, GatewayError>> {
        Box::pin(async move {
            let result = self.post_order(&request).await;
            match &result {
                Ok(order) => tracing::info!(order_id = %order.id, amount = %order.amount, "Gateway order created"),
                Err(e) => tracing::warn!(receipt = %request.receipt, error = %e, "Gateway order failed"),
            }
            result
        })
    }
}
