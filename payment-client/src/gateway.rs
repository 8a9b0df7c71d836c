use api_client::models::payment::GatewayInfo;
use api_client::ApiClient;
use service_core::error::AppError;
use uuid::Uuid;

pub const NO_GATEWAY_MESSAGE: &str = "No payment gateway configured for this invoice";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load payment options";

/// The payment gateway an invoice owner has configured.
///
/// This is the only place gateway names are compared as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gateway {
    Stripe {
        publishable_key: Option<String>,
        display_name: String,
    },
    PayPal {
        client_id: Option<String>,
        display_name: String,
    },
    Unsupported(String),
}

impl Gateway {
    pub fn from_info(info: &GatewayInfo) -> Self {
        let display_name = |fallback: &str| {
            info.gateway_display_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        match info.gateway_name.trim().to_ascii_lowercase().as_str() {
            "stripe" => Gateway::Stripe {
                publishable_key: non_blank(info.publishable_key.as_deref()),
                display_name: display_name("Stripe"),
            },
            "paypal" => Gateway::PayPal {
                client_id: non_blank(info.client_id.as_deref()),
                display_name: display_name("PayPal"),
            },
            _ => Gateway::Unsupported(info.gateway_name.clone()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Gateway::Stripe { .. } => "stripe",
            Gateway::PayPal { .. } => "paypal",
            Gateway::Unsupported(name) => name,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Gateway::Stripe { display_name, .. } | Gateway::PayPal { display_name, .. } => {
                display_name
            }
            Gateway::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Gateway::Unsupported(_))
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn unsupported_message(name: &str) -> String {
    format!("The payment method {} is not supported yet.", name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayAvailability {
    NotConfigured,
    Available(Gateway),
}

impl GatewayAvailability {
    /// Message to show instead of a payment form, if any.
    pub fn blocking_message(&self) -> Option<String> {
        match self {
            GatewayAvailability::NotConfigured => Some(NO_GATEWAY_MESSAGE.to_string()),
            GatewayAvailability::Available(Gateway::Unsupported(name)) => {
                Some(unsupported_message(name))
            }
            GatewayAvailability::Available(_) => None,
        }
    }
}

/// Decides which gateway, if any, to present for an invoice.
#[derive(Clone)]
pub struct GatewayResolver {
    api: ApiClient,
}

impl GatewayResolver {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Two calls: the cheap `gateway-check`, then the gateway details only
    /// if one exists. Errors are returned as is; nothing is retried.
    pub async fn resolve(&self, invoice_id: Uuid) -> Result<GatewayAvailability, AppError> {
        let payments = self.api.payments();

        let check = payments.check_invoice_gateway(invoice_id).await?;
        if !check.has_gateway {
            tracing::info!(invoice_id = %invoice_id, "Invoice has no payment gateway");
            return Ok(GatewayAvailability::NotConfigured);
        }

        let info = payments.get_invoice_payment_gateway(invoice_id).await?;
        if info.gateway_name.trim().is_empty() {
            tracing::warn!(invoice_id = %invoice_id, "Gateway check passed but no gateway name returned");
            return Ok(GatewayAvailability::NotConfigured);
        }

        let gateway = Gateway::from_info(&info);
        tracing::info!(invoice_id = %invoice_id, gateway = gateway.name(), "Resolved payment gateway");
        Ok(GatewayAvailability::Available(gateway))
    }
}
