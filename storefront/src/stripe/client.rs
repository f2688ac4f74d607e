use async_trait::async_trait;

use super::types::{CheckoutSession, LineItem, List};
use super::{CheckoutSessionRequest, CreatedSession, GatewayError, PaymentGateway};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Stripe REST client, form-encoded requests authenticated with the secret key
#[derive(Clone)]
pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>, api_base: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: secret_key.into(),
            api_base: api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    async fn read<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = resp.status();
        if !status.is_success() {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }
}

/// Form fields for `POST /v1/checkout/sessions`
pub(crate) fn session_form(req: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = vec![
        ("mode".into(), "payment".into()),
        ("success_url".into(), req.success_url.clone()),
        ("cancel_url".into(), req.cancel_url.clone()),
        ("phone_number_collection[enabled]".into(), "true".into()),
        ("billing_address_collection".into(), "required".into()),
        ("allow_promotion_codes".into(), "true".into()),
        ("metadata[source]".into(), req.source.clone()),
    ];

    for (i, country) in req.shipping_countries.iter().enumerate() {
        form.push((
            format!("shipping_address_collection[allowed_countries][{i}]"),
            country.clone(),
        ));
    }

    if let Some(rate) = &req.shipping_rate_id {
        form.push(("shipping_options[0][shipping_rate]".into(), rate.clone()));
    }

    for (i, line) in req.lines.iter().enumerate() {
        let p = format!("line_items[{i}]");
        form.push((format!("{p}[quantity]"), line.quantity.to_string()));
        form.push((format!("{p}[price_data][currency]"), req.currency.clone()));
        form.push((
            format!("{p}[price_data][unit_amount]"),
            line.unit_amount.to_string(),
        ));
        form.push((
            format!("{p}[price_data][product_data][name]"),
            line.name.clone(),
        ));
        form.push((
            format!("{p}[price_data][product_data][metadata][productId]"),
            line.product_id.clone(),
        ));
        form.push((
            format!("{p}[price_data][product_data][metadata][size]"),
            line.size.to_string(),
        ));
    }

    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CreatedSession, GatewayError> {
        let resp = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&session_form(request))
            .send()
            .await?;
        let session: CheckoutSession = Self::read(resp).await?;
        let url = session.url.ok_or(GatewayError::MissingField("url"))?;
        Ok(CreatedSession {
            id: session.id,
            url,
        })
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, GatewayError> {
        let resp = self
            .http
            .get(format!("{}/v1/checkout/sessions/{session_id}", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;
        Self::read(resp).await
    }

    async fn list_line_items(&self, session_id: &str) -> Result<Vec<LineItem>, GatewayError> {
        let mut items = Vec::new();
        let mut starting_after: Option<String> = None;
        loop {
            let mut query: Vec<(&str, String)> = vec![
                ("limit", "100".to_string()),
                ("expand[]", "data.price.product".to_string()),
            ];
            if let Some(after) = &starting_after {
                query.push(("starting_after", after.clone()));
            }
            let resp = self
                .http
                .get(format!(
                    "{}/v1/checkout/sessions/{session_id}/line_items",
                    self.api_base
                ))
                .basic_auth(&self.secret_key, None::<&str>)
                .query(&query)
                .send()
                .await?;
            let page: List<LineItem> = Self::read(resp).await?;
            starting_after = page.data.last().map(|li| li.id.clone());
            items.extend(page.data);
            if !page.has_more || starting_after.is_none() {
                break;
            }
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stripe::SessionLine;
    use shared::models::Size;

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            currency: "eur".into(),
            lines: vec![SessionLine {
                product_id: "p1".into(),
                size: Size::M,
                name: "Tee (M)".into(),
                unit_amount: 5000,
                quantity: 2,
            }],
            success_url: "https://shop.test/checkout/success?session_id={CHECKOUT_SESSION_ID}"
                .into(),
            cancel_url: "https://shop.test/checkout/cancel".into(),
            shipping_countries: vec!["LT".into(), "DE".into()],
            shipping_rate_id: Some("shr_1".into()),
            source: "storefront".into(),
        }
    }

    fn get<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_session_form_carries_metadata_and_prices() {
        let form = session_form(&request());
        assert_eq!(get(&form, "mode"), Some("payment"));
        assert_eq!(get(&form, "line_items[0][quantity]"), Some("2"));
        assert_eq!(
            get(&form, "line_items[0][price_data][unit_amount]"),
            Some("5000")
        );
        assert_eq!(
            get(&form, "line_items[0][price_data][product_data][metadata][productId]"),
            Some("p1")
        );
        assert_eq!(
            get(&form, "line_items[0][price_data][product_data][metadata][size]"),
            Some("M")
        );
        assert_eq!(
            get(&form, "shipping_address_collection[allowed_countries][1]"),
            Some("DE")
        );
        assert_eq!(
            get(&form, "shipping_options[0][shipping_rate]"),
            Some("shr_1")
        );
        assert_eq!(get(&form, "metadata[source]"), Some("storefront"));
    }

    #[test]
    fn test_session_form_without_shipping_rate() {
        let mut req = request();
        req.shipping_rate_id = None;
        let form = session_form(&req);
        assert!(get(&form, "shipping_options[0][shipping_rate]").is_none());
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let gw = StripeGateway::new("sk_test", Some("http://localhost:12111/".into()));
        assert_eq!(gw.api_base, "http://localhost:12111");
    }
}
