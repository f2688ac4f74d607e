//! Application state for the storefront

use std::sync::Arc;

use aws_sdk_sesv2::Client as SesClient;
use sqlx::PgPool;

use crate::auth::AdminCredentials;
use crate::config::{Config, EmailBackend};
use crate::db::{OrderStore, PgStore};
use crate::email::{LogMailer, Mailer, SesMailer};
use crate::stripe::{PaymentGateway, StripeGateway};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Hosted checkout settings
#[derive(Debug, Clone, Default)]
pub struct CheckoutSettings {
    /// Public origin; falls back to forwarded/host headers when unset
    pub site_url: Option<String>,
    pub shipping_countries: Vec<String>,
    pub shipping_rate_id: Option<String>,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub payments: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
    /// Stripe webhook signing secret
    pub webhook_secret: String,
    pub admin: AdminCredentials,
    pub checkout: CheckoutSettings,
    /// Operator inbox for new-order notices
    pub admin_email: Option<String>,
}

impl AppState {
    /// Create a new AppState
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let mailer: Arc<dyn Mailer> = match (config.email_backend, &config.email_from) {
            (EmailBackend::Ses, Some(from)) => {
                let aws_config =
                    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                let ses = if let Some(region) = &config.ses_region {
                    let ses_config = aws_config
                        .to_builder()
                        .region(aws_config::Region::new(region.clone()))
                        .build();
                    SesClient::new(&ses_config)
                } else {
                    SesClient::new(&aws_config)
                };
                Arc::new(SesMailer::new(ses, from.clone()))
            }
            _ => {
                tracing::warn!("Email backend is log-only, no email will be delivered");
                Arc::new(LogMailer)
            }
        };

        Ok(Self {
            store: Arc::new(PgStore::new(pool)),
            payments: Arc::new(StripeGateway::new(
                config.stripe_secret_key.clone(),
                config.stripe_api_base.clone(),
            )),
            mailer,
            webhook_secret: config.stripe_webhook_secret.clone(),
            admin: AdminCredentials {
                user: config.admin_user.clone(),
                password: config.admin_password.clone(),
            },
            checkout: CheckoutSettings {
                site_url: config.site_url.clone(),
                shipping_countries: config.shipping_countries.clone(),
                shipping_rate_id: config.stripe_shipping_rate_id.clone(),
            },
            admin_email: config.admin_email.clone(),
        })
    }
}
