// ============================================================================
// RTO Infrastructure - GOV.UK Notify Client
// File: crates/rto-infrastructure/src/notify/govuk.rs
// ============================================================================

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use rto_core::error::DomainError;
use rto_core::notifications::{Notification, NotificationTemplate, Notifier};
use rto_shared::config::NotifySettings;
use rto_shared::utils::mask_email;

/// Length of the service id and of the secret, both UUIDs.
const UUID_LEN: usize = 36;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid Notify API key")]
    InvalidApiKey,

    #[error("No template configured for {0}")]
    MissingTemplate(&'static str),

    #[error("Failed to sign Notify token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Notify request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notify rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<NotifyError> for DomainError {
    fn from(err: NotifyError) -> Self {
        DomainError::NotificationError(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct NotifyClaims<'a> {
    iss: &'a str,
    iat: i64,
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    email_address: &'a str,
    template_id: &'a str,
    personalisation: &'a std::collections::BTreeMap<String, String>,
}

/// Sends emails through the GOV.UK Notify v2 API.
pub struct GovUkNotifyClient {
    http: reqwest::Client,
    base_url: String,
    service_id: String,
    key: EncodingKey,
    templates: HashMap<NotificationTemplate, String>,
    unconfigured: Vec<NotificationTemplate>,
}

impl GovUkNotifyClient {
    pub fn new(settings: &NotifySettings) -> Result<Self, NotifyError> {
        let (service_id, secret) = split_api_key(&settings.api_key)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        let t = &settings.templates;
        let ids = [
            (NotificationTemplate::BookingConfirmation, &t.booking_confirmation),
            (NotificationTemplate::BookingCancellation, &t.booking_cancellation),
            (
                NotificationTemplate::PraStaffMemberApprovalRequest,
                &t.pra_staff_member_approval_request,
            ),
            (
                NotificationTemplate::PraRejectedWithoutApproval,
                &t.pra_rejected_without_approval,
            ),
            (NotificationTemplate::PraDecision, &t.pra_decision),
            (NotificationTemplate::PraScsApprovalRequest, &t.pra_scs_approval_request),
        ];

        let mut templates = HashMap::new();
        let mut unconfigured = Vec::new();
        for (template, id) in ids {
            if id.trim().is_empty() {
                unconfigured.push(template);
            } else {
                templates.insert(template, id.clone());
            }
        }

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            service_id: service_id.to_string(),
            key: EncodingKey::from_secret(secret.as_bytes()),
            templates,
            unconfigured,
        })
    }

    /// Templates with a blank ID in the settings; sending them always fails.
    pub fn unconfigured_templates(&self) -> &[NotificationTemplate] {
        &self.unconfigured
    }

    fn bearer_token(&self) -> Result<String, NotifyError> {
        let claims = NotifyClaims {
            iss: &self.service_id,
            iat: Utc::now().timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.key)?)
    }

    async fn send_email(&self, notification: &Notification) -> Result<(), NotifyError> {
        let template_id = self
            .templates
            .get(&notification.template)
            .ok_or(NotifyError::MissingTemplate(notification.template.as_str()))?;

        let body = SendEmailRequest {
            email_address: &notification.email_address,
            template_id,
            personalisation: &notification.personalisation,
        };

        debug!(
            "Sending {} to {}",
            notification.template.as_str(),
            mask_email(&notification.email_address)
        );

        let response = self
            .http
            .post(format!("{}/v2/notifications/email", self.base_url))
            .bearer_auth(self.bearer_token()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!("Notify returned {}: {}", status, body);
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Notifier for GovUkNotifyClient {
    async fn send(&self, notification: &Notification) -> Result<(), DomainError> {
        self.send_email(notification).await.map_err(DomainError::from)
    }
}

/// Splits `{key_name}-{service_id}-{secret}` into service id and secret.
fn split_api_key(api_key: &str) -> Result<(&str, &str), NotifyError> {
    let len = api_key.len();
    if len < 2 * UUID_LEN + 1 || !api_key.is_ascii() {
        return Err(NotifyError::InvalidApiKey);
    }
    let secret = &api_key[len - UUID_LEN..];
    let service_id = &api_key[len - 2 * UUID_LEN - 1..len - UUID_LEN - 1];
    if &api_key[len - UUID_LEN - 1..len - UUID_LEN] != "-" {
        return Err(NotifyError::InvalidApiKey);
    }
    Ok((service_id, secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use rto_shared::config::NotifyTemplates;
    use serde::Deserialize;
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SERVICE_ID: &str = "26785a09-ab16-4eb0-8407-a37497a57506";
    const SECRET: &str = "3d844edf-8d35-48ac-975b-e847b4f122b0";

    fn settings(base_url: &str) -> NotifySettings {
        NotifySettings {
            enabled: true,
            api_key: format!("rto_test-{}-{}", SERVICE_ID, SECRET),
            base_url: base_url.to_string(),
            timeout_seconds: 5,
            templates: NotifyTemplates {
                booking_confirmation: "booking-confirmation-id".into(),
                booking_cancellation: "".into(),
                pra_staff_member_approval_request: "7c663f35-276c-4737-91c5-c0f4b02122bb".into(),
                pra_rejected_without_approval: "72760c96-cc22-4a55-89c0-b5d9dcd6a8ab".into(),
                pra_decision: "3c4dfc7b-d978-4268-9c2e-517a41c24b64".into(),
                pra_scs_approval_request: "9bae5273-ff86-43fd-b67b-1abdc0bea513".into(),
            },
        }
    }

    #[test]
    fn test_split_api_key() {
        let key = format!("my-key-name-{}-{}", SERVICE_ID, SECRET);
        assert_eq!(split_api_key(&key).unwrap(), (SERVICE_ID, SECRET));
        assert!(matches!(split_api_key("short"), Err(NotifyError::InvalidApiKey)));
    }

    #[test]
    fn test_bearer_token_is_signed_with_secret() {
        #[derive(Deserialize)]
        struct Claims {
            iss: String,
            iat: i64,
        }

        let client = GovUkNotifyClient::new(&settings("http://localhost")).unwrap();
        let token = client.bearer_token().unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &validation,
        )
        .unwrap();

        assert_eq!(data.claims.iss, SERVICE_ID);
        assert!((Utc::now().timestamp() - data.claims.iat).abs() < 5);
    }

    #[tokio::test]
    async fn test_send_posts_template_and_personalisation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/notifications/email"))
            .and(header_exists("authorization"))
            .and(body_partial_json(serde_json::json!({
                "email_address": "line.manager@example.com",
                "template_id": "3c4dfc7b-d978-4268-9c2e-517a41c24b64",
                "personalisation": { "role": "staff member", "action": "approved" }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": "n-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GovUkNotifyClient::new(&settings(&server.uri())).unwrap();
        let notification = Notification::new(
            "line.manager@example.com",
            NotificationTemplate::PraDecision,
        )
        .with("role", "staff member")
        .with("action", "approved");

        client.send(&notification).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_maps_rejection_to_notification_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/notifications/email"))
            .respond_with(ResponseTemplate::new(400).set_body_string("BadRequestError"))
            .mount(&server)
            .await;

        let client = GovUkNotifyClient::new(&settings(&server.uri())).unwrap();
        let notification =
            Notification::new("a@example.com", NotificationTemplate::BookingConfirmation);

        let err = client.send(&notification).await.unwrap_err();
        match err {
            DomainError::NotificationError(message) => assert!(message.contains("400")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_template_is_not_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = GovUkNotifyClient::new(&settings(&server.uri())).unwrap();
        assert_eq!(
            client.unconfigured_templates(),
            &[NotificationTemplate::BookingCancellation]
        );
        let notification =
            Notification::new("a@example.com", NotificationTemplate::BookingCancellation);

        assert!(matches!(
            client.send(&notification).await,
            Err(DomainError::NotificationError(_))
        ));
    }
}
