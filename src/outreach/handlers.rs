use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::rate_limit::{client_key, RateLimitDecision};
use crate::error::ApiError;
use crate::store::{ContactSubmission, WaitlistEntry};
use crate::validate::{
    optional_text, required_email, required_text, validate_body, FieldError, Validate,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl Validate for ContactRequest {
    type Output = ContactPayload;

    fn validate(self) -> Result<ContactPayload, Vec<FieldError>> {
        let mut errors = Vec::new();
        let name = required_text(self.name, "name", 100, &mut errors);
        let email = required_email(self.email, "email", &mut errors);
        let subject = required_text(self.subject, "subject", 200, &mut errors);
        let message = required_text(self.message, "message", 5000, &mut errors);

        if errors.is_empty() {
            Ok(ContactPayload {
                name,
                email,
                subject,
                message,
            })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub source: Option<String>,
}

pub struct WaitlistPayload {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub source: Option<String>,
}

impl Validate for WaitlistRequest {
    type Output = WaitlistPayload;

    fn validate(self) -> Result<WaitlistPayload, Vec<FieldError>> {
        let mut errors = Vec::new();
        let email = required_email(self.email, "email", &mut errors);
        let first_name = optional_text(self.first_name, "firstName", 100, &mut errors);
        let last_name = optional_text(self.last_name, "lastName", 100, &mut errors);
        let source = optional_text(self.source, "source", 100, &mut errors);

        if errors.is_empty() {
            Ok(WaitlistPayload {
                email,
                first_name,
                last_name,
                source,
            })
        } else {
            Err(errors)
        }
    }
}

pub async fn contact_submit(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let client = client_key(&req);
    if let RateLimitDecision::Limited {
        limit,
        retry_after_secs,
        reset,
    } = state
        .rate_limiter
        .check("contact", &client, state.config.rate_limit.contact)
        .await
    {
        return Err(ApiError::RateLimited {
            limit,
            retry_after_secs,
            reset,
        });
    }

    let payload = validate_body::<ContactRequest>(&body)?;
    let submission = ContactSubmission::new(
        payload.name,
        payload.email,
        payload.subject,
        payload.message,
    );

    state.store.insert_contact(&submission).await?;
    info!(id = %submission.id, "contact submission stored");

    // Best effort: the submission is already persisted.
    if let Err(e) = state.notifier.contact_received(&submission).await {
        warn!(id = %submission.id, "contact notification failed: {}", e);
    }

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Thank you for reaching out! We'll get back to you soon.",
        "id": submission.id,
    })))
}

pub async fn waitlist_subscribe(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let client = client_key(&req);
    if let RateLimitDecision::Limited {
        limit,
        retry_after_secs,
        reset,
    } = state
        .rate_limiter
        .check("waitlist", &client, state.config.rate_limit.waitlist)
        .await
    {
        return Err(ApiError::RateLimited {
            limit,
            retry_after_secs,
            reset,
        });
    }

    let payload = validate_body::<WaitlistRequest>(&body)?;
    let entry = WaitlistEntry::new(
        payload.email,
        payload.first_name,
        payload.last_name,
        payload.source,
    );

    state.store.insert_waitlist(&entry).await?;
    info!(id = %entry.id, "waitlist entry stored");

    if let Err(e) = state.notifier.waitlist_subscribed(&entry).await {
        warn!(id = %entry.id, "waitlist notification failed: {}", e);
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Welcome! Check your email for the Innovation Roadmap PDF.",
        "email": entry.email,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_requires_all_fields() {
        let errors = ContactRequest {
            name: None,
            email: Some("a@x.com".into()),
            subject: Some("".into()),
            message: None,
        }
        .validate()
        .unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "subject", "message"]);
    }

    #[test]
    fn waitlist_optional_fields_collapse() {
        let payload = WaitlistRequest {
            email: Some(" A@X.com ".into()),
            first_name: Some("  ".into()),
            last_name: None,
            source: Some(" launch-page ".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(payload.email, "a@x.com");
        assert_eq!(payload.first_name, None);
        assert_eq!(payload.source, Some("launch-page".into()));
    }
}
