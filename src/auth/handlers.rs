use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::auth::rate_limit::{client_key, RateLimitDecision};
use crate::auth::{password, token::Claims};
use crate::error::ApiError;
use crate::store::{Account, StoreError, UserView};
use crate::validate::{required_email, required_text, validate_body, FieldError, Validate};
use crate::AppState;

const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 128;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug)]
pub struct SignupPayload {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Validate for SignupRequest {
    type Output = SignupPayload;

    fn validate(self) -> Result<SignupPayload, Vec<FieldError>> {
        let mut errors = Vec::new();
        let email = required_email(self.email, "email", &mut errors);
        let password = validate_password(self.password, &mut errors);
        let name = required_text(self.name, "name", 100, &mut errors);

        if errors.is_empty() {
            Ok(SignupPayload {
                email,
                password,
                name,
            })
        } else {
            Err(errors)
        }
    }
}

fn validate_password(value: Option<String>, errors: &mut Vec<FieldError>) -> String {
    // Not trimmed: leading or trailing spaces are part of the password.
    match value {
        Some(v) if v.is_empty() => {
            errors.push(FieldError::new("password", "password is required"));
            String::new()
        }
        Some(v) if v.len() < PASSWORD_MIN_LEN => {
            errors.push(FieldError::new(
                "password",
                format!("password must be at least {} characters", PASSWORD_MIN_LEN),
            ));
            String::new()
        }
        Some(v) if v.len() > PASSWORD_MAX_LEN => {
            errors.push(FieldError::new(
                "password",
                format!("password must be at most {} characters", PASSWORD_MAX_LEN),
            ));
            String::new()
        }
        Some(v) => v,
        None => {
            errors.push(FieldError::new("password", "password is required"));
            String::new()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    type Output = LoginPayload;

    fn validate(self) -> Result<LoginPayload, Vec<FieldError>> {
        let mut errors = Vec::new();
        let email = required_email(self.email, "email", &mut errors);
        let password = match self.password {
            Some(v) if !v.is_empty() => v,
            _ => {
                errors.push(FieldError::new("password", "password is required"));
                String::new()
            }
        };

        if errors.is_empty() {
            Ok(LoginPayload { email, password })
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
}

pub async fn signup(
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
        .check("signup", &client, state.config.rate_limit.signup)
        .await
    {
        return Err(ApiError::RateLimited {
            limit,
            retry_after_secs,
            reset,
        });
    }

    let payload = validate_body::<SignupRequest>(&body)?;

    let password_hash = password::hash(&payload.password)?;
    let account = Account::new(payload.email, password_hash, payload.name);

    // The store's unique index on email is the uniqueness check; a
    // concurrent signup with the same email loses here, not at a pre-query.
    match state.store.insert_account(&account).await {
        Ok(()) => {}
        Err(StoreError::Duplicate) => {
            return Err(ApiError::Conflict("User already exists".into()))
        }
        Err(e) => return Err(e.into()),
    }

    let token = state.tokens.issue(&account)?;
    info!(email = %account.email, "account created");

    Ok(HttpResponse::Created().json(AuthResponse {
        user: UserView::from(&account),
        token,
    }))
}

pub async fn login(
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
        .check("login", &client, state.config.rate_limit.login)
        .await
    {
        return Err(ApiError::RateLimited {
            limit,
            retry_after_secs,
            reset,
        });
    }

    let payload = validate_body::<LoginRequest>(&body)?;

    // Unknown email and wrong password take the same exit.
    let account = state
        .store
        .find_account_by_email(&payload.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !password::verify(&payload.password, &account.password_hash) {
        info!(email = %payload.email, "login rejected");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.tokens.issue(&account)?;
    info!(email = %account.email, "login succeeded");

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: UserView::from(&account),
        token,
    }))
}

/// Identity check for a bearer token, used by the front end to restore a
/// session without a server-side lookup.
pub async fn me(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let claims: Claims = crate::auth::token::extract_token(header)
        .and_then(|t| state.tokens.verify(t))
        .ok_or(ApiError::InvalidCredentials)?;

    Ok(HttpResponse::Ok().json(json!({
        "user": {
            "id": claims.sub,
            "email": claims.email,
            "name": claims.name,
        }
    })))
}
