//! Authentication: credential hashing, token issuance/verification,
//! request throttling, and the signup/login endpoints.

pub mod handlers;
pub mod password;
pub mod rate_limit;
pub mod token;

pub use rate_limit::{client_key, RateLimitDecision, RateLimiter};
pub use token::{extract_token, Claims, TokenService};
