//! Contact-form and waitlist endpoints.

pub mod handlers;
