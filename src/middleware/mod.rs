//! HTTP middleware and request helpers shared by the route handlers.

pub mod ip;
pub mod rate_limit;
pub mod security_headers;
pub mod validation;

pub use rate_limit::EndpointRateLimiter;
