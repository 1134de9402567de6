//! Business logic services.
//!
//! - `auth` - Admin login and account management
//! - `backend` - Support-request backend proxy
//! - `paystack` - Payment gateway client

pub mod auth;
pub mod backend;
pub mod paystack;

pub use auth::{AdminAuthService, AuthError};
pub use backend::{
    BackendClient, BackendError, FailurePolicy, ForwardBody, ProxyResponse, UpstreamAuth,
};
pub use paystack::{PaymentError, PaystackClient};
