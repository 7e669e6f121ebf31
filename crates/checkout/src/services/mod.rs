//! External service collaborators.

pub mod gateway;

pub use gateway::{GatewayError, PaymentGatewayClient, PaymentSession};
