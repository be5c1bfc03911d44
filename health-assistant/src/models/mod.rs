//! Domain models for the health assistant service.

pub mod biometric;
pub mod chat;

pub use biometric::{BiometricDocument, BiometricRecord, Scalar};
pub use chat::{ChatRequest, ChatResponse, ErrorResponse};
