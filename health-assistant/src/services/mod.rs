pub mod assistant;
pub mod metrics;
pub mod prompt;
pub mod providers;
pub mod store;

pub use assistant::HealthAssistant;
pub use store::{BiometricStore, InMemoryBiometricStore, MongoBiometricStore, StoreError};
