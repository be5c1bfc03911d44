//! health-assistant: answers health questions with the user's latest biometrics.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
