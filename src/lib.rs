//! Stride onboarding: step progress, critical-data saves, and resume.

pub mod api;
pub mod config;
pub mod error;
pub mod identity;
pub mod onboarding;
pub mod store;
