//! Lightkeeper: back office for a small real-estate brokerage.

pub mod auth;
pub mod backend;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod http;
pub mod listings;
pub mod seller;
pub mod wizard;
