//! Property listings for the staff dashboard.

pub mod filter;
pub mod form;
pub mod model;
pub mod service;

pub use filter::{PropertyFilter, StatusCounts};
pub use form::{PropertyForm, slugify};
pub use model::{Property, PropertyStatus};
pub use service::ListingService;
