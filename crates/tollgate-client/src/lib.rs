//! Tollgate Client — the resilient entitlement client every consuming
//! service embeds.
//!
//! A consuming service must not couple its own availability to the
//! entitlement authority's. The client bounds the whole check
//! (attempts plus backoff) by one wall-clock deadline, honors any
//! definitive answer immediately, and fails open when no definitive
//! answer can be obtained.

pub mod client;
pub mod error;
pub mod policy;
pub mod transport;

pub use client::EntitlementClient;
pub use error::{ClientError, TransportError};
pub use policy::RetryPolicy;
pub use transport::{DecisionTransport, HttpTransport};
