//! Remote store access.
//!
//! `RemoteStore` is the seam to the authoritative prescription service.
//! `ApiClient` implements it over the service's HTTP JSON gateway.

pub mod client;
pub mod error;
pub mod remote;

pub use client::ApiClient;
pub use error::ApiError;
pub use remote::RemoteStore;
