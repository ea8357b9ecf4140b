//! Request and Response models for the local vault API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::CredentialsRequest;
pub use responses::{
    CollectionResponse, ErrorResponse, HealthResponse, QuantityResponse, RemoveResponse,
    SessionResponse, StatsResponse,
};
