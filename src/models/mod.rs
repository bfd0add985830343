//! Request and Response models for the cache server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{DebugRequest, ExpiredQuery, PutRequest};
pub use responses::{
    DebugResponse, DeleteResponse, ErrorResponse, ExpiredResponse, GetResponse, HasResponse,
    HealthResponse, ImportResponse, MessageResponse, PutResponse, StatsResponse,
};
