/**
 * Routes Module
 * API route handlers
 */
use serde::Serialize;

pub mod admin;
pub mod client;
pub mod health;

/// Error response shared by every surface.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
