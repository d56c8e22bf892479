//! HTTP transport layer
//!
//! Provides the `/mcp` listener and the public status endpoints.

pub mod handlers;
