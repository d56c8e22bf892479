//! Model Context Protocol (MCP) JSON-RPC handling
//!
//! Provides request validation, method routing, and envelope formatting.

pub mod rpc;
pub mod server;
