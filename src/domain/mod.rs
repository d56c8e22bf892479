//! Tool catalogs served over the MCP protocol
//!
//! Each catalog owns a fixed tool list and the text formatting of its replies.

pub mod catalog;
pub mod soonerstats;
pub mod text;
pub mod wikipedia;
