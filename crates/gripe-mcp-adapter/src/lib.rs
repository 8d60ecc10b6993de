//! Gripe MCP Adapter
//!
//! Exposes the complaint service to AI agents via Model Context Protocol
//! over stdio.

pub mod mcp_protocol;
pub mod server;
pub mod tools;

pub use server::GripeMcpServer;
