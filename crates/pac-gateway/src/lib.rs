//! # pac-gateway
//!
//! MCP (Model Context Protocol) gateway for policy-as-code management.
//!
//! Exposes the policy lifecycle as MCP tools an AI agent can call:
//! search the built-in policy catalog, scaffold definition and assignment
//! files, build a deployment plan, review a bounded plan summary, and
//! deploy. External work happens through two binaries resolved fresh per
//! call — the PowerShell automation module and the cloud CLI — driven by
//! `pac-exec` and summarized by `pac-plan`.

pub mod automation;
pub mod config;
pub mod definitions;
pub mod error;
pub mod server;

pub use config::PacConfig;
pub use error::GatewayError;
pub use server::PacGatewayServer;
