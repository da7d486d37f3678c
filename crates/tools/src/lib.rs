//! `pantry-tools`
//!
//! **Responsibility:** the agent-callable tool surface.
//!
//! Mirrors the HTTP surface as nine named tools so an agent host can drive
//! the same item and stock-update services. The crate is intentionally **not**
//! part of the domain model:
//! - Tools hold no storage; every call dispatches into an injected service.
//! - Arguments carry `ownerId` and `actorName` in the clear. The agent host
//!   authenticates its caller; there is no token handling here.
//! - Results use the same wire shapes the HTTP layer returns, so a host can
//!   swap between the two surfaces without translating payloads.

pub mod items;
pub mod registry;
pub mod stock_updates;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolDef, ToolError};
