//! Domains module containing business logic organized by bounded contexts.
//!
//! - **discovery**: Builds the tool/prompt/resource catalog from module sources
//! - **gateway**: Routes qualified tool calls to namespace handlers

pub mod discovery;
pub mod gateway;
