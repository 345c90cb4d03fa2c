//! Modules layer - Infrastructure components for external integrations
//!
//! Contains the relational case store and the remote media store.

pub mod storage;
pub mod store;
