// src/blockchain/services/mod.rs

pub mod connector;
pub mod lending;
pub mod retry;
pub mod snapshot;
