// src/blockchain/mod.rs

pub mod address;
pub mod models;
pub mod provider;
pub mod services;
pub mod trongrid;

pub use provider::{ChainProvider, ProviderSlot};
pub use trongrid::TronGridProvider;
