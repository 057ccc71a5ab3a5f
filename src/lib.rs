pub mod abi;
pub mod cli;
pub mod commands;
pub mod config;
pub mod contracts;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod rpc;
pub mod signer;
pub mod tx_builder;
