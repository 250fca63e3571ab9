//! Scripts for deploying and upgrading EIP-2535 diamond proxies.
//!
//! A diamond is deployed by [`deployer::DiamondDeployer`], which sequences
//! the contract deployments and wires the facets into the proxy with a single
//! collision-checked `diamondCut`.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod calldata;
pub mod cli;
pub mod client;
mod commands;
pub mod config;
pub mod constants;
pub mod cut;
pub mod deployer;
pub mod errors;
pub mod events;
pub mod selectors;
pub mod types;
pub mod utils;
