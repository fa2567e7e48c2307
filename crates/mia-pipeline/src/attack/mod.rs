//! Shadow-model membership inference attack.
//!
//! # Modules
//!
//! - [`partition`] — disjoint target/shadow index pools
//! - [`extract`] — membership-labelled confidence vectors from a trained model
//! - [`shadow`] — target and shadow model runs
//! - [`balance`] — member/non-member rebalancing
//! - [`classifier`] — per-class attack models and their report
//! - [`store`] — safetensors persistence of attack data
//! - [`pipeline`] — end-to-end and attack-only runs

pub mod balance;
pub mod classifier;
pub mod extract;
pub mod partition;
pub mod pipeline;
pub mod shadow;
pub mod store;
