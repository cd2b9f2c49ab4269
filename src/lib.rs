//! `redprobe` - Attack simulation and adjudication engine
//!
//! This library provides components for simulating network and
//! application-layer attacks against research targets, assessing the
//! resulting threat, and adjudicating a block/allow decision.

pub mod adjudicate;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod probe;
pub mod run;
