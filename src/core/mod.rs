//! Core primitives for commit integrity enforcement.
//!
//! Leaf-first: path/name validation, then the installer, token store,
//! and settings seal built on top. Stage orchestration lives in
//! [`crate::stages`].

pub mod audit;
pub mod config;
pub mod error;
pub mod git;
pub mod installer;
pub mod output;
pub mod paths;
pub mod runner;
pub mod token;
