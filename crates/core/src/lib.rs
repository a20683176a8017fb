//! Ecommerce Store Core - Shared domain types.
//!
//! This crate provides the types used across all store components:
//! - `server` - REST API for products, auth, carts and orders
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. The order status state machine lives here so that every
//! caller agrees on which transitions are legal.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, quantities, order numbers,
//!   statuses, roles and usernames

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
