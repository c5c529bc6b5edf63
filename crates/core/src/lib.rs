//! Miraki Core - Shared types library.
//!
//! This crate provides the types shared by every Miraki console component:
//! - `console` - Data-access and authorization layer for the admin console
//! - `cli` - Command-line front end over the console library
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! storage, no HTTP clients. Role and permission resolution lives here because
//! it is a pure function of the role.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, permissions, money, and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
