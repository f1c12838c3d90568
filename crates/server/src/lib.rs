//! Gallery API server library.
//!
//! This crate provides the HTTP API as a library so the router and services
//! can be exercised by tests without starting the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
