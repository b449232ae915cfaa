//! FurEver Home adoption workflow engine.
//!
//! The library owns the lifecycle of pets surrendered for adoption and the
//! applications users submit to adopt them. Persistence and authentication
//! are external concerns reached through the ports in
//! [`workflows::adoption::repository`] and [`workflows::accounts::provider`];
//! the service facades here read current state, decide, and write back.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
