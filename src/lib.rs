//! Whalefall presentation server.
//!
//! Renders the blog's page shells and exposes same-origin JSON routes that
//! proxy reads to an external blog backend, normalizing its responses.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
