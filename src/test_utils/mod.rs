//! Shared test utilities for the e-st meter exporter.
//!
//! Scripted browser doubles, saved portal pages, chart payloads and config
//! builders used by the unit tests across the crate.

#![cfg(test)]

pub mod config;
pub mod fixtures;
pub mod html;
pub mod mocks;
