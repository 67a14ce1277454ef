//! wattch — terminal client for a home power-monitoring backend.
//!
//! The binary polls the backend's JSON API and renders a live terminal
//! dashboard (aggregate stats, power-share chart, device list, activity
//! feed), with one-shot subcommands for scripting and a built-in demo
//! backend for running without a deployment.

pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod demo;
pub mod filter;
pub mod model;
pub mod render;
pub mod stats;
