//! HTTP boundary: session extraction, routing, and mapping authorization
//! outcomes to responses.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
