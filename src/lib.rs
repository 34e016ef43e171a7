//! Markdown documentation rendering: anchored headings, highlighted code,
//! outlines and reader-side affordances over a headless HTML tree.

pub mod application;
pub mod cache;
pub mod client;
pub mod config;
pub mod dom;
pub mod domain;
pub mod infra;
pub mod presentation;
