//! Lectern Application Library
//!
//! This library provides the application modules for the Lectern book
//! catalog service.

pub mod modules;
