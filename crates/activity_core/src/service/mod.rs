//! Use-case services.
//!
//! # Responsibility
//! - Turn form events into validated store calls.
//! - Keep front ends decoupled from storage details.

pub mod form_controller;
