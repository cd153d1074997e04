//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engine calls and repository commits into use-case APIs.
//! - Keep CLI and other callers decoupled from storage details.

pub mod campaign_service;
