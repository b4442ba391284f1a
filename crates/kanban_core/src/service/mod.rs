//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the kanban operation set.
//! - Keep the facade decoupled from storage details.

pub mod kanban_service;
