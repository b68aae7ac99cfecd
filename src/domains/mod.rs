//! Domains module containing business logic organized by bounded contexts.
//!
//! Each subdomain represents a specific area of functionality. Today there is
//! a single one, uniform resource access.

pub mod resources;
