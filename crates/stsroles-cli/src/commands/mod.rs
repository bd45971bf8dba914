//! CLI command implementations.

pub mod operator_roles;
