//! # Tabula
//!
//! Library half of the Tabula binary: axiom document loading and the CLI
//! commands, exposed so integration tests can drive them without a
//! subprocess.
//!
//! All reasoning happens in `tabula-core`; this crate only reads files,
//! resolves configuration and prints answers.

pub mod cli;
pub mod document;
