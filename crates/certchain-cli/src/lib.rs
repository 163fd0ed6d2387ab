//! # certchain-cli: Command-Line Interface
//!
//! Provides the `certchain` binary.
//!
//! ## Subcommands
//!
//! - `certchain address <FILE>`: content id of a file.
//! - `certchain commit <FILE>`: commitment for a file and its metadata.
//! - `certchain issue <FILE> --owner <ADDR>`: upload, publish and confirm.
//! - `certchain publish|confirm <ID> --owner <ADDR>`: advance one step.
//! - `certchain verify <ID>`: recompute and cross-check against the ledger.
//! - `certchain status <ID>`: record and effective status.
//! - `certchain list --owner <ADDR>`: an owner's certificates.
//! - `certchain link <ID> [--qr FILE]`: public share link and QR code.
//!
//! ```bash
//! certchain issue diploma.pdf --owner 0xA11CE --name "BSc Physics" --issued-to Ada
//! certchain verify 6f1c1f0e-4d5e-4a8b-9c3d-2b1a0f9e8d7c
//! ```

pub mod commands;
pub mod config;
pub mod workspace;
