//! Midibot Common Library
//!
//! Shared constants, primitive types and configuration loading used by every
//! crate in the midibot workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Numeric limits and protocol constants
//! - [`config`] - Configuration loading traits and types
//! - [`note`] - Note identifiers and note events
//! - [`axis`] - Axis identifiers, bounds and travel direction
//! - [`sink`] - Command sink contract
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use midibot_common::prelude::*;
//!
//! let a4 = NoteId::new(69).unwrap();
//! assert_eq!(a4.get(), 69);
//! ```

pub mod axis;
pub mod config;
pub mod consts;
pub mod note;
pub mod prelude;
pub mod sink;
