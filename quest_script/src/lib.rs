//! # Quest Script
//!
//! The data side of a quest: scenes, dialog steps, declared events and gates,
//! plus loading, validation and engine configuration. This crate holds no
//! navigation state and never talks to widgets.

pub mod config;
pub mod error;
pub mod position;
pub mod script;

pub use config::*;
pub use error::*;
pub use position::*;
pub use script::*;
