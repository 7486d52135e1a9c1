//! # todo-core
//!
//! Domain types shared by the task store and its front-ends.
//!
//! Everything in this crate is pure: no I/O, no storage. The store in
//! `todo-store` translates these types to and from SQL rows; front-ends
//! build them from user input and render them back.

#![deny(unsafe_code)]

pub mod errors;
pub mod timestamp;
pub mod types;

pub use errors::ValidationError;
pub use timestamp::Timestamp;
pub use types::*;
