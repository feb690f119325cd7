//! The tapecat library.
//!
//! Types shared between the catalogue and its clients: who is asking,
//! and how file contents are fingerprinted.

#![deny(
    asm_sub_register,
    deprecated,
    missing_abi,
    unsafe_code,
    unused_macros,
    unused_must_use,
    unused_unsafe
)]
#![deny(clippy::from_over_into, clippy::needless_question_mark)]
#![cfg_attr(
    not(debug_assertions),
    deny(unused_imports, unused_mut, unused_variables,)
)]

pub mod checksum;
pub mod error;
pub mod identity;

pub use error::{TapecatError, TapecatResult};
