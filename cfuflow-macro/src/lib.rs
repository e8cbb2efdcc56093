//! Implementation of proc macros on signal payload types.
//!
//! # Note
//!
//! `#[derive(Signal)]` is only implemented for structs with named fields. Fields are packed in
//! declaration order, the first field occupying the least significant bits.
//!
//! For example, the derived implementation for a parameter record is as follows.
//!
//! ```ignore
//! #[derive(Debug, Clone, Signal)]
//! pub struct Params {
//!     bias: i16,
//!     shift: Bits<4>,
//! }
//!
//! impl Signal for Params {
//!     const WIDTH: usize = 0 + <i16>::WIDTH + <Bits<4>>::WIDTH;
//!     // bits 0..16 hold `bias`, bits 16..20 hold `shift`.
//!     ...
//! }
//! ```
//!
//! The generated code refers to `Signal` unqualified, so the trait must be in scope at the derive
//! site.

mod signal;
mod utils;

use proc_macro::{self, TokenStream};

#[proc_macro_derive(Signal)]
pub fn signal(input: TokenStream) -> TokenStream { signal::derive(input) }
