//! CfuFlow: cycle-level simulation of synchronous hardware with latency-insensitive interfaces.
//!
//! Every component is a Mealy machine evaluated once per clock tick. A tick is evaluated as a
//! forward sweep (valid and payload signals), a backward sweep (ready signals), and a clock edge
//! where every state latches at once.

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
#![deny(variant_size_differences)]
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::private_doc_tests)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::invalid_rust_codeblocks)]
#![deny(rustdoc::bare_urls)]
// #![deny(single_use_lifetimes)]
#![deny(unreachable_pub)]
// #![deny(unused_lifetimes)]
//
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::type_complexity)]
#![allow(elided_lifetimes_in_paths)]
#![allow(type_alias_bounds)]

mod module;
mod module_fsm;
mod signal;
mod simulator;

pub use cfuflow_macro::Signal;
pub use module::*;
pub use module_fsm::*;
pub use signal::*;
pub use simulator::*;
