//! Cycle-level model of a quantized convolution accelerator datapath.
//!
//! Filter words and per-channel requantization parameters are stored and replayed in step with a
//! systolic array. The array's accumulators are serialized, requantized to 8 bits, and packed four
//! to a 32 bit output word.

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

pub mod accelerator;
pub mod accumulator_reader;
pub mod config;
pub mod constants;
pub mod filter_store;
pub mod output_word_assembler;
pub mod param_store;
pub mod post_process;
pub mod reference;
pub mod session;
pub mod sysarray;
pub mod types;
pub mod workload;

pub use accelerator::{AcceleratorCore, CoreIngress, CoreIngressReady};
pub use config::{ConfigError, CoreConfig};
pub use session::{Session, SessionError};
pub use sysarray::{ComputeArray, SystolicArray};
pub use types::*;
pub use workload::Workload;
