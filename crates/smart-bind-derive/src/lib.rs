//! Procedural macros for `smart-bind`.
//!
//! All macros in this crate are re-exported from the `smart-bind` crate. See its docs for more details
//! and the examples of usage.

// Documentation settings
#![doc(html_root_url = "https://docs.rs/smart-bind-derive/0.1.0")]
// General settings
#![recursion_limit = "128"]
// Linter settings
#![allow(missing_docs)] // Adding docs here would interfere with docs in the main crate

extern crate proc_macro;

use proc_macro::TokenStream;

mod bind;
mod rules;
mod utils;

#[proc_macro_derive(Bind, attributes(bind))]
pub fn bind(input: TokenStream) -> TokenStream {
    bind::impl_bind(input)
}
