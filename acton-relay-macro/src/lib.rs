/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Acton Relay Macro Library
//!
//! Procedural macros for the Acton Relay actor runtime.
//!
//! # Message Macro
//!
//! [`relay_message`] turns a plain type into a message element that can travel
//! inside an envelope:
//!
//! ```ignore
//! #[relay_message]
//! pub struct Ping;
//!
//! #[relay_message]
//! pub struct Deposit {
//!     pub amount: u64,
//! }
//! ```
//!
//! # Actor Macro
//!
//! [`relay_actor`] prepares a type to be used as the model (private state) of an actor:
//!
//! ```ignore
//! #[relay_actor]
//! pub struct Counter {
//!     count: i32,
//! }
//! ```
//!
//! # Main Entry Point
//!
//! ```ignore
//! use acton_relay::prelude::*;
//!
//! #[relay_main]
//! async fn main() {
//!     let runtime = ActonApp::launch();
//!     // ... spawn actors
//!     runtime.shutdown_all().await.ok();
//! }
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput, ItemFn};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// Options recognised by `#[relay_message(...)]`.
#[derive(Default)]
struct MessageOptions {
    /// Also derive `PartialEq` so tests and handlers can compare elements.
    comparable: bool,
}

/// Options recognised by `#[relay_actor(...)]`.
#[derive(Default)]
struct ActorOptions {
    /// Skip deriving `Default`; the user provides one.
    no_default: bool,
}

fn attribute_flags(attr: &TokenStream) -> Vec<String> {
    attr.to_string()
        .split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

impl MessageOptions {
    fn parse(attr: &TokenStream) -> Self {
        let flags = attribute_flags(attr);
        Self {
            comparable: flags.iter().any(|flag| flag == "comparable"),
        }
    }
}

impl ActorOptions {
    fn parse(attr: &TokenStream) -> Self {
        let flags = attribute_flags(attr);
        Self {
            no_default: flags.iter().any(|flag| flag == "no_default"),
        }
    }
}

/// Derives what a type needs to be carried as an element of a relay message.
///
/// Adds `#[derive(Clone, Debug)]` for whichever of the two is missing and a
/// compile-time check that the type is `Send + Sync + 'static`.
///
/// ```ignore
/// use acton_relay_macro::relay_message;
///
/// #[relay_message]
/// pub struct Ping;
///
/// #[relay_message(comparable)]
/// pub struct Pong(pub u32);
/// ```
///
/// The `comparable` option additionally derives `PartialEq`.
#[proc_macro_attribute]
pub fn relay_message(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = MessageOptions::parse(&attr);
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut traits = Vec::new();
    if !has_derive(&input, "Clone") {
        traits.push(quote!(Clone));
    }
    if !has_derive(&input, "Debug") {
        traits.push(quote!(Debug));
    }
    if options.comparable && !has_derive(&input, "PartialEq") {
        traits.push(quote!(PartialEq));
    }
    let derives = if traits.is_empty() {
        quote!()
    } else {
        quote!(#[derive(#(#traits),*)])
    };

    let assert_ident = quote::format_ident!("_AssertRelayMessage_{}", name);

    let expanded = quote! {
        #derives
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}

/// Derives what a type needs to serve as an actor model.
///
/// Adds `#[derive(Default, Debug)]` for whichever is missing and a compile-time
/// check that the type is `Send + 'static`. Pass `no_default` when the model
/// provides its own `Default` implementation.
///
/// ```ignore
/// use acton_relay_macro::relay_actor;
///
/// #[relay_actor]
/// pub struct Counter {
///     count: i32,
/// }
/// ```
#[proc_macro_attribute]
pub fn relay_actor(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = ActorOptions::parse(&attr);
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut traits = Vec::new();
    if !options.no_default && !has_derive(&input, "Default") {
        traits.push(quote!(Default));
    }
    if !has_derive(&input, "Debug") {
        traits.push(quote!(Debug));
    }
    let derives = if traits.is_empty() {
        quote!()
    } else {
        quote!(#[derive(#(#traits),*)])
    };

    let assert_ident = quote::format_ident!("_AssertRelayActor_{}", name);

    let expanded = quote! {
        #derives
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}

/// Entry point macro for Acton Relay applications.
///
/// Wraps an `async fn main` in a tokio runtime re-exported by `acton_relay`, so
/// applications do not need a direct tokio dependency.
///
/// - `flavor = "current_thread"` selects the single-threaded runtime
/// - `worker_threads = N` sizes the multi-threaded runtime
///
/// ```ignore
/// #[relay_main(flavor = "current_thread")]
/// async fn main() { }
/// ```
#[proc_macro_attribute]
pub fn relay_main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let body = &input.block;

    if sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            sig.fn_token,
            "the async keyword is missing from the function declaration",
        )
        .to_compile_error()
        .into();
    }

    if sig.ident != "main" {
        return syn::Error::new_spanned(
            &sig.ident,
            "relay_main can only be applied to the main function",
        )
        .to_compile_error()
        .into();
    }

    let flags = attribute_flags(&attr);
    let use_current_thread = flags.iter().any(|flag| flag.contains("current_thread"));
    let worker_threads: Option<usize> = flags
        .iter()
        .find(|flag| flag.contains("worker_threads"))
        .and_then(|flag| flag.split('=').nth(1).and_then(|v| v.trim().parse().ok()));

    let runtime_builder = if use_current_thread {
        quote! {
            ::acton_relay::prelude::tokio::runtime::Builder::new_current_thread()
        }
    } else if let Some(threads) = worker_threads {
        quote! {
            ::acton_relay::prelude::tokio::runtime::Builder::new_multi_thread()
                .worker_threads(#threads)
        }
    } else {
        quote! {
            ::acton_relay::prelude::tokio::runtime::Builder::new_multi_thread()
        }
    };

    let fn_name = &sig.ident;
    let fn_inputs = &sig.inputs;
    let fn_output = &sig.output;

    let expanded = quote! {
        #(#attrs)*
        #vis fn #fn_name(#fn_inputs) #fn_output {
            #runtime_builder
                .enable_all()
                .build()
                .expect("failed to build the Acton Relay runtime")
                .block_on(async #body)
        }
    };

    TokenStream::from(expanded)
}
