//! `#[derive(Event)]`: implements `statecraft::EventCode` and its `Reflect`
//! supertrait for a fieldless enum whose discriminants start at 0 and run
//! without gaps.
//!
//! Between the two traits that's `MIN`/`MAX`, a round-trip
//! `code()`/`from_code()` pair, a declared name per variant, and a `values()`
//! slice — exactly the enum reflection the transition-table compiler and the
//! actor's diagnostics rely on, and exactly what a hand enumeration would
//! otherwise require writing (and keeping in sync) by hand.

use proc_macro::TokenStream;
use proc_macro_error2::{abort, proc_macro_error};
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

#[proc_macro_error]
#[proc_macro_derive(Event)]
pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = &input.ident;

    let Data::Enum(data) = &input.data else {
        abort!(input, "`Event` can only be derived for an enum"; help = "use a fieldless enum of event variants");
    };

    if data.variants.is_empty() {
        abort!(input, "`Event` enum must declare at least one variant");
    }

    let mut names = Vec::new();
    let mut idents = Vec::new();
    let mut next_discriminant: u16 = 0;

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            abort!(variant, "`Event` variants must be fieldless");
        }

        let code = match &variant.discriminant {
            Some((_, expr)) => match parse_discriminant(expr) {
                Some(value) => value,
                None => abort!(expr, "event discriminants must be a literal non-negative integer"),
            },
            None => next_discriminant,
        };

        if (code as usize) != idents.len() {
            abort!(
                variant,
                "event discriminants must start at 0 and run without gaps";
                help = "expected discriminant {}, found {}", idents.len(), code
            );
        }

        next_discriminant = code + 1;
        idents.push(variant.ident.clone());
        names.push(variant.ident.to_string());
    }

    let count = idents.len();
    let max = (count - 1) as u16;
    let codes = (0u16..count as u16).collect::<Vec<_>>();

    let expanded = quote! {
        #[automatically_derived]
        impl statecraft::Reflect for #ident {
            const COUNT: usize = #count;

            fn ordinal(self) -> usize {
                self as usize
            }

            fn name(self) -> &'static str {
                match self {
                    #(#ident::#idents => #names,)*
                }
            }

            fn values() -> &'static [Self] {
                &[#(#ident::#idents),*]
            }
        }

        #[automatically_derived]
        impl statecraft::EventCode for #ident {
            const MIN: u16 = 0;
            const MAX: u16 = #max;

            fn code(self) -> u16 {
                self as u16
            }

            fn from_code(code: u16) -> ::core::option::Option<Self> {
                match code {
                    #(#codes => ::core::option::Option::Some(#ident::#idents),)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    expanded.into()
}

fn parse_discriminant(expr: &syn::Expr) -> Option<u16> {
    if let syn::Expr::Lit(syn::ExprLit { lit: syn::Lit::Int(int), .. }) = expr {
        int.base10_parse::<u16>().ok()
    } else {
        None
    }
}
