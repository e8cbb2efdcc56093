use proc_macro::{self, TokenStream};
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use super::utils::get_named_fields;

pub fn derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let name = &ast.ident;

    let fields = match get_named_fields(&ast) {
        Ok(fields) => fields,
        Err(error) => return error.to_compile_error().into(),
    };

    let ty_widths = fields.iter().map(|f| {
        let ty = &f.ty;
        quote! { <#ty>::WIDTH }
    });

    // fields for `transl`.
    let into_fields = fields.iter().map(|f| {
        let name = &f.ident;
        quote! { .chain(self.#name.transl()) }
    });

    // fields for `from_bits`.
    let from_fields = fields.iter().map(|f| {
        let name = &f.ident;
        let ty = &f.ty;
        quote! {
            let #name = {
                let end = offset + <#ty>::WIDTH;
                let value = <#ty>::from_bits(&bits[offset..end]);
                offset = end;
                value
            };
        }
    });

    let field_names = fields.iter().map(|f| &f.ident);

    let expanded = quote! {
        impl #impl_generics Signal for #name #ty_generics #where_clause {
            const WIDTH: usize = 0 #(+ #ty_widths)*;

            fn transl(self) -> Vec<bool> {
                ::std::iter::empty()#(#into_fields)*.collect::<Vec<bool>>()
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn from_bits(bits: &[bool]) -> Self {
                assert_eq!(bits.len(), <Self as Signal>::WIDTH, "{}: bit width mismatch", stringify!(#name));
                let mut offset = 0;
                #(#from_fields)*
                Self { #(#field_names,)* }
            }
        }
    };

    expanded.into()
}
