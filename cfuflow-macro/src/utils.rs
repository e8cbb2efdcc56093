use proc_macro2::Span;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{DeriveInput, Field};

/// Returns the named fields of a struct, or an error spanning the derive input.
pub(super) fn get_named_fields(ast: &DeriveInput) -> Result<&Punctuated<Field, Comma>, syn::Error> {
    match ast.data {
        syn::Data::Struct(syn::DataStruct { fields: syn::Fields::Named(syn::FieldsNamed { ref named, .. }), .. }) => {
            Ok(named)
        }
        syn::Data::Struct(_) => {
            Err(syn::Error::new(ast.ident.span(), format!("{}: only structs with named fields can be `Signal`", ast.ident)))
        }
        _ => Err(syn::Error::new(Span::call_site(), format!("{}: `Signal` can only be derived for structs", ast.ident))),
    }
}
