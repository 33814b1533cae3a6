mod schema_extraction;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, ItemStruct, LitStr};

use crate::schema_extraction::{check_shape, description, parse_args, schema_name};

/// Implements `CompletionSchema` for a named struct.
///
/// The generated handle is built once per process from `schemars::schema_for!`;
/// the struct's doc comment becomes the schema description. Optional
/// `name = "..."` and `description = "..."` arguments override both.
#[proc_macro_attribute]
pub fn completion_schema(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match parse_args(attr) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };

    let item_struct = parse_macro_input!(item as ItemStruct);
    if let Err(err) = check_shape(&item_struct) {
        return err.to_compile_error().into();
    }

    let ident = &item_struct.ident;
    let name = schema_name(&item_struct, &args);
    let type_name = LitStr::new(&ident.to_string(), Span::call_site());
    let description = match description(&item_struct, &args) {
        Some(text) => quote! { Some(#text) },
        None => quote! { None },
    };

    let expanded = quote! {
        #item_struct

        impl trip_planner_rs::schema::CompletionSchema for #ident {
            fn schema() -> &'static trip_planner_rs::schema::SchemaHandle {
                static HANDLE: std::sync::OnceLock<trip_planner_rs::schema::SchemaHandle> =
                    std::sync::OnceLock::new();
                HANDLE.get_or_init(|| {
                    let mut root = schemars::schema_for!(Self);
                    trip_planner_rs::schema::apply_metadata(&mut root, #name, #description);
                    trip_planner_rs::schema::SchemaHandle::from_root_schema::<Self>(
                        #name,
                        #type_name,
                        root,
                    )
                })
            }
        }
    };

    expanded.into()
}
