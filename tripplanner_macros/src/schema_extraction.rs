use proc_macro2::Span;
use syn::{
    parse::Parser, punctuated::Punctuated, spanned::Spanned, Attribute, Expr, ExprLit, Fields,
    ItemStruct, Lit, LitStr, MetaNameValue, Token,
};

/// Arguments accepted by `#[completion_schema(...)]`.
#[derive(Default)]
pub struct SchemaArgs {
    pub name: Option<LitStr>,
    pub description: Option<LitStr>,
}

pub fn parse_args(attr: proc_macro::TokenStream) -> syn::Result<SchemaArgs> {
    let mut args = SchemaArgs::default();
    if attr.is_empty() {
        return Ok(args);
    }

    let pairs = Punctuated::<MetaNameValue, Token![,]>::parse_terminated.parse(attr)?;
    for pair in pairs {
        let key = pair
            .path
            .get_ident()
            .map(|ident| ident.to_string())
            .ok_or_else(|| {
                syn::Error::new_spanned(&pair.path, "expected `name` or `description`")
            })?;

        let Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) = &pair.value
        else {
            return Err(syn::Error::new_spanned(
                &pair.value,
                "expected a string literal",
            ));
        };

        let slot = match key.as_str() {
            "name" => &mut args.name,
            "description" => &mut args.description,
            other => {
                return Err(syn::Error::new(
                    pair.path.span(),
                    format!("unknown `completion_schema` argument `{other}`"),
                ))
            }
        };

        if slot.replace(value.clone()).is_some() {
            return Err(syn::Error::new(
                pair.path.span(),
                format!("`{key}` given more than once"),
            ));
        }
    }

    Ok(args)
}

/// Only non-generic structs with named fields map onto a JSON object schema.
pub fn check_shape(item: &ItemStruct) -> syn::Result<()> {
    if !matches!(item.fields, Fields::Named(_)) {
        return Err(syn::Error::new(
            item.struct_token.span(),
            "`#[completion_schema]` requires a struct with named fields",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.generics.span(),
            "`#[completion_schema]` cannot be applied to generic structs",
        ));
    }
    Ok(())
}

/// Joined `///` lines of the struct, if any.
pub fn doc_text(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(MetaNameValue {
                value:
                    Expr::Lit(ExprLit {
                        lit: Lit::Str(line),
                        ..
                    }),
                ..
            }) => Some(line.value().trim().to_string()),
            _ => None,
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

pub fn schema_name(item: &ItemStruct, args: &SchemaArgs) -> LitStr {
    args.name
        .clone()
        .unwrap_or_else(|| LitStr::new(&item.ident.to_string(), Span::call_site()))
}

pub fn description(item: &ItemStruct, args: &SchemaArgs) -> Option<LitStr> {
    args.description.clone().or_else(|| {
        doc_text(&item.attrs).map(|text| LitStr::new(&text, Span::call_site()))
    })
}
