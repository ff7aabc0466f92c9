//! `#[derive(Struct)]`: declare a record layout from a plain Rust struct.
//!
//! Every named field becomes one declaration, in source order:
//!
//! Rust type            |   Declaration
//! ---------            |   -----------
//! `bool`, `i8` .. `f64` |   primitive, count 1
//! `[T; N]`             |   `T` repeated N times
//! another `Struct`     |   nested record
//! `#[cstruct(string = N)] Vec<u8>` or `String` | N-byte string

use proc_macro::TokenStream;
use proc_macro2::TokenStream as Tokens;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitInt};

#[proc_macro_derive(Struct, attributes(cstruct))]
pub fn derive_struct(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// How one field is declared and converted.
enum FieldMode {
    /// Any type implementing `cstruct::Field`
    Typed,
    /// Fixed-length string of the given length
    Text(LitInt),
}

struct StructField {
    ident: syn::Ident,
    name: String,
    ty: syn::Type,
    kind: FieldMode,
}

fn expand(input: &DeriveInput) -> syn::Result<Tokens> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "#[derive(Struct)] does not support generic structs",
        ));
    }
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .map(parse_field)
                .collect::<syn::Result<Vec<_>>>()?,
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "#[derive(Struct)] requires named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[derive(Struct)] can only be used on structs",
            ))
        }
    };

    let ident = &input.ident;
    let struct_name = ident.to_string();
    let field_count = fields.len();
    let declarations = build_declarations(&fields);
    let to_record = build_to_record(&fields);
    let unit = matches!(&input.data, Data::Struct(data) if matches!(data.fields, Fields::Unit));
    let from_record = build_from_record(&fields, unit);

    Ok(quote! {
        impl ::cstruct::Struct for #ident {
            fn schema() -> ::cstruct::Result<::std::sync::Arc<::cstruct::Schema>> {
                static SCHEMA: ::std::sync::OnceLock<::std::sync::Arc<::cstruct::Schema>> =
                    ::std::sync::OnceLock::new();
                let fields: [(&'static str, ::cstruct::DeclareFn); #field_count] = [#declarations];
                ::cstruct::derived_schema(
                    &SCHEMA,
                    ::std::concat!(::std::module_path!(), "::", ::std::stringify!(#ident)),
                    &fields,
                )
            }

            fn to_record(&self) -> ::cstruct::Result<::cstruct::Record> {
                #[allow(unused_mut)]
                let mut record = ::cstruct::Record::new(<Self as ::cstruct::Struct>::schema()?);
                #to_record
                Ok(record)
            }

            fn from_record(record: &::cstruct::Record) -> ::cstruct::Result<Self> {
                #from_record
            }
        }

        impl ::cstruct::Field for #ident {
            fn declare(
                builder: &mut ::cstruct::SchemaBuilder,
                name: &str,
                count: usize,
            ) -> ::cstruct::Result<()> {
                builder
                    .record(name, <Self as ::cstruct::Struct>::schema()?, count)
                    .map(|_| ())
            }

            fn to_value(&self) -> ::cstruct::Result<::cstruct::Value> {
                ::cstruct::Struct::to_record(self).map(::cstruct::Value::Record)
            }

            fn from_value(field: &str, value: &::cstruct::Value) -> ::cstruct::Result<Self> {
                match value {
                    ::cstruct::Value::Record(record) => {
                        <Self as ::cstruct::Struct>::from_record(record)
                    }
                    _ => Err(::cstruct::Error::Convert {
                        field: field.to_owned(),
                        expected: #struct_name,
                    }),
                }
            }
        }

        impl ::cstruct::Element for #ident {}
    })
}

fn parse_field(field: &syn::Field) -> syn::Result<StructField> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
    let mut kind = FieldMode::Typed;
    for attr in &field.attrs {
        if !attr.path().is_ident("cstruct") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("string") {
                let len: LitInt = meta.value()?.parse()?;
                if len.base10_parse::<usize>()? == 0 {
                    return Err(meta.error("string length must be at least 1"));
                }
                kind = FieldMode::Text(len);
                Ok(())
            } else {
                Err(meta.error("unsupported cstruct attribute, expected `string = N`"))
            }
        })?;
    }
    Ok(StructField {
        name: ident.unraw().to_string(),
        ident,
        ty: field.ty.clone(),
        kind,
    })
}

/// Declarations in source order; source order is wire order.
fn build_declarations(fields: &[StructField]) -> Tokens {
    let mut tokens = Tokens::new();
    for field in fields {
        let name = &field.name;
        let ty = &field.ty;
        let declare = match &field.kind {
            FieldMode::Typed => quote! {
                <#ty as ::cstruct::Field>::declare(builder, name, 1)
            },
            FieldMode::Text(len) => quote! {
                builder.string(name, #len).map(|_| ())
            },
        };
        tokens.extend(quote! {
            (#name, |builder: &mut ::cstruct::SchemaBuilder, name: &str| #declare),
        });
    }
    tokens
}

fn build_to_record(fields: &[StructField]) -> Tokens {
    let mut tokens = Tokens::new();
    for field in fields {
        let name = &field.name;
        let ident = &field.ident;
        let ty = &field.ty;
        tokens.extend(match &field.kind {
            FieldMode::Typed => quote! {
                record.set_field(#name, <#ty as ::cstruct::Field>::to_value(&self.#ident)?)?;
            },
            FieldMode::Text(_) => quote! {
                record.set_field(#name, <#ty as ::cstruct::Text>::to_text(&self.#ident))?;
            },
        });
    }
    tokens
}

fn build_from_record(fields: &[StructField], unit: bool) -> Tokens {
    if unit {
        return quote! {
            let _ = record;
            Ok(Self)
        };
    }
    let inits = fields.iter().map(|field| {
        let name = &field.name;
        let ident = &field.ident;
        let ty = &field.ty;
        let convert = match &field.kind {
            FieldMode::Typed => quote!(<#ty as ::cstruct::Field>::from_value),
            FieldMode::Text(_) => quote!(<#ty as ::cstruct::Text>::from_text),
        };
        quote! {
            #ident: #convert(#name, record.value(#name)?)?
        }
    });
    quote! {
        Ok(Self {
            #(#inits,)*
        })
    }
}
