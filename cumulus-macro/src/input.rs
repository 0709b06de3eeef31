use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident};

use crate::attrs::{Dest, FieldAttrs, TsFormat};
use crate::types::{Shape, shape_of};

/// 生成 `ApiInput` 实现：请求面写入 + 请求体组装
pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "ApiInput can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "ApiInput requires named fields",
        ));
    };

    let mut write_stmts = Vec::new();
    let mut body_stmts = Vec::new();

    for field in &fields.named {
        let attrs = FieldAttrs::parse(field)?;
        if attrs.skip {
            continue;
        }
        let Some(dest) = &attrs.dest else {
            continue;
        };
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let shape = shape_of(&field.ty);
        let ts = ts_tokens(attrs.ts.unwrap_or(TsFormat::Rfc822));

        match dest {
            Dest::Uri(wire) => {
                write_stmts.push(uri_stmt(field, ident, wire, &shape, &ts)?);
            }
            Dest::Query(wire) => {
                write_stmts.push(query_stmt(ident, wire, &shape, &ts));
            }
            Dest::Header(wire) => {
                write_stmts.push(header_stmt(ident, wire, &shape, &ts));
            }
            Dest::Headers(prefix) => {
                if shape != Shape::MapScalar {
                    return Err(syn::Error::new_spanned(
                        field,
                        "headers binding requires a map of String to String",
                    ));
                }
                write_stmts.push(quote! {
                    let mut __pairs: ::std::vec::Vec<(&::std::string::String, &::std::string::String)> =
                        self.#ident.iter().collect();
                    __pairs.sort_by(|a, b| a.0.cmp(b.0));
                    for (k, v) in __pairs {
                        if !v.is_empty() {
                            b.header(&format!("{}{}", #prefix, k), v)?;
                        }
                    }
                });
            }
            Dest::Body => {
                let field_name = ident.to_string();
                let wire = attrs.name.clone().unwrap_or_else(|| field_name.clone());
                body_stmts.push(quote! {
                    if let Some(v) = ::cumulus_common::bind::json_field(#field_name, &self.#ident)? {
                        __map.insert(#wire.to_string(), v);
                    }
                });
            }
            Dest::Status => {
                return Err(syn::Error::new_spanned(
                    field,
                    "status binding is only valid on output structs",
                ));
            }
        }
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::cumulus_common::bind::ApiInput for #name #ty_generics #where_clause {
            fn write_request(
                &self,
                b: &mut ::cumulus_common::bind::RequestBinder<'_>,
            ) -> ::std::result::Result<(), ::cumulus_common::error::ApiError> {
                #(#write_stmts)*
                Ok(())
            }

            fn body_json(
                &self,
            ) -> ::std::result::Result<
                ::std::option::Option<::cumulus_common::serde_json::Value>,
                ::cumulus_common::error::ApiError,
            > {
                let mut __map = ::cumulus_common::serde_json::Map::new();
                #(#body_stmts)*
                if __map.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(::cumulus_common::serde_json::Value::Object(__map)))
                }
            }
        }
    })
}

fn ts_tokens(ts: TsFormat) -> TokenStream {
    match ts {
        TsFormat::Rfc822 => quote!(::cumulus_common::bind::TimestampFormat::Rfc822),
        TsFormat::Iso8601 => quote!(::cumulus_common::bind::TimestampFormat::Iso8601),
        TsFormat::UnixSeconds => quote!(::cumulus_common::bind::TimestampFormat::UnixSeconds),
    }
}

fn uri_stmt(
    field: &syn::Field,
    ident: &Ident,
    wire: &str,
    shape: &Shape,
    ts: &TokenStream,
) -> syn::Result<TokenStream> {
    let value = match shape {
        Shape::Scalar | Shape::OptionScalar | Shape::Bytes | Shape::JsonValue => {
            quote!(::cumulus_common::bind::ToWire::to_wire(&self.#ident))
        }
        Shape::Timestamp => quote!(::cumulus_common::bind::format_time(&self.#ident, #ts)),
        Shape::OptionTimestamp => quote! {
            self.#ident
                .as_ref()
                .and_then(|t| ::cumulus_common::bind::format_time(t, #ts))
        },
        _ => {
            return Err(syn::Error::new_spanned(
                field,
                "uri binding requires a scalar value",
            ));
        }
    };
    Ok(quote! {
        if let Some(v) = #value {
            b.path_param(#wire, &v);
        }
    })
}

fn query_stmt(ident: &Ident, wire: &str, shape: &Shape, ts: &TokenStream) -> TokenStream {
    match shape {
        Shape::Scalar | Shape::OptionScalar | Shape::Bytes | Shape::JsonValue => quote! {
            b.query_scalar(#wire, ::cumulus_common::bind::ToWire::to_wire(&self.#ident));
        },
        Shape::Timestamp => quote! {
            b.query_scalar(#wire, ::cumulus_common::bind::format_time(&self.#ident, #ts));
        },
        Shape::OptionTimestamp => quote! {
            b.query_scalar(
                #wire,
                self.#ident
                    .as_ref()
                    .and_then(|t| ::cumulus_common::bind::format_time(t, #ts)),
            );
        },
        Shape::List => quote! {
            b.query_list(
                #wire,
                self.#ident
                    .iter()
                    .filter_map(::cumulus_common::bind::ToWire::to_wire)
                    .collect(),
            );
        },
        Shape::MultiList => quote! {
            b.query_multi(
                #wire,
                self.#ident
                    .iter()
                    .map(::cumulus_common::bind::ToWire::to_wire)
                    .collect(),
            );
        },
        Shape::MapScalar => quote! {
            let mut __entries: ::std::vec::Vec<(::std::string::String, ::std::string::String)> =
                self.#ident.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            __entries.sort_by(|a, b| a.0.cmp(&b.0));
            b.query_map(__entries);
        },
        Shape::MapList => quote! {
            let mut __entries: ::std::vec::Vec<(::std::string::String, ::std::string::String)> =
                self.#ident.iter().map(|(k, v)| (k.clone(), v.join(","))).collect();
            __entries.sort_by(|a, b| a.0.cmp(&b.0));
            b.query_map(__entries);
        },
    }
}

fn header_stmt(ident: &Ident, wire: &str, shape: &Shape, ts: &TokenStream) -> TokenStream {
    let value = match shape {
        Shape::JsonValue => quote!(::cumulus_common::bind::json_header_value(&self.#ident)),
        Shape::Timestamp => quote!(::cumulus_common::bind::format_time(&self.#ident, #ts)),
        Shape::OptionTimestamp => quote! {
            self.#ident
                .as_ref()
                .and_then(|t| ::cumulus_common::bind::format_time(t, #ts))
        },
        _ => quote!(::cumulus_common::bind::ToWire::to_wire(&self.#ident)),
    };
    quote! {
        if let Some(v) = #value {
            b.header(#wire, &v)?;
        }
    }
}
