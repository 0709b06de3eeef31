use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Type};

use crate::attrs::{Dest, FieldAttrs};
use crate::types::{generic_arg, is_named};

/// 生成 `ApiOutput` 实现：响应面读取 + JSON 解码
pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "ApiOutput can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "ApiOutput requires named fields",
        ));
    };

    let mut read_stmts = Vec::new();

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

        match dest {
            Dest::Header(wire) => {
                let stmt = if is_string(&field.ty) {
                    quote! {
                        self.#ident = r.header(#wire).unwrap_or_default().to_string();
                    }
                } else if is_option_string(&field.ty) {
                    quote! {
                        self.#ident = r.header(#wire).map(str::to_string);
                    }
                } else if is_bytes(&field.ty) {
                    quote! {
                        self.#ident = r
                            .header(#wire)
                            .map(|v| v.as_bytes().to_vec())
                            .unwrap_or_default();
                    }
                } else {
                    return Err(syn::Error::new_spanned(
                        field,
                        "header binding requires String, Option<String>, or Vec<u8>",
                    ));
                };
                read_stmts.push(stmt);
            }
            Dest::Body => {
                let stmt = if is_string(&field.ty) {
                    quote! {
                        self.#ident = ::std::string::String::from_utf8_lossy(r.body()).into_owned();
                    }
                } else if is_bytes(&field.ty) {
                    quote! {
                        self.#ident = r.body().to_vec();
                    }
                } else {
                    return Err(syn::Error::new_spanned(
                        field,
                        "body binding requires String or Vec<u8>",
                    ));
                };
                read_stmts.push(stmt);
            }
            Dest::Status => {
                let stmt = if is_string(&field.ty) {
                    quote! {
                        self.#ident = r.status_line();
                    }
                } else {
                    quote! {
                        self.#ident = ::core::convert::Into::into(r.status());
                    }
                };
                read_stmts.push(stmt);
            }
            Dest::Uri(_) | Dest::Query(_) | Dest::Headers(_) => {
                return Err(syn::Error::new_spanned(
                    field,
                    "uri, query, and headers bindings are only valid on input structs",
                ));
            }
        }
    }

    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::cumulus_common::bind::ApiOutput for #name #ty_generics #where_clause {
            fn read_response(
                &mut self,
                r: &::cumulus_common::bind::ResponseView<'_>,
            ) -> ::std::result::Result<(), ::cumulus_common::error::ApiError> {
                #(#read_stmts)*
                Ok(())
            }

            fn unmarshal_json(
                &mut self,
                data: &[u8],
            ) -> ::std::result::Result<(), ::cumulus_common::error::ApiError> {
                if data.is_empty() {
                    return Ok(());
                }
                *self = ::cumulus_common::serde_json::from_slice(data)
                    .map_err(|e| ::cumulus_common::error::ApiError::serialization(#name_str, e))?;
                Ok(())
            }
        }
    })
}

fn is_string(ty: &Type) -> bool {
    is_named(ty, "String")
}

fn is_option_string(ty: &Type) -> bool {
    generic_arg(ty, "Option").is_some_and(|inner| is_named(inner, "String"))
}

fn is_bytes(ty: &Type) -> bool {
    generic_arg(ty, "Vec").is_some_and(|inner| is_named(inner, "u8"))
}
