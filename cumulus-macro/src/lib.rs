//! Cumulus SDK 的声明式绑定派生宏
//!
//! 输入结构体通过 `#[derive(ApiInput)]` 与 `#[api(...)]` 字段标注
//! 获得"字段 → HTTP 请求面"的编译期生成代码；输出结构体通过
//! `#[derive(ApiOutput)]` 获得"响应面 → 字段"的回填与 JSON 解码。
//!
//! ```ignore
//! #[derive(Default, Deserialize, ApiInput)]
//! struct GetSubaccountInput {
//!     #[api(uri = "subaccountGUID")]
//!     subaccount_guid: String,
//!     #[api(query = "derivedAuthorizations")]
//!     derived_authorizations: String,
//! }
//!
//! #[derive(Default, Deserialize, ApiOutput)]
//! struct CreateJobOutput {
//!     #[serde(skip)]
//!     #[api(header = "Location")]
//!     location: String,
//! }
//! ```
//!
//! 支持的字段标注：`uri`、`query`、`header`、`headers`（前缀展开）、
//! `body`（JSON 请求体字段，`name` 改写线上名）、`status`（仅输出）、
//! `ts`（时间戳格式：rfc822 / iso8601 / unix）、`skip`。
//! 不支持的字段类型在展开时报编译错误，而不是运行时失败。

mod attrs;
mod input;
mod output;
mod types;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

#[proc_macro_derive(ApiInput, attributes(api))]
pub fn derive_api_input(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    input::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[proc_macro_derive(ApiOutput, attributes(api))]
pub fn derive_api_output(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    output::expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
