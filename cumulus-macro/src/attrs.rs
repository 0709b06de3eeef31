use syn::{Attribute, Field, LitStr};

/// 时间戳格式标注，对应运行时的 `TimestampFormat`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsFormat {
    Rfc822,
    Iso8601,
    UnixSeconds,
}

/// 字段绑定目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dest {
    /// 路径占位符替换，携带线上名
    Uri(String),
    /// 查询参数，携带线上名
    Query(String),
    /// 单个 header，携带线上名
    Header(String),
    /// 映射展开为多个 header，携带名称前缀
    Headers(String),
    /// 请求体 JSON 字段
    Body,
    /// 响应状态（仅输出侧）
    Status,
}

/// 解析后的 `#[api(...)]` 字段标注
#[derive(Debug, Clone, Default)]
pub struct FieldAttrs {
    pub dest: Option<Dest>,
    /// 请求体字段的线上名；缺省用字段名
    pub name: Option<String>,
    pub ts: Option<TsFormat>,
    pub skip: bool,
}

impl FieldAttrs {
    /// 从字段的属性列表收集标注；重复或互斥的标注报编译错误
    pub fn parse(field: &Field) -> syn::Result<Self> {
        let mut out = FieldAttrs::default();
        for attr in &field.attrs {
            if !attr.path().is_ident("api") {
                continue;
            }
            out.parse_attr(attr)?;
        }
        Ok(out)
    }

    fn parse_attr(&mut self, attr: &Attribute) -> syn::Result<()> {
        attr.parse_nested_meta(|meta| {
            let set_dest = |slot: &mut Option<Dest>, dest: Dest| -> syn::Result<()> {
                if slot.is_some() {
                    return Err(meta.error("conflicting binding targets on one field"));
                }
                *slot = Some(dest);
                Ok(())
            };

            if meta.path.is_ident("uri") {
                let lit: LitStr = meta.value()?.parse()?;
                set_dest(&mut self.dest, Dest::Uri(lit.value()))
            } else if meta.path.is_ident("query") {
                let lit: LitStr = meta.value()?.parse()?;
                set_dest(&mut self.dest, Dest::Query(lit.value()))
            } else if meta.path.is_ident("header") {
                let lit: LitStr = meta.value()?.parse()?;
                set_dest(&mut self.dest, Dest::Header(lit.value()))
            } else if meta.path.is_ident("headers") {
                let lit: LitStr = meta.value()?.parse()?;
                set_dest(&mut self.dest, Dest::Headers(lit.value()))
            } else if meta.path.is_ident("body") {
                set_dest(&mut self.dest, Dest::Body)
            } else if meta.path.is_ident("status") {
                set_dest(&mut self.dest, Dest::Status)
            } else if meta.path.is_ident("name") {
                let lit: LitStr = meta.value()?.parse()?;
                self.name = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("ts") {
                let lit: LitStr = meta.value()?.parse()?;
                self.ts = Some(match lit.value().as_str() {
                    "rfc822" => TsFormat::Rfc822,
                    "iso8601" => TsFormat::Iso8601,
                    "unix" => TsFormat::UnixSeconds,
                    other => {
                        return Err(syn::Error::new_spanned(
                            lit,
                            format!("unknown timestamp format '{other}' (expected rfc822, iso8601, or unix)"),
                        ));
                    }
                });
                Ok(())
            } else if meta.path.is_ident("skip") {
                self.skip = true;
                Ok(())
            } else {
                Err(meta.error(
                    "unsupported api attribute (expected uri, query, header, headers, body, status, name, ts, or skip)",
                ))
            }
        })
    }
}
