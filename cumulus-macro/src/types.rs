use syn::{GenericArgument, PathArguments, Type};

/// 字段类型的语法形状，决定生成哪种绑定调用
///
/// 这里只看语法（最后一个路径段），不做类型求解；别名会被误判，
/// 标注了绑定目标的字段因此要求写出直白的类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// ToWire 覆盖的标量（含 String、数值、bool、serde_json::Value）
    Scalar,
    /// Option 包裹的标量
    OptionScalar,
    /// Vec<u8>，按 base64 标量处理
    Bytes,
    /// Vec<标量>
    List,
    /// Vec<Option<标量>>
    MultiList,
    /// HashMap<String, String> / BTreeMap<String, String>
    MapScalar,
    /// HashMap<String, Vec<String>>
    MapList,
    /// chrono::DateTime<Utc>
    Timestamp,
    /// Option<DateTime<Utc>>
    OptionTimestamp,
    /// serde_json::Value
    JsonValue,
}

pub fn shape_of(ty: &Type) -> Shape {
    if is_named(ty, "Value") {
        return Shape::JsonValue;
    }
    if is_named(ty, "DateTime") {
        return Shape::Timestamp;
    }
    if let Some(inner) = generic_arg(ty, "Option") {
        if is_named(inner, "DateTime") {
            return Shape::OptionTimestamp;
        }
        return Shape::OptionScalar;
    }
    if let Some(inner) = generic_arg(ty, "Vec") {
        if is_named(inner, "u8") {
            return Shape::Bytes;
        }
        if generic_arg(inner, "Option").is_some() {
            return Shape::MultiList;
        }
        return Shape::List;
    }
    if let Some(value_ty) = map_value_type(ty) {
        if generic_arg(value_ty, "Vec").is_some() {
            return Shape::MapList;
        }
        return Shape::MapScalar;
    }
    Shape::Scalar
}

/// 最后一个路径段是否为给定名称
pub fn is_named(ty: &Type, name: &str) -> bool {
    match ty {
        Type::Path(p) => p
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == name),
        _ => false,
    }
}

/// `Wrapper<T>` 的第一个泛型参数
pub fn generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(p) = ty else { return None };
    let seg = p.path.segments.last()?;
    if seg.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    args.args.iter().find_map(|a| match a {
        GenericArgument::Type(t) => Some(t),
        _ => None,
    })
}

/// HashMap/BTreeMap 的值类型
fn map_value_type(ty: &Type) -> Option<&Type> {
    let Type::Path(p) = ty else { return None };
    let seg = p.path.segments.last()?;
    if seg.ident != "HashMap" && seg.ident != "BTreeMap" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    let mut types = args.args.iter().filter_map(|a| match a {
        GenericArgument::Type(t) => Some(t),
        _ => None,
    });
    types.next(); // 键类型
    types.next()
}
