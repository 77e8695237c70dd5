use std::collections::HashMap;

use crate::generator::types::{Cardinality, DataType, Field, IrNode, UnionDispatch};

/// How a value of a given data type crosses the XML bridge. Derived from the
/// data type plus the dispatch mode of referenced unions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ValueKind {
    /// carried as text verbatim (strings, dates, binary lexical forms)
    Textual,
    /// parsed via FromStr, written via to_string (numbers, booleans, aliases)
    Parsed,
    /// a generated string enumeration
    Enum(String),
    /// a generated text-dispatching union
    UnionText(String),
    /// a generated element-dispatching union, read against the parent
    UnionElement(String),
    /// a generated struct
    Struct(String),
    /// whitespace-separated items in one text node
    InlineList(Box<ValueKind>),
    /// a raw element kept as-is
    Raw,
}

/// Union dispatch modes by mangled name, looked up while classifying fields.
pub(crate) fn union_dispatch_table(nodes: &[IrNode]) -> HashMap<String, UnionDispatch> {
    nodes
        .iter()
        .filter_map(|node| match node {
            IrNode::Union(union) => Some((union.name.clone(), union.dispatch)),
            _ => None,
        })
        .collect()
}

pub(crate) fn value_kind(
    data_type: &DataType,
    dispatch: &HashMap<String, UnionDispatch>,
) -> ValueKind {
    match data_type {
        DataType::String
        | DataType::DateTime
        | DataType::Date
        | DataType::Time
        | DataType::Uri
        | DataType::QName
        | DataType::Binary(_) => ValueKind::Textual,
        DataType::Boolean
        | DataType::Decimal
        | DataType::Double
        | DataType::Float
        | DataType::ShortInteger
        | DataType::SmallInteger
        | DataType::Integer
        | DataType::LongInteger
        | DataType::UnsignedShortInteger
        | DataType::UnsignedSmallInteger
        | DataType::UnsignedInteger
        | DataType::UnsignedLongInteger
        | DataType::Alias(_) => ValueKind::Parsed,
        DataType::Enumeration(name) => ValueKind::Enum(name.clone()),
        DataType::Union(name) => match dispatch.get(name) {
            Some(UnionDispatch::Text) => ValueKind::UnionText(name.clone()),
            _ => ValueKind::UnionElement(name.clone()),
        },
        DataType::Custom(name) => ValueKind::Struct(name.clone()),
        DataType::List(inner) | DataType::InlineList(inner) => {
            ValueKind::InlineList(Box::new(value_kind(inner, dispatch)))
        }
        DataType::RawXml => ValueKind::Raw,
    }
}

/// The surface type of one value, without cardinality wrapping.
pub(crate) fn rust_type(data_type: &DataType) -> String {
    match data_type {
        DataType::Boolean => "bool".to_owned(),
        DataType::DateTime
        | DataType::Date
        | DataType::Time
        | DataType::String
        | DataType::Uri
        | DataType::QName
        | DataType::Binary(_) => "String".to_owned(),
        DataType::Decimal | DataType::Double => "f64".to_owned(),
        DataType::Float => "f32".to_owned(),
        DataType::ShortInteger => "i8".to_owned(),
        DataType::SmallInteger => "i16".to_owned(),
        DataType::Integer => "i32".to_owned(),
        DataType::LongInteger => "i64".to_owned(),
        DataType::UnsignedShortInteger => "u8".to_owned(),
        DataType::UnsignedSmallInteger => "u16".to_owned(),
        DataType::UnsignedInteger => "u32".to_owned(),
        DataType::UnsignedLongInteger => "u64".to_owned(),
        DataType::Custom(name)
        | DataType::Enumeration(name)
        | DataType::Alias(name)
        | DataType::Union(name) => name.clone(),
        DataType::List(inner) | DataType::InlineList(inner) => {
            format!("Vec<{}>", rust_type(inner))
        }
        DataType::RawXml => "Element".to_owned(),
    }
}

/// The declared type of a field: scalar type wrapped by indirection and
/// cardinality. Lists already are an indirection, so they never box.
pub(crate) fn field_type(field: &Field) -> String {
    let scalar = rust_type(&field.data_type);

    match field.cardinality {
        Cardinality::List => format!("Vec<{scalar}>"),
        Cardinality::Optional if field.boxed => format!("Option<Box<{scalar}>>"),
        Cardinality::Optional => format!("Option<{scalar}>"),
        Cardinality::Required if field.boxed => format!("Box<{scalar}>"),
        Cardinality::Required => scalar,
    }
}

/// Escapes a value into a Rust string literal body.
pub(crate) fn escape_str(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::types::XmlSource;

    fn field(data_type: DataType, cardinality: Cardinality, boxed: bool) -> Field {
        Field {
            name: "f".to_owned(),
            xml_name: "f".to_owned(),
            data_type,
            cardinality,
            boxed,
            source: XmlSource::Element,
            documentations: vec![],
        }
    }

    #[test]
    fn field_type_wraps_cardinality_and_indirection() {
        assert_eq!(
            field_type(&field(DataType::LongInteger, Cardinality::Required, false)),
            "i64"
        );
        assert_eq!(
            field_type(&field(DataType::String, Cardinality::Optional, false)),
            "Option<String>"
        );
        assert_eq!(
            field_type(&field(
                DataType::Custom("Node".to_owned()),
                Cardinality::Optional,
                true
            )),
            "Option<Box<Node>>"
        );
        assert_eq!(
            field_type(&field(
                DataType::Custom("Node".to_owned()),
                Cardinality::List,
                true
            )),
            "Vec<Node>"
        );
    }

    #[test]
    fn inline_lists_render_as_vectors() {
        assert_eq!(
            rust_type(&DataType::InlineList(Box::new(DataType::UnsignedInteger))),
            "Vec<u32>"
        );
    }
}
