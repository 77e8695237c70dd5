use std::{collections::HashMap, io::Write};

use crate::generator::{
    code_generator_trait::CodeGenError,
    types::{Cardinality, Field, StructType, UnionDispatch, XmlSource},
};

use super::{
    code_writer::CodeWriter,
    helper::{escape_str, field_type, value_kind, ValueKind},
};

/// Emits one struct: declaration, `FromXml` constructor and `ToXml` method.
pub(crate) struct StructCodeGenerator;

impl StructCodeGenerator {
    pub(crate) fn generate<T: Write>(
        writer: &mut CodeWriter<T>,
        node: &StructType,
        dispatch: &HashMap<String, UnionDispatch>,
    ) -> Result<(), CodeGenError> {
        writer.write_documentation(&node.documentations, None)?;
        if node.namespace.is_empty() {
            writer.writeln_fmt(format_args!("/// Qualified name: {}", node.xml_name), None)?;
        } else {
            writer.writeln_fmt(
                format_args!("/// Qualified name: {{{}}}{}", node.namespace, node.xml_name),
                None,
            )?;
        }

        writer.writeln("#[derive(Debug, Clone, PartialEq)]", None)?;
        writer.writeln_fmt(format_args!("pub struct {} {{", node.name), None)?;

        for field in &node.fields {
            writer.write_documentation(&field.documentations, Some(4))?;
            writer.writeln_fmt(
                format_args!("pub {}: {},", field.name, field_type(field)),
                Some(4),
            )?;
        }

        writer.writeln("}", None)?;
        writer.newline()?;

        Self::generate_from_xml(writer, node, dispatch)?;
        writer.newline()?;
        Self::generate_to_xml(writer, node, dispatch)?;

        Ok(())
    }

    fn generate_from_xml<T: Write>(
        writer: &mut CodeWriter<T>,
        node: &StructType,
        dispatch: &HashMap<String, UnionDispatch>,
    ) -> Result<(), CodeGenError> {
        writer.writeln_fmt(format_args!("impl FromXml for {} {{", node.name), None)?;
        writer.writeln(
            "fn from_xml(element: &Element) -> Result<Self, SoapError> {",
            Some(4),
        )?;
        writer.writeln("Ok(Self {", Some(8))?;

        for field in &node.fields {
            let expression = Self::read_expression(node, field, dispatch);
            writer.writeln_fmt(format_args!("{}: {expression},", field.name), Some(12))?;
        }

        writer.writeln("})", Some(8))?;
        writer.writeln("}", Some(4))?;
        writer.writeln("}", None)?;

        Ok(())
    }

    fn generate_to_xml<T: Write>(
        writer: &mut CodeWriter<T>,
        node: &StructType,
        dispatch: &HashMap<String, UnionDispatch>,
    ) -> Result<(), CodeGenError> {
        writer.writeln_fmt(format_args!("impl ToXml for {} {{", node.name), None)?;

        let unused = if node.fields.is_empty() { "_element" } else { "element" };
        writer.writeln_fmt(
            format_args!("fn to_xml(&self, {unused}: &mut Element) {{"),
            Some(4),
        )?;

        for field in &node.fields {
            for line in Self::write_statements(field, dispatch) {
                writer.writeln(&line, Some(8))?;
            }
        }

        writer.writeln("}", Some(4))?;
        writer.writeln("}", None)?;

        Ok(())
    }

    /// The expression deserializing one field out of `element`.
    fn read_expression(
        node: &StructType,
        field: &Field,
        dispatch: &HashMap<String, UnionDispatch>,
    ) -> String {
        let kind = value_kind(&field.data_type, dispatch);

        match field.source {
            XmlSource::Attribute => Self::attribute_read(node, field, &kind),
            XmlSource::Text => Self::text_read(&kind),
            XmlSource::Element => Self::element_read(node, field, &kind),
        }
    }

    fn attribute_read(node: &StructType, field: &Field, kind: &ValueKind) -> String {
        let name = escape_str(&field.xml_name);

        match field.cardinality {
            Cardinality::Optional => match kind {
                ValueKind::Parsed => format!("element.parse_attribute(\"{name}\")?"),
                ValueKind::Enum(e) => format!(
                    "match element.attribute(\"{name}\") {{ Some(value) => Some({e}::from_xml_value(value)?), None => None }}"
                ),
                ValueKind::UnionText(u) => format!(
                    "match element.attribute(\"{name}\") {{ Some(value) => Some({u}::from_xml_text(value)?), None => None }}"
                ),
                ValueKind::InlineList(inner) => format!(
                    "match element.attribute(\"{name}\") {{ Some(value) => {}, None => Vec::new() }}",
                    Self::split_read(node, field, inner, "value"),
                ),
                _ => format!("element.attribute(\"{name}\").map(str::to_owned)"),
            },
            _ => match kind {
                ValueKind::Parsed => format!("element.parse_required_attribute(\"{name}\")?"),
                ValueKind::Enum(e) => {
                    format!("{e}::from_xml_value(element.required_attribute(\"{name}\")?)?")
                }
                ValueKind::UnionText(u) => {
                    format!("{u}::from_xml_text(element.required_attribute(\"{name}\")?)?")
                }
                ValueKind::InlineList(inner) => format!(
                    "{{ let value = element.required_attribute(\"{name}\")?; {} }}",
                    Self::split_read(node, field, inner, "value"),
                ),
                _ => format!("element.required_attribute(\"{name}\")?.to_owned()"),
            },
        }
    }

    fn text_read(kind: &ValueKind) -> String {
        match kind {
            ValueKind::Parsed => "element.parse_text()?".to_owned(),
            ValueKind::Enum(e) => format!("{e}::from_xml_value(element.text())?"),
            ValueKind::UnionText(u) => format!("{u}::from_xml_text(element.text())?"),
            ValueKind::InlineList(inner) => match inner.as_ref() {
                ValueKind::Parsed => "element.parse_list()?".to_owned(),
                ValueKind::Enum(e) => format!(
                    "element.text().split_whitespace().map({e}::from_xml_value).collect::<Result<Vec<_>, _>>()?"
                ),
                _ => "element.text().split_whitespace().map(str::to_owned).collect()"
                    .to_owned(),
            },
            _ => "element.text().to_owned()".to_owned(),
        }
    }

    fn element_read(node: &StructType, field: &Field, kind: &ValueKind) -> String {
        // choices and substitution heads dispatch against the parent's
        // children, there is no wrapper element to descend into
        if let ValueKind::UnionElement(union) = kind {
            return match field.cardinality {
                Cardinality::Required if field.boxed => {
                    format!("Box::new({union}::from_xml(element)?)")
                }
                Cardinality::Required => format!("{union}::from_xml(element)?"),
                Cardinality::Optional if field.boxed => format!(
                    "match {union}::try_from_xml(element)? {{ Some(value) => Some(Box::new(value)), None => None }}"
                ),
                Cardinality::Optional => format!("{union}::try_from_xml(element)?"),
                Cardinality::List => format!("{union}::collect_from_xml(element)?"),
            };
        }

        if matches!(kind, ValueKind::Raw) {
            let siblings = Self::sibling_names(node);

            return match field.cardinality {
                Cardinality::Required => format!(
                    "element.children_except(&[{siblings}]).next().cloned().ok_or_else(|| SoapError::deserialization(\"{}\", \"wildcard content is missing\"))?",
                    escape_str(&node.name),
                ),
                Cardinality::Optional => {
                    format!("element.children_except(&[{siblings}]).next().cloned()")
                }
                Cardinality::List => {
                    format!("element.children_except(&[{siblings}]).cloned().collect()")
                }
            };
        }

        let name = escape_str(&field.xml_name);

        match field.cardinality {
            Cardinality::Required => {
                let source = format!("element.required_child(\"{name}\")?");
                Self::child_read(node, field, kind, &source, field.boxed)
            }
            Cardinality::Optional => {
                let inner = Self::child_read(node, field, kind, "child", field.boxed);

                format!(
                    "match element.child(\"{name}\") {{ Some(child) if !child.is_nil() => Some({inner}), _ => None }}"
                )
            }
            Cardinality::List => match kind {
                ValueKind::Struct(s) => format!(
                    "element.children_named(\"{name}\").map({s}::from_xml).collect::<Result<Vec<_>, _>>()?"
                ),
                ValueKind::Parsed => format!(
                    "element.children_named(\"{name}\").map(Element::parse_text).collect::<Result<Vec<_>, _>>()?"
                ),
                ValueKind::Enum(e) => format!(
                    "element.children_named(\"{name}\").map(|child| {e}::from_xml_value(child.text())).collect::<Result<Vec<_>, _>>()?"
                ),
                ValueKind::UnionText(u) => format!(
                    "element.children_named(\"{name}\").map(|child| {u}::from_xml_text(child.text())).collect::<Result<Vec<_>, _>>()?"
                ),
                ValueKind::InlineList(inner) => match inner.as_ref() {
                    ValueKind::Parsed => format!(
                        "element.children_named(\"{name}\").map(Element::parse_list).collect::<Result<Vec<_>, _>>()?"
                    ),
                    _ => format!(
                        "element.children_named(\"{name}\").map(|child| child.text().split_whitespace().map(str::to_owned).collect::<Vec<String>>()).collect()"
                    ),
                },
                _ => format!(
                    "element.children_named(\"{name}\").map(|child| child.text().to_owned()).collect()"
                ),
            },
        }
    }

    /// Reads one value from a child-element expression.
    fn child_read(
        node: &StructType,
        field: &Field,
        kind: &ValueKind,
        source: &str,
        boxed: bool,
    ) -> String {
        let inner = match kind {
            ValueKind::Parsed => format!("{source}.parse_text()?"),
            ValueKind::Enum(e) => format!("{e}::from_xml_value({source}.text())?"),
            ValueKind::UnionText(u) => format!("{u}::from_xml_text({source}.text())?"),
            ValueKind::Struct(s) => format!("{s}::from_xml({source})?"),
            ValueKind::InlineList(list_inner) => match list_inner.as_ref() {
                ValueKind::Parsed => format!("{source}.parse_list()?"),
                _ => format!(
                    "{{ let child = {source}; {} }}",
                    Self::split_read(node, field, list_inner, "child.text()"),
                ),
            },
            _ => format!("{source}.text().to_owned()"),
        };

        if boxed {
            format!("Box::new({inner})")
        } else {
            inner
        }
    }

    /// Reads whitespace-separated items out of a text expression.
    fn split_read(node: &StructType, field: &Field, inner: &ValueKind, text: &str) -> String {
        match inner {
            ValueKind::Parsed => format!(
                "{text}.split_whitespace().map(|item| item.parse().map_err(|e| SoapError::deserialization(\"{}.{}\", e))).collect::<Result<Vec<_>, _>>()?",
                escape_str(&node.name),
                escape_str(&field.name),
            ),
            ValueKind::Enum(e) => format!(
                "{text}.split_whitespace().map({e}::from_xml_value).collect::<Result<Vec<_>, _>>()?"
            ),
            ValueKind::UnionText(u) => format!(
                "{text}.split_whitespace().map({u}::from_xml_text).collect::<Result<Vec<_>, _>>()?"
            ),
            _ => format!("{text}.split_whitespace().map(str::to_owned).collect()"),
        }
    }

    fn sibling_names(node: &StructType) -> String {
        node.fields
            .iter()
            .filter(|f| f.source == XmlSource::Element && !f.xml_name.is_empty())
            .map(|f| format!("\"{}\"", escape_str(&f.xml_name)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The statements serializing one field into `element`.
    fn write_statements(
        field: &Field,
        dispatch: &HashMap<String, UnionDispatch>,
    ) -> Vec<String> {
        let kind = value_kind(&field.data_type, dispatch);

        match field.source {
            XmlSource::Attribute => Self::attribute_write(field, &kind),
            XmlSource::Text => vec![format!(
                "element.set_text({});",
                Self::text_value(&kind, &format!("self.{}", field.name))
            )],
            XmlSource::Element => Self::element_write(field, &kind),
        }
    }

    /// An expression of type &str (or coercible) for the given value place.
    fn text_value(kind: &ValueKind, value: &str) -> String {
        match kind {
            ValueKind::Parsed => format!("&{value}.to_string()"),
            ValueKind::Enum(_) => format!("{value}.to_xml_value()"),
            ValueKind::UnionText(_) => format!("&{value}.to_xml_text()"),
            ValueKind::InlineList(inner) => format!("&{}", Self::join_value(inner, value)),
            _ => format!("&{value}"),
        }
    }

    fn join_value(inner: &ValueKind, value: &str) -> String {
        match inner {
            ValueKind::Parsed => format!(
                "{value}.iter().map(|item| item.to_string()).collect::<Vec<_>>().join(\" \")"
            ),
            ValueKind::Enum(_) => format!(
                "{value}.iter().map(|item| item.to_xml_value().to_owned()).collect::<Vec<_>>().join(\" \")"
            ),
            ValueKind::UnionText(_) => format!(
                "{value}.iter().map(|item| item.to_xml_text()).collect::<Vec<_>>().join(\" \")"
            ),
            _ => format!("{value}.join(\" \")"),
        }
    }

    fn attribute_write(field: &Field, kind: &ValueKind) -> Vec<String> {
        let name = escape_str(&field.xml_name);

        match field.cardinality {
            Cardinality::Optional => vec![format!(
                "if let Some(value) = &self.{} {{ element.set_attribute(\"{name}\", {}); }}",
                field.name,
                Self::text_value(kind, "value"),
            )],
            _ => vec![format!(
                "element.set_attribute(\"{name}\", {});",
                Self::text_value(kind, &format!("self.{}", field.name)),
            )],
        }
    }

    fn element_write(field: &Field, kind: &ValueKind) -> Vec<String> {
        if let ValueKind::UnionElement(_) = kind {
            return match field.cardinality {
                Cardinality::Required => vec![format!("self.{}.to_xml(element);", field.name)],
                Cardinality::Optional => vec![format!(
                    "if let Some(value) = &self.{} {{ value.to_xml(element); }}",
                    field.name
                )],
                Cardinality::List => vec![format!(
                    "for item in &self.{} {{ item.to_xml(element); }}",
                    field.name
                )],
            };
        }

        if matches!(kind, ValueKind::Raw) {
            return match field.cardinality {
                Cardinality::Required => vec![format!(
                    "element.push_element(self.{}.clone());",
                    field.name
                )],
                Cardinality::Optional => vec![format!(
                    "if let Some(value) = &self.{} {{ element.push_element(value.clone()); }}",
                    field.name
                )],
                Cardinality::List => vec![format!(
                    "for item in &self.{} {{ element.push_element(item.clone()); }}",
                    field.name
                )],
            };
        }

        match field.cardinality {
            Cardinality::Required => {
                vec![Self::child_write(kind, &field.xml_name, &format!("self.{}", field.name))]
            }
            Cardinality::Optional => vec![format!(
                "if let Some(value) = &self.{} {{ {} }}",
                field.name,
                Self::child_write(kind, &field.xml_name, "value"),
            )],
            Cardinality::List => vec![format!(
                "for item in &self.{} {{ {} }}",
                field.name,
                Self::child_write(kind, &field.xml_name, "item"),
            )],
        }
    }

    fn child_write(kind: &ValueKind, xml_name: &str, value: &str) -> String {
        let name = escape_str(xml_name);

        match kind {
            ValueKind::Struct(_) => {
                format!("{value}.to_xml(element.push_child(\"{name}\"));")
            }
            _ => format!(
                "element.push_child(\"{name}\").set_text({});",
                Self::text_value(kind, value)
            ),
        }
    }
}
