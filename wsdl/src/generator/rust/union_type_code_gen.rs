use std::{collections::HashMap, io::Write};

use crate::generator::{
    code_generator_trait::CodeGenError,
    types::{UnionDispatch, UnionType, UnionVariant},
};

use super::{
    code_writer::CodeWriter,
    helper::{escape_str, rust_type, value_kind, ValueKind},
};

/// Emits one sum type. Element-dispatching unions (choice particles and
/// substitution groups) read and write against the parent element;
/// text-dispatching unions (xs:union) try their variants against one text
/// value in declaration order.
pub(crate) struct UnionTypeCodeGenerator;

impl UnionTypeCodeGenerator {
    pub(crate) fn generate<T: Write>(
        writer: &mut CodeWriter<T>,
        node: &UnionType,
        dispatch: &HashMap<String, UnionDispatch>,
    ) -> Result<(), CodeGenError> {
        writer.write_documentation(&node.documentations, None)?;
        writer.writeln("#[derive(Debug, Clone, PartialEq)]", None)?;
        writer.writeln_fmt(format_args!("pub enum {} {{", node.name), None)?;

        for variant in &node.variants {
            let payload = if variant.boxed {
                format!("Box<{}>", rust_type(&variant.data_type))
            } else {
                rust_type(&variant.data_type)
            };

            writer.writeln_fmt(format_args!("{}({payload}),", variant.name), Some(4))?;
        }

        writer.writeln("}", None)?;
        writer.newline()?;

        match node.dispatch {
            UnionDispatch::Element => Self::generate_element_impl(writer, node, dispatch),
            UnionDispatch::Text => Self::generate_text_impl(writer, node, dispatch),
        }
    }

    fn generate_element_impl<T: Write>(
        writer: &mut CodeWriter<T>,
        node: &UnionType,
        dispatch: &HashMap<String, UnionDispatch>,
    ) -> Result<(), CodeGenError> {
        writer.writeln_fmt(format_args!("impl {} {{", node.name), None)?;

        writer.writeln(
            "fn from_child(child: &Element) -> Result<Option<Self>, SoapError> {",
            Some(4),
        )?;
        writer.writeln("match child.name() {", Some(8))?;

        let mut wildcard = None::<&UnionVariant>;

        for variant in &node.variants {
            let kind = value_kind(&variant.data_type, dispatch);

            if matches!(kind, ValueKind::Raw) {
                wildcard = Some(variant);
                continue;
            }

            writer.writeln_fmt(
                format_args!(
                    "\"{}\" => Ok(Some(Self::{}({}))),",
                    escape_str(&variant.xml_name),
                    variant.name,
                    Self::variant_read(&kind, variant.boxed),
                ),
                Some(12),
            )?;
        }

        match wildcard {
            Some(variant) => writer.writeln_fmt(
                format_args!("_ => Ok(Some(Self::{}(child.clone()))),", variant.name),
                Some(12),
            )?,
            None => writer.writeln("_ => Ok(None),", Some(12))?,
        }

        writer.writeln("}", Some(8))?;
        writer.writeln("}", Some(4))?;
        writer.newline()?;

        writer.writeln(
            "pub fn from_xml(element: &Element) -> Result<Self, SoapError> {",
            Some(4),
        )?;
        writer.writeln_fmt(
            format_args!(
                "Self::try_from_xml(element)?.ok_or_else(|| SoapError::deserialization(\"{}\", \"no alternative element found\"))",
                escape_str(&node.name)
            ),
            Some(8),
        )?;
        writer.writeln("}", Some(4))?;
        writer.newline()?;

        writer.writeln(
            "pub fn try_from_xml(element: &Element) -> Result<Option<Self>, SoapError> {",
            Some(4),
        )?;
        writer.writeln("for child in element.children() {", Some(8))?;
        writer.writeln("if let Some(value) = Self::from_child(child)? {", Some(12))?;
        writer.writeln("return Ok(Some(value));", Some(16))?;
        writer.writeln("}", Some(12))?;
        writer.writeln("}", Some(8))?;
        writer.newline()?;
        writer.writeln("Ok(None)", Some(8))?;
        writer.writeln("}", Some(4))?;
        writer.newline()?;

        writer.writeln(
            "pub fn collect_from_xml(element: &Element) -> Result<Vec<Self>, SoapError> {",
            Some(4),
        )?;
        writer.writeln("let mut values = Vec::new();", Some(8))?;
        writer.newline()?;
        writer.writeln("for child in element.children() {", Some(8))?;
        writer.writeln("if let Some(value) = Self::from_child(child)? {", Some(12))?;
        writer.writeln("values.push(value);", Some(16))?;
        writer.writeln("}", Some(12))?;
        writer.writeln("}", Some(8))?;
        writer.newline()?;
        writer.writeln("Ok(values)", Some(8))?;
        writer.writeln("}", Some(4))?;
        writer.newline()?;

        writer.writeln("pub fn to_xml(&self, element: &mut Element) {", Some(4))?;

        if node.variants.is_empty() {
            writer.writeln("let _ = element;", Some(8))?;
            writer.writeln("match *self {}", Some(8))?;
        } else {
            writer.writeln("match self {", Some(8))?;

            for variant in &node.variants {
                let kind = value_kind(&variant.data_type, dispatch);
                writer.writeln_fmt(
                    format_args!(
                        "Self::{}(value) => {}",
                        variant.name,
                        Self::variant_write(&kind, &variant.xml_name),
                    ),
                    Some(12),
                )?;
            }

            writer.writeln("}", Some(8))?;
        }

        writer.writeln("}", Some(4))?;
        writer.writeln("}", None)?;

        Ok(())
    }

    fn variant_read(kind: &ValueKind, boxed: bool) -> String {
        let inner = match kind {
            ValueKind::Parsed => "child.parse_text()?".to_owned(),
            ValueKind::Enum(e) => format!("{e}::from_xml_value(child.text())?"),
            ValueKind::UnionText(u) => format!("{u}::from_xml_text(child.text())?"),
            ValueKind::Struct(s) | ValueKind::UnionElement(s) => {
                format!("{s}::from_xml(child)?")
            }
            ValueKind::InlineList(list_inner) => match list_inner.as_ref() {
                ValueKind::Parsed => "child.parse_list()?".to_owned(),
                _ => "child.text().split_whitespace().map(str::to_owned).collect()".to_owned(),
            },
            _ => "child.text().to_owned()".to_owned(),
        };

        if boxed {
            format!("Box::new({inner})")
        } else {
            inner
        }
    }

    fn variant_write(kind: &ValueKind, xml_name: &str) -> String {
        let name = escape_str(xml_name);

        match kind {
            ValueKind::Struct(_) | ValueKind::UnionElement(_) => {
                format!("value.to_xml(element.push_child(\"{name}\")),")
            }
            ValueKind::Raw => "element.push_element(value.clone()),".to_owned(),
            ValueKind::Parsed => format!(
                "element.push_child(\"{name}\").set_text(&value.to_string()),"
            ),
            ValueKind::Enum(_) => format!(
                "element.push_child(\"{name}\").set_text(value.to_xml_value()),"
            ),
            ValueKind::UnionText(_) => format!(
                "element.push_child(\"{name}\").set_text(&value.to_xml_text()),"
            ),
            ValueKind::InlineList(_) => format!(
                "element.push_child(\"{name}\").set_text(&value.iter().map(|item| item.to_string()).collect::<Vec<_>>().join(\" \")),"
            ),
            _ => format!("element.push_child(\"{name}\").set_text(value),"),
        }
    }

    fn generate_text_impl<T: Write>(
        writer: &mut CodeWriter<T>,
        node: &UnionType,
        dispatch: &HashMap<String, UnionDispatch>,
    ) -> Result<(), CodeGenError> {
        writer.writeln_fmt(format_args!("impl {} {{", node.name), None)?;

        writer.writeln(
            "pub fn from_xml_text(value: &str) -> Result<Self, SoapError> {",
            Some(4),
        )?;

        let mut matched_all = false;

        for variant in &node.variants {
            let kind = value_kind(&variant.data_type, dispatch);

            match kind {
                ValueKind::Parsed => {
                    writer.writeln_fmt(
                        format_args!(
                            "if let Ok(parsed) = value.trim().parse() {{ return Ok(Self::{}(parsed)); }}",
                            variant.name
                        ),
                        Some(8),
                    )?;
                }
                ValueKind::Enum(e) => {
                    writer.writeln_fmt(
                        format_args!(
                            "if let Ok(parsed) = {e}::from_xml_value(value) {{ return Ok(Self::{}(parsed)); }}",
                            variant.name
                        ),
                        Some(8),
                    )?;
                }
                _ => {
                    // a textual variant accepts anything, it has to come last
                    writer.writeln_fmt(
                        format_args!("Ok(Self::{}(value.to_owned()))", variant.name),
                        Some(8),
                    )?;
                    matched_all = true;
                    break;
                }
            }
        }

        if !matched_all {
            writer.writeln_fmt(
                format_args!(
                    "Err(SoapError::deserialization(\"{}\", \"no union variant matched\"))",
                    escape_str(&node.name)
                ),
                Some(8),
            )?;
        }

        writer.writeln("}", Some(4))?;
        writer.newline()?;

        writer.writeln("pub fn to_xml_text(&self) -> String {", Some(4))?;

        if node.variants.is_empty() {
            writer.writeln("match *self {}", Some(8))?;
        } else {
            writer.writeln("match self {", Some(8))?;

            for variant in &node.variants {
                let kind = value_kind(&variant.data_type, dispatch);

                let expression = match kind {
                    ValueKind::Parsed => "value.to_string()",
                    ValueKind::Enum(_) => "value.to_xml_value().to_owned()",
                    _ => "value.clone()",
                };

                writer.writeln_fmt(
                    format_args!("Self::{}(value) => {expression},", variant.name),
                    Some(12),
                )?;
            }

            writer.writeln("}", Some(8))?;
        }

        writer.writeln("}", Some(4))?;
        writer.writeln("}", None)?;

        Ok(())
    }
}
