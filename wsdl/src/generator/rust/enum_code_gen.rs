use std::io::Write;

use crate::generator::{code_generator_trait::CodeGenError, types::Enumeration};

use super::{code_writer::CodeWriter, helper::escape_str};

/// Emits one string enumeration with its value-mapping helpers.
pub(crate) struct EnumCodeGenerator;

impl EnumCodeGenerator {
    pub(crate) fn generate<T: Write>(
        writer: &mut CodeWriter<T>,
        node: &Enumeration,
    ) -> Result<(), CodeGenError> {
        writer.write_documentation(&node.documentations, None)?;
        writer.writeln("#[derive(Debug, Clone, Copy, PartialEq, Eq)]", None)?;
        writer.writeln_fmt(format_args!("pub enum {} {{", node.name), None)?;

        for value in &node.values {
            writer.write_documentation(&value.documentations, Some(4))?;
            writer.writeln_fmt(format_args!("{},", value.variant_name), Some(4))?;
        }

        writer.writeln("}", None)?;
        writer.newline()?;

        writer.writeln_fmt(format_args!("impl {} {{", node.name), None)?;

        writer.writeln(
            "pub fn from_xml_value(value: &str) -> Result<Self, SoapError> {",
            Some(4),
        )?;
        writer.writeln("match value {", Some(8))?;
        for value in &node.values {
            writer.writeln_fmt(
                format_args!(
                    "\"{}\" => Ok(Self::{}),",
                    escape_str(&value.xml_value),
                    value.variant_name
                ),
                Some(12),
            )?;
        }
        writer.writeln_fmt(
            format_args!(
                "other => Err(SoapError::deserialization(\"{}\", format!(\"\\\"{{other}}\\\" is not a known value\"))),",
                escape_str(&node.name)
            ),
            Some(12),
        )?;
        writer.writeln("}", Some(8))?;
        writer.writeln("}", Some(4))?;
        writer.newline()?;

        writer.writeln("pub fn to_xml_value(&self) -> &'static str {", Some(4))?;

        if node.values.is_empty() {
            writer.writeln("match *self {}", Some(8))?;
        } else {
            writer.writeln("match self {", Some(8))?;
            for value in &node.values {
                writer.writeln_fmt(
                    format_args!(
                        "Self::{} => \"{}\",",
                        value.variant_name,
                        escape_str(&value.xml_value)
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
}
