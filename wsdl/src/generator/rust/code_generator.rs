use std::io::{BufWriter, Write};

use crate::generator::{
    code_generator_trait::{CodeGenError, CodeGenerator},
    internal_representation::InternalRepresentation,
    types::IrNode,
};

use super::{
    alias_code_gen::TypeAliasCodeGenerator, client_code_gen::ClientCodeGenerator,
    code_writer::CodeWriter, enum_code_gen::EnumCodeGenerator,
    helper::union_dispatch_table, struct_code_gen::StructCodeGenerator,
    union_type_code_gen::UnionTypeCodeGenerator,
};

/// The Rust code generator.
///
/// A deterministic pretty-printer over the IR: identical input produces
/// byte-identical output. Types are written in the IR's emission order, so
/// the output never forward-references a non-cyclic type, then one client
/// per service port.
///
/// # Examples
///
/// ```no_run
/// use std::io::BufWriter;
///
/// use wsdl::generator::{
///     code_generator_trait::{CodeGenOptions, CodeGenerator},
///     internal_representation::InternalRepresentation,
///     rust::code_generator::RustCodeGenerator,
/// };
/// use wsdl::parser::reader::DocumentReader;
/// use wsdl::resolver;
///
/// let description = DocumentReader::new().load("service.wsdl").unwrap();
/// let resolved = resolver::resolve(description).unwrap();
/// let ir = InternalRepresentation::build(&resolved, &CodeGenOptions::default());
///
/// let mut generator = RustCodeGenerator::new(BufWriter::new(Vec::new()), ir);
/// generator.generate().unwrap();
/// ```
pub struct RustCodeGenerator<T: Write> {
    writer: CodeWriter<T>,
    internal_representation: InternalRepresentation,
}

impl<T: Write> RustCodeGenerator<T> {
    /// Hands back the sink once generation is done.
    pub fn into_inner(self) -> Result<T, CodeGenError> {
        self.writer
            .buffer
            .into_inner()
            .map_err(|e| CodeGenError::IOError(e.into_error()))
    }
}

impl<T> CodeGenerator<T> for RustCodeGenerator<T>
where
    T: Write,
{
    fn new(buffer: BufWriter<T>, internal_representation: InternalRepresentation) -> Self {
        Self {
            writer: CodeWriter { buffer },
            internal_representation,
        }
    }

    fn generate(&mut self) -> Result<(), CodeGenError> {
        let dispatch = union_dispatch_table(&self.internal_representation.nodes);

        self.writer
            .writeln("// Generated SOAP client types. Do not edit by hand.", None)?;
        self.writer.writeln("#![allow(non_snake_case)]", None)?;
        self.writer.writeln("#![allow(non_camel_case_types)]", None)?;
        self.writer.writeln("#![allow(dead_code)]", None)?;
        self.writer.writeln("#![allow(unused_imports)]", None)?;
        self.writer.writeln("#![allow(clippy::all)]", None)?;
        self.writer.newline()?;
        self.writer
            .writeln("use soap::{Element, FromXml, SoapError, ToXml};", None)?;

        for node in &self.internal_representation.nodes {
            self.writer.newline()?;

            match node {
                IrNode::Struct(node) => {
                    StructCodeGenerator::generate(&mut self.writer, node, &dispatch)?;
                }
                IrNode::Enum(node) => EnumCodeGenerator::generate(&mut self.writer, node)?,
                IrNode::Alias(node) => {
                    TypeAliasCodeGenerator::generate(&mut self.writer, node)?;
                }
                IrNode::Union(node) => {
                    UnionTypeCodeGenerator::generate(&mut self.writer, node, &dispatch)?;
                }
            }
        }

        for client in &self.internal_representation.clients {
            self.writer.newline()?;
            ClientCodeGenerator::generate(&mut self.writer, client)?;
        }

        self.writer.buffer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::types::{
        Cardinality, DataType, Enumeration, EnumerationValue, Field, StructType, XmlSource,
    };

    fn generate(ir: InternalRepresentation) -> String {
        let mut generator = RustCodeGenerator::new(BufWriter::new(Vec::new()), ir);
        generator.generate().unwrap();

        String::from_utf8(generator.writer.get_writer().unwrap().clone()).unwrap()
    }

    #[test]
    fn emits_struct_with_bridge_impls() {
        let ir = InternalRepresentation {
            nodes: vec![IrNode::Struct(StructType {
                name: "Invoice".to_owned(),
                xml_name: "Invoice".to_owned(),
                namespace: "urn:billing".to_owned(),
                fields: vec![
                    Field {
                        name: "id".to_owned(),
                        xml_name: "id".to_owned(),
                        data_type: DataType::LongInteger,
                        cardinality: Cardinality::Required,
                        boxed: false,
                        source: XmlSource::Element,
                        documentations: vec![],
                    },
                    Field {
                        name: "note".to_owned(),
                        xml_name: "note".to_owned(),
                        data_type: DataType::String,
                        cardinality: Cardinality::Optional,
                        boxed: false,
                        source: XmlSource::Element,
                        documentations: vec![],
                    },
                ],
                documentations: vec![],
            })],
            clients: vec![],
            warnings: vec![],
        };

        let output = generate(ir);

        assert!(output.contains("pub struct Invoice {"));
        assert!(output.contains("pub id: i64,"));
        assert!(output.contains("pub note: Option<String>,"));
        assert!(output.contains("impl FromXml for Invoice {"));
        assert!(output.contains("element.required_child(\"id\")?.parse_text()?"));
        assert!(output.contains("impl ToXml for Invoice {"));
    }

    #[test]
    fn emits_string_enum_helpers() {
        let ir = InternalRepresentation {
            nodes: vec![IrNode::Enum(Enumeration {
                name: "Color".to_owned(),
                xml_name: "Color".to_owned(),
                values: vec![
                    EnumerationValue {
                        variant_name: "Red".to_owned(),
                        xml_value: "red".to_owned(),
                        documentations: vec![],
                    },
                    EnumerationValue {
                        variant_name: "Green".to_owned(),
                        xml_value: "green".to_owned(),
                        documentations: vec![],
                    },
                ],
                documentations: vec![],
            })],
            clients: vec![],
            warnings: vec![],
        };

        let output = generate(ir);

        assert!(output.contains("pub enum Color {"));
        assert!(output.contains("\"red\" => Ok(Self::Red),"));
        assert!(output.contains("Self::Green => \"green\","));
    }

    #[test]
    fn identical_input_produces_identical_output() {
        let build = || InternalRepresentation {
            nodes: vec![IrNode::Enum(Enumeration {
                name: "Color".to_owned(),
                xml_name: "Color".to_owned(),
                values: vec![EnumerationValue {
                    variant_name: "Red".to_owned(),
                    xml_value: "red".to_owned(),
                    documentations: vec![],
                }],
                documentations: vec![],
            })],
            clients: vec![],
            warnings: vec![],
        };

        assert_eq!(generate(build()), generate(build()));
    }
}
