use std::io::Write;

use crate::generator::{
    code_generator_trait::CodeGenError,
    types::{ServiceClient, ServiceOperation},
};

use super::{code_writer::CodeWriter, helper::escape_str};

/// Emits one typed client per service port. Every operation builds the body
/// element, posts it with its soapAction through the runtime client, and
/// deserializes the response body child; SOAP faults surface as errors from
/// the runtime.
pub(crate) struct ClientCodeGenerator;

impl ClientCodeGenerator {
    pub(crate) fn generate<T: Write>(
        writer: &mut CodeWriter<T>,
        client: &ServiceClient,
    ) -> Result<(), CodeGenError> {
        writer.write_documentation(&client.documentations, None)?;
        writer.writeln_fmt(
            format_args!("/// Client for the {} port.", client.name),
            None,
        )?;
        writer.writeln("#[derive(Debug, Clone)]", None)?;
        writer.writeln_fmt(format_args!("pub struct {} {{", client.name), None)?;
        writer.writeln("client: soap::Client,", Some(4))?;
        writer.writeln("}", None)?;
        writer.newline()?;

        writer.writeln_fmt(format_args!("impl {} {{", client.name), None)?;

        writer.writeln("/// Connects to the address the service declares.", Some(4))?;
        writer.writeln("pub fn new() -> Self {", Some(4))?;
        writer.writeln_fmt(
            format_args!("Self::with_endpoint(\"{}\")", escape_str(&client.endpoint)),
            Some(8),
        )?;
        writer.writeln("}", Some(4))?;
        writer.newline()?;

        writer.writeln("pub fn with_endpoint(endpoint: &str) -> Self {", Some(4))?;
        writer.writeln("Self {", Some(8))?;
        writer.writeln("client: soap::Client::new(endpoint),", Some(12))?;
        writer.writeln("}", Some(8))?;
        writer.writeln("}", Some(4))?;
        writer.newline()?;

        writer.writeln(
            "/// Appends a default SOAP header sent with every call.",
            Some(4),
        )?;
        writer.writeln("pub fn push_header(&mut self, header: Element) {", Some(4))?;
        writer.writeln("self.client.push_header(header);", Some(8))?;
        writer.writeln("}", Some(4))?;

        for operation in &client.operations {
            writer.newline()?;
            Self::generate_operation(writer, operation)?;
        }

        writer.writeln("}", None)?;
        writer.newline()?;

        writer.writeln_fmt(format_args!("impl Default for {} {{", client.name), None)?;
        writer.writeln("fn default() -> Self {", Some(4))?;
        writer.writeln("Self::new()", Some(8))?;
        writer.writeln("}", Some(4))?;
        writer.writeln("}", None)?;

        Ok(())
    }

    fn generate_operation<T: Write>(
        writer: &mut CodeWriter<T>,
        operation: &ServiceOperation,
    ) -> Result<(), CodeGenError> {
        writer.write_documentation(&operation.documentations, Some(4))?;

        if !operation.faults.is_empty() {
            writer.writeln_fmt(
                format_args!("/// Declared faults: {}.", operation.faults.join(", ")),
                Some(4),
            )?;
        }

        let return_type = match &operation.output {
            Some(output) => format!("Result<{output}, SoapError>"),
            None => "Result<(), SoapError>".to_owned(),
        };

        writer.writeln_fmt(
            format_args!(
                "pub fn {}(&self, input: {}) -> {return_type} {{",
                operation.name, operation.input
            ),
            Some(4),
        )?;

        let (namespace, local) = &operation.input_element;

        if namespace.is_empty() {
            writer.writeln_fmt(
                format_args!("let mut body = Element::new(\"{}\");", escape_str(local)),
                Some(8),
            )?;
        } else {
            writer.writeln_fmt(
                format_args!(
                    "let mut body = Element::qualified(\"{}\", \"{}\");",
                    escape_str(local),
                    escape_str(namespace)
                ),
                Some(8),
            )?;
        }

        writer.writeln("input.to_xml(&mut body);", Some(8))?;
        writer.newline()?;

        match (&operation.output, &operation.output_element) {
            (Some(output), Some((_, output_local))) => {
                writer.writeln_fmt(
                    format_args!(
                        "let response = self.client.call(\"{}\", body)?;",
                        escape_str(&operation.soap_action)
                    ),
                    Some(8),
                )?;
                writer.newline()?;
                writer.writeln_fmt(
                    format_args!(
                        "{output}::from_xml(response.body_child(\"{}\")?)",
                        escape_str(output_local)
                    ),
                    Some(8),
                )?;
            }
            _ => {
                writer.writeln_fmt(
                    format_args!(
                        "self.client.call(\"{}\", body)?;",
                        escape_str(&operation.soap_action)
                    ),
                    Some(8),
                )?;
                writer.newline()?;
                writer.writeln("Ok(())", Some(8))?;
            }
        }

        writer.writeln("}", Some(4))?;

        Ok(())
    }
}
