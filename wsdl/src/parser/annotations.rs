use std::io::BufRead;

use quick_xml::{events::Event, Reader};

use super::{
    helper::NamespaceContext,
    types::{ParserError, XSD_NAMESPACE},
};

/// Parser for xs:annotation elements
///
/// Collects the text of every xs:documentation child. Everything else inside
/// the annotation (appinfo, foreign markup) is skipped.
pub struct AnnotationsParser;

impl AnnotationsParser {
    pub fn parse<B: BufRead>(
        reader: &mut Reader<B>,
        context: &NamespaceContext,
        path: &str,
    ) -> Result<Vec<String>, ParserError> {
        let mut values = Vec::new();
        let mut buf = Vec::new();
        let mut in_documentation = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s)) => {
                    let (namespace, local) = context.resolve_tag(s.name().as_ref());

                    if namespace == XSD_NAMESPACE && local == "documentation" {
                        in_documentation = true;
                    }
                }
                Ok(Event::Text(text)) if in_documentation => {
                    let text = text.unescape().map_err(|e| {
                        ParserError::XmlParse(format!("{path}/annotation"), e)
                    })?;
                    let text = text.trim();

                    if !text.is_empty() {
                        values.push(text.to_owned());
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = context.resolve_tag(e.name().as_ref());

                    if namespace == XSD_NAMESPACE {
                        match local.as_str() {
                            "documentation" => in_documentation = false,
                            "annotation" => break,
                            _ => (),
                        }
                    }
                }
                Ok(Event::Eof) => {
                    return Err(ParserError::MalformedSchema(
                        format!("{path}/annotation"),
                        "unexpected end of document".to_owned(),
                    ));
                }
                Err(e) => return Err(ParserError::XmlParse(format!("{path}/annotation"), e)),
                _ => (),
            }

            buf.clear();
        }

        Ok(values)
    }
}
