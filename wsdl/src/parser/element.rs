use std::io::BufRead;

use quick_xml::{events::BytesStart, events::Event, Reader};

use super::{
    annotations::AnnotationsParser,
    complex_type::ComplexTypeParser,
    helper::XmlHelper,
    schema::SchemaParser,
    simple_type::SimpleTypeParser,
    types::{ElementContent, ElementDecl, ParserError, SchemaNode, XSD_NAMESPACE},
};

/// Parser for xs:element declarations, top-level or inside a particle.
///
/// An element either names its type (`type="qn"`), carries an inline
/// anonymous type, or refers to another declaration (`ref="qn"`). Inline
/// types are hoisted to the top level of the schema under a name synthesized
/// from the container path.
pub struct ElementParser;

impl ElementParser {
    pub fn parse<B: BufRead>(
        reader: &mut Reader<B>,
        schema: &mut SchemaParser,
        start: &BytesStart<'static>,
        is_empty: bool,
        parent_local: Option<&str>,
        path: &str,
    ) -> Result<ElementDecl, ParserError> {
        let name = XmlHelper::get_attribute(start, "name")?;
        let reference = XmlHelper::get_attribute(start, "ref")?;
        let type_attribute = XmlHelper::get_attribute(start, "type")?;

        let path = format!(
            "{path}/element[{}]",
            name.as_deref().or(reference.as_deref()).unwrap_or("?")
        );

        let (min_occurs, max_occurs) = XmlHelper::get_occurs(start, &path)?;
        let nillable = XmlHelper::get_bool_attribute(start, "nillable", &path)?;
        let is_abstract = XmlHelper::get_bool_attribute(start, "abstract", &path)?;
        let substitution_group = XmlHelper::get_attribute(start, "substitutionGroup")?
            .map(|value| schema.context.resolve_qname(&value, &path))
            .transpose()?;

        if reference.is_some() && (name.is_some() || type_attribute.is_some()) {
            return Err(ParserError::MalformedSchema(
                path,
                "ref may not be combined with name or type".to_owned(),
            ));
        }

        let mut content = type_attribute
            .map(|value| schema.context.resolve_qname(&value, &path))
            .transpose()?
            .map(ElementContent::TypeRef);

        let mut documentations = Vec::new();

        if !is_empty {
            let mut buf = Vec::new();

            loop {
                match reader.read_event_into(&mut buf) {
                    Ok(Event::Start(s)) => {
                        let element = s.to_owned();
                        schema.context.collect_bindings(&element)?;
                        let (namespace, local) =
                            schema.context.resolve_tag(element.name().as_ref());

                        if namespace != XSD_NAMESPACE {
                            reader
                                .read_to_end_into(element.name(), &mut Vec::new())
                                .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                            buf.clear();
                            continue;
                        }

                        match local.as_str() {
                            "annotation" => {
                                let mut values =
                                    AnnotationsParser::parse(reader, &schema.context, &path)?;
                                documentations.append(&mut values);
                            }
                            "complexType" | "simpleType" => {
                                if content.is_some() {
                                    return Err(ParserError::MalformedSchema(
                                        path,
                                        "element carries both a type attribute and an inline type"
                                            .to_owned(),
                                    ));
                                }

                                let Some(name) = name.as_deref() else {
                                    return Err(ParserError::MalformedSchema(
                                        path,
                                        "anonymous type on an element without a name".to_owned(),
                                    ));
                                };

                                let synthesized =
                                    schema.synthesize_name(parent_local, name);
                                let qualified = schema.context.target_qualified(&synthesized);

                                if local == "complexType" {
                                    let decl = ComplexTypeParser::parse(
                                        reader,
                                        schema,
                                        qualified.clone(),
                                        &path,
                                    )?;
                                    schema.hoist(SchemaNode::ComplexType(decl));
                                } else {
                                    let decl = SimpleTypeParser::parse(
                                        reader,
                                        schema,
                                        qualified.clone(),
                                        &path,
                                    )?;
                                    schema.hoist(SchemaNode::SimpleType(decl));
                                }

                                content = Some(ElementContent::TypeRef(qualified));
                            }
                            other => {
                                return Err(ParserError::UnsupportedConstruct(
                                    path,
                                    other.to_owned(),
                                ));
                            }
                        }
                    }
                    Ok(Event::End(e)) => {
                        let (namespace, local) = schema.context.resolve_tag(e.name().as_ref());

                        if namespace == XSD_NAMESPACE && local == "element" {
                            break;
                        }
                    }
                    Ok(Event::Eof) => {
                        return Err(ParserError::MalformedSchema(
                            path,
                            "unexpected end of document".to_owned(),
                        ));
                    }
                    Err(e) => return Err(ParserError::XmlParse(path, e)),
                    _ => (),
                }

                buf.clear();
            }
        }

        if let Some(reference) = reference {
            let target = schema.context.resolve_qname(&reference, &path)?;

            return Ok(ElementDecl {
                name: target.clone(),
                content: ElementContent::Ref(target),
                nillable,
                min_occurs,
                max_occurs,
                is_abstract,
                substitution_group,
                documentations,
            });
        }

        let Some(name) = name else {
            return Err(ParserError::MalformedSchema(
                path,
                "missing required attribute \"name\"".to_owned(),
            ));
        };

        let Some(content) = content else {
            return Err(ParserError::MalformedSchema(
                path,
                "element declares neither a type, a ref nor an inline type".to_owned(),
            ));
        };

        Ok(ElementDecl {
            name: schema.context.target_qualified(&name),
            content,
            nillable,
            min_occurs,
            max_occurs,
            is_abstract,
            substitution_group,
            documentations,
        })
    }
}
