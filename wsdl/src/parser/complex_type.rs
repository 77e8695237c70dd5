use std::io::BufRead;

use quick_xml::{events::BytesStart, events::Event, Reader};

use super::{
    annotations::AnnotationsParser,
    element::ElementParser,
    helper::XmlHelper,
    schema::SchemaParser,
    types::{
        AttributeDecl, AttributeUse, ComplexContent, ComplexTypeDecl, Occurs, ParserError,
        Particle, ParticleTerm, QualifiedName, XSD_NAMESPACE,
    },
};

/// Parser for xs:complexType elements
///
/// Recognizes, in order of precedence: simpleContent (extension of a simple
/// base), complexContent (extension/restriction of a complex base), or a
/// bare particle. Attributes declared directly or inside an extension are
/// accumulated into the flat attribute set of the type; base-type attributes
/// are prepended during resolution.
pub struct ComplexTypeParser;

impl ComplexTypeParser {
    /// A complex type without any content model, e.g. `<xs:complexType name="Empty"/>`.
    pub fn empty(name: QualifiedName) -> ComplexTypeDecl {
        ComplexTypeDecl {
            name,
            base: None,
            content: ComplexContent::Empty,
            attributes: Vec::new(),
            attribute_groups: Vec::new(),
            documentations: Vec::new(),
        }
    }

    pub fn parse<B: BufRead>(
        reader: &mut Reader<B>,
        schema: &mut SchemaParser,
        name: QualifiedName,
        path: &str,
    ) -> Result<ComplexTypeDecl, ParserError> {
        let path = format!("{path}/complexType[{}]", name.local);

        let mut base = None::<QualifiedName>;
        let mut content = ComplexContent::Empty;
        let mut attributes = Vec::new();
        let mut attribute_groups = Vec::new();
        let mut documentations = Vec::new();
        let mut in_simple_content = false;
        let mut in_complex_content = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s)) => {
                    let element = s.to_owned();
                    schema.context.collect_bindings(&element)?;
                    let (namespace, local) = schema.context.resolve_tag(element.name().as_ref());

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
                        "simpleContent" => {
                            if in_simple_content || in_complex_content {
                                return Err(ParserError::MalformedSchema(
                                    path,
                                    "nested content model".to_owned(),
                                ));
                            }

                            in_simple_content = true;
                        }
                        "complexContent" => {
                            if in_simple_content || in_complex_content {
                                return Err(ParserError::MalformedSchema(
                                    path,
                                    "nested content model".to_owned(),
                                ));
                            }

                            in_complex_content = true;
                        }
                        "extension" | "restriction" => {
                            let value = XmlHelper::require_attribute(&element, "base", &path)?;
                            let base_name = schema.context.resolve_qname(&value, &path)?;

                            if in_simple_content {
                                content = ComplexContent::Simple(base_name);
                            } else if in_complex_content {
                                base = Some(base_name);
                            } else {
                                return Err(ParserError::MalformedSchema(
                                    path,
                                    format!("{local} outside simpleContent or complexContent"),
                                ));
                            }
                        }
                        "sequence" | "choice" | "all" => {
                            if matches!(content, ComplexContent::Particle(_)) {
                                return Err(ParserError::MalformedSchema(
                                    path,
                                    "more than one content model".to_owned(),
                                ));
                            }

                            let (min_occurs, max_occurs) =
                                XmlHelper::get_occurs(&element, &path)?;
                            let particle = Self::parse_compositor(
                                reader,
                                schema,
                                &local,
                                min_occurs,
                                max_occurs,
                                &name.local,
                                &path,
                            )?;

                            content = ComplexContent::Particle(particle);
                        }
                        "group" => {
                            let value = XmlHelper::require_attribute(&element, "ref", &path)?;
                            let target = schema.context.resolve_qname(&value, &path)?;
                            let (min_occurs, max_occurs) =
                                XmlHelper::get_occurs(&element, &path)?;

                            content = ComplexContent::Particle(Particle {
                                term: ParticleTerm::GroupRef(target),
                                min_occurs,
                                max_occurs,
                            });
                            reader
                                .read_to_end_into(element.name(), &mut Vec::new())
                                .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                        }
                        "attribute" => {
                            if let Some(decl) = parse_attribute_decl(&element, schema, &path)? {
                                attributes.push(decl);
                            }

                            reader
                                .read_to_end_into(element.name(), &mut Vec::new())
                                .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                        }
                        "attributeGroup" => {
                            let value = XmlHelper::require_attribute(&element, "ref", &path)?;
                            attribute_groups.push(schema.context.resolve_qname(&value, &path)?);
                            reader
                                .read_to_end_into(element.name(), &mut Vec::new())
                                .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                        }
                        "anyAttribute" => {
                            schema.warn(format!("ignoring anyAttribute at {path}"));
                            reader
                                .read_to_end_into(element.name(), &mut Vec::new())
                                .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                        }
                        other => {
                            return Err(ParserError::UnsupportedConstruct(
                                path,
                                other.to_owned(),
                            ));
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = e.to_owned();
                    schema.context.collect_bindings(&element)?;
                    let (namespace, local) = schema.context.resolve_tag(element.name().as_ref());

                    if namespace != XSD_NAMESPACE {
                        buf.clear();
                        continue;
                    }

                    match local.as_str() {
                        "extension" | "restriction" => {
                            let value = XmlHelper::require_attribute(&element, "base", &path)?;
                            let base_name = schema.context.resolve_qname(&value, &path)?;

                            if in_simple_content {
                                content = ComplexContent::Simple(base_name);
                            } else if in_complex_content {
                                base = Some(base_name);
                            } else {
                                return Err(ParserError::MalformedSchema(
                                    path,
                                    format!("{local} outside simpleContent or complexContent"),
                                ));
                            }
                        }
                        "sequence" | "choice" | "all" => {
                            let (min_occurs, max_occurs) =
                                XmlHelper::get_occurs(&element, &path)?;
                            let term = compositor_term(&local, Vec::new());

                            content = ComplexContent::Particle(Particle {
                                term,
                                min_occurs,
                                max_occurs,
                            });
                        }
                        "group" => {
                            let value = XmlHelper::require_attribute(&element, "ref", &path)?;
                            let target = schema.context.resolve_qname(&value, &path)?;
                            let (min_occurs, max_occurs) =
                                XmlHelper::get_occurs(&element, &path)?;

                            content = ComplexContent::Particle(Particle {
                                term: ParticleTerm::GroupRef(target),
                                min_occurs,
                                max_occurs,
                            });
                        }
                        "attribute" => {
                            if let Some(decl) = parse_attribute_decl(&element, schema, &path)? {
                                attributes.push(decl);
                            }
                        }
                        "attributeGroup" => {
                            let value = XmlHelper::require_attribute(&element, "ref", &path)?;
                            attribute_groups.push(schema.context.resolve_qname(&value, &path)?);
                        }
                        "anyAttribute" => {
                            schema.warn(format!("ignoring anyAttribute at {path}"));
                        }
                        _ => (),
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = schema.context.resolve_tag(e.name().as_ref());

                    if namespace == XSD_NAMESPACE {
                        match local.as_str() {
                            "complexType" => break,
                            "simpleContent" => in_simple_content = false,
                            "complexContent" => in_complex_content = false,
                            _ => (),
                        }
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

        Ok(ComplexTypeDecl {
            name,
            base,
            content,
            attributes,
            attribute_groups,
            documentations,
        })
    }

    /// Parses the children of a sequence/choice/all compositor whose start
    /// tag has already been read.
    pub(crate) fn parse_compositor<B: BufRead>(
        reader: &mut Reader<B>,
        schema: &mut SchemaParser,
        kind: &str,
        min_occurs: u32,
        max_occurs: Occurs,
        parent_local: &str,
        path: &str,
    ) -> Result<Particle, ParserError> {
        let path = format!("{path}/{kind}");
        let mut children = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s)) => {
                    let element = s.to_owned();
                    schema.context.collect_bindings(&element)?;
                    let (namespace, local) = schema.context.resolve_tag(element.name().as_ref());

                    if namespace != XSD_NAMESPACE {
                        reader
                            .read_to_end_into(element.name(), &mut Vec::new())
                            .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                        buf.clear();
                        continue;
                    }

                    match local.as_str() {
                        "element" => {
                            let decl = ElementParser::parse(
                                reader,
                                schema,
                                &element,
                                false,
                                Some(parent_local),
                                &path,
                            )?;

                            children.push(element_particle(decl));
                        }
                        "sequence" | "choice" | "all" => {
                            let (child_min, child_max) =
                                XmlHelper::get_occurs(&element, &path)?;
                            let particle = Self::parse_compositor(
                                reader,
                                schema,
                                &local,
                                child_min,
                                child_max,
                                parent_local,
                                &path,
                            )?;

                            children.push(particle);
                        }
                        "group" => {
                            let value = XmlHelper::require_attribute(&element, "ref", &path)?;
                            let target = schema.context.resolve_qname(&value, &path)?;
                            let (child_min, child_max) =
                                XmlHelper::get_occurs(&element, &path)?;

                            children.push(Particle {
                                term: ParticleTerm::GroupRef(target),
                                min_occurs: child_min,
                                max_occurs: child_max,
                            });
                            reader
                                .read_to_end_into(element.name(), &mut Vec::new())
                                .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                        }
                        "any" => {
                            let (child_min, child_max) =
                                XmlHelper::get_occurs(&element, &path)?;

                            children.push(Particle {
                                term: ParticleTerm::Any,
                                min_occurs: child_min,
                                max_occurs: child_max,
                            });
                            reader
                                .read_to_end_into(element.name(), &mut Vec::new())
                                .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                        }
                        "annotation" => {
                            AnnotationsParser::parse(reader, &schema.context, &path)?;
                        }
                        other => {
                            return Err(ParserError::UnsupportedConstruct(
                                path,
                                other.to_owned(),
                            ));
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = e.to_owned();
                    schema.context.collect_bindings(&element)?;
                    let (namespace, local) = schema.context.resolve_tag(element.name().as_ref());

                    if namespace != XSD_NAMESPACE {
                        buf.clear();
                        continue;
                    }

                    match local.as_str() {
                        "element" => {
                            let decl = ElementParser::parse(
                                reader,
                                schema,
                                &element,
                                true,
                                Some(parent_local),
                                &path,
                            )?;

                            children.push(element_particle(decl));
                        }
                        "group" => {
                            let value = XmlHelper::require_attribute(&element, "ref", &path)?;
                            let target = schema.context.resolve_qname(&value, &path)?;
                            let (child_min, child_max) =
                                XmlHelper::get_occurs(&element, &path)?;

                            children.push(Particle {
                                term: ParticleTerm::GroupRef(target),
                                min_occurs: child_min,
                                max_occurs: child_max,
                            });
                        }
                        "any" => {
                            let (child_min, child_max) =
                                XmlHelper::get_occurs(&element, &path)?;

                            children.push(Particle {
                                term: ParticleTerm::Any,
                                min_occurs: child_min,
                                max_occurs: child_max,
                            });
                        }
                        "sequence" | "choice" | "all" => {
                            let (child_min, child_max) =
                                XmlHelper::get_occurs(&element, &path)?;

                            children.push(Particle {
                                term: compositor_term(&local, Vec::new()),
                                min_occurs: child_min,
                                max_occurs: child_max,
                            });
                        }
                        _ => (),
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = schema.context.resolve_tag(e.name().as_ref());

                    if namespace == XSD_NAMESPACE && local == kind {
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

        Ok(Particle {
            term: compositor_term(kind, children),
            min_occurs,
            max_occurs,
        })
    }
}

fn compositor_term(kind: &str, children: Vec<Particle>) -> ParticleTerm {
    match kind {
        "choice" => ParticleTerm::Choice(children),
        "all" => ParticleTerm::All(children),
        _ => ParticleTerm::Sequence(children),
    }
}

fn element_particle(decl: crate::parser::types::ElementDecl) -> Particle {
    Particle {
        min_occurs: decl.min_occurs,
        max_occurs: decl.max_occurs,
        term: ParticleTerm::Element(decl),
    }
}

/// Parses an xs:attribute tag into a declaration. Attribute references are
/// skipped with a warning; an attribute without a type defaults to
/// xs:string.
pub(crate) fn parse_attribute_decl(
    element: &BytesStart<'_>,
    schema: &mut SchemaParser,
    path: &str,
) -> Result<Option<AttributeDecl>, ParserError> {
    if XmlHelper::get_attribute(element, "ref")?.is_some() {
        schema.warn(format!("ignoring attribute reference at {path}"));

        return Ok(None);
    }

    let name = XmlHelper::require_attribute(element, "name", path)?;

    let type_ref = match XmlHelper::get_attribute(element, "type")? {
        Some(value) => schema.context.resolve_qname(&value, path)?,
        None => {
            schema.warn(format!(
                "attribute \"{name}\" at {path} has no type, assuming xs:string"
            ));

            QualifiedName::new(XSD_NAMESPACE, "string")
        }
    };

    let use_ = match XmlHelper::get_attribute(element, "use")?.as_deref() {
        None | Some("optional") => AttributeUse::Optional,
        Some("required") => AttributeUse::Required,
        Some("prohibited") => AttributeUse::Prohibited,
        Some(other) => {
            return Err(ParserError::MalformedSchema(
                path.to_owned(),
                format!("invalid attribute use \"{other}\""),
            ));
        }
    };

    Ok(Some(AttributeDecl {
        name: QualifiedName::unqualified(&name),
        type_ref,
        use_,
    }))
}
