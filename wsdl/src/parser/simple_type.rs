use std::io::BufRead;

use quick_xml::{events::BytesStart, events::Event, Reader};

use super::{
    annotations::AnnotationsParser,
    helper::XmlHelper,
    schema::SchemaParser,
    types::{
        EnumerationFacet, Facets, ParserError, QualifiedName, SimpleTypeDecl, SimpleVariety,
        XSD_NAMESPACE,
    },
};

/// Parser for xs:simpleType elements
///
/// Exactly one of xs:restriction, xs:list or xs:union is expected. Known
/// restriction facets are collected into [Facets]; unknown facets are kept
/// verbatim and reported as warnings, never as errors.
pub struct SimpleTypeParser;

struct SimpleTypeState {
    base: Option<QualifiedName>,
    facets: Facets,
    list_item_type: Option<QualifiedName>,
    union_member_types: Option<Vec<QualifiedName>>,
    documentations: Vec<String>,
    current_variant: Option<EnumerationFacet>,
}

impl SimpleTypeParser {
    pub fn parse<B: BufRead>(
        reader: &mut Reader<B>,
        schema: &mut SchemaParser,
        name: QualifiedName,
        path: &str,
    ) -> Result<SimpleTypeDecl, ParserError> {
        let path = format!("{path}/simpleType[{}]", name.local);

        let mut state = SimpleTypeState {
            base: None,
            facets: Facets::default(),
            list_item_type: None,
            union_member_types: None,
            documentations: Vec::new(),
            current_variant: None,
        };
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s)) => {
                    let element = s.to_owned();
                    Self::handle_tag(reader, schema, &element, false, &path, &mut state)?;
                }
                Ok(Event::Empty(e)) => {
                    let element = e.to_owned();
                    Self::handle_tag(reader, schema, &element, true, &path, &mut state)?;
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = schema.context.resolve_tag(e.name().as_ref());

                    if namespace == XSD_NAMESPACE {
                        match local.as_str() {
                            "enumeration" => {
                                if let Some(variant) = state.current_variant.take() {
                                    state.facets.enumerations.push(variant);
                                }
                            }
                            "simpleType" => break,
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

        let variety = match (state.base, state.list_item_type, state.union_member_types) {
            (Some(base), None, None) => SimpleVariety::Restriction {
                base,
                facets: state.facets,
            },
            (None, Some(item_type), None) => SimpleVariety::List { item_type },
            (None, None, Some(member_types)) => SimpleVariety::Union { member_types },
            _ => {
                return Err(ParserError::MalformedSchema(
                    path,
                    "expected exactly one of restriction, list or union".to_owned(),
                ));
            }
        };

        Ok(SimpleTypeDecl {
            name,
            variety,
            documentations: state.documentations,
        })
    }

    fn handle_tag<B: BufRead>(
        reader: &mut Reader<B>,
        schema: &mut SchemaParser,
        element: &BytesStart<'static>,
        is_empty: bool,
        path: &str,
        state: &mut SimpleTypeState,
    ) -> Result<(), ParserError> {
        schema.context.collect_bindings(element)?;
        let (namespace, local) = schema.context.resolve_tag(element.name().as_ref());

        if namespace != XSD_NAMESPACE {
            if !is_empty {
                reader
                    .read_to_end_into(element.name(), &mut Vec::new())
                    .map_err(|e| ParserError::XmlParse(path.to_owned(), e))?;
            }

            return Ok(());
        }

        match local.as_str() {
            "restriction" => {
                let value = XmlHelper::require_attribute(element, "base", path)?;
                state.base = Some(schema.context.resolve_qname(&value, path)?);
            }
            "list" => {
                let value = XmlHelper::require_attribute(element, "itemType", path)?;
                state.list_item_type = Some(schema.context.resolve_qname(&value, path)?);
            }
            "union" => {
                let value = XmlHelper::require_attribute(element, "memberTypes", path)?;
                let members = value
                    .split_whitespace()
                    .map(|member| schema.context.resolve_qname(member, path))
                    .collect::<Result<Vec<QualifiedName>, ParserError>>()?;

                state.union_member_types = Some(members);
            }
            "enumeration" => {
                let value = XmlHelper::require_attribute(element, "value", path)?;
                let variant = EnumerationFacet {
                    value,
                    documentations: vec![],
                };

                if is_empty {
                    state.facets.enumerations.push(variant);
                } else {
                    state.current_variant = Some(variant);
                }
            }
            "pattern" => {
                state.facets.pattern =
                    Some(XmlHelper::require_attribute(element, "value", path)?);
            }
            "length" => {
                let value = XmlHelper::require_attribute(element, "value", path)?;
                state.facets.length = Some(value.parse::<u32>().map_err(|_| {
                    ParserError::MalformedSchema(
                        path.to_owned(),
                        format!("invalid length facet \"{value}\""),
                    )
                })?);
            }
            "minInclusive" => {
                state.facets.min_inclusive =
                    Some(XmlHelper::require_attribute(element, "value", path)?);
            }
            "maxInclusive" => {
                state.facets.max_inclusive =
                    Some(XmlHelper::require_attribute(element, "value", path)?);
            }
            "annotation" => {
                if is_empty {
                    return Ok(());
                }

                let mut values = AnnotationsParser::parse(reader, &schema.context, path)?;

                if let Some(variant) = state.current_variant.as_mut() {
                    variant.documentations.append(&mut values);
                } else {
                    state.documentations.append(&mut values);
                }
            }
            "simpleType" => {
                return Err(ParserError::UnsupportedConstruct(
                    path.to_owned(),
                    "inline simpleType variant".to_owned(),
                ));
            }
            other => {
                state.facets.other.push((
                    other.to_owned(),
                    XmlHelper::get_attribute(element, "value")?.unwrap_or_default(),
                ));
                schema.warn(format!("unknown facet \"{other}\" at {path}"));
            }
        }

        Ok(())
    }
}
