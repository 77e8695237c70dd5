use std::{collections::HashSet, io::BufRead};

use quick_xml::{events::BytesStart, events::Event, Reader};

use super::{
    annotations::AnnotationsParser,
    complex_type::{parse_attribute_decl, ComplexTypeParser},
    element::ElementParser,
    helper::{NamespaceContext, XmlHelper},
    simple_type::SimpleTypeParser,
    types::{
        AttributeGroupDecl, ElementFormDefault, GroupDecl, ParserError, Schema, SchemaImport,
        SchemaNode, XSD_NAMESPACE,
    },
};

/// Parser for one xs:schema element.
///
/// Carries the per-schema state the nested parsers need: the namespace
/// context, the warnings collected so far, the anonymous types hoisted to
/// top level, and the synthesized-name bookkeeping.
pub struct SchemaParser {
    pub context: NamespaceContext,
    element_form_default: ElementFormDefault,
    hoisted: Vec<SchemaNode>,
    warnings: Vec<String>,
    synthesized: HashSet<String>,
    synthesized_count: u64,
}

impl SchemaParser {
    /// Parses an xs:schema subtree whose start tag has already been read.
    ///
    /// `inherited` carries the prefix bindings of the enclosing document;
    /// `fallback_target_namespace` is used when the schema declares no
    /// targetNamespace of its own (inline WSDL schemas inherit the WSDL's).
    pub fn parse<B: BufRead>(
        reader: &mut Reader<B>,
        schema_element: &BytesStart<'_>,
        inherited: &NamespaceContext,
        fallback_target_namespace: &str,
    ) -> Result<(Schema, Vec<String>), ParserError> {
        let target_namespace = XmlHelper::get_attribute(schema_element, "targetNamespace")?
            .unwrap_or_else(|| fallback_target_namespace.to_owned());

        let element_form_default =
            match XmlHelper::get_attribute(schema_element, "elementFormDefault")?.as_deref() {
                None | Some("unqualified") => ElementFormDefault::Unqualified,
                Some("qualified") => ElementFormDefault::Qualified,
                Some(other) => {
                    return Err(ParserError::MalformedSchema(
                        "schema".to_owned(),
                        format!("invalid elementFormDefault \"{other}\""),
                    ));
                }
            };

        let mut context = inherited.clone();
        context.target_namespace = target_namespace.clone();
        context.collect_bindings(schema_element)?;

        let mut parser = Self {
            context,
            element_form_default,
            hoisted: Vec::new(),
            warnings: Vec::new(),
            synthesized: HashSet::new(),
            synthesized_count: 0,
        };

        let nodes = parser.parse_nodes(reader)?;

        let schema = Schema {
            target_namespace,
            element_form_default: parser.element_form_default,
            nodes,
        };

        Ok((schema, parser.warnings))
    }

    fn parse_nodes<B: BufRead>(
        &mut self,
        reader: &mut Reader<B>,
    ) -> Result<Vec<SchemaNode>, ParserError> {
        let mut nodes = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s)) => {
                    let element = s.to_owned();
                    let (namespace, local) = {
                        self.context.collect_bindings(&element)?;
                        self.context.resolve_tag(element.name().as_ref())
                    };

                    if namespace != XSD_NAMESPACE {
                        self.warn(format!(
                            "skipping non-schema element \"{local}\" inside xs:schema"
                        ));
                        reader
                            .read_to_end_into(element.name(), &mut Vec::new())
                            .map_err(|e| ParserError::XmlParse("schema".to_owned(), e))?;
                        buf.clear();
                        continue;
                    }

                    self.parse_top_level_node(reader, &element, &local, false, &mut nodes)?;
                }
                Ok(Event::Empty(e)) => {
                    let element = e.to_owned();
                    let (namespace, local) = {
                        self.context.collect_bindings(&element)?;
                        self.context.resolve_tag(element.name().as_ref())
                    };

                    if namespace != XSD_NAMESPACE {
                        self.warn(format!(
                            "skipping non-schema element \"{local}\" inside xs:schema"
                        ));
                        buf.clear();
                        continue;
                    }

                    self.parse_top_level_node(reader, &element, &local, true, &mut nodes)?;
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == XSD_NAMESPACE && local == "schema" {
                        break;
                    }
                }
                Ok(Event::Eof) => {
                    return Err(ParserError::MalformedSchema(
                        "schema".to_owned(),
                        "unexpected end of document".to_owned(),
                    ));
                }
                Err(e) => return Err(ParserError::XmlParse("schema".to_owned(), e)),
                _ => (),
            }

            buf.clear();
        }

        Ok(nodes)
    }

    fn parse_top_level_node<B: BufRead>(
        &mut self,
        reader: &mut Reader<B>,
        element: &BytesStart<'static>,
        local: &str,
        is_empty: bool,
        nodes: &mut Vec<SchemaNode>,
    ) -> Result<(), ParserError> {
        match local {
            "element" => {
                let decl = ElementParser::parse(reader, self, element, is_empty, None, "schema")?;
                nodes.push(SchemaNode::Element(decl));
            }
            "complexType" => {
                let name = XmlHelper::require_attribute(element, "name", "schema/complexType")?;
                let qualified = self.context.target_qualified(&name);

                if is_empty {
                    nodes.push(SchemaNode::ComplexType(
                        ComplexTypeParser::empty(qualified),
                    ));
                } else {
                    let decl = ComplexTypeParser::parse(reader, self, qualified, "schema")?;
                    nodes.push(SchemaNode::ComplexType(decl));
                }
            }
            "simpleType" => {
                if is_empty {
                    return Err(ParserError::MalformedSchema(
                        "schema/simpleType".to_owned(),
                        "expected exactly one of restriction, list or union".to_owned(),
                    ));
                }

                let name = XmlHelper::require_attribute(element, "name", "schema/simpleType")?;
                let qualified = self.context.target_qualified(&name);
                let decl = SimpleTypeParser::parse(reader, self, qualified, "schema")?;
                nodes.push(SchemaNode::SimpleType(decl));
            }
            "attribute" => {
                if let Some(mut decl) = parse_attribute_decl(element, self, "schema")? {
                    decl.name = self.context.target_qualified(&decl.name.local);
                    nodes.push(SchemaNode::Attribute(decl));
                }

                if !is_empty {
                    reader
                        .read_to_end_into(element.name(), &mut Vec::new())
                        .map_err(|e| ParserError::XmlParse("schema/attribute".to_owned(), e))?;
                }
            }
            "group" => {
                let name = XmlHelper::require_attribute(element, "name", "schema/group")?;
                let qualified = self.context.target_qualified(&name);

                if is_empty {
                    return Err(ParserError::MalformedSchema(
                        "schema/group".to_owned(),
                        "group declaration without content model".to_owned(),
                    ));
                }

                let decl = self.parse_group(reader, qualified)?;
                nodes.push(SchemaNode::Group(decl));
            }
            "attributeGroup" => {
                let name = XmlHelper::require_attribute(element, "name", "schema/attributeGroup")?;
                let qualified = self.context.target_qualified(&name);

                let attributes = if is_empty {
                    Vec::new()
                } else {
                    self.parse_attribute_group(reader)?
                };

                nodes.push(SchemaNode::AttributeGroup(AttributeGroupDecl {
                    name: qualified,
                    attributes,
                }));
            }
            "import" | "include" => {
                nodes.push(SchemaNode::Import(SchemaImport {
                    namespace: XmlHelper::get_attribute(element, "namespace")?,
                    schema_location: XmlHelper::get_attribute(element, "schemaLocation")?,
                }));

                if !is_empty {
                    reader
                        .read_to_end_into(element.name(), &mut Vec::new())
                        .map_err(|e| ParserError::XmlParse("schema/import".to_owned(), e))?;
                }
            }
            "annotation" => {
                if !is_empty {
                    AnnotationsParser::parse(reader, &self.context, "schema")?;
                }
            }
            other => {
                return Err(ParserError::UnsupportedConstruct(
                    "schema".to_owned(),
                    other.to_owned(),
                ));
            }
        }

        nodes.append(&mut self.hoisted);

        Ok(())
    }

    fn parse_group<B: BufRead>(
        &mut self,
        reader: &mut Reader<B>,
        name: crate::parser::types::QualifiedName,
    ) -> Result<GroupDecl, ParserError> {
        let path = format!("schema/group[{}]", name.local);
        let mut particle = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s)) => {
                    let element = s.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace != XSD_NAMESPACE {
                        buf.clear();
                        continue;
                    }

                    match local.as_str() {
                        "sequence" | "choice" | "all" => {
                            let (min_occurs, max_occurs) = XmlHelper::get_occurs(&element, &path)?;
                            particle = Some(ComplexTypeParser::parse_compositor(
                                reader,
                                self,
                                &local,
                                min_occurs,
                                max_occurs,
                                &name.local,
                                &path,
                            )?);
                        }
                        "annotation" => {
                            AnnotationsParser::parse(reader, &self.context, &path)?;
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
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == XSD_NAMESPACE && local == "group" {
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

        match particle {
            Some(particle) => Ok(GroupDecl { name, particle }),
            None => Err(ParserError::MalformedSchema(
                path,
                "group declaration without content model".to_owned(),
            )),
        }
    }

    fn parse_attribute_group<B: BufRead>(
        &mut self,
        reader: &mut Reader<B>,
    ) -> Result<Vec<crate::parser::types::AttributeDecl>, ParserError> {
        let path = "schema/attributeGroup";
        let mut attributes = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s) | Event::Empty(s)) => {
                    let element = s.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace == XSD_NAMESPACE && local == "attribute" {
                        if let Some(decl) = parse_attribute_decl(&element, self, path)? {
                            attributes.push(decl);
                        }
                    } else if namespace == XSD_NAMESPACE && local == "annotation" {
                        AnnotationsParser::parse(reader, &self.context, path)?;
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == XSD_NAMESPACE && local == "attributeGroup" {
                        break;
                    }
                }
                Ok(Event::Eof) => {
                    return Err(ParserError::MalformedSchema(
                        path.to_owned(),
                        "unexpected end of document".to_owned(),
                    ));
                }
                Err(e) => return Err(ParserError::XmlParse(path.to_owned(), e)),
                _ => (),
            }

            buf.clear();
        }

        Ok(attributes)
    }

    /// Moves an anonymous declaration to the top level of the schema.
    pub(crate) fn hoist(&mut self, node: SchemaNode) {
        self.hoisted.push(node);
    }

    pub(crate) fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Generates a name for an anonymous inline type from its container
    /// path. Collisions take a monotonic integer suffix.
    pub(crate) fn synthesize_name(&mut self, parent: Option<&str>, field: &str) -> String {
        let base = match parent {
            Some(parent) => format!("{parent}_{field}"),
            None => field.to_owned(),
        };

        if self.synthesized.insert(base.clone()) {
            base
        } else {
            self.synthesized_count += 1;
            let name = format!("{base}_{}", self.synthesized_count);
            self.synthesized.insert(name.clone());

            name
        }
    }
}
