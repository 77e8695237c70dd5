use std::io::BufRead;

use quick_xml::{events::BytesStart, events::Event, Reader};

use super::{
    helper::{NamespaceContext, XmlHelper},
    schema::SchemaParser,
    types::{
        Binding, BindingOperation, BindingStyle, BodyUse, Message, MessagePart, Operation,
        OperationStyle, ParserError, PartContent, Port, PortType, QualifiedName, Service,
        ServiceDescription, WsdlImport, SOAP_BINDING_NAMESPACE, WSDL_NAMESPACE, XSD_NAMESPACE,
    },
};

/// A binding operation before the binding is known to be supported; the
/// soapAction is only required once it is.
struct RawBindingOperation {
    name: String,
    soap_action: Option<String>,
    input_use: Option<BodyUse>,
    output_use: Option<BodyUse>,
}

/// Parser for wsdl:definitions documents.
///
/// Inline schemas under wsdl:types are handed to the schema parser and
/// inherit the WSDL's targetNamespace when they declare none. Only the
/// SOAP 1.1 binding extension is recognized; bindings without it (and
/// rpc-style bindings) are recorded as unsupported and skipped.
pub struct DefinitionsParser {
    context: NamespaceContext,
    description: ServiceDescription,
}

impl DefinitionsParser {
    pub fn parse<B: BufRead>(
        reader: &mut Reader<B>,
        definitions_element: &BytesStart<'static>,
        inherited: &NamespaceContext,
    ) -> Result<ServiceDescription, ParserError> {
        let target_namespace =
            XmlHelper::require_attribute(definitions_element, "targetNamespace", "definitions")?;

        let mut context = inherited.clone();
        context.target_namespace = target_namespace.clone();
        context.collect_bindings(definitions_element)?;

        let mut parser = Self {
            context,
            description: ServiceDescription {
                target_namespace,
                ..ServiceDescription::default()
            },
        };

        parser.parse_children(reader)?;

        Ok(parser.description)
    }

    fn parse_children<B: BufRead>(&mut self, reader: &mut Reader<B>) -> Result<(), ParserError> {
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s)) => {
                    let element = s.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace != WSDL_NAMESPACE {
                        self.description.warnings.push(format!(
                            "skipping unrecognized element \"{local}\" inside wsdl:definitions"
                        ));
                        reader
                            .read_to_end_into(element.name(), &mut Vec::new())
                            .map_err(|e| ParserError::XmlParse("definitions".to_owned(), e))?;
                        buf.clear();
                        continue;
                    }

                    match local.as_str() {
                        "documentation" => {
                            reader
                                .read_to_end_into(element.name(), &mut Vec::new())
                                .map_err(|e| {
                                    ParserError::XmlParse("definitions".to_owned(), e)
                                })?;
                        }
                        "types" => self.parse_types(reader)?,
                        "message" => self.parse_message(reader, &element)?,
                        "portType" => self.parse_port_type(reader, &element)?,
                        "binding" => self.parse_binding(reader, &element)?,
                        "service" => self.parse_service(reader, &element)?,
                        "import" => {
                            self.push_import(&element)?;
                            reader
                                .read_to_end_into(element.name(), &mut Vec::new())
                                .map_err(|e| {
                                    ParserError::XmlParse("definitions".to_owned(), e)
                                })?;
                        }
                        other => {
                            self.description.warnings.push(format!(
                                "skipping unrecognized element \"{other}\" inside wsdl:definitions"
                            ));
                            reader
                                .read_to_end_into(element.name(), &mut Vec::new())
                                .map_err(|e| {
                                    ParserError::XmlParse("definitions".to_owned(), e)
                                })?;
                        }
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = e.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace == WSDL_NAMESPACE && local == "import" {
                        self.push_import(&element)?;
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == WSDL_NAMESPACE && local == "definitions" {
                        break;
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(ParserError::XmlParse("definitions".to_owned(), e)),
                _ => (),
            }

            buf.clear();
        }

        Ok(())
    }

    fn push_import(&mut self, element: &BytesStart<'static>) -> Result<(), ParserError> {
        let location = XmlHelper::require_attribute(element, "location", "definitions/import")?;

        self.description.imports.push(WsdlImport {
            namespace: XmlHelper::get_attribute(element, "namespace")?,
            location,
        });

        Ok(())
    }

    fn parse_types<B: BufRead>(&mut self, reader: &mut Reader<B>) -> Result<(), ParserError> {
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s)) => {
                    let element = s.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace == XSD_NAMESPACE && local == "schema" {
                        let (schema, mut warnings) = SchemaParser::parse(
                            reader,
                            &element,
                            &self.context,
                            &self.description.target_namespace,
                        )?;

                        self.description.schemas.push(schema);
                        self.description.warnings.append(&mut warnings);
                    } else {
                        reader
                            .read_to_end_into(element.name(), &mut Vec::new())
                            .map_err(|e| {
                                ParserError::XmlParse("definitions/types".to_owned(), e)
                            })?;
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == WSDL_NAMESPACE && local == "types" {
                        break;
                    }
                }
                Ok(Event::Eof) => {
                    return Err(ParserError::MalformedSchema(
                        "definitions/types".to_owned(),
                        "unexpected end of document".to_owned(),
                    ));
                }
                Err(e) => return Err(ParserError::XmlParse("definitions/types".to_owned(), e)),
                _ => (),
            }

            buf.clear();
        }

        Ok(())
    }

    fn parse_message<B: BufRead>(
        &mut self,
        reader: &mut Reader<B>,
        message_element: &BytesStart<'static>,
    ) -> Result<(), ParserError> {
        let name = XmlHelper::require_attribute(message_element, "name", "definitions/message")?;
        let name = self.context.target_qualified(&name);
        let path = format!("definitions/message[{}]", name.local);

        if self.description.messages.iter().any(|m| m.name == name) {
            return Err(ParserError::DuplicateName(name, "message".to_owned()));
        }

        let mut parts = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s) | Event::Empty(s)) => {
                    let element = s.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace == WSDL_NAMESPACE && local == "part" {
                        let part_name = XmlHelper::require_attribute(&element, "name", &path)?;

                        let content = if let Some(value) =
                            XmlHelper::get_attribute(&element, "element")?
                        {
                            PartContent::Element(self.context.resolve_qname(&value, &path)?)
                        } else if let Some(value) = XmlHelper::get_attribute(&element, "type")? {
                            PartContent::Type(self.context.resolve_qname(&value, &path)?)
                        } else {
                            return Err(ParserError::MalformedSchema(
                                path,
                                format!("part \"{part_name}\" names neither an element nor a type"),
                            ));
                        };

                        parts.push(MessagePart {
                            name: part_name,
                            content,
                        });
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == WSDL_NAMESPACE && local == "message" {
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

        self.description.messages.push(Message { name, parts });

        Ok(())
    }

    fn parse_port_type<B: BufRead>(
        &mut self,
        reader: &mut Reader<B>,
        port_type_element: &BytesStart<'static>,
    ) -> Result<(), ParserError> {
        let name =
            XmlHelper::require_attribute(port_type_element, "name", "definitions/portType")?;
        let name = self.context.target_qualified(&name);
        let path = format!("definitions/portType[{}]", name.local);

        if self.description.port_types.iter().any(|p| p.name == name) {
            return Err(ParserError::DuplicateName(name, "portType".to_owned()));
        }

        let mut operations = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s)) => {
                    let element = s.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace == WSDL_NAMESPACE && local == "operation" {
                        operations.push(self.parse_operation(reader, &element, &path)?);
                    } else {
                        reader
                            .read_to_end_into(element.name(), &mut Vec::new())
                            .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == WSDL_NAMESPACE && local == "portType" {
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

        self.description.port_types.push(PortType { name, operations });

        Ok(())
    }

    fn parse_operation<B: BufRead>(
        &mut self,
        reader: &mut Reader<B>,
        operation_element: &BytesStart<'static>,
        path: &str,
    ) -> Result<Operation, ParserError> {
        let name = XmlHelper::require_attribute(operation_element, "name", path)?;
        let path = format!("{path}/operation[{name}]");

        let mut documentation = None::<String>;
        let mut input = None::<QualifiedName>;
        let mut output = None::<QualifiedName>;
        let mut faults = Vec::new();
        let mut in_documentation = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s) | Event::Empty(s)) => {
                    let element = s.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace != WSDL_NAMESPACE {
                        buf.clear();
                        continue;
                    }

                    match local.as_str() {
                        "documentation" => in_documentation = true,
                        "input" | "output" | "fault" => {
                            let value = XmlHelper::require_attribute(&element, "message", &path)?;
                            let message = self.context.resolve_qname(&value, &path)?;

                            match local.as_str() {
                                "input" => input = Some(message),
                                "output" => output = Some(message),
                                _ => faults.push(message),
                            }
                        }
                        _ => (),
                    }
                }
                Ok(Event::Text(text)) if in_documentation => {
                    let text = text
                        .unescape()
                        .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                    let text = text.trim();

                    if !text.is_empty() {
                        documentation = Some(text.to_owned());
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == WSDL_NAMESPACE {
                        match local.as_str() {
                            "documentation" => in_documentation = false,
                            "operation" => break,
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

        let Some(input) = input else {
            return Err(ParserError::MissingRequiredChild(path, "input".to_owned()));
        };

        let style = if output.is_some() {
            OperationStyle::RequestResponse
        } else {
            OperationStyle::OneWay
        };

        Ok(Operation {
            name,
            documentation,
            input,
            output,
            faults,
            style,
        })
    }

    fn parse_binding<B: BufRead>(
        &mut self,
        reader: &mut Reader<B>,
        binding_element: &BytesStart<'static>,
    ) -> Result<(), ParserError> {
        let name = XmlHelper::require_attribute(binding_element, "name", "definitions/binding")?;
        let name = self.context.target_qualified(&name);
        let path = format!("definitions/binding[{}]", name.local);

        if self.description.bindings.iter().any(|b| b.name == name) {
            return Err(ParserError::DuplicateName(name, "binding".to_owned()));
        }

        let value = XmlHelper::require_attribute(binding_element, "type", &path)?;
        let port_type = self.context.resolve_qname(&value, &path)?;

        let mut style = BindingStyle::Document;
        let mut transport = String::new();
        let mut has_soap_binding = false;
        let mut raw_operations = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s)) => {
                    let element = s.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace == WSDL_NAMESPACE && local == "operation" {
                        raw_operations.push(self.parse_binding_operation(reader, &element, &path)?);
                    } else if namespace == SOAP_BINDING_NAMESPACE && local == "binding" {
                        has_soap_binding = true;
                        style = Self::binding_style(&element, &path)?;
                        transport =
                            XmlHelper::get_attribute(&element, "transport")?.unwrap_or_default();
                        reader
                            .read_to_end_into(element.name(), &mut Vec::new())
                            .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                    } else {
                        reader
                            .read_to_end_into(element.name(), &mut Vec::new())
                            .map_err(|e| ParserError::XmlParse(path.clone(), e))?;
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = e.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace == SOAP_BINDING_NAMESPACE && local == "binding" {
                        has_soap_binding = true;
                        style = Self::binding_style(&element, &path)?;
                        transport =
                            XmlHelper::get_attribute(&element, "transport")?.unwrap_or_default();
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == WSDL_NAMESPACE && local == "binding" {
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

        if !has_soap_binding || style == BindingStyle::Rpc {
            self.description.warnings.push(format!(
                "skipping binding \"{name}\": {}",
                if has_soap_binding {
                    "rpc style is not supported"
                } else {
                    "no SOAP 1.1 binding extension"
                }
            ));
            self.description.unsupported_bindings.push(name);

            return Ok(());
        }

        // a supported binding must name a soapAction per operation; an
        // unsupported one was skipped above without this requirement
        let operations = raw_operations
            .into_iter()
            .map(|operation| {
                let soap_action = operation.soap_action.ok_or_else(|| {
                    ParserError::MissingRequiredChild(
                        format!("{path}/operation[{}]", operation.name),
                        "soap:operation".to_owned(),
                    )
                })?;

                Ok(BindingOperation {
                    name: operation.name,
                    soap_action,
                    input_use: operation.input_use.unwrap_or_default(),
                    output_use: operation.output_use,
                })
            })
            .collect::<Result<Vec<BindingOperation>, ParserError>>()?;

        self.description.bindings.push(Binding {
            name,
            port_type,
            style,
            transport,
            operations,
        });

        Ok(())
    }

    fn binding_style(
        element: &BytesStart<'static>,
        path: &str,
    ) -> Result<BindingStyle, ParserError> {
        match XmlHelper::get_attribute(element, "style")?.as_deref() {
            None | Some("document") => Ok(BindingStyle::Document),
            Some("rpc") => Ok(BindingStyle::Rpc),
            Some(other) => Err(ParserError::MalformedSchema(
                path.to_owned(),
                format!("invalid binding style \"{other}\""),
            )),
        }
    }

    fn parse_binding_operation<B: BufRead>(
        &mut self,
        reader: &mut Reader<B>,
        operation_element: &BytesStart<'static>,
        path: &str,
    ) -> Result<RawBindingOperation, ParserError> {
        let name = XmlHelper::require_attribute(operation_element, "name", path)?;
        let path = format!("{path}/operation[{name}]");

        let mut soap_action = None::<String>;
        let mut input_use = None::<BodyUse>;
        let mut output_use = None::<BodyUse>;
        let mut current_direction = None::<&str>;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s) | Event::Empty(s)) => {
                    let element = s.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace == SOAP_BINDING_NAMESPACE {
                        match local.as_str() {
                            "operation" => {
                                soap_action = Some(
                                    XmlHelper::get_attribute(&element, "soapAction")?
                                        .unwrap_or_default(),
                                );
                            }
                            "body" => {
                                let use_ = Self::body_use(&element, &path)?;

                                match current_direction {
                                    Some("input") => input_use = Some(use_),
                                    Some("output") => output_use = Some(use_),
                                    _ => (),
                                }
                            }
                            _ => (),
                        }
                    } else if namespace == WSDL_NAMESPACE {
                        match local.as_str() {
                            "input" => current_direction = Some("input"),
                            "output" => current_direction = Some("output"),
                            _ => (),
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == WSDL_NAMESPACE {
                        match local.as_str() {
                            "input" | "output" => current_direction = None,
                            "operation" => break,
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

        Ok(RawBindingOperation {
            name,
            soap_action,
            input_use,
            output_use,
        })
    }

    fn body_use(element: &BytesStart<'static>, path: &str) -> Result<BodyUse, ParserError> {
        match XmlHelper::get_attribute(element, "use")?.as_deref() {
            None | Some("literal") => Ok(BodyUse::Literal),
            Some("encoded") => Ok(BodyUse::Encoded),
            Some(other) => Err(ParserError::MalformedSchema(
                path.to_owned(),
                format!("invalid body use \"{other}\""),
            )),
        }
    }

    fn parse_service<B: BufRead>(
        &mut self,
        reader: &mut Reader<B>,
        service_element: &BytesStart<'static>,
    ) -> Result<(), ParserError> {
        let name = XmlHelper::require_attribute(service_element, "name", "definitions/service")?;
        let name = self.context.target_qualified(&name);
        let path = format!("definitions/service[{}]", name.local);

        if self.description.services.iter().any(|s| s.name == name) {
            return Err(ParserError::DuplicateName(name, "service".to_owned()));
        }

        let mut ports = Vec::new();
        let mut current_port = None::<(QualifiedName, QualifiedName)>;
        let mut address = None::<String>;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(s) | Event::Empty(s)) => {
                    let element = s.to_owned();
                    self.context.collect_bindings(&element)?;
                    let (namespace, local) = self.context.resolve_tag(element.name().as_ref());

                    if namespace == WSDL_NAMESPACE && local == "port" {
                        let port_name = XmlHelper::require_attribute(&element, "name", &path)?;
                        let value = XmlHelper::require_attribute(&element, "binding", &path)?;
                        let binding = self.context.resolve_qname(&value, &path)?;

                        current_port =
                            Some((self.context.target_qualified(&port_name), binding));
                        address = None;
                    } else if local == "address" {
                        // any binding extension's address is accepted so that
                        // ports of unsupported bindings still parse
                        address = XmlHelper::get_attribute(&element, "location")?;
                    }
                }
                Ok(Event::End(e)) => {
                    let (namespace, local) = self.context.resolve_tag(e.name().as_ref());

                    if namespace == WSDL_NAMESPACE {
                        match local.as_str() {
                            "port" => {
                                if let Some((port_name, binding)) = current_port.take() {
                                    match address.take() {
                                        Some(location) => ports.push(Port {
                                            name: port_name,
                                            binding,
                                            address: location,
                                        }),
                                        None => self.description.warnings.push(format!(
                                            "skipping port \"{port_name}\": no soap:address"
                                        )),
                                    }
                                }
                            }
                            "service" => break,
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

        self.description.services.push(Service { name, ports });

        Ok(())
    }
}
