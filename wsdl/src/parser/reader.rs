use std::{
    collections::HashSet,
    io,
    path::Path,
};

use quick_xml::{events::Event, Reader};
use url::Url;

use super::{
    definitions::DefinitionsParser,
    helper::NamespaceContext,
    schema::SchemaParser,
    types::{
        ParserError, Schema, SchemaNode, ServiceDescription, QualifiedName, WSDL_NAMESPACE,
        XSD_NAMESPACE,
    },
};

/// Loads WSDL and schema documents and follows their imports.
///
/// Import locations resolve relative to the importing document's URL. Every
/// fetched URL is cached so that diamond imports are loaded once and import
/// cycles short-circuit instead of recursing forever.
pub struct DocumentReader {
    loaded: HashSet<Url>,
}

impl DocumentReader {
    pub fn new() -> Self {
        Self {
            loaded: HashSet::new(),
        }
    }

    /// Loads the document at the given URL or filesystem path and resolves
    /// every wsdl:import and xs:import/xs:include reachable from it.
    pub fn load(&mut self, source: &str) -> Result<ServiceDescription, ParserError> {
        let url = to_url(source)?;

        self.read_description(&url)
    }

    fn read_description(&mut self, url: &Url) -> Result<ServiceDescription, ParserError> {
        let bytes = self.fetch(url)?;
        let mut description = parse_document(&bytes, url)?;

        // This document's schema imports resolve against its own URL, so they
        // have to be handled before schemas merged from imported WSDLs (whose
        // imports are already resolved) are appended.
        self.resolve_schema_imports(&mut description, url)?;
        self.resolve_wsdl_imports(&mut description, url)?;

        Ok(description)
    }

    fn resolve_wsdl_imports(
        &mut self,
        description: &mut ServiceDescription,
        base: &Url,
    ) -> Result<(), ParserError> {
        for import in std::mem::take(&mut description.imports) {
            let target = base.join(&import.location).map_err(|e| {
                ParserError::Io(
                    import.location.clone(),
                    io::Error::new(io::ErrorKind::InvalidInput, e),
                )
            })?;

            if self.loaded.contains(&target) {
                continue;
            }

            let imported = self.read_description(&target)?;
            merge_description(description, imported)?;
        }

        Ok(())
    }

    fn resolve_schema_imports(
        &mut self,
        description: &mut ServiceDescription,
        base: &Url,
    ) -> Result<(), ParserError> {
        let mut imported = Vec::new();

        for schema in &description.schemas {
            for node in &schema.nodes {
                if let SchemaNode::Import(import) = node {
                    if let Some(location) = &import.schema_location {
                        self.read_schema_document(base, location, &mut imported)?;
                    }
                }
            }
        }

        description.schemas.append(&mut imported);

        Ok(())
    }

    /// Loads one schema document and, recursively, everything it imports.
    fn read_schema_document(
        &mut self,
        base: &Url,
        location: &str,
        schemas: &mut Vec<Schema>,
    ) -> Result<(), ParserError> {
        let target = base.join(location).map_err(|e| {
            ParserError::Io(
                location.to_owned(),
                io::Error::new(io::ErrorKind::InvalidInput, e),
            )
        })?;

        if self.loaded.contains(&target) {
            return Ok(());
        }

        let bytes = self.fetch(&target)?;
        let schema = parse_schema_document(&bytes, &target)?;

        let imports = schema
            .nodes
            .iter()
            .filter_map(|node| match node {
                SchemaNode::Import(import) => import.schema_location.clone(),
                _ => None,
            })
            .collect::<Vec<String>>();

        schemas.push(schema);

        for import in imports {
            self.read_schema_document(&target, &import, schemas)?;
        }

        Ok(())
    }

    fn fetch(&mut self, url: &Url) -> Result<Vec<u8>, ParserError> {
        self.loaded.insert(url.clone());

        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| {
                        ParserError::Io(
                            url.to_string(),
                            io::Error::new(io::ErrorKind::InvalidInput, "not a file path"),
                        )
                    })?;

                std::fs::read(path).map_err(|e| ParserError::Io(url.to_string(), e))
            }
            "http" | "https" => {
                let response = reqwest::blocking::get(url.clone())
                    .map_err(|e| ParserError::Io(url.to_string(), io::Error::other(e)))?;

                if !response.status().is_success() {
                    return Err(ParserError::Io(
                        url.to_string(),
                        io::Error::other(format!("server returned {}", response.status())),
                    ));
                }

                response
                    .bytes()
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| ParserError::Io(url.to_string(), io::Error::other(e)))
            }
            other => Err(ParserError::UnsupportedScheme(other.to_owned())),
        }
    }
}

impl Default for DocumentReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Interprets the source as a URL, falling back to a filesystem path.
fn to_url(source: &str) -> Result<Url, ParserError> {
    match Url::parse(source) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = Path::new(source)
                .canonicalize()
                .map_err(|e| ParserError::Io(source.to_owned(), e))?;

            Url::from_file_path(&path).map_err(|()| {
                ParserError::Io(
                    source.to_owned(),
                    io::Error::new(io::ErrorKind::InvalidInput, "not an absolute path"),
                )
            })
        }
        Err(e) => Err(ParserError::Io(
            source.to_owned(),
            io::Error::new(io::ErrorKind::InvalidInput, e),
        )),
    }
}

/// Parses a document whose root is either wsdl:definitions or xs:schema.
fn parse_document(bytes: &[u8], url: &Url) -> Result<ServiceDescription, ParserError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(s)) => {
                let element = s.to_owned();
                let mut context = NamespaceContext::default();
                context.collect_bindings(&element)?;
                let (namespace, local) = context.resolve_tag(element.name().as_ref());

                return match (namespace.as_str(), local.as_str()) {
                    (WSDL_NAMESPACE, "definitions") => {
                        DefinitionsParser::parse(&mut reader, &element, &context)
                    }
                    (XSD_NAMESPACE, "schema") => {
                        let (schema, warnings) =
                            SchemaParser::parse(&mut reader, &element, &context, "")?;

                        Ok(ServiceDescription {
                            target_namespace: schema.target_namespace.clone(),
                            schemas: vec![schema],
                            warnings,
                            ..ServiceDescription::default()
                        })
                    }
                    _ => Err(ParserError::MalformedSchema(
                        url.to_string(),
                        format!("unexpected root element \"{local}\""),
                    )),
                };
            }
            Ok(Event::Eof) => {
                return Err(ParserError::MalformedSchema(
                    url.to_string(),
                    "document has no root element".to_owned(),
                ));
            }
            Err(e) => return Err(ParserError::XmlParse(url.to_string(), e)),
            _ => (),
        }

        buf.clear();
    }
}

fn parse_schema_document(bytes: &[u8], url: &Url) -> Result<Schema, ParserError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(s)) => {
                let element = s.to_owned();
                let mut context = NamespaceContext::default();
                context.collect_bindings(&element)?;
                let (namespace, local) = context.resolve_tag(element.name().as_ref());

                if namespace == XSD_NAMESPACE && local == "schema" {
                    let (schema, _) = SchemaParser::parse(&mut reader, &element, &context, "")?;

                    return Ok(schema);
                }

                return Err(ParserError::MalformedSchema(
                    url.to_string(),
                    format!("expected xs:schema root, found \"{local}\""),
                ));
            }
            Ok(Event::Eof) => {
                return Err(ParserError::MalformedSchema(
                    url.to_string(),
                    "document has no root element".to_owned(),
                ));
            }
            Err(e) => return Err(ParserError::XmlParse(url.to_string(), e)),
            _ => (),
        }

        buf.clear();
    }
}

/// Merges an imported description's tables into the importing one. A name
/// collision of the same kind across documents is a duplicate declaration.
fn merge_description(
    target: &mut ServiceDescription,
    imported: ServiceDescription,
) -> Result<(), ParserError> {
    fn check_duplicate<'a, I: Iterator<Item = &'a QualifiedName>>(
        mut existing: I,
        name: &QualifiedName,
        kind: &str,
    ) -> Result<(), ParserError> {
        if existing.any(|n| n == name) {
            Err(ParserError::DuplicateName(name.clone(), kind.to_owned()))
        } else {
            Ok(())
        }
    }

    for message in imported.messages {
        check_duplicate(target.messages.iter().map(|m| &m.name), &message.name, "message")?;
        target.messages.push(message);
    }

    for port_type in imported.port_types {
        check_duplicate(
            target.port_types.iter().map(|p| &p.name),
            &port_type.name,
            "portType",
        )?;
        target.port_types.push(port_type);
    }

    for binding in imported.bindings {
        check_duplicate(target.bindings.iter().map(|b| &b.name), &binding.name, "binding")?;
        target.bindings.push(binding);
    }

    for service in imported.services {
        check_duplicate(target.services.iter().map(|s| &s.name), &service.name, "service")?;
        target.services.push(service);
    }

    target.schemas.extend(imported.schemas);
    target.unsupported_bindings.extend(imported.unsupported_bindings);
    target.warnings.extend(imported.warnings);

    Ok(())
}
