use std::collections::HashMap;

use quick_xml::events::BytesStart;

use super::types::{Occurs, ParserError, QualifiedName, DEFAULT_OCCURS};

/// Prefix bindings and target namespace of the document being parsed.
///
/// Bindings are collected from every `xmlns`/`xmlns:p` attribute the parser
/// walks past; the empty prefix holds the default namespace.
#[derive(Debug, Default, Clone)]
pub struct NamespaceContext {
    pub target_namespace: String,
    aliases: HashMap<String, String>,
}

impl NamespaceContext {
    pub fn new(target_namespace: &str) -> Self {
        Self {
            target_namespace: target_namespace.to_owned(),
            aliases: HashMap::new(),
        }
    }

    /// Records every xmlns binding declared on the element.
    pub fn collect_bindings(&mut self, element: &BytesStart<'_>) -> Result<(), ParserError> {
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|e| {
                ParserError::MalformedSchema(
                    raw_name(element),
                    format!("malformed attribute: {e}"),
                )
            })?;

            let key = attribute.key.as_ref();

            let prefix = if key == b"xmlns" {
                String::new()
            } else if let Some(suffix) = key.strip_prefix(b"xmlns:") {
                String::from_utf8_lossy(suffix).into_owned()
            } else {
                continue;
            };

            let value = String::from_utf8_lossy(&attribute.value).into_owned();
            self.aliases.insert(prefix, value);
        }

        Ok(())
    }

    /// Resolves the namespace of an element tag.
    pub fn resolve_tag(&self, raw: &[u8]) -> (String, String) {
        let raw = String::from_utf8_lossy(raw).into_owned();
        let (prefix, local) = split_prefixed(&raw);

        let namespace = self
            .aliases
            .get(prefix.unwrap_or(""))
            .cloned()
            .unwrap_or_default();

        (namespace, local.to_owned())
    }

    /// Resolves a prefixed name from an attribute value, e.g. `tns:Invoice`.
    /// Unprefixed names fall back to the default namespace, then to the
    /// target namespace.
    pub fn resolve_qname(&self, value: &str, path: &str) -> Result<QualifiedName, ParserError> {
        match split_prefixed(value) {
            (Some(prefix), local) => match self.aliases.get(prefix) {
                Some(namespace) => Ok(QualifiedName::new(namespace, local)),
                None => Err(ParserError::MalformedSchema(
                    path.to_owned(),
                    format!("undeclared namespace prefix \"{prefix}\""),
                )),
            },
            (None, local) => {
                let namespace = self
                    .aliases
                    .get("")
                    .map(String::as_str)
                    .unwrap_or(&self.target_namespace);

                Ok(QualifiedName::new(namespace, local))
            }
        }
    }

    /// Qualifies a local name with the target namespace.
    pub fn target_qualified(&self, local: &str) -> QualifiedName {
        QualifiedName::new(&self.target_namespace, local)
    }
}

fn split_prefixed(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn raw_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

pub struct XmlHelper;

impl XmlHelper {
    /// Returns the unescaped value of the named attribute, if present.
    pub fn get_attribute(
        element: &BytesStart<'_>,
        name: &str,
    ) -> Result<Option<String>, ParserError> {
        for attribute in element.attributes() {
            let attribute = attribute.map_err(|e| {
                ParserError::MalformedSchema(
                    raw_name(element),
                    format!("malformed attribute: {e}"),
                )
            })?;

            if attribute.key.as_ref() == name.as_bytes() {
                let value = attribute.unescape_value().map_err(|e| {
                    ParserError::MalformedSchema(
                        raw_name(element),
                        format!("attribute \"{name}\" is not valid text: {e}"),
                    )
                })?;

                return Ok(Some(value.into_owned()));
            }
        }

        Ok(None)
    }

    pub fn require_attribute(
        element: &BytesStart<'_>,
        name: &str,
        path: &str,
    ) -> Result<String, ParserError> {
        Self::get_attribute(element, name)?.ok_or_else(|| {
            ParserError::MalformedSchema(
                path.to_owned(),
                format!("missing required attribute \"{name}\""),
            )
        })
    }

    /// Parses minOccurs/maxOccurs with the schema defaults of 1/1.
    pub fn get_occurs(
        element: &BytesStart<'_>,
        path: &str,
    ) -> Result<(u32, Occurs), ParserError> {
        let min_occurs = match Self::get_attribute(element, "minOccurs")? {
            Some(value) => value.parse::<u32>().map_err(|_| {
                ParserError::MalformedSchema(
                    path.to_owned(),
                    format!("invalid minOccurs \"{value}\""),
                )
            })?,
            None => DEFAULT_OCCURS,
        };

        let max_occurs = match Self::get_attribute(element, "maxOccurs")? {
            Some(value) if value == "unbounded" => Occurs::Unbounded,
            Some(value) => Occurs::Bounded(value.parse::<u32>().map_err(|_| {
                ParserError::MalformedSchema(
                    path.to_owned(),
                    format!("invalid maxOccurs \"{value}\""),
                )
            })?),
            None => Occurs::Bounded(DEFAULT_OCCURS),
        };

        Ok((min_occurs, max_occurs))
    }

    /// Parses a boolean attribute, absent means false.
    pub fn get_bool_attribute(
        element: &BytesStart<'_>,
        name: &str,
        path: &str,
    ) -> Result<bool, ParserError> {
        match Self::get_attribute(element, name)? {
            None => Ok(false),
            Some(value) => match value.as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(ParserError::MalformedSchema(
                    path.to_owned(),
                    format!("invalid boolean \"{other}\" for attribute \"{name}\""),
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_element(tag: &str) -> BytesStart<'static> {
        BytesStart::from_content(tag.to_owned(), tag.find(' ').unwrap_or(tag.len()))
    }

    #[test]
    fn resolve_qname_uses_declared_prefixes() {
        let mut context = NamespaceContext::new("urn:example");
        let element =
            start_element(r#"schema xmlns:tns="urn:example" xmlns="http://www.w3.org/2001/XMLSchema""#);

        context.collect_bindings(&element).unwrap();

        assert_eq!(
            context.resolve_qname("tns:Invoice", "schema").unwrap(),
            QualifiedName::new("urn:example", "Invoice")
        );
        assert_eq!(
            context.resolve_qname("string", "schema").unwrap(),
            QualifiedName::new("http://www.w3.org/2001/XMLSchema", "string")
        );
    }

    #[test]
    fn resolve_qname_falls_back_to_target_namespace() {
        let context = NamespaceContext::new("urn:example");

        assert_eq!(
            context.resolve_qname("Invoice", "schema").unwrap(),
            QualifiedName::new("urn:example", "Invoice")
        );
    }

    #[test]
    fn resolve_qname_rejects_undeclared_prefix() {
        let context = NamespaceContext::new("urn:example");

        assert!(matches!(
            context.resolve_qname("missing:Invoice", "schema"),
            Err(ParserError::MalformedSchema(_, _))
        ));
    }

    #[test]
    fn get_occurs_defaults_and_unbounded() {
        let element = start_element("element");
        assert_eq!(
            XmlHelper::get_occurs(&element, "element").unwrap(),
            (1, Occurs::Bounded(1))
        );

        let element = start_element(r#"element minOccurs="0" maxOccurs="unbounded""#);
        assert_eq!(
            XmlHelper::get_occurs(&element, "element").unwrap(),
            (0, Occurs::Unbounded)
        );
    }
}
