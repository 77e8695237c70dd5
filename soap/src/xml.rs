use std::{fmt::Display, io::Cursor, str::FromStr};

use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};

use crate::error::SoapError;

/// Serializes a value into an element the caller allocated.
pub trait ToXml {
    fn to_xml(&self, element: &mut Element);
}

/// Deserializes a value out of an element.
pub trait FromXml: Sized {
    fn from_xml(element: &Element) -> Result<Self, SoapError>;
}

/// A plain XML element tree. Names are local names; the prefix an element
/// arrived with is dropped during parsing, and rendering qualifies an
/// element through a default-namespace attribute instead of prefixes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn qualified(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_owned(),
            namespace: Some(namespace.to_owned()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_owned();
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn required_attribute(&self, name: &str) -> Result<&str, SoapError> {
        self.attribute(name).ok_or_else(|| {
            SoapError::deserialization(
                format!("{}@{name}", self.name),
                "required attribute is missing",
            )
        })
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => self.attributes.push((name.to_owned(), value.to_owned())),
        }
    }

    /// xsi:nil carried on the element
    pub fn is_nil(&self) -> bool {
        matches!(self.attribute("nil"), Some("true") | Some("1"))
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Children whose names match none of the given names, in document
    /// order. This is how wildcard content is picked up.
    pub fn children_except<'a>(
        &'a self,
        names: &'a [&'a str],
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children
            .iter()
            .filter(move |child| !names.contains(&child.name.as_str()))
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn required_child(&self, name: &str) -> Result<&Element, SoapError> {
        self.child(name).ok_or_else(|| {
            SoapError::deserialization(
                format!("{}/{name}", self.name),
                "required child element is missing",
            )
        })
    }

    /// Appends an empty child and returns it for the caller to populate.
    pub fn push_child(&mut self, name: &str) -> &mut Element {
        self.children.push(Element::new(name));

        self.children.last_mut().expect("child was just pushed")
    }

    pub fn push_element(&mut self, element: Element) {
        self.children.push(element);
    }

    /// Parses the text content via [FromStr].
    pub fn parse_text<T: FromStr>(&self) -> Result<T, SoapError>
    where
        T::Err: Display,
    {
        self.text
            .trim()
            .parse()
            .map_err(|e| SoapError::deserialization(self.name.clone(), e))
    }

    /// Parses whitespace-separated text content into items (xs:list).
    pub fn parse_list<T: FromStr>(&self) -> Result<Vec<T>, SoapError>
    where
        T::Err: Display,
    {
        self.text
            .split_whitespace()
            .map(|item| {
                item.parse()
                    .map_err(|e| SoapError::deserialization(self.name.clone(), e))
            })
            .collect()
    }

    pub fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, SoapError>
    where
        T::Err: Display,
    {
        match self.attribute(name) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|e| {
                    SoapError::deserialization(format!("{}@{name}", self.name), e)
                }),
        }
    }

    pub fn parse_required_attribute<T: FromStr>(&self, name: &str) -> Result<T, SoapError>
    where
        T::Err: Display,
    {
        self.required_attribute(name)?
            .parse()
            .map_err(|e| SoapError::deserialization(format!("{}@{name}", self.name), e))
    }

    /// Parses a complete document into its root element. Prefixes are
    /// stripped; xmlns declarations are dropped.
    pub fn parse(bytes: &[u8]) -> Result<Element, SoapError> {
        let mut reader = Reader::from_reader(bytes);
        reader.expand_empty_elements(true);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(start) => {
                    let mut element = Element::new(local_name(start.name().as_ref()).as_str());

                    for attribute in start.attributes() {
                        let attribute = attribute.map_err(|e| {
                            SoapError::deserialization(element.name.clone(), e)
                        })?;

                        let key = attribute.key.as_ref();

                        if key == b"xmlns" {
                            element.namespace =
                                Some(attribute.unescape_value()?.into_owned());
                            continue;
                        }

                        if key.starts_with(b"xmlns:") {
                            continue;
                        }

                        let value = attribute.unescape_value()?;
                        element
                            .attributes
                            .push((local_name(key), value.into_owned()));
                    }

                    stack.push(element);
                }
                Event::Text(text) => {
                    if let Some(element) = stack.last_mut() {
                        element.text.push_str(&text.unescape()?);
                    }
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        SoapError::deserialization("document", "unbalanced end tag")
                    })?;

                    match stack.last_mut() {
                        Some(parent) => parent.children.push(element),
                        None => return Ok(element),
                    }
                }
                Event::Eof => {
                    return Err(SoapError::deserialization(
                        "document",
                        "no root element found",
                    ));
                }
                _ => (),
            }

            buf.clear();
        }
    }

    /// Renders the document rooted at this element.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write(&mut writer);

        writer.into_inner().into_inner()
    }

    pub(crate) fn write(&self, writer: &mut Writer<Cursor<Vec<u8>>>) {
        let mut start = BytesStart::new(self.name.as_str());

        if let Some(namespace) = &self.namespace {
            start.push_attribute(("xmlns", namespace.as_str()));
        }

        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        // infallible: the writer targets an in-memory buffer
        writer
            .write_event(Event::Start(start))
            .expect("write to buffer");

        if !self.text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(self.text.as_str())))
                .expect("write to buffer");
        }

        for child in &self.children {
            child.write(writer);
        }

        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .expect("write to buffer");
    }
}

fn local_name(raw: &[u8]) -> String {
    let raw = String::from_utf8_lossy(raw);

    match raw.split_once(':') {
        Some((_, local)) => local.to_owned(),
        None => raw.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_prefixes_and_collects_children() {
        let element = Element::parse(
            br#"<ns:root xmlns:ns="urn:x" id="1"><ns:item>a</ns:item><ns:item>b</ns:item></ns:root>"#,
        )
        .unwrap();

        assert_eq!(element.name(), "root");
        assert_eq!(element.attribute("id"), Some("1"));
        assert_eq!(element.children_named("item").count(), 2);
        assert_eq!(element.child("item").unwrap().text(), "a");
    }

    #[test]
    fn round_trips_through_bytes() {
        let mut element = Element::qualified("Invoice", "urn:billing");
        element.set_attribute("id", "42");
        element.push_child("total").set_text("19.99");

        let parsed = Element::parse(&element.to_bytes()).unwrap();

        assert_eq!(parsed.name(), "Invoice");
        assert_eq!(parsed.attribute("id"), Some("42"));
        assert_eq!(
            parsed.required_child("total").unwrap().parse_text::<f64>().unwrap(),
            19.99
        );
    }

    #[test]
    fn parse_list_splits_on_whitespace() {
        let mut element = Element::new("sizes");
        element.set_text(" 1 2  3 ");

        assert_eq!(element.parse_list::<u32>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn nil_attribute_is_detected() {
        let element =
            Element::parse(br#"<a xmlns:xsi="urn:i"><b xsi:nil="true"/></a>"#).unwrap();

        assert!(element.child("b").unwrap().is_nil());
    }

    #[test]
    fn escaped_text_round_trips() {
        let mut element = Element::new("note");
        element.set_text("a < b & c");

        let parsed = Element::parse(&element.to_bytes()).unwrap();

        assert_eq!(parsed.text(), "a < b & c");
    }
}
