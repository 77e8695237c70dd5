use std::io::Cursor;

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, Event},
    Writer,
};

use crate::{error::SoapError, xml::Element};

pub const ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// A SOAP 1.1 envelope: ordered header children and body children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    pub headers: Vec<Element>,
    pub body: Vec<Element>,
}

/// The payload of soap:Fault.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub code: String,
    pub message: String,
    pub actor: Option<String>,
    pub detail: Option<Element>,
}

impl Envelope {
    pub fn new(body: Element) -> Self {
        Self {
            headers: Vec::new(),
            body: vec![body],
        }
    }

    pub fn with_headers(headers: Vec<Element>, body: Element) -> Self {
        Self {
            headers,
            body: vec![body],
        }
    }

    /// Renders `<soap:Envelope><soap:Header>..</soap:Header><soap:Body>..`
    /// as a complete document.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .expect("write to buffer");

        let mut envelope = BytesStart::new("soap:Envelope");
        envelope.push_attribute(("xmlns:soap", ENVELOPE_NAMESPACE));
        writer
            .write_event(Event::Start(envelope))
            .expect("write to buffer");

        writer
            .write_event(Event::Start(BytesStart::new("soap:Header")))
            .expect("write to buffer");
        for header in &self.headers {
            header.write(&mut writer);
        }
        writer
            .write_event(Event::End(BytesEnd::new("soap:Header")))
            .expect("write to buffer");

        writer
            .write_event(Event::Start(BytesStart::new("soap:Body")))
            .expect("write to buffer");
        for child in &self.body {
            child.write(&mut writer);
        }
        writer
            .write_event(Event::End(BytesEnd::new("soap:Body")))
            .expect("write to buffer");

        writer
            .write_event(Event::End(BytesEnd::new("soap:Envelope")))
            .expect("write to buffer");

        writer.into_inner().into_inner()
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, SoapError> {
        let root = Element::parse(bytes)?;

        if root.name() != "Envelope" {
            return Err(SoapError::deserialization(
                root.name().to_owned(),
                "expected a soap:Envelope root",
            ));
        }

        let headers = root
            .child("Header")
            .map(|header| header.children().cloned().collect())
            .unwrap_or_default();

        let body = root
            .required_child("Body")?
            .children()
            .cloned()
            .collect();

        Ok(Self { headers, body })
    }

    /// The fault carried in the body, if any. Its presence decides between
    /// the fault path and normal deserialization, regardless of the HTTP
    /// status the envelope arrived under.
    pub fn fault(&self) -> Option<Fault> {
        let fault = self.body.iter().find(|child| child.name() == "Fault")?;

        Some(Fault {
            code: fault
                .child("faultcode")
                .map(|c| c.text().to_owned())
                .unwrap_or_default(),
            message: fault
                .child("faultstring")
                .map(|c| c.text().to_owned())
                .unwrap_or_default(),
            actor: fault.child("faultactor").map(|c| c.text().to_owned()),
            detail: fault.child("detail").cloned(),
        })
    }

    /// The body child with the given local name, the normal response path.
    pub fn body_child(&self, name: &str) -> Result<&Element, SoapError> {
        self.body
            .iter()
            .find(|child| child.name() == name)
            .ok_or_else(|| {
                SoapError::deserialization(
                    format!("Body/{name}"),
                    "expected response element is missing",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> Element {
        let mut body = Element::qualified("AddResponse", "urn:calc");
        body.push_child("result").set_text("42");

        body
    }

    #[test]
    fn envelope_round_trips() {
        let mut header = Element::new("Ticket");
        header.set_text("opaque");

        let envelope = Envelope::with_headers(vec![header], sample_body());
        let parsed = Envelope::parse(&envelope.to_bytes()).unwrap();

        assert_eq!(parsed, envelope);
    }

    #[test]
    fn body_child_finds_the_response() {
        let envelope = Envelope::new(sample_body());
        let parsed = Envelope::parse(&envelope.to_bytes()).unwrap();

        let response = parsed.body_child("AddResponse").unwrap();
        assert_eq!(response.required_child("result").unwrap().text(), "42");

        assert!(parsed.body_child("SubtractResponse").is_err());
    }

    #[test]
    fn fault_is_parsed_from_the_body() {
        let bytes = br#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <soap:Fault>
      <faultcode>soap:Server</faultcode>
      <faultstring>went wrong</faultstring>
      <faultactor>urn:actor</faultactor>
      <detail><reason>db down</reason></detail>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#;

        let envelope = Envelope::parse(bytes).unwrap();
        let fault = envelope.fault().unwrap();

        assert_eq!(fault.code, "soap:Server");
        assert_eq!(fault.message, "went wrong");
        assert_eq!(fault.actor.as_deref(), Some("urn:actor"));
        assert_eq!(
            fault.detail.unwrap().child("reason").unwrap().text(),
            "db down"
        );
    }

    #[test]
    fn missing_fault_is_none() {
        let envelope = Envelope::new(sample_body());

        assert!(envelope.fault().is_none());
    }
}
