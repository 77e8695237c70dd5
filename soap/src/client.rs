use crate::{envelope::Envelope, error::SoapError, xml::Element};

/// A SOAP 1.1 client: the endpoint URL plus an ordered list of default
/// header children sent with every call. Plain configuration, nothing
/// process-wide.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: String,
    headers: Vec<Element>,
    http: reqwest::blocking::Client,
}

impl Client {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            headers: Vec::new(),
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Appends a default SOAP header; headers are sent in insertion order.
    pub fn push_header(&mut self, header: Element) {
        self.headers.push(header);
    }

    /// Posts one envelope and parses the response envelope, blocking the
    /// calling thread. HTTP 200 and 500 are both accepted, since 500 is the
    /// SOAP fault carrier; a fault in the body turns into an error in either
    /// case.
    pub fn call(&self, soap_action: &str, body: Element) -> Result<Envelope, SoapError> {
        let envelope = Envelope::with_headers(self.headers.clone(), body);
        let request_bytes = envelope.to_bytes();

        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{soap_action}\""))
            .body(request_bytes)
            .send()?;

        let status = response.status().as_u16();

        if status != 200 && status != 500 {
            return Err(SoapError::HttpNotOk {
                status,
                body: response.text().unwrap_or_default(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        if !content_type.starts_with("text/xml") {
            return Err(SoapError::InvalidMimeType(content_type));
        }

        let bytes = response.bytes()?;
        let envelope = Envelope::parse(&bytes)?;

        if let Some(fault) = envelope.fault() {
            return Err(SoapError::Fault {
                code: fault.code,
                message: fault.message,
                actor: fault.actor,
                detail: fault.detail,
            });
        }

        Ok(envelope)
    }

    /// The asynchronous path: performs the same call on a worker thread and
    /// hands the deserialized result to the completion. The request is sent
    /// before the completion fires; completions of different calls may run
    /// in any order.
    pub fn call_with<F>(&self, soap_action: &str, body: Element, completion: F)
    where
        F: FnOnce(Result<Envelope, SoapError>) + Send + 'static,
    {
        let client = self.clone();
        let soap_action = soap_action.to_owned();

        std::thread::spawn(move || completion(client.call(&soap_action, body)));
    }
}
