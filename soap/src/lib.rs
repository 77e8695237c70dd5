//! Runtime library for generated SOAP 1.1 clients.
//!
//! Generated code speaks in nominal types; the wire speaks XML. The bridge
//! is the [Element] tree together with the [ToXml] and [FromXml] traits the
//! generator implements per type. [Envelope] wraps body and header children
//! into a SOAP 1.1 envelope and [Client] posts it over HTTP.

mod client;
mod envelope;
mod error;
mod xml;

pub use client::Client;
pub use envelope::{Envelope, Fault};
pub use error::SoapError;
pub use xml::{Element, FromXml, ToXml};
