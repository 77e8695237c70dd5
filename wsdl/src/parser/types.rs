use std::{error::Error, fmt::Display};

/// Namespace of XML Schema structures
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
/// Namespace of WSDL 1.1 definitions
pub const WSDL_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/";
/// Namespace of the SOAP 1.1 binding extension
pub const SOAP_BINDING_NAMESPACE: &str = "http://schemas.xmlsoap.org/wsdl/soap/";

/// xsd default occurrence is 1
pub const DEFAULT_OCCURS: u32 = 1;

/// A namespace-qualified name. Equality is structural and the namespace may
/// be empty for declarations in no namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    pub namespace: String,
    pub local: String,
}

impl QualifiedName {
    pub fn new(namespace: &str, local: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            local: local.to_owned(),
        }
    }

    pub fn unqualified(local: &str) -> Self {
        Self {
            namespace: String::new(),
            local: local.to_owned(),
        }
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

/// maxOccurs value, either a bound or "unbounded"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurs {
    Bounded(u32),
    Unbounded,
}

impl Occurs {
    pub fn is_multiple(self) -> bool {
        match self {
            Self::Bounded(n) => n > 1,
            Self::Unbounded => true,
        }
    }
}

/// elementFormDefault of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementFormDefault {
    Qualified,
    #[default]
    Unqualified,
}

/// xs:schema
#[derive(Debug, Clone)]
pub struct Schema {
    pub target_namespace: String,
    pub element_form_default: ElementFormDefault,
    /// top-level nodes in document order, anonymous inline types hoisted
    /// behind the node that declared them
    pub nodes: Vec<SchemaNode>,
}

#[derive(Debug, Clone)]
pub enum SchemaNode {
    Element(ElementDecl),
    SimpleType(SimpleTypeDecl),
    ComplexType(ComplexTypeDecl),
    Attribute(AttributeDecl),
    Group(GroupDecl),
    AttributeGroup(AttributeGroupDecl),
    Import(SchemaImport),
}

/// xs:import or xs:include, resolved by the document reader
#[derive(Debug, Clone)]
pub struct SchemaImport {
    pub namespace: Option<String>,
    pub schema_location: Option<String>,
}

/// xs:element, top-level or inside a particle
#[derive(Debug, Clone)]
pub struct ElementDecl {
    pub name: QualifiedName,
    pub content: ElementContent,
    pub nillable: bool,
    pub min_occurs: u32,
    pub max_occurs: Occurs,
    pub is_abstract: bool,
    pub substitution_group: Option<QualifiedName>,
    /// Documentation extracted from xs:annotation
    pub documentations: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum ElementContent {
    /// type="qn", or an inline anonymous type hoisted under a synthesized name
    TypeRef(QualifiedName),
    /// ref="qn", resolved against the referenced top-level element
    Ref(QualifiedName),
}

/// xs:simpleType
#[derive(Debug, Clone)]
pub struct SimpleTypeDecl {
    pub name: QualifiedName,
    pub variety: SimpleVariety,
    pub documentations: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum SimpleVariety {
    Restriction { base: QualifiedName, facets: Facets },
    List { item_type: QualifiedName },
    Union { member_types: Vec<QualifiedName> },
}

/// Facets of an xs:restriction. Unknown facets are kept verbatim and
/// reported as warnings, never as errors.
#[derive(Debug, Clone, Default)]
pub struct Facets {
    pub enumerations: Vec<EnumerationFacet>,
    pub pattern: Option<String>,
    pub length: Option<u32>,
    pub min_inclusive: Option<String>,
    pub max_inclusive: Option<String>,
    pub other: Vec<(String, String)>,
}

/// xs:enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationFacet {
    pub value: String,
    pub documentations: Vec<String>,
}

/// xs:complexType
#[derive(Debug, Clone)]
pub struct ComplexTypeDecl {
    pub name: QualifiedName,
    /// base of an extension or restriction
    pub base: Option<QualifiedName>,
    pub content: ComplexContent,
    pub attributes: Vec<AttributeDecl>,
    /// xs:attributeGroup references, flattened during resolution
    pub attribute_groups: Vec<QualifiedName>,
    pub documentations: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum ComplexContent {
    Empty,
    /// simpleContent extension: character content of the given type
    Simple(QualifiedName),
    Particle(Particle),
}

/// The recursive content model of a complex type
#[derive(Debug, Clone)]
pub struct Particle {
    pub term: ParticleTerm,
    pub min_occurs: u32,
    pub max_occurs: Occurs,
}

#[derive(Debug, Clone)]
pub enum ParticleTerm {
    Sequence(Vec<Particle>),
    Choice(Vec<Particle>),
    All(Vec<Particle>),
    GroupRef(QualifiedName),
    Element(ElementDecl),
    Any,
}

/// xs:attribute
#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub name: QualifiedName,
    pub type_ref: QualifiedName,
    pub use_: AttributeUse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    Required,
    #[default]
    Optional,
    Prohibited,
}

/// xs:group with a named particle
#[derive(Debug, Clone)]
pub struct GroupDecl {
    pub name: QualifiedName,
    pub particle: Particle,
}

/// xs:attributeGroup
#[derive(Debug, Clone)]
pub struct AttributeGroupDecl {
    pub name: QualifiedName,
    pub attributes: Vec<AttributeDecl>,
}

/// wsdl:definitions and everything reachable from it
#[derive(Debug, Clone, Default)]
pub struct ServiceDescription {
    pub target_namespace: String,
    pub schemas: Vec<Schema>,
    pub messages: Vec<Message>,
    pub port_types: Vec<PortType>,
    pub bindings: Vec<Binding>,
    pub services: Vec<Service>,
    /// bindings skipped because they carry no SOAP 1.1 extension
    pub unsupported_bindings: Vec<QualifiedName>,
    /// wsdl:import locations, resolved by the document reader
    pub imports: Vec<WsdlImport>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct WsdlImport {
    pub namespace: Option<String>,
    pub location: String,
}

/// wsdl:message
#[derive(Debug, Clone)]
pub struct Message {
    pub name: QualifiedName,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone)]
pub struct MessagePart {
    pub name: String,
    pub content: PartContent,
}

#[derive(Debug, Clone)]
pub enum PartContent {
    Element(QualifiedName),
    Type(QualifiedName),
}

/// wsdl:portType
#[derive(Debug, Clone)]
pub struct PortType {
    pub name: QualifiedName,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone)]
pub struct Operation {
    pub name: String,
    pub documentation: Option<String>,
    pub input: QualifiedName,
    pub output: Option<QualifiedName>,
    pub faults: Vec<QualifiedName>,
    pub style: OperationStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStyle {
    RequestResponse,
    OneWay,
}

/// wsdl:binding with its SOAP 1.1 extension
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: QualifiedName,
    pub port_type: QualifiedName,
    pub style: BindingStyle,
    pub transport: String,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BindingStyle {
    #[default]
    Document,
    Rpc,
}

#[derive(Debug, Clone)]
pub struct BindingOperation {
    pub name: String,
    pub soap_action: String,
    pub input_use: BodyUse,
    pub output_use: Option<BodyUse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyUse {
    #[default]
    Literal,
    Encoded,
}

/// wsdl:service
#[derive(Debug, Clone)]
pub struct Service {
    pub name: QualifiedName,
    pub ports: Vec<Port>,
}

#[derive(Debug, Clone)]
pub struct Port {
    pub name: QualifiedName,
    pub binding: QualifiedName,
    pub address: String,
}

#[derive(Debug)]
pub enum ParserError {
    Io(String, std::io::Error),
    XmlParse(String, quick_xml::Error),
    MalformedSchema(String, String),
    UnsupportedConstruct(String, String),
    MissingRequiredChild(String, String),
    DuplicateName(QualifiedName, String),
    UnsupportedScheme(String),
}

impl Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(url, cause) => write!(f, "Failed to read \"{url}\": {cause}"),
            Self::XmlParse(location, cause) => {
                write!(f, "Document is not well-formed at {location}: {cause}")
            }
            Self::MalformedSchema(path, reason) => {
                write!(f, "Malformed schema at {path}: {reason}")
            }
            Self::UnsupportedConstruct(path, construct) => {
                write!(f, "Unsupported construct \"{construct}\" at {path}")
            }
            Self::MissingRequiredChild(parent, name) => {
                write!(f, "\"{parent}\" is missing required child \"{name}\"")
            }
            Self::DuplicateName(name, kind) => {
                write!(f, "Duplicate {kind} declaration \"{name}\"")
            }
            Self::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported URL scheme \"{scheme}\"")
            }
        }
    }
}

impl Error for ParserError {}
