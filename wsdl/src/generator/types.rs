/// The lowered, language-neutral type of a field or alias. Names are already
/// mangled identifiers; the emitter only decides surface syntax.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataType {
    Boolean,
    DateTime,
    Date,
    Time,
    /// xs:decimal, rendered as the widest float
    Decimal,
    Double,
    Float,
    /// base64Binary/hexBinary, carried in lexical form so round-trips stay
    /// byte-exact
    Binary(BinaryEncoding),
    /// i8
    ShortInteger,
    /// i16
    SmallInteger,
    /// i32
    Integer,
    /// i64
    LongInteger,
    /// u8
    UnsignedShortInteger,
    /// u16
    UnsignedSmallInteger,
    /// u32
    UnsignedInteger,
    /// u64
    UnsignedLongInteger,
    String,
    Uri,
    QName,
    /// a generated struct
    Custom(String),
    /// a generated string enumeration
    Enumeration(String),
    /// a generated scalar type alias
    Alias(String),
    /// a generated sum type (choice, xs:union or substitution group)
    Union(String),
    /// repeated content, one XML child per item
    List(Box<DataType>),
    /// xs:list, whitespace-separated items in one text node
    InlineList(Box<DataType>),
    /// xs:any, the raw element is kept
    RawXml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryEncoding {
    Hex,
    Base64,
}

/// Where a field lives in the XML representation of its owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XmlSource {
    Element,
    Attribute,
    /// character content of the owning element (simpleContent)
    Text,
}

/// Lowered occurrence of a field, per the cardinality table: required
/// single, optional single (minOccurs=0 or nillable), or list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    Required,
    Optional,
    List,
}

#[derive(Clone, Debug)]
pub struct Field {
    /// mangled member identifier
    pub name: String,
    /// local name on the wire
    pub xml_name: String,
    pub data_type: DataType,
    pub cardinality: Cardinality,
    /// reference back into a cyclic group, placed behind an indirection
    pub boxed: bool,
    pub source: XmlSource,
    pub documentations: Vec<String>,
}

/// A complex type lowered to a nominal record. Inherited fields are
/// flattened in, base-first, since the target has no struct inheritance.
#[derive(Clone, Debug)]
pub struct StructType {
    pub name: String,
    pub xml_name: String,
    pub namespace: String,
    pub fields: Vec<Field>,
    pub documentations: Vec<String>,
}

/// A simple-type restriction with enumeration facets over a string base.
#[derive(Clone, Debug)]
pub struct Enumeration {
    pub name: String,
    pub xml_name: String,
    pub values: Vec<EnumerationValue>,
    pub documentations: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct EnumerationValue {
    pub variant_name: String,
    pub xml_value: String,
    pub documentations: Vec<String>,
}

/// A simple-type restriction without enumeration facets, or an xs:list.
#[derive(Clone, Debug)]
pub struct TypeAlias {
    pub name: String,
    pub xml_name: String,
    pub for_type: DataType,
    pub pattern: Option<String>,
    pub documentations: Vec<String>,
}

/// How a union dispatches on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnionDispatch {
    /// one child element per variant (choice particles, substitution groups)
    Element,
    /// a single text value tried against each variant in order (xs:union)
    Text,
}

#[derive(Clone, Debug)]
pub struct UnionType {
    pub name: String,
    pub xml_name: String,
    pub dispatch: UnionDispatch,
    pub variants: Vec<UnionVariant>,
    pub documentations: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct UnionVariant {
    pub name: String,
    /// dispatching child element name; unused for text unions
    pub xml_name: String,
    pub data_type: DataType,
    pub boxed: bool,
}

/// One type declaration in emission order.
#[derive(Clone, Debug)]
pub enum IrNode {
    Struct(StructType),
    Enum(Enumeration),
    Alias(TypeAlias),
    Union(UnionType),
}

impl IrNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(node) => &node.name,
            Self::Enum(node) => &node.name,
            Self::Alias(node) => &node.name,
            Self::Union(node) => &node.name,
        }
    }
}

/// A typed client for one service port.
#[derive(Clone, Debug)]
pub struct ServiceClient {
    pub name: String,
    /// soap:address of the port, the default endpoint
    pub endpoint: String,
    pub operations: Vec<ServiceOperation>,
    pub documentations: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ServiceOperation {
    /// mangled method identifier
    pub name: String,
    pub soap_action: String,
    /// struct type of the request body part
    pub input: String,
    /// body element carrying the request: (namespace, local name)
    pub input_element: (String, String),
    /// struct type of the response body part; None for one-way operations
    pub output: Option<String>,
    pub output_element: Option<(String, String)>,
    /// struct types of the declared fault payloads
    pub faults: Vec<String>,
    pub documentations: Vec<String>,
}
