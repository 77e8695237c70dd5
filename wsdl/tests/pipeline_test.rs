use std::path::PathBuf;

use wsdl::generate_client;
use wsdl::generator::code_generator_trait::CodeGenOptions;
use wsdl::parser::reader::DocumentReader;
use wsdl::parser::types::{ParserError, QualifiedName, SchemaNode};
use wsdl::resolver;

fn test_data(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/test_data");
    path.push(name);

    path.to_string_lossy().into_owned()
}

#[test]
fn number_conversion_parses_with_expected_counts() {
    let description = DocumentReader::new()
        .load(&test_data("numberconversion.wsdl"))
        .expect("Failed to load numberconversion.wsdl");

    assert_eq!(
        description.target_namespace,
        "http://www.dataaccess.com/webservicesserver/"
    );
    assert_eq!(description.schemas.len(), 1);

    let elements = description.schemas[0]
        .nodes
        .iter()
        .filter_map(|node| match node {
            SchemaNode::Element(decl) => Some(decl),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(elements.len(), 4, "Schema should declare 4 elements");
    assert_eq!(
        elements[0].name,
        QualifiedName::new(
            "http://www.dataaccess.com/webservicesserver/",
            "NumberToWords"
        )
    );

    assert_eq!(description.messages.len(), 4);
    assert_eq!(description.port_types.len(), 1);
    assert_eq!(description.port_types[0].operations.len(), 2);

    // one SOAP 1.1 binding plus the skipped SOAP 1.2 one
    assert_eq!(
        description.bindings.len() + description.unsupported_bindings.len(),
        2
    );
    assert_eq!(description.bindings.len(), 1);

    assert_eq!(description.services.len(), 1);
    assert_eq!(description.services[0].ports.len(), 2);
}

#[test]
fn number_conversion_resolves_completely() {
    let description = DocumentReader::new()
        .load(&test_data("numberconversion.wsdl"))
        .expect("Failed to load numberconversion.wsdl");

    let resolved = resolver::resolve(description).expect("Failed to resolve");

    assert!(resolved.cyclic.is_empty());
    assert!(resolved
        .declaration(
            resolver::DeclKind::Type,
            &QualifiedName::new(
                "http://www.dataaccess.com/webservicesserver/",
                "NumberToWords"
            )
        )
        .is_some());
}

#[test]
fn number_conversion_client_has_both_methods() {
    let source = generate_client(
        &test_data("numberconversion.wsdl"),
        &CodeGenOptions::default(),
    )
    .expect("Failed to generate client");

    assert!(source.contains("pub struct NumberConversionSoap {"));
    assert!(source.contains("pub fn numberToWords(&self, input: NumberToWords)"));
    assert!(source.contains("pub fn numberToDollars(&self, input: NumberToDollars)"));
    assert!(source.contains("pub ubiNum: u64,"));

    // only the SOAP 1.1 port gets a client
    assert!(!source.contains("pub struct NumberConversionSoap12"));
}

#[test]
fn generation_is_deterministic() {
    let first = generate_client(
        &test_data("numberconversion.wsdl"),
        &CodeGenOptions::default(),
    )
    .expect("Failed to generate client");
    let second = generate_client(
        &test_data("numberconversion.wsdl"),
        &CodeGenOptions::default(),
    )
    .expect("Failed to generate client");

    assert_eq!(first, second, "Output should be byte-identical across runs");
}

#[test]
fn imported_schemas_are_loaded_and_resolve() {
    let description = DocumentReader::new()
        .load(&test_data("import.wsdl"))
        .expect("Failed to load import.wsdl");

    assert_eq!(description.schemas.len(), 3);

    let resolved = resolver::resolve(description).expect("Every reference should resolve");

    assert!(resolved
        .declaration(
            resolver::DeclKind::Type,
            &QualifiedName::new("urn:example:addresses", "Address")
        )
        .is_some());
    assert!(resolved
        .declaration(
            resolver::DeclKind::Type,
            &QualifiedName::new("urn:example:items", "Item")
        )
        .is_some());
}

#[test]
fn imported_types_flow_into_the_generated_client() {
    let source = generate_client(&test_data("import.wsdl"), &CodeGenOptions::default())
        .expect("Failed to generate client");

    assert!(source.contains("pub shipTo: Address,"));
    assert!(source.contains("pub item: Vec<Item>,"));
    assert!(source.contains("pub zip: Option<String>,"));
}

#[test]
fn missing_file_raises_an_io_error() {
    let result = DocumentReader::new().load(&test_data("file_not_found.wsdl"));

    match result {
        Err(ParserError::Io(url, _)) => {
            assert!(url.contains("file_not_found.wsdl"));
        }
        other => panic!("Expected an I/O error, got {other:?}"),
    }
}

#[test]
fn unreachable_import_raises_an_io_error_for_the_import_url() {
    let result = DocumentReader::new().load(&test_data("broken_import.wsdl"));

    match result {
        Err(ParserError::Io(url, _)) => {
            assert!(
                url.contains("no_such_schema.xsd"),
                "The error should name the import, not the root document: {url}"
            );
        }
        other => panic!("Expected an I/O error for the import, got {other:?}"),
    }
}
