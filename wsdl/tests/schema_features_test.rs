use std::fs;

use wsdl::generate_client;
use wsdl::generator::code_generator_trait::CodeGenOptions;
use wsdl::generator::internal_representation::InternalRepresentation;
use wsdl::generator::types::IrNode;
use wsdl::parser::reader::DocumentReader;
use wsdl::parser::types::QualifiedName;
use wsdl::resolver::{self, DeclKind};

fn write_fixture(name: &str, content: &str) -> String {
    let path = std::env::temp_dir().join(name);
    fs::write(&path, content).expect("Failed to write test fixture");

    path.to_string_lossy().into_owned()
}

fn build_ir(path: &str) -> InternalRepresentation {
    let description = DocumentReader::new()
        .load(path)
        .expect("Failed to load fixture");
    let resolved = resolver::resolve(description).expect("Failed to resolve fixture");

    InternalRepresentation::build(&resolved, &CodeGenOptions::default())
}

#[test]
fn string_enumeration_lowers_to_a_string_enum() {
    let xsd = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:test:colors">
  <xs:simpleType name="Color">
    <xs:restriction base="xs:string">
      <xs:enumeration value="red"/>
      <xs:enumeration value="green"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

    let path = write_fixture("test_color_enum.xsd", xsd);
    let ir = build_ir(&path);

    let enumeration = ir
        .nodes
        .iter()
        .find_map(|node| match node {
            IrNode::Enum(e) if e.name == "Color" => Some(e),
            _ => None,
        })
        .expect("Color should lower to a string enum");

    assert_eq!(
        enumeration
            .values
            .iter()
            .map(|v| v.xml_value.as_str())
            .collect::<Vec<_>>(),
        vec!["red", "green"]
    );

    fs::remove_file(path).ok();
}

#[test]
fn self_referential_type_is_a_cyclic_group_of_one() {
    let xsd = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:tns="urn:test:tree" targetNamespace="urn:test:tree">
  <xs:complexType name="Node">
    <xs:sequence>
      <xs:element name="label" type="xs:string"/>
      <xs:element name="next" type="tns:Node" minOccurs="0"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    let path = write_fixture("test_cyclic_node.xsd", xsd);

    let description = DocumentReader::new().load(&path).expect("Failed to load");
    let resolved = resolver::resolve(description).expect("Failed to resolve");

    let node_key = (
        DeclKind::Type,
        QualifiedName::new("urn:test:tree", "Node"),
    );
    assert!(resolved.is_cyclic(&node_key));

    let component = resolved
        .components
        .iter()
        .find(|c| c.members.iter().any(|m| m.key() == &node_key))
        .expect("Node should be in a component");

    assert!(component.cyclic);
    assert_eq!(component.members.len(), 1);

    fs::remove_file(path).ok();
}

#[test]
fn cyclic_self_reference_is_emitted_behind_an_indirection() {
    let xsd = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:tns="urn:test:tree" targetNamespace="urn:test:tree">
  <xs:complexType name="Node">
    <xs:sequence>
      <xs:element name="label" type="xs:string"/>
      <xs:element name="next" type="tns:Node" minOccurs="0"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    let path = write_fixture("test_cyclic_node_codegen.xsd", xsd);
    let source = generate_client(&path, &CodeGenOptions::default()).expect("Failed to generate");

    assert!(source.contains("pub next: Option<Box<Node>>,"));
    assert!(source.contains("Some(Box::new(Node::from_xml(child)?))"));

    fs::remove_file(path).ok();
}

#[test]
fn cardinalities_are_preserved_not_collapsed() {
    let xsd = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:test:cards">
  <xs:complexType name="Record">
    <xs:sequence>
      <xs:element name="required" type="xs:string"/>
      <xs:element name="optional" type="xs:string" minOccurs="0"/>
      <xs:element name="nullable" type="xs:string" nillable="true"/>
      <xs:element name="many" type="xs:int" minOccurs="0" maxOccurs="unbounded"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    let path = write_fixture("test_cardinalities.xsd", xsd);
    let source = generate_client(&path, &CodeGenOptions::default()).expect("Failed to generate");

    assert!(source.contains("pub required: String,"));
    assert!(source.contains("pub optional: Option<String>,"));
    assert!(source.contains("pub nullable: Option<String>,"));
    // a repeated optional element is a list, never an optional list
    assert!(source.contains("pub many: Vec<i32>,"));

    fs::remove_file(path).ok();
}

#[test]
fn choice_lowers_to_a_sum_type() {
    let xsd = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:test:choice">
  <xs:complexType name="OptionType">
    <xs:choice>
      <xs:element name="textOption" type="xs:string"/>
      <xs:element name="numberOption" type="xs:int"/>
      <xs:element name="flagOption" type="xs:boolean"/>
    </xs:choice>
  </xs:complexType>
</xs:schema>"#;

    let path = write_fixture("test_choice.xsd", xsd);
    let source = generate_client(&path, &CodeGenOptions::default()).expect("Failed to generate");

    assert!(source.contains("pub enum OptionTypeChoice {"));
    assert!(source.contains("TextOption(String),"));
    assert!(source.contains("NumberOption(i32),"));
    assert!(source.contains("FlagOption(bool),"));
    assert!(source.contains("pub choice: OptionTypeChoice,"));

    fs::remove_file(path).ok();
}

#[test]
fn list_simple_type_lowers_to_an_inline_list_alias() {
    let xsd = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:tns="urn:test:lists" targetNamespace="urn:test:lists">
  <xs:simpleType name="Sizes">
    <xs:list itemType="xs:unsignedInt"/>
  </xs:simpleType>
  <xs:complexType name="Shirt">
    <xs:sequence>
      <xs:element name="sizes" type="tns:Sizes"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    let path = write_fixture("test_list_type.xsd", xsd);
    let source = generate_client(&path, &CodeGenOptions::default()).expect("Failed to generate");

    assert!(source.contains("pub type Sizes = Vec<u32>;"));
    assert!(source.contains("pub sizes: Vec<u32>,"));
    assert!(source.contains("parse_list()?"));

    fs::remove_file(path).ok();
}

#[test]
fn dependencies_are_emitted_before_their_dependents() {
    let xsd = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:tns="urn:test:order" targetNamespace="urn:test:order">
  <xs:complexType name="Invoice">
    <xs:sequence>
      <xs:element name="billTo" type="tns:Address"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Address">
    <xs:sequence>
      <xs:element name="street" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    let path = write_fixture("test_topological_order.xsd", xsd);
    let source = generate_client(&path, &CodeGenOptions::default()).expect("Failed to generate");

    let address = source
        .find("pub struct Address {")
        .expect("Address should be emitted");
    let invoice = source
        .find("pub struct Invoice {")
        .expect("Invoice should be emitted");

    assert!(
        address < invoice,
        "Address is a dependency of Invoice and has to come first"
    );

    fs::remove_file(path).ok();
}

#[test]
fn extension_fields_are_flattened_base_first() {
    let xsd = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:tns="urn:test:ext" targetNamespace="urn:test:ext">
  <xs:complexType name="Animal">
    <xs:sequence>
      <xs:element name="name" type="xs:string"/>
    </xs:sequence>
    <xs:attribute name="id" type="xs:int" use="required"/>
  </xs:complexType>
  <xs:complexType name="Dog">
    <xs:complexContent>
      <xs:extension base="tns:Animal">
        <xs:sequence>
          <xs:element name="breed" type="xs:string"/>
        </xs:sequence>
      </xs:extension>
    </xs:complexContent>
  </xs:complexType>
</xs:schema>"#;

    let path = write_fixture("test_extension.xsd", xsd);
    let source = generate_client(&path, &CodeGenOptions::default()).expect("Failed to generate");

    let dog = source.find("pub struct Dog {").expect("Dog should be emitted");
    let name_field = source[dog..].find("pub name: String,").expect("inherited field");
    let breed_field = source[dog..].find("pub breed: String,").expect("own field");

    assert!(name_field < breed_field, "Base fields come first");
    assert!(source[dog..source.len()].contains("pub id: i32,"));

    fs::remove_file(path).ok();
}

#[test]
fn substitution_group_lowers_to_a_tagged_choice() {
    let xsd = r#"<?xml version="1.0" encoding="utf-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:tns="urn:test:subst" targetNamespace="urn:test:subst">
  <xs:complexType name="CardPayment">
    <xs:sequence>
      <xs:element name="pan" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="CashPayment">
    <xs:sequence>
      <xs:element name="amount" type="xs:decimal"/>
    </xs:sequence>
  </xs:complexType>
  <xs:element name="payment" abstract="true" type="tns:CardPayment"/>
  <xs:element name="card" substitutionGroup="tns:payment" type="tns:CardPayment"/>
  <xs:element name="cash" substitutionGroup="tns:payment" type="tns:CashPayment"/>
  <xs:complexType name="Order">
    <xs:sequence>
      <xs:element ref="tns:payment"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

    let path = write_fixture("test_substitution.xsd", xsd);
    let source = generate_client(&path, &CodeGenOptions::default()).expect("Failed to generate");

    assert!(source.contains("pub enum Payment {"));
    assert!(source.contains("Card(CardPayment),"));
    assert!(source.contains("Cash(CashPayment),"));

    fs::remove_file(path).ok();
}
