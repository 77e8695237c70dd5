use std::{
    collections::{HashMap, HashSet},
    error::Error,
    fmt::Display,
};

use genrust_core::{
    dependency_graph::{Component, Dependable, DependencyGraph},
    type_registry::{RegisteredType, TypeRegistry},
};

use crate::parser::types::{
    AttributeDecl, ComplexContent, ComplexTypeDecl, ElementContent, ElementDecl, GroupDecl,
    Particle, ParticleTerm, PartContent, QualifiedName, Schema, SchemaNode, ServiceDescription,
    SimpleTypeDecl, SimpleVariety, XSD_NAMESPACE,
};

/// XSD built-in types are seeded into the type map as primitive sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Boolean,
    DateTime,
    Date,
    Time,
    Decimal,
    Double,
    Float,
    HexBinary,
    Base64Binary,
    /// i8: -128 to 127
    Byte,
    /// i16: -32,768 to 32,767
    Short,
    /// i32
    Int,
    /// i64; also covers the unbounded xs:integer family
    Long,
    /// u8
    UnsignedByte,
    /// u16
    UnsignedShort,
    /// u32
    UnsignedInt,
    /// u64
    UnsignedLong,
    String,
    Uri,
    QName,
    /// xs:anyType and xs:anySimpleType, kept as raw text
    Any,
}

/// Built-in catalogue, local name to sentinel. Lexical-only types (token,
/// normalizedString, duration, ...) deliberately map to String.
const BUILTINS: &[(&str, Primitive)] = &[
    ("anyType", Primitive::Any),
    ("anySimpleType", Primitive::Any),
    ("anyURI", Primitive::Uri),
    ("base64Binary", Primitive::Base64Binary),
    ("boolean", Primitive::Boolean),
    ("byte", Primitive::Byte),
    ("date", Primitive::Date),
    ("dateTime", Primitive::DateTime),
    ("decimal", Primitive::Decimal),
    ("double", Primitive::Double),
    ("duration", Primitive::String),
    ("float", Primitive::Float),
    ("hexBinary", Primitive::HexBinary),
    ("int", Primitive::Int),
    ("integer", Primitive::Long),
    ("language", Primitive::String),
    ("long", Primitive::Long),
    ("negativeInteger", Primitive::Long),
    ("nonNegativeInteger", Primitive::Long),
    ("nonPositiveInteger", Primitive::Long),
    ("normalizedString", Primitive::String),
    ("positiveInteger", Primitive::Long),
    ("QName", Primitive::QName),
    ("short", Primitive::Short),
    ("string", Primitive::String),
    ("time", Primitive::Time),
    ("token", Primitive::String),
    ("unsignedByte", Primitive::UnsignedByte),
    ("unsignedInt", Primitive::UnsignedInt),
    ("unsignedLong", Primitive::UnsignedLong),
    ("unsignedShort", Primitive::UnsignedShort),
];

/// XSD symbol spaces. An element and a type may share a qualified name;
/// two declarations of the same kind may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclKind {
    Type,
    Element,
    Attribute,
    Group,
    AttributeGroup,
}

impl DeclKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Element => "element",
            Self::Attribute => "attribute",
            Self::Group => "group",
            Self::AttributeGroup => "attributeGroup",
        }
    }
}

pub type DeclKey = (DeclKind, QualifiedName);

#[derive(Debug, Clone)]
pub enum Declaration {
    Builtin(Primitive),
    Element(ElementDecl),
    Simple(SimpleTypeDecl),
    Complex(ComplexTypeDecl),
    Attribute(AttributeDecl),
    Group(GroupDecl),
    AttributeGroup(crate::parser::types::AttributeGroupDecl),
}

#[derive(Debug, Clone)]
pub struct DeclEntry(pub DeclKey, pub Declaration);

impl RegisteredType<DeclKey> for DeclEntry {
    fn registry_key(&self) -> DeclKey {
        self.0.clone()
    }
}

/// Global map from qualified name to declaration, across every schema
/// reachable from the description.
pub type TypeMap = TypeRegistry<DeclKey, DeclEntry>;

/// A node of the declaration dependency graph: edge A -> B iff A's
/// definition textually references B.
#[derive(Debug, Clone)]
pub struct DeclRef {
    key: DeclKey,
    deps: Vec<DeclKey>,
}

impl DeclRef {
    pub fn key(&self) -> &DeclKey {
        &self.key
    }
}

impl Dependable<DeclKey> for DeclRef {
    fn key(&self) -> &DeclKey {
        &self.key
    }

    fn dependencies(&self) -> Vec<DeclKey> {
        self.deps.clone()
    }
}

/// The description with every reference checked, plus the auxiliary data the
/// IR builder works from. Nothing in here is mutated after resolution.
pub struct ResolvedDescription {
    pub description: ServiceDescription,
    pub type_map: TypeMap,
    /// declaration groups in emission order, cyclic groups marked
    pub components: Vec<Component<DeclRef>>,
    /// keys of every declaration that sits in a cyclic group
    pub cyclic: HashSet<DeclKey>,
    /// head element -> non-abstract substitutes, in document order
    pub substitutions: HashMap<QualifiedName, Vec<QualifiedName>>,
}

#[derive(Debug)]
pub enum ResolveError {
    DuplicateName(QualifiedName, String),
    /// every reference that failed to resolve, with its referrer, reported
    /// together so one round of fixes covers them all
    UnresolvedReferences(Vec<(QualifiedName, QualifiedName)>),
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateName(name, kind) => {
                write!(f, "Duplicate {kind} declaration \"{name}\"")
            }
            Self::UnresolvedReferences(references) => {
                writeln!(f, "{} unresolved reference(s):", references.len())?;

                for (name, referrer) in references {
                    writeln!(f, "  \"{name}\" referenced by \"{referrer}\"")?;
                }

                Ok(())
            }
        }
    }
}

impl Error for ResolveError {}

/// Resolves every reference of the description against the schemas reachable
/// from it and computes the dependency components that drive emission order.
pub fn resolve(description: ServiceDescription) -> Result<ResolvedDescription, ResolveError> {
    let mut type_map = TypeMap::new();

    for (local, primitive) in BUILTINS {
        let key = (
            DeclKind::Type,
            QualifiedName::new(XSD_NAMESPACE, local),
        );

        type_map
            .register_type(DeclEntry(key, Declaration::Builtin(*primitive)))
            .expect("builtin names are distinct");
    }

    for schema in &description.schemas {
        insert_schema(&mut type_map, schema)?;
    }

    check_references(&description, &type_map)?;

    let substitutions = collect_substitutions(&description, &type_map);
    let components = build_components(&description, &type_map, &substitutions);

    let cyclic = components
        .iter()
        .filter(|component| component.cyclic)
        .flat_map(|component| component.members.iter().map(|m| m.key.clone()))
        .collect::<HashSet<DeclKey>>();

    Ok(ResolvedDescription {
        description,
        type_map,
        components,
        cyclic,
        substitutions,
    })
}

fn insert_schema(type_map: &mut TypeMap, schema: &Schema) -> Result<(), ResolveError> {
    for node in &schema.nodes {
        let entry = match node {
            SchemaNode::Element(decl) => {
                // reference-only particles never declare anything; top-level
                // elements always carry a name
                Some(DeclEntry(
                    (DeclKind::Element, decl.name.clone()),
                    Declaration::Element(decl.clone()),
                ))
            }
            SchemaNode::SimpleType(decl) => Some(DeclEntry(
                (DeclKind::Type, decl.name.clone()),
                Declaration::Simple(decl.clone()),
            )),
            SchemaNode::ComplexType(decl) => Some(DeclEntry(
                (DeclKind::Type, decl.name.clone()),
                Declaration::Complex(decl.clone()),
            )),
            SchemaNode::Attribute(decl) => Some(DeclEntry(
                (DeclKind::Attribute, decl.name.clone()),
                Declaration::Attribute(decl.clone()),
            )),
            SchemaNode::Group(decl) => Some(DeclEntry(
                (DeclKind::Group, decl.name.clone()),
                Declaration::Group(decl.clone()),
            )),
            SchemaNode::AttributeGroup(decl) => Some(DeclEntry(
                (DeclKind::AttributeGroup, decl.name.clone()),
                Declaration::AttributeGroup(decl.clone()),
            )),
            SchemaNode::Import(_) => None,
        };

        if let Some(entry) = entry {
            type_map.register_type(entry).map_err(|(kind, name)| {
                ResolveError::DuplicateName(name, kind.as_str().to_owned())
            })?;
        }
    }

    Ok(())
}

/// Collects every (reference, referrer) pair of the description and reports
/// the ones the type map and the WSDL tables cannot satisfy, batched.
fn check_references(
    description: &ServiceDescription,
    type_map: &TypeMap,
) -> Result<(), ResolveError> {
    let mut references = Vec::new();

    for schema in &description.schemas {
        for node in &schema.nodes {
            match node {
                SchemaNode::Element(decl) => {
                    collect_element_refs(decl, &decl.name, &mut references);
                }
                SchemaNode::SimpleType(decl) => collect_simple_refs(decl, &mut references),
                SchemaNode::ComplexType(decl) => collect_complex_refs(decl, &mut references),
                SchemaNode::Attribute(decl) => references.push((
                    (DeclKind::Type, decl.type_ref.clone()),
                    decl.name.clone(),
                )),
                SchemaNode::Group(decl) => {
                    collect_particle_refs(&decl.particle, &decl.name, &mut references);
                }
                SchemaNode::AttributeGroup(decl) => {
                    for attribute in &decl.attributes {
                        references.push((
                            (DeclKind::Type, attribute.type_ref.clone()),
                            decl.name.clone(),
                        ));
                    }
                }
                SchemaNode::Import(_) => (),
            }
        }
    }

    let mut unresolved = references
        .into_iter()
        .filter(|(key, _)| !type_map.contains(key))
        .map(|((_, name), referrer)| (name, referrer))
        .collect::<Vec<(QualifiedName, QualifiedName)>>();

    // WSDL-level references live in the description tables, not the type map
    for message in &description.messages {
        for part in &message.parts {
            match &part.content {
                PartContent::Element(name) => {
                    if !type_map.contains(&(DeclKind::Element, name.clone())) {
                        unresolved.push((name.clone(), message.name.clone()));
                    }
                }
                PartContent::Type(name) => {
                    if !type_map.contains(&(DeclKind::Type, name.clone())) {
                        unresolved.push((name.clone(), message.name.clone()));
                    }
                }
            }
        }
    }

    for port_type in &description.port_types {
        for operation in &port_type.operations {
            let mut check_message = |name: &QualifiedName| {
                if !description.messages.iter().any(|m| &m.name == name) {
                    unresolved.push((name.clone(), port_type.name.clone()));
                }
            };

            check_message(&operation.input);

            if let Some(output) = &operation.output {
                check_message(output);
            }

            for fault in &operation.faults {
                check_message(fault);
            }
        }
    }

    for binding in &description.bindings {
        if !description
            .port_types
            .iter()
            .any(|p| p.name == binding.port_type)
        {
            unresolved.push((binding.port_type.clone(), binding.name.clone()));
        }
    }

    for service in &description.services {
        for port in &service.ports {
            let known = description.bindings.iter().any(|b| b.name == port.binding)
                || description.unsupported_bindings.contains(&port.binding);

            if !known {
                unresolved.push((port.binding.clone(), port.name.clone()));
            }
        }
    }

    if unresolved.is_empty() {
        Ok(())
    } else {
        Err(ResolveError::UnresolvedReferences(unresolved))
    }
}

fn collect_element_refs(
    decl: &ElementDecl,
    referrer: &QualifiedName,
    out: &mut Vec<(DeclKey, QualifiedName)>,
) {
    match &decl.content {
        ElementContent::TypeRef(name) => {
            out.push(((DeclKind::Type, name.clone()), referrer.clone()));
        }
        ElementContent::Ref(name) => {
            out.push(((DeclKind::Element, name.clone()), referrer.clone()));
        }
    }

    if let Some(head) = &decl.substitution_group {
        out.push(((DeclKind::Element, head.clone()), referrer.clone()));
    }
}

fn collect_simple_refs(decl: &SimpleTypeDecl, out: &mut Vec<(DeclKey, QualifiedName)>) {
    match &decl.variety {
        SimpleVariety::Restriction { base, .. } => {
            out.push(((DeclKind::Type, base.clone()), decl.name.clone()));
        }
        SimpleVariety::List { item_type } => {
            out.push(((DeclKind::Type, item_type.clone()), decl.name.clone()));
        }
        SimpleVariety::Union { member_types } => {
            for member in member_types {
                out.push(((DeclKind::Type, member.clone()), decl.name.clone()));
            }
        }
    }
}

fn collect_complex_refs(decl: &ComplexTypeDecl, out: &mut Vec<(DeclKey, QualifiedName)>) {
    if let Some(base) = &decl.base {
        out.push(((DeclKind::Type, base.clone()), decl.name.clone()));
    }

    match &decl.content {
        ComplexContent::Simple(base) => {
            out.push(((DeclKind::Type, base.clone()), decl.name.clone()));
        }
        ComplexContent::Particle(particle) => {
            collect_particle_refs(particle, &decl.name, out);
        }
        ComplexContent::Empty => (),
    }

    for attribute in &decl.attributes {
        out.push(((DeclKind::Type, attribute.type_ref.clone()), decl.name.clone()));
    }

    for group in &decl.attribute_groups {
        out.push(((DeclKind::AttributeGroup, group.clone()), decl.name.clone()));
    }
}

fn collect_particle_refs(
    particle: &Particle,
    referrer: &QualifiedName,
    out: &mut Vec<(DeclKey, QualifiedName)>,
) {
    match &particle.term {
        ParticleTerm::Sequence(children)
        | ParticleTerm::Choice(children)
        | ParticleTerm::All(children) => {
            for child in children {
                collect_particle_refs(child, referrer, out);
            }
        }
        ParticleTerm::GroupRef(name) => {
            out.push(((DeclKind::Group, name.clone()), referrer.clone()));
        }
        ParticleTerm::Element(decl) => collect_element_refs(decl, referrer, out),
        ParticleTerm::Any => (),
    }
}

/// Walks top-level elements and groups the non-abstract members of each
/// substitution group under its head, in document order across schemas
/// (imported schemas follow the importing document).
fn collect_substitutions(
    description: &ServiceDescription,
    type_map: &TypeMap,
) -> HashMap<QualifiedName, Vec<QualifiedName>> {
    let mut substitutions = HashMap::<QualifiedName, Vec<QualifiedName>>::new();

    for schema in &description.schemas {
        for node in &schema.nodes {
            if let SchemaNode::Element(decl) = node {
                if let Some(head) = &decl.substitution_group {
                    if !decl.is_abstract {
                        substitutions
                            .entry(head.clone())
                            .or_default()
                            .push(decl.name.clone());
                    }
                }
            }
        }
    }

    // only heads that exist are kept; dangling heads were already reported
    substitutions.retain(|head, _| type_map.contains(&(DeclKind::Element, head.clone())));

    substitutions
}

/// Builds the dependency graph over type declarations (plus one node per
/// abstract head element, which lowers to a tagged choice) and returns its
/// components in emission order.
fn build_components(
    description: &ServiceDescription,
    type_map: &TypeMap,
    substitutions: &HashMap<QualifiedName, Vec<QualifiedName>>,
) -> Vec<Component<DeclRef>> {
    let mut graph = DependencyGraph::<DeclKey, DeclRef>::new();

    for entry in type_map.iter_ordered() {
        let DeclEntry((kind, name), declaration) = entry;

        match declaration {
            Declaration::Simple(decl) => {
                let mut refs = Vec::new();
                collect_simple_refs(decl, &mut refs);

                graph.push(DeclRef {
                    key: (DeclKind::Type, name.clone()),
                    deps: type_deps(refs, type_map),
                });
            }
            Declaration::Complex(decl) => {
                let mut refs = Vec::new();
                collect_complex_refs(decl, &mut refs);

                graph.push(DeclRef {
                    key: (DeclKind::Type, name.clone()),
                    deps: type_deps(refs, type_map),
                });
            }
            Declaration::Element(decl) if decl.is_abstract => {
                let deps = substitutions
                    .get(name)
                    .into_iter()
                    .flatten()
                    .filter_map(|member| {
                        element_type(type_map, member).map(|t| (DeclKind::Type, t))
                    })
                    .collect::<Vec<DeclKey>>();

                graph.push(DeclRef {
                    key: (*kind, name.clone()),
                    deps,
                });
            }
            _ => (),
        }
    }

    graph.sorted_components()
}

/// Maps raw references onto graph keys: element references resolve through
/// to the element's type, except abstract heads which are graph nodes of
/// their own.
fn type_deps(refs: Vec<(DeclKey, QualifiedName)>, type_map: &TypeMap) -> Vec<DeclKey> {
    let mut deps = Vec::new();

    for ((kind, name), _) in refs {
        match kind {
            DeclKind::Type => deps.push((DeclKind::Type, name)),
            DeclKind::Element => match type_map.get(&(DeclKind::Element, name.clone())) {
                Some(DeclEntry(_, Declaration::Element(decl))) if decl.is_abstract => {
                    deps.push((DeclKind::Element, name));
                }
                _ => {
                    if let Some(type_name) = element_type(type_map, &name) {
                        deps.push((DeclKind::Type, type_name));
                    }
                }
            },
            DeclKind::Group => {
                if let Some(DeclEntry(_, Declaration::Group(group))) =
                    type_map.get(&(DeclKind::Group, name))
                {
                    let mut refs = Vec::new();
                    collect_particle_refs(&group.particle, &group.name, &mut refs);
                    deps.extend(type_deps(refs, type_map));
                }
            }
            DeclKind::Attribute | DeclKind::AttributeGroup => (),
        }
    }

    deps
}

/// The type a top-level element declares, following ref chains. Returns
/// None for dangling or circular chains (already reported as unresolved).
pub fn element_type(type_map: &TypeMap, element: &QualifiedName) -> Option<QualifiedName> {
    let mut current = element.clone();
    let mut seen = HashSet::new();

    loop {
        if !seen.insert(current.clone()) {
            return None;
        }

        match type_map.get(&(DeclKind::Element, current))? {
            DeclEntry(_, Declaration::Element(decl)) => match &decl.content {
                ElementContent::TypeRef(name) => return Some(name.clone()),
                ElementContent::Ref(name) => current = name.clone(),
            },
            _ => return None,
        }
    }
}

impl ResolvedDescription {
    pub fn declaration(&self, kind: DeclKind, name: &QualifiedName) -> Option<&Declaration> {
        self.type_map
            .get(&(kind, name.clone()))
            .map(|DeclEntry(_, declaration)| declaration)
    }

    pub fn is_cyclic(&self, key: &DeclKey) -> bool {
        self.cyclic.contains(key)
    }

    /// The flat attribute set of a complex type: base-type attributes
    /// prepended, attribute groups expanded in declaration order.
    pub fn flattened_attributes(&self, decl: &ComplexTypeDecl) -> Vec<AttributeDecl> {
        let mut attributes = Vec::new();
        let mut seen_types = HashSet::new();
        self.collect_attributes(decl, &mut attributes, &mut seen_types);

        attributes
    }

    fn collect_attributes(
        &self,
        decl: &ComplexTypeDecl,
        out: &mut Vec<AttributeDecl>,
        seen_types: &mut HashSet<QualifiedName>,
    ) {
        if !seen_types.insert(decl.name.clone()) {
            return;
        }

        if let Some(base) = &decl.base {
            if let Some(Declaration::Complex(base_decl)) =
                self.declaration(DeclKind::Type, base)
            {
                let base_decl = base_decl.clone();
                self.collect_attributes(&base_decl, out, seen_types);
            }
        }

        for group in &decl.attribute_groups {
            if let Some(Declaration::AttributeGroup(group_decl)) =
                self.declaration(DeclKind::AttributeGroup, group)
            {
                out.extend(group_decl.attributes.iter().cloned());
            }
        }

        out.extend(
            decl.attributes
                .iter()
                .filter(|a| a.use_ != crate::parser::types::AttributeUse::Prohibited)
                .cloned(),
        );
    }

    pub fn group_particle(&self, name: &QualifiedName) -> Option<&Particle> {
        match self.type_map.get(&(DeclKind::Group, name.clone())) {
            Some(DeclEntry(_, Declaration::Group(decl))) => Some(&decl.particle),
            _ => None,
        }
    }

    /// The type of a top-level element, following ref chains.
    pub fn element_type(&self, element: &QualifiedName) -> Option<QualifiedName> {
        element_type(&self.type_map, element)
    }
}
