use std::collections::HashSet;

use crate::{
    generator::types::{
        Cardinality, DataType, Field, IrNode, StructType, UnionDispatch, UnionType, UnionVariant,
        XmlSource,
    },
    parser::types::{
        AttributeUse, ComplexContent, ComplexTypeDecl, ElementContent, ElementDecl, Particle,
        ParticleTerm, QualifiedName,
    },
    resolver::{DeclKey, DeclKind, Declaration},
};

use super::{
    helper::{as_member_name, as_type_name, field_data_type, lower_cardinality},
    IrContext,
};

/// Lowers a complex type to a struct. Inherited element fields come first
/// (base-first, as on the wire), then own content, then the flattened
/// attribute set. Inline choice particles become sum types emitted right
/// before the struct that owns them.
pub(crate) fn build_struct_ir(
    context: &mut IrContext,
    decl: &ComplexTypeDecl,
    nodes: &mut Vec<IrNode>,
) {
    let owner_key = (DeclKind::Type, decl.name.clone());

    let name = context
        .names
        .get(&owner_key)
        .map(str::to_owned)
        .unwrap_or_else(|| as_type_name(&decl.name.local));

    let mut state = StructState {
        owner_key: owner_key.clone(),
        struct_name: name.clone(),
        fields: Vec::new(),
        used_names: HashSet::new(),
        choice_count: 0,
    };

    collect_content_fields(context, decl, &mut state, nodes, &mut HashSet::new());

    for attribute in context.resolved.flattened_attributes(decl) {
        let resolved = context.resolved;
        let data_type = match field_data_type(resolved, &context.names, &attribute.type_ref) {
            Some(data_type) => data_type,
            None => {
                context.warn(format!(
                    "attribute \"{}\" of \"{}\" has unknown type \"{}\", kept as text",
                    attribute.name.local, decl.name, attribute.type_ref
                ));

                DataType::String
            }
        };

        let field_name = state.unique_name(&as_member_name(&attribute.name.local));

        state.fields.push(Field {
            name: field_name,
            xml_name: attribute.name.local.clone(),
            data_type,
            cardinality: if attribute.use_ == AttributeUse::Required {
                Cardinality::Required
            } else {
                Cardinality::Optional
            },
            boxed: false,
            source: XmlSource::Attribute,
            documentations: vec![],
        });
    }

    nodes.push(IrNode::Struct(StructType {
        name,
        xml_name: decl.name.local.clone(),
        namespace: decl.name.namespace.clone(),
        fields: state.fields,
        documentations: decl.documentations.clone(),
    }));
}

struct StructState {
    owner_key: DeclKey,
    struct_name: String,
    fields: Vec<Field>,
    used_names: HashSet<String>,
    choice_count: u32,
}

impl StructState {
    fn unique_name(&mut self, base: &str) -> String {
        let mut name = base.to_owned();
        let mut counter = 1;

        while !self.used_names.insert(name.clone()) {
            counter += 1;
            name = format!("{base}{counter}");
        }

        name
    }
}

fn collect_content_fields(
    context: &mut IrContext,
    decl: &ComplexTypeDecl,
    state: &mut StructState,
    nodes: &mut Vec<IrNode>,
    visited_bases: &mut HashSet<QualifiedName>,
) {
    if !visited_bases.insert(decl.name.clone()) {
        return;
    }

    if let Some(base) = &decl.base {
        if let Some(Declaration::Complex(base_decl)) =
            context.resolved.declaration(DeclKind::Type, base)
        {
            let base_decl = base_decl.clone();
            collect_content_fields(context, &base_decl, state, nodes, visited_bases);
        }
    }

    match &decl.content {
        ComplexContent::Empty => (),
        ComplexContent::Simple(base) => {
            let resolved = context.resolved;
            let data_type = match field_data_type(resolved, &context.names, base) {
                Some(data_type) => data_type,
                None => {
                    context.warn(format!(
                        "simple content of \"{}\" has unknown base \"{base}\", kept as text",
                        decl.name
                    ));

                    DataType::String
                }
            };

            let field_name = state.unique_name("value");

            state.fields.push(Field {
                name: field_name,
                xml_name: String::new(),
                data_type,
                cardinality: Cardinality::Required,
                boxed: false,
                source: XmlSource::Text,
                documentations: vec![],
            });
        }
        ComplexContent::Particle(particle) => {
            let particle = particle.clone();
            collect_particle_fields(context, &particle, false, state, nodes, &mut HashSet::new());
        }
    }
}

fn collect_particle_fields(
    context: &mut IrContext,
    particle: &Particle,
    forced_list: bool,
    state: &mut StructState,
    nodes: &mut Vec<IrNode>,
    visited_groups: &mut HashSet<QualifiedName>,
) {
    match &particle.term {
        ParticleTerm::Sequence(children) | ParticleTerm::All(children) => {
            let forced = forced_list || particle.max_occurs.is_multiple();

            for child in children {
                collect_particle_fields(context, child, forced, state, nodes, visited_groups);
            }
        }
        ParticleTerm::Element(element) => {
            push_element_field(context, element, forced_list, state);
        }
        ParticleTerm::Choice(children) => {
            push_choice_field(context, particle, children, forced_list, state, nodes);
        }
        ParticleTerm::GroupRef(name) => {
            if !visited_groups.insert(name.clone()) {
                return;
            }

            match context.resolved.group_particle(name) {
                Some(group_particle) => {
                    let group_particle = group_particle.clone();
                    let forced = forced_list || particle.max_occurs.is_multiple();
                    collect_particle_fields(
                        context,
                        &group_particle,
                        forced,
                        state,
                        nodes,
                        visited_groups,
                    );
                }
                None => context.warn(format!(
                    "group \"{name}\" referenced by \"{}\" was not found",
                    state.struct_name
                )),
            }

            visited_groups.remove(name);
        }
        ParticleTerm::Any => {
            let field_name = state.unique_name("any");

            state.fields.push(Field {
                name: field_name,
                xml_name: String::new(),
                data_type: DataType::RawXml,
                cardinality: lower_cardinality(particle.min_occurs, particle.max_occurs, false),
                boxed: false,
                source: XmlSource::Element,
                documentations: vec![],
            });
        }
    }
}

/// The payload type of an element reference: its declared type, or the sum
/// type of its substitution group when it points at an abstract head.
fn element_payload(
    context: &mut IrContext,
    element: &ElementDecl,
    referrer: &str,
) -> (DataType, DeclKey) {
    let resolved = context.resolved;

    match &element.content {
        ElementContent::TypeRef(type_name) => {
            let key = (DeclKind::Type, type_name.clone());

            match field_data_type(resolved, &context.names, type_name) {
                Some(data_type) => (data_type, key),
                None => {
                    context.warn(format!(
                        "element \"{}\" in \"{referrer}\" has unknown type \"{type_name}\", kept as text",
                        element.name.local
                    ));

                    (DataType::String, key)
                }
            }
        }
        ElementContent::Ref(target) => {
            let element_key = (DeclKind::Element, target.clone());

            if let Some(Declaration::Element(target_decl)) =
                resolved.declaration(DeclKind::Element, target)
            {
                if target_decl.is_abstract {
                    let name = context
                        .names
                        .get(&element_key)
                        .map(str::to_owned)
                        .unwrap_or_else(|| as_type_name(&target.local));

                    return (DataType::Union(name), element_key);
                }
            }

            match resolved.element_type(target) {
                Some(type_name) => {
                    let key = (DeclKind::Type, type_name.clone());

                    match field_data_type(resolved, &context.names, &type_name) {
                        Some(data_type) => (data_type, key),
                        None => (DataType::String, key),
                    }
                }
                None => {
                    context.warn(format!(
                        "element reference \"{target}\" in \"{referrer}\" has no resolvable type, kept as text"
                    ));

                    (DataType::String, element_key)
                }
            }
        }
    }
}

fn push_element_field(
    context: &mut IrContext,
    element: &ElementDecl,
    forced_list: bool,
    state: &mut StructState,
) {
    let struct_name = state.struct_name.clone();
    let (data_type, target_key) = element_payload(context, element, &struct_name);

    let cardinality = if forced_list {
        Cardinality::List
    } else {
        lower_cardinality(element.min_occurs, element.max_occurs, element.nillable)
    };

    let field_name = state.unique_name(&as_member_name(&element.name.local));

    state.fields.push(Field {
        name: field_name,
        xml_name: element.name.local.clone(),
        data_type,
        cardinality,
        boxed: context.needs_box(&state.owner_key, &target_key),
        source: XmlSource::Element,
        documentations: element.documentations.clone(),
    });
}

/// A choice particle becomes a sum type of its own, emitted right before the
/// struct, and one field holding it.
fn push_choice_field(
    context: &mut IrContext,
    particle: &Particle,
    children: &[Particle],
    forced_list: bool,
    state: &mut StructState,
    nodes: &mut Vec<IrNode>,
) {
    state.choice_count += 1;

    let synthetic_local = if state.choice_count == 1 {
        format!("{}_choice", state.owner_key.1.local)
    } else {
        format!("{}_choice_{}", state.owner_key.1.local, state.choice_count)
    };
    let synthetic_key = (
        DeclKind::Type,
        QualifiedName::new(&state.owner_key.1.namespace, &synthetic_local),
    );

    let enum_name = context
        .names
        .claim(&format!("{}Choice", state.struct_name), synthetic_key);

    let mut variants = Vec::new();
    let mut used = HashSet::new();

    for child in children {
        match &child.term {
            ParticleTerm::Element(element) => {
                let struct_name = state.struct_name.clone();
                let (data_type, target_key) = element_payload(context, element, &struct_name);

                let base = as_type_name(&element.name.local);
                let mut variant_name = base.clone();
                let mut counter = 1;
                while !used.insert(variant_name.clone()) {
                    counter += 1;
                    variant_name = format!("{base}{counter}");
                }

                variants.push(UnionVariant {
                    name: variant_name,
                    xml_name: element.name.local.clone(),
                    data_type,
                    boxed: context.needs_box(&state.owner_key, &target_key),
                });
            }
            ParticleTerm::Any => {
                if used.insert("Any".to_owned()) {
                    variants.push(UnionVariant {
                        name: "Any".to_owned(),
                        xml_name: String::new(),
                        data_type: DataType::RawXml,
                        boxed: false,
                    });
                }
            }
            _ => context.warn(format!(
                "choice in \"{}\" has a nested compositor alternative, skipped",
                state.struct_name
            )),
        }
    }

    nodes.push(IrNode::Union(UnionType {
        name: enum_name.clone(),
        xml_name: state.owner_key.1.local.clone(),
        dispatch: UnionDispatch::Element,
        variants,
        documentations: vec![],
    }));

    let cardinality = if forced_list || particle.max_occurs.is_multiple() {
        Cardinality::List
    } else if particle.min_occurs == 0 {
        Cardinality::Optional
    } else {
        Cardinality::Required
    };

    let field_name = if state.choice_count == 1 {
        state.unique_name("choice")
    } else {
        state.unique_name(&format!("choice{}", state.choice_count))
    };

    state.fields.push(Field {
        name: field_name,
        xml_name: String::new(),
        data_type: DataType::Union(enum_name),
        cardinality,
        boxed: false,
        source: XmlSource::Element,
        documentations: vec![],
    });
}
