use std::collections::HashSet;

use crate::{
    generator::types::{DataType, UnionDispatch, UnionType, UnionVariant},
    parser::types::{ElementDecl, SimpleTypeDecl, SimpleVariety},
    resolver::DeclKind,
};

use super::{
    helper::{as_type_name, field_data_type},
    IrContext,
};

/// Lowers an xs:union to a sum type dispatching on the text value. Variants
/// are tried in member order during deserialization, so more specific
/// members should come first in the schema.
pub(crate) fn build_union_ir(context: &mut IrContext, decl: &SimpleTypeDecl) -> UnionType {
    let resolved = context.resolved;

    let name = context
        .names
        .get(&(DeclKind::Type, decl.name.clone()))
        .map(str::to_owned)
        .unwrap_or_else(|| as_type_name(&decl.name.local));

    let mut variants = Vec::new();
    let mut used = HashSet::new();

    if let SimpleVariety::Union { member_types } = &decl.variety {
        for member in member_types {
            let Some(data_type) = field_data_type(resolved, &context.names, member) else {
                context.warn(format!(
                    "union \"{}\" member \"{member}\" is unknown and was skipped",
                    decl.name
                ));
                continue;
            };

            if matches!(data_type, DataType::Custom(_)) {
                context.warn(format!(
                    "union \"{}\" member \"{member}\" is a complex type and was skipped",
                    decl.name
                ));
                continue;
            }

            variants.push(UnionVariant {
                name: unique_variant_name(&mut used, &member.local),
                xml_name: member.local.clone(),
                data_type,
                boxed: false,
            });
        }
    }

    UnionType {
        name,
        xml_name: decl.name.local.clone(),
        dispatch: UnionDispatch::Text,
        variants,
        documentations: decl.documentations.clone(),
    }
}

/// Lowers an abstract head element to a sum type over its non-abstract
/// substitutes, dispatching on the substitute's element name.
pub(crate) fn build_substitution_ir(
    context: &mut IrContext,
    head: &ElementDecl,
) -> Option<UnionType> {
    let resolved = context.resolved;
    let head_key = (DeclKind::Element, head.name.clone());

    let name = context.names.get(&head_key).map(str::to_owned)?;

    let members = resolved
        .substitutions
        .get(&head.name)
        .cloned()
        .unwrap_or_default();

    if members.is_empty() {
        context.warn(format!(
            "abstract element \"{}\" has no concrete substitutes",
            head.name
        ));
    }

    let mut variants = Vec::new();
    let mut used = HashSet::new();

    for member in &members {
        let Some(type_name) = resolved.element_type(member) else {
            context.warn(format!(
                "substitute \"{member}\" of \"{}\" has no resolvable type",
                head.name
            ));
            continue;
        };

        let Some(data_type) = field_data_type(resolved, &context.names, &type_name) else {
            continue;
        };

        variants.push(UnionVariant {
            name: unique_variant_name(&mut used, &member.local),
            xml_name: member.local.clone(),
            data_type,
            boxed: context.needs_box(&head_key, &(DeclKind::Type, type_name)),
        });
    }

    Some(UnionType {
        name,
        xml_name: head.name.local.clone(),
        dispatch: UnionDispatch::Element,
        variants,
        documentations: head.documentations.clone(),
    })
}

fn unique_variant_name(used: &mut HashSet<String>, local: &str) -> String {
    let base = as_type_name(local);

    let mut name = base.clone();
    let mut counter = 1;
    while !used.insert(name.clone()) {
        counter += 1;
        name = format!("{base}{counter}");
    }

    name
}
