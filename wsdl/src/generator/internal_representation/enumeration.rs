use std::collections::HashSet;

use crate::{
    generator::types::{Enumeration, EnumerationValue},
    parser::types::{SimpleTypeDecl, SimpleVariety},
    resolver::DeclKind,
};

use super::{
    helper::{as_type_name, NameTable},
    IrContext,
};

/// Lowers a string restriction with enumeration facets to a string
/// enumeration. Variant identifiers are mangled from the facet values;
/// values that mangle onto the same identifier take a counter suffix.
pub(crate) fn build_enumeration_ir(
    context: &mut IrContext,
    decl: &SimpleTypeDecl,
) -> Enumeration {
    let name = mangled_name(&context.names, decl);

    let mut values = Vec::new();
    let mut used = HashSet::new();

    if let SimpleVariety::Restriction { facets, .. } = &decl.variety {
        for facet in &facets.enumerations {
            let base = as_type_name(&facet.value);

            let mut variant_name = base.clone();
            let mut counter = 1;
            while !used.insert(variant_name.clone()) {
                counter += 1;
                variant_name = format!("{base}{counter}");
            }

            values.push(EnumerationValue {
                variant_name,
                xml_value: facet.value.clone(),
                documentations: facet.documentations.clone(),
            });
        }
    }

    Enumeration {
        name,
        xml_name: decl.name.local.clone(),
        values,
        documentations: decl.documentations.clone(),
    }
}

fn mangled_name(names: &NameTable, decl: &SimpleTypeDecl) -> String {
    names
        .get(&(DeclKind::Type, decl.name.clone()))
        .map(str::to_owned)
        .unwrap_or_else(|| as_type_name(&decl.name.local))
}
