use crate::{
    generator::types::{DataType, TypeAlias},
    parser::types::{SimpleTypeDecl, SimpleVariety},
    resolver::DeclKind,
};

use super::{
    helper::{as_type_name, field_data_type},
    IrContext,
};

/// Lowers a restriction without usable enumeration facets, or an xs:list,
/// to a type alias.
pub(crate) fn build_type_alias_ir(
    context: &mut IrContext,
    decl: &SimpleTypeDecl,
) -> Option<TypeAlias> {
    let resolved = context.resolved;

    let name = context
        .names
        .get(&(DeclKind::Type, decl.name.clone()))
        .map(str::to_owned)
        .unwrap_or_else(|| as_type_name(&decl.name.local));

    let (for_type, pattern) = match &decl.variety {
        SimpleVariety::Restriction { base, facets } => {
            if !facets.enumerations.is_empty() {
                context.warn(format!(
                    "enumeration facets of \"{}\" have a non-string base and are dropped",
                    decl.name
                ));
            }

            let Some(for_type) = field_data_type(resolved, &context.names, base) else {
                context.warn(format!(
                    "alias \"{}\" restricts unknown type \"{base}\"",
                    decl.name
                ));

                return None;
            };

            (for_type, facets.pattern.clone())
        }
        SimpleVariety::List { item_type } => {
            let Some(item) = field_data_type(resolved, &context.names, item_type) else {
                context.warn(format!(
                    "list \"{}\" has unknown item type \"{item_type}\"",
                    decl.name
                ));

                return None;
            };

            (DataType::InlineList(Box::new(item)), None)
        }
        SimpleVariety::Union { .. } => return None,
    };

    Some(TypeAlias {
        name,
        xml_name: decl.name.local.clone(),
        for_type,
        pattern,
        documentations: decl.documentations.clone(),
    })
}
