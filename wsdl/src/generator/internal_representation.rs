mod enumeration;
mod helper;
mod service;
mod struct_type;
mod type_alias;
mod union_type;

use std::collections::HashMap;

use crate::{
    generator::code_generator_trait::CodeGenOptions,
    parser::types::SimpleVariety,
    resolver::{DeclKey, Declaration, Primitive, ResolvedDescription},
};

use self::helper::{resolve_primitive, NameTable};

pub use super::types::{
    Cardinality, DataType, Enumeration, Field, IrNode, ServiceClient, ServiceOperation,
    StructType, TypeAlias, UnionType, XmlSource,
};

/// The language-neutral intermediate representation: every type declaration
/// lowered to a nominal node, in emission order (dependencies first, cyclic
/// groups contiguous), plus one typed client per service port.
///
/// # Examples
///
/// ```no_run
/// use wsdl::generator::code_generator_trait::CodeGenOptions;
/// use wsdl::generator::internal_representation::InternalRepresentation;
/// use wsdl::parser::reader::DocumentReader;
/// use wsdl::resolver;
///
/// let description = DocumentReader::new().load("service.wsdl").unwrap();
/// let resolved = resolver::resolve(description).unwrap();
///
/// let ir = InternalRepresentation::build(&resolved, &CodeGenOptions::default());
/// ```
#[derive(Debug, Default)]
pub struct InternalRepresentation {
    pub nodes: Vec<IrNode>,
    pub clients: Vec<ServiceClient>,
    pub warnings: Vec<String>,
}

/// Shared state of one lowering run.
pub(crate) struct IrContext<'a> {
    pub(crate) resolved: &'a ResolvedDescription,
    pub(crate) names: NameTable,
    component_of: HashMap<DeclKey, usize>,
    component_cyclic: Vec<bool>,
    pub(crate) warnings: Vec<String>,
}

impl<'a> IrContext<'a> {
    /// A reference from `owner` back into `target`'s cyclic group needs an
    /// indirection in the emitted code.
    pub(crate) fn needs_box(&self, owner: &DeclKey, target: &DeclKey) -> bool {
        match (self.component_of.get(owner), self.component_of.get(target)) {
            (Some(a), Some(b)) => a == b && self.component_cyclic[*a],
            _ => false,
        }
    }

    pub(crate) fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

impl InternalRepresentation {
    /// Lowers the resolved description into IR nodes. The node order is the
    /// component order the resolver computed, so emitted code never forward-
    /// references a non-cyclic type.
    pub fn build(resolved: &ResolvedDescription, options: &CodeGenOptions) -> Self {
        let names = NameTable::build(resolved, options);

        let mut component_of = HashMap::new();
        let mut component_cyclic = Vec::new();

        for (index, component) in resolved.components.iter().enumerate() {
            component_cyclic.push(component.cyclic);

            for member in &component.members {
                component_of.insert(member.key().clone(), index);
            }
        }

        let mut context = IrContext {
            resolved,
            names,
            component_of,
            component_cyclic,
            warnings: Vec::new(),
        };

        let mut nodes = Vec::new();

        for component in &resolved.components {
            for member in &component.members {
                let (kind, name) = member.key().clone();

                match resolved.declaration(kind, &name) {
                    Some(Declaration::Simple(decl)) => match &decl.variety {
                        SimpleVariety::Restriction { base, facets }
                            if !facets.enumerations.is_empty()
                                && resolve_primitive(resolved, base)
                                    == Some(Primitive::String) =>
                        {
                            let decl = decl.clone();
                            nodes.push(IrNode::Enum(enumeration::build_enumeration_ir(
                                &mut context,
                                &decl,
                            )));
                        }
                        SimpleVariety::Restriction { .. } | SimpleVariety::List { .. } => {
                            let decl = decl.clone();

                            if let Some(alias) =
                                type_alias::build_type_alias_ir(&mut context, &decl)
                            {
                                nodes.push(IrNode::Alias(alias));
                            }
                        }
                        SimpleVariety::Union { .. } => {
                            let decl = decl.clone();
                            nodes.push(IrNode::Union(union_type::build_union_ir(
                                &mut context,
                                &decl,
                            )));
                        }
                    },
                    Some(Declaration::Complex(decl)) => {
                        let decl = decl.clone();
                        struct_type::build_struct_ir(&mut context, &decl, &mut nodes);
                    }
                    Some(Declaration::Element(decl)) if decl.is_abstract => {
                        let decl = decl.clone();

                        if let Some(union) =
                            union_type::build_substitution_ir(&mut context, &decl)
                        {
                            nodes.push(IrNode::Union(union));
                        }
                    }
                    _ => (),
                }
            }
        }

        let clients = service::build_clients(&mut context);

        Self {
            nodes,
            clients,
            warnings: context.warnings,
        }
    }
}
