use std::collections::HashSet;

use crate::{
    generator::types::{ServiceClient, ServiceOperation},
    parser::types::{
        Binding, BindingOperation, BodyUse, PortType, QualifiedName, ServiceDescription,
    },
    resolver::{DeclKind, Declaration},
};

use super::{
    helper::{as_member_name, as_type_name},
    IrContext,
};

/// Lowers every (service, port) with a usable SOAP binding to one typed
/// client. Document/literal is the supported shape: each operation's body
/// part names an element whose complex type becomes the typed input/output.
pub(crate) fn build_clients(context: &mut IrContext) -> Vec<ServiceClient> {
    let resolved = context.resolved;
    let description = &resolved.description;

    let mut clients = Vec::new();
    let mut used_names = HashSet::new();

    for service in &description.services {
        for port in &service.ports {
            let Some(binding) = description
                .bindings
                .iter()
                .find(|b| b.name == port.binding)
            else {
                if description.unsupported_bindings.contains(&port.binding) {
                    context.warn(format!(
                        "port \"{}\" uses unsupported binding \"{}\", no client generated",
                        port.name, port.binding
                    ));
                }

                continue;
            };

            let Some(port_type) = description
                .port_types
                .iter()
                .find(|p| p.name == binding.port_type)
            else {
                continue;
            };

            let mut operations = Vec::new();

            for binding_operation in &binding.operations {
                if let Some(operation) =
                    build_operation(context, description, port_type, binding, binding_operation)
                {
                    operations.push(operation);
                }
            }

            let base = as_type_name(&port.name.local);
            let mut name = base.clone();
            let mut counter = 1;
            while !used_names.insert(name.clone()) {
                counter += 1;
                name = format!("{base}{counter}");
            }

            clients.push(ServiceClient {
                name,
                endpoint: port.address.clone(),
                operations,
                documentations: vec![],
            });
        }
    }

    clients
}

fn build_operation(
    context: &mut IrContext,
    description: &ServiceDescription,
    port_type: &PortType,
    binding: &Binding,
    binding_operation: &BindingOperation,
) -> Option<ServiceOperation> {
    let Some(operation) = port_type
        .operations
        .iter()
        .find(|o| o.name == binding_operation.name)
    else {
        context.warn(format!(
            "binding \"{}\" names operation \"{}\" which \"{}\" does not declare",
            binding.name, binding_operation.name, port_type.name
        ));

        return None;
    };

    if binding_operation.input_use == BodyUse::Encoded
        || binding_operation.output_use == Some(BodyUse::Encoded)
    {
        context.warn(format!(
            "operation \"{}\" uses encoded bodies, no method generated",
            operation.name
        ));

        return None;
    }

    let (input, input_element) =
        message_body_type(context, description, &operation.input, &operation.name)?;

    let (output, output_element) = match &operation.output {
        Some(message) => {
            let (output, element) =
                message_body_type(context, description, message, &operation.name)?;

            (Some(output), Some(element))
        }
        None => (None, None),
    };

    let faults = operation
        .faults
        .iter()
        .filter_map(|fault| {
            message_body_type(context, description, fault, &operation.name).map(|(name, _)| name)
        })
        .collect();

    Some(ServiceOperation {
        name: as_member_name(&operation.name),
        soap_action: binding_operation.soap_action.clone(),
        input,
        input_element,
        output,
        output_element,
        faults,
        documentations: operation.documentation.iter().cloned().collect(),
    })
}

/// The struct behind a message's body part: the part names an element, the
/// element names a complex type. Returns the mangled struct name and the
/// element's qualified name (namespace, local).
fn message_body_type(
    context: &mut IrContext,
    description: &ServiceDescription,
    message_name: &QualifiedName,
    operation: &str,
) -> Option<(String, (String, String))> {
    let resolved = context.resolved;

    let Some(message) = description.messages.iter().find(|m| &m.name == message_name) else {
        return None;
    };

    let Some(part) = message.parts.first() else {
        context.warn(format!(
            "message \"{message_name}\" of operation \"{operation}\" has no parts, skipped"
        ));

        return None;
    };

    if message.parts.len() > 1 {
        context.warn(format!(
            "message \"{message_name}\" has {} parts, only the first is used",
            message.parts.len()
        ));
    }

    let element = match &part.content {
        crate::parser::types::PartContent::Element(element) => element,
        crate::parser::types::PartContent::Type(_) => {
            context.warn(format!(
                "part \"{}\" of message \"{message_name}\" names a type, which only \
                 rpc-style bindings use, skipped",
                part.name
            ));

            return None;
        }
    };

    let Some(type_name) = resolved.element_type(element) else {
        return None;
    };

    if !matches!(
        resolved.declaration(DeclKind::Type, &type_name),
        Some(Declaration::Complex(_))
    ) {
        context.warn(format!(
            "body element \"{element}\" of operation \"{operation}\" is not a complex type, skipped"
        ));

        return None;
    }

    let struct_name = context
        .names
        .get(&(DeclKind::Type, type_name))
        .map(str::to_owned)?;

    Some((
        struct_name,
        (element.namespace.clone(), element.local.clone()),
    ))
}
