use std::io::Write;

use crate::generator::{code_generator_trait::CodeGenError, types::TypeAlias};

use super::{
    code_writer::CodeWriter,
    helper::rust_type,
};

/// Emits one type alias.
pub(crate) struct TypeAliasCodeGenerator;

impl TypeAliasCodeGenerator {
    pub(crate) fn generate<T: Write>(
        writer: &mut CodeWriter<T>,
        node: &TypeAlias,
    ) -> Result<(), CodeGenError> {
        writer.write_documentation(&node.documentations, None)?;

        if let Some(pattern) = &node.pattern {
            writer.writeln_fmt(format_args!("/// Pattern: `{pattern}`"), None)?;
        }

        writer.writeln_fmt(
            format_args!("pub type {} = {};", node.name, rust_type(&node.for_type)),
            None,
        )?;

        Ok(())
    }
}
