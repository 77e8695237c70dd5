use std::{
    fmt,
    io::{BufWriter, Write},
};

use super::internal_representation::InternalRepresentation;

/// Trait for code generators
pub trait CodeGenerator<T: Write> {
    fn new(buffer: BufWriter<T>, internal_representation: InternalRepresentation) -> Self;

    fn generate(&mut self) -> Result<(), CodeGenError>;
}

/// Options for lowering and code generation
#[derive(Debug, Default, Clone)]
pub struct CodeGenOptions {
    /// Caller-chosen suffix per namespace URI, used instead of the
    /// namespace hash when mangled names collide.
    pub namespace_prefixes: Vec<(String, String)>,
}

/// Errors that can occur during code generation. The resolver accepted the
/// input by the time the emitter runs, so any of these is a defect.
pub enum CodeGenError {
    IOError(std::io::Error),
    /// An IR node references a type the lowering never produced
    MissingDataType(String, String),
}

impl From<std::io::Error> for CodeGenError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl fmt::Debug for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IOError(arg0) => f.debug_tuple("IOError").field(arg0).finish(),
            Self::MissingDataType(node, member) => write!(
                f,
                "Required data type is missing. Node: {node}, Member: {member}"
            ),
        }
    }
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for CodeGenError {}
