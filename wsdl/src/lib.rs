#![allow(clippy::too_many_lines)]
use std::{error::Error, fmt::Display, io::BufWriter, time::Instant};

pub mod generator;
pub mod parser;
pub mod resolver;

use generator::{
    code_generator_trait::{CodeGenError, CodeGenOptions, CodeGenerator},
    internal_representation::InternalRepresentation,
    rust::code_generator::RustCodeGenerator,
};
use parser::{reader::DocumentReader, types::ParserError};
use resolver::ResolveError;

#[derive(Debug)]
pub enum GenerateError {
    Parse(ParserError),
    Resolve(ResolveError),
    CodeGen(CodeGenError),
}

impl GenerateError {
    /// Exit code contract: 1 for parse/resolve failures, 2 for I/O failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Parse(ParserError::Io(_, _) | ParserError::UnsupportedScheme(_)) => 2,
            Self::CodeGen(CodeGenError::IOError(_)) => 2,
            _ => 1,
        }
    }
}

impl Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Resolve(e) => write!(f, "{e}"),
            Self::CodeGen(e) => write!(f, "{e}"),
        }
    }
}

impl Error for GenerateError {}

impl From<ParserError> for GenerateError {
    fn from(value: ParserError) -> Self {
        Self::Parse(value)
    }
}

impl From<ResolveError> for GenerateError {
    fn from(value: ResolveError) -> Self {
        Self::Resolve(value)
    }
}

impl From<CodeGenError> for GenerateError {
    fn from(value: CodeGenError) -> Self {
        Self::CodeGen(value)
    }
}

/// Runs the whole pipeline for one WSDL document and returns the generated
/// client source. Nothing is written anywhere on failure; the caller owns
/// the output file.
pub fn generate_client(
    source: &str,
    options: &CodeGenOptions,
) -> Result<String, GenerateError> {
    let instant = Instant::now();

    let mut reader = DocumentReader::new();
    let description = reader.load(source)?;

    for warning in &description.warnings {
        eprintln!("warning: {warning}");
    }

    let elapsed_for_parse = instant.elapsed().as_millis();
    println!("Documents parsed in {elapsed_for_parse}ms");

    let resolved = resolver::resolve(description)?;

    let elapsed_for_resolve = instant
        .elapsed()
        .as_millis()
        .saturating_sub(elapsed_for_parse);
    println!("References resolved in {elapsed_for_resolve}ms");

    let internal_representation = InternalRepresentation::build(&resolved, options);

    for warning in &internal_representation.warnings {
        eprintln!("warning: {warning}");
    }

    let buffer = BufWriter::new(Vec::new());
    let mut generator = RustCodeGenerator::new(buffer, internal_representation);
    generator.generate()?;

    let bytes = generator.into_inner()?;

    println!(
        "Completed successfully within {}ms",
        instant.elapsed().as_millis()
    );

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
