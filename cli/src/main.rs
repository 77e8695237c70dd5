use std::path::PathBuf;

use clap::Parser;

use wsdl::generate_client;
use wsdl::generator::code_generator_trait::CodeGenOptions;

fn main() {
    let args = Args::parse();

    let options = match build_code_gen_options(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{message}");

            std::process::exit(1);
        }
    };

    let source = match generate_client(&args.wsdl, &options) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{error}");

            std::process::exit(error.exit_code());
        }
    };

    match &args.output {
        Some(path) => {
            if let Err(error) = std::fs::write(path, source) {
                eprintln!("Could not write output file: \"{error}\"");

                std::process::exit(2);
            }
        }
        None => print!("{source}"),
    }
}

fn build_code_gen_options(args: &Args) -> Result<CodeGenOptions, String> {
    let mut namespace_prefixes = Vec::new();

    for mapping in &args.namespace {
        match mapping.split_once('=') {
            Some((uri, prefix)) if !uri.is_empty() && !prefix.is_empty() => {
                namespace_prefixes.push((uri.to_owned(), prefix.to_owned()));
            }
            _ => {
                return Err(format!(
                    "Invalid namespace mapping \"{mapping}\", expected <uri>=<prefix>"
                ));
            }
        }
    }

    Ok(CodeGenOptions { namespace_prefixes })
}

/// `generate-client` generates a typed Rust SOAP client from a WSDL document
/// # Usage
///
/// ```bash
/// generate-client <wsdl-url-or-path> [--output <file>] [--namespace <uri>=<prefix>]
/// ```
///
/// # Arguments
///
/// * `<wsdl-url-or-path>` - URL or filesystem path of the WSDL 1.1 document.
///
/// # Options
///
/// * `--output <file>` - Path of the generated source file. The generated
///   code is printed to stdout when omitted.
/// * `--namespace <uri>=<prefix>` - Suffix to use for names of the given
///   namespace when mangled type names collide. May be repeated.
///
/// # Exit codes
///
/// `0` on success, `1` for parse or resolve errors, `2` for I/O errors.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// URL or path of the WSDL document
    pub(crate) wsdl: String,

    /// Path of the generated source file; stdout when omitted
    #[arg(short, long)]
    pub(crate) output: Option<PathBuf>,

    /// Namespace suffix mapping, <uri>=<prefix>. May be repeated.
    #[arg(long, value_name = "URI=PREFIX")]
    pub(crate) namespace: Vec<String>,
}
