mod alias_code_gen;
mod client_code_gen;
mod code_writer;
mod enum_code_gen;
mod helper;
mod struct_code_gen;
mod union_type_code_gen;

pub mod code_generator;
