pub mod code_generator_trait;
pub mod internal_representation;
pub mod rust;
pub mod types;
