pub mod annotations;
pub mod complex_type;
pub mod definitions;
pub mod element;
pub mod helper;
pub mod reader;
pub mod schema;
pub mod simple_type;
pub mod types;
