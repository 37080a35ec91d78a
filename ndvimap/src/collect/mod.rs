pub mod archive;
pub mod global_variables;
