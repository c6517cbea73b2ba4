mod parse;
mod types;
mod validate;
mod yaml_decode;

pub use types::*;

pub(crate) use parse::parse_config;
pub(crate) use validate::validate_config;
