//! IO module - run configuration and JSON record forms.

mod config;
mod json;

pub use config::{read_universe_config, UniverseConfig};
pub use json::{
    deserialize_rational, serialize_rational, tagged_complex, to_json_string, TaggedComplex,
};
