//! Descriptor-document deserialization with JSON-path error context.
//!
//! Raw rule descriptors arrive as JSON documents; when one is malformed the
//! schema author needs the path to the offending node, not just the serde
//! message.

use serde::de::DeserializeOwned;

pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path}: {}", err.into_inner()))
        }
    }
}
