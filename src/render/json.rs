use serde::Serialize;

use crate::error::MedDbError;

pub fn to_pretty<T: Serialize>(value: &T) -> Result<String, MedDbError> {
    Ok(serde_json::to_string_pretty(value)?)
}
