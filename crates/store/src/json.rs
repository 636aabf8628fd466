//! Whole-object JSON read/write over an OpenDAL operator.

use opendal::{ErrorKind, Operator};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::StoreError;

/// Reads and deserializes one object, `None` when the key is absent.
pub(crate) async fn read_json<T: DeserializeOwned>(
    operator: &Operator,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match operator.read(key).await {
        Ok(buffer) => {
            let value = serde_json::from_slice(&buffer.to_vec())
                .map_err(|e| StoreError::serialization(key, e))?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Serializes and writes one object as a single atomic put.
pub(crate) async fn write_json<T: Serialize>(
    operator: &Operator,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value).map_err(|e| StoreError::serialization(key, e))?;
    operator.write(key, bytes).await?;
    Ok(())
}
