//! OpenDAL operator construction from storage configuration.

use opendal::{services, Operator};
use sitecost_shared::config::StorageProvider;

use super::error::StoreError;

/// Builds the OpenDAL operator for the configured provider.
///
/// # Errors
///
/// Returns an error if the provider cannot be initialized.
pub fn build_operator(provider: &StorageProvider) -> Result<Operator, StoreError> {
    match provider {
        StorageProvider::S3 {
            endpoint,
            bucket,
            access_key_id,
            secret_access_key,
            region,
        } => {
            let builder = services::S3::default()
                .endpoint(endpoint)
                .bucket(bucket)
                .access_key_id(access_key_id)
                .secret_access_key(secret_access_key)
                .region(region);

            Ok(Operator::new(builder)
                .map_err(|e| StoreError::configuration(e.to_string()))?
                .finish())
        }
        StorageProvider::AzureBlob {
            account,
            access_key,
            container,
        } => {
            let builder = services::Azblob::default()
                .account_name(account)
                .account_key(access_key)
                .container(container);

            Ok(Operator::new(builder)
                .map_err(|e| StoreError::configuration(e.to_string()))?
                .finish())
        }
        StorageProvider::LocalFs { root } => {
            let builder = services::Fs::default().root(
                root.to_str()
                    .ok_or_else(|| StoreError::configuration("invalid path"))?,
            );

            Ok(Operator::new(builder)
                .map_err(|e| StoreError::configuration(e.to_string()))?
                .finish())
        }
    }
}

/// An in-memory operator for tests.
///
/// # Errors
///
/// Returns an error if the memory backend cannot be initialized.
pub fn memory_operator() -> Result<Operator, StoreError> {
    Ok(Operator::new(services::Memory::default())
        .map_err(|e| StoreError::configuration(e.to_string()))?
        .finish())
}
