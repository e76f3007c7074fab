//! Object storage operations for bucket teardown
//!
//! A bucket can only be deleted once it holds no objects, no unfinished
//! multipart uploads and no pre-authenticated requests. [`ObjectStorage::delete_bucket`]
//! removes all three, then the bucket.

use super::error::ignore_not_found;
use super::pagination::list_all;
use oci_sweep_common::{ProviderError, ServiceClient};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

/// Object storage client wrapper
pub struct ObjectStorage<C> {
    client: Arc<C>,
}

impl<C: ServiceClient> ObjectStorage<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Tenancy-wide object storage namespace
    pub async fn namespace(&self) -> Result<String, ProviderError> {
        let value = self.client.invoke("get_namespace", json!({})).await?;
        match value {
            Value::String(ns) => Ok(ns),
            other => other
                .get("value")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| ProviderError::Decode {
                    operation: "get_namespace".to_string(),
                    message: "expected a namespace string".to_string(),
                }),
        }
    }

    /// Delete every object in `bucket`. Returns the number deleted.
    ///
    /// Object listings paginate with `nextStartWith` rather than page tokens.
    pub async fn delete_objects(&self, namespace: &str, bucket: &str) -> Result<usize, ProviderError> {
        let mut deleted = 0;
        let mut start: Option<String> = None;

        loop {
            let mut params = json!({
                "namespaceName": namespace,
                "bucketName": bucket,
                "fields": "name",
            });
            if let Some(start) = &start {
                params["start"] = json!(start);
            }

            let response = self.client.invoke("list_objects", params).await?;
            let objects = response
                .get("objects")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            for object in &objects {
                let Some(name) = object.get("name").and_then(Value::as_str) else {
                    continue;
                };
                debug!(bucket = %bucket, object = %name, "Deleting object");
                ignore_not_found(
                    self.client
                        .invoke(
                            "delete_object",
                            json!({
                                "namespaceName": namespace,
                                "bucketName": bucket,
                                "objectName": name,
                            }),
                        )
                        .await,
                )?;
                deleted += 1;
            }

            match response.get("nextStartWith").and_then(Value::as_str) {
                Some(next) if !next.is_empty() => start = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(deleted)
    }

    /// Abort every unfinished multipart upload in `bucket`
    pub async fn abort_multipart_uploads(
        &self,
        namespace: &str,
        bucket: &str,
    ) -> Result<usize, ProviderError> {
        let uploads = list_all(
            self.client.as_ref(),
            "list_multipart_uploads",
            json!({ "namespaceName": namespace, "bucketName": bucket }),
        )
        .await?;

        let mut aborted = 0;
        for upload in &uploads {
            let (Some(object), Some(upload_id)) = (
                upload.get("object").and_then(Value::as_str),
                upload.get("uploadId").and_then(Value::as_str),
            ) else {
                continue;
            };
            ignore_not_found(
                self.client
                    .invoke(
                        "abort_multipart_upload",
                        json!({
                            "namespaceName": namespace,
                            "bucketName": bucket,
                            "objectName": object,
                            "uploadId": upload_id,
                        }),
                    )
                    .await,
            )?;
            aborted += 1;
        }
        Ok(aborted)
    }

    /// Delete every pre-authenticated request on `bucket`
    pub async fn delete_preauthenticated_requests(
        &self,
        namespace: &str,
        bucket: &str,
    ) -> Result<usize, ProviderError> {
        let requests = list_all(
            self.client.as_ref(),
            "list_preauthenticated_requests",
            json!({ "namespaceName": namespace, "bucketName": bucket }),
        )
        .await?;

        let mut deleted = 0;
        for par in &requests {
            let Some(par_id) = par.get("id").and_then(Value::as_str) else {
                continue;
            };
            ignore_not_found(
                self.client
                    .invoke(
                        "delete_preauthenticated_request",
                        json!({
                            "namespaceName": namespace,
                            "bucketName": bucket,
                            "parId": par_id,
                        }),
                    )
                    .await,
            )?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Empty `bucket` completely, then delete it.
    pub async fn delete_bucket(&self, namespace: &str, bucket: &str) -> Result<(), ProviderError> {
        info!(bucket = %bucket, "Deleting bucket and contents");

        let objects = self.delete_objects(namespace, bucket).await?;
        let uploads = self.abort_multipart_uploads(namespace, bucket).await?;
        let pars = self.delete_preauthenticated_requests(namespace, bucket).await?;
        debug!(bucket = %bucket, objects, uploads, pars, "Bucket emptied");

        self.client
            .invoke(
                "delete_bucket",
                json!({ "namespaceName": namespace, "bucketName": bucket }),
            )
            .await?;
        Ok(())
    }
}
