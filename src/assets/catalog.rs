//! Listing merge and delete resolution across Cloudinary's resource-type namespaces.
//!
//! A public id alone does not say which namespace it lives in, so deletes
//! sweep the namespaces one at a time and stop at the first confirmation.

use super::AssetService;
use crate::models::{DeleteOutcome, DestroyStatus, Listing, ResourceType};
use crate::{Error, Result};
use tracing::{debug, info, warn};

/// Page size requested per resource type.
pub const MAX_RESULTS_PER_TYPE: u32 = 100;

/// List every resource type in `types`, in order, dropping assets marked deleted.
///
/// A type whose listing fails is skipped and reported in [`Listing::skipped`].
/// Only when every type fails is the failure returned.
pub async fn list_all(service: &dyn AssetService, types: &[ResourceType]) -> Result<Listing> {
    let mut listing = Listing::default();
    let mut last_error = None;

    for &resource_type in types {
        match service
            .list_resources(resource_type, MAX_RESULTS_PER_TYPE)
            .await
        {
            Ok(records) => {
                let fetched = records.len();
                listing
                    .assets
                    .extend(records.into_iter().filter(|r| !r.is_deleted()));
                debug!("Fetched {} {} resources", fetched, resource_type);
            }
            Err(e) => {
                warn!(
                    "Skipping {} resources, listing failed: {}",
                    resource_type, e
                );
                listing.skipped.push(resource_type);
                last_error = Some(e);
            }
        }
    }

    if !types.is_empty() && listing.skipped.len() == types.len() {
        if let Some(e) = last_error {
            return Err(Error::Upstream(format!(
                "Listing failed for every resource type: {}",
                e
            )));
        }
    }

    Ok(listing)
}

/// Destroy `public_id`, trying each namespace in `order` until one confirms.
pub async fn delete(
    service: &dyn AssetService,
    public_id: &str,
    order: &[ResourceType],
) -> Result<DeleteOutcome> {
    let mut saw_not_found = false;
    let mut last_other: Option<String> = None;
    let mut last_error: Option<Error> = None;

    for &resource_type in order {
        match service.destroy(public_id, resource_type).await {
            Ok(DestroyStatus::Ok) => {
                info!("Deleted {} from {} namespace", public_id, resource_type);
                return Ok(DeleteOutcome::Ok);
            }
            Ok(DestroyStatus::NotFound) => {
                debug!("{} not found as {}", public_id, resource_type);
                saw_not_found = true;
            }
            Ok(DestroyStatus::Other(raw)) => {
                warn!(
                    "Unexpected destroy result '{}' for {} as {}",
                    raw, public_id, resource_type
                );
                last_other = Some(raw);
            }
            Err(e) => {
                warn!(
                    "Destroy of {} as {} failed, trying next type: {}",
                    public_id, resource_type, e
                );
                last_error = Some(e);
            }
        }
    }

    // `not_found` only when every answer that came back said so.
    if let Some(raw) = last_other {
        return Ok(DeleteOutcome::Failed(raw));
    }

    if saw_not_found {
        info!("{} not present in any namespace", public_id);
        return Ok(DeleteOutcome::NotFound);
    }

    match last_error {
        Some(e) => Err(Error::DeleteFailed(e.to_string())),
        None => Ok(DeleteOutcome::Failed("unknown error".to_string())),
    }
}

/// Destroy `public_id` in a namespace the caller already knows, without sweeping.
pub async fn delete_in(
    service: &dyn AssetService,
    public_id: &str,
    resource_type: ResourceType,
) -> Result<DeleteOutcome> {
    match service.destroy(public_id, resource_type).await {
        Ok(DestroyStatus::Ok) => Ok(DeleteOutcome::Ok),
        Ok(DestroyStatus::NotFound) => Ok(DeleteOutcome::NotFound),
        Ok(DestroyStatus::Other(raw)) => Ok(DeleteOutcome::Failed(raw)),
        Err(e) => Err(Error::DeleteFailed(e.to_string())),
    }
}
