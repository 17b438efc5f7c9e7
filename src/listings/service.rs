//! ListingService: property reads and staff edits with an audit trail.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::form::PropertyForm;
use super::model::Property;
use crate::backend::{Backend, Select};
use crate::config::tables;
use crate::error::{BackendError, ListingError};

/// Audit event kinds written to the events table.
const PROPERTY_UPDATED: &str = "property_updated";
const PROPERTY_DELETED: &str = "property_deleted";

pub struct ListingService {
    backend: Arc<dyn Backend>,
}

impl ListingService {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// All listings, newest first.
    pub async fn list(&self) -> Result<Vec<Property>, ListingError> {
        let rows = self
            .backend
            .select(&Select::from(tables::PROPERTIES).order_by("created_at", false))
            .await?;
        debug!(count = rows.len(), "Fetched properties");
        rows.into_iter().map(decode).collect()
    }

    pub async fn get(&self, id: Uuid) -> Result<Property, ListingError> {
        match self
            .backend
            .read_one(tables::PROPERTIES, &id.to_string())
            .await?
        {
            Some(row) => decode(row),
            None => Err(ListingError::NotFound { id: id.to_string() }),
        }
    }

    /// Apply an edit form and return the refreshed row.
    pub async fn update(
        &self,
        id: Uuid,
        form: &PropertyForm,
        actor: Uuid,
    ) -> Result<Property, ListingError> {
        let patch = form.to_patch()?;
        let existing = self.get(id).await?;

        self.backend
            .update(tables::PROPERTIES, &id.to_string(), &patch)
            .await
            .map_err(|e| not_found_as_listing(e, id))?;
        info!(property_id = %id, actor = %actor, "Property updated");

        self.record_event(
            PROPERTY_UPDATED,
            actor,
            id,
            "Property updated",
            &format!("\"{}\" was edited", form.title.trim()),
        )
        .await;

        // Stores that ignore the patch still hand back a usable row.
        match self.get(id).await {
            Ok(updated) => Ok(updated),
            Err(ListingError::NotFound { .. }) => Ok(existing),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, id: Uuid, actor: Uuid) -> Result<(), ListingError> {
        let existing = self.get(id).await?;
        self.backend
            .delete(tables::PROPERTIES, &id.to_string())
            .await
            .map_err(|e| not_found_as_listing(e, id))?;
        info!(property_id = %id, actor = %actor, "Property deleted");

        self.record_event(
            PROPERTY_DELETED,
            actor,
            id,
            "Property deleted",
            &format!("\"{}\" was removed", existing.title),
        )
        .await;
        Ok(())
    }

    /// Best effort. A failed audit write never fails the edit itself.
    async fn record_event(
        &self,
        event_type: &str,
        actor: Uuid,
        target: Uuid,
        title: &str,
        description: &str,
    ) {
        let event = audit_event(event_type, actor, target, title, description);
        if let Err(e) = self.backend.insert_one(tables::EVENTS, &event).await {
            warn!(event_type, property_id = %target, "Failed to record audit event: {}", e);
        }
    }
}

fn audit_event(event_type: &str, actor: Uuid, target: Uuid, title: &str, description: &str) -> Value {
    json!({
        "event_type": event_type,
        "event_category": "property",
        "actor_id": actor,
        "target_type": "property",
        "target_id": target,
        "title": title,
        "description": description,
    })
}

fn decode(row: Value) -> Result<Property, ListingError> {
    serde_json::from_value(row).map_err(|e| ListingError::Backend(BackendError::Decode(e.to_string())))
}

fn not_found_as_listing(err: BackendError, id: Uuid) -> ListingError {
    match err {
        BackendError::NotFound { .. } => ListingError::NotFound { id: id.to_string() },
        other => ListingError::Backend(other),
    }
}
