//! Facility service implementation
//!
//! This service handles facility records: creation by organizers, per-owner
//! listings, the global admin listing, and edits/deletion by the owner.

use tracing::{info, debug};
use crate::database::repositories::FacilityRepository;
use crate::models::facility::{Facility, CreateFacilityRequest, UpdateFacilityRequest};
use crate::services::auth::AuthContext;
use crate::utils::errors::{GatherlyError, Result};

/// Facility service for venue management
#[derive(Clone)]
pub struct FacilityService {
    facility_repository: FacilityRepository,
}

impl FacilityService {
    /// Create a new FacilityService instance
    pub fn new(facility_repository: FacilityRepository) -> Self {
        Self { facility_repository }
    }

    /// Create a facility owned by the requesting user
    pub async fn create_facility(&self, owner_id: i64, name: String, description: Option<String>) -> Result<Facility> {
        if name.trim().is_empty() {
            return Err(GatherlyError::InvalidInput("Facility name cannot be empty".to_string()));
        }

        let request = CreateFacilityRequest {
            name: name.trim().to_string(),
            description,
            owner_id,
        };

        let facility = self.facility_repository.create(request).await?;
        info!(facility_id = facility.id, owner_id = owner_id, "Facility created");

        Ok(facility)
    }

    /// Get facility by ID
    pub async fn get_facility(&self, facility_id: i64) -> Result<Facility> {
        self.facility_repository.find_by_id(facility_id).await?
            .ok_or(GatherlyError::FacilityNotFound { facility_id })
    }

    /// Facilities visible to the caller: admins see every facility, everyone
    /// else sees their own
    pub async fn list_for(&self, context: &AuthContext, limit: i64, offset: i64) -> Result<Vec<Facility>> {
        if context.is_admin() {
            debug!(user_id = context.user_id, "Listing all facilities (admin view)");
            self.facility_repository.list(limit, offset).await
        } else {
            debug!(user_id = context.user_id, "Listing own facilities");
            self.facility_repository.list_by_owner(context.user_id).await
        }
    }

    /// Update a facility owned by the caller
    pub async fn update_facility(&self, context: &AuthContext, facility_id: i64, request: UpdateFacilityRequest) -> Result<Facility> {
        let facility = self.get_facility(facility_id).await?;

        if !context.is_admin() && facility.owner_id != context.user_id {
            return Err(GatherlyError::PermissionDenied(
                "Only the owner can edit this facility".to_string()
            ));
        }

        let updated = self.facility_repository.update(facility_id, request).await?;
        info!(facility_id = facility_id, user_id = context.user_id, "Facility updated");

        Ok(updated)
    }

    /// Delete a facility owned by the caller
    pub async fn delete_facility(&self, context: &AuthContext, facility_id: i64) -> Result<()> {
        let facility = self.get_facility(facility_id).await?;

        if !context.is_admin() && facility.owner_id != context.user_id {
            return Err(GatherlyError::PermissionDenied(
                "Only the owner can delete this facility".to_string()
            ));
        }

        self.facility_repository.delete(facility_id).await?;
        info!(facility_id = facility_id, user_id = context.user_id, "Facility deleted");

        Ok(())
    }

}
