use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::database::ProfileStore;
use crate::dto::profile_dto::UpsertProfilePayload;
use crate::error::{Error, Result};
use crate::models::profile::CandidateProfile;
use crate::utils::time::now;

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }

    pub async fn upsert(&self, user: Uuid, payload: UpsertProfilePayload) -> Result<CandidateProfile> {
        let profile = self
            .profiles
            .upsert_profile(&payload.into_profile(user, now()))
            .await?;
        info!(user_id = %user, professional_type = ?profile.professional_type, "Profile saved");
        Ok(profile)
    }

    pub async fn get(&self, user: Uuid) -> Result<CandidateProfile> {
        self.profiles
            .find_profile(user)
            .await?
            .ok_or_else(|| Error::NotFound("Profile not found".into()))
    }
}
