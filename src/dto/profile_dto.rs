use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::profile::CandidateProfile;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpsertProfilePayload {
    #[validate(length(min = 1))]
    pub professional_type: Option<String>,
    pub location: Option<String>,
    pub experience_level: Option<String>,
    pub skills: Vec<String>,
}

impl UpsertProfilePayload {
    pub fn into_profile(self, user_id: Uuid, now: DateTime<Utc>) -> CandidateProfile {
        CandidateProfile {
            user_id,
            professional_type: self.professional_type,
            location: self.location,
            experience_level: self.experience_level,
            skills: self
                .skills
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            updated_at: now,
        }
    }
}
