use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The slice of a professional's profile that job matching reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CandidateProfile {
    pub user_id: Uuid,
    pub professional_type: Option<String>,
    pub location: Option<String>,
    pub experience_level: Option<String>,
    pub skills: Vec<String>,
    pub updated_at: DateTime<Utc>,
}
