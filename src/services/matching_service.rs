use chrono::{DateTime, Utc};

use crate::models::job::{Job, WorkFormat};
use crate::models::profile::CandidateProfile;

const PROFESSIONAL_TYPE_WEIGHT: f64 = 40.0;
const LOCATION_WEIGHT: f64 = 20.0;
const EXPERIENCE_WEIGHT: f64 = 20.0;
const SKILLS_WEIGHT: f64 = 20.0;

/// Ordinal position of an experience level; unknown levels rank 0.
pub fn experience_ordinal(level: &str) -> u8 {
    match level.trim().to_lowercase().as_str() {
        "entry" => 1,
        "junior" => 2,
        "mid" => 3,
        "senior" => 4,
        "expert" => 5,
        _ => 0,
    }
}

/// Compatibility between a posting and a candidate, 0 to 100.
///
/// Each criterion adds its weight to the denominator only when it applies,
/// so a job without an experience level or required skills is scored over
/// the remaining criteria alone.
pub fn match_score(job: &Job, profile: &CandidateProfile) -> u8 {
    let mut score = 0.0_f64;
    let mut max_score = 0.0_f64;

    max_score += PROFESSIONAL_TYPE_WEIGHT;
    if let Some(kind) = profile.professional_type.as_deref() {
        if job.target_professional_types.iter().any(|t| t == kind) {
            score += PROFESSIONAL_TYPE_WEIGHT;
        }
    }

    max_score += LOCATION_WEIGHT;
    if location_matches(job, profile) {
        score += LOCATION_WEIGHT;
    }

    let required_level = job
        .requirements
        .experience
        .level
        .as_deref()
        .map(str::trim)
        .filter(|level| !level.is_empty());
    if let Some(required) = required_level {
        max_score += EXPERIENCE_WEIGHT;
        let required = experience_ordinal(required) as i16;
        let actual = profile
            .experience_level
            .as_deref()
            .map(experience_ordinal)
            .unwrap_or(0) as i16;
        if actual >= required {
            score += EXPERIENCE_WEIGHT;
        } else if required - actual == 1 {
            score += EXPERIENCE_WEIGHT / 2.0;
        }
    }

    let required_skills = &job.requirements.skills.required;
    if !required_skills.is_empty() {
        max_score += SKILLS_WEIGHT;
        let candidate_skills: Vec<String> =
            profile.skills.iter().map(|s| s.to_lowercase()).collect();
        let matched = required_skills
            .iter()
            .filter(|skill| {
                let skill = skill.to_lowercase();
                candidate_skills.iter().any(|own| own.contains(&skill))
            })
            .count();
        let earned = SKILLS_WEIGHT * (matched as f64 / required_skills.len() as f64);
        score += earned.min(SKILLS_WEIGHT);
    }

    if max_score <= 0.0 {
        return 0;
    }
    (100.0 * score / max_score).round().clamp(0.0, 100.0) as u8
}

fn location_matches(job: &Job, profile: &CandidateProfile) -> bool {
    if job.work_format == WorkFormat::Remote {
        return true;
    }
    let (Some(city), Some(location)) = (job.location.city.as_deref(), profile.location.as_deref())
    else {
        return false;
    };
    let city = city.trim();
    !city.is_empty() && location.to_lowercase().contains(&city.to_lowercase())
}

/// Additive urgency signal for ranking, capped at 100.
pub fn urgency_score(job: &Job, now: DateTime<Utc>) -> u8 {
    let mut score: u32 = 0;
    if job.urgent {
        score += 50;
    }
    if job.featured {
        score += 30;
    }
    if let Some(days) = job.days_until_deadline(now) {
        score += match days {
            d if d <= 1 => 40,
            d if d <= 3 => 30,
            d if d <= 7 => 20,
            _ => 0,
        };
    }
    score.min(100) as u8
}
