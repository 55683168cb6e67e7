use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::database::filter::{CategoryCount, JobFilter, JobSort, Page};
use crate::error::{Error, Result};
use crate::models::job::{
    Application, ApplicationProcess, ApplicationStatus, Bid, Bidding, Compensation,
    CompensationType, CustomAnswer, Job, JobLocation, JobRequirements, JobStatus, JobTimeline,
    WorkFormat,
};
use crate::models::profile::CandidateProfile;
use crate::services::matching_service::{match_score, urgency_score};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;
/// Largest application cap the `INTEGER` column can hold.
pub const MAX_APPLICATION_LIMIT: u32 = i32::MAX as u32;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BiddingPayload {
    pub enabled: bool,
    pub minimum_bid: Option<Decimal>,
    pub maximum_bid: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobPayload {
    pub company: Option<String>,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1))]
    pub job_type: String,
    pub work_format: WorkFormat,
    #[serde(default)]
    pub target_professional_types: Vec<String>,
    #[serde(default)]
    pub location: JobLocation,
    pub compensation: Compensation,
    #[serde(default)]
    pub requirements: JobRequirements,
    #[serde(default)]
    pub timeline: JobTimeline,
    #[serde(default)]
    pub application_process: ApplicationProcess,
    #[serde(default)]
    pub bidding: BiddingPayload,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub urgent: bool,
    /// Publish immediately instead of saving a draft.
    #[serde(default)]
    pub publish: bool,
}

fn check_range(min: Option<Decimal>, max: Option<Decimal>, what: &str) -> Result<()> {
    for value in [min, max].into_iter().flatten() {
        if value < Decimal::ZERO {
            return Err(Error::BadRequest(format!("{} must not be negative", what)));
        }
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(Error::BadRequest(format!(
                "{} minimum must not exceed its maximum",
                what
            )));
        }
    }
    Ok(())
}

fn check_job_shape(job: &Job) -> Result<()> {
    check_range(
        job.compensation.amount.min,
        job.compensation.amount.max,
        "Compensation",
    )?;
    check_range(job.bidding.minimum_bid, job.bidding.maximum_bid, "Bid")?;
    match job.application_process.max_applications {
        Some(0) => {
            return Err(Error::BadRequest(
                "max_applications must be at least 1".into(),
            ))
        }
        Some(limit) if limit > MAX_APPLICATION_LIMIT => {
            return Err(Error::BadRequest(format!(
                "max_applications must not exceed {}",
                MAX_APPLICATION_LIMIT
            )))
        }
        _ => {}
    }
    Ok(())
}

impl CreateJobPayload {
    pub fn into_job(self, owner: Uuid, now: DateTime<Utc>) -> Result<Job> {
        let job = Job {
            id: Uuid::new_v4(),
            posted_by: owner,
            company: self.company,
            title: self.title,
            description: self.description,
            category: self.category,
            job_type: self.job_type,
            work_format: self.work_format,
            target_professional_types: self.target_professional_types,
            location: self.location,
            compensation: self.compensation,
            requirements: self.requirements,
            timeline: self.timeline,
            application_process: self.application_process,
            bidding: Bidding {
                enabled: self.bidding.enabled,
                minimum_bid: self.bidding.minimum_bid,
                maximum_bid: self.bidding.maximum_bid,
                winning_bidder: None,
            },
            status: if self.publish {
                JobStatus::Published
            } else {
                JobStatus::Draft
            },
            featured: self.featured,
            urgent: self.urgent,
            views: 0,
            applications: Vec::new(),
            bids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        check_job_shape(&job)?;
        Ok(job)
    }
}

/// Merge update: absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateJobPayload {
    pub company: Option<String>,
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    #[validate(length(min = 1))]
    pub job_type: Option<String>,
    pub work_format: Option<WorkFormat>,
    pub target_professional_types: Option<Vec<String>>,
    pub location: Option<JobLocation>,
    pub compensation: Option<Compensation>,
    pub requirements: Option<JobRequirements>,
    pub timeline: Option<JobTimeline>,
    pub application_process: Option<ApplicationProcess>,
    pub bidding: Option<BiddingPayload>,
    pub featured: Option<bool>,
    pub urgent: Option<bool>,
}

impl UpdateJobPayload {
    pub fn apply(self, job: &mut Job, now: DateTime<Utc>) -> Result<()> {
        if job.status.is_terminal() {
            return Err(Error::Conflict(format!(
                "Job is {} and can no longer be edited",
                job.status
            )));
        }
        if let Some(company) = self.company {
            job.company = Some(company);
        }
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(category) = self.category {
            job.category = category;
        }
        if let Some(job_type) = self.job_type {
            job.job_type = job_type;
        }
        if let Some(format) = self.work_format {
            job.work_format = format;
        }
        if let Some(types) = self.target_professional_types {
            job.target_professional_types = types;
        }
        if let Some(location) = self.location {
            job.location = location;
        }
        if let Some(compensation) = self.compensation {
            job.compensation = compensation;
        }
        if let Some(requirements) = self.requirements {
            job.requirements = requirements;
        }
        if let Some(timeline) = self.timeline {
            job.timeline = timeline;
        }
        if let Some(process) = self.application_process {
            job.application_process = process;
        }
        if let Some(bidding) = self.bidding {
            job.bidding.enabled = bidding.enabled;
            job.bidding.minimum_bid = bidding.minimum_bid;
            job.bidding.maximum_bid = bidding.maximum_bid;
        }
        if let Some(featured) = self.featured {
            job.featured = featured;
        }
        if let Some(urgent) = self.urgent {
            job.urgent = urgent;
        }
        check_job_shape(job)?;
        job.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusPayload {
    pub status: JobStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ApplyPayload {
    #[validate(length(max = 5000))]
    pub cover_letter: Option<String>,
    pub custom_answers: Vec<CustomAnswer>,
    pub portfolio_urls: Vec<String>,
    pub proposed_rate: Option<Decimal>,
}

impl ApplyPayload {
    pub fn into_application(self, applicant: Uuid, now: DateTime<Utc>) -> Result<Application> {
        if let Some(rate) = self.proposed_rate {
            if rate <= Decimal::ZERO {
                return Err(Error::BadRequest("Proposed rate must be positive".into()));
            }
        }
        Ok(Application {
            id: Uuid::new_v4(),
            applicant,
            cover_letter: self.cover_letter,
            custom_answers: self.custom_answers,
            portfolio_urls: self.portfolio_urls,
            proposed_rate: self.proposed_rate,
            status: ApplicationStatus::Pending,
            submitted_at: now,
            reviewed_at: None,
            notes: None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewApplicationPayload {
    pub status: ApplicationStatus,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BidPayload {
    pub amount: Decimal,
    pub currency: Option<String>,
    #[validate(length(min = 1, message = "Proposal is required"))]
    pub proposal: String,
    pub timeline: Option<String>,
}

impl BidPayload {
    /// Builds the bid; the currency falls back to the job's compensation currency.
    pub fn into_bid(self, bidder: Uuid, job_currency: &str, now: DateTime<Utc>) -> Result<Bid> {
        if self.amount <= Decimal::ZERO {
            return Err(Error::BadRequest("Bid amount must be positive".into()));
        }
        Ok(Bid {
            id: Uuid::new_v4(),
            bidder,
            amount: self.amount,
            currency: self.currency.unwrap_or_else(|| job_currency.to_string()),
            proposal: self.proposal,
            timeline: self.timeline,
            status: crate::models::job::BidStatus::Pending,
            submitted_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobBrowseQuery {
    pub category: Option<String>,
    pub job_type: Option<String>,
    pub work_format: Option<WorkFormat>,
    pub location: Option<String>,
    pub compensation_type: Option<CompensationType>,
    pub experience_level: Option<String>,
    pub professional_type: Option<String>,
    pub featured: Option<bool>,
    pub urgent: Option<bool>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    /// Comma separated.
    pub skills: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort: Option<JobSort>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl JobBrowseQuery {
    pub fn into_parts(self) -> (JobFilter, Page) {
        let page = Page {
            page: self.page.unwrap_or(1).max(1),
            per_page: self
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
            sort: self.sort.unwrap_or_default(),
        };
        let skills = self
            .skills
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let filter = JobFilter {
            category: non_blank(self.category),
            job_type: non_blank(self.job_type),
            work_format: self.work_format,
            location: non_blank(self.location),
            compensation_type: self.compensation_type,
            experience_level: non_blank(self.experience_level),
            professional_type: non_blank(self.professional_type),
            featured: self.featured,
            urgent: self.urgent,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            skills,
            search: non_blank(self.search),
        };
        (filter, page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    pub id: Uuid,
    pub posted_by: Uuid,
    pub company: Option<String>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub job_type: String,
    pub work_format: WorkFormat,
    pub target_professional_types: Vec<String>,
    pub location: JobLocation,
    pub compensation: Compensation,
    pub requirements: JobRequirements,
    pub timeline: JobTimeline,
    pub application_process: ApplicationProcess,
    pub bidding: Bidding,
    pub status: JobStatus,
    pub effective_status: JobStatus,
    pub featured: bool,
    pub urgent: bool,
    pub views: i64,
    pub application_count: usize,
    pub bid_count: usize,
    pub days_until_deadline: Option<i64>,
    pub urgency_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_apply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_applied: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applications: Option<Vec<Application>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bids: Option<Vec<Bid>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobResponse {
    /// Shapes a job for one viewer. The owner sees applications and bids;
    /// everybody else sees counts and their own eligibility.
    pub fn for_viewer(
        job: Job,
        viewer: Option<Uuid>,
        profile: Option<&CandidateProfile>,
        now: DateTime<Utc>,
    ) -> Self {
        let is_owner = viewer.map(|v| job.is_owned_by(v)).unwrap_or(false);
        let (can_apply, has_applied) = match viewer {
            Some(user) if !is_owner => (
                Some(job.can_user_apply(user, now)),
                Some(job.active_application_of(user).is_some()),
            ),
            _ => (None, None),
        };
        let match_score = profile.map(|p| match_score(&job, p));

        Self {
            effective_status: job.effective_status(now),
            application_count: job.application_count(),
            bid_count: job.bid_count(),
            days_until_deadline: job.days_until_deadline(now),
            urgency_score: urgency_score(&job, now),
            match_score,
            can_apply,
            has_applied,
            id: job.id,
            posted_by: job.posted_by,
            company: job.company,
            title: job.title,
            description: job.description,
            category: job.category,
            job_type: job.job_type,
            work_format: job.work_format,
            target_professional_types: job.target_professional_types,
            location: job.location,
            compensation: job.compensation,
            requirements: job.requirements,
            timeline: job.timeline,
            application_process: job.application_process,
            bidding: job.bidding,
            status: job.status,
            featured: job.featured,
            urgent: job.urgent,
            views: job.views,
            applications: is_owner.then_some(job.applications),
            bids: is_owner.then_some(job.bids),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobBrowseResponse {
    pub items: Vec<JobResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobListResponse {
    pub items: Vec<JobResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationListResponse {
    pub items: Vec<Application>,
}

/// One of the caller's own applications, with enough of the job to list it.
#[derive(Debug, Clone, Serialize)]
pub struct MyApplicationItem {
    pub job_id: Uuid,
    pub job_title: String,
    pub company: Option<String>,
    pub job_status: JobStatus,
    pub application: Application,
}

#[derive(Debug, Clone, Serialize)]
pub struct MyApplicationsResponse {
    pub items: Vec<MyApplicationItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcceptBidResponse {
    pub job: JobResponse,
    pub contract_id: Uuid,
    pub contract_number: String,
}
