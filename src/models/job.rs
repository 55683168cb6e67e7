use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::utils::time::ceil_days;

text_enum!(
    /// Lifecycle of a posting. `Expired` is derived from the deadline and never persisted.
    JobStatus {
        Draft => "draft",
        Published => "published",
        Paused => "paused",
        InReview => "in-review",
        Interviewing => "interviewing",
        Filled => "filled",
        Cancelled => "cancelled",
        Expired => "expired",
        Completed => "completed",
    }
);

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Filled | JobStatus::Cancelled | JobStatus::Expired | JobStatus::Completed
        )
    }

    /// Owner-driven transitions. `Filled` via bid acceptance goes through
    /// [`Job::accept_bid`] instead.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        match (self, next) {
            (Draft, Published) => true,
            (Published, Paused) | (Paused, Published) => true,
            (Published, InReview) | (InReview, Interviewing) | (Interviewing, Filled) => true,
            (InReview, Filled) | (Published, Filled) => true,
            (Filled, Completed) => true,
            (current, Cancelled) => !current.is_terminal(),
            _ => false,
        }
    }
}

text_enum!(WorkFormat {
    Remote => "remote",
    OnSite => "on-site",
    Hybrid => "hybrid",
});

text_enum!(CompensationType {
    Fixed => "fixed",
    Hourly => "hourly",
    Daily => "daily",
    Project => "project",
    Commission => "commission",
    Equity => "equity",
    Negotiable => "negotiable",
    Unpaid => "unpaid",
});

text_enum!(ApplicationStatus {
    Pending => "pending",
    Reviewed => "reviewed",
    Shortlisted => "shortlisted",
    Interviewed => "interviewed",
    Accepted => "accepted",
    Rejected => "rejected",
    Withdrawn => "withdrawn",
});

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// Transitions available to the job owner while reviewing.
    pub fn can_review_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, next) {
            (Pending, Reviewed) | (Reviewed, Shortlisted) | (Shortlisted, Interviewed) => true,
            (Interviewed, Accepted) | (Shortlisted, Accepted) => true,
            (current, Rejected) => !current.is_terminal(),
            _ => false,
        }
    }
}

text_enum!(BidStatus {
    Pending => "pending",
    Accepted => "accepted",
    Rejected => "rejected",
    Withdrawn => "withdrawn",
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobLocation {
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationAmount {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    #[serde(rename = "type")]
    pub kind: CompensationType,
    #[serde(default)]
    pub amount: CompensationAmount,
    #[serde(default = "default_currency")]
    pub currency: String,
}

pub fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceRequirement {
    pub level: Option<String>,
    pub years: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillRequirements {
    pub required: Vec<String>,
    pub preferred: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRequirements {
    pub experience: ExperienceRequirement,
    pub skills: SkillRequirements,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobTimeline {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationProcess {
    pub deadline: Option<DateTime<Utc>>,
    pub max_applications: Option<u32>,
    pub custom_questions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bidding {
    pub enabled: bool,
    pub minimum_bid: Option<Decimal>,
    pub maximum_bid: Option<Decimal>,
    pub winning_bidder: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAnswer {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub applicant: Uuid,
    pub cover_letter: Option<String>,
    pub custom_answers: Vec<CustomAnswer>,
    pub portfolio_urls: Vec<String>,
    pub proposed_rate: Option<Decimal>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub bidder: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub proposal: String,
    pub timeline: Option<String>,
    pub status: BidStatus,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
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
    pub featured: bool,
    pub urgent: bool,
    pub views: i64,
    pub applications: Vec<Application>,
    pub bids: Vec<Bid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_owned_by(&self, user: Uuid) -> bool {
        self.posted_by == user
    }

    pub fn require_owner(&self, user: Uuid) -> Result<()> {
        if self.is_owned_by(user) {
            Ok(())
        } else {
            Err(Error::Forbidden(
                "Only the job owner can perform this action".into(),
            ))
        }
    }

    /// Applications that still count towards limits and uniqueness.
    pub fn application_count(&self) -> usize {
        self.applications
            .iter()
            .filter(|a| a.status != ApplicationStatus::Withdrawn)
            .count()
    }

    pub fn bid_count(&self) -> usize {
        self.bids
            .iter()
            .filter(|b| b.status != BidStatus::Withdrawn)
            .count()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.application_process.deadline
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.deadline().map(|d| d <= now).unwrap_or(false)
    }

    /// Whole days left before the deadline, rounded up. Negative once passed.
    pub fn days_until_deadline(&self, now: DateTime<Utc>) -> Option<i64> {
        self.deadline().map(|deadline| ceil_days(deadline - now))
    }

    pub fn effective_status(&self, now: DateTime<Utc>) -> JobStatus {
        if self.status == JobStatus::Published && self.deadline_passed(now) {
            JobStatus::Expired
        } else {
            self.status
        }
    }

    pub fn active_application_of(&self, user: Uuid) -> Option<&Application> {
        self.applications
            .iter()
            .find(|a| a.applicant == user && a.status != ApplicationStatus::Withdrawn)
    }

    pub fn active_bid_of(&self, user: Uuid) -> Option<&Bid> {
        self.bids
            .iter()
            .find(|b| b.bidder == user && b.status != BidStatus::Withdrawn)
    }

    /// Application gate. Checks run in a fixed order and the first failure wins.
    pub fn check_can_apply(&self, user: Uuid, now: DateTime<Utc>) -> Result<()> {
        if self.status != JobStatus::Published {
            return Err(Error::Conflict(
                "This job is not accepting applications".into(),
            ));
        }
        if self.deadline_passed(now) {
            return Err(Error::Conflict("The application deadline has passed".into()));
        }
        if let Some(limit) = self.application_process.max_applications {
            if self.application_count() >= limit as usize {
                return Err(Error::Conflict(
                    "This job has reached its application limit".into(),
                ));
            }
        }
        if self.active_application_of(user).is_some() {
            return Err(Error::Conflict(
                "You have already applied to this job".into(),
            ));
        }
        Ok(())
    }

    pub fn can_user_apply(&self, user: Uuid, now: DateTime<Utc>) -> bool {
        self.check_can_apply(user, now).is_ok()
    }

    /// Re-validates the gate and appends the application in one step, so the
    /// stores can run it under the same lock as the write.
    pub fn add_application(&mut self, application: Application, now: DateTime<Utc>) -> Result<()> {
        if self.is_owned_by(application.applicant) {
            return Err(Error::Conflict("You cannot apply to your own job".into()));
        }
        self.check_can_apply(application.applicant, now)?;
        self.applications.push(application);
        self.updated_at = now;
        Ok(())
    }

    pub fn withdraw_application(
        &mut self,
        application_id: Uuid,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let application = self
            .applications
            .iter_mut()
            .find(|a| a.id == application_id)
            .ok_or_else(|| Error::NotFound("Application not found".into()))?;
        if application.applicant != actor {
            return Err(Error::Forbidden(
                "Only the applicant can withdraw this application".into(),
            ));
        }
        if application.status.is_terminal() {
            return Err(Error::Conflict(format!(
                "Application is already {}",
                application.status
            )));
        }
        application.status = ApplicationStatus::Withdrawn;
        self.updated_at = now;
        Ok(())
    }

    pub fn review_application(
        &mut self,
        application_id: Uuid,
        actor: Uuid,
        next: ApplicationStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.require_owner(actor)?;
        let application = self
            .applications
            .iter_mut()
            .find(|a| a.id == application_id)
            .ok_or_else(|| Error::NotFound("Application not found".into()))?;
        if !application.status.can_review_to(next) {
            return Err(Error::Conflict(format!(
                "Cannot move application from {} to {}",
                application.status, next
            )));
        }
        application.status = next;
        application.reviewed_at = Some(now);
        if notes.is_some() {
            application.notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn check_can_bid(&self, bidder: Uuid, amount: Decimal, now: DateTime<Utc>) -> Result<()> {
        if !self.bidding.enabled {
            return Err(Error::Conflict("Bidding is not enabled for this job".into()));
        }
        if self.status != JobStatus::Published {
            return Err(Error::Conflict("This job is not accepting bids".into()));
        }
        if self.deadline_passed(now) {
            return Err(Error::Conflict("The bidding deadline has passed".into()));
        }
        if self.is_owned_by(bidder) {
            return Err(Error::Conflict("You cannot bid on your own job".into()));
        }
        if let Some(minimum) = self.bidding.minimum_bid {
            if amount < minimum {
                return Err(Error::Conflict(format!("Bid must be at least {}", minimum)));
            }
        }
        if let Some(maximum) = self.bidding.maximum_bid {
            if amount > maximum {
                return Err(Error::Conflict(format!("Bid must not exceed {}", maximum)));
            }
        }
        if self.active_bid_of(bidder).is_some() {
            return Err(Error::Conflict("You have already placed a bid on this job".into()));
        }
        Ok(())
    }

    pub fn add_bid(&mut self, bid: Bid, now: DateTime<Utc>) -> Result<()> {
        self.check_can_bid(bid.bidder, bid.amount, now)?;
        self.bids.push(bid);
        self.updated_at = now;
        Ok(())
    }

    pub fn withdraw_bid(&mut self, bid_id: Uuid, actor: Uuid, now: DateTime<Utc>) -> Result<()> {
        let bid = self
            .bids
            .iter_mut()
            .find(|b| b.id == bid_id)
            .ok_or_else(|| Error::NotFound("Bid not found".into()))?;
        if bid.bidder != actor {
            return Err(Error::Forbidden("Only the bidder can withdraw this bid".into()));
        }
        if bid.status != BidStatus::Pending {
            return Err(Error::Conflict(format!("Bid is already {}", bid.status)));
        }
        bid.status = BidStatus::Withdrawn;
        self.updated_at = now;
        Ok(())
    }

    /// Promotes one bid, rejects every other open bid and fills the job.
    /// Returns the accepted bid as it stands after the mutation.
    pub fn accept_bid(&mut self, bid_id: Uuid, actor: Uuid, now: DateTime<Utc>) -> Result<Bid> {
        self.require_owner(actor)?;
        let position = self
            .bids
            .iter()
            .position(|b| b.id == bid_id)
            .ok_or_else(|| Error::NotFound("Bid not found".into()))?;
        if self.bidding.winning_bidder.is_some()
            || self.bids.iter().any(|b| b.status == BidStatus::Accepted)
        {
            return Err(Error::Conflict("A bid has already been accepted for this job".into()));
        }
        if self.bids[position].status != BidStatus::Pending {
            return Err(Error::Conflict(format!(
                "Bid is already {}",
                self.bids[position].status
            )));
        }
        if self.status.is_terminal() {
            return Err(Error::Conflict(format!("Job is already {}", self.status)));
        }

        for (index, bid) in self.bids.iter_mut().enumerate() {
            if index == position {
                bid.status = BidStatus::Accepted;
            } else if bid.status == BidStatus::Pending {
                bid.status = BidStatus::Rejected;
            }
        }
        let accepted = self.bids[position].clone();
        self.bidding.winning_bidder = Some(accepted.bidder);
        self.status = JobStatus::Filled;
        self.updated_at = now;
        Ok(accepted)
    }

    pub fn transition_to(&mut self, next: JobStatus, actor: Uuid, now: DateTime<Utc>) -> Result<()> {
        self.require_owner(actor)?;
        if !self.status.can_transition_to(next) {
            return Err(Error::Conflict(format!(
                "Cannot move job from {} to {}",
                self.status, next
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Storage-level invariants, checked by the in-memory store before every
    /// write (the Postgres schema enforces them with unique indexes).
    pub fn check_invariants(&self) -> Result<()> {
        for (index, application) in self.applications.iter().enumerate() {
            if application.status == ApplicationStatus::Withdrawn {
                continue;
            }
            let duplicate = self.applications[index + 1..].iter().any(|other| {
                other.applicant == application.applicant
                    && other.status != ApplicationStatus::Withdrawn
            });
            if duplicate {
                return Err(Error::Conflict("Duplicate application".into()));
            }
        }
        for (index, bid) in self.bids.iter().enumerate() {
            if bid.status == BidStatus::Withdrawn {
                continue;
            }
            let duplicate = self.bids[index + 1..]
                .iter()
                .any(|other| other.bidder == bid.bidder && other.status != BidStatus::Withdrawn);
            if duplicate {
                return Err(Error::Conflict("Duplicate bid".into()));
            }
        }
        let accepted = self
            .bids
            .iter()
            .filter(|b| b.status == BidStatus::Accepted)
            .count();
        if accepted > 1 {
            return Err(Error::Conflict("More than one accepted bid".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub fn sample_job(owner: Uuid, now: DateTime<Utc>) -> Job {
        Job {
            id: Uuid::new_v4(),
            posted_by: owner,
            company: Some("Maison Lumen".into()),
            title: "Runway model for SS27 show".into(),
            description: "Two day runway booking".into(),
            category: "runway".into(),
            job_type: "freelance".into(),
            work_format: WorkFormat::OnSite,
            target_professional_types: vec!["model".into()],
            location: JobLocation {
                city: Some("Paris".into()),
                country: Some("France".into()),
            },
            compensation: Compensation {
                kind: CompensationType::Fixed,
                amount: CompensationAmount {
                    min: Some(Decimal::from(800)),
                    max: Some(Decimal::from(1200)),
                },
                currency: "EUR".into(),
            },
            requirements: JobRequirements::default(),
            timeline: JobTimeline::default(),
            application_process: ApplicationProcess::default(),
            bidding: Bidding::default(),
            status: JobStatus::Published,
            featured: false,
            urgent: false,
            views: 0,
            applications: Vec::new(),
            bids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn application_for(applicant: Uuid, now: DateTime<Utc>) -> Application {
        Application {
            id: Uuid::new_v4(),
            applicant,
            cover_letter: Some("I walked for three houses last season".into()),
            custom_answers: Vec::new(),
            portfolio_urls: Vec::new(),
            proposed_rate: None,
            status: ApplicationStatus::Pending,
            submitted_at: now,
            reviewed_at: None,
            notes: None,
        }
    }

    pub fn bid_from(bidder: Uuid, amount: i64, now: DateTime<Utc>) -> Bid {
        Bid {
            id: Uuid::new_v4(),
            bidder,
            amount: Decimal::from(amount),
            currency: "EUR".into(),
            proposal: "Full styling for the lookbook".into(),
            timeline: Some("2 weeks".into()),
            status: BidStatus::Pending,
            submitted_at: now,
        }
    }

    #[test]
    fn non_published_job_rejects_even_when_other_checks_pass() {
        let now = Utc::now();
        for status in [
            JobStatus::Draft,
            JobStatus::Paused,
            JobStatus::InReview,
            JobStatus::Filled,
            JobStatus::Cancelled,
        ] {
            let mut job = sample_job(Uuid::new_v4(), now);
            job.status = status;
            job.application_process.deadline = Some(now + Duration::days(30));
            job.application_process.max_applications = Some(100);
            let err = job.check_can_apply(Uuid::new_v4(), now).unwrap_err();
            assert!(err.to_string().contains("not accepting applications"));
            assert!(!job.can_user_apply(Uuid::new_v4(), now));
        }
    }

    #[test]
    fn gate_checks_deadline_then_limit_then_duplicate() {
        let now = Utc::now();
        let applicant = Uuid::new_v4();
        let mut job = sample_job(Uuid::new_v4(), now);
        job.application_process.max_applications = Some(1);
        job.applications.push(application_for(applicant, now));

        job.application_process.deadline = Some(now - Duration::hours(1));
        let err = job.check_can_apply(applicant, now).unwrap_err();
        assert!(err.to_string().contains("deadline"));

        job.application_process.deadline = Some(now + Duration::days(1));
        let err = job.check_can_apply(applicant, now).unwrap_err();
        assert!(err.to_string().contains("limit"));

        job.application_process.max_applications = None;
        let err = job.check_can_apply(applicant, now).unwrap_err();
        assert!(err.to_string().contains("already applied"));

        assert!(job.can_user_apply(Uuid::new_v4(), now));
    }

    #[test]
    fn duplicate_application_leaves_list_unchanged() {
        let now = Utc::now();
        let applicant = Uuid::new_v4();
        let mut job = sample_job(Uuid::new_v4(), now);
        job.add_application(application_for(applicant, now), now).unwrap();

        let err = job
            .add_application(application_for(applicant, now), now)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(job.applications.len(), 1);
    }

    #[test]
    fn withdrawn_application_allows_reapplying() {
        let now = Utc::now();
        let applicant = Uuid::new_v4();
        let mut job = sample_job(Uuid::new_v4(), now);
        let first = application_for(applicant, now);
        let first_id = first.id;
        job.add_application(first, now).unwrap();
        job.withdraw_application(first_id, applicant, now).unwrap();

        assert_eq!(job.application_count(), 0);
        job.add_application(application_for(applicant, now), now).unwrap();
        assert_eq!(job.application_count(), 1);
        job.check_invariants().unwrap();
    }

    #[test]
    fn accept_bid_rejects_siblings_and_fills_job() {
        let now = Utc::now();
        let owner = Uuid::new_v4();
        let mut job = sample_job(owner, now);
        job.bidding.enabled = true;
        let winner = bid_from(Uuid::new_v4(), 900, now);
        let winner_id = winner.id;
        job.add_bid(winner, now).unwrap();
        job.add_bid(bid_from(Uuid::new_v4(), 950, now), now).unwrap();
        let mut withdrawn = bid_from(Uuid::new_v4(), 700, now);
        withdrawn.status = BidStatus::Withdrawn;
        job.bids.push(withdrawn);

        let accepted = job.accept_bid(winner_id, owner, now).unwrap();

        assert_eq!(accepted.status, BidStatus::Accepted);
        assert_eq!(job.status, JobStatus::Filled);
        assert_eq!(job.bidding.winning_bidder, Some(accepted.bidder));
        let statuses: Vec<_> = job.bids.iter().map(|b| b.status).collect();
        assert_eq!(
            statuses,
            vec![BidStatus::Accepted, BidStatus::Rejected, BidStatus::Withdrawn]
        );
        job.check_invariants().unwrap();
    }

    #[test]
    fn accept_bid_checks_owner_before_bid_lookup() {
        let now = Utc::now();
        let mut job = sample_job(Uuid::new_v4(), now);
        job.bidding.enabled = true;

        let err = job.accept_bid(Uuid::new_v4(), Uuid::new_v4(), now).unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let err = job.accept_bid(Uuid::new_v4(), job.posted_by, now).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn second_acceptance_is_refused() {
        let now = Utc::now();
        let owner = Uuid::new_v4();
        let mut job = sample_job(owner, now);
        job.bidding.enabled = true;
        let first = bid_from(Uuid::new_v4(), 500, now);
        let second = bid_from(Uuid::new_v4(), 600, now);
        let (first_id, second_id) = (first.id, second.id);
        job.add_bid(first, now).unwrap();
        job.add_bid(second, now).unwrap();

        job.accept_bid(first_id, owner, now).unwrap();
        let err = job.accept_bid(second_id, owner, now).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert_eq!(
            job.bids.iter().filter(|b| b.status == BidStatus::Accepted).count(),
            1
        );
    }

    #[test]
    fn bid_gate_rules() {
        let now = Utc::now();
        let owner = Uuid::new_v4();
        let bidder = Uuid::new_v4();
        let mut job = sample_job(owner, now);

        assert!(job.check_can_bid(bidder, Decimal::from(100), now).is_err());
        job.bidding.enabled = true;
        job.bidding.minimum_bid = Some(Decimal::from(200));
        job.bidding.maximum_bid = Some(Decimal::from(2000));
        assert!(job.check_can_bid(bidder, Decimal::from(100), now).is_err());
        assert!(job.check_can_bid(bidder, Decimal::from(3000), now).is_err());
        assert!(job.check_can_bid(owner, Decimal::from(500), now).is_err());
        job.check_can_bid(bidder, Decimal::from(500), now).unwrap();

        job.application_process.deadline = Some(now - Duration::minutes(5));
        assert!(job.check_can_bid(bidder, Decimal::from(500), now).is_err());
    }

    #[test]
    fn deadline_is_derived_into_expired() {
        let now = Utc::now();
        let mut job = sample_job(Uuid::new_v4(), now);
        assert_eq!(job.effective_status(now), JobStatus::Published);
        job.application_process.deadline = Some(now - Duration::seconds(1));
        assert_eq!(job.effective_status(now), JobStatus::Expired);
        assert_eq!(job.status, JobStatus::Published);
    }

    #[test]
    fn days_until_deadline_rounds_up() {
        let now = Utc::now();
        let mut job = sample_job(Uuid::new_v4(), now);
        assert_eq!(job.days_until_deadline(now), None);
        job.application_process.deadline = Some(now + Duration::hours(30));
        assert_eq!(job.days_until_deadline(now), Some(2));
        job.application_process.deadline = Some(now + Duration::days(3));
        assert_eq!(job.days_until_deadline(now), Some(3));
        job.application_process.deadline = Some(now);
        assert_eq!(job.days_until_deadline(now), Some(0));
    }

    #[test]
    fn terminal_statuses_cannot_be_left() {
        let now = Utc::now();
        let owner = Uuid::new_v4();
        let mut job = sample_job(owner, now);
        job.transition_to(JobStatus::Cancelled, owner, now).unwrap();
        assert!(job.transition_to(JobStatus::Published, owner, now).is_err());
        assert!(job.transition_to(JobStatus::Cancelled, owner, now).is_err());
        assert!(!JobStatus::Published.can_transition_to(JobStatus::Expired));
    }
}
