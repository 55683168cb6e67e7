use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::database::filter::{JobFilter, JobSort, Page};
use crate::database::{JobStore, ProfileStore};
use crate::dto::job_dto::{
    ApplyPayload, BidPayload, CreateJobPayload, JobBrowseQuery, JobBrowseResponse, JobResponse,
    MyApplicationItem, UpdateJobPayload,
};
use crate::error::{Error, Result};
use crate::models::contract::Contract;
use crate::models::job::{Application, ApplicationStatus, Bid, Job, JobStatus};
use crate::models::profile::CandidateProfile;
use crate::services::matching_service::match_score;
use crate::utils::time::now;

/// Open jobs considered when building recommendations, newest first.
const RECOMMENDATION_POOL: i64 = 500;

#[derive(Clone)]
pub struct JobService {
    jobs: Arc<dyn JobStore>,
    profiles: Arc<dyn ProfileStore>,
    recommendation_limit: usize,
}

fn application_in(job: Job, application_id: Uuid) -> Result<Application> {
    job.applications
        .into_iter()
        .find(|a| a.id == application_id)
        .ok_or_else(|| Error::NotFound("Application not found".into()))
}

fn bid_in(job: Job, bid_id: Uuid) -> Result<Bid> {
    job.bids
        .into_iter()
        .find(|b| b.id == bid_id)
        .ok_or_else(|| Error::NotFound("Bid not found".into()))
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        profiles: Arc<dyn ProfileStore>,
        recommendation_limit: usize,
    ) -> Self {
        Self {
            jobs,
            profiles,
            recommendation_limit,
        }
    }

    async fn load(&self, id: Uuid) -> Result<Job> {
        self.jobs
            .find_job(id)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".into()))
    }

    async fn profile_of(&self, viewer: Option<Uuid>) -> Result<Option<CandidateProfile>> {
        match viewer {
            Some(user) => self.profiles.find_profile(user).await,
            None => Ok(None),
        }
    }

    #[instrument(skip(self, payload))]
    pub async fn create(&self, owner: Uuid, payload: CreateJobPayload) -> Result<Job> {
        let job = payload.into_job(owner, now())?;
        self.jobs.insert_job(&job).await?;
        info!(job_id = %job.id, user_id = %owner, status = %job.status, "Job created");
        Ok(job)
    }

    #[instrument(skip(self, payload))]
    pub async fn update(&self, id: Uuid, actor: Uuid, payload: UpdateJobPayload) -> Result<Job> {
        let job = self
            .jobs
            .update_job_with(
                id,
                Box::new(move |job: &mut Job| {
                    job.require_owner(actor)?;
                    payload.apply(job, now())
                }),
            )
            .await?;
        info!(job_id = %id, user_id = %actor, "Job updated");
        Ok(job)
    }

    #[instrument(skip(self))]
    pub async fn change_status(&self, id: Uuid, actor: Uuid, next: JobStatus) -> Result<Job> {
        let job = self
            .jobs
            .update_job_with(
                id,
                Box::new(move |job: &mut Job| job.transition_to(next, actor, now())),
            )
            .await?;
        info!(job_id = %id, user_id = %actor, status = %next, "Job status changed");
        Ok(job)
    }

    /// Job detail for one viewer. Counts a view unless the owner is looking.
    /// Drafts are invisible to anyone but their owner.
    pub async fn get_for_viewer(&self, id: Uuid, viewer: Option<Uuid>) -> Result<JobResponse> {
        let mut job = self.load(id).await?;
        let is_owner = viewer.map(|v| job.is_owned_by(v)).unwrap_or(false);
        if job.status == JobStatus::Draft && !is_owner {
            return Err(Error::NotFound("Job not found".into()));
        }
        if !is_owner {
            self.jobs.record_view(id).await?;
            job.views += 1;
        }
        let profile = self.profile_of(viewer).await?;
        Ok(JobResponse::for_viewer(job, viewer, profile.as_ref(), now()))
    }

    pub async fn browse(
        &self,
        query: JobBrowseQuery,
        viewer: Option<Uuid>,
    ) -> Result<JobBrowseResponse> {
        let current = now();
        let (filter, page) = query.into_parts();
        let result = self.jobs.search_jobs(&filter, &page, current).await?;
        let categories = self.jobs.category_breakdown(&filter, current).await?;
        let profile = self.profile_of(viewer).await?;

        let mut items: Vec<JobResponse> = result
            .items
            .into_iter()
            .map(|job| JobResponse::for_viewer(job, viewer, profile.as_ref(), current))
            .collect();
        if page.sort == JobSort::Relevance && profile.is_some() {
            // Re-rank within the fetched page only; `sort_by` is stable.
            items.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        }

        let total_pages = (result.total + page.per_page - 1) / page.per_page;
        Ok(JobBrowseResponse {
            items,
            total: result.total,
            page: page.page,
            per_page: page.per_page,
            total_pages,
            categories,
        })
    }

    #[instrument(skip(self, payload))]
    pub async fn apply(
        &self,
        job_id: Uuid,
        applicant: Uuid,
        payload: ApplyPayload,
    ) -> Result<Application> {
        let application = payload.into_application(applicant, now())?;
        let application_id = application.id;
        let job = self
            .jobs
            .update_job_with(
                job_id,
                Box::new(move |job: &mut Job| job.add_application(application, now())),
            )
            .await?;
        info!(job_id = %job_id, user_id = %applicant, application_id = %application_id, "Application submitted");
        application_in(job, application_id)
    }

    #[instrument(skip(self))]
    pub async fn withdraw_application(
        &self,
        job_id: Uuid,
        application_id: Uuid,
        actor: Uuid,
    ) -> Result<Application> {
        let job = self
            .jobs
            .update_job_with(
                job_id,
                Box::new(move |job: &mut Job| {
                    job.withdraw_application(application_id, actor, now())
                }),
            )
            .await?;
        info!(job_id = %job_id, user_id = %actor, application_id = %application_id, "Application withdrawn");
        application_in(job, application_id)
    }

    #[instrument(skip(self, notes))]
    pub async fn review_application(
        &self,
        job_id: Uuid,
        application_id: Uuid,
        actor: Uuid,
        next: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application> {
        let job = self
            .jobs
            .update_job_with(
                job_id,
                Box::new(move |job: &mut Job| {
                    job.review_application(application_id, actor, next, notes, now())
                }),
            )
            .await?;
        info!(job_id = %job_id, application_id = %application_id, status = %next, "Application reviewed");
        application_in(job, application_id)
    }

    pub async fn list_applications(&self, job_id: Uuid, actor: Uuid) -> Result<Vec<Application>> {
        let job = self.load(job_id).await?;
        job.require_owner(actor)?;
        Ok(job.applications)
    }

    #[instrument(skip(self, payload))]
    pub async fn bid(&self, job_id: Uuid, bidder: Uuid, payload: BidPayload) -> Result<Bid> {
        let bid_id = Uuid::new_v4();
        let job = self
            .jobs
            .update_job_with(
                job_id,
                Box::new(move |job: &mut Job| {
                    let current = now();
                    let mut bid = payload.into_bid(bidder, &job.compensation.currency, current)?;
                    bid.id = bid_id;
                    job.add_bid(bid, current)
                }),
            )
            .await?;
        info!(job_id = %job_id, user_id = %bidder, bid_id = %bid_id, "Bid submitted");
        bid_in(job, bid_id)
    }

    #[instrument(skip(self))]
    pub async fn withdraw_bid(&self, job_id: Uuid, bid_id: Uuid, actor: Uuid) -> Result<Bid> {
        let job = self
            .jobs
            .update_job_with(
                job_id,
                Box::new(move |job: &mut Job| job.withdraw_bid(bid_id, actor, now())),
            )
            .await?;
        info!(job_id = %job_id, user_id = %actor, bid_id = %bid_id, "Bid withdrawn");
        bid_in(job, bid_id)
    }

    /// Accepts the bid and opens its contract atomically.
    #[instrument(skip(self))]
    pub async fn accept_bid(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        actor: Uuid,
    ) -> Result<(Job, Contract)> {
        let (job, contract) = self.jobs.accept_bid(job_id, bid_id, actor, now()).await?;
        info!(
            job_id = %job_id,
            bid_id = %bid_id,
            contract_id = %contract.id,
            contract_number = %contract.contract_number,
            "Bid accepted, contract created"
        );
        Ok((job, contract))
    }

    /// Best-matching open jobs the user has not applied to, restricted to
    /// postings that target the user's professional type.
    pub async fn recommendations(&self, user: Uuid) -> Result<Vec<JobResponse>> {
        let profile = self
            .profiles
            .find_profile(user)
            .await?
            .ok_or_else(|| Error::NotFound("Profile not found".into()))?;
        let professional_type = profile.professional_type.clone().ok_or_else(|| {
            Error::BadRequest("Set a professional type on your profile first".into())
        })?;

        let current = now();
        let filter = JobFilter {
            professional_type: Some(professional_type),
            ..JobFilter::default()
        };
        let page = Page {
            page: 1,
            per_page: RECOMMENDATION_POOL,
            sort: JobSort::Newest,
        };
        let candidates = self.jobs.search_jobs(&filter, &page, current).await?;

        let mut scored: Vec<(u8, Job)> = candidates
            .items
            .into_iter()
            .filter(|job| !job.is_owned_by(user) && job.active_application_of(user).is_none())
            .map(|job| (match_score(&job, &profile), job))
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(self.recommendation_limit)
            .map(|(_, job)| JobResponse::for_viewer(job, Some(user), Some(&profile), current))
            .collect())
    }

    pub async fn my_applications(&self, user: Uuid) -> Result<Vec<MyApplicationItem>> {
        let jobs = self.jobs.jobs_applied_to_by(user).await?;
        let current = now();
        Ok(jobs
            .into_iter()
            .filter_map(|job| {
                let application = job.active_application_of(user)?.clone();
                Some(MyApplicationItem {
                    job_id: job.id,
                    job_status: job.effective_status(current),
                    job_title: job.title,
                    company: job.company,
                    application,
                })
            })
            .collect())
    }

    pub async fn my_postings(&self, user: Uuid) -> Result<Vec<JobResponse>> {
        let jobs = self.jobs.jobs_posted_by(user).await?;
        let current = now();
        Ok(jobs
            .into_iter()
            .map(|job| JobResponse::for_viewer(job, Some(user), None, current))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::job::tests::sample_job;

    fn service() -> (JobService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (JobService::new(store.clone(), store.clone(), 10), store)
    }

    fn profile(user: Uuid) -> CandidateProfile {
        CandidateProfile {
            user_id: user,
            professional_type: Some("model".into()),
            location: Some("Paris, France".into()),
            experience_level: Some("mid".into()),
            skills: vec!["runway".into()],
            updated_at: now(),
        }
    }

    #[tokio::test]
    async fn recommendations_skip_applied_and_foreign_types() {
        let (service, store) = service();
        let user = Uuid::new_v4();
        store.upsert_profile(&profile(user)).await.unwrap();

        let current = now();
        let open = sample_job(Uuid::new_v4(), current);
        let mut applied = sample_job(Uuid::new_v4(), current);
        applied
            .applications
            .push(crate::models::job::tests::application_for(user, current));
        let mut stylist_only = sample_job(Uuid::new_v4(), current);
        stylist_only.target_professional_types = vec!["stylist".into()];
        for job in [&open, &applied, &stylist_only] {
            store.insert_job(job).await.unwrap();
        }

        let items = service.recommendations(user).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, open.id);
        assert_eq!(items[0].match_score, Some(100));
    }

    #[tokio::test]
    async fn drafts_are_hidden_from_visitors_and_views_count() {
        let (service, store) = service();
        let owner = Uuid::new_v4();
        let current = now();
        let mut draft = sample_job(owner, current);
        draft.status = JobStatus::Draft;
        let published = sample_job(owner, current);
        store.insert_job(&draft).await.unwrap();
        store.insert_job(&published).await.unwrap();

        let err = service.get_for_viewer(draft.id, None).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(service.get_for_viewer(draft.id, Some(owner)).await.is_ok());

        let seen = service.get_for_viewer(published.id, None).await.unwrap();
        assert_eq!(seen.views, 1);
        service.get_for_viewer(published.id, Some(owner)).await.unwrap();
        assert_eq!(store.find_job(published.id).await.unwrap().unwrap().views, 1);
    }

    #[tokio::test]
    async fn relevance_reranks_page_by_match_score() {
        let (service, store) = service();
        let viewer = Uuid::new_v4();
        store.upsert_profile(&profile(viewer)).await.unwrap();

        let current = now();
        let mut featured_mismatch = sample_job(Uuid::new_v4(), current);
        featured_mismatch.featured = true;
        featured_mismatch.target_professional_types = vec!["photographer".into()];
        let good_fit = sample_job(Uuid::new_v4(), current);
        store.insert_job(&featured_mismatch).await.unwrap();
        store.insert_job(&good_fit).await.unwrap();

        let anonymous = service.browse(JobBrowseQuery::default(), None).await.unwrap();
        assert_eq!(anonymous.items[0].id, featured_mismatch.id);

        let personal = service
            .browse(JobBrowseQuery::default(), Some(viewer))
            .await
            .unwrap();
        assert_eq!(personal.items[0].id, good_fit.id);
        assert_eq!(personal.total, 2);
        assert_eq!(personal.total_pages, 1);
    }
}
