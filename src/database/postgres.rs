use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::filter::{CategoryCount, JobFilter, JobPage, Page};
use crate::database::store::{
    ContractMutation, ContractStore, JobMutation, JobStore, ProfileStore,
};
use crate::error::{Error, Result};
use crate::models::contract::Contract;
use crate::models::job::{
    Application, ApplicationProcess, ApplicationStatus, Bid, BidStatus, Bidding, Compensation,
    CompensationAmount, CustomAnswer, ExperienceRequirement, Job, JobLocation, JobRequirements,
    JobTimeline, SkillRequirements,
};
use crate::models::profile::CandidateProfile;

const JOB_COLUMNS: &str = "id, posted_by, company, title, description, category, job_type, \
    work_format, target_professional_types, city, country, compensation_type, \
    compensation_min, compensation_max, currency, experience_level, experience_years, \
    required_skills, preferred_skills, start_date, end_date, duration, deadline, \
    max_applications, custom_questions, bidding_enabled, minimum_bid, maximum_bid, \
    winning_bidder, status, featured, urgent, views, created_at, updated_at";

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_id, cover_letter, custom_answers, \
    portfolio_urls, proposed_rate, status, submitted_at, reviewed_at, notes";

const BID_COLUMNS: &str =
    "id, job_id, bidder_id, amount, currency, proposal, timeline, status, submitted_at";

#[derive(Debug, FromRow)]
struct JobRow {
    id: Uuid,
    posted_by: Uuid,
    company: Option<String>,
    title: String,
    description: String,
    category: String,
    job_type: String,
    work_format: String,
    target_professional_types: Vec<String>,
    city: Option<String>,
    country: Option<String>,
    compensation_type: String,
    compensation_min: Option<Decimal>,
    compensation_max: Option<Decimal>,
    currency: String,
    experience_level: Option<String>,
    experience_years: Option<i32>,
    required_skills: Vec<String>,
    preferred_skills: Vec<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    duration: Option<String>,
    deadline: Option<DateTime<Utc>>,
    max_applications: Option<i32>,
    custom_questions: Vec<String>,
    bidding_enabled: bool,
    minimum_bid: Option<Decimal>,
    maximum_bid: Option<Decimal>,
    winning_bidder: Option<Uuid>,
    status: String,
    featured: bool,
    urgent: bool,
    views: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    applicant_id: Uuid,
    cover_letter: Option<String>,
    custom_answers: Json<Vec<CustomAnswer>>,
    portfolio_urls: Vec<String>,
    proposed_rate: Option<Decimal>,
    status: String,
    submitted_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct BidRow {
    id: Uuid,
    job_id: Uuid,
    bidder_id: Uuid,
    amount: Decimal,
    currency: String,
    proposal: String,
    timeline: Option<String>,
    status: String,
    submitted_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = Error;

    fn try_from(row: ApplicationRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            applicant: row.applicant_id,
            cover_letter: row.cover_letter,
            custom_answers: row.custom_answers.0,
            portfolio_urls: row.portfolio_urls,
            proposed_rate: row.proposed_rate,
            status: row.status.parse()?,
            submitted_at: row.submitted_at,
            reviewed_at: row.reviewed_at,
            notes: row.notes,
        })
    }
}

impl TryFrom<BidRow> for Bid {
    type Error = Error;

    fn try_from(row: BidRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            bidder: row.bidder_id,
            amount: row.amount,
            currency: row.currency,
            proposal: row.proposal,
            timeline: row.timeline,
            status: row.status.parse()?,
            submitted_at: row.submitted_at,
        })
    }
}

impl JobRow {
    fn into_job(self, applications: Vec<Application>, bids: Vec<Bid>) -> Result<Job> {
        Ok(Job {
            id: self.id,
            posted_by: self.posted_by,
            company: self.company,
            title: self.title,
            description: self.description,
            category: self.category,
            job_type: self.job_type,
            work_format: self.work_format.parse()?,
            target_professional_types: self.target_professional_types,
            location: JobLocation {
                city: self.city,
                country: self.country,
            },
            compensation: Compensation {
                kind: self.compensation_type.parse()?,
                amount: CompensationAmount {
                    min: self.compensation_min,
                    max: self.compensation_max,
                },
                currency: self.currency,
            },
            requirements: JobRequirements {
                experience: ExperienceRequirement {
                    level: self.experience_level,
                    years: self.experience_years,
                },
                skills: SkillRequirements {
                    required: self.required_skills,
                    preferred: self.preferred_skills,
                },
            },
            timeline: JobTimeline {
                start_date: self.start_date,
                end_date: self.end_date,
                duration: self.duration,
            },
            application_process: ApplicationProcess {
                deadline: self.deadline,
                max_applications: self
                    .max_applications
                    .map(u32::try_from)
                    .transpose()
                    .map_err(|_| Error::Internal(format!("Job {} has a negative application cap", self.id)))?,
                custom_questions: self.custom_questions,
            },
            bidding: Bidding {
                enabled: self.bidding_enabled,
                minimum_bid: self.minimum_bid,
                maximum_bid: self.maximum_bid,
                winning_bidder: self.winning_bidder,
            },
            status: self.status.parse()?,
            featured: self.featured,
            urgent: self.urgent,
            views: self.views,
            applications,
            bids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn job_not_found() -> Error {
    Error::NotFound("Job not found".into())
}

fn contract_not_found() -> Error {
    Error::NotFound("Contract not found".into())
}

/// Attaches applications and bids to a batch of job rows, keeping row order.
async fn hydrate(conn: &mut PgConnection, rows: Vec<JobRow>) -> Result<Vec<Job>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

    let application_rows = sqlx::query_as::<_, ApplicationRow>(&format!(
        "SELECT {} FROM job_applications WHERE job_id = ANY($1) ORDER BY submitted_at, id",
        APPLICATION_COLUMNS
    ))
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;
    let bid_rows = sqlx::query_as::<_, BidRow>(&format!(
        "SELECT {} FROM job_bids WHERE job_id = ANY($1) ORDER BY submitted_at, id",
        BID_COLUMNS
    ))
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut applications: HashMap<Uuid, Vec<Application>> = HashMap::new();
    for row in application_rows {
        let job_id = row.job_id;
        applications.entry(job_id).or_default().push(row.try_into()?);
    }
    let mut bids: HashMap<Uuid, Vec<Bid>> = HashMap::new();
    for row in bid_rows {
        let job_id = row.job_id;
        bids.entry(job_id).or_default().push(row.try_into()?);
    }

    rows.into_iter()
        .map(|row| {
            let job_applications = applications.remove(&row.id).unwrap_or_default();
            let job_bids = bids.remove(&row.id).unwrap_or_default();
            row.into_job(job_applications, job_bids)
        })
        .collect()
}

async fn load_job(conn: &mut PgConnection, id: Uuid, for_update: bool) -> Result<Option<Job>> {
    let mut sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
    if for_update {
        sql.push_str(" FOR UPDATE");
    }
    let row = sqlx::query_as::<_, JobRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    match row {
        Some(row) => Ok(hydrate(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Writes the job row and upserts every application and bid it owns.
async fn save_job(conn: &mut PgConnection, job: &Job) -> Result<()> {
    let max_applications = job
        .application_process
        .max_applications
        .map(i32::try_from)
        .transpose()
        .map_err(|_| Error::BadRequest("max_applications is too large".into()))?;
    sqlx::query(
        r#"
        INSERT INTO jobs (
            id, posted_by, company, title, description, category, job_type,
            work_format, target_professional_types, city, country, compensation_type,
            compensation_min, compensation_max, currency, experience_level, experience_years,
            required_skills, preferred_skills, start_date, end_date, duration, deadline,
            max_applications, custom_questions, bidding_enabled, minimum_bid, maximum_bid,
            winning_bidder, status, featured, urgent, views, created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7,
            $8, $9, $10, $11, $12,
            $13, $14, $15, $16, $17,
            $18, $19, $20, $21, $22, $23,
            $24, $25, $26, $27, $28,
            $29, $30, $31, $32, $33, $34, $35
        )
        ON CONFLICT (id) DO UPDATE SET
            company = EXCLUDED.company,
            title = EXCLUDED.title,
            description = EXCLUDED.description,
            category = EXCLUDED.category,
            job_type = EXCLUDED.job_type,
            work_format = EXCLUDED.work_format,
            target_professional_types = EXCLUDED.target_professional_types,
            city = EXCLUDED.city,
            country = EXCLUDED.country,
            compensation_type = EXCLUDED.compensation_type,
            compensation_min = EXCLUDED.compensation_min,
            compensation_max = EXCLUDED.compensation_max,
            currency = EXCLUDED.currency,
            experience_level = EXCLUDED.experience_level,
            experience_years = EXCLUDED.experience_years,
            required_skills = EXCLUDED.required_skills,
            preferred_skills = EXCLUDED.preferred_skills,
            start_date = EXCLUDED.start_date,
            end_date = EXCLUDED.end_date,
            duration = EXCLUDED.duration,
            deadline = EXCLUDED.deadline,
            max_applications = EXCLUDED.max_applications,
            custom_questions = EXCLUDED.custom_questions,
            bidding_enabled = EXCLUDED.bidding_enabled,
            minimum_bid = EXCLUDED.minimum_bid,
            maximum_bid = EXCLUDED.maximum_bid,
            winning_bidder = EXCLUDED.winning_bidder,
            status = EXCLUDED.status,
            featured = EXCLUDED.featured,
            urgent = EXCLUDED.urgent,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(job.id)
    .bind(job.posted_by)
    .bind(&job.company)
    .bind(&job.title)
    .bind(&job.description)
    .bind(&job.category)
    .bind(&job.job_type)
    .bind(job.work_format.as_str())
    .bind(&job.target_professional_types)
    .bind(&job.location.city)
    .bind(&job.location.country)
    .bind(job.compensation.kind.as_str())
    .bind(job.compensation.amount.min)
    .bind(job.compensation.amount.max)
    .bind(&job.compensation.currency)
    .bind(&job.requirements.experience.level)
    .bind(job.requirements.experience.years)
    .bind(&job.requirements.skills.required)
    .bind(&job.requirements.skills.preferred)
    .bind(job.timeline.start_date)
    .bind(job.timeline.end_date)
    .bind(&job.timeline.duration)
    .bind(job.application_process.deadline)
    .bind(max_applications)
    .bind(&job.application_process.custom_questions)
    .bind(job.bidding.enabled)
    .bind(job.bidding.minimum_bid)
    .bind(job.bidding.maximum_bid)
    .bind(job.bidding.winning_bidder)
    .bind(job.status.as_str())
    .bind(job.featured)
    .bind(job.urgent)
    .bind(job.views)
    .bind(job.created_at)
    .bind(job.updated_at)
    .execute(&mut *conn)
    .await?;

    // Withdrawals first, so a fresh row for the same user never collides with
    // the partial unique index while the old one is still active.
    let mut applications: Vec<&Application> = job.applications.iter().collect();
    applications.sort_by_key(|a| a.status != ApplicationStatus::Withdrawn);
    for application in applications {
        sqlx::query(
            r#"
            INSERT INTO job_applications (
                id, job_id, applicant_id, cover_letter, custom_answers, portfolio_urls,
                proposed_rate, status, submitted_at, reviewed_at, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                reviewed_at = EXCLUDED.reviewed_at,
                notes = EXCLUDED.notes
            "#,
        )
        .bind(application.id)
        .bind(job.id)
        .bind(application.applicant)
        .bind(&application.cover_letter)
        .bind(Json(&application.custom_answers))
        .bind(&application.portfolio_urls)
        .bind(application.proposed_rate)
        .bind(application.status.as_str())
        .bind(application.submitted_at)
        .bind(application.reviewed_at)
        .bind(&application.notes)
        .execute(&mut *conn)
        .await?;
    }

    let mut bids: Vec<&Bid> = job.bids.iter().collect();
    bids.sort_by_key(|b| b.status != BidStatus::Withdrawn);
    for bid in bids {
        sqlx::query(
            r#"
            INSERT INTO job_bids (
                id, job_id, bidder_id, amount, currency, proposal, timeline, status, submitted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status
            "#,
        )
        .bind(bid.id)
        .bind(job.id)
        .bind(bid.bidder)
        .bind(bid.amount)
        .bind(&bid.currency)
        .bind(&bid.proposal)
        .bind(&bid.timeline)
        .bind(bid.status.as_str())
        .bind(bid.submitted_at)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_contract_row(conn: &mut PgConnection, contract: &Contract) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO contracts (
            id, contract_number, job_id, bid_id, client_id, professional_id,
            title, status, document, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(contract.id)
    .bind(&contract.contract_number)
    .bind(contract.job)
    .bind(contract.bid)
    .bind(contract.client)
    .bind(contract.professional)
    .bind(&contract.title)
    .bind(contract.status.as_str())
    .bind(Json(contract))
    .bind(contract.created_at)
    .bind(contract.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl JobStore for PgStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        save_job(&mut tx, job).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        let mut conn = self.pool.acquire().await?;
        load_job(&mut conn, id, false).await
    }

    async fn update_job_with(&self, id: Uuid, mutation: JobMutation) -> Result<Job> {
        let mut tx = self.pool.begin().await?;
        let mut job = load_job(&mut tx, id, true).await?.ok_or_else(job_not_found)?;
        mutation(&mut job)?;
        save_job(&mut tx, &job).await?;
        tx.commit().await?;
        Ok(job)
    }

    async fn record_view(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE jobs SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(job_not_found());
        }
        Ok(())
    }

    async fn search_jobs(
        &self,
        filter: &JobFilter,
        page: &Page,
        now: DateTime<Utc>,
    ) -> Result<JobPage> {
        let mut conn = self.pool.acquire().await?;

        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM jobs WHERE ");
        filter.push_conditions(&mut count, now);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *conn)
            .await?;

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM jobs WHERE ", JOB_COLUMNS));
        filter.push_conditions(&mut query, now);
        query
            .push(" ORDER BY ")
            .push(page.sort.order_by())
            .push(" LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = query
            .build_query_as::<JobRow>()
            .fetch_all(&mut *conn)
            .await?;

        let items = hydrate(&mut conn, rows).await?;
        Ok(JobPage { items, total })
    }

    async fn category_breakdown(
        &self,
        filter: &JobFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<CategoryCount>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT category, COUNT(*) AS count FROM jobs WHERE ");
        filter.push_conditions(&mut query, now);
        query.push(" GROUP BY category ORDER BY count DESC, category ASC");
        let counts = query
            .build_query_as::<CategoryCount>()
            .fetch_all(&self.pool)
            .await?;
        Ok(counts)
    }

    async fn jobs_posted_by(&self, user: Uuid) -> Result<Vec<Job>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE posted_by = $1 ORDER BY created_at DESC",
            JOB_COLUMNS
        ))
        .bind(user)
        .fetch_all(&mut *conn)
        .await?;
        hydrate(&mut conn, rows).await
    }

    async fn jobs_applied_to_by(&self, user: Uuid) -> Result<Vec<Job>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r#"
            SELECT {} FROM jobs
            WHERE id IN (
                SELECT job_id FROM job_applications
                WHERE applicant_id = $1 AND status <> 'withdrawn'
            )
            ORDER BY created_at DESC
            "#,
            JOB_COLUMNS
        ))
        .bind(user)
        .fetch_all(&mut *conn)
        .await?;
        hydrate(&mut conn, rows).await
    }

    async fn accept_bid(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Job, Contract)> {
        let mut tx = self.pool.begin().await?;
        let mut job = load_job(&mut tx, job_id, true)
            .await?
            .ok_or_else(job_not_found)?;
        let bid = job.accept_bid(bid_id, actor, now)?;
        let contract = Contract::from_accepted_bid(&job, &bid, now);
        save_job(&mut tx, &job).await?;
        insert_contract_row(&mut tx, &contract).await?;
        tx.commit().await?;
        Ok((job, contract))
    }
}

#[async_trait]
impl ContractStore for PgStore {
    async fn insert_contract(&self, contract: &Contract) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        insert_contract_row(&mut conn, contract).await
    }

    async fn find_contract(&self, id: Uuid) -> Result<Option<Contract>> {
        let document = sqlx::query_scalar::<_, Json<Contract>>(
            "SELECT document FROM contracts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(document.map(|doc| doc.0))
    }

    async fn contracts_for(&self, user: Uuid) -> Result<Vec<Contract>> {
        let documents = sqlx::query_scalar::<_, Json<Contract>>(
            r#"
            SELECT document FROM contracts
            WHERE client_id = $1 OR professional_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(documents.into_iter().map(|doc| doc.0).collect())
    }

    async fn update_contract_with(&self, id: Uuid, mutation: ContractMutation) -> Result<Contract> {
        let mut tx = self.pool.begin().await?;
        let Json(mut contract) = sqlx::query_scalar::<_, Json<Contract>>(
            "SELECT document FROM contracts WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(contract_not_found)?;

        mutation(&mut contract)?;

        sqlx::query(
            r#"
            UPDATE contracts
            SET title = $2, status = $3, document = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(contract.id)
        .bind(&contract.title)
        .bind(contract.status.as_str())
        .bind(Json(&contract))
        .bind(contract.updated_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(contract)
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn find_profile(&self, user: Uuid) -> Result<Option<CandidateProfile>> {
        let profile = sqlx::query_as::<_, CandidateProfile>(
            r#"
            SELECT user_id, professional_type, location, experience_level, skills, updated_at
            FROM profiles WHERE user_id = $1
            "#,
        )
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn upsert_profile(&self, profile: &CandidateProfile) -> Result<CandidateProfile> {
        let saved = sqlx::query_as::<_, CandidateProfile>(
            r#"
            INSERT INTO profiles (user_id, professional_type, location, experience_level, skills, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                professional_type = EXCLUDED.professional_type,
                location = EXCLUDED.location,
                experience_level = EXCLUDED.experience_level,
                skills = EXCLUDED.skills,
                updated_at = EXCLUDED.updated_at
            RETURNING user_id, professional_type, location, experience_level, skills, updated_at
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.professional_type)
        .bind(&profile.location)
        .bind(&profile.experience_level)
        .bind(&profile.skills)
        .bind(profile.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }
}
