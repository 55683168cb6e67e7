use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::models::job::{CompensationType, Job, JobStatus, WorkFormat};

text_enum!(JobSort {
    Relevance => "relevance",
    Newest => "newest",
    Deadline => "deadline",
    SalaryHigh => "salary_high",
    SalaryLow => "salary_low",
    Popular => "popular",
});

impl Default for JobSort {
    fn default() -> Self {
        JobSort::Relevance
    }
}

/// Conjunctive browse predicate. Every populated field narrows the result;
/// the published/open-deadline restriction always applies.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
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
    pub skills: Vec<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
    pub sort: JobSort,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

#[derive(Debug, Clone)]
pub struct JobPage {
    pub items: Vec<Job>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

/// Substring pattern for `ILIKE ... ESCAPE '\'` with the wildcard characters
/// of the user input matched literally.
fn like_pattern(raw: &str) -> String {
    let mut pattern = String::with_capacity(raw.len() + 2);
    pattern.push('%');
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Upper end of the advertised range, used for "at least" bounds and sorting.
fn salary_ceiling(job: &Job) -> Option<Decimal> {
    job.compensation.amount.max.or(job.compensation.amount.min)
}

fn salary_floor(job: &Job) -> Option<Decimal> {
    job.compensation.amount.min.or(job.compensation.amount.max)
}

impl JobFilter {
    pub fn matches(&self, job: &Job, now: DateTime<Utc>) -> bool {
        if job.status != JobStatus::Published || job.deadline_passed(now) {
            return false;
        }
        if let Some(category) = &self.category {
            if &job.category != category {
                return false;
            }
        }
        if let Some(job_type) = &self.job_type {
            if &job.job_type != job_type {
                return false;
            }
        }
        if let Some(format) = self.work_format {
            if job.work_format != format {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !contains_ci(job.location.city.as_deref(), location)
                && !contains_ci(job.location.country.as_deref(), location)
            {
                return false;
            }
        }
        if let Some(kind) = self.compensation_type {
            if job.compensation.kind != kind {
                return false;
            }
        }
        if let Some(level) = &self.experience_level {
            if job.requirements.experience.level.as_deref() != Some(level.as_str()) {
                return false;
            }
        }
        if let Some(kind) = &self.professional_type {
            if !job.target_professional_types.iter().any(|t| t == kind) {
                return false;
            }
        }
        if let Some(featured) = self.featured {
            if job.featured != featured {
                return false;
            }
        }
        if let Some(urgent) = self.urgent {
            if job.urgent != urgent {
                return false;
            }
        }
        if let Some(bound) = self.salary_min {
            if !salary_ceiling(job).map(|v| v >= bound).unwrap_or(false) {
                return false;
            }
        }
        if let Some(bound) = self.salary_max {
            if !salary_floor(job).map(|v| v <= bound).unwrap_or(false) {
                return false;
            }
        }
        if !self.skills.is_empty() {
            let wanted: Vec<String> = self.skills.iter().map(|s| s.to_lowercase()).collect();
            let hit = job
                .requirements
                .skills
                .required
                .iter()
                .any(|skill| wanted.contains(&skill.to_lowercase()));
            if !hit {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !contains_ci(Some(&job.title), search)
                && !contains_ci(Some(&job.description), search)
                && !contains_ci(job.company.as_deref(), search)
            {
                return false;
            }
        }
        true
    }

    /// Appends the `WHERE` body for this filter to a `jobs` query.
    pub fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        qb.push("status = ")
            .push_bind(JobStatus::Published.as_str())
            .push(" AND (deadline IS NULL OR deadline > ")
            .push_bind(now)
            .push(")");

        if let Some(category) = &self.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(job_type) = &self.job_type {
            qb.push(" AND job_type = ").push_bind(job_type.clone());
        }
        if let Some(format) = self.work_format {
            qb.push(" AND work_format = ").push_bind(format.as_str());
        }
        if let Some(location) = &self.location {
            let pattern = like_pattern(location);
            qb.push(" AND (city ILIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\' OR country ILIKE ")
                .push_bind(pattern)
                .push(r" ESCAPE '\')");
        }
        if let Some(kind) = self.compensation_type {
            qb.push(" AND compensation_type = ").push_bind(kind.as_str());
        }
        if let Some(level) = &self.experience_level {
            qb.push(" AND experience_level = ").push_bind(level.clone());
        }
        if let Some(kind) = &self.professional_type {
            qb.push(" AND ")
                .push_bind(kind.clone())
                .push(" = ANY(target_professional_types)");
        }
        if let Some(featured) = self.featured {
            qb.push(" AND featured = ").push_bind(featured);
        }
        if let Some(urgent) = self.urgent {
            qb.push(" AND urgent = ").push_bind(urgent);
        }
        if let Some(bound) = self.salary_min {
            qb.push(" AND COALESCE(compensation_max, compensation_min) >= ")
                .push_bind(bound);
        }
        if let Some(bound) = self.salary_max {
            qb.push(" AND COALESCE(compensation_min, compensation_max) <= ")
                .push_bind(bound);
        }
        if !self.skills.is_empty() {
            let wanted: Vec<String> = self.skills.iter().map(|s| s.to_lowercase()).collect();
            qb.push(" AND EXISTS (SELECT 1 FROM unnest(required_skills) AS skill WHERE lower(skill) = ANY(")
                .push_bind(wanted)
                .push("))");
        }
        if let Some(search) = &self.search {
            let pattern = like_pattern(search);
            qb.push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\' OR description ILIKE ")
                .push_bind(pattern.clone())
                .push(r" ESCAPE '\' OR company ILIKE ")
                .push_bind(pattern)
                .push(r" ESCAPE '\')");
        }
    }
}

impl JobSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            JobSort::Relevance => "featured DESC, urgent DESC, created_at DESC",
            JobSort::Newest => "created_at DESC",
            JobSort::Deadline => "deadline ASC NULLS LAST, created_at DESC",
            JobSort::SalaryHigh => {
                "COALESCE(compensation_max, compensation_min) DESC NULLS LAST, created_at DESC"
            }
            JobSort::SalaryLow => {
                "COALESCE(compensation_min, compensation_max) ASC NULLS LAST, created_at DESC"
            }
            JobSort::Popular => "views DESC, created_at DESC",
        }
    }

    /// In-memory equivalent of [`JobSort::order_by`].
    pub fn compare(&self, a: &Job, b: &Job) -> Ordering {
        let newest = b.created_at.cmp(&a.created_at);
        match self {
            JobSort::Relevance => b
                .featured
                .cmp(&a.featured)
                .then(b.urgent.cmp(&a.urgent))
                .then(newest),
            JobSort::Newest => newest,
            JobSort::Deadline => nulls_last(a.deadline(), b.deadline(), false).then(newest),
            JobSort::SalaryHigh => {
                nulls_last(salary_ceiling(a), salary_ceiling(b), true).then(newest)
            }
            JobSort::SalaryLow => nulls_last(salary_floor(a), salary_floor(b), false).then(newest),
            JobSort::Popular => b.views.cmp(&a.views).then(newest),
        }
    }
}

fn nulls_last<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if descending => y.cmp(&x),
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
