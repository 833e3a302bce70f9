//! services/api/src/web/dto.rs
//!
//! Request and response payloads for the REST API, and their conversions to and
//! from the core domain types.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use study_planner_core::domain::{
    NewTopic, Priority, SchedulingPreferences, SessionStatus, StudyPlan, StudySession, Topic,
    TopicStatus, TopicUpdate,
};
use study_planner_core::progress::{CompletionStats, DaySummary, SyllabusSummary};
use study_planner_core::scheduler::MAX_WINDOW_DAYS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::parse_time_of_day;

//=========================================================================================
// Enumerations
//=========================================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriorityDto {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TopicStatusDto {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatusDto {
    #[serde(alias = "pending")]
    Scheduled,
    Completed,
    Missed,
}

impl From<PriorityDto> for Priority {
    fn from(p: PriorityDto) -> Self {
        match p {
            PriorityDto::High => Priority::High,
            PriorityDto::Medium => Priority::Medium,
            PriorityDto::Low => Priority::Low,
        }
    }
}

impl From<Priority> for PriorityDto {
    fn from(p: Priority) -> Self {
        match p {
            Priority::High => PriorityDto::High,
            Priority::Medium => PriorityDto::Medium,
            Priority::Low => PriorityDto::Low,
        }
    }
}

impl From<TopicStatusDto> for TopicStatus {
    fn from(s: TopicStatusDto) -> Self {
        match s {
            TopicStatusDto::NotStarted => TopicStatus::NotStarted,
            TopicStatusDto::InProgress => TopicStatus::InProgress,
            TopicStatusDto::Completed => TopicStatus::Completed,
        }
    }
}

impl From<TopicStatus> for TopicStatusDto {
    fn from(s: TopicStatus) -> Self {
        match s {
            TopicStatus::NotStarted => TopicStatusDto::NotStarted,
            TopicStatus::InProgress => TopicStatusDto::InProgress,
            TopicStatus::Completed => TopicStatusDto::Completed,
        }
    }
}

impl From<SessionStatusDto> for SessionStatus {
    fn from(s: SessionStatusDto) -> Self {
        match s {
            SessionStatusDto::Scheduled => SessionStatus::Scheduled,
            SessionStatusDto::Completed => SessionStatus::Completed,
            SessionStatusDto::Missed => SessionStatus::Missed,
        }
    }
}

impl From<SessionStatus> for SessionStatusDto {
    fn from(s: SessionStatus) -> Self {
        match s {
            SessionStatus::Scheduled => SessionStatusDto::Scheduled,
            SessionStatus::Completed => SessionStatusDto::Completed,
            SessionStatus::Missed => SessionStatusDto::Missed,
        }
    }
}

//=========================================================================================
// Topics
//=========================================================================================

fn default_priority() -> PriorityDto {
    PriorityDto::Medium
}

fn default_estimated_hours() -> f64 {
    2.0
}

/// Payload for adding a topic to the syllabus.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTopicRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub subject: String,
    pub deadline: NaiveDate,
    #[serde(default = "default_priority")]
    pub priority: PriorityDto,
    #[serde(default = "default_estimated_hours")]
    pub estimated_hours: f64,
}

/// Payload for replacing the editable fields of a topic.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTopicRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub subject: String,
    pub deadline: NaiveDate,
    pub priority: PriorityDto,
    pub estimated_hours: f64,
    pub status: TopicStatusDto,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TopicStatusRequest {
    pub status: TopicStatusDto,
}

fn check_topic_fields(title: &str, subject: &str, estimated_hours: f64) -> Result<(), String> {
    if title.trim().is_empty() || subject.trim().is_empty() {
        return Err("Title and subject are required".to_string());
    }
    if !(estimated_hours.is_finite() && estimated_hours > 0.0) {
        return Err("Estimated hours must be a positive number".to_string());
    }
    Ok(())
}

impl CreateTopicRequest {
    pub fn into_domain(self) -> Result<NewTopic, String> {
        check_topic_fields(&self.title, &self.subject, self.estimated_hours)?;
        Ok(NewTopic {
            title: self.title.trim().to_string(),
            description: self.description,
            subject: self.subject.trim().to_string(),
            deadline: self.deadline,
            priority: self.priority.into(),
            estimated_hours: self.estimated_hours,
        })
    }
}

impl UpdateTopicRequest {
    pub fn into_domain(self) -> Result<TopicUpdate, String> {
        check_topic_fields(&self.title, &self.subject, self.estimated_hours)?;
        Ok(TopicUpdate {
            title: self.title.trim().to_string(),
            description: self.description,
            subject: self.subject.trim().to_string(),
            deadline: self.deadline,
            priority: self.priority.into(),
            estimated_hours: self.estimated_hours,
            status: self.status.into(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopicResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub deadline: NaiveDate,
    pub priority: PriorityDto,
    pub status: TopicStatusDto,
    pub estimated_hours: f64,
    /// Negative once the deadline has passed.
    pub days_until_deadline: i64,
}

impl TopicResponse {
    pub fn from_domain(topic: Topic, today: NaiveDate) -> Self {
        Self {
            days_until_deadline: study_planner_core::progress::days_until_deadline(&topic, today),
            id: topic.id,
            title: topic.title,
            description: topic.description,
            subject: topic.subject,
            deadline: topic.deadline,
            priority: topic.priority.into(),
            status: topic.status.into(),
            estimated_hours: topic.estimated_hours,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SyllabusSummaryResponse {
    pub total: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub completion_percentage: u32,
    pub remaining_hours: f64,
    pub overdue: Vec<String>,
    pub due_soon: Vec<String>,
}

impl From<SyllabusSummary> for SyllabusSummaryResponse {
    fn from(s: SyllabusSummary) -> Self {
        Self {
            total: s.total,
            not_started: s.not_started,
            in_progress: s.in_progress,
            completed: s.completed,
            completion_percentage: s.completion_percentage,
            remaining_hours: s.remaining_hours,
            overdue: s.overdue,
            due_soon: s.due_soon,
        }
    }
}

//=========================================================================================
// Plans and Sessions
//=========================================================================================

/// Optional overrides for a plan run. Anything omitted falls back to the server defaults,
/// and a missing `reference_date` means today.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct GeneratePlanRequest {
    pub daily_hours: Option<f64>,
    /// `HH:MM` or `HH:MM:SS`.
    pub start_time: Option<String>,
    pub break_minutes: Option<u32>,
    pub window_days: Option<u32>,
    pub session_cap_hours: Option<f64>,
    pub reference_date: Option<NaiveDate>,
}

impl GeneratePlanRequest {
    pub fn preferences(&self, defaults: &SchedulingPreferences) -> Result<SchedulingPreferences, String> {
        let start_time = match &self.start_time {
            Some(raw) => parse_time_of_day(raw)
                .ok_or_else(|| format!("'{}' is not a valid HH:MM start time", raw))?,
            None => defaults.start_time,
        };
        let window_days = self.window_days.unwrap_or(defaults.window_days);
        if window_days > MAX_WINDOW_DAYS {
            return Err(format!(
                "window_days may not exceed {} days, got {}",
                MAX_WINDOW_DAYS, window_days
            ));
        }
        Ok(SchedulingPreferences {
            daily_hours: self.daily_hours.unwrap_or(defaults.daily_hours),
            start_time,
            break_minutes: self.break_minutes.unwrap_or(defaults.break_minutes),
            window_days,
            session_cap_hours: self.session_cap_hours.unwrap_or(defaults.session_cap_hours),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SessionStatusRequest {
    pub status: SessionStatusDto,
}

/// Renders `HH:MM`, adding seconds only when they are not zero.
fn format_time_of_day(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: String,
    pub topic_id: String,
    pub topic_title: String,
    pub subject: String,
    pub priority: PriorityDto,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub duration_hours: f64,
    pub status: SessionStatusDto,
}

impl From<&StudySession> for SessionResponse {
    fn from(s: &StudySession) -> Self {
        Self {
            id: s.id.clone(),
            topic_id: s.topic_id.clone(),
            topic_title: s.topic_title.clone(),
            subject: s.subject.clone(),
            priority: s.priority.into(),
            date: s.date,
            start_time: format_time_of_day(s.start_time),
            end_time: format_time_of_day(s.end_time),
            duration_hours: s.duration_hours,
            status: s.status.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub reference_date: NaiveDate,
    pub daily_hours: f64,
    pub total_hours: f64,
    pub sessions: Vec<SessionResponse>,
}

impl From<&StudyPlan> for PlanResponse {
    fn from(plan: &StudyPlan) -> Self {
        Self {
            id: plan.id,
            created_at: plan.created_at,
            reference_date: plan.reference_date,
            daily_hours: plan.daily_hours,
            total_hours: plan.total_hours,
            sessions: plan.sessions.iter().map(SessionResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DaySummaryResponse {
    pub date: NaiveDate,
    pub scheduled: usize,
    pub completed: usize,
    pub hours: f64,
}

impl From<DaySummary> for DaySummaryResponse {
    fn from(d: DaySummary) -> Self {
        Self {
            date: d.date,
            scheduled: d.scheduled,
            completed: d.completed,
            hours: d.hours,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanStatsResponse {
    pub plan_id: Uuid,
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
    pub total_hours: f64,
    pub today: DaySummaryResponse,
}

impl PlanStatsResponse {
    pub fn new(plan: &StudyPlan, completion: CompletionStats, today: DaySummary) -> Self {
        Self {
            plan_id: plan.id,
            completed: completion.completed,
            total: completion.total,
            percentage: completion.percentage,
            total_hours: plan.total_hours,
            today: today.into(),
        }
    }
}
