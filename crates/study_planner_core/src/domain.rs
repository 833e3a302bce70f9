//! crates/study_planner_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Enumerations
//=========================================================================================

/// How urgent a topic is. Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Where a topic is in the user's syllabus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl TopicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicStatus::NotStarted => "not-started",
            TopicStatus::InProgress => "in-progress",
            TopicStatus::Completed => "completed",
        }
    }
}

/// Completion state of a generated session. Always `Scheduled` on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Scheduled,
    Completed,
    Missed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Missed => "missed",
        }
    }
}

/// Returned when a status or priority name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(ParseEnumError { kind: "priority", value: s.to_string() }),
        }
    }
}

impl FromStr for TopicStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not-started" => Ok(TopicStatus::NotStarted),
            "in-progress" => Ok(TopicStatus::InProgress),
            "completed" => Ok(TopicStatus::Completed),
            _ => Err(ParseEnumError { kind: "topic status", value: s.to_string() }),
        }
    }
}

impl FromStr for SessionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // Plans saved by older clients used "pending".
            "scheduled" | "pending" => Ok(SessionStatus::Scheduled),
            "completed" => Ok(SessionStatus::Completed),
            "missed" => Ok(SessionStatus::Missed),
            _ => Err(ParseEnumError { kind: "session status", value: s.to_string() }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Syllabus
//=========================================================================================

/// A unit of study material with a deadline, priority, and estimated effort.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub deadline: NaiveDate,
    pub priority: Priority,
    /// Total remaining effort, in hours.
    pub estimated_hours: f64,
    pub status: TopicStatus,
}

/// Fields supplied when adding a topic. New topics always start as `NotStarted`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTopic {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub deadline: NaiveDate,
    pub priority: Priority,
    pub estimated_hours: f64,
}

/// The editable fields of an existing topic.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicUpdate {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub deadline: NaiveDate,
    pub priority: Priority,
    pub estimated_hours: f64,
    pub status: TopicStatus,
}

impl Topic {
    pub fn from_new(id: String, new: NewTopic) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            subject: new.subject,
            deadline: new.deadline,
            priority: new.priority,
            estimated_hours: new.estimated_hours,
            status: TopicStatus::NotStarted,
        }
    }

    pub fn apply(&mut self, update: TopicUpdate) {
        self.title = update.title;
        self.description = update.description;
        self.subject = update.subject;
        self.deadline = update.deadline;
        self.priority = update.priority;
        self.estimated_hours = update.estimated_hours;
        self.status = update.status;
    }
}

//=========================================================================================
// Schedule
//=========================================================================================

/// A contiguous block of time allocated to one topic on one date.
///
/// The topic fields are a snapshot taken at generation time; editing the source
/// topic afterwards does not change them. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySession {
    pub id: String,
    pub topic_id: String,
    pub topic_title: String,
    pub subject: String,
    pub priority: Priority,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: f64,
    pub status: SessionStatus,
}

/// Caller-supplied knobs for a scheduling run.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingPreferences {
    /// Upper bound on scheduled hours per calendar day.
    pub daily_hours: f64,
    /// Time of day at which the first session of a day begins.
    pub start_time: NaiveTime,
    /// Gap inserted after each session.
    pub break_minutes: u32,
    /// Number of calendar days, starting at the reference date, open for placement.
    pub window_days: u32,
    /// Longest single session, in hours.
    pub session_cap_hours: f64,
}

impl Default for SchedulingPreferences {
    fn default() -> Self {
        Self {
            daily_hours: 4.0,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            break_minutes: 15,
            window_days: crate::scheduler::DEFAULT_WINDOW_DAYS,
            session_cap_hours: crate::scheduler::DEFAULT_SESSION_CAP_HOURS,
        }
    }
}

/// One persisted scheduling run. The id is assigned when the run is stored,
/// never by the scheduler itself.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyPlan {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub reference_date: NaiveDate,
    pub daily_hours: f64,
    pub total_hours: f64,
    pub sessions: Vec<StudySession>,
}
