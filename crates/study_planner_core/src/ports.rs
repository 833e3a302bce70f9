//! crates/study_planner_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage or time sources.

use crate::domain::{NewTopic, SessionStatus, StudyPlan, StudySession, Topic, TopicStatus, TopicUpdate};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., storage).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Owner of the syllabus. The scheduler only ever sees a snapshot of its contents.
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// All topics, in the order they were added.
    async fn list_topics(&self) -> PortResult<Vec<Topic>>;

    async fn get_topic(&self, topic_id: &str) -> PortResult<Topic>;

    async fn create_topic(&self, topic: NewTopic) -> PortResult<Topic>;

    async fn update_topic(&self, topic_id: &str, update: TopicUpdate) -> PortResult<Topic>;

    async fn set_topic_status(&self, topic_id: &str, status: TopicStatus) -> PortResult<Topic>;

    async fn delete_topic(&self, topic_id: &str) -> PortResult<()>;
}

/// Persists generated plans and their session completion state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `plan` and makes it the current plan.
    async fn save_plan(&self, plan: StudyPlan) -> PortResult<()>;

    /// The most recently saved plan, if any.
    async fn current_plan(&self) -> PortResult<Option<StudyPlan>>;

    async fn get_plan(&self, plan_id: Uuid) -> PortResult<StudyPlan>;

    async fn set_session_status(
        &self,
        plan_id: Uuid,
        session_id: &str,
        status: SessionStatus,
    ) -> PortResult<StudySession>;
}

/// Supplies "now"; the scheduler itself never reads the time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
