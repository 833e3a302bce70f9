//! services/api/src/adapters/local_store.rs
//!
//! Implements the `TopicStore` and `SessionStore` ports on top of any `BlobStore`.
//! The whole syllabus is one JSON array; each plan is one JSON object.

use crate::adapters::kv::BlobStore;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use study_planner_core::domain::{
    NewTopic, SessionStatus, StudyPlan, StudySession, Topic, TopicStatus, TopicUpdate,
};
use study_planner_core::ports::{PortError, PortResult, SessionStore, TopicStore};
use study_planner_core::progress::apply_session_status;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

pub const TOPICS_KEY: &str = "studygenie_topics";
/// Holds the id of the current plan.
pub const CURRENT_PLAN_KEY: &str = "studygenie_study_plan";
const PLAN_KEY_PREFIX: &str = "studygenie_plan:";

fn plan_key(plan_id: Uuid) -> String {
    format!("{}{}", PLAN_KEY_PREFIX, plan_id)
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Topic and plan storage over a key-value blob backend.
pub struct LocalStoreAdapter {
    blobs: Arc<dyn BlobStore>,
    // Read-modify-write cycles on a blob must not interleave.
    write_lock: Mutex<()>,
}

impl LocalStoreAdapter {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            write_lock: Mutex::new(()),
        }
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        match self.blobs.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| PortError::Unexpected(format!("Corrupt blob '{}': {}", key, e))),
            None => Ok(None),
        }
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T) -> PortResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| PortError::Unexpected(format!("Failed to encode '{}': {}", key, e)))?;
        self.blobs.put(key, raw).await
    }

    async fn load_topics(&self) -> PortResult<Vec<Topic>> {
        self.load::<Vec<TopicRecord>>(TOPICS_KEY)
            .await?
            .unwrap_or_default()
            .into_iter()
            .map(TopicRecord::to_domain)
            .collect()
    }

    async fn store_topics(&self, topics: &[Topic]) -> PortResult<()> {
        let records: Vec<TopicRecord> = topics.iter().map(TopicRecord::from_domain).collect();
        self.store(TOPICS_KEY, &records).await
    }

    async fn load_plan(&self, plan_id: Uuid) -> PortResult<StudyPlan> {
        self.load::<PlanRecord>(&plan_key(plan_id))
            .await?
            .ok_or_else(|| PortError::NotFound(format!("Plan {} not found", plan_id)))?
            .to_domain()
    }

    /// Applies `edit` to one topic and writes the syllabus back.
    async fn modify_topic<F>(&self, topic_id: &str, edit: F) -> PortResult<Topic>
    where
        F: FnOnce(&mut Topic) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut topics = self.load_topics().await?;
        let topic = topics
            .iter_mut()
            .find(|t| t.id == topic_id)
            .ok_or_else(|| PortError::NotFound(format!("Topic {} not found", topic_id)))?;
        edit(topic);
        let updated = topic.clone();
        self.store_topics(&topics).await?;
        Ok(updated)
    }
}

//=========================================================================================
// Stored Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicRecord {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    subject: String,
    deadline: NaiveDate,
    priority: String,
    status: String,
    estimated_hours: f64,
}

impl TopicRecord {
    fn to_domain(self) -> PortResult<Topic> {
        Ok(Topic {
            priority: parse_field(&self.priority)?,
            status: parse_field(&self.status)?,
            id: self.id,
            title: self.title,
            description: self.description,
            subject: self.subject,
            deadline: self.deadline,
            estimated_hours: self.estimated_hours,
        })
    }

    fn from_domain(topic: &Topic) -> Self {
        Self {
            id: topic.id.clone(),
            title: topic.title.clone(),
            description: topic.description.clone(),
            subject: topic.subject.clone(),
            deadline: topic.deadline,
            priority: topic.priority.as_str().to_string(),
            status: topic.status.as_str().to_string(),
            estimated_hours: topic.estimated_hours,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRecord {
    id: String,
    topic_id: String,
    topic_title: String,
    subject: String,
    priority: String,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    duration: f64,
    status: String,
}

impl SessionRecord {
    fn to_domain(self) -> PortResult<StudySession> {
        Ok(StudySession {
            priority: parse_field(&self.priority)?,
            status: parse_field(&self.status)?,
            id: self.id,
            topic_id: self.topic_id,
            topic_title: self.topic_title,
            subject: self.subject,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            duration_hours: self.duration,
        })
    }

    fn from_domain(session: &StudySession) -> Self {
        Self {
            id: session.id.clone(),
            topic_id: session.topic_id.clone(),
            topic_title: session.topic_title.clone(),
            subject: session.subject.clone(),
            priority: session.priority.as_str().to_string(),
            date: session.date,
            start_time: session.start_time,
            end_time: session.end_time,
            duration: session.duration_hours,
            status: session.status.as_str().to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanRecord {
    id: Uuid,
    created_at: DateTime<Utc>,
    reference_date: NaiveDate,
    total_hours: f64,
    daily_hours: f64,
    tasks: Vec<SessionRecord>,
}

impl PlanRecord {
    fn to_domain(self) -> PortResult<StudyPlan> {
        Ok(StudyPlan {
            id: self.id,
            created_at: self.created_at,
            reference_date: self.reference_date,
            daily_hours: self.daily_hours,
            total_hours: self.total_hours,
            sessions: self
                .tasks
                .into_iter()
                .map(SessionRecord::to_domain)
                .collect::<PortResult<_>>()?,
        })
    }

    fn from_domain(plan: &StudyPlan) -> Self {
        Self {
            id: plan.id,
            created_at: plan.created_at,
            reference_date: plan.reference_date,
            total_hours: plan.total_hours,
            daily_hours: plan.daily_hours,
            tasks: plan.sessions.iter().map(SessionRecord::from_domain).collect(),
        }
    }
}

fn parse_field<T>(raw: &str) -> PortResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| PortError::Unexpected(format!("Corrupt stored value: {}", e)))
}

//=========================================================================================
// `TopicStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl TopicStore for LocalStoreAdapter {
    async fn list_topics(&self) -> PortResult<Vec<Topic>> {
        self.load_topics().await
    }

    async fn get_topic(&self, topic_id: &str) -> PortResult<Topic> {
        self.load_topics()
            .await?
            .into_iter()
            .find(|t| t.id == topic_id)
            .ok_or_else(|| PortError::NotFound(format!("Topic {} not found", topic_id)))
    }

    async fn create_topic(&self, new: NewTopic) -> PortResult<Topic> {
        let _guard = self.write_lock.lock().await;
        let mut topics = self.load_topics().await?;
        let topic = Topic::from_new(Uuid::new_v4().to_string(), new);
        topics.push(topic.clone());
        self.store_topics(&topics).await?;
        debug!(topic_id = %topic.id, "topic created");
        Ok(topic)
    }

    async fn update_topic(&self, topic_id: &str, update: TopicUpdate) -> PortResult<Topic> {
        self.modify_topic(topic_id, move |topic| topic.apply(update)).await
    }

    async fn set_topic_status(&self, topic_id: &str, status: TopicStatus) -> PortResult<Topic> {
        self.modify_topic(topic_id, move |topic| topic.status = status).await
    }

    async fn delete_topic(&self, topic_id: &str) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut topics = self.load_topics().await?;
        let before = topics.len();
        topics.retain(|t| t.id != topic_id);
        if topics.len() == before {
            return Err(PortError::NotFound(format!("Topic {} not found", topic_id)));
        }
        self.store_topics(&topics).await
    }
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for LocalStoreAdapter {
    async fn save_plan(&self, plan: StudyPlan) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        self.store(&plan_key(plan.id), &PlanRecord::from_domain(&plan))
            .await?;
        self.blobs.put(CURRENT_PLAN_KEY, plan.id.to_string()).await
    }

    async fn current_plan(&self) -> PortResult<Option<StudyPlan>> {
        let Some(raw_id) = self.blobs.get(CURRENT_PLAN_KEY).await? else {
            return Ok(None);
        };
        let plan_id = Uuid::parse_str(raw_id.trim())
            .map_err(|e| PortError::Unexpected(format!("Corrupt current plan id: {}", e)))?;
        self.load_plan(plan_id).await.map(Some)
    }

    async fn get_plan(&self, plan_id: Uuid) -> PortResult<StudyPlan> {
        self.load_plan(plan_id).await
    }

    async fn set_session_status(
        &self,
        plan_id: Uuid,
        session_id: &str,
        status: SessionStatus,
    ) -> PortResult<StudySession> {
        let _guard = self.write_lock.lock().await;
        let mut plan = self.load_plan(plan_id).await?;
        let updated = apply_session_status(&mut plan, session_id, status)?;
        self.store(&plan_key(plan_id), &PlanRecord::from_domain(&plan))
            .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::kv::MemoryBlobStore;
    use study_planner_core::domain::Priority;

    fn adapter() -> (Arc<MemoryBlobStore>, LocalStoreAdapter) {
        let blobs = Arc::new(MemoryBlobStore::new());
        (blobs.clone(), LocalStoreAdapter::new(blobs))
    }

    #[tokio::test]
    async fn topics_are_stored_as_a_camel_case_array() {
        let (blobs, store) = adapter();
        let topic = store
            .create_topic(NewTopic {
                title: "Traits".to_string(),
                description: String::new(),
                subject: "Rust".to_string(),
                deadline: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                priority: Priority::High,
                estimated_hours: 2.5,
            })
            .await
            .unwrap();

        let raw = blobs.get(TOPICS_KEY).await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json[0]["id"], topic.id.as_str());
        assert_eq!(json[0]["estimatedHours"], 2.5);
        assert_eq!(json[0]["status"], "not-started");
        assert_eq!(json[0]["priority"], "high");
    }

    #[tokio::test]
    async fn legacy_blobs_without_description_still_load() {
        let (blobs, store) = adapter();
        blobs
            .put(
                TOPICS_KEY,
                r#"[{"id":"1700000000000","title":"Closures","subject":"JavaScript",
                    "deadline":"2024-03-01","priority":"low","status":"in-progress",
                    "estimatedHours":3}]"#
                    .to_string(),
            )
            .await
            .unwrap();
        let topics = store.list_topics().await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].status, TopicStatus::InProgress);
        assert_eq!(topics[0].estimated_hours, 3.0);
        assert!(topics[0].description.is_empty());
    }

    #[tokio::test]
    async fn corrupt_blob_is_an_unexpected_error() {
        let (blobs, store) = adapter();
        blobs.put(TOPICS_KEY, "{not json".to_string()).await.unwrap();
        let err = store.list_topics().await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(_)));
    }

    #[tokio::test]
    async fn missing_topic_is_not_found() {
        let (_, store) = adapter();
        assert!(matches!(
            store.delete_topic("nope").await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store.set_topic_status("nope", TopicStatus::Completed).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn no_plan_until_one_is_saved() {
        let (_, store) = adapter();
        assert!(store.current_plan().await.unwrap().is_none());
        assert!(matches!(
            store.get_plan(Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
    }
}
