//! crates/study_planner_core/src/progress.rs
//!
//! Read-side views over a stored plan and the syllabus, plus the single mutation a
//! generated session allows: changing its status.

use crate::domain::{SessionStatus, StudyPlan, StudySession, Topic, TopicStatus};
use crate::ports::{PortError, PortResult};
use chrono::NaiveDate;

/// Unfinished topics due within this many days (today included) count as due soon.
pub const DUE_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionStats {
    pub completed: usize,
    pub total: usize,
    /// Rounded to the nearest whole percent; zero for an empty plan.
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub scheduled: usize,
    pub completed: usize,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyllabusSummary {
    pub total: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub completion_percentage: u32,
    /// Effort still open across topics that are not completed.
    pub remaining_hours: f64,
    /// Ids of unfinished topics whose deadline is before today.
    pub overdue: Vec<String>,
    pub due_soon: Vec<String>,
}

pub fn plan_completion(plan: &StudyPlan) -> CompletionStats {
    let total = plan.sessions.len();
    let completed = plan
        .sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Completed)
        .count();
    CompletionStats { completed, total, percentage: percent(completed, total) }
}

pub fn sessions_on(plan: &StudyPlan, date: NaiveDate) -> Vec<&StudySession> {
    plan.sessions.iter().filter(|s| s.date == date).collect()
}

pub fn daily_summary(plan: &StudyPlan, date: NaiveDate) -> DaySummary {
    let day = sessions_on(plan, date);
    DaySummary {
        date,
        scheduled: day.len(),
        completed: day
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .count(),
        hours: day.iter().map(|s| s.duration_hours).sum(),
    }
}

/// Whole days from `today` until the topic's deadline; negative once it has passed.
pub fn days_until_deadline(topic: &Topic, today: NaiveDate) -> i64 {
    (topic.deadline - today).num_days()
}

pub fn syllabus_summary(topics: &[Topic], today: NaiveDate) -> SyllabusSummary {
    let count = |status: TopicStatus| topics.iter().filter(|t| t.status == status).count();
    let completed = count(TopicStatus::Completed);
    let open: Vec<&Topic> = topics
        .iter()
        .filter(|t| t.status != TopicStatus::Completed)
        .collect();

    SyllabusSummary {
        total: topics.len(),
        not_started: count(TopicStatus::NotStarted),
        in_progress: count(TopicStatus::InProgress),
        completed,
        completion_percentage: percent(completed, topics.len()),
        remaining_hours: open.iter().map(|t| t.estimated_hours).sum(),
        overdue: open
            .iter()
            .filter(|t| days_until_deadline(t, today) < 0)
            .map(|t| t.id.clone())
            .collect(),
        due_soon: open
            .iter()
            .filter(|t| (0..=DUE_SOON_DAYS).contains(&days_until_deadline(t, today)))
            .map(|t| t.id.clone())
            .collect(),
    }
}

/// Sets the status of one session in `plan`. Topic snapshot fields are never touched.
pub fn apply_session_status(
    plan: &mut StudyPlan,
    session_id: &str,
    status: SessionStatus,
) -> PortResult<StudySession> {
    let session = plan
        .sessions
        .iter_mut()
        .find(|s| s.id == session_id)
        .ok_or_else(|| {
            PortError::NotFound(format!("Session {} not found in plan {}", session_id, plan.id))
        })?;
    session.status = status;
    Ok(session.clone())
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use chrono::{NaiveTime, Utc};
    use uuid::Uuid;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn session(id: &str, day: u32, hours: f64, status: SessionStatus) -> StudySession {
        StudySession {
            id: id.to_string(),
            topic_id: "t".to_string(),
            topic_title: "Ownership".to_string(),
            subject: "Rust".to_string(),
            priority: Priority::High,
            date: date(day),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration_hours: hours,
            status,
        }
    }

    fn plan(sessions: Vec<StudySession>) -> StudyPlan {
        StudyPlan {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            reference_date: date(15),
            daily_hours: 4.0,
            total_hours: sessions.iter().map(|s| s.duration_hours).sum(),
            sessions,
        }
    }

    fn topic(id: &str, deadline: u32, status: TopicStatus, hours: f64) -> Topic {
        Topic {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            subject: "Go".to_string(),
            deadline: date(deadline),
            priority: Priority::Medium,
            estimated_hours: hours,
            status,
        }
    }

    #[test]
    fn completion_rounds_to_whole_percent() {
        let p = plan(vec![
            session("a", 15, 1.0, SessionStatus::Completed),
            session("b", 15, 1.0, SessionStatus::Scheduled),
            session("c", 16, 1.0, SessionStatus::Missed),
        ]);
        assert_eq!(
            plan_completion(&p),
            CompletionStats { completed: 1, total: 3, percentage: 33 }
        );
        assert_eq!(plan_completion(&plan(vec![])).percentage, 0);
    }

    #[test]
    fn day_summary_only_counts_that_date() {
        let p = plan(vec![
            session("a", 15, 1.5, SessionStatus::Completed),
            session("b", 15, 0.5, SessionStatus::Scheduled),
            session("c", 16, 2.0, SessionStatus::Scheduled),
        ]);
        let summary = daily_summary(&p, date(15));
        assert_eq!(summary.scheduled, 2);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.hours, 2.0);
        assert!(sessions_on(&p, date(17)).is_empty());
    }

    #[test]
    fn status_change_touches_only_the_target() {
        let mut p = plan(vec![
            session("a", 15, 1.0, SessionStatus::Scheduled),
            session("b", 15, 1.0, SessionStatus::Scheduled),
        ]);
        let updated = apply_session_status(&mut p, "b", SessionStatus::Completed).unwrap();
        assert_eq!(updated.status, SessionStatus::Completed);
        assert_eq!(p.sessions[0].status, SessionStatus::Scheduled);
        assert_eq!(p.sessions[1].status, SessionStatus::Completed);

        let err = apply_session_status(&mut p, "zzz", SessionStatus::Missed).unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[test]
    fn syllabus_summary_counts_and_flags_overdue() {
        let topics = vec![
            topic("late", 10, TopicStatus::InProgress, 3.0),
            topic("done-late", 10, TopicStatus::Completed, 5.0),
            topic("soon", 20, TopicStatus::NotStarted, 1.5),
            topic("done", 25, TopicStatus::Completed, 2.0),
        ];
        let summary = syllabus_summary(&topics, date(15));
        assert_eq!(summary.total, 4);
        assert_eq!(summary.not_started, 1);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.completion_percentage, 50);
        assert_eq!(summary.remaining_hours, 4.5);
        assert_eq!(summary.overdue, vec!["late".to_string()]);
        assert_eq!(days_until_deadline(&topics[2], date(15)), 5);
        assert!(summary.due_soon.is_empty());
    }

    #[test]
    fn due_soon_covers_today_through_three_days() {
        let topics = vec![
            topic("today", 15, TopicStatus::NotStarted, 1.0),
            topic("in-three", 18, TopicStatus::InProgress, 1.0),
            topic("in-four", 19, TopicStatus::NotStarted, 1.0),
            topic("yesterday", 14, TopicStatus::NotStarted, 1.0),
            topic("done-tomorrow", 16, TopicStatus::Completed, 1.0),
        ];
        let summary = syllabus_summary(&topics, date(15));
        assert_eq!(summary.due_soon, vec!["today".to_string(), "in-three".to_string()]);
        assert_eq!(summary.overdue, vec!["yesterday".to_string()]);
    }
}
