//! crates/study_planner_core/src/scheduler.rs
//!
//! Allocates study time for pending topics across a bounded window of calendar days.
//!
//! The scheduler is a pure function of its inputs: it performs no I/O, holds no state
//! between calls and never reads the wall clock. The caller decides what "today" is and
//! where the resulting sessions are stored.

use crate::domain::{SchedulingPreferences, SessionStatus, StudyPlan, StudySession, Topic, TopicStatus};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use tracing::debug;
use uuid::Uuid;

/// Leftover daily capacity below this many hours is not split into a session.
pub const MIN_SESSION_HOURS: f64 = 0.5;
/// Longest single session when the caller does not choose otherwise.
pub const DEFAULT_SESSION_CAP_HOURS: f64 = 2.0;
/// Number of calendar days considered when the caller does not choose otherwise.
pub const DEFAULT_WINDOW_DAYS: u32 = 14;
/// Longest window a single run may cover.
pub const MAX_WINDOW_DAYS: u32 = 366;
/// Tolerance used when comparing accumulated hours.
pub const HOURS_EPSILON: f64 = 1e-9;

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: u32 = 86_400;
/// Session times are resolved to whole seconds, so less than one second of
/// outstanding effort counts as fully scheduled.
const RESOLUTION_HOURS: f64 = 1.0 / SECONDS_PER_HOUR;

//=========================================================================================
// Errors
//=========================================================================================

/// Raised for inputs the user can correct. Never used for short or partial schedules.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInputError {
    #[error("there are no pending topics to schedule")]
    NoEligibleTopics,
    #[error("invalid scheduling preference `{field}`: {reason}")]
    InvalidPreference { field: &'static str, reason: String },
    #[error("topic '{topic_id}' cannot be scheduled: {reason}")]
    InvalidTopic { topic_id: String, reason: String },
}

//=========================================================================================
// Public entry points
//=========================================================================================

/// Produces the study sessions for every pending topic, ordered by `(date, start_time)`.
///
/// Topics are attempted earliest deadline first, then highest priority, then in input
/// order. Each calendar day in `[reference_date, reference_date + window_days)` that is
/// a weekday gets `daily_hours` of capacity, starting at `preferences.start_time`, and
/// each pending topic receives at most one session per day. A topic is retired once its
/// scheduled hours reach `estimated_hours`.
///
/// Running out of window before every topic is retired is not an error: the result is
/// simply a partial schedule.
pub fn generate_schedule(
    topics: &[Topic],
    preferences: &SchedulingPreferences,
    reference_date: NaiveDate,
) -> Result<Vec<StudySession>, InvalidInputError> {
    validate_preferences(preferences)?;

    let queue = prioritise(topics);
    if queue.is_empty() {
        return Err(InvalidInputError::NoEligibleTopics);
    }
    for topic in &queue {
        validate_topic(topic)?;
    }

    let mut allocations: Vec<Allocation<'_>> = queue
        .into_iter()
        .map(|topic| Allocation { topic, scheduled_hours: 0.0 })
        .collect();
    let mut sessions = Vec::new();

    for day_offset in 0..preferences.window_days {
        if allocations.iter().all(Allocation::is_retired) {
            break;
        }
        let Some(date) = reference_date.checked_add_days(Days::new(u64::from(day_offset))) else {
            break;
        };
        if is_weekend(date) {
            continue;
        }
        fill_day(date, day_offset, preferences, &mut allocations, &mut sessions);
    }

    debug!(
        topics = allocations.len(),
        sessions = sessions.len(),
        unfinished = allocations.iter().filter(|a| !a.is_retired()).count(),
        "schedule generated"
    );
    Ok(sessions)
}

/// Runs the scheduler and wraps its output into a new [`StudyPlan`] ready to be stored.
pub fn build_plan(
    topics: &[Topic],
    preferences: &SchedulingPreferences,
    reference_date: NaiveDate,
    created_at: DateTime<Utc>,
) -> Result<StudyPlan, InvalidInputError> {
    let sessions = generate_schedule(topics, preferences, reference_date)?;
    let total_hours = sessions.iter().map(|s| s.duration_hours).sum();
    Ok(StudyPlan {
        id: Uuid::new_v4(),
        created_at,
        reference_date,
        daily_hours: preferences.daily_hours,
        total_hours,
        sessions,
    })
}

/// Saturday and Sunday never receive sessions.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

//=========================================================================================
// Internals
//=========================================================================================

/// Per-topic bookkeeping that lives for the duration of one run.
struct Allocation<'a> {
    topic: &'a Topic,
    scheduled_hours: f64,
}

impl Allocation<'_> {
    fn outstanding(&self) -> f64 {
        self.topic.estimated_hours - self.scheduled_hours
    }

    fn is_retired(&self) -> bool {
        self.outstanding() < RESOLUTION_HOURS
    }
}

/// Filters out completed topics and sorts the rest into attempt order.
fn prioritise(topics: &[Topic]) -> Vec<&Topic> {
    let mut queue: Vec<&Topic> = topics
        .iter()
        .filter(|t| t.status != TopicStatus::Completed)
        .collect();
    // `sort_by` is stable, so equal keys keep their input order.
    queue.sort_by(|a, b| {
        a.deadline
            .cmp(&b.deadline)
            .then_with(|| b.priority.cmp(&a.priority))
    });
    queue
}

fn fill_day(
    date: NaiveDate,
    day_offset: u32,
    preferences: &SchedulingPreferences,
    allocations: &mut [Allocation<'_>],
    sessions: &mut Vec<StudySession>,
) {
    let break_seconds = preferences.break_minutes.saturating_mul(60);
    let mut remaining_hours = preferences.daily_hours;
    let mut cursor = preferences.start_time.num_seconds_from_midnight();

    for allocation in allocations.iter_mut() {
        if remaining_hours < RESOLUTION_HOURS {
            break;
        }
        if allocation.is_retired() {
            continue;
        }

        let outstanding = allocation.outstanding();
        let wanted = remaining_hours
            .min(preferences.session_cap_hours)
            .min(outstanding);

        // A short session is fine when it finishes the topic; a short slice of
        // leftover capacity is not.
        if wanted < MIN_SESSION_HOURS && wanted + HOURS_EPSILON < outstanding {
            break;
        }

        let seconds = hours_to_seconds(wanted);
        if seconds == 0 {
            break;
        }
        let end = cursor.saturating_add(seconds);
        if end >= SECONDS_PER_DAY {
            break;
        }
        let (Some(start_time), Some(end_time)) = (time_of_day(cursor), time_of_day(end)) else {
            break;
        };

        let duration_hours = f64::from(seconds) / SECONDS_PER_HOUR;
        let topic = allocation.topic;
        sessions.push(StudySession {
            id: format!("{}-{}-{}", topic.id, day_offset, sessions.len()),
            topic_id: topic.id.clone(),
            topic_title: topic.title.clone(),
            subject: topic.subject.clone(),
            priority: topic.priority,
            date,
            start_time,
            end_time,
            duration_hours,
            status: SessionStatus::Scheduled,
        });

        allocation.scheduled_hours += duration_hours;
        remaining_hours -= duration_hours;
        cursor = end.saturating_add(break_seconds);
    }
}

/// Whole seconds not exceeding `hours`, tolerant of representation error.
fn hours_to_seconds(hours: f64) -> u32 {
    let seconds = (hours * SECONDS_PER_HOUR + 1e-6).floor();
    if seconds <= 0.0 {
        0
    } else if seconds >= f64::from(SECONDS_PER_DAY) {
        SECONDS_PER_DAY
    } else {
        seconds as u32
    }
}

fn time_of_day(seconds: u32) -> Option<NaiveTime> {
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
}

fn validate_preferences(preferences: &SchedulingPreferences) -> Result<(), InvalidInputError> {
    positive_hours("daily_hours", preferences.daily_hours)?;
    positive_hours("session_cap_hours", preferences.session_cap_hours)?;
    if preferences.window_days == 0 || preferences.window_days > MAX_WINDOW_DAYS {
        return Err(InvalidInputError::InvalidPreference {
            field: "window_days",
            reason: format!(
                "must be between 1 and {} days, got {}",
                MAX_WINDOW_DAYS, preferences.window_days
            ),
        });
    }
    Ok(())
}

fn positive_hours(field: &'static str, value: f64) -> Result<(), InvalidInputError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InvalidInputError::InvalidPreference {
            field,
            reason: format!("must be a positive number of hours, got {}", value),
        })
    }
}

fn validate_topic(topic: &Topic) -> Result<(), InvalidInputError> {
    if topic.estimated_hours.is_finite() && topic.estimated_hours > 0.0 {
        Ok(())
    } else {
        Err(InvalidInputError::InvalidTopic {
            topic_id: topic.id.clone(),
            reason: format!(
                "estimated hours must be positive, got {}",
                topic.estimated_hours
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Priority;
    use std::collections::HashMap;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn topic(id: &str, deadline_offset: u64, priority: Priority, hours: f64) -> Topic {
        Topic {
            id: id.to_string(),
            title: format!("Topic {}", id),
            description: String::new(),
            subject: "Rust".to_string(),
            deadline: monday() + Days::new(deadline_offset),
            priority,
            estimated_hours: hours,
            status: TopicStatus::NotStarted,
        }
    }

    fn prefs(daily_hours: f64, break_minutes: u32, window_days: u32) -> SchedulingPreferences {
        SchedulingPreferences {
            daily_hours,
            start_time: at(9, 0),
            break_minutes,
            window_days,
            session_cap_hours: 2.0,
        }
    }

    fn hours_by_topic(sessions: &[StudySession]) -> HashMap<&str, f64> {
        let mut totals = HashMap::new();
        for s in sessions {
            *totals.entry(s.topic_id.as_str()).or_insert(0.0) += s.duration_hours;
        }
        totals
    }

    fn assert_invariants(topics: &[Topic], preferences: &SchedulingPreferences, sessions: &[StudySession]) {
        let mut per_day: HashMap<NaiveDate, Vec<&StudySession>> = HashMap::new();
        for s in sessions {
            assert!(s.duration_hours > 0.0, "non-positive session {:?}", s);
            assert!(!is_weekend(s.date), "weekend session {:?}", s);
            assert_eq!(s.status, SessionStatus::Scheduled);
            let span = (s.end_time - s.start_time).num_seconds() as f64 / 3600.0;
            assert!((span - s.duration_hours).abs() < 1e-9);
            per_day.entry(s.date).or_default().push(s);
        }
        for day in per_day.values() {
            let total: f64 = day.iter().map(|s| s.duration_hours).sum();
            assert!(total <= preferences.daily_hours + HOURS_EPSILON);
            for (i, a) in day.iter().enumerate() {
                for b in &day[i + 1..] {
                    assert!(a.end_time <= b.start_time || b.end_time <= a.start_time);
                }
            }
        }
        let totals = hours_by_topic(sessions);
        for t in topics {
            let scheduled = totals.get(t.id.as_str()).copied().unwrap_or(0.0);
            assert!(scheduled <= t.estimated_hours + HOURS_EPSILON);
            if t.status == TopicStatus::Completed {
                assert_eq!(scheduled, 0.0);
            }
        }
        for pair in sessions.windows(2) {
            assert!((pair[0].date, pair[0].start_time) < (pair[1].date, pair[1].start_time));
        }
    }

    #[test]
    fn earlier_deadline_beats_priority_and_topics_carry_over() {
        let topics = vec![
            topic("A", 5, Priority::High, 3.0),
            topic("B", 2, Priority::Low, 1.0),
        ];
        let preferences = prefs(2.0, 15, 5);
        let sessions = generate_schedule(&topics, &preferences, monday()).unwrap();

        assert_eq!(sessions.len(), 3);

        assert_eq!(sessions[0].topic_id, "B");
        assert_eq!(sessions[0].date, monday());
        assert_eq!((sessions[0].start_time, sessions[0].end_time), (at(9, 0), at(10, 0)));

        assert_eq!(sessions[1].topic_id, "A");
        assert_eq!(sessions[1].date, monday());
        assert_eq!((sessions[1].start_time, sessions[1].end_time), (at(10, 15), at(11, 15)));
        assert_eq!(sessions[1].duration_hours, 1.0);

        let tuesday = monday() + Days::new(1);
        assert_eq!(sessions[2].topic_id, "A");
        assert_eq!(sessions[2].date, tuesday);
        assert_eq!((sessions[2].start_time, sessions[2].end_time), (at(9, 0), at(11, 0)));
        assert_eq!(sessions[2].duration_hours, 2.0);

        assert_invariants(&topics, &preferences, &sessions);
    }

    #[test]
    fn saturday_only_window_is_empty_not_an_error() {
        let saturday = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        let topics = vec![topic("A", 3, Priority::High, 2.0)];
        let sessions = generate_schedule(&topics, &prefs(4.0, 15, 1), saturday).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn tiny_topic_still_gets_its_single_session() {
        let topics = vec![topic("A", 3, Priority::Medium, 0.2)];
        let sessions = generate_schedule(&topics, &prefs(4.0, 15, 5), monday()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].duration_hours, 0.2);
        assert_eq!(sessions[0].end_time, at(9, 12));
    }

    #[test]
    fn leftover_capacity_is_not_split_into_slivers() {
        // 1.75h of capacity: A takes 1.5h, leaving 0.25h which is too short for B.
        let topics = vec![
            topic("A", 1, Priority::High, 1.5),
            topic("B", 2, Priority::High, 2.0),
        ];
        let preferences = prefs(1.75, 0, 1);
        let sessions = generate_schedule(&topics, &preferences, monday()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].topic_id, "A");
    }

    #[test]
    fn completed_topics_are_excluded() {
        let mut done = topic("done", 0, Priority::High, 2.0);
        done.status = TopicStatus::Completed;
        let topics = vec![done, topic("open", 4, Priority::Low, 1.0)];
        let sessions = generate_schedule(&topics, &prefs(4.0, 15, 5), monday()).unwrap();
        assert!(sessions.iter().all(|s| s.topic_id == "open"));
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn nothing_pending_is_rejected() {
        let mut done = topic("done", 0, Priority::High, 2.0);
        done.status = TopicStatus::Completed;
        assert_eq!(
            generate_schedule(&[done], &prefs(4.0, 15, 5), monday()),
            Err(InvalidInputError::NoEligibleTopics)
        );
        assert_eq!(
            generate_schedule(&[], &prefs(4.0, 15, 5), monday()),
            Err(InvalidInputError::NoEligibleTopics)
        );
    }

    #[test]
    fn malformed_preferences_are_rejected() {
        let topics = vec![topic("A", 1, Priority::High, 1.0)];

        let err = generate_schedule(&topics, &prefs(0.0, 15, 5), monday()).unwrap_err();
        assert!(matches!(err, InvalidInputError::InvalidPreference { field: "daily_hours", .. }));

        let err = generate_schedule(&topics, &prefs(4.0, 15, 0), monday()).unwrap_err();
        assert!(matches!(err, InvalidInputError::InvalidPreference { field: "window_days", .. }));

        let err = generate_schedule(&topics, &prefs(4.0, 15, MAX_WINDOW_DAYS + 1), monday())
            .unwrap_err();
        assert!(matches!(err, InvalidInputError::InvalidPreference { field: "window_days", .. }));
        let err = generate_schedule(&topics, &prefs(4.0, 15, u32::MAX), monday()).unwrap_err();
        assert!(matches!(err, InvalidInputError::InvalidPreference { field: "window_days", .. }));
        assert!(generate_schedule(&topics, &prefs(4.0, 15, MAX_WINDOW_DAYS), monday()).is_ok());

        let mut capped = prefs(4.0, 15, 5);
        capped.session_cap_hours = -1.0;
        let err = generate_schedule(&topics, &capped, monday()).unwrap_err();
        assert!(matches!(err, InvalidInputError::InvalidPreference { field: "session_cap_hours", .. }));

        let err = generate_schedule(&topics, &prefs(f64::NAN, 15, 5), monday()).unwrap_err();
        assert!(matches!(err, InvalidInputError::InvalidPreference { field: "daily_hours", .. }));
    }

    #[test]
    fn zero_effort_topic_is_rejected() {
        let topics = vec![topic("A", 1, Priority::High, 0.0)];
        let err = generate_schedule(&topics, &prefs(4.0, 15, 5), monday()).unwrap_err();
        assert_eq!(
            err,
            InvalidInputError::InvalidTopic {
                topic_id: "A".to_string(),
                reason: "estimated hours must be positive, got 0".to_string(),
            }
        );
    }

    #[test]
    fn short_window_yields_partial_schedule() {
        let topics = vec![topic("A", 30, Priority::High, 20.0)];
        let preferences = prefs(8.0, 15, 3);
        let sessions = generate_schedule(&topics, &preferences, monday()).unwrap();
        // One capped session per weekday in a three-day window.
        assert_eq!(sessions.len(), 3);
        let total: f64 = sessions.iter().map(|s| s.duration_hours).sum();
        assert_eq!(total, 6.0);
        assert_invariants(&topics, &preferences, &sessions);
    }

    #[test]
    fn generous_capacity_finishes_everything_on_day_one() {
        let topics = vec![
            topic("A", 3, Priority::High, 1.0),
            topic("B", 3, Priority::Medium, 1.5),
            topic("C", 3, Priority::Low, 2.0),
        ];
        let preferences = prefs(12.0, 10, 14);
        let sessions = generate_schedule(&topics, &preferences, monday()).unwrap();
        assert_eq!(sessions.len(), 3);
        assert!(sessions.iter().all(|s| s.date == monday()));
        let order: Vec<_> = sessions.iter().map(|s| s.topic_id.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let topics = vec![
            topic("second", 2, Priority::Medium, 1.0),
            topic("first", 2, Priority::Medium, 1.0),
        ];
        let sessions = generate_schedule(&topics, &prefs(4.0, 0, 1), monday()).unwrap();
        let order: Vec<_> = sessions.iter().map(|s| s.topic_id.as_str()).collect();
        assert_eq!(order, vec!["second", "first"]);
    }

    #[test]
    fn weekends_are_skipped_between_weeks() {
        let friday = NaiveDate::from_ymd_opt(2024, 1, 19).unwrap();
        let topics = vec![topic("A", 10, Priority::High, 4.0)];
        let sessions = generate_schedule(&topics, &prefs(2.0, 0, 7), friday).unwrap();
        let dates: Vec<_> = sessions.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![friday, friday + Days::new(3)]);
    }

    #[test]
    fn sessions_never_run_past_midnight() {
        let topics = vec![
            topic("A", 1, Priority::High, 2.0),
            topic("B", 2, Priority::High, 2.0),
        ];
        let mut preferences = prefs(4.0, 30, 2);
        preferences.start_time = at(21, 0);
        let sessions = generate_schedule(&topics, &preferences, monday()).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!((sessions[0].topic_id.as_str(), sessions[0].date), ("A", monday()));
        assert_eq!((sessions[1].topic_id.as_str(), sessions[1].date), ("B", monday() + Days::new(1)));
        assert_eq!(sessions[1].start_time, at(21, 0));
    }

    #[test]
    fn session_ids_are_unique_within_a_run() {
        let topics: Vec<_> = (0..6)
            .map(|i| topic(&format!("T{}", i), i, Priority::Medium, 3.0))
            .collect();
        let sessions = generate_schedule(&topics, &prefs(5.0, 15, 14), monday()).unwrap();
        let mut ids: Vec<_> = sessions.iter().map(|s| s.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), sessions.len());
    }

    #[test]
    fn invariants_hold_across_mixed_workloads() {
        let priorities = [Priority::High, Priority::Medium, Priority::Low];
        for daily in [0.75, 1.0, 2.5, 4.0, 9.0] {
            for cap in [0.5, 1.0, 2.0, 3.0] {
                for brk in [0, 10, 45] {
                    let topics: Vec<_> = (0..7u64)
                        .map(|i| {
                            let mut t = topic(
                                &format!("T{}", i),
                                (i * 3) % 5,
                                priorities[(i % 3) as usize],
                                0.3 + i as f64 * 0.85,
                            );
                            if i == 4 {
                                t.status = TopicStatus::Completed;
                            }
                            t
                        })
                        .collect();
                    let mut preferences = prefs(daily, brk, 10);
                    preferences.session_cap_hours = cap;
                    let sessions = generate_schedule(&topics, &preferences, monday()).unwrap();
                    assert_invariants(&topics, &preferences, &sessions);
                }
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let topics = vec![
            topic("A", 5, Priority::High, 3.5),
            topic("B", 2, Priority::Low, 1.25),
            topic("C", 2, Priority::High, 2.0),
        ];
        let preferences = prefs(3.0, 15, 10);
        let first = generate_schedule(&topics, &preferences, monday()).unwrap();
        let second = generate_schedule(&topics, &preferences, monday()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn build_plan_sums_hours() {
        let topics = vec![topic("A", 5, Priority::High, 3.0), topic("B", 2, Priority::Low, 1.0)];
        let now = Utc::now();
        let plan = build_plan(&topics, &prefs(2.0, 15, 5), monday(), now).unwrap();
        assert_eq!(plan.sessions.len(), 3);
        assert_eq!(plan.total_hours, 4.0);
        assert_eq!(plan.daily_hours, 2.0);
        assert_eq!(plan.created_at, now);
        assert_eq!(plan.reference_date, monday());
    }
}
