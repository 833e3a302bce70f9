pub mod domain;
pub mod ports;
pub mod progress;
pub mod scheduler;

pub use domain::{
    NewTopic, Priority, SchedulingPreferences, SessionStatus, StudyPlan, StudySession, Topic,
    TopicStatus, TopicUpdate,
};
pub use ports::{Clock, PortError, PortResult, SessionStore, TopicStore};
pub use scheduler::{build_plan, generate_schedule, InvalidInputError};
