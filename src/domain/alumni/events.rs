use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::event_sourcing::DomainEvent;
use super::value_objects::Email;

// ============================================================================
// Alumni Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AlumniEvent {
    Registered(AlumniRegistered),
    ProfileUpdated(AlumniProfileUpdated),
    EmailChanged(AlumniEmailChanged),
    Deactivated(AlumniDeactivated),
}

impl DomainEvent for AlumniEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AlumniEvent::Registered(_) => "AlumniRegistered",
            AlumniEvent::ProfileUpdated(_) => "AlumniProfileUpdated",
            AlumniEvent::EmailChanged(_) => "AlumniEmailChanged",
            AlumniEvent::Deactivated(_) => "AlumniDeactivated",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AlumniRegistered {
    pub alumni_id: Uuid,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub graduation_year: i32,
    pub faculty: String,
    pub phone: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Only the fields that changed are set
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AlumniProfileUpdated {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub faculty: Option<String>,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AlumniEmailChanged {
    pub old_email: Email,
    pub new_email: Email,
    pub changed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AlumniDeactivated {
    pub reason: String,
    pub deactivated_at: DateTime<Utc>,
}
