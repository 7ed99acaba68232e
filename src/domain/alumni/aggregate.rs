use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Datelike, Utc};

use crate::event_sourcing::Aggregate;
use super::commands::AlumniCommand;
use super::errors::AlumniError;
use super::events::*;
use super::value_objects::{AlumniStatus, Email};

// ============================================================================
// Alumni Aggregate - Business Logic
// ============================================================================

/// Earliest graduating class the association keeps records for
const FIRST_GRADUATION_YEAR: i32 = 1950;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlumniAggregate {
    pub alumni_id: Uuid,
    pub version: i64,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub graduation_year: i32,
    pub faculty: String,
    pub phone: Option<String>,
    pub status: AlumniStatus,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlumniAggregate {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == AlumniStatus::Active
    }

    fn validate_active(&self) -> Result<(), AlumniError> {
        match self.status {
            AlumniStatus::Active => Ok(()),
            AlumniStatus::Deactivated => Err(AlumniError::NotActive),
        }
    }
}

fn non_blank(value: &Option<String>) -> Result<Option<String>, AlumniError> {
    match value.as_deref().map(str::trim) {
        Some("") => Err(AlumniError::NameRequired),
        Some(v) => Ok(Some(v.to_string())),
        None => Ok(None),
    }
}

impl Aggregate for AlumniAggregate {
    type Event = AlumniEvent;
    type Command = AlumniCommand;
    type Error = AlumniError;

    const AGGREGATE_TYPE: &'static str = "Alumni";

    fn create(command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let AlumniCommand::Register {
            alumni_id,
            email,
            first_name,
            last_name,
            graduation_year,
            faculty,
            phone,
        } = command
        else {
            return Err(AlumniError::NotInitialized);
        };

        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(AlumniError::NameRequired);
        }
        if !(FIRST_GRADUATION_YEAR..=Utc::now().year()).contains(graduation_year) {
            return Err(AlumniError::InvalidGraduationYear(*graduation_year));
        }

        Ok(vec![AlumniEvent::Registered(AlumniRegistered {
            alumni_id: *alumni_id,
            email: Email::parse(email)?,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            graduation_year: *graduation_year,
            faculty: faculty.trim().to_string(),
            phone: phone.clone(),
            registered_at: Utc::now(),
        })])
    }

    fn apply_first_event(event: &Self::Event) -> Result<Self, Self::Error> {
        match event {
            AlumniEvent::Registered(e) => Ok(Self {
                alumni_id: e.alumni_id,
                version: 0,
                email: e.email.clone(),
                first_name: e.first_name.clone(),
                last_name: e.last_name.clone(),
                graduation_year: e.graduation_year,
                faculty: e.faculty.clone(),
                phone: e.phone.clone(),
                status: AlumniStatus::Active,
                registered_at: e.registered_at,
                updated_at: e.registered_at,
            }),
            _ => Err(AlumniError::NotInitialized),
        }
    }

    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error> {
        match event {
            AlumniEvent::Registered(_) => {
                // Already applied in apply_first_event
            }
            AlumniEvent::ProfileUpdated(e) => {
                if let Some(ref first_name) = e.first_name {
                    self.first_name = first_name.clone();
                }
                if let Some(ref last_name) = e.last_name {
                    self.last_name = last_name.clone();
                }
                if let Some(ref faculty) = e.faculty {
                    self.faculty = faculty.clone();
                }
                if let Some(ref phone) = e.phone {
                    self.phone = Some(phone.clone());
                }
                self.updated_at = e.updated_at;
            }
            AlumniEvent::EmailChanged(e) => {
                self.email = e.new_email.clone();
                self.updated_at = e.changed_at;
            }
            AlumniEvent::Deactivated(e) => {
                self.status = AlumniStatus::Deactivated;
                self.updated_at = e.deactivated_at;
            }
        }
        Ok(())
    }

    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AlumniCommand::Register { .. } => Err(AlumniError::AlreadyRegistered),

            AlumniCommand::UpdateProfile { first_name, last_name, faculty, phone } => {
                self.validate_active()?;
                let first_name = non_blank(first_name)?;
                let last_name = non_blank(last_name)?;

                if first_name.is_none() && last_name.is_none() && faculty.is_none() && phone.is_none() {
                    return Ok(vec![]);
                }

                Ok(vec![AlumniEvent::ProfileUpdated(AlumniProfileUpdated {
                    first_name,
                    last_name,
                    faculty: faculty.clone(),
                    phone: phone.clone(),
                    updated_at: Utc::now(),
                })])
            }

            AlumniCommand::ChangeEmail { new_email } => {
                self.validate_active()?;
                let new_email = Email::parse(new_email)?;
                if new_email == self.email {
                    return Ok(vec![]);
                }
                Ok(vec![AlumniEvent::EmailChanged(AlumniEmailChanged {
                    old_email: self.email.clone(),
                    new_email,
                    changed_at: Utc::now(),
                })])
            }

            AlumniCommand::Deactivate { reason } => {
                if self.status == AlumniStatus::Deactivated {
                    return Err(AlumniError::AlreadyDeactivated);
                }
                Ok(vec![AlumniEvent::Deactivated(AlumniDeactivated {
                    reason: reason.clone(),
                    deactivated_at: Utc::now(),
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.alumni_id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn register_command(year: i32) -> AlumniCommand {
        AlumniCommand::Register {
            alumni_id: Uuid::new_v4(),
            email: "Omar.Hassan@example.com".to_string(),
            first_name: " Omar ".to_string(),
            last_name: "Hassan".to_string(),
            graduation_year: year,
            faculty: "Engineering".to_string(),
            phone: None,
        }
    }

    fn registered() -> AlumniAggregate {
        let events = AlumniAggregate::create(&register_command(2015)).unwrap();
        AlumniAggregate::from_events(&events).unwrap()
    }

    #[test]
    fn test_register_normalizes_fields() {
        let alumni = registered();
        assert_eq!(alumni.first_name, "Omar");
        assert_eq!(alumni.email.as_str(), "omar.hassan@example.com");
        assert!(alumni.is_active());
        assert_eq!(alumni.version, 1);
    }

    #[test]
    fn test_graduation_year_bounds() {
        let result = AlumniAggregate::create(&register_command(1900));
        assert_eq!(result.unwrap_err(), AlumniError::InvalidGraduationYear(1900));

        let next_year = Utc::now().year() + 1;
        assert!(AlumniAggregate::create(&register_command(next_year)).is_err());
    }

    #[test]
    fn test_blank_name_rejected_on_update() {
        let alumni = registered();
        let result = alumni.handle_command(&AlumniCommand::UpdateProfile {
            first_name: Some("   ".to_string()),
            last_name: None,
            faculty: None,
            phone: None,
        });
        assert_eq!(result.unwrap_err(), AlumniError::NameRequired);
    }

    #[test]
    fn test_same_email_is_a_no_op() {
        let alumni = registered();
        let events = alumni
            .handle_command(&AlumniCommand::ChangeEmail { new_email: "OMAR.HASSAN@example.com".into() })
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_deactivated_alumni_cannot_change() {
        let mut alumni = registered();
        let events = alumni
            .handle_command(&AlumniCommand::Deactivate { reason: "requested".into() })
            .unwrap();
        alumni.apply_all(&events).unwrap();

        assert!(!alumni.is_active());
        let result = alumni.handle_command(&AlumniCommand::ChangeEmail { new_email: "new@example.com".into() });
        assert_eq!(result.unwrap_err(), AlumniError::NotActive);
        let result = alumni.handle_command(&AlumniCommand::Deactivate { reason: "again".into() });
        assert_eq!(result.unwrap_err(), AlumniError::AlreadyDeactivated);
    }
}
