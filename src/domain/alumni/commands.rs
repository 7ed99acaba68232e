use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Alumni Commands
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlumniCommand {
    Register {
        alumni_id: Uuid,
        email: String,
        first_name: String,
        last_name: String,
        graduation_year: i32,
        faculty: String,
        phone: Option<String>,
    },
    UpdateProfile {
        first_name: Option<String>,
        last_name: Option<String>,
        faculty: Option<String>,
        phone: Option<String>,
    },
    ChangeEmail {
        new_email: String,
    },
    Deactivate {
        reason: String,
    },
}
