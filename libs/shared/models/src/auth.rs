use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }

    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Physiotherapist,
    Admin,
}

impl Role {
    /// Maps the JWT `role` claim onto a clinic role. Unknown roles map to `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "patient" => Some(Role::Patient),
            "physiotherapist" | "physio" | "provider" | "doctor" => Some(Role::Physiotherapist),
            "admin" | "staff" | "service_role" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "patient"),
            Role::Physiotherapist => write!(f, "physiotherapist"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Which records an authenticated user may see.
///
/// Patients see the records they are the subject of, physiotherapists the
/// records they are assigned to, and staff see everything. A token with an
/// unknown role or a non-UUID subject sees nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
    All,
    OwnRecords(Uuid),
    AssignedRecords(Uuid),
    Nothing,
}

impl AccessScope {
    pub fn for_user(user: &User) -> Self {
        match (user.role(), user.user_id()) {
            (Some(Role::Admin), _) => AccessScope::All,
            (Some(Role::Patient), Some(id)) => AccessScope::OwnRecords(id),
            (Some(Role::Physiotherapist), Some(id)) => AccessScope::AssignedRecords(id),
            _ => AccessScope::Nothing,
        }
    }

    pub fn permits(&self, patient_id: &Uuid, provider_id: Option<&Uuid>) -> bool {
        match self {
            AccessScope::All => true,
            AccessScope::OwnRecords(id) => id == patient_id,
            AccessScope::AssignedRecords(id) => provider_id == Some(id),
            AccessScope::Nothing => false,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, AccessScope::Nothing)
    }

    /// PostgREST filter fragments restricting a listing to this scope.
    /// Empty for `All`; callers must short-circuit `Nothing` themselves.
    pub fn query_filters(&self, patient_column: &str, provider_column: &str) -> Vec<String> {
        match self {
            AccessScope::OwnRecords(id) => vec![format!("{}=eq.{}", patient_column, id)],
            AccessScope::AssignedRecords(id) => vec![format!("{}=eq.{}", provider_column, id)],
            AccessScope::All | AccessScope::Nothing => Vec::new(),
        }
    }
}
