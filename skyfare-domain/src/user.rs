use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub gender: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, gender: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            gender,
            role,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::ADMIN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    CUSTOMER,
    ADMIN,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::CUSTOMER => "CUSTOMER",
            Role::ADMIN => "ADMIN",
        }
    }

    /// Parses the uppercase wire form used in tokens and stored rows.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "CUSTOMER" => Some(Role::CUSTOMER),
            "ADMIN" => Some(Role::ADMIN),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
