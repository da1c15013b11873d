use serde::{Deserialize, Serialize};

use crate::models::user::{Role, User};

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub tel: String,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl TokenResponse {
    pub fn new(token: String, user: &User) -> Self {
        Self {
            token,
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
