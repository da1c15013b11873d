use std::sync::Arc;

use crate::auth::jwt::sign_token;
use crate::auth::password::{hash_password, verify_password};
use crate::config::Config;
use crate::dtos::user::{LoginRequest, RegisterUserRequest};
use crate::error::AppError;
use crate::models::user::{is_valid_email, is_valid_tel, NewUser, Role, User};
use crate::store::Store;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    config: Arc<Config>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    /// Creates the account and returns it with a fresh token.
    pub async fn register(&self, req: RegisterUserRequest) -> Result<(User, String), AppError> {
        let name = req.name.trim().to_string();
        let email = req.email.trim().to_lowercase();
        let tel = req.tel.trim().to_string();

        let mut errors = Vec::new();
        if name.is_empty() {
            errors.push("Please add a name".to_string());
        }
        if email.is_empty() {
            errors.push("Please add an email".to_string());
        } else if !is_valid_email(&email) {
            errors.push("Please add a valid email".to_string());
        }
        if req.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(format!("Password must be at least {MIN_PASSWORD_LEN} characters"));
        }
        if tel.is_empty() {
            errors.push("Please add a telephone number".to_string());
        } else if !is_valid_tel(&tel) {
            errors.push("Invalid phone number format".to_string());
        }
        let role = match req.role.as_deref() {
            None | Some("") => Role::default(),
            Some(raw) => match raw.parse::<Role>() {
                Ok(role) => role,
                Err(msg) => {
                    errors.push(msg);
                    Role::default()
                }
            },
        };
        AppError::check(errors)?;

        let password_hash = hash_password(&req.password, self.config.bcrypt_cost)?;
        let user = self
            .store
            .insert_user(NewUser { name, email, tel, role, password_hash })
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, "User registered");
        let token = self.token_for(&user)?;
        Ok((user, token))
    }

    pub async fn login(&self, req: LoginRequest) -> Result<(User, String), AppError> {
        let email = req.email.trim().to_lowercase();
        if email.is_empty() || req.password.is_empty() {
            return Err(AppError::invalid_argument("Please provide an email and password"));
        }

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

        if !verify_password(&req.password, &user.password_hash)? {
            tracing::debug!(user_id = user.id, "Password mismatch");
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let token = self.token_for(&user)?;
        Ok((user, token))
    }

    pub async fn me(&self, user_id: i64) -> Result<User, AppError> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User not found with id of {user_id}")))
    }

    pub fn cookie_max_age_secs(&self) -> i64 {
        self.config.jwt_cookie_expire_days * 24 * 60 * 60
    }

    pub fn secure_cookies(&self) -> bool {
        self.config.production
    }

    fn token_for(&self, user: &User) -> Result<String, AppError> {
        sign_token(user.id, &self.config.jwt_secret, self.config.jwt_expire_hours)
    }
}
