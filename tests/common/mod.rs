#![allow(dead_code)]

use std::net::IpAddr;
use std::sync::Arc;

use serde_json::{json, Value};
use shopq_backend::config::Config;
use shopq_backend::middleware::auth::AuthContext;
use shopq_backend::models::user::{NewUser, Role};
use shopq_backend::state::AppState;
use shopq_backend::store::{MemoryStore, Store};

pub fn test_config() -> Config {
    Config {
        database_url: "memory".into(),
        jwt_secret: "test-secret".into(),
        jwt_expire_hours: 1,
        jwt_cookie_expire_days: 1,
        production: false,
        host: IpAddr::from([127, 0, 0, 1]),
        port: 0,
        max_reservations: 3,
        bcrypt_cost: 4,
    }
}

pub fn test_state() -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), test_config())
}

/// Inserts a user straight into the store and returns the caller identity
/// the auth middleware would build for them.
pub async fn seed_user(store: &Arc<dyn Store>, name: &str, tel: &str, role: Role) -> AuthContext {
    let user = store
        .insert_user(NewUser {
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            tel: tel.into(),
            role,
            password_hash: "not-a-real-hash".into(),
        })
        .await
        .expect("seed user");
    AuthContext { user_id: user.id, role: user.role, name: user.name }
}

pub struct Cast {
    pub admin: AuthContext,
    pub owner: AuthContext,
    pub other_owner: AuthContext,
    pub customer: AuthContext,
}

pub async fn seed_cast(store: &Arc<dyn Store>) -> Cast {
    Cast {
        admin: seed_user(store, "Admin", "0800000001", Role::Admin).await,
        owner: seed_user(store, "Owner", "0800000002", Role::ShopOwner).await,
        other_owner: seed_user(store, "Rival", "0800000003", Role::ShopOwner).await,
        customer: seed_user(store, "Customer", "0800000004", Role::User).await,
    }
}

pub fn shop_body(name: &str, tel: &str) -> Value {
    json!({
        "name": name,
        "tel": tel,
        "openTime": "09:00",
        "closeTime": "18:00",
        "picture": ["p1"],
    })
}
