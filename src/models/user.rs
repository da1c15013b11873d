use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    #[default]
    User,
    ShopOwner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::ShopOwner => "shopOwner",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "shopOwner" => Ok(Role::ShopOwner),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub tel: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields the store needs to create a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub tel: String,
    pub role: Role,
    pub password_hash: String,
}

/// Checks the `dd[d]-?ddd-?dddd` phone format shared by users and shops.
pub fn is_valid_tel(tel: &str) -> bool {
    let parts: Vec<&str> = tel.split('-').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return false;
    }
    let digits: String = parts.concat();
    if !(9..=10).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    // a dash may only sit before the last 4 or the last 7 digits
    let mut remaining = digits.len();
    for part in &parts[..parts.len() - 1] {
        remaining -= part.len();
        if remaining != 4 && remaining != 7 {
            return false;
        }
    }
    true
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || local.chars().any(|c| c.is_whitespace() || "<>()[]\\,;:@\"".contains(c)) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|l| !l.is_empty() && l.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        && labels.last().is_some_and(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tel_accepts_plain_and_dashed_forms() {
        assert!(is_valid_tel("0211122222"));
        assert!(is_valid_tel("021-112-2222"));
        assert!(is_valid_tel("021112-2222"));
        assert!(is_valid_tel("02-111-2222"));
        assert!(!is_valid_tel("0-2111-2222"));
        assert!(!is_valid_tel("12345678"));
        assert!(!is_valid_tel("021-112-222x"));
        assert!(!is_valid_tel("021--1122222"));
    }

    #[test]
    fn email_needs_domain_with_tld() {
        assert!(is_valid_email("owner@shop.co.th"));
        assert!(!is_valid_email("owner@localhost"));
        assert!(!is_valid_email("owner shop@mail.com"));
        assert!(!is_valid_email("@mail.com"));
    }

    #[test]
    fn role_round_trips_through_str() {
        assert_eq!("shopOwner".parse::<Role>().unwrap(), Role::ShopOwner);
        assert_eq!(Role::Admin.to_string(), "admin");
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn accounts_default_to_customer_role() {
        assert_eq!(Role::default(), Role::User);
    }
}
