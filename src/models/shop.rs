use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveTime, Utc};

use crate::models::user::is_valid_tel;

pub const MAX_PICTURES: usize = 5;
pub const MAX_NAME_LEN: usize = 50;
pub const MAX_POSTALCODE_LEN: usize = 5;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    pub postalcode: Option<String>,
    pub tel: String,
    pub region: Option<String>,
    pub open_time: String,
    pub close_time: String,
    pub picture: Vec<String>,
    pub services: Vec<String>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub num_of_reviews: i64,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
}

impl Shop {
    pub fn draft(&self) -> ShopDraft {
        ShopDraft {
            name: self.name.clone(),
            address: self.address.clone(),
            district: self.district.clone(),
            province: self.province.clone(),
            postalcode: self.postalcode.clone(),
            tel: self.tel.clone(),
            region: self.region.clone(),
            open_time: self.open_time.clone(),
            close_time: self.close_time.clone(),
            picture: self.picture.clone(),
            services: self.services.clone(),
            description: self.description.clone(),
        }
    }

    /// Copies the editable attributes of `draft` over this shop.
    pub fn apply(&mut self, draft: ShopDraft) {
        self.name = draft.name;
        self.address = draft.address;
        self.district = draft.district;
        self.province = draft.province;
        self.postalcode = draft.postalcode;
        self.tel = draft.tel;
        self.region = draft.region;
        self.open_time = draft.open_time;
        self.close_time = draft.close_time;
        self.picture = draft.picture;
        self.services = draft.services;
        self.description = draft.description;
    }

    pub fn hours(&self) -> Option<OpeningHours> {
        OpeningHours::parse(&self.open_time, &self.close_time)
    }
}

/// Shop attributes as submitted in a request, before any shop exists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub postalcode: Option<String>,
    #[serde(default)]
    pub tel: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub open_time: String,
    #[serde(default)]
    pub close_time: String,
    #[serde(default)]
    pub picture: Vec<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default, rename = "desc")]
    pub description: Option<String>,
}

impl ShopDraft {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.tel = self.tel.trim().to_string();
        self
    }

    /// Collects every violated shop rule; an empty list means the draft is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Please add a name".to_string());
        } else if self.name.trim().chars().count() > MAX_NAME_LEN {
            errors.push(format!("Name can not be more than {MAX_NAME_LEN} characters"));
        }

        if self.tel.is_empty() {
            errors.push("Please add a phone number".to_string());
        } else if !is_valid_tel(&self.tel) {
            errors.push("Invalid phone number format".to_string());
        }

        if let Some(code) = &self.postalcode {
            if code.chars().count() > MAX_POSTALCODE_LEN {
                errors.push(format!("Postal Code can not be more than {MAX_POSTALCODE_LEN} digits"));
            }
        }

        for (label, value) in [("open", &self.open_time), ("close", &self.close_time)] {
            if value.is_empty() {
                errors.push(format!("Please add an {label} time"));
            } else if parse_clock(value).is_none() {
                errors.push(format!("Please add a valid {label} time in HH:MM format"));
            }
        }

        if self.picture.len() > MAX_PICTURES {
            errors.push(format!("You can upload up to {MAX_PICTURES} pictures only"));
        }

        errors
    }

    pub fn merge(&mut self, patch: ShopDraftPatch) {
        if let Some(v) = patch.name {
            self.name = v;
        }
        if let Some(v) = patch.address {
            self.address = Some(v);
        }
        if let Some(v) = patch.district {
            self.district = Some(v);
        }
        if let Some(v) = patch.province {
            self.province = Some(v);
        }
        if let Some(v) = patch.postalcode {
            self.postalcode = Some(v);
        }
        if let Some(v) = patch.tel {
            self.tel = v;
        }
        if let Some(v) = patch.region {
            self.region = Some(v);
        }
        if let Some(v) = patch.open_time {
            self.open_time = v;
        }
        if let Some(v) = patch.close_time {
            self.close_time = v;
        }
        if let Some(v) = patch.picture {
            self.picture = v;
        }
        if let Some(v) = patch.services {
            self.services = v;
        }
        if let Some(v) = patch.description {
            self.description = Some(v);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDraftPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
    pub postalcode: Option<String>,
    pub tel: Option<String>,
    pub region: Option<String>,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub picture: Option<Vec<String>>,
    pub services: Option<Vec<String>>,
    #[serde(rename = "desc")]
    pub description: Option<String>,
}

/// Parses a strict 24h `HH:MM` clock value.
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    if value.len() != 5 || value.as_bytes()[2] != b':' {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// A daily opening window; `open > close` means the window wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl OpeningHours {
    pub fn parse(open: &str, close: &str) -> Option<Self> {
        Some(Self { open: parse_clock(open)?, close: parse_clock(close)? })
    }

    /// Both ends are inclusive.
    pub fn contains(&self, at: NaiveTime) -> bool {
        if self.open <= self.close {
            self.open <= at && at <= self.close
        } else {
            at >= self.open || at <= self.close
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn daytime_window_is_inclusive() {
        let hours = OpeningHours::parse("09:00", "18:00").unwrap();
        assert!(hours.contains(at(9, 0)));
        assert!(hours.contains(at(18, 0)));
        assert!(!hours.contains(at(18, 1)));
        assert!(!hours.contains(at(8, 59)));
    }

    #[test]
    fn overnight_window_wraps_past_midnight() {
        let hours = OpeningHours::parse("22:00", "06:00").unwrap();
        assert!(hours.contains(at(23, 30)));
        assert!(hours.contains(at(2, 0)));
        assert!(hours.contains(at(0, 0)));
        assert!(!hours.contains(at(12, 0)));
        assert!(!hours.contains(at(21, 59)));
    }

    #[test]
    fn clock_requires_two_digit_fields() {
        assert!(parse_clock("09:30").is_some());
        assert!(parse_clock("9:30").is_none());
        assert!(parse_clock("24:00").is_none());
        assert!(parse_clock("12:60").is_none());
        assert!(parse_clock("0930").is_none());
    }

    #[test]
    fn validate_reports_every_violation() {
        let draft = ShopDraft {
            name: String::new(),
            tel: "12".into(),
            open_time: "9am".into(),
            close_time: String::new(),
            picture: vec!["p".into(); 6],
            postalcode: Some("123456".into()),
            ..Default::default()
        };
        let errors = draft.validate();
        assert_eq!(errors.len(), 6, "{errors:?}");
        assert!(errors.contains(&"You can upload up to 5 pictures only".to_string()));
        assert!(errors.contains(&"Invalid phone number format".to_string()));
    }

    #[test]
    fn overnight_hours_are_a_valid_draft() {
        let draft = ShopDraft {
            name: "Night Spa".into(),
            tel: "021-112-2222".into(),
            open_time: "22:00".into(),
            close_time: "06:00".into(),
            ..Default::default()
        };
        assert!(draft.validate().is_empty());
    }
}
