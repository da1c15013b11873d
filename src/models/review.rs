use serde::Serialize;
use chrono::{DateTime, Utc};

pub const MAX_HEADER_LEN: usize = 50;
pub const MAX_COMMENT_LEN: usize = 250;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub header: String,
    pub comment: String,
    pub rating: i32,
    #[serde(rename = "shop")]
    pub shop_id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub header: String,
    pub comment: String,
    pub rating: i32,
    pub shop_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListing {
    pub id: i64,
    pub header: String,
    pub comment: String,
    pub rating: i32,
    pub shop: i64,
    pub user: ReviewAuthor,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewAuthor {
    pub id: i64,
    pub name: String,
}

/// Collects header/comment/rating violations.
pub fn validate_review(header: &str, comment: &str, rating: i32) -> Vec<String> {
    let mut errors = Vec::new();
    if header.trim().is_empty() {
        errors.push("Please add a header".to_string());
    } else if header.chars().count() > MAX_HEADER_LEN {
        errors.push(format!("Header can not be more than {MAX_HEADER_LEN} characters"));
    }
    if comment.trim().is_empty() {
        errors.push("Please add a comment".to_string());
    } else if comment.chars().count() > MAX_COMMENT_LEN {
        errors.push(format!("Comment can not be more than {MAX_COMMENT_LEN} characters"));
    }
    if rating < 1 {
        errors.push("Rating must be at least 1".to_string());
    } else if rating > 5 {
        errors.push("Rating must not be more than 5".to_string());
    }
    errors
}

/// Mean rating rounded to one decimal place; zero when there are no reviews.
pub fn average_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
    let mean = sum as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_rounds_to_one_decimal() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[5]), 5.0);
        assert_eq!(average_rating(&[4, 5, 5]), 4.7);
        assert_eq!(average_rating(&[1, 2]), 1.5);
        assert_eq!(average_rating(&[3, 3, 4]), 3.3);
    }

    #[test]
    fn review_rules_are_collected() {
        let long = "x".repeat(MAX_HEADER_LEN + 1);
        let errors = validate_review(&long, "", 9);
        assert_eq!(errors.len(), 3);
        assert!(validate_review("Nice", "Great massage", 5).is_empty());
    }
}
