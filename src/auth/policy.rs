//! Role and ownership checks shared by every service.
use crate::models::user::Role;

/// The single capability rule: admins may act on anything, everyone else
/// only on what they own.
pub fn allowed(role: Role, owner_id: i64, caller_id: i64) -> bool {
    role == Role::Admin || owner_id == caller_id
}

pub fn has_role(role: Role, accepted: &[Role]) -> bool {
    accepted.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_may_act_on_anything() {
        assert!(allowed(Role::Admin, 1, 2));
    }

    #[test]
    fn others_only_on_their_own() {
        assert!(allowed(Role::ShopOwner, 7, 7));
        assert!(!allowed(Role::ShopOwner, 7, 8));
        assert!(!allowed(Role::User, 7, 8));
    }

    #[test]
    fn role_membership() {
        assert!(has_role(Role::User, &[Role::User, Role::Admin]));
        assert!(!has_role(Role::ShopOwner, &[Role::User, Role::Admin]));
    }
}
