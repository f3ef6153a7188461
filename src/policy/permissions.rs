use crate::models::{Housing, User};

/// Staff can touch anything; everyone else only what they own.
pub fn is_owner_or_admin(user: &User, owner_id: &str) -> bool {
    user.is_staff || user.id == owner_id
}

/// Visible housings are readable by anyone; hidden ones only by owner and staff.
pub fn can_read_housing(user: Option<&User>, housing: &Housing) -> bool {
    housing.is_visible || user.is_some_and(|u| is_owner_or_admin(u, &housing.owner_id))
}
