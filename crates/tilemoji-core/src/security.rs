use crate::domain::UserId;

// ============== Authorization ==============

/// An empty allowlist admits everyone; otherwise the sender must be listed.
/// Updates without a sender are only admitted when the list is empty.
pub fn is_authorized(user_id: Option<UserId>, allowed_users: &[u64]) -> bool {
    if allowed_users.is_empty() {
        return true;
    }
    let Some(user_id) = user_id else {
        return false;
    };
    allowed_users.contains(&user_id.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_bot_admits_everyone() {
        assert!(is_authorized(Some(UserId(7)), &[]));
        assert!(is_authorized(None, &[]));
    }

    #[test]
    fn allowlist_is_enforced() {
        let allowed = [1, 2];
        assert!(is_authorized(Some(UserId(2)), &allowed));
        assert!(!is_authorized(Some(UserId(3)), &allowed));
        assert!(!is_authorized(None, &allowed));
    }
}
