//! Client-side authorization policy.
//!
//! These functions decide which controls are *offered*. They are pure and are
//! re-evaluated at every decision point; the server still enforces its own
//! rules.

use crate::model::{Identity, RoomContext, UserId};
use serde::Serialize;

/// A signed-in user may toggle the lock when nobody holds it or they do.
#[must_use]
pub fn can_toggle_lock(user: Option<&Identity>, lock_holder: Option<&UserId>) -> bool {
    match user {
        Some(user) => lock_holder.is_none() || user.is(lock_holder),
        None => false,
    }
}

/// A signed-in user may toggle permanence when the room has no owner or they
/// own it.
#[must_use]
pub fn can_toggle_permanence(user: Option<&Identity>, owner: Option<&UserId>) -> bool {
    match user {
        Some(user) => owner.is_none() || user.is(owner),
        None => false,
    }
}

/// The signed-in user owns the room. Gates the whole admin section.
#[must_use]
pub fn is_admin(user: Option<&Identity>, owner: Option<&UserId>) -> bool {
    user.is_some_and(|user| user.is(owner))
}

/// Custom room URLs are a subscriber feature on top of ownership.
#[must_use]
pub fn can_set_vanity(is_admin: bool, is_subscriber: bool) -> bool {
    is_admin && is_subscriber
}

/// The title color picker is subscriber-only; title and description are not.
#[must_use]
pub fn can_set_title_color(is_admin: bool, is_subscriber: bool) -> bool {
    is_admin && is_subscriber
}

#[must_use]
pub fn can_clear_chat(is_admin: bool) -> bool {
    is_admin
}

/// Enablement of every settings control for one [`RoomContext`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlState {
    /// No user is signed in; the shell shows a sign-in notice.
    pub sign_in_required: bool,
    pub lock_enabled: bool,
    pub permanence_enabled: bool,
    /// Admin section (password, chat, title, save) is visible.
    pub admin_visible: bool,
    pub vanity_enabled: bool,
    pub title_color_enabled: bool,
    pub clear_chat_enabled: bool,
}

impl ControlState {
    #[must_use]
    pub fn evaluate(ctx: &RoomContext) -> Self {
        let user = ctx.user.as_ref();
        let admin = is_admin(user, ctx.settings.owner.as_ref());
        Self {
            sign_in_required: user.is_none(),
            lock_enabled: can_toggle_lock(user, ctx.settings.lock_holder.as_ref()),
            permanence_enabled: can_toggle_permanence(user, ctx.settings.owner.as_ref()),
            admin_visible: admin,
            vanity_enabled: can_set_vanity(admin, ctx.is_subscriber),
            title_color_enabled: can_set_title_color(admin, ctx.is_subscriber),
            clear_chat_enabled: can_clear_chat(admin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoomSettings;

    fn uid(raw: &str) -> UserId {
        UserId::from(raw)
    }

    #[test]
    fn lock_requires_sign_in() {
        assert!(!can_toggle_lock(None, None));
        assert!(!can_toggle_lock(None, Some(&uid("u1"))));
    }

    #[test]
    fn lock_open_or_own() {
        let me = Identity::new("u1");
        assert!(can_toggle_lock(Some(&me), None));
        assert!(can_toggle_lock(Some(&me), Some(&uid("u1"))));
        assert!(!can_toggle_lock(Some(&me), Some(&uid("u2"))));
    }

    #[test]
    fn permanence_open_or_own() {
        let me = Identity::new("u1");
        assert!(!can_toggle_permanence(None, None));
        assert!(can_toggle_permanence(Some(&me), None));
        assert!(can_toggle_permanence(Some(&me), Some(&uid("u1"))));
        assert!(!can_toggle_permanence(Some(&me), Some(&uid("u2"))));
    }

    #[test]
    fn admin_requires_user_and_matching_owner() {
        let me = Identity::new("u1");
        assert!(!is_admin(None, Some(&uid("u1"))));
        assert!(!is_admin(Some(&me), None));
        assert!(!is_admin(Some(&me), Some(&uid("u2"))));
        assert!(is_admin(Some(&me), Some(&uid("u1"))));
    }

    #[test]
    fn vanity_needs_admin_and_subscription() {
        assert!(can_set_vanity(true, true));
        assert!(!can_set_vanity(true, false));
        assert!(!can_set_vanity(false, true));
        assert!(!can_set_vanity(false, false));
    }

    #[test]
    fn signed_out_context_disables_everything() {
        let ctx = RoomContext {
            settings: RoomSettings {
                owner: Some(uid("u1")),
                ..Default::default()
            },
            user: None,
            is_subscriber: true,
        };
        let controls = ControlState::evaluate(&ctx);
        assert!(controls.sign_in_required);
        assert!(!controls.lock_enabled);
        assert!(!controls.permanence_enabled);
        assert!(!controls.admin_visible);
        assert!(!controls.vanity_enabled);
    }

    #[test]
    fn owner_without_subscription_gets_admin_but_not_vanity() {
        let ctx = RoomContext {
            settings: RoomSettings {
                owner: Some(uid("u1")),
                lock_holder: Some(uid("u2")),
                ..Default::default()
            },
            user: Some(Identity::new("u1")),
            is_subscriber: false,
        };
        let controls = ControlState::evaluate(&ctx);
        assert!(controls.admin_visible);
        assert!(controls.clear_chat_enabled);
        assert!(controls.permanence_enabled);
        assert!(!controls.lock_enabled);
        assert!(!controls.vanity_enabled);
        assert!(!controls.title_color_enabled);
    }
}
