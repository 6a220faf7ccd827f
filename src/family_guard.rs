//! Navigation guard for the app shell.
//!
//! The caller gathers session state (auth status, family memberships, the
//! active-family cookie and, once known, the child count) and asks
//! [`decide`] what to do next. The caller performs the redirect, cookie
//! mutation or child-count fetch and calls [`decide`] again whenever any
//! of those inputs change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Snapshot of everything the guard looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardInput {
    pub is_authenticated: bool,
    #[serde(default)]
    pub memberships: BTreeSet<String>,
    #[serde(default)]
    pub active_family_id: Option<String>,
    /// `None` until the child count for the active family has been fetched.
    #[serde(default)]
    pub child_count: Option<u32>,
}

impl GuardInput {
    /// The cookie value, ignoring empty or whitespace-only values.
    fn active_family(&self) -> Option<&str> {
        self.active_family_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

/// Paths the guard redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRoutes {
    pub sign_in: String,
    pub family_onboarding: String,
    pub select_family: String,
    pub child_onboarding: String,
}

impl Default for GuardRoutes {
    fn default() -> Self {
        Self {
            sign_in: "/sign-in".to_string(),
            family_onboarding: "/onboarding/family".to_string(),
            select_family: "/select-family".to_string(),
            child_onboarding: "/onboarding/child".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    Redirect { path: String },
    AutoSelect { family_id: String },
    ClearCookieAndRedirect { path: String },
    /// Fetch the child count for `family_id` and decide again.
    NeedsChildCheck { family_id: String },
}

/// Decide the next navigation action. The first matching rule wins.
pub fn decide(input: &GuardInput, routes: &GuardRoutes) -> GuardDecision {
    let decision = if !input.is_authenticated {
        GuardDecision::Redirect {
            path: routes.sign_in.clone(),
        }
    } else if input.memberships.is_empty() {
        GuardDecision::Redirect {
            path: routes.family_onboarding.clone(),
        }
    } else {
        match input.active_family() {
            // A stale cookie is cleared without auto-selecting, even when a
            // single membership is left. The next pass handles selection.
            Some(active) if !input.memberships.contains(active) => {
                GuardDecision::ClearCookieAndRedirect {
                    path: routes.select_family.clone(),
                }
            }
            Some(active) => match input.child_count {
                None => GuardDecision::NeedsChildCheck {
                    family_id: active.to_string(),
                },
                Some(0) => GuardDecision::Redirect {
                    path: routes.child_onboarding.clone(),
                },
                Some(_) => GuardDecision::Allow,
            },
            None => {
                let mut ids = input.memberships.iter();
                match (ids.next(), ids.next()) {
                    (Some(only), None) => GuardDecision::AutoSelect {
                        family_id: only.clone(),
                    },
                    _ => GuardDecision::Redirect {
                        path: routes.select_family.clone(),
                    },
                }
            }
        }
    };

    debug!(?decision, "family guard decision");
    decision
}

pub fn decide_with_default_routes(input: &GuardInput) -> GuardDecision {
    decide(input, &GuardRoutes::default())
}
