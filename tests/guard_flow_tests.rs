use havi::family_guard::{
    decide_with_default_routes, GuardDecision, GuardInput,
};
use havi::test_utils::init_test_logging;
use pretty_assertions::assert_eq;
use tracing::info;

/// Apply a decision the way the page routing does and return the next
/// snapshot. Redirects and `Allow` end the cycle.
fn apply(
    state: &GuardInput,
    decision: &GuardDecision,
    child_counts: &dyn Fn(&str) -> u32,
) -> Option<GuardInput> {
    let mut next = state.clone();
    match decision {
        GuardDecision::AutoSelect { family_id } => {
            next.active_family_id = Some(family_id.clone());
            next.child_count = None;
        }
        GuardDecision::NeedsChildCheck { family_id } => {
            next.child_count = Some(child_counts(family_id));
        }
        GuardDecision::ClearCookieAndRedirect { .. } => {
            next.active_family_id = None;
            next.child_count = None;
        }
        GuardDecision::Allow | GuardDecision::Redirect { .. } => return None,
    }
    Some(next)
}

fn run_cycle(
    mut state: GuardInput,
    child_counts: &dyn Fn(&str) -> u32,
) -> Vec<GuardDecision> {
    let mut decisions = Vec::new();
    loop {
        let decision = decide_with_default_routes(&state);
        info!(?decision, "guard step");
        decisions.push(decision.clone());
        match apply(&state, &decision, child_counts) {
            // The select-family page is a stopping point for the user even
            // though the cookie was cleared.
            Some(_)
                if matches!(
                    decision,
                    GuardDecision::ClearCookieAndRedirect { .. }
                ) =>
            {
                return decisions
            }
            Some(next) => state = next,
            None => return decisions,
        }
    }
}

fn signed_in(memberships: &[&str], active: Option<&str>) -> GuardInput {
    GuardInput {
        is_authenticated: true,
        memberships: memberships.iter().map(|m| m.to_string()).collect(),
        active_family_id: active.map(str::to_string),
        child_count: None,
    }
}

#[test]
fn test_single_family_user_reaches_app() {
    init_test_logging();
    let decisions = run_cycle(signed_in(&["family-1"], None), &|_: &str| 2);
    assert_eq!(
        decisions,
        vec![
            GuardDecision::AutoSelect {
                family_id: "family-1".to_string()
            },
            GuardDecision::NeedsChildCheck {
                family_id: "family-1".to_string()
            },
            GuardDecision::Allow,
        ]
    );
}

#[test]
fn test_new_family_is_sent_to_child_onboarding() {
    init_test_logging();
    let decisions = run_cycle(signed_in(&["family-1"], Some("family-1")), &|_: &str| 0);
    assert_eq!(
        decisions.last(),
        Some(&GuardDecision::Redirect {
            path: "/onboarding/child".to_string()
        })
    );
}

#[test]
fn test_stale_cookie_takes_two_passes() {
    init_test_logging();
    let state = signed_in(&["family-1"], Some("family-gone"));
    let first = decide_with_default_routes(&state);
    assert_eq!(
        first,
        GuardDecision::ClearCookieAndRedirect {
            path: "/select-family".to_string()
        }
    );

    // Once the cookie is gone the next pass picks the remaining family
    let cleared = apply(&state, &first, &|_: &str| 1).unwrap();
    assert_eq!(cleared.active_family_id, None);
    assert_eq!(
        decide_with_default_routes(&cleared),
        GuardDecision::AutoSelect {
            family_id: "family-1".to_string()
        }
    );
}

#[test]
fn test_signed_out_ignores_everything_else() {
    init_test_logging();
    let mut state = signed_in(&["family-1", "family-2"], Some("family-2"));
    state.is_authenticated = false;
    state.child_count = Some(4);
    assert_eq!(
        run_cycle(state, &|_: &str| 4),
        vec![GuardDecision::Redirect {
            path: "/sign-in".to_string()
        }]
    );
}
