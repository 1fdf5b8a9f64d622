use std::time::{Duration, SystemTime};

use gateway::auth::{issue_token, issue_token_with_ttl, Role, Subject};

use super::test_state::Upstreams;

pub fn subject(id: &str, role: Role) -> Subject {
    Subject {
        id: id.to_string(),
        email: format!("{id}@example.test"),
        name: format!("User {id}"),
        role,
    }
}

pub fn token_for(id: &str, role: Role) -> String {
    issue_token(&subject(id, role), SystemTime::now(), &Upstreams::security())
        .expect("token should issue")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Signed correctly but already past its expiry.
pub fn expired_token(id: &str) -> String {
    let issued = SystemTime::now() - Duration::from_secs(3600);
    issue_token_with_ttl(
        &subject(id, Role::User),
        Duration::from_secs(60),
        issued,
        &Upstreams::security(),
    )
    .expect("token should issue")
}
