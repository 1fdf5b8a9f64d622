//! Unique test data, so concurrently running tests never share a client key
//! or an account.

use ulid::Ulid;

/// `{prefix}-{ulid}`
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// `{prefix}-{ulid}@example.test`, lowercased the way the gateway normalizes
/// emails.
///
/// ```
/// use gateway_test_support::unique_helpers::unique_email;
///
/// let email = unique_email("buyer");
/// assert!(email.starts_with("buyer-"));
/// assert!(email.ends_with("@example.test"));
/// assert_eq!(email, email.to_lowercase());
/// ```
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.test", prefix, Ulid::new()).to_lowercase()
}

/// A documentation-range IPv4 address unique enough to isolate rate-limit
/// counters between tests.
pub fn unique_client_ip() -> String {
    let id = Ulid::new().random();
    format!(
        "198.51.{}.{}",
        (id >> 8) as u8,
        (id as u8).max(1)
    )
}
