pub mod claims;
pub mod jwt;

pub use claims::{IdentityClaim, Role, Subject};
pub use jwt::{issue_token, issue_token_with_ttl, verify_token, verify_token_at, TokenError};
