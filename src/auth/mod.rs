//! Authentication
//!
//! Handles:
//! - Password hashing
//! - Access/refresh token issuing and verification
//! - The authenticated-user extractor

mod middleware;
pub mod password;
pub mod token;

pub use middleware::{ACCESS_TOKEN_COOKIE, CurrentUser, REFRESH_TOKEN_COOKIE};
pub use password::{hash_password, verify_password};
pub use token::{TokenKind, TokenPair, hash_token, verify_token};
