/// Authentication module
///
/// Password hashing, access/refresh token issuance, the refresh session
/// lifecycle and the auth service built on top of them.

mod claims;
mod extractor;
mod jwt;
mod password;
mod refresh_token;
mod service;
mod session;

pub use claims::Claims;
pub use extractor::AuthenticatedUser;
pub use jwt::{JwtTokenManager, TokenError, TokenManager, TokenPair};
pub use password::{BcryptHasher, HashError, PasswordHasher};
pub use refresh_token::{generate_refresh_token, hash_token};
pub use service::{AuthError, AuthService, LogoutOutcome, SignInInput, SignUpInput};
pub use session::{SessionError, SessionManager, Tokens};
