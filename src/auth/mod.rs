//! Authentication: token lifecycle, password hashing and the request gate

pub mod clock;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use clock::{Clock, ManualClock, SystemClock};
pub use jwt::{Claims, JwtService, TokenKind, TokenPair};
pub use middleware::{extract_token, jwt_auth_middleware, AuthContext};
pub use password::PasswordHasher;
