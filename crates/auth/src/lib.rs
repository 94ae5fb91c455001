// Core modules
mod error;
mod password;
mod jwt;
mod authorize;

pub mod model;
pub mod store;
pub mod service;

// Re-export error types
pub use error::{AuthError, Result};

// Re-export crypto primitives (for standalone use without a store)
pub use password::{hash_password, verify_password, HashCost, MAX_PASSWORD_LENGTH};
pub use jwt::{generate_token, validate_token, Claims, TokenIssuer, TOKEN_ALGORITHM};
pub use authorize::{is_privileged, require_privileged};

pub use model::{NewUser, Role, User, UserChanges};
pub use store::{DeleteOutcome, StoreError, UpdateOutcome, UserStore};
pub use service::{NewAccount, SessionService, UserUpdate};
