pub mod extractor;
pub mod password;
pub mod token;

pub use extractor::{is_owner_or_admin, require_admin, require_staff, AuthUser};
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenKeys, TokenPair, TokenType};
