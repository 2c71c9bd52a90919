pub mod request_id;
pub mod verification_key;

pub use request_id::request_id_middleware;
pub use verification_key::{verification_key_middleware, VerificationKeys, VERIFY_HEADER};
