//! Authentication orchestration.
//!
//! [`AuthService`] drives registration, OTP confirmation, login, refresh
//! rotation and session revocation on top of the token codec, the session
//! whitelist, the OTP store and the user repository.

pub mod models;
mod service;

pub use models::{
    LoginRequest, LoginResponse, Principal, Profile, RegisterRequest, RegisterResponse,
    SendVerifyResponse, SessionView,
};
pub use service::AuthService;
