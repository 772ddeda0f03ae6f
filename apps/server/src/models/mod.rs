//! Domain models for the Sketchy server.

pub mod site;
pub mod user;

// Re-export commonly used types
pub use site::{
    GenerateRequest, GeneratedSite, NewSite, SaveSiteFailure, SaveSiteRequest, SaveSiteResponse,
    SiteCode, SiteValidationError,
};
pub use user::{
    GitHubEmail, GitHubUserInfo, LoginRequest, LoginResponse, MessageResponse,
    ResendVerificationRequest, SessionUser, SignupRequest, SignupResponse, User, UserResponse,
    VerifyEmailQuery,
};
