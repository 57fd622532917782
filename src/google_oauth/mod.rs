pub mod credentials;
mod endpoints;
pub mod service;

pub use credentials::GoogleCredential;
pub use service::GoogleTokenSource;
