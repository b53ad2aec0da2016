pub mod config_service;
pub mod credential_source;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::credential_source::{CredentialSource, EnvCredentials, StaticCredentials};
pub use crate::paths::DeskbookPaths;
