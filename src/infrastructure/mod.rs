pub mod log_redact;
pub mod logging;
pub mod secure_storage;
