pub mod archive;
pub mod environment;
pub mod mailer;
pub mod passwords;
pub mod personalizer;
pub mod prompt_store;
pub mod vision;
