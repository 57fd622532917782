pub mod environment;
pub mod openai;
pub mod profile;
pub mod reply;
