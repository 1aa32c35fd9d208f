pub mod assistant_llm;
pub mod poses;
pub mod secrets;

pub use assistant_llm::OpenAiAssistantAdapter;
pub use poses::FsPoseCatalog;
pub use secrets::{FileSecretStore, API_KEY_SECRET};
