pub mod draft;
pub mod http_client;
pub mod local_storage;
pub mod summarizer_llm;

pub use draft::PlaceholderDraftAdapter;
pub use http_client::DashboardApiClient;
pub use local_storage::FileStorage;
pub use summarizer_llm::OpenAiSummarizerAdapter;
