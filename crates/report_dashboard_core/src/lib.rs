pub mod activity;
pub mod domain;
pub mod notify;
pub mod persistence;
pub mod ports;
pub mod reorder;
pub mod search;
pub mod seed;
pub mod session;
pub mod store;

pub use activity::ActivityLog;
pub use domain::{Activity, ActivityType, Draft, NewReport, Report, Severity, ThemeMode, User, UserRole};
pub use persistence::{InMemoryStorage, LocalPersistence, PersistenceError, StorageKeys};
pub use ports::{
    ChatCompletionService, DraftGenerationService, KeyValueStorage, Notifier, PortError, PortResult,
    SummarizationService,
};
pub use search::{debounce_lines, filter_reports, Debouncer};
pub use session::{ThemePreference, UserSession};
pub use store::{ReportStore, StoreError, StoreEvent, StoreResult};
