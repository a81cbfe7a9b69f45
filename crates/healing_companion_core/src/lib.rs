pub mod domain;
pub mod ports;
pub mod prompt;
pub mod report;

pub use domain::{
    ChildArchive, Course, Game, GeneratedReport, JournalEntry, Media, MediaKind, NewJournalEntry,
    NewMedia, NewReport, ReportCategory, User, UserCredentials,
};
pub use ports::{
    ArchiveStore, CatalogStore, GenerationError, JournalStore, PortError, PortResult,
    ReportGenerator, ReportStore, UserStore,
};
pub use prompt::build_prompt;
pub use report::{ReportError, ReportService};
