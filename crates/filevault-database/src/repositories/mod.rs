//! Repository implementations, one per aggregate.

pub mod audit;
pub mod file;
pub mod folder;
pub mod mark;
pub mod share;
pub mod user;

pub use audit::AuditRepository;
pub use file::FileRepository;
pub use folder::FolderRepository;
pub use mark::MarkRepository;
pub use share::ShareRepository;
pub use user::UserRepository;
