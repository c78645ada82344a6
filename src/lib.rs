pub mod record;
pub mod selector;
pub mod store;
pub mod changeset;
pub mod editor;
pub mod io;
pub mod config;
pub mod render;
pub mod utils;

// 重新导出主要结构
pub use record::{AliasTarget, Field, FieldValue, Record, RecordIdentity, ResourceRecord, ResourceRecordSet, UpdateOutcome};
pub use selector::{Family, Narrowed, Refinement};
pub use store::{RecordStore, RefineOutcome};
pub use changeset::{AttachReport, Changeset, ChangesetEntry};
pub use editor::{CommitReport, DiffView, EditJournal, StageReport, ZoneEditor};
pub use config::EditorConfig;
pub use utils::{parse_weight, Result, StagerError};

// 常量定义
/// 原始快照文件名后缀（`<name>_orig.json`）
pub const ORIGINAL_SUFFIX: &str = "_orig";
