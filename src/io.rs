/// IO 抽象层模块
///
/// 该模块提供了远端区域和变更集存储的抽象接口，遵循依赖倒置原则。
/// 支持依赖注入、测试 mock 和替换 IO 实现（如真实的 DNS 服务 SDK）。
///
/// # 架构设计
///
/// - **traits**: 定义 `RemoteZone` / `ChangesetStore` trait 接口
/// - **zone_io**: 内存区域和 JSON 区域文件实现
/// - **changeset_io**: 基于目录的变更集文件实现
///
/// # 使用示例
///
/// ```rust,ignore
/// use recordset_editor::io::{fetch_all, ZoneFile};
///
/// let zone = ZoneFile::new(Path::new("zones"), "Z123");
/// let records = fetch_all(&zone)?;
/// ```
pub mod traits;
pub mod zone_io;
pub mod changeset_io;

// === 导出 trait 定义 ===
pub use traits::{
    BatchStatus, Change, ChangeAction, ChangeBatch, ChangesetStore, Page, PageToken, RemoteZone,
};

// === 导出默认实现 ===
pub use zone_io::{fetch_all, InjectedFailure, MemoryZone, ZoneFile, DEFAULT_PAGE_SIZE};
pub use changeset_io::DirChangesetStore;
