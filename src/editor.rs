/// 编辑器层模块
///
/// 该模块提供有状态的编辑接口，支持批量暂存、对比、撤销/重做和原子提交。
/// 遵循"修改-提交分离"原则，所有修改操作仅在内存中进行，需要显式提交。
///
/// # 架构设计
///
/// - **zone_editor**: 区域编辑器，管理记录仓库、暂存日志和变更集
/// - **staging**: 批量暂存、对比视图和丢弃
/// - **commit**: 把暂存修改打包为单个批次提交
/// - **delta**: 暂存日志，支持撤销/重做
///
/// # 使用示例
///
/// ```rust,ignore
/// use recordset_editor::{Family, ZoneEditor};
///
/// // 拉取 + 筛选 + 暂存 + 提交工作流
/// let mut editor = ZoneEditor::open(zone, changesets)?;
/// editor.select_family(Family::weighted());
/// editor.stage_weight("50")?;
/// println!("暂存了 {} 条记录", editor.staged().len());
///
/// editor.commit()?;
/// ```
pub mod commit;
pub mod delta;
pub mod staging;
pub mod zone_editor;


// === 导出公共接口 ===
pub use commit::{build_batch, commit, CommitReport, DEFAULT_COMMENT};
pub use delta::{EditBatch, EditJournal, StagedEdit};
pub use staging::{build_diff_view, discard, stage_edit, DiffView, StageReport};
pub use zone_editor::ZoneEditor;
