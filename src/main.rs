use anyhow::Context;
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use recordset_editor::config::{DEFAULT_CHANGESET_DIR, DEFAULT_LOG_FILE, DEFAULT_ZONE_DIR};
use recordset_editor::io::{DirChangesetStore, ZoneFile, DEFAULT_PAGE_SIZE};
use recordset_editor::render::{columns_for, render_diff, render_table};
use recordset_editor::utils::parse_index;
use recordset_editor::{EditorConfig, Family, RefineOutcome, StagerError, ZoneEditor};

type Editor = ZoneEditor<ZoneFile, DirChangesetStore>;

#[derive(Parser)]
#[command(name = "recordset_editor")]
#[command(about = "筛选、暂存、对比并原子提交 DNS 记录集修改")]
#[command(version)]
struct Cli {
    /// 托管区域 ID
    #[arg(long, env = "AWS_HOSTED_ZONE_ID")]
    zone_id: Option<String>,

    /// 区域文件目录（读取 <dir>/<zone-id>.json）
    #[arg(long, default_value = DEFAULT_ZONE_DIR)]
    zone_dir: PathBuf,

    /// 变更集目录
    #[arg(long, default_value = DEFAULT_CHANGESET_DIR)]
    changeset_dir: PathBuf,

    /// 日志文件路径
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// 分页大小
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// 提交批次备注
    #[arg(long)]
    comment: Option<String>,

    /// 输出调试日志
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = EditorConfig::new(cli.zone_id.clone())?
        .with_zone_dir(&cli.zone_dir)
        .with_changeset_dir(&cli.changeset_dir)
        .with_log_file(&cli.log_file)
        .with_page_size(cli.page_size);

    init_logging(&config.log_file, cli.verbose)?;

    let zone = ZoneFile::new(config.zone_dir(), config.zone_id.clone()).with_page_size(config.page_size);
    let changesets = DirChangesetStore::new(&config.changeset_dir);

    let stdin = std::io::stdin();
    let mut console = Console::new(stdin.lock(), std::io::stdout());

    console.say("正在从远端拉取记录...")?;
    let mut editor = ZoneEditor::open(zone, changesets)
        .with_context(|| format!("无法读取区域 {}", config.zone_id))?;
    if let Some(comment) = cli.comment {
        editor = editor.with_comment(comment);
    }
    console.say(&format!("已加载 {} 条记录", editor.store().len()))?;

    run_menu(&mut editor, &mut console)
}

/// 初始化文件日志
fn init_logging(path: &Path, verbose: bool) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("创建日志目录失败: {:?}", parent))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开日志文件失败: {:?}", path))?;

    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();

    Ok(())
}

/// 终端交互句柄（显式传递，不使用全局状态）
struct Console<I: BufRead, O: Write> {
    input: I,
    output: O,
}

impl<I: BufRead, O: Write> Console<I, O> {
    fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    fn say(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()
    }

    /// 读取一行输入，输入结束（EOF）时返回 `None`
    fn ask(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        write!(self.output, "{}: ", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn confirm(&mut self, prompt: &str) -> std::io::Result<bool> {
        let answer = self.ask(&format!("{} [y/n]", prompt))?;
        Ok(matches!(answer.as_deref().map(str::trim), Some("y" | "Y" | "yes")))
    }
}

fn menu_text() -> String {
    [
        "主菜单",
        "  1   列出全部记录",
        "  2   列出加权记录",
        "  3   列出延迟记录",
        "  4   修改加权记录",
        "  5   从文件加载变更集",
        "  6   撤销上一次暂存",
        "  7   查看暂存修改",
        "  8   编辑暂存修改",
        "  9   提交修改",
        "  10  保存变更集",
        "  99  刷新记录缓存",
        "  0   退出",
    ]
    .join("\n")
}

fn run_menu<I: BufRead, O: Write>(editor: &mut Editor, console: &mut Console<I, O>) -> anyhow::Result<()> {
    loop {
        console.say(&menu_text())?;
        let Some(choice) = console.ask("选择操作")? else {
            return Ok(());
        };

        match choice.trim() {
            "0" => {
                if confirm_quit(editor, console)? {
                    return Ok(());
                }
            }
            "1" => list_records(editor, console, Family::All)?,
            "2" => list_records(editor, console, Family::weighted())?,
            "3" => list_records(editor, console, Family::latency())?,
            "4" => update_weighted_records(editor, console)?,
            "5" => load_changeset(editor, console)?,
            "6" => undo_last_stage(editor, console)?,
            "7" => view_staged(editor, console)?,
            "8" => edit_staged(editor, console)?,
            "9" => commit_changes(editor, console)?,
            "10" => save_changeset(editor, console)?,
            "99" => refresh_records(editor, console)?,
            other => console.say(&format!("无效的选项: {}", other))?,
        }
    }
}

/// 显示当前视图
fn show_view<I: BufRead, O: Write>(editor: &Editor, console: &mut Console<I, O>) -> std::io::Result<()> {
    let family = editor.store().family().clone();
    let title = format!("{} records ({})", family.label(), editor.view().len());
    let snapshots: Vec<_> = editor.view().into_iter().map(|r| r.snapshot_original()).collect();
    console.say(&render_table(&title, columns_for(&family), &snapshots, &[]))
}

fn list_records<I: BufRead, O: Write>(editor: &mut Editor, console: &mut Console<I, O>, family: Family) -> anyhow::Result<()> {
    editor.select_family(family);
    show_view(editor, console)?;
    Ok(())
}

/// 筛选加权记录并批量设置权重
fn update_weighted_records<I: BufRead, O: Write>(editor: &mut Editor, console: &mut Console<I, O>) -> anyhow::Result<()> {
    editor.select_family(Family::weighted());

    loop {
        show_view(editor, console)?;
        let Some(input) = console.ask("筛选 ('..' 重置筛选, 回车使用当前选择, ':<index>' 选择记录, ':q' 退出)")? else {
            return Ok(());
        };
        if input == ":q" {
            return Ok(());
        }

        match editor.refine(&input) {
            Ok(RefineOutcome::Confirmed) => break,
            Ok(RefineOutcome::NoMatch) => console.say("没有匹配的记录，保留当前选择")?,
            Ok(RefineOutcome::IndexOutOfRange { index, len }) => {
                console.say(&format!("序号 {} 超出范围（共 {} 条），保留当前选择", index, len))?
            }
            Ok(_) => {}
            Err(e) => console.say(&format!("{}", e))?,
        }
    }

    if editor.view().is_empty() {
        console.say("没有可修改的记录")?;
        return Ok(());
    }

    let report = loop {
        let Some(input) = console.ask("输入要设置的权重 (0-255)")? else {
            return Ok(());
        };
        match editor.stage_weight(&input) {
            Ok(report) => break report,
            Err(StagerError::InvalidWeight(_)) => console.say("请输入 0-255 之间的有效权重")?,
            Err(e) => return Err(e.into()),
        }
    };

    console.say(&render_diff(&editor.view_diff(), &Family::weighted()))?;
    if report.skipped() > 0 {
        console.say(&format!("{} 条记录没有权重字段，已跳过", report.skipped()))?;
    }

    if console.confirm("暂存这些修改?")? {
        console.say(&format!("已暂存 {} 条修改", report.staged()))?;
    } else {
        let cleared = editor.discard_view();
        console.say(&format!("已取消修改，丢弃 {} 条暂存记录", cleared))?;
    }
    Ok(())
}

fn load_changeset<I: BufRead, O: Write>(editor: &mut Editor, console: &mut Console<I, O>) -> anyhow::Result<()> {
    let names = match editor.list_changesets() {
        Ok(names) => names,
        Err(e) => {
            console.say(&format!("读取变更集目录失败: {}", e))?;
            return Ok(());
        }
    };
    if names.is_empty() {
        console.say("没有已保存的变更集")?;
        return Ok(());
    }

    let listing: Vec<String> = names.iter().enumerate().map(|(i, n)| format!("  {}  {}", i, n)).collect();
    console.say(&format!("变更集文件\n{}", listing.join("\n")))?;

    let name = loop {
        let Some(input) = console.ask("选择文件序号，'q' 返回主菜单")? else {
            return Ok(());
        };
        if input.trim() == "q" {
            return Ok(());
        }
        match parse_index(&input, names.len()) {
            Ok(index) => break &names[index],
            Err(_) => console.say("请选择有效的文件序号")?,
        }
    };

    match editor.load_changeset(name) {
        Ok(report) => {
            console.say(&format!(
                "已挂回 {} 项，跳过 {} 项",
                report.attached,
                report.skipped.len()
            ))?;
            for identity in &report.skipped {
                console.say(&format!("  跳过（记录不存在或已变化）: {}", identity))?;
            }
        }
        Err(e) => console.say(&format!("加载变更集失败: {}", e))?,
    }
    Ok(())
}

fn undo_last_stage<I: BufRead, O: Write>(editor: &mut Editor, console: &mut Console<I, O>) -> anyhow::Result<()> {
    match editor.undo() {
        Ok(count) => console.say(&format!("已撤销 {} 条修改", count))?,
        Err(e) => console.say(&format!("{}", e))?,
    }
    Ok(())
}

fn view_staged<I: BufRead, O: Write>(editor: &mut Editor, console: &mut Console<I, O>) -> anyhow::Result<()> {
    let diff = editor.staged_diff();
    if diff.is_empty() {
        console.say("没有暂存的修改")?;
    } else {
        console.say(&render_diff(&diff, &Family::All))?;
    }
    Ok(())
}

fn edit_staged<I: BufRead, O: Write>(editor: &mut Editor, console: &mut Console<I, O>) -> anyhow::Result<()> {
    loop {
        let diff = editor.staged_diff();
        if diff.is_empty() {
            console.say("没有暂存的修改")?;
            return Ok(());
        }
        console.say(&render_diff(&diff, &Family::All))?;

        let Some(input) = console.ask("选择要从暂存中删除的序号，'q' 退出")? else {
            return Ok(());
        };
        if input.trim() == "q" {
            return Ok(());
        }

        match parse_index(&input, diff.len()).and_then(|index| editor.discard_staged(index)) {
            Ok(identity) => console.say(&format!("已删除暂存: {}", identity))?,
            Err(_) => console.say("请输入有效的序号或 'q' 退出")?,
        }
    }
}

fn commit_changes<I: BufRead, O: Write>(editor: &mut Editor, console: &mut Console<I, O>) -> anyhow::Result<()> {
    let diff = editor.staged_diff();
    if diff.is_empty() {
        console.say("没有需要提交的修改")?;
        return Ok(());
    }

    console.say(&render_diff(&diff, &Family::All))?;
    if !console.confirm("确定要提交这些修改吗?")? {
        console.say("已取消提交")?;
        return Ok(());
    }

    match editor.commit() {
        Ok(report) => console.say(&format!("记录已更新！共 {} 条", report.len()))?,
        Err(e) => console.say(&format!("更新记录失败，暂存修改保持不变: {}", e))?,
    }
    Ok(())
}

fn save_changeset<I: BufRead, O: Write>(editor: &mut Editor, console: &mut Console<I, O>) -> anyhow::Result<()> {
    if !editor.is_modified() {
        console.say("没有暂存的修改")?;
        return Ok(());
    }

    loop {
        let Some(name) = console.ask("输入变更集名称（会生成更新后和原始两个文件）")? else {
            return Ok(());
        };
        match editor.save_changeset(&name) {
            Ok(count) => {
                console.say(&format!("已保存 {} 项到变更集 {}", count, name.trim()))?;
                return Ok(());
            }
            Err(StagerError::InvalidChangesetName(_)) => console.say("名称无效，请重新输入")?,
            Err(e) => {
                console.say(&format!("保存变更集失败: {}", e))?;
                return Ok(());
            }
        }
    }
}

fn refresh_records<I: BufRead, O: Write>(editor: &mut Editor, console: &mut Console<I, O>) -> anyhow::Result<()> {
    if editor.is_modified()
        && !console.confirm("刷新会丢弃所有未保存的暂存修改，确定继续吗?")?
    {
        return Ok(());
    }

    match editor.refresh() {
        Ok(count) => console.say(&format!("已从远端刷新 {} 条记录", count))?,
        Err(e) => console.say(&format!("刷新失败，本地记录保持不变: {}", e))?,
    }
    Ok(())
}

fn confirm_quit<I: BufRead, O: Write>(editor: &Editor, console: &mut Console<I, O>) -> anyhow::Result<bool> {
    if !editor.is_modified() {
        return Ok(true);
    }
    Ok(console.confirm("还有未提交的暂存修改，确定要退出吗?")?)
}
