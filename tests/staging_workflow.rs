//! 基于文件的完整流程测试
//!
//! 区域文件充当远端，变更集写入临时目录：
//! - 筛选 → 暂存 → 对比 → 提交
//! - 保存变更集 → 刷新 → 重新加载
//! - 远端变化后加载旧变更集

use recordset_editor::io::{ChangesetStore, DirChangesetStore, RemoteZone, ZoneFile};
use recordset_editor::{
    Family, Field, FieldValue, RefineOutcome, ResourceRecord, ResourceRecordSet, StagerError,
    ZoneEditor,
};
use tempfile::TempDir;

fn weighted(name: &str, identifier: &str, weight: u8, value: &str) -> ResourceRecordSet {
    let mut set = ResourceRecordSet::new(name, "A");
    set.set_identifier = Some(identifier.to_string());
    set.weight = Some(weight);
    set.ttl = Some(60);
    set.resource_records = Some(vec![ResourceRecord::new(value)]);
    set
}

fn latency(name: &str, region: &str) -> ResourceRecordSet {
    let mut set = ResourceRecordSet::new(name, "CNAME");
    set.set_identifier = Some(region.to_string());
    set.region = Some(region.to_string());
    set.ttl = Some(300);
    set.resource_records = Some(vec![ResourceRecord::new("lb.example.net.")]);
    set
}

fn zone_records() -> Vec<ResourceRecordSet> {
    vec![
        weighted("mx.example.com.", "mx1", 10, "192.0.2.1"),
        weighted("mx.example.com.", "mx2", 10, "192.0.2.2"),
        latency("api.example.com.", "us-east-1"),
        latency("api.example.com.", "eu-west-1"),
        ResourceRecordSet::new("example.com.", "NS"),
    ]
}

struct Workspace {
    _dir: TempDir,
    zone: ZoneFile,
    changesets: DirChangesetStore,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().unwrap();
    let zone = ZoneFile::new(&dir.path().join("zones"), "ZINTEGRATION").with_page_size(2);
    zone.initialize(zone_records()).unwrap();
    let changesets = DirChangesetStore::new(dir.path().join("changesets"));
    Workspace {
        _dir: dir,
        zone,
        changesets,
    }
}

#[test]
fn test_drain_one_weighted_target() {
    let ws = workspace();
    let mut editor = ZoneEditor::open(ws.zone.clone(), ws.changesets.clone()).unwrap();
    assert_eq!(editor.store().len(), 5);

    assert_eq!(editor.select_family(Family::weighted()), 2);
    assert_eq!(editor.refine("mx.example").unwrap(), RefineOutcome::Narrowed(2));
    assert_eq!(editor.refine(":1").unwrap(), RefineOutcome::Narrowed(1));

    editor.stage_weight("0").unwrap();
    let diff = editor.view_diff();
    assert_eq!(diff.original[0].weight, Some(10));
    assert_eq!(diff.updated[0].weight, Some(0));
    assert_eq!(diff.changed_fields(0), vec![Field::Weight]);

    assert_eq!(editor.commit().unwrap().len(), 1);
    assert!(!editor.is_modified());

    // 提交只影响远端，本地镜像需要刷新才会看到新值
    let mirrored = editor.store().records()[1].fields().weight;
    assert_eq!(mirrored, Some(10));

    editor.refresh().unwrap();
    let records = editor.store().records();
    assert_eq!(records[0].fields().weight, Some(10));
    assert_eq!(records[1].fields().weight, Some(0));
}

#[test]
fn test_latency_family_and_ttl_edit() {
    let ws = workspace();
    let mut editor = ZoneEditor::open(ws.zone.clone(), ws.changesets.clone()).unwrap();

    assert_eq!(editor.select_family(Family::latency()), 2);
    let report = editor.stage(Field::Ttl, FieldValue::Ttl(30));
    assert_eq!(report.staged(), 2);

    // 没有 TTL 字段的记录不会获得 TTL
    editor.select_family(Family::All);
    editor.refine("example.com.").unwrap();
    let report = editor.stage(Field::Weight, FieldValue::Weight(1));
    assert_eq!(report.staged(), 2);
    assert_eq!(report.missing_field.len(), 3);

    assert_eq!(editor.staged().len(), 4);
    editor.commit().unwrap();

    let remote = recordset_editor::io::fetch_all(&ws.zone).unwrap();
    assert!(remote.iter().filter(|s| s.region.is_some()).all(|s| s.ttl == Some(30)));
    assert_eq!(remote[4].weight, None);
}

#[test]
fn test_changeset_survives_restart() {
    let ws = workspace();

    {
        let mut editor = ZoneEditor::open(ws.zone.clone(), ws.changesets.clone()).unwrap();
        editor.select_family(Family::weighted());
        editor.stage_weight("25").unwrap();
        assert_eq!(editor.save_changeset("rebalance").unwrap(), 2);
    }

    assert!(ws.changesets.updated_path("rebalance").exists());
    assert!(ws.changesets.original_path("rebalance").exists());
    assert_eq!(ws.changesets.list().unwrap(), vec!["rebalance".to_string()]);

    let mut editor = ZoneEditor::open(ws.zone.clone(), ws.changesets.clone()).unwrap();
    assert!(!editor.is_modified());

    let report = editor.load_changeset("rebalance").unwrap();
    assert_eq!(report.attached, 2);
    assert!(report.skipped.is_empty());

    let weights: Vec<_> = editor.staged().iter().map(|r| r.snapshot_updated().weight).collect();
    assert_eq!(weights, vec![Some(25), Some(25)]);
}

#[test]
fn test_stale_changeset_after_remote_change() {
    let ws = workspace();
    let mut editor = ZoneEditor::open(ws.zone.clone(), ws.changesets.clone()).unwrap();
    editor.select_family(Family::weighted());
    editor.stage_weight("40").unwrap();
    editor.save_changeset("stale").unwrap();
    editor.discard_all();

    // 其他人修改了 mx1
    let mut changed = zone_records();
    changed[0].resource_records = Some(vec![ResourceRecord::new("198.51.100.7")]);
    ws.zone.initialize(changed).unwrap();
    editor.refresh().unwrap();

    let report = editor.load_changeset("stale").unwrap();
    assert_eq!(report.attached, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].set_identifier.as_deref(), Some("mx1"));
}

#[test]
fn test_load_missing_and_invalid_names() {
    let ws = workspace();
    let mut editor = ZoneEditor::open(ws.zone.clone(), ws.changesets.clone()).unwrap();

    assert!(matches!(
        editor.load_changeset("nope"),
        Err(StagerError::ChangesetNotFound(_))
    ));
    assert!(matches!(
        editor.load_changeset("../escape"),
        Err(StagerError::InvalidChangesetName(_))
    ));
}

#[test]
fn test_missing_zone_file_is_transport_error() {
    let dir = TempDir::new().unwrap();
    let zone = ZoneFile::new(dir.path(), "ZMISSING");
    assert_eq!(zone.zone_id(), "ZMISSING");

    let result = ZoneEditor::open(zone, DirChangesetStore::new(dir.path()));
    assert!(matches!(result, Err(StagerError::Transport(_))));
}
