// tests/cache_entry_test.rs

mod common;

use common::{RecordingMerger, test_client};
use mykit::{bilibili::CacheEntry, config::BilibiliEndpoints};
use std::{fs, path::Path, sync::Arc};

fn write_part(video_dir: &Path, part: &str, entry: Option<&str>, type_tag: &str, fragments: &[(&str, &str)]) {
    let part_dir = video_dir.join(part);
    fs::create_dir_all(part_dir.join(type_tag)).unwrap();
    if let Some(entry) = entry {
        fs::write(part_dir.join("entry.json"), entry).unwrap();
        fs::write(part_dir.join("danmaku.xml"), format!("<i>{}</i>", part)).unwrap();
    }
    for (name, content) in fragments {
        fs::write(part_dir.join(type_tag).join(name), content).unwrap();
    }
}

#[tokio::test]
async fn test_regular_upload_merges_m4s_and_copies_danmaku() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let uploader = server
        .mock("GET", "/video/av170001/")
        .with_body(r#"<html><head><meta name="author" content="某UP主"></head></html>"#)
        .expect(1)
        .create_async()
        .await;

    let root = tempfile::tempdir().unwrap();
    let video_dir = root.path().join("170001");
    write_part(
        &video_dir,
        "1",
        Some(r#"{"title":"测试","type_tag":"64","page_data":{"part":"第一集"}}"#),
        "64",
        &[("video.m4s", "V"), ("audio.m4s", "A"), ("index.json", "{}")],
    );
    // 没有元数据的分P被跳过
    write_part(&video_dir, "2", None, "64", &[("video.m4s", "V2")]);

    let merger = Arc::new(RecordingMerger::default());
    let mut entry = CacheEntry::new(
        &video_dir,
        None,
        test_client(&base),
        BilibiliEndpoints::single(&base),
        merger.clone(),
    )
    .unwrap();
    assert_eq!(entry.id(), "170001");
    assert_eq!(entry.part_sum(), 2);

    let report = entry.extract_all().await.unwrap();

    let work_dir = dunce::canonicalize(root.path()).unwrap();
    let expected = work_dir.join("测试 [av170001][某UP主]1-第一集.mp4");
    assert_eq!(report.outputs, vec![expected.clone()]);
    assert_eq!(report.skipped, vec!["2".to_string()]);
    assert_eq!(merger.kinds(), vec!["merge"]);
    assert_eq!(fs::read_to_string(&expected).unwrap(), "AV");
    assert_eq!(
        fs::read_to_string(work_dir.join("测试 [av170001][某UP主]1-第一集.xml")).unwrap(),
        "<i>1</i>"
    );
    // 缓存本身不被修改
    assert!(video_dir.join("1").join("64").join("video.m4s").is_file());
    uploader.assert_async().await;
}

#[tokio::test]
async fn test_blocked_uploader_page_yields_placeholder() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    server.mock("GET", "/video/av42/").with_status(412).create_async().await;

    let root = tempfile::tempdir().unwrap();
    let video_dir = root.path().join("42");
    write_part(
        &video_dir,
        "1",
        Some(r#"{"title":"单P","type_tag":"lua.flv.bb2api.64","page_data":{"part":"单P"}}"#),
        "lua.flv.bb2api.64",
        &[("1.blv", "b"), ("0.blv", "a"), ("10.blv", "c")],
    );

    let merger = Arc::new(RecordingMerger::default());
    let mut entry = CacheEntry::new(
        &video_dir,
        None,
        test_client(&base),
        BilibiliEndpoints::single(&base),
        merger.clone(),
    )
    .unwrap();
    let report = entry.extract_all().await.unwrap();

    let work_dir = dunce::canonicalize(root.path()).unwrap();
    let expected = work_dir.join("单P [av42][NA].mp4");
    assert_eq!(report.outputs, vec![expected.clone()]);
    assert_eq!(merger.kinds(), vec!["concat"]);
    // 分片按序号拼接
    assert_eq!(fs::read_to_string(&expected).unwrap(), "abc");
    assert!(work_dir.join("单P [av42][NA].xml").is_file());
}

#[tokio::test]
async fn test_series_episode_goes_to_padded_subfolder() {
    let root = tempfile::tempdir().unwrap();
    let video_dir = root.path().join("ss100");
    write_part(
        &video_dir,
        "1",
        Some(r#"{"title":"番剧","type_tag":"lua.flv.bb2api.80","ep":{"index_title":"开始","av_id":170002,"index":"1"}}"#),
        "lua.flv.bb2api.80",
        &[("0.blv", "x"), ("1.blv", "y")],
    );
    for part in 2..=10 {
        write_part(&video_dir, &part.to_string(), None, "lua.flv.bb2api.80", &[]);
    }

    let merger = Arc::new(RecordingMerger::default());
    let mut entry = CacheEntry::new(
        &video_dir,
        None,
        test_client("http://127.0.0.1:9"),
        BilibiliEndpoints::single("http://127.0.0.1:9"),
        merger.clone(),
    )
    .unwrap();
    let report = entry.extract_all().await.unwrap();

    let out_dir = dunce::canonicalize(root.path()).unwrap().join("番剧 [av170002][ss100]");
    let expected = out_dir.join("01. 开始.mp4");
    assert_eq!(report.outputs, vec![expected.clone()]);
    assert_eq!(report.skipped.len(), 9);
    assert_eq!(fs::read_to_string(&expected).unwrap(), "xy");
    assert_eq!(fs::read_to_string(out_dir.join("01. 开始.xml")).unwrap(), "<i>1</i>");
}
