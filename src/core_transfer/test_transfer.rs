// Transfer engine tests against the in-memory server

use crate::core_error::FtpError;
use crate::core_network::mock::MockTransport;
use crate::session::Session;
use std::fs;
use std::path::Path;
use tokio::io::AsyncReadExt;

async fn session_with(transport: MockTransport) -> Session<MockTransport> {
    Session::login(transport, "user", "pass").await.unwrap()
}

fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn position(calls: &[String], call: &str) -> usize {
    calls
        .iter()
        .position(|c| c == call)
        .unwrap_or_else(|| panic!("{} was never issued: {:?}", call, calls))
}

#[tokio::test]
async fn test_upload_scenario_with_target_segment() {
    let local = tempfile::tempdir().unwrap();
    let root = local.path().join("a");
    write_file(&root.join("x.txt"), b"hello");
    fs::create_dir_all(root.join("sub")).unwrap();

    let mut session = session_with(MockTransport::new()).await;
    assert!(session.upload(&root, &["root"]).await.unwrap());

    let names: Vec<String> = session
        .list_entries("root/a")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, vec![".", "..", "sub", "x.txt"]);

    let transport = session.transport().unwrap();
    assert_eq!(transport.file("/root/a/x.txt"), Some(&b"hello"[..]));
    assert!(transport.is_dir("/root/a/sub"));
    assert_eq!(transport.cwd, "/");
    session.dispose().await;
}

#[tokio::test]
async fn test_upload_creates_directories_before_storing() {
    let local = tempfile::tempdir().unwrap();
    let root = local.path().join("tree");
    write_file(&root.join("f.txt"), b"f");
    write_file(&root.join("b").join("c.txt"), b"c");
    write_file(&root.join("b").join("d").join("e.bin"), &[0, 159, 255, 10, 13]);

    let mut session = session_with(MockTransport::new()).await;
    assert!(session.upload(&root, &[] as &[&str]).await.unwrap());

    let transport = session.transport().unwrap();
    assert_eq!(transport.file("/tree/f.txt"), Some(&b"f"[..]));
    assert_eq!(transport.file("/tree/b/c.txt"), Some(&b"c"[..]));
    assert_eq!(transport.file("/tree/b/d/e.bin"), Some(&[0u8, 159, 255, 10, 13][..]));

    let calls = transport.calls.clone();
    assert!(position(&calls, "MKD tree") < position(&calls, "STOR f.txt"));
    assert!(position(&calls, "MKD b") < position(&calls, "STOR c.txt"));
    assert!(position(&calls, "MKD d") < position(&calls, "STOR e.bin"));

    // Every store is preceded by a switch to binary.
    for (idx, call) in calls.iter().enumerate() {
        if call.starts_with("STOR ") {
            assert_eq!(calls[idx - 1], "TYPE I");
        }
    }
    assert_eq!(transport.cwd, "/");
    session.dispose().await;
}

#[tokio::test]
async fn test_upload_empty_directory_stores_nothing() {
    let local = tempfile::tempdir().unwrap();
    let empty = local.path().join("empty");
    fs::create_dir_all(&empty).unwrap();

    let mut session = session_with(MockTransport::new()).await;
    assert!(session.upload(&empty, &["x", "y"]).await.unwrap());

    let transport = session.transport().unwrap();
    assert!(transport.is_dir("/x/y/empty"));
    assert!(transport.calls_of(&["STOR"]).is_empty());
    assert_eq!(transport.cwd, "/");
    session.dispose().await;
}

#[tokio::test]
async fn test_upload_single_file_into_existing_segments() {
    let local = tempfile::tempdir().unwrap();
    let file = local.path().join("report.csv");
    write_file(&file, b"a,b\n1,2\n");

    let mut session = session_with(MockTransport::new().with_dir("/exports/2024")).await;
    assert!(session.upload(&file, &["exports", "2024"]).await.unwrap());

    let transport = session.transport().unwrap();
    assert_eq!(transport.file("/exports/2024/report.csv"), Some(&b"a,b\n1,2\n"[..]));
    assert_eq!(transport.calls_of(&["CDUP"]).len(), 2);
    assert_eq!(transport.cwd, "/");
    session.dispose().await;
}

#[tokio::test]
async fn test_upload_stops_at_first_refused_store() {
    let local = tempfile::tempdir().unwrap();
    let root = local.path().join("batch");
    for name in ["a.txt", "b.txt", "c.txt"] {
        write_file(&root.join(name), name.as_bytes());
    }

    let mut transport = MockTransport::new();
    transport.refuse.insert("STOR b.txt".to_string());
    let mut session = session_with(transport).await;
    assert!(!session.upload(&root, &["in"]).await.unwrap());

    let transport = session.transport().unwrap();
    assert!(transport.file("/in/batch/a.txt").is_some());
    assert!(transport.file("/in/batch/c.txt").is_none());
    assert!(!transport.calls.contains(&"STOR c.txt".to_string()));
    assert_eq!(transport.cwd, "/");
    session.dispose().await;
}

#[tokio::test]
async fn test_upload_transport_error_restores_directory() {
    let local = tempfile::tempdir().unwrap();
    let root = local.path().join("batch");
    write_file(&root.join("deep").join("a.txt"), b"a");
    write_file(&root.join("deep").join("b.txt"), b"b");

    let mut transport = MockTransport::new().with_dir("/start");
    transport.cwd = "/start".to_string();
    transport.break_on.insert("STOR b.txt".to_string());
    let mut session = session_with(transport).await;

    match session.upload(&root, &["t"]).await {
        Err(FtpError::Io(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(session.transport().unwrap().cwd, "/start");
    session.dispose().await;
}

#[tokio::test]
async fn test_upload_refused_cwd_is_a_transfer_error() {
    let local = tempfile::tempdir().unwrap();
    let file = local.path().join("a.txt");
    write_file(&file, b"a");

    let mut transport = MockTransport::new();
    transport.refuse.insert("CWD locked".to_string());
    let mut session = session_with(transport).await;

    assert!(matches!(
        session.upload(&file, &["locked"]).await,
        Err(FtpError::Transfer(_))
    ));
    let transport = session.transport().unwrap();
    assert!(transport.calls_of(&["STOR", "CDUP"]).is_empty());
    assert_eq!(transport.cwd, "/");
    session.dispose().await;
}

#[tokio::test]
async fn test_upload_missing_local_path() {
    let local = tempfile::tempdir().unwrap();
    let mut session = session_with(MockTransport::new()).await;
    let err = session
        .upload(local.path().join("nope"), &["x"])
        .await
        .unwrap_err();
    assert!(matches!(err, FtpError::LocalPathNotFound(_)));
    assert!(err.is_precondition());
    assert!(session.transport().unwrap().calls_of(&["MKD"]).is_empty());
    session.dispose().await;
}

#[tokio::test]
async fn test_upload_file_rejects_directory() {
    let local = tempfile::tempdir().unwrap();
    let mut session = session_with(MockTransport::new()).await;
    assert!(matches!(
        session.upload_file(local.path(), Some("dir")).await,
        Err(FtpError::FileSystemMismatch(_))
    ));

    let file = local.path().join("one.txt");
    write_file(&file, b"1");
    assert!(session.upload_file(&file, Some("renamed.txt")).await.unwrap());
    assert_eq!(session.transport().unwrap().file("/renamed.txt"), Some(&b"1"[..]));
    session.dispose().await;
}

#[tokio::test]
async fn test_upload_translates_names() {
    let local = tempfile::tempdir().unwrap();
    let file = local.path().join("中文.txt");
    write_file(&file, b"ni hao");

    let mut session = session_with(MockTransport::new()).await;
    assert!(session.translator().is_enabled());
    assert!(session.upload(&file, &["临时"]).await.unwrap());

    let dir = session.translator().encode("临时");
    let name = session.translator().encode("中文.txt");
    let transport = session.transport().unwrap();
    assert!(transport.calls.contains(&format!("MKD {}", dir)));
    assert!(transport.calls.contains(&format!("STOR {}", name)));
    assert_eq!(transport.file(&format!("/{}/{}", dir, name)), Some(&b"ni hao"[..]));
    session.dispose().await;
}

#[tokio::test]
async fn test_operations_after_dispose_fail() {
    let local = tempfile::tempdir().unwrap();
    let file = local.path().join("a.txt");
    write_file(&file, b"a");

    let mut session = session_with(MockTransport::new().with_file("/r.txt", b"r")).await;
    session.dispose().await;

    let errors = vec![
        session.upload(&file, &["x"]).await.unwrap_err(),
        session.upload_file(&file, None).await.unwrap_err(),
        session.download("r.txt", local.path().join("r.txt")).await.unwrap_err(),
        session.read_file("r.txt", None).await.err().unwrap(),
        session.delete("r.txt").await.unwrap_err(),
        session.list_entries("/").await.unwrap_err(),
        session.is_directory("/").await.unwrap_err(),
    ];
    for err in errors {
        assert!(err.is_precondition(), "{:?}", err);
    }
    assert!(!local.path().join("r.txt").exists());
}

#[tokio::test]
async fn test_delete_absent_path_is_a_noop() {
    let mut session = session_with(MockTransport::new()).await;
    assert!(session.delete("/ghost").await.unwrap());
    assert!(session.transport().unwrap().calls_of(&["DELE", "RMD"]).is_empty());
    session.dispose().await;
}

#[tokio::test]
async fn test_delete_single_file() {
    let mut session = session_with(MockTransport::new().with_file("/d/a.txt", b"a")).await;
    assert!(session.delete("/d/a.txt").await.unwrap());
    let transport = session.transport().unwrap();
    assert!(!transport.exists("/d/a.txt"));
    assert!(transport.is_dir("/d"));
    session.dispose().await;
}

fn nested_tree() -> MockTransport {
    MockTransport::new()
        .with_file("/d/a.txt", b"a")
        .with_file("/d/e.txt", b"e")
        .with_file("/d/sub/b.txt", b"b")
        .with_file("/d/sub/deep/c.txt", b"c")
        .with_dir("/d/sub/empty")
        .with_file("/keep.txt", b"k")
}

#[tokio::test]
async fn test_delete_nested_directory_children_first() {
    let mut session = session_with(nested_tree()).await;
    assert!(session.delete("/d").await.unwrap());

    let transport = session.transport().unwrap();
    assert_eq!(
        transport.calls_of(&["DELE", "RMD"]),
        vec![
            "DELE /d/a.txt",
            "DELE /d/e.txt",
            "DELE /d/sub/b.txt",
            "DELE /d/sub/deep/c.txt",
            "RMD /d/sub/deep",
            "RMD /d/sub/empty",
            "RMD /d/sub",
            "RMD /d",
        ]
    );
    assert!(!transport.exists("/d"));
    assert!(transport.exists("/keep.txt"));
    assert!(transport.calls_of(&["CWD", "CDUP"]).is_empty());
    session.dispose().await;
}

#[tokio::test]
async fn test_delete_without_entry_types_uses_listing_size() {
    let mut transport = nested_tree();
    transport.typed_entries = false;
    let mut session = session_with(transport).await;

    assert!(session.delete("/d").await.unwrap());
    let transport = session.transport().unwrap();
    assert!(!transport.exists("/d"));
    assert!(transport.exists("/keep.txt"));
    session.dispose().await;
}

#[tokio::test]
async fn test_delete_directory_holding_same_named_file() {
    let mut transport = MockTransport::new().with_file("/logs/logs", b"l");
    transport.dot_entries = false;
    let mut session = session_with(transport).await;

    assert!(session.delete("/logs").await.unwrap());
    let transport = session.transport().unwrap();
    assert_eq!(
        transport.calls_of(&["DELE", "RMD"]),
        vec!["DELE /logs", "DELE /logs/logs", "RMD /logs"]
    );
    assert!(!transport.exists("/logs"));
    session.dispose().await;
}

#[tokio::test]
async fn test_delete_refused_file_stays_false() {
    let mut transport = MockTransport::new().with_file("/d/a.txt", b"a");
    transport.dot_entries = false;
    transport.refuse.insert("DELE /d/a.txt".to_string());
    let mut session = session_with(transport).await;

    assert!(!session.delete("/d/a.txt").await.unwrap());
    let transport = session.transport().unwrap();
    assert!(transport.exists("/d/a.txt"));
    assert!(transport.calls_of(&["RMD"]).is_empty());
    session.dispose().await;
}

#[tokio::test]
async fn test_delete_stops_at_first_failure() {
    let mut transport = nested_tree();
    transport.refuse.insert("DELE /d/a.txt".to_string());
    let mut session = session_with(transport).await;

    assert!(!session.delete("/d").await.unwrap());
    let transport = session.transport().unwrap();
    assert!(!transport.calls.contains(&"DELE /d/e.txt".to_string()));
    assert!(transport.calls_of(&["RMD"]).is_empty());
    assert!(transport.exists("/d/e.txt"));
    session.dispose().await;
}

#[tokio::test]
async fn test_delete_swallows_transport_errors() {
    let mut transport = nested_tree();
    transport.break_on.insert("LIST /d/sub".to_string());
    let mut session = session_with(transport).await;

    assert!(!session.delete("/d").await.unwrap());
    assert!(session.transport().unwrap().exists("/d/sub/b.txt"));
    session.dispose().await;
}

#[tokio::test]
async fn test_delete_keeps_working_directory() {
    let mut transport = nested_tree();
    transport.cwd = "/d/sub".to_string();
    let mut session = session_with(transport).await;

    assert!(session.delete("deep").await.unwrap());
    let transport = session.transport().unwrap();
    assert_eq!(transport.cwd, "/d/sub");
    assert!(!transport.exists("/d/sub/deep"));
    session.dispose().await;
}

#[tokio::test]
async fn test_is_directory() {
    let mut session = session_with(nested_tree()).await;
    assert!(session.is_directory("/d/sub").await.unwrap());
    assert!(!session.is_directory("/d/a.txt").await.unwrap());
    assert!(!session.is_directory("/missing").await.unwrap());
    session.dispose().await;
}

#[tokio::test]
async fn test_download_writes_local_file() {
    let local = tempfile::tempdir().unwrap();
    let target = local.path().join("nested").join("out.bin");
    let payload: Vec<u8> = (0..=255).collect();

    let mut session = session_with(MockTransport::new().with_file("/pub/data.bin", &payload)).await;
    session.download("/pub/data.bin", &target).await.unwrap();

    assert_eq!(fs::read(&target).unwrap(), payload);
    assert!(session.transport().unwrap().calls.contains(&"TYPE I".to_string()));
    session.dispose().await;
}

#[tokio::test]
async fn test_download_refused_is_transfer_error() {
    let local = tempfile::tempdir().unwrap();
    let target = local.path().join("out.bin");

    let mut session = session_with(MockTransport::new()).await;
    assert!(matches!(
        session.download("/missing.bin", &target).await,
        Err(FtpError::Transfer(_))
    ));
    assert!(!target.exists());
    session.dispose().await;
}

#[tokio::test]
async fn test_read_file_streams_content() {
    let mut session = session_with(MockTransport::new().with_file("/notes.txt", b"line 1\nline 2\n")).await;

    let mut reader = session.read_file("notes.txt", None).await.unwrap();
    let mut content = Vec::new();
    reader.read_to_end(&mut content).await.unwrap();
    assert!(reader.finish().await.unwrap());
    assert_eq!(content, b"line 1\nline 2\n");

    let transport = session.transport().unwrap();
    assert_eq!(transport.control_encoding, Some(encoding_rs::UTF_8));
    assert!(!transport.pending);
    session.dispose().await;
}

#[tokio::test]
async fn test_read_file_with_charset_and_missing_file() {
    let mut session = session_with(MockTransport::new()).await;
    assert!(matches!(
        session.read_file("nope.txt", Some("GBK")).await,
        Err(FtpError::Transfer(_))
    ));
    assert_eq!(
        session.transport().unwrap().control_encoding,
        Some(encoding_rs::GBK)
    );
    assert!(matches!(
        session.read_file("nope.txt", Some("bogus")).await,
        Err(FtpError::UnknownCharset(_))
    ));
    session.dispose().await;
}
