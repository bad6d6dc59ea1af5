mod common;

use common::mock_dropbox::{MockDropbox, TEST_TOKEN, endpoint_error, reply_json};
use common::{sample_data, setup_temp_dir};
use dbx_transfer::api::ApiErrorKind;
use dbx_transfer::store::RemoteStore;
use dbx_transfer::{TransferConfig, TransferError, TransferManager};
use serde_json::json;

//===============
// Metadata
//===============
#[tokio::test]
async fn test_metadata_found_missing_and_root() {
    let mock = MockDropbox::start(|request| {
        assert_eq!(request.path, "/2/files/get_metadata");
        match request.json_body()["path"].as_str() {
            Some("/Docs/a.txt") => reply_json(
                200,
                json!({
                    ".tag": "file",
                    "name": "a.txt",
                    "path_display": "/Docs/a.txt",
                    "path_lower": "/docs/a.txt",
                    "id": "id:1",
                    "size": 3,
                    "rev": "015f"
                }),
            ),
            Some("/Docs") => reply_json(
                200,
                json!({ ".tag": "folder", "name": "Docs", "path_display": "/Docs" }),
            ),
            _ => endpoint_error("path/not_found/.."),
        }
    })
    .await;
    let store = mock.store();

    let file = store.metadata("/Docs/a.txt").await.unwrap().unwrap();
    assert!(file.is_file());
    assert_eq!(file.path, "/Docs/a.txt");
    assert_eq!(file.size, 3);
    assert_eq!(file.rev.as_deref(), Some("015f"));

    let folder = store.metadata("/Docs").await.unwrap().unwrap();
    assert!(folder.is_directory());

    assert!(store.metadata("/Docs/missing.txt").await.unwrap().is_none());

    // The root never goes over the wire.
    assert!(store.metadata("").await.unwrap().unwrap().is_directory());
    assert_eq!(mock.requests().len(), 3);

    let expected_auth = format!("Bearer {}", TEST_TOKEN);
    for request in mock.requests() {
        assert_eq!(request.authorization.as_deref(), Some(expected_auth.as_str()));
        assert!(request.api_arg.is_none());
    }
}

//===============
// Uploads
//===============
#[tokio::test]
async fn test_chunked_upload_session_over_http() {
    let mock = MockDropbox::start(|request| match request.path.as_str() {
        "/2/files/get_metadata" => endpoint_error("path/not_found/"),
        "/2/files/upload_session/start" => reply_json(200, json!({ "session_id": "sess-1" })),
        // Dropbox answers appends with an empty body.
        "/2/files/upload_session/append_v2" => (200, Vec::new()),
        "/2/files/upload_session/finish" => reply_json(
            200,
            json!({
                ".tag": "file",
                "name": "été.bin",
                "path_display": "/Fotos/été.bin",
                "size": 10,
                "rev": "a1"
            }),
        ),
        other => panic!("unexpected request to {}", other),
    })
    .await;

    let temp_dir = setup_temp_dir();
    let source = temp_dir.path().join("local.bin");
    let content = sample_data(10);
    std::fs::write(&source, &content).unwrap();

    let config = TransferConfig {
        chunk_size: 4,
        page_limit: 0,
    };
    let mut manager = TransferManager::with_config(mock.store(), config).unwrap();
    let entry = manager
        .upload_file(&source, "/Fotos/été.bin", false, 4)
        .await
        .unwrap();
    assert_eq!(entry.path, "/Fotos/été.bin");
    assert_eq!(entry.size, 10);

    assert_eq!(
        mock.paths(),
        vec![
            "/2/files/get_metadata",
            "/2/files/upload_session/start",
            "/2/files/upload_session/append_v2",
            "/2/files/upload_session/append_v2",
            "/2/files/upload_session/finish",
        ]
    );

    let requests = mock.requests();
    let start = &requests[1];
    assert!(start.body.is_empty());
    assert_eq!(start.json_arg(), json!({ "close": false }));

    let offsets: Vec<_> = requests[2..4]
        .iter()
        .map(|r| {
            let arg = r.json_arg();
            assert_eq!(arg["cursor"]["session_id"], "sess-1");
            assert_eq!(arg["close"], false);
            arg["cursor"]["offset"].as_u64().unwrap()
        })
        .collect();
    assert_eq!(offsets, vec![0, 4]);

    let finish = &requests[4];
    let raw = finish.api_arg.as_deref().unwrap();
    assert!(raw.is_ascii());
    assert!(raw.contains("\\u00e9"));
    let arg = finish.json_arg();
    assert_eq!(arg["cursor"]["offset"], 8);
    assert_eq!(arg["commit"]["path"], "/Fotos/été.bin");
    assert_eq!(arg["commit"]["mode"], "add");
    assert_eq!(arg["commit"]["autorename"], false);

    let sent: Vec<u8> = requests[1..]
        .iter()
        .flat_map(|r| r.body.iter().copied())
        .collect();
    assert_eq!(sent, content);
}

#[tokio::test]
async fn test_single_request_upload_over_http() {
    let mock = MockDropbox::start(|request| {
        assert_eq!(request.path, "/2/files/upload");
        reply_json(
            200,
            json!({ "name": "n.txt", "path_display": "/n.txt", "size": 2, "rev": "r1" }),
        )
    })
    .await;

    let temp_dir = setup_temp_dir();
    let source = temp_dir.path().join("n.txt");
    std::fs::write(&source, b"hi").unwrap();

    let mut manager = TransferManager::new(mock.store());
    let entry = manager.upload_file(&source, "/n.txt", true, 1024).await.unwrap();
    assert_eq!(entry.rev.as_deref(), Some("r1"));

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body, b"hi");
    assert_eq!(requests[0].json_arg()["mode"], "overwrite");
}

//===============
// Downloads
//===============
#[tokio::test]
async fn test_download_revision_over_http() {
    let mock = MockDropbox::start(|request| {
        assert_eq!(request.path, "/2/files/download");
        if request.json_arg()["path"] == "rev:abc" {
            (200, b"old bytes".to_vec())
        } else {
            (200, b"latest".to_vec())
        }
    })
    .await;
    let store = mock.store();
    let temp_dir = setup_temp_dir();
    let dest = temp_dir.path().join("r.txt");

    let written = store.download_to("/r.txt", Some("abc"), &dest).await.unwrap();
    assert_eq!(written, 9);
    assert_eq!(std::fs::read(&dest).unwrap(), b"old bytes");

    store.download_to("/r.txt", None, &dest).await.unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"latest");

    let args: Vec<_> = mock
        .requests()
        .iter()
        .map(|r| r.json_arg()["path"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(args, vec!["rev:abc", "/r.txt"]);
}

//===============
// Listing
//===============
#[tokio::test]
async fn test_listing_follows_cursor_over_http() {
    let mock = MockDropbox::start(|request| match request.path.as_str() {
        "/2/files/get_metadata" => reply_json(
            200,
            json!({ ".tag": "folder", "name": "Docs", "path_display": "/Docs" }),
        ),
        "/2/files/list_folder" => reply_json(
            200,
            json!({
                "entries": [
                    { ".tag": "file", "name": "a.txt", "path_display": "/Docs/a.txt", "size": 1, "rev": "1" },
                    { ".tag": "deleted", "name": "gone.txt", "path_display": "/Docs/gone.txt" }
                ],
                "cursor": "c1",
                "has_more": true
            }),
        ),
        "/2/files/list_folder/continue" => {
            assert_eq!(request.json_body()["cursor"], "c1");
            reply_json(
                200,
                json!({
                    "entries": [
                        { ".tag": "folder", "name": "Sub", "path_display": "/Docs/Sub" }
                    ],
                    "cursor": "c2",
                    "has_more": false
                }),
            )
        }
        other => panic!("unexpected request to {}", other),
    })
    .await;

    let manager = TransferManager::new(mock.store());
    let names = manager.list_directory_names("/Docs", 3, false).await.unwrap();
    assert_eq!(names[&0], vec!["a.txt"]);
    assert_eq!(names[&1], vec!["Sub"]);
    assert_eq!(names.len(), 2);

    let list = &mock.requests()[1];
    assert_eq!(list.json_body(), json!({ "path": "/Docs", "recursive": false }));
}

//===============
// Errors
//===============
#[tokio::test]
async fn test_endpoint_errors_are_classified() {
    let mock = MockDropbox::start(|request| match request.path.as_str() {
        "/2/files/delete_v2" => endpoint_error("path_lookup/not_found/.."),
        "/2/files/create_folder_v2" => endpoint_error("path/conflict/folder/..."),
        "/2/files/move_v2" => (401, Vec::new()),
        _ => (500, b"oops".to_vec()),
    })
    .await;
    let store = mock.store();

    let err = store.delete("/gone").await.unwrap_err();
    assert!(err.is_api(ApiErrorKind::NotFound));

    let err = store.create_folder("/Docs", false).await.unwrap_err();
    assert!(err.is_api(ApiErrorKind::Conflict));
    match err {
        TransferError::Api { summary, .. } => assert_eq!(summary, "path/conflict/folder/..."),
        other => panic!("expected an API error, got {:?}", other),
    }

    let err = store.move_entry("/a", "/b").await.unwrap_err();
    assert!(err.is_api(ApiErrorKind::InvalidToken));

    let err = store.list_folder("/Docs", false).await.unwrap_err();
    assert!(matches!(err, TransferError::HttpError(500)));
}
