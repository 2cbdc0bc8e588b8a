//! Local mirror listing and static file serving

mod harness;

use harness::config::ConfigBuilder;
use harness::mock_alist::MockAlist;
use harness::server::TestServer;
use serde_json::Value;

async fn local_folders(server: &TestServer) -> Value {
    server
        .client()
        .get(server.url("/api/gallery/local"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn empty_mirror_lists_nothing() {
    let mock = MockAlist::start().await.unwrap();
    let mirror = tempfile::tempdir().unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.base_url(), mirror.path()).build())
        .await
        .unwrap();

    assert_eq!(local_folders(&server).await, serde_json::json!([]));
}

#[tokio::test]
async fn synced_images_are_grouped_and_served() {
    let mock = MockAlist::start().await.unwrap();
    for i in 1..=5 {
        mock.put_file(&format!("/cats/{i}.jpg"), format!("cat {i}").into_bytes());
    }
    mock.put_file("/dogs/good boy.png", b"woof".to_vec());
    mock.put_file("/cover.gif", b"gif".to_vec());

    let mirror = tempfile::tempdir().unwrap();
    std::fs::write(mirror.path().join("notes.txt"), b"local only").unwrap();

    let server = TestServer::start(ConfigBuilder::new(&mock.base_url(), mirror.path()).build())
        .await
        .unwrap();
    server.sync().await;

    let folders = local_folders(&server).await;
    let folders = folders.as_array().unwrap();

    let names: Vec<_> = folders.iter().map(|f| f["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["cats", "dogs", "uncategorized"]);

    assert_eq!(folders[0]["count"], 5);
    assert_eq!(folders[0]["preview_images"].as_array().unwrap().len(), 4);
    assert_eq!(folders[0]["all_images"][4], "/gallery/files/cats/5.jpg");
    assert_eq!(folders[1]["all_images"][0], "/gallery/files/dogs/good%20boy.png");
    assert_eq!(folders[2]["all_images"][0], "/gallery/files/cover.gif");

    let url = folders[1]["all_images"][0].as_str().unwrap();
    let resp = server.client().get(server.url(url)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"woof");
}

#[tokio::test]
async fn missing_mirrored_file_is_not_found() {
    let mock = MockAlist::start().await.unwrap();
    let mirror = tempfile::tempdir().unwrap();
    let server = TestServer::start(ConfigBuilder::new(&mock.base_url(), mirror.path()).build())
        .await
        .unwrap();

    let resp = server
        .client()
        .get(server.url("/gallery/files/none/1.jpg"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}
