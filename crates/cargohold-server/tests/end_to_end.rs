//! End-to-end scenarios driving a real TCP-bound server through
//! `cargohold-client`.

use cargohold_client::CargoholdClient;
use cargohold_server::{
    DriverConfig, FsStorage, InMemoryUserStore, Server, ServerDriver, ServerRuntimeConfig, SystemEnv,
    catalog::{DirectoryCatalog, FileCatalog},
};

async fn spawn_server() -> (std::net::SocketAddr, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let storage_path = dir.path().join("storage");
    let metadata_path = dir.path().join("metadata");
    std::fs::create_dir_all(&storage_path).unwrap();
    std::fs::create_dir_all(&metadata_path).unwrap();

    let storage = FsStorage::new();
    let directories = DirectoryCatalog::load(storage, storage_path.clone(), metadata_path.join("directories.json")).unwrap();
    let files = FileCatalog::load(storage, metadata_path.join("files.json")).unwrap();

    let config = ServerRuntimeConfig {
        port: 0,
        storage_path,
        metadata_path,
        driver: DriverConfig { chunk_size: 1024 * 1024, ..DriverConfig::default() },
        ..ServerRuntimeConfig::default()
    };

    let driver = ServerDriver::new(SystemEnv::new(), storage, InMemoryUserStore::new(), directories, files, config.driver);
    let server = Server::bind(config, driver).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    (addr, dir)
}

async fn logged_in_client(addr: std::net::SocketAddr, username: &str) -> CargoholdClient {
    let mut client = CargoholdClient::connect(addr).await.unwrap();
    let created = client.create_account(username, "pw12345678", "a@x").await.unwrap();
    assert!(created.success);
    let login = client.login(username, "pw12345678").await.unwrap();
    assert!(login.success);
    assert!(!login.user_id.is_empty());
    client
}

#[tokio::test]
async fn register_and_login() {
    let (addr, _dir) = spawn_server().await;
    let mut client = CargoholdClient::connect(addr).await.unwrap();

    let created = client.create_account("alice", "pw12345678", "a@x").await.unwrap();
    assert!(created.success);

    let login = client.login("alice", "pw12345678").await.unwrap();
    assert!(login.success);
    assert_eq!(login.user_id, client.user_id());
}

#[tokio::test]
async fn create_directory_tree_rejects_duplicate_sibling() {
    let (addr, _dir) = spawn_server().await;
    let mut client = logged_in_client(addr, "bob").await;

    let first = client.create_directory("docs", None).await.unwrap();
    assert!(first.success);

    let second = client.create_directory("docs", None).await.unwrap();
    assert!(!second.success);
    assert!(second.message.to_lowercase().contains("conflict") || second.message.to_lowercase().contains("exist"));
}

#[tokio::test]
async fn chunked_upload_and_download_round_trip() {
    let (addr, _dir) = spawn_server().await;
    let mut client = logged_in_client(addr, "carol").await;

    let dir_response = client.create_directory("docs", None).await.unwrap();
    assert!(dir_response.success);
    let directory_id = dir_response.directory_id;

    let data = vec![0x5Au8; 2 * 1024 * 1024];
    let file_id =
        client.upload("f.bin", "application/octet-stream", &data, Some(directory_id.as_str()), 1024 * 1024).await.unwrap();

    let contents = client.directory_contents(Some(directory_id.as_str())).await.unwrap();
    assert_eq!(contents.files.len(), 1);
    assert_eq!(contents.files[0].file_size, data.len() as u64);
    assert!(contents.files[0].is_complete);

    let downloaded = client.download(&file_id).await.unwrap();
    assert_eq!(downloaded, data);
}

#[tokio::test]
async fn out_of_order_chunk_is_rejected_then_recovers() {
    let (addr, _dir) = spawn_server().await;
    let mut client = logged_in_client(addr, "dave").await;

    let chunk_size = 10usize;
    let data = vec![7u8; 3 * chunk_size];
    let init = client.upload_init("ordered.bin", "application/octet-stream", data.len() as u64, None).await.unwrap();
    assert!(init.success);

    let out_of_order = client.upload_chunk(&init.file_id, 1, &data[chunk_size..2 * chunk_size], false).await.unwrap();
    assert!(!out_of_order.success);

    let first = client.upload_chunk(&init.file_id, 0, &data[0..chunk_size], false).await.unwrap();
    assert!(first.success);

    let second = client.upload_chunk(&init.file_id, 1, &data[chunk_size..2 * chunk_size], false).await.unwrap();
    assert!(second.success);

    let third = client.upload_chunk(&init.file_id, 2, &data[2 * chunk_size..], true).await.unwrap();
    assert!(third.success);

    let complete = client.upload_complete(&init.file_id).await.unwrap();
    assert!(complete.success);
}

#[tokio::test]
async fn finalize_before_all_chunks_sent_is_rejected() {
    let (addr, _dir) = spawn_server().await;
    let mut client = logged_in_client(addr, "frank").await;

    let init = client.upload_init("partial.bin", "application/octet-stream", 30, None).await.unwrap();
    assert!(init.success);

    let result = client.upload_complete(&init.file_id).await;
    assert!(result.is_err());

    let first = client.upload_chunk(&init.file_id, 0, &[1u8; 10], false).await.unwrap();
    assert!(first.success);

    let still_incomplete = client.upload_complete(&init.file_id).await;
    assert!(still_incomplete.is_err());

    let download = client.download(&init.file_id).await;
    assert!(download.is_err());
}

#[tokio::test]
async fn recursive_delete_removes_subtree_and_files() {
    let (addr, _dir) = spawn_server().await;
    let mut client = logged_in_client(addr, "erin").await;

    let d1 = client.create_directory("d1", None).await.unwrap();
    assert!(d1.success);
    let d2 = client.create_directory("d2", Some(d1.directory_id.as_str())).await.unwrap();
    assert!(d2.success);

    let file_id =
        client.upload("nested.bin", "application/octet-stream", b"hello", Some(d2.directory_id.as_str()), 64).await.unwrap();

    let deleted = client.delete_directory(&d1.directory_id, true).await.unwrap();
    assert!(deleted.success);

    let download_after_delete = client.download(&file_id).await;
    assert!(download_after_delete.is_err());
}

#[tokio::test]
async fn pre_auth_command_is_rejected() {
    let (addr, _dir) = spawn_server().await;
    let mut client = CargoholdClient::connect(addr).await.unwrap();

    let result = client.list_files(None).await;
    assert!(result.is_err());
}
