use chrono::Utc;
use mdcrun_catalog::{
    AutomationDescriptor, CatalogCache, CatalogConfig, CatalogLoader, CatalogSource,
    DescriptorSource,
};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Minimal HTTP server answering GET requests from a fixed route table.
/// Unknown paths get a 404.
async fn serve(routes: &[(&str, u16, &str)]) -> String {
    let routes: Arc<HashMap<String, (u16, String)>> = Arc::new(
        routes
            .iter()
            .map(|(path, status, body)| (path.to_string(), (*status, body.to_string())))
            .collect(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                while read < buf.len() {
                    let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                let request = String::from_utf8_lossy(&buf[..read]);
                let path = request.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = routes
                    .get(path)
                    .cloned()
                    .unwrap_or((404, "not found".to_string()));
                let response = format!(
                    "HTTP/1.1 {status} Status\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

fn local_catalog(dir: &std::path::Path) -> CatalogConfig {
    let catalog_dir = dir.join("mdc_files");
    fs::create_dir_all(&catalog_dir).unwrap();
    fs::write(
        catalog_dir.join("email_links.mdc"),
        "---\ndescription: Validate email links in Draftr content\n---\n",
    )
    .unwrap();
    fs::write(catalog_dir.join("aem_links.mdc"), "# Check AEM page for broken links\n").unwrap();

    CatalogConfig::default()
        .with_catalog_dir(catalog_dir)
        .with_cache_file(dir.join(".mdc_cache.json"))
        .with_remote_cache_dir(dir.join(".mdc_remote_cache"))
        .with_request_timeout(Duration::from_secs(2))
}

#[tokio::test]
async fn test_local_catalog_descriptions() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CatalogLoader::new(local_catalog(dir.path()));

    let files = loader.list_descriptors().await;
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].name, "aem_links.mdc");
    assert_eq!(files[0].description, "Check AEM page for broken links");
    assert_eq!(
        files[1].description,
        "description: Validate email links in Draftr content"
    );
    assert!(files.iter().all(|d| d.source == DescriptorSource::Local));
}

#[tokio::test]
async fn test_cached_catalog_round_trip_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_catalog(dir.path()).with_remote_url("http://127.0.0.1:9/list");

    let written = vec![
        AutomationDescriptor::remote(
            "termweb.mdc",
            ".mdc_remote_cache/termweb.mdc",
            "Extract and validate links from TermWeb",
        )
        .with_remote_url(Some("https://mdc.example.com/termweb.mdc".to_string())),
        AutomationDescriptor::remote("ja.mdc", ".mdc_remote_cache/ja.mdc", "No description available"),
    ];
    CatalogCache::new(&config.cache_file, config.cache_ttl)
        .store(&written, Utc::now())
        .unwrap();

    let loader = CatalogLoader::new(config);
    assert_eq!(loader.list_descriptors().await, written);
    assert!(loader.cache_status().fresh);
}

#[tokio::test]
async fn test_expired_cache_with_dead_remote_falls_back_to_local() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_catalog(dir.path())
        .with_remote_url("http://127.0.0.1:9")
        .with_cache_ttl(Duration::from_secs(60));

    let stale = vec![AutomationDescriptor::remote("stale.mdc", "p", "d")];
    CatalogCache::new(&config.cache_file, config.cache_ttl)
        .store(&stale, Utc::now() - chrono::Duration::minutes(5))
        .unwrap();

    let loader = CatalogLoader::new(config);
    let files = loader.list_descriptors().await;
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|d| d.source == DescriptorSource::Local));
}

#[tokio::test]
async fn test_remote_listing_downloads_and_caches() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve(&[
        (
            "/list",
            200,
            r#"[{"name":"a.mdc","description":"Server says A"},{"name":"b.mdc","url":"files/b.mdc"}]"#,
        ),
        ("/a.mdc", 200, "# A content"),
        ("/files/b.mdc", 200, "---\ndescription: Validate B\n---\n"),
    ])
    .await;
    let config = local_catalog(dir.path()).with_remote_url(format!("{base}/list"));
    let download_dir = config.remote_cache_dir.clone();

    let loader = CatalogLoader::new(config);
    let files = loader.list_descriptors().await;

    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|d| d.source == DescriptorSource::Remote));
    assert_eq!(files[0].name, "a.mdc");
    assert_eq!(files[0].description, "Server says A");
    assert!(files[0].remote_url.is_none());
    assert_eq!(files[1].description, "description: Validate B");
    assert_eq!(files[1].remote_url.as_deref(), Some("files/b.mdc"));

    let stored = download_dir.join("b.mdc");
    assert_eq!(files[1].path, stored.to_string_lossy());
    assert_eq!(fs::read_to_string(stored).unwrap(), "---\ndescription: Validate B\n---\n");

    let status = loader.cache_status();
    assert!(status.fresh);
    assert_eq!(status.entries, 2);
}

#[tokio::test]
async fn test_failed_listed_download_degrades_to_local() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve(&[
        ("/list", 200, r#"[{"name":"a.mdc"},{"name":"b.mdc"}]"#),
        ("/a.mdc", 500, "boom"),
        ("/b.mdc", 500, "boom"),
    ])
    .await;

    let loader = CatalogLoader::new(local_catalog(dir.path()).with_remote_url(base));
    let files = loader.list_descriptors().await;

    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|d| d.source == DescriptorSource::Local));
    assert!(loader.cache_status().timestamp.is_none());
}

#[tokio::test]
async fn test_one_failed_listed_download_is_not_a_partial_listing() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve(&[
        ("/list", 200, r#"[{"name":"a.mdc"},{"name":"b.mdc"}]"#),
        ("/a.mdc", 200, "# A"),
    ])
    .await;

    let loader = CatalogLoader::new(local_catalog(dir.path()).with_remote_url(base));
    let files = loader.list_descriptors().await;

    assert!(files.iter().all(|d| d.source == DescriptorSource::Local));
    assert!(loader.cache_status().timestamp.is_none());
}

#[tokio::test]
async fn test_direct_fallback_is_partial_and_uncached() {
    let dir = tempfile::tempdir().unwrap();
    let base = serve(&[
        ("/list", 503, "unavailable"),
        ("/termweb.mdc", 200, "# Extract and validate links from TermWeb"),
    ])
    .await;

    let loader = CatalogLoader::new(
        local_catalog(dir.path())
            .with_remote_url(base)
            .with_expected_files(vec!["termweb.mdc".to_string(), "missing.mdc".to_string()]),
    );
    let files = loader.list_descriptors().await;

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "termweb.mdc");
    assert_eq!(files[0].source, DescriptorSource::Remote);
    assert_eq!(files[0].description, "Extract and validate links from TermWeb");
    assert!(loader.cache_status().timestamp.is_none());
}
