//! Integration tests for hubshell

mod support {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Minimal HTTP origin: `/missing*` answers 404, everything else 200
    /// with the request path as body.
    pub struct Origin {
        pub url: String,
        pub hits: Arc<AtomicUsize>,
    }

    impl Origin {
        pub fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let url = format!("http://{}", listener.local_addr().unwrap());
            let hits = Arc::new(AtomicUsize::new(0));

            let counter = hits.clone();
            std::thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(mut stream) = stream else { continue };
                    let mut reader = BufReader::new(stream.try_clone().unwrap());

                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).is_err() {
                        continue;
                    }
                    loop {
                        let mut header = String::new();
                        match reader.read_line(&mut header) {
                            Ok(0) | Err(_) => break,
                            Ok(_) if header == "\r\n" => break,
                            Ok(_) => {}
                        }
                    }

                    counter.fetch_add(1, Ordering::SeqCst);
                    let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
                    let (status, body) = if path.starts_with("/missing") {
                        ("404 Not Found", "not found".to_string())
                    } else {
                        ("200 OK", format!("body of {}", path))
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes());
                }
            });

            Self { url, hits }
        }

        pub fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    /// Write a config file pointing the store at `dir` and the cache at `origin`
    pub fn write_config(dir: &Path, origin: &str, manifest: &[&str]) -> PathBuf {
        let manifest = manifest
            .iter()
            .map(|m| format!("\"{}\"", m))
            .collect::<Vec<_>>()
            .join(", ");
        let config = format!(
            r#"[cache]
version = "connecthub-v1"
origin = "{origin}"
manifest = [{manifest}]
store_dir = "{store}"

[network]
probe_addr = "127.0.0.1:1"
probe_timeout_ms = 200

[notifications]
enabled = false
"#,
            origin = origin,
            manifest = manifest,
            store = dir.join("stores").display().to_string().replace('\\', "/"),
        );
        let path = dir.join("config.toml");
        std::fs::write(&path, config).unwrap();
        path
    }
}

mod cli_tests {
    use super::support::{write_config, Origin};
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn hubshell(config: &std::path::Path) -> Command {
        let mut cmd = cargo_bin_cmd!("hubshell");
        cmd.env("HUBSHELL_CONFIG", config).env("CI", "1");
        cmd
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("hubshell")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline-first application shell"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("hubshell")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("hubshell"));
    }

    #[test]
    fn config_path_honors_env() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("custom.toml");
        hubshell(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let dir = TempDir::new().unwrap();
        hubshell(&dir.path().join("config.toml"))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("connecthub-v1"));
    }

    #[test]
    fn config_set_then_show() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");

        hubshell(&config)
            .args(["config", "set", "cache.version", "connecthub-v9"])
            .assert()
            .success();

        hubshell(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("connecthub-v9"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let dir = TempDir::new().unwrap();
        hubshell(&dir.path().join("config.toml"))
            .args(["config", "set", "cache.ttl", "60"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn descriptor_prints_json() {
        let dir = TempDir::new().unwrap();
        hubshell(&dir.path().join("config.toml"))
            .arg("descriptor")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"short_name\": \"ConnectHub\""))
            .stdout(predicate::str::contains("\"display\": \"standalone\""));
    }

    #[test]
    fn status_without_stores() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "http://127.0.0.1:1", &["/"]);
        hubshell(&config)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache stores"))
            .stdout(predicate::str::contains("offline"));
    }

    #[test]
    fn clear_without_stores() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "http://127.0.0.1:1", &["/"]);
        hubshell(&config)
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache stores"));
    }

    #[test]
    fn install_then_fetch_from_cache() {
        let origin = Origin::start();
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), &origin.url, &["/", "/app.css"]);

        hubshell(&config)
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("connecthub-v1 is serving"));
        assert_eq!(origin.hits(), 2);

        hubshell(&config)
            .args(["fetch", "/app.css"])
            .assert()
            .success()
            .stdout(predicate::str::contains("body of /app.css"))
            .stderr(predicate::str::contains("from cache"));
        assert_eq!(origin.hits(), 2);

        hubshell(&config)
            .args(["fetch", "/other.js"])
            .assert()
            .success()
            .stderr(predicate::str::contains("from network"));
        assert_eq!(origin.hits(), 3);
    }

    #[test]
    fn fetch_leaves_waiting_stores_in_place() {
        let origin = Origin::start();
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), &origin.url, &["/"]);
        let stores = dir.path().join("stores");

        hubshell(&config).arg("install").assert().success();
        hubshell(&config)
            .args(["install", "--version", "connecthub-v2", "--no-activate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("connecthub-v2 is waiting"));

        hubshell(&config)
            .args(["fetch", "/"])
            .assert()
            .success()
            .stderr(predicate::str::contains("from cache"));

        assert!(stores.join("connecthub-v1").exists());
        assert!(stores.join("connecthub-v2").exists());
        assert_eq!(origin.hits(), 2);
    }

    #[test]
    fn install_fails_on_missing_resource() {
        let origin = Origin::start();
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), &origin.url, &["/", "/missing.css"]);

        hubshell(&config)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Installation of cache version connecthub-v1 failed"))
            .stderr(predicate::str::contains("HTTP 404"));

        assert!(!dir.path().join("stores").join("connecthub-v1").exists());
    }

    #[test]
    fn clear_deletes_installed_store() {
        let origin = Origin::start();
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), &origin.url, &["/"]);

        hubshell(&config).arg("install").assert().success();
        hubshell(&config)
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted connecthub-v1"));
    }
}

mod scenarios {
    use async_trait::async_trait;
    use hubshell::cache::{
        parse_origin, CacheManager, CacheStorage, CacheVersion, ManifestSet, MemoryStorage,
        Request, ResourceKey, Response,
    };
    use hubshell::fetch::Fetcher;
    use hubshell::network::{NetworkMonitor, NetworkState};
    use hubshell::notify::{
        Notification, NotificationOptions, NotificationPlatform, PermissionGate,
        PermissionState, PlatformPermission,
    };
    use hubshell::status::{StatusIndicator, StatusPresenter};
    use hubshell::{ShellError, ShellResult};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Fetcher serving fixed bodies and failing every other path
    #[derive(Default)]
    struct FixedOrigin {
        bodies: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
    }

    impl FixedOrigin {
        fn serving(paths: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                bodies: paths
                    .iter()
                    .map(|p| (format!("https://connecthub.example{}", p), format!("body {}", p)))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Fetcher for FixedOrigin {
        async fn fetch(&self, request: &Request) -> ShellResult<Response> {
            let url = request.key.as_str().to_string();
            self.calls.lock().unwrap().push(url.clone());
            match self.bodies.get(&url) {
                Some(body) => Ok(Response::new(200, body.clone())),
                None => Err(ShellError::fetch(url, "connection reset")),
            }
        }
    }

    fn key(path: &str) -> ResourceKey {
        ResourceKey::resolve(&parse_origin("https://connecthub.example").unwrap(), path).unwrap()
    }

    fn manifest(paths: &[&str]) -> ManifestSet {
        ManifestSet::resolve(&parse_origin("https://connecthub.example").unwrap(), paths).unwrap()
    }

    #[tokio::test]
    async fn scenario_a_install_activate_serve_from_cache() {
        let origin = FixedOrigin::serving(&["/", "/app.css"]);
        let cache = CacheManager::new(Arc::new(MemoryStorage::new()), origin.clone());
        let v1 = CacheVersion::new("connecthub-v1").unwrap();

        cache.install(&manifest(&["/", "/app.css"]), &v1).await.unwrap();
        cache.activate(&v1).await.unwrap();
        let after_install = origin.calls();

        for _ in 0..3 {
            let response = cache.intercept(&Request::get(key("/"))).await.unwrap();
            assert_eq!(response.body, b"body /");
        }
        assert_eq!(origin.calls(), after_install);
    }

    #[tokio::test]
    async fn scenario_b_failed_install_falls_back_to_network() {
        let origin = FixedOrigin::serving(&["/"]);
        let cache = CacheManager::new(Arc::new(MemoryStorage::new()), origin.clone());
        let v1 = CacheVersion::new("connecthub-v1").unwrap();

        let err = cache
            .install(&manifest(&["/", "/app.css"]), &v1)
            .await
            .unwrap_err();
        assert!(matches!(err, ShellError::Install { .. }));
        assert!(matches!(
            cache.activate(&v1).await,
            Err(ShellError::VersionNotInstalled(_))
        ));
        assert!(cache.storage().names().await.unwrap().is_empty());

        let before = origin.calls();
        let response = cache.intercept(&Request::get(key("/"))).await.unwrap();
        assert_eq!(response.body, b"body /");
        assert_eq!(origin.calls(), before + 1);
    }

    #[tokio::test]
    async fn version_eviction_keeps_only_current() {
        let origin = FixedOrigin::serving(&["/", "/app.css"]);
        let cache = CacheManager::new(Arc::new(MemoryStorage::new()), origin.clone());
        let v1 = CacheVersion::new("connecthub-v1").unwrap();
        let v2 = CacheVersion::new("connecthub-v2").unwrap();

        cache.restore(&manifest(&["/"]), &v1).await.unwrap();
        cache.install(&manifest(&["/", "/app.css"]), &v2).await.unwrap();
        let evicted = cache.activate(&v2).await.unwrap();

        assert_eq!(evicted, vec!["connecthub-v1".to_string()]);
        assert_eq!(cache.storage().names().await.unwrap(), vec!["connecthub-v2"]);
        assert!(cache
            .storage()
            .lookup("connecthub-v1", &key("/"))
            .await
            .unwrap()
            .is_none());
    }

    #[derive(Default)]
    struct Visibility {
        visible: Mutex<Option<NetworkState>>,
    }

    impl Visibility {
        fn get(&self) -> Option<NetworkState> {
            *self.visible.lock().unwrap()
        }
    }

    impl StatusIndicator for Visibility {
        fn show(&self, state: NetworkState) {
            *self.visible.lock().unwrap() = Some(state);
        }

        fn hide(&self) {
            *self.visible.lock().unwrap() = None;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn scenario_c_indicator_follows_connectivity_events() {
        let monitor = Arc::new(NetworkMonitor::new(NetworkState::Online));
        let indicator = Arc::new(Visibility::default());
        let presenter = Arc::new(StatusPresenter::new(
            Some(indicator.clone()),
            Duration::from_millis(3000),
        ));
        {
            let presenter = presenter.clone();
            monitor.on_change(move |state| presenter.on_transition(state));
        }

        monitor.apply_event(NetworkState::Offline);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(indicator.get(), Some(NetworkState::Offline));

        monitor.apply_event(NetworkState::Online);
        assert_eq!(indicator.get(), Some(NetworkState::Online));
        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(indicator.get(), Some(NetworkState::Online));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(indicator.get(), None);
    }

    struct DenyingPlatform {
        shown: Mutex<Vec<Notification>>,
    }

    #[async_trait]
    impl NotificationPlatform for DenyingPlatform {
        fn is_supported(&self) -> bool {
            true
        }

        async fn request_permission(&self) -> PlatformPermission {
            PlatformPermission::Denied
        }

        fn show(&self, notification: &Notification) {
            self.shown.lock().unwrap().push(notification.clone());
        }
    }

    #[tokio::test]
    async fn scenario_d_denied_permission_suppresses_notifications() {
        let platform = Arc::new(DenyingPlatform {
            shown: Mutex::new(Vec::new()),
        });
        let gate = PermissionGate::new(Some(platform.clone()));

        assert_eq!(gate.negotiate().await, PermissionState::Denied);
        gate.notify("x", &NotificationOptions::default());
        gate.notify("y", &NotificationOptions::default().body("ignored"));

        assert!(platform.shown.lock().unwrap().is_empty());
    }
}
