#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use binstage::{HttpClient, HttpResponse, InstallOptions, Platform, ReleasesConfig};
use binstage_verify::Sha256Hasher;
use bytes::Bytes;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{Value, json};
use zip::write::SimpleFileOptions;

pub const BASE: &str = "http://mirror.test";

const SPKI_PREFIX: [u8; 12] = [0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00];

pub enum Route {
    Body(u16, Bytes),
    Fail,
    Hang,
}

/// In-memory release host.
#[derive(Default)]
pub struct MockClient {
    routes:      Mutex<HashMap<String, Route>>,
    requests:    Mutex<Vec<String>>,
    user_agents: Mutex<Vec<Option<String>>>,
}

impl MockClient {
    pub fn route(&self, url: impl Into<String>, route: Route) {
        self.routes.lock().unwrap().insert(url.into(), route);
    }

    pub fn serve(&self, url: impl Into<String>, body: impl Into<Bytes>) { self.route(url, Route::Body(200, body.into())) }

    pub fn requests(&self) -> Vec<String> { self.requests.lock().unwrap().clone() }

    pub fn user_agents(&self) -> Vec<Option<String>> { self.user_agents.lock().unwrap().clone() }
}

impl HttpClient for MockClient {
    type Error = std::io::Error;

    async fn get(&self, url: &str, headers: &[(String, String)]) -> std::io::Result<HttpResponse<std::io::Error>> {
        self.requests.lock().unwrap().push(url.to_string());
        let agent = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map(|(_, value)| value.clone());
        self.user_agents.lock().unwrap().push(agent);
        let route = match self.routes.lock().unwrap().get(url) {
            Some(Route::Body(status, body)) => Some((*status, body.clone())),
            Some(Route::Fail) => return Err(std::io::Error::other("connection reset")),
            Some(Route::Hang) => None,
            None => Some((404, Bytes::new())),
        };
        let Some((status, body)) = route else {
            return std::future::pending().await;
        };
        let chunks: Vec<std::io::Result<Bytes>> = vec![Ok(body)];
        Ok(HttpResponse {
            status,
            content_length: None,
            body: Box::pin(futures_util::stream::iter(chunks)),
        })
    }
}

pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn pem_for(key: &SigningKey) -> String {
    let mut der = SPKI_PREFIX.to_vec();
    der.extend_from_slice(key.verifying_key().as_bytes());
    format!("-----BEGIN PUBLIC KEY-----\n{}\n-----END PUBLIC KEY-----\n", STANDARD.encode(der))
}

pub fn linux() -> Platform { Platform::new("linux", "amd64") }

/// OpenPGP key whose signing subkey signed the `tofu 1.6.2` fixture release.
pub const RELEASE_KEY: &str = include_str!("../fixtures/release-key.asc");

pub const FIXTURE_ARCHIVE: &[u8] = include_bytes!("../fixtures/tofu_1.6.2_linux_amd64.zip");
pub const FIXTURE_SUMS: &[u8] = include_bytes!("../fixtures/tofu_1.6.2_SHA256SUMS");
pub const FIXTURE_SUMS_SIG: &[u8] = include_bytes!("../fixtures/tofu_1.6.2_SHA256SUMS.sig");

/// Serve the gpg-signed `tofu 1.6.2` release under `base`, laid out like the
/// public release host: binary detached signature over `SHA256SUMS`.
pub fn serve_signed_fixture(client: &MockClient, base: &str) {
    let filename = "tofu_1.6.2_linux_amd64.zip";
    let url = |file: &str| format!("{base}/tofu/1.6.2/{file}");

    client.serve(url(filename), FIXTURE_ARCHIVE);
    client.serve(url("tofu_1.6.2_SHA256SUMS"), FIXTURE_SUMS);
    client.serve(url("tofu_1.6.2_SHA256SUMS.sig"), FIXTURE_SUMS_SIG);

    let entry = json!({
        "name": "tofu",
        "version": "1.6.2",
        "shasums": "tofu_1.6.2_SHA256SUMS",
        "shasums_signature": "tofu_1.6.2_SHA256SUMS.sig",
        "builds": [{
            "name": "tofu", "version": "1.6.2", "os": "linux", "arch": "amd64",
            "filename": filename,
            "url": url(filename),
        }],
    });
    client.serve(url("index.json"), serde_json::to_vec(&entry).unwrap());
}

/// A signing release host plus the scratch space an install writes into.
pub struct Host {
    pub client: Arc<MockClient>,
    pub signer: SigningKey,
    pub root:   tempfile::TempDir,
    versions:   Mutex<HashMap<String, serde_json::Map<String, Value>>>,
}

impl Host {
    pub fn new() -> Self {
        Self {
            client:   Arc::new(MockClient::default()),
            signer:   SigningKey::from_bytes(&[42; 32]),
            root:     tempfile::Builder::new().prefix("binstage-it-").tempdir().unwrap(),
            versions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> ReleasesConfig {
        ReleasesConfig::default()
            .base_url(BASE)
            .armored_public_key(pem_for(&self.signer))
    }

    pub fn install_dir(&self) -> PathBuf { self.root.path().join("bin") }

    pub fn license_dir(&self) -> PathBuf { self.root.path().join("licenses") }

    pub fn options(&self) -> InstallOptions {
        InstallOptions::default()
            .install_dir(self.install_dir())
            .platform(linux())
            .config(self.config())
    }

    pub fn artifact_name(product: &str, version: &str) -> String { format!("{product}_{version}_linux_amd64.zip") }

    pub fn release_url(product: &str, version: &str, file: &str) -> String { format!("{BASE}/{product}/{version}/{file}") }

    /// Publish a signed linux/amd64 release and refresh the product index.
    pub fn publish(&self, product: &str, version: &str, archive: Vec<u8>) {
        let filename = Self::artifact_name(product, version);
        let shasums = format!("{product}_{version}_SHA256SUMS");
        let signature = format!("{shasums}.sig");

        let manifest = format!(
            "{}  {filename}\n{}  {product}_{version}_darwin_arm64.zip\n",
            hex::encode(Sha256Hasher::digest(&archive)),
            hex::encode(Sha256Hasher::digest(b"other platform")),
        );
        let sig = self.signer.sign(manifest.as_bytes()).to_bytes();

        self.client.serve(Self::release_url(product, version, &filename), archive);
        self.client.serve(Self::release_url(product, version, &shasums), manifest);
        self.client.serve(Self::release_url(product, version, &signature), sig.to_vec());

        let entry = json!({
            "name": product,
            "version": version,
            "shasums": shasums,
            "shasums_signature": signature,
            "builds": [{
                "name": product, "version": version, "os": "linux", "arch": "amd64",
                "filename": filename,
                "url": format!("https://releases.example.com/{product}/{version}/{filename}"),
            }],
        });
        self.client.serve(
            Self::release_url(product, version, "index.json"),
            serde_json::to_vec(&entry).unwrap(),
        );

        let mut versions = self.versions.lock().unwrap();
        let all = versions.entry(product.to_string()).or_default();
        all.insert(version.to_string(), entry);
        let index = json!({ "name": product, "versions": Value::Object(all.clone()) });
        self.client.serve(format!("{BASE}/{product}/index.json"), serde_json::to_vec(&index).unwrap());
    }

    /// Publish a release whose archive holds `binary` with `contents`.
    pub fn publish_binary(&self, product: &str, version: &str, binary: &str, contents: &[u8]) {
        self.publish(product, version, zip_archive(&[(binary, contents)]));
    }
}

#[cfg(unix)]
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).unwrap().permissions().mode() & 0o777
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
