//! Gateway configuration.
//!
//! Configuration is driven by environment variables. An optional JSON file
//! named by `GATEWAY_CONFIG_FILE` supplies a base layer that environment
//! variables override.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use typed_builder::TypedBuilder;

use crate::alias::{AliasRouter, AliasTable};
use crate::error::{GatewayError, GatewayResult};

/// Default document served for paths ending in `/` when index mode is on.
pub const DEFAULT_INDEX_DOCUMENT: &str = "index.html";

/// Which storage collaborator serves objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3-compatible object storage.
    #[default]
    S3,
    /// Buckets are directories under a local root.
    Local,
}

impl FromStr for StorageBackend {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "local" => Ok(Self::Local),
            other => Err(GatewayError::Config(format!(
                "unknown storage backend {other:?} (expected \"s3\" or \"local\")"
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::S3 => "s3",
            Self::Local => "local",
        })
    }
}

/// Gateway configuration.
///
/// # Examples
///
/// ```
/// use bucketgate_core::GatewayConfig;
///
/// let config = GatewayConfig::builder()
///     .bucket_aliases([("static".to_owned(), "my-bucket".to_owned())].into())
///     .alias_index_html(true)
///     .build();
/// let router = config.alias_router().unwrap();
/// assert_eq!(router.route("/static/").unwrap().key, "index.html");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    /// Bind address for the gateway (e.g. `"0.0.0.0:8080"`).
    #[builder(default = String::from("0.0.0.0:8080"))]
    pub gateway_listen: String,

    /// Alias to bucket name mapping.
    #[builder(default)]
    #[serde(deserialize_with = "deserialize_alias_map")]
    pub bucket_aliases: BTreeMap<String, String>,

    /// Storage collaborator used to fetch objects.
    #[builder(default)]
    pub storage_backend: StorageBackend,

    /// Shared-credentials file handed to the S3 client.
    #[builder(default)]
    pub credentials_path: Option<String>,

    /// Custom S3 endpoint (MinIO, LocalStack, ...).
    #[builder(default)]
    pub storage_endpoint: Option<String>,

    /// S3 region.
    #[builder(default = String::from("us-east-1"))]
    pub storage_region: String,

    /// Use path-style S3 addressing.
    #[builder(default = false)]
    pub force_path_style: bool,

    /// Root directory for the local backend.
    #[builder(default = String::from("./data"))]
    pub local_storage_root: String,

    /// Resolve paths ending in `/` to [`index_document`](Self::index_document).
    #[builder(default = false)]
    pub alias_index_html: bool,

    /// Document name used in index mode.
    #[builder(default = String::from(DEFAULT_INDEX_DOCUMENT))]
    pub index_document: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl GatewayConfig {
    /// Load configuration from the environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_CONFIG_FILE` | *(unset)* |
    /// | `GATEWAY_LISTEN` | `0.0.0.0:8080` |
    /// | `BUCKET_ALIASES` | *(empty)* |
    /// | `STORAGE_BACKEND` | `s3` |
    /// | `STORAGE_CREDENTIALS_FILE` | *(unset)* |
    /// | `STORAGE_ENDPOINT_URL` | *(unset)* |
    /// | `STORAGE_REGION` | `us-east-1` |
    /// | `STORAGE_FORCE_PATH_STYLE` | `false` |
    /// | `LOCAL_STORAGE_ROOT` | `./data` |
    /// | `ALIAS_INDEX_HTML` | `false` |
    /// | `INDEX_DOCUMENT` | `index.html` |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Errors
    ///
    /// Fails when the config file cannot be read or parsed, or when
    /// `BUCKET_ALIASES` / `STORAGE_BACKEND` are malformed.
    pub fn from_env() -> GatewayResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// [`from_env`](Self::from_env) delegates here; tests pass a map instead
    /// of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> GatewayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("GATEWAY_CONFIG_FILE") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("BUCKET_ALIASES") {
            config.bucket_aliases = parse_alias_list(&v)?;
        }
        if let Some(v) = lookup("STORAGE_BACKEND") {
            config.storage_backend = v.parse()?;
        }
        if let Some(v) = lookup("STORAGE_CREDENTIALS_FILE") {
            config.credentials_path = Some(v);
        }
        if let Some(v) = lookup("STORAGE_ENDPOINT_URL") {
            config.storage_endpoint = Some(v);
        }
        if let Some(v) = lookup("STORAGE_REGION") {
            config.storage_region = v;
        }
        if let Some(v) = lookup("STORAGE_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }
        if let Some(v) = lookup("LOCAL_STORAGE_ROOT") {
            config.local_storage_root = v;
        }
        if let Some(v) = lookup("ALIAS_INDEX_HTML") {
            config.alias_index_html = parse_bool(&v);
        }
        if let Some(v) = lookup("INDEX_DOCUMENT") {
            config.index_document = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    ///
    /// An alias listed twice under `bucketAliases` is an error, as it is in
    /// `BUCKET_ALIASES`.
    pub fn from_file(path: impl AsRef<Path>) -> GatewayResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| GatewayError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Validate the alias mapping and build the router.
    pub fn alias_router(&self) -> GatewayResult<AliasRouter> {
        let table = AliasTable::new(
            self.bucket_aliases
                .iter()
                .map(|(alias, bucket)| (alias.as_str(), bucket.as_str())),
        )?;

        let index_document = if self.alias_index_html {
            if self.index_document.is_empty() || self.index_document.contains('/') {
                return Err(GatewayError::Config(format!(
                    "invalid index document {:?}",
                    self.index_document
                )));
            }
            Some(self.index_document.clone())
        } else {
            None
        };

        Ok(AliasRouter::new(table, index_document))
    }
}

/// Parse `alias=bucket` pairs separated by commas.
///
/// Whitespace around entries is ignored, as are empty entries.
///
/// # Examples
///
/// ```
/// let aliases = bucketgate_core::parse_alias_list("static=my-bucket, img=images").unwrap();
/// assert_eq!(aliases["img"], "images");
/// ```
pub fn parse_alias_list(raw: &str) -> GatewayResult<BTreeMap<String, String>> {
    let mut aliases = BTreeMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((alias, bucket)) = entry.split_once('=') else {
            return Err(GatewayError::Config(format!(
                "bucket alias entry {entry:?} is not of the form alias=bucket"
            )));
        };
        let alias = alias.trim().to_owned();
        if aliases.insert(alias.clone(), bucket.trim().to_owned()).is_some() {
            return Err(GatewayError::Config(format!(
                "alias {alias:?} is defined more than once"
            )));
        }
    }
    Ok(aliases)
}

/// Deserialize `bucketAliases`, rejecting repeated aliases instead of
/// keeping the last one.
fn deserialize_alias_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct AliasMapVisitor;

    impl<'de> Visitor<'de> for AliasMapVisitor {
        type Value = BTreeMap<String, String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of alias to bucket name")
        }

        fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
        where
            M: MapAccess<'de>,
        {
            let mut aliases = BTreeMap::new();
            while let Some((alias, bucket)) = access.next_entry::<String, String>()? {
                if aliases.contains_key(&alias) {
                    return Err(de::Error::custom(format!(
                        "alias {alias:?} is defined more than once"
                    )));
                }
                aliases.insert(alias, bucket);
            }
            Ok(aliases)
        }
    }

    deserializer.deserialize_map(AliasMapVisitor)
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_should_create_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.gateway_listen, "0.0.0.0:8080");
        assert!(config.bucket_aliases.is_empty());
        assert_eq!(config.storage_backend, StorageBackend::S3);
        assert!(config.credentials_path.is_none());
        assert_eq!(config.storage_region, "us-east-1");
        assert!(!config.alias_index_html);
        assert_eq!(config.index_document, "index.html");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_should_load_from_lookup() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("GATEWAY_LISTEN", "127.0.0.1:9000"),
            ("BUCKET_ALIASES", "static=my-bucket,img=images"),
            ("STORAGE_BACKEND", "local"),
            ("STORAGE_CREDENTIALS_FILE", "/etc/creds"),
            ("ALIAS_INDEX_HTML", "true"),
            ("LOCAL_STORAGE_ROOT", "/srv/buckets"),
        ]))
        .expect("valid config");

        assert_eq!(config.gateway_listen, "127.0.0.1:9000");
        assert_eq!(config.bucket_aliases.len(), 2);
        assert_eq!(config.bucket_aliases["static"], "my-bucket");
        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(config.credentials_path.as_deref(), Some("/etc/creds"));
        assert!(config.alias_index_html);
        assert_eq!(config.local_storage_root, "/srv/buckets");
    }

    #[test]
    fn test_should_layer_env_over_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"gatewayListen":"0.0.0.0:1234","bucketAliases":{{"docs":"docs-bucket"}},"aliasIndexHtml":true}}"#
        )
        .expect("write config");
        let path = file.path().to_string_lossy().into_owned();

        let config = GatewayConfig::from_lookup(lookup_from(&[
            ("GATEWAY_CONFIG_FILE", path.as_str()),
            ("GATEWAY_LISTEN", "0.0.0.0:4321"),
        ]))
        .expect("valid config");

        assert_eq!(config.gateway_listen, "0.0.0.0:4321");
        assert_eq!(config.bucket_aliases["docs"], "docs-bucket");
        assert!(config.alias_index_html);
        assert_eq!(config.storage_region, "us-east-1");
    }

    #[test]
    fn test_should_reject_duplicate_alias_in_config_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"bucketAliases":{{"docs":"first-bucket","docs":"second-bucket"}}}}"#
        )
        .expect("write config");

        let err = GatewayConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, GatewayError::ConfigParse(_)));
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_should_fail_on_missing_config_file() {
        let err = GatewayConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, GatewayError::ConfigFile { .. }));
    }

    #[test]
    fn test_should_reject_unknown_backend() {
        let err =
            GatewayConfig::from_lookup(lookup_from(&[("STORAGE_BACKEND", "ftp")])).unwrap_err();
        assert!(matches!(err, GatewayError::Config(_)));
    }

    #[test]
    fn test_should_parse_alias_list() {
        let aliases = parse_alias_list(" static = my-bucket ,, img=images ").expect("valid list");
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases["static"], "my-bucket");
        assert_eq!(aliases["img"], "images");

        assert!(parse_alias_list("").expect("empty list").is_empty());
        assert!(parse_alias_list("static").is_err());
        assert!(parse_alias_list("a=b,a=c").is_err());
    }

    #[test]
    fn test_should_build_router_with_index_document() {
        let config = GatewayConfig::builder()
            .bucket_aliases([("static".to_owned(), "my-bucket".to_owned())].into())
            .alias_index_html(true)
            .index_document("default.htm".into())
            .build();
        let router = config.alias_router().expect("valid router");
        assert_eq!(router.index_document(), Some("default.htm"));
        assert_eq!(
            router.route("/static/docs/").expect("route").key,
            "docs/default.htm"
        );
    }

    #[test]
    fn test_should_build_router_without_index_document() {
        let config = GatewayConfig::builder()
            .bucket_aliases([("static".to_owned(), "my-bucket".to_owned())].into())
            .build();
        let router = config.alias_router().expect("valid router");
        assert!(router.index_document().is_none());
    }

    #[test]
    fn test_should_reject_invalid_index_document() {
        let config = GatewayConfig::builder()
            .alias_index_html(true)
            .index_document("a/b.html".into())
            .build();
        assert!(config.alias_router().is_err());
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let config = GatewayConfig::default();
        let json = serde_json::to_string(&config).expect("test serialization");
        assert!(json.contains("gatewayListen"));
        assert!(json.contains("aliasIndexHtml"));
        assert!(json.contains(r#""storageBackend":"s3""#));
    }

    #[test]
    fn test_should_parse_storage_backend() {
        assert_eq!("S3".parse::<StorageBackend>().ok(), Some(StorageBackend::S3));
        assert_eq!(
            " local ".parse::<StorageBackend>().ok(),
            Some(StorageBackend::Local)
        );
        assert_eq!(StorageBackend::Local.to_string(), "local");
    }

    #[test]
    fn test_should_parse_bool_values() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }
}
