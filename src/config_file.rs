//! Generic config file loader, the format given by the file name
//! extension

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use strum_macros::IntoStaticStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum ConfigBackend {
    Json5,
    Yaml,
}

impl ConfigBackend {
    pub fn from_config_str<T: DeserializeOwned>(self, s: &str) -> Result<T> {
        match self {
            ConfigBackend::Json5 => serde_json5::from_str(s).map_err(|e| anyhow!("{e}")),
            ConfigBackend::Yaml => Ok(serde_yml::from_str(s)?),
        }
    }

    pub fn load_config_file<T: DeserializeOwned>(self, path: &Path) -> Result<T> {
        let s = std::fs::read_to_string(path)
            .with_context(|| anyhow!("loading config file from {path:?}"))?;
        let backend: &str = self.into();
        self.from_config_str(&s)
            .with_context(|| anyhow!("decoding {backend} from config file {path:?}"))
    }

    /// JSON is written for the Json5 backend, being a subset of it.
    pub fn to_config_string<T: Serialize>(self, value: &T) -> Result<String> {
        match self {
            ConfigBackend::Json5 => {
                serde_json::to_string_pretty(value).with_context(|| anyhow!("encoding config as JSON"))
            }
            ConfigBackend::Yaml => {
                serde_yml::to_string(value).with_context(|| anyhow!("encoding config as YAML"))
            }
        }
    }
}

pub const FILE_EXTENSIONS: &[(&str, ConfigBackend)] = &[
    ("json5", ConfigBackend::Json5),
    ("json", ConfigBackend::Json5),
    ("yml", ConfigBackend::Yaml),
    ("yaml", ConfigBackend::Yaml),
];

pub fn backend_from_path(path: &Path) -> Result<ConfigBackend> {
    if let Some(ext) = path.extension() {
        if let Some(ext) = ext.to_str() {
            if let Some((_, backend)) = FILE_EXTENSIONS.iter().find(|(e, _b)| *e == ext) {
                Ok(*backend)
            } else {
                bail!("given file path has an unknown extension {ext:?}: {path:?}")
            }
        } else {
            bail!("given file path has an extension that is not unicode: {path:?}")
        }
    } else {
        bail!(
            "given file path does not have an extension \
             for determining the file type: {path:?}"
        )
    }
}

pub trait LoadConfigFile: DeserializeOwned + Default {
    /// If `path` is given, the file must exist and decode, otherwise
    /// the default config is used.
    fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        if let Some(path) = path {
            let path = path.as_ref();
            let backend = backend_from_path(path)?;
            backend.load_config_file(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn t_backend_from_path() {
        let backend = |s: &str| backend_from_path(&PathBuf::from(s)).ok();
        assert_eq!(backend("a/b.json5"), Some(ConfigBackend::Json5));
        assert_eq!(backend("b.yaml"), Some(ConfigBackend::Yaml));
        assert_eq!(backend("b.hcl"), None);
        assert_eq!(backend("b"), None);
    }
}
