// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Loading, validating, and persisting `repodata/.config.yaml`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compress::CompressionType;
use crate::error::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".config.yaml";
const DEFAULT_EXPUNGE_OLD_METADATA: u64 = 172800;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default, rename = "compressAlgo", skip_serializing_if = "Option::is_none")]
    compress_algo: Option<String>,
    #[serde(default, rename = "compsFile", skip_serializing_if = "Option::is_none")]
    comps_file: Option<PathBuf>,
    #[serde(default, rename = "expungeOldMetadata", skip_serializing_if = "Option::is_none")]
    expunge_old_metadata: Option<u64>,
}

/// Repository configuration, either loaded from `.config.yaml` or defaulted.
#[derive(Debug, Clone)]
pub struct Config {
    pub compress_algo: CompressionType,
    pub comps_file: Option<PathBuf>,
    pub expunge_old_metadata: u64,
    /// Set when this `Config` was defaulted rather than loaded, so `Repo::new`
    /// knows to persist it on the first `create()` call. Never serialized.
    pub write_config: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            compress_algo: CompressionType::default(),
            comps_file: None,
            expunge_old_metadata: DEFAULT_EXPUNGE_OLD_METADATA,
            write_config: true,
        }
    }
}

/// Load `<base_dir>/repodata/.config.yaml`, returning `None` if it is absent.
pub fn load(base_dir: &Path) -> Result<Option<Config>> {
    let path = base_dir.join("repodata").join(CONFIG_FILE_NAME);
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let file: ConfigFile = serde_yaml::from_str(&text)
        .map_err(|e| Error::ConfigInvalid(format!("{}: {}", path.display(), e)))?;

    let compress_algo = match file.compress_algo {
        Some(value) => CompressionType::from_config_str(&value)
            .ok_or_else(|| Error::ConfigInvalid(format!("unsupported compressAlgo {value:?}")))?,
        None => CompressionType::default(),
    };

    Ok(Some(Config {
        compress_algo,
        comps_file: file.comps_file,
        expunge_old_metadata: file.expunge_old_metadata.unwrap_or(DEFAULT_EXPUNGE_OLD_METADATA),
        write_config: false,
    }))
}

/// Persist `config` to `<base_dir>/repodata/.config.yaml`.
pub fn save(base_dir: &Path, config: &Config) -> Result<()> {
    let path = base_dir.join("repodata").join(CONFIG_FILE_NAME);
    let algo = match config.compress_algo {
        CompressionType::Gzip => "gz",
        CompressionType::Xz => "xz",
    };
    let file = ConfigFile {
        compress_algo: Some(algo.to_owned()),
        comps_file: config.comps_file.clone(),
        expunge_old_metadata: Some(config.expunge_old_metadata),
    };
    let text = serde_yaml::to_string(&file)?;
    std::fs::write(&path, text)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("repodata")).unwrap();
        std::fs::write(
            dir.path().join("repodata").join(CONFIG_FILE_NAME),
            "compressAlgo: xz\nbogusKey: true\n",
        )
        .unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn rejects_bad_compress_algo() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("repodata")).unwrap();
        std::fs::write(
            dir.path().join("repodata").join(CONFIG_FILE_NAME),
            "compressAlgo: bz2\n",
        )
        .unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("repodata")).unwrap();
        let config = Config {
            compress_algo: CompressionType::Gzip,
            comps_file: Some(PathBuf::from("/tmp/comps.xml")),
            expunge_old_metadata: 60,
            write_config: true,
        };
        save(dir.path(), &config).unwrap();
        let loaded = load(dir.path()).unwrap().unwrap();
        assert_eq!(loaded.compress_algo, CompressionType::Gzip);
        assert_eq!(loaded.expunge_old_metadata, 60);
        assert_eq!(loaded.comps_file, Some(PathBuf::from("/tmp/comps.xml")));
        assert!(!loaded.write_config);
    }
}
