// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Change detection and the atomic multi-file publish protocol: decide
//! whether the freshly scanned [`DataSet`] differs from what's already on
//! disk, and if so, write the new streams and `repomd.xml` without ever
//! leaving the repository in a state where `repomd.xml` references a file
//! that doesn't exist.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::checksum::{sha256_bytes, Checksum};
use crate::compress::{compress, CompressionType};
use crate::config::Config;
use crate::error::Result;
use crate::model::{DataEntry, DataKind, DataSet, RepoMd};
use crate::xml::{self, filelists, primary, repomd};

struct BuiltStream {
    kind: DataKind,
    bytes: Vec<u8>,
}

fn build_streams(dataset: &DataSet) -> Result<Vec<BuiltStream>> {
    let mut out = Vec::with_capacity(3);

    let primary_bytes = xml::serialize_document(|w| primary::write_primary(&dataset.packages, w))?;
    out.push(BuiltStream { kind: DataKind::Primary, bytes: primary_bytes });

    let filelists_bytes = xml::serialize_document(|w| filelists::write_filelists(&dataset.files, w))?;
    out.push(BuiltStream { kind: DataKind::Filelists, bytes: filelists_bytes });

    if let Some(comps) = &dataset.comps {
        let comps_bytes = xml::serialize_document(|w| crate::comps::write_comps(comps, w))?;
        out.push(BuiltStream { kind: DataKind::Group, bytes: comps_bytes });
    }

    Ok(out)
}

/// True iff `old` already reflects exactly what `built` would publish: a
/// `primary`/`filelists` pair (and a `group` entry iff comps is present),
/// each with a matching open-checksum and a file that still exists on disk.
fn same_content(old: Option<&RepoMd>, built: &[BuiltStream], base_dir: &Path) -> bool {
    let Some(old) = old else { return false };

    let has_comps = built.iter().any(|s| s.kind == DataKind::Group);
    if has_comps != old.data.iter().any(|d| d.kind == DataKind::Group) {
        return false;
    }

    for stream in built {
        let Some(old_entry) = old.get(stream.kind) else { return false };
        let fresh_open_checksum = sha256_bytes(&stream.bytes);
        if old_entry.open_checksum.hex != fresh_open_checksum {
            return false;
        }
        if !base_dir.join(&old_entry.location_href).exists() {
            return false;
        }
    }
    true
}

fn publish_stream(base_dir: &Path, stream: &BuiltStream, algo: CompressionType) -> Result<(DataEntry, PathBuf)> {
    let open_checksum = Checksum::sha256_of(sha256_bytes(&stream.bytes));
    let open_size = stream.bytes.len() as u64;

    let compressed = compress(&stream.bytes, algo)?;
    let checksum = Checksum::sha256_of(sha256_bytes(&compressed));
    let size = compressed.len() as u64;

    let href = format!(
        "repodata/{}-{}.xml{}",
        checksum.hex,
        stream.kind.as_str(),
        algo.to_file_extension()
    );
    let path = base_dir.join(&href);
    let timestamp = crate::atomic::write_file(&path, &compressed)?;

    Ok((
        DataEntry {
            kind: stream.kind,
            checksum,
            open_checksum,
            location_href: href,
            timestamp,
            size,
            open_size,
        },
        path,
    ))
}

/// Read the current `repomd.xml`, if any. Returns `None` when absent.
pub fn read_current_repomd(base_dir: &Path) -> Result<Option<RepoMd>> {
    let path = base_dir.join("repodata").join("repomd.xml");
    match fs::File::open(&path) {
        Ok(f) => Ok(Some(repomd::read_repomd(std::io::BufReader::new(f))?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Compare the fresh dataset against the current `repomd.xml` and, if
/// anything differs, publish the new streams and index. Returns the live
/// `RepoMd` (old or new) and whether a publish actually happened.
pub fn publish(base_dir: &Path, config: &Config, dataset: &DataSet, old_repomd: Option<&RepoMd>) -> Result<(RepoMd, bool)> {
    let built = build_streams(dataset)?;

    if same_content(old_repomd, &built, base_dir) {
        log::info!("repository content unchanged, skipping republish");
        return Ok((old_repomd.cloned().unwrap(), false));
    }

    let mut written_paths = Vec::new();
    let mut data = Vec::with_capacity(built.len());

    for stream in &built {
        match publish_stream(base_dir, stream, config.compress_algo) {
            Ok((entry, path)) => {
                written_paths.push(path);
                data.push(entry);
            }
            Err(e) => {
                for path in &written_paths {
                    let _ = fs::remove_file(path);
                }
                return Err(e);
            }
        }
    }

    let revision = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    let new_repomd = RepoMd { revision, data };

    let repomd_bytes = xml::serialize_document(|w| repomd::write_repomd(&new_repomd, w))?;
    if let Err(e) = crate::atomic::write_file(&base_dir.join("repodata").join("repomd.xml"), &repomd_bytes) {
        for path in &written_paths {
            let _ = fs::remove_file(path);
        }
        return Err(e);
    }

    log::info!("published {} metadata stream(s)", new_repomd.data.len());
    Ok((new_repomd, true))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::Package;

    fn dataset_with(n: usize) -> DataSet {
        let packages = (0..n)
            .map(|i| Package {
                name: format!("pkg{i}"),
                arch: "x86_64".into(),
                ..Default::default()
            })
            .collect();
        DataSet { packages, files: Vec::new(), comps: None }
    }

    #[test]
    fn first_publish_writes_repomd_and_streams() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("repodata")).unwrap();
        let config = Config::default();
        let dataset = dataset_with(2);

        let (repomd, updated) = publish(dir.path(), &config, &dataset, None).unwrap();
        assert!(updated);
        assert_eq!(repomd.data.len(), 2);
        assert!(dir.path().join("repodata/repomd.xml").exists());
        for entry in &repomd.data {
            assert!(dir.path().join(&entry.location_href).exists());
        }
    }

    #[test]
    fn second_publish_with_no_changes_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("repodata")).unwrap();
        let config = Config::default();
        let dataset = dataset_with(2);

        let (repomd1, updated1) = publish(dir.path(), &config, &dataset, None).unwrap();
        assert!(updated1);

        let (repomd2, updated2) = publish(dir.path(), &config, &dataset, Some(&repomd1)).unwrap();
        assert!(!updated2);
        assert_eq!(repomd2.revision, repomd1.revision);
    }

    #[test]
    fn changed_dataset_triggers_republish() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("repodata")).unwrap();
        let config = Config::default();

        let (repomd1, _) = publish(dir.path(), &config, &dataset_with(1), None).unwrap();
        let (repomd2, updated) = publish(dir.path(), &config, &dataset_with(2), Some(&repomd1)).unwrap();
        assert!(updated);
        assert_ne!(repomd1.get(DataKind::Primary).unwrap().checksum.hex, repomd2.get(DataKind::Primary).unwrap().checksum.hex);
        // the old primary file is untouched by publish() itself — retention GC handles that.
        assert!(dir.path().join(&repomd1.get(DataKind::Primary).unwrap().location_href).exists());
    }
}
