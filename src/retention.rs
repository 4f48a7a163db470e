// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Retention garbage collection: expire old revisions once their grace
//! period has elapsed, while never deleting a file the current (highest
//! revision) still references.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::model::History;

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Expire revisions older than `seconds` past their obsoletion time,
/// unlinking any of their files not referenced by the current (highest
/// `revision`) entry. Returns the updated history and the number of
/// revisions expunged, even if rewriting `history.xml` afterwards fails —
/// callers must not discard the count on a write error.
pub fn clean(base_dir: &Path, mut history: History, seconds: u64) -> (History, usize, Result<()>) {
    let current_revision = match history
        .revisions
        .iter()
        .map(|r| r.revision)
        .fold(None, |acc: Option<f64>, r| Some(acc.map_or(r, |a| a.max(r))))
    {
        Some(r) => r,
        None => return (history, 0, Err(Error::GcFailure("history has no revisions".into()))),
    };

    let blessed: HashSet<String> = history
        .revisions
        .iter()
        .find(|r| r.revision == current_revision)
        .map(|r| r.data.iter().map(|d| d.location_href.clone()).collect())
        .unwrap_or_default();

    let now = now();
    let mut expunged = 0usize;
    let mut retained = Vec::with_capacity(history.revisions.len());

    for mut revision in history.revisions.drain(..) {
        if revision.revision == current_revision {
            retained.push(revision);
            continue;
        }
        if revision.obsoleted == 0 {
            revision.obsoleted = now;
        }
        if now >= revision.obsoleted + seconds {
            for entry in &revision.data {
                if !blessed.contains(entry.location_href.as_str()) {
                    let path = base_dir.join(&entry.location_href);
                    if let Err(e) = fs::remove_file(&path)
                        && e.kind() != std::io::ErrorKind::NotFound
                    {
                        log::warn!("failed to unlink expired metadata file {}: {e}", path.display());
                    }
                }
            }
            expunged += 1;
        } else {
            retained.push(revision);
        }
    }

    history.revisions = retained;

    let write_result = write_history(base_dir, &history);
    (history, expunged, write_result)
}

fn write_history(base_dir: &Path, history: &History) -> Result<()> {
    let bytes = crate::xml::serialize_document(|w| crate::xml::history::write_history(history, w))?;
    crate::atomic::write_file(&base_dir.join("repodata").join(".history.xml"), &bytes)?;
    Ok(())
}

/// Read `repodata/.history.xml`, if any. Returns an empty history if absent.
pub fn read_history(base_dir: &Path) -> Result<History> {
    let path = base_dir.join("repodata").join(".history.xml");
    match fs::File::open(&path) {
        Ok(f) => crate::xml::history::read_history(std::io::BufReader::new(f)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(History::default()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::checksum::Checksum;
    use crate::model::{DataEntry, DataKind, Revision};

    fn entry(href: &str) -> DataEntry {
        DataEntry {
            kind: DataKind::Primary,
            checksum: Checksum::sha256_of("a".repeat(64)),
            open_checksum: Checksum::sha256_of("b".repeat(64)),
            location_href: href.to_owned(),
            timestamp: 0,
            size: 1,
            open_size: 1,
        }
    }

    #[test]
    fn spares_current_revision_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("repodata")).unwrap();
        fs::write(dir.path().join("repodata/current-primary.xml.xz"), b"x").unwrap();
        fs::write(dir.path().join("repodata/old-primary.xml.xz"), b"y").unwrap();

        let mut history = History::default();
        history.revisions.push(Revision {
            obsoleted: now() - 1000,
            revision: 1.0,
            data: vec![entry("repodata/old-primary.xml.xz")],
        });
        history.revisions.push(Revision {
            obsoleted: 0,
            revision: 2.0,
            data: vec![entry("repodata/current-primary.xml.xz")],
        });

        let (history, expunged, result) = clean(dir.path(), history, 0);
        result.unwrap();
        assert_eq!(expunged, 1);
        assert_eq!(history.revisions.len(), 1);
        assert!(dir.path().join("repodata/current-primary.xml.xz").exists());
        assert!(!dir.path().join("repodata/old-primary.xml.xz").exists());
    }

    #[test]
    fn does_not_expire_within_grace_period() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("repodata")).unwrap();

        let mut history = History::default();
        history.revisions.push(Revision { obsoleted: now(), revision: 1.0, data: vec![] });
        history.revisions.push(Revision { obsoleted: 0, revision: 2.0, data: vec![] });

        let (history, expunged, result) = clean(dir.path(), history, 172800);
        result.unwrap();
        assert_eq!(expunged, 0);
        assert_eq!(history.revisions.len(), 2);
    }

    #[test]
    fn shares_file_blessed_by_both_revisions() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("repodata")).unwrap();
        fs::write(dir.path().join("repodata/shared-primary.xml.xz"), b"x").unwrap();

        let mut history = History::default();
        history.revisions.push(Revision {
            obsoleted: now() - 1000,
            revision: 1.0,
            data: vec![entry("repodata/shared-primary.xml.xz")],
        });
        history.revisions.push(Revision {
            obsoleted: 0,
            revision: 2.0,
            data: vec![entry("repodata/shared-primary.xml.xz")],
        });

        let (_, expunged, result) = clean(dir.path(), history, 0);
        result.unwrap();
        assert_eq!(expunged, 1);
        assert!(dir.path().join("repodata/shared-primary.xml.xz").exists());
    }
}
