// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! End-to-end scans of a repository directory through [`Repo::create`].
//!
//! No `.rpm` fixture files are available in this environment, so these
//! exercise the full scan -> publish -> retention loop against directories
//! with zero packages; that still drives every stage downstream of RPM
//! header parsing (config load/save, XML publish, change detection, history,
//! and GC).

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use createrepo_rs::config::Config;
use createrepo_rs::model::{DataEntry, DataKind, DataSet, History, Revision};
use createrepo_rs::{publish, retention, Repo};
use pretty_assertions::assert_eq;

#[test]
fn first_run_creates_full_repodata_layout() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repo::new(dir.path(), None).unwrap();
    let summary = repo.create().unwrap();

    assert_eq!(summary.rpms, 0);
    assert!(summary.updated);
    assert_eq!(summary.expunged, 0);
    assert!(summary.gc_error.is_none());

    let repodata = dir.path().join("repodata");
    assert!(repodata.join("repomd.xml").exists());
    assert!(repodata.join(".history.xml").exists());
    assert!(repodata.join(".config.yaml").exists());

    let repomd_xml = fs::read_to_string(repodata.join("repomd.xml")).unwrap();
    assert!(repomd_xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(repomd_xml.contains("<data type=\"primary\">"));
    assert!(repomd_xml.contains("<data type=\"filelists\">"));
    assert!(!repomd_xml.contains("<data type=\"group\">"));
}

#[test]
fn repeated_runs_are_idempotent_until_config_changes() {
    let dir = tempfile::tempdir().unwrap();

    let repo = Repo::new(dir.path(), None).unwrap();
    let first = repo.create().unwrap();
    assert!(first.updated);

    let repo_again = Repo::new(dir.path(), None).unwrap();
    let second = repo_again.create().unwrap();
    assert!(!second.updated);
    assert_eq!(second.expunged, 0);

    let config = Config { expunge_old_metadata: 0, ..Config::default() };
    let repo_with_new_config = Repo::new(dir.path(), Some(config)).unwrap();
    let third = repo_with_new_config.create().unwrap();
    // Changing expunge_old_metadata doesn't change the built streams
    // themselves, so republishing is still skipped.
    assert!(!third.updated);
}

#[test]
fn rejects_a_path_that_is_not_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("not-a-dir");
    fs::write(&file_path, b"hello").unwrap();

    let err = Repo::new(&file_path, None).unwrap_err();
    assert!(matches!(err, createrepo_rs::Error::RepoDirInvalid(_)));
}

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

fn entry(kind: DataKind, href: &str) -> DataEntry {
    DataEntry {
        kind,
        checksum: createrepo_rs::checksum::Checksum::sha256_of("a".repeat(64)),
        open_checksum: createrepo_rs::checksum::Checksum::sha256_of("b".repeat(64)),
        location_href: href.to_owned(),
        timestamp: now(),
        size: 1,
        open_size: 1,
    }
}

/// Drives [`publish::publish`] and [`retention::clean`] directly (bypassing
/// the RPM scan) across three revisions, confirming that retention spares
/// whatever the latest `repomd.xml` still references while expiring
/// superseded revisions once their grace period elapses.
#[test]
fn publish_then_retire_across_three_revisions() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("repodata")).unwrap();
    let config = Config::default();

    let empty_dataset = DataSet { packages: vec![], files: vec![], comps: None };

    let (repomd_v1, updated_v1) = publish::publish(dir.path(), &config, &empty_dataset, None).unwrap();
    assert!(updated_v1);
    let primary_v1_href = repomd_v1.get(DataKind::Primary).unwrap().location_href.clone();
    assert!(dir.path().join(&primary_v1_href).exists());

    let mut history = History::default();
    history.append(&repomd_v1);

    // Republishing the identical (still-empty) dataset is a no-op.
    let (repomd_v1_again, updated_again) = publish::publish(dir.path(), &config, &empty_dataset, Some(&repomd_v1)).unwrap();
    assert!(!updated_again);
    assert_eq!(repomd_v1_again.get(DataKind::Primary).unwrap().location_href, primary_v1_href);

    // Force a second, distinct revision by back-dating the first one's
    // history entry well past its grace period, then cleaning with a
    // zero-second grace window so it's immediately eligible.
    history.revisions[0].obsoleted = now() - 10;
    let (history_after_gc, expunged, result) = retention::clean(dir.path(), history, 0);
    result.unwrap();
    // The sole revision is also the current (highest) one, so it's spared
    // regardless of its obsoletion time.
    assert_eq!(expunged, 0);
    assert!(dir.path().join(&primary_v1_href).exists());
    assert_eq!(history_after_gc.revisions.len(), 1);

    // Now simulate a real second revision superseding the first.
    let mut history = history_after_gc;
    let mut superseded = history.revisions[0].clone();
    superseded.revision = 1.0;
    superseded.obsoleted = now() - 1_000_000;
    let mut current = Revision {
        obsoleted: 0,
        revision: 2.0,
        data: vec![entry(DataKind::Primary, "repodata/newer-primary.xml.xz")],
    };
    fs::write(dir.path().join("repodata/newer-primary.xml.xz"), b"fresh").unwrap();
    std::mem::swap(&mut history.revisions[0], &mut superseded);
    history.revisions.push(std::mem::replace(&mut current, Revision { obsoleted: 0, revision: 0.0, data: vec![] }));

    let (final_history, expunged, result) = retention::clean(dir.path(), history, 0);
    result.unwrap();
    assert_eq!(expunged, 1);
    assert_eq!(final_history.revisions.len(), 1);
    assert_eq!(final_history.revisions[0].revision, 2.0);
    assert!(!dir.path().join(&primary_v1_href).exists());
    assert!(dir.path().join("repodata/newer-primary.xml.xz").exists());
}
