// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Crash-safe "write somewhere else, then rename over the destination" file writes.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Write `bytes` to `path` atomically: write to `path` with a `.tmp` suffix,
/// then rename over the destination. Returns the destination's mtime, in
/// seconds since the epoch, observed after the rename.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<u64> {
    let tmp_path = {
        let mut s = path.as_os_str().to_owned();
        s.push(".tmp");
        std::path::PathBuf::from(s)
    };

    fs::write(&tmp_path, bytes)?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    let metadata = fs::metadata(path)?;
    let mtime = metadata
        .modified()?
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    Ok(mtime)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn writes_and_renames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repomd.xml");

        let mtime = write_file(&path, b"hello").unwrap();
        assert!(mtime > 0);
        assert_eq!(fs::read(&path).unwrap(), b"hello");
        assert!(!dir.path().join("repomd.xml.tmp").exists());

        write_file(&path, b"goodbye").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"goodbye");
    }
}
