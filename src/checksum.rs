// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Content checksums, cached in the `user.repo.checksum` extended attribute
//! so that immutable RPM files are not reread on every run.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const XATTR_NAME: &str = "user.repo.checksum";

/// A checksum of package content, as recorded in repository metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    pub kind: &'static str,
    pub hex: String,
}

impl Checksum {
    pub fn sha256_of(hex: impl Into<String>) -> Self {
        Checksum {
            kind: "sha256",
            hex: hex.into(),
        }
    }
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path).map_err(Error::ChecksumIo)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = reader.read(&mut buffer).map_err(Error::ChecksumIo)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Read the cached checksum from the file's extended attribute, if any.
///
/// Only the `sha256` checksum type is understood; anything else (or a
/// malformed value) is treated as a cache miss rather than an error.
fn read_xattr_checksum(path: &Path) -> Option<Checksum> {
    let raw = xattr::get(path, XATTR_NAME).ok().flatten()?;
    let text = std::str::from_utf8(&raw).ok()?;
    let mut parts = text.split(' ');
    let kind = parts.next()?;
    let hex = parts.next()?;
    if parts.next().is_some() || kind != "sha256" {
        return None;
    }
    Some(Checksum::sha256_of(hex.to_owned()))
}

fn write_xattr_checksum(path: &Path, checksum: &Checksum) -> Result<()> {
    let value = format!("{} {}", checksum.kind, checksum.hex);
    xattr::set(path, XATTR_NAME, value.as_bytes()).map_err(Error::XattrIo)
}

/// Return the SHA-256 checksum of `path`, preferring a cached value stored in
/// the file's extended attributes and populating the cache on a miss.
pub fn cached_checksum(path: &Path) -> Result<Checksum> {
    if let Some(checksum) = read_xattr_checksum(path) {
        log::debug!("checksum cache hit for {}", path.display());
        return Ok(checksum);
    }
    log::debug!("checksum cache miss for {}, hashing", path.display());
    let hex = sha256_file(path)?;
    let checksum = Checksum::sha256_of(hex);
    write_xattr_checksum(path, &checksum)?;
    Ok(checksum)
}
