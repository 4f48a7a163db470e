// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The in-memory repodata model: packages, dependency entries, file lists,
//! and the repomd/history index structures built on top of them.

use crate::checksum::Checksum;

/// A single `provides`/`requires`/`obsoletes` dependency entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Entry {
    pub name: String,
    pub flags: String,
    pub epoch: String,
    pub version: String,
    pub release: String,
    pub pre: String,
}

/// One file or directory shipped by a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub is_dir: bool,
}

/// The subset of `rpm -qa` style fields this repository publishes in
/// `primary.xml`.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub name: String,
    pub arch: String,
    pub epoch: u32,
    pub version: String,
    pub release: String,
    pub checksum: Checksum,
    pub location_href: String,
    pub summary: String,
    pub description: String,
    pub packager: String,
    pub url: String,
    pub time_file: u64,
    pub time_build: u64,
    pub size_package: u64,
    pub size_installed: u64,
    pub size_archive: u64,
    pub rpm_license: String,
    pub rpm_vendor: String,
    pub rpm_group: String,
    pub rpm_buildhost: String,
    pub rpm_sourcerpm: String,
    pub rpm_header_start: u64,
    pub rpm_header_end: u64,
    pub provides: Vec<Entry>,
    pub requires: Vec<Entry>,
    pub obsoletes: Vec<Entry>,
}

impl Default for Checksum {
    fn default() -> Self {
        Checksum::sha256_of(String::new())
    }
}

/// The `filelists.xml` counterpart to a [`Package`].
#[derive(Debug, Clone)]
pub struct PackageFiles {
    pub pkgid: String,
    pub name: String,
    pub arch: String,
    pub epoch: u32,
    pub version: String,
    pub release: String,
    pub files: Vec<FileEntry>,
}

/// One `<data>` row of `repomd.xml` / a history revision.
#[derive(Debug, Clone)]
pub struct DataEntry {
    pub kind: DataKind,
    pub checksum: Checksum,
    pub open_checksum: Checksum,
    pub location_href: String,
    pub timestamp: u64,
    pub size: u64,
    pub open_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Primary,
    Filelists,
    Group,
}

impl DataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DataKind::Primary => "primary",
            DataKind::Filelists => "filelists",
            DataKind::Group => "group",
        }
    }
}

/// The parsed (or freshly built) `repomd.xml`.
#[derive(Debug, Clone, Default)]
pub struct RepoMd {
    pub revision: f64,
    pub data: Vec<DataEntry>,
}

impl RepoMd {
    pub fn get(&self, kind: DataKind) -> Option<&DataEntry> {
        self.data.iter().find(|d| d.kind == kind)
    }
}

/// One entry of the retention history.
#[derive(Debug, Clone)]
pub struct Revision {
    pub obsoleted: u64,
    pub revision: f64,
    pub data: Vec<DataEntry>,
}

/// `.history.xml`: the full sequence of published revisions.
#[derive(Debug, Clone, Default)]
pub struct History {
    pub revisions: Vec<Revision>,
}

impl History {
    /// Append a revision built from a freshly published [`RepoMd`]. A no-op
    /// if a revision with the same `revision` value is already present.
    pub fn append(&mut self, repomd: &RepoMd) {
        if self
            .revisions
            .iter()
            .any(|r| r.revision == repomd.revision)
        {
            return;
        }
        self.revisions.push(Revision {
            obsoleted: 0,
            revision: repomd.revision,
            data: repomd.data.clone(),
        });
    }
}

/// A fully built set of metadata streams, ready to publish.
pub struct DataSet {
    pub packages: Vec<Package>,
    pub files: Vec<PackageFiles>,
    pub comps: Option<crate::comps::Comps>,
}
