// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reads a single RPM file into the [`Package`]/[`PackageFiles`] model,
//! using the `rpm` crate for header parsing.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rpm::DependencyFlags;

use crate::checksum::cached_checksum;
use crate::dependency::{self, RawDependency};
use crate::error::Result;
use crate::model::{FileEntry, Package, PackageFiles};

/// Decode an RPM dependency's flags into the `(flag, pre)` pair, checking
/// bits in the order `LE, GE, LT, GT, EQ` — one flag wins.
fn get_flag(flags: DependencyFlags) -> (Option<&'static str>, bool) {
    let flag = if flags.contains(DependencyFlags::LE) {
        Some("LE")
    } else if flags.contains(DependencyFlags::GE) {
        Some("GE")
    } else if flags.contains(DependencyFlags::LESS) {
        Some("LT")
    } else if flags.contains(DependencyFlags::GREATER) {
        Some("GT")
    } else if flags.contains(DependencyFlags::EQUAL) {
        Some("EQ")
    } else {
        None
    };
    let pre = flags.intersects(
        DependencyFlags::PREREQ | DependencyFlags::SCRIPT_PRE | DependencyFlags::SCRIPT_POST,
    );
    (flag, pre)
}

fn to_raw(dep: rpm::Dependency) -> RawDependency {
    let (flag, pre) = get_flag(dep.flags);
    RawDependency {
        name: dep.name,
        version: dep.version,
        flag,
        pre,
    }
}

/// Read one RPM file, relative to `base_dir`, into the in-memory model.
///
/// `rel_path` is used verbatim as the package's `location_href` (a path
/// relative to the repository root), preserving filesystem-walk order when
/// packages are loaded in walk order by the caller.
pub fn load_package(base_dir: &Path, rel_path: &str) -> Result<(Package, PackageFiles)> {
    let full_path = base_dir.join(rel_path);
    let file = File::open(&full_path)?;
    let file_metadata = file.metadata()?;

    let pkg = rpm::PackageMetadata::parse(&mut BufReader::new(&file))?;

    let arch = if pkg.is_source_package() {
        "src"
    } else {
        pkg.get_arch()?
    }
    .to_owned();

    let group = pkg.get_group().map(|g| g.to_owned()).unwrap_or_else(|_| "Unspecified".to_owned());
    let group = if group.is_empty() { "Unspecified".to_owned() } else { group };

    let raw_provides: Vec<RawDependency> = pkg.get_provides()?.into_iter().map(to_raw).collect();
    let raw_requires: Vec<RawDependency> = pkg.get_requires()?.into_iter().map(to_raw).collect();
    let raw_obsoletes: Vec<RawDependency> = pkg.get_obsoletes()?.into_iter().map(to_raw).collect();

    let (provides, provides_set) = dependency::normalize(&raw_provides, &Default::default());
    let (requires, _) = dependency::normalize(&raw_requires, &provides_set);
    let (obsoletes, _) = dependency::normalize(&raw_obsoletes, &Default::default());

    let checksum = cached_checksum(&full_path)?;

    let offsets = pkg.get_package_segment_offsets();

    let package = Package {
        name: pkg.get_name()?.to_owned(),
        arch: arch.clone(),
        epoch: pkg.get_epoch().unwrap_or(0),
        version: pkg.get_version()?.to_owned(),
        release: pkg.get_release()?.to_owned(),
        checksum: checksum.clone(),
        location_href: rel_path.to_owned(),
        summary: pkg.get_summary().unwrap_or_default().to_owned(),
        description: pkg.get_description().unwrap_or_default().to_owned(),
        packager: pkg.get_packager().unwrap_or_default().to_owned(),
        url: pkg.get_url().unwrap_or_default().to_owned(),
        time_file: file_metadata
            .modified()?
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        time_build: pkg.get_build_time().unwrap_or(0),
        size_package: file_metadata.len(),
        size_installed: pkg.get_installed_size().unwrap_or(0),
        size_archive: pkg.get_installed_size().unwrap_or(0),
        rpm_license: pkg.get_license().unwrap_or_default().to_owned(),
        rpm_vendor: pkg.get_vendor().unwrap_or_default().to_owned(),
        rpm_group: group,
        rpm_buildhost: pkg.get_build_host().unwrap_or_default().to_owned(),
        rpm_sourcerpm: pkg.get_source_rpm().unwrap_or_default().to_owned(),
        rpm_header_start: offsets.header,
        rpm_header_end: offsets.payload,
        provides,
        requires,
        obsoletes,
    };

    let files = pkg
        .get_file_entries()?
        .into_iter()
        .map(|f: rpm::FileEntry| FileEntry {
            is_dir: f.mode.file_type() == rpm::FileType::Dir,
            path: f.path.to_string_lossy().into_owned(),
        })
        .collect();

    let package_files = PackageFiles {
        pkgid: checksum.hex,
        name: package.name.clone(),
        arch,
        epoch: package.epoch,
        version: package.version.clone(),
        release: package.release.clone(),
        files,
    };

    Ok((package, package_files))
}
