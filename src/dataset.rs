// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Walks a repository directory and builds a fresh [`DataSet`] from whatever
//! `.rpm` files and comps configuration are found there.

use std::path::Path;

use crate::comps;
use crate::config::Config;
use crate::error::Result;
use crate::model::DataSet;
use crate::rpm_adapter;

/// Scan `base_dir` for `.rpm` files (skipping `repodata/`) and load each one
/// into the model, in sorted relative-path order for determinism across runs.
pub fn build(base_dir: &Path, config: &Config) -> Result<DataSet> {
    let mut rel_paths: Vec<String> = walkdir::WalkDir::new(base_dir)
        .into_iter()
        .filter_entry(|e| e.file_name() != "repodata")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rpm"))
        .filter_map(|e| {
            e.path()
                .strip_prefix(base_dir)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    rel_paths.sort();

    let mut packages = Vec::with_capacity(rel_paths.len());
    let mut files = Vec::with_capacity(rel_paths.len());

    for rel_path in &rel_paths {
        log::debug!("loading package {rel_path}");
        let (package, package_files) = rpm_adapter::load_package(base_dir, rel_path)?;
        packages.push(package);
        files.push(package_files);
    }

    let comps = match &config.comps_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let mut reader = quick_xml::Reader::from_str(&text);
            Some(comps::parse_comps(&mut reader)?)
        }
        None => None,
    };

    log::info!("scanned {} package(s) under {}", packages.len(), base_dir.display());

    Ok(DataSet { packages, files, comps })
}
