// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Top-level orchestration: [`Repo::new`] resolves configuration for a
//! directory, and [`Repo::create`] runs one full scan-build-publish-GC pass.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::{config, dataset, publish, retention};

/// A handle on one repository directory and its resolved configuration.
#[derive(Debug)]
pub struct Repo {
    base_dir: PathBuf,
    config: Config,
}

/// The outcome of one [`Repo::create`] call.
#[derive(Debug, Clone)]
pub struct Summary {
    pub dir: PathBuf,
    pub rpms: usize,
    pub updated: bool,
    pub expunged: usize,
    /// Set if retention GC failed; the metadata publish itself still
    /// succeeded and the rest of this `Summary` is valid.
    pub gc_error: Option<String>,
}

impl Repo {
    /// Resolve a `Repo` for `dir`. If `config` is `None`, loads
    /// `repodata/.config.yaml`, falling back to a write-back default when
    /// absent.
    pub fn new(dir: impl Into<PathBuf>, config: Option<Config>) -> Result<Repo> {
        let base_dir = dir.into();
        if !base_dir.is_dir() {
            return Err(Error::RepoDirInvalid(format!("{} is not a directory", base_dir.display())));
        }

        let config = match config {
            Some(c) => c,
            None => config::load(&base_dir)?.unwrap_or_default(),
        };

        Ok(Repo { base_dir, config })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one scan-build-publish-GC pass, per the protocol in the component
    /// design for change detection and atomic publish.
    pub fn create(&self) -> Result<Summary> {
        let repodata_dir = self.base_dir.join("repodata");
        ensure_repodata_dir(&repodata_dir)?;

        if self.config.write_config {
            config::save(&self.base_dir, &self.config)?;
        }

        let fresh = dataset::build(&self.base_dir, &self.config)?;
        let rpms = fresh.packages.len();

        let old_repomd = publish::read_current_repomd(&self.base_dir)?;
        let mut history = retention::read_history(&self.base_dir)?;

        let (new_repomd, updated) = publish::publish(&self.base_dir, &self.config, &fresh, old_repomd.as_ref())?;

        // Idempotent on `revision`, so this also recovers from a crash
        // between a prior run's repomd publish and history append.
        history.append(&new_repomd);

        let (_, expunged, gc_result) = retention::clean(&self.base_dir, std::mem::take(&mut history), self.config.expunge_old_metadata);
        let gc_error = match gc_result {
            Ok(()) => None,
            Err(e) => {
                log::warn!("retention garbage collection failed: {e}");
                Some(e.to_string())
            }
        };

        log::info!(
            "create() finished: {} package(s), updated={}, expunged={}",
            rpms,
            updated,
            expunged
        );

        Ok(Summary {
            dir: self.base_dir.clone(),
            rpms,
            updated,
            expunged,
            gc_error,
        })
    }
}

fn ensure_repodata_dir(repodata_dir: &Path) -> Result<()> {
    match std::fs::create_dir(repodata_dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            if repodata_dir.is_dir() {
                Ok(())
            } else {
                Err(Error::RepoDirInvalid(format!("{} exists and is not a directory", repodata_dir.display())))
            }
        }
        Err(e) => Err(e.into()),
    }
}
