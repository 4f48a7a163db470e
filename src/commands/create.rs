// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use anyhow::Result;

use createrepo_rs::Repo;

use super::CreateCommand;

pub fn create(config: CreateCommand) -> Result<()> {
    let repo = Repo::new(config.destination, None)?;
    let summary = repo.create()?;

    println!(
        "{}: {} package(s), {}, {} file(s) expunged",
        summary.dir.display(),
        summary.rpms,
        if summary.updated { "updated" } else { "unchanged" },
        summary.expunged,
    );
    if let Some(gc_error) = &summary.gc_error {
        log::warn!("retention garbage collection failed: {gc_error}");
    }

    Ok(())
}
