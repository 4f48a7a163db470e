// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Generates and maintains yum/dnf repodata for a directory of RPM packages:
//! scans `.rpm` files, builds `primary`/`filelists`/`comps` metadata,
//! publishes a `repomd.xml` index, and retains/expires prior revisions.

pub mod atomic;
pub mod checksum;
pub mod comps;
pub mod compress;
pub mod config;
pub mod dataset;
pub mod dependency;
pub mod error;
pub mod model;
pub mod publish;
pub mod repo;
pub mod retention;
pub mod rpm_adapter;
pub mod rpmver;
pub mod xml;

pub use error::{Error, Result};
pub use repo::{Repo, Summary};
