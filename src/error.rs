// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Error type covering every stage of repository metadata generation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("repository configuration is invalid: {0}")]
    ConfigInvalid(String),
    #[error("repository directory is invalid: {0}")]
    RepoDirInvalid(String),
    #[error("failed to read repository metadata: {0}")]
    MetadataRead(String),
    #[error("failed to write repository metadata: {0}")]
    MetadataWrite(String),
    #[cfg(feature = "read_rpm")]
    #[error("failed to parse rpm package: {0}")]
    RpmParse(#[from] rpm::Error),
    #[error("failed to compute or cache checksum: {0}")]
    ChecksumIo(#[source] std::io::Error),
    #[error("failed to read or write extended attribute: {0}")]
    XattrIo(#[source] std::io::Error),
    #[error("compression failure: {0}")]
    CompressFailure(#[from] niffler::Error),
    #[error("history file is corrupt: {0}")]
    HistoryCorrupt(String),
    #[error("retention garbage collection failed: {0}")]
    GcFailure(String),
    #[error(transparent)]
    XmlParse(#[from] quick_xml::Error),
    #[error(transparent)]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
    #[error(transparent)]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    IntFieldParse(#[from] std::num::ParseIntError),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("\"{0}\" is not a valid checksum of type \"{1}\"")]
    InvalidChecksum(String, String),
    #[error("missing metadata field: {0}")]
    MissingField(&'static str),
    #[error("missing metadata attribute: {0}")]
    MissingAttribute(&'static str),
    #[error("metadata files are inconsistent: {0}")]
    InconsistentMetadata(String),
}

pub type Result<T> = std::result::Result<T, Error>;
