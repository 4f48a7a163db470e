// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Wraps the gzip/xz codecs behind a uniform compress-to-bytes call.

use std::io::Write;

use crate::error::Result;

/// Compression algorithm used for published metadata streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionType {
    Gzip,
    #[default]
    Xz,
}

impl CompressionType {
    pub fn to_file_extension(self) -> &'static str {
        match self {
            CompressionType::Gzip => ".gz",
            CompressionType::Xz => ".xz",
        }
    }

    pub fn from_config_str(value: &str) -> Option<Self> {
        match value {
            "gz" => Some(CompressionType::Gzip),
            "xz" => Some(CompressionType::Xz),
            _ => None,
        }
    }
}

/// Compress `data`, returning the compressed bytes.
pub fn compress(data: &[u8], algo: CompressionType) -> Result<Vec<u8>> {
    let format = match algo {
        CompressionType::Gzip => niffler::compression::Format::Gzip,
        CompressionType::Xz => niffler::compression::Format::Lzma,
    };
    let mut out = Vec::new();
    {
        let mut writer = niffler::get_writer(Box::new(&mut out), format, niffler::Level::Nine)?;
        writer.write_all(data)?;
    }
    Ok(out)
}
