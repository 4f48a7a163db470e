// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Hand-rolled `quick_xml` event-based readers/writers for each repodata
//! stream, grounded in the split-module layout of the teacher library.

pub mod filelists;
pub mod history;
pub mod primary;
pub mod repomd;

use quick_xml::events::{BytesDecl, Event};
use quick_xml::Writer;

use crate::error::Result;

/// Namespace for primary.xml
pub const XML_NS_COMMON: &str = "http://linux.duke.edu/metadata/common";
/// Namespace for filelists.xml
pub const XML_NS_FILELISTS: &str = "http://linux.duke.edu/metadata/filelists";
/// Namespace for rpm (used in primary.xml and repomd.xml)
pub const XML_NS_RPM: &str = "http://linux.duke.edu/metadata/rpm";
/// Namespace for repomd.xml
pub const XML_NS_REPO: &str = "http://linux.duke.edu/metadata/repo";

/// Serialize `body` (a closure writing the document body) into canonical
/// uncompressed bytes: the `<?xml ...?>` declaration, two-space indent, and
/// a trailing newline.
pub fn serialize_document(body: impl FnOnce(&mut Writer<&mut Vec<u8>>) -> Result<()>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = Writer::new_with_indent(&mut buf, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        body(&mut writer)?;
    }
    Ok(buf)
}
