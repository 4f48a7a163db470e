// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;
use crate::model::PackageFiles;

use super::XML_NS_FILELISTS;

pub fn write_filelists<W: std::io::Write>(files: &[PackageFiles], writer: &mut Writer<W>) -> Result<()> {
    let mut tag = BytesStart::new("filelists");
    tag.push_attribute(("xmlns", XML_NS_FILELISTS));
    tag.push_attribute(("packages", files.len().to_string().as_str()));
    writer.write_event(Event::Start(tag.borrow()))?;

    for entry in files {
        write_package(entry, writer)?;
    }

    writer.write_event(Event::End(tag.to_end()))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(())
}

fn write_package<W: std::io::Write>(entry: &PackageFiles, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("package")
        .with_attributes([("pkgid", entry.pkgid.as_str()), ("name", entry.name.as_str()), ("arch", entry.arch.as_str())]);
    writer.write_event(Event::Start(tag.borrow()))?;

    writer
        .create_element("version")
        .with_attribute(("epoch", entry.epoch.to_string().as_str()))
        .with_attribute(("ver", entry.version.as_str()))
        .with_attribute(("rel", entry.release.as_str()))
        .write_empty()?;

    for file in &entry.files {
        let mut el = writer.create_element("file");
        if file.is_dir {
            el = el.with_attribute(("type", "dir"));
        }
        el.write_text_content(BytesText::new(&file.path))?;
    }

    writer.write_event(Event::End(tag.to_end()))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::FileEntry;

    #[test]
    fn writes_files_and_dirs() {
        let entry = PackageFiles {
            pkgid: "deadbeef".into(),
            name: "bash".into(),
            arch: "x86_64".into(),
            epoch: 0,
            version: "5.1".into(),
            release: "1".into(),
            files: vec![
                FileEntry { path: "/usr/bin/bash".into(), is_dir: false },
                FileEntry { path: "/etc/bash".into(), is_dir: true },
            ],
        };
        let bytes = super::super::serialize_document(|w| write_filelists(&[entry], w)).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains(r#"type="dir">/etc/bash"#));
        assert!(xml.contains(">/usr/bin/bash<"));
    }
}
