// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;
use crate::model::{Entry, Package};

use super::{XML_NS_COMMON, XML_NS_RPM};

pub fn write_primary<W: std::io::Write>(packages: &[Package], writer: &mut Writer<W>) -> Result<()> {
    let mut tag = BytesStart::new("metadata");
    tag.push_attribute(("xmlns", XML_NS_COMMON));
    tag.push_attribute(("xmlns:rpm", XML_NS_RPM));
    tag.push_attribute(("packages", packages.len().to_string().as_str()));
    writer.write_event(Event::Start(tag.borrow()))?;

    for package in packages {
        write_package(package, writer)?;
    }

    writer.write_event(Event::End(tag.to_end()))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(())
}

fn write_package<W: std::io::Write>(package: &Package, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("package").with_attributes([("type", "rpm")]);
    writer.write_event(Event::Start(tag.borrow()))?;

    writer
        .create_element("name")
        .write_text_content(BytesText::new(&package.name))?;
    writer
        .create_element("arch")
        .write_text_content(BytesText::new(&package.arch))?;
    writer
        .create_element("version")
        .with_attribute(("epoch", package.epoch.to_string().as_str()))
        .with_attribute(("ver", package.version.as_str()))
        .with_attribute(("rel", package.release.as_str()))
        .write_empty()?;
    writer
        .create_element("checksum")
        .with_attribute(("type", package.checksum.kind))
        .with_attribute(("pkgid", "YES"))
        .write_text_content(BytesText::new(&package.checksum.hex))?;
    writer
        .create_element("summary")
        .write_text_content(BytesText::new(&package.summary))?;
    writer
        .create_element("description")
        .write_text_content(BytesText::new(&package.description))?;
    writer
        .create_element("packager")
        .write_text_content(BytesText::new(&package.packager))?;
    writer
        .create_element("url")
        .write_text_content(BytesText::new(&package.url))?;
    writer
        .create_element("time")
        .with_attribute(("file", package.time_file.to_string().as_str()))
        .with_attribute(("build", package.time_build.to_string().as_str()))
        .write_empty()?;
    writer
        .create_element("size")
        .with_attribute(("package", package.size_package.to_string().as_str()))
        .with_attribute(("installed", package.size_installed.to_string().as_str()))
        .with_attribute(("archive", package.size_archive.to_string().as_str()))
        .write_empty()?;
    writer
        .create_element("location")
        .with_attribute(("href", package.location_href.as_str()))
        .write_empty()?;

    write_format(package, writer)?;

    writer.write_event(Event::End(tag.to_end()))?;
    Ok(())
}

fn write_format<W: std::io::Write>(package: &Package, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("format");
    writer.write_event(Event::Start(tag.borrow()))?;

    writer
        .create_element("rpm:license")
        .write_text_content(BytesText::new(&package.rpm_license))?;
    writer
        .create_element("rpm:vendor")
        .write_text_content(BytesText::new(&package.rpm_vendor))?;
    writer
        .create_element("rpm:group")
        .write_text_content(BytesText::new(&package.rpm_group))?;
    writer
        .create_element("rpm:buildhost")
        .write_text_content(BytesText::new(&package.rpm_buildhost))?;
    writer
        .create_element("rpm:sourcerpm")
        .write_text_content(BytesText::new(&package.rpm_sourcerpm))?;
    writer
        .create_element("rpm:header-range")
        .with_attribute(("start", package.rpm_header_start.to_string().as_str()))
        .with_attribute(("end", package.rpm_header_end.to_string().as_str()))
        .write_empty()?;

    write_entries("rpm:provides", &package.provides, writer)?;
    write_entries("rpm:requires", &package.requires, writer)?;
    write_entries("rpm:obsoletes", &package.obsoletes, writer)?;

    writer.write_event(Event::End(tag.to_end()))?;
    Ok(())
}

fn write_entries<W: std::io::Write>(tag_name: &str, entries: &[Entry], writer: &mut Writer<W>) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let tag = BytesStart::new(tag_name);
    writer.write_event(Event::Start(tag.borrow()))?;
    for entry in entries {
        let mut el = writer.create_element("rpm:entry").with_attribute(("name", entry.name.as_str()));
        if !entry.flags.is_empty() {
            el = el.with_attribute(("flags", entry.flags.as_str()));
        }
        if !entry.epoch.is_empty() {
            el = el.with_attribute(("epoch", entry.epoch.as_str()));
        }
        if !entry.version.is_empty() {
            el = el.with_attribute(("ver", entry.version.as_str()));
        }
        if !entry.release.is_empty() {
            el = el.with_attribute(("rel", entry.release.as_str()));
        }
        if !entry.pre.is_empty() {
            el = el.with_attribute(("pre", entry.pre.as_str()));
        }
        el.write_empty()?;
    }
    writer.write_event(Event::End(tag.to_end()))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::checksum::Checksum;

    #[test]
    fn writes_empty_packages_list() {
        let bytes = super::super::serialize_document(|w| write_primary(&[], w)).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains(r#"packages="0""#));
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    }

    #[test]
    fn writes_package_with_dependencies() {
        let mut package = Package {
            name: "bash".into(),
            arch: "x86_64".into(),
            checksum: Checksum::sha256_of("a".repeat(64)),
            ..Default::default()
        };
        package.requires.push(Entry {
            name: "libc.so.6(GLIBC_2.34)(64bit)".into(),
            ..Default::default()
        });
        let bytes = super::super::serialize_document(|w| write_primary(&[package], w)).unwrap();
        let xml = String::from_utf8(bytes).unwrap();
        assert!(xml.contains("<name>bash</name>"));
        assert!(xml.contains("rpm:requires"));
        assert!(xml.contains("GLIBC_2.34"));
    }
}
