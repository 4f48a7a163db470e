// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::BufRead;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use crate::checksum::Checksum;
use crate::error::{Error, Result};
use crate::model::{DataEntry, DataKind, RepoMd};

use super::XML_NS_REPO;

pub fn write_repomd<W: std::io::Write>(repomd: &RepoMd, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("repomd").with_attributes([("xmlns", XML_NS_REPO)]);
    writer.write_event(Event::Start(tag.borrow()))?;

    writer
        .create_element("revision")
        .write_text_content(BytesText::new(&format_revision(repomd.revision)))?;

    for entry in &repomd.data {
        write_data(entry, writer)?;
    }

    writer.write_event(Event::End(tag.to_end()))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(())
}

/// Shared with [`super::history`], whose `<revision>` element carries the
/// same float-valued revision number as repomd's.
pub(super) fn format_revision(revision: f64) -> String {
    if revision.fract() == 0.0 {
        format!("{}", revision as i64)
    } else {
        revision.to_string()
    }
}

/// Writes one `<data type="...">...</data>` row, shared with
/// [`super::history`] since `.history.xml` carries the identical shape per
/// revision.
pub(super) fn write_data<W: std::io::Write>(entry: &DataEntry, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("data").with_attributes([("type", entry.kind.as_str())]);
    writer.write_event(Event::Start(tag.borrow()))?;

    writer
        .create_element("checksum")
        .with_attribute(("type", entry.checksum.kind))
        .with_attribute(("pkgid", "YES"))
        .write_text_content(BytesText::new(&entry.checksum.hex))?;
    writer
        .create_element("open-checksum")
        .with_attribute(("type", entry.open_checksum.kind))
        .with_attribute(("pkgid", "YES"))
        .write_text_content(BytesText::new(&entry.open_checksum.hex))?;
    writer
        .create_element("location")
        .with_attribute(("href", entry.location_href.as_str()))
        .write_empty()?;
    writer
        .create_element("timestamp")
        .write_text_content(BytesText::new(&entry.timestamp.to_string()))?;
    writer
        .create_element("size")
        .write_text_content(BytesText::new(&entry.size.to_string()))?;
    writer
        .create_element("open-size")
        .write_text_content(BytesText::new(&entry.open_size.to_string()))?;

    writer.write_event(Event::End(tag.to_end()))?;
    Ok(())
}

/// Parse a previously published `repomd.xml`, used by change detection to
/// decide whether freshly built streams differ from what's on disk.
pub fn read_repomd<R: BufRead>(reader: R) -> Result<RepoMd> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);
    xml.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    let mut repomd = RepoMd::default();

    loop {
        match xml.read_event_into(&mut buf).map_err(Error::XmlParse)? {
            Event::Start(e) => match e.name().as_ref() {
                b"revision" => {
                    let text = read_text(&mut xml, e.name())?;
                    repomd.revision = text.parse().unwrap_or(0.0);
                }
                b"data" => {
                    let kind = data_kind(&e, xml.decoder())?;
                    repomd.data.push(read_data(&mut xml, kind)?);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(repomd)
}

/// Reads one `<data type="...">...</data>` row (the `<data>` start tag
/// itself already consumed by the caller, which passes its decoded `kind`).
/// Shared with [`super::history`].
pub(super) fn read_data<R: BufRead>(xml: &mut Reader<R>, kind: DataKind) -> Result<DataEntry> {
    let mut buf = Vec::new();
    let mut checksum = None;
    let mut open_checksum = None;
    let mut location_href = String::new();
    let mut timestamp = 0;
    let mut size = 0;
    let mut open_size = 0;

    loop {
        match xml.read_event_into(&mut buf).map_err(Error::XmlParse)? {
            Event::Start(e) => match e.name().as_ref() {
                b"checksum" => {
                    let kind = checksum_type(&e, xml.decoder());
                    let text = read_text(xml, QName(b"checksum"))?;
                    checksum = Some(Checksum { kind, hex: text });
                }
                b"open-checksum" => {
                    let kind = checksum_type(&e, xml.decoder());
                    let text = read_text(xml, QName(b"open-checksum"))?;
                    open_checksum = Some(Checksum { kind, hex: text });
                }
                b"location" => {
                    location_href = attr(&e, b"href", xml.decoder());
                }
                b"timestamp" => {
                    timestamp = read_text(xml, QName(b"timestamp"))?.parse().unwrap_or(0);
                }
                b"size" => {
                    size = read_text(xml, QName(b"size"))?.parse().unwrap_or(0);
                }
                b"open-size" => {
                    open_size = read_text(xml, QName(b"open-size"))?.parse().unwrap_or(0);
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"data" => break,
            Event::Eof => return Err(Error::HistoryCorrupt("<data> missing closing tag".into())),
            _ => {}
        }
        buf.clear();
    }

    Ok(DataEntry {
        kind,
        checksum: checksum.ok_or_else(|| Error::HistoryCorrupt("<data> missing <checksum>".into()))?,
        open_checksum: open_checksum.ok_or_else(|| Error::HistoryCorrupt("<data> missing <open-checksum>".into()))?,
        location_href,
        timestamp,
        size,
        open_size,
    })
}

pub(super) fn data_kind(e: &BytesStart, decoder: quick_xml::Decoder) -> Result<DataKind> {
    match attr(e, b"type", decoder).as_str() {
        "primary" => Ok(DataKind::Primary),
        "filelists" => Ok(DataKind::Filelists),
        "group" => Ok(DataKind::Group),
        other => Err(Error::HistoryCorrupt(format!("unknown repomd data type {other:?}"))),
    }
}

fn checksum_type(e: &BytesStart, decoder: quick_xml::Decoder) -> &'static str {
    match attr(e, b"type", decoder).as_str() {
        "sha256" => "sha256",
        _ => "sha256",
    }
}

pub(super) fn read_text<R: BufRead>(xml: &mut Reader<R>, name: QName) -> Result<String> {
    Ok(xml.read_text_into(name, &mut Vec::new()).map_err(Error::XmlParse)?.decode()?.into_owned())
}

pub(super) fn attr(e: &BytesStart, name: &[u8], decoder: quick_xml::Decoder) -> String {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.decode_and_unescape_value(decoder).ok().map(|c| c.into_owned()))
        .unwrap_or_default()
}
