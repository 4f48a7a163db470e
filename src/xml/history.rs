// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! `.history.xml`: the sequence of previously published revisions, each
//! wrapped in a `<revisions>` element carrying an optional `<obsoleted>`
//! timestamp, the `<revision>` number, and the same `<data>` rows
//! `repomd.xml` publishes, used to garbage-collect their files once expired.

use std::io::BufRead;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};
use crate::model::{History, Revision};

use super::repomd::{data_kind, format_revision, read_data, read_text, write_data};
use super::XML_NS_REPO;

pub fn write_history<W: std::io::Write>(history: &History, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("history").with_attributes([("xmlns", XML_NS_REPO)]);
    writer.write_event(Event::Start(tag.borrow()))?;

    for revision in &history.revisions {
        write_revision(revision, writer)?;
    }

    writer.write_event(Event::End(tag.to_end()))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(())
}

fn write_revision<W: std::io::Write>(revision: &Revision, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("revisions");
    writer.write_event(Event::Start(tag.borrow()))?;

    if revision.obsoleted != 0 {
        writer
            .create_element("obsoleted")
            .write_text_content(BytesText::new(&revision.obsoleted.to_string()))?;
    }
    writer
        .create_element("revision")
        .write_text_content(BytesText::new(&format_revision(revision.revision)))?;

    for entry in &revision.data {
        write_data(entry, writer)?;
    }

    writer.write_event(Event::End(tag.to_end()))?;
    Ok(())
}

pub fn read_history<R: BufRead>(reader: R) -> Result<History> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);
    xml.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    let mut history = History::default();
    let mut current: Option<Revision> = None;

    loop {
        match xml.read_event_into(&mut buf).map_err(Error::XmlParse)? {
            Event::Start(e) => match e.name().as_ref() {
                b"revisions" => {
                    current = Some(Revision { obsoleted: 0, revision: 0.0, data: Vec::new() });
                }
                b"obsoleted" => {
                    let text = read_text(&mut xml, e.name())?;
                    if let Some(revision) = current.as_mut() {
                        revision.obsoleted = text.parse().unwrap_or(0);
                    }
                }
                b"revision" => {
                    let text = read_text(&mut xml, e.name())?;
                    if let Some(revision) = current.as_mut() {
                        revision.revision = text.parse().unwrap_or(0.0);
                    }
                }
                b"data" => {
                    let kind = data_kind(&e, xml.decoder())?;
                    let entry = read_data(&mut xml, kind)?;
                    if let Some(revision) = current.as_mut() {
                        revision.data.push(entry);
                    }
                }
                _ => {}
            },
            Event::End(e) if e.name().as_ref() == b"revisions" => {
                if let Some(revision) = current.take() {
                    history.revisions.push(revision);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(history)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::checksum::Checksum;
    use crate::model::{DataEntry, DataKind};

    #[test]
    fn round_trips_multiple_revisions() {
        let mut history = History::default();
        history.revisions.push(Revision {
            obsoleted: 0,
            revision: 1700000000.0,
            data: vec![DataEntry {
                kind: DataKind::Primary,
                checksum: Checksum::sha256_of("a".repeat(64)),
                open_checksum: Checksum::sha256_of("b".repeat(64)),
                location_href: "repodata/aaaa-primary.xml.xz".into(),
                timestamp: 1700000000,
                size: 1,
                open_size: 2,
            }],
        });
        history.revisions.push(Revision {
            obsoleted: 1700001000,
            revision: 1699999000.0,
            data: vec![],
        });

        let bytes = super::super::serialize_document(|w| write_history(&history, w)).unwrap();
        let parsed = read_history(bytes.as_slice()).unwrap();
        assert_eq!(parsed.revisions.len(), 2);
        assert_eq!(parsed.revisions[0].data[0].location_href, "repodata/aaaa-primary.xml.xz");
        assert_eq!(parsed.revisions[0].data[0].timestamp, 1700000000);
        assert_eq!(parsed.revisions[0].data[0].size, 1);
        assert_eq!(parsed.revisions[0].data[0].open_size, 2);
        assert_eq!(parsed.revisions[0].obsoleted, 0);
        assert_eq!(parsed.revisions[1].obsoleted, 1700001000);
    }

    #[test]
    fn omits_obsoleted_element_when_zero() {
        let mut history = History::default();
        history.revisions.push(Revision { obsoleted: 0, revision: 1.0, data: vec![] });
        let bytes = super::super::serialize_document(|w| write_history(&history, w)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("<obsoleted>"));
        assert!(text.contains("<revisions>"));
    }
}
