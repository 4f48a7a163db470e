// Copyright (c) 2022 Daniel Alley
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parsing and serialization of comps group metadata (`comps.xml`).
//!
//! The teacher library ships only the comps DTD as a fixture; there is no
//! existing Rust implementation to adapt, so this module is grounded
//! directly in the original Go project's `comps.go` struct shapes, written
//! in this crate's hand-rolled `quick_xml` event style to match
//! `src/xml/primary.rs` and `src/xml/filelists.rs`.

use std::io::BufRead;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LangText {
    pub lang: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageReq {
    pub kind: String,
    pub requires: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub names: Vec<LangText>,
    pub descriptions: Vec<LangText>,
    pub default: bool,
    pub uservisible: bool,
    pub packages: Vec<PackageReq>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub names: Vec<LangText>,
    pub descriptions: Vec<LangText>,
    pub display_order: Option<i32>,
    pub group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub id: String,
    pub names: Vec<LangText>,
    pub descriptions: Vec<LangText>,
    pub display_order: Option<i32>,
    pub group_ids: Vec<String>,
    pub option_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comps {
    pub groups: Vec<Group>,
    pub categories: Vec<Category>,
    pub environments: Vec<Environment>,
}

const LANG_ATTR: &str = "xml:lang";

fn read_lang_texts<R: BufRead>(
    reader: &mut Reader<R>,
    tag: &[u8],
    open: &BytesStart,
) -> Result<LangText> {
    let lang = open
        .try_get_attribute(LANG_ATTR)?
        .map(|a| a.decode_and_unescape_value(reader.decoder()).map(|v| v.into_owned()))
        .transpose()?;
    let mut buf = Vec::new();
    let text = reader
        .read_text_into(quick_xml::name::QName(tag), &mut buf)?
        .decode()?
        .into_owned();
    Ok(LangText { lang, text })
}

/// Parse a `comps.xml` document (uncompressed, user-supplied) into a [`Comps`].
pub fn parse_comps<R: BufRead>(reader: &mut Reader<R>) -> Result<Comps> {
    reader.config_mut().trim_text(true);

    let mut comps = Comps::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"group" => comps.groups.push(parse_group(reader)?),
                b"category" => comps.categories.push(parse_category(reader)?),
                b"environment" => comps.environments.push(parse_environment(reader)?),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(comps)
}

fn parse_group<R: BufRead>(reader: &mut Reader<R>) -> Result<Group> {
    let mut group = Group::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"id" => group.id = read_simple_text(reader, b"id")?,
                b"name" => group.names.push(read_lang_texts(reader, b"name", &e)?),
                b"description" => {
                    group.descriptions.push(read_lang_texts(reader, b"description", &e)?)
                }
                b"default" => group.default = read_simple_text(reader, b"default")? == "true",
                b"uservisible" => {
                    group.uservisible = read_simple_text(reader, b"uservisible")? == "true"
                }
                b"packagelist" => group.packages = parse_packagelist(reader)?,
                _ => skip_element(reader, e.name())?,
            },
            Event::Empty(e) if e.name().as_ref() == b"packagelist" => {}
            Event::End(e) if e.name().as_ref() == b"group" => break,
            Event::Eof => return Err(Error::InconsistentMetadata("unterminated group".into())),
            _ => {}
        }
        buf.clear();
    }
    Ok(group)
}

fn parse_packagelist<R: BufRead>(reader: &mut Reader<R>) -> Result<Vec<PackageReq>> {
    let mut out = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"packagereq" => {
                let kind = e
                    .try_get_attribute("type")?
                    .map(|a| a.decode_and_unescape_value(reader.decoder()).map(|v| v.into_owned()))
                    .transpose()?
                    .unwrap_or_default();
                let requires = e
                    .try_get_attribute("requires")?
                    .map(|a| a.decode_and_unescape_value(reader.decoder()).map(|v| v.into_owned()))
                    .transpose()?;
                let mut text_buf = Vec::new();
                let name = reader
                    .read_text_into(quick_xml::name::QName(b"packagereq"), &mut text_buf)?
                    .decode()?
                    .into_owned();
                out.push(PackageReq { kind, requires, name });
            }
            Event::End(e) if e.name().as_ref() == b"packagelist" => break,
            Event::Eof => return Err(Error::InconsistentMetadata("unterminated packagelist".into())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn parse_category<R: BufRead>(reader: &mut Reader<R>) -> Result<Category> {
    let mut category = Category::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"id" => category.id = read_simple_text(reader, b"id")?,
                b"name" => category.names.push(read_lang_texts(reader, b"name", &e)?),
                b"description" => {
                    category.descriptions.push(read_lang_texts(reader, b"description", &e)?)
                }
                b"display_order" => {
                    category.display_order = read_simple_text(reader, b"display_order")?.parse().ok()
                }
                b"grouplist" => category.group_ids = parse_idlist(reader, b"grouplist", b"groupid")?,
                _ => skip_element(reader, e.name())?,
            },
            Event::End(e) if e.name().as_ref() == b"category" => break,
            Event::Eof => return Err(Error::InconsistentMetadata("unterminated category".into())),
            _ => {}
        }
        buf.clear();
    }
    Ok(category)
}

fn parse_environment<R: BufRead>(reader: &mut Reader<R>) -> Result<Environment> {
    let mut env = Environment::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"id" => env.id = read_simple_text(reader, b"id")?,
                b"name" => env.names.push(read_lang_texts(reader, b"name", &e)?),
                b"description" => {
                    env.descriptions.push(read_lang_texts(reader, b"description", &e)?)
                }
                b"display_order" => {
                    env.display_order = read_simple_text(reader, b"display_order")?.parse().ok()
                }
                b"grouplist" => env.group_ids = parse_idlist(reader, b"grouplist", b"groupid")?,
                b"optionlist" => env.option_ids = parse_idlist(reader, b"optionlist", b"groupid")?,
                _ => skip_element(reader, e.name())?,
            },
            Event::End(e) if e.name().as_ref() == b"environment" => break,
            Event::Eof => return Err(Error::InconsistentMetadata("unterminated environment".into())),
            _ => {}
        }
        buf.clear();
    }
    Ok(env)
}

fn parse_idlist<R: BufRead>(reader: &mut Reader<R>, list_tag: &[u8], item_tag: &[u8]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == item_tag => {
                let mut text_buf = Vec::new();
                out.push(
                    reader
                        .read_text_into(quick_xml::name::QName(item_tag), &mut text_buf)?
                        .decode()?
                        .into_owned(),
                );
            }
            Event::End(e) if e.name().as_ref() == list_tag => break,
            Event::Eof => return Err(Error::InconsistentMetadata("unterminated id list".into())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn read_simple_text<R: BufRead>(reader: &mut Reader<R>, tag: &[u8]) -> Result<String> {
    let mut buf = Vec::new();
    Ok(reader
        .read_text_into(quick_xml::name::QName(tag), &mut buf)?
        .decode()?
        .into_owned())
}

fn skip_element<R: BufRead>(reader: &mut Reader<R>, name: quick_xml::name::QName) -> Result<()> {
    reader.read_to_end_into(name, &mut Vec::new())?;
    Ok(())
}

/// Serialize a [`Comps`] to the canonical uncompressed `comps.xml` bytes.
pub fn write_comps<W: std::io::Write>(comps: &Comps, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("comps");
    writer.write_event(Event::Start(tag.borrow()))?;

    for group in &comps.groups {
        write_group(group, writer)?;
    }
    for category in &comps.categories {
        write_category(category, writer)?;
    }
    for environment in &comps.environments {
        write_environment(environment, writer)?;
    }

    writer.write_event(Event::End(tag.to_end()))?;
    writer.write_event(Event::Text(BytesText::new("\n")))?;
    Ok(())
}

fn write_lang_text<W: std::io::Write>(
    tag: &str,
    item: &LangText,
    writer: &mut Writer<W>,
) -> Result<()> {
    let mut el = writer.create_element(tag);
    if let Some(lang) = &item.lang {
        el = el.with_attribute((LANG_ATTR, lang.as_str()));
    }
    el.write_text_content(BytesText::new(&item.text))?;
    Ok(())
}

fn write_group<W: std::io::Write>(group: &Group, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("group");
    writer.write_event(Event::Start(tag.borrow()))?;

    writer
        .create_element("id")
        .write_text_content(BytesText::new(&group.id))?;
    for name in &group.names {
        write_lang_text("name", name, writer)?;
    }
    for description in &group.descriptions {
        write_lang_text("description", description, writer)?;
    }
    writer
        .create_element("default")
        .write_text_content(BytesText::new(if group.default { "true" } else { "false" }))?;
    writer
        .create_element("uservisible")
        .write_text_content(BytesText::new(if group.uservisible { "true" } else { "false" }))?;

    let packagelist_tag = BytesStart::new("packagelist");
    writer.write_event(Event::Start(packagelist_tag.borrow()))?;
    for req in &group.packages {
        let mut el = writer.create_element("packagereq").with_attribute(("type", req.kind.as_str()));
        if let Some(requires) = &req.requires {
            el = el.with_attribute(("requires", requires.as_str()));
        }
        el.write_text_content(BytesText::new(&req.name))?;
    }
    writer.write_event(Event::End(packagelist_tag.to_end()))?;

    writer.write_event(Event::End(tag.to_end()))?;
    Ok(())
}

fn write_idlist<W: std::io::Write>(tag: &str, item_tag: &str, ids: &[String], writer: &mut Writer<W>) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let start = BytesStart::new(tag);
    writer.write_event(Event::Start(start.borrow()))?;
    for id in ids {
        writer
            .create_element(item_tag)
            .write_text_content(BytesText::new(id))?;
    }
    writer.write_event(Event::End(start.to_end()))?;
    Ok(())
}

fn write_category<W: std::io::Write>(category: &Category, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("category");
    writer.write_event(Event::Start(tag.borrow()))?;
    writer
        .create_element("id")
        .write_text_content(BytesText::new(&category.id))?;
    for name in &category.names {
        write_lang_text("name", name, writer)?;
    }
    for description in &category.descriptions {
        write_lang_text("description", description, writer)?;
    }
    if let Some(order) = category.display_order {
        writer
            .create_element("display_order")
            .write_text_content(BytesText::new(&order.to_string()))?;
    }
    write_idlist("grouplist", "groupid", &category.group_ids, writer)?;
    writer.write_event(Event::End(tag.to_end()))?;
    Ok(())
}

fn write_environment<W: std::io::Write>(environment: &Environment, writer: &mut Writer<W>) -> Result<()> {
    let tag = BytesStart::new("environment");
    writer.write_event(Event::Start(tag.borrow()))?;
    writer
        .create_element("id")
        .write_text_content(BytesText::new(&environment.id))?;
    for name in &environment.names {
        write_lang_text("name", name, writer)?;
    }
    for description in &environment.descriptions {
        write_lang_text("description", description, writer)?;
    }
    if let Some(order) = environment.display_order {
        writer
            .create_element("display_order")
            .write_text_content(BytesText::new(&order.to_string()))?;
    }
    write_idlist("grouplist", "groupid", &environment.group_ids, writer)?;
    write_idlist("optionlist", "groupid", &environment.option_ids, writer)?;
    writer.write_event(Event::End(tag.to_end()))?;
    Ok(())
}
