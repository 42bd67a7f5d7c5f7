//! RSS 2.0 document model and XML writer shared by both services.

use std::io::Write;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::ChannelConfig;
use crate::db::Post;

/// Origin of an aggregated item, written as `<source url="...">name</source>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
    pub guid: Option<String>,
    pub source: Option<ItemSource>,
}

impl From<Post> for RssItem {
    fn from(post: Post) -> Self {
        Self {
            title: post.title,
            link: post.link,
            description: Some(post.description),
            pub_date: Some(post.pub_date),
            guid: None,
            source: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<RssItem>,
}

impl Channel {
    pub fn new(config: &ChannelConfig, items: Vec<RssItem>) -> Self {
        Self {
            title: config.title.clone(),
            link: config.link.clone(),
            description: config.description.clone(),
            items,
        }
    }

    /// Serialize as a complete RSS 2.0 document.
    pub fn to_xml(&self) -> anyhow::Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut rss = BytesStart::new("rss");
        rss.push_attribute(("version", "2.0"));
        writer.write_event(Event::Start(rss))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;

        write_text_element(&mut writer, "title", &self.title)?;
        write_text_element(&mut writer, "link", &self.link)?;
        write_text_element(&mut writer, "description", &self.description)?;

        for item in &self.items {
            write_item(&mut writer, item)?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        Ok(String::from_utf8(writer.into_inner())?)
    }
}

/// RFC 1123 with a numeric zone, e.g. `Mon, 09 Dec 2024 12:00:00 +0000`.
pub fn format_pub_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

fn write_item<W: Write>(writer: &mut Writer<W>, item: &RssItem) -> anyhow::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("item")))?;

    write_text_element(writer, "title", &item.title)?;
    write_text_element(writer, "link", &item.link)?;
    if let Some(description) = &item.description {
        write_text_element(writer, "description", description)?;
    }
    if let Some(pub_date) = &item.pub_date {
        write_text_element(writer, "pubDate", &format_pub_date(pub_date))?;
    }
    if let Some(guid) = &item.guid {
        let is_permalink = if guid == &item.link { "true" } else { "false" };
        writer
            .create_element("guid")
            .with_attribute(("isPermaLink", is_permalink))
            .write_text_content(BytesText::new(guid))?;
    }
    if let Some(source) = &item.source {
        writer
            .create_element("source")
            .with_attribute(("url", source.url.as_str()))
            .write_text_content(BytesText::new(&source.name))?;
    }

    writer.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> anyhow::Result<()> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}
