//! Whole-value encodings for replacement calls.
//!
//! JSON is the natural serde form of [`Value`]. The XML form wraps the tree
//! in a `<data>` root: object fields become child elements, list elements
//! become `<item>` children, scalars become text and null becomes an empty
//! element. Lists carry a `list="true"` attribute, so an empty list and an
//! object whose only field is `item` both survive a round trip. Decoding XML
//! yields text leaves; unmarked elements with repeated `<item>` children also
//! decode as lists.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use plcall_core::BlobFormat;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::error::{Result, RuntimeError};
use crate::value::{TIMESTAMP_FORMAT, Value};

const XML_ROOT: &str = "data";
const XML_ITEM: &str = "item";
const XML_LIST_ATTR: &str = "list";

pub fn encode(value: &Value, format: BlobFormat) -> Result<String> {
    match format {
        BlobFormat::Json => {
            serde_json::to_string(value).map_err(|e| RuntimeError::blob(format, e))
        }
        BlobFormat::Xml => {
            let mut writer = Writer::new(Vec::new());
            write_element(&mut writer, XML_ROOT, value)?;
            String::from_utf8(writer.into_inner()).map_err(|e| RuntimeError::blob(format, e))
        }
    }
}

pub fn decode(text: &str, format: BlobFormat) -> Result<Value> {
    match format {
        BlobFormat::Json => serde_json::from_str::<serde_json::Value>(text)
            .map(Value::from)
            .map_err(|e| RuntimeError::blob(format, e)),
        BlobFormat::Xml => decode_xml(text),
    }
}

fn xml_err(err: impl ToString) -> RuntimeError {
    RuntimeError::blob(BlobFormat::Xml, err)
}

fn scalar_text(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Decimal(s) | Value::Text(s) => s.clone(),
        Value::Bytes(b) => BASE64.encode(b),
        Value::Timestamp(t) => t.format(TIMESTAMP_FORMAT).to_string(),
        Value::Spilled(lob) => {
            return Err(xml_err(format!(
                "spilled LOB of {} bytes cannot be inlined",
                lob.len()
            )));
        }
        Value::Null | Value::Object(_) | Value::List(_) => String::new(),
    })
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(xml_err)?,
        Value::Object(fields) => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(xml_err)?;
            for (field, value) in fields {
                write_element(writer, field, value)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(xml_err)?;
        }
        Value::List(items) => {
            let start = BytesStart::new(name).with_attributes([(XML_LIST_ATTR, "true")]);
            if items.is_empty() {
                writer.write_event(Event::Empty(start)).map_err(xml_err)?;
                return Ok(());
            }
            writer.write_event(Event::Start(start)).map_err(xml_err)?;
            for item in items {
                write_element(writer, XML_ITEM, item)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(xml_err)?;
        }
        scalar => {
            let text = scalar_text(scalar)?;
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::Text(BytesText::new(&text)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(xml_err)?;
        }
    }
    Ok(())
}

#[derive(Default)]
struct Node {
    name: String,
    list: bool,
    children: Vec<(String, Value)>,
    text: String,
}

impl Node {
    fn finish(self) -> (String, Value) {
        let value = if self.list {
            Value::List(self.children.into_iter().map(|(_, v)| v).collect())
        } else if !self.children.is_empty() {
            if self.children.len() > 1 && self.children.iter().all(|(name, _)| name == XML_ITEM) {
                Value::List(self.children.into_iter().map(|(_, v)| v).collect())
            } else {
                Value::Object(self.children)
            }
        } else if !self.text.is_empty() {
            Value::Text(self.text)
        } else {
            Value::Null
        };
        (self.name, value)
    }
}

fn attach(stack: &mut [Node], root: &mut Option<Value>, name: String, value: Value) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push((name, value)),
        None if root.is_none() => *root = Some(value),
        None => return Err(xml_err("more than one root element")),
    }
    Ok(())
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn is_list(start: &BytesStart<'_>) -> bool {
    start
        .attributes()
        .flatten()
        .any(|a| a.key.as_ref() == XML_LIST_ATTR.as_bytes() && a.value.as_ref() == b"true")
}

fn decode_xml(text: &str) -> Result<Value> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(start) => stack.push(Node {
                name: element_name(&start),
                list: is_list(&start),
                ..Node::default()
            }),
            Event::Empty(start) => {
                let value = if is_list(&start) {
                    Value::List(Vec::new())
                } else {
                    Value::Null
                };
                attach(&mut stack, &mut root, element_name(&start), value)?;
            }
            Event::Text(t) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&t.unescape().map_err(xml_err)?);
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| xml_err("unbalanced end tag"))?;
                let (name, value) = node.finish();
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(xml_err("unclosed element"));
    }
    root.ok_or_else(|| xml_err("empty document"))
}
