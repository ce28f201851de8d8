// ufo_storefront/src/services/packeta/wire.rs

//! XML framing of the carrier API. A request is a root element named after
//! the remote method, holding `apiPassword` plus the call's arguments. A
//! response is `<response><status>ok|fault</status>...</response>`; a fault
//! carries `<fault>`, `<string>` and optionally a structured `<detail>`.

use super::error::{ShipmentApiError, ShipmentErrorKind};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketAttributes {
  /// Merchant reference; the order number.
  pub number: String,
  pub name: String,
  pub surname: String,
  pub email: String,
  pub phone: String,
  /// Pickup point id.
  pub address_id: String,
  /// Declared value in major units.
  pub value: String,
  pub currency: String,
  /// Kilograms.
  pub weight: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub eshop: Option<String>,
}

#[derive(Serialize)]
struct PacketAttributesCall<'a> {
  #[serde(rename = "apiPassword")]
  api_password: &'a str,
  #[serde(rename = "packetAttributes")]
  packet_attributes: &'a PacketAttributes,
}

#[derive(Serialize)]
struct PacketIdCall<'a> {
  #[serde(rename = "apiPassword")]
  api_password: &'a str,
  #[serde(rename = "packetId")]
  packet_id: &'a str,
}

fn to_xml<T: Serialize>(method: &str, body: &T) -> Result<String, ShipmentApiError> {
  quick_xml::se::to_string_with_root(method, body).map_err(|e| {
    ShipmentApiError::new(
      ShipmentErrorKind::UnknownError,
      format!("{} request could not be encoded: {}", method, e),
    )
  })
}

pub(crate) fn encode_attributes_call(
  method: &str,
  api_password: &str,
  attributes: &PacketAttributes,
) -> Result<String, ShipmentApiError> {
  to_xml(
    method,
    &PacketAttributesCall {
      api_password,
      packet_attributes: attributes,
    },
  )
}

pub(crate) fn encode_packet_id_call(method: &str, api_password: &str, packet_id: &str) -> Result<String, ShipmentApiError> {
  to_xml(method, &PacketIdCall { api_password, packet_id })
}

/// Minimal element tree of a response document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct XmlNode {
  pub name: String,
  pub text: String,
  pub children: Vec<XmlNode>,
}

impl XmlNode {
  fn named(name: &[u8]) -> Self {
    XmlNode {
      name: String::from_utf8_lossy(name).into_owned(),
      ..Default::default()
    }
  }

  pub fn parse(xml: &str) -> Result<XmlNode, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<XmlNode> = Vec::new();

    loop {
      let node = match reader.read_event() {
        Ok(Event::Start(start)) => {
          stack.push(XmlNode::named(start.local_name().as_ref()));
          continue;
        }
        Ok(Event::Empty(start)) => XmlNode::named(start.local_name().as_ref()),
        Ok(Event::End(_)) => stack.pop().ok_or_else(|| "unbalanced closing tag".to_string())?,
        Ok(Event::Text(text)) => {
          let text = text.unescape().map_err(|e| e.to_string())?;
          if let Some(current) = stack.last_mut() {
            current.text.push_str(&text);
          }
          continue;
        }
        Ok(Event::CData(data)) => {
          if let Some(current) = stack.last_mut() {
            current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
          }
          continue;
        }
        Ok(Event::Eof) => return Err("document ended before the root element was closed".to_string()),
        Ok(_) => continue,
        Err(e) => return Err(format!("at byte {}: {}", reader.buffer_position(), e)),
      };
      match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => return Ok(node),
      }
    }
  }

  pub fn child(&self, name: &str) -> Option<&XmlNode> {
    self.children.iter().find(|c| c.name == name)
  }

  pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
    self.children.iter().filter(move |c| c.name == name)
  }

  /// Trimmed text of a direct child, if present and non-empty.
  pub fn child_text(&self, name: &str) -> Option<&str> {
    self.child(name).map(|c| c.text.trim()).filter(|t| !t.is_empty())
  }

  /// All text in this subtree, space separated, in document order.
  pub fn flatten_text(&self) -> String {
    let mut parts = Vec::new();
    self.collect_text(&mut parts);
    parts.join(" ")
  }

  fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
    let own = self.text.trim();
    if !own.is_empty() {
      parts.push(own);
    }
    for child in &self.children {
      child.collect_text(parts);
    }
  }
}

/// Returns the `<result>` element of a successful response. Any fault or
/// string field makes the response an application error, whatever the HTTP status.
pub(crate) fn decode_response(method: &str, body: &str) -> Result<XmlNode, ShipmentApiError> {
  let root = XmlNode::parse(body).map_err(|e| {
    ShipmentApiError::new(
      ShipmentErrorKind::UnknownError,
      format!("{} response is not valid XML: {}", method, e),
    )
  })?;

  let status = root.child_text("status").unwrap_or_default();
  let fault = root.child_text("fault");
  let string = root.child_text("string");
  if status == "fault" || fault.is_some() || string.is_some() {
    let message = match (fault, string) {
      (Some(f), Some(s)) => format!("{}: {}", f, s),
      (Some(f), None) => f.to_string(),
      (None, Some(s)) => s.to_string(),
      (None, None) => format!("{} returned a fault without a message", method),
    };
    let detail = root.child("detail").map(XmlNode::flatten_text).unwrap_or_default();
    return Err(ShipmentApiError::from_fault(&message, &detail));
  }
  if status != "ok" {
    return Err(ShipmentApiError::new(
      ShipmentErrorKind::UnknownError,
      format!("{} returned unexpected status '{}'", method, status),
    ));
  }
  Ok(root.child("result").cloned().unwrap_or_default())
}
