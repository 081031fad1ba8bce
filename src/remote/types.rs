//! eLights component model and wire decoding.

use crate::error::{BridgeError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Length of an eLights component uuid.
pub const COMPONENT_ID_LEN: usize = 36;

/// Kind of output an eLights component drives.
///
/// Serialized with the eLights `type` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum ComponentKind {
    #[strum(serialize = "RelayOutput")]
    #[serde(rename = "RelayOutput")]
    Switch,
    #[strum(serialize = "DimmerOutput")]
    #[serde(rename = "DimmerOutput")]
    Dimmer,
}

/// A value reported by the remote side, before any validation.
///
/// Switches expect `Bool`, dimmers expect `Number` in 0..=100. Anything the
/// decoder could not make sense of is kept as `Unparsed` so the adapter can
/// reject it with the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteValue {
    Bool(bool),
    Number(i64),
    Unparsed(String),
}

impl RemoteValue {
    /// Parse a value segment from a push notification path.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            other => other
                .parse::<i64>()
                .map(Self::Number)
                .unwrap_or_else(|_| Self::Unparsed(other.to_string())),
        }
    }

    fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Number(i),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 => Self::Number(f as i64),
                    _ => Self::Unparsed(n.to_string()),
                },
            },
            other => Self::Unparsed(other.to_string()),
        }
    }
}

impl fmt::Display for RemoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Unparsed(s) => write!(f, "{s:?}"),
        }
    }
}

/// A controllable eLights component.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub id: String,
    pub room: String,
    pub name: String,
    pub kind: ComponentKind,
    pub value: RemoteValue,
}

impl Component {
    /// Display label used for new accessories.
    pub fn label(&self) -> String {
        format!("{} {}", self.room, self.name)
    }
}

/// One entry of `GET /api/uuid` as the server sends it.
#[derive(Debug, Deserialize)]
struct WireComponent {
    uuid: String,
    room: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    percentage: Option<serde_json::Value>,
}

impl WireComponent {
    fn into_component(self) -> Option<Component> {
        let Ok(kind) = self.kind.parse::<ComponentKind>() else {
            debug!("[Remote] Skipping {} ({}): unsupported type", self.uuid, self.kind);
            return None;
        };

        if self.uuid.len() != COMPONENT_ID_LEN {
            warn!("[Remote] Component id {:?} is not a {COMPONENT_ID_LEN} character uuid", self.uuid);
        }

        let value = match kind {
            ComponentKind::Dimmer if !self.value.is_number() => self
                .percentage
                .as_ref()
                .map(RemoteValue::from_json)
                .unwrap_or_else(|| RemoteValue::from_json(&self.value)),
            _ => RemoteValue::from_json(&self.value),
        };

        Some(Component {
            id: self.uuid,
            room: self.room,
            name: self.name,
            kind,
            value,
        })
    }
}

/// Decode the full inventory, keeping only relay and dimmer outputs.
pub fn decode_components(body: &[u8]) -> Result<Vec<Component>> {
    let wire: Vec<WireComponent> = serde_json::from_slice(body)
        .map_err(|e| BridgeError::RemoteUnavailable(format!("malformed component list: {e}")))?;

    Ok(wire
        .into_iter()
        .filter_map(WireComponent::into_component)
        .collect())
}
