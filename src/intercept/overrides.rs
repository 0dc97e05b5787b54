// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Override store
//!
//! Transforms hand back loosely-typed JSON payloads. Only a fixed set of
//! response fields may be overridden; everything else in the payload is
//! discarded on the way in.

use std::fmt;

use serde_json::{Map, Value};

use crate::transport::ResponseType;

/// Response fields a transform may override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseField {
    ResponseText,
    ResponseType,
    ResponseUrl,
    Status,
    StatusText,
}

impl ResponseField {
    pub const ALL: [ResponseField; 5] = [
        ResponseField::ResponseText,
        ResponseField::ResponseType,
        ResponseField::ResponseUrl,
        ResponseField::Status,
        ResponseField::StatusText,
    ];

    /// Payload key for this field
    pub fn name(self) -> &'static str {
        match self {
            ResponseField::ResponseText => "responseText",
            ResponseField::ResponseType => "responseType",
            ResponseField::ResponseUrl => "responseURL",
            ResponseField::Status => "status",
            ResponseField::StatusText => "statusText",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for ResponseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Validated replacement values for one completion cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSet {
    response_text: Option<String>,
    response_type: Option<ResponseType>,
    response_url: Option<String>,
    status: Option<u16>,
    status_text: Option<String>,
}

/// Outcome of validating a candidate payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validated {
    pub overrides: OverrideSet,
    /// Keys that were present but not accepted
    pub dropped: Vec<String>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an override set from a transform payload
    ///
    /// Copies whitelisted keys whose values have the right shape into a fresh
    /// set. Unknown keys and ill-typed values are reported in `dropped`. A
    /// payload that is not a JSON object yields an empty set.
    pub fn apply_validated(candidate: &Value) -> Validated {
        let mut validated = Validated::default();
        let object = match candidate {
            Value::Object(object) => object,
            Value::Null => return validated,
            other => {
                validated.dropped.push(format!("<{}>", json_kind(other)));
                return validated;
            }
        };

        for (key, value) in object {
            let accepted = match ResponseField::from_name(key) {
                Some(field) => validated.overrides.accept(field, value),
                None => false,
            };
            if !accepted {
                validated.dropped.push(key.clone());
            }
        }
        validated
    }

    fn accept(&mut self, field: ResponseField, value: &Value) -> bool {
        match field {
            ResponseField::ResponseText => {
                self.response_text = value.as_str().map(str::to_string);
                self.response_text.is_some()
            }
            ResponseField::ResponseType => {
                self.response_type = value.as_str().and_then(ResponseType::parse);
                self.response_type.is_some()
            }
            ResponseField::ResponseUrl => {
                self.response_url = value.as_str().map(str::to_string);
                self.response_url.is_some()
            }
            ResponseField::Status => {
                self.status = value
                    .as_u64()
                    .filter(|s| *s <= 999)
                    .map(|s| s as u16);
                self.status.is_some()
            }
            ResponseField::StatusText => {
                self.status_text = value.as_str().map(str::to_string);
                self.status_text.is_some()
            }
        }
    }

    pub fn response_text(mut self, text: impl Into<String>) -> Self {
        self.response_text = Some(text.into());
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn response_url(mut self, url: impl Into<String>) -> Self {
        self.response_url = Some(url.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = Some(text.into());
        self
    }

    pub fn get_response_text(&self) -> Option<&str> {
        self.response_text.as_deref()
    }

    pub fn get_response_type(&self) -> Option<ResponseType> {
        self.response_type
    }

    pub fn get_response_url(&self) -> Option<&str> {
        self.response_url.as_deref()
    }

    pub fn get_status(&self) -> Option<u16> {
        self.status
    }

    pub fn get_status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Fields currently overridden
    pub fn fields(&self) -> Vec<ResponseField> {
        ResponseField::ALL
            .into_iter()
            .filter(|f| match f {
                ResponseField::ResponseText => self.response_text.is_some(),
                ResponseField::ResponseType => self.response_type.is_some(),
                ResponseField::ResponseUrl => self.response_url.is_some(),
                ResponseField::Status => self.status.is_some(),
                ResponseField::StatusText => self.status_text.is_some(),
            })
            .collect()
    }

    /// Payload form, suitable for returning from a transform
    pub fn to_payload(&self) -> Value {
        let mut map = Map::new();
        if let Some(ref text) = self.response_text {
            map.insert("responseText".into(), Value::from(text.as_str()));
        }
        if let Some(ty) = self.response_type {
            map.insert("responseType".into(), Value::from(ty.as_str()));
        }
        if let Some(ref url) = self.response_url {
            map.insert("responseURL".into(), Value::from(url.as_str()));
        }
        if let Some(status) = self.status {
            map.insert("status".into(), Value::from(status));
        }
        if let Some(ref text) = self.status_text {
            map.insert("statusText".into(), Value::from(text.as_str()));
        }
        Value::Object(map)
    }
}

impl From<OverrideSet> for Value {
    fn from(set: OverrideSet) -> Self {
        set.to_payload()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
