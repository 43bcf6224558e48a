//! 对外 JSON 形态：`{id, planId, title, undo, parent}`

use mongodb::bson::{self, Bson, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Action, EventCallback};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionBody {
    pub plan_id: String,
    pub method: String,
    pub uri: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallbackBody {
    pub id: String,
    pub plan_id: String,
    pub title: String,
    pub undo: ActionBody,
    pub parent: ActionBody,
}

impl ActionBody {
    fn into_domain(self, field: &str) -> Result<Action, String> {
        let payload = match self.payload {
            Value::Null => Document::new(),
            Value::Object(map) => bson::to_document(&map)
                .map_err(|err| format!("{field}.payload cannot be stored: {err}"))?,
            other => {
                return Err(format!(
                    "{field}.payload must be an object, got {}",
                    json_kind(&other)
                ));
            }
        };

        Ok(Action {
            plan_id: self.plan_id,
            method: self.method,
            uri: self.uri,
            payload,
        })
    }
}

impl From<Action> for ActionBody {
    fn from(action: Action) -> Self {
        Self {
            plan_id: action.plan_id,
            method: action.method,
            uri: action.uri,
            payload: Bson::Document(action.payload).into_relaxed_extjson(),
        }
    }
}

impl CallbackBody {
    /// 转换为领域模型；payload 必须是 JSON 对象（或省略）
    pub fn into_domain(self) -> Result<EventCallback, String> {
        Ok(EventCallback {
            id: self.id,
            plan_id: self.plan_id,
            title: self.title,
            undo: self.undo.into_domain("undo")?,
            parent: self.parent.into_domain("parent")?,
        })
    }
}

impl From<EventCallback> for CallbackBody {
    fn from(callback: EventCallback) -> Self {
        Self {
            id: callback.id,
            plan_id: callback.plan_id,
            title: callback.title,
            undo: callback.undo.into(),
            parent: callback.parent.into(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
