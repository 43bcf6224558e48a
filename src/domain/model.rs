//! 事件回调领域模型
//!
//! 存储形态：`_id` 为 ObjectId，字段名小写（`planid`、`title`、`undo`、`parent`）。
//! 对外 JSON 形态见 `interface::http::dto`。

use mongodb::bson::{Bson, Document};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// 事件回调集合名
pub const EVENT_CALLBACK_COLLECTION: &str = "event_callback";

/// 一次 HTTP 调用的描述（应用到父计划，或撤销）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    #[serde(rename = "planid")]
    pub plan_id: String,
    pub method: String,
    pub uri: String,
    pub payload: Document,
}

/// 事件回调
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventCallback {
    #[serde(
        rename = "_id",
        skip_serializing_if = "String::is_empty",
        deserialize_with = "object_id_as_hex"
    )]
    pub id: String,
    #[serde(rename = "planid")]
    pub plan_id: String,
    pub title: String,
    pub undo: Action,
    pub parent: Action,
}

impl Action {
    /// 用 `patch` 中的非空字段覆盖当前值，payload 按键覆盖
    pub fn merge_from(&mut self, patch: Action) {
        if !patch.plan_id.is_empty() {
            self.plan_id = patch.plan_id;
        }
        if !patch.method.is_empty() {
            self.method = patch.method;
        }
        if !patch.uri.is_empty() {
            self.uri = patch.uri;
        }
        for (key, value) in patch.payload {
            self.payload.insert(key, value);
        }
    }
}

impl EventCallback {
    /// "非默认值覆盖"合并：`patch` 中为空的字段保持原值。
    ///
    /// 无法区分"显式清空"和"未提及"，两者都不会改动原字段。
    pub fn merge_from(&mut self, patch: EventCallback) {
        if !patch.id.is_empty() {
            self.id = patch.id;
        }
        if !patch.plan_id.is_empty() {
            self.plan_id = patch.plan_id;
        }
        if !patch.title.is_empty() {
            self.title = patch.title;
        }
        self.undo.merge_from(patch.undo);
        self.parent.merge_from(patch.parent);
    }
}

impl Entity for EventCallback {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn with_reset_identifier(&self, id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..self.clone()
        }
    }

    fn owner_key(&self) -> &str {
        &self.plan_id
    }

    fn collection_name() -> &'static str {
        EVENT_CALLBACK_COLLECTION
    }

    fn owner_field() -> &'static str {
        "planid"
    }
}

/// `_id` 可能是 ObjectId（库中的数据）也可能是字符串，统一转为十六进制字符串
fn object_id_as_hex<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Bson::deserialize(deserializer)? {
        Bson::ObjectId(oid) => Ok(oid.to_hex()),
        Bson::String(value) => Ok(value),
        Bson::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "unsupported _id type {:?}",
            other.element_type()
        ))),
    }
}
