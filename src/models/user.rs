use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::store::Document;

/// Stored profile of a storefront user (`users/{uid}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, deserialize_with = "lenient_permissions")]
    pub permissions: Permissions,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Administrative capabilities. Anything other than an explicit boolean
/// `true` is a denial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    #[serde(default, deserialize_with = "strict_true")]
    pub can_manage_users: bool,
}

impl UserProfile {
    /// Decode a stored document. Shape problems in unrelated fields are
    /// errors; shape problems in `permissions` only ever remove capabilities.
    pub fn from_document(document: Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(document))
    }

    pub fn can_manage_users(&self) -> bool {
        self.permissions.can_manage_users
    }
}

fn strict_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(matches!(value, Value::Bool(true)))
}

fn lenient_permissions<'de, D>(deserializer: D) -> Result<Permissions, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => Permissions::default(),
    })
}
