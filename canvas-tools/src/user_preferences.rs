//! `user_preferences`: scoped get/set of per-user preference values.
//! User-kind tool. Preferences live as a single flat JSON object per
//! user, keyed by `prefs:<userId>`.

use std::future::Future;
use std::pin::Pin;

use canvas_state::DbExt;
use canvas_tool::{ToolContext, ToolDyn, ToolError};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::keys;

/// Scoped read/write of user-level preferences.
pub struct UserPreferences;

#[derive(Deserialize)]
struct Args {
    operation: String,
    key: Option<String>,
    value: Option<Value>,
}

impl ToolDyn for UserPreferences {
    fn name(&self) -> &str {
        "user_preferences"
    }

    fn description(&self) -> &str {
        "Get or set a value in the calling user's preferences"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {"type": "string", "enum": ["get", "set"]},
                "key": {"type": "string"},
                "value": {},
            },
            "required": ["operation"],
        })
    }

    fn call<'a>(
        &'a self,
        args: Value,
        ctx: &'a ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send + 'a>> {
        Box::pin(async move {
            let args: Args =
                serde_json::from_value(args).map_err(|e| ToolError::Validation(e.to_string()))?;
            let db_key = keys::preferences(&ctx.user_id);

            match args.operation.as_str() {
                "get" => {
                    let prefs = ctx.db.read(&db_key).await?.unwrap_or_else(|| json!({}));
                    match args.key {
                        Some(key) => Ok(json!({ "key": key, "value": prefs.get(&key).cloned().unwrap_or(Value::Null) })),
                        None => Ok(json!({ "preferences": prefs })),
                    }
                }
                "set" => {
                    let key = args
                        .key
                        .filter(|k| !k.is_empty())
                        .ok_or_else(|| ToolError::Validation("set requires a non-empty key".into()))?;
                    let value = args
                        .value
                        .ok_or_else(|| ToolError::Validation("set requires a value".into()))?;

                    let prefs = ctx
                        .db
                        .update(&db_key, |current| {
                            let mut map = match current {
                                Some(Value::Object(map)) => map,
                                _ => Map::new(),
                            };
                            map.insert(key, value);
                            Ok(Value::Object(map))
                        })
                        .await?;
                    Ok(json!({ "preferences": prefs }))
                }
                other => Err(ToolError::Validation(format!("unknown operation: {other}"))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;

    #[tokio::test]
    async fn set_then_get_round_trips_a_key() {
        let ctx = test_context();
        let tool = UserPreferences;
        tool.call(json!({"operation": "set", "key": "theme", "value": "dark"}), &ctx)
            .await
            .unwrap();

        let out = tool.call(json!({"operation": "get", "key": "theme"}), &ctx).await.unwrap();
        assert_eq!(out["value"], "dark");
    }

    #[tokio::test]
    async fn get_missing_key_returns_null() {
        let ctx = test_context();
        let out = UserPreferences
            .call(json!({"operation": "get", "key": "nope"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out["value"], Value::Null);
    }

    #[tokio::test]
    async fn set_rejects_empty_key() {
        let ctx = test_context();
        let err = UserPreferences
            .call(json!({"operation": "set", "key": "", "value": 1}), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }
}
