//! In-page bridge script and its call protocol.

use serde::Deserialize;
use serde_json::Value;

use reachguard_core::{DocumentError, NodeId};

/// The bridge installer. Evaluates to the bridge's epoch token.
pub(crate) fn bridge_script() -> &'static str {
    include_str!("bridge.js")
}

/// Expression invoking a bridge method. A missing bridge reads as detached.
pub(crate) fn call_expression(
    epoch: &str,
    method: &str,
    args: &[Value],
) -> Result<String, serde_json::Error> {
    Ok(format!(
        "(window.__reachguard ? window.__reachguard.call({}, {}, {}) : {{ err: {{ kind: 'detached' }} }})",
        serde_json::to_string(epoch)?,
        serde_json::to_string(method)?,
        serde_json::to_string(args)?,
    ))
}

#[derive(Debug, Deserialize)]
struct BridgeFailure {
    kind: String,
    node: Option<u64>,
    message: Option<String>,
}

/// Decode a `{ok}` / `{err}` bridge reply.
pub(crate) fn parse_reply(reply: Value) -> Result<Value, DocumentError> {
    if let Some(err) = reply.get("err") {
        let failure: BridgeFailure = serde_json::from_value(err.clone())
            .map_err(|e| DocumentError::Backend(format!("malformed bridge error: {}", e)))?;
        return Err(match (failure.kind.as_str(), failure.node) {
            ("detached", _) => DocumentError::Detached,
            ("node-not-found", Some(node)) => DocumentError::NodeNotFound(NodeId(node)),
            _ => DocumentError::Backend(
                failure.message.unwrap_or_else(|| format!("bridge error: {}", failure.kind)),
            ),
        });
    }

    match reply {
        Value::Object(mut map) => Ok(map.remove("ok").unwrap_or(Value::Null)),
        // No bridge at all in the evaluated context.
        Value::Null => Err(DocumentError::Detached),
        other => Err(DocumentError::Backend(format!("unexpected bridge reply: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_script_installs_bridge() {
        let script = bridge_script();
        assert!(script.contains("window.__reachguard"));
        assert!(script.contains("elementsFromPoint"));
        assert!(script.contains("WeakMap"));
    }

    #[test]
    fn test_duplicate_resets_page_placement() {
        let script = bridge_script();
        let duplicate = &script[script.find("duplicate(originalId").unwrap()..];
        let reset = duplicate.find("resetClonePlacement(clone);").unwrap();
        let append = duplicate.find("container.appendChild(clone)").unwrap();
        let apply = duplicate.find("applyPresentation(clone, presentation)").unwrap();
        assert!(reset < append && append < apply);

        let reset_fn = &script[script.find("function resetClonePlacement").unwrap()..];
        assert!(reset_fn.contains("clone.style.removeProperty(prop)"));
        assert!(script.contains("position: 'relative'"));
        assert!(script.contains("inset: 'auto'"));
        assert!(script.contains("transform: 'none'"));
    }

    #[test]
    fn test_call_expression_escapes_arguments() {
        let expr = call_expression("e1", "computedStyle", &[json!(3), json!("z-index")]).unwrap();
        assert!(expr.contains(r#"call("e1", "computedStyle", [3,"z-index"])"#));

        let expr = call_expression("e'1", "x", &[json!("\"); alert(1); (\"")]).unwrap();
        assert!(expr.contains(r#"\"); alert(1); (\""#));
    }

    #[test]
    fn test_parse_ok_reply() {
        assert_eq!(parse_reply(json!({"ok": [1, 2]})).unwrap(), json!([1, 2]));
        assert!(parse_reply(json!({"ok": null})).unwrap().is_null());
        assert!(parse_reply(json!({})).unwrap().is_null());
    }

    #[test]
    fn test_parse_error_replies() {
        assert!(matches!(
            parse_reply(json!({"err": {"kind": "detached"}})),
            Err(DocumentError::Detached)
        ));
        assert!(matches!(
            parse_reply(json!({"err": {"kind": "node-not-found", "node": 12}})),
            Err(DocumentError::NodeNotFound(NodeId(12)))
        ));
        match parse_reply(json!({"err": {"kind": "backend", "message": "TypeError"}})) {
            Err(DocumentError::Backend(msg)) => assert_eq!(msg, "TypeError"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(parse_reply(Value::Null), Err(DocumentError::Detached)));
    }
}
