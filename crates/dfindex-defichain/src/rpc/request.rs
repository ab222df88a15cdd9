//! JSON-RPC 1.0 envelope as spoken by the DeFiChain node.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a [Value],
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a [Value]) -> Self {
        Self {
            jsonrpc: "1.0",
            id,
            method,
            params,
        }
    }
}

/// Error member of a node reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// The node sends both `result` and `error`, one of them null.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

impl RpcResponse {
    pub fn into_result(self) -> Result<Value, RpcErrorObject> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_node_dialect() {
        let params = [Value::from("00ff"), Value::from(2)];
        let body = serde_json::to_value(RpcRequest::new(7, "getblock", &params)).unwrap();
        assert_eq!(body["jsonrpc"], "1.0");
        assert_eq!(body["id"], 7);
        assert_eq!(body["params"][1], 2);
    }

    #[test]
    fn error_member_wins() {
        let reply: RpcResponse = serde_json::from_str(
            r#"{"result":null,"error":{"code":-8,"message":"Block height out of range"},"id":1}"#,
        )
        .unwrap();
        assert_eq!(
            reply.into_result().unwrap_err(),
            RpcErrorObject {
                code: -8,
                message: "Block height out of range".into()
            }
        );
    }

    #[test]
    fn null_error_yields_result() {
        let reply: RpcResponse = serde_json::from_str(r#"{"result":120,"error":null}"#).unwrap();
        assert_eq!(reply.into_result().unwrap(), Value::from(120));
    }
}
