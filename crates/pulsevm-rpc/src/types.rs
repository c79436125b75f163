use serde::{Deserialize, Serialize};

use crate::error::RpcError;

/// `pulsevm.ping` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub success: bool,
}

/// `pulsevm.issueTx` response: the accepted transaction's id, hex-encoded.
#[derive(Debug, Serialize, Deserialize)]
pub struct IssueTxResponse {
    #[serde(rename = "txID")]
    pub tx_id: String,
}

/// `pulsevm.getBlockByHeight` response: the block bytes, encoded the same
/// way the caller asked for the request, plus the encoding used so a caller
/// that didn't set one explicitly still knows how to decode the payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct GetBlockResponse {
    pub block: String,
    pub encoding: String,
}

/// Decodes a request payload per the spec's `encoding` parameter: `"hex"` or
/// `"cb58"` (base58 with no Avalanche-style checksum — this core doesn't
/// implement that framing, just the byte encoding spec.md names).
pub fn decode_bytes(data: &str, encoding: &str) -> Result<Vec<u8>, RpcError> {
    match encoding {
        "hex" => hex::decode(data).map_err(|e| RpcError::Malformed { field: "tx", reason: e.to_string() }),
        "cb58" => bs58::decode(data)
            .into_vec()
            .map_err(|e| RpcError::Malformed { field: "tx", reason: e.to_string() }),
        other => Err(RpcError::UnknownEncoding(other.to_string())),
    }
}

/// Encodes response bytes per the same `encoding` parameter.
pub fn encode_bytes(data: &[u8], encoding: &str) -> Result<String, RpcError> {
    match encoding {
        "hex" => Ok(hex::encode(data)),
        "cb58" => Ok(bs58::encode(data).into_string()),
        other => Err(RpcError::UnknownEncoding(other.to_string())),
    }
}
