//! Tagged-line wire framing for the progress stream.
//!
//! Several conceptual message kinds share one ordered byte stream: plain
//! progress text, a terminal error, a cancellation marker, the exported file
//! payload, and a published-sheet URL. Each frame is one line with a fixed
//! self-describing tag prefix, so a consumer can demultiplex by inspecting
//! the prefix alone. [`FrameDecoder`] reassembles lines across arbitrary
//! chunk boundaries in the underlying transport.

use base64::Engine;
use serde::{Deserialize, Serialize};

const TAG_PROGRESS: &str = "PROGRESS";
const TAG_ERROR: &str = "ERROR";
const TAG_CANCELLED: &str = "CANCELLED";
const TAG_DATA: &str = "DATA";
const TAG_SHEETS: &str = "GOOGLE_SHEETS";

/// One framed message on the progress stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Incremental progress text.
    Progress(String),
    /// Terminal error; nothing follows.
    Error(String),
    /// The run was cancelled; nothing follows.
    Cancelled(String),
    /// Final exported file.
    Data {
        filename: String,
        mime: String,
        payload: Vec<u8>,
    },
    /// URL of a published cloud sheet.
    Sheets { url: String },
}

#[derive(Serialize, Deserialize)]
struct DataPayload {
    payload: String,
    filename: String,
    mime: String,
}

#[derive(Serialize, Deserialize)]
struct SheetsPayload {
    url: String,
}

impl Frame {
    /// Encode as a single `TAG:payload` line. Embedded newlines in text
    /// payloads are flattened so one frame is always exactly one line.
    pub fn encode(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD;
        match self {
            Frame::Progress(text) => format!("{}:{}\n", TAG_PROGRESS, flatten(text)),
            Frame::Error(text) => format!("{}:{}\n", TAG_ERROR, flatten(text)),
            Frame::Cancelled(text) => format!("{}:{}\n", TAG_CANCELLED, flatten(text)),
            Frame::Data {
                filename,
                mime,
                payload,
            } => {
                let body = DataPayload {
                    payload: b64.encode(payload),
                    filename: filename.clone(),
                    mime: mime.clone(),
                };
                // Serializing a struct of strings cannot fail.
                let json = serde_json::to_string(&body).unwrap_or_default();
                format!("{}:{}\n", TAG_DATA, json)
            }
            Frame::Sheets { url } => {
                let json =
                    serde_json::to_string(&SheetsPayload { url: url.clone() }).unwrap_or_default();
                format!("{}:{}\n", TAG_SHEETS, json)
            }
        }
    }

    fn decode_line(line: &str) -> Result<Frame, WireError> {
        let (tag, payload) = line
            .split_once(':')
            .ok_or_else(|| WireError::MissingTag(line.to_string()))?;
        let b64 = base64::engine::general_purpose::STANDARD;
        match tag {
            TAG_PROGRESS => Ok(Frame::Progress(payload.to_string())),
            TAG_ERROR => Ok(Frame::Error(payload.to_string())),
            TAG_CANCELLED => Ok(Frame::Cancelled(payload.to_string())),
            TAG_DATA => {
                let body: DataPayload = serde_json::from_str(payload)
                    .map_err(|e| WireError::BadPayload(e.to_string()))?;
                let payload = b64
                    .decode(body.payload.as_bytes())
                    .map_err(|e| WireError::BadPayload(e.to_string()))?;
                Ok(Frame::Data {
                    filename: body.filename,
                    mime: body.mime,
                    payload,
                })
            }
            TAG_SHEETS => {
                let body: SheetsPayload = serde_json::from_str(payload)
                    .map_err(|e| WireError::BadPayload(e.to_string()))?;
                Ok(Frame::Sheets { url: body.url })
            }
            other => Err(WireError::UnknownTag(other.to_string())),
        }
    }
}

fn flatten(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Errors produced while decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("frame has no tag: {0:?}")]
    MissingTag(String),
    #[error("unknown frame tag: {0:?}")]
    UnknownTag(String),
    #[error("bad frame payload: {0}")]
    BadPayload(String),
}

/// Incremental frame decoder. Feed it transport chunks of any size; it
/// buffers partial lines and yields each frame exactly once.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    carry: String,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one transport chunk, returning any frames completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Frame>, WireError> {
        self.carry.push_str(&String::from_utf8_lossy(chunk));
        let mut frames = Vec::new();
        while let Some(pos) = self.carry.find('\n') {
            let line: String = self.carry.drain(..=pos).collect();
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            frames.push(Frame::decode_line(line)?);
        }
        Ok(frames)
    }

    /// Flush a trailing frame that arrived without a final newline.
    pub fn finish(&mut self) -> Result<Option<Frame>, WireError> {
        let tail = std::mem::take(&mut self.carry);
        let tail = tail.trim();
        if tail.is_empty() {
            Ok(None)
        } else {
            Frame::decode_line(tail).map(Some)
        }
    }
}
