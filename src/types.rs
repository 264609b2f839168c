// src/types.rs

//! Small value types shared by the config layer and the execution engine.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Importance at which a line of tool output is logged.
///
/// The three levels match the importance enumeration used by build loggers;
/// anything else in config is rejected before a process is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageImportance {
    High,
    #[default]
    Normal,
    Low,
}

impl FromStr for MessageImportance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(MessageImportance::High),
            "normal" => Ok(MessageImportance::Normal),
            "low" => Ok(MessageImportance::Low),
            other => Err(format!(
                "invalid importance: {other} (expected \"high\", \"normal\" or \"low\")"
            )),
        }
    }
}

impl fmt::Display for MessageImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageImportance::High => "high",
            MessageImportance::Normal => "normal",
            MessageImportance::Low => "low",
        };
        f.write_str(s)
    }
}

/// Text encoding used for a standard stream or a response file.
///
/// Decoding never fails: bytes that the encoding cannot represent are
/// replaced, so a tool emitting garbage cannot abort the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// UTF-8 with a leading byte-order mark when writing.
    Utf8Bom,
    Latin1,
    Ascii,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

impl TextEncoding {
    /// Decode one line of raw stream bytes (without its terminator).
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 | TextEncoding::Utf8Bom => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                String::from_utf8_lossy(bytes).into_owned()
            }
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect(),
        }
    }

    /// Encode text for writing to disk.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf8Bom => {
                let mut out = UTF8_BOM.to_vec();
                out.extend_from_slice(text.as_bytes());
                out
            }
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            TextEncoding::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "utf-8-bom" | "utf8-bom" => Ok(TextEncoding::Utf8Bom),
            "latin1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            "ascii" | "us-ascii" => Ok(TextEncoding::Ascii),
            other => Err(format!(
                "invalid encoding: {other} (expected utf-8, utf-8-bom, latin1 or ascii)"
            )),
        }
    }
}

/// Which processes a timeout or cancellation kills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KillScope {
    /// The tool and every process it started (its process group on Unix).
    #[default]
    Tree,
    /// Only the immediate child process.
    Process,
}

/// Why a tool was stopped before it exited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    TimedOut,
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::TimedOut => f.write_str("timed out"),
            Termination::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<MessageImportance>(), Ok(MessageImportance::High));
        assert_eq!(" low ".parse::<MessageImportance>(), Ok(MessageImportance::Low));
        assert!("verbose".parse::<MessageImportance>().is_err());
    }

    #[test]
    fn latin1_maps_bytes_to_code_points() {
        assert_eq!(TextEncoding::Latin1.decode(&[0x63, 0x61, 0x66, 0xE9]), "café");
        assert_eq!(TextEncoding::Latin1.encode("café€"), vec![0x63, 0x61, 0x66, 0xE9, b'?']);
    }

    #[test]
    fn utf8_bom_is_written_and_stripped() {
        let bytes = TextEncoding::Utf8Bom.encode("x");
        assert_eq!(bytes, vec![0xEF, 0xBB, 0xBF, b'x']);
        assert_eq!(TextEncoding::Utf8.decode(&bytes), "x");
    }

    #[test]
    fn ascii_replaces_non_ascii() {
        assert_eq!(TextEncoding::Ascii.decode("né".as_bytes()), "n??");
    }
}
