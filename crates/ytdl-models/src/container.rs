//! Output container formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Container the fetch tool merges audio and video into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaContainer {
    #[default]
    Mp4,
    Mkv,
    Webm,
}

impl MediaContainer {
    /// File extension, also used as the `--merge-output-format` value.
    pub fn extension(&self) -> &'static str {
        match self {
            MediaContainer::Mp4 => "mp4",
            MediaContainer::Mkv => "mkv",
            MediaContainer::Webm => "webm",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MediaContainer::Mp4 => "video/mp4",
            MediaContainer::Mkv => "video/x-matroska",
            MediaContainer::Webm => "video/webm",
        }
    }
}

impl fmt::Display for MediaContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported container format: {0}")]
pub struct UnknownContainer(pub String);

impl FromStr for MediaContainer {
    type Err = UnknownContainer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mp4" => Ok(MediaContainer::Mp4),
            "mkv" => Ok(MediaContainer::Mkv),
            "webm" => Ok(MediaContainer::Webm),
            other => Err(UnknownContainer(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_container() {
        assert_eq!("mp4".parse(), Ok(MediaContainer::Mp4));
        assert_eq!(" MKV ".parse(), Ok(MediaContainer::Mkv));
        assert_eq!(
            "avi".parse::<MediaContainer>(),
            Err(UnknownContainer("avi".to_string()))
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(MediaContainer::default().content_type(), "video/mp4");
        assert_eq!(MediaContainer::Mkv.content_type(), "video/x-matroska");
    }
}
