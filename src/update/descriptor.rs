use regex::Regex;

use super::UpdateError;
use super::version::Version;

/// Remote release information: `version:`, `from:` and optional `info:` lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    pub version: Version,
    pub from: String,
    pub info: Option<String>,
}

impl ReleaseDescriptor {
    pub fn parse(text: &str) -> Result<Self, UpdateError> {
        let version = field(text, "version")
            .ok_or_else(|| UpdateError::Descriptor("no version line".to_string()))?
            .parse()?;
        let from = field(text, "from")
            .ok_or_else(|| UpdateError::Descriptor("no from line".to_string()))?;

        Ok(Self {
            version,
            from,
            info: field(text, "info"),
        })
    }

    /// Download location; a `from` ending in `/` names a directory
    pub fn download_url(&self, file_name: &str) -> String {
        if self.from.ends_with('/') {
            format!("{}{}", self.from, file_name)
        } else {
            self.from.clone()
        }
    }
}

/// Value of one `key:` line; never spills onto the next line
fn field(text: &str, key: &str) -> Option<String> {
    let pattern = format!(r"(?m)^[ \t]*{}:[ \t]*(\S.*?)[ \t\r]*$", regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_descriptor() {
        let text = "info: Faster HLS capture\nversion: 1.26\nfrom: https://dl.example.org/vidgrab/\n";
        let descriptor = ReleaseDescriptor::parse(text).unwrap();

        assert_eq!(descriptor.version, "1.26".parse().unwrap());
        assert_eq!(descriptor.info.as_deref(), Some("Faster HLS capture"));
        assert_eq!(
            descriptor.download_url("vidgrab"),
            "https://dl.example.org/vidgrab/vidgrab"
        );
    }

    #[test]
    fn test_from_naming_a_file_is_used_as_is() {
        let descriptor =
            ReleaseDescriptor::parse("version: 2.0\nfrom: https://x/vidgrab-2.0\n").unwrap();
        assert_eq!(descriptor.download_url("vidgrab"), "https://x/vidgrab-2.0");
        assert!(descriptor.info.is_none());
    }

    #[test]
    fn test_missing_fields_are_errors() {
        assert!(matches!(
            ReleaseDescriptor::parse("from: https://x/\n"),
            Err(UpdateError::Descriptor(_))
        ));
        assert!(matches!(
            ReleaseDescriptor::parse("version: 1.0\n"),
            Err(UpdateError::Descriptor(_))
        ));
        assert!(matches!(
            ReleaseDescriptor::parse("version: soon\nfrom: https://x/\n"),
            Err(UpdateError::Version(_))
        ));
    }

    #[test]
    fn test_empty_info_does_not_take_next_line() {
        let descriptor =
            ReleaseDescriptor::parse("info:\nversion: 1.26\nfrom: https://x/\n").unwrap();
        assert!(descriptor.info.is_none());
        assert_eq!(descriptor.version, "1.26".parse().unwrap());
        assert_eq!(descriptor.from, "https://x/");
    }

    #[test]
    fn test_empty_version_is_missing() {
        match ReleaseDescriptor::parse("version:\nfrom: https://x/\n") {
            Err(UpdateError::Descriptor(reason)) => assert_eq!(reason, "no version line"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_crlf_lines() {
        let descriptor =
            ReleaseDescriptor::parse("version: 1.26\r\nfrom: https://x/\r\n").unwrap();
        assert_eq!(descriptor.from, "https://x/");
    }
}
