use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Версия схемы модуля вида `major.minor.patch`.
///
/// Сравнение покомпонентное и числовое: `1.0.9 < 1.0.25`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    /// Недостающие компоненты считаются нулями: "1.2" == "1.2.0".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Empty schema version".into());
        }

        let mut parts = [0u32; 3];
        for (index, part) in trimmed.split('.').enumerate() {
            if index >= parts.len() {
                return Err(format!("Too many components in schema version '{}'", s));
            }
            parts[index] = part
                .parse::<u32>()
                .map_err(|e| format!("Invalid schema version '{}': {}", s, e))?;
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SchemaVersion {
        s.parse().unwrap()
    }

    #[test]
    fn two_digit_components_compare_numerically() {
        assert!(v("1.0.9") < v("1.0.25"));
        assert!(v("1.0.25") < v("1.0.28"));
        assert!(v("1.0.41") < v("1.1.0"));
        assert!(v("2.0.0") > v("1.99.99"));
    }

    #[test]
    fn short_versions_are_padded() {
        assert_eq!(v("1.2"), SchemaVersion::new(1, 2, 0));
        assert_eq!(v("3"), SchemaVersion::new(3, 0, 0));
        assert_eq!(v(" 1.0.20 ").to_string(), "1.0.20");
    }

    #[test]
    fn malformed_versions_are_rejected() {
        assert!("".parse::<SchemaVersion>().is_err());
        assert!("1.0.x".parse::<SchemaVersion>().is_err());
        assert!("1.0.0.1".parse::<SchemaVersion>().is_err());
        assert!("1..2".parse::<SchemaVersion>().is_err());
    }
}
