//! Severity levels and item status

use serde::{Deserialize, Deserializer, Serialize};

/// Named severity tiers, ordered by their numeric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Critical = 50,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    /// Map an API level code to its tier
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            10 => Some(Self::Debug),
            20 => Some(Self::Info),
            30 => Some(Self::Warning),
            40 => Some(Self::Error),
            50 => Some(Self::Critical),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Invalid level: {}", s)),
        }
    }
}

/// Numeric item level as reported by the API
///
/// The API sends either the integer code or the tier name; both decode
/// to the integer. Codes outside the five tiers are kept verbatim and
/// label as `unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Level(pub i64);

impl Level {
    pub fn severity(&self) -> Option<Severity> {
        Severity::from_code(self.0)
    }

    /// Human label: one of the five tier names, or `unknown`
    pub fn label(&self) -> &'static str {
        self.severity().map(Severity::as_str).unwrap_or("unknown")
    }
}

impl From<Severity> for Level {
    fn from(severity: Severity) -> Self {
        Level(severity.code())
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(i64),
            Name(String),
            Null(()),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Code(code) => Level(code),
            Raw::Name(name) => name
                .parse::<Severity>()
                .map(Level::from)
                .or_else(|_| name.trim().parse::<i64>().map(Level))
                .unwrap_or_default(),
            Raw::Null(()) => Level::default(),
        })
    }
}

/// Item workflow status
///
/// Unrecognized statuses are preserved so they survive a JSON round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ItemStatus {
    Active,
    Resolved,
    Muted,
    Other(String),
}

impl ItemStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
            Self::Muted => "muted",
            Self::Other(s) => s,
        }
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<Option<String>> for ItemStatus {
    fn from(s: Option<String>) -> Self {
        match s.as_deref() {
            Some("active") => Self::Active,
            Some("resolved") => Self::Resolved,
            Some("muted") => Self::Muted,
            Some(_) => Self::Other(s.unwrap_or_default()),
            None => Self::default(),
        }
    }
}

impl From<&str> for ItemStatus {
    fn from(s: &str) -> Self {
        Self::from(Some(s.to_string()))
    }
}

impl From<ItemStatus> for String {
    fn from(status: ItemStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_labels() {
        let cases = [
            (10, "debug"),
            (20, "info"),
            (30, "warning"),
            (40, "error"),
            (50, "critical"),
            (0, "unknown"),
            (-10, "unknown"),
            (35, "unknown"),
            (100, "unknown"),
        ];
        for (code, label) in cases {
            assert_eq!(Level(code).label(), label, "code {}", code);
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Error);
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Info > Severity::Debug);
        for pair in Severity::ALL.windows(2) {
            assert!(Level::from(pair[0]) < Level::from(pair[1]));
        }
    }

    #[test]
    fn test_level_deserialize() {
        let parse = |s: &str| serde_json::from_str::<Level>(s).unwrap();
        assert_eq!(parse("40"), Level(40));
        assert_eq!(parse("\"error\""), Level(40));
        assert_eq!(parse("\"warning\""), Level(30));
        assert_eq!(parse("\"30\""), Level(30));
        assert_eq!(parse("\"bogus\""), Level(0));
        assert_eq!(parse("null"), Level(0));
        assert!(serde_json::from_str::<Level>("{}").is_err());
    }

    #[test]
    fn test_level_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Level(50)).unwrap(), "50");
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("Critical".parse::<Severity>(), Ok(Severity::Critical));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_item_status_round_trip() {
        for raw in ["active", "resolved", "muted", "archived", ""] {
            let status: ItemStatus = serde_json::from_str(&format!("{:?}", raw)).unwrap();
            assert_eq!(status.as_str(), raw);
            assert_eq!(serde_json::to_string(&status).unwrap(), format!("{:?}", raw));
        }
        let status: ItemStatus = serde_json::from_str("null").unwrap();
        assert_eq!(status, ItemStatus::default());
        assert_eq!(ItemStatus::from("resolved"), ItemStatus::Resolved);
    }
}
