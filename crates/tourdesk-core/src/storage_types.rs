use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Delivery transport types
///
/// Identifies which transport placed an asset on the remote host.
/// It's defined in core because delivery outcomes carry it for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Http,
    Ftp,
}

impl FromStr for TransportKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(TransportKind::Http),
            "ftp" => Ok(TransportKind::Ftp),
            _ => Err(anyhow::anyhow!("Invalid transport: {}", s)),
        }
    }
}

impl Display for TransportKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TransportKind::Http => write!(f, "http"),
            TransportKind::Ftp => write!(f, "ftp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("HTTP".parse::<TransportKind>().unwrap(), TransportKind::Http);
        assert_eq!("ftp".parse::<TransportKind>().unwrap(), TransportKind::Ftp);
        assert!("sftp".parse::<TransportKind>().is_err());
    }

    #[test]
    fn displays_lowercase() {
        assert_eq!(TransportKind::Ftp.to_string(), "ftp");
    }
}
