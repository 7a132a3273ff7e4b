//! Provisioning profile enumerations: operating system, tier, networking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use anivps_core::AppError;

/// Operating system installed on the provisioned desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vps_os_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Windows,
    Ubuntu,
    Debian,
    Archlinux,
    Centos,
}

impl OsType {
    /// Return the OS as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Ubuntu => "ubuntu",
            Self::Debian => "debian",
            Self::Archlinux => "archlinux",
            Self::Centos => "centos",
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OsType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" => Ok(Self::Windows),
            "ubuntu" => Ok(Self::Ubuntu),
            "debian" => Ok(Self::Debian),
            "archlinux" => Ok(Self::Archlinux),
            "centos" => Ok(Self::Centos),
            _ => Err(AppError::validation(format!(
                "Invalid OS type: '{s}'. \
                 Expected one of: windows, ubuntu, debian, archlinux, centos"
            ))),
        }
    }
}

/// Fixed hardware bundle of a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierSpec {
    /// Virtual CPUs.
    pub vcpus: u8,
    /// Memory in GB.
    pub ram_gb: u16,
    /// Disk in GB.
    pub disk_gb: u16,
}

/// Named hardware tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vps_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VpsTier {
    Basic,
    Standard,
    Premium,
}

impl VpsTier {
    /// Hardware bundle implied by this tier.
    pub fn spec(&self) -> TierSpec {
        match self {
            Self::Basic => TierSpec {
                vcpus: 2,
                ram_gb: 4,
                disk_gb: 50,
            },
            Self::Standard => TierSpec {
                vcpus: 4,
                ram_gb: 8,
                disk_gb: 100,
            },
            Self::Premium => TierSpec {
                vcpus: 8,
                ram_gb: 16,
                disk_gb: 200,
            },
        }
    }

    /// Return the tier as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Standard => "standard",
            Self::Premium => "premium",
        }
    }
}

impl fmt::Display for VpsTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VpsTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            _ => Err(AppError::validation(format!(
                "Invalid VPS tier: '{s}'. Expected one of: basic, standard, premium"
            ))),
        }
    }
}

/// Tunnel that exposes the desktop's remote-desktop port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vps_networking", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NetworkingType {
    Tailscale,
    Ngrok,
}

impl NetworkingType {
    /// Return the networking type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tailscale => "tailscale",
            Self::Ngrok => "ngrok",
        }
    }
}

impl fmt::Display for NetworkingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NetworkingType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tailscale" => Ok(Self::Tailscale),
            "ngrok" => Ok(Self::Ngrok),
            _ => Err(AppError::validation(format!(
                "Invalid networking type: '{s}'. Expected one of: tailscale, ngrok"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_specs() {
        assert_eq!(VpsTier::Basic.spec().vcpus, 2);
        assert_eq!(VpsTier::Standard.spec().ram_gb, 8);
        assert_eq!(VpsTier::Premium.spec().disk_gb, 200);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Windows".parse::<OsType>().unwrap(), OsType::Windows);
        assert_eq!("NGROK".parse::<NetworkingType>().unwrap(), NetworkingType::Ngrok);
        assert!("freebsd".parse::<OsType>().is_err());
        assert!("ultra".parse::<VpsTier>().is_err());
    }
}
