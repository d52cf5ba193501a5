use crate::types::{Architecture, DistributionId, ImageType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Normalized wizard state assembled from an accepted blueprint.
///
/// Every field is resolved: lists are possibly empty, strings possibly empty,
/// toggles default to off. Subscription data never appears here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WizardState {
    pub name: String,
    pub description: String,
    pub distribution: DistributionId,
    pub architecture: Architecture,
    pub image_targets: Vec<ImageTarget>,
    pub customizations: Customizations,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageTarget {
    pub architecture: Architecture,
    pub image_type: ImageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadTarget {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customizations {
    pub packages: Vec<String>,
    pub groups: Vec<String>,
    pub users: Vec<UserAccount>,
    pub services: Services,
    pub firewall: Firewall,
    pub kernel: Kernel,
    pub locale: Locale,
    pub timezone: Timezone,
    pub hostname: String,
    pub fips: bool,
    pub filesystem: Vec<FilesystemPartition>,
    pub files: Vec<FileEntry>,
    pub installer: Installer,
    pub openscap: Option<OpenScapProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    pub name: String,
    pub password: Option<String>,
    pub ssh_key: Option<String>,
    pub groups: Vec<String>,
}

impl UserAccount {
    /// Members of `wheel` are shown as administrators.
    pub fn is_administrator(&self) -> bool {
        self.groups.iter().any(|g| g == "wheel")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Services {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
    pub masked: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Firewall {
    pub ports: Vec<String>,
    pub services: FirewallServices,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirewallServices {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Kernel {
    pub name: String,
    pub append: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Locale {
    pub languages: Vec<String>,
    pub keyboard: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Timezone {
    pub timezone: String,
    pub ntpservers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Installer {
    pub unattended: bool,
    pub sudo_nopasswd: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpenScapProfile {
    pub profile_id: String,
    pub profile_name: Option<String>,
    pub profile_description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub data: Option<String>,
    pub mode: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub ensure_parents: bool,
}

/// Size units the wizard can display for a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeUnit {
    KiB,
    MiB,
    GiB,
}

impl SizeUnit {
    pub fn bytes(self) -> u64 {
        match self {
            Self::KiB => 1 << 10,
            Self::MiB => 1 << 20,
            Self::GiB => 1 << 30,
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KiB => f.write_str("KiB"),
            Self::MiB => f.write_str("MiB"),
            Self::GiB => f.write_str("GiB"),
        }
    }
}

impl FromStr for SizeUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KiB" => Ok(Self::KiB),
            "MiB" => Ok(Self::MiB),
            "GiB" => Ok(Self::GiB),
            _ => Err(()),
        }
    }
}

/// A filesystem partition with its minimum size expressed in one wizard unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilesystemPartition {
    pub mountpoint: String,
    pub min_size: u64,
    pub unit: SizeUnit,
}

impl FilesystemPartition {
    /// Express `bytes` in the largest unit that divides it, rounding up to
    /// a whole KiB first.
    pub fn from_bytes(mountpoint: impl Into<String>, bytes: u64) -> Self {
        let kib = bytes.div_ceil(SizeUnit::KiB.bytes());
        let (min_size, unit) = if kib % (1 << 20) == 0 {
            (kib >> 20, SizeUnit::GiB)
        } else if kib % (1 << 10) == 0 {
            (kib >> 10, SizeUnit::MiB)
        } else {
            (kib, SizeUnit::KiB)
        };
        Self {
            mountpoint: mountpoint.into(),
            min_size,
            unit,
        }
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.min_size.saturating_mul(self.unit.bytes())
    }

    /// `"<n> <unit>"`, the form written back on export.
    pub fn size_label(&self) -> String {
        format!("{} {}", self.min_size, self.unit)
    }
}
