//! Task origins and their display platforms

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Identity namespace of a task.
///
/// Together with the upstream id this forms the durable task key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    Canvas,
    GoogleClassroom,
    Ustep,
    Manual,
}

impl_domain_status_conversions!(Source {
    Canvas => "canvas",
    GoogleClassroom => "google-classroom",
    Ustep => "ustep",
    Manual => "manual",
});

impl Source {
    /// Sources backed by an upstream adapter, in default sync order.
    pub const SYNCED: [Self; 3] = [Self::Canvas, Self::GoogleClassroom, Self::Ustep];

    /// Display platform for tasks from this source.
    #[must_use]
    pub const fn platform(self) -> Platform {
        match self {
            Self::Canvas => Platform::Canvas,
            Self::GoogleClassroom => Platform::GoogleClassroom,
            Self::Ustep => Platform::Ustep,
            Self::Manual => Platform::Manual,
        }
    }

    #[must_use]
    pub const fn is_synced(self) -> bool {
        !matches!(self, Self::Manual)
    }
}

/// Display and grouping key shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Canvas,
    #[serde(rename = "Google Classroom")]
    GoogleClassroom,
    #[serde(rename = "USTeP")]
    Ustep,
    Manual,
}

impl Platform {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Canvas => "Canvas",
            Self::GoogleClassroom => "Google Classroom",
            Self::Ustep => "USTeP",
            Self::Manual => "Manual",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Canvas, Self::GoogleClassroom, Self::Ustep, Self::Manual]
            .into_iter()
            .find(|platform| platform.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid Platform: {s}"))
    }
}
