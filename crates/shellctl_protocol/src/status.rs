//! Status labels reported by the management shell and replication tables.
//!
//! Different shell commands and server tables disagree slightly on the exact
//! label sets; these enums keep the labels common to all of them. Unknown
//! labels parse to `None` rather than failing.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_label_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s.trim().to_uppercase().as_str() {
                    $($label => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

define_label_enum!(
    /// Cluster-set level health.
    ClusterSetStatus {
        Healthy => "HEALTHY",
        Available => "AVAILABLE",
        Unavailable => "UNAVAILABLE",
    }
);

define_label_enum!(
    /// Cluster level health.
    ClusterStatus {
        Ok => "OK",
        OkPartial => "OK_PARTIAL",
        OkNoTolerance => "OK_NO_TOLERANCE",
        OkNoTolerancePartial => "OK_NO_TOLERANCE_PARTIAL",
        NoQuorum => "NO_QUORUM",
        Offline => "OFFLINE",
        Error => "ERROR",
        Unreachable => "UNREACHABLE",
        Unknown => "UNKNOWN",
    }
);

define_label_enum!(
    /// Group replication member state.
    InstanceStatus {
        Online => "ONLINE",
        Recovering => "RECOVERING",
        Offline => "OFFLINE",
        Error => "ERROR",
        Unreachable => "UNREACHABLE",
        Unknown => "UNKNOWN",
    }
);

define_label_enum!(
    InstanceRole {
        Primary => "PRIMARY",
        Secondary => "SECONDARY",
    }
);
