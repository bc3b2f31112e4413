// ── Per-resource filter tables ──
//
// One static table per resource kind: which caller keys are recognized,
// what upstream parameter each becomes, and how its value is checked.
// The intent API (devices, sites) takes regex patterns for substring
// matches; the assurance data API (clients) takes `*` wildcards.

use strum::{Display, EnumIter, EnumString};

/// Upstream name of the window start, in epoch milliseconds.
pub const START_TIME_PARAM: &str = "startTime";
/// Upstream name of the window end, in epoch milliseconds.
pub const END_TIME_PARAM: &str = "endTime";

/// The resource collections the executor can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ResourceKind {
    Devices,
    Sites,
    Interfaces,
    Clients,
    ClientDetail,
    ClientCount,
}

impl ResourceKind {
    pub fn schema(self) -> &'static ResourceSchema {
        match self {
            Self::Devices => &DEVICES,
            Self::Sites => &SITES,
            Self::Interfaces => &INTERFACES,
            Self::Clients => &CLIENTS,
            Self::ClientDetail => &CLIENT_DETAIL,
            Self::ClientCount => &CLIENT_COUNT,
        }
    }

    /// Kinds addressed through a parent id (device id, client MAC).
    pub fn requires_identifier(self) -> bool {
        matches!(self, Self::Interfaces | Self::ClientDetail)
    }
}

/// How a contains-filter is written for the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternSyntax {
    /// `.*value.*`, metacharacters escaped.
    Regex,
    /// `*value*`.
    Wildcard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Exact,
    Contains(PatternSyntax),
    /// Case-insensitive match, sent in the canonical spelling.
    Enum(&'static [&'static str]),
    Integer {
        min: i64,
        max: i64,
    },
    TimeStart,
    TimeEnd,
    /// Relative expression expanded to both time params.
    TimeRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key the caller uses.
    pub key: &'static str,
    /// Query parameter sent upstream.
    pub param: &'static str,
    pub ty: FieldType,
}

const fn field(key: &'static str, param: &'static str, ty: FieldType) -> FieldSpec {
    FieldSpec { key, param, ty }
}

const fn exact(key: &'static str) -> FieldSpec {
    field(key, key, FieldType::Exact)
}

/// Pagination bounds for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
    /// The controller returns everything; the executor slices locally.
    pub local: bool,
}

#[derive(Debug)]
pub struct ResourceSchema {
    pub kind: ResourceKind,
    pub fields: &'static [FieldSpec],
    pub paging: Option<PageLimits>,
}

impl ResourceSchema {
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.key.to_owned()).collect()
    }
}

// ── Enumerations ─────────────────────────────────────────────────────

pub const DEVICE_FAMILIES: &[&str] = &[
    "Switches and Hubs",
    "Routers",
    "Wireless Controller",
    "Unified AP",
    "Wireless Sensor",
];

pub const DEVICE_ROLES: &[&str] = &["ACCESS", "DISTRIBUTION", "CORE", "BORDER ROUTER", "UNKNOWN"];

pub const REACHABILITY: &[&str] = &["Reachable", "Unreachable", "Ping Reachable"];

pub const SITE_TYPES: &[&str] = &["area", "building", "floor"];

pub const OS_TYPES: &[&str] = &[
    "Android",
    "Chrome OS",
    "iOS",
    "iPadOS",
    "Linux",
    "macOS",
    "Windows",
    "Other",
];

pub const CONNECTION_TYPES: &[&str] = &["Wired", "Wireless"];

pub const BANDS: &[&str] = &["2.4", "5", "6"];

// ── Tables ───────────────────────────────────────────────────────────

const INTENT_PAGING: Option<PageLimits> = Some(PageLimits {
    default_limit: 100,
    max_limit: 500,
    local: false,
});

static DEVICES: ResourceSchema = ResourceSchema {
    kind: ResourceKind::Devices,
    fields: &[
        field("hostname", "hostname", FieldType::Contains(PatternSyntax::Regex)),
        field("managementIp", "managementIpAddress", FieldType::Exact),
        exact("macAddress"),
        exact("serialNumber"),
        exact("platformId"),
        exact("softwareVersion"),
        field("family", "family", FieldType::Enum(DEVICE_FAMILIES)),
        field("role", "role", FieldType::Enum(DEVICE_ROLES)),
        field("reachability", "reachabilityStatus", FieldType::Enum(REACHABILITY)),
        field(
            "notSyncedForMinutes",
            "notSyncedForMinutes",
            FieldType::Integer {
                min: 0,
                max: 525_600,
            },
        ),
    ],
    paging: INTENT_PAGING,
};

static SITES: ResourceSchema = ResourceSchema {
    kind: ResourceKind::Sites,
    fields: &[
        exact("name"),
        exact("siteId"),
        field("type", "type", FieldType::Enum(SITE_TYPES)),
    ],
    paging: INTENT_PAGING,
};

static INTERFACES: ResourceSchema = ResourceSchema {
    kind: ResourceKind::Interfaces,
    fields: &[],
    paging: Some(PageLimits {
        default_limit: 100,
        max_limit: 500,
        local: true,
    }),
};

const TIME_FIELDS: [FieldSpec; 3] = [
    field("startTime", START_TIME_PARAM, FieldType::TimeStart),
    field("endTime", END_TIME_PARAM, FieldType::TimeEnd),
    field("timeRange", START_TIME_PARAM, FieldType::TimeRange),
];

const CLIENT_FIELDS: [FieldSpec; 15] = [
    exact("macAddress"),
    field("ipAddress", "ipv4Address", FieldType::Exact),
    exact("ipv6Address"),
    exact("ssid"),
    field("osType", "osType", FieldType::Enum(OS_TYPES)),
    exact("osVersion"),
    field("connectionType", "type", FieldType::Enum(CONNECTION_TYPES)),
    field("band", "band", FieldType::Enum(BANDS)),
    exact("siteId"),
    field(
        "siteHierarchy",
        "siteHierarchy",
        FieldType::Contains(PatternSyntax::Wildcard),
    ),
    field(
        "connectedDevice",
        "connectedNetworkDeviceName",
        FieldType::Contains(PatternSyntax::Wildcard),
    ),
    exact("wlcName"),
    TIME_FIELDS[0],
    TIME_FIELDS[1],
    TIME_FIELDS[2],
];

static CLIENTS: ResourceSchema = ResourceSchema {
    kind: ResourceKind::Clients,
    fields: &CLIENT_FIELDS,
    paging: Some(PageLimits {
        default_limit: 25,
        max_limit: 100,
        local: false,
    }),
};

static CLIENT_DETAIL: ResourceSchema = ResourceSchema {
    kind: ResourceKind::ClientDetail,
    fields: &TIME_FIELDS,
    paging: None,
};

static CLIENT_COUNT: ResourceSchema = ResourceSchema {
    kind: ResourceKind::ClientCount,
    fields: &CLIENT_FIELDS,
    paging: None,
};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn kind_names_are_kebab_case() {
        assert_eq!(ResourceKind::ClientDetail.to_string(), "client-detail");
        assert_eq!(
            ResourceKind::from_str("Client-Count").ok(),
            Some(ResourceKind::ClientCount)
        );
        assert!(ResourceKind::from_str("vlans").is_err());
    }

    #[test]
    fn every_table_matches_its_kind_and_has_unique_keys() {
        for kind in ResourceKind::iter() {
            let schema = kind.schema();
            assert_eq!(schema.kind, kind);
            let keys: HashSet<_> = schema.fields.iter().map(|f| f.key).collect();
            assert_eq!(keys.len(), schema.fields.len(), "{kind}");
        }
    }

    #[test]
    fn paging_caps_are_never_below_defaults() {
        for kind in ResourceKind::iter() {
            if let Some(limits) = kind.schema().paging {
                assert!(limits.default_limit >= 1);
                assert!(limits.default_limit <= limits.max_limit, "{kind}");
            }
        }
    }

    #[test]
    fn client_count_takes_no_pagination() {
        assert!(ResourceKind::ClientCount.schema().paging.is_none());
        assert!(ResourceKind::ClientCount.schema().field("ssid").is_some());
    }
}
