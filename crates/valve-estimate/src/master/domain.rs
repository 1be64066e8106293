use serde::{Deserialize, Serialize};

/// Top-level grouping of the master-data tables, mirroring the estimate form sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasterCategory {
    Valve,
    Body,
    Trim,
    Act,
    Acc,
}

impl MasterCategory {
    pub const fn ordered() -> [Self; 5] {
        [Self::Valve, Self::Body, Self::Trim, Self::Act, Self::Acc]
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Valve => "valve",
            Self::Body => "body",
            Self::Trim => "trim",
            Self::Act => "act",
            Self::Acc => "acc",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Valve => "Valve",
            Self::Body => "Body",
            Self::Trim => "Trim",
            Self::Act => "Actuator",
            Self::Acc => "Accessory",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, UnknownMasterKind> {
        Self::ordered()
            .into_iter()
            .find(|category| category.key().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownMasterKind {
                category: raw.to_string(),
                kind: None,
            })
    }

    /// Every table belonging to this category, in form order.
    pub fn kinds(self) -> Vec<MasterKind> {
        MasterKind::ALL
            .iter()
            .copied()
            .filter(|kind| kind.category() == self)
            .collect()
    }
}

/// One master-data table. Serialized as `category/key` so kinds sharing a key
/// (`body/material`, `trim/material`) stay distinct on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MasterKind {
    ValveType,
    BodyBonnet,
    BodyMaterial,
    BodyRating,
    BodyConnection,
    BodySizeUnit,
    BodySize,
    TrimType,
    TrimSeries,
    TrimPortSize,
    TrimForm,
    TrimMaterial,
    TrimOption,
    ActType,
    ActSeries,
    ActSize,
    ActHandWheel,
    AccPositioner,
    AccSolenoid,
    AccLimitSwitch,
    AccAirset,
    AccVolumeBooster,
    AccAirOperated,
    AccLockup,
    AccSnapActingRelay,
}

impl MasterKind {
    pub const ALL: [Self; 25] = [
        Self::ValveType,
        Self::BodyBonnet,
        Self::BodyMaterial,
        Self::BodyRating,
        Self::BodyConnection,
        Self::BodySizeUnit,
        Self::BodySize,
        Self::TrimType,
        Self::TrimSeries,
        Self::TrimPortSize,
        Self::TrimForm,
        Self::TrimMaterial,
        Self::TrimOption,
        Self::ActType,
        Self::ActSeries,
        Self::ActSize,
        Self::ActHandWheel,
        Self::AccPositioner,
        Self::AccSolenoid,
        Self::AccLimitSwitch,
        Self::AccAirset,
        Self::AccVolumeBooster,
        Self::AccAirOperated,
        Self::AccLockup,
        Self::AccSnapActingRelay,
    ];

    pub const fn category(self) -> MasterCategory {
        match self {
            Self::ValveType => MasterCategory::Valve,
            Self::BodyBonnet
            | Self::BodyMaterial
            | Self::BodyRating
            | Self::BodyConnection
            | Self::BodySizeUnit
            | Self::BodySize => MasterCategory::Body,
            Self::TrimType
            | Self::TrimSeries
            | Self::TrimPortSize
            | Self::TrimForm
            | Self::TrimMaterial
            | Self::TrimOption => MasterCategory::Trim,
            Self::ActType | Self::ActSeries | Self::ActSize | Self::ActHandWheel => {
                MasterCategory::Act
            }
            Self::AccPositioner
            | Self::AccSolenoid
            | Self::AccLimitSwitch
            | Self::AccAirset
            | Self::AccVolumeBooster
            | Self::AccAirOperated
            | Self::AccLockup
            | Self::AccSnapActingRelay => MasterCategory::Acc,
        }
    }

    /// Key of the table inside its category, as used in request paths.
    pub const fn key(self) -> &'static str {
        match self {
            Self::ValveType => "valve_type",
            Self::BodyBonnet => "bonnet",
            Self::BodyMaterial => "material",
            Self::BodyRating => "rating",
            Self::BodyConnection => "connection",
            Self::BodySizeUnit => "size_unit",
            Self::BodySize => "size",
            Self::TrimType => "trim_type",
            Self::TrimSeries => "series",
            Self::TrimPortSize => "port_size",
            Self::TrimForm => "form",
            Self::TrimMaterial => "material",
            Self::TrimOption => "option",
            Self::ActType => "act_type",
            Self::ActSeries => "series",
            Self::ActSize => "size",
            Self::ActHandWheel => "hand_wheel",
            Self::AccPositioner => "positioner",
            Self::AccSolenoid => "solenoid",
            Self::AccLimitSwitch => "limit_switch",
            Self::AccAirset => "airset",
            Self::AccVolumeBooster => "volume_booster",
            Self::AccAirOperated => "air_operated",
            Self::AccLockup => "lockup",
            Self::AccSnapActingRelay => "snap_acting_relay",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ValveType => "Valve Type",
            Self::BodyBonnet => "Bonnet",
            Self::BodyMaterial => "Body Material",
            Self::BodyRating => "Rating",
            Self::BodyConnection => "Connection",
            Self::BodySizeUnit => "Size Unit",
            Self::BodySize => "Body Size",
            Self::TrimType => "Trim Type",
            Self::TrimSeries => "Trim Series",
            Self::TrimPortSize => "Port Size",
            Self::TrimForm => "Trim Form",
            Self::TrimMaterial => "Trim Material",
            Self::TrimOption => "Trim Option",
            Self::ActType => "Actuator Type",
            Self::ActSeries => "Actuator Series",
            Self::ActSize => "Actuator Size",
            Self::ActHandWheel => "Hand Wheel",
            Self::AccPositioner => "Positioner",
            Self::AccSolenoid => "Solenoid Valve",
            Self::AccLimitSwitch => "Limit Switch",
            Self::AccAirset => "Airset",
            Self::AccVolumeBooster => "Volume Booster",
            Self::AccAirOperated => "Air Operated Valve",
            Self::AccLockup => "Lock-up Valve",
            Self::AccSnapActingRelay => "Snap Acting Relay",
        }
    }

    /// Table whose codes items of this kind must hang under, for cascading selects.
    pub const fn parent(self) -> Option<MasterKind> {
        match self {
            Self::BodySize => Some(Self::BodySizeUnit),
            Self::TrimPortSize => Some(Self::BodySize),
            Self::ActSize => Some(Self::ActSeries),
            _ => None,
        }
    }

    /// Resolves the `(category, key)` pair carried by request paths.
    pub fn parse(category: &str, key: &str) -> Result<Self, UnknownMasterKind> {
        let parsed = MasterCategory::parse(category)?;
        let key = key.trim().to_ascii_lowercase();
        let kind = match (parsed, key.as_str()) {
            (MasterCategory::Valve, "valve_type" | "type") => Self::ValveType,
            (MasterCategory::Body, "bonnet") => Self::BodyBonnet,
            (MasterCategory::Body, "material") => Self::BodyMaterial,
            (MasterCategory::Body, "rating") => Self::BodyRating,
            (MasterCategory::Body, "connection") => Self::BodyConnection,
            (MasterCategory::Body, "size_unit") => Self::BodySizeUnit,
            (MasterCategory::Body, "size") => Self::BodySize,
            (MasterCategory::Trim, "trim_type" | "type") => Self::TrimType,
            (MasterCategory::Trim, "series") => Self::TrimSeries,
            (MasterCategory::Trim, "port_size") => Self::TrimPortSize,
            (MasterCategory::Trim, "form") => Self::TrimForm,
            (MasterCategory::Trim, "material") => Self::TrimMaterial,
            (MasterCategory::Trim, "option") => Self::TrimOption,
            (MasterCategory::Act, "act_type" | "type") => Self::ActType,
            (MasterCategory::Act, "series") => Self::ActSeries,
            (MasterCategory::Act, "size") => Self::ActSize,
            (MasterCategory::Act, "hand_wheel") => Self::ActHandWheel,
            (MasterCategory::Acc, "positioner") => Self::AccPositioner,
            (MasterCategory::Acc, "solenoid") => Self::AccSolenoid,
            (MasterCategory::Acc, "limit_switch") => Self::AccLimitSwitch,
            (MasterCategory::Acc, "airset") => Self::AccAirset,
            (MasterCategory::Acc, "volume_booster") => Self::AccVolumeBooster,
            (MasterCategory::Acc, "air_operated") => Self::AccAirOperated,
            (MasterCategory::Acc, "lockup") => Self::AccLockup,
            (MasterCategory::Acc, "snap_acting_relay") => Self::AccSnapActingRelay,
            _ => {
                return Err(UnknownMasterKind {
                    category: category.to_string(),
                    kind: Some(key),
                })
            }
        };
        Ok(kind)
    }

    pub fn path(self) -> String {
        format!("{}/{}", self.category().key(), self.key())
    }
}

impl Serialize for MasterKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.path())
    }
}

impl<'de> Deserialize<'de> for MasterKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let (category, key) = raw
            .split_once('/')
            .ok_or_else(|| serde::de::Error::custom(format!("expected category/key, got '{raw}'")))?;
        MasterKind::parse(category, key).map_err(serde::de::Error::custom)
    }
}

/// Raised when a path names a category or table that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown master data table {category}/{}", .kind.as_deref().unwrap_or("*"))]
pub struct UnknownMasterKind {
    pub category: String,
    pub kind: Option<String>,
}

/// A row of a master-data table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterItem {
    pub kind: MasterKind,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_code: Option<String>,
    pub sort_order: u32,
    pub active: bool,
}

impl MasterItem {
    pub fn display(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

/// Payload for registering a new master-data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMasterItem {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub parent_code: Option<String>,
    #[serde(default)]
    pub sort_order: Option<u32>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_code: Option<String>,
    #[serde(default)]
    pub sort_order: Option<u32>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Client-side list filtering, served from the API instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MasterFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

impl MasterFilter {
    pub fn matches(&self, item: &MasterItem) -> bool {
        if !self.include_inactive && !item.active {
            return false;
        }

        if let Some(parent) = self.parent.as_deref().map(str::trim) {
            if !parent.is_empty()
                && !item
                    .parent_code
                    .as_deref()
                    .is_some_and(|code| code.eq_ignore_ascii_case(parent))
            {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                item.code.to_lowercase().contains(&needle)
                    || item.name.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// All active rows of one table, grouped for form bootstrap.
#[derive(Debug, Clone, Serialize)]
pub struct MasterTableView {
    pub kind: MasterKind,
    pub key: &'static str,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<MasterKind>,
    pub items: Vec<MasterItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MasterCatalogView {
    pub category: MasterCategory,
    pub label: &'static str,
    pub tables: Vec<MasterTableView>,
}

impl std::fmt::Display for MasterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category().key(), self.key())
    }
}
