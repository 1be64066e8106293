use serde::{Deserialize, Serialize};

use crate::master::MasterKind;

/// Phase of the process medium.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FluidState {
    #[default]
    Liquid,
    Gas,
    Steam,
}

impl FluidState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Liquid => "Liquid",
            Self::Gas => "Gas",
            Self::Steam => "Steam",
        }
    }
}

/// Minimum / normal / maximum operating values of one process variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessPoint {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub normal: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl ProcessPoint {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.normal.is_none() && self.max.is_none()
    }

    pub(crate) fn is_ordered(&self) -> bool {
        let values: Vec<f64> = [self.min, self.normal, self.max]
            .into_iter()
            .flatten()
            .collect();
        values.windows(2).all(|pair| pair[0] <= pair[1])
    }

    pub fn render(&self) -> String {
        let part = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
        format!(
            "{} / {} / {}",
            part(self.min),
            part(self.normal),
            part(self.max)
        )
    }
}

/// Service conditions recorded against a tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FluidCondition {
    #[serde(default)]
    pub medium: String,
    #[serde(default)]
    pub state: FluidState,
    #[serde(default)]
    pub flow_rate: ProcessPoint,
    #[serde(default)]
    pub flow_unit: Option<String>,
    #[serde(default)]
    pub inlet_pressure: ProcessPoint,
    #[serde(default)]
    pub outlet_pressure: ProcessPoint,
    #[serde(default)]
    pub pressure_unit: Option<String>,
    #[serde(default)]
    pub temperature: ProcessPoint,
    #[serde(default)]
    pub temperature_unit: Option<String>,
    #[serde(default)]
    pub density: Option<f64>,
    #[serde(default)]
    pub viscosity: Option<f64>,
}

impl FluidCondition {
    /// Process variables whose min/normal/max are out of order.
    pub(crate) fn misordered_points(&self) -> Vec<&'static str> {
        [
            ("flow_rate", &self.flow_rate),
            ("inlet_pressure", &self.inlet_pressure),
            ("outlet_pressure", &self.outlet_pressure),
            ("temperature", &self.temperature),
        ]
        .into_iter()
        .filter(|(_, point)| !point.is_ordered())
        .map(|(name, _)| name)
        .collect()
    }
}

/// A master-data code chosen for one form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecReference<'a> {
    pub kind: MasterKind,
    pub code: &'a str,
}

fn reference(kind: MasterKind, code: &Option<String>) -> Option<SpecReference<'_>> {
    code.as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| SpecReference { kind, code })
}

fn collect<'a>(pairs: &[(MasterKind, &'a Option<String>)]) -> Vec<SpecReference<'a>> {
    pairs
        .iter()
        .filter_map(|&(kind, code)| reference(kind, code))
        .collect()
}

/// Every field of a specification section, in data-sheet order, with its chosen code.
fn fields<'a>(pairs: &[(MasterKind, &'a Option<String>)]) -> Vec<(MasterKind, Option<&'a str>)> {
    pairs
        .iter()
        .map(|(kind, code)| (*kind, code.as_deref()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodySpec {
    #[serde(default)]
    pub bonnet: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(default)]
    pub size_unit: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl BodySpec {
    fn pairs(&self) -> [(MasterKind, &Option<String>); 6] {
        [
            (MasterKind::BodyBonnet, &self.bonnet),
            (MasterKind::BodyMaterial, &self.material),
            (MasterKind::BodyRating, &self.rating),
            (MasterKind::BodyConnection, &self.connection),
            (MasterKind::BodySizeUnit, &self.size_unit),
            (MasterKind::BodySize, &self.size),
        ]
    }

    pub fn references(&self) -> Vec<SpecReference<'_>> {
        collect(&self.pairs())
    }

    pub fn fields(&self) -> Vec<(MasterKind, Option<&str>)> {
        fields(&self.pairs())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimSpec {
    #[serde(default)]
    pub trim_type: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub port_size: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub option: Option<String>,
}

impl TrimSpec {
    fn pairs(&self) -> [(MasterKind, &Option<String>); 6] {
        [
            (MasterKind::TrimType, &self.trim_type),
            (MasterKind::TrimSeries, &self.series),
            (MasterKind::TrimPortSize, &self.port_size),
            (MasterKind::TrimForm, &self.form),
            (MasterKind::TrimMaterial, &self.material),
            (MasterKind::TrimOption, &self.option),
        ]
    }

    pub fn references(&self) -> Vec<SpecReference<'_>> {
        collect(&self.pairs())
    }

    pub fn fields(&self) -> Vec<(MasterKind, Option<&str>)> {
        fields(&self.pairs())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorSpec {
    #[serde(default)]
    pub act_type: Option<String>,
    #[serde(default)]
    pub series: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub hand_wheel: Option<String>,
}

impl ActuatorSpec {
    fn pairs(&self) -> [(MasterKind, &Option<String>); 4] {
        [
            (MasterKind::ActType, &self.act_type),
            (MasterKind::ActSeries, &self.series),
            (MasterKind::ActSize, &self.size),
            (MasterKind::ActHandWheel, &self.hand_wheel),
        ]
    }

    pub fn references(&self) -> Vec<SpecReference<'_>> {
        collect(&self.pairs())
    }

    pub fn fields(&self) -> Vec<(MasterKind, Option<&str>)> {
        fields(&self.pairs())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorySpec {
    #[serde(default)]
    pub positioner: Option<String>,
    #[serde(default)]
    pub solenoid: Option<String>,
    #[serde(default)]
    pub limit_switch: Option<String>,
    #[serde(default)]
    pub airset: Option<String>,
    #[serde(default)]
    pub volume_booster: Option<String>,
    #[serde(default)]
    pub air_operated: Option<String>,
    #[serde(default)]
    pub lockup: Option<String>,
    #[serde(default)]
    pub snap_acting_relay: Option<String>,
}

impl AccessorySpec {
    fn pairs(&self) -> [(MasterKind, &Option<String>); 8] {
        [
            (MasterKind::AccPositioner, &self.positioner),
            (MasterKind::AccSolenoid, &self.solenoid),
            (MasterKind::AccLimitSwitch, &self.limit_switch),
            (MasterKind::AccAirset, &self.airset),
            (MasterKind::AccVolumeBooster, &self.volume_booster),
            (MasterKind::AccAirOperated, &self.air_operated),
            (MasterKind::AccLockup, &self.lockup),
            (MasterKind::AccSnapActingRelay, &self.snap_acting_relay),
        ]
    }

    pub fn references(&self) -> Vec<SpecReference<'_>> {
        collect(&self.pairs())
    }

    pub fn fields(&self) -> Vec<(MasterKind, Option<&str>)> {
        fields(&self.pairs())
    }
}

/// One tagged valve within a line item, carrying its full specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSpec {
    pub tag_no: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub fluid: FluidCondition,
    #[serde(default)]
    pub body: BodySpec,
    #[serde(default)]
    pub trim: TrimSpec,
    #[serde(default)]
    pub actuator: ActuatorSpec,
    #[serde(default)]
    pub accessory: AccessorySpec,
}

fn default_quantity() -> u32 {
    1
}

impl TagSpec {
    pub fn new(tag_no: impl Into<String>) -> Self {
        Self {
            tag_no: tag_no.into(),
            quantity: 1,
            fluid: FluidCondition::default(),
            body: BodySpec::default(),
            trim: TrimSpec::default(),
            actuator: ActuatorSpec::default(),
            accessory: AccessorySpec::default(),
        }
    }

    /// Trims the tag number and canonicalizes every chosen code to trimmed upper case,
    /// dropping blanks.
    pub(crate) fn normalize(&mut self) {
        fn code(field: &mut Option<String>) {
            *field = field
                .take()
                .map(|raw| raw.trim().to_ascii_uppercase())
                .filter(|raw| !raw.is_empty());
        }

        self.tag_no = self.tag_no.trim().to_string();
        self.fluid.medium = self.fluid.medium.trim().to_string();

        let body = &mut self.body;
        for field in [
            &mut body.bonnet,
            &mut body.material,
            &mut body.rating,
            &mut body.connection,
            &mut body.size_unit,
            &mut body.size,
        ] {
            code(field);
        }
        let trim = &mut self.trim;
        for field in [
            &mut trim.trim_type,
            &mut trim.series,
            &mut trim.port_size,
            &mut trim.form,
            &mut trim.material,
            &mut trim.option,
        ] {
            code(field);
        }
        let actuator = &mut self.actuator;
        for field in [
            &mut actuator.act_type,
            &mut actuator.series,
            &mut actuator.size,
            &mut actuator.hand_wheel,
        ] {
            code(field);
        }
        let accessory = &mut self.accessory;
        for field in [
            &mut accessory.positioner,
            &mut accessory.solenoid,
            &mut accessory.limit_switch,
            &mut accessory.airset,
            &mut accessory.volume_booster,
            &mut accessory.air_operated,
            &mut accessory.lockup,
            &mut accessory.snap_acting_relay,
        ] {
            code(field);
        }
    }

    /// All master-data codes referenced by the tag.
    pub fn references(&self) -> Vec<SpecReference<'_>> {
        let mut refs = self.body.references();
        refs.extend(self.trim.references());
        refs.extend(self.actuator.references());
        refs.extend(self.accessory.references());
        refs
    }

    /// Child/parent code pairs that must agree with the master-data cascade.
    pub fn cascades(&self) -> Vec<(SpecReference<'_>, SpecReference<'_>)> {
        let pairs = [
            (
                reference(MasterKind::BodySize, &self.body.size),
                reference(MasterKind::BodySizeUnit, &self.body.size_unit),
            ),
            (
                reference(MasterKind::TrimPortSize, &self.trim.port_size),
                reference(MasterKind::BodySize, &self.body.size),
            ),
            (
                reference(MasterKind::ActSize, &self.actuator.size),
                reference(MasterKind::ActSeries, &self.actuator.series),
            ),
        ];
        pairs
            .into_iter()
            .filter_map(|(child, parent)| Some((child?, parent?)))
            .collect()
    }
}
