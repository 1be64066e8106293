use chrono::{DateTime, Utc};
use serde::Serialize;

use super::DocumentError;
use crate::estimates::{
    EstimateItem, EstimateNo, EstimateSheet, EstimateStatus, FluidCondition, ProcessPoint,
    TagSpec,
};
use crate::master::{MasterDataRepository, MasterDataService, MasterKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSheetRow {
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSheetSection {
    pub title: &'static str,
    pub rows: Vec<DataSheetRow>,
}

/// One printed page: a single tag with its full specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSheetPage {
    pub page_no: u32,
    pub sheet_no: u32,
    pub tag_no: String,
    pub quantity: u32,
    pub valve_type: DataSheetRow,
    pub sections: Vec<DataSheetSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSheet {
    pub estimate_no: EstimateNo,
    pub company: String,
    pub project: String,
    pub status: EstimateStatus,
    pub generated_at: DateTime<Utc>,
    pub pages: Vec<DataSheetPage>,
}

impl DataSheet {
    /// Lays out one page per tag, in sheet order, resolving codes to catalog names.
    pub fn build<M>(
        sheet: &EstimateSheet,
        master: &MasterDataService<M>,
    ) -> Result<Self, DocumentError>
    where
        M: MasterDataRepository + 'static,
    {
        let mut items: Vec<&EstimateItem> = sheet.items.iter().collect();
        items.sort_by_key(|item| item.sheet_no);

        let mut pages = Vec::new();
        for item in items {
            let valve_type = resolve(master, MasterKind::ValveType, Some(&item.valve_type))?;
            for tag in &item.tags {
                pages.push(DataSheetPage {
                    page_no: pages.len() as u32 + 1,
                    sheet_no: item.sheet_no,
                    tag_no: tag.tag_no.clone(),
                    quantity: tag.quantity,
                    valve_type: valve_type.clone(),
                    sections: sections(master, tag)?,
                });
            }
        }

        Ok(Self {
            estimate_no: sheet.estimate_no.clone(),
            company: sheet.customer.company.clone(),
            project: sheet.project.clone(),
            status: sheet.status,
            generated_at: Utc::now(),
            pages,
        })
    }
}

fn sections<M>(master: &MasterDataService<M>, tag: &TagSpec) -> Result<Vec<DataSheetSection>, DocumentError>
where
    M: MasterDataRepository + 'static,
{
    let resolve_all = |fields: Vec<(MasterKind, Option<&str>)>| {
        fields
            .into_iter()
            .map(|(kind, code)| resolve(master, kind, code))
            .collect::<Result<Vec<_>, DocumentError>>()
    };

    Ok(vec![
        DataSheetSection {
            title: "Fluid Condition",
            rows: fluid_rows(&tag.fluid),
        },
        DataSheetSection {
            title: "Body",
            rows: resolve_all(tag.body.fields())?,
        },
        DataSheetSection {
            title: "Trim",
            rows: resolve_all(tag.trim.fields())?,
        },
        DataSheetSection {
            title: "Actuator",
            rows: resolve_all(tag.actuator.fields())?,
        },
        DataSheetSection {
            title: "Accessory",
            rows: resolve_all(tag.accessory.fields())?,
        },
    ])
}

fn resolve<M>(
    master: &MasterDataService<M>,
    kind: MasterKind,
    code: Option<&str>,
) -> Result<DataSheetRow, DocumentError>
where
    M: MasterDataRepository + 'static,
{
    let Some(code) = code.map(str::trim).filter(|code| !code.is_empty()) else {
        return Ok(DataSheetRow {
            label: kind.label(),
            code: None,
            value: "-".to_string(),
        });
    };

    let value = master
        .lookup(kind, code)?
        .map(|item| item.name)
        .unwrap_or_else(|| code.to_string());

    Ok(DataSheetRow {
        label: kind.label(),
        code: Some(code.to_string()),
        value,
    })
}

fn fluid_rows(fluid: &FluidCondition) -> Vec<DataSheetRow> {
    let text = |label: &'static str, value: String| DataSheetRow {
        label,
        code: None,
        value,
    };
    let point = |label: &'static str, point: &ProcessPoint, unit: &Option<String>| {
        let mut value = point.render();
        if let Some(unit) = unit.as_deref().filter(|_| !point.is_empty()) {
            value.push(' ');
            value.push_str(unit);
        }
        text(label, value)
    };
    let scalar = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());

    vec![
        text(
            "Medium",
            if fluid.medium.is_empty() {
                "-".to_string()
            } else {
                fluid.medium.clone()
            },
        ),
        text("State", fluid.state.label().to_string()),
        point("Flow Rate", &fluid.flow_rate, &fluid.flow_unit),
        point("Inlet Pressure", &fluid.inlet_pressure, &fluid.pressure_unit),
        point("Outlet Pressure", &fluid.outlet_pressure, &fluid.pressure_unit),
        point("Temperature", &fluid.temperature, &fluid.temperature_unit),
        text("Density", scalar(fluid.density)),
        text("Viscosity", scalar(fluid.viscosity)),
    ]
}
