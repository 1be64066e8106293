use crate::infra::{build_services, Services};
use clap::Args;
use std::sync::Arc;
use valve_estimate::error::AppError;
use valve_estimate::estimates::{
    AccessorySpec, Actor, ActuatorSpec, BodySpec, CustomerInfo, EstimateNo,
    EstimateServiceError, EstimateSheet, FluidCondition, FluidState, NewEstimate,
    NewEstimateItem, ProcessPoint, StatusAction, StatusCommand, TagSpec, TrimSpec,
};
use valve_estimate::memory::InMemoryAttachmentStore;

const DEMO_ATTACHMENT_LIMIT: usize = 1024 * 1024;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Customer company placed on the estimate.
    #[arg(long, default_value = "Hanil Petrochem")]
    pub(crate) company: String,
    /// Unit price staff quote for every line item.
    #[arg(long, default_value_t = 1_250_000)]
    pub(crate) unit_price: u64,
    /// Print the per-tag data sheet pages as well.
    #[arg(long)]
    pub(crate) data_sheet: bool,
    /// Stop once the estimate is completed instead of placing the order.
    #[arg(long)]
    pub(crate) skip_order: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        company,
        unit_price,
        data_sheet,
        skip_order,
    } = args;

    let store = Arc::new(InMemoryAttachmentStore::default());
    let services = build_services(store, DEMO_ATTACHMENT_LIMIT, true)?;
    let customer = Actor::customer("J. Park");
    let staff = Actor::staff("M. Kim");

    println!("Valve estimate workflow demo");
    let sheet = services.estimates.create(NewEstimate {
        customer: CustomerInfo {
            company,
            contact: "J. Park".to_string(),
            email: Some("j.park@example.com".to_string()),
            phone: None,
        },
        project: "Naphtha Cracker Revamp".to_string(),
        remarks: Some("Budgetary quotation".to_string()),
    })?;
    let estimate_no = sheet.estimate_no.clone();
    println!(
        "- Draft {} opened for {} / {}",
        estimate_no, sheet.customer.company, sheet.project
    );

    for item in demo_items() {
        let added = services.estimates.add_item(&estimate_no, item)?;
        println!(
            "  Sheet {}: {} with {} tag(s), quantity {}",
            added.sheet_no,
            added.valve_type,
            added.tags.len(),
            added.quantity()
        );
    }

    let attachment = services.attachments.upload(
        &estimate_no,
        "process-datasheet.csv",
        b"tag,medium,flow\nFV-101,Cooling Water,30\n",
    )?;
    println!(
        "  Attached {} ({}, {} bytes)",
        attachment.file_name, attachment.content_type, attachment.size_bytes
    );

    step(&services, &estimate_no, StatusAction::Submit, &customer)?;
    step(&services, &estimate_no, StatusAction::StartProcessing, &staff)?;

    let sheet = services.estimates.get(&estimate_no)?;
    for item in &sheet.items {
        services
            .estimates
            .price_item(&estimate_no, &item.item_id, unit_price)?;
    }
    println!("  Priced {} line item(s) at {}", sheet.items.len(), unit_price);

    let completed = step(&services, &estimate_no, StatusAction::Complete, &staff)?;
    if let Some(total) = completed.total_amount() {
        println!("  Estimate total: {} for {} valve(s)", total, completed.total_quantity());
    }

    if !skip_order {
        step(&services, &estimate_no, StatusAction::Order, &customer)?;
    }

    if data_sheet {
        let document = services.estimates.data_sheet(&estimate_no)?;
        println!("\nData sheet ({} page(s))", document.pages.len());
        for page in &document.pages {
            println!(
                "- Page {}: sheet {} tag {} x{} ({})",
                page.page_no, page.sheet_no, page.tag_no, page.quantity, page.valve_type.value
            );
            for section in &page.sections {
                let filled: Vec<String> = section
                    .rows
                    .iter()
                    .filter(|row| row.value != "-")
                    .map(|row| format!("{}={}", row.label, row.value))
                    .collect();
                if !filled.is_empty() {
                    println!("    {}: {}", section.title, filled.join(", "));
                }
            }
        }
    }

    let quote = services.estimates.quote_list(&estimate_no)?;
    println!("\nQuote list");
    let csv = quote.to_csv().map_err(EstimateServiceError::from)?;
    print!("{csv}");

    Ok(())
}

fn step(
    services: &Services<InMemoryAttachmentStore>,
    estimate_no: &EstimateNo,
    action: StatusAction,
    actor: &Actor,
) -> Result<EstimateSheet, AppError> {
    let before = services.estimates.get(estimate_no)?.status;
    let sheet = services.estimates.apply(
        estimate_no,
        StatusCommand {
            action,
            actor: actor.clone(),
            note: None,
        },
    )?;
    println!(
        "- {} by {} ({}): {} -> {}",
        action.label(),
        actor.name,
        actor.role.label(),
        before.label(),
        sheet.status.label()
    );
    Ok(sheet)
}

fn demo_items() -> Vec<NewEstimateItem> {
    let water = FluidCondition {
        medium: "Cooling Water".to_string(),
        state: FluidState::Liquid,
        flow_rate: ProcessPoint {
            min: Some(12.0),
            normal: Some(30.0),
            max: Some(45.0),
        },
        flow_unit: Some("m3/h".to_string()),
        inlet_pressure: ProcessPoint {
            min: Some(4.0),
            normal: Some(5.5),
            max: Some(7.0),
        },
        pressure_unit: Some("bar(g)".to_string()),
        temperature: ProcessPoint {
            min: Some(20.0),
            normal: Some(32.0),
            max: Some(45.0),
        },
        temperature_unit: Some("°C".to_string()),
        ..FluidCondition::default()
    };

    let globe = |tag_no: &str| TagSpec {
        fluid: water.clone(),
        body: BodySpec {
            bonnet: Some("STD".to_string()),
            material: Some("WCB".to_string()),
            rating: Some("300".to_string()),
            connection: Some("RF".to_string()),
            size_unit: Some("INCH".to_string()),
            size: Some("2IN".to_string()),
        },
        trim: TrimSpec {
            trim_type: Some("CAGE".to_string()),
            series: Some("S100".to_string()),
            port_size: Some("P-1.5".to_string()),
            form: Some("EQ".to_string()),
            material: Some("316SS".to_string()),
            option: Some("BAL".to_string()),
        },
        actuator: ActuatorSpec {
            act_type: Some("SD".to_string()),
            series: Some("DA".to_string()),
            size: Some("DA-400".to_string()),
            hand_wheel: Some("SIDE".to_string()),
        },
        accessory: AccessorySpec {
            positioner: Some("SMART".to_string()),
            airset: Some("STD".to_string()),
            ..AccessorySpec::default()
        },
        ..TagSpec::new(tag_no)
    };

    let mut on_off = TagSpec::new("XV-201");
    on_off.quantity = 2;
    on_off.fluid = FluidCondition {
        medium: "Instrument Air".to_string(),
        state: FluidState::Gas,
        ..FluidCondition::default()
    };
    on_off.body = BodySpec {
        material: Some("CF8M".to_string()),
        rating: Some("150".to_string()),
        connection: Some("RF".to_string()),
        size_unit: Some("MM".to_string()),
        size: Some("50A".to_string()),
        ..BodySpec::default()
    };
    on_off.actuator = ActuatorSpec {
        act_type: Some("PC".to_string()),
        series: Some("RA".to_string()),
        size: Some("RA-250".to_string()),
        ..ActuatorSpec::default()
    };
    on_off.accessory = AccessorySpec {
        solenoid: Some("3W-24VDC".to_string()),
        limit_switch: Some("PROX".to_string()),
        ..AccessorySpec::default()
    };

    vec![
        NewEstimateItem {
            valve_type: "GLOBE".to_string(),
            note: Some("Cooling water return".to_string()),
            tags: vec![globe("FV-101"), globe("FV-102")],
        },
        NewEstimateItem {
            valve_type: "BALL".to_string(),
            note: None,
            tags: vec![on_off],
        },
    ]
}
