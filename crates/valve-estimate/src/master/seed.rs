use super::domain::{MasterItem, MasterKind};

fn row(kind: MasterKind, code: &str, name: &str, sort_order: u32) -> MasterItem {
    MasterItem {
        kind,
        code: code.to_string(),
        name: name.to_string(),
        parent_code: None,
        sort_order,
        active: true,
    }
}

fn child(kind: MasterKind, parent: &str, code: &str, name: &str, sort_order: u32) -> MasterItem {
    MasterItem {
        parent_code: Some(parent.to_string()),
        ..row(kind, code, name, sort_order)
    }
}

fn rows(kind: MasterKind, entries: &[(&str, &str)]) -> Vec<MasterItem> {
    entries
        .iter()
        .zip(1u32..)
        .map(|((code, name), order)| row(kind, code, name, order))
        .collect()
}

/// Baseline catalog loaded on first start. Parents are listed before their children.
pub fn standard_catalog() -> Vec<MasterItem> {
    use MasterKind::*;

    let mut items = Vec::new();

    items.extend(rows(
        ValveType,
        &[
            ("GLOBE", "Globe Control Valve"),
            ("BALL", "Ball Valve"),
            ("BUTTERFLY", "Butterfly Valve"),
            ("ANGLE", "Angle Valve"),
            ("3WAY", "Three-way Valve"),
        ],
    ));

    items.extend(rows(
        BodyBonnet,
        &[
            ("STD", "Standard"),
            ("EXT", "Extension"),
            ("BELLOWS", "Bellows Seal"),
            ("CRYO", "Cryogenic"),
        ],
    ));
    items.extend(rows(
        BodyMaterial,
        &[
            ("WCB", "Carbon Steel A216 WCB"),
            ("CF8M", "Stainless Steel A351 CF8M"),
            ("WC6", "Alloy Steel A217 WC6"),
            ("LCC", "Low Temp. Carbon Steel A352 LCC"),
        ],
    ));
    items.extend(rows(
        BodyRating,
        &[
            ("150", "ANSI 150#"),
            ("300", "ANSI 300#"),
            ("600", "ANSI 600#"),
            ("900", "ANSI 900#"),
        ],
    ));
    items.extend(rows(
        BodyConnection,
        &[
            ("RF", "Flanged RF"),
            ("RTJ", "Flanged RTJ"),
            ("BW", "Butt Weld"),
            ("SW", "Socket Weld"),
        ],
    ));
    items.extend(rows(BodySizeUnit, &[("INCH", "Inch"), ("MM", "Millimetre")]));
    items.extend([
        child(BodySize, "INCH", "0.5IN", "1/2\"", 1),
        child(BodySize, "INCH", "1IN", "1\"", 2),
        child(BodySize, "INCH", "2IN", "2\"", 3),
        child(BodySize, "INCH", "4IN", "4\"", 4),
        child(BodySize, "MM", "15A", "15A", 5),
        child(BodySize, "MM", "25A", "25A", 6),
        child(BodySize, "MM", "50A", "50A", 7),
        child(BodySize, "MM", "100A", "100A", 8),
    ]);

    items.extend(rows(
        TrimType,
        &[
            ("CONTOURED", "Contoured Plug"),
            ("CAGE", "Cage Guided"),
            ("MULTISTAGE", "Multi-stage Anti-cavitation"),
        ],
    ));
    items.extend(rows(TrimSeries, &[("S100", "Series 100"), ("S200", "Series 200")]));
    items.extend([
        child(TrimPortSize, "1IN", "P-0.75", "3/4\" port", 1),
        child(TrimPortSize, "1IN", "P-1", "1\" port", 2),
        child(TrimPortSize, "2IN", "P-1.5", "1-1/2\" port", 3),
        child(TrimPortSize, "2IN", "P-2", "2\" port", 4),
        child(TrimPortSize, "25A", "P-20A", "20A port", 5),
        child(TrimPortSize, "50A", "P-40A", "40A port", 6),
    ]);
    items.extend(rows(
        TrimForm,
        &[
            ("EQ", "Equal Percentage"),
            ("LIN", "Linear"),
            ("QO", "Quick Opening"),
        ],
    ));
    items.extend(rows(
        TrimMaterial,
        &[
            ("316SS", "316 Stainless Steel"),
            ("416SS", "416 Stainless Steel"),
            ("STELLITE", "316SS + Stellite Overlay"),
        ],
    ));
    items.extend(rows(
        TrimOption,
        &[
            ("NONE", "None"),
            ("SOFT", "Soft Seat"),
            ("BAL", "Balanced Plug"),
        ],
    ));

    items.extend(rows(
        ActType,
        &[
            ("SD", "Spring Diaphragm"),
            ("PC", "Piston Cylinder"),
            ("ELEC", "Electric"),
        ],
    ));
    items.extend(rows(ActSeries, &[("DA", "DA Series"), ("RA", "RA Series")]));
    items.extend([
        child(ActSize, "DA", "DA-250", "250 cm²", 1),
        child(ActSize, "DA", "DA-400", "400 cm²", 2),
        child(ActSize, "RA", "RA-250", "250 cm²", 3),
        child(ActSize, "RA", "RA-600", "600 cm²", 4),
    ]);
    items.extend(rows(
        ActHandWheel,
        &[
            ("NONE", "None"),
            ("SIDE", "Side Mounted"),
            ("TOP", "Top Mounted"),
        ],
    ));

    items.extend(rows(
        AccPositioner,
        &[
            ("EP", "Electro-pneumatic 4-20mA"),
            ("SMART", "Smart HART"),
            ("PP", "Pneumatic"),
        ],
    ));
    items.extend(rows(
        AccSolenoid,
        &[("3W-24VDC", "3-way 24VDC"), ("3W-220VAC", "3-way 220VAC")],
    ));
    items.extend(rows(
        AccLimitSwitch,
        &[("MECH", "Mechanical"), ("PROX", "Proximity")],
    ));
    items.extend(rows(AccAirset, &[("STD", "Filter Regulator")]));
    items.extend(rows(AccVolumeBooster, &[("VB", "Volume Booster")]));
    items.extend(rows(AccAirOperated, &[("AOV", "Air Operated Valve")]));
    items.extend(rows(AccLockup, &[("LU", "Lock-up Valve")]));
    items.extend(rows(AccSnapActingRelay, &[("SAR", "Snap Acting Relay")]));

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique_per_kind() {
        let mut seen = HashSet::new();
        for item in standard_catalog() {
            assert!(
                seen.insert((item.kind, item.code.clone())),
                "duplicate {} {}",
                item.kind,
                item.code
            );
        }
    }

    #[test]
    fn parents_precede_children() {
        let mut seen = HashSet::new();
        for item in standard_catalog() {
            if let (Some(parent_kind), Some(parent_code)) = (item.kind.parent(), &item.parent_code)
            {
                assert!(
                    seen.contains(&(parent_kind, parent_code.clone())),
                    "{} {} listed before its parent {}",
                    item.kind,
                    item.code,
                    parent_code
                );
            }
            seen.insert((item.kind, item.code.clone()));
        }
    }

    #[test]
    fn every_table_has_rows() {
        let catalog = standard_catalog();
        for kind in MasterKind::ALL {
            assert!(
                catalog.iter().any(|item| item.kind == kind),
                "{kind} has no seed rows"
            );
        }
    }
}
