use std::sync::Arc;

use super::common::*;
use crate::documents::DocumentError;
use crate::estimates::{
    Actor, ActorRole, EstimateHeaderUpdate, EstimateItemUpdate, EstimateQuery, EstimateService,
    EstimateServiceError, EstimateStatus, ItemId, NewEstimateItem, OrderingError, ProcessPoint,
    StatusAction, ValidationError, WorkflowError, MAX_TAG_QUANTITY,
};
use crate::master::{MasterItemUpdate, MasterKind};
use crate::repository::RepositoryError;

#[test]
fn create_assigns_number_and_trims_header() {
    let service = service();
    let mut request = new_estimate();
    request.customer.company = "  Hanil Petrochem ".to_string();
    request.remarks = Some("   ".to_string());

    let sheet = service.create(request).expect("create");

    assert!(sheet.estimate_no.0.starts_with("EST-"));
    assert_eq!(sheet.status, EstimateStatus::Draft);
    assert_eq!(sheet.customer.company, "Hanil Petrochem");
    assert_eq!(sheet.remarks, None);
    assert!(sheet.items.is_empty());
}

#[test]
fn create_rejects_missing_customer_fields() {
    let service = service();
    let mut request = new_estimate();
    request.customer.contact = " ".to_string();

    match service.create(request) {
        Err(EstimateServiceError::Validation(ValidationError::EmptyContact)) => {}
        other => panic!("expected empty contact error, got {other:?}"),
    }
}

#[test]
fn items_receive_sequential_sheet_numbers() {
    let service = service();
    let sheet = service.create(new_estimate()).expect("create");

    let first = service
        .add_item(&sheet.estimate_no, new_item("globe", &["FV-101"]))
        .expect("first");
    let second = service
        .add_item(&sheet.estimate_no, new_item("BALL", &["XV-201"]))
        .expect("second");

    assert_eq!(first.sheet_no, 1);
    assert_eq!(first.valve_type, "GLOBE");
    assert_eq!(second.sheet_no, 2);
    assert_ne!(first.item_id, second.item_id);
}

#[test]
fn duplicate_tag_numbers_are_rejected_across_items() {
    let service = service();
    let sheet = service.create(new_estimate()).expect("create");
    service
        .add_item(&sheet.estimate_no, new_item("GLOBE", &["FV-101"]))
        .expect("first");

    match service.add_item(&sheet.estimate_no, new_item("BALL", &[" fv-101 "])) {
        Err(EstimateServiceError::Validation(ValidationError::DuplicateTagNo(tag))) => {
            assert_eq!(tag, "fv-101");
        }
        other => panic!("expected duplicate tag error, got {other:?}"),
    }

    match service.add_item(&sheet.estimate_no, new_item("BALL", &["XV-1", "XV-1"])) {
        Err(EstimateServiceError::Validation(ValidationError::DuplicateTagNo(_))) => {}
        other => panic!("expected duplicate within item, got {other:?}"),
    }
}

#[test]
fn tag_validation_rejects_zero_quantity_and_misordered_points() {
    let service = service();
    let sheet = service.create(new_estimate()).expect("create");
    let item = service
        .add_item(&sheet.estimate_no, new_item("GLOBE", &["FV-101"]))
        .expect("item");

    let mut zero = valid_tag("FV-102");
    zero.quantity = 0;
    match service.add_tag(&sheet.estimate_no, &item.item_id, zero) {
        Err(EstimateServiceError::Validation(ValidationError::ZeroQuantity { tag_no })) => {
            assert_eq!(tag_no, "FV-102");
        }
        other => panic!("expected zero quantity error, got {other:?}"),
    }

    let mut misordered = valid_tag("FV-103");
    misordered.fluid.temperature = ProcessPoint {
        min: Some(80.0),
        normal: Some(40.0),
        max: Some(90.0),
    };
    match service.add_tag(&sheet.estimate_no, &item.item_id, misordered) {
        Err(EstimateServiceError::Validation(ValidationError::MisorderedProcessPoint {
            tag_no,
            ..
        })) => assert_eq!(tag_no, "FV-103"),
        other => panic!("expected misordered point error, got {other:?}"),
    }
}

#[test]
fn oversized_tag_quantities_are_rejected_and_totals_saturate() {
    let service = service();
    let sheet = service.create(new_estimate()).expect("create");

    let mut huge = valid_tag("FV-101");
    huge.quantity = u32::MAX;
    let mut small = valid_tag("FV-102");
    small.quantity = 2;
    let request = NewEstimateItem {
        valve_type: "GLOBE".to_string(),
        note: None,
        tags: vec![huge, small],
    };
    match service.add_item(&sheet.estimate_no, request) {
        Err(EstimateServiceError::Validation(ValidationError::QuantityTooLarge { tag_no, max })) => {
            assert_eq!(tag_no, "FV-101");
            assert_eq!(max, MAX_TAG_QUANTITY);
        }
        other => panic!("expected quantity limit error, got {other:?}"),
    }

    let mut largest = valid_tag("FV-103");
    largest.quantity = MAX_TAG_QUANTITY;
    let item = service
        .add_item(
            &sheet.estimate_no,
            NewEstimateItem {
                valve_type: "GLOBE".to_string(),
                note: None,
                tags: vec![largest],
            },
        )
        .expect("quantity at the limit");
    assert_eq!(item.quantity(), MAX_TAG_QUANTITY);
    let summaries = service.list(&EstimateQuery::default()).expect("list");
    assert_eq!(summaries[0].total_quantity, MAX_TAG_QUANTITY);

    let mut stored = item.clone();
    stored.tags[0].quantity = u32::MAX;
    stored.tags.push(valid_tag("FV-104"));
    stored.unit_price = Some(10);
    assert_eq!(stored.quantity(), u32::MAX);
    assert_eq!(stored.amount(), Some(10 * u64::from(u32::MAX)));
}

#[test]
fn update_tag_can_rename_and_remove_tag_drops_it() {
    let service = service();
    let sheet = service.create(new_estimate()).expect("create");
    let item = service
        .add_item(&sheet.estimate_no, new_item("GLOBE", &["FV-101", "FV-102"]))
        .expect("item");

    let mut renamed = valid_tag("FV-101A");
    renamed.quantity = 5;
    let updated = service
        .update_tag(&sheet.estimate_no, &item.item_id, "fv-101", renamed)
        .expect("update tag");
    assert_eq!(updated.tags[0].tag_no, "FV-101A");
    assert_eq!(updated.quantity(), 7);

    match service.update_tag(&sheet.estimate_no, &item.item_id, "FV-101A", valid_tag("FV-102")) {
        Err(EstimateServiceError::Validation(ValidationError::DuplicateTagNo(_))) => {}
        other => panic!("expected duplicate on rename, got {other:?}"),
    }

    let trimmed = service
        .remove_tag(&sheet.estimate_no, &item.item_id, "FV-102")
        .expect("remove tag");
    assert_eq!(trimmed.tags.len(), 1);

    match service.remove_tag(&sheet.estimate_no, &item.item_id, "FV-999") {
        Err(EstimateServiceError::TagNotFound(tag)) => assert_eq!(tag, "FV-999"),
        other => panic!("expected tag not found, got {other:?}"),
    }
}

#[test]
fn reorder_move_and_remove_keep_numbering_contiguous() {
    let service = service();
    let sheet = service.create(new_estimate()).expect("create");
    let ids: Vec<ItemId> = ["GLOBE", "BALL", "ANGLE"]
        .iter()
        .enumerate()
        .map(|(index, valve_type)| {
            let tag = format!("TV-{index}");
            service
                .add_item(&sheet.estimate_no, new_item(valve_type, &[tag.as_str()]))
                .expect("item")
                .item_id
        })
        .collect();

    let reordered = service
        .reorder_items(
            &sheet.estimate_no,
            &[ids[2].clone(), ids[0].clone(), ids[1].clone()],
        )
        .expect("reorder");
    let order: Vec<(&str, u32)> = reordered
        .items
        .iter()
        .map(|item| (item.valve_type.as_str(), item.sheet_no))
        .collect();
    assert_eq!(order, vec![("ANGLE", 1), ("GLOBE", 2), ("BALL", 3)]);

    let moved = service
        .move_item(&sheet.estimate_no, &ids[1], 1)
        .expect("move");
    assert_eq!(moved.items[0].item_id, ids[1]);
    assert_eq!(moved.items[0].sheet_no, 1);

    let removed = service
        .remove_item(&sheet.estimate_no, &ids[2])
        .expect("remove");
    let numbers: Vec<u32> = removed.items.iter().map(|item| item.sheet_no).collect();
    assert_eq!(numbers, vec![1, 2]);

    match service.reorder_items(&sheet.estimate_no, &[ids[0].clone()]) {
        Err(EstimateServiceError::Ordering(OrderingError::CountMismatch { .. })) => {}
        other => panic!("expected count mismatch, got {other:?}"),
    }
}

#[test]
fn header_edits_are_limited_to_drafts() {
    let service = service();
    let sheet = processing_estimate(&service);

    let update = EstimateHeaderUpdate {
        project: Some("Other".to_string()),
        ..EstimateHeaderUpdate::default()
    };
    match service.update_header(&sheet.estimate_no, update) {
        Err(EstimateServiceError::NotEditable { status, required }) => {
            assert_eq!(status, EstimateStatus::Processing);
            assert_eq!(required, EstimateStatus::Draft);
        }
        other => panic!("expected not editable, got {other:?}"),
    }

    match service.update_item(
        &sheet.estimate_no,
        &sheet.items[0].item_id,
        EstimateItemUpdate::default(),
    ) {
        Err(EstimateServiceError::NotEditable { .. }) => {}
        other => panic!("expected not editable, got {other:?}"),
    }
}

#[test]
fn submit_requires_items_with_tags() {
    let service = service();
    let sheet = service.create(new_estimate()).expect("create");
    let submit = command(StatusAction::Submit, Actor::customer("J. Park"));

    match service.apply(&sheet.estimate_no, submit.clone()) {
        Err(EstimateServiceError::Validation(ValidationError::NoItems)) => {}
        other => panic!("expected no items error, got {other:?}"),
    }

    service
        .add_item(&sheet.estimate_no, new_item("GLOBE", &[]))
        .expect("item");
    match service.apply(&sheet.estimate_no, submit) {
        Err(EstimateServiceError::Validation(ValidationError::ItemWithoutTags { sheet_no })) => {
            assert_eq!(sheet_no, 1)
        }
        other => panic!("expected item without tags, got {other:?}"),
    }
}

#[test]
fn submit_checks_master_references_and_cascades() {
    let service = service();
    let sheet = service.create(new_estimate()).expect("create");
    let item = service
        .add_item(&sheet.estimate_no, new_item("GLOBE", &[]))
        .expect("item");
    let submit = command(StatusAction::Submit, Actor::customer("J. Park"));

    let mut unknown = valid_tag("FV-101");
    unknown.body.material = Some("UNOBTAINIUM".to_string());
    service
        .add_tag(&sheet.estimate_no, &item.item_id, unknown)
        .expect("drafts accept any code");
    match service.apply(&sheet.estimate_no, submit.clone()) {
        Err(EstimateServiceError::Validation(ValidationError::UnknownReference {
            kind, code, ..
        })) => {
            assert_eq!(kind, MasterKind::BodyMaterial);
            assert_eq!(code, "UNOBTAINIUM");
        }
        other => panic!("expected unknown reference, got {other:?}"),
    }

    let mut mismatched = valid_tag("FV-101");
    mismatched.trim.port_size = Some("P-20A".to_string());
    service
        .update_tag(&sheet.estimate_no, &item.item_id, "FV-101", mismatched)
        .expect("update");
    match service.apply(&sheet.estimate_no, submit.clone()) {
        Err(EstimateServiceError::Validation(ValidationError::CascadeMismatch {
            kind,
            parent_code,
            ..
        })) => {
            assert_eq!(kind, MasterKind::TrimPortSize);
            assert_eq!(parent_code, "2IN");
        }
        other => panic!("expected cascade mismatch, got {other:?}"),
    }

    service
        .update_tag(&sheet.estimate_no, &item.item_id, "FV-101", valid_tag("FV-101"))
        .expect("fix tag");
    service
        .master()
        .update(
            MasterKind::AccPositioner,
            "SMART",
            MasterItemUpdate {
                active: Some(false),
                ..MasterItemUpdate::default()
            },
        )
        .expect("deactivate");
    match service.apply(&sheet.estimate_no, submit) {
        Err(EstimateServiceError::Validation(ValidationError::InactiveReference { code, .. })) => {
            assert_eq!(code, "SMART")
        }
        other => panic!("expected inactive reference, got {other:?}"),
    }
}

#[test]
fn full_lifecycle_with_reverts_records_history() {
    let service = service();
    let sheet = processing_estimate(&service);
    let no = sheet.estimate_no.clone();
    assert_eq!(sheet.status, EstimateStatus::Processing);
    assert_eq!(sheet.assignee.as_deref(), Some("M. Kim"));

    let reverted = service
        .apply(&no, command(StatusAction::RevertToRequested, Actor::staff("M. Kim")))
        .expect("revert to requested");
    assert_eq!(reverted.status, EstimateStatus::Requested);
    assert_eq!(reverted.assignee, None);

    let cancelled = service
        .apply(&no, command(StatusAction::CancelRequest, Actor::customer("J. Park")))
        .expect("cancel request");
    assert_eq!(cancelled.status, EstimateStatus::Draft);

    service
        .apply(&no, command(StatusAction::Submit, Actor::customer("J. Park")))
        .expect("resubmit");
    service
        .apply(&no, command(StatusAction::StartProcessing, Actor::staff("S. Lee")))
        .expect("start again");

    match service.apply(&no, command(StatusAction::Complete, Actor::staff("S. Lee"))) {
        Err(EstimateServiceError::Validation(ValidationError::UnpricedItems { sheet_nos })) => {
            assert_eq!(sheet_nos, vec![1, 2]);
        }
        other => panic!("expected unpriced items, got {other:?}"),
    }

    price_all(&service, &no, 1_250_000);
    let completed = service
        .apply(&no, command(StatusAction::Complete, Actor::staff("S. Lee")))
        .expect("complete");
    assert_eq!(completed.total_amount(), Some(1_250_000 * 6));

    let reopened = service
        .apply(&no, command(StatusAction::RevertToProcessing, Actor::staff("S. Lee")))
        .expect("revert to processing");
    assert_eq!(reopened.status, EstimateStatus::Processing);
    service
        .apply(&no, command(StatusAction::Complete, Actor::staff("S. Lee")))
        .expect("complete again");

    let ordered = service
        .apply(&no, command(StatusAction::Order, Actor::customer("J. Park")))
        .expect("order");
    assert_eq!(ordered.status, EstimateStatus::Ordered);
    let back = service
        .apply(&no, command(StatusAction::CancelOrder, Actor::customer("J. Park")))
        .expect("cancel order");
    assert_eq!(back.status, EstimateStatus::Completed);

    let actions: Vec<StatusAction> = back.history.iter().map(|change| change.action).collect();
    assert_eq!(
        actions,
        vec![
            StatusAction::Submit,
            StatusAction::StartProcessing,
            StatusAction::RevertToRequested,
            StatusAction::CancelRequest,
            StatusAction::Submit,
            StatusAction::StartProcessing,
            StatusAction::Complete,
            StatusAction::RevertToProcessing,
            StatusAction::Complete,
            StatusAction::Order,
            StatusAction::CancelOrder,
        ]
    );
}

#[test]
fn transitions_enforce_role_and_current_status() {
    let service = service();
    let sheet = processing_estimate(&service);

    match service.apply(
        &sheet.estimate_no,
        command(StatusAction::Complete, Actor::customer("J. Park")),
    ) {
        Err(EstimateServiceError::Workflow(WorkflowError::Forbidden { role, .. })) => {
            assert_eq!(role, ActorRole::Customer)
        }
        other => panic!("expected forbidden, got {other:?}"),
    }

    match service.apply(
        &sheet.estimate_no,
        command(StatusAction::Order, Actor::customer("J. Park")),
    ) {
        Err(EstimateServiceError::Workflow(WorkflowError::InvalidTransition { status, .. })) => {
            assert_eq!(status, EstimateStatus::Processing)
        }
        other => panic!("expected invalid transition, got {other:?}"),
    }

    match service.apply(
        &sheet.estimate_no,
        command(StatusAction::RevertToRequested, Actor::staff("  ")),
    ) {
        Err(EstimateServiceError::Validation(ValidationError::EmptyActor)) => {}
        other => panic!("expected empty actor, got {other:?}"),
    }
}

#[test]
fn pricing_only_while_processing_and_never_zero() {
    let service = service();
    let draft = service.create(new_estimate()).expect("create");
    let item = service
        .add_item(&draft.estimate_no, new_item("GLOBE", &["FV-1"]))
        .expect("item");

    match service.price_item(&draft.estimate_no, &item.item_id, 1000) {
        Err(EstimateServiceError::NotEditable { required, .. }) => {
            assert_eq!(required, EstimateStatus::Processing)
        }
        other => panic!("expected not editable, got {other:?}"),
    }

    let sheet = processing_estimate(&service);
    match service.price_item(&sheet.estimate_no, &sheet.items[0].item_id, 0) {
        Err(EstimateServiceError::Validation(ValidationError::ZeroPrice)) => {}
        other => panic!("expected zero price, got {other:?}"),
    }
}

#[test]
fn quote_list_only_after_completion() {
    let service = service();
    let sheet = processing_estimate(&service);
    let no = sheet.estimate_no.clone();

    match service.quote_list(&no) {
        Err(EstimateServiceError::Document(DocumentError::QuoteUnavailable(status))) => {
            assert_eq!(status, EstimateStatus::Processing)
        }
        other => panic!("expected quote unavailable, got {other:?}"),
    }

    price_all(&service, &no, 800);
    service
        .apply(&no, command(StatusAction::Complete, Actor::staff("M. Kim")))
        .expect("complete");

    let quote = service.quote_list(&no).expect("quote list");
    assert_eq!(quote.lines.len(), 2);
    assert_eq!(quote.lines[0].valve_type_name, "Globe Control Valve");
    assert_eq!(quote.lines[0].tag_nos, vec!["FV-101", "FV-102"]);
    assert_eq!(quote.lines[0].quantity, 4);
    assert_eq!(quote.lines[0].amount, 3200);
    assert_eq!(quote.total_quantity, 6);
    assert_eq!(quote.total_amount, 4800);

    let csv = quote.to_csv().expect("csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Sheet No,Valve Type,Tag No,Quantity,Unit Price,Amount");
    assert_eq!(lines[1], "1,Globe Control Valve,FV-101 / FV-102,4,800,3200");
    assert_eq!(lines[3], ",TOTAL,,6,,4800");
}

#[test]
fn data_sheet_has_one_page_per_tag_with_resolved_names() {
    let service = service();
    let sheet = processing_estimate(&service);

    let document = service.data_sheet(&sheet.estimate_no).expect("data sheet");

    let tags: Vec<(u32, &str)> = document
        .pages
        .iter()
        .map(|page| (page.sheet_no, page.tag_no.as_str()))
        .collect();
    assert_eq!(tags, vec![(1, "FV-101"), (1, "FV-102"), (2, "XV-201")]);
    assert_eq!(document.pages[2].page_no, 3);
    assert_eq!(document.pages[0].valve_type.value, "Globe Control Valve");

    let body = document.pages[0]
        .sections
        .iter()
        .find(|section| section.title == "Body")
        .expect("body section");
    let material = body
        .rows
        .iter()
        .find(|row| row.code.as_deref() == Some("WCB"))
        .expect("material row");
    assert_eq!(material.value, "Carbon Steel A216 WCB");

    let trim = document.pages[0]
        .sections
        .iter()
        .find(|section| section.title == "Trim")
        .expect("trim section");
    assert!(trim.rows.iter().any(|row| row.code.is_none() && row.value == "-"));
}

#[test]
fn list_filters_by_status_and_search() {
    let service = service();
    let processing = processing_estimate(&service);
    let mut other = new_estimate();
    other.customer.company = "Daesan Refining".to_string();
    other.project = "Boiler Feed".to_string();
    service.create(other).expect("second estimate");

    let drafts = service
        .list(&EstimateQuery {
            status: Some(EstimateStatus::Draft),
            search: None,
        })
        .expect("list drafts");
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].company, "Daesan Refining");

    let searched = service
        .list(&EstimateQuery {
            status: None,
            search: Some("naphtha".to_string()),
        })
        .expect("search");
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].estimate_no, processing.estimate_no);
    assert_eq!(searched[0].total_quantity, 6);
}

#[test]
fn delete_only_removes_drafts() {
    let service = service();
    let sheet = processing_estimate(&service);
    match service.delete(&sheet.estimate_no) {
        Err(EstimateServiceError::NotEditable { .. }) => {}
        other => panic!("expected not editable, got {other:?}"),
    }

    let draft = service.create(new_estimate()).expect("draft");
    service.delete(&draft.estimate_no).expect("delete draft");
    match service.get(&draft.estimate_no) {
        Err(EstimateServiceError::NotFound(no)) => assert_eq!(no, draft.estimate_no),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn repository_failures_propagate() {
    let service = EstimateService::new(Arc::new(UnavailableRepository), seeded_master());

    match service.create(new_estimate()) {
        Err(EstimateServiceError::Repository(RepositoryError::Unavailable(message))) => {
            assert_eq!(message, "database offline")
        }
        other => panic!("expected repository failure, got {other:?}"),
    }
}
