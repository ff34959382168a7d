//! List view behavior against an in-memory engine.

use std::rc::Rc;

use mf_core::{GridKind, MfError, RawBuffer, Session};
use mf_data::schema::{GWF_GWF, WEL};
use mf_data::{Column, ColumnKind, FieldValue, ListData, ListView};
use mf_grid::Discretization;
use mf_testkit::{ListFixture, SimulationFixture};

fn cell(c: &[usize]) -> FieldValue {
    FieldValue::Cell(c.to_vec())
}

fn wel_view(session: &Session) -> ListView {
    let grid = Rc::new(Discretization::new(
        session.clone(),
        "GWF",
        GridKind::Rectilinear,
    ));
    ListView::bind(session, &WEL, "GWF", Some("WEL_0"), Some(grid)).unwrap()
}

fn two_wells(base: i32) -> SimulationFixture {
    SimulationFixture::new()
        .node_index_base(base)
        .model("GWF", 1, 1, &[1, 10, 10])
        .list(
            "GWF",
            "WEL_0",
            "wel",
            ListFixture::new(3)
                .record(5 + base, &[-1.0])
                .record(12 + base, &[-2.0]),
        )
}

fn wel_data(rows: &[(&[usize], f64)]) -> ListData {
    let mut data = ListData::new(vec![
        Column::new("nodelist", ColumnKind::Cell),
        Column::new("flux", ColumnKind::Double),
    ]);
    for (c, q) in rows {
        data.push(vec![cell(c), FieldValue::Double(*q)]).unwrap();
    }
    data
}

#[test]
fn zero_based_node_numbers_unravel_to_cells() {
    let (session, _engine) = two_wells(0).session();
    let view = wel_view(&session);

    let data = view.read().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data.columns()[0].name, "nodelist");
    assert_eq!(data.columns()[0].kind, ColumnKind::Cell);
    assert_eq!(data.get(0, "nodelist").unwrap(), &cell(&[0, 0, 5]));
    assert_eq!(data.get(1, "nodelist").unwrap(), &cell(&[0, 1, 2]));
    assert_eq!(data.get(1, "flux").unwrap().as_f64(), Some(-2.0));
}

#[test]
fn one_based_engine_reads_the_same_cells() {
    let (session, _engine) = two_wells(1).session();
    let data = wel_view(&session).read().unwrap();
    assert_eq!(data.get(0, "nodelist").unwrap(), &cell(&[0, 0, 5]));
    assert_eq!(data.get(1, "nodelist").unwrap(), &cell(&[0, 1, 2]));
}

#[test]
fn write_then_read_round_trips() {
    let (session, engine) = two_wells(1).session();
    let view = wel_view(&session);

    let data = wel_data(&[(&[0, 2, 3], 4.0), (&[0, 9, 9], 5.0), (&[0, 0, 0], 6.0)]);
    view.write(Some(&data)).unwrap();

    assert_eq!(view.nbound().unwrap(), 3);
    assert_eq!(view.read().unwrap(), data);
    let nodelist = engine.borrow().value("GWF/WEL_0/NODELIST").unwrap();
    assert_eq!(nodelist.as_ints().unwrap(), &[24, 100, 1]);
}

#[test]
fn over_capacity_write_changes_nothing() {
    let (session, engine) = two_wells(0).session();
    let view = wel_view(&session);
    let before = view.read().unwrap();

    let data = wel_data(&[
        (&[0, 0, 1], 1.0),
        (&[0, 0, 2], 1.0),
        (&[0, 0, 3], 1.0),
        (&[0, 0, 4], 1.0),
    ]);
    let err = view.write(Some(&data)).unwrap_err();
    assert!(matches!(
        err,
        MfError::CapacityExceeded {
            requested: 4,
            maxbound: 3,
            ..
        }
    ));

    assert_eq!(view.read().unwrap(), before);
    let nbound = engine.borrow().value("GWF/WEL_0/NBOUND").unwrap();
    assert_eq!(nbound.get_i32(0).unwrap(), 2);
}

#[test]
fn bad_cell_aborts_before_any_buffer_is_touched() {
    let (session, engine) = two_wells(0).session();
    let view = wel_view(&session);
    let bound_before = engine.borrow().value("GWF/WEL_0/BOUND").unwrap();

    let data = wel_data(&[(&[0, 0, 1], 9.0), (&[0, 10, 0], 9.0)]);
    assert!(matches!(
        view.write(Some(&data)),
        Err(MfError::IndexOutOfRange { .. })
    ));
    assert_eq!(
        engine.borrow().value("GWF/WEL_0/BOUND").unwrap(),
        bound_before
    );
}

#[test]
fn unknown_column_is_not_accessible() {
    let (session, _engine) = two_wells(0).session();
    let view = wel_view(&session);

    let mut data = ListData::new(vec![Column::new("cond", ColumnKind::Double)]);
    data.push(vec![FieldValue::Double(1.0)]).unwrap();
    assert!(matches!(
        view.write(Some(&data)),
        Err(MfError::KeyNotAccessible { key, .. }) if key == "cond"
    ));
}

#[test]
fn omitted_columns_keep_engine_values() {
    let (session, _engine) = two_wells(0).session();
    let view = wel_view(&session);

    let mut data = ListData::new(vec![Column::new("flux", ColumnKind::Double)]);
    data.push(vec![FieldValue::Double(7.0)]).unwrap();
    data.push(vec![FieldValue::Double(8.0)]).unwrap();
    view.write(Some(&data)).unwrap();

    let back = view.read().unwrap();
    assert_eq!(back.get(0, "nodelist").unwrap(), &cell(&[0, 0, 5]));
    assert_eq!(back.get(1, "flux").unwrap().as_f64(), Some(8.0));
}

#[test]
fn growing_without_node_column_is_rejected() {
    let (session, engine) = two_wells(0).session();
    let view = wel_view(&session);
    let before = engine.borrow().value("GWF/WEL_0/BOUND").unwrap();

    let mut data = ListData::new(vec![Column::new("flux", ColumnKind::Double)]);
    for q in [7.0, 8.0, 9.0] {
        data.push(vec![FieldValue::Double(q)]).unwrap();
    }
    assert!(matches!(
        view.write(Some(&data)),
        Err(MfError::KeyNotAccessible { ref key, .. }) if key == "nodelist"
    ));
    assert_eq!(view.nbound().unwrap(), 2);
    assert_eq!(engine.borrow().value("GWF/WEL_0/BOUND").unwrap(), before);
    assert_eq!(view.read().unwrap().len(), 2);
}

#[test]
fn clearing_keeps_capacity() {
    let (session, _engine) = two_wells(0).session();
    let view = wel_view(&session);

    view.write(None).unwrap();
    assert_eq!(view.nbound().unwrap(), 0);
    assert_eq!(view.maxbound().unwrap(), 3);
    assert!(view.read().unwrap().is_empty());

    view.write(Some(&ListData::default())).unwrap();
    assert_eq!(view.nbound().unwrap(), 0);
}

#[test]
fn partial_updates_go_through_full_write() {
    let (session, _engine) = two_wells(0).session();
    let view = wel_view(&session);

    view.set_value(1, "flux", FieldValue::Double(-5.0)).unwrap();
    view.set_column("flux", vec![3.0.into(), 4.0.into()]).unwrap();
    view.set_record(0, vec![cell(&[0, 3, 3]), 1.5.into()]).unwrap();
    view.push(vec![cell(&[0, 4, 4]), 2.5.into()]).unwrap();

    let data = view.read().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data.get(0, "nodelist").unwrap(), &cell(&[0, 3, 3]));
    assert_eq!(data.get(1, "flux").unwrap().as_f64(), Some(4.0));
    assert_eq!(data.get(2, "flux").unwrap().as_f64(), Some(2.5));

    assert!(matches!(
        view.push(vec![cell(&[0, 5, 5]), 1.0.into()]),
        Err(MfError::CapacityExceeded { .. })
    ));
    assert_eq!(view.nbound().unwrap(), 3);
}

#[test]
fn aux_columns_follow_live_names() {
    let (session, _engine) = SimulationFixture::new()
        .model("GWF", 1, 1, &[1, 1, 4])
        .list(
            "GWF",
            "WEL_0",
            "wel",
            ListFixture::new(2)
                .record(1, &[-1.0])
                .record(4, &[-2.0])
                .aux("CONC", &[10.0, 20.0]),
        )
        .session();
    let view = wel_view(&session);

    let columns = view.columns().unwrap();
    assert_eq!(columns.last().unwrap().name, "conc");

    let data = view.read().unwrap();
    assert_eq!(data.get(1, "conc").unwrap().as_f64(), Some(20.0));
    assert_eq!(data.get(1, "nodelist").unwrap(), &cell(&[0, 0, 3]));

    view.set_column("conc", vec![1.0.into(), 2.0.into()]).unwrap();
    assert_eq!(view.read().unwrap().get(0, "conc").unwrap().as_f64(), Some(1.0));
}

#[test]
fn inactive_cells_are_skipped_by_node_numbers() {
    let (session, _engine) = SimulationFixture::new()
        .model("GWF", 1, 1, &[1, 2, 2])
        .active_cells("GWF", &[true, false, true, true])
        .list(
            "GWF",
            "WEL_0",
            "wel",
            ListFixture::new(2).record(2, &[-1.0]),
        )
        .session();
    let view = wel_view(&session);

    let data = view.read().unwrap();
    assert_eq!(data.get(0, "nodelist").unwrap(), &cell(&[0, 1, 0]));

    let inactive = wel_data(&[(&[0, 0, 1], 1.0)]);
    assert!(matches!(
        view.write(Some(&inactive)),
        Err(MfError::IndexOutOfRange { .. })
    ));
}

#[test]
fn exchange_lists_share_one_count() {
    let (session, _engine) = SimulationFixture::new()
        .exchange("GWF-GWF_1", &[(1, 2), (3, 4)])
        .session();
    let view = ListView::bind(&session, &GWF_GWF, "GWF-GWF_1", None, None).unwrap();

    assert_eq!(view.nbound().unwrap(), 2);
    assert_eq!(view.maxbound().unwrap(), 2);
    let data = view.read().unwrap();
    assert_eq!(data.get(1, "nodem1").unwrap(), &FieldValue::Int(3));
    assert_eq!(data.get(0, "ihc").unwrap(), &FieldValue::Int(1));
    assert_eq!(data.get(0, "cl1").unwrap().as_f64(), Some(0.5));
}

#[test]
fn shared_count_keeps_capacity_after_clearing() {
    let (session, _engine) = SimulationFixture::new()
        .exchange("GWF-GWF_1", &[(1, 2), (3, 4)])
        .session();
    let view = ListView::bind(&session, &GWF_GWF, "GWF-GWF_1", None, None).unwrap();
    let original = view.read().unwrap();

    view.write(None).unwrap();
    assert_eq!(view.nbound().unwrap(), 0);
    assert_eq!(view.maxbound().unwrap(), 2);

    view.write(Some(&original)).unwrap();
    assert_eq!(view.nbound().unwrap(), 2);
    assert_eq!(view.read().unwrap(), original);
}

#[test]
fn detached_count_still_binds() {
    let (session, _engine) = two_wells(0)
        .detached_var("GWF/WEL_0/NBOUND", RawBuffer::scalar_int(1))
        .session();
    let view = wel_view(&session);
    assert_eq!(view.read().unwrap().len(), 1);
    view.write(None).unwrap();
    assert_eq!(view.nbound().unwrap(), 0);
}
