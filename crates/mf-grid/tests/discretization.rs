use mf_core::{GridKind, RawBuffer};
use mf_grid::Discretization;
use mf_testkit::SimulationFixture;

#[test]
fn rectilinear_grid_with_inactive_cells() {
    let (session, _engine) = SimulationFixture::new()
        .model("GWF", 1, 1, &[1, 2, 2])
        .active_cells("GWF", &[true, false, true, true])
        .session();
    let dis = Discretization::new(session, "GWF", GridKind::Rectilinear);

    assert_eq!(dis.shape().unwrap().dims(), &[1, 2, 2]);
    assert_eq!(dis.size().unwrap(), 4);
    assert_eq!(dis.active_nodes().unwrap(), 3);

    let map = dis.node_map().unwrap();
    assert!(!map.is_identity());
    assert!(!map.is_active(1));
    assert_eq!(map.to_reduced(2).unwrap(), 1);
    assert_eq!(map.to_dense(2).unwrap(), 3);
}

#[test]
fn unstructured_layers_and_cells() {
    let (session, _engine) = SimulationFixture::new()
        .unstructured_model("GWF", 1, 1, &[2, 5])
        .session();
    let dis = Discretization::new(session, "GWF", GridKind::Unstructured);
    assert_eq!(dis.shape().unwrap().dims(), &[2, 5]);
    assert!(dis.node_map().unwrap().is_identity());
}

#[test]
fn node_count_is_the_fallback_shape() {
    let (session, _engine) = SimulationFixture::new()
        .unstructured_model("GWF", 1, 1, &[7])
        .session();
    let dis = Discretization::new(session, "GWF", GridKind::Unstructured);
    assert_eq!(dis.shape().unwrap().dims(), &[7]);
}

#[test]
fn shape_is_read_once() {
    let (session, engine) = SimulationFixture::new()
        .model("GWF", 1, 1, &[1, 3, 3])
        .session();
    let dis = Discretization::new(session, "GWF", GridKind::Rectilinear);
    assert_eq!(dis.size().unwrap(), 9);

    engine
        .borrow_mut()
        .insert("GWF/DIS/NROW", RawBuffer::scalar_int(10));
    assert_eq!(dis.shape().unwrap().dims(), &[1, 3, 3]);
}
