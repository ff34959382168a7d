//! Binding a simulation from an in-memory engine.

use mf_core::{MfError, ModelId, RawBuffer, SolutionId};
use mf_data::{Capability, FieldValue};
use mf_model::{PackageData, Simulation, SimulationView};
use mf_testkit::{ListFixture, SimulationFixture};

fn two_model_fixture() -> SimulationFixture {
    SimulationFixture::new()
        .tdis(&[(1.0, 1), (10.0, 2)])
        .solution(1, 5, Some(3))
        .solution(2, 5, None)
        .model("GWF_1", 1, 1, &[1, 2, 3])
        .model("GWF_2", 2, 2, &[1, 1, 4])
        .array("GWF_1", "NPF", "npf", "K11", RawBuffer::doubles(vec![1.0; 6]))
        .array("GWF_1", "DIS", "dis", "TOP", RawBuffer::doubles(vec![0.0; 6]))
        .list(
            "GWF_1",
            "WEL_0",
            "wel",
            ListFixture::new(2).record(3, &[-1.0]),
        )
        .list(
            "GWF_1",
            "WEL_1",
            "wel",
            ListFixture::new(1).record(1, &[-4.0]),
        )
        .advanced_package("GWF_2", "MAW_0", "maw")
        .var("GWF_2/MAW_0/RATE", RawBuffer::doubles(vec![0.0]))
        .exchange("GWF-GWF_1", &[(1, 1)])
}

#[test]
fn load_partitions_the_namespace() {
    let (session, _engine) = two_model_fixture().session();
    let sim = Simulation::load(&session).unwrap();

    assert_eq!(sim.model_names(), vec!["gwf_1", "gwf_2"]);
    let ids: Vec<u32> = sim.solutions().map(|s| s.id().get()).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(sim.exchange_names(), vec!["gwf-gwf_1"]);
    assert!(!sim.ats_active());
    assert!(sim.addresses().contains("TDIS/NPER"));
}

#[test]
fn packages_get_capabilities_from_their_kind() {
    let (session, _engine) = two_model_fixture().session();
    let sim = Simulation::load(&session).unwrap();
    let gwf = sim.model("GWF_1").unwrap();

    assert_eq!(gwf.package_names(), vec!["dis", "npf", "wel_0", "wel_1"]);
    assert_eq!(gwf.package_kinds(), vec!["dis", "npf", "wel"]);
    assert_eq!(gwf.packages_of_kind("wel").len(), 2);
    assert_eq!(gwf.package("npf").unwrap().capability(), Capability::Array);
    assert_eq!(gwf.package("WEL_0").unwrap().capability(), Capability::List);

    let maw = sim.model("gwf_2").unwrap().package("maw_0").unwrap();
    assert!(matches!(maw.data(), PackageData::Advanced));
    assert_eq!(maw.advanced_var_names(), &["rate"]);
    assert!(matches!(
        maw.records(),
        Err(MfError::CapabilityMismatch { expected: "list", .. })
    ));

    assert!(matches!(
        gwf.package("chd_0"),
        Err(MfError::KeyNotAccessible { .. })
    ));
}

#[test]
fn model_grid_and_solution_array() {
    let (session, engine) = two_model_fixture().session();
    engine
        .borrow_mut()
        .insert("GWF_1/X", RawBuffer::doubles(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
    let sim = Simulation::load(&session).unwrap();
    let gwf = sim.model("gwf_1").unwrap();

    assert_eq!(gwf.shape().unwrap().dims(), &[1, 2, 3]);
    assert_eq!(gwf.size().unwrap(), 6);
    assert!(gwf.node_map().unwrap().is_identity());
    assert_eq!(gwf.solution_id(), SolutionId::new(1).unwrap());

    let heads = gwf.solution().unwrap();
    assert_eq!(heads.shape(), &[1, 2, 3]);
    assert_eq!(heads[[0, 1, 0]], 4.0);

    let wel = gwf.package("wel_0").unwrap().records().unwrap();
    assert_eq!(wel.get(0, "nodelist").unwrap(), &FieldValue::Cell(vec![0, 0, 2]));
}

#[test]
fn model_ids_below_one_are_clamped() {
    let (session, _engine) = SimulationFixture::new()
        .tdis(&[(1.0, 1)])
        .solution(1, 10, Some(1))
        .model("GWF", 0, 1, &[1, 1, 1])
        .session();
    let sim = Simulation::load(&session).unwrap();
    let model = sim.model_by_id(ModelId::new(1).unwrap()).unwrap();
    assert_eq!(model.name(), "gwf");
}

#[test]
fn solution_groups_fold_in_linear_solver_settings() {
    let (session, _engine) = two_model_fixture().session();
    let sim = Simulation::load(&session).unwrap();
    let sln = sim.solution(SolutionId::new(2).unwrap()).unwrap();

    assert_eq!(sln.name(), "sln_2");
    assert_eq!(sln.max_iterations().unwrap(), 5);
    assert_eq!(sln.scalars().get_f64("ims_dvclose").unwrap(), 1e-8);
    assert_eq!(sln.scalars().get_f64("rclose").unwrap(), 1e-3);
}

#[test]
fn time_state_follows_the_engine_clock() {
    let (session, _engine) = two_model_fixture().session();
    let sim = Simulation::load(&session).unwrap();

    assert_eq!(sim.kper().unwrap(), 0);
    assert_eq!(sim.nper().unwrap(), 2);
    assert_eq!(sim.nstp().unwrap(), 1);

    session.prepare_time_step(1.0).unwrap();
    session.finalize_time_step().unwrap();
    session.prepare_time_step(5.0).unwrap();

    assert_eq!(sim.kper().unwrap(), 1);
    assert_eq!(sim.kstp().unwrap(), 0);
    assert_eq!(sim.nstp().unwrap(), 2);
    assert_eq!(sim.delt().unwrap(), 5.0);
    assert_eq!(sim.totim().unwrap(), 1.0);
    assert_eq!(sim.subcomponent_count().unwrap(), 2);
}

#[test]
fn exchanges_expose_connection_records() {
    let (session, _engine) = two_model_fixture().session();
    let sim = Simulation::load(&session).unwrap();
    let exg = sim.exchange("GWF-GWF_1").unwrap();

    assert_eq!(exg.connections().kind(), "gwf-gwf");
    let records = exg.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records.get(0, "nodem2").unwrap(), &FieldValue::Int(1));
    assert!(matches!(
        exg.connections().set_rhs(&[0.0]),
        Err(MfError::UnsupportedMutation { .. })
    ));
}

#[test]
fn exchange_sub_packages_sit_beside_the_connection_list() {
    let (session, _engine) = two_model_fixture()
        .advanced_package("GWF-GWF_1", "MVR", "mvr")
        .session();
    let sim = Simulation::load(&session).unwrap();
    let exg = sim.exchange("gwf-gwf_1").unwrap();

    assert_eq!(exg.connections().name(), "gwf-gwf_1");
    assert_eq!(exg.packages().len(), 1);
    assert_eq!(exg.packages()[0].kind(), "mvr");
    assert_eq!(exg.package_names(), vec!["gwf-gwf_1", "mvr"]);
    assert_eq!(exg.package("GWF-GWF_1").unwrap().capability(), Capability::List);
    assert!(matches!(
        exg.package("mvr").unwrap().data(),
        PackageData::Advanced
    ));
}

#[test]
fn ats_period_reports_minimum_step() {
    let (session, _engine) = two_model_fixture()
        .ats(&[(2, 2.0, 0.5, 5.0)])
        .session();
    let sim = Simulation::load(&session).unwrap();

    assert!(sim.ats_active());
    assert_eq!(sim.ats_period().unwrap(), None);

    session.prepare_time_step(1.0).unwrap();
    session.finalize_time_step().unwrap();
    session.prepare_time_step(5.0).unwrap();
    assert_eq!(sim.ats_period().unwrap(), Some(0.5));
}

#[test]
fn group_view_limits_models_and_convergence() {
    let (session, _engine) = two_model_fixture().session();
    let sim = Simulation::load(&session).unwrap();
    let group = SimulationView::for_group(&sim, SolutionId::new(2).unwrap()).with_iteration(3);

    assert_eq!(group.iteration(), Some(3));
    assert_eq!(group.models().len(), 1);
    assert!(group.model("gwf_2").is_ok());
    assert!(matches!(
        group.model("gwf_1"),
        Err(MfError::KeyNotAccessible { .. })
    ));

    group.set_allow_convergence(false);
    assert!(!group.allow_convergence());
    assert!(!sim.allow_convergence());
    assert!(sim.view().model("gwf_1").unwrap().allow_convergence());

    sim.set_allow_convergence(true);
    assert!(group.allow_convergence());
}

#[test]
fn array_package_advanced_values_reach_the_grid() {
    let (session, _engine) = SimulationFixture::new()
        .tdis(&[(1.0, 1)])
        .solution(1, 10, Some(1))
        .model("GWF", 1, 1, &[1, 1, 3])
        .active_cells("GWF", &[true, true, false])
        .array("GWF", "NPF", "npf", "K11", RawBuffer::doubles(vec![1.0, 1.0]))
        .var("GWF/NPF/CONDSAT", RawBuffer::doubles(vec![2.0, 3.0]))
        .session();
    let sim = Simulation::load(&session).unwrap();
    let npf = sim.model("gwf").unwrap().package("npf").unwrap();

    let condsat = npf.get_advanced_array("condsat").unwrap();
    assert_eq!(condsat[[0, 0, 1]], 3.0);
    assert!(condsat[[0, 0, 2]].is_nan());

    assert!(matches!(
        sim.tdis().get_advanced_array("delt"),
        Err(MfError::CapabilityMismatch { .. })
    ));
}
