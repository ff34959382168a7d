//! The time loop.
//!
//! Per time step:
//! - `TimestepStart` once for the whole simulation
//! - for each solution group with models, by id: `StressPeriodStart` on the
//!   group's first step of a period, then `SolveStart`, the outer
//!   iterations (`IterationStart`, one engine solve, `IterationEnd`) and
//!   `SolveEnd`
//! - `TimestepEnd`, then `StressPeriodEnd` on the period's last step
//!
//! `Initialize` runs once before the loop and `Finalize` once after it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use mf_core::{AddressIndex, MfError, MfResult, Session, SolutionId, ensure_finite};
use mf_model::{Simulation, SimulationView, SolutionGroup};
use tracing::{debug, info, warn};

use crate::error::{RunError, RunResult};
use crate::options::RunOptions;
use crate::phase::Phase;
use crate::report::{NonConvergence, RunReport};

/// Log at `info` when verbose, `debug` otherwise.
macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            info!($($arg)+);
        } else {
            debug!($($arg)+);
        }
    };
}

/// Run the simulation behind `session` to completion, calling `callback`
/// at every phase boundary.
///
/// Any error stops the run: the engine is finalized unless it has already
/// failed, and callback errors come back tagged with their phase.
/// Non-convergence is not an error; it is listed in the report.
pub fn run<F>(session: &Session, mut callback: F, options: &RunOptions) -> RunResult<RunReport>
where
    F: FnMut(&SimulationView<'_>, Phase) -> MfResult<()>,
{
    if options.verbose {
        let version = session.version();
        info!(
            version = version.as_deref().unwrap_or("unknown"),
            "engine version"
        );
        info!("initializing simulation");
    }
    session.initialize()?;
    let sim = Simulation::load(session)?;

    if let Some(path) = &options.address_dump {
        write_address_dump(path, sim.addresses())?;
    }

    let mut driver = Driver {
        sim: &sim,
        callback: &mut callback,
        verbose: options.verbose,
        last_kper: HashMap::new(),
        report: RunReport::default(),
    };

    if let Err(err) = driver.run() {
        if !session.is_failed() {
            if let Err(e) = session.finalize() {
                warn!(error = %e, "finalize after run failure also failed");
            }
        }
        return Err(err);
    }

    session.finalize()?;
    info!(
        time_steps = driver.report.time_steps,
        nonconverged = driver.report.nonconverged.len(),
        "normal termination of simulation"
    );
    Ok(driver.report)
}

fn write_address_dump(path: &Path, addresses: &AddressIndex) -> RunResult<()> {
    let dump_err = |source| RunError::Dump {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(dump_err)?);
    for name in addresses.names() {
        writeln!(out, "{name}").map_err(dump_err)?;
    }
    out.flush().map_err(dump_err)?;
    debug!(path = %path.display(), count = addresses.len(), "wrote address dump");
    Ok(())
}

struct Driver<'s, F> {
    sim: &'s Simulation,
    callback: &'s mut F,
    verbose: bool,
    /// Last stress period each group has started.
    last_kper: HashMap<SolutionId, usize>,
    report: RunReport,
}

impl<'s, F> Driver<'s, F>
where
    F: FnMut(&SimulationView<'_>, Phase) -> MfResult<()>,
{
    fn notify(&mut self, view: SimulationView<'_>, phase: Phase) -> RunResult<()> {
        (self.callback)(&view, phase).map_err(|source| {
            warn!(%phase, error = %source, "callback failed");
            RunError::Callback { phase, source }
        })
    }

    fn run(&mut self) -> RunResult<()> {
        let sim = self.sim;
        let session = sim.session();
        self.notify(sim.view(), Phase::Initialize)?;

        let end_time = session.end_time()?;
        while session.current_time()? < end_time {
            let dt = ensure_finite(session.time_step()?, "time step")?;
            session.prepare_time_step(dt)?;
            let (kper, kstp) = (sim.kper()?, sim.kstp()?);
            progress!(
                self.verbose,
                "solving stress period {}, time step {}",
                kper + 1,
                kstp + 1
            );

            self.notify(sim.view(), Phase::TimestepStart)?;
            for group in sim.solutions() {
                if sim.models_in(group.id()).next().is_none() {
                    debug!(solution = %group.id(), "skipping solution group without models");
                    continue;
                }
                self.solve_group(group, kper, kstp)?;
            }
            self.notify(sim.view(), Phase::TimestepEnd)?;

            session.finalize_time_step()?;
            self.report.time_steps += 1;

            if kstp + 1 == sim.nstp()? {
                self.notify(sim.view(), Phase::StressPeriodEnd)?;
            }
        }

        self.notify(sim.view(), Phase::Finalize)
    }

    fn solve_group(&mut self, group: &SolutionGroup, kper: usize, kstp: usize) -> RunResult<()> {
        let sim = self.sim;
        let session = sim.session();
        let id = group.id();
        let view = SimulationView::for_group(sim, id);

        session.prepare_solve(id)?;
        if self.last_kper.get(&id) != Some(&kper) {
            self.last_kper.insert(id, kper);
            self.notify(view, Phase::StressPeriodStart)?;
        }
        self.notify(view, Phase::SolveStart)?;

        let (converged, iterations) = match sim.ats_period()? {
            Some(dtmin) => self.iterate(view, |_| Ok(sim.delt()? > dtmin))?,
            None => {
                let max = group.max_iterations()?;
                self.iterate(view, |kiter| Ok(kiter < max))?
            }
        };
        self.report.iterations += iterations;

        if !converged {
            warn!(solution = %id, kper, kstp, iterations, "solution group did not converge");
            self.report.nonconverged.push(NonConvergence {
                solution: id,
                kper,
                kstp,
                iterations,
            });
        }

        self.notify(view, Phase::SolveEnd)?;
        session.finalize_solve(id)?;
        Ok(())
    }

    /// Outer iterations while `keep_going(kiter)` holds; stops early once the
    /// engine converges and the group allows it. Returns the last convergence
    /// flag and the iteration count.
    fn iterate(
        &mut self,
        view: SimulationView<'_>,
        mut keep_going: impl FnMut(usize) -> MfResult<bool>,
    ) -> RunResult<(bool, usize)> {
        let session = view.simulation().session();
        let id = view.solution_id().ok_or_else(|| MfError::InvalidArg {
            what: "iteration outside a solution group".to_string(),
        })?;

        let mut converged = false;
        let mut kiter = 0;
        while keep_going(kiter)? {
            let current = view.with_iteration(kiter);
            self.notify(current, Phase::IterationStart)?;
            converged = session.solve(id)?;
            self.notify(current, Phase::IterationEnd)?;
            kiter += 1;
            if converged && current.allow_convergence() {
                break;
            }
        }
        Ok((converged, kiter))
    }
}
