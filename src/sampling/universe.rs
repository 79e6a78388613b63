//! Orchestration of the simulations needed by a set of measurement plans.
//!
//! Every plan is reduced to basic measurement plans, duplicates collapse,
//! and the survivors are grouped by walk plan. Each distinct walk gets one
//! simulation with its own random stream; all simulations equilibrate before
//! any bin is recorded.

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};
use num_complex::Complex64;
use rand::{Rng, SeedableRng};

use super::estimate::BinnedResults;
use super::traits::{
    BasicMeasurementPlan, MeasurementPlan, RandomNumberGenerator, Simulation, SimulationFactory,
    WalkPlan,
};
use crate::error::{Result, VmcError};
use crate::io::UniverseConfig;
use crate::wavefunction::Wavefunction;

/// Deduplicated basic plans of every measurement plan, grouped by walk.
///
/// Walks and their plans keep first-seen order.
pub fn partition_by_walk<M: MeasurementPlan>(
    measurement_plans: &[M],
) -> IndexMap<<M::Basic as BasicMeasurementPlan>::Walk, Vec<M::Basic>> {
    let basic_plans: IndexSet<M::Basic> = measurement_plans
        .iter()
        .flat_map(|plan| plan.basic_measurement_plans())
        .collect();

    let mut by_walk: IndexMap<_, Vec<M::Basic>> = IndexMap::new();
    for plan in basic_plans {
        by_walk.entry(plan.walk_plan().clone()).or_default().push(plan);
    }
    by_walk
}

/// Independent random stream `index` derived from `seed`.
fn simulation_rng(seed: u64, index: usize) -> RandomNumberGenerator {
    let mut rng = RandomNumberGenerator::seed_from_u64(seed);
    rng.set_stream(index as u64);
    rng
}

/// One equilibrated simulation per distinct walk plan.
pub struct SimulationUniverse<S: Simulation> {
    simulations: Vec<S>,
}

impl<S: Simulation> SimulationUniverse<S> {
    /// Create and equilibrate the simulations for `measurement_plans`.
    ///
    /// With `seed` unset a seed is drawn from the thread RNG.
    pub fn new<M, F>(
        measurement_plans: &[M],
        equilibrium_sweeps: usize,
        factory: &F,
        seed: Option<u64>,
    ) -> Result<Self>
    where
        M: MeasurementPlan<Basic = S::Plan>,
        F: SimulationFactory<Plan = S::Plan, Simulation = S>,
    {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        let by_walk = partition_by_walk(measurement_plans);
        debug!(
            "{} measurement plans need {} simulations (seed {})",
            measurement_plans.len(),
            by_walk.len(),
            seed
        );

        let mut simulations = Vec::with_capacity(by_walk.len());
        for (index, (walk_plan, plans)) in by_walk.into_iter().enumerate() {
            debug!(
                "equilibrating simulation {} with {} basic plans for {} sweeps",
                index,
                plans.len(),
                equilibrium_sweeps
            );
            let lattice = walk_plan.wavefunction().lattice().clone();
            let rng = simulation_rng(seed, index);
            simulations.push(factory.create(&walk_plan, &lattice, plans, equilibrium_sweeps, rng)?);
        }
        Ok(Self { simulations })
    }

    pub fn simulations(&self) -> &[S] {
        &self.simulations
    }

    /// Reset every simulation, advance it `sweeps` steps, and return the
    /// fresh estimate of every basic plan.
    pub fn iterate(&mut self, sweeps: usize) -> Result<IndexMap<S::Plan, Complex64>> {
        let mut estimates = IndexMap::new();
        for simulation in &mut self.simulations {
            simulation.reset_measurement_estimates();
            simulation.iterate(sweeps)?;
            for plan in simulation.measurement_plans() {
                let value = simulation.recent_estimate(plan).ok_or_else(|| {
                    VmcError::SimulationFailed(format!(
                        "no estimate for {:?} after {} sweeps",
                        plan, sweeps
                    ))
                })?;
                estimates.insert(plan.clone(), value);
            }
        }
        Ok(estimates)
    }

    /// Log acceptance statistics of every simulation.
    pub fn log_acceptance(&self) {
        for simulation in &self.simulations {
            let walk = simulation.measurement_plans().first().map(|plan| plan.walk_plan());
            let completed = simulation.steps_completed();
            if completed == 0 {
                warn!("simulation for {:?} has not completed any steps", walk);
                continue;
            }
            info!(
                "{:?} had {:.2}% of steps accepted (with {:.2}% fully rejected)",
                walk,
                100.0 * simulation.steps_accepted() as f64 / completed as f64,
                100.0 * simulation.steps_fully_rejected() as f64 / completed as f64
            );
        }
    }
}

/// Equilibrate, then record `config.bins` bins of
/// `config.measurement_sweeps_per_bin` sweeps each.
///
/// Returns the raw per-bin values; aggregate them with
/// [`BinnedResults::summarize`] or take [`BinnedResults::most_recent`].
pub fn calculate_plans<M, F>(
    measurement_plans: &[M],
    config: &UniverseConfig,
    factory: &F,
) -> Result<BinnedResults<M::Basic>>
where
    M: MeasurementPlan,
    F: SimulationFactory<Plan = M::Basic>,
{
    let mut universe: SimulationUniverse<F::Simulation> = SimulationUniverse::new(
        measurement_plans,
        config.equilibrium_sweeps,
        factory,
        config.seed,
    )?;

    let mut results = BinnedResults::new();
    for bin in 0..config.bins {
        results.record(universe.iterate(config.measurement_sweeps_per_bin)?);
        debug!("bin {}/{} complete", bin + 1, config.bins);
    }

    info!(
        "recorded {} bins for {} basic measurement plans",
        config.bins,
        results.len()
    );
    universe.log_acceptance();
    Ok(results)
}
