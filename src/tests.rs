use std::cell::RefCell;

use approx::assert_relative_eq;
use num_complex::Complex64;
use rand::Rng;

use crate::boundary::BoundaryConditions;
use crate::error::{Result, VmcError};
use crate::io::UniverseConfig;
use crate::lattice::{Lattice, LatticeSite};
use crate::operator::{BasicOperator, DensityDensityOperator, MeasurementContext, Operator, SiteHop};
use crate::sampling::{
    calculate_plans, BasicMeasurementPlan, BasicOperatorMeasurementPlan, MeasurementPlan,
    OperatorMeasurementPlan, RandomNumberGenerator, RunningEstimate, Simulation, SimulationFactory,
    SimulationUniverse, WalkPlan,
};
use crate::wavefunction::Wavefunction;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChainWavefunction {
    lattice: Lattice,
    n_species: usize,
    label: u32,
}

impl Wavefunction for ChainWavefunction {
    fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    fn n_species(&self) -> usize {
        self.n_species
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ChainWalk {
    wavefunction: ChainWavefunction,
}

impl WalkPlan for ChainWalk {
    type Wavefunction = ChainWavefunction;

    fn wavefunction(&self) -> &ChainWavefunction {
        &self.wavefunction
    }
}

type Plan = BasicOperatorMeasurementPlan<ChainWalk>;

/// Every operator measures `0.25` per hop on every step.
fn measure(plan: &Plan) -> Complex64 {
    Complex64::new(0.25 * plan.operator().hops().len() as f64, 0.0)
}

struct ChainSimulation {
    plans: Vec<Plan>,
    estimates: Vec<RunningEstimate>,
    rng: RandomNumberGenerator,
    steps: u64,
    accepted: u64,
    fail_at_step: Option<u64>,
}

impl Simulation for ChainSimulation {
    type Plan = Plan;

    fn iterate(&mut self, sweeps: usize) -> Result<()> {
        for _ in 0..sweeps {
            if Some(self.steps) == self.fail_at_step {
                let message = format!("walk stuck at step {}", self.steps);
                return Err(VmcError::SimulationFailed(message));
            }
            self.steps += 1;
            if self.rng.gen_bool(0.5) {
                self.accepted += 1;
            }
            for (plan, estimate) in self.plans.iter().zip(&mut self.estimates) {
                estimate.add_value(measure(plan));
            }
        }
        Ok(())
    }

    fn reset_measurement_estimates(&mut self) {
        self.estimates.iter_mut().for_each(RunningEstimate::reset);
    }

    fn measurement_plans(&self) -> &[Plan] {
        &self.plans
    }

    fn recent_estimate(&self, plan: &Plan) -> Option<Complex64> {
        let index = self.plans.iter().position(|p| p == plan)?;
        self.estimates[index].recent_result()
    }

    fn steps_completed(&self) -> u64 {
        self.steps
    }

    fn steps_accepted(&self) -> u64 {
        self.accepted
    }

    fn steps_fully_rejected(&self) -> u64 {
        0
    }
}

#[derive(Default)]
struct ChainFactory {
    fail_at_step: Option<u64>,
    created: RefCell<Vec<(u32, usize)>>,
}

impl SimulationFactory for ChainFactory {
    type Plan = Plan;
    type Simulation = ChainSimulation;

    fn create(
        &self,
        walk_plan: &ChainWalk,
        lattice: &Lattice,
        plans: Vec<Plan>,
        equilibrium_sweeps: usize,
        rng: RandomNumberGenerator,
    ) -> Result<ChainSimulation> {
        assert_eq!(lattice, walk_plan.wavefunction().lattice());
        assert!(plans.iter().all(|plan| plan.walk_plan() == walk_plan));
        self.created
            .borrow_mut()
            .push((walk_plan.wavefunction.label, plans.len()));

        let mut simulation = ChainSimulation {
            estimates: vec![RunningEstimate::new(); plans.len()],
            plans,
            rng,
            steps: 0,
            accepted: 0,
            fail_at_step: self.fail_at_step,
        };
        simulation.iterate(equilibrium_sweeps)?;
        simulation.reset_measurement_estimates();
        Ok(simulation)
    }
}

fn walk(label: u32) -> ChainWalk {
    ChainWalk {
        wavefunction: ChainWavefunction {
            lattice: Lattice::new(vec![4]).unwrap(),
            n_species: 2,
            label,
        },
    }
}

fn site(x: i64) -> LatticeSite {
    LatticeSite::new(vec![x])
}

fn periodic() -> Option<BoundaryConditions> {
    Some(BoundaryConditions::periodic(1))
}

fn hop_operator(hops: &[(i64, i64, usize)]) -> BasicOperator {
    let hops: Vec<SiteHop> = hops
        .iter()
        .map(|&(source, destination, species)| {
            SiteHop::new(site(source), site(destination), species).unwrap()
        })
        .collect();
    BasicOperator::new(hops, periodic()).unwrap()
}

fn density_density() -> DensityDensityOperator {
    DensityDensityOperator::new(&site(0), &site(1), 2, periodic()).unwrap()
}

#[test]
fn test_reversed_hops_measure_the_same_operator() {
    let forward = hop_operator(&[(0, 1, 0), (2, 3, 1)]);
    let reversed = hop_operator(&[(2, 3, 1), (0, 1, 0)]);
    assert_eq!(forward, reversed);

    let context: MeasurementContext = [(forward, Complex64::new(0.5, 0.0))].into_iter().collect();
    let operator: Operator = reversed.into();
    assert_eq!(operator.evaluate(&context).unwrap().scalar().unwrap(), Complex64::new(0.5, 0.0));
}

#[test]
fn test_one_simulation_per_walk() {
    // the standalone density pair duplicates one of the density-density terms
    let shared = BasicOperator::new(
        vec![SiteHop::density(&site(0), 0), SiteHop::density(&site(1), 0)],
        periodic(),
    )
    .unwrap();
    let plans = vec![
        OperatorMeasurementPlan::new(walk(0), density_density()).unwrap(),
        OperatorMeasurementPlan::new(walk(0), shared).unwrap(),
        OperatorMeasurementPlan::new(walk(1), hop_operator(&[(0, 1, 0)])).unwrap(),
    ];

    let factory = ChainFactory::default();
    let universe: SimulationUniverse<ChainSimulation> =
        SimulationUniverse::new(&plans, 10, &factory, Some(3)).unwrap();

    assert_eq!(universe.simulations().len(), 2);
    assert_eq!(*factory.created.borrow(), vec![(0, 4), (1, 1)]);
    for simulation in universe.simulations() {
        assert_eq!(simulation.steps_completed(), 10);
        let walk = simulation.measurement_plans()[0].walk_plan();
        assert!(simulation.measurement_plans().iter().all(|plan| plan.walk_plan() == walk));
        // equilibration leaves nothing measured
        assert!(simulation.measurement_estimates().is_empty());
    }
}

#[test]
fn test_calculate_plans_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();

    let density = density_density();
    let hop = hop_operator(&[(3, 0, 1)]);
    let plans = vec![
        OperatorMeasurementPlan::new(walk(0), density.clone()).unwrap(),
        OperatorMeasurementPlan::new(walk(0), hop.clone()).unwrap(),
    ];
    let config = UniverseConfig::default()
        .with_equilibrium_sweeps(5)
        .with_bins(3)
        .with_measurement_sweeps_per_bin(10)
        .with_seed(11);

    let results = calculate_plans(&plans, &config, &ChainFactory::default()).unwrap();
    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|(_, bins)| bins.len() == 3));

    let summary = results.summarize();
    let context =
        MeasurementContext::from_plan_values(summary.iter().map(|(plan, s)| (plan, s.mean)));
    assert_eq!(context.len(), 5);

    let density: Operator = density.into();
    let value = density.evaluate(&context).unwrap().scalar().unwrap();
    assert_relative_eq!(value.re, 2.0, epsilon = 1e-12);

    let most_recent = results.most_recent();
    let latest =
        MeasurementContext::from_plan_values(most_recent.iter().map(|(plan, &v)| (plan, v)));
    let hop: Operator = hop.into();
    assert_eq!(hop.evaluate(&latest).unwrap().scalar().unwrap(), Complex64::new(0.25, 0.0));
    assert!(summary.values().all(|s| s.error == 0.0));
}

#[test]
fn test_seeded_universes_are_reproducible() {
    let plans = vec![
        OperatorMeasurementPlan::new(walk(0), hop_operator(&[(0, 1, 0)])).unwrap(),
        OperatorMeasurementPlan::new(walk(1), hop_operator(&[(0, 1, 0)])).unwrap(),
    ];
    let accepted = |seed| {
        let factory = ChainFactory::default();
        let mut universe: SimulationUniverse<ChainSimulation> =
            SimulationUniverse::new(&plans, 0, &factory, Some(seed)).unwrap();
        universe.iterate(200).unwrap();
        universe
            .simulations()
            .iter()
            .map(Simulation::steps_accepted)
            .collect::<Vec<_>>()
    };
    assert_eq!(accepted(5), accepted(5));
}

#[test]
fn test_simulation_failure_propagates() {
    let plans = vec![OperatorMeasurementPlan::new(walk(0), density_density()).unwrap()];
    let config = UniverseConfig::default()
        .with_equilibrium_sweeps(5)
        .with_bins(2)
        .with_measurement_sweeps_per_bin(10)
        .with_seed(1);
    let factory = ChainFactory {
        fail_at_step: Some(7),
        ..ChainFactory::default()
    };
    let result = calculate_plans(&plans, &config, &factory);
    assert!(matches!(result, Err(VmcError::SimulationFailed(_))));

    let failing_equilibration = ChainFactory {
        fail_at_step: Some(2),
        ..ChainFactory::default()
    };
    assert!(calculate_plans(&plans, &config, &failing_equilibration).is_err());
}

#[test]
fn test_plans_reject_operators_off_the_wavefunction() {
    assert!(matches!(
        OperatorMeasurementPlan::new(walk(0), hop_operator(&[(0, 4, 0)])),
        Err(VmcError::InvalidOperator(_))
    ));
    assert!(OperatorMeasurementPlan::new(walk(0), hop_operator(&[(0, 1, 2)])).is_err());
    assert!(BasicOperatorMeasurementPlan::new(walk(0), hop_operator(&[(-1, 0, 0)])).is_err());

    let plan = BasicOperatorMeasurementPlan::new(walk(0), hop_operator(&[(0, 1, 1)])).unwrap();
    assert_eq!(plan.basic_measurement_plans().len(), 1);
}
