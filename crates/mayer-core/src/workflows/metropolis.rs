use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use crate::engine::config::{ConfigError, MoveSetConfig};
use crate::engine::error::MoveError;
use crate::engine::moves::MonteCarloMove;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use tracing::{debug, info, instrument, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The move could not act on the configuration. Nothing changed.
    Infeasible,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveStatistics {
    pub trials: u64,
    pub accepted: u64,
    pub infeasible: u64,
}

impl MoveStatistics {
    pub fn record(&mut self, outcome: StepOutcome) {
        self.trials += 1;
        match outcome {
            StepOutcome::Accepted => self.accepted += 1,
            StepOutcome::Infeasible => self.infeasible += 1,
            StepOutcome::Rejected => {}
        }
    }

    /// Accepted fraction of the feasible trials, `None` before any.
    pub fn acceptance_ratio(&self) -> Option<f64> {
        let feasible = self.trials - self.infeasible;
        (feasible > 0).then(|| self.accepted as f64 / feasible as f64)
    }
}

/// Runs one trial of `mv` and accepts it with probability `min(1, chi)`.
///
/// Irreversible moves are accepted unconditionally.
#[instrument(level = "trace", skip_all, fields(move_name = mv.name()))]
pub fn metropolis_step(
    mv: &mut dyn MonteCarloMove,
    sim: &mut SimulationBox,
    rng: &mut dyn RandomSource,
    temperature: f64,
) -> Result<StepOutcome, MoveError> {
    if !mv.do_trial(sim, rng)? {
        return Ok(StepOutcome::Infeasible);
    }
    if !mv.is_reversible() {
        mv.accept_notify(sim);
        return Ok(StepOutcome::Accepted);
    }

    let chi = mv.chi(temperature);
    trace!(chi, "acceptance ratio");
    if chi >= 1.0 || rng.next_f64() < chi {
        mv.accept_notify(sim);
        Ok(StepOutcome::Accepted)
    } else {
        mv.reject_notify(sim);
        Ok(StepOutcome::Rejected)
    }
}

/// A weighted collection of moves sharing one box.
pub struct MoveSet {
    moves: Vec<Box<dyn MonteCarloMove>>,
    statistics: Vec<MoveStatistics>,
    selector: WeightedIndex<f64>,
}

impl MoveSet {
    pub fn new(entries: Vec<(Box<dyn MonteCarloMove>, f64)>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::MissingParameter("moves"));
        }
        let (moves, weights): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        let selector =
            WeightedIndex::new(&weights).map_err(|e| ConfigError::InvalidParameter {
                name: "weight",
                reason: e.to_string(),
            })?;
        Ok(Self {
            statistics: vec![MoveStatistics::default(); moves.len()],
            moves,
            selector,
        })
    }

    /// Builds every move of a validated move-set file.
    pub fn from_config(config: &MoveSetConfig) -> Result<Self, MoveError> {
        config.validate()?;
        let entries = config
            .moves
            .iter()
            .map(|entry| Ok((entry.spec.build()?, entry.weight)))
            .collect::<Result<Vec<_>, MoveError>>()?;
        Ok(Self::new(entries)?)
    }

    pub fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError> {
        for mv in &mut self.moves {
            mv.bind(sim)?;
        }
        debug!(moves = self.moves.len(), "move set bound");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Picks one move by weight and runs a Metropolis step with it.
    pub fn step<R: Rng>(
        &mut self,
        sim: &mut SimulationBox,
        rng: &mut R,
        temperature: f64,
    ) -> Result<StepOutcome, MoveError> {
        let index = self.selector.sample(rng);
        let outcome = metropolis_step(self.moves[index].as_mut(), sim, rng, temperature)?;
        self.statistics[index].record(outcome);
        Ok(outcome)
    }

    #[instrument(skip_all, name = "move_set_run", fields(steps = steps))]
    pub fn run<R: Rng>(
        &mut self,
        sim: &mut SimulationBox,
        rng: &mut R,
        steps: u64,
        temperature: f64,
    ) -> Result<(), MoveError> {
        for _ in 0..steps {
            self.step(sim, rng, temperature)?;
        }
        for (name, stats) in self.statistics() {
            info!(
                move_name = name,
                trials = stats.trials,
                accepted = stats.accepted,
                infeasible = stats.infeasible,
                "move statistics"
            );
        }
        Ok(())
    }

    pub fn statistics(&self) -> impl Iterator<Item = (&'static str, &MoveStatistics)> + '_ {
        self.moves
            .iter()
            .map(|mv| mv.name())
            .zip(self.statistics.iter())
    }
}
