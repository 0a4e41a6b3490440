//! Genetic algorithm over program schedules.
//!
//! # Algorithm Overview
//!
//! 1. **Initialize** - The caller's schedule becomes the first individual; the
//!    rest of the population are random shuffles of it
//! 2. **Rank** - Individuals are sorted by fitness, best first (stable sort)
//! 3. **Elitism** - The top `elitism_size` individuals are copied unchanged
//! 4. **Selection** - Two parents are drawn uniformly, with replacement, from
//!    the ranked population
//! 5. **Crossover** - With probability `crossover_rate` the parents are cut at
//!    one interior point and their tails swapped; otherwise they are cloned
//! 6. **Mutation** - Each child independently has one position replaced with
//!    probability `mutation_rate`
//! 7. **Replace** - Steps 4–6 repeat until the population is full, then the new
//!    population replaces the old one
//!
//! Steps 2–7 run exactly `generations` times. The final population is ranked
//! once more before the best individual is returned.
//!
//! # Key Components
//!
//! - [`GeneticParams`] - Run parameters (validated before any evolution)
//! - [`Individual`] - A schedule and its fitness
//! - [`Population`] - Ordered collection of individuals
//! - [`PopulationEvolver`] - Builds the next generation from a ranked population
//! - [`GeneticEngine`] - Runs the whole generational loop
//!
//! # Edge Cases
//!
//! - Schedules shorter than three programs have no interior cut point;
//!   crossover is skipped and parents are cloned instead.
//! - Children are added in pairs, so the new population can overshoot by one.
//!   It is truncated to exactly `population_size`.

use rand::{Rng, seq::SliceRandom as _};
use serde::{Deserialize, Serialize};

use crate::{
    ProgramId, Schedule, fitness,
    operators::{self, MIN_CROSSOVER_LEN},
    ratings::{DataError, RatingsTable},
    stats::FitnessStats,
};

/// Largest accepted [`GeneticParams::generations`].
pub const MAX_GENERATIONS: usize = 1000;
/// Largest accepted [`GeneticParams::population_size`].
pub const MAX_POPULATION_SIZE: usize = 500;

/// Parameters of a genetic algorithm run.
///
/// Missing fields take their [`Default`] values when deserialized, so a JSON
/// file only needs to name the parameters it changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneticParams {
    /// Number of generations to evolve (1 to [`MAX_GENERATIONS`])
    pub generations: usize,
    /// Number of individuals per generation (2 to [`MAX_POPULATION_SIZE`])
    pub population_size: usize,
    /// Probability of crossing over a selected pair of parents
    pub crossover_rate: f64,
    /// Probability of mutating each child
    pub mutation_rate: f64,
    /// Number of top individuals copied unchanged into the next generation
    pub elitism_size: usize,
}

impl Default for GeneticParams {
    fn default() -> Self {
        Self {
            generations: 100,
            population_size: 50,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            elitism_size: 2,
        }
    }
}

/// Invalid genetic algorithm parameters.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("generations must be at least 1")]
    ZeroGenerations,
    #[display("generations must be at most 1000, got {generations}")]
    TooManyGenerations { generations: usize },
    #[display("at least one time slot is required")]
    NoSlots,
    #[display("population size must be at least 2, got {population_size}")]
    PopulationTooSmall { population_size: usize },
    #[display("population size must be at most 500, got {population_size}")]
    PopulationTooLarge { population_size: usize },
    #[display("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[display("elitism size {elitism_size} exceeds population size {population_size}")]
    ElitismTooLarge {
        elitism_size: usize,
        population_size: usize,
    },
}

impl GeneticParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        if self.generations > MAX_GENERATIONS {
            return Err(ConfigError::TooManyGenerations {
                generations: self.generations,
            });
        }
        if self.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall {
                population_size: self.population_size,
            });
        }
        if self.population_size > MAX_POPULATION_SIZE {
            return Err(ConfigError::PopulationTooLarge {
                population_size: self.population_size,
            });
        }
        for (name, value) in [
            ("crossover rate", self.crossover_rate),
            ("mutation rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        if self.elitism_size > self.population_size {
            return Err(ConfigError::ElitismTooLarge {
                elitism_size: self.elitism_size,
                population_size: self.population_size,
            });
        }
        Ok(())
    }
}

/// A candidate schedule and its fitness.
///
/// Freshly bred individuals have not been evaluated yet; their fitness is
/// `f64::NEG_INFINITY` until the population is ranked.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    schedule: Schedule,
    fitness: f64,
}

impl Individual {
    fn unevaluated(schedule: Schedule) -> Self {
        Self {
            schedule,
            fitness: f64::NEG_INFINITY,
        }
    }

    #[must_use]
    pub fn schedule(&self) -> &[ProgramId] {
        &self.schedule
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }
}

/// An ordered collection of individuals.
#[derive(Debug, Clone, Default)]
pub struct Population {
    individuals: Vec<Individual>,
    ranked: bool,
}

impl Population {
    /// Creates the starting population.
    ///
    /// The first individual is `initial` itself; each of the other
    /// `size - 1` individuals is an independent shuffle of it.
    #[must_use]
    pub fn seeded<R>(initial: Schedule, size: usize, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut individuals = Vec::with_capacity(size);
        for _ in 1..size {
            let mut schedule = initial.clone();
            schedule.shuffle(rng);
            individuals.push(Individual::unevaluated(schedule));
        }
        if size > 0 {
            individuals.insert(0, Individual::unevaluated(initial));
        }
        Self {
            individuals,
            ranked: false,
        }
    }

    /// Wraps existing schedules, in order, without evaluating them.
    #[must_use]
    pub fn from_schedules<I>(schedules: I) -> Self
    where
        I: IntoIterator<Item = Schedule>,
    {
        Self {
            individuals: schedules.into_iter().map(Individual::unevaluated).collect(),
            ranked: false,
        }
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Evaluates every individual and sorts by fitness, best first.
    ///
    /// The sort is stable: individuals with equal fitness keep their relative
    /// order.
    pub fn rank(&mut self, ratings: &RatingsTable) -> Result<(), DataError> {
        for ind in &mut self.individuals {
            ind.fitness = fitness::evaluate(&ind.schedule, ratings)?;
        }
        self.individuals.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        self.ranked = true;
        Ok(())
    }

    /// Returns `true` once [`Self::rank`] has evaluated and sorted this population.
    #[must_use]
    pub fn is_ranked(&self) -> bool {
        self.ranked
    }

    /// Returns the first individual, which is the best one after [`Self::rank`].
    #[must_use]
    pub fn first(&self) -> Option<&Individual> {
        self.individuals.first()
    }

    /// Computes fitness statistics over all individuals.
    #[must_use]
    pub fn fitness_stats(&self) -> Option<FitnessStats> {
        FitnessStats::new(self.individuals.iter().map(Individual::fitness))
    }
}

/// Builds the next generation from a ranked population.
#[derive(Debug, Clone, Copy)]
pub struct PopulationEvolver {
    /// Size of the population to produce
    pub population_size: usize,
    /// Number of top individuals preserved unchanged
    pub elitism_size: usize,
    /// Probability of crossing over each selected pair
    pub crossover_rate: f64,
    /// Probability of mutating each child
    pub mutation_rate: f64,
}

impl From<&GeneticParams> for PopulationEvolver {
    fn from(params: &GeneticParams) -> Self {
        Self {
            population_size: params.population_size,
            elitism_size: params.elitism_size,
            crossover_rate: params.crossover_rate,
            mutation_rate: params.mutation_rate,
        }
    }
}

impl PopulationEvolver {
    /// Evolves a ranked population into the next generation.
    ///
    /// Elites are copied with their fitness; bred children are unevaluated.
    /// Mutation draws replacements from `all_programs`.
    ///
    /// # Panics
    ///
    /// Panics if `population` is empty or not ranked, or if a rate is outside
    /// `[0, 1]`.
    #[must_use]
    pub fn evolve<R>(
        &self,
        population: &Population,
        all_programs: &[ProgramId],
        rng: &mut R,
    ) -> Population
    where
        R: Rng + ?Sized,
    {
        assert!(population.is_ranked());
        let parents = &population.individuals;
        let elite_count = self.elitism_size.min(self.population_size);
        let mut next = Vec::with_capacity(self.population_size + 1);

        next.extend(parents.iter().take(elite_count).cloned());

        while next.len() < self.population_size {
            let p1 = &parents[rng.random_range(0..parents.len())].schedule;
            let p2 = &parents[rng.random_range(0..parents.len())].schedule;

            let (mut c1, mut c2) = if rng.random_bool(self.crossover_rate) {
                // too-short schedules fall back to cloning
                operators::crossover(p1, p2, rng).unwrap_or_else(|_| (p1.clone(), p2.clone()))
            } else {
                (p1.clone(), p2.clone())
            };
            if rng.random_bool(self.mutation_rate) {
                c1 = operators::mutate(c1, all_programs, rng);
            }
            if rng.random_bool(self.mutation_rate) {
                c2 = operators::mutate(c2, all_programs, rng);
            }

            next.push(Individual::unevaluated(c1));
            next.push(Individual::unevaluated(c2));
        }
        next.truncate(self.population_size);

        Population {
            individuals: next,
            ranked: false,
        }
    }
}

/// Fitness statistics of one ranked generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    #[serde(flatten)]
    pub fitness: FitnessStats,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    /// Best schedule of the final population
    pub best: Schedule,
    /// Fitness of [`Self::best`]
    pub best_fitness: f64,
    /// Statistics of each generation, taken right after ranking
    pub history: Vec<GenerationStats>,
    /// Final population, ranked
    pub population: Population,
}

/// Failure before or during a run.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EngineError {
    #[display("invalid scheduling configuration")]
    Config(#[error(source)] ConfigError),
    #[display("invalid ratings data")]
    Data(#[error(source)] DataError),
}

/// Runs the genetic algorithm against one ratings table.
#[derive(Debug)]
pub struct GeneticEngine<'a> {
    ratings: &'a RatingsTable,
    params: GeneticParams,
    all_programs: Vec<ProgramId>,
}

impl<'a> GeneticEngine<'a> {
    /// Creates an engine; mutation draws from every program in `ratings`.
    pub fn new(ratings: &'a RatingsTable, params: GeneticParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            ratings,
            params,
            all_programs: ratings.programs(),
        })
    }

    #[must_use]
    pub fn params(&self) -> &GeneticParams {
        &self.params
    }

    /// Evolves a population seeded with `initial` and returns the best
    /// individual of the final generation.
    ///
    /// The ratings table is checked to cover `initial.len()` slots for every
    /// program before evolution starts, so no evaluation can fail midway.
    #[tracing::instrument(level = "debug", skip_all, fields(len = initial.len()))]
    pub fn run<R>(&self, initial: Schedule, rng: &mut R) -> Result<EvolutionOutcome, EngineError>
    where
        R: Rng + ?Sized,
    {
        for &id in &initial {
            if self.ratings.name(id).is_none() {
                return Err(DataError::UnknownProgram { id }.into());
            }
        }
        self.ratings.ensure_covers(initial.len())?;

        let GeneticParams {
            generations,
            population_size,
            ..
        } = self.params;
        if !operators::can_crossover(initial.len()) {
            tracing::warn!(
                len = initial.len(),
                min = MIN_CROSSOVER_LEN,
                "schedule too short for crossover; parents will be cloned"
            );
        }
        tracing::info!(generations, population_size, "starting evolution");

        let evolver = PopulationEvolver::from(&self.params);
        let mut population = Population::seeded(initial, population_size, rng);
        let mut history = Vec::with_capacity(generations);
        for generation in 0..generations {
            population.rank(self.ratings)?;
            if let Some(fitness) = population.fitness_stats() {
                tracing::debug!(
                    generation,
                    best = fitness.max,
                    mean = fitness.mean,
                    worst = fitness.min,
                    "ranked generation"
                );
                history.push(GenerationStats {
                    generation,
                    fitness,
                });
            }
            population = evolver.evolve(&population, &self.all_programs, rng);
        }

        // bred children are unevaluated until ranked
        population.rank(self.ratings)?;
        let best = population
            .first()
            .expect("population size is validated to be at least 2")
            .clone();
        tracing::info!(best_fitness = best.fitness, "evolution finished");

        Ok(EvolutionOutcome {
            best: best.schedule,
            best_fitness: best.fitness,
            history,
            population,
        })
    }
}
