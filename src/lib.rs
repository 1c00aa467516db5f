pub mod config;
pub mod cpu;
pub mod kernel;
pub mod logger;
pub mod mmu;
pub mod policy;
pub mod process;
pub mod table;
pub mod tracker;
pub mod validator;
pub mod workload;

use config::Config;
use cpu::Cpu;
use indicatif::{ProgressBar, ProgressStyle};
use mmu::Mmu;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracker::Tracker;
use workload::LocalityWorkload;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error("invariant violated at tick {tick}: {source}")]
    Invariant {
        tick: u64,
        source: validator::Violation,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A structure which contains the core elements required to run a simulation: the CPU with its
/// processes and memory-management engine, and the generator driving their references.
pub struct Simulation {
    config: Config,
    cpu: Cpu,
    workload: LocalityWorkload<StdRng>,
}

impl Simulation {
    /// Validate `config`, build the engine and create the initial processes.
    pub fn build(config: Config) -> Result<Self> {
        config.validate()?;
        let (policy_rng, workload_rng) = match config.seed {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (StdRng::from_entropy(), StdRng::from_entropy()),
        };

        let mut cpu = Cpu::new(Mmu::build(&config.engine(), policy_rng)?);
        let mut workload = LocalityWorkload::new(
            workload_rng,
            config.working_set_size,
            config.locality,
            config.write_ratio,
        );
        for id in 0..config.processes {
            cpu.admit(workload.spawn(id, config.max_virtual_pages, config.max_ttl));
        }

        Ok(Self {
            config,
            cpu,
            workload,
        })
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Advance the simulation by one tick. Working sets are refreshed first on their interval,
    /// then the tick goes either to system work or to the next user process.
    pub fn step(&mut self, tick: u64) -> Result<()> {
        if is_multiple(tick, self.config.working_set_interval) {
            self.cpu.refresh_working_sets(&mut self.workload);
        }

        log::trace!("tick {}", tick);
        if is_multiple(tick, self.config.system_interval) {
            self.cpu.run_system_processes();
        } else {
            self.cpu.tick(&mut self.workload);
        }

        if self.config.validate {
            validator::check(self.cpu.mmu().frames(), self.cpu.processes())
                .map_err(|source| Error::Invariant { tick, source })?;
        }
        Ok(())
    }

    /// Run ticks `0..=ticks` and return the final statistics.
    pub fn run(mut self, progress: &ProgressBar) -> Result<Tracker> {
        for tick in 0..=self.config.ticks {
            self.step(tick)?;
            progress.inc(1);
        }
        progress.finish_and_clear();
        Ok(self.cpu.mmu().tracker.clone())
    }
}

fn is_multiple(tick: u64, interval: u64) -> bool {
    interval != 0 && tick % interval == 0
}

fn progress_bar(config: &Config) -> ProgressBar {
    if config.no_progress {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(config.ticks + 1);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} ticks [{elapsed_precise}]")
    {
        bar.set_style(style);
    }
    bar
}

/// Build and run a simulation from `config`, showing progress on the terminal.
pub fn run_simulation(config: Config) -> Result<Tracker> {
    let progress = progress_bar(&config);
    let simulation = Simulation::build(config)?;

    if let Some(logger) = logger::installed() {
        logger.attach_progress(progress.clone());
    }
    let result = simulation.run(&progress);
    if let Some(logger) = logger::installed() {
        logger.detach_progress();
    }

    let tracker = result?;
    log::info!(
        "simulation complete: {} faults over {} accesses",
        tracker.faults,
        tracker.accesses
    );
    Ok(tracker)
}
