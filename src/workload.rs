use crate::process::Process;
use crate::table::{ProcessId, VirtualPageNumber};
use rand::seq::index;
use rand::Rng;

/// A single memory reference issued by a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub vpn: VirtualPageNumber,
    pub write: bool,
}

impl Reference {
    pub fn read(vpn: VirtualPageNumber) -> Self {
        Self { vpn, write: false }
    }

    pub fn write(vpn: VirtualPageNumber) -> Self {
        Self { vpn, write: true }
    }
}

/// Source of the memory references the scheduler feeds into the MMU. The returned page number
/// must lie inside the process's address space.
pub trait Workload {
    fn next_reference(&mut self, process: &Process) -> Reference;

    /// Give the process a new working set. Generators without locality ignore this.
    fn refresh_working_set(&mut self, _process: &mut Process) {}
}

/// The `LocalityWorkload` struct generates references biased toward each process's working set:
/// with probability `locality` a page is drawn from the working set, otherwise from the whole
/// address space.
pub struct LocalityWorkload<R> {
    rng: R,
    working_set_size: usize,
    locality: f64,
    write_ratio: f64,
}

impl<R: Rng> LocalityWorkload<R> {
    pub fn new(rng: R, working_set_size: usize, locality: f64, write_ratio: f64) -> Self {
        Self {
            rng,
            working_set_size,
            locality,
            write_ratio,
        }
    }

    /// Create a process with a random address space size in `1..=max_pages` and a random time to
    /// live in `1..=max_ttl`, already given its first working set.
    pub fn spawn(&mut self, id: ProcessId, max_pages: usize, max_ttl: u64) -> Process {
        let pages = self.rng.gen_range(1..=max_pages);
        let ttl = self.rng.gen_range(1..=max_ttl);
        let mut process = Process::new(id, ttl, pages);
        process.working_set = self.working_set(pages);
        process
    }

    /// Every page when the space is no larger than the working set size, otherwise that many
    /// distinct pages chosen uniformly.
    fn working_set(&mut self, pages: usize) -> Vec<VirtualPageNumber> {
        match pages <= self.working_set_size {
            true => (0..pages).collect(),
            false => index::sample(&mut self.rng, pages, self.working_set_size).into_vec(),
        }
    }
}

impl<R: Rng> Workload for LocalityWorkload<R> {
    fn next_reference(&mut self, process: &Process) -> Reference {
        let local = !process.working_set.is_empty() && self.rng.gen_bool(self.locality);
        let vpn = match local {
            true => process.working_set[self.rng.gen_range(0..process.working_set.len())],
            false => self.rng.gen_range(0..process.pages()),
        };
        let write = self.rng.gen_bool(self.write_ratio);
        log::trace!(
            "process {} references page {} ({}), ttl left {}",
            process.id,
            vpn,
            if write { "write" } else { "read" },
            process.remaining_ticks
        );
        Reference { vpn, write }
    }

    fn refresh_working_set(&mut self, process: &mut Process) {
        process.working_set = self.working_set(process.pages());
        log::info!(
            "process {} updated working set: {:?}",
            process.id,
            process.working_set
        );
    }
}

/// Replays a fixed list of references per process, in order. Once a process's script runs out
/// it keeps reading its first page.
#[derive(Debug, Default, Clone)]
pub struct ScriptedWorkload {
    scripts: Vec<(ProcessId, std::collections::VecDeque<Reference>)>,
}

impl ScriptedWorkload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, id: ProcessId, references: impl IntoIterator<Item = Reference>) -> Self {
        self.scripts.push((id, references.into_iter().collect()));
        self
    }
}

impl Workload for ScriptedWorkload {
    fn next_reference(&mut self, process: &Process) -> Reference {
        self.scripts
            .iter_mut()
            .find(|(id, _)| *id == process.id)
            .and_then(|(_, queue)| queue.pop_front())
            .unwrap_or(Reference::read(0))
    }
}
