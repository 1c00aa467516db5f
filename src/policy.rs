use crate::process::ProcessTable;
use crate::table::{FrameIndex, FrameTable};
use crate::tracker::{Event, Tracker};
use clap::ValueEnum;
use rand::{Rng, RngCore};
use std::fmt;
use std::str::FromStr;

/// A page replacement policy chooses which occupied frame gives way when a fault finds no free
/// frame. Implementations may inspect and age the page table entries of the frames' owners but
/// must not change the frame table itself; eviction is left to the kernel.
pub trait ReplacementPolicy {
    /// Pick a victim frame. Only called when every frame is occupied.
    fn pick(
        &mut self,
        frames: &FrameTable,
        processes: &mut ProcessTable,
        tracker: &mut Tracker,
    ) -> FrameIndex;
}

/// Selects one of the two replacement policies. Chosen once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    Random,
    #[value(name = "wsclock")]
    WsClock,
}

impl PolicyKind {
    /// Build the selected policy. `rng` is only consumed by the random policy.
    pub fn build<R: RngCore + 'static>(self, rng: R) -> Box<dyn ReplacementPolicy> {
        match self {
            PolicyKind::Random => Box::new(UniformRandom::new(rng)),
            PolicyKind::WsClock => Box::new(WorkingSetClock::new()),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Random => write!(f, "random"),
            PolicyKind::WsClock => write!(f, "wsclock"),
        }
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Evicts a frame chosen uniformly at random from the whole table.
pub struct UniformRandom<R> {
    rng: R,
}

impl<R: RngCore> UniformRandom<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: RngCore> ReplacementPolicy for UniformRandom<R> {
    fn pick(
        &mut self,
        frames: &FrameTable,
        _processes: &mut ProcessTable,
        _tracker: &mut Tracker,
    ) -> FrameIndex {
        let victim = self.rng.gen_range(0..frames.len());
        log::trace!("random: selected victim frame {}", victim);
        victim
    }
}

/// Working-set clock. A hand sweeps the frame table in a circle, clearing the referenced bit of
/// recently used pages and writing back dirty ones, and stops at the first frame whose page is
/// both unreferenced and clean. The hand survives between calls.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkingSetClock {
    hand: FrameIndex,
}

impl WorkingSetClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hand(&self) -> FrameIndex {
        self.hand
    }

    fn advance(&mut self, frame_count: usize) {
        self.hand = (self.hand + 1) % frame_count;
    }
}

impl ReplacementPolicy for WorkingSetClock {
    /// # Panics
    ///
    /// Panics if the hand lands on a free frame.
    fn pick(
        &mut self,
        frames: &FrameTable,
        processes: &mut ProcessTable,
        tracker: &mut Tracker,
    ) -> FrameIndex {
        let frame_count = frames.len();

        loop {
            let index = self.hand;
            let (pid, vpn) = frames[index]
                .mapping()
                .unwrap_or_else(|| panic!("wsclock reached free frame {}", index));
            let entry = processes.entry_mut(pid, vpn);
            tracker.clock_inspections += 1;
            log::trace!(
                "wsclock: check frame {} (R={}, M={})",
                index,
                entry.referenced,
                entry.modified
            );
            self.advance(frame_count);

            if entry.referenced {
                entry.referenced = false;
                continue;
            }

            if entry.modified {
                entry.modified = false;
                tracker.record(Event::WriteBack {
                    frame: index,
                    pid,
                    vpn,
                });
                continue;
            }

            log::trace!("wsclock: selected victim frame {}", index);
            return index;
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::process::Process;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// One process owning `frame_count` pages, page `i` resident in frame `i`.
    fn make_full_memory(frame_count: usize) -> (FrameTable, ProcessTable) {
        let mut frames = FrameTable::build(frame_count);
        let mut processes = ProcessTable::new();
        let mut process = Process::new(0, 100, frame_count);
        (0..frame_count).for_each(|i| {
            frames[i].assign(0, i);
            process.address_space[i].map(i);
        });
        processes.insert(process);
        (frames, processes)
    }

    fn set_bits(processes: &mut ProcessTable, vpn: usize, referenced: bool, modified: bool) {
        let entry = processes.entry_mut(0, vpn);
        entry.referenced = referenced;
        entry.modified = modified;
    }

    #[cfg(test)]
    mod policy_kind_tests {

        use super::*;

        #[test]
        fn from_str() {
            assert_eq!("random".parse::<PolicyKind>(), Ok(PolicyKind::Random));
            assert_eq!("WSClock".parse::<PolicyKind>(), Ok(PolicyKind::WsClock));
            assert!("lru".parse::<PolicyKind>().is_err());
        }

        #[test]
        fn display() {
            assert_eq!(PolicyKind::Random.to_string(), "random");
            assert_eq!(PolicyKind::WsClock.to_string(), "wsclock");
        }
    }

    #[cfg(test)]
    mod uniform_random_tests {

        use super::*;

        #[test]
        fn pick_in_range() {
            let (frames, mut processes) = make_full_memory(8);
            let mut tracker = Tracker::new();
            let mut policy = UniformRandom::new(StdRng::seed_from_u64(42));
            (0..200).for_each(|_| {
                let victim = policy.pick(&frames, &mut processes, &mut tracker);
                assert!(victim < frames.len());
            });
        }

        #[test]
        fn pick_covers_table() {
            let (frames, mut processes) = make_full_memory(4);
            let mut tracker = Tracker::new();
            let mut policy = UniformRandom::new(StdRng::seed_from_u64(7));
            let mut seen = [false; 4];
            (0..200).for_each(|_| seen[policy.pick(&frames, &mut processes, &mut tracker)] = true);
            assert!(seen.iter().all(|x| *x));
        }

        #[test]
        fn pick_ignores_bits() {
            let (frames, mut processes) = make_full_memory(4);
            (0..4).for_each(|vpn| set_bits(&mut processes, vpn, true, true));
            let mut tracker = Tracker::new();
            let mut policy = UniformRandom::new(StepRng::new(0, 0));
            assert_eq!(policy.pick(&frames, &mut processes, &mut tracker), 0);
            assert!(processes.entry(0, 0).referenced);
            assert_eq!(tracker.clock_inspections, 0);
        }
    }

    #[cfg(test)]
    mod working_set_clock_tests {

        use super::*;

        #[test]
        fn pick_first_clean() {
            let (frames, mut processes) = make_full_memory(4);
            let mut tracker = Tracker::new();
            let mut clock = WorkingSetClock::new();
            assert_eq!(clock.pick(&frames, &mut processes, &mut tracker), 0);
            assert_eq!(clock.hand(), 1);
            assert_eq!(tracker.clock_inspections, 1);
        }

        #[test]
        fn pick_clears_referenced() {
            let (frames, mut processes) = make_full_memory(4);
            set_bits(&mut processes, 0, true, false);
            set_bits(&mut processes, 1, true, false);
            let mut tracker = Tracker::new();
            let mut clock = WorkingSetClock::new();

            assert_eq!(clock.pick(&frames, &mut processes, &mut tracker), 2);
            assert!(!processes.entry(0, 0).referenced);
            assert!(!processes.entry(0, 1).referenced);
            assert_eq!(clock.hand(), 3);
            assert_eq!(tracker.write_backs, 0);
        }

        #[test]
        fn pick_writes_back_modified() {
            let (frames, mut processes) = make_full_memory(3);
            set_bits(&mut processes, 0, false, true);
            set_bits(&mut processes, 1, true, true);
            set_bits(&mut processes, 2, true, false);
            let mut tracker = Tracker::new();
            let mut clock = WorkingSetClock::new();

            // 0: write back, 1: clear R, 2: clear R, 0: clean
            assert_eq!(clock.pick(&frames, &mut processes, &mut tracker), 0);
            assert_eq!(tracker.write_backs, 1);
            assert!(processes.entry(0, 1).modified);
            assert!(!processes.entry(0, 1).referenced);
            assert_eq!(tracker.clock_inspections, 4);
            assert_eq!(clock.hand(), 1);
        }

        #[test]
        fn pick_all_dirty_and_referenced() {
            let frame_count = 5;
            let (frames, mut processes) = make_full_memory(frame_count);
            (0..frame_count).for_each(|vpn| set_bits(&mut processes, vpn, true, true));
            let mut tracker = Tracker::new();
            let mut clock = WorkingSetClock::new();

            let victim = clock.pick(&frames, &mut processes, &mut tracker);
            assert_eq!(victim, 0);
            assert_eq!(tracker.clock_inspections, 2 * frame_count + 1);
            assert_eq!(tracker.write_backs, frame_count);
            let entry = processes.entry(0, victim);
            assert!(!entry.referenced && !entry.modified);
        }

        #[test]
        fn pick_terminates_within_two_revolutions() {
            let frame_count = 8;
            for clean in 0..frame_count {
                let (frames, mut processes) = make_full_memory(frame_count);
                (0..frame_count)
                    .filter(|vpn| *vpn != clean)
                    .for_each(|vpn| set_bits(&mut processes, vpn, true, vpn % 2 == 0));
                let mut tracker = Tracker::new();
                let mut clock = WorkingSetClock::new();

                let victim = clock.pick(&frames, &mut processes, &mut tracker);
                assert!(tracker.clock_inspections <= 2 * frame_count);
                let entry = processes.entry(0, victim);
                assert!(!entry.referenced && !entry.modified);
            }
        }

        #[test]
        fn pick_ages_every_visited_frame() {
            let (frames, mut processes) = make_full_memory(6);
            [0, 1, 2, 4].iter().for_each(|vpn| set_bits(&mut processes, *vpn, true, false));
            let mut tracker = Tracker::new();
            let mut clock = WorkingSetClock::new();

            let victim = clock.pick(&frames, &mut processes, &mut tracker);
            assert_eq!(victim, 3);
            // frames 0..3 were visited and aged, frame 4 lies beyond the hand
            (0..3).for_each(|vpn| assert!(!processes.entry(0, vpn).referenced));
            assert!(processes.entry(0, 4).referenced);
        }

        #[test]
        fn hand_persists_between_picks() {
            let (frames, mut processes) = make_full_memory(4);
            let mut tracker = Tracker::new();
            let mut clock = WorkingSetClock::new();

            let picks: Vec<_> = (0..6)
                .map(|_| clock.pick(&frames, &mut processes, &mut tracker))
                .collect();
            assert_eq!(picks, vec![0, 1, 2, 3, 0, 1]);
        }

        #[test]
        #[should_panic]
        fn pick_free_frame() {
            let mut frames = FrameTable::build(2);
            frames[1].assign(0, 0);
            let mut processes = ProcessTable::new();
            processes.insert(Process::new(0, 1, 1));
            WorkingSetClock::new().pick(&frames, &mut processes, &mut Tracker::new());
        }
    }
}
