use crate::config::{EngineConfig, Error};
use crate::policy::ReplacementPolicy;
use crate::process::{Process, ProcessTable};
use crate::table::{FrameIndex, FrameTable, ProcessId, VirtualPageNumber};
use crate::tracker::{Event, Tracker};
use rand::RngCore;

type Result<T> = std::result::Result<T, Error>;

/// The `Kernel` struct resolves page faults. It owns the physical frame table and the replacement
/// policy selected at construction, and mutates page table entries of live processes through the
/// `ProcessTable` handed to it.
pub struct Kernel {
    frames: FrameTable,
    policy: Box<dyn ReplacementPolicy>,
}

impl Kernel {
    /// Create a kernel managing `frame_count` physical frames with the given policy.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoFrames` when `frame_count` is zero.
    pub fn build(frame_count: usize, policy: Box<dyn ReplacementPolicy>) -> Result<Self> {
        if frame_count == 0 {
            return Err(Error::NoFrames);
        }
        Ok(Self {
            frames: FrameTable::build(frame_count),
            policy,
        })
    }

    /// Create a kernel from the engine configuration. `rng` feeds the random policy.
    pub fn from_config<R: RngCore + 'static>(config: &EngineConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Self::build(config.frame_count, config.policy.build(rng))
    }

    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    /// Bring page `vpn` of process `pid` into memory. A free frame is used when one exists,
    /// otherwise the policy's victim is evicted first. On return the entry is present with both
    /// bits clear.
    ///
    /// # Panics
    ///
    /// Panics if `pid` is not live or `vpn` is outside its address space.
    pub fn handle_fault(
        &mut self,
        processes: &mut ProcessTable,
        pid: ProcessId,
        vpn: VirtualPageNumber,
        tracker: &mut Tracker,
    ) -> FrameIndex {
        tracker.record(Event::Fault { pid, vpn });
        assert!(
            !processes.entry(pid, vpn).present,
            "fault on resident page pid={} vpn={}",
            pid,
            vpn
        );

        let (frame, evicted) = match self.frames.find_free() {
            Some(frame) => (frame, false),
            None => {
                log::debug!("no free frames, selecting a victim");
                let victim = self.policy.pick(&self.frames, processes, tracker);
                self.evict(victim, processes, tracker);
                (victim, true)
            }
        };

        self.map(frame, processes, pid, vpn);
        tracker.record(Event::Mapped {
            pid,
            vpn,
            frame,
            evicted,
        });
        frame
    }

    /// Detach the page held by `frame` from its owner, leaving the frame free. The owner's
    /// modified state is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the frame is already free.
    fn evict(&mut self, frame: FrameIndex, processes: &mut ProcessTable, tracker: &mut Tracker) {
        let (owner, vpn) = self.frames[frame]
            .mapping()
            .unwrap_or_else(|| panic!("attempted to evict free frame {}", frame));
        tracker.record(Event::Eviction {
            frame,
            pid: owner,
            vpn,
        });
        processes.entry_mut(owner, vpn).clear();
        self.frames[frame].release();
    }

    fn map(
        &mut self,
        frame: FrameIndex,
        processes: &mut ProcessTable,
        pid: ProcessId,
        vpn: VirtualPageNumber,
    ) {
        self.frames[frame].assign(pid, vpn);
        processes.entry_mut(pid, vpn).map(frame);
    }

    /// Return every frame held by a terminated process to the free pool. The process has already
    /// left the process table, so its own entries are read for the frame list.
    pub fn reclaim(&mut self, process: &Process, tracker: &mut Tracker) -> usize {
        let mut count = 0;
        for (vpn, frame) in process.address_space.resident() {
            debug_assert_eq!(self.frames[frame].mapping(), Some((process.id, vpn)));
            self.frames[frame].release();
            count += 1;
        }
        tracker.record(Event::Reclaimed {
            pid: process.id,
            frames: count,
        });
        count
    }
}
