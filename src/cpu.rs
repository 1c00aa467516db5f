use crate::mmu::Mmu;
use crate::process::{Process, ProcessTable};
use crate::table::{FrameIndex, ProcessId, VirtualPageNumber};
use crate::workload::Workload;

/// What happened during one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No process was left to run.
    Idle,
    /// The current process ran out of time and was removed.
    Terminated(ProcessId),
    /// The current process issued one memory reference.
    Accessed {
        pid: ProcessId,
        vpn: VirtualPageNumber,
        write: bool,
        frame: FrameIndex,
    },
}

/// The `Cpu` struct schedules live processes round-robin. Each tick the current process spends
/// one unit of its time to live and, if still alive, issues one reference through the MMU.
pub struct Cpu {
    processes: ProcessTable,
    current: usize,
    mmu: Mmu,
}

impl Cpu {
    pub fn new(mmu: Mmu) -> Self {
        Self {
            processes: ProcessTable::new(),
            current: 0,
            mmu,
        }
    }

    /// Add a process to the end of the run order.
    ///
    /// # Panics
    ///
    /// Panics if its address space exceeds the engine's configured bound or its id is taken.
    pub fn admit(&mut self, process: Process) {
        assert!(
            process.pages() <= self.mmu.max_virtual_pages(),
            "process {} has {} pages, the limit is {}",
            process.id,
            process.pages(),
            self.mmu.max_virtual_pages()
        );
        log::info!(
            "process {} created with {} pages and ttl {}",
            process.id,
            process.pages(),
            process.remaining_ticks
        );
        self.processes.insert(process);
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    /// Position of the next process to run.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Run one scheduling step.
    pub fn tick(&mut self, workload: &mut dyn Workload) -> Tick {
        let pid = match self.processes.id_at(self.current) {
            Some(pid) => pid,
            None => {
                log::debug!("no processes left, cpu idle");
                self.mmu.tracker.idle_ticks += 1;
                return Tick::Idle;
            }
        };

        let expired = match self.processes.get_mut(pid) {
            Some(process) => process.expire(),
            None => unreachable!("id_at returned a live process"),
        };
        if expired {
            self.terminate(pid);
            return Tick::Terminated(pid);
        }

        let reference = match self.processes.get(pid) {
            Some(process) => workload.next_reference(process),
            None => unreachable!("id_at returned a live process"),
        };
        let frame = self
            .mmu
            .access(&mut self.processes, pid, reference.vpn, reference.write);
        self.current = (self.current + 1) % self.processes.len();

        Tick::Accessed {
            pid,
            vpn: reference.vpn,
            write: reference.write,
            frame,
        }
    }

    /// Remove a process and hand its frames back. The process that followed it in run order
    /// slides into the current position, or the pointer wraps to the front.
    fn terminate(&mut self, pid: ProcessId) {
        if let Some(process) = self.processes.remove(pid) {
            let frames = self.mmu.release(&process);
            self.mmu.tracker.terminated += 1;
            log::info!("process {} terminated, {} frames reclaimed", pid, frames);
        }
        if self.current >= self.processes.len() {
            self.current = 0;
        }
    }

    /// Let every live process draw a new working set.
    pub fn refresh_working_sets(&mut self, workload: &mut dyn Workload) {
        self.processes
            .iter_mut()
            .for_each(|process| workload.refresh_working_set(process));
    }

    /// Account for a tick spent on system work. No user process runs.
    pub fn run_system_processes(&mut self) {
        log::trace!("running system processes");
        self.mmu.tracker.system_ticks += 1;
    }
}
