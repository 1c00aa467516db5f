use crate::config::{EngineConfig, Error};
use crate::kernel::Kernel;
use crate::process::{Process, ProcessTable};
use crate::table::{FrameIndex, FrameTable, ProcessId, VirtualPageNumber};
use crate::tracker::{Event, Tracker};
use rand::RngCore;

/// The `Mmu` struct translates virtual page numbers to physical frames. A reference to a page
/// that is not present traps into the kernel, which resolves the fault before translation
/// completes. Every translation sets the page's referenced bit, and writes also set the modified
/// bit.
pub struct Mmu {
    kernel: Kernel,
    max_virtual_pages: usize,
    pub tracker: Tracker,
}

impl Mmu {
    /// Create the engine from its configuration. `rng` feeds the random replacement policy.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration describes an empty frame table or empty address
    /// spaces.
    pub fn build<R: RngCore + 'static>(config: &EngineConfig, rng: R) -> Result<Self, Error> {
        Ok(Self {
            kernel: Kernel::from_config(config, rng)?,
            max_virtual_pages: config.max_virtual_pages,
            tracker: Tracker::new(),
        })
    }

    /// Wrap an existing kernel, allowing address spaces of up to `max_virtual_pages` pages.
    pub fn with_kernel(kernel: Kernel, max_virtual_pages: usize) -> Self {
        Self {
            kernel,
            max_virtual_pages,
            tracker: Tracker::new(),
        }
    }

    pub fn frames(&self) -> &FrameTable {
        self.kernel.frames()
    }

    pub fn max_virtual_pages(&self) -> usize {
        self.max_virtual_pages
    }

    /// Translate page `vpn` of process `pid`, faulting it in if needed, and update its access
    /// bits. Returns the frame backing the page.
    ///
    /// # Panics
    ///
    /// Panics if `pid` is not live or `vpn` is outside its address space.
    pub fn access(
        &mut self,
        processes: &mut ProcessTable,
        pid: ProcessId,
        vpn: VirtualPageNumber,
        write: bool,
    ) -> FrameIndex {
        if !processes.entry(pid, vpn).present {
            self.kernel
                .handle_fault(processes, pid, vpn, &mut self.tracker);
        }

        let entry = processes.entry_mut(pid, vpn);
        let frame = entry
            .frame
            .unwrap_or_else(|| panic!("page pid={} vpn={} present without a frame", pid, vpn));
        entry.referenced = true;
        if write {
            entry.modified = true;
        }

        self.tracker.record(Event::Access {
            pid,
            vpn,
            frame,
            write,
        });
        frame
    }

    /// Termination hook: give back every frame of a process that has left the process table.
    pub fn release(&mut self, process: &Process) -> usize {
        self.kernel.reclaim(process, &mut self.tracker)
    }
}
