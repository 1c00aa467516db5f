use crate::table::{AddressSpace, PageTableEntry, ProcessId, VirtualPageNumber};
use linked_hash_map::LinkedHashMap;

/// The `Process` struct is a simulated user process. It exclusively owns its address space and
/// carries the bookkeeping the scheduler and reference generator need: a time-to-live counted in
/// scheduled turns and a working set of page numbers it prefers to touch.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub id: ProcessId,
    pub remaining_ticks: u64,
    pub address_space: AddressSpace,
    pub working_set: Vec<VirtualPageNumber>,
}

impl Process {
    /// Create a new process with `pages` virtual pages, none resident, and an empty working set.
    ///
    /// # Panics
    ///
    /// Panics if `pages` is zero.
    pub fn new(id: ProcessId, remaining_ticks: u64, pages: usize) -> Self {
        Self {
            id,
            remaining_ticks,
            address_space: AddressSpace::build(pages),
            working_set: Vec::new(),
        }
    }

    /// Number of virtual pages in the address space.
    pub fn pages(&self) -> usize {
        self.address_space.len()
    }

    /// Count down one scheduled turn and report whether the process has run out of time.
    pub fn expire(&mut self) -> bool {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        self.remaining_ticks < 1
    }
}

/// The `ProcessTable` holds every live process keyed by id. Insertion order is preserved so the
/// scheduler can walk it round-robin by position, while the kernel resolves frame back-references
/// by id.
#[derive(Debug, Default)]
pub struct ProcessTable(LinkedHashMap<ProcessId, Process>);

impl ProcessTable {
    pub fn new() -> Self {
        Self(LinkedHashMap::new())
    }

    /// Add a process to the back of the run order.
    ///
    /// # Panics
    ///
    /// Panics if a process with the same id is already live.
    pub fn insert(&mut self, process: Process) {
        let id = process.id;
        let previous = self.0.insert(id, process);
        assert!(previous.is_none(), "process {} is already live", id);
    }

    pub fn remove(&mut self, id: ProcessId) -> Option<Process> {
        self.0.remove(&id)
    }

    pub fn get(&self, id: ProcessId) -> Option<&Process> {
        self.0.get(&id)
    }

    pub fn get_mut(&mut self, id: ProcessId) -> Option<&mut Process> {
        self.0.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The id of the process at `position` in run order.
    pub fn id_at(&self, position: usize) -> Option<ProcessId> {
        self.0.keys().nth(position).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.0.iter().map(|(_, process)| process)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Process> {
        self.0.iter_mut().map(|(_, process)| process)
    }

    /// Resolve a (process, page) back-reference to the page table entry it names.
    ///
    /// # Panics
    ///
    /// Panics if the process is not live or `vpn` is outside its address space. Either one means
    /// a frame or caller holds a dangling reference.
    pub fn entry(&self, id: ProcessId, vpn: VirtualPageNumber) -> &PageTableEntry {
        let process = self
            .get(id)
            .unwrap_or_else(|| panic!("process {} is not live", id));
        &process.address_space[vpn]
    }

    /// Mutable counterpart of [`ProcessTable::entry`].
    ///
    /// # Panics
    ///
    /// Same conditions as [`ProcessTable::entry`].
    pub fn entry_mut(&mut self, id: ProcessId, vpn: VirtualPageNumber) -> &mut PageTableEntry {
        let process = self
            .get_mut(id)
            .unwrap_or_else(|| panic!("process {} is not live", id));
        &mut process.address_space[vpn]
    }
}
