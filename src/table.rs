use std::ops::{Index, IndexMut};

pub type ProcessId = usize;
pub type VirtualPageNumber = usize;
pub type FrameIndex = usize;

/// The `PageTableEntry` struct is the simplest element of a process's page table. A present entry
/// carries the index of the physical frame backing it along with the referenced (R) and modified
/// (M) bits maintained by the MMU. A non-present entry has no frame and both bits clear.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    pub present: bool,
    pub referenced: bool,
    pub modified: bool,
    pub frame: Option<FrameIndex>,
}

impl PageTableEntry {
    /// Create a new, non-present entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the entry at `frame`. The R and M bits start clear; the access that caused the
    /// mapping sets them afterwards.
    pub fn map(&mut self, frame: FrameIndex) {
        *self = Self {
            present: true,
            referenced: false,
            modified: false,
            frame: Some(frame),
        };
    }

    /// Return the entry to the non-present state. Any pending modification is discarded.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

/// The `AddressSpace` struct is the private virtual address space of a single process: a fixed
/// sequence of page table entries indexed by virtual page number. Its size never changes after
/// creation.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressSpace {
    entries: Vec<PageTableEntry>,
}

impl AddressSpace {
    /// Create an address space of `size` pages, none of them present.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero. A process must own at least one page.
    pub fn build(size: usize) -> Self {
        assert!(size > 0, "an address space needs at least one page");
        Self {
            entries: vec![PageTableEntry::new(); size],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VirtualPageNumber, &PageTableEntry)> {
        self.entries.iter().enumerate()
    }

    /// Iterate over the `(vpn, frame)` pairs of every present page.
    pub fn resident(&self) -> impl Iterator<Item = (VirtualPageNumber, FrameIndex)> + '_ {
        self.iter()
            .filter_map(|(vpn, entry)| entry.frame.map(|frame| (vpn, frame)))
    }
}

impl Index<VirtualPageNumber> for AddressSpace {
    type Output = PageTableEntry;

    fn index(&self, index: VirtualPageNumber) -> &Self::Output {
        &self.entries[index]
    }
}

impl IndexMut<VirtualPageNumber> for AddressSpace {
    fn index_mut(&mut self, index: VirtualPageNumber) -> &mut Self::Output {
        &mut self.entries[index]
    }
}

/// The `Frame` struct represents one unit of physical memory. It keeps a back-reference to the
/// (process, page) pair currently mapped into it so the owning entry can be invalidated when the
/// frame is victimized. A frame with no owner is free.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    owner: Option<ProcessId>,
    vpn: Option<VirtualPageNumber>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Option<ProcessId> {
        self.owner
    }

    pub fn vpn(&self) -> Option<VirtualPageNumber> {
        self.vpn
    }

    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    /// The `(owner, vpn)` pair held by the frame, or `None` for a free frame.
    pub fn mapping(&self) -> Option<(ProcessId, VirtualPageNumber)> {
        self.owner.zip(self.vpn)
    }

    pub fn assign(&mut self, owner: ProcessId, vpn: VirtualPageNumber) {
        self.owner = Some(owner);
        self.vpn = Some(vpn);
    }

    pub fn release(&mut self) {
        *self = Self::new();
    }
}

/// The `FrameTable` struct simulates the finite pool of physical memory shared by every process.
/// It is the single owner of frame state; page table entries only refer to frames by index.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTable {
    entries: Vec<Frame>,
}

impl FrameTable {
    /// Provided the number of physical frames, construct a table with every frame free.
    ///
    /// # Panics
    ///
    /// Panics if `table_size` is zero. Callers validate the configured size first.
    pub fn build(table_size: usize) -> Self {
        assert!(table_size > 0, "a frame table needs at least one frame");
        Self {
            entries: vec![Frame::new(); table_size],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the lowest-indexed free frame, if any.
    pub fn find_free(&self) -> Option<FrameIndex> {
        self.entries.iter().position(Frame::is_free)
    }

    pub fn free_count(&self) -> usize {
        self.entries.iter().filter(|frame| frame.is_free()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameIndex, &Frame)> {
        self.entries.iter().enumerate()
    }
}

impl Index<FrameIndex> for FrameTable {
    type Output = Frame;

    fn index(&self, index: FrameIndex) -> &Self::Output {
        &self.entries[index]
    }
}

impl IndexMut<FrameIndex> for FrameTable {
    fn index_mut(&mut self, index: FrameIndex) -> &mut Self::Output {
        &mut self.entries[index]
    }
}
