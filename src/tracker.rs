use crate::table::{FrameIndex, ProcessId, VirtualPageNumber};
use std::fmt;

/// Observable occurrences inside the memory-management engine. Events are recorded for
/// statistics and logging only; nothing in the engine branches on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Access {
        pid: ProcessId,
        vpn: VirtualPageNumber,
        frame: FrameIndex,
        write: bool,
    },
    Fault {
        pid: ProcessId,
        vpn: VirtualPageNumber,
    },
    Eviction {
        frame: FrameIndex,
        pid: ProcessId,
        vpn: VirtualPageNumber,
    },
    WriteBack {
        frame: FrameIndex,
        pid: ProcessId,
        vpn: VirtualPageNumber,
    },
    Mapped {
        pid: ProcessId,
        vpn: VirtualPageNumber,
        frame: FrameIndex,
        evicted: bool,
    },
    Reclaimed {
        pid: ProcessId,
        frames: usize,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Event::Access {
                pid,
                vpn,
                frame,
                write,
            } => write!(
                f,
                "access pid={} vpn={} frame={} op={}",
                pid,
                vpn,
                frame,
                if write { "write" } else { "read" }
            ),
            Event::Fault { pid, vpn } => write!(f, "page fault pid={} vpn={}", pid, vpn),
            Event::Eviction { frame, pid, vpn } => {
                write!(f, "evict frame={} pid={} vpn={}", frame, pid, vpn)
            }
            Event::WriteBack { frame, pid, vpn } => {
                write!(f, "write-back frame={} pid={} vpn={}", frame, pid, vpn)
            }
            Event::Mapped {
                pid,
                vpn,
                frame,
                evicted,
            } => write!(
                f,
                "mapped pid={} vpn={} frame={} source={}",
                pid,
                vpn,
                frame,
                if evicted { "victim" } else { "free" }
            ),
            Event::Reclaimed { pid, frames } => {
                write!(f, "reclaimed pid={} frames={}", pid, frames)
            }
        }
    }
}

/// The `Tracker` struct is a simple collection of named counters used for collecting data points
/// on the simulation. The data collected is used to compare the behaviour of the replacement
/// policies.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tracker {
    pub accesses: usize,
    pub faults: usize,
    pub free_frame_faults: usize,
    pub evictions: usize,
    pub write_backs: usize,
    pub clock_inspections: usize,
    pub terminated: usize,
    pub reclaimed_frames: usize,
    pub idle_ticks: usize,
    pub system_ticks: usize,
}

impl Tracker {
    /// Create a new instance of the `Tracker` struct with all counters initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an engine event and forward it to the log.
    pub fn record(&mut self, event: Event) {
        match event {
            Event::Access { .. } => {
                self.accesses += 1;
                log::trace!("{}", event);
                return;
            }
            Event::Fault { .. } => self.faults += 1,
            Event::Eviction { .. } => self.evictions += 1,
            Event::WriteBack { .. } => self.write_backs += 1,
            Event::Mapped { evicted, .. } => {
                if !evicted {
                    self.free_frame_faults += 1;
                }
            }
            Event::Reclaimed { frames, .. } => self.reclaimed_frames += frames,
        }
        log::debug!("{}", event);
    }

    /// Faults per access, or zero before the first access.
    pub fn fault_rate(&self) -> f64 {
        match self.accesses {
            0 => 0.0,
            n => self.faults as f64 / n as f64,
        }
    }
}

impl fmt::Display for Tracker {
    /// Display format specification for the `Tracker` struct implemented to simplify the process
    /// of outputting statistics to the terminal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "
Stats Tracked
---------------------------------
accesses:                 {:08}
page_faults:              {:08}
free_frame_faults:        {:08}
evictions:                {:08}
write_backs:              {:08}
clock_inspections:        {:08}
processes_terminated:     {:08}
frames_reclaimed:         {:08}
idle_ticks:               {:08}
system_ticks:             {:08}


fault rate:               {:.03}
               ",
            self.accesses,
            self.faults,
            self.free_frame_faults,
            self.evictions,
            self.write_backs,
            self.clock_inspections,
            self.terminated,
            self.reclaimed_frames,
            self.idle_ticks,
            self.system_ticks,
            self.fault_rate(),
        )
    }
}
