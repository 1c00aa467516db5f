use crate::process::ProcessTable;
use crate::table::{FrameIndex, FrameTable, ProcessId, VirtualPageNumber};
use thiserror::Error;

/// A broken link between the page tables and the frame table. Any of these means the engine has
/// corrupted its own state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("pid {pid} vpn {vpn}: present bit disagrees with frame {frame:?}")]
    PresentMismatch {
        pid: ProcessId,
        vpn: VirtualPageNumber,
        frame: Option<FrameIndex>,
    },
    #[error("pid {pid} vpn {vpn}: access bits set on a page that is not present")]
    StaleBits { pid: ProcessId, vpn: VirtualPageNumber },
    #[error("pid {pid} vpn {vpn}: frame {frame} is out of range")]
    FrameOutOfRange {
        pid: ProcessId,
        vpn: VirtualPageNumber,
        frame: FrameIndex,
    },
    #[error("pid {pid} vpn {vpn}: frame {frame} is mapped to {found:?}")]
    FrameMismatch {
        pid: ProcessId,
        vpn: VirtualPageNumber,
        frame: FrameIndex,
        found: Option<(ProcessId, VirtualPageNumber)>,
    },
    #[error("frame {frame} claims pid {pid} vpn {vpn}, which does not map it")]
    OrphanFrame {
        frame: FrameIndex,
        pid: ProcessId,
        vpn: VirtualPageNumber,
    },
}

/// Check that present pages and occupied frames form a one-to-one mapping:
///
/// * an entry is present exactly when it has a frame, and a non-present entry has both bits clear;
/// * every present entry's frame points back at that entry;
/// * every occupied frame belongs to a live process whose entry points back at the frame.
///
/// The second and third rules together rule out two pages sharing a frame.
pub fn check(frames: &FrameTable, processes: &ProcessTable) -> Result<(), Violation> {
    for process in processes.iter() {
        let pid = process.id;
        for (vpn, entry) in process.address_space.iter() {
            match (entry.present, entry.frame) {
                (true, Some(frame)) => {
                    if frame >= frames.len() {
                        return Err(Violation::FrameOutOfRange { pid, vpn, frame });
                    }
                    let found = frames[frame].mapping();
                    if found != Some((pid, vpn)) {
                        return Err(Violation::FrameMismatch {
                            pid,
                            vpn,
                            frame,
                            found,
                        });
                    }
                }
                (false, None) => {
                    if entry.referenced || entry.modified {
                        return Err(Violation::StaleBits { pid, vpn });
                    }
                }
                (_, frame) => return Err(Violation::PresentMismatch { pid, vpn, frame }),
            }
        }
    }

    for (frame, slot) in frames.iter() {
        if let Some((pid, vpn)) = slot.mapping() {
            let backed = processes
                .get(pid)
                .filter(|process| vpn < process.pages())
                .map(|process| process.address_space[vpn].frame == Some(frame))
                .unwrap_or(false);
            if !backed {
                return Err(Violation::OrphanFrame { frame, pid, vpn });
            }
        }
    }

    Ok(())
}
