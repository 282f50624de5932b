//! Fixed cohort of render workers with a one-shot collective gather.
//!
//! A [`Cohort`] runs the same closure on `size` worker threads, each holding a
//! [`Communicator`] that knows its rank. Workers never talk to each other
//! while rendering. At the end each worker hands its buffer to
//! [`Communicator::gather`]; the coordinator (rank 0) blocks until every rank
//! has contributed and then assembles the parts in rank order.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use thiserror::Error;

use crate::{PixelBuffer, RowBand};

/// Rank that receives the gathered image.
pub const COORDINATOR: usize = 0;

/// Errors raised while running a cohort.
#[derive(Debug, Error)]
pub enum CohortError {
    #[error("Cohort must have at least one worker")]
    Empty,

    #[error("Failed to spawn worker {rank}: {source}")]
    Spawn {
        rank: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("Gather incomplete, no contribution from workers {missing:?}")]
    MissingContributions { missing: Vec<usize> },

    #[error("Worker {rank} could not reach the coordinator")]
    CoordinatorLost { rank: usize },

    #[error("Contribution from worker {rank} does not fit the image: {reason}")]
    LayoutMismatch { rank: usize, reason: String },

    #[error("Coordinator finished without producing a result")]
    NoResult,
}

impl CohortError {
    /// True for failures that only happen because some other worker failed first.
    fn is_secondary(&self) -> bool {
        matches!(
            self,
            CohortError::MissingContributions { .. } | CohortError::CoordinatorLost { .. }
        )
    }
}

struct Contribution {
    rank: usize,
    buffer: PixelBuffer,
}

enum Link {
    Coordinator(Receiver<Contribution>),
    Member(Sender<Contribution>),
}

/// A worker's handle on the cohort.
pub struct Communicator {
    rank: usize,
    size: usize,
    link: Link,
}

impl Communicator {
    /// This worker's rank in `0..size`.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of workers in the cohort.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_coordinator(&self) -> bool {
        self.rank == COORDINATOR
    }

    /// Contribute `local` to the collective gather.
    ///
    /// On the coordinator this blocks until every rank has contributed, then
    /// returns the assembled image. Other ranks hand their buffer over and get
    /// `None`. Consumes the communicator, so each rank gathers at most once.
    pub fn gather(self, local: PixelBuffer) -> Result<Option<PixelBuffer>, CohortError> {
        match self.link {
            Link::Member(tx) => {
                tx.send(Contribution {
                    rank: self.rank,
                    buffer: local,
                })
                .map_err(|_| CohortError::CoordinatorLost { rank: self.rank })?;
                Ok(None)
            }
            Link::Coordinator(rx) => {
                log::info!("Commencing gather from {} workers", self.size);

                let mut slots: Vec<Option<PixelBuffer>> = (0..self.size).map(|_| None).collect();
                slots[self.rank] = Some(local);
                let mut pending = self.size - 1;

                while pending > 0 {
                    // Fails only once every member has hung up without sending
                    let Ok(Contribution { rank, buffer }) = rx.recv() else {
                        let missing = slots
                            .iter()
                            .enumerate()
                            .filter(|(_, slot)| slot.is_none())
                            .map(|(rank, _)| rank)
                            .collect();
                        return Err(CohortError::MissingContributions { missing });
                    };
                    log::debug!("Received rows {}..{} from worker {}", buffer.band().start, buffer.band().end, rank);
                    if slots[rank].replace(buffer).is_none() {
                        pending -= 1;
                    }
                }

                assemble(slots.into_iter().flatten().collect()).map(Some)
            }
        }
    }
}

/// Concatenate rank-ordered band buffers into one full-height buffer.
///
/// Each part must have the same width and start where the previous one
/// ended, beginning at row 0. Pixel storage of the first part is reused.
pub fn assemble(parts: Vec<PixelBuffer>) -> Result<PixelBuffer, CohortError> {
    let mut parts = parts.into_iter().enumerate();
    let Some((_, first)) = parts.next() else {
        return Err(CohortError::NoResult);
    };

    if first.band().start != 0 {
        return Err(CohortError::LayoutMismatch {
            rank: 0,
            reason: format!("first band starts at row {}", first.band().start),
        });
    }

    let width = first.width();
    let mut end = first.band().end;
    let mut pixels = first.into_pixels();

    for (rank, part) in parts {
        if part.width() != width {
            return Err(CohortError::LayoutMismatch {
                rank,
                reason: format!("width {} differs from {}", part.width(), width),
            });
        }
        if part.band().start != end {
            return Err(CohortError::LayoutMismatch {
                rank,
                reason: format!("band starts at row {} but previous band ended at {}", part.band().start, end),
            });
        }
        end = part.band().end;
        pixels.append(&mut part.into_pixels());
    }

    PixelBuffer::from_pixels(width, RowBand::new(0, end), pixels).ok_or_else(|| CohortError::LayoutMismatch {
        rank: COORDINATOR,
        reason: "pixel count does not match the assembled bands".to_string(),
    })
}

/// A fixed-size group of worker threads.
#[derive(Debug, Clone, Copy)]
pub struct Cohort {
    size: usize,
}

impl Cohort {
    /// Create a cohort of `size` workers.
    pub fn new(size: usize) -> Result<Self, CohortError> {
        if size == 0 {
            return Err(CohortError::Empty);
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Build one communicator per rank, all wired to the coordinator.
    fn communicators(&self) -> Vec<Communicator> {
        let (tx, rx) = channel();
        let mut comms = Vec::with_capacity(self.size);
        comms.push(Communicator {
            rank: COORDINATOR,
            size: self.size,
            link: Link::Coordinator(rx),
        });
        for rank in 1..self.size {
            comms.push(Communicator {
                rank,
                size: self.size,
                link: Link::Member(tx.clone()),
            });
        }
        comms
    }

    /// Run `worker` once on every rank and return the coordinator's result.
    ///
    /// Each rank gets its own named thread (`worker-<rank>`). The call returns
    /// once all workers have finished. The coordinator must return `Some`,
    /// every other rank `None`. Any worker error or panic fails the whole run.
    pub fn run<T, F>(&self, worker: F) -> Result<T, CohortError>
    where
        T: Send,
        F: Fn(Communicator) -> Result<Option<T>, CohortError> + Sync,
    {
        let worker = &worker;
        let mut result = None;
        let mut errors: Vec<(usize, CohortError)> = Vec::new();

        thread::scope(|s| {
            let mut handles = Vec::with_capacity(self.size);
            for comm in self.communicators() {
                let rank = comm.rank();
                let spawned = thread::Builder::new()
                    .name(format!("worker-{rank}"))
                    .spawn_scoped(s, move || worker(comm));
                match spawned {
                    Ok(handle) => handles.push((rank, handle)),
                    Err(source) => {
                        errors.push((rank, CohortError::Spawn { rank, source }));
                        // Remaining communicators drop here, releasing anyone waiting on them
                        break;
                    }
                }
            }

            for (rank, handle) in handles {
                match handle.join() {
                    Ok(Ok(Some(value))) if rank == COORDINATOR => result = Some(value),
                    Ok(Ok(_)) => {}
                    Ok(Err(err)) => errors.push((rank, err)),
                    Err(_) => errors.push((rank, CohortError::WorkerPanicked { rank })),
                }
            }
        });

        if !errors.is_empty() {
            for (rank, err) in &errors {
                log::error!("Worker {rank} failed: {err}");
            }
            errors.sort_by_key(|(rank, err)| {
                (!matches!(err, CohortError::WorkerPanicked { .. }), err.is_secondary(), *rank)
            });
            let (_, first) = errors.swap_remove(0);
            return Err(first);
        }

        result.ok_or(CohortError::NoResult)
    }
}
