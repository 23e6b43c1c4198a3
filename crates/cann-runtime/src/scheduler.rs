//! Partition scheduler
//!
//! The neuron index range is split into contiguous, disjoint partitions.
//! The first (primary) partition runs inline on the caller's thread; every
//! other partition is bound for its lifetime to a persistent secondary
//! worker thread.
//!
//! `run(n)` publishes `n` to every secondary worker, runs `n` ticks over the
//! primary partition, then waits until every worker has reported its
//! pending count back to zero. In [`Consistency::Relaxed`] mode partitions
//! are not synchronised between ticks, so a worker may read activations and
//! weights owned by another partition from a different tick index.
//!
//! In [`Consistency::Barriered`] mode activations are double-buffered. A
//! partition reads its own neurons live and every other neuron from a
//! published copy. After each tick all partitions meet at a barrier, copy
//! their own activations into the published buffer, and meet again before
//! the next tick starts.

use crate::atomic::{cells, AtomicF32};
use crate::config::{Consistency, IdleStrategy, SchedulerConfig};
use crate::error::RuntimeError;
use crate::state::NetworkState;
use crate::step::{self, View};
use core::ops::Range;
use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Barrier, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Contiguous range `[start, end)` of neuron indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Partition {
    /// First neuron index
    pub start: usize,
    /// One past the last neuron index
    pub end: usize,
}

impl Partition {
    /// Create a partition covering `[start, end)`
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Index range
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of neurons
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the partition holds no neurons
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether neuron `i` belongs to this partition
    pub fn contains(&self, i: usize) -> bool {
        self.start <= i && i < self.end
    }
}

/// Split `[0, size)` into `workers` contiguous partitions
///
/// The worker count is clamped to `[1, size]`. Every partition gets
/// `size / workers` neurons and the first one also takes the remainder.
pub fn partition_ranges(size: usize, workers: usize) -> Vec<Partition> {
    if size == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, size);
    let base = size / workers;
    let first = base + size % workers;

    let mut partitions = Vec::with_capacity(workers);
    partitions.push(Partition::new(0, first));
    let mut start = first;
    for _ in 1..workers {
        partitions.push(Partition::new(start, start + base));
        start += base;
    }
    partitions
}

/// Sort partitions and join the ones that touch
fn coalesce(partitions: &mut Vec<Partition>) {
    partitions.sort_unstable();
    let mut merged: Vec<Partition> = Vec::with_capacity(partitions.len());
    for p in partitions.drain(..) {
        match merged.last_mut() {
            Some(last) if last.end == p.start => last.end = p.end,
            _ => merged.push(p),
        }
    }
    *partitions = merged;
}

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Starts secondary worker `k` running `job`
pub(crate) type Spawner = dyn FnMut(usize, Job) -> io::Result<JoinHandle<()>>;

pub(crate) fn spawn_named(k: usize, job: Job) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("cann-worker-{}", k))
        .spawn(job)
}

#[derive(Debug, Default)]
struct WorkerControl {
    pending: AtomicU32,
    cancel: AtomicBool,
}

/// Tick boundary shared by barriered participants
#[derive(Debug)]
struct Exchange {
    barrier: Barrier,
    /// Activations as of the end of the previous tick
    published: Box<[AtomicF32]>,
}

impl Exchange {
    fn new(participants: usize, size: usize) -> Self {
        Self {
            barrier: Barrier::new(participants),
            published: cells(size, 0.0),
        }
    }

    fn publish(&self, state: &NetworkState, range: Range<usize>) {
        for i in range {
            if let Some(cell) = self.published.get(i) {
                cell.store(state.activation(i));
            }
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: Arc<NetworkState>,
    idle: IdleStrategy,
    /// Set once every worker has been started, and only when more than one
    /// participant runs barriered
    exchange: OnceLock<Exchange>,
    signal: Mutex<()>,
    work: Condvar,
    done: Condvar,
}

impl Shared {
    fn run_ticks(&self, partitions: &[Partition], ticks: u32) {
        let Some(exchange) = self.exchange.get() else {
            for _ in 0..ticks {
                step::tick(&self.state, partitions, View::Live);
            }
            return;
        };

        let view = View::Published {
            own: partitions,
            published: &exchange.published,
        };
        for _ in 0..ticks {
            step::tick(&self.state, partitions, view);
            exchange.barrier.wait();
            for p in partitions {
                exchange.publish(&self.state, p.range());
            }
            exchange.barrier.wait();
        }
    }
}

#[derive(Debug)]
struct Worker {
    partition: Partition,
    control: Arc<WorkerControl>,
    handle: Option<JoinHandle<()>>,
}

fn service_loop(shared: Arc<Shared>, control: Arc<WorkerControl>, partition: Partition) {
    let partitions = [partition];
    while !control.cancel.load(Ordering::Acquire) {
        let pending = control.pending.load(Ordering::Acquire);
        if pending == 0 {
            match shared.idle {
                IdleStrategy::Yield => thread::yield_now(),
                IdleStrategy::Park => {
                    let mut guard = shared.signal.lock();
                    while control.pending.load(Ordering::Acquire) == 0
                        && !control.cancel.load(Ordering::Acquire)
                    {
                        shared.work.wait(&mut guard);
                    }
                }
            }
            continue;
        }

        shared.run_ticks(&partitions, pending);

        match shared.idle {
            IdleStrategy::Yield => control.pending.store(0, Ordering::Release),
            IdleStrategy::Park => {
                let _guard = shared.signal.lock();
                control.pending.store(0, Ordering::Release);
                shared.done.notify_all();
            }
        }
    }
}

/// Fixed pool of partition workers over one network
#[derive(Debug)]
pub struct Scheduler {
    shared: Arc<Shared>,
    consistency: Consistency,
    primary: Vec<Partition>,
    workers: Vec<Worker>,
    spawn_errors: Vec<RuntimeError>,
}

impl Scheduler {
    /// Partition the network and start the secondary workers
    ///
    /// A worker that fails to start does not fail construction: its range is
    /// folded into the primary partition and the failure is available from
    /// [`Scheduler::spawn_errors`].
    pub fn new(state: Arc<NetworkState>, config: &SchedulerConfig) -> Self {
        Self::with_spawner(state, config, &mut spawn_named)
    }

    pub(crate) fn with_spawner(
        state: Arc<NetworkState>,
        config: &SchedulerConfig,
        spawner: &mut Spawner,
    ) -> Self {
        let size = state.size();
        let mut partitions = partition_ranges(size, config.effective_workers(size)).into_iter();
        let primary = partitions.next().map_or_else(Vec::new, |p| vec![p]);

        let shared = Arc::new(Shared {
            state,
            idle: config.idle,
            exchange: OnceLock::new(),
            signal: Mutex::new(()),
            work: Condvar::new(),
            done: Condvar::new(),
        });

        let mut scheduler = Self {
            shared,
            consistency: config.consistency,
            primary,
            workers: Vec::new(),
            spawn_errors: Vec::new(),
        };

        for (k, partition) in partitions.enumerate().map(|(k, p)| (k + 1, p)) {
            let control = Arc::new(WorkerControl::default());
            let job: Job = {
                let shared = Arc::clone(&scheduler.shared);
                let control = Arc::clone(&control);
                Box::new(move || service_loop(shared, control, partition))
            };
            match spawner(k, job) {
                Ok(handle) => scheduler.workers.push(Worker {
                    partition,
                    control,
                    handle: Some(handle),
                }),
                Err(e) => {
                    log::warn!(
                        "Worker #{} failed to start ({}), running neurons {}..{} on the primary",
                        k,
                        e,
                        partition.start,
                        partition.end
                    );
                    scheduler.primary.push(partition);
                    scheduler.spawn_errors.push(RuntimeError::WorkerSpawn {
                        worker: k,
                        reason: e.to_string(),
                    });
                }
            }
        }
        coalesce(&mut scheduler.primary);

        let participants = scheduler.worker_count();
        if scheduler.consistency == Consistency::Barriered && participants > 1 {
            let installed = scheduler
                .shared
                .exchange
                .set(Exchange::new(participants, size))
                .is_ok();
            debug_assert!(installed, "exchange installed twice");
        }

        log::debug!(
            "Scheduler ready: {} neurons, {} of {} requested workers, {} / {}",
            size,
            participants,
            config.workers.max(1),
            scheduler.consistency,
            config.idle
        );
        scheduler
    }

    /// Live worker count, including the primary
    pub fn worker_count(&self) -> usize {
        1 + self.workers.len()
    }

    /// Consistency mode in effect
    pub fn consistency(&self) -> Consistency {
        self.consistency
    }

    /// Idle strategy in effect
    pub fn idle_strategy(&self) -> IdleStrategy {
        self.shared.idle
    }

    /// Ranges executed inline by the caller
    pub fn primary_partitions(&self) -> &[Partition] {
        &self.primary
    }

    /// Every partition in index order, primary ranges included
    pub fn partitions(&self) -> Vec<Partition> {
        let mut all: Vec<Partition> = self
            .primary
            .iter()
            .copied()
            .chain(self.workers.iter().map(|w| w.partition))
            .collect();
        all.sort_unstable();
        all
    }

    /// Failures recorded while starting secondary workers
    pub fn spawn_errors(&self) -> &[RuntimeError] {
        &self.spawn_errors
    }

    /// Run `ticks` full ticks over every partition and wait for completion
    pub fn run(&mut self, ticks: u32) {
        if ticks == 0 {
            return;
        }
        let started = Instant::now();

        if let Some(exchange) = self.shared.exchange.get() {
            // workers are idle; the pending store below orders this copy
            // before their first read
            exchange.publish(&self.shared.state, 0..self.shared.state.size());
        }
        self.publish(ticks);
        self.shared.run_ticks(&self.primary, ticks);
        self.wait_idle();

        log::trace!(
            "{} ticks over {} workers in {:?}",
            ticks,
            self.worker_count(),
            started.elapsed()
        );
    }

    fn publish(&self, ticks: u32) {
        match self.shared.idle {
            IdleStrategy::Yield => {
                for w in &self.workers {
                    w.control.pending.store(ticks, Ordering::Release);
                }
            }
            IdleStrategy::Park => {
                let _guard = self.shared.signal.lock();
                for w in &self.workers {
                    w.control.pending.store(ticks, Ordering::Release);
                }
                self.shared.work.notify_all();
            }
        }
    }

    fn busy(&self) -> bool {
        self.workers
            .iter()
            .any(|w| w.control.pending.load(Ordering::Acquire) != 0)
    }

    fn wait_idle(&self) {
        match self.shared.idle {
            IdleStrategy::Yield => {
                while self.busy() {
                    thread::yield_now();
                }
            }
            IdleStrategy::Park => {
                let mut guard = self.shared.signal.lock();
                while self.busy() {
                    self.shared.done.wait(&mut guard);
                }
            }
        }
    }

    /// Cancel and join every secondary worker
    fn stop(&mut self) {
        {
            let _guard = self.shared.signal.lock();
            for w in &self.workers {
                w.control.cancel.store(true, Ordering::Release);
            }
            self.shared.work.notify_all();
        }
        for w in &mut self.workers {
            if let Some(handle) = w.handle.take() {
                if handle.join().is_err() {
                    log::warn!(
                        "Worker for neurons {}..{} panicked",
                        w.partition.start,
                        w.partition.end
                    );
                }
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
