//! Bounded parallel execution of the tasks of a phase.
//!
//! A [TaskRunner] receives the items of a phase, the work to do on each item, a progress callback
//! and a maximum number of items processed concurrently. It returns when all items are done, which
//! gives the barrier between phases. Results come back in item order, the order in which items
//! are processed is not specified.

use parking_lot::Mutex;
use rayon::prelude::*;

pub trait TaskRunner {
    /// runs `work` on every item with at most `max_parallelism` items in flight.
    /// `progress(completed, total)` is called after each item, completed increases by one at each call.
    fn run<T, R, W, P>(&self, items: &[T], work: W, progress: P, max_parallelism: usize) -> Vec<R>
    where
        T: Sync,
        R: Send,
        W: Fn(&T) -> R + Sync,
        P: Fn(usize, usize) + Sync;
}

/// counts completed items. The lock is held during callback so messages come out in order.
struct ProgressCounter {
    done: Mutex<usize>,
    total: usize,
}

impl ProgressCounter {
    fn new(total: usize) -> Self {
        ProgressCounter {
            done: Mutex::new(0),
            total,
        }
    }

    fn tick<P: Fn(usize, usize)>(&self, progress: &P) {
        let mut done = self.done.lock();
        *done += 1;
        progress(*done, self.total);
    }
}

//==========================================================================================

/// one item after the other, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialRunner;

impl TaskRunner for SequentialRunner {
    fn run<T, R, W, P>(&self, items: &[T], work: W, progress: P, _max_parallelism: usize) -> Vec<R>
    where
        T: Sync,
        R: Send,
        W: Fn(&T) -> R + Sync,
        P: Fn(usize, usize) + Sync,
    {
        let counter = ProgressCounter::new(items.len());
        items
            .iter()
            .map(|item| {
                let res = work(item);
                counter.tick(&progress);
                res
            })
            .collect()
    }
}

//==========================================================================================

/// a rayon pool with max_parallelism threads dedicated to the phase
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonRunner;

impl TaskRunner for RayonRunner {
    fn run<T, R, W, P>(&self, items: &[T], work: W, progress: P, max_parallelism: usize) -> Vec<R>
    where
        T: Sync,
        R: Send,
        W: Fn(&T) -> R + Sync,
        P: Fn(usize, usize) + Sync,
    {
        let nb_threads = max_parallelism.max(1);
        let counter = ProgressCounter::new(items.len());
        let pool = match rayon::ThreadPoolBuilder::new().num_threads(nb_threads).build() {
            Ok(pool) => pool,
            Err(e) => {
                log::error!("could not build a pool of {} threads : {}, running sequentially", nb_threads, e);
                return SequentialRunner.run(items, work, progress, 1);
            }
        };
        log::debug!("rayon pool with {} threads for {} items", pool.current_num_threads(), items.len());
        // items are long blocking calls, each one must be stealable alone
        pool.install(|| {
            items
                .par_iter()
                .with_max_len(1)
                .map(|item| {
                    let res = work(item);
                    counter.tick(&progress);
                    res
                })
                .collect()
        })
    } // end of run
}

//==========================================================================================

/// max_parallelism scoped threads pulling item ranks from a crossbeam channel
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelRunner;

impl TaskRunner for ChannelRunner {
    fn run<T, R, W, P>(&self, items: &[T], work: W, progress: P, max_parallelism: usize) -> Vec<R>
    where
        T: Sync,
        R: Send,
        W: Fn(&T) -> R + Sync,
        P: Fn(usize, usize) + Sync,
    {
        if items.is_empty() {
            return Vec::new();
        }
        let nb_workers = max_parallelism.max(1).min(items.len());
        let counter = ProgressCounter::new(items.len());
        //
        let (job_sender, job_receiver) = crossbeam_channel::bounded::<usize>(items.len());
        for rank in 0..items.len() {
            // cannot fail, channel has capacity for all ranks and receiver is alive
            let _ = job_sender.send(rank);
        }
        drop(job_sender);
        let (res_sender, res_receiver) = crossbeam_channel::unbounded::<(usize, R)>();
        //
        let work = &work;
        let progress = &progress;
        let counter = &counter;
        let scope_res = crossbeam_utils::thread::scope(|scope| {
            for _ in 0..nb_workers {
                let job_receiver = job_receiver.clone();
                let res_sender = res_sender.clone();
                scope.spawn(move |_| {
                    for rank in job_receiver.iter() {
                        let res = work(&items[rank]);
                        counter.tick(progress);
                        if res_sender.send((rank, res)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        if let Err(panic) = scope_res {
            std::panic::resume_unwind(panic);
        }
        drop(res_sender);
        // put results back in item order
        let mut slots: Vec<Option<R>> = (0..items.len()).map(|_| None).collect();
        for (rank, res) in res_receiver.iter() {
            slots[rank] = Some(res);
        }
        slots.into_iter().flatten().collect()
    } // end of run
}

//==========================================================================================

// end of mod tests
