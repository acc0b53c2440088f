//! In-order execution queue for the CPU device
//!
//! Each queue owns one worker thread that pulls jobs in submission order and
//! runs each job body inside the device's rayon pool, where the body fans out
//! over its index space. Work from different queues runs concurrently.
//!
//! ```text
//! host thread ──submit()──▶ mpsc ──▶ worker ──pool.install(body)──▶ rayon lanes
//!      ▲                                   │
//!      └──── CompletionTracker::wait ◀─────┘ finish() / fail()
//! ```

use crate::backend::{CompletionTracker, ExecutionQueue, Job};
use crate::error::{BackendError, Result};
use amp_tracing::performance::{record_dispatch, record_execution};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

struct QueuedJob {
    job: Job,
    completion: Arc<CompletionTracker>,
}

pub struct CpuQueue {
    id: u64,
    sender: Mutex<Option<Sender<QueuedJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Queue-wide tracker: pending == jobs not yet finished
    idle: Arc<CompletionTracker>,
    max_dispatch_elements: usize,
}

impl CpuQueue {
    pub fn new(id: u64, pool: Arc<rayon::ThreadPool>, max_dispatch_elements: usize) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<QueuedJob>();
        let idle = Arc::new(CompletionTracker::new());

        let worker = {
            let idle = Arc::clone(&idle);
            thread::Builder::new()
                .name(format!("amp-queue-{id}"))
                .spawn(move || {
                    while let Ok(queued) = receiver.recv() {
                        run_job(&pool, queued, &idle);
                    }
                    tracing::trace!(queue = id, "queue_worker_exit");
                })
                .map_err(|e| BackendError::InvalidConfig(format!("failed to spawn queue worker: {e}")))?
        };

        Ok(Self {
            id,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            idle,
            max_dispatch_elements,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    fn validate(&self, job: &Job) -> Result<()> {
        if job.elements == 0 {
            return Err(BackendError::rejected(format!("{}: empty index space", job.label)));
        }
        if job.elements > self.max_dispatch_elements {
            return Err(BackendError::rejected(format!(
                "{}: {} elements exceeds device limit of {}",
                job.label, job.elements, self.max_dispatch_elements
            )));
        }
        if let Some(fault) = self.idle.fault() {
            return Err(BackendError::AcceleratorFault(fault));
        }
        Ok(())
    }
}

impl ExecutionQueue for CpuQueue {
    fn submit(&self, job: Job) -> Result<Arc<CompletionTracker>> {
        self.validate(&job)?;

        let completion = Arc::new(CompletionTracker::new());
        completion.begin();
        for buffer in &job.touches {
            buffer.completion().begin();
        }
        self.idle.begin();

        let label = job.label.clone();
        let elements = job.elements;
        let queued = QueuedJob {
            job,
            completion: Arc::clone(&completion),
        };

        let sent = match self.sender.lock().as_ref() {
            Some(sender) => sender.send(queued).map_err(|mpsc::SendError(queued)| queued),
            None => Err(queued),
        };

        if let Err(queued) = sent {
            // Roll back so fences on the touched buffers do not hang.
            for buffer in &queued.job.touches {
                buffer.completion().finish();
            }
            queued.completion.finish();
            self.idle.finish();
            return Err(BackendError::QueueClosed);
        }

        record_dispatch(&label, elements, self.idle.pending());
        Ok(completion)
    }

    fn wait_idle(&self) -> Result<()> {
        self.idle.wait()
    }

    fn pending(&self) -> usize {
        self.idle.pending()
    }
}

impl Drop for CpuQueue {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued jobs and exit.
        self.sender.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                tracing::error!(queue = self.id, "queue worker panicked outside a job");
            }
        }
    }
}

fn run_job(pool: &rayon::ThreadPool, queued: QueuedJob, idle: &CompletionTracker) {
    let QueuedJob { job, completion } = queued;
    let Job {
        label,
        elements,
        touches,
        body,
    } = job;

    let start = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| pool.install(body)));

    match outcome {
        Ok(()) => {
            for buffer in &touches {
                buffer.completion().finish();
            }
            completion.finish();
            idle.finish();
            record_execution(&label, elements, start.elapsed().as_micros() as u64);
        }
        Err(payload) => {
            let message = format!("kernel `{label}` panicked: {}", panic_message(payload.as_ref()));
            tracing::error!(kernel = %label, elements, %message, "accelerator_fault");
            for buffer in &touches {
                buffer.completion().fail(message.clone());
            }
            completion.fail(message.clone());
            idle.fail(message);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BufferHandle, DeviceBuffer, StorageMode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn queue(limit: usize) -> CpuQueue {
        let pool = Arc::new(rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap());
        CpuQueue::new(7, pool, limit).unwrap()
    }

    #[test]
    fn test_jobs_run_in_submission_order() {
        let queue = queue(usize::MAX);
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..8 {
            let log = Arc::clone(&log);
            queue.submit(Job::new(format!("job{i}"), 1, move || log.lock().push(i))).unwrap();
        }
        queue.wait_idle().unwrap();

        assert_eq!(*log.lock(), (0..8).collect::<Vec<_>>());
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_buffer_tracker_held_until_job_finishes() {
        let queue = queue(usize::MAX);
        let buffer = Arc::new(DeviceBuffer::new(BufferHandle::new(1), 4, StorageMode::HostShared, None));
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let job = Job::new("blocked", 1, move || {
            release_rx.recv().ok();
        })
        .touching(Arc::clone(&buffer));
        let completion = queue.submit(job).unwrap();

        assert_eq!(buffer.completion().pending(), 1);
        release_tx.send(()).unwrap();
        buffer.completion().wait().unwrap();
        completion.wait().unwrap();
        assert!(buffer.completion().is_idle());
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        let queue = queue(4);
        assert!(matches!(
            queue.submit(Job::new("empty", 0, || {})),
            Err(BackendError::DispatchRejected(_))
        ));
        assert!(matches!(
            queue.submit(Job::new("big", 5, || {})),
            Err(BackendError::DispatchRejected(_))
        ));
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_panicking_job_faults_trackers() {
        let queue = queue(usize::MAX);
        let buffer = Arc::new(DeviceBuffer::new(BufferHandle::new(2), 4, StorageMode::DeviceOnly, None));

        let completion = queue
            .submit(Job::new("boom", 1, || panic!("lane 3 out of bounds")).touching(Arc::clone(&buffer)))
            .unwrap();

        let err = completion.wait().unwrap_err();
        assert!(err.is_fault());
        assert!(err.to_string().contains("lane 3 out of bounds"));
        assert!(buffer.completion().wait().is_err());

        // A faulted queue refuses further work.
        assert!(queue.submit(Job::new("after", 1, || {})).unwrap_err().is_fault());
    }

    #[test]
    fn test_body_runs_inside_pool() {
        let queue = queue(usize::MAX);
        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let observed = Arc::clone(&seen);
        queue
            .submit(Job::new("threads", 1, move || {
                observed.store(rayon::current_num_threads(), Ordering::SeqCst);
            }))
            .unwrap()
            .wait()
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
