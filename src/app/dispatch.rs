//! Off-thread execution of network and location work
//!
//! The UI thread never blocks on I/O. Jobs go to a small pool of worker
//! threads over a channel; each result comes back as a [`Completion`] on a
//! second channel, and a waker tells the UI loop to drain it. Jobs are
//! independent, so completions may arrive in any order.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::domain::geo::Coordinate;
use crate::domain::submission::SubmissionRequest;
use crate::net::{Acknowledgement, GeoLookup, LookupError, PromptSubmitter, SubmissionError};
use crate::platform::location::{GeolocationError, Geolocator};

/// Work the UI asks for
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    /// Probe the device position
    Locate,
    /// Resolve a city name
    Lookup { city: String },
    /// Forward a finalized selection
    Submit(SubmissionRequest),
}

/// Result of a [`Job`], delivered back to the UI thread
#[derive(Debug)]
pub enum Completion {
    Located(Result<Coordinate, GeolocationError>),
    LookedUp {
        city: String,
        result: Result<Coordinate, LookupError>,
    },
    Submitted {
        request: SubmissionRequest,
        result: Result<Acknowledgement, SubmissionError>,
    },
}

/// Anything that can accept jobs without blocking the caller
pub trait Dispatch {
    fn dispatch(&self, job: Job);

    /// Stops taking jobs and blocks until the ones already queued have run.
    /// Their completions stay queued for the shell to drain.
    fn shutdown(&mut self) {}
}

/// Called from a worker thread after a completion has been queued
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// The external collaborators jobs run against
#[derive(Clone)]
pub struct Services {
    pub geocoder: Arc<dyn GeoLookup>,
    pub submitter: Arc<dyn PromptSubmitter>,
    pub locator: Arc<dyn Geolocator>,
}

impl Services {
    /// Runs a job to completion on the calling thread
    pub fn run(&self, job: Job) -> Completion {
        match job {
            Job::Locate => Completion::Located(self.locator.current_position()),
            Job::Lookup { city } => {
                let result = self.geocoder.lookup(&city);
                Completion::LookedUp { city, result }
            }
            Job::Submit(request) => {
                let result = self.submitter.submit(&request);
                Completion::Submitted { request, result }
            }
        }
    }
}

/// Fixed-size pool of worker threads
pub struct WorkerPool {
    jobs: Option<Sender<Job>>,
    completions: Receiver<Completion>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `workers` threads (at least one)
    pub fn start(services: Services, workers: usize, waker: Waker) -> Self {
        let (job_tx, job_rx) = unbounded::<Job>();
        let (done_tx, done_rx) = unbounded::<Completion>();
        let mut handles = Vec::new();

        for index in 0..workers.max(1) {
            let jobs = job_rx.clone();
            let done = done_tx.clone();
            let services = services.clone();
            let waker = Arc::clone(&waker);

            let spawned = thread::Builder::new()
                .name(format!("map-prompt-worker-{index}"))
                .spawn(move || {
                    // Exits once every job sender is gone
                    for job in jobs.iter() {
                        log::debug!("Worker {} running {:?}", index, job);
                        if done.send(services.run(job)).is_err() {
                            break;
                        }
                        waker();
                    }
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => log::error!("Failed to spawn dispatcher worker {}: {}", index, err),
            }
        }

        Self {
            jobs: Some(job_tx),
            completions: done_rx,
            workers: handles,
        }
    }

    /// Receiving end for completions, drained by the UI loop
    pub fn completions(&self) -> Receiver<Completion> {
        self.completions.clone()
    }
}

impl Dispatch for WorkerPool {
    fn dispatch(&self, job: Job) {
        let Some(jobs) = &self.jobs else {
            log::error!("Dispatcher is shut down, dropping {:?}", job);
            return;
        };
        if let Err(err) = jobs.send(job) {
            log::error!("Dispatcher is shut down, dropping {:?}", err.into_inner());
        }
    }

    fn shutdown(&mut self) {
        // Workers leave their loop once the queue is closed and empty
        self.jobs = None;
        let workers = std::mem::take(&mut self.workers);
        if !workers.is_empty() {
            log::debug!("Waiting for {} dispatcher workers", workers.len());
        }
        for handle in workers {
            if handle.join().is_err() {
                log::error!("Dispatcher worker panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
