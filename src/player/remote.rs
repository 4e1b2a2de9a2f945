//! Remote calls the coordinator makes on behalf of the current track.
//!
//! Requests return at once; their outcome arrives later as a
//! [`RemoteEvent`] on the attached listener, the same way the audio output
//! reports play outcomes.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::debug;

use crate::api::{ApiClient, ApiError, LikeAck, TrackId};

use super::output::RequestId;

#[derive(Debug)]
pub enum RemoteEvent {
    /// A like/unlike request finished; the ack carries the server's resulting state.
    Like {
        request: RequestId,
        track_id: TrackId,
        result: Result<LikeAck, ApiError>,
    },
    /// A download finished with the number of bytes written.
    Download {
        track_id: TrackId,
        dest: PathBuf,
        result: Result<u64, ApiError>,
    },
}

pub trait RemoteTracks {
    /// Deliver outcomes to `listener`. Replaces any earlier listener.
    fn attach(&mut self, listener: Sender<RemoteEvent>);

    /// Like (`true`) or unlike (`false`) a track.
    fn request_like(&mut self, track_id: TrackId, liked: bool) -> RequestId;

    /// Save the audio at `url` into `dest`.
    fn request_download(&mut self, track_id: TrackId, url: &str, dest: &Path);
}

enum Job {
    Attach(Sender<RemoteEvent>),
    Like {
        request: RequestId,
        track_id: TrackId,
        liked: bool,
    },
    Download {
        track_id: TrackId,
        url: String,
        dest: PathBuf,
    },
}

/// [`RemoteTracks`] backed by an [`ApiClient`] on a background thread.
///
/// Like requests run one after another so the server sees them in the order
/// they were made. Each download gets its own thread. Requests still running
/// when the worker is dropped are abandoned.
pub struct RemoteWorker {
    tx: Sender<Job>,
    next_request: u64,
}

impl RemoteWorker {
    pub fn spawn(client: ApiClient) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();
        thread::spawn(move || run_jobs(rx, client));
        Self { tx, next_request: 0 }
    }

    fn send(&self, job: Job) {
        if self.tx.send(job).is_err() {
            debug!("remote worker is gone, dropping request");
        }
    }
}

fn run_jobs(rx: Receiver<Job>, client: ApiClient) {
    let mut listener: Option<Sender<RemoteEvent>> = None;
    let deliver = |listener: &Option<Sender<RemoteEvent>>, event: RemoteEvent| {
        if let Some(tx) = listener {
            let _ = tx.send(event);
        }
    };

    for job in rx {
        match job {
            Job::Attach(tx) => listener = Some(tx),
            Job::Like {
                request,
                track_id,
                liked,
            } => {
                let result = if liked {
                    client.like(track_id)
                } else {
                    client.unlike(track_id)
                };
                deliver(
                    &listener,
                    RemoteEvent::Like {
                        request,
                        track_id,
                        result,
                    },
                );
            }
            Job::Download {
                track_id,
                url,
                dest,
            } => {
                let client = client.clone();
                let listener = listener.clone();
                thread::spawn(move || {
                    let result = client.download(&url, &dest);
                    deliver(
                        &listener,
                        RemoteEvent::Download {
                            track_id,
                            dest,
                            result,
                        },
                    );
                });
            }
        }
    }
}

impl RemoteTracks for RemoteWorker {
    fn attach(&mut self, listener: Sender<RemoteEvent>) {
        self.send(Job::Attach(listener));
    }

    fn request_like(&mut self, track_id: TrackId, liked: bool) -> RequestId {
        self.next_request += 1;
        let request = RequestId(self.next_request);
        self.send(Job::Like {
            request,
            track_id,
            liked,
        });
        request
    }

    fn request_download(&mut self, track_id: TrackId, url: &str, dest: &Path) {
        self.send(Job::Download {
            track_id,
            url: url.to_string(),
            dest: dest.to_path_buf(),
        });
    }
}
