//! The UI-affine executor.
//!
//! All native-view mutation happens on one dedicated thread that owns the
//! [`HostTree`]. Entering that context is always an explicit hop: callers
//! submit closures with [`UiDispatcher::post`] (fire-and-forget) or
//! [`UiDispatcher::run`] (round-trip). When the caller is already on the UI
//! thread and no task is mid-flight, the closure executes in place instead
//! of going through the queue.

use std::cell::RefCell;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Sender, bounded, unbounded};
use parking_lot::Mutex;

use crate::tree::HostTree;

type UiTask = Box<dyn FnOnce(&mut HostTree) + Send>;

enum Msg {
    Task(UiTask),
    Shutdown,
}

thread_local! {
    // The host is parked here while the UI thread is idle and taken out for
    // the duration of each task, so a nested fast-path attempt sees `None`
    // and falls back to the queue.
    static ACTIVE_HOST: RefCell<Option<HostTree>> = const { RefCell::new(None) };
}

pub struct UiDispatcher {
    tx: Sender<Msg>,
    ui_thread: ThreadId,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl UiDispatcher {
    pub fn spawn() -> Arc<UiDispatcher> {
        let (tx, rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);
        let join = thread::Builder::new()
            .name("casement-ui".into())
            .spawn(move || {
                ACTIVE_HOST.with(|slot| *slot.borrow_mut() = Some(HostTree::new()));
                ready_tx.send(thread::current().id()).ok();
                loop {
                    match rx.recv() {
                        Ok(Msg::Task(task)) => run_against_host(task),
                        Ok(Msg::Shutdown) | Err(_) => break,
                    }
                }
                ACTIVE_HOST.with(|slot| slot.borrow_mut().take());
            })
            .expect("failed to spawn the UI thread");
        let ui_thread = ready_rx.recv().expect("UI thread did not start");
        Arc::new(UiDispatcher {
            tx,
            ui_thread,
            join: Mutex::new(Some(join)),
        })
    }

    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.ui_thread
    }

    /// Fire-and-forget submission. Tasks run in submission order; a task
    /// posted from within a task runs after the current one completes.
    pub fn post(&self, task: impl FnOnce(&mut HostTree) + Send + 'static) {
        let mut pending: UiTask = Box::new(task);
        if self.is_ui_thread() {
            match try_run_fast(pending) {
                Ok(()) => return,
                Err(back) => pending = back,
            }
        }
        let _ = self.tx.send(Msg::Task(pending));
    }

    /// Runs the closure on the UI thread and returns its result, blocking
    /// the caller until it completes.
    ///
    /// # Panics
    /// When called from within a task already running on the UI thread:
    /// blocking there would deadlock the executor. Tasks already hold
    /// `&mut HostTree` and never need to re-enter.
    pub fn run<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut HostTree) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_ui_thread() {
            let host = ACTIVE_HOST.with(|slot| slot.borrow_mut().take());
            let Some(mut host) = host else {
                panic!("UiDispatcher::run re-entered from a UI task; use the task's &mut HostTree")
            };
            let result = f(&mut host);
            ACTIVE_HOST.with(|slot| *slot.borrow_mut() = Some(host));
            return result;
        }
        let (tx, rx) = bounded(1);
        let task: UiTask = Box::new(move |host| {
            let _ = tx.send(f(host));
        });
        let _ = self.tx.send(Msg::Task(task));
        rx.recv().expect("UI thread terminated while running a task")
    }
}

impl Drop for UiDispatcher {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(join) = self.join.lock().take() {
            let _ = join.join();
        }
    }
}

fn run_against_host(task: UiTask) {
    let host = ACTIVE_HOST.with(|slot| slot.borrow_mut().take());
    if let Some(mut host) = host {
        task(&mut host);
        ACTIVE_HOST.with(|slot| *slot.borrow_mut() = Some(host));
    }
}

fn try_run_fast(task: UiTask) -> Result<(), UiTask> {
    let host = ACTIVE_HOST.with(|slot| slot.borrow_mut().take());
    match host {
        Some(mut host) => {
            task(&mut host);
            ACTIVE_HOST.with(|slot| *slot.borrow_mut() = Some(host));
            Ok(())
        }
        None => Err(task),
    }
}
