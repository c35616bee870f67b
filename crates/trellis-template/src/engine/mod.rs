//! Thread-confined template engine.
//!
//! Compiled templates live on a single engine thread. [`EngineHandle`] is a
//! cheap, cloneable handle that submits compile and render jobs to that
//! thread over a channel and blocks until the reply arrives. Request threads
//! never touch compiled templates directly.
//!
//! The engine thread exits once every handle has been dropped or
//! [`EngineHandle::shutdown`] is called. Calls made after that fail with
//! [`EngineError::Disconnected`]. Calls made from the engine thread itself,
//! for example by a node rendering another view while a template reads its
//! properties, fail with [`EngineError::Reentrant`] instead of waiting on a
//! reply the engine can never send.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, ThreadId};

use thiserror::Error;
use tracing::{debug, trace, warn};
use trellis::Node;
use trellis::script::{RenderContext, ScriptError};

use crate::language::{CompiledTemplate, TemplateLanguage};

/// Tracing target for engine operations.
pub(crate) const ENGINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::engine");

const ENGINE_THREAD_NAME: &str = "trellis-template-engine";

/// Identifier of a template compiled on the engine thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId(u64);

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inputs for rendering one template.
#[derive(Debug, Clone)]
pub struct RenderJob {
    context: RenderContext,
    target: Arc<dyn Node>,
}

impl RenderJob {
    /// Creates a job rendering `target` with the given request context.
    #[must_use]
    pub const fn new(context: RenderContext, target: Arc<dyn Node>) -> Self {
        Self { context, target }
    }
}

/// Errors reported by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine thread could not be started.
    #[error("failed to start template engine thread: {0}")]
    Spawn(#[source] Arc<io::Error>),
    /// The engine thread is no longer running.
    #[error("template engine thread is not running")]
    Disconnected,
    /// A job was submitted from the engine thread while it was busy.
    #[error("template engine cannot be re-entered from a rendering template")]
    Reentrant,
    /// The template was released or never compiled by this engine.
    #[error("unknown template {0}")]
    UnknownTemplate(TemplateId),
    /// The template failed to compile or render.
    #[error(transparent)]
    Template(#[from] ScriptError),
}

impl From<EngineError> for ScriptError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Template(inner) => inner,
            EngineError::Reentrant => Self::execution(EngineError::Reentrant.to_string()),
            other => Self::engine(other.to_string()),
        }
    }
}

type Reply<T> = Sender<Result<T, EngineError>>;

enum Job {
    Compile {
        language: Arc<dyn TemplateLanguage>,
        resource: String,
        source: String,
        reply: Reply<TemplateId>,
    },
    Render {
        id: TemplateId,
        job: RenderJob,
        reply: Reply<String>,
    },
    Release {
        id: TemplateId,
    },
    Shutdown,
}

/// Handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    jobs: Sender<Job>,
    engine_thread: ThreadId,
}

impl EngineHandle {
    /// Starts a new engine thread.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Spawn`] if the thread cannot be created.
    pub fn spawn() -> Result<Self, EngineError> {
        let (jobs, queue) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(ENGINE_THREAD_NAME.to_owned())
            .spawn(move || run(&queue))
            .map_err(|error| EngineError::Spawn(Arc::new(error)))?;
        debug!(target: ENGINE_TARGET, "template engine started");
        Ok(Self {
            jobs,
            engine_thread: worker.thread().id(),
        })
    }

    /// Compiles `source` with `language` on the engine thread.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Template`] for a syntax error,
    /// [`EngineError::Disconnected`] if the engine has stopped, and
    /// [`EngineError::Reentrant`] when called from the engine thread.
    pub fn compile(
        &self,
        language: Arc<dyn TemplateLanguage>,
        resource: &str,
        source: String,
    ) -> Result<TemplateId, EngineError> {
        self.submit(|reply| Job::Compile {
            language,
            resource: resource.to_owned(),
            source,
            reply,
        })
    }

    /// Renders a compiled template on the engine thread.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Template`] when rendering faults,
    /// [`EngineError::UnknownTemplate`] for a released template,
    /// [`EngineError::Disconnected`] if the engine has stopped, and
    /// [`EngineError::Reentrant`] when called from the engine thread.
    pub fn render(&self, id: TemplateId, job: RenderJob) -> Result<String, EngineError> {
        self.submit(|reply| Job::Render { id, job, reply })
    }

    /// Discards a compiled template. Releasing after shutdown is a no-op.
    pub fn release(&self, id: TemplateId) {
        if self.jobs.send(Job::Release { id }).is_err() {
            trace!(target: ENGINE_TARGET, %id, "engine stopped before release");
        }
    }

    /// Asks the engine thread to stop once queued jobs are done.
    pub fn shutdown(&self) {
        if self.jobs.send(Job::Shutdown).is_err() {
            trace!(target: ENGINE_TARGET, "engine already stopped");
        }
    }

    fn submit<T>(&self, job: impl FnOnce(Reply<T>) -> Job) -> Result<T, EngineError> {
        if thread::current().id() == self.engine_thread {
            warn!(target: ENGINE_TARGET, "template engine re-entered from its own thread");
            return Err(EngineError::Reentrant);
        }
        let (reply, response) = mpsc::channel();
        self.jobs
            .send(job(reply))
            .map_err(|_| EngineError::Disconnected)?;
        response.recv().map_err(|_| EngineError::Disconnected)?
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle").finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Engine {
    templates: HashMap<TemplateId, Box<dyn CompiledTemplate>>,
    next_id: u64,
}

impl Engine {
    fn compile(
        &mut self,
        language: &dyn TemplateLanguage,
        resource: &str,
        source: &str,
    ) -> Result<TemplateId, EngineError> {
        let compiled = guard(resource, || language.compile(source))?;
        self.next_id += 1;
        let id = TemplateId(self.next_id);
        trace!(target: ENGINE_TARGET, %id, resource, language = language.name(), "compiled template");
        self.templates.insert(id, compiled);
        Ok(id)
    }

    fn render(&self, id: TemplateId, job: &RenderJob) -> Result<String, EngineError> {
        let template = self
            .templates
            .get(&id)
            .ok_or(EngineError::UnknownTemplate(id))?;
        guard(&id.to_string(), || {
            template.render(&job.context, job.target.as_ref())
        })
    }
}

/// Runs `work`, turning a panic into an execution error.
fn guard<T>(
    label: &str,
    work: impl FnOnce() -> Result<T, ScriptError>,
) -> Result<T, EngineError> {
    match panic::catch_unwind(AssertUnwindSafe(work)) {
        Ok(result) => result.map_err(EngineError::Template),
        Err(_) => {
            warn!(target: ENGINE_TARGET, template = label, "template panicked");
            Err(EngineError::Template(ScriptError::execution(format!(
                "template {label} panicked"
            ))))
        }
    }
}

fn run(queue: &Receiver<Job>) {
    let mut engine = Engine::default();
    for job in queue {
        match job {
            Job::Compile {
                language,
                resource,
                source,
                reply,
            } => {
                let result = engine.compile(language.as_ref(), &resource, &source);
                if reply.send(result).is_err() {
                    trace!(target: ENGINE_TARGET, resource, "compile caller went away");
                }
            }
            Job::Render { id, job, reply } => {
                if reply.send(engine.render(id, &job)).is_err() {
                    trace!(target: ENGINE_TARGET, %id, "render caller went away");
                }
            }
            Job::Release { id } => {
                engine.templates.remove(&id);
            }
            Job::Shutdown => break,
        }
    }
    debug!(
        target: ENGINE_TARGET,
        templates = engine.templates.len(),
        "template engine stopped"
    );
}
