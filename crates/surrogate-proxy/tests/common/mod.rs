//! Hand-written proxies shared by the integration tests.
//!
//! Each proxy forwards every method to its interceptor. Methods with a real
//! implementation pass it as the base thunk, holding only a weak handle back to
//! the proxy so the thunk stays `'static`.

#![allow(dead_code, reason = "Not every test binary uses every proxy")]

use core::result::Result as CoreResult;
use std::sync::{Arc, Mutex, Weak};

use surrogate_core::{CallError, Error, IgnoreLock as _, MethodIdentity, Value};
use surrogate_proxy::{ForwardingInterceptor, Interceptable, ProxyFactory, ProxyKind, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt as _, registry, util::SubscriberInitExt as _,
};

/// Result of a proxied method
pub type Outcome<T> = CoreResult<T, CallError>;

/// Initialize tracing for tests
pub fn init_tracing() {
    drop(
        registry()
            .with(fmt::layer().with_test_writer().with_target(false))
            .with(EnvFilter::from_default_env())
            .try_init(),
    );
}

fn upgrade<T>(this: &Weak<T>) -> Outcome<Arc<T>> {
    this.upgrade()
        .ok_or_else(|| Error::BaseUnavailable("proxy was dropped".to_owned()).into())
}

// Form: a template method over two methods without implementations.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormResult {
    pub is_valid: bool,
    pub is_complete: bool,
}

pub trait Form: Send + Sync {
    fn submit(&self) -> Outcome<FormResult>;
    fn validate(&self) -> Outcome<FormResult>;
    fn save(&self) -> Outcome<()>;
}

pub fn form_submit() -> MethodIdentity {
    MethodIdentity::builder::<dyn Form>("submit")
        .returns::<FormResult>()
        .build()
}

pub fn form_validate() -> MethodIdentity {
    MethodIdentity::builder::<dyn Form>("validate")
        .returns::<FormResult>()
        .build()
}

pub fn form_save() -> MethodIdentity {
    MethodIdentity::builder::<dyn Form>("save").build()
}

pub struct FormProxy {
    interceptor: Arc<ForwardingInterceptor>,
    this: Weak<FormProxy>,
}

impl Form for FormProxy {
    fn submit(&self) -> Outcome<FormResult> {
        let this = Weak::clone(&self.this);
        self.interceptor
            .call_with_base(form_submit(), Vec::new(), move || {
                let form = upgrade(&this)?;
                let mut result = form.validate()?;
                if result.is_valid {
                    form.save()?;
                    result.is_complete = true;
                }
                Ok(result)
            })
    }

    fn validate(&self) -> Outcome<FormResult> {
        self.interceptor.call(form_validate(), Vec::new())
    }

    fn save(&self) -> Outcome<()> {
        self.interceptor.call(form_save(), Vec::new())
    }
}

impl Interceptable for FormProxy {
    fn interceptor(&self) -> &Arc<ForwardingInterceptor> {
        &self.interceptor
    }
}

pub struct FormFactory;

impl ProxyFactory for FormFactory {
    type Proxy = Arc<FormProxy>;
    type Target = ();

    fn kind(&self) -> ProxyKind {
        ProxyKind::Class
    }

    fn generate_proxy(&self, interceptor: Arc<ForwardingInterceptor>) -> Result<Self::Proxy> {
        Ok(Arc::new_cyclic(|this| FormProxy {
            interceptor,
            this: Weak::clone(this),
        }))
    }

    fn generate_proxy_for_target(
        &self,
        interceptor: Arc<ForwardingInterceptor>,
        _target: (),
    ) -> Result<Self::Proxy> {
        self.generate_proxy(interceptor)
    }
}

// SummingReader: a template method over an overridable file read.

pub trait SummingReader: Send + Sync {
    fn read(&self) -> Outcome<i32>;
    fn read_file(&self) -> Outcome<String>;
}

pub fn reader_read() -> MethodIdentity {
    MethodIdentity::builder::<dyn SummingReader>("read")
        .returns::<i32>()
        .build()
}

pub fn reader_read_file() -> MethodIdentity {
    MethodIdentity::builder::<dyn SummingReader>("read_file")
        .returns::<String>()
        .build()
}

pub struct SummingReaderProxy {
    interceptor: Arc<ForwardingInterceptor>,
    this: Weak<SummingReaderProxy>,
}

impl SummingReader for SummingReaderProxy {
    fn read(&self) -> Outcome<i32> {
        let this = Weak::clone(&self.this);
        self.interceptor
            .call_with_base(reader_read(), Vec::new(), move || {
                let contents = upgrade(&this)?.read_file()?;
                contents
                    .split(',')
                    .map(|number| number.trim().parse::<i32>())
                    .sum::<CoreResult<i32, _>>()
                    .map_err(CallError::raised)
            })
    }

    fn read_file(&self) -> Outcome<String> {
        self.interceptor
            .call_with_base(reader_read_file(), Vec::new(), || {
                Ok("the result of reading the file here".to_owned())
            })
    }
}

pub struct SummingReaderFactory;

impl ProxyFactory for SummingReaderFactory {
    type Proxy = Arc<SummingReaderProxy>;
    type Target = ();

    fn kind(&self) -> ProxyKind {
        ProxyKind::Class
    }

    fn generate_proxy(&self, interceptor: Arc<ForwardingInterceptor>) -> Result<Self::Proxy> {
        Ok(Arc::new_cyclic(|this| SummingReaderProxy {
            interceptor,
            this: Weak::clone(this),
        }))
    }

    fn generate_proxy_for_target(
        &self,
        interceptor: Arc<ForwardingInterceptor>,
        _target: (),
    ) -> Result<Self::Proxy> {
        self.generate_proxy(interceptor)
    }
}

// TaskList: a class with state, usable as a spy or as a wrapper around a real list.

pub trait TaskList: Send + Sync {
    fn add(&self, task: &str) -> Outcome<()>;
    fn to_array(&self) -> Outcome<Vec<String>>;
}

pub fn task_list_add() -> MethodIdentity {
    MethodIdentity::builder::<dyn TaskList>("add")
        .param::<String>()
        .build()
}

pub fn task_list_to_array() -> MethodIdentity {
    MethodIdentity::builder::<dyn TaskList>("to_array")
        .returns::<Vec<String>>()
        .build()
}

/// Real task list
#[derive(Debug, Default)]
pub struct InMemoryTaskList {
    tasks: Mutex<Vec<String>>,
}

impl TaskList for InMemoryTaskList {
    fn add(&self, task: &str) -> Outcome<()> {
        self.tasks.with_lock(|tasks| tasks.push(task.to_owned()));
        Ok(())
    }

    fn to_array(&self) -> Outcome<Vec<String>> {
        Ok(self.tasks.with_lock(|tasks| tasks.clone()))
    }
}

pub struct TaskListProxy {
    interceptor: Arc<ForwardingInterceptor>,
    inner: Arc<dyn TaskList>,
}

impl TaskList for TaskListProxy {
    fn add(&self, task: &str) -> Outcome<()> {
        let inner = Arc::clone(&self.inner);
        let task = task.to_owned();
        self.interceptor.call_with_base(
            task_list_add(),
            vec![Value::new(task.clone())],
            move || inner.add(&task),
        )
    }

    fn to_array(&self) -> Outcome<Vec<String>> {
        let inner = Arc::clone(&self.inner);
        self.interceptor
            .call_with_base(task_list_to_array(), Vec::new(), move || inner.to_array())
    }
}

pub struct TaskListFactory;

impl ProxyFactory for TaskListFactory {
    type Proxy = Arc<TaskListProxy>;
    type Target = Arc<dyn TaskList>;

    fn kind(&self) -> ProxyKind {
        ProxyKind::Class
    }

    fn generate_proxy(&self, interceptor: Arc<ForwardingInterceptor>) -> Result<Self::Proxy> {
        self.generate_proxy_for_target(interceptor, Arc::new(InMemoryTaskList::default()))
    }

    fn generate_proxy_for_target(
        &self,
        interceptor: Arc<ForwardingInterceptor>,
        target: Arc<dyn TaskList>,
    ) -> Result<Self::Proxy> {
        Ok(Arc::new(TaskListProxy {
            interceptor,
            inner: target,
        }))
    }
}

/// Consumer of a task list
pub struct TaskView {
    tasks: Arc<dyn TaskList>,
    pub task_entry_field: String,
    pub displayed_tasks: Vec<String>,
}

impl TaskView {
    pub fn new(tasks: Arc<dyn TaskList>) -> Self {
        Self {
            tasks,
            task_entry_field: String::new(),
            displayed_tasks: Vec::new(),
        }
    }

    pub fn click_button(&mut self) -> Outcome<()> {
        self.tasks.add(&self.task_entry_field)?;
        self.displayed_tasks = self.tasks.to_array()?;
        Ok(())
    }
}

// Logger: an interface with no implementations.

pub struct LoggerFactory;

impl ProxyFactory for LoggerFactory {
    type Proxy = Arc<ForwardingInterceptor>;
    type Target = ();

    fn kind(&self) -> ProxyKind {
        ProxyKind::Interface
    }

    fn generate_proxy(&self, interceptor: Arc<ForwardingInterceptor>) -> Result<Self::Proxy> {
        Ok(interceptor)
    }

    fn generate_proxy_for_target(
        &self,
        interceptor: Arc<ForwardingInterceptor>,
        _target: (),
    ) -> Result<Self::Proxy> {
        Ok(interceptor)
    }
}
