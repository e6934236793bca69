//! # Bot Host
//!
//! Owns the gateway session, the command prefix rule and everything extensions
//! register. During loading extensions call into `&mut BotHost`; `run` then freezes
//! the registrations, starts the gateway and processes events until a stop
//! condition. The host never releases the scheduler it runs on.

use anyhow::Result;
use async_trait::async_trait;
use futures::future::{self, BoxFuture};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinError;

use crate::application::router::{CommandInfo, CommandTable, Router};
use crate::application::scheduler::SchedulerHandle;
use crate::domain::config::BotConfiguration;
use crate::domain::traits::{ChatProvider, Gateway, Session};
use crate::domain::types::{BotEvent, EventKind, ExtensionName, HostExit};
use crate::strings::logs;

/// Capacity of the gateway -> host event channel.
pub const EVENT_BUFFER: usize = 256;

/// Body of a command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn call(&self, ctx: CommandContext) -> Result<()>;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(CommandContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn call(&self, ctx: CommandContext) -> Result<()> {
        (self)(ctx).await
    }
}

/// Reacts to gateway events.
#[async_trait]
pub trait Listener: Send + Sync {
    async fn on_event(&self, event: BotEvent, host: HostHandle) -> Result<()>;
}

#[async_trait]
impl<F, Fut> Listener for F
where
    F: Fn(BotEvent, HostHandle) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn on_event(&self, event: BotEvent, host: HostHandle) -> Result<()> {
        (self)(event, host).await
    }
}

pub struct Command {
    pub name: String,
    pub aliases: Vec<String>,
    pub help: String,
    pub hidden: bool,
    pub owner_only: bool,
    pub(crate) handler: Arc<dyn CommandHandler>,
}

impl Command {
    pub fn new<F, Fut>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::with_handler(name, handler)
    }

    pub fn with_handler(name: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            help: String::new(),
            hidden: false,
            owner_only: false,
            handler: Arc::new(handler),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn owner_only(mut self) -> Self {
        self.owner_only = true;
        self
    }
}

/// Everything a command handler gets for one invocation.
#[derive(Clone)]
pub struct CommandContext {
    pub chat: Arc<dyn ChatProvider>,
    pub sender: String,
    /// Text after the command name, trimmed.
    pub args: String,
    /// Name or alias the command was called with.
    pub invoked_with: String,
    pub host: HostHandle,
}

impl CommandContext {
    pub async fn send(&self, content: &str) -> Result<()> {
        self.chat
            .send_message(content)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!(e))
    }
}

struct HostShared {
    scheduler: SchedulerHandle,
    stop: Notify,
    extensions: OnceLock<Vec<ExtensionName>>,
    commands: OnceLock<Vec<CommandInfo>>,
}

/// Cloneable access to a host from extension code.
///
/// Extension and command lists are empty until the host starts running.
#[derive(Clone)]
pub struct HostHandle {
    shared: Arc<HostShared>,
}

impl HostHandle {
    /// Makes `run` return with `HostExit::Requested`.
    pub fn request_stop(&self) {
        tracing::info!("{}", logs::STOP_REQUESTED);
        self.shared.stop.notify_one();
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.shared.scheduler
    }

    pub fn extensions(&self) -> &[ExtensionName] {
        self.shared.extensions.get().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn commands(&self) -> &[CommandInfo] {
        self.shared.commands.get().map(Vec::as_slice).unwrap_or_default()
    }
}

pub struct BotHost {
    config: BotConfiguration,
    gateway: Box<dyn Gateway>,
    commands: CommandTable,
    listeners: HashMap<EventKind, Vec<Arc<dyn Listener>>>,
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    loaded: Vec<ExtensionName>,
    shared: Arc<HostShared>,
    handle_signals: bool,
}

impl BotHost {
    pub fn new(config: BotConfiguration, gateway: Box<dyn Gateway>, scheduler: SchedulerHandle) -> Self {
        Self {
            config,
            gateway,
            commands: CommandTable::default(),
            listeners: HashMap::new(),
            services: HashMap::new(),
            loaded: Vec::new(),
            shared: Arc::new(HostShared {
                scheduler,
                stop: Notify::new(),
                extensions: OnceLock::new(),
                commands: OnceLock::new(),
            }),
            handle_signals: true,
        }
    }

    /// Whether Ctrl-C stops the run loop.
    pub fn with_signal_handling(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    pub fn configuration(&self) -> &BotConfiguration {
        &self.config
    }

    pub fn handle(&self) -> HostHandle {
        HostHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn add_command(&mut self, command: Command) {
        let name = command.name.clone();
        if self.commands.insert(command) {
            tracing::warn!("{}", logs::command_replaced(&name));
        }
    }

    pub fn add_listener<F, Fut>(&mut self, kind: EventKind, listener: F)
    where
        F: Fn(BotEvent, HostHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.add_listener_handler(kind, listener);
    }

    pub fn add_listener_handler(&mut self, kind: EventKind, listener: impl Listener + 'static) {
        self.listeners.entry(kind).or_default().push(Arc::new(listener));
    }

    /// Attaches a background task. It starts once the scheduler is driven (Running).
    pub fn spawn_task<F>(&mut self, name: &str, task: F) -> bool
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let task_name = name.to_string();
        self.shared
            .scheduler
            .spawn(name, async move {
                if let Err(e) = task.await {
                    tracing::error!("{}", logs::task_failed(&task_name, &format!("{e:#}")));
                }
            })
            .is_some()
    }

    /// Makes `service` available to extensions loaded later.
    pub fn provide_service<T: Any + Send + Sync>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), service);
    }

    pub fn service<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|service| service.downcast::<T>().ok())
    }

    pub(crate) fn record_loaded(&mut self, name: ExtensionName) {
        self.loaded.push(name);
    }

    /// Extensions attached so far, in load order.
    pub fn loaded(&self) -> &[ExtensionName] {
        &self.loaded
    }

    /// Processes gateway events until stopped, then returns why.
    ///
    /// Consumes the host: the session and every registration are dropped before
    /// this future completes, so their teardown runs on the still-live scheduler.
    pub async fn run(self) -> HostExit {
        let BotHost {
            config,
            gateway,
            commands,
            listeners,
            services: _,
            loaded,
            shared,
            handle_signals,
        } = self;

        let _ = shared.commands.set(commands.summaries());
        let _ = shared.extensions.set(loaded);
        let handle = HostHandle {
            shared: shared.clone(),
        };
        let mut router = Router::new(config.prefix, config.owner, commands, listeners, handle);

        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let session = Session {
            token: config.token,
            intents: config.intents,
        };
        let Some(mut gateway_task) = shared.scheduler.spawn("gateway", gateway.run(session, tx)) else {
            return HostExit::Failed(logs::GATEWAY_NOT_STARTED.to_string());
        };

        let mut interrupt: BoxFuture<'static, ()> = if handle_signals {
            Box::pin(wait_for_interrupt())
        } else {
            Box::pin(future::pending())
        };

        tracing::info!("{}", logs::HOST_RUNNING);
        let exit = loop {
            tokio::select! {
                biased;
                _ = shared.stop.notified() => break HostExit::Requested,
                _ = &mut interrupt => break HostExit::Interrupted,
                event = rx.recv() => match event {
                    Some(event) => router.dispatch(event),
                    // Every sender is gone: the gateway is finished or about to be.
                    None => break gateway_exit((&mut gateway_task).await),
                },
                result = &mut gateway_task => break gateway_exit(result),
            }
        };

        if !gateway_task.is_finished() {
            gateway_task.abort();
        }
        drop(router);
        // A framework would close its loop here; the lifecycle owner suppresses that.
        shared.scheduler.request_close();
        exit
    }
}

fn gateway_exit(result: Result<Result<()>, JoinError>) -> HostExit {
    match result {
        Ok(Ok(())) => HostExit::Disconnected,
        Ok(Err(e)) => HostExit::Failed(format!("{e:#}")),
        Err(e) => HostExit::Failed(e.to_string()),
    }
}

async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("{}", logs::shutdown_fail(&e.to_string()));
        future::pending::<()>().await;
    }
}
