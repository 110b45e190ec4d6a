pub mod devices;

use std::sync::mpsc::{Receiver, Sender};

use tokio::sync::oneshot;

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("device session is no longer accepting commands")]
    CommandChannelClosed,

    #[error("device session dropped the response to {command}")]
    ResponseDropped { command: &'static str },
}

/// A request executed on the thread that owns the device session.
pub trait Command: Send {
    type Response: Send;
    type Handler: DeviceHandler<Command = Self>;

    fn name(&self) -> &'static str;

    fn execute(self, handler: &mut Self::Handler) -> Self::Response;
}

pub trait DeviceHandler {
    type Command: Command<Handler = Self>;
}

pub struct GenericCommand<C: Command> {
    command: C,
    response_ch: oneshot::Sender<C::Response>,
}

impl<C: Command> GenericCommand<C> {
    pub fn new(command: C, response_ch: oneshot::Sender<C::Response>) -> Self {
        Self {
            command,
            response_ch,
        }
    }

    pub fn execute(self, handler: &mut C::Handler) -> Result<(), ExecutorError> {
        let name = self.command.name();
        let result = self.command.execute(handler);

        self.response_ch
            .send(result)
            .map_err(|_| ExecutorError::ResponseDropped { command: name })
    }
}

/// Runs commands one at a time against a blocking handler.
pub struct CommandExecutor<H: DeviceHandler + Send + 'static> {
    handler: H,
    commands_ch: Receiver<GenericCommand<H::Command>>,
    sender: Sender<GenericCommand<H::Command>>,
}

impl<H: DeviceHandler + Send> CommandExecutor<H> {
    pub fn new(handler: H) -> Self {
        let (sender, commands_ch) = std::sync::mpsc::channel();

        Self {
            handler,
            commands_ch,
            sender,
        }
    }

    pub fn sender(&self) -> CommandSender<H::Command> {
        CommandSender::new(self.sender.clone())
    }

    /// Returns once every sender is gone.
    pub fn run(self) -> H {
        let Self {
            mut handler,
            commands_ch,
            sender,
        } = self;
        drop(sender);

        while let Ok(command) = commands_ch.recv() {
            if let Err(e) = command.execute(&mut handler) {
                tracing::warn!("{}", e);
            }
        }

        handler
    }

    pub fn spawn(self) -> tokio::task::JoinHandle<H> {
        tokio::task::spawn_blocking(move || self.run())
    }
}

pub struct CommandSender<C: Command> {
    commands_ch: Sender<GenericCommand<C>>,
}

impl<C: Command> Clone for CommandSender<C> {
    fn clone(&self) -> Self {
        Self {
            commands_ch: self.commands_ch.clone(),
        }
    }
}

impl<C: Command> CommandSender<C> {
    pub fn new(commands_ch: Sender<GenericCommand<C>>) -> Self {
        Self { commands_ch }
    }

    pub async fn send_command(&self, command: C) -> Result<C::Response, ExecutorError> {
        let name = command.name();
        let (response_ch, response_rx) = oneshot::channel();
        let command = GenericCommand::new(command, response_ch);

        self.commands_ch
            .send(command)
            .map_err(|_| ExecutorError::CommandChannelClosed)?;

        response_rx
            .await
            .map_err(|_| ExecutorError::ResponseDropped { command: name })
    }
}
