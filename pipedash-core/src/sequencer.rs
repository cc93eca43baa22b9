//! Operation sequencing
//!
//! The [`Controller`] owns the [`ViewModel`] and is the only thing that writes
//! to it. Network work runs in tokio tasks that never see the model; each task
//! posts [`Update`]s over a channel, and the presentation loop applies them by
//! calling [`Controller::pump`].
//!
//! Mutating operations (send message, run pipeline, clear context) share one
//! busy flag. While an operation is in flight the other triggers are ignored
//! and issue no network call. Every mutating task holds a guard that
//! posts [`Update::Settled`] when the task ends, whether it returned, panicked
//! or was aborted. That update is what releases the flag.
//!
//! ```text
//!        send / run / clear
//!   Idle ───────────────────▶ Busy(op)
//!    ▲                          │
//!    └──────── Settled(op) ◀────┘
//! ```

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::chart::ChartHandle;
use crate::error::Result;
use crate::gateway::Gateway;
use crate::schema::ColumnStrategy;
use crate::transcript::parse_transcript;
use crate::types::{ChatOutcome, GeneratedDataItem, Message, Operation, ReportRow, ServerStatus, Tab};
use crate::view_model::ViewModel;

/// Notice shown when the pipeline call never produced a status message.
pub const PIPELINE_FAILED_NOTICE: &str = "Erro ao executar pipeline.";

/// Notice shown when the clear-context call never produced a status message.
pub const CLEAR_FAILED_NOTICE: &str = "Erro ao limpar contexto.";

/// What a trigger did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The operation was started
    Started,
    /// Nothing happened
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another operation is in flight
    Busy(Operation),
    /// The message was empty or whitespace
    EmptyInput,
}

/// A change posted by a background task.
///
/// Updates that touch the conversation or generated data carry the reset
/// generation captured when their task was dispatched.
#[derive(Debug)]
pub enum Update {
    History {
        generation: u64,
        result: Result<Option<String>>,
    },
    Report(Result<Vec<ReportRow>>),
    Chart(Option<ChartHandle>),
    GeneratedData {
        generation: u64,
        result: Result<Vec<GeneratedDataItem>>,
    },
    Reply {
        generation: u64,
        message: Message,
    },
    Notice(String),
    ContextCleared,
    Status(ServerStatus),
    /// Last update of every mutating task
    Settled(Operation),
}

/// Posts [`Update::Settled`] for its operation when dropped.
///
/// Declared first in a task body, it drops after every other update the task
/// posts, and during unwinding if the task panics.
struct SettleGuard {
    tx: mpsc::UnboundedSender<Update>,
    operation: Operation,
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(Update::Settled(self.operation));
    }
}

/// Owner of the view model and dispatcher of operations.
pub struct Controller {
    gateway: Gateway,
    model: ViewModel,
    tx: mpsc::UnboundedSender<Update>,
    rx: mpsc::UnboundedReceiver<Update>,
    tasks: JoinSet<()>,
}

impl Controller {
    pub fn new(gateway: Gateway, column_strategy: ColumnStrategy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            model: ViewModel::new(column_strategy),
            tx,
            rx,
            tasks: JoinSet::new(),
        }
    }

    /// Read-only view for rendering
    pub fn model(&self) -> &ViewModel {
        &self.model
    }

    /// Number of tasks still tracked
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    // ========== Reads ==========

    /// Start the four independent reads plus a status probe.
    ///
    /// Must be called from within a tokio runtime.
    pub fn load_all(&mut self) {
        tracing::debug!(generation = self.model.generation(), "Loading dashboard data");
        let generation = self.model.generation();

        let (gateway, tx) = self.handles();
        self.tasks.spawn(async move {
            let result = gateway.fetch_history().await;
            let _ = tx.send(Update::History { generation, result });
        });

        let (gateway, tx) = self.handles();
        self.tasks.spawn(async move {
            let _ = tx.send(Update::Report(gateway.fetch_report().await));
        });

        let (gateway, tx) = self.handles();
        self.tasks.spawn(async move {
            let _ = tx.send(Update::Chart(gateway.fetch_chart().await));
        });

        let (gateway, tx) = self.handles();
        self.tasks.spawn(async move {
            let result = gateway.fetch_generated_data().await;
            let _ = tx.send(Update::GeneratedData { generation, result });
        });

        self.spawn_status_check();
    }

    /// Re-run every read. Ignored while an operation is in flight, since a
    /// history reload would overwrite the optimistic user message.
    pub fn refresh(&mut self) -> Dispatch {
        if let Some(op) = self.model.in_flight() {
            return Dispatch::Ignored(IgnoreReason::Busy(op));
        }
        self.load_all();
        Dispatch::Started
    }

    fn spawn_status_check(&mut self) {
        let (gateway, tx) = self.handles();
        self.tasks.spawn(async move {
            let _ = tx.send(Update::Status(gateway.check_status().await));
        });
    }

    // ========== Mutating operations ==========

    /// Send the pending input as a chat message.
    pub fn send_message(&mut self) -> Dispatch {
        if let Some(op) = self.model.in_flight() {
            return Dispatch::Ignored(IgnoreReason::Busy(op));
        }
        if self.model.input().trim().is_empty() {
            return Dispatch::Ignored(IgnoreReason::EmptyInput);
        }

        let text = self.model.take_input();
        self.model.push_message(Message::user(text.clone()));
        let settle = self.begin(Operation::SendMessage);

        let generation = self.model.generation();
        let (gateway, tx) = self.handles();
        self.tasks.spawn(async move {
            let _settle = settle;
            let reply = match gateway.send_message(&text).await {
                ChatOutcome::Reply(reply) => Some(reply),
                ChatOutcome::NoReply => None,
                ChatOutcome::Rejected(detail) => Some(format!("Erro: {}", detail)),
                ChatOutcome::Transport(error) => Some(format!("Erro de conexão: {}", error)),
            };
            if let Some(reply) = reply {
                let _ = tx.send(Update::Reply {
                    generation,
                    message: Message::assistant(reply),
                });
            }

            let result = gateway.fetch_generated_data().await;
            let _ = tx.send(Update::GeneratedData { generation, result });
        });

        Dispatch::Started
    }

    /// Run the pipeline, then reload its report and chart.
    pub fn run_pipeline(&mut self) -> Dispatch {
        if let Some(op) = self.model.in_flight() {
            return Dispatch::Ignored(IgnoreReason::Busy(op));
        }
        let settle = self.begin(Operation::RunPipeline);

        let (gateway, tx) = self.handles();
        self.tasks.spawn(async move {
            let _settle = settle;
            let notice = gateway
                .run_pipeline()
                .await
                .unwrap_or_else(|_| PIPELINE_FAILED_NOTICE.to_string());
            let _ = tx.send(Update::Notice(notice));

            let _ = tx.send(Update::Report(gateway.fetch_report().await));
            let _ = tx.send(Update::Chart(gateway.fetch_chart().await));
        });

        Dispatch::Started
    }

    /// Clear the assistant's context. The local conversation and generated
    /// data are emptied whatever the server says.
    pub fn clear_context(&mut self) -> Dispatch {
        if let Some(op) = self.model.in_flight() {
            return Dispatch::Ignored(IgnoreReason::Busy(op));
        }
        let settle = self.begin(Operation::ClearContext);

        let (gateway, tx) = self.handles();
        self.tasks.spawn(async move {
            let _settle = settle;
            let notice = gateway
                .clear_context()
                .await
                .unwrap_or_else(|_| CLEAR_FAILED_NOTICE.to_string());
            let _ = tx.send(Update::Notice(notice));
            let _ = tx.send(Update::ContextCleared);
        });

        Dispatch::Started
    }

    /// Enter Busy. The returned guard must move into the operation's task.
    fn begin(&mut self, operation: Operation) -> SettleGuard {
        tracing::info!(operation = operation.label(), "Operation started");
        self.model.set_in_flight(Some(operation));
        SettleGuard {
            tx: self.tx.clone(),
            operation,
        }
    }

    fn handles(&self) -> (Gateway, mpsc::UnboundedSender<Update>) {
        (self.gateway.clone(), self.tx.clone())
    }

    // ========== Local edits ==========

    pub fn select_tab(&mut self, tab: Tab) {
        self.model.set_active_tab(tab);
    }

    pub fn next_tab(&mut self) {
        self.select_tab(self.model.active_tab().next());
    }

    pub fn previous_tab(&mut self) {
        self.select_tab(self.model.active_tab().previous());
    }

    pub fn input_push(&mut self, c: char) {
        self.model.input_mut().push(c);
    }

    pub fn input_pop(&mut self) {
        self.model.input_mut().pop();
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        *self.model.input_mut() = text.into();
    }

    pub fn dismiss_notice(&mut self) {
        self.model.set_notice(None);
    }

    // ========== Applying updates ==========

    /// Apply every queued update without blocking. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        self.reap();

        let mut applied = 0;
        while let Ok(update) = self.rx.try_recv() {
            self.apply(update);
            applied += 1;
        }
        applied
    }

    /// Wait for every tracked task, then apply what they posted.
    pub async fn settle(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Background task failed");
            }
        }
        self.pump();
    }

    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next() {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Background task failed");
            }
        }
    }

    fn apply(&mut self, update: Update) {
        let current = self.model.generation();
        match update {
            Update::History { generation, .. }
            | Update::GeneratedData { generation, .. }
            | Update::Reply { generation, .. }
                if generation != current =>
            {
                tracing::debug!(generation, current, "Discarding stale update");
            }
            Update::History { result, .. } => match result {
                Ok(Some(transcript)) if !transcript.trim().is_empty() => {
                    let messages = parse_transcript(Some(transcript.as_str()));
                    tracing::debug!(messages = messages.len(), "Loaded chat history");
                    self.model.replace_conversation(messages);
                }
                // No history on the server yet; local messages stay
                Ok(_) => tracing::debug!("Empty chat history, keeping conversation"),
                Err(_) => tracing::debug!("Keeping previous conversation"),
            },
            Update::Report(result) => match result {
                Ok(rows) => {
                    tracing::debug!(rows = rows.len(), "Loaded pipeline report");
                    self.model.replace_report(rows);
                }
                Err(_) => tracing::debug!("Keeping previous report"),
            },
            Update::Chart(chart) => self.model.replace_chart(chart),
            Update::GeneratedData { result, .. } => match result {
                Ok(items) => {
                    tracing::debug!(items = items.len(), "Loaded chat data");
                    self.model.replace_generated(items);
                }
                Err(_) => tracing::debug!("Keeping previous chat data"),
            },
            Update::Reply { message, .. } => self.model.push_message(message),
            Update::Notice(text) => self.model.set_notice(Some(text)),
            Update::ContextCleared => self.model.reset_context(),
            Update::Status(status) => self.model.set_status(status),
            Update::Settled(operation) => {
                tracing::info!(operation = operation.label(), "Operation settled");
                self.model.set_in_flight(None);
            }
        }
    }
}
