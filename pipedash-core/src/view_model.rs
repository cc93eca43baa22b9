//! In-memory aggregate the dashboard renders from
//!
//! The presentation layer only reads a [`ViewModel`]. Every write goes through
//! the [`Controller`](crate::sequencer::Controller), which owns the single
//! instance for the lifetime of the session.

use crate::chart::ChartHandle;
use crate::schema::{infer_columns_with, Column, ColumnStrategy};
use crate::types::{GeneratedDataItem, Message, Operation, ReportRow, ServerStatus, Tab};

/// Everything the dashboard shows.
#[derive(Debug, Default)]
pub struct ViewModel {
    conversation: Vec<Message>,
    report: Vec<ReportRow>,
    chart: Option<ChartHandle>,
    generated: Vec<GeneratedDataItem>,
    active_tab: Tab,
    in_flight: Option<Operation>,
    input: String,
    notice: Option<String>,
    status: ServerStatus,
    column_strategy: ColumnStrategy,
    /// Bumped whenever the conversation is reset; responses dispatched
    /// under an older value are discarded.
    generation: u64,
}

impl ViewModel {
    pub fn new(column_strategy: ColumnStrategy) -> Self {
        Self {
            column_strategy,
            ..Default::default()
        }
    }

    // ========== Read access ==========

    pub fn conversation(&self) -> &[Message] {
        &self.conversation
    }

    pub fn report(&self) -> &[ReportRow] {
        &self.report
    }

    /// Columns for the report table; empty when there are no rows.
    pub fn report_columns(&self) -> Vec<Column> {
        infer_columns_with(&self.report, self.column_strategy)
    }

    /// Columns for a CSV artifact, using the same strategy as the report.
    pub fn columns_for(&self, rows: &[ReportRow]) -> Vec<Column> {
        infer_columns_with(rows, self.column_strategy)
    }

    pub fn chart(&self) -> Option<&ChartHandle> {
        self.chart.as_ref()
    }

    pub fn generated(&self) -> &[GeneratedDataItem] {
        &self.generated
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    /// The mutating operation currently outstanding, if any
    pub fn in_flight(&self) -> Option<Operation> {
        self.in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Text typed but not yet sent
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Acknowledgement waiting to be dismissed
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn status(&self) -> &ServerStatus {
        &self.status
    }

    pub fn column_strategy(&self) -> ColumnStrategy {
        self.column_strategy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ========== Writes (controller only) ==========

    pub(crate) fn replace_conversation(&mut self, messages: Vec<Message>) {
        self.conversation = messages;
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.conversation.push(message);
    }

    pub(crate) fn replace_report(&mut self, rows: Vec<ReportRow>) {
        self.report = rows;
    }

    /// Swap in a new chart; the previous handle is dropped and its file released.
    pub(crate) fn replace_chart(&mut self, chart: Option<ChartHandle>) {
        self.chart = chart;
    }

    pub(crate) fn replace_generated(&mut self, items: Vec<GeneratedDataItem>) {
        self.generated = items;
    }

    pub(crate) fn set_active_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
    }

    pub(crate) fn set_in_flight(&mut self, operation: Option<Operation>) {
        self.in_flight = operation;
    }

    pub(crate) fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub(crate) fn take_input(&mut self) -> String {
        std::mem::take(&mut self.input)
    }

    pub(crate) fn set_notice(&mut self, notice: Option<String>) {
        self.notice = notice;
    }

    pub(crate) fn set_status(&mut self, status: ServerStatus) {
        self.status = status;
    }

    /// Empty the conversation and generated data and start a new generation.
    pub(crate) fn reset_context(&mut self) {
        self.conversation.clear();
        self.generated.clear();
        self.generation += 1;
    }
}
