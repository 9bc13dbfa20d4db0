use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerState {
    Idle,
    Waiting { until: DateTime<Utc> },
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayStatus {
    Connected,
    Disconnected,
    Reconnecting { attempt: u32, delay_ms: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Scheduler(SchedulerState),
    DailyUpdateCompleted { elapsed_ms: u64 },
    Gateway(GatewayStatus),
    LoggedIn { user: String },
    CommandReceived { command: String, channel_id: String },
    LogMessage(String),
    Error(String),
}
