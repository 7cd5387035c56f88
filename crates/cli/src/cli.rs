use clap::{Parser, ValueEnum};

/// Daily countdown mail: an LLM-written note of encouragement, delivered
/// over SMTP until the target date arrives.
#[derive(Parser, Debug)]
#[command(name = "courier", version, about = "Daily countdown mail courier")]
pub struct CliArgs {
    /// Run one delivery cycle and exit, or keep firing on the cron schedule.
    #[arg(long, env = "COURIER_MODE", value_enum, default_value = "once")]
    pub mode: Mode,

    /// Fire time for daemon mode (5- or 6-field cron expression).
    #[arg(long, env = "SEND_CRON", default_value = "0 0 8 * * *")]
    pub cron: String,

    /// Print a redacted configuration report and exit.
    #[arg(long)]
    pub check: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Once,
    Daemon,
}
