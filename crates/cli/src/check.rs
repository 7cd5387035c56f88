//! Redacted configuration report for `--check`.

use chrono::Local;
use courier_core::config::{mask_secret, Config};
use courier_core::countdown::Countdown;

fn masked(value: Option<&str>) -> String {
    match value {
        Some(v) => mask_secret(v),
        None => "(not set)".to_string(),
    }
}

fn shown(value: Option<&str>) -> &str {
    value.unwrap_or("(not set)")
}

/// Print every setting the courier runs on, secrets masked to their
/// first and last four characters.
pub fn print_report(cfg: &Config) {
    println!("courier configuration");
    println!("  target date:    {}", cfg.target);
    match Countdown::evaluate(Local::now().naive_local(), cfg.target) {
        Countdown::Remaining(r) => println!("  countdown:      {}", r),
        Countdown::Passed => println!("  countdown:      target already passed"),
    }
    println!();
    println!("  llm base url:   {}", cfg.llm.base_url);
    println!("  llm model:      {}", cfg.llm.model);
    println!("  llm api key:    {}", masked(cfg.llm.api_key.as_deref()));
    println!("  llm knobs:      temperature={}, max_tokens={}, timeout={}s",
        cfg.llm.temperature,
        cfg.llm.max_tokens,
        cfg.llm.timeout.as_secs(),
    );
    println!();
    println!("  smtp host:      {}", shown(cfg.mail.host.as_deref()));
    println!("  smtp ports:     {} (SSL) / {} (STARTTLS)",
        cfg.mail.implicit_tls_port,
        cfg.mail.starttls_port,
    );
    println!("  smtp user:      {}", shown(cfg.mail.username.as_deref()));
    println!("  smtp password:  {}", masked(cfg.mail.password.as_deref()));
    println!("  preferred mode: {}", cfg.mail.preferred);
    println!("  from:           {}", shown(cfg.mail.from.as_deref()));
    println!("  recipient:      {}", shown(cfg.mail.recipient.as_deref()));
    println!("  operator:       {}", shown(cfg.mail.operator.as_deref()));
    println!("  subject prefix: {}", cfg.mail.subject_prefix);
    println!("  send timeout:   {}s", cfg.mail.timeout.as_secs());
    println!();
    println!("  retry:          {} attempts, {}s base delay, {}s cap",
        cfg.retry.max_attempts,
        cfg.retry.base_delay.as_secs(),
        cfg.retry.max_delay.as_secs(),
    );
    println!();

    let missing = cfg.missing_settings();
    if missing.is_empty() {
        println!("all required settings present");
    } else {
        println!("missing required settings: {}", missing.join(", "));
    }
}
