use crate::domain::{
    authorization::State,
    eth::{self, U256},
    events::FeeEvent,
    fee::Tier,
};

pub mod metrics;

pub fn resolved(amount: U256, tier: &Tier) {
    tracing::debug!(%amount, %tier, "resolved fee tier");
    metrics::get()
        .tier_resolutions
        .with_label_values(&[tier.label.as_str()])
        .inc();
}

pub fn transition(from: &State, to: &State) {
    if from == to {
        return;
    }
    tracing::debug!(from = from.name(), to = to.name(), "swap flow transition");
    metrics::get()
        .flow_transitions
        .with_label_values(&[from.name(), to.name()])
        .inc();
}

pub fn fee_event(event: &FeeEvent, inserted: bool) {
    let outcome = if inserted { "new" } else { "duplicate" };
    tracing::debug!(tx = %event.tx, log_index = event.log_index, outcome, "fee event");
    metrics::get()
        .fee_events
        .with_label_values(&[outcome])
        .inc();
    if inserted {
        metrics::get()
            .fees_applied
            .observe(f64::from(event.fee_applied));
    }
}

pub fn preview_diverges(amount: U256, preview: u32, onchain: u32) {
    tracing::warn!(
        %amount,
        preview = %eth::format_fee(preview),
        onchain = %eth::format_fee(onchain),
        "fee preview differs from the hook's pricing"
    );
}
