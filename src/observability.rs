use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("decidr.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("decidr.client.request_errors");
pub(crate) static CLIENT_CONFIGURATION_ERRORS: Counter =
    Counter::new("decidr.client.configuration_errors");
pub(crate) static CLIENT_PARSE_ERRORS: Counter = Counter::new("decidr.client.parse_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("decidr.client.request_duration_seconds");

pub(crate) static SESSION_ACTIONS: Counter = Counter::new("decidr.session.actions");
pub(crate) static SESSION_UNANSWERED_TURNS: Counter =
    Counter::new("decidr.session.unanswered_turns");
pub(crate) static SESSION_CANCELLED: Counter = Counter::new("decidr.session.cancelled");
pub(crate) static SESSION_BUSY: Counter = Counter::new("decidr.session.busy");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_CONFIGURATION_ERRORS);
    collector.register_counter(&CLIENT_PARSE_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&SESSION_ACTIONS);
    collector.register_counter(&SESSION_UNANSWERED_TURNS);
    collector.register_counter(&SESSION_CANCELLED);
    collector.register_counter(&SESSION_BUSY);
}
