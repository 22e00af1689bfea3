//! Fetch controller: owns the current location and request state, and is the
//! only place that talks to the [`WeatherProvider`].
//!
//! Every call to [`FetchController::fetch`] takes a new epoch. The result of a
//! call is committed only if its epoch is still the latest when both provider
//! requests have returned, so a slow or stuck request can never overwrite the
//! outcome of a newer one. The internal lock is never held across an await.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::{
    model::{CurrentConditions, ForecastSample, ForecastSeries, Location},
    provider::WeatherProvider,
    reducer::{self, CalendarPolicy},
};

/// Fetch progress as seen by the rendering surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Success {
        current: CurrentConditions,
        forecast: ForecastSeries,
    },
    Failure {
        message: String,
    },
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn current(&self) -> Option<&CurrentConditions> {
        match self {
            RequestState::Success { current, .. } => Some(current),
            _ => None,
        }
    }

    pub fn forecast(&self) -> Option<&ForecastSeries> {
        match self {
            RequestState::Success { forecast, .. } => Some(forecast),
            _ => None,
        }
    }

    /// Empty unless the state is `Success`.
    pub fn hourly_view(&self) -> &[ForecastSample] {
        self.forecast().map(reducer::hourly_view).unwrap_or_default()
    }

    /// Empty unless the state is `Success`.
    pub fn daily_view(&self, policy: CalendarPolicy) -> Vec<&ForecastSample> {
        self.forecast()
            .map(|series| reducer::daily_view(series, policy))
            .unwrap_or_default()
    }

    fn label(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Loading => "loading",
            RequestState::Success { .. } => "success",
            RequestState::Failure { .. } => "failure",
        }
    }
}

/// What happened to the result of one `fetch` call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The call was the latest one; its result is now the state.
    Committed(RequestState),
    /// A newer call started first; the result was dropped.
    Superseded,
}

impl FetchOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, FetchOutcome::Committed(_))
    }
}

#[derive(Debug)]
struct Inner {
    location: Location,
    epoch: u64,
}

#[derive(Debug)]
pub struct FetchController<P> {
    provider: P,
    default_location: Location,
    inner: Mutex<Inner>,
    state: watch::Sender<RequestState>,
}

impl<P: WeatherProvider> FetchController<P> {
    pub fn new(provider: P, default_location: Location) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);

        Self {
            provider,
            inner: Mutex::new(Inner { location: default_location.clone(), epoch: 0 }),
            default_location,
            state,
        }
    }

    #[cfg(test)]
    pub(crate) fn provider(&self) -> &P {
        &self.provider
    }

    pub fn default_location(&self) -> &Location {
        &self.default_location
    }

    pub fn location(&self) -> Location {
        self.lock().location.clone()
    }

    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    /// Watch state transitions. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    /// Switch to `location` and load current conditions plus forecast for it.
    ///
    /// Both provider requests run concurrently; the state moves from `Loading`
    /// straight to `Success` with both results or to `Failure`. Never a mix.
    pub async fn fetch(&self, location: Location) -> FetchOutcome {
        let epoch = self.begin(location.clone());

        let result = tokio::try_join!(
            self.provider.current(&location),
            self.provider.forecast(&location),
        );

        let next = match result {
            Ok((current, forecast)) => {
                tracing::info!(
                    %location,
                    samples = forecast.len(),
                    "weather data loaded"
                );
                RequestState::Success { current, forecast }
            }
            Err(err) => {
                tracing::warn!(
                    %location,
                    error = %err,
                    transport = err.is_transport(),
                    "weather fetch failed"
                );
                RequestState::Failure { message: err.user_message().to_string() }
            }
        };

        self.commit(epoch, next)
    }

    /// Fetch the current location again.
    pub async fn refresh(&self) -> FetchOutcome {
        let location = self.location();
        self.fetch(location).await
    }

    /// Reset to the default location and fetch it.
    pub async fn retry(&self) -> FetchOutcome {
        tracing::debug!(location = %self.default_location, "retrying with default location");
        self.fetch(self.default_location.clone()).await
    }

    fn begin(&self, location: Location) -> u64 {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.location = location;
        let epoch = inner.epoch;

        tracing::debug!(epoch, location = %inner.location, "fetch started");
        self.state.send_replace(RequestState::Loading);
        epoch
    }

    fn commit(&self, epoch: u64, next: RequestState) -> FetchOutcome {
        let inner = self.lock();
        if inner.epoch != epoch {
            tracing::debug!(
                epoch,
                latest = inner.epoch,
                outcome = next.label(),
                "discarding superseded fetch result"
            );
            return FetchOutcome::Superseded;
        }

        tracing::debug!(epoch, state = next.label(), "fetch committed");
        self.state.send_replace(next.clone());
        FetchOutcome::Committed(next)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner holds plain values; a panic elsewhere cannot leave it torn.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
