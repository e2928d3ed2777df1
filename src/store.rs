//! A store that owns a typed filter set, mirrors it to and from the shareable
//! query representation, and re-fetches its data whenever the filters change,
//! discarding results of superseded fetches.

use std::sync::Mutex;

use futures::future::BoxFuture;

use crate::error::FetchError;
use crate::query::{FilterSet, SearchParams};
use crate::types::FetchState;

/// Retrieves the data for a filter set. Typically closes over a
/// [`PaginatedAggregator`](crate::aggregate::PaginatedAggregator) and any
/// post-processing the screen needs.
pub type DataFn<F, D> =
    Box<dyn Fn(F) -> BoxFuture<'static, Result<D, FetchError>> + Send + Sync>;

/// Sink the surrounding application uses to surface fetch failures to the
/// user. The store itself performs no UI side effects.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &FetchError);
}

/// Receives the query representation every time the filters are written, so
/// the application can persist it (browser history, deep link, settings).
pub type QuerySink = Box<dyn Fn(&SearchParams) + Send + Sync>;

struct StoreState<F, D> {
    filters: F,
    data: D,
    loading: bool,
    /// Identifier of the most recently started fetch. Only its result may
    /// land in `data`/`loading`; anything older is discarded on completion.
    generation: u64,
}

/// Owns filters, data and loading state for one table or map screen.
///
/// State transitions: `Idle -> Loading` on every filter change (explicit set,
/// external query change, or [`fetch_now`]); `Loading -> Idle` with new data
/// on success, with the previous data on failure. A failed fetch never
/// escapes the store; it is reported through the error sink, if any.
///
/// [`fetch_now`]: FilterSyncedStore::fetch_now
pub struct FilterSyncedStore<F, D> {
    state: Mutex<StoreState<F, D>>,
    data_fn: DataFn<F, D>,
    error_sink: Option<Box<dyn ErrorSink>>,
    query_sink: Option<QuerySink>,
}

impl<F, D> FilterSyncedStore<F, D>
where
    F: FilterSet,
    D: Clone + Send + 'static,
{
    pub fn new(initial_data: D, data_fn: DataFn<F, D>) -> Self {
        FilterSyncedStore {
            state: Mutex::new(StoreState {
                filters: F::default(),
                data: initial_data,
                loading: false,
                generation: 0,
            }),
            data_fn,
            error_sink: None,
            query_sink: None,
        }
    }

    pub fn with_error_sink(mut self, sink: Box<dyn ErrorSink>) -> Self {
        self.error_sink = Some(sink);
        self
    }

    pub fn with_query_sink(mut self, sink: QuerySink) -> Self {
        self.query_sink = Some(sink);
        self
    }

    pub fn filters(&self) -> F {
        self.state.lock().unwrap().filters.clone()
    }

    /// Latest successfully fetched data, or the initial value.
    pub fn data(&self) -> D {
        self.state.lock().unwrap().data.clone()
    }

    /// True only while a fetch triggered by the current filters is
    /// outstanding.
    pub fn loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }

    pub fn fetch_state(&self) -> FetchState<D> {
        let state = self.state.lock().unwrap();
        FetchState {
            loading: state.loading,
            data: state.data.clone(),
        }
    }

    /// The current filters as shareable query parameters.
    pub fn search_params(&self) -> SearchParams {
        self.filters().to_search_params()
    }

    /// Writes the filters, mirrors them into the query sink, and fetches.
    pub async fn set_filters(&self, filters: F) {
        {
            let mut state = self.state.lock().unwrap();
            state.filters = filters.clone();
        }
        if let Some(sink) = &self.query_sink {
            sink(&filters.to_search_params());
        }
        self.run_fetch(filters).await;
    }

    /// Applies an externally changed query representation. Malformed values
    /// resolve to filter defaults; a fetch is triggered only when the derived
    /// filters differ from the current ones.
    pub async fn sync_query(&self, params: &SearchParams) {
        let derived = F::from_search_params(params);
        let changed = {
            let mut state = self.state.lock().unwrap();
            if state.filters == derived {
                false
            } else {
                state.filters = derived.clone();
                true
            }
        };
        if changed {
            self.run_fetch(derived).await;
        }
    }

    /// Forces a re-fetch with the current filters.
    pub async fn fetch_now(&self) {
        let filters = self.filters();
        self.run_fetch(filters).await;
    }

    async fn run_fetch(&self, filters: F) {
        let generation = {
            let mut state = self.state.lock().unwrap();
            state.generation += 1;
            state.loading = true;
            state.generation
        };

        let result = (self.data_fn)(filters).await;

        let mut state = self.state.lock().unwrap();
        if state.generation != generation {
            // A newer fetch superseded this one; it owns loading/data now.
            tracing::debug!(generation, "discarding stale fetch result");
            return;
        }

        state.loading = false;
        match result {
            Ok(data) => state.data = data,
            Err(error) => {
                tracing::warn!(%error, "fetch failed, keeping previous data");
                if let Some(sink) = &self.error_sink {
                    sink.report(&error);
                }
            }
        }
    }
}
