//! Statement execution for Cassy.
//!
//! A [`Session`] owns the connection gate and runs statement sequences in
//! order, one at a time, dispatching each statement's result to its
//! callback.
//!
//! # Example
//!
//! ```rust,ignore
//! use cassy::prelude::*;
//!
//! let session = Session::new(driver, ConnectionConfig::default())?;
//! let data = Record::new().with("name", "Ann");
//! let insert = session.statements().insert("users", &data)?;
//!
//! let outcome = session
//!     .execute(
//!         &cx,
//!         vec![insert],
//!         Callbacks::on_last(|response| println!("stored {:?}", response.key())),
//!         Callbacks::None,
//!     )
//!     .await;
//! ```

use cassy_core::error::AccessError;
use cassy_core::{
    ConnectionConfig, Cx, Driver, Error, ErrorPolicy, Outcome, QueryResult, Result, StatementSpec,
    Value,
};
use cassy_pool::{ConnectionState, Pool, PoolStats};
use cassy_query::{BatchAssembler, StatementBuilder};
use rand::{Rng, thread_rng};

use crate::callback::{Callbacks, ErrorAction, ErrorFn, Execution, Response, SuccessFn};

const CORRELATION_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const CORRELATION_LEN: usize = 8;

/// Short random base-36 id tying a statement's log lines together.
pub(crate) fn correlation_id() -> String {
    let mut rng = thread_rng();
    (0..CORRELATION_LEN)
        .map(|_| char::from(CORRELATION_ALPHABET[rng.gen_range(0..CORRELATION_ALPHABET.len())]))
        .collect()
}

/// Executes statements against a driver, connecting on first use.
pub struct Session<D: Driver> {
    pool: Pool<D>,
    statements: StatementBuilder,
    batches: BatchAssembler,
    policy: ErrorPolicy,
}

impl<D: Driver> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pool", &self.pool)
            .field("statements", &self.statements)
            .field("batches", &self.batches)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<D: Driver> Session<D> {
    /// Create a session. Nothing is connected until the first statement runs.
    pub fn new(driver: D, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let statements = StatementBuilder::new(config.in_list);
        let batches = BatchAssembler::new(config.batch_chunk_size);
        let policy = config.error_policy;
        Ok(Self {
            pool: Pool::new(driver, config),
            statements,
            batches,
            policy,
        })
    }

    /// Statement builder configured from this session's settings.
    pub fn statements(&self) -> StatementBuilder {
        self.statements
    }

    /// Wrap statements into BATCH statements of the configured chunk size.
    pub fn batch<I>(&self, statements: I) -> Vec<StatementSpec>
    where
        I: IntoIterator<Item = StatementSpec>,
    {
        self.batches.assemble(statements)
    }

    /// A fresh time-ordered row id.
    pub fn generate_id(&self) -> Value {
        cassy_core::generate_id()
    }

    /// Get the session configuration.
    pub fn config(&self) -> &ConnectionConfig {
        self.pool.config()
    }

    /// Get the underlying driver.
    pub fn driver(&self) -> &D {
        self.pool.driver()
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.pool.state()
    }

    /// Connection gate statistics.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Execute `statements` in order.
    ///
    /// An empty list hands [`Response::Nothing`] to the final success
    /// callback and returns [`Execution::Nothing`] without touching the
    /// connection. Otherwise the session connects if needed and runs each
    /// statement only after the previous one succeeded. A driver failure
    /// stops the sequence; the failing statement's error callback sees it
    /// first, then the configured [`ErrorPolicy`] decides whether an
    /// [`Error::Access`] is returned.
    #[tracing::instrument(
        level = "debug",
        skip(self, cx, statements, on_success, on_error),
        fields(count = statements.len())
    )]
    pub async fn execute(
        &self,
        cx: &Cx,
        statements: Vec<StatementSpec>,
        on_success: Callbacks<SuccessFn>,
        on_error: Callbacks<ErrorFn>,
    ) -> Outcome<Execution, Error> {
        if statements.is_empty() {
            if let Some(callback) = on_success.into_last() {
                callback(Response::Nothing);
            }
            return Outcome::Ok(Execution::Nothing);
        }

        match self.pool.ensure_connected(cx).await {
            Outcome::Ok(()) => {}
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        let total = statements.len();
        let mut successes = on_success.into_slots(total);
        let mut errors = on_error.into_slots(total);

        for (position, spec) in statements.iter().enumerate() {
            let id = correlation_id();
            match self.run(cx, &id, spec).await {
                Outcome::Ok(result) => {
                    if let Some(callback) = successes[position].take() {
                        callback(Response::dispatch(result.rows, spec.key()));
                    }
                }
                Outcome::Err(e) => {
                    let message = failure_message(&id, &e);
                    tracing::error!("{message}");
                    let action = match errors[position].take() {
                        Some(callback) => callback(&e),
                        None => ErrorAction::Propagate,
                    };
                    if self.policy == ErrorPolicy::CallbackDecides
                        && action == ErrorAction::Handled
                    {
                        tracing::debug!(
                            failed_at = position,
                            skipped = total - position - 1,
                            "Failure handled by callback, halting"
                        );
                        return Outcome::Ok(Execution::Halted {
                            completed: position,
                            failed_at: position,
                        });
                    }
                    return Outcome::Err(Error::Access(AccessError {
                        message,
                        position,
                        source: Some(Box::new(e)),
                    }));
                }
                Outcome::Cancelled(r) => return Outcome::Cancelled(r),
                Outcome::Panicked(p) => return Outcome::Panicked(p),
            }
        }

        Outcome::Ok(Execution::Completed { statements: total })
    }

    /// Execute a single statement and return its dispatched response.
    ///
    /// Failures are logged like in [`execute`](Self::execute) and returned
    /// as [`Error::Access`].
    #[tracing::instrument(level = "debug", skip(self, cx, spec))]
    pub async fn query(&self, cx: &Cx, spec: &StatementSpec) -> Outcome<Response, Error> {
        match self.pool.ensure_connected(cx).await {
            Outcome::Ok(()) => {}
            Outcome::Err(e) => return Outcome::Err(e),
            Outcome::Cancelled(r) => return Outcome::Cancelled(r),
            Outcome::Panicked(p) => return Outcome::Panicked(p),
        }

        let id = correlation_id();
        match self.run(cx, &id, spec).await {
            Outcome::Ok(result) => Outcome::Ok(Response::dispatch(result.rows, spec.key())),
            Outcome::Err(e) => {
                let message = failure_message(&id, &e);
                tracing::error!("{message}");
                Outcome::Err(Error::Access(AccessError {
                    message,
                    position: 0,
                    source: Some(Box::new(e)),
                }))
            }
            Outcome::Cancelled(r) => Outcome::Cancelled(r),
            Outcome::Panicked(p) => Outcome::Panicked(p),
        }
    }

    async fn run(&self, cx: &Cx, id: &str, spec: &StatementSpec) -> Outcome<QueryResult, Error> {
        tracing::debug!("Executing query ({id}): {}", spec.debug_line());
        let outcome = self
            .pool
            .driver()
            .execute(cx, spec.statement(), spec.values())
            .await;
        if let Outcome::Ok(result) = &outcome {
            tracing::debug!(rows = result.rows.len(), "Query ({id}) was successful.");
        }
        outcome
    }
}

fn failure_message(id: &str, error: &Error) -> String {
    let metadata = match error {
        Error::Query(q) => q.metadata.as_ref(),
        _ => None,
    };
    let metadata = metadata.map_or_else(|| "null".to_string(), |m| m.to_string());
    format!("Query ({id}) gave: {error} with the metadata: {metadata}")
}
