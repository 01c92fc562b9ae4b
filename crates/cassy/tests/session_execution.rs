#![allow(clippy::manual_async_fn)]

use asupersync::runtime::RuntimeBuilder;
use asupersync::{Cx, Outcome};

use cassy::prelude::*;
use cassy::{ConnectionState, ErrorFn, QueryResult, SuccessFn};
use cassy_core::error::{ConnectionError, ConnectionErrorKind, QueryError, QueryErrorKind};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

fn expect_err<T>(outcome: Outcome<T, Error>) -> Error {
    match outcome {
        Outcome::Err(e) => e,
        Outcome::Ok(_) => panic!("expected an error"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

/// Returns `Pending` once, so a connect stays in flight across a poll.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Driver double that records every statement it is handed.
#[derive(Default)]
struct RecordingDriver {
    live: AtomicBool,
    connects: AtomicUsize,
    refuse_connect: AtomicBool,
    executed: Mutex<Vec<(String, Vec<Value>)>>,
    select_rows: Mutex<Vec<Row>>,
}

impl RecordingDriver {
    fn with_select_rows(rows: Vec<Row>) -> Self {
        let driver = Self::default();
        *driver.select_rows.lock().unwrap() = rows;
        driver
    }

    fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|(statement, _)| statement.clone())
            .collect()
    }
}

impl Driver for RecordingDriver {
    fn connect(
        &self,
        _cx: &Cx,
        _config: &ConnectionConfig,
    ) -> impl Future<Output = Outcome<(), Error>> + Send {
        async move {
            self.connects.fetch_add(1, Ordering::SeqCst);
            YieldOnce(false).await;
            if self.refuse_connect.load(Ordering::SeqCst) {
                return Outcome::Err(Error::Connection(ConnectionError {
                    kind: ConnectionErrorKind::Refused,
                    message: "connection refused".to_string(),
                    source: None,
                }));
            }
            self.live.store(true, Ordering::SeqCst);
            Outcome::Ok(())
        }
    }

    fn execute(
        &self,
        _cx: &Cx,
        statement: &str,
        values: &[Value],
    ) -> impl Future<Output = Outcome<QueryResult, Error>> + Send {
        let statement = statement.to_string();
        let values = values.to_vec();
        async move {
            self.executed
                .lock()
                .unwrap()
                .push((statement.clone(), values));
            if statement.contains("'broken'") {
                return Outcome::Err(Error::Query(QueryError {
                    kind: QueryErrorKind::NotFound,
                    statement: Some(statement),
                    message: "unconfigured columnfamily broken".to_string(),
                    metadata: Some(serde_json::json!({"code": 8704})),
                    source: None,
                }));
            }
            if statement.starts_with("SELECT") {
                let rows = self.select_rows.lock().unwrap().clone();
                return Outcome::Ok(QueryResult::rows(rows));
            }
            Outcome::Ok(QueryResult::empty())
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

fn session(driver: RecordingDriver) -> Session<RecordingDriver> {
    Session::new(driver, ConnectionConfig::default()).unwrap()
}

fn update(family: &str, key: &str) -> StatementSpec {
    let data = Record::new().with("name", "Ann");
    StatementBuilder::default()
        .update(family, &data, Some(&Key::row(key)))
        .unwrap()
}

type Log = Arc<Mutex<Vec<String>>>;

fn recording_success(log: &Log, label: &str) -> Option<SuccessFn> {
    let log = Arc::clone(log);
    let label = label.to_string();
    let callback: SuccessFn = Box::new(move |response: Response| {
        log.lock().unwrap().push(format!("{label}: {response:?}"));
    });
    Some(callback)
}

fn recording_error(log: &Log, action: ErrorAction) -> Option<ErrorFn> {
    let log = Arc::clone(log);
    let callback: ErrorFn = Box::new(move |error: &Error| {
        log.lock().unwrap().push(format!("error: {error}"));
        action
    });
    Some(callback)
}

#[test]
fn runs_statements_in_order_and_connects_once() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let session = session(RecordingDriver::default());
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);

    rt.block_on(async {
        let specs = vec![update("a", "1"), update("b", "2"), update("c", "3")];
        let execution = unwrap_outcome(
            session
                .execute(&cx, specs, Callbacks::None, Callbacks::None)
                .await,
        );
        assert_eq!(execution, Execution::Completed { statements: 3 });

        let again = vec![update("d", "4")];
        unwrap_outcome(
            session
                .execute(&cx, again, Callbacks::None, Callbacks::None)
                .await,
        );
    });

    let executed = session.driver().executed();
    assert_eq!(executed.len(), 4);
    for (statement, family) in executed.iter().zip(["'a'", "'b'", "'c'", "'d'"]) {
        assert!(statement.contains(family), "{statement}");
    }
    assert_eq!(session.driver().connects.load(Ordering::SeqCst), 1);
    assert_eq!(session.connection_state(), ConnectionState::Connected);
    assert_eq!(session.pool_stats().connect_attempts, 1);
}

#[test]
fn empty_input_reports_nothing_without_connecting() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let session = session(RecordingDriver::default());
    let log: Log = Arc::default();

    rt.block_on(async {
        let on_success = Callbacks::Each(vec![None, recording_success(&log, "last")]);
        let execution = unwrap_outcome(
            session
                .execute(&cx, Vec::new(), on_success, Callbacks::None)
                .await,
        );
        assert_eq!(execution, Execution::Nothing);
    });

    assert_eq!(*log.lock().unwrap(), vec!["last: Nothing".to_string()]);
    assert_eq!(session.driver().connects.load(Ordering::SeqCst), 0);
    assert_eq!(session.connection_state(), ConnectionState::Disconnected);
}

#[test]
fn fail_fast_runs_error_callback_then_returns_access_error() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let session = session(RecordingDriver::default());
    let log: Log = Arc::default();

    let err = rt.block_on(async {
        let specs = vec![update("a", "1"), update("broken", "2"), update("c", "3")];
        let on_error = Callbacks::Each(vec![None, recording_error(&log, ErrorAction::Handled)]);
        expect_err(session.execute(&cx, specs, Callbacks::None, on_error).await)
    });

    match &err {
        Error::Access(access) => {
            assert_eq!(access.position, 1);
            assert!(access.message.starts_with("Query ("));
            assert!(access.message.contains("unconfigured columnfamily broken"));
            assert!(access.message.ends_with(r#"with the metadata: {"code":8704}"#));
        }
        other => panic!("expected access error, got {other}"),
    }
    assert!(err.is_access_error());
    assert_eq!(log.lock().unwrap().len(), 1);
    assert_eq!(session.driver().executed().len(), 2);
}

#[test]
fn callback_decides_policy_halts_quietly_when_handled() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let config = ConnectionConfig::default().error_policy(ErrorPolicy::CallbackDecides);
    let session = Session::new(RecordingDriver::default(), config).unwrap();
    let log: Log = Arc::default();

    let execution = rt.block_on(async {
        let specs = vec![update("a", "1"), update("broken", "2"), update("c", "3")];
        let on_error = Callbacks::Each(vec![None, recording_error(&log, ErrorAction::Handled)]);
        unwrap_outcome(session.execute(&cx, specs, Callbacks::None, on_error).await)
    });

    assert_eq!(
        execution,
        Execution::Halted {
            completed: 1,
            failed_at: 1
        }
    );
    assert_eq!(log.lock().unwrap().len(), 1);
    assert_eq!(session.driver().executed().len(), 2);
}

#[test]
fn callback_decides_policy_propagates_when_asked_or_unhandled() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let config = ConnectionConfig::default().error_policy(ErrorPolicy::CallbackDecides);
    let session = Session::new(RecordingDriver::default(), config).unwrap();
    let log: Log = Arc::default();

    rt.block_on(async {
        let on_error = Callbacks::Last(recording_error(&log, ErrorAction::Propagate).unwrap());
        let err = expect_err(
            session
                .execute(&cx, vec![update("broken", "1")], Callbacks::None, on_error)
                .await,
        );
        assert!(err.is_access_error());

        let err = expect_err(
            session
                .execute(&cx, vec![update("broken", "1")], Callbacks::None, Callbacks::None)
                .await,
        );
        assert!(err.is_access_error());
    });

    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn single_callback_belongs_to_the_final_statement() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let session = session(RecordingDriver::default());
    let log: Log = Arc::default();

    rt.block_on(async {
        let specs = vec![update("a", "1"), update("b", "2"), update("c", "3")];
        let on_success = Callbacks::Last(recording_success(&log, "last").unwrap());
        unwrap_outcome(
            session
                .execute(&cx, specs, on_success, Callbacks::None)
                .await,
        );
    });

    assert_eq!(
        *log.lock().unwrap(),
        vec![r#"last: Key(["3"])"#.to_string()]
    );
}

#[test]
fn success_dispatch_prefers_rows_then_key() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let row = Row::new(vec!["name".to_string()], vec![Value::from("Ann")]).keyed("u1");
    let session = session(RecordingDriver::with_select_rows(vec![row.clone()]));
    let statements = session.statements();

    rt.block_on(async {
        let select = statements
            .select("users", Some(&Key::row("u1")), None)
            .unwrap();
        let response = unwrap_outcome(session.query(&cx, &select).await);
        assert_eq!(response, Response::Rows(vec![row]));

        let response = unwrap_outcome(session.query(&cx, &update("users", "u1")).await);
        assert_eq!(response, Response::Key(vec!["u1".to_string()]));

        let data = Record::new().with("name", "Bob");
        let insert = statements
            .insert_with_key("users", &data, |_| Value::from("u9"))
            .unwrap();
        let response = unwrap_outcome(session.query(&cx, &insert).await);
        assert_eq!(response.key(), Some(&["u9".to_string()][..]));
    });
}

#[test]
fn select_without_rows_dispatches_empty_rows() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let session = session(RecordingDriver::default());

    rt.block_on(async {
        let select = session.statements().select("users", None, None).unwrap();
        let response = unwrap_outcome(session.query(&cx, &select).await);
        assert_eq!(response, Response::Rows(Vec::new()));
    });
}

#[test]
fn concurrent_executions_share_one_connect() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let session = session(RecordingDriver::default());

    rt.block_on(async {
        let mut first = std::pin::pin!(session.execute(
            &cx,
            vec![update("a", "1")],
            Callbacks::None,
            Callbacks::None
        ));
        let mut second = std::pin::pin!(session.execute(
            &cx,
            vec![update("b", "2")],
            Callbacks::None,
            Callbacks::None
        ));
        let mut first_out = None;
        let mut second_out = None;
        std::future::poll_fn(|task| {
            if first_out.is_none() {
                if let Poll::Ready(out) = first.as_mut().poll(task) {
                    first_out = Some(out);
                }
            }
            if second_out.is_none() {
                if let Poll::Ready(out) = second.as_mut().poll(task) {
                    second_out = Some(out);
                }
            }
            if first_out.is_some() && second_out.is_some() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await;

        assert_eq!(
            unwrap_outcome(first_out.unwrap()),
            Execution::Completed { statements: 1 }
        );
        assert_eq!(
            unwrap_outcome(second_out.unwrap()),
            Execution::Completed { statements: 1 }
        );
    });

    assert_eq!(session.driver().connects.load(Ordering::SeqCst), 1);
    assert_eq!(session.driver().executed().len(), 2);
}

#[test]
fn failed_connect_runs_nothing_and_can_be_retried() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let driver = RecordingDriver::default();
    driver.refuse_connect.store(true, Ordering::SeqCst);
    let session = session(driver);

    rt.block_on(async {
        let err = expect_err(
            session
                .execute(&cx, vec![update("a", "1")], Callbacks::None, Callbacks::None)
                .await,
        );
        assert!(err.is_connection_error());
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
        assert!(session.driver().executed().is_empty());

        session.driver().refuse_connect.store(false, Ordering::SeqCst);
        unwrap_outcome(
            session
                .execute(&cx, vec![update("a", "1")], Callbacks::None, Callbacks::None)
                .await,
        );
    });

    let stats = session.pool_stats();
    assert_eq!(stats.connect_attempts, 2);
    assert_eq!(stats.failed_connects, 1);
}

#[test]
fn batches_execute_as_single_statements() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let config = ConnectionConfig::default().batch_chunk_size(2);
    let session = Session::new(RecordingDriver::default(), config).unwrap();
    let log: Log = Arc::default();

    rt.block_on(async {
        let batches = session.batch(vec![update("a", "1"), update("b", "2"), update("c", "3")]);
        assert_eq!(batches.len(), 2);
        let on_success = Callbacks::Each(vec![
            recording_success(&log, "first"),
            recording_success(&log, "second"),
        ]);
        unwrap_outcome(
            session
                .execute(&cx, batches, on_success, Callbacks::None)
                .await,
        );
    });

    let executed = session.driver().executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].starts_with("BEGIN BATCH USING CONSISTENCY QUORUM\n"));
    assert!(executed[1].ends_with("APPLY BATCH;"));
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            r#"first: Key(["1", "2"])"#.to_string(),
            r#"second: Key(["3"])"#.to_string(),
        ]
    );
}

#[test]
fn check_if_exists_treats_an_empty_row_as_missing() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let session = session(RecordingDriver::with_select_rows(vec![Row::empty("u1")]));

    rt.block_on(async {
        let existence = unwrap_outcome(
            session
                .check_if_exists(&cx, "users", &Key::row("u1"))
                .await,
        );
        assert!(!existence.exists);
        assert!(existence.data.is_empty());
    });

    assert_eq!(
        session.driver().executed(),
        vec!["SELECT * FROM 'users' WHERE KEY = ?".to_string()]
    );
}

#[test]
fn check_if_exists_returns_the_column_hash() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let row = Row::new(vec!["name".to_string()], vec![Value::from("Ann")]).keyed("u1");
    let session = session(RecordingDriver::with_select_rows(vec![row]));

    rt.block_on(async {
        let existence = unwrap_outcome(
            session
                .check_if_exists(&cx, "users", &Key::row("u1"))
                .await,
        );
        assert!(existence.exists);
        assert_eq!(existence.data.get("name"), Some(&Value::from("Ann")));
    });
}
