use super::*;
use async_trait::async_trait;
use relayer_provider::SubmitError;
use relayer_storage::{implementations::memory::MemoryStorage, StorageService};
use std::sync::atomic::AtomicU32;
use std::sync::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

/// Submitter driven by a closure over the transaction.
struct FnSubmitter<F> {
	f: F,
	calls: AtomicU32,
}

#[async_trait]
impl<F> TransactionSubmitter for FnSubmitter<F>
where
	F: Fn(&QueuedTransaction) -> Result<String, String> + Send + Sync,
{
	async fn submit(&self, tx: &QueuedTransaction) -> Result<String, SubmitError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		(self.f)(tx).map_err(SubmitError::TransactionSubmissionFailed)
	}
}

fn fn_submitter<F>(f: F) -> Arc<FnSubmitter<F>>
where
	F: Fn(&QueuedTransaction) -> Result<String, String> + Send + Sync,
{
	Arc::new(FnSubmitter {
		f,
		calls: AtomicU32::new(0),
	})
}

/// Submitter that reports each call and optionally blocks until released.
struct GatedSubmitter {
	started: mpsc::UnboundedSender<String>,
	gate: Option<Arc<Notify>>,
}

#[async_trait]
impl TransactionSubmitter for GatedSubmitter {
	async fn submit(&self, tx: &QueuedTransaction) -> Result<String, SubmitError> {
		self.started.send(tx.id.clone()).ok();
		if let Some(gate) = &self.gate {
			gate.notified().await;
		}
		Ok(format!("0xhash-{}", tx.description))
	}
}

/// Submitter that records when each submission started.
#[derive(Default)]
struct TimedSubmitter {
	started_at: Mutex<Vec<Instant>>,
}

#[async_trait]
impl TransactionSubmitter for TimedSubmitter {
	async fn submit(&self, tx: &QueuedTransaction) -> Result<String, SubmitError> {
		self.started_at.lock().unwrap().push(Instant::now());
		Ok(format!("0x{}", tx.description))
	}
}

fn gated(gate: &Arc<Notify>) -> (Arc<GatedSubmitter>, mpsc::UnboundedReceiver<String>) {
	let (started_tx, started) = mpsc::unbounded_channel();
	let submitter = Arc::new(GatedSubmitter {
		started: started_tx,
		gate: Some(gate.clone()),
	});
	(submitter, started)
}

fn drain_kinds(events: &mut tokio::sync::broadcast::Receiver<QueueEvent>) -> Vec<QueueEventKind> {
	let mut kinds = Vec::new();
	while let Ok(event) = events.try_recv() {
		kinds.push(event.kind);
	}
	kinds
}

fn settings(delay: Duration) -> QueueSettings {
	QueueSettings {
		chain_id: 31337,
		inter_transaction_delay: delay,
		max_retry_attempts: MAX_RETRY_ATTEMPTS,
	}
}

fn engine(submitter: Arc<dyn TransactionSubmitter>) -> TransactionQueueEngine {
	TransactionQueueEngine::new(submitter, EventBus::new(64), settings(Duration::ZERO))
}

fn intent(description: &str) -> TransactionIntent {
	TransactionIntent {
		to: "0xabc".to_string(),
		value: "1".to_string(),
		description: description.to_string(),
		data: None,
	}
}

async fn status_of(engine: &TransactionQueueEngine, id: &str) -> TransactionStatus {
	engine.get(id).await.unwrap().status
}

#[tokio::test]
async fn test_successful_submission_completes_entry() {
	let seen = Arc::new(Mutex::new(Vec::new()));
	let observed = seen.clone();
	let submitter = fn_submitter(move |tx: &QueuedTransaction| {
		observed.lock().unwrap().push(tx.status);
		Ok("0x111".to_string())
	});
	let engine = engine(submitter);

	let id = engine.enqueue(intent("pay A")).await;
	assert_eq!(status_of(&engine, &id).await, TransactionStatus::Pending);

	engine.process_queue().await;

	let tx = engine.get(&id).await.unwrap();
	assert_eq!(*seen.lock().unwrap(), vec![TransactionStatus::Processing]);
	assert_eq!(tx.status, TransactionStatus::Completed);
	assert_eq!(tx.hash.as_deref(), Some("0x111"));
	assert!(tx.error.is_none());

	let state = engine.state().await;
	assert_eq!(state.completed, 1);
	assert_eq!(state.current_index, -1);
	assert!(!state.is_processing);
}

#[tokio::test]
async fn test_failures_do_not_stop_the_pass() {
	let submitter = fn_submitter(|_: &QueuedTransaction| Err("insufficient funds".to_string()));
	let engine = engine(submitter.clone());

	let ids = vec![
		engine.enqueue(intent("a")).await,
		engine.enqueue(intent("b")).await,
		engine.enqueue(intent("c")).await,
	];
	engine.process_queue().await;

	assert_eq!(submitter.calls.load(Ordering::SeqCst), 3);
	for id in &ids {
		let tx = engine.get(id).await.unwrap();
		assert_eq!(tx.status, TransactionStatus::Failed);
		assert_eq!(tx.error.as_deref(), Some("insufficient funds"));
		assert!(tx.hash.is_none());
	}
	assert_eq!(engine.state().await.failed, 3);
}

#[tokio::test]
async fn test_mixed_outcomes_in_order() {
	let order = Arc::new(Mutex::new(Vec::new()));
	let log = order.clone();
	let submitter = fn_submitter(move |tx: &QueuedTransaction| {
		log.lock().unwrap().push(tx.description.clone());
		if tx.description == "b" {
			Err("nonce too low".to_string())
		} else {
			Ok(format!("0x{}", tx.description))
		}
	});
	let engine = engine(submitter);

	let a = engine.enqueue(intent("a")).await;
	let b = engine.enqueue(intent("b")).await;
	let c = engine.enqueue(intent("c")).await;
	engine.process_queue().await;

	assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
	assert_eq!(status_of(&engine, &a).await, TransactionStatus::Completed);
	assert_eq!(status_of(&engine, &b).await, TransactionStatus::Failed);
	assert_eq!(status_of(&engine, &c).await, TransactionStatus::Completed);
	let state = engine.state().await;
	assert_eq!((state.completed, state.failed), (2, 1));
}

#[tokio::test]
async fn test_retry_budget() {
	let submitter = fn_submitter(|_: &QueuedTransaction| Err("reverted".to_string()));
	let engine = engine(submitter);
	let id = engine.enqueue(intent("a")).await;

	// Only failed entries can be retried
	assert!(matches!(
		engine.retry(&id).await,
		Err(QueueError::Refused { .. })
	));

	engine.process_queue().await;
	engine.retry(&id).await.unwrap();
	let tx = engine.get(&id).await.unwrap();
	assert_eq!(tx.status, TransactionStatus::Pending);
	assert_eq!(tx.retry_count, 1);
	assert!(tx.error.is_none());

	engine.process_queue().await;
	engine.retry(&id).await.unwrap();
	engine.process_queue().await;

	let before = engine.get(&id).await.unwrap();
	assert_eq!(before.retry_count, 2);
	let refused = engine.retry(&id).await.unwrap_err();
	assert_eq!(
		refused,
		QueueError::Refused {
			operation: "retry",
			reason: "max retries reached".to_string()
		}
	);
	assert_eq!(engine.get(&id).await.unwrap(), before);
}

#[tokio::test]
async fn test_retry_does_not_start_a_pass() {
	let submitter = fn_submitter(|_: &QueuedTransaction| Err("boom".to_string()));
	let engine = engine(submitter.clone());
	let id = engine.enqueue(intent("a")).await;
	engine.process_queue().await;

	engine.retry(&id).await.unwrap();
	tokio::task::yield_now().await;
	assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);
	assert_eq!(status_of(&engine, &id).await, TransactionStatus::Pending);
}

#[tokio::test]
async fn test_cancel_pending_only() {
	let engine = engine(fn_submitter(|_: &QueuedTransaction| Ok("0x1".to_string())));
	let id = engine.enqueue(intent("a")).await;

	engine.cancel(&id).await.unwrap();
	assert_eq!(status_of(&engine, &id).await, TransactionStatus::Cancelled);

	assert!(matches!(
		engine.cancel(&id).await,
		Err(QueueError::Refused { operation: "cancel", .. })
	));
	assert_eq!(
		engine.cancel("tx-missing").await,
		Err(QueueError::NotFound("tx-missing".to_string()))
	);

	engine.process_queue().await;
	assert_eq!(status_of(&engine, &id).await, TransactionStatus::Cancelled);
}

#[tokio::test]
async fn test_operations_refused_during_pass() {
	let (started_tx, mut started) = mpsc::unbounded_channel();
	let gate = Arc::new(Notify::new());
	let engine = Arc::new(engine(Arc::new(GatedSubmitter {
		started: started_tx,
		gate: Some(gate.clone()),
	})));

	let first = engine.enqueue(intent("first")).await;
	let second = engine.enqueue(intent("second")).await;
	let third = engine.enqueue(intent("third")).await;

	let pass = engine.spawn_processing();
	assert_eq!(started.recv().await.unwrap(), first);

	// the processing entry cannot be cancelled or removed
	assert!(matches!(
		engine.cancel(&first).await,
		Err(QueueError::Refused { .. })
	));
	assert_eq!(status_of(&engine, &first).await, TransactionStatus::Processing);
	assert!(engine.remove(&third).await.is_err());
	assert!(engine.clear_all().await.is_err());

	// a second pass is a no-op while this one runs
	engine.process_queue().await;
	assert!(engine.is_processing());

	// cancelled after the snapshot, so it is skipped
	engine.cancel(&second).await.unwrap();

	let state = engine.state().await;
	assert!(state.is_processing);
	assert_eq!(state.current_index, 0);

	gate.notify_one();
	assert_eq!(started.recv().await.unwrap(), third);
	gate.notify_one();
	pass.await.unwrap();

	assert_eq!(status_of(&engine, &first).await, TransactionStatus::Completed);
	assert_eq!(status_of(&engine, &second).await, TransactionStatus::Cancelled);
	assert_eq!(status_of(&engine, &third).await, TransactionStatus::Completed);
	assert!(started.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_pause_and_resume_keep_order() {
	let (started_tx, mut started) = mpsc::unbounded_channel();
	let engine = Arc::new(TransactionQueueEngine::new(
		Arc::new(GatedSubmitter {
			started: started_tx,
			gate: None,
		}),
		EventBus::new(64),
		settings(Duration::from_secs(1)),
	));

	let mut ids = Vec::new();
	for n in 1..=5 {
		ids.push(engine.enqueue(intent(&format!("t{}", n))).await);
	}

	let pass = engine.spawn_processing();
	assert_eq!(started.recv().await.unwrap(), ids[0]);
	assert_eq!(started.recv().await.unwrap(), ids[1]);
	engine.pause().await.unwrap();
	pass.await.unwrap();

	assert!(engine.is_paused());
	assert!(!engine.is_processing());
	assert_eq!(status_of(&engine, &ids[0]).await, TransactionStatus::Completed);
	assert_eq!(status_of(&engine, &ids[1]).await, TransactionStatus::Completed);
	for id in &ids[2..] {
		assert_eq!(status_of(&engine, id).await, TransactionStatus::Pending);
	}
	assert!(started.try_recv().is_err());

	engine.resume().await;
	assert!(!engine.is_paused());
	for id in &ids[2..] {
		assert_eq!(started.recv().await.unwrap(), *id);
		assert_eq!(status_of(&engine, id).await, TransactionStatus::Completed);
	}
	assert!(started.try_recv().is_err());
	assert_eq!(engine.state().await.completed, 3);
}

#[tokio::test]
async fn test_pause_refused_when_idle() {
	let engine = engine(fn_submitter(|_: &QueuedTransaction| Ok("0x1".to_string())));
	assert!(matches!(
		engine.pause().await,
		Err(QueueError::Refused { operation: "pause", .. })
	));
	assert!(!engine.is_paused());
}

#[tokio::test]
async fn test_clear_completed_preserves_unfinished_order() {
	let submitter = fn_submitter(|tx: &QueuedTransaction| match tx.description.as_str() {
		"fail" => Err("nope".to_string()),
		_ => Ok("0x1".to_string()),
	});
	let engine = engine(submitter);

	engine.enqueue(intent("ok")).await;
	engine.enqueue(intent("fail")).await;
	let cancelled = engine.enqueue(intent("cancel-me")).await;
	engine.cancel(&cancelled).await.unwrap();
	engine.process_queue().await;

	let later_a = engine.enqueue(intent("later-a")).await;
	let later_b = engine.enqueue(intent("later-b")).await;

	assert_eq!(engine.clear_completed().await, 3);
	let remaining: Vec<_> = engine.transactions().await.into_iter().map(|t| t.id).collect();
	assert_eq!(remaining, vec![later_a, later_b]);
}

#[tokio::test]
async fn test_remove_and_clear_all_when_idle() {
	let engine = engine(fn_submitter(|_: &QueuedTransaction| Ok("0x1".to_string())));
	let a = engine.enqueue(intent("a")).await;
	engine.enqueue(intent("b")).await;

	engine.remove(&a).await.unwrap();
	assert_eq!(
		engine.remove(&a).await,
		Err(QueueError::NotFound(a.clone()))
	);
	assert_eq!(engine.clear_all().await.unwrap(), 1);
	assert!(engine.transactions().await.is_empty());
}

#[tokio::test]
async fn test_events_describe_the_pass() {
	let engine = engine(fn_submitter(|_: &QueuedTransaction| Ok("0xabc".to_string())));
	let mut events = engine.event_bus.subscribe();

	let id = engine.enqueue(intent("pay A")).await;
	engine.process_queue().await;
	engine.cancel(&id).await.unwrap_err();

	let mut kinds = Vec::new();
	while let Ok(event) = events.try_recv() {
		kinds.push(event.kind);
		if event.kind == QueueEventKind::TransactionSubmitted {
			assert_eq!(event.transaction_id.as_deref(), Some(id.as_str()));
			assert_eq!(event.message, "pay A: 0xabc");
		}
	}
	assert_eq!(
		kinds,
		vec![
			QueueEventKind::Enqueued,
			QueueEventKind::PassStarted,
			QueueEventKind::TransactionSubmitted,
			QueueEventKind::PassCompleted,
			QueueEventKind::OperationRefused,
		]
	);
}

#[tokio::test]
async fn test_successful_submissions_are_saved_to_history() {
	let history = Arc::new(TransactionHistory::new(Arc::new(StorageService::new(
		Box::new(MemoryStorage::new()),
	))));
	let submitter = fn_submitter(|tx: &QueuedTransaction| match tx.description.as_str() {
		"bad" => Err("reverted".to_string()),
		_ => Ok(format!("0x{}", tx.description)),
	});
	let engine = engine(submitter).with_history(history.clone());

	let good = engine.enqueue(intent("good")).await;
	engine.enqueue(intent("bad")).await;
	engine.process_queue().await;

	let records = history.list().await.unwrap();
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].hash, "0xgood");
	assert_eq!(records[0].queue_id, good);
	assert_eq!(records[0].chain_id, 31337);
	assert_eq!(records[0].status, HistoryStatus::Submitted);
}

#[tokio::test]
async fn test_pause_during_last_entry_leaves_queue_idle() {
	let gate = Arc::new(Notify::new());
	let (submitter, mut started) = gated(&gate);
	let engine = Arc::new(engine(submitter));
	let mut events = engine.event_bus.subscribe();

	let id = engine.enqueue(intent("only")).await;
	let pass = engine.spawn_processing();
	assert_eq!(started.recv().await.unwrap(), id);

	engine.pause().await.unwrap();
	gate.notify_one();
	pass.await.unwrap();

	let state = engine.state().await;
	assert!(!state.is_processing);
	assert!(!state.is_paused);
	assert_eq!(state.current_index, -1);
	assert_eq!(state.completed, 1);
	assert_eq!(status_of(&engine, &id).await, TransactionStatus::Completed);
	assert_eq!(
		drain_kinds(&mut events),
		vec![
			QueueEventKind::Enqueued,
			QueueEventKind::PassStarted,
			QueueEventKind::TransactionSubmitted,
			QueueEventKind::PassCompleted,
		]
	);
}

#[tokio::test]
async fn test_entries_enqueued_during_pass_wait_for_next_pass() {
	let gate = Arc::new(Notify::new());
	let (submitter, mut started) = gated(&gate);
	let engine = Arc::new(engine(submitter));

	let first = engine.enqueue(intent("first")).await;
	let pass = engine.spawn_processing();
	assert_eq!(started.recv().await.unwrap(), first);

	let late = engine.enqueue(intent("late")).await;
	gate.notify_one();
	pass.await.unwrap();

	assert_eq!(status_of(&engine, &first).await, TransactionStatus::Completed);
	assert_eq!(status_of(&engine, &late).await, TransactionStatus::Pending);
	assert!(started.try_recv().is_err());

	gate.notify_one();
	engine.process_queue().await;
	assert_eq!(started.recv().await.unwrap(), late);
	assert_eq!(status_of(&engine, &late).await, TransactionStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_inter_transaction_delay_paces_submissions() {
	let submitter = Arc::new(TimedSubmitter::default());
	let engine = TransactionQueueEngine::new(
		submitter.clone(),
		EventBus::new(64),
		settings(Duration::from_secs(1)),
	);
	for n in 1..=3 {
		engine.enqueue(intent(&format!("t{}", n))).await;
	}

	let start = Instant::now();
	engine.process_queue().await;
	let finished = Instant::now();

	let started_at = submitter.started_at.lock().unwrap().clone();
	assert_eq!(started_at.len(), 3);
	assert!(started_at[1].duration_since(started_at[0]) >= Duration::from_secs(1));
	assert!(started_at[2].duration_since(started_at[1]) >= Duration::from_secs(1));
	// no wait after the last entry
	assert!(finished.duration_since(started_at[2]) < Duration::from_secs(1));
	assert!(finished.duration_since(start) < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_second_submission_waits_for_delay() {
	let (started_tx, mut started) = mpsc::unbounded_channel();
	let engine = Arc::new(TransactionQueueEngine::new(
		Arc::new(GatedSubmitter {
			started: started_tx,
			gate: None,
		}),
		EventBus::new(64),
		settings(Duration::from_secs(1)),
	));
	let first = engine.enqueue(intent("a")).await;
	let second = engine.enqueue(intent("b")).await;

	let pass = engine.spawn_processing();
	assert_eq!(started.recv().await.unwrap(), first);

	tokio::time::advance(Duration::from_millis(900)).await;
	tokio::task::yield_now().await;
	assert!(started.try_recv().is_err());
	assert_eq!(status_of(&engine, &second).await, TransactionStatus::Pending);

	tokio::time::advance(Duration::from_millis(100)).await;
	assert_eq!(started.recv().await.unwrap(), second);
	pass.await.unwrap();
}

#[tokio::test]
async fn test_resume_announces_only_real_resumes() {
	let gate = Arc::new(Notify::new());
	let (submitter, mut started) = gated(&gate);
	let engine = Arc::new(engine(submitter));
	let mut events = engine.event_bus.subscribe();

	engine.enqueue(intent("a")).await;
	let pass = engine.spawn_processing();
	started.recv().await.unwrap();

	// running and not paused: nothing to resume
	engine.resume().await;
	gate.notify_one();
	pass.await.unwrap();
	assert!(!drain_kinds(&mut events).contains(&QueueEventKind::PassResumed));

	// idle: resume starts a new pass
	engine.resume().await;
	assert_eq!(
		drain_kinds(&mut events),
		vec![
			QueueEventKind::PassResumed,
			QueueEventKind::PassStarted,
			QueueEventKind::PassCompleted,
		]
	);
}
