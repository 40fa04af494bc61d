//! Worker coordinator behavior: ordering, busy discipline, failure isolation

use helix_ingest::events::{Severity, StatusEvent};
use helix_ingest::worker::{Submission, WorkerCoordinator};
use tokio::sync::mpsc::UnboundedReceiver;

async fn collect(mut events: UnboundedReceiver<StatusEvent>) -> Vec<StatusEvent> {
    let mut received = Vec::new();
    while let Some(event) = events.recv().await {
        let terminal = event.severity == Severity::Complete;
        received.push(event);
        if terminal {
            break;
        }
    }
    received
}

#[tokio::test]
async fn accepted_submission_runs_to_completion_in_order() {
    let coordinator = WorkerCoordinator::new();

    let submission = coordinator.submit(|events| {
        for i in 0..10 {
            let _ = events.send(StatusEvent::info(format!("step {}", i)));
        }
        Ok(())
    });

    let Submission::Accepted { events, handle } = submission else {
        panic!("expected submission to be accepted");
    };

    let received = collect(events).await;
    handle.await.unwrap();

    assert_eq!(received.len(), 11);
    for (i, event) in received.iter().take(10).enumerate() {
        assert_eq!(event.message, format!("step {}", i));
        assert_eq!(event.severity, Severity::Info);
    }
    assert_eq!(received[10].severity, Severity::Complete);

    // The busy flag clears before the complete event is sent
    assert!(!coordinator.is_busy());
}

#[tokio::test]
async fn second_submission_is_rejected_while_worker_active() {
    let coordinator = WorkerCoordinator::new();
    let (gate_tx, gate_rx) = std::sync::mpsc::channel::<()>();

    let first = coordinator.submit(move |_| {
        gate_rx.recv().ok();
        Ok(())
    });
    let Submission::Accepted { handle, .. } = first else {
        panic!("expected first submission to be accepted");
    };

    assert!(coordinator.is_busy());
    assert!(coordinator.submit(|_| Ok(())).is_busy());

    gate_tx.send(()).unwrap();
    handle.await.unwrap();
    assert!(!coordinator.is_busy());

    // Once the worker finished, the next submission is accepted again
    match coordinator.submit(|_| Ok(())) {
        Submission::Accepted { handle, .. } => handle.await.unwrap(),
        Submission::Busy => panic!("coordinator stayed busy after completion"),
    }
}

#[tokio::test]
async fn failed_operation_emits_error_then_complete() {
    let coordinator = WorkerCoordinator::new();

    let submission = coordinator.submit(|events| {
        let _ = events.send(StatusEvent::info("starting"));
        Err(anyhow::anyhow!("listing refused"))
    });
    let Submission::Accepted { events, handle } = submission else {
        panic!("expected submission to be accepted");
    };

    let received = collect(events).await;
    handle.await.unwrap();

    assert_eq!(received.len(), 3);
    assert_eq!(received[1].severity, Severity::Error);
    assert!(received[1].message.contains("listing refused"));
    assert_eq!(received[2].severity, Severity::Complete);
    assert!(!coordinator.is_busy());
}

#[tokio::test]
async fn panicking_operation_is_contained_and_completes() {
    let coordinator = WorkerCoordinator::new();

    let submission = coordinator.submit(|_| panic!("unexpected worker fault"));
    let Submission::Accepted { events, handle } = submission else {
        panic!("expected submission to be accepted");
    };

    let received = collect(events).await;
    handle.await.unwrap();

    assert_eq!(received.len(), 2);
    assert_eq!(received[0].severity, Severity::Error);
    assert!(received[0].message.contains("unexpected worker fault"));
    assert_eq!(received[1].severity, Severity::Complete);

    // The control context is not left permanently busy
    match coordinator.submit(|_| Ok(())) {
        Submission::Accepted { handle, .. } => handle.await.unwrap(),
        Submission::Busy => panic!("coordinator stayed busy after panic"),
    }
}
