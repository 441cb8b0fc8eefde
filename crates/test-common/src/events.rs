//! Helpers for draining and inspecting install event streams.

use olaf::{
    diagnostic::{Diagnostic, DiagnosticKind},
    install::{
        InstallReport,
        event::{EventStream, InstallEvent, OperationResult},
    },
};

/// Drain `stream` until the install task drops its sender.
pub async fn collect_events(mut stream: EventStream) -> Vec<InstallEvent> {
    let mut events = Vec::new();
    while let Some(event) = futures::StreamExt::next(&mut stream).await {
        events.push(event);
    }
    events
}

/// The result carried by the `Completed` event, if one was sent.
#[must_use]
pub fn get_operation_result(events: &[InstallEvent]) -> Option<&OperationResult> {
    events.iter().find_map(|event| match event {
        InstallEvent::Completed { result, .. } => Some(result),
        _ => None,
    })
}

fn count(events: &[InstallEvent], predicate: impl Fn(&InstallEvent) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

/// One `Started`, some progress, one `Completed` with a report, and no `Error`.
///
/// # Panics
/// Panics when the stream does not look like a successful install.
pub fn assert_successful_operation(events: &[InstallEvent]) {
    assert_eq!(
        count(events, |e| matches!(e, InstallEvent::Started { .. })),
        1,
        "expected exactly one Started event"
    );
    assert!(
        count(events, |e| matches!(e, InstallEvent::Progress { .. })) > 0,
        "expected progress events"
    );
    assert_eq!(
        count(events, |e| matches!(e, InstallEvent::Completed { .. })),
        1,
        "expected exactly one Completed event"
    );

    let errors: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            InstallEvent::Error { message, .. } => Some(message.as_str()),
            _ => None,
        })
        .collect();
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");

    let result = get_operation_result(events);
    assert!(
        matches!(result, Some(OperationResult::Success(_))),
        "expected a successful install, got: {result:?}"
    );
}

/// At least one `Error` event, and a `Completed` failure.
///
/// # Panics
/// Panics when the stream does not end in a failed install.
pub fn assert_failed_operation(events: &[InstallEvent]) {
    assert!(
        count(events, |e| matches!(e, InstallEvent::Error { .. })) > 0,
        "expected an Error event"
    );

    let result = get_operation_result(events);
    assert!(
        matches!(result, Some(OperationResult::Failure(_))),
        "expected a failed install, got: {result:?}"
    );
}

/// The report of a successful install.
///
/// # Panics
/// Panics if the install did not complete successfully.
#[must_use]
pub fn get_install_report(events: &[InstallEvent]) -> &InstallReport {
    match get_operation_result(events) {
        Some(OperationResult::Success(report)) => report,
        other => panic!("Expected a successful install, got: {other:?}"),
    }
}

/// Every diagnostic event of one kind, in emission order.
#[must_use]
pub fn get_diagnostics(events: &[InstallEvent], kind: DiagnosticKind) -> Vec<&Diagnostic> {
    events
        .iter()
        .filter_map(|e| match e {
            InstallEvent::Diagnostic { diagnostic, .. } if diagnostic.kind() == kind => {
                Some(diagnostic)
            }
            _ => None,
        })
        .collect()
}
