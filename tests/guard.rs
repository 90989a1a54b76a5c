//! Panic recovery through the guard.

use std::{
    io,
    sync::{Arc, Mutex},
    thread,
};

use errorx::{Cause, Error, TRACE_KEY, guard, is};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Buffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn recovered(err: Cause) -> Error {
    errorx::get(err).expect("an annotated error")
}

#[test]
fn test_panic_is_recovered_with_trace() {
    let err = guard::try_run(|| -> Result<(), Cause> { panic!("x") }).unwrap_err();
    let err = recovered(err);

    assert_eq!(err.message(), guard::PANIC_MESSAGE);
    assert_eq!(err.inner_error().unwrap().to_string(), "x");

    let trace = err.context()[TRACE_KEY].as_lines().unwrap();
    assert!(!trace.is_empty());
    assert!(err.to_string().starts_with("PANIC RECOVER: x. Context: \n\t"));
}

#[test]
fn test_success_is_untouched() {
    assert!(guard::try_run(|| Ok(())).is_ok());
    assert_eq!(guard::try_run(|| Ok::<_, Cause>("value")).unwrap(), "value");
}

#[test]
fn test_returned_error_wins() {
    let sentinel = Cause::msg("validation failed");
    let err = guard::try_run(|| -> Result<(), Cause> { Err(sentinel.clone()) }).unwrap_err();
    assert!(is(&err, &sentinel));
    assert!(err.as_plain().is_some());
}

#[test]
fn test_recovery_is_logged() {
    let buffer = Buffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::WARN)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let _ = guard::try_run(|| -> Result<(), Cause> { panic!("disk on fire") });
    });

    let output = buffer.contents();
    assert!(output.contains("WARN"));
    assert!(output.contains("recovered panic in guarded call"));
    assert!(output.contains("disk on fire"));
}

#[test]
fn test_guards_are_per_thread() {
    let handles: Vec<_> = (0..4)
        .map(|index| {
            thread::spawn(move || {
                guard::try_context(Some(index), |index: u32| -> Result<u32, Cause> {
                    if index % 2 == 0 {
                        panic!("worker {index}");
                    }
                    Ok(index)
                })
            })
        })
        .collect();

    for (index, handle) in handles.into_iter().enumerate() {
        let outcome = handle.join().expect("the guard keeps the thread alive");
        if index % 2 == 0 {
            let err = recovered(outcome.unwrap_err());
            assert_eq!(err.inner_error().unwrap().to_string(), format!("worker {index}"));
        } else {
            assert_eq!(outcome.unwrap(), index as u32);
        }
    }
}

#[test]
fn test_unguarded_panics_still_unwind() {
    // Installs the hook before the unguarded panic below.
    guard::try_must(|| -> Result<(), Cause> { panic!("guarded") });

    let outcome = thread::spawn(|| {
        panic!("unguarded");
    })
    .join();
    let payload = outcome.unwrap_err();
    let err = guard::catch_panic(Some(&*payload)).unwrap();
    assert_eq!(err.inner_error().unwrap().to_string(), "unguarded");
}
