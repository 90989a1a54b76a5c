#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Tracing integration for errorx errors.
//!
//! This crate connects [`errorx::Error`] with the [`tracing`] ecosystem in
//! two directions:
//!
//! - [`SpanExt::attach_span`] records the active span scope, including span
//!   field values, as context on an error.
//! - [`LogExt::log_error`] emits an error as a structured `tracing` event.
//!
//! # How It Works
//!
//! You add [`ErrorxLayer`] to your tracing subscriber alongside your existing
//! layers. It captures span field values when spans are created so they can
//! be rendered later into an error's context.
//!
//! # Quick Start
//!
//! ```
//! use errorx::{Cause, ResultExt};
//! use errorx_tracing::{ErrorxLayer, LogExt, SPAN_KEY, SpanExt};
//! use tracing_subscriber::{Registry, layer::SubscriberExt};
//!
//! let subscriber = Registry::default()
//!     .with(ErrorxLayer)
//!     .with(tracing_subscriber::fmt::layer());
//!
//! #[tracing::instrument(fields(user_id = 42))]
//! fn load_user() -> Result<(), Cause> {
//!     Err(Cause::msg("no rows"))
//!         .wrap_err("User Repository", "GetByID")
//!         .attach_span()
//! }
//!
//! tracing::subscriber::with_default(subscriber, || {
//!     let err = load_user().log_error().unwrap_err();
//!     let custom = err.as_error().unwrap();
//!     assert_eq!(
//!         custom.context()[SPAN_KEY].as_lines().unwrap(),
//!         ["load_user{user_id=42}"]
//!     );
//! });
//! ```

use std::fmt;

use errorx::{Cause, ContextValue, DEFAULT_TYPE, Error};
use tracing::{
    Span,
    field::{Field, Visit},
};

/// Context key under which [`SpanExt::attach_span`] stores the span scope.
pub const SPAN_KEY: &str = "span";

#[derive(Clone, Debug, Default)]
struct CapturedFields(String);

struct FieldVisitor<'a> {
    output: &'a mut String,
}

impl Visit for FieldVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        use std::fmt::Write;
        if !self.output.is_empty() {
            let _ = write!(self.output, " ");
        }
        let _ = write!(self.output, "{}={:?}", field.name(), value);
    }
}

/// A [`tracing_subscriber::Layer`] that captures span field values.
///
/// Without this layer, [`SpanExt::attach_span`] only knows span names.
#[derive(Copy, Clone, Debug, Default)]
pub struct ErrorxLayer;

impl<S> tracing_subscriber::Layer<S> for ErrorxLayer
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut fields = CapturedFields::default();
        attrs.record(&mut FieldVisitor {
            output: &mut fields.0,
        });
        span.extensions_mut().insert(fields);
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<CapturedFields>() {
            Some(fields) => values.record(&mut FieldVisitor {
                output: &mut fields.0,
            }),
            None => {
                let mut fields = CapturedFields::default();
                values.record(&mut FieldVisitor {
                    output: &mut fields.0,
                });
                extensions.insert(fields);
            }
        }
    }
}

/// Renders the current span scope, innermost span first.
///
/// Each line reads `name{field=value ...}`. Returns an empty list outside any
/// span or when the subscriber is not built on a
/// [`Registry`](tracing_subscriber::Registry).
pub fn current_span_scope() -> Vec<String> {
    use tracing_subscriber::registry::LookupSpan;

    let span = Span::current();
    span.with_subscriber(|(span_id, dispatch)| {
        let Some(registry) = dispatch.downcast_ref::<tracing_subscriber::Registry>() else {
            return Vec::new();
        };
        let Some(span_ref) = registry.span(span_id) else {
            return Vec::new();
        };

        span_ref
            .scope()
            .map(|ancestor| {
                let extensions = ancestor.extensions();
                match extensions.get::<CapturedFields>() {
                    Some(fields) if !fields.0.is_empty() => {
                        format!("{}{{{}}}", ancestor.name(), fields.0)
                    }
                    _ => ancestor.name().to_string(),
                }
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Extension trait for recording the active span scope on an error.
pub trait SpanExt: Sized {
    /// Stores the current span scope under [`SPAN_KEY`].
    ///
    /// Nothing is recorded outside a span. On a [`Cause`] only an annotated
    /// error can hold context; other handles are returned unchanged.
    #[must_use]
    fn attach_span(self) -> Self;
}

fn attach_scope(error: &mut Error) {
    let scope = current_span_scope();
    if !scope.is_empty() {
        error.add_context(SPAN_KEY, ContextValue::Lines(scope));
    }
}

impl SpanExt for Error {
    fn attach_span(mut self) -> Self {
        attach_scope(&mut self);
        self
    }
}

impl SpanExt for Cause {
    fn attach_span(mut self) -> Self {
        if let Some(error) = self.as_error_mut() {
            attach_scope(error);
        }
        self
    }
}

impl<V> SpanExt for Result<V, Error> {
    fn attach_span(self) -> Self {
        self.map_err(SpanExt::attach_span)
    }
}

impl<V> SpanExt for Result<V, Cause> {
    fn attach_span(self) -> Self {
        self.map_err(SpanExt::attach_span)
    }
}

/// Extension trait for emitting errors as `tracing` events.
pub trait LogExt: Sized {
    /// Emits one `ERROR` event for the error and passes it through.
    ///
    /// The event carries the rendered type as `error_type`, the rendered
    /// message as `error_message` and the full rendering as its message.
    #[must_use]
    fn log_error(self) -> Self;
}

fn emit(error_type: &str, message: &str, rendered: &dyn fmt::Display) {
    tracing::error!(
        error_type = %error_type,
        error_message = %message,
        "{rendered}"
    );
}

impl LogExt for Error {
    fn log_error(self) -> Self {
        emit(&self.error_type(), &self.message(), &self);
        self
    }
}

impl LogExt for Cause {
    fn log_error(self) -> Self {
        match errorx::try_get(&self) {
            Some(error) => emit(&error.error_type(), &error.message(), &self),
            None => emit(DEFAULT_TYPE, &self.to_string(), &self),
        }
        self
    }
}

impl<V> LogExt for Result<V, Error> {
    fn log_error(self) -> Self {
        self.map_err(LogExt::log_error)
    }
}

impl<V> LogExt for Result<V, Cause> {
    fn log_error(self) -> Self {
        self.map_err(LogExt::log_error)
    }
}
