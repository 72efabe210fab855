//! Module holders: the per-instance owner of a module's bridge state.
//!
//! A [`ModuleHolder`] wraps one module instance, derives its definition
//! exactly once, and mediates every interaction with it: constants
//! snapshots, sync and async calls, the lazily created script façade,
//! listener bookkeeping with observer notifications, and lifecycle event
//! fan-out. Dropping the holder posts `moduleDestroy` to the module's own
//! listeners.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, Weak};

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::context::AppContext;
use crate::definition::{EventName, ModuleDefinition};
use crate::error::{CallError, FunctionCallResult};
use crate::module::AnyModule;
use crate::runtime::ScriptObject;
use crate::shared_object::SharedObjectRegistry;
use crate::value::ScriptValue;

/// Function invoked when the listener count rises from zero.
pub const START_OBSERVING: &str = "startObserving";
/// Function invoked when the listener count returns to zero.
pub const STOP_OBSERVING: &str = "stopObserving";

/// Outcome of a synchronous call attempt.
///
/// `Unavailable` means the function either does not exist or is async-only;
/// the caller is expected to fall back to the async path. `Value` and
/// `Error` are terminal outcomes of an actual dispatch.
#[derive(Debug)]
pub enum SyncCallOutcome {
    /// No synchronous dispatch is possible for this function name.
    Unavailable,
    /// The call succeeded with this value.
    Value(ScriptValue),
    /// The call was dispatched and failed.
    Error(CallError),
}

impl SyncCallOutcome {
    /// Convert a terminal outcome into a `Result`, treating `Unavailable`
    /// as `None`.
    pub fn into_result(self) -> Option<FunctionCallResult> {
        match self {
            SyncCallOutcome::Unavailable => None,
            SyncCallOutcome::Value(value) => Some(Ok(value)),
            SyncCallOutcome::Error(err) => Some(Err(err)),
        }
    }
}

/// Owner of one module instance and its bridge-side state.
pub struct ModuleHolder {
    module: Box<dyn AnyModule>,
    definition: ModuleDefinition,
    app_context: Weak<AppContext>,
    shared_objects: Arc<SharedObjectRegistry>,
    script_object: OnceLock<Option<ScriptObject>>,
    listeners_count: Mutex<i64>,
}

impl ModuleHolder {
    /// Wrap a module instance, derive its definition, and announce the
    /// creation to the module's own `moduleCreate` listeners.
    ///
    /// The holder keeps its own handle to the context's shared object
    /// registry, so dispatch keeps working after the context is torn down.
    pub fn new(module: Box<dyn AnyModule>, app_context: Weak<AppContext>) -> Self {
        let definition = module.definition();
        let shared_objects = app_context
            .upgrade()
            .map(|context| context.shared_objects().clone())
            .unwrap_or_default();
        let holder = Self {
            module,
            definition,
            app_context,
            shared_objects,
            script_object: OnceLock::new(),
            listeners_count: Mutex::new(0),
        };
        holder.post(&EventName::ModuleCreate);
        holder
    }

    /// The module name.
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// The cached definition. Derived once in [`ModuleHolder::new`]; the
    /// underlying module is never asked again.
    pub fn definition(&self) -> &ModuleDefinition {
        &self.definition
    }

    /// The wrapped module instance.
    pub fn module(&self) -> &dyn AnyModule {
        &*self.module
    }

    /// Snapshot of the module's merged constants. Works with or without a
    /// live runtime.
    pub fn get_constants(&self) -> FxHashMap<String, ScriptValue> {
        self.definition.get_constants()
    }

    /// Current listener count.
    pub fn listeners_count(&self) -> i64 {
        *self.listeners_count.lock().unwrap()
    }

    /// Asynchronous call path.
    ///
    /// Looks up the function, casts arguments, invokes the implementation,
    /// and reports to `completion` exactly once. An unknown function name
    /// reports `FunctionNotFound` without touching native code. The
    /// completion may run synchronously on the calling context.
    pub fn call(
        &self,
        function: &str,
        args: &[ScriptValue],
        completion: impl FnOnce(FunctionCallResult),
    ) {
        let Some(component) = self.definition.function(function) else {
            completion(Err(CallError::FunctionNotFound {
                function: function.to_string(),
                module: self.name().to_string(),
            }));
            return;
        };
        component.call(args, &self.shared_objects, completion);
    }

    /// Synchronous call path.
    ///
    /// Returns [`SyncCallOutcome::Unavailable`] when the function does not
    /// exist or is async-only; native code is not invoked in either case.
    pub fn call_sync(&self, function: &str, args: &[ScriptValue]) -> SyncCallOutcome {
        let Some(component) = self.definition.function(function) else {
            return SyncCallOutcome::Unavailable;
        };
        if !component.is_sync() {
            return SyncCallOutcome::Unavailable;
        }
        match component.call_sync(args, &self.shared_objects) {
            Ok(value) => SyncCallOutcome::Value(value),
            Err(err) => SyncCallOutcome::Error(err),
        }
    }

    /// The script-visible façade for this module, created lazily through
    /// the runtime and memoized.
    ///
    /// Returns `None` when the app context or its runtime is absent at
    /// first access; that outcome is memoized too, so the façade state is
    /// stable for the holder's lifetime.
    pub fn script_object(&self) -> Option<&ScriptObject> {
        self.script_object
            .get_or_init(|| {
                let context = self.app_context.upgrade()?;
                let runtime = context.runtime()?.clone();
                Some(self.definition.build_script_object(&*runtime))
            })
            .as_ref()
    }

    /// Adjust the script-side listener count by `delta`, clamping at zero.
    ///
    /// Observer notifications fire only on the zero boundary: a rise from
    /// zero dispatches `startObserving`, a return to zero dispatches
    /// `stopObserving`. Both dispatch through the async path with failures
    /// logged, never surfaced to the caller.
    pub fn modify_listeners_count(&self, delta: i64) {
        let (before, after) = {
            let mut count = self.listeners_count.lock().unwrap();
            let before = *count;
            *count = (before + delta).max(0);
            (before, *count)
        };
        if before == 0 && after > 0 {
            self.dispatch_observer(START_OBSERVING);
        } else if before > 0 && after == 0 {
            self.dispatch_observer(STOP_OBSERVING);
        }
    }

    fn dispatch_observer(&self, function: &str) {
        if !self.definition.has_function(function) {
            return;
        }
        let module = self.name().to_string();
        self.call(function, &[], move |result| {
            if let Err(err) = result {
                warn!(module = %module, function, error = %err, "observer notification failed");
            }
        });
    }

    /// Post an event without a payload to this module's listeners.
    pub fn post(&self, event: &EventName) {
        self.fan_out(event, None);
    }

    /// Post an event with a payload to this module's listeners.
    pub fn post_with_payload(&self, event: &EventName, payload: &ScriptValue) {
        self.fan_out(event, Some(payload));
    }

    /// Best-effort fan-out in declaration order. A failing listener is
    /// logged and skipped; the remaining listeners still run.
    fn fan_out(&self, event: &EventName, payload: Option<&ScriptValue>) {
        for listener in self.definition.listeners_for(event) {
            if let Err(err) = listener.call(payload) {
                warn!(
                    module = %self.name(),
                    event = %event,
                    error = %err,
                    "event listener failed"
                );
            }
        }
    }
}

impl Drop for ModuleHolder {
    fn drop(&mut self) {
        self.post(&EventName::ModuleDestroy);
    }
}

impl fmt::Debug for ModuleHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHolder")
            .field("name", &self.name())
            .field("functions", &self.definition.function_count())
            .field("listeners_count", &self.listeners_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::ArgumentType;
    use crate::runtime::ScriptRuntime;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubRuntime;

    impl ScriptRuntime for StubRuntime {
        fn create_object(&self) -> ScriptObject {
            ScriptObject::new()
        }
    }

    struct Counter {
        observed: Arc<AtomicUsize>,
        unobserved: Arc<AtomicUsize>,
    }

    impl AnyModule for Counter {
        fn definition(&self) -> ModuleDefinition {
            let observed = self.observed.clone();
            let unobserved = self.unobserved.clone();
            ModuleDefinition::builder("Counter")
                .constant("MAX", ScriptValue::Int(100))
                .sync_function(
                    "add",
                    vec![ArgumentType::int(), ArgumentType::int()],
                    |args| match (&args[0], &args[1]) {
                        (ScriptValue::Int(a), ScriptValue::Int(b)) => Ok(ScriptValue::Int(a + b)),
                        _ => Err("bad arguments".into()),
                    },
                )
                .async_function("reset", vec![], |_| Ok(ScriptValue::Undefined))
                .sync_function(START_OBSERVING, vec![], move |_| {
                    observed.fetch_add(1, Ordering::SeqCst);
                    Ok(ScriptValue::Undefined)
                })
                .sync_function(STOP_OBSERVING, vec![], move |_| {
                    unobserved.fetch_add(1, Ordering::SeqCst);
                    Ok(ScriptValue::Undefined)
                })
                .build()
        }
    }

    fn counter_holder(context: &Arc<AppContext>) -> (ModuleHolder, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let observed = Arc::new(AtomicUsize::new(0));
        let unobserved = Arc::new(AtomicUsize::new(0));
        let holder = ModuleHolder::new(
            Box::new(Counter {
                observed: observed.clone(),
                unobserved: unobserved.clone(),
            }),
            Arc::downgrade(context),
        );
        (holder, observed, unobserved)
    }

    #[test]
    fn sync_call_returns_value() {
        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let (holder, _, _) = counter_holder(&context);

        match holder.call_sync("add", &[ScriptValue::Int(2), ScriptValue::Int(3)]) {
            SyncCallOutcome::Value(value) => assert_eq!(value, ScriptValue::Int(5)),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn sync_call_unavailable_for_unknown_and_async_only() {
        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let (holder, _, _) = counter_holder(&context);

        assert!(matches!(
            holder.call_sync("missing", &[]),
            SyncCallOutcome::Unavailable
        ));
        assert!(matches!(
            holder.call_sync("reset", &[]),
            SyncCallOutcome::Unavailable
        ));
    }

    #[test]
    fn sync_call_error_is_a_value() {
        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let (holder, _, _) = counter_holder(&context);

        match holder.call_sync("add", &[ScriptValue::Int(2)]) {
            SyncCallOutcome::Error(err) => assert!(err.is_cast_failure()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn async_call_unknown_function_reports_not_found() {
        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let (holder, _, _) = counter_holder(&context);

        let reported = AtomicUsize::new(0);
        holder.call("missing", &[], |result| {
            reported.fetch_add(1, Ordering::SeqCst);
            assert!(matches!(
                result,
                Err(CallError::FunctionNotFound { .. })
            ));
        });
        assert_eq!(reported.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn constants_snapshot_without_runtime() {
        let context = Arc::new(AppContext::without_runtime());
        let (holder, _, _) = counter_holder(&context);

        assert_eq!(
            holder.get_constants().get("MAX"),
            Some(&ScriptValue::Int(100))
        );
        assert!(holder.script_object().is_none());
    }

    #[test]
    fn script_object_memoized_with_runtime() {
        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let (holder, _, _) = counter_holder(&context);

        let object = holder.script_object().expect("runtime installed");
        assert_eq!(object.property("MAX"), Some(&ScriptValue::Int(100)));
        assert!(object.has_function("add"));

        let again = holder.script_object().expect("memoized");
        assert!(std::ptr::eq(object, again));
    }

    #[test]
    fn absent_facade_is_memoized() {
        let context = Arc::new(AppContext::without_runtime());
        let (holder, _, _) = counter_holder(&context);
        assert!(holder.script_object().is_none());
        assert!(holder.script_object().is_none());
    }

    #[test]
    fn listener_count_boundary_notifications() {
        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let (holder, observed, unobserved) = counter_holder(&context);

        holder.modify_listeners_count(1);
        assert_eq!(observed.load(Ordering::SeqCst), 1);

        // Already observing: no second notification.
        holder.modify_listeners_count(2);
        assert_eq!(observed.load(Ordering::SeqCst), 1);
        assert_eq!(holder.listeners_count(), 3);

        holder.modify_listeners_count(-2);
        assert_eq!(unobserved.load(Ordering::SeqCst), 0);

        holder.modify_listeners_count(-1);
        assert_eq!(unobserved.load(Ordering::SeqCst), 1);
        assert_eq!(holder.listeners_count(), 0);
    }

    #[test]
    fn listener_count_clamps_at_zero() {
        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let (holder, _, unobserved) = counter_holder(&context);

        holder.modify_listeners_count(-5);
        assert_eq!(holder.listeners_count(), 0);
        assert_eq!(unobserved.load(Ordering::SeqCst), 0);

        holder.modify_listeners_count(1);
        holder.modify_listeners_count(-5);
        assert_eq!(holder.listeners_count(), 0);
        assert_eq!(unobserved.load(Ordering::SeqCst), 1);
    }

    struct Lifecycle {
        log: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl AnyModule for Lifecycle {
        fn definition(&self) -> ModuleDefinition {
            let (l1, l2, l3) = (self.log.clone(), self.log.clone(), self.log.clone());
            ModuleDefinition::builder("Lifecycle")
                .event_listener(EventName::ModuleCreate, move |_| {
                    l1.lock().unwrap().push("create".into());
                    Ok(())
                })
                .event_listener(EventName::ModuleDestroy, move |_| {
                    l2.lock().unwrap().push("destroy-1".into());
                    Err("listener failed".into())
                })
                .event_listener(EventName::ModuleDestroy, move |_| {
                    l3.lock().unwrap().push("destroy-2".into());
                    Ok(())
                })
                .build()
        }
    }

    #[test]
    fn create_posted_on_new_and_destroy_on_drop() {
        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));

        let holder = ModuleHolder::new(
            Box::new(Lifecycle { log: log.clone() }),
            Arc::downgrade(&context),
        );
        assert_eq!(*log.lock().unwrap(), vec!["create".to_string()]);

        drop(holder);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "create".to_string(),
                "destroy-1".to_string(),
                "destroy-2".to_string()
            ]
        );
    }

    #[test]
    fn failing_listener_does_not_stop_fan_out() {
        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let log = Arc::new(std::sync::Mutex::new(Vec::new()));
        let holder = ModuleHolder::new(
            Box::new(Lifecycle { log: log.clone() }),
            Arc::downgrade(&context),
        );

        holder.post(&EventName::ModuleDestroy);
        let entries = log.lock().unwrap().clone();
        assert_eq!(entries, ["create", "destroy-1", "destroy-2"]);
    }

    #[test]
    fn payload_reaches_listeners() {
        struct Payload {
            seen: Arc<std::sync::Mutex<Option<ScriptValue>>>,
        }
        impl AnyModule for Payload {
            fn definition(&self) -> ModuleDefinition {
                let seen = self.seen.clone();
                ModuleDefinition::builder("Payload")
                    .event_listener(EventName::Custom("tick".into()), move |payload| {
                        *seen.lock().unwrap() = payload.cloned();
                        Ok(())
                    })
                    .build()
            }
        }

        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let seen = Arc::new(std::sync::Mutex::new(None));
        let holder = ModuleHolder::new(
            Box::new(Payload { seen: seen.clone() }),
            Arc::downgrade(&context),
        );

        holder.post_with_payload(&EventName::Custom("tick".into()), &ScriptValue::Int(7));
        assert_eq!(*seen.lock().unwrap(), Some(ScriptValue::Int(7)));
    }

    #[test]
    fn calls_survive_dropped_context() {
        let context = Arc::new(AppContext::new(Arc::new(StubRuntime)));
        let (holder, _, _) = counter_holder(&context);
        drop(context);

        match holder.call_sync("add", &[ScriptValue::Int(1), ScriptValue::Int(1)]) {
            SyncCallOutcome::Value(value) => assert_eq!(value, ScriptValue::Int(2)),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(holder.script_object().is_none());
    }
}
