//! Integration tests for substitutes wrapping a real target.

#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::tests_outside_test_module,
        reason = "Test allows"
    )
)]

mod common;

use std::sync::Arc;

use common::{InMemoryTaskList, TaskList, TaskListFactory, task_list_add, task_list_to_array};
use surrogate_core::{
    ArgumentSpecification, CallSpecification, ContextToken, EngineConfig, Error, Invocation,
    Quantity, Response, Value,
};
use surrogate_proxy::SubstituteFactory;

#[derive(Debug, thiserror::Error)]
#[error("task list is read-only")]
struct ReadOnly;

fn add_spec(task: &str) -> CallSpecification {
    CallSpecification::with_values(task_list_add(), vec![Value::new(task.to_owned())]).unwrap()
}

#[test]
fn test_unconfigured_calls_reach_the_target() {
    let target = Arc::new(InMemoryTaskList::default());
    let factory = SubstituteFactory::default();
    let list = factory
        .create_for_target(&TaskListFactory, Arc::clone(&target) as Arc<dyn TaskList>)
        .unwrap();

    list.add("draft").unwrap();
    list.add("review").unwrap();

    assert_eq!(
        target.to_array().unwrap(),
        vec!["draft".to_owned(), "review".to_owned()]
    );
    assert!(list.router().received_in_order(&[add_spec("draft"), add_spec("review")]));
}

#[test]
fn test_configured_calls_do_not_reach_the_target() {
    let target = Arc::new(InMemoryTaskList::default());
    let factory = SubstituteFactory::default();
    let list = factory
        .create_for_target(&TaskListFactory, Arc::clone(&target) as Arc<dyn TaskList>)
        .unwrap();
    list.router()
        .configure_response(add_spec("forbidden"), Response::raise(ReadOnly));
    list.router().configure_response(
        CallSpecification::with_any_arguments(task_list_to_array()),
        Response::value(Value::new(vec!["stubbed".to_owned()])),
    );

    let error = list.add("forbidden").unwrap_err();
    assert!(error.downcast_raised::<ReadOnly>().is_some());
    list.add("allowed").unwrap();

    assert_eq!(list.to_array().unwrap(), vec!["stubbed".to_owned()]);
    assert_eq!(target.to_array().unwrap(), vec!["allowed".to_owned()]);
}

#[test]
fn test_base_exclusion_keeps_calls_away_from_the_target() {
    let target = Arc::new(InMemoryTaskList::default());
    let factory = SubstituteFactory::default();
    let list = factory
        .create_for_target(&TaskListFactory, Arc::clone(&target) as Arc<dyn TaskList>)
        .unwrap();
    list.router()
        .exclude_from_base(CallSpecification::with_any_arguments(task_list_add()));

    list.add("ignored").unwrap();

    assert!(target.to_array().unwrap().is_empty());
    assert!(list.to_array().unwrap().is_empty());
    list.router()
        .check_received(&add_spec("ignored"), Quantity::Exactly(1))
        .unwrap();
}

#[test]
fn test_queued_matcher_binds_to_the_next_call() {
    let factory = SubstituteFactory::default();
    let list = factory.create_partial(&TaskListFactory).unwrap();

    list.router()
        .enqueue_argument_matcher(ArgumentSpecification::any::<String>());
    list.add("anything").unwrap();

    let calls = list.router().received_calls();
    let bound = CallSpecification::from_call(&calls[0]);
    assert_eq!(bound.to_string(), "add(any alloc::string::String)");

    list.add("something else").unwrap();
    list.router()
        .check_received(&bound, Quantity::Exactly(2))
        .unwrap();
}

#[test]
fn test_matcher_queue_is_shared_between_substitutes() {
    let factory = SubstituteFactory::default();
    let first = factory.create_partial(&TaskListFactory).unwrap();
    let second = factory.create_partial(&TaskListFactory).unwrap();

    first
        .router()
        .enqueue_argument_matcher(ArgumentSpecification::any::<String>());
    second.add("bound here").unwrap();

    assert_eq!(second.router().received_calls()[0].argument_specs().len(), 1);
    assert!(first.router().received_calls().is_empty());
}

#[test]
fn test_matchers_survive_nested_parameterless_calls() {
    let factory = SubstituteFactory::default();
    let list = factory.create_partial(&TaskListFactory).unwrap();

    // Evaluating the arguments of `add` calls `to_array` before `add` runs.
    list.router()
        .enqueue_argument_matcher(ArgumentSpecification::any::<String>());
    let existing = list.to_array().unwrap();
    list.add(&format!("task {}", existing.len())).unwrap();

    let calls = list.router().received_calls();
    assert!(calls[0].argument_specs().is_empty());
    assert_eq!(
        CallSpecification::from_call(&calls[1]).to_string(),
        "add(any alloc::string::String)"
    );
    assert_eq!(list.to_array().unwrap(), vec!["task 0".to_owned()]);
}

#[test]
fn test_misused_matchers_fail_the_call() {
    let factory = SubstituteFactory::new(EngineConfig {
        call_base_by_default: false,
        check_matcher_types: false,
    });
    let list = factory.create_partial(&TaskListFactory).unwrap();
    let token = ContextToken::new();

    // Type checking is off, so a mistyped matcher binds and never matches.
    list.router()
        .enqueue_argument_matcher(ArgumentSpecification::any::<u32>());
    list.add("typed").unwrap();
    list.router()
        .check_received(
            &CallSpecification::from_call(&list.router().received_calls()[0]),
            Quantity::None,
        )
        .unwrap();

    // Surplus matchers are a count mismatch.
    list.router()
        .enqueue_argument_matcher_in(token, ArgumentSpecification::any::<String>());
    list.router()
        .enqueue_argument_matcher_in(token, ArgumentSpecification::any::<String>());
    let invocation = Invocation::new(
        task_list_add(),
        vec![Value::new("extra".to_owned())],
        list.router().id(),
    )
    .in_context(token);
    let error = list.router().intercept(invocation).unwrap_err();
    assert!(matches!(
        error.engine_error(),
        Some(Error::ArgumentMismatch {
            expected: 1,
            queued: 2,
            ..
        })
    ));
}
