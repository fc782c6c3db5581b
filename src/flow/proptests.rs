//! Property-based tests for the interview flow
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::session::SessionData;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_name() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z .'-]{0,40}"
}

/// Argument values, including the empty ones handlers must reject
fn arb_arg_value() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_name(),
        1 => Just(String::new()),
        1 => Just("  ".to_string()),
    ]
}

fn arb_history() -> impl Strategy<Value = String> {
    "[A-Za-z0-9][A-Za-z0-9 ,.]{0,120}"
}

fn arb_function() -> impl Strategy<Value = FunctionName> {
    prop_oneof![
        Just(FunctionName::CollectName),
        Just(FunctionName::CollectStartupHistory),
        Just(FunctionName::EndCall),
    ]
}

fn args_for(function: FunctionName, value: &str) -> serde_json::Value {
    match function {
        FunctionName::CollectName => json!({ "name": value }),
        FunctionName::CollectStartupHistory => json!({ "startup_history": value }),
        FunctionName::EndCall => json!({}),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// A valid interview always ends at `end` with exactly the supplied data
    #[test]
    fn prop_valid_sequence_collects_union_of_arguments(name in arb_name(), history in arb_history()) {
        let mut controller = FlowController::new();
        controller.initialize().unwrap();

        controller.call_function(&FunctionCall::new("collect_name", json!({ "name": name }))).unwrap();
        controller.call_function(&FunctionCall::new(
            "collect_startup_history",
            json!({ "startup_history": history }),
        )).unwrap();
        controller.call_function(&FunctionCall::new("end_call", json!({}))).unwrap();

        prop_assert_eq!(controller.current_node(), Some(NodeId::End));
        prop_assert_eq!(controller.session(), &SessionData { name, startup_history: history });
        prop_assert!(controller.session().is_complete());
    }

    /// Arbitrary call sequences never skip a node or move backwards, and a
    /// failed call never changes the active node
    #[test]
    fn prop_transitions_are_forward_only(
        calls in prop::collection::vec((arb_function(), arb_arg_value()), 0..12)
    ) {
        let mut controller = FlowController::new();
        controller.initialize().unwrap();

        for (function, value) in calls {
            let before = controller.current_node().unwrap();
            let outcome = controller.call_function(&FunctionCall::new(
                function.as_str(),
                args_for(function, &value),
            ));
            let after = controller.current_node().unwrap();

            match outcome {
                Ok(_) => {
                    let edge = transition::lookup(before, function);
                    prop_assert!(edge.is_some());
                    prop_assert_eq!((edge.unwrap().next)().id, after);
                }
                Err(FlowError::Argument { .. }) => {
                    prop_assert!(value.trim().is_empty());
                    prop_assert_eq!(before, after);
                }
                Err(_) => prop_assert_eq!(before, after),
            }
        }
    }

    /// Leaving at any point never fails and always reports the data so far
    #[test]
    fn prop_leave_always_reports_snapshot(steps in 0usize..4, name in arb_name()) {
        let mut controller = FlowController::new();
        if steps > 0 {
            controller.initialize().unwrap();
        }
        if steps > 1 {
            controller.call_function(&FunctionCall::new("collect_name", json!({ "name": name }))).unwrap();
        }
        if steps > 2 {
            controller.call_function(&FunctionCall::new(
                "collect_startup_history",
                json!({ "startup_history": "something" }),
            )).unwrap();
        }

        let expected = controller.snapshot();
        let effects = controller.on_participant_left("p-1", Some("left"));
        prop_assert_eq!(effects.len(), 1);
        match &effects[0] {
            Effect::CancelSession { snapshot, .. } => prop_assert_eq!(snapshot, &expected),
            other => prop_assert!(false, "unexpected effect {:?}", other),
        }
        prop_assert!(controller.is_terminated());
    }
}
