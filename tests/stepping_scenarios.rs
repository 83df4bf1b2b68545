// End-to-end stepping scenarios: a scripted program on the traced thread,
// the session controller on the test thread.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use cell_debugger::host::{run_traced, ScriptedProgram};
use cell_debugger::router::{Command, SessionState};
use cell_debugger::session::{DebugSession, SessionConfig, SessionController};
use cell_debugger::snapshot::LocalValue;
use cell_debugger::EngineError;

const CELL: &str = "<cell-input-7>";

fn open_session(
    program: ScriptedProgram,
    code_lines: &[&str],
) -> (SessionController, JoinHandle<Result<(), EngineError>>) {
    let config = SessionConfig {
        mailbox_timeout: Some(Duration::from_secs(5)),
        ..SessionConfig::default()
    };
    let (tracer, controller) =
        DebugSession::open(code_lines.iter().map(|s| s.to_string()).collect(), config);
    let worker = thread::spawn(move || run_traced(tracer, program));
    (controller, worker)
}

/// Program with one function `f` calling `g`:
/// events `call f, line f#1, call g, line g#3, return g, line f#2, return f`.
fn f_and_g() -> ScriptedProgram {
    ScriptedProgram::new(CELL)
        .call("f", 1)
        .line("f", 1, &[("x", LocalValue::Int(1))])
        .call("g", 3)
        .line("g", 3, &[("y", LocalValue::Int(2))])
        .ret("g", 3)
        .line("f", 2, &[("x", LocalValue::Int(1))])
        .ret("f", 2)
}

const F_AND_G_SOURCE: [&str; 3] = ["alpha", "beta", "gamma"];

#[cfg(test)]
mod step_tests {
    use super::*;

    #[test]
    fn test_step_visits_every_user_line() {
        let (mut controller, worker) = open_session(f_and_g(), &F_AND_G_SOURCE);
        assert_eq!(controller.state(), SessionState::AwaitingFirstStop);

        // The first step drains the primed entry-point report, then
        // forwards the next stop.
        let messages = controller.handle(Command::Step).expect("first step");
        assert_eq!(messages.len(), 2);

        assert_eq!(messages[0]["event"], "line");
        assert_eq!(messages[0]["function_name"], "f");
        assert_eq!(messages[0]["lineno"], 1);
        assert_eq!(messages[0]["source_line"], "alpha");
        assert_eq!(messages[0]["filename"], CELL);
        assert_eq!(messages[0]["step_count"], 0);
        assert_eq!(messages[0]["locals_summary"][0]["name"], "x");
        assert_eq!(messages[0]["locals_summary"][0]["type"], "int");
        assert_eq!(messages[0]["locals_summary"][0]["snapshot"], "1");

        // The call into g never produces a stop; the next report is g#3.
        assert_eq!(messages[1]["function_name"], "g");
        assert_eq!(messages[1]["lineno"], 3);
        assert_eq!(messages[1]["source_line"], "gamma");
        assert_eq!(messages[1]["step_count"], 1);
        assert_eq!(controller.state(), SessionState::Stopped);

        // The return from g never produces a stop either; next is f#2.
        let messages = controller.handle(Command::Step).expect("second step");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["function_name"], "f");
        assert_eq!(messages[0]["lineno"], 2);
        assert_eq!(messages[0]["source_line"], "beta");
        assert_eq!(messages[0]["step_count"], 2);

        // Then the program runs off its end.
        let messages = controller.handle(Command::Step).expect("third step");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["event"], "terminated");
        assert_eq!(messages[0]["step_count"], 3);
        assert_eq!(controller.state(), SessionState::Completed);

        // Stepping a completed session is an error, not a hang.
        let err = controller.handle(Command::Step).unwrap_err();
        assert!(matches!(err, EngineError::SessionClosed));

        worker.join().unwrap().expect("traced thread ran to completion");
    }

    #[test]
    fn test_library_code_is_never_reported() {
        let program = ScriptedProgram::new(CELL)
            .call("f", 1)
            .line("f", 1, &[])
            .lib_call("site-packages/render.py", "render", 10)
            .lib_line("site-packages/render.py", "render", 11)
            .lib_ret("site-packages/render.py", "render", 12)
            .line("f", 2, &[])
            .ret("f", 2);
        let (mut controller, worker) = open_session(program, &F_AND_G_SOURCE);

        let messages = controller.handle(Command::Step).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["lineno"], 1);
        assert_eq!(
            messages[1]["lineno"], 2,
            "library frames must be skipped entirely"
        );
        assert_eq!(messages[1]["function_name"], "f");

        controller.close();
        worker.join().unwrap().unwrap();
    }

    #[test]
    fn test_out_of_range_line_degrades_to_null_source() {
        let program = ScriptedProgram::new(CELL)
            .call("f", 1)
            .line("f", 99, &[])
            .ret("f", 99);
        let (mut controller, worker) = open_session(program, &F_AND_G_SOURCE);

        let messages = controller.handle(Command::Step).unwrap();
        assert_eq!(messages[0]["lineno"], 99);
        assert!(
            messages[0]["source_line"].is_null(),
            "out-of-range lookup reports a null source line"
        );
        assert_eq!(messages[1]["event"], "terminated");

        worker.join().unwrap().unwrap();
    }
}

#[cfg(test)]
mod step_over_tests {
    use super::*;

    #[test]
    fn test_step_over_skips_deeper_frames() {
        let (mut controller, worker) = open_session(f_and_g(), &F_AND_G_SOURCE);

        // step-over as the very first command still drains the primed
        // entry-point report, then arms the depth filter without resuming.
        let messages = controller.handle(Command::StepOver).expect("step-over");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["function_name"], "f");
        assert_eq!(messages[0]["lineno"], 1);
        assert_eq!(controller.state(), SessionState::Stopped);

        // The resuming step passes over g entirely: the next stop is f#2.
        let messages = controller.handle(Command::Step).expect("resuming step");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["function_name"], "f");
        assert_eq!(messages[0]["lineno"], 2);
        assert_eq!(messages[0]["step_count"], 1);

        let messages = controller.handle(Command::Step).unwrap();
        assert_eq!(messages[0]["event"], "terminated");

        worker.join().unwrap().unwrap();
    }

    #[test]
    fn test_step_over_is_one_shot() {
        // Two nested calls in sequence: step-over skips the first, a plain
        // step afterwards descends into the second.
        let program = ScriptedProgram::new(CELL)
            .call("f", 1)
            .line("f", 1, &[])
            .call("g", 3)
            .line("g", 3, &[])
            .ret("g", 3)
            .line("f", 2, &[])
            .call("g", 3)
            .line("g", 3, &[])
            .ret("g", 3)
            .ret("f", 2);
        let (mut controller, worker) = open_session(program, &F_AND_G_SOURCE);

        controller.handle(Command::StepOver).unwrap();
        let messages = controller.handle(Command::Step).unwrap();
        assert_eq!(messages[0]["function_name"], "f");
        assert_eq!(messages[0]["lineno"], 2, "first call to g stepped over");

        let messages = controller.handle(Command::Step).unwrap();
        assert_eq!(
            messages[0]["function_name"], "g",
            "plain step descends into the second call"
        );

        controller.close();
        worker.join().unwrap().unwrap();
    }
}

#[cfg(test)]
mod dispatch_tests {
    use super::*;

    /// The engine's own message dispatcher runs inside the traced
    /// interpreter, between user-code events.
    fn program_with_dispatch_frames() -> ScriptedProgram {
        ScriptedProgram::new(CELL)
            .call("f", 1)
            .line("f", 1, &[])
            .call("comm_dispatch", 20)
            .line("comm_dispatch", 21, &[])
            .ret("comm_dispatch", 22)
            .call("g", 3)
            .line("g", 3, &[])
            .ret("g", 3)
            .line("f", 2, &[])
            .ret("f", 2)
    }

    #[test]
    fn test_dispatch_frames_are_never_reported() {
        let (mut controller, worker) =
            open_session(program_with_dispatch_frames(), &F_AND_G_SOURCE);

        let mut reported = Vec::new();
        loop {
            let messages = controller.handle(Command::Step).expect("step");
            let done = messages.iter().any(|m| m["event"] == "terminated");
            reported.extend(messages);
            if done {
                break;
            }
        }

        let stops: Vec<(&str, u64)> = reported
            .iter()
            .filter(|m| m["event"] == "line")
            .map(|m| {
                (
                    m["function_name"].as_str().unwrap(),
                    m["lineno"].as_u64().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            stops,
            vec![("f", 1), ("g", 3), ("f", 2)],
            "dispatch frames must never produce a stop"
        );

        worker.join().unwrap().unwrap();
    }

    #[test]
    fn test_dispatch_frames_do_not_shift_stack_depth() {
        let (mut controller, worker) =
            open_session(program_with_dispatch_frames(), &F_AND_G_SOURCE);

        // step-over armed at f#1 (depth 1): if the dispatch frame had been
        // pushed without a matching pop, the depth filter would also skip
        // f#2 and the session would run straight to termination.
        controller.handle(Command::StepOver).unwrap();
        let messages = controller.handle(Command::Step).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["function_name"], "f");
        assert_eq!(messages[0]["lineno"], 2);

        let messages = controller.handle(Command::Step).unwrap();
        assert_eq!(messages[0]["event"], "terminated");

        worker.join().unwrap().unwrap();
    }
}

#[cfg(test)]
mod inspect_tests {
    use super::*;

    #[test]
    fn test_inspect_value_reads_last_snapshot() {
        let (mut controller, worker) = open_session(f_and_g(), &F_AND_G_SOURCE);

        // After the first step we are stopped at g#3; its frame holds y.
        controller.handle(Command::Step).unwrap();
        let messages = controller
            .handle(Command::InspectValue {
                name: "y".to_string(),
            })
            .expect("inspect a visible local");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["name"], "y");
        assert_eq!(messages[0]["type"], "int");
        assert_eq!(messages[0]["value"], "2");

        // x lives in f's frame, not in the captured g frame.
        let err = controller
            .handle(Command::InspectValue {
                name: "x".to_string(),
            })
            .unwrap_err();
        match err {
            EngineError::NameNotFound(name) => assert_eq!(name, "x"),
            other => panic!("expected NameNotFound, got {:?}", other),
        }

        // The failed query changed nothing: stepping continues normally.
        assert_eq!(controller.state(), SessionState::Stopped);
        let messages = controller.handle(Command::Step).unwrap();
        assert_eq!(messages[0]["function_name"], "f");
        assert_eq!(messages[0]["lineno"], 2);

        controller.close();
        worker.join().unwrap().unwrap();
    }

    #[test]
    fn test_inspect_tensor_returns_full_payload() {
        let tensor = LocalValue::Tensor {
            dtype: "float32".to_string(),
            shape: vec![2],
            values: vec![1.5, 2.5],
        };
        let program = ScriptedProgram::new(CELL)
            .call("f", 1)
            .line("f", 1, &[("t", tensor)])
            .ret("f", 1);
        let (mut controller, worker) = open_session(program, &F_AND_G_SOURCE);

        let messages = controller.handle(Command::Step).unwrap();
        assert_eq!(messages[0]["locals_summary"][0]["snapshot"], "(2)-float32");
        assert_eq!(messages[0]["locals_summary"][0]["is_tensor"], true);

        let messages = controller
            .handle(Command::InspectValue {
                name: "t".to_string(),
            })
            .unwrap();
        assert_eq!(messages[0]["dtype"], "float32");
        assert_eq!(messages[0]["shape"][0], 2);
        assert_eq!(messages[0]["values"][1], 2.5);

        worker.join().unwrap().unwrap();
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;

    #[test]
    fn test_attach_message_carries_code_lines() {
        let (controller, worker) = open_session(f_and_g(), &F_AND_G_SOURCE);
        let attach = controller.attach_message();
        assert_eq!(attach["code_lines"][0], "alpha");
        assert_eq!(attach["code_lines"][2], "gamma");

        let mut controller = controller;
        controller.close();
        worker.join().unwrap().unwrap();
    }

    #[test]
    fn test_unknown_command_leaves_session_intact() {
        let (mut controller, worker) = open_session(f_and_g(), &F_AND_G_SOURCE);

        let err = controller
            .handle_json(r#"{"command":"continue"}"#)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownCommand(_)));
        assert_eq!(controller.state(), SessionState::AwaitingFirstStop);

        // The session still steps normally afterwards.
        let messages = controller.handle_json(r#"{"command":"step"}"#).unwrap();
        assert_eq!(messages[0]["function_name"], "f");

        controller.close();
        worker.join().unwrap().unwrap();
    }

    #[test]
    fn test_close_releases_blocked_tracer() {
        let (mut controller, worker) = open_session(f_and_g(), &F_AND_G_SOURCE);

        // The tracer is (or soon will be) blocked waiting for a command;
        // closing the session must let it exit instead of leaking.
        controller.close();
        assert_eq!(controller.state(), SessionState::Completed);
        worker
            .join()
            .expect("traced thread exits")
            .expect("poison teardown is a clean exit");
    }

    #[test]
    fn test_stack_underflow_is_fatal() {
        let program = ScriptedProgram::new(CELL)
            .call("f", 1)
            .line("f", 1, &[])
            .ret("f", 1)
            .ret("f", 1); // unmatched return
        let (mut controller, worker) = open_session(program, &F_AND_G_SOURCE);

        // The tracer aborts and releases both mailboxes. The entry-point
        // report drained by this step is still delivered; the dead session
        // surfaces on the next command instead of hanging.
        let messages = controller.handle(Command::Step).expect("primed report survives");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["lineno"], 1);
        assert_eq!(controller.state(), SessionState::Completed);

        let err = controller.handle(Command::Step).unwrap_err();
        assert!(matches!(err, EngineError::SessionClosed));

        let trace_result = worker.join().unwrap();
        match trace_result {
            Err(EngineError::StackUnderflow { function }) => assert_eq!(function, "f"),
            other => panic!("expected StackUnderflow, got {:?}", other),
        }
    }
}
