use std::io::{self, BufRead, Write};
use std::thread;

use cell_debugger::host::{run_traced, ScriptedProgram};
use cell_debugger::router::{error_message, SessionState};
use cell_debugger::session::{DebugSession, SessionConfig};
use cell_debugger::snapshot::LocalValue;

/// Demo driver: a scripted rendition of the sample cell below is debugged
/// over a JSON-lines transport on stdin/stdout. Each inbound line is one
/// command (`{"command":"step"}` etc.); each outbound line is one report.
fn main() -> io::Result<()> {
    env_logger::init();

    let code_lines: Vec<String> = [
        "def add_one(x):",
        "    out = x + 1",
        "    return out",
        "",
        "a = constant(3.14)",
        "x = 8",
        "y = 9",
        "z = x + y",
        "z = add_one(z)",
        "print(z)",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let (tracer, mut controller) = DebugSession::open(code_lines, SessionConfig::default());
    let program = sample_program();

    let worker = thread::spawn(move || run_traced(tracer, program));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", controller.attach_message())?;
    out.flush()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match controller.handle_json(&line) {
            Ok(messages) => {
                for message in messages {
                    writeln!(out, "{}", message)?;
                }
                out.flush()?;
            }
            Err(err) => match error_message(&err) {
                Some(message) => {
                    writeln!(out, "{}", message)?;
                    out.flush()?;
                }
                None => {
                    eprintln!("session error: {}", err);
                    break;
                }
            },
        }

        if controller.state() == SessionState::Completed {
            break;
        }
    }

    controller.close();
    match worker.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => eprintln!("traced program failed: {}", err),
        Err(_) => eprintln!("traced thread panicked"),
    }
    Ok(())
}

fn sample_program() -> ScriptedProgram {
    let tensor = LocalValue::Tensor {
        dtype: "float32".to_string(),
        shape: vec![],
        values: vec![3.14],
    };

    ScriptedProgram::new("<cell-input-1>")
        .call("<module>", 1)
        .line("<module>", 5, &[])
        .line("<module>", 6, &[("a", tensor.clone())])
        .line(
            "<module>",
            7,
            &[("a", tensor.clone()), ("x", LocalValue::Int(8))],
        )
        .line(
            "<module>",
            8,
            &[
                ("a", tensor.clone()),
                ("x", LocalValue::Int(8)),
                ("y", LocalValue::Int(9)),
            ],
        )
        .line(
            "<module>",
            9,
            &[
                ("a", tensor.clone()),
                ("x", LocalValue::Int(8)),
                ("y", LocalValue::Int(9)),
                ("z", LocalValue::Int(17)),
            ],
        )
        .call("add_one", 1)
        .line("add_one", 2, &[("x", LocalValue::Int(17))])
        .line(
            "add_one",
            3,
            &[("x", LocalValue::Int(17)), ("out", LocalValue::Int(18))],
        )
        .ret("add_one", 3)
        .line(
            "<module>",
            10,
            &[
                ("a", tensor),
                ("x", LocalValue::Int(8)),
                ("y", LocalValue::Int(9)),
                ("z", LocalValue::Int(18)),
            ],
        )
        .lib_call("render/display.py", "render_text", 12)
        .lib_line("render/display.py", "render_text", 13)
        .lib_ret("render/display.py", "render_text", 14)
        .ret("<module>", 10)
}
