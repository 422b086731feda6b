use std::io::Write;
use std::process::{Command, Stdio};

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn bridge_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_action-buttons").expect("action-buttons test binary not built")
}

#[test]
fn help_mentions_bridge() {
    let output = Command::new(bridge_bin())
        .arg("--help")
        .output()
        .expect("run action-buttons --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("Action buttons bridge"));
    assert!(combined.contains("--panel-component"));
}

#[test]
fn rejects_invalid_panel_component() {
    let output = Command::new(bridge_bin())
        .args(["--no-logs", "--panel-component", "bad name"])
        .stdin(Stdio::null())
        .output()
        .expect("run action-buttons with bad component");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--panel-component"));
}

#[test]
fn answers_commands_and_exits_when_stdin_closes() {
    let mut child = Command::new(bridge_bin())
        .arg("--no-logs")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn action-buttons");

    {
        let mut stdin = child.stdin.take().expect("child stdin");
        writeln!(stdin, r#"{{"cmd":"action-buttons:generate-uuid"}}"#).expect("write command");
    }

    let output = child.wait_with_output().expect("wait for action-buttons");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "unexpected output: {stdout}");
    assert!(lines[0].contains(r#""event":"ready""#));
    assert!(lines[1].contains(r#""event":"uuid""#));
}
