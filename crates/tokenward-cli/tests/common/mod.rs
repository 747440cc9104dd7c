use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Credential with a readable payload:
/// `{"user_id":42,"is_admin":true,"iat":1700000000,"exp":4102444800,"type":"access"}`.
pub const TOKEN_42: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.eyJ1c2VyX2lkIjo0MiwiaXNfYWRtaW4iOnRydWUsImlhdCI6MTcwMDAwMDAwMCwiZXhwIjo0MTAyNDQ0ODAwLCJ0eXBlIjoiYWNjZXNzIn0.sig";

/// Run the CLI binary with an isolated data directory.
pub fn run_cli(args: &[&str], data_dir: &Path) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tokenward"));
    cmd.args(args);
    cmd.arg("--data-dir").arg(data_dir);
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("TOKENWARD_BASE_URL");
    cmd.env_remove("RUST_LOG");
    cmd.output().expect("Failed to execute CLI")
}

/// Run the CLI and expect success, returning stdout.
pub fn run_cli_success(args: &[&str], data_dir: &Path) -> String {
    let output = run_cli(args, data_dir);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI off the async runtime so a mock server can answer it.
pub async fn run_cli_async(args: &[&str], data_dir: &Path) -> Output {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let data_dir: PathBuf = data_dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_cli(&args, &data_dir)
    })
    .await
    .expect("CLI task panicked")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn status_json(data_dir: &Path) -> serde_json::Value {
    let out = run_cli_success(&["status", "--json"], data_dir);
    serde_json::from_str(&out).expect("status output is JSON")
}
