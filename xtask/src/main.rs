// xtask/src/main.rs

use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;

/// Targets the library is cross-checked for by `cargo xtask build`.
const CROSS_TARGETS: &[&str] = &["aarch64-unknown-none", "armv7a-none-eabi"];

/// Target the on-target integration tests run on.
const UEFI_TARGET: &str = "aarch64-unknown-uefi";

/// Target the bare-metal 32-bit tests run on.
const ARM_TARGET: &str = "armv7a-none-eabi";

const TEST_TIMEOUT_SECS: u64 = 30;

// Parts of `cargo metadata` the default test plan needs
#[derive(Debug, serde::Deserialize)]
struct CargoMetadata {
    packages: Vec<Package>,
    workspace_members: Vec<String>, // ids matching `Package::id`
}

#[derive(Debug, serde::Deserialize)]
struct Package {
    id: String,
    name: String,
}

#[derive(Debug, Default)]
struct TestPlan {
    std_crates: Vec<String>,
    uefi_tests: Vec<(String, String)>,
    arm_tests: Vec<(String, String)>,
}

fn main() {
    let mut args = std::env::args().skip(1);
    let command = args.next();
    let remaining_args: Vec<String> = args.collect();

    match command.as_deref() {
        Some("build") => build(&remaining_args),
        Some("test") => test(&remaining_args),
        Some(cmd) => {
            eprintln!("Error: Unknown command '{}'", cmd);
            eprintln!("Usage: cargo xtask [build|test] [args...]");
            std::process::exit(1);
        }
        None => {
            eprintln!("Error: No command provided.");
            eprintln!("Usage: cargo xtask [build|test] [args...]");
            std::process::exit(1);
        }
    }
}

/// Builds `arch_hal` with the C entry points for every bare-metal target.
fn build(args: &[String]) {
    for target in CROSS_TARGETS {
        eprintln!("\n--- Building arch_hal for {} ---", target);
        let mut cmd = Command::new("cargo");
        cmd.arg("build")
            .arg("-p")
            .arg("arch_hal")
            .arg("--features")
            .arg("c-abi")
            .arg("--target")
            .arg(target)
            .args(args);

        let status = run_command(&mut cmd);
        if !status.success() {
            eprintln!("Error: cargo build failed for {} with status: {:?}", target, status);
            std::process::exit(status.code().unwrap_or(1));
        }
    }
    eprintln!("\n--- All targets built successfully ---");
}

fn test(args: &[String]) {
    let host_output = Command::new("rustc")
        .arg("--print")
        .arg("host-tuple")
        .output()
        .expect("Failed to run rustc --print host-tuple");
    let host_tuple = String::from_utf8(host_output.stdout)
        .expect("Invalid UTF-8 from rustc --print host-tuple")
        .trim()
        .to_string();
    eprintln!("Detected host target: {}", host_tuple);

    let repo_root = std::env::current_dir().expect("failed to get CWD");
    let plan = match std::fs::read_to_string(repo_root.join("xtest.txt")) {
        Ok(text) => parse_plan(&text),
        Err(_) => default_plan(),
    };

    let mut passed: Vec<String> = Vec::new();
    let mut failed: Vec<(String, i32)> = Vec::new();

    for pkg in &plan.std_crates {
        eprintln!("\n--- Running host tests for: {} ---", pkg);
        let mut cmd = cargo_test_command();
        cmd.arg("--target").arg(&host_tuple).arg("-p").arg(pkg).args(args);

        record(&mut passed, &mut failed, format!("std:{}", pkg), run_command(&mut cmd));
    }

    let runner_path = repo_root.join("scripts/run_qemu.sh");
    let runner = runner_path
        .to_str()
        .expect("runner path contains invalid UTF-8");
    for (pkg, testname) in &plan.uefi_tests {
        eprintln!(
            "\n--- Running UEFI test for: {}::{}, runner: {} ---",
            pkg, testname, runner
        );
        let mut cmd = cargo_test_command();
        cmd.arg("--target")
            .arg(UEFI_TARGET)
            .arg("-p")
            .arg(pkg)
            .arg("--features")
            .arg("uefi-test")
            .arg("--test")
            .arg(testname)
            .args(args)
            .env("CARGO_TARGET_AARCH64_UNKNOWN_UEFI_RUNNER", runner);

        let label = format!("uefi:{}::{}", pkg, testname);
        record(&mut passed, &mut failed, label, run_command(&mut cmd));
    }

    let arm_runner_path = repo_root.join("scripts/run_qemu_arm.sh");
    let arm_runner = arm_runner_path
        .to_str()
        .expect("runner path contains invalid UTF-8");
    for (pkg, testname) in &plan.arm_tests {
        eprintln!(
            "\n--- Running ARM test for: {}::{}, runner: {} ---",
            pkg, testname, arm_runner
        );
        let mut cmd = cargo_test_command();
        cmd.arg("--target")
            .arg(ARM_TARGET)
            .arg("-p")
            .arg(pkg)
            .arg("--features")
            .arg("arm-test")
            .arg("--test")
            .arg(testname)
            .args(args)
            .env("CARGO_TARGET_ARMV7A_NONE_EABI_RUNNER", arm_runner);

        let label = format!("arm:{}::{}", pkg, testname);
        record(&mut passed, &mut failed, label, run_command(&mut cmd));
    }

    eprintln!("\n===== Test Summary =====");
    eprintln!("Passed ({}):", passed.len());
    for p in &passed {
        eprintln!("  - {}", p);
    }
    if !failed.is_empty() {
        eprintln!("Failed ({}):", failed.len());
        for (f, code) in &failed {
            eprintln!("  - {} (code {})", f, code);
        }
        std::process::exit(1);
    }
    eprintln!("All tests passed (host + UEFI + ARM)");
}

/// Parses `xtest.txt`: `std <package>`, `uefi <package> <test>` and
/// `arm <package> <test>` lines, `#` comments and blank lines.
fn parse_plan(text: &str) -> TestPlan {
    let mut plan = TestPlan::default();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some("std"), Some(pkg), None) => plan.std_crates.push(pkg.to_string()),
            (Some("uefi"), Some(pkg), Some(test)) => {
                plan.uefi_tests.push((pkg.to_string(), test.to_string()))
            }
            (Some("arm"), Some(pkg), Some(test)) => {
                plan.arm_tests.push((pkg.to_string(), test.to_string()))
            }
            (Some("std"), _, _) => {
                eprintln!("xtest.txt:{}: expected: std <package>", lineno + 1)
            }
            (Some("uefi"), _, _) => eprintln!(
                "xtest.txt:{}: expected: uefi <package> <testname>",
                lineno + 1
            ),
            (Some("arm"), _, _) => eprintln!(
                "xtest.txt:{}: expected: arm <package> <testname>",
                lineno + 1
            ),
            (Some(other), _, _) => eprintln!(
                "xtest.txt:{}: unknown kind '{}'; expected 'std', 'uefi' or 'arm'",
                lineno + 1,
                other
            ),
            (None, _, _) => {}
        }
    }
    plan
}

/// Host tests for every member except the bare-metal ones, plus the
/// on-target sweep tests.
fn default_plan() -> TestPlan {
    let mut members = get_workspace_members().expect("Failed to get workspace members");
    members.retain(|n| n != "aarch64_test" && n != "aarch32_test" && n != "arch_hal");
    TestPlan {
        std_crates: members,
        uefi_tests: vec![("arch_hal".to_string(), "cache_sweep".to_string())],
        arm_tests: vec![("arch_hal".to_string(), "cache_sweep_arm".to_string())],
    }
}

// `timeout` wrapper when the host has one
fn cargo_test_command() -> Command {
    let timeout_help = Command::new("timeout").arg("--help").output();
    let mut cmd = match timeout_help {
        Ok(out) => {
            let mut c = Command::new("timeout");
            if String::from_utf8_lossy(&out.stdout).contains("--foreground") {
                c.arg("--foreground").arg("-k").arg("5s");
                c.arg(format!("{}s", TEST_TIMEOUT_SECS));
            } else {
                c.arg(TEST_TIMEOUT_SECS.to_string());
            }
            c.arg("cargo");
            c
        }
        Err(_) => Command::new("cargo"),
    };
    cmd.arg("test");
    cmd
}

fn run_command(cmd: &mut Command) -> ExitStatus {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    eprintln!("Running: {:?}", cmd);
    cmd.spawn()
        .unwrap_or_else(|e| panic!("Failed to spawn {:?}: {}", cmd, e))
        .wait()
        .unwrap_or_else(|e| panic!("Failed to wait for {:?}: {}", cmd, e))
}

fn record(
    passed: &mut Vec<String>,
    failed: &mut Vec<(String, i32)>,
    label: String,
    status: ExitStatus,
) {
    if status.success() {
        passed.push(label);
    } else {
        let code = status.code().unwrap_or(1);
        eprintln!("Error: {} failed (code {})", label, code);
        failed.push((label, code));
    }
}

/// Names of the workspace members, `xtask` excluded.
fn get_workspace_members() -> Result<Vec<String>, String> {
    let output = Command::new("cargo")
        .arg("metadata")
        .arg("--no-deps")
        .arg("--format-version")
        .arg("1")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn cargo metadata: {}", e))?
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for cargo metadata: {}", e))?;

    if !output.status.success() {
        return Err(format!(
            "cargo metadata failed with status: {:?}\nStderr: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    let metadata: CargoMetadata = serde_json::from_slice(&output.stdout)
        .map_err(|e| format!("Failed to parse cargo metadata JSON: {}", e))?;

    let mut member_names: Vec<String> = metadata
        .workspace_members
        .iter()
        .filter_map(|id| metadata.packages.iter().find(|p| &p.id == id))
        .map(|p| p.name.clone())
        .collect();
    member_names.retain(|name| name != "xtask");
    Ok(member_names)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plan_parsing() {
        let plan = parse_plan(
            "# host\nstd bitregs\nstd boot_mm\n\nuefi arch_hal cache_sweep\nbogus line\nuefi arch_hal\narm arch_hal cache_sweep_arm\narm arch_hal\n",
        );

        assert_eq!(plan.std_crates, vec!["bitregs", "boot_mm"]);
        assert_eq!(
            plan.uefi_tests,
            vec![("arch_hal".to_string(), "cache_sweep".to_string())]
        );
        assert_eq!(
            plan.arm_tests,
            vec![("arch_hal".to_string(), "cache_sweep_arm".to_string())]
        );
    }
}
