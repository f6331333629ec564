use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

const FIRMWARE_URL: &str = "https://retrage.github.io/edk2-nightly/bin/RELEASEAARCH64_QEMU_EFI.fd";

// UEFI firmware for the on-target tests, fetched once into target/firmware.
// QEMU_EFI_FD points at a local copy instead.
fn main() {
    println!("cargo:rerun-if-env-changed=QEMU_EFI_FD");
    if std::env::var_os("QEMU_EFI_FD").is_some() {
        return;
    }

    let firmware_path = PathBuf::from("../target/firmware/RELEASEAARCH64_QEMU_EFI.fd");
    println!("cargo:rerun-if-changed={}", firmware_path.display());
    if firmware_path.exists() {
        return;
    }

    if let Some(parent) = firmware_path.parent() {
        fs::create_dir_all(parent).expect("failed to create firmware directory");
    }
    if let Err(err) = fetch_with_tools(FIRMWARE_URL, &firmware_path) {
        // host tests do not need firmware
        println!(
            "cargo:warning=failed to obtain UEFI firmware ({}); download {} to {} or set QEMU_EFI_FD",
            err,
            FIRMWARE_URL,
            firmware_path.display()
        );
    }
}

fn fetch_with_tools(url: &str, dest: &Path) -> Result<(), String> {
    if let Ok(status) = Command::new("curl")
        .arg("-fL")
        .arg("-o")
        .arg(dest)
        .arg(url)
        .status()
        && status.success()
    {
        return Ok(());
    }

    if let Ok(status) = Command::new("wget").arg("-O").arg(dest).arg(url).status()
        && status.success()
    {
        return Ok(());
    }

    let _ = fs::remove_file(dest);
    Err("neither 'curl' nor 'wget' succeeded (or were found)".into())
}
