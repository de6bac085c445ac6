//! CLI integration tests

#[path = "../../file-formats/disc/umd-iso/tests/common/mod.rs"]
mod common;

use assert_cmd::Command;
use common::{IsoBuilder, SyntheticIso};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use umd_io::MemoryCursor;
use umd_iso::IsoImage;

const EBOOT: &str = "PSP_GAME/SYSDIR/EBOOT.BIN";
const SFO: &str = "PSP_GAME/PARAM.SFO";

fn umd_patch() -> Command {
    Command::cargo_bin("umd-patch").unwrap()
}

fn write_image(dir: &Path) -> (SyntheticIso, PathBuf) {
    let iso = IsoBuilder::new()
        .file("UMD_DATA.BIN", b"ULUS-12345|0000000000000000|0001|G")
        .file(SFO, b"\0PSF sfo data")
        .file(EBOOT, &[0xAAu8; 100])
        .build();
    let path = dir.join("game.iso");
    fs::write(&path, &iso.bytes).unwrap();
    (iso, path)
}

#[test]
fn test_iso_info() {
    let temp_dir = TempDir::new().unwrap();
    let (_, image) = write_image(temp_dir.path());

    umd_patch()
        .args(["iso", "info"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("UMD_TEST"))
        .stdout(predicate::str::contains("Files: 3"));

    umd_patch()
        .args(["iso", "info", "--json"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"volume_id\": \"UMD_TEST\""));
}

#[test]
fn test_iso_list() {
    let temp_dir = TempDir::new().unwrap();
    let (_, image) = write_image(temp_dir.path());

    umd_patch()
        .args(["iso", "list"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains(EBOOT))
        .stdout(predicate::str::contains("UMD_DATA.BIN"));

    umd_patch()
        .args(["iso", "list", "--filter", "*.sfo"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains(SFO))
        .stdout(predicate::str::contains("EBOOT").not());

    umd_patch()
        .args(["iso", "list", "--json"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"length\": 100"));
}

#[test]
fn test_iso_extract() {
    let temp_dir = TempDir::new().unwrap();
    let (_, image) = write_image(temp_dir.path());
    let out = temp_dir.path().join("out/PARAM.SFO");

    umd_patch()
        .args(["iso", "extract"])
        .arg(&image)
        .arg(SFO)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(fs::read(&out).unwrap(), b"\0PSF sfo data");

    umd_patch()
        .args(["iso", "extract"])
        .arg(&image)
        .arg("PSP_GAME/MISSING.BIN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_iso_patch_and_relocate() {
    let temp_dir = TempDir::new().unwrap();
    let (iso, image) = write_image(temp_dir.path());
    let output = temp_dir.path().join("patched.iso");
    let new_eboot = temp_dir.path().join("EBOOT.BIN");
    fs::write(&new_eboot, vec![0xBBu8; 1500]).unwrap();

    umd_patch()
        .args(["iso", "patch"])
        .arg(&image)
        .arg(&output)
        .arg("--patch")
        .arg(format!("{EBOOT}={}", new_eboot.display()))
        .args(["--relocate", SFO])
        .assert()
        .success();

    assert_eq!(fs::read(&image).unwrap(), iso.bytes);
    let patched = fs::read(&output).unwrap();
    let parsed = IsoImage::read(&mut MemoryCursor::from_slice(&patched)).unwrap();
    let mut cursor = MemoryCursor::from_slice(&patched);

    let eboot = parsed.find_file(EBOOT).unwrap();
    assert_eq!((eboot.lba, eboot.length), (iso.file(EBOOT).lba, 1500));
    assert_eq!(parsed.find_file(SFO).unwrap().lba, iso.sectors());
    assert_eq!(
        parsed.read_file(&mut cursor, SFO).unwrap(),
        b"\0PSF sfo data"
    );
    assert_eq!(parsed.descriptor().volume_space_size, iso.sectors() + 1);
}

#[test]
fn test_iso_patch_that_does_not_fit() {
    let temp_dir = TempDir::new().unwrap();
    let (_, image) = write_image(temp_dir.path());
    let big = temp_dir.path().join("big.bin");
    fs::write(&big, vec![0u8; 5000]).unwrap();

    umd_patch()
        .args(["iso", "patch"])
        .arg(&image)
        .arg(temp_dir.path().join("patched.iso"))
        .arg("--patch")
        .arg(format!("{EBOOT}={}", big.display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("won't fit in place"));
}

#[test]
fn test_iso_patch_grows_relocated_file() {
    let temp_dir = TempDir::new().unwrap();
    let (iso, image) = write_image(temp_dir.path());
    let output = temp_dir.path().join("patched.iso");
    let big = temp_dir.path().join("big.bin");
    fs::write(&big, vec![0x42u8; 5000]).unwrap();

    umd_patch()
        .args(["iso", "patch"])
        .arg(&image)
        .arg(&output)
        .arg("--patch")
        .arg(format!("{EBOOT}={}", big.display()))
        .args(["--relocate", EBOOT])
        .assert()
        .success();

    let patched = fs::read(&output).unwrap();
    assert_eq!(patched.len(), (iso.sectors() as usize + 3) * 2048);
    let parsed = IsoImage::read(&mut MemoryCursor::from_slice(&patched)).unwrap();
    assert_eq!(parsed.find_file(EBOOT).unwrap().length, 5000);
}

#[test]
fn test_iso_patch_rejects_same_output() {
    let temp_dir = TempDir::new().unwrap();
    let (iso, image) = write_image(temp_dir.path());

    umd_patch()
        .args(["iso", "patch"])
        .arg(&image)
        .arg(&image)
        .assert()
        .failure();

    umd_patch()
        .current_dir(temp_dir.path())
        .args(["iso", "patch", "game.iso", "./game.iso"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be different files"));
    assert_eq!(fs::read(&image).unwrap(), iso.bytes);
}

#[test]
fn test_iso_patch_reports_patched_and_relocated_counts() {
    let temp_dir = TempDir::new().unwrap();
    let (_, image) = write_image(temp_dir.path());
    let output = temp_dir.path().join("patched.iso");
    let big = temp_dir.path().join("big.bin");
    fs::write(&big, vec![0x42u8; 5000]).unwrap();

    umd_patch()
        .args(["iso", "patch"])
        .arg(&image)
        .arg(&output)
        .arg("--patch")
        .arg(format!("{EBOOT}={}", big.display()))
        .args(["--relocate", EBOOT, "--relocate", SFO, "--relocate", SFO])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Patched 1 files, relocated 2 files",
        ));
}

#[cfg(not(feature = "xdelta"))]
#[test]
fn test_xdelta_engine_needs_feature() {
    let temp_dir = TempDir::new().unwrap();
    let (_, image) = write_image(temp_dir.path());

    umd_patch()
        .args(["iso", "patch", "--engine", "xdelta"])
        .arg(&image)
        .arg(temp_dir.path().join("patched.iso"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("without xdelta support"));
}

#[test]
fn test_patchfs_create_list_extract() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("payload.bin"), b"nested payload").unwrap();
    fs::write(dir.join("manifest.json"), b"{\"files\": []}").unwrap();

    umd_patch()
        .args(["patchfs", "create"])
        .arg(dir.join("child.patchfs"))
        .arg("--add")
        .arg(format!("fate/EBOOT.xdelta={}", dir.join("payload.bin").display()))
        .assert()
        .success();
    umd_patch()
        .args(["patchfs", "create"])
        .arg(dir.join("root.patchfs"))
        .arg("--add")
        .arg(format!("manifest.json={}", dir.join("manifest.json").display()))
        .args(["--nested", "child.patchfs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("with 1 entries"));

    umd_patch()
        .args(["patchfs", "list"])
        .arg(dir.join("root.patchfs"))
        .assert()
        .success()
        .stdout(predicate::str::contains("manifest.json"))
        .stdout(predicate::str::contains("fate/EBOOT.xdelta"))
        .stdout(predicate::str::contains("child.patchfs"));

    let out = dir.join("extracted.bin");
    umd_patch()
        .args(["patchfs", "extract"])
        .arg(dir.join("root.patchfs"))
        .arg("fate/EBOOT.xdelta")
        .arg("-o")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(fs::read(&out).unwrap(), b"nested payload");

    umd_patch()
        .args(["patchfs", "extract"])
        .arg(dir.join("root.patchfs"))
        .arg("absent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing archive entry"));
}

#[test]
fn test_patchfs_rejects_non_archive() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("not.patchfs");
    fs::write(&path, b"definitely not an archive").unwrap();

    umd_patch()
        .args(["patchfs", "list"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a PATCHFS archive"));
}

#[test]
fn test_lz_decompress_cmp() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("data.cmp");
    let mut container = b"IECP".to_vec();
    container.extend_from_slice(&8u32.to_le_bytes());
    container.push(0xFF);
    container.extend_from_slice(b"literals");
    fs::write(&input, &container).unwrap();

    umd_patch()
        .args(["lz", "info"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Format: CMP"));

    umd_patch()
        .args(["lz", "decompress"])
        .arg(&input)
        .assert()
        .success();
    assert_eq!(
        fs::read(temp_dir.path().join("data.cmp.dec")).unwrap(),
        b"literals"
    );

    umd_patch()
        .args(["lz", "decompress", "--format", "crilayla"])
        .arg(&input)
        .assert()
        .failure();
}

#[test]
fn test_completions() {
    umd_patch()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("umd-patch"));
}
