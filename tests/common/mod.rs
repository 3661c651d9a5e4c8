use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::fixture::ChildPath;
use assert_fs::prelude::{FileWriteBin, FileWriteStr, PathChild};

/// The binary, isolated from any backend or calendar configured in the
/// environment running the tests.
pub fn lecturecam() -> Command {
    let mut cmd = Command::cargo_bin("lecturecam").unwrap();
    cmd.env_remove("LECTURECAM_BACKEND")
        .env_remove("LECTURECAM_CALENDAR_DIR")
        .env_remove("LECTURECAM_PASSWORD");
    cmd
}

pub fn setup_test_library(temp_dir: &TempDir) -> ChildPath {
    let library_dir = temp_dir.child("test_library");
    lecturecam()
        .arg("create")
        .arg(library_dir.path())
        .assert()
        .success();
    library_dir
}

/// A small file with a JPEG header, enough for the library to treat it as a photo.
pub fn write_test_photo(temp_dir: &TempDir, name: &str) -> ChildPath {
    let photo = temp_dir.child(name);
    photo
        .write_binary(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'])
        .unwrap();
    photo
}

/// An exported device calendar holding the given events as JSON.
pub fn write_calendar(temp_dir: &TempDir, calendar_id: &str, events_json: &str) -> ChildPath {
    let dir = temp_dir.child("calendars");
    dir.child(format!("{}.json", calendar_id))
        .write_str(events_json)
        .unwrap();
    dir
}

/// Capture `photo` into the library at a fixed time, with extra arguments.
pub fn capture(library_dir: &ChildPath, photo: &ChildPath, time: &str, args: &[&str]) {
    lecturecam()
        .arg("capture")
        .arg(library_dir.path())
        .arg(photo.path())
        .arg("--time")
        .arg(time)
        .args(args)
        .assert()
        .success();
}
