// src/tests/common.rs

//! Shared fixtures and temporary-file helpers for the test modules.

use crate::common::FPath;

use std::io::Write;

use ::lazy_static::lazy_static;
#[doc(hidden)]
pub use ::tempfile::{tempdir, NamedTempFile, TempDir};

/// NamedTempFile instances default to this file name prefix,
/// for easier cleanup of leftovers.
pub const STR_TEMPFILE_PREFIX: &str = "tmp-qhist-test-";

lazy_static! {
    pub static ref STRING_TEMPFILE_PREFIX: String = String::from(STR_TEMPFILE_PREFIX);
}

/// Small helper function for copying `NamedTempFile` path to a `FPath`.
pub fn ntf_fpath(ntf: &NamedTempFile) -> FPath {
    FPath::from(
        ntf.path()
            .to_str()
            .unwrap(),
    )
}

/// Testing helper function to write a `str` to a temporary file.
pub fn create_temp_file(data: &str) -> NamedTempFile {
    let mut ntf = match tempfile::Builder::new()
        .prefix::<str>(&STRING_TEMPFILE_PREFIX)
        .tempfile()
    {
        Ok(val) => val,
        Err(err) => {
            panic!("NamedTempFile::new() return Err {}", err);
        }
    };
    match ntf.write_all(data.as_bytes()) {
        Ok(_) => {}
        Err(err) => {
            panic!("NamedTempFile::write_all() return Err {}", err);
        }
    }

    ntf
}

/// Testing helper function for a temporary accounting log directory.
pub fn create_log_dir() -> TempDir {
    match tempfile::Builder::new()
        .prefix::<str>(&STRING_TEMPFILE_PREFIX)
        .tempdir()
    {
        Ok(val) => val,
        Err(err) => {
            panic!("tempdir() return Err {}", err);
        }
    }
}

/// Write one daily log file `<dir>/<stamp>` (stamp like `20250225`).
pub fn create_log_file(
    dir: &TempDir,
    stamp: &str,
    data: &str,
) {
    let path = dir.path().join(stamp);
    if let Err(err) = std::fs::write(&path, data) {
        panic!("fs::write({:?}) return Err {}", path, err);
    }
}

pub fn dir_fpath(dir: &TempDir) -> FPath {
    FPath::from(
        dir.path()
            .to_str()
            .unwrap(),
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// canned accounting log lines
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const LINE_Q_1: &str = "04/13/2023 08:00:00;Q;100001.pbs01;user=vanderwb group=csg queue=regular";

pub const LINE_E_1: &str = "04/13/2023 14:00:00;E;100001.pbs01;user=vanderwb group=csg queue=regular \
    Resource_List.ncpus=36 Resource_List.walltime=02:00:00 \
    resources_used.walltime=01:30:05 resources_used.mem=4096kb \
    resources_used.cput=48:10:00 Exit_status=0 end=1681387200";

pub const LINE_E_2: &str = "04/13/2023 15:00:00;E;100002.pbs01;user=benkirk group=csg queue=economy \
    Resource_List.ncpus=1 resources_used.walltime=00:05:00 \
    resources_used.mem=2gb Exit_status=1";

pub const LINE_MALFORMED: &str = "this is not an accounting line";
