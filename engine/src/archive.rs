//! Archive-encrypt engine.
//!
//! Packs a selection into a gzip-compressed tarball in the scratch
//! directory, then encrypts it with `openssl enc` (AES-256-CBC, salted,
//! PBKDF2 key derivation) into a single timestamped artifact in the
//! destination. The passphrase is piped to the cipher on stdin.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::context::ExportContext;
use crate::error::EngineError;
use crate::fs_ops;
use crate::journal::LogAction;
use crate::model::{EncryptedExport, Item};
use crate::notify::ENCRYPTED_COPY_COMPLETED;
use crate::tools::{run_checked, Invocation};

pub const ARCHIVER: &str = "tar";
pub const CIPHER: &str = "openssl";
const ARTIFACT_EXTENSION: &str = ".tar.gz.enc";

/// Name of the encrypted artifact for a given local timestamp.
pub fn artifact_name(timestamp: chrono::DateTime<Local>) -> String {
    format!(
        "export_{}{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        ARTIFACT_EXTENSION
    )
}

/// First free artifact path in `destination` for `timestamp`.
///
/// Exports started within the same second get `_2`, `_3`, ... before the
/// extension instead of replacing each other.
pub fn unique_artifact_path(destination: &Path, timestamp: chrono::DateTime<Local>) -> PathBuf {
    let name = artifact_name(timestamp);
    let first = destination.join(&name);
    if fs::symlink_metadata(&first).is_err() {
        return first;
    }
    let stem = name.strip_suffix(ARTIFACT_EXTENSION).unwrap_or(name.as_str());
    (2u32..)
        .map(|n| destination.join(format!("{}_{}{}", stem, n, ARTIFACT_EXTENSION)))
        .find(|candidate| fs::symlink_metadata(candidate).is_err())
        .unwrap_or(first)
}

/// Archive and encrypt a selection into `destination`.
///
/// The undo record file is truncated before any external tool runs and, on
/// success, holds exactly the encrypted artifact. A failing archiver or
/// cipher is reported as `ToolFailed`; in that case nothing is logged and
/// no partial artifact is left behind.
///
/// # Errors
/// `EmptyPassphrase` for an empty passphrase, `ToolLaunchFailed`/`ToolFailed`
/// for the external steps, or a filesystem/journal error.
pub fn encrypt_selection(
    ctx: &ExportContext,
    items: &[Item],
    destination: &Path,
    passphrase: &str,
) -> Result<EncryptedExport, EngineError> {
    if passphrase.is_empty() {
        return Err(EngineError::EmptyPassphrase);
    }

    let span = info_span!("encrypt_selection", destination = %destination.display());
    let _guard = span.enter();

    fs_ops::ensure_dir(destination)?;
    fs_ops::ensure_dir(&ctx.config.scratch_dir)?;
    let source_bytes = fs_ops::total_size(items)?;

    let mut recorder = ctx.journal.start_undo_records()?;

    let tarball = ctx
        .config
        .scratch_dir
        .join(format!("export-{}.tar.gz", Uuid::new_v4()));
    let artifact = unique_artifact_path(destination, Local::now());
    info!(
        items = items.len(),
        source_bytes,
        artifact = %artifact.display(),
        "Starting encrypted export"
    );

    let result = build_tarball(ctx, items, &tarball)
        .and_then(|()| encrypt_file(ctx, &tarball, &artifact, passphrase));
    remove_scratch(&tarball);
    if let Err(e) = result {
        if artifact.exists() {
            if let Err(remove_err) = fs::remove_file(&artifact) {
                warn!(path = %artifact.display(), error = %remove_err, "Failed to remove partial artifact");
            }
        }
        return Err(e);
    }

    ctx.journal.log_action(&artifact, LogAction::Encrypted)?;
    recorder.record(&artifact)?;
    info!(artifact = %artifact.display(), "Encrypted export complete");
    ctx.notify(ENCRYPTED_COPY_COMPLETED);

    Ok(EncryptedExport {
        artifact,
        source_bytes,
    })
}

fn build_tarball(ctx: &ExportContext, items: &[Item], tarball: &Path) -> Result<(), EngineError> {
    let invocation = Invocation::new(ARCHIVER)
        .arg("-czf")
        .arg(tarball)
        .arg("--")
        .args(items.iter().map(|item| item.path.as_os_str()));
    run_checked(ctx.runner(), &invocation)
}

fn encrypt_file(
    ctx: &ExportContext,
    input: &Path,
    output: &Path,
    passphrase: &str,
) -> Result<(), EngineError> {
    let invocation = Invocation::new(CIPHER)
        .args(["enc", "-aes-256-cbc", "-salt", "-pbkdf2", "-pass", "stdin"])
        .arg("-in")
        .arg(input)
        .arg("-out")
        .arg(output)
        .stdin(format!("{}\n", passphrase).into_bytes());
    run_checked(ctx.runner(), &invocation)
}

fn remove_scratch(tarball: &Path) {
    match fs::remove_file(tarball) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %tarball.display(), error = %e, "Failed to remove scratch archive"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::tools::{ToolExit, ToolRunner};
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::ffi::OsString;
    use std::io;
    use std::rc::Rc;

    /// Stands in for tar and openssl: writes the file named after `-czf` or
    /// `-out` and records every call.
    struct FakeTools {
        calls: Rc<RefCell<Vec<Invocation>>>,
        fail_program: Option<&'static str>,
    }

    impl ToolRunner for FakeTools {
        fn run(&self, invocation: &Invocation) -> io::Result<ToolExit> {
            self.calls.borrow_mut().push(invocation.clone());
            let output_flag = if invocation.program == ARCHIVER { "-czf" } else { "-out" };
            if let Some(pos) = invocation.args.iter().position(|a| a == output_flag) {
                fs::write(&invocation.args[pos + 1], b"payload")?;
            }
            if self.fail_program == Some(invocation.program.as_str()) {
                return Ok(ToolExit { code: Some(1) });
            }
            Ok(ToolExit::SUCCESS)
        }
    }

    fn context(
        root: &Path,
        fail_program: Option<&'static str>,
    ) -> (ExportContext, Rc<RefCell<Vec<Invocation>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let ctx = ExportContext::new(AppConfig::with_home(root))
            .with_runner(Box::new(FakeTools {
                calls: Rc::clone(&calls),
                fail_program,
            }))
            .with_notifier(None);
        (ctx, calls)
    }

    fn source(root: &Path) -> Vec<Item> {
        let src = root.join("src");
        fs::create_dir_all(src.join("dir")).expect("Failed to create dirs");
        fs::write(src.join("a.txt"), "abc").expect("Failed to write");
        fs::write(src.join("dir").join("b.txt"), "de").expect("Failed to write");
        vec![Item::file(src.join("a.txt")), Item::directory(src.join("dir"))]
    }

    #[test]
    fn test_artifact_name_has_timestamp() {
        let timestamp = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(artifact_name(timestamp), "export_20240309_140507.tar.gz.enc");
    }

    #[test]
    fn test_artifact_path_avoids_existing_export() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let dst = temp_dir.path();
        let timestamp = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let first = unique_artifact_path(dst, timestamp);
        assert_eq!(first, dst.join("export_20240309_140507.tar.gz.enc"));
        fs::write(&first, b"earlier").expect("Failed to write");

        let second = unique_artifact_path(dst, timestamp);
        assert_eq!(second, dst.join("export_20240309_140507_2.tar.gz.enc"));
        fs::write(&second, b"earlier").expect("Failed to write");

        let third = unique_artifact_path(dst, timestamp);
        assert_eq!(third, dst.join("export_20240309_140507_3.tar.gz.enc"));
    }

    #[test]
    fn test_failed_export_keeps_earlier_artifact() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let items = source(temp_dir.path());
        let dst = temp_dir.path().join("dst");

        let (ok_ctx, _calls) = context(temp_dir.path(), None);
        let earlier = encrypt_selection(&ok_ctx, &items, &dst, "pw").expect("Failed to export");

        let (failing_ctx, _calls) = context(temp_dir.path(), Some(CIPHER));
        let result = encrypt_selection(&failing_ctx, &items, &dst, "pw");

        assert!(matches!(result, Err(EngineError::ToolFailed { .. })));
        assert_eq!(fs::read(&earlier.artifact).unwrap(), b"payload");
        assert_eq!(fs::read_dir(&dst).unwrap().count(), 1);
    }

    #[test]
    fn test_encrypt_replaces_undo_records_with_artifact() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let (ctx, calls) = context(temp_dir.path(), None);
        let items = source(temp_dir.path());
        let dst = temp_dir.path().join("dst");

        let mut recorder = ctx.journal.start_undo_records().unwrap();
        recorder.record(Path::new("/old/copy")).unwrap();
        drop(recorder);

        let export = encrypt_selection(&ctx, &items, &dst, "hunter2").expect("Failed to export");

        assert_eq!(export.source_bytes, 5);
        assert!(export.artifact.starts_with(&dst));
        assert!(export.artifact.is_file());
        let records = ctx.journal.read_undo_records().unwrap().unwrap();
        assert_eq!(records, vec![export.artifact.clone()]);

        let log = fs::read_to_string(ctx.journal.log_path()).unwrap();
        assert_eq!(log, format!("{} ENCRYPTED\n", export.artifact.display()));

        let calls = calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program, "tar");
        assert_eq!(calls[1].program, "openssl");
        assert_eq!(calls[1].stdin.as_deref(), Some(&b"hunter2\n"[..]));
        assert!(!calls[1].args.contains(&OsString::from("hunter2")));
    }

    #[test]
    fn test_scratch_archive_is_removed() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let (ctx, _calls) = context(temp_dir.path(), None);
        let items = source(temp_dir.path());

        encrypt_selection(&ctx, &items, &temp_dir.path().join("dst"), "pw")
            .expect("Failed to export");

        let leftovers = fs::read_dir(&ctx.config.scratch_dir).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_cipher_failure_is_surfaced() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let (ctx, _calls) = context(temp_dir.path(), Some(CIPHER));
        let items = source(temp_dir.path());
        let dst = temp_dir.path().join("dst");

        let result = encrypt_selection(&ctx, &items, &dst, "pw");

        assert!(matches!(result, Err(EngineError::ToolFailed { .. })));
        assert_eq!(fs::read_dir(&dst).unwrap().count(), 0);
        assert_eq!(ctx.journal.read_undo_records().unwrap(), Some(vec![]));
        assert!(!ctx.journal.log_path().exists());
    }

    #[test]
    fn test_archiver_failure_skips_cipher() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let (ctx, calls) = context(temp_dir.path(), Some(ARCHIVER));
        let items = source(temp_dir.path());

        let result = encrypt_selection(&ctx, &items, &temp_dir.path().join("dst"), "pw");

        assert!(matches!(result, Err(EngineError::ToolFailed { ref program, .. }) if program == "tar"));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_empty_passphrase_is_rejected() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let (ctx, calls) = context(temp_dir.path(), None);

        let result = encrypt_selection(&ctx, &[], &temp_dir.path().join("dst"), "");

        assert!(matches!(result, Err(EngineError::EmptyPassphrase)));
        assert!(calls.borrow().is_empty());
    }
}
