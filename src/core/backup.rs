use crate::config::Config;
use crate::db::log::audit_quiet;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{confirm, info, success};
use crate::utils::path::expand_tilde;
use std::fs;
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::FileOptions;

pub struct BackupLogic;

impl BackupLogic {
    /// Copy the database file to `dest_file`, optionally zipping it.
    ///
    /// Returns the path written, or `None` when the user declined to
    /// overwrite an existing file.
    pub fn backup(
        pool: &mut DbPool,
        cfg: &Config,
        dest_file: &str,
        compress: bool,
        force: bool,
    ) -> AppResult<Option<PathBuf>> {
        let src = Path::new(&cfg.database);
        let dest_buf = expand_tilde(dest_file);
        let dest = dest_buf.as_path();

        if !src.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Database not found: {}", src.display()),
            )
            .into());
        }

        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        if compress && dest.extension().is_some_and(|e| e == "zip") {
            return Err(AppError::Other(
                "with --compress the backup file must not already end in .zip".into(),
            ));
        }

        let final_target = if compress {
            dest.with_extension("zip")
        } else {
            dest.to_path_buf()
        };
        if final_target.exists()
            && !force
            && !confirm(&format!("The file '{}' already exists. Overwrite it?", final_target.display()))
        {
            info("Backup cancelled.");
            return Ok(None);
        }

        // With --compress the database is streamed straight into the archive,
        // `dest` itself is never written.
        let final_path = if compress {
            compress_backup(src, dest)?
        } else {
            fs::copy(src, dest)?;
            success(format!("Backup created: {}", dest.display()));
            dest.to_path_buf()
        };

        audit_quiet(
            &pool.conn,
            "backup",
            &final_path.to_string_lossy(),
            if compress {
                "Backup created and compressed"
            } else {
                "Backup created"
            },
        );

        Ok(Some(final_path))
    }
}

/// Write `src` into `<dest>.zip`, stored under the file name of `dest`.
fn compress_backup(src: &Path, dest: &Path) -> AppResult<PathBuf> {
    let zip_path = dest.with_extension("zip");
    let entry_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::Other(format!("invalid backup path: {}", dest.display())))?;

    let file = fs::File::create(&zip_path)?;
    let mut zip = ZipWriter::new(file);

    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut f = fs::File::open(src)?;
    zip.start_file(entry_name, options)
        .map_err(std::io::Error::other)?;

    std::io::copy(&mut f, &mut zip)?;
    zip.finish().map_err(std::io::Error::other)?;

    success(format!("Backup created and compressed: {}", zip_path.display()));

    Ok(zip_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;

    fn setup(dir: &Path) -> (DbPool, Config) {
        let db = dir.join("clubcal.sqlite");
        let pool = DbPool::new(&db.to_string_lossy()).unwrap();
        init_db(&pool.conn).unwrap();
        let mut cfg = Config::default();
        cfg.database = db.to_string_lossy().into_owned();
        (pool, cfg)
    }

    #[test]
    fn plain_copy_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pool, cfg) = setup(dir.path());
        let dest = dir.path().join("out/copy.sqlite");

        let written = BackupLogic::backup(&mut pool, &cfg, &dest.to_string_lossy(), false, false)
            .unwrap()
            .unwrap();
        assert_eq!(written, dest);
        assert!(dest.exists());
    }

    #[test]
    fn compressed_backup_replaces_the_copy() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pool, cfg) = setup(dir.path());
        let dest = dir.path().join("copy.sqlite");

        let written = BackupLogic::backup(&mut pool, &cfg, &dest.to_string_lossy(), true, false)
            .unwrap()
            .unwrap();
        assert_eq!(written.extension().unwrap(), "zip");
        assert!(written.exists());
        assert!(!dest.exists());

        // existing target, forced
        assert!(BackupLogic::backup(&mut pool, &cfg, &dest.to_string_lossy(), true, true)
            .unwrap()
            .is_some());
    }

    #[test]
    fn compressing_leaves_an_existing_plain_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (mut pool, cfg) = setup(dir.path());
        let dest = dir.path().join("precious.sqlite");
        fs::write(&dest, b"user data").unwrap();

        let written = BackupLogic::backup(&mut pool, &cfg, &dest.to_string_lossy(), true, false)
            .unwrap()
            .unwrap();
        assert_eq!(written, dir.path().join("precious.zip"));
        assert!(written.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"user data");
    }
}
