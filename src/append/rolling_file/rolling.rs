// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use jiff::Zoned;

use crate::Error;
use crate::ErrorKind;
use crate::Trap;
use crate::append::rolling_file::clock::Clock;
use crate::append::rolling_file::console::Console;

/// The live log file shared by writers and the rotation thread.
///
/// The handle is only reachable through the mutex, so a rotation swap is never observed half
/// done. `None` means the file has been closed.
#[derive(Debug)]
pub(crate) struct LogFile {
    log_dir: PathBuf,
    log_filename: String,
    log_path: PathBuf,
    max_files: NonZeroUsize,
    console: Console,
    pub(super) clock: Clock,
    trap: Arc<dyn Trap>,
    handle: Mutex<Option<File>>,
}

impl LogFile {
    pub(crate) fn open(
        dir: impl AsRef<Path>,
        name: &str,
        max_files: NonZeroUsize,
        console: Console,
        clock: Clock,
        trap: Arc<dyn Trap>,
    ) -> Result<Self, Error> {
        let log_dir = dir.as_ref().to_path_buf();
        create_log_dir(&log_dir).map_err(|err| {
            Error::new(ErrorKind::Initialization, "failed to create log directory")
                .with_context("dir", log_dir.display())
                .with_source(err)
        })?;

        let log_filename = format!("{name}.log");
        let log_path = log_dir.join(&log_filename);
        let file = open_log_file(&log_path).map_err(|err| {
            Error::new(ErrorKind::Initialization, "failed to open log file")
                .with_context("path", log_path.display())
                .with_source(err)
        })?;

        Ok(LogFile {
            log_dir,
            log_filename,
            log_path,
            max_files,
            console,
            clock,
            trap,
            handle: Mutex::new(Some(file)),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.log_path
    }

    pub(crate) fn now(&self) -> Zoned {
        self.clock.now()
    }

    pub(crate) fn trap(&self, err: &Error) {
        self.trap.trap(err);
    }

    fn handle(&self) -> MutexGuard<'_, Option<File>> {
        self.handle.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn closed_error(&self) -> Error {
        Error::closed("log file is closed").with_context("path", self.log_path.display())
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.handle().is_none()
    }

    /// Writes one formatted line to the file, then mirrors it to the console if enabled.
    ///
    /// A failing console does not keep the line out of the file.
    pub(crate) fn write(&self, buf: &[u8]) -> Result<(), Error> {
        {
            let mut handle = self.handle();
            let file = handle.as_mut().ok_or_else(|| self.closed_error())?;
            file.write_all(buf).map_err(|err| {
                Error::new(ErrorKind::Unexpected, "failed to write log file")
                    .with_context("path", self.log_path.display())
                    .with_source(err)
            })?;
        }

        self.console.write_all(buf).map_err(|err| {
            Error::new(ErrorKind::Unexpected, "failed to write console").with_source(err)
        })?;

        Ok(())
    }

    pub(crate) fn flush(&self) -> Result<(), Error> {
        if let Some(file) = self.handle().as_mut() {
            file.flush().map_err(Error::from_io_error)?;
        }
        self.console.flush().map_err(Error::from_io_error)?;
        Ok(())
    }

    /// The size of the live file, or `None` once closed.
    pub(crate) fn size(&self) -> Result<Option<u64>, Error> {
        let handle = self.handle();
        match handle.as_ref() {
            None => Ok(None),
            Some(file) => file.metadata().map(|m| Some(m.len())).map_err(|err| {
                Error::new(ErrorKind::Unexpected, "failed to stat log file")
                    .with_context("path", self.log_path.display())
                    .with_source(err)
            }),
        }
    }

    /// Renames the live file with a timestamp suffix and publishes a fresh one in its place.
    ///
    /// If the rename fails the old handle keeps receiving writes. If the reopen fails the old
    /// handle is kept as well, so writes go on to the just rotated file instead of being lost.
    /// A main file that is already gone is not renamed; the error goes to the trap and a fresh
    /// file is published, so a later rotation recovers from a failed reopen.
    pub(crate) fn rotate(&self) -> Result<(), Error> {
        let now = self.clock.now();
        let mut handle = self.handle();
        let current = handle.as_mut().ok_or_else(|| self.closed_error())?;

        if let Err(err) = current.flush() {
            let err = Error::new(ErrorKind::Unexpected, "failed to flush previous writer")
                .with_source(err);
            self.trap.trap(&err);
        }

        let archive_path = self.archive_path(&now);
        if let Err(err) = fs::rename(&self.log_path, &archive_path) {
            let missing = err.kind() == io::ErrorKind::NotFound && !self.log_path.exists();
            let err = Error::new(ErrorKind::Unexpected, "failed to rotate log")
                .with_context("from", self.log_path.display())
                .with_context("to", archive_path.display())
                .with_source(err);
            if !missing {
                return Err(err);
            }
            self.trap.trap(&err);
        }

        let file = open_log_file(&self.log_path).map_err(|err| {
            Error::new(ErrorKind::Unexpected, "failed to reopen log after rotation")
                .with_context("path", self.log_path.display())
                .with_source(err)
        })?;

        // the previous handle is closed on drop
        *handle = Some(file);
        Ok(())
    }

    pub(crate) fn rotate_and_prune(&self) -> Result<(), Error> {
        let result = self.rotate();
        self.prune();
        result
    }

    /// `<dir>/<name>.log.<YYYYMMDDHH>`, with a zero-padded counter appended if that name is
    /// already taken.
    fn archive_path(&self, now: &Zoned) -> PathBuf {
        let stamp = now.strftime("%Y%m%d%H");
        let base = format!("{}.{stamp}", self.log_filename);
        let path = self.log_dir.join(&base);
        if !path.exists() {
            return path;
        }

        let mut cnt = 1usize;
        loop {
            let path = self.log_dir.join(format!("{base}.{cnt:03}"));
            if !path.exists() {
                return path;
            }
            cnt += 1;
        }
    }

    /// Rotated files, oldest first.
    fn list_logfiles(&self) -> Result<Vec<String>, Error> {
        let read_dir = fs::read_dir(&self.log_dir).map_err(|err| {
            Error::new(ErrorKind::Unexpected, "failed to read log dir")
                .with_context("dir", self.log_dir.display())
                .with_source(err)
        })?;

        let mut files = read_dir
            .filter_map(|entry| {
                let entry = entry.ok()?;
                if entry.file_type().ok()?.is_dir() {
                    return None;
                }

                // if the filename is not a UTF-8 string, skip it.
                let filename = entry.file_name().into_string().ok()?;
                if filename == self.log_filename {
                    return None;
                }
                Some(filename)
            })
            .collect::<Vec<_>>();

        // the timestamp suffix makes lexical order chronological
        files.sort();
        Ok(files)
    }

    /// Deletes the oldest rotated files until at most `max_files` remain.
    ///
    /// Failures go to the trap; a retention pass never fails the caller.
    pub(crate) fn prune(&self) {
        let files = match self.list_logfiles() {
            Ok(files) => files,
            Err(err) => {
                self.trap.trap(&err);
                return;
            }
        };

        let excess = files.len().saturating_sub(self.max_files.get());
        for filename in files.iter().take(excess) {
            let filepath = self.log_dir.join(filename);
            if let Err(err) = fs::remove_file(&filepath) {
                let err = Error::new(ErrorKind::Unexpected, "failed to remove old log")
                    .with_context("path", filepath.display())
                    .with_source(err);
                self.trap.trap(&err);
            }
        }
    }

    /// Flushes and drops the handle. Later writes fail with a closed error.
    pub(crate) fn close(&self) {
        if let Some(mut file) = self.handle().take() {
            if let Err(err) = file.flush() {
                let err = Error::new(ErrorKind::Unexpected, "failed to flush log file on close")
                    .with_source(err);
                self.trap.trap(&err);
            }
        }
    }
}

#[cfg(unix)]
fn create_log_dir(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    fs::DirBuilder::new().recursive(true).mode(0o755).create(dir)
}

#[cfg(not(unix))]
fn create_log_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

fn open_log_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Mutex;

    use rand::Rng;
    use rand::distr::Alphanumeric;
    use tempfile::TempDir;

    use super::*;
    use crate::append::rolling_file::clock::ManualClock;

    #[derive(Debug, Default)]
    struct CollectTrap {
        errors: Mutex<Vec<String>>,
    }

    impl Trap for CollectTrap {
        fn trap(&self, err: &Error) {
            self.errors.lock().unwrap().push(err.to_string());
        }
    }

    fn open(dir: &Path, max_files: usize, start: &str) -> LogFile {
        let now = Zoned::from_str(start).unwrap();
        LogFile::open(
            dir,
            "app",
            NonZeroUsize::new(max_files).unwrap(),
            Console::Off,
            Clock::ManualClock(ManualClock::new(now)),
            Arc::new(CollectTrap::default()),
        )
        .unwrap()
    }

    fn open_with(dir: &Path, name: &str, console: Console, trap: Arc<CollectTrap>) -> LogFile {
        let now = Zoned::from_str("2024-08-10T17:12:52+08[+08]").unwrap();
        LogFile::open(
            dir,
            name,
            NonZeroUsize::new(3).unwrap(),
            console,
            Clock::ManualClock(ManualClock::new(now)),
            trap,
        )
        .unwrap()
    }

    fn list(dir: &Path) -> Vec<String> {
        let mut names = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    fn generate_random_string() -> String {
        let mut rng = rand::rng();
        let len = rng.random_range(50..=100);
        let random_string: String = std::iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .map(char::from)
            .take(len)
            .collect();

        random_string
    }

    #[test]
    fn test_open_creates_nested_directory() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let dir = temp_dir.path().join("a").join("b");
        let file = open(&dir, 3, "2024-08-10T17:12:52+08[+08]");

        assert_eq!(file.path(), dir.join("app.log"));
        assert_eq!(list(&dir), ["app.log"]);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
            // the process umask may only clear bits
            assert_eq!(mode & !0o755, 0);
            let mode = fs::metadata(file.path()).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode & !0o644, 0);
        }
    }

    #[test]
    fn test_open_fails_when_directory_is_a_file() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = LogFile::open(
            &blocker,
            "app",
            NonZeroUsize::new(3).unwrap(),
            Console::Off,
            Clock::DefaultClock,
            Arc::new(CollectTrap::default()),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialization);
    }

    #[test]
    fn test_rotate_renames_with_hour_stamp() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let file = open(temp_dir.path(), 10, "2024-08-10T17:12:52+08[+08]");

        let content = generate_random_string();
        file.write(content.as_bytes()).unwrap();
        file.rotate().unwrap();

        assert_eq!(list(temp_dir.path()), ["app.log", "app.log.2024081017"]);
        let rotated = fs::read_to_string(temp_dir.path().join("app.log.2024081017")).unwrap();
        assert_eq!(rotated, content);
        assert_eq!(fs::metadata(file.path()).unwrap().len(), 0);
        assert_eq!(file.size().unwrap(), Some(0));

        file.write(b"after\n").unwrap();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "after\n");
    }

    #[test]
    fn test_rotate_twice_within_an_hour_keeps_both() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let file = open(temp_dir.path(), 10, "2024-08-10T17:12:52+08[+08]");

        file.write(b"first\n").unwrap();
        file.rotate().unwrap();
        file.write(b"second\n").unwrap();
        file.rotate().unwrap();

        assert_eq!(
            list(temp_dir.path()),
            ["app.log", "app.log.2024081017", "app.log.2024081017.001"]
        );
        let first = fs::read_to_string(temp_dir.path().join("app.log.2024081017")).unwrap();
        let second = fs::read_to_string(temp_dir.path().join("app.log.2024081017.001")).unwrap();
        assert_eq!(first, "first\n");
        assert_eq!(second, "second\n");
    }

    #[test]
    fn test_prune_keeps_newest() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let file = open(temp_dir.path(), 2, "2024-08-10T17:12:52+08[+08]");

        for stamp in ["2024081013", "2024081009", "2024081016", "2024081011", "2024081015"] {
            fs::write(temp_dir.path().join(format!("app.log.{stamp}")), b"old").unwrap();
        }
        fs::create_dir(temp_dir.path().join("archive")).unwrap();

        file.prune();

        assert_eq!(
            list(temp_dir.path()),
            ["app.log", "app.log.2024081015", "app.log.2024081016", "archive"]
        );
    }

    #[test]
    fn test_rotate_and_prune_bounds_file_count() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let max_files = 3;
        let file = open(temp_dir.path(), max_files, "2024-08-10T00:30:00+08[+08]");

        for hour in 0..10 {
            let now = Zoned::from_str(&format!("2024-08-10T{hour:02}:30:00+08[+08]")).unwrap();
            file.clock.set_now(now);
            file.write(generate_random_string().as_bytes()).unwrap();
            file.rotate_and_prune().unwrap();

            let rotated = list(temp_dir.path()).len() - 1;
            assert_eq!(rotated, (hour + 1).min(max_files));
        }

        assert_eq!(
            list(temp_dir.path()),
            [
                "app.log",
                "app.log.2024081007",
                "app.log.2024081008",
                "app.log.2024081009"
            ]
        );
    }

    #[test]
    fn test_prune_reports_unreadable_directory() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let trap = Arc::new(CollectTrap::default());
        let dir = temp_dir.path().join("logs");
        let file = LogFile::open(
            &dir,
            "app",
            NonZeroUsize::new(1).unwrap(),
            Console::Off,
            Clock::DefaultClock,
            trap.clone(),
        )
        .unwrap();

        fs::remove_file(file.path()).unwrap();
        fs::remove_dir(&dir).unwrap();
        file.prune();

        let errors = trap.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("failed to read log dir"), "{errors:?}");
    }

    #[test]
    fn test_writes_fail_after_close() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let file = open(temp_dir.path(), 3, "2024-08-10T17:12:52+08[+08]");

        file.write(b"before\n").unwrap();
        file.close();
        file.close();

        assert!(file.is_closed());
        assert_eq!(file.write(b"after\n").unwrap_err().kind(), ErrorKind::Closed);
        assert_eq!(file.rotate().unwrap_err().kind(), ErrorKind::Closed);
        assert_eq!(file.size().unwrap(), None);
        assert_eq!(fs::read_to_string(temp_dir.path().join("app.log")).unwrap(), "before\n");
    }

    #[test]
    fn test_collision_counter_keeps_lexical_order() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let file = open(temp_dir.path(), 20, "2024-08-10T17:12:52+08[+08]");

        for i in 0..12 {
            file.write(format!("{i}\n").as_bytes()).unwrap();
            file.rotate().unwrap();
        }

        let rotated = list(temp_dir.path())
            .into_iter()
            .filter(|name| name != "app.log")
            .collect::<Vec<_>>();
        assert_eq!(rotated.len(), 12);
        assert_eq!(rotated[0], "app.log.2024081017");
        assert_eq!(rotated[11], "app.log.2024081017.011");
        for (i, name) in rotated.iter().enumerate() {
            let content = fs::read_to_string(temp_dir.path().join(name)).unwrap();
            assert_eq!(content, format!("{i}\n"));
        }
    }

    #[test]
    fn test_rotate_recreates_missing_main_file() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let trap = Arc::new(CollectTrap::default());
        let file = open_with(temp_dir.path(), "app", Console::Off, trap.clone());

        file.write(b"one\n").unwrap();
        fs::remove_file(file.path()).unwrap();

        file.rotate().unwrap();
        assert!(file.path().exists());
        file.write(b"two\n").unwrap();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "two\n");
        {
            let errors = trap.errors.lock().unwrap();
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("failed to rotate log"), "{errors:?}");
        }

        // later rotations are back to normal
        file.rotate().unwrap();
        assert_eq!(list(temp_dir.path()), ["app.log", "app.log.2024081017"]);
        assert_eq!(trap.errors.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_failed_rename_keeps_writing_to_main_file() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        // the main file name fits, the rotated name exceeds the file name limit
        let name = "x".repeat(246);
        let file = open_with(
            temp_dir.path(),
            &name,
            Console::Off,
            Arc::new(CollectTrap::default()),
        );

        file.write(b"before\n").unwrap();
        let err = file.rotate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert!(err.message().contains("failed to rotate log"));

        file.write(b"after\n").unwrap();
        assert_eq!(list(temp_dir.path()), [format!("{name}.log")]);
        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            "before\nafter\n"
        );
    }

    #[test]
    fn test_console_mirrors_file_lines() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let captured = Arc::new(Mutex::new(Vec::new()));
        let file = open_with(
            temp_dir.path(),
            "app",
            Console::Capture(captured.clone()),
            Arc::new(CollectTrap::default()),
        );

        file.write(b"app: line one\n").unwrap();
        file.write(b"app: line two\n").unwrap();
        file.flush().unwrap();

        let expected = "app: line one\napp: line two\n";
        assert_eq!(fs::read_to_string(file.path()).unwrap(), expected);
        assert_eq!(String::from_utf8(captured.lock().unwrap().clone()).unwrap(), expected);
    }

    #[test]
    fn test_console_failure_keeps_file_line() {
        let temp_dir = TempDir::new().expect("failed to create a temporary directory");
        let file = open_with(
            temp_dir.path(),
            "app",
            Console::Broken,
            Arc::new(CollectTrap::default()),
        );

        let err = file.write(b"app: still on disk\n").unwrap_err();
        assert!(err.message().contains("failed to write console"));
        assert_eq!(
            fs::read_to_string(file.path()).unwrap(),
            "app: still on disk\n"
        );
    }
}
